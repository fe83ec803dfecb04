/// Format a float as a currency amount with thousands separators: R$1,234.56
pub fn money(val: f64, currency: &str) -> String {
    let negative = val < 0.0 && format!("{:.2}", val.abs()) != "0.00";
    let cents = format!("{:.2}", val.abs());
    let (int_part, dec_part) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));

    let mut with_commas = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    let with_commas: String = with_commas.chars().rev().collect();

    if negative {
        format!("-{currency}{with_commas}.{dec_part}")
    } else {
        format!("{currency}{with_commas}.{dec_part}")
    }
}

/// Integer with thousands separators.
pub fn number(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::new();
    for (i, c) in digits.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out.chars().rev().collect()
}

/// Compact axis label: 1.5k, 2M.
pub fn compact(val: f64) -> String {
    let abs = val.abs();
    let sign = if val < 0.0 { "-" } else { "" };
    if abs >= 1_000_000.0 {
        let m = abs / 1_000_000.0;
        if m == m.floor() {
            format!("{sign}{}M", m as u64)
        } else {
            format!("{sign}{:.1}M", m)
        }
    } else if abs >= 1000.0 {
        let k = abs / 1000.0;
        if k == k.floor() {
            format!("{sign}{}k", k as u64)
        } else {
            format!("{sign}{:.1}k", k)
        }
    } else {
        format!("{sign}{}", abs as u64)
    }
}
