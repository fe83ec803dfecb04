use std::ops::AddAssign;

use chrono::NaiveDate;

/// The eight monetary columns of a ledger row. Fees are stored with their
/// sign as exported, so processor and shipping fees are usually negative.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Amounts {
    pub gross: f64,
    pub net_credit: f64,
    pub net_debit: f64,
    pub processor_fee: f64,
    pub financing_fee: f64,
    pub shipping_fee: f64,
    pub taxes: f64,
    pub coupon: f64,
}

impl AddAssign for Amounts {
    fn add_assign(&mut self, rhs: Self) {
        self.gross += rhs.gross;
        self.net_credit += rhs.net_credit;
        self.net_debit += rhs.net_debit;
        self.processor_fee += rhs.processor_fee;
        self.financing_fee += rhs.financing_fee;
        self.shipping_fee += rhs.shipping_fee;
        self.taxes += rhs.taxes;
        self.coupon += rhs.coupon;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub date: NaiveDate,
    pub description: String,
    pub amounts: Amounts,
    pub payment_method: String,
}

/// Per-date sums of every monetary column.
#[derive(Debug, Clone, PartialEq)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub amounts: Amounts,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    pub description: String,
    pub amount: f64,
}

/// Everything shown for one selected date.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyBreakdown {
    pub date: NaiveDate,
    pub entries: Vec<CategoryTotal>,
    pub exits: Vec<CategoryTotal>,
    pub processor_fees: Vec<CategoryTotal>,
    pub shipping_fees: Vec<CategoryTotal>,
    pub transaction_count: usize,
    /// Sum of net credit.
    pub gross_revenue: f64,
    /// Net credit plus processor and shipping fees.
    pub net_revenue: f64,
    /// Processor plus shipping fees.
    pub total_fees: f64,
    pub processor_fee_total: f64,
    pub shipping_fee_total: f64,
}

impl DailyBreakdown {
    pub fn is_empty(&self) -> bool {
        self.transaction_count == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentMethodShare {
    pub method: String,
    pub count: usize,
    /// Percent of all records, 0-100.
    pub share: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Five-number summary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spread {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}
