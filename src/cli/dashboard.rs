use std::io::IsTerminal;

use chrono::NaiveDate;
use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    symbols::Marker,
    widgets::{
        Axis, Bar, BarChart, BarGroup, Block, Borders, Cell, Chart, Dataset, GraphType,
        LegendPosition, Paragraph, Row, Table,
    },
    Frame,
};
use tracing::debug;

use crate::cli::report::text;
use crate::cli::LedgerSource;
use crate::error::Result;
use crate::fmt::{compact, number};
use crate::loader::Ledger;
use crate::models::{Amounts, CategoryTotal, DailyBreakdown, DailySummary, PaymentMethodShare};
use crate::reports;
use crate::settings::Settings;
use crate::tui::{
    money_span, run_view, View, ViewAction, AMOUNT_POS_STYLE, FOOTER_STYLE, HEADER_STYLE,
    SELECTED_STYLE,
};

const BOLD: Style = Style::new().add_modifier(Modifier::BOLD);
const HEADER_ROW_STYLE: Style = Style::new()
    .fg(Color::DarkGray)
    .add_modifier(Modifier::BOLD);
const BORDER_STYLE: Style = Style::new().fg(Color::DarkGray);

/// Dates skipped by PgUp/PgDn.
const PAGE: isize = 10;

/// Label, colour and summary column of one trend line.
type Series = (&'static str, Color, fn(&Amounts) -> f64);

const NET_FLOW_SERIES: [Series; 2] = [
    ("Net credit", Color::Green, |a| a.net_credit),
    ("Net debit", Color::Red, |a| a.net_debit),
];

const TOTALS_SERIES: [Series; 6] = [
    ("Gross", Color::Green, |a| a.gross),
    ("Processor fee", Color::Red, |a| a.processor_fee),
    ("Financing fee", Color::Magenta, |a| a.financing_fee),
    ("Shipping fee", Color::Yellow, |a| a.shipping_fee),
    ("Taxes", Color::Cyan, |a| a.taxes),
    ("Coupon", Color::Blue, |a| a.coupon),
];

/// What the top-right chart plots; `c` cycles through them.
#[derive(Clone, Copy, Debug, PartialEq)]
enum ChartMode {
    Gross,
    NetFlow,
    Totals,
}

impl ChartMode {
    fn next(self) -> Self {
        match self {
            ChartMode::Gross => ChartMode::NetFlow,
            ChartMode::NetFlow => ChartMode::Totals,
            ChartMode::Totals => ChartMode::Gross,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Panel {
    Breakdown,
    Methods,
}

pub(crate) struct Dashboard<'a> {
    ledger: &'a Ledger,
    title: String,
    currency: String,
    summary: Vec<DailySummary>,
    methods: Vec<PaymentMethodShare>,
    selection: usize,
    breakdown: Option<DailyBreakdown>,
    panel: Panel,
    chart: ChartMode,
    list_offset: usize,
}

impl<'a> Dashboard<'a> {
    pub(crate) fn new(ledger: &'a Ledger, title: impl Into<String>, currency: impl Into<String>) -> Self {
        let mut summary = reports::summarize_by_date(ledger);
        summary.sort_by_key(|row| row.date);
        let mut dashboard = Self {
            ledger,
            title: title.into(),
            currency: currency.into(),
            summary,
            methods: reports::payment_methods(ledger),
            selection: 0,
            breakdown: None,
            panel: Panel::Breakdown,
            chart: ChartMode::Gross,
            list_offset: 0,
        };
        dashboard.select(0);
        dashboard
    }

    fn selected_date(&self) -> Option<NaiveDate> {
        self.summary.get(self.selection).map(|row| row.date)
    }

    /// Select a date by index (clamped) and recompute its breakdown.
    fn select(&mut self, idx: usize) {
        if self.summary.is_empty() {
            self.breakdown = None;
            return;
        }
        self.selection = idx.min(self.summary.len() - 1);
        self.breakdown = self
            .selected_date()
            .map(|date| reports::daily_breakdown(self.ledger, date));
        debug!(date = ?self.selected_date(), "date selected");
    }

    fn move_by(&mut self, delta: isize) {
        self.select(self.selection.saturating_add_signed(delta));
    }

    fn draw_stats(&self, frame: &mut Frame, area: Rect) {
        let Some(b) = &self.breakdown else {
            frame.render_widget(
                Paragraph::new(" No transactions in this ledger.").style(FOOTER_STYLE),
                area,
            );
            return;
        };
        let cur = self.currency.as_str();
        let lines = vec![
            Line::from(Span::styled(
                format!(" {}", b.date.format("%A, %d %B %Y")),
                BOLD,
            )),
            Line::from(format!(" Transactions     {}", number(b.transaction_count))),
            Line::from(vec![Span::raw(" Gross revenue    "), money_span(b.gross_revenue, cur)]),
            Line::from(vec![Span::raw(" Net revenue      "), money_span(b.net_revenue, cur)]),
            Line::from(vec![Span::raw(" Total fees       "), money_span(b.total_fees, cur)]),
            Line::from(vec![Span::raw(" Processor fees   "), money_span(b.processor_fee_total, cur)]),
            Line::from(vec![Span::raw(" Shipping fees    "), money_span(b.shipping_fee_total, cur)]),
        ];
        frame.render_widget(Paragraph::new(lines), area);
    }

    /// Dates shown by the chart: up to `visible` of them, centred on the
    /// selection where possible.
    fn chart_window(&self, visible: usize) -> (usize, usize) {
        let len = self.summary.len();
        let start = self
            .selection
            .saturating_sub(visible / 2)
            .min(len.saturating_sub(visible));
        (start, (start + visible).min(len))
    }

    fn draw_chart(&self, frame: &mut Frame, area: Rect) {
        if self.summary.is_empty() {
            return;
        }
        match self.chart {
            ChartMode::Gross => self.draw_gross_bars(frame, area),
            ChartMode::NetFlow => {
                self.draw_trend(frame, area, "Net Credit vs Net Debit", &NET_FLOW_SERIES)
            }
            ChartMode::Totals => self.draw_trend(frame, area, "Daily Totals", &TOTALS_SERIES),
        }
    }

    fn draw_gross_bars(&self, frame: &mut Frame, area: Rect) {
        // bar width 3 + gap 1
        let (start, end) = self.chart_window((area.width as usize / 4).max(1));
        let window = &self.summary[start..end];

        let peak = window
            .iter()
            .map(|row| row.amounts.gross)
            .fold(0.0_f64, f64::max);
        let bars: Vec<Bar> = window
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let style = if start + i == self.selection {
                    Style::new().fg(Color::Yellow)
                } else {
                    AMOUNT_POS_STYLE
                };
                Bar::default()
                    .value(row.amounts.gross.max(0.0).round() as u64)
                    .text_value(String::new())
                    .label(Line::from(row.date.format("%d").to_string()))
                    .style(style)
            })
            .collect();

        let block = Block::default()
            .title(format!("Daily Gross (peak {})", compact(peak)))
            .title_style(BOLD)
            .borders(Borders::NONE);
        let chart = BarChart::default()
            .block(block)
            .data(BarGroup::default().bars(&bars))
            .bar_width(3)
            .bar_gap(1);
        frame.render_widget(chart, area);
    }

    /// One line per summary column over the windowed dates.
    fn draw_trend(&self, frame: &mut Frame, area: Rect, title: &str, series: &[Series]) {
        let (start, end) = self.chart_window((area.width as usize / 2).max(2));
        let window = &self.summary[start..end];

        let points: Vec<Vec<(f64, f64)>> = series
            .iter()
            .map(|(_, _, field)| {
                window
                    .iter()
                    .enumerate()
                    .map(|(i, row)| (i as f64, field(&row.amounts)))
                    .collect()
            })
            .collect();
        let (mut lo, mut hi) = points
            .iter()
            .flatten()
            .fold((0.0_f64, 0.0_f64), |(lo, hi), &(_, y)| (lo.min(y), hi.max(y)));
        if hi - lo < f64::EPSILON {
            lo -= 1.0;
            hi += 1.0;
        }

        let datasets: Vec<Dataset> = series
            .iter()
            .zip(&points)
            .map(|((name, color, _), data)| {
                Dataset::default()
                    .name(*name)
                    .marker(Marker::Braille)
                    .graph_type(GraphType::Line)
                    .style(Style::new().fg(*color))
                    .data(data)
            })
            .collect();

        let first = window[0].date.format("%d/%m").to_string();
        let last = window[window.len() - 1].date.format("%d/%m").to_string();
        let chart = Chart::new(datasets)
            .block(
                Block::default()
                    .title(title.to_string())
                    .title_style(BOLD)
                    .borders(Borders::NONE),
            )
            .x_axis(
                Axis::default()
                    .style(BORDER_STYLE)
                    .bounds([0.0, (window.len().max(2) - 1) as f64])
                    .labels(vec![Span::raw(first), Span::raw(last)]),
            )
            .y_axis(
                Axis::default()
                    .style(BORDER_STYLE)
                    .bounds([lo, hi])
                    .labels(vec![Span::raw(compact(lo)), Span::raw(compact(hi))]),
            )
            .legend_position(Some(LegendPosition::TopRight))
            .hidden_legend_constraints((Constraint::Percentage(50), Constraint::Percentage(100)));
        frame.render_widget(chart, area);
    }

    fn draw_dates(&mut self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(Span::styled(" Dates", BOLD))
            .borders(Borders::RIGHT)
            .border_style(BORDER_STYLE);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let height = inner.height as usize;
        if height == 0 {
            return;
        }
        if self.selection < self.list_offset {
            self.list_offset = self.selection;
        } else if self.selection >= self.list_offset + height {
            self.list_offset = self.selection + 1 - height;
        }

        let lines: Vec<Line> = self
            .summary
            .iter()
            .enumerate()
            .skip(self.list_offset)
            .take(height)
            .map(|(i, row)| {
                let marker = if i == self.selection { ">" } else { " " };
                let label = format!("{marker} {}", row.date.format("%Y-%m-%d"));
                if i == self.selection {
                    Line::from(Span::styled(label, SELECTED_STYLE))
                } else {
                    Line::from(label)
                }
            })
            .collect();
        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn draw_breakdown(&self, frame: &mut Frame, area: Rect) {
        let Some(b) = &self.breakdown else {
            return;
        };
        let [top, bottom] = Layout::vertical([Constraint::Percentage(50); 2]).areas(area);
        let [top_left, top_right] = Layout::horizontal([Constraint::Percentage(50); 2]).areas(top);
        let [bottom_left, bottom_right] =
            Layout::horizontal([Constraint::Percentage(50); 2]).areas(bottom);

        let cur = self.currency.as_str();
        category_table(frame, top_left, "Entries", &b.entries, cur);
        category_table(frame, top_right, "Exits", &b.exits, cur);
        category_table(frame, bottom_left, "Processor Fees", &b.processor_fees, cur);
        category_table(frame, bottom_right, "Shipping Fees", &b.shipping_fees, cur);
    }

    fn draw_methods(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(Span::styled(" Payment Methods (all dates) ", BOLD))
            .borders(Borders::ALL)
            .border_style(BORDER_STYLE);
        let rows: Vec<Row> = self
            .methods
            .iter()
            .map(|m| {
                let bar = "█".repeat((m.share / 100.0 * 30.0).round() as usize);
                Row::new(vec![
                    Cell::from(m.method.clone()),
                    Cell::from(Line::from(number(m.count)).right_aligned()),
                    Cell::from(Line::from(format!("{:.1}%", m.share)).right_aligned()),
                    Cell::from(Span::styled(bar, AMOUNT_POS_STYLE)),
                ])
            })
            .collect();
        let table = Table::new(
            rows,
            [
                Constraint::Fill(1),
                Constraint::Length(9),
                Constraint::Length(7),
                Constraint::Length(31),
            ],
        )
        .header(Row::new(vec!["Method", "Records", "Share", ""]).style(HEADER_ROW_STYLE))
        .block(block);
        frame.render_widget(table, area);
    }
}

fn category_table(frame: &mut Frame, area: Rect, title: &str, rows: &[CategoryTotal], currency: &str) {
    let block = Block::default()
        .title(Span::styled(format!(" {title} "), BOLD))
        .borders(Borders::ALL)
        .border_style(BORDER_STYLE);
    if rows.is_empty() {
        frame.render_widget(
            Paragraph::new(Span::styled(" (none)", FOOTER_STYLE)).block(block),
            area,
        );
        return;
    }

    let total: f64 = rows.iter().map(|r| r.amount).sum();
    let body: Vec<Row> = rows
        .iter()
        .map(|r| {
            Row::new(vec![
                Cell::from(r.description.clone()),
                Cell::from(Line::from(money_span(r.amount, currency)).right_aligned()),
            ])
        })
        .collect();
    let table = Table::new(body, [Constraint::Fill(1), Constraint::Length(16)])
        .header(Row::new(vec!["Description", "Amount"]).style(HEADER_ROW_STYLE))
        .footer(Row::new(vec![
            Cell::from(Span::styled("Total", BOLD)),
            Cell::from(Line::from(money_span(total, currency)).right_aligned()),
        ]))
        .block(block);
    frame.render_widget(table, area);
}

impl View for Dashboard<'_> {
    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();

        let [header_area, sep1, top_area, sep2, body_area, hints_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(8),
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Length(1),
        ])
        .areas(area);

        frame.render_widget(
            Paragraph::new(format!(" {}", self.title)).style(HEADER_STYLE),
            header_area,
        );

        let sep_line = "━".repeat(area.width as usize);
        let sep_widget = Paragraph::new(sep_line.as_str()).style(BORDER_STYLE);
        frame.render_widget(sep_widget.clone(), sep1);
        frame.render_widget(sep_widget, sep2);

        let [stats_area, chart_area] =
            Layout::horizontal([Constraint::Length(40), Constraint::Fill(1)]).areas(top_area);
        self.draw_stats(frame, stats_area);
        self.draw_chart(frame, chart_area);

        let [list_area, panel_area] =
            Layout::horizontal([Constraint::Length(16), Constraint::Fill(1)]).areas(body_area);
        self.draw_dates(frame, list_area);
        match self.panel {
            Panel::Breakdown => self.draw_breakdown(frame, panel_area),
            Panel::Methods => self.draw_methods(frame, panel_area),
        }

        let hints = match self.panel {
            Panel::Breakdown => " Up/Down=date  PgUp/PgDn=jump  Home/End=first/last  c=chart  Tab=payment methods  q=quit",
            Panel::Methods => " Up/Down=date  PgUp/PgDn=jump  Home/End=first/last  c=chart  Tab=breakdown  q=quit",
        };
        frame.render_widget(Paragraph::new(hints).style(FOOTER_STYLE), hints_area);
    }

    fn handle_key(&mut self, code: KeyCode) -> ViewAction {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Close,
            KeyCode::Up | KeyCode::Char('k') => self.move_by(-1),
            KeyCode::Down | KeyCode::Char('j') => self.move_by(1),
            KeyCode::PageUp => self.move_by(-PAGE),
            KeyCode::PageDown => self.move_by(PAGE),
            KeyCode::Home => self.select(0),
            KeyCode::End => self.select(usize::MAX),
            KeyCode::Char('c') => self.chart = self.chart.next(),
            KeyCode::Tab => {
                self.panel = match self.panel {
                    Panel::Breakdown => Panel::Methods,
                    Panel::Methods => Panel::Breakdown,
                }
            }
            _ => {}
        }
        ViewAction::Continue
    }
}

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

pub fn run(source: &LedgerSource, settings: &Settings) -> Result<()> {
    let ledger = source.load()?;

    // Piped output gets the plain summary instead of a full-screen view.
    if !std::io::stdout().is_terminal() {
        let rows = reports::summarize_by_date(&ledger);
        println!("{}", text::format_summary(&rows, &settings.currency));
        return Ok(());
    }

    let title = format!(
        "daybook: {} ({} records, {} dates)",
        source.file_name(),
        number(ledger.len()),
        number(ledger.dates().len())
    );
    let mut dashboard = Dashboard::new(&ledger, title, settings.currency.clone());
    run_view(&mut dashboard)
}
