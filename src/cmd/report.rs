//! Report command - per-market tax summary over a date window

use crate::core::{compute_tax_report, Market, MarketSummary, ReportRange};
use chrono::NaiveDate;
use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

#[derive(Args, Debug)]
pub struct ReportCommand {
    /// JSON or CSV file of raw cash flows ("-" for stdin)
    #[arg(short, long)]
    flows: PathBuf,

    /// Start of the report window (YYYY-MM-DD); also the fallback date for
    /// records without a timestamp
    #[arg(long)]
    from: NaiveDate,

    /// End of the report window (YYYY-MM-DD), inclusive
    #[arg(long)]
    to: NaiveDate,

    /// Only report this market
    #[arg(short, long, value_enum)]
    market: Option<MarketArg>,

    /// Output as JSON instead of formatted text
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum MarketArg {
    Us,
    Hk,
    Cn,
    Sg,
    Other,
}

impl From<MarketArg> for Market {
    fn from(arg: MarketArg) -> Self {
        match arg {
            MarketArg::Us => Market::Us,
            MarketArg::Hk => Market::Hk,
            MarketArg::Cn => Market::Cn,
            MarketArg::Sg => Market::Sg,
            MarketArg::Other => Market::Other,
        }
    }
}

impl ReportCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let range = ReportRange::new(self.from, self.to)?;
        let flows = super::read_flows(&self.flows)?;
        let mut report = compute_tax_report(&flows, range.start());

        if let Some(market) = self.market {
            let market = Market::from(market);
            report.retain(|m, _| *m == market);
        }

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Ok(());
        }

        self.print_report(&report, range);
        Ok(())
    }

    fn print_report(&self, report: &BTreeMap<Market, MarketSummary>, range: ReportRange) {
        println!();
        println!("TAX REPORT ({})", range);
        println!();

        let rows: Vec<MarketRow> = report
            .iter()
            .map(|(market, summary)| MarketRow::new(*market, summary))
            .collect();

        let table = Table::new(&rows)
            .with(Style::rounded())
            .with(Modify::new(Rows::new(1..)).with(Alignment::right()))
            .to_string();
        println!("{}", table);

        let total_due: Decimal = report
            .values()
            .map(|s| s.tax_report.est_china_tax)
            .sum();
        println!();
        println!("ESTIMATED TAX DUE: {:.2}", total_due);
        println!();
    }
}

/// Row for the per-market summary table
#[derive(Debug, Tabled)]
struct MarketRow {
    #[tabled(rename = "Market")]
    market: String,

    #[tabled(rename = "Flows")]
    flows: usize,

    #[tabled(rename = "Net P/L")]
    total_pl: String,

    #[tabled(rename = "Trade Gain")]
    trade_gain: String,

    #[tabled(rename = "Dividends")]
    dividend_gain: String,

    #[tabled(rename = "Foreign Tax")]
    foreign_tax: String,

    #[tabled(rename = "Taxable")]
    taxable_income: String,

    #[tabled(rename = "Est. CN Tax")]
    est_china_tax: String,
}

impl MarketRow {
    fn new(market: Market, summary: &MarketSummary) -> Self {
        MarketRow {
            market: market.to_string(),
            flows: summary.records.len(),
            total_pl: format!("{:.2}", summary.total_pl),
            trade_gain: format!("{:.2}", summary.tax_report.trade_gain),
            dividend_gain: format!("{:.2}", summary.tax_report.dividend_gain),
            foreign_tax: format!("{:.2}", summary.tax_report.foreign_tax),
            taxable_income: format!("{:.2}", summary.tax_report.taxable_income),
            est_china_tax: format!("{:.2}", summary.tax_report.est_china_tax),
        }
    }
}
