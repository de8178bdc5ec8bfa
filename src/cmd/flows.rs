//! Flows command - record-level view of classified cash flows

use crate::core::{classify, ClassifiedFlow, Market};
use chrono::NaiveDate;
use clap::Args;
use std::io;
use std::path::PathBuf;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

use super::report::MarketArg;

#[derive(Args, Debug)]
pub struct FlowsCommand {
    /// JSON or CSV file of raw cash flows ("-" for stdin)
    #[arg(short, long)]
    flows: PathBuf,

    /// Fallback date for records without a timestamp (YYYY-MM-DD)
    #[arg(long)]
    from: NaiveDate,

    /// Filter by market
    #[arg(short, long, value_enum)]
    market: Option<MarketArg>,

    /// Output as CSV instead of formatted table
    #[arg(long)]
    csv: bool,
}

impl FlowsCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let raw_flows = super::read_flows(&self.flows)?;
        let market_filter: Option<Market> = self.market.map(Into::into);

        let rows: Vec<FlowRow> = raw_flows
            .iter()
            .map(|raw| classify(raw.normalize(self.from)))
            .filter(|record| market_filter.is_none_or(|m| record.market == m))
            .enumerate()
            .map(|(i, record)| FlowRow::new(i + 1, &record))
            .collect();

        if self.csv {
            self.write_csv(&rows)
        } else {
            self.print_table(&rows);
            Ok(())
        }
    }

    fn print_table(&self, rows: &[FlowRow]) {
        if rows.is_empty() {
            println!("No cash flows found matching filters");
            return;
        }

        let table = Table::new(rows)
            .with(Style::rounded())
            .with(Modify::new(Rows::new(1..)).with(Alignment::right()))
            .to_string();
        println!("{}", table);
    }

    fn write_csv(&self, rows: &[FlowRow]) -> anyhow::Result<()> {
        let mut wtr = csv::Writer::from_writer(io::stdout());
        for row in rows {
            wtr.serialize(row)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

/// Row for the classified-flows table output
#[derive(Debug, Clone, Tabled, serde::Serialize)]
struct FlowRow {
    #[tabled(rename = "#")]
    #[serde(rename = "row_num")]
    row_num: usize,

    #[tabled(rename = "Time")]
    time: String,

    #[tabled(rename = "Market")]
    market: String,

    #[tabled(rename = "Symbol")]
    symbol: String,

    #[tabled(rename = "Type")]
    type_display: String,

    #[tabled(rename = "Category")]
    tax_category: String,

    #[tabled(rename = "Amount")]
    amount: String,

    #[tabled(rename = "P/L")]
    is_pl: String,

    #[tabled(rename = "Description")]
    description: String,
}

impl FlowRow {
    fn new(row_num: usize, record: &ClassifiedFlow) -> Self {
        FlowRow {
            row_num,
            time: record.time.clone(),
            market: record.market.to_string(),
            symbol: record.symbol.clone().unwrap_or_default(),
            type_display: record.type_display.clone(),
            tax_category: record.tax_category.as_str().to_string(),
            amount: format!("{:.2}", record.amount),
            is_pl: if record.is_pl { "yes" } else { "" }.to_string(),
            description: record.description.clone(),
        }
    }
}
