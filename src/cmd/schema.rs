//! Schema command - print expected input formats

use crate::core::CashFlowInput;
use clap::Args;
use schemars::schema_for;

#[derive(Args, Debug)]
pub struct SchemaCommand {
    /// Output format: json-schema, csv-header, or csv-fields
    #[arg(value_enum, default_value = "json-schema")]
    format: SchemaFormat,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum SchemaFormat {
    /// JSON Schema for the input format
    JsonSchema,
    /// CSV header row with column names
    CsvHeader,
    /// CSV column descriptions
    CsvFields,
}

impl SchemaCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        match self.format {
            SchemaFormat::JsonSchema => self.print_json_schema(),
            SchemaFormat::CsvHeader => self.print_csv_header(),
            SchemaFormat::CsvFields => self.print_csv_fields(),
        }
    }

    fn print_json_schema(&self) -> anyhow::Result<()> {
        let schema = schema_for!(CashFlowInput);
        println!("{}", serde_json::to_string_pretty(&schema)?);
        Ok(())
    }

    fn print_csv_header(&self) -> anyhow::Result<()> {
        println!("{}", CSV_COLUMNS.join(","));
        Ok(())
    }

    fn print_csv_fields(&self) -> anyhow::Result<()> {
        println!("CSV Input Format");
        println!("================");
        println!();
        for (name, required, description) in CSV_FIELD_DESCRIPTIONS {
            let req = if *required { "required" } else { "optional" };
            println!("{:24} ({:8})  {}", name, req, description);
        }
        println!();
        println!("Empty fields count as absent; the sign of balance is ignored.");
        Ok(())
    }
}

const CSV_COLUMNS: &[&str] = &[
    "business_time",
    "transaction_time",
    "symbol",
    "currency",
    "description",
    "remark",
    "transaction_flow_name",
    "balance",
    "direction",
];

const CSV_FIELD_DESCRIPTIONS: &[(&str, bool, &str)] = &[
    (
        "business_time",
        false,
        "Business timestamp, preferred when present",
    ),
    (
        "transaction_time",
        false,
        "Transaction timestamp, used when business_time is empty",
    ),
    (
        "symbol",
        false,
        "Ticker, may carry a market suffix (.US, .HK, .CN, .SH, .SZ, .SG)",
    ),
    ("currency", false, "3-letter code; USD assumed when empty"),
    ("description", false, "Free-text description"),
    ("remark", false, "Alternate description field"),
    (
        "transaction_flow_name",
        false,
        "Flow type label (BUY, SELL, DIVIDEND, ...), any case",
    ),
    (
        "balance",
        false,
        "Magnitude of the flow; unparseable values count as zero",
    ),
    (
        "direction",
        false,
        "Fallback sign signal: 1 = outflow, used when the label is ambiguous",
    ),
];
