pub mod flows;
pub mod report;
pub mod schema;

use crate::core::{CashFlowInput, RawCashFlow};
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

/// Read raw cash flows from a JSON or CSV file (or stdin with "-").
/// The format is picked by file extension; stdin is assumed to be JSON.
pub fn read_flows(path: &Path) -> anyhow::Result<Vec<RawCashFlow>> {
    if path.as_os_str() == "-" {
        return read_from_stdin();
    }
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("csv")) {
        parse_csv(reader)
    } else {
        parse_json(reader)
    }
}

fn read_from_stdin() -> anyhow::Result<Vec<RawCashFlow>> {
    let stdin = io::stdin();
    let mut reader = BufReader::new(stdin.lock());

    let mut buffer = Vec::new();
    reader.read_to_end(&mut buffer)?;

    if buffer.is_empty() {
        anyhow::bail!("No input received. Provide a file or pipe data to stdin.");
    }

    parse_json(io::Cursor::new(buffer))
}

/// Parse the JSON input root: `{"flows": [...]}`, with a bare top-level
/// array accepted as a convenience.
fn parse_json<R: Read>(mut reader: R) -> anyhow::Result<Vec<RawCashFlow>> {
    let mut buffer = Vec::new();
    reader.read_to_end(&mut buffer)?;

    match serde_json::from_slice::<CashFlowInput>(&buffer) {
        Ok(input) => Ok(input.flows),
        Err(root_err) => serde_json::from_slice::<Vec<RawCashFlow>>(&buffer)
            .map_err(|_| anyhow::anyhow!("invalid cash-flow JSON: {root_err}")),
    }
}

fn parse_csv<R: Read>(reader: R) -> anyhow::Result<Vec<RawCashFlow>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut flows = Vec::new();
    for record in rdr.deserialize() {
        flows.push(record?);
    }
    Ok(flows)
}
