pub mod classify;
pub mod flow;
pub mod range;
pub mod report;

// Flat public surface for domain types and functions.
pub use classify::{classify, ClassifiedFlow, Market, TaxCategory};
pub use flow::{CashFlowInput, NormalizedFlow, RawCashFlow};
pub use range::{RangeError, ReportRange};
pub use report::{compute_tax_report, MarketSummary, TaxSummary, TAX_RATE};
