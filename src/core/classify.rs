use super::flow::NormalizedFlow;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Market bucket a record settles into for tax reporting.
///
/// Declaration order is the reporting order (and the `Ord` used to key the
/// report map): US, HK, CN, SG, OTHER.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Market {
    Us,
    Hk,
    Cn,
    Sg,
    Other,
}

impl Market {
    /// All buckets, in reporting order. Every one appears in a report even
    /// when no record matched it.
    pub const ALL: [Market; 5] = [
        Market::Us,
        Market::Hk,
        Market::Cn,
        Market::Sg,
        Market::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Market::Us => "US",
            Market::Hk => "HK",
            Market::Cn => "CN",
            Market::Sg => "SG",
            Market::Other => "OTHER",
        }
    }

    /// Infer the market for a record. The symbol suffix wins; the currency
    /// is the fallback; anything unrecognized lands in OTHER.
    pub fn infer(symbol: Option<&str>, currency: &str) -> Market {
        if let Some(symbol) = symbol {
            let symbol = symbol.trim().to_uppercase();
            if symbol.ends_with(".US") {
                return Market::Us;
            }
            if symbol.ends_with(".HK") {
                return Market::Hk;
            }
            if symbol.ends_with(".CN") || symbol.ends_with(".SH") || symbol.ends_with(".SZ") {
                return Market::Cn;
            }
            if symbol.ends_with(".SG") {
                return Market::Sg;
            }
        }
        match currency {
            "USD" => Market::Us,
            "HKD" => Market::Hk,
            "CNH" | "CNY" => Market::Cn,
            "SGD" => Market::Sg,
            _ => Market::Other,
        }
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Aggregation grouping for the tax report, distinct from the display label.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum TaxCategory {
    /// Not tax-relevant (deposits, withdrawals, conversions, unknown labels)
    #[default]
    Ignore,
    /// Purchase cost or trading fee; nets against trade income
    TradeCost,
    /// Sale proceeds
    TradeIncome,
    /// Dividend or interest income, taxed as one pool
    Dividend,
    /// Tax withheld abroad; credited against the estimated domestic tax
    ForeignTax,
}

impl TaxCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            TaxCategory::Ignore => "ignore",
            TaxCategory::TradeCost => "trade_cost",
            TaxCategory::TradeIncome => "trade_income",
            TaxCategory::Dividend => "dividend",
            TaxCategory::ForeignTax => "foreign_tax",
        }
    }
}

/// A normalized record with market, sign, and tax classification applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifiedFlow {
    pub time: String,
    pub symbol: Option<String>,
    pub market: Market,
    pub currency: String,
    #[serde(rename = "type_raw")]
    pub flow_name: String,
    pub type_display: String,
    pub description: String,
    /// Signed amount: outflow negative, inflow positive. Rounded to 2 dp.
    pub amount: Decimal,
    /// Whether this record counts toward profit/loss and tax computation
    pub is_pl: bool,
    pub tax_category: TaxCategory,
}

/// Labels containing any of these read as cash leaving the account.
const OUTFLOW_KEYWORDS: &[&str] = &[
    "BUY",
    "WITHDRAW",
    "OUT",
    "FEE",
    "TAX",
    "COMMISSION",
    "DEBIT",
];

/// Labels containing any of these read as cash entering the account.
const INFLOW_KEYWORDS: &[&str] = &["SELL", "DEPOSIT", "IN", "DIVIDEND", "INTEREST", "CREDIT"];

struct CategoryRule {
    keywords: &'static [&'static str],
    display: &'static str,
    category: TaxCategory,
    is_pl: bool,
}

impl CategoryRule {
    fn matches(&self, flow_name: &str) -> bool {
        self.keywords.iter().any(|k| flow_name.contains(k))
    }
}

/// Ordered classification rules, evaluated top to bottom; the first rule
/// whose keyword appears in the uppercased label wins. The order is a
/// contract: a label matching BUY is never also checked against SELL, and
/// reordering entries changes tax outcomes.
const CATEGORY_RULES: &[CategoryRule] = &[
    CategoryRule {
        keywords: &["BUY"],
        display: "Buy",
        category: TaxCategory::TradeCost,
        is_pl: true,
    },
    CategoryRule {
        keywords: &["SELL"],
        display: "Sell",
        category: TaxCategory::TradeIncome,
        is_pl: true,
    },
    CategoryRule {
        keywords: &["DIVIDEND"],
        display: "Cash Dividend",
        category: TaxCategory::Dividend,
        is_pl: true,
    },
    CategoryRule {
        // Interest is taxed at the same rate as dividends
        keywords: &["INTEREST"],
        display: "Cash Interest",
        category: TaxCategory::Dividend,
        is_pl: true,
    },
    CategoryRule {
        keywords: &["FEE", "COMMISSION"],
        display: "Trading Fee",
        category: TaxCategory::TradeCost,
        is_pl: true,
    },
    CategoryRule {
        // An outflow for P/L purposes, but tracked separately so it can be
        // credited against the estimated domestic tax
        keywords: &["TAX", "WITHHOLD"],
        display: "Foreign Withholding Tax",
        category: TaxCategory::ForeignTax,
        is_pl: true,
    },
    CategoryRule {
        keywords: &["DEPOSIT"],
        display: "Deposit",
        category: TaxCategory::Ignore,
        is_pl: false,
    },
    CategoryRule {
        keywords: &["WITHDRAW"],
        display: "Withdrawal",
        category: TaxCategory::Ignore,
        is_pl: false,
    },
    CategoryRule {
        keywords: &["CONVERSION", "EXCHANGE"],
        display: "Currency Conversion",
        category: TaxCategory::Ignore,
        is_pl: false,
    },
];

/// Signed amount for a record. Keyword lists take precedence; the raw
/// direction field is consulted only when the label matches neither list.
fn signed_amount(flow: &NormalizedFlow) -> Decimal {
    let contains_any = |keywords: &[&str]| keywords.iter().any(|k| flow.flow_name.contains(k));
    if contains_any(OUTFLOW_KEYWORDS) {
        return -flow.abs_amount;
    }
    if contains_any(INFLOW_KEYWORDS) {
        return flow.abs_amount;
    }
    match flow.direction.as_deref().map(str::trim) {
        Some("1") => -flow.abs_amount,
        _ => flow.abs_amount,
    }
}

/// Classify a normalized record. Pure function of its input; malformed
/// data degrades to the ignore/OTHER path rather than failing.
pub fn classify(flow: NormalizedFlow) -> ClassifiedFlow {
    let market = Market::infer(flow.symbol.as_deref(), &flow.currency);
    let amount = signed_amount(&flow).round_dp(2);

    let (type_display, tax_category, is_pl) =
        match CATEGORY_RULES.iter().find(|r| r.matches(&flow.flow_name)) {
            Some(rule) => (rule.display.to_string(), rule.category, rule.is_pl),
            None => {
                log::warn!("unclassified flow label: {}", flow.flow_name);
                (flow.flow_name.clone(), TaxCategory::Ignore, false)
            }
        };

    ClassifiedFlow {
        time: flow.time,
        symbol: flow.symbol,
        market,
        currency: flow.currency,
        flow_name: flow.flow_name,
        type_display,
        description: flow.description,
        amount,
        is_pl,
        tax_category,
    }
}
