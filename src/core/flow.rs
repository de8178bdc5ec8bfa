use chrono::NaiveDate;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Input root for cash-flow JSON
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CashFlowInput {
    pub flows: Vec<RawCashFlow>,
}

/// One cash-flow record as reported by the brokerage.
///
/// Every field is optional and tolerated in whatever shape the upstream
/// sends it; missing or malformed data degrades to a safe default during
/// normalization instead of failing the batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct RawCashFlow {
    /// Business timestamp, preferred when present
    #[serde(deserialize_with = "de_opt_str")]
    pub business_time: Option<String>,
    /// Transaction timestamp, used when business_time is absent
    #[serde(deserialize_with = "de_opt_str")]
    pub transaction_time: Option<String>,
    /// Ticker, may carry a market suffix (.US, .HK, .CN, .SH, .SZ, .SG)
    #[serde(deserialize_with = "de_opt_str")]
    pub symbol: Option<String>,
    /// 3-letter currency code; USD assumed when absent
    #[serde(deserialize_with = "de_opt_str")]
    pub currency: Option<String>,
    #[serde(deserialize_with = "de_opt_str")]
    pub description: Option<String>,
    /// Alternate description field used by some upstream records
    #[serde(deserialize_with = "de_opt_str")]
    pub remark: Option<String>,
    /// Flow type label (e.g. BUY, SELL, DIVIDEND), matched case-insensitively
    #[serde(deserialize_with = "de_opt_str")]
    pub transaction_flow_name: Option<String>,
    /// Magnitude of the flow; the sign is not trusted. String or number.
    #[serde(deserialize_with = "de_opt_scalar")]
    #[schemars(with = "Option<String>")]
    pub balance: Option<String>,
    /// Fallback direction signal: "1" means outflow. String or number.
    #[serde(deserialize_with = "de_opt_scalar")]
    #[schemars(with = "Option<String>")]
    pub direction: Option<String>,
}

/// A raw record after normalization: safe defaults applied, label
/// uppercased, magnitude parsed. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedFlow {
    /// String timestamp; the query start date when the source gives none
    pub time: String,
    pub symbol: Option<String>,
    pub currency: String,
    pub description: String,
    /// Uppercased raw label; the only field used for keyword matching
    pub flow_name: String,
    /// Non-negative magnitude; unparseable input coerces to zero
    pub abs_amount: Decimal,
    /// Raw direction signal, consulted only when the label is ambiguous
    pub direction: Option<String>,
}

impl RawCashFlow {
    /// Normalize this record with `fallback_date` standing in for a
    /// missing timestamp. Never fails: row-level data quality issues
    /// degrade to defaults.
    pub fn normalize(&self, fallback_date: NaiveDate) -> NormalizedFlow {
        let time = self
            .business_time
            .clone()
            .or_else(|| self.transaction_time.clone())
            .unwrap_or_else(|| fallback_date.format("%Y-%m-%d").to_string());

        let flow_name = self
            .transaction_flow_name
            .as_deref()
            .unwrap_or("Unknown")
            .to_uppercase();

        let abs_amount = self
            .balance
            .as_deref()
            .and_then(|s| Decimal::from_str(s.trim()).ok())
            .unwrap_or(Decimal::ZERO)
            .abs();

        NormalizedFlow {
            time,
            symbol: self.symbol.clone(),
            currency: self.currency.clone().unwrap_or_else(|| "USD".to_string()),
            description: self
                .description
                .clone()
                .or_else(|| self.remark.clone())
                .unwrap_or_default(),
            flow_name,
            abs_amount,
            direction: self.direction.clone(),
        }
    }
}

/// Optional string where an empty or whitespace-only value counts as absent.
fn de_opt_str<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

/// Optional scalar accepted as either a string or a number, captured as a
/// string for later parsing. Upstream records are inconsistent about which
/// form they use for `balance` and `direction`.
fn de_opt_scalar<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct ScalarVisitor;

    impl<'de> serde::de::Visitor<'de> for ScalarVisitor {
        type Value = Option<String>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            write!(f, "a string, a number, or null")
        }

        fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Self::Value, E> {
            if v.trim().is_empty() {
                Ok(None)
            } else {
                Ok(Some(v.to_owned()))
            }
        }

        fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_f64<E: serde::de::Error>(self, v: f64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_none<E: serde::de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D2: Deserializer<'de>>(self, d: D2) -> Result<Self::Value, D2::Error> {
            d.deserialize_any(ScalarVisitor)
        }
    }

    deserializer.deserialize_any(ScalarVisitor)
}
