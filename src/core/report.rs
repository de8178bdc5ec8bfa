use super::classify::{classify, ClassifiedFlow, Market, TaxCategory};
use super::flow::RawCashFlow;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::collections::BTreeMap;

/// Flat rate applied to both net trade gains and dividend/interest income.
/// One shared pool; the foreign withholding credit is applied afterwards.
pub const TAX_RATE: Decimal = dec!(0.20);

/// Tax-relevant totals for one market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaxSummary {
    /// Sale proceeds net of purchase costs and fees
    pub trade_gain: Decimal,
    /// Dividend and interest income
    pub dividend_gain: Decimal,
    /// Tax already withheld abroad, reported as a positive figure
    pub foreign_tax: Decimal,
    /// Estimated domestic tax due after the foreign credit, floored at zero
    pub est_china_tax: Decimal,
    /// Taxable base: non-negative trade gain plus dividend gain
    pub taxable_income: Decimal,
}

/// Everything reported for one market bucket. Present for all five buckets
/// even when no record matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarketSummary {
    /// Classified records for this market, in input order
    pub records: Vec<ClassifiedFlow>,
    /// Net of all profit-relevant amounts
    pub total_pl: Decimal,
    pub tax_report: TaxSummary,
}

impl MarketSummary {
    fn from_records(records: Vec<ClassifiedFlow>) -> Self {
        let total_pl: Decimal = records
            .iter()
            .filter(|r| r.is_pl)
            .map(|r| r.amount)
            .sum();

        // Cost amounts are stored negative, so adding them to the income
        // sum nets sell proceeds against buys and fees.
        let trade_gain =
            sum_category(&records, TaxCategory::TradeIncome) + sum_category(&records, TaxCategory::TradeCost);
        let dividend_gain = sum_category(&records, TaxCategory::Dividend);
        let foreign_tax = sum_category(&records, TaxCategory::ForeignTax).abs();

        // Realized net trade losses are not deductible in this estimate;
        // a negative dividend sum is accepted as-is.
        let taxable_trade = trade_gain.max(Decimal::ZERO);
        let taxable_dividend = dividend_gain;

        let china_tax_base = taxable_trade * TAX_RATE + taxable_dividend * TAX_RATE;
        let est_china_tax = (china_tax_base - foreign_tax).max(Decimal::ZERO);

        MarketSummary {
            records,
            total_pl: total_pl.round_dp(2),
            tax_report: TaxSummary {
                trade_gain: trade_gain.round_dp(2),
                dividend_gain: dividend_gain.round_dp(2),
                foreign_tax: foreign_tax.round_dp(2),
                est_china_tax: est_china_tax.round_dp(2),
                taxable_income: (taxable_trade + taxable_dividend).round_dp(2),
            },
        }
    }
}

fn sum_category(records: &[ClassifiedFlow], category: TaxCategory) -> Decimal {
    records
        .iter()
        .filter(|r| r.tax_category == category)
        .map(|r| r.amount)
        .sum()
}

/// Classify a batch of raw cash flows and aggregate them into one summary
/// per market. `fallback_date` stands in for records without a timestamp.
///
/// The returned map always holds all five markets, keyed in reporting
/// order; the union of their record lists is exactly the classified input.
pub fn compute_tax_report(
    flows: &[RawCashFlow],
    fallback_date: NaiveDate,
) -> BTreeMap<Market, MarketSummary> {
    let mut buckets: BTreeMap<Market, Vec<ClassifiedFlow>> =
        Market::ALL.iter().map(|m| (*m, Vec::new())).collect();

    for raw in flows {
        let record = classify(raw.normalize(fallback_date));
        buckets.entry(record.market).or_default().push(record);
    }

    buckets
        .into_iter()
        .map(|(market, records)| (market, MarketSummary::from_records(records)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    fn raw(name: &str, balance: &str, symbol: Option<&str>) -> RawCashFlow {
        RawCashFlow {
            transaction_flow_name: Some(name.to_string()),
            balance: Some(balance.to_string()),
            symbol: symbol.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn all_five_markets_always_present() {
        let report = compute_tax_report(&[], date());
        let markets: Vec<Market> = report.keys().copied().collect();
        assert_eq!(markets, Market::ALL);
        for summary in report.values() {
            assert!(summary.records.is_empty());
            assert_eq!(summary.total_pl, Decimal::ZERO);
            assert_eq!(summary.tax_report.est_china_tax, Decimal::ZERO);
            assert_eq!(summary.tax_report.taxable_income, Decimal::ZERO);
        }
    }

    #[test]
    fn trade_gain_nets_sells_against_buys() {
        let flows = vec![
            raw("BUY", "1000", Some("AAPL.US")),
            raw("SELL", "1500", Some("AAPL.US")),
        ];
        let report = compute_tax_report(&flows, date());
        let us = &report[&Market::Us];
        assert_eq!(us.tax_report.trade_gain, dec!(500.00));
        assert_eq!(us.tax_report.taxable_income, dec!(500.00));
        assert_eq!(us.tax_report.est_china_tax, dec!(100.00));
        assert_eq!(us.tax_report.foreign_tax, dec!(0));
        assert_eq!(us.total_pl, dec!(500.00));
    }

    #[test]
    fn foreign_withholding_credits_against_estimate() {
        let flows = vec![
            raw("BUY", "1000", Some("AAPL.US")),
            raw("SELL", "1500", Some("AAPL.US")),
            raw("WITHHOLDING TAX", "30", Some("AAPL.US")),
        ];
        let report = compute_tax_report(&flows, date());
        let us = &report[&Market::Us];
        assert_eq!(us.tax_report.foreign_tax, dec!(30.00));
        assert_eq!(us.tax_report.est_china_tax, dec!(70.00));
        // The withheld tax still drags total P/L
        assert_eq!(us.total_pl, dec!(470.00));
    }

    #[test]
    fn foreign_credit_never_goes_negative() {
        let flows = vec![
            raw("DIVIDEND", "100", Some("AAPL.US")),
            raw("WITHHOLDING TAX", "45", Some("AAPL.US")),
        ];
        let report = compute_tax_report(&flows, date());
        let us = &report[&Market::Us];
        // Base is 20, credit is 45: floored at zero, never refunded
        assert_eq!(us.tax_report.est_china_tax, dec!(0));
    }

    #[test]
    fn net_trade_losses_are_not_deductible() {
        let flows = vec![
            raw("BUY", "2000", Some("AAPL.US")),
            raw("SELL", "1500", Some("AAPL.US")),
        ];
        let report = compute_tax_report(&flows, date());
        let us = &report[&Market::Us];
        assert_eq!(us.tax_report.trade_gain, dec!(-500.00));
        assert_eq!(us.tax_report.taxable_income, dec!(0));
        assert_eq!(us.tax_report.est_china_tax, dec!(0));
    }

    #[test]
    fn losses_do_not_shelter_dividends() {
        let flows = vec![
            raw("BUY", "2000", Some("AAPL.US")),
            raw("SELL", "1500", Some("AAPL.US")),
            raw("DIVIDEND", "100", Some("AAPL.US")),
        ];
        let report = compute_tax_report(&flows, date());
        let us = &report[&Market::Us];
        // Trade loss is excluded from the base, the dividend is taxed in full
        assert_eq!(us.tax_report.taxable_income, dec!(100.00));
        assert_eq!(us.tax_report.est_china_tax, dec!(20.00));
    }

    #[test]
    fn deposits_never_touch_the_sums() {
        let flows = vec![RawCashFlow {
            transaction_flow_name: Some("DEPOSIT".to_string()),
            balance: Some("5000".to_string()),
            currency: Some("USD".to_string()),
            ..Default::default()
        }];
        let report = compute_tax_report(&flows, date());
        let us = &report[&Market::Us];
        assert_eq!(us.records.len(), 1);
        assert!(!us.records[0].is_pl);
        assert_eq!(us.total_pl, dec!(0));
        assert_eq!(us.tax_report.taxable_income, dec!(0));
        assert_eq!(us.tax_report.est_china_tax, dec!(0));
    }

    #[test]
    fn records_partition_the_input_in_order() {
        let flows = vec![
            raw("BUY", "100", Some("AAPL.US")),
            raw("DIVIDEND", "10", Some("0700.HK")),
            raw("SELL", "200", Some("AAPL.US")),
            raw("MYSTERY", "1", None),
            raw("BUY", "50", Some("D05.SG")),
        ];
        let report = compute_tax_report(&flows, date());

        let total: usize = report.values().map(|s| s.records.len()).sum();
        assert_eq!(total, flows.len());

        // Per-bucket order preserves input order
        let us = &report[&Market::Us];
        assert_eq!(us.records[0].flow_name, "BUY");
        assert_eq!(us.records[1].flow_name, "SELL");
        // No symbol, USD default currency: lands in US with the rest
        assert_eq!(us.records[2].flow_name, "MYSTERY");
        assert_eq!(report[&Market::Hk].records.len(), 1);
        assert_eq!(report[&Market::Sg].records.len(), 1);
        assert!(report[&Market::Cn].records.is_empty());
        assert!(report[&Market::Other].records.is_empty());
    }

    #[test]
    fn markets_are_summed_independently() {
        let flows = vec![
            raw("SELL", "1000", Some("AAPL.US")),
            raw("BUY", "400", Some("0700.HK")),
            raw("DIVIDEND", "50", Some("0700.HK")),
        ];
        let report = compute_tax_report(&flows, date());
        assert_eq!(report[&Market::Us].tax_report.trade_gain, dec!(1000.00));
        assert_eq!(report[&Market::Hk].tax_report.trade_gain, dec!(-400.00));
        assert_eq!(report[&Market::Hk].tax_report.dividend_gain, dec!(50.00));
        assert_eq!(report[&Market::Hk].tax_report.est_china_tax, dec!(10.00));
    }

    #[test]
    fn unrecognized_currency_lands_in_other() {
        let flows = vec![RawCashFlow {
            transaction_flow_name: Some("DIVIDEND".to_string()),
            balance: Some("10".to_string()),
            currency: Some("XYZ".to_string()),
            ..Default::default()
        }];
        let report = compute_tax_report(&flows, date());
        assert_eq!(report[&Market::Other].records.len(), 1);
        assert_eq!(report[&Market::Other].tax_report.dividend_gain, dec!(10.00));
    }

    #[test]
    fn malformed_rows_degrade_instead_of_failing() {
        let flows = vec![RawCashFlow {
            balance: Some("not a number".to_string()),
            ..Default::default()
        }];
        let report = compute_tax_report(&flows, date());
        let us = &report[&Market::Us];
        assert_eq!(us.records.len(), 1);
        assert_eq!(us.records[0].amount, Decimal::ZERO);
        assert_eq!(us.records[0].flow_name, "UNKNOWN");
        assert_eq!(us.records[0].time, "2024-01-01");
    }

    #[test]
    fn report_fields_rounded_to_two_decimals() {
        let flows = vec![
            raw("SELL", "100.555", Some("AAPL.US")),
            raw("DIVIDEND", "10.125", Some("AAPL.US")),
        ];
        let report = compute_tax_report(&flows, date());
        let us = &report[&Market::Us];
        // Per-record amounts round at storage, report fields once at output
        assert_eq!(us.records[0].amount, dec!(100.56));
        assert_eq!(us.records[1].amount, dec!(10.12));
        assert_eq!(us.tax_report.taxable_income, dec!(110.68));
        assert_eq!(us.tax_report.est_china_tax, dec!(22.14));
    }
}
