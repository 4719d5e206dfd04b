//! SIP and FOB metrics for one instrument's option chain.
//!
//! SIP levels are volume-weighted mean strikes converted to quote units. FOB
//! metrics are plain volume/change sums split into in- and out-of-the-money
//! buckets relative to the close price. Every mean is weighted by `at_close`;
//! a zero total weight yields a zero level instead of an error. All sums and
//! products are checked; an overflow fails the instrument with
//! [`MetricsError::Overflow`].
//!
//! For inverse-quoted instruments (CAD, JPY) each mean `m` becomes
//! `coefficient / m`, the up/down levels swap sides and the balance levels are
//! fed by the opposite bucket, so the levels read in the market's quoting
//! direction.

use crate::chain::{OptionChain, OptionRow, Side};
use crate::instrument::{Instrument, Quoting};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetricsError {
    /// A side had no rows after extraction.
    #[error("no {0} rows to compute metrics from")]
    EmptySide(Side),

    #[error("arithmetic overflow while aggregating strikes")]
    Overflow,
}

/// Volume-weighted strike levels in quote units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SipMetrics {
    #[serde(with = "rust_decimal::serde::float")]
    pub up_level: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub down_level: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub up_balance_level: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub down_balance_level: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub red_balance_level: Decimal,
}

/// In/out-of-the-money aggregates; `_i` fields sum volume, `_j` fields sum change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FobMetrics {
    pub opt_in_money_call_i: i64,
    pub opt_in_money_call_j: i64,
    pub opt_in_money_put_i: i64,
    pub opt_in_money_put_j: i64,
    pub opt_without_money_call_i: i64,
    pub opt_without_money_call_j: i64,
    pub opt_without_money_put_i: i64,
    pub opt_without_money_put_j: i64,
}

/// One strike row as published: the strike in quote units plus its volume and change.
///
/// Field names on the wire are the ones the terminal indicator reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrikePoint {
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(rename = "strike")]
    pub volume: i64,
    #[serde(rename = "delta")]
    pub change: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrikeTable {
    pub calls: Vec<StrikePoint>,
    pub puts: Vec<StrikePoint>,
}

/// Full per-instrument result document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsResult {
    pub strike: StrikeTable,
    pub sip: SipMetrics,
    pub fob: FobMetrics,
}

/// Parameters that drive the calculation for one instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsParams {
    /// Close price in strike units.
    pub close: Decimal,
    pub coefficient: Decimal,
    pub quoting: Quoting,
}

impl MetricsParams {
    #[must_use]
    pub fn for_instrument(instrument: Instrument, close: Decimal) -> Self {
        Self {
            close,
            coefficient: instrument.coefficient(),
            quoting: instrument.quoting(),
        }
    }
}

pub struct MetricsCalculator;

impl MetricsCalculator {
    /// Computes the strike table, SIP and FOB metrics for a chain.
    ///
    /// # Errors
    /// Returns `MetricsError::EmptySide` if either side has no rows and
    /// `MetricsError::Overflow` if the volumes or weighted strikes overflow.
    pub fn compute(
        chain: &OptionChain,
        params: MetricsParams,
    ) -> Result<MetricsResult, MetricsError> {
        if chain.calls.is_empty() {
            return Err(MetricsError::EmptySide(Side::Calls));
        }
        if chain.puts.is_empty() {
            return Err(MetricsError::EmptySide(Side::Puts));
        }

        Ok(MetricsResult {
            strike: Self::strike_table(chain, params),
            sip: Self::sip(chain, params)?,
            fob: Self::fob(chain, params.close)?,
        })
    }

    /// # Errors
    /// Returns `MetricsError::Overflow` if a weighted sum overflows.
    pub fn sip(chain: &OptionChain, params: MetricsParams) -> Result<SipMetrics, MetricsError> {
        let close = params.close;
        let calls_below: Vec<&OptionRow> = chain
            .calls
            .iter()
            .filter(|r| Decimal::from(r.strike) < close)
            .collect();
        let puts_above: Vec<&OptionRow> = chain
            .puts
            .iter()
            .filter(|r| Decimal::from(r.strike) > close)
            .collect();

        let calls_mean = weighted_mean(&chain.calls)?;
        let puts_mean = weighted_mean(&chain.puts)?;
        let calls_below_mean = weighted_mean(calls_below.iter().copied())?;
        let puts_above_mean = weighted_mean(puts_above.iter().copied())?;
        let red_mean = weighted_mean(calls_below.iter().chain(puts_above.iter()).copied())?;

        let (up, down, up_balance, down_balance) = match params.quoting {
            Quoting::Direct => (calls_mean, puts_mean, puts_above_mean, calls_below_mean),
            Quoting::Inverse => (puts_mean, calls_mean, calls_below_mean, puts_above_mean),
        };

        let level = |mean| to_quote_units(mean, params.coefficient, params.quoting);
        Ok(SipMetrics {
            up_level: level(up),
            down_level: level(down),
            up_balance_level: level(up_balance),
            down_balance_level: level(down_balance),
            red_balance_level: level(red_mean),
        })
    }

    /// # Errors
    /// Returns `MetricsError::Overflow` if a volume or change sum overflows `i64`.
    pub fn fob(chain: &OptionChain, close: Decimal) -> Result<FobMetrics, MetricsError> {
        let mut fob = FobMetrics::default();

        for row in &chain.calls {
            let strike = Decimal::from(row.strike);
            if strike < close {
                accumulate(&mut fob.opt_in_money_call_i, row.at_close)?;
                accumulate(&mut fob.opt_in_money_call_j, row.change)?;
            } else if strike > close {
                accumulate(&mut fob.opt_without_money_call_i, row.at_close)?;
                accumulate(&mut fob.opt_without_money_call_j, row.change)?;
            }
        }

        for row in &chain.puts {
            let strike = Decimal::from(row.strike);
            if strike > close {
                accumulate(&mut fob.opt_in_money_put_i, row.at_close)?;
                accumulate(&mut fob.opt_in_money_put_j, row.change)?;
            } else if strike < close {
                accumulate(&mut fob.opt_without_money_put_i, row.at_close)?;
                accumulate(&mut fob.opt_without_money_put_j, row.change)?;
            }
        }

        Ok(fob)
    }

    #[must_use]
    pub fn strike_table(chain: &OptionChain, params: MetricsParams) -> StrikeTable {
        let point = |row: &OptionRow| StrikePoint {
            price: to_quote_units(
                Some(Decimal::from(row.strike)),
                params.coefficient,
                params.quoting,
            ),
            volume: row.at_close,
            change: row.change,
        };

        StrikeTable {
            calls: chain.calls.iter().map(point).collect(),
            puts: chain.puts.iter().map(point).collect(),
        }
    }
}

fn accumulate(total: &mut i64, value: i64) -> Result<(), MetricsError> {
    *total = total.checked_add(value).ok_or(MetricsError::Overflow)?;
    Ok(())
}

/// Volume-weighted mean strike, `None` when the total volume is zero.
fn weighted_mean<'a>(
    rows: impl IntoIterator<Item = &'a OptionRow>,
) -> Result<Option<Decimal>, MetricsError> {
    let mut weighted = Decimal::ZERO;
    let mut volume = Decimal::ZERO;
    for row in rows {
        let at_close = Decimal::from(row.at_close);
        weighted = Decimal::from(row.strike)
            .checked_mul(at_close)
            .and_then(|product| weighted.checked_add(product))
            .ok_or(MetricsError::Overflow)?;
        volume = volume
            .checked_add(at_close)
            .ok_or(MetricsError::Overflow)?;
    }

    Ok(weighted.checked_div(volume))
}

fn to_quote_units(mean: Option<Decimal>, coefficient: Decimal, quoting: Quoting) -> Decimal {
    let scaled = match (mean, quoting) {
        (None, _) => None,
        (Some(mean), Quoting::Direct) => mean.checked_div(coefficient),
        (Some(mean), Quoting::Inverse) => coefficient.checked_div(mean),
    };
    scaled.unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn direct(close: Decimal, coefficient: Decimal) -> MetricsParams {
        MetricsParams {
            close,
            coefficient,
            quoting: Quoting::Direct,
        }
    }

    fn eur_chain() -> OptionChain {
        OptionChain::new(
            vec![OptionRow::new(10800, 10, 2), OptionRow::new(10850, 5, -1)],
            vec![OptionRow::new(10900, 8, 3)],
        )
    }

    #[test]
    fn test_direct_levels() {
        let sip = MetricsCalculator::sip(&eur_chain(), direct(dec!(10850), dec!(10000))).unwrap();

        let expected_up =
            (dec!(10800) * dec!(10) + dec!(10850) * dec!(5)) / dec!(15) / dec!(10000);
        assert_eq!(sip.up_level, expected_up);
        assert_eq!(sip.down_level, dec!(1.09));
        // only the 10800 call sits below the close
        assert_eq!(sip.down_balance_level, dec!(1.08));
        assert_eq!(sip.up_balance_level, dec!(1.09));
        let expected_red =
            (dec!(10800) * dec!(10) + dec!(10900) * dec!(8)) / dec!(18) / dec!(10000);
        assert_eq!(sip.red_balance_level, expected_red);
    }

    #[test]
    fn test_inverse_down_level_is_reciprocal() {
        let chain = OptionChain::new(
            vec![OptionRow::new(1_000_000, 1, 0)],
            vec![OptionRow::new(500_000, 1, 0)],
        );
        let params = MetricsParams::for_instrument(Instrument::Jpy, dec!(700000));
        let sip = MetricsCalculator::sip(&chain, params).unwrap();

        assert_eq!(sip.down_level, Instrument::Jpy.coefficient() / dec!(1000000));
        assert_eq!(sip.down_level, dec!(1));
        assert_eq!(sip.up_level, dec!(2));
    }

    #[test]
    fn test_inverse_balance_levels_swap_buckets() {
        let chain = OptionChain::new(
            vec![OptionRow::new(6000, 4, 0), OptionRow::new(8000, 1, 0)],
            vec![OptionRow::new(7000, 2, 0), OptionRow::new(9000, 3, 0)],
        );
        let params = MetricsParams {
            close: dec!(7500),
            coefficient: dec!(1000000),
            quoting: Quoting::Inverse,
        };
        let sip = MetricsCalculator::sip(&chain, params).unwrap();

        // calls below close feed the up balance
        assert_eq!(sip.up_balance_level, dec!(1000000) / dec!(6000));
        // puts above close feed the down balance
        assert_eq!(sip.down_balance_level, dec!(1000000) / dec!(9000));
        let red_mean = (dec!(6000) * dec!(4) + dec!(9000) * dec!(3)) / dec!(7);
        assert_eq!(sip.red_balance_level, dec!(1000000) / red_mean);
    }

    #[test]
    fn test_zero_volume_side_yields_zero_levels() {
        let chain = OptionChain::new(
            vec![OptionRow::new(10800, 0, 0), OptionRow::new(10900, 0, 0)],
            vec![OptionRow::new(10700, 0, 0)],
        );
        let sip = MetricsCalculator::sip(&chain, direct(dec!(10850), dec!(10000))).unwrap();

        assert_eq!(sip.up_level, Decimal::ZERO);
        assert_eq!(sip.down_level, Decimal::ZERO);
        assert_eq!(sip.down_balance_level, Decimal::ZERO);
        assert_eq!(sip.red_balance_level, Decimal::ZERO);

        let inverse = MetricsParams {
            quoting: Quoting::Inverse,
            ..direct(dec!(10850), dec!(10000))
        };
        let sip = MetricsCalculator::sip(&chain, inverse).unwrap();
        assert_eq!(sip.up_level, Decimal::ZERO);
        assert_eq!(sip.down_level, Decimal::ZERO);
    }

    #[test]
    fn test_no_rows_beyond_close_gives_zero_balance() {
        let chain = OptionChain::new(
            vec![OptionRow::new(11000, 5, 0)],
            vec![OptionRow::new(10000, 5, 0)],
        );
        let sip = MetricsCalculator::sip(&chain, direct(dec!(10500), dec!(10000))).unwrap();

        assert_eq!(sip.up_balance_level, Decimal::ZERO);
        assert_eq!(sip.down_balance_level, Decimal::ZERO);
        assert_eq!(sip.red_balance_level, Decimal::ZERO);
    }

    #[test]
    fn test_fob_partitions_excluding_close_strike() {
        let chain = OptionChain::new(
            vec![
                OptionRow::new(100, 10, 1),
                OptionRow::new(105, 7, 7),
                OptionRow::new(110, 20, -2),
            ],
            vec![
                OptionRow::new(95, 4, 3),
                OptionRow::new(105, 9, 9),
                OptionRow::new(115, 6, -5),
            ],
        );
        let fob = MetricsCalculator::fob(&chain, dec!(105)).unwrap();

        assert_eq!(
            fob,
            FobMetrics {
                opt_in_money_call_i: 10,
                opt_in_money_call_j: 1,
                opt_in_money_put_i: 6,
                opt_in_money_put_j: -5,
                opt_without_money_call_i: 20,
                opt_without_money_call_j: -2,
                opt_without_money_put_i: 4,
                opt_without_money_put_j: 3,
            }
        );
    }

    #[test]
    fn test_strike_table_prices() {
        let chain = eur_chain();
        let table = MetricsCalculator::strike_table(&chain, direct(dec!(10850), dec!(10000)));
        assert_eq!(table.calls.len(), 2);
        assert_eq!(table.puts.len(), 1);
        assert_eq!(table.calls[0].price, dec!(1.08));
        assert_eq!(table.calls[0].volume, 10);
        assert_eq!(table.calls[1].change, -1);

        let inverse = MetricsParams::for_instrument(Instrument::Cad, dec!(7326));
        let chain = OptionChain::new(
            vec![OptionRow::new(0, 1, 0)],
            vec![OptionRow::new(8000, 1, 0)],
        );
        let table = MetricsCalculator::strike_table(&chain, inverse);
        assert_eq!(table.calls[0].price, Decimal::ZERO);
        assert_eq!(table.puts[0].price, dec!(1250));
    }

    #[test]
    fn test_empty_side_is_an_error() {
        let params = direct(dec!(10850), dec!(10000));
        let no_calls = OptionChain::new(vec![], vec![OptionRow::new(1, 1, 1)]);
        assert_eq!(
            MetricsCalculator::compute(&no_calls, params),
            Err(MetricsError::EmptySide(Side::Calls))
        );

        let no_puts = OptionChain::new(vec![OptionRow::new(1, 1, 1)], vec![]);
        assert_eq!(
            MetricsCalculator::compute(&no_puts, params),
            Err(MetricsError::EmptySide(Side::Puts))
        );
    }

    #[test]
    fn test_weighted_strike_overflow_is_an_error() {
        let chain = OptionChain::new(
            vec![OptionRow::new(i64::MAX, i64::MAX, 1)],
            vec![OptionRow::new(10900, 8, 3)],
        );
        let params = direct(dec!(10850), dec!(10000));

        assert_eq!(
            MetricsCalculator::sip(&chain, params),
            Err(MetricsError::Overflow)
        );
        assert_eq!(
            MetricsCalculator::compute(&chain, params),
            Err(MetricsError::Overflow)
        );
    }

    #[test]
    fn test_fob_sum_overflow_is_an_error() {
        let chain = OptionChain::new(
            vec![OptionRow::new(100, i64::MAX, 0), OptionRow::new(101, 1, 0)],
            vec![OptionRow::new(90, 1, 0)],
        );
        assert_eq!(
            MetricsCalculator::fob(&chain, dec!(105)),
            Err(MetricsError::Overflow)
        );

        let chain = OptionChain::new(
            vec![OptionRow::new(100, 1, i64::MIN), OptionRow::new(101, 1, -1)],
            vec![OptionRow::new(90, 1, 0)],
        );
        assert_eq!(
            MetricsCalculator::fob(&chain, dec!(105)),
            Err(MetricsError::Overflow)
        );
    }

    #[test]
    fn test_result_serializes_native_numbers() {
        let result =
            MetricsCalculator::compute(&eur_chain(), direct(dec!(10850), dec!(10000))).unwrap();
        let value = serde_json::to_value(&result).unwrap();

        assert!(value["sip"]["up_level"].is_f64());
        assert!(value["strike"]["calls"][0]["price"].is_f64());
        assert_eq!(value["strike"]["calls"][0]["strike"], 10);
        assert_eq!(value["strike"]["calls"][1]["delta"], -1);
        assert_eq!(value["fob"]["opt_in_money_call_i"], 10);
    }
}
