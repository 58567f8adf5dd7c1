//! Trade analytics: summary statistics and chart-ready series.
//!
//! Everything here is a pure transform over a slice of trades. An empty slice
//! is valid input and yields zeroed stats and empty series. Divisions that
//! would produce `NaN`/`Infinity` are replaced by 0 before leaving this module.

use super::trade::{Outcome, Trade};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryStats {
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub breakeven_trades: usize,
    /// Percentage, 0..=100.
    pub win_rate: f64,
    pub total_profit: f64,
    pub profit_factor: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    pub average_win: f64,
    /// Reported as a positive magnitude.
    pub average_loss: f64,
}

impl SummaryStats {
    pub fn compute(trades: &[Trade]) -> Self {
        if trades.is_empty() {
            return SummaryStats::default();
        }

        let mut winning_trades = 0usize;
        let mut losing_trades = 0usize;
        let mut breakeven_trades = 0usize;
        let mut gross_wins = 0.0_f64;
        let mut gross_losses = 0.0_f64;
        let mut total_profit = 0.0_f64;
        let mut largest_win = f64::NEG_INFINITY;
        let mut largest_loss = f64::INFINITY;

        for trade in trades {
            let result = trade.result_amount;
            total_profit += result;
            largest_win = largest_win.max(result);
            largest_loss = largest_loss.min(result);
            match trade.outcome() {
                Outcome::Win => {
                    winning_trades += 1;
                    gross_wins += result;
                }
                Outcome::Loss => {
                    losing_trades += 1;
                    gross_losses += result.abs();
                }
                Outcome::Breakeven => breakeven_trades += 1,
            }
        }

        let total_trades = trades.len();
        let win_rate = winning_trades as f64 / total_trades as f64 * 100.0;

        let profit_factor = if gross_losses > 0.0 {
            gross_wins / gross_losses
        } else {
            0.0
        };

        let average_win = if winning_trades > 0 {
            gross_wins / winning_trades as f64
        } else {
            0.0
        };

        let average_loss = if losing_trades > 0 {
            gross_losses / losing_trades as f64
        } else {
            0.0
        };

        SummaryStats {
            total_trades,
            winning_trades,
            losing_trades,
            breakeven_trades,
            win_rate: finite_or_zero(win_rate),
            total_profit: finite_or_zero(total_profit),
            profit_factor: finite_or_zero(profit_factor),
            largest_win: finite_or_zero(largest_win),
            largest_loss: finite_or_zero(largest_loss),
            average_win: finite_or_zero(average_win),
            average_loss: finite_or_zero(average_loss),
        }
    }

    /// Copy with every monetary/ratio field rounded to `decimals` places.
    pub fn rounded(&self, decimals: i32) -> Self {
        let r = |v: f64| round_to(v, decimals);
        SummaryStats {
            win_rate: r(self.win_rate),
            total_profit: r(self.total_profit),
            profit_factor: r(self.profit_factor),
            largest_win: r(self.largest_win),
            largest_loss: r(self.largest_loss),
            average_win: r(self.average_win),
            average_loss: r(self.average_loss),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EquityPoint {
    /// 1-based position in close-time order.
    pub index: usize,
    pub cumulative_equity: f64,
    #[serde(with = "super::trade::timestamp")]
    pub date: NaiveDateTime,
    pub trade_profit: f64,
}

/// Trades ordered by close time, ready to be scanned into an equity curve.
///
/// The sort is stable, so trades closing at the same instant keep their
/// input order. Iterating twice yields the same points.
#[derive(Debug, Clone)]
pub struct EquityCurve<'a> {
    ordered: Vec<&'a Trade>,
}

impl<'a> EquityCurve<'a> {
    pub fn new(trades: &'a [Trade]) -> Self {
        let mut ordered: Vec<&Trade> = trades.iter().collect();
        ordered.sort_by_key(|t| t.close_time);
        EquityCurve { ordered }
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    pub fn iter(&self) -> EquityIter<'_, 'a> {
        EquityIter {
            trades: self.ordered.iter(),
            index: 0,
            equity: 0.0,
        }
    }
}

impl<'c, 'a> IntoIterator for &'c EquityCurve<'a> {
    type Item = EquityPoint;
    type IntoIter = EquityIter<'c, 'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Running-sum scan over an [`EquityCurve`].
#[derive(Debug, Clone)]
pub struct EquityIter<'c, 'a> {
    trades: std::slice::Iter<'c, &'a Trade>,
    index: usize,
    equity: f64,
}

impl Iterator for EquityIter<'_, '_> {
    type Item = EquityPoint;

    fn next(&mut self) -> Option<EquityPoint> {
        let trade = self.trades.next()?;
        self.index += 1;
        self.equity += trade.result_amount;
        Some(EquityPoint {
            index: self.index,
            cumulative_equity: self.equity,
            date: trade.close_time,
            trade_profit: trade.result_amount,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.trades.size_hint()
    }
}

impl ExactSizeIterator for EquityIter<'_, '_> {}

pub fn equity_curve(trades: &[Trade]) -> Vec<EquityPoint> {
    EquityCurve::new(trades).iter().collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawdownPoint {
    pub index: usize,
    /// Percentage decline from the running peak, always <= 0.
    pub drawdown: f64,
    pub peak: f64,
    #[serde(with = "super::trade::timestamp")]
    pub date: NaiveDateTime,
}

/// Percentage drawdown from the running peak of an equity curve.
///
/// The peak is divided by its magnitude so a curve that starts below zero
/// still reports non-positive drawdowns; a zero peak reports 0.
pub fn drawdown_series(curve: &[EquityPoint]) -> Vec<DrawdownPoint> {
    let mut series = Vec::with_capacity(curve.len());
    let mut peak = f64::NEG_INFINITY;

    for point in curve {
        peak = peak.max(point.cumulative_equity);
        let drawdown = if peak == 0.0 {
            0.0
        } else {
            (point.cumulative_equity - peak) / peak.abs() * 100.0
        };
        series.push(DrawdownPoint {
            index: point.index,
            drawdown: finite_or_zero(drawdown),
            peak,
            date: point.date,
        });
    }

    series
}

/// Most negative drawdown; 0 for an empty series.
pub fn max_drawdown(series: &[DrawdownPoint]) -> f64 {
    series.iter().map(|p| p.drawdown).fold(0.0, f64::min)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyPerformance {
    /// `YYYY-MM` of the close time.
    pub month: String,
    pub profit: f64,
    pub trades: usize,
}

/// One record per month present in the input, ascending by month.
pub fn monthly_performance(trades: &[Trade]) -> Vec<MonthlyPerformance> {
    let mut months: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    for trade in trades {
        let key = trade.close_time.format("%Y-%m").to_string();
        let entry = months.entry(key).or_insert((0.0, 0));
        entry.0 += trade.result_amount;
        entry.1 += 1;
    }

    months
        .into_iter()
        .map(|(month, (profit, trades))| MonthlyPerformance {
            month,
            profit,
            trades,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskRewardPoint {
    pub pair: String,
    pub ratio: f64,
    pub result: f64,
    #[serde(with = "super::trade::timestamp")]
    pub date: NaiveDateTime,
}

/// One point per trade with a positive risk amount, in input order.
pub fn risk_reward_points(trades: &[Trade]) -> Vec<RiskRewardPoint> {
    trades
        .iter()
        .filter_map(|trade| {
            trade.risk_reward().map(|ratio| RiskRewardPoint {
                pair: trade.pair.clone(),
                ratio: finite_or_zero(ratio),
                result: trade.result_amount,
                date: trade.close_time,
            })
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WinLossCounts {
    pub wins: usize,
    pub losses: usize,
    pub breakeven: usize,
}

pub fn win_loss_counts(trades: &[Trade]) -> WinLossCounts {
    let mut counts = WinLossCounts::default();
    for trade in trades {
        match trade.outcome() {
            Outcome::Win => counts.wins += 1,
            Outcome::Loss => counts.losses += 1,
            Outcome::Breakeven => counts.breakeven += 1,
        }
    }
    counts
}

/// Everything the dashboard renders, computed in one call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analytics {
    pub summary_stats: SummaryStats,
    pub equity_curve: Vec<EquityPoint>,
    pub drawdown_series: Vec<DrawdownPoint>,
    pub max_drawdown: f64,
    pub monthly_performance: Vec<MonthlyPerformance>,
    pub risk_reward_points: Vec<RiskRewardPoint>,
    pub win_loss_counts: WinLossCounts,
}

impl Analytics {
    pub fn compute(trades: &[Trade]) -> Self {
        let equity_curve = equity_curve(trades);
        let drawdown_series = drawdown_series(&equity_curve);
        let max_drawdown = max_drawdown(&drawdown_series);

        Analytics {
            summary_stats: SummaryStats::compute(trades),
            equity_curve,
            drawdown_series,
            max_drawdown,
            monthly_performance: monthly_performance(trades),
            risk_reward_points: risk_reward_points(trades),
            win_loss_counts: win_loss_counts(trades),
        }
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
