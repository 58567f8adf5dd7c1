//! Trade records as stored in the journal.
//!
//! A [`Trade`] is what the store hands back; a [`TradeInput`] is what a user
//! submits. `result_amount` is authoritative for win/loss classification.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Canonical textual form used for persistence and JSON.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// [`TIMESTAMP_FORMAT`] plus sub-second digits, written only when non-zero.
/// Sorts as text in the same order as the timestamps themselves.
pub const PRECISE_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Store-assigned identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TradeId(pub i64);

impl fmt::Display for TradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TradeId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(TradeId)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Direction {
    Buy,
    Sell,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown direction '{0}', expected buy or sell")]
pub struct ParseDirectionError(pub String);

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Buy => "buy",
            Direction::Sell => "sell",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = ParseDirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "buy" | "long" => Ok(Direction::Buy),
            "sell" | "short" => Ok(Direction::Sell),
            _ => Err(ParseDirectionError(s.to_string())),
        }
    }
}

impl TryFrom<String> for Direction {
    type Error = ParseDirectionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Win/loss classification of a single trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Win,
    Loss,
    Breakeven,
}

impl Outcome {
    pub fn of(result_amount: f64) -> Self {
        if result_amount > 0.0 {
            Outcome::Win
        } else if result_amount < 0.0 {
            Outcome::Loss
        } else {
            Outcome::Breakeven
        }
    }
}

/// User-submitted trade fields, validated before the store accepts them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeInput {
    #[serde(with = "timestamp")]
    pub open_time: NaiveDateTime,
    #[serde(with = "timestamp")]
    pub close_time: NaiveDateTime,
    pub pair: String,
    pub direction: Direction,
    pub entry_price: f64,
    pub exit_price: f64,
    #[serde(default)]
    pub stop_loss: Option<f64>,
    #[serde(default)]
    pub take_profit: Option<f64>,
    #[serde(default)]
    pub risk_amount: Option<f64>,
    pub result_amount: f64,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub id: TradeId,
    #[serde(with = "timestamp")]
    pub open_time: NaiveDateTime,
    #[serde(with = "timestamp")]
    pub close_time: NaiveDateTime,
    pub pair: String,
    pub direction: Direction,
    pub entry_price: f64,
    pub exit_price: f64,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
    pub risk_amount: Option<f64>,
    pub result_amount: f64,
    pub notes: Option<String>,
    #[serde(with = "timestamp")]
    pub created_at: NaiveDateTime,
    #[serde(with = "timestamp")]
    pub updated_at: NaiveDateTime,
}

impl Trade {
    pub fn from_input(id: TradeId, input: TradeInput, now: NaiveDateTime) -> Self {
        Trade {
            id,
            open_time: input.open_time,
            close_time: input.close_time,
            pair: input.pair,
            direction: input.direction,
            entry_price: input.entry_price,
            exit_price: input.exit_price,
            stop_loss: input.stop_loss,
            take_profit: input.take_profit,
            risk_amount: input.risk_amount,
            result_amount: input.result_amount,
            notes: input.notes,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn to_input(&self) -> TradeInput {
        TradeInput {
            open_time: self.open_time,
            close_time: self.close_time,
            pair: self.pair.clone(),
            direction: self.direction,
            entry_price: self.entry_price,
            exit_price: self.exit_price,
            stop_loss: self.stop_loss,
            take_profit: self.take_profit,
            risk_amount: self.risk_amount,
            result_amount: self.result_amount,
            notes: self.notes.clone(),
        }
    }

    pub fn outcome(&self) -> Outcome {
        Outcome::of(self.result_amount)
    }

    pub fn close_date(&self) -> NaiveDate {
        self.close_time.date()
    }

    /// `result / risk`, only for trades with a positive risk amount.
    pub fn risk_reward(&self) -> Option<f64> {
        match self.risk_amount {
            Some(risk) if risk > 0.0 => Some(self.result_amount / risk),
            _ => None,
        }
    }
}

/// Parse the timestamp forms the journal accepts from users and files.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    for format in [
        TIMESTAMP_FORMAT,
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        PRECISE_TIMESTAMP_FORMAT,
    ] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(value, format) {
            return Some(ts);
        }
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.naive_utc());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(PRECISE_TIMESTAMP_FORMAT).to_string()
}

/// Serde adapter: canonical output, lenient input.
pub mod timestamp {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_timestamp(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_timestamp(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{raw}'")))
    }
}

/// The journal's bundled sample trades (four March 2024 FX trades).
pub fn sample_trades() -> Vec<TradeInput> {
    let ts = |s: &str| parse_timestamp(s).unwrap_or_default();
    vec![
        TradeInput {
            open_time: ts("2024-03-01T09:30:00Z"),
            close_time: ts("2024-03-01T15:45:00Z"),
            pair: "EUR/USD".into(),
            direction: Direction::Buy,
            entry_price: 1.08500,
            exit_price: 1.08750,
            stop_loss: Some(1.08400),
            take_profit: Some(1.08800),
            risk_amount: Some(50.0),
            result_amount: 125.0,
            notes: Some("Good momentum following news release.".into()),
        },
        TradeInput {
            open_time: ts("2024-03-02T11:00:00Z"),
            close_time: ts("2024-03-02T14:20:00Z"),
            pair: "GBP/JPY".into(),
            direction: Direction::Sell,
            entry_price: 191.200,
            exit_price: 190.950,
            stop_loss: Some(191.400),
            take_profit: Some(190.900),
            risk_amount: Some(100.0),
            result_amount: -50.0,
            notes: Some("Hit stop loss due to unexpected volatility.".into()),
        },
        TradeInput {
            open_time: ts("2024-03-03T14:00:00Z"),
            close_time: ts("2024-03-04T10:00:00Z"),
            pair: "AUD/USD".into(),
            direction: Direction::Buy,
            entry_price: 0.65250,
            exit_price: 0.65750,
            stop_loss: Some(0.65150),
            take_profit: Some(0.65800),
            risk_amount: Some(75.0),
            result_amount: 250.0,
            notes: Some("Held overnight, strong trend continuation.".into()),
        },
        TradeInput {
            open_time: ts("2024-03-05T08:00:00Z"),
            close_time: ts("2024-03-05T12:00:00Z"),
            pair: "USD/CAD".into(),
            direction: Direction::Sell,
            entry_price: 1.35500,
            exit_price: 1.35200,
            stop_loss: Some(1.35700),
            take_profit: Some(1.35100),
            risk_amount: Some(80.0),
            result_amount: 120.0,
            notes: Some("Scalp trade, good entry at resistance.".into()),
        },
    ]
}
