#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use std::sync::Mutex;
use tradejournal::domain::error::JournalError;
use tradejournal::domain::trade::{Direction, Trade, TradeId, TradeInput};
use tradejournal::domain::validation::validate_trade_input;
use tradejournal::ports::trade_store::TradeStore;

/// In-memory store with optional failure injection.
pub struct MockTradeStore {
    trades: Mutex<Vec<Trade>>,
    next_id: Mutex<i64>,
    failure: Option<String>,
}

impl MockTradeStore {
    pub fn new() -> Self {
        Self {
            trades: Mutex::new(Vec::new()),
            next_id: Mutex::new(1),
            failure: None,
        }
    }

    pub fn with_trades(self, inputs: &[TradeInput]) -> Self {
        self.create_many(inputs).unwrap();
        self
    }

    /// Every call fails with a database error.
    pub fn failing(reason: &str) -> Self {
        Self {
            failure: Some(reason.to_string()),
            ..Self::new()
        }
    }

    fn check(&self) -> Result<(), JournalError> {
        match &self.failure {
            Some(reason) => Err(JournalError::Database {
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl TradeStore for MockTradeStore {
    fn list(&self) -> Result<Vec<Trade>, JournalError> {
        self.check()?;
        let mut trades = self.trades.lock().unwrap().clone();
        trades.sort_by_key(|t| (t.close_time, t.id));
        Ok(trades)
    }

    fn get(&self, id: TradeId) -> Result<Option<Trade>, JournalError> {
        self.check()?;
        Ok(self
            .trades
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.id == id)
            .cloned())
    }

    fn create(&self, input: &TradeInput) -> Result<Trade, JournalError> {
        self.check()?;
        validate_trade_input(input)?;
        let mut next_id = self.next_id.lock().unwrap();
        let trade = Trade::from_input(TradeId(*next_id), input.clone(), NaiveDateTime::default());
        *next_id += 1;
        self.trades.lock().unwrap().push(trade.clone());
        Ok(trade)
    }

    fn update(&self, id: TradeId, input: &TradeInput) -> Result<Trade, JournalError> {
        self.check()?;
        validate_trade_input(input)?;
        let mut trades = self.trades.lock().unwrap();
        let slot = trades
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(JournalError::NotFound { id })?;
        let created_at = slot.created_at;
        *slot = Trade::from_input(id, input.clone(), created_at);
        Ok(slot.clone())
    }

    fn delete(&self, id: TradeId) -> Result<TradeId, JournalError> {
        self.check()?;
        let mut trades = self.trades.lock().unwrap();
        let before = trades.len();
        trades.retain(|t| t.id != id);
        if trades.len() == before {
            return Err(JournalError::NotFound { id });
        }
        Ok(id)
    }
}

pub fn dt(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").unwrap()
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// A valid buy input closing at `close` with the given result.
pub fn make_input(pair: &str, close: &str, result: f64) -> TradeInput {
    let close_time = dt(close);
    TradeInput {
        open_time: close_time,
        close_time,
        pair: pair.to_string(),
        direction: Direction::Buy,
        entry_price: 1.1,
        exit_price: 1.2,
        stop_loss: None,
        take_profit: None,
        risk_amount: None,
        result_amount: result,
        notes: None,
    }
}

pub fn make_trade(id: i64, close: &str, result: f64) -> Trade {
    Trade::from_input(
        TradeId(id),
        make_input("EUR/USD", close, result),
        NaiveDateTime::default(),
    )
}

pub fn with_risk(mut trade: Trade, risk: f64) -> Trade {
    trade.risk_amount = Some(risk);
    trade
}
