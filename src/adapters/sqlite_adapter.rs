//! SQLite trade store.

use crate::domain::error::JournalError;
use crate::domain::trade::{format_timestamp, parse_timestamp, Direction, Trade, TradeId, TradeInput};
use crate::domain::validation::{validate_trade_input, validate_trade_inputs};
use crate::ports::config_port::ConfigPort;
use crate::ports::trade_store::TradeStore;
use chrono::{NaiveDateTime, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension, Row};

const TRADE_COLUMNS: &str = "id, open_time, close_time, pair, direction, entry_price, exit_price, \
     stop_loss, take_profit, risk_amount, result_amount, notes, created_at, updated_at";

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, JournalError> {
        let db_path =
            config
                .get_string("sqlite", "path")
                .ok_or_else(|| JournalError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;

        // Each pooled ":memory:" connection would be a separate database.
        if db_path.trim() == ":memory:" {
            return Self::in_memory();
        }

        let pool_size = config.get_int("sqlite", "pool_size", 4).max(1) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool =
            Pool::builder()
                .max_size(pool_size)
                .build(manager)
                .map_err(|e: r2d2::Error| JournalError::Database {
                    reason: e.to_string(),
                })?;

        tracing::debug!(path = %db_path, pool_size, "opened sqlite trade store");
        let adapter = Self { pool };
        adapter.initialize_schema()?;
        Ok(adapter)
    }

    /// Single-connection in-memory database with the schema already applied.
    pub fn in_memory() -> Result<Self, JournalError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e: r2d2::Error| JournalError::Database {
                reason: e.to_string(),
            })?;

        let adapter = Self { pool };
        adapter.initialize_schema()?;
        Ok(adapter)
    }

    pub fn initialize_schema(&self) -> Result<(), JournalError> {
        let conn = self.connection()?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS trades (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                open_time TEXT NOT NULL,
                close_time TEXT NOT NULL,
                pair TEXT NOT NULL,
                direction TEXT NOT NULL,
                entry_price REAL NOT NULL,
                exit_price REAL NOT NULL,
                stop_loss REAL,
                take_profit REAL,
                risk_amount REAL,
                result_amount REAL NOT NULL,
                notes TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_trades_close_time ON trades(close_time);",
        )
        .map_err(query_error)?;

        Ok(())
    }

    fn connection(&self) -> Result<PooledConnection<SqliteConnectionManager>, JournalError> {
        self.pool
            .get()
            .map_err(|e: r2d2::Error| JournalError::Database {
                reason: e.to_string(),
            })
    }

    fn insert(conn: &rusqlite::Connection, input: &TradeInput, now: &str) -> Result<TradeId, JournalError> {
        conn.execute(
            "INSERT INTO trades (open_time, close_time, pair, direction, entry_price, exit_price,
                                 stop_loss, take_profit, risk_amount, result_amount, notes,
                                 created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)",
            params![
                format_timestamp(&input.open_time),
                format_timestamp(&input.close_time),
                input.pair.trim(),
                input.direction.as_str(),
                input.entry_price,
                input.exit_price,
                input.stop_loss,
                input.take_profit,
                input.risk_amount,
                input.result_amount,
                input.notes,
                now,
            ],
        )
        .map_err(query_error)?;

        Ok(TradeId(conn.last_insert_rowid()))
    }

    fn fetch(conn: &rusqlite::Connection, id: TradeId) -> Result<Option<Trade>, JournalError> {
        let query = format!("SELECT {TRADE_COLUMNS} FROM trades WHERE id = ?1");
        conn.query_row(&query, params![id.0], row_to_trade)
            .optional()
            .map_err(query_error)
    }
}

impl TradeStore for SqliteAdapter {
    fn list(&self) -> Result<Vec<Trade>, JournalError> {
        let conn = self.connection()?;

        let query = format!("SELECT {TRADE_COLUMNS} FROM trades ORDER BY close_time ASC, id ASC");
        let mut stmt = conn.prepare(&query).map_err(query_error)?;

        let rows = stmt.query_map([], row_to_trade).map_err(query_error)?;

        let mut trades = Vec::new();
        for row in rows {
            trades.push(row.map_err(query_error)?);
        }

        Ok(trades)
    }

    fn get(&self, id: TradeId) -> Result<Option<Trade>, JournalError> {
        let conn = self.connection()?;
        Self::fetch(&conn, id)
    }

    fn create(&self, input: &TradeInput) -> Result<Trade, JournalError> {
        validate_trade_input(input)?;
        let conn = self.connection()?;

        let now = format_timestamp(&now());
        let id = Self::insert(&conn, input, &now)?;
        tracing::debug!(%id, pair = %input.pair, "trade created");

        Self::fetch(&conn, id)?.ok_or(JournalError::NotFound { id })
    }

    fn update(&self, id: TradeId, input: &TradeInput) -> Result<Trade, JournalError> {
        validate_trade_input(input)?;
        let conn = self.connection()?;

        let changed = conn
            .execute(
                "UPDATE trades SET open_time = ?1, close_time = ?2, pair = ?3, direction = ?4,
                        entry_price = ?5, exit_price = ?6, stop_loss = ?7, take_profit = ?8,
                        risk_amount = ?9, result_amount = ?10, notes = ?11, updated_at = ?12
                 WHERE id = ?13",
                params![
                    format_timestamp(&input.open_time),
                    format_timestamp(&input.close_time),
                    input.pair.trim(),
                    input.direction.as_str(),
                    input.entry_price,
                    input.exit_price,
                    input.stop_loss,
                    input.take_profit,
                    input.risk_amount,
                    input.result_amount,
                    input.notes,
                    format_timestamp(&now()),
                    id.0,
                ],
            )
            .map_err(query_error)?;

        if changed == 0 {
            return Err(JournalError::NotFound { id });
        }
        tracing::debug!(%id, "trade updated");

        Self::fetch(&conn, id)?.ok_or(JournalError::NotFound { id })
    }

    fn delete(&self, id: TradeId) -> Result<TradeId, JournalError> {
        let conn = self.connection()?;

        let changed = conn
            .execute("DELETE FROM trades WHERE id = ?1", params![id.0])
            .map_err(query_error)?;

        if changed == 0 {
            return Err(JournalError::NotFound { id });
        }
        tracing::debug!(%id, "trade deleted");

        Ok(id)
    }

    fn create_many(&self, inputs: &[TradeInput]) -> Result<Vec<Trade>, JournalError> {
        validate_trade_inputs(inputs)?;

        let mut conn = self.connection()?;
        let tx = conn.transaction().map_err(query_error)?;

        let now = format_timestamp(&now());
        let mut ids = Vec::with_capacity(inputs.len());
        for input in inputs {
            ids.push(Self::insert(&tx, input, &now)?);
        }

        let mut trades = Vec::with_capacity(ids.len());
        for id in ids {
            trades.push(Self::fetch(&tx, id)?.ok_or(JournalError::NotFound { id })?);
        }

        tx.commit().map_err(query_error)?;
        tracing::debug!(count = trades.len(), "trades imported");

        Ok(trades)
    }
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

fn query_error(e: rusqlite::Error) -> JournalError {
    JournalError::DatabaseQuery {
        reason: e.to_string(),
    }
}

fn row_to_trade(row: &Row<'_>) -> rusqlite::Result<Trade> {
    let direction_str: String = row.get(4)?;
    let direction: Direction = direction_str.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(Trade {
        id: TradeId(row.get(0)?),
        open_time: timestamp_column(row, 1)?,
        close_time: timestamp_column(row, 2)?,
        pair: row.get(3)?,
        direction,
        entry_price: row.get(5)?,
        exit_price: row.get(6)?,
        stop_loss: row.get(7)?,
        take_profit: row.get(8)?,
        risk_amount: row.get(9)?,
        result_amount: row.get(10)?,
        notes: row.get(11)?,
        created_at: timestamp_column(row, 12)?,
        updated_at: timestamp_column(row, 13)?,
    })
}

fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    let value: String = row.get(idx)?;
    parse_timestamp(&value).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            format!("invalid timestamp '{value}'").into(),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::trade::sample_trades;

    struct EmptyConfig;

    impl ConfigPort for EmptyConfig {
        fn get_string(&self, _section: &str, _key: &str) -> Option<String> {
            None
        }
        fn get_int(&self, _section: &str, _key: &str, default: i64) -> i64 {
            default
        }
        fn get_double(&self, _section: &str, _key: &str, default: f64) -> f64 {
            default
        }
        fn get_bool(&self, _section: &str, _key: &str, default: bool) -> bool {
            default
        }
    }

    fn store_with_samples() -> (SqliteAdapter, Vec<Trade>) {
        let store = SqliteAdapter::in_memory().unwrap();
        let trades = store.create_many(&sample_trades()).unwrap();
        (store, trades)
    }

    #[test]
    fn from_config_missing_path() {
        let config = EmptyConfig;
        let result = SqliteAdapter::from_config(&config);
        match result {
            Err(JournalError::ConfigMissing { section, key }) => {
                assert_eq!(section, "sqlite");
                assert_eq!(key, "path");
            }
            Err(other) => panic!("expected ConfigMissing, got: {other}"),
            Ok(_) => panic!("expected error, got Ok"),
        }
    }

    #[test]
    fn schema_initialization_is_idempotent() {
        let store = SqliteAdapter::in_memory().unwrap();
        store.initialize_schema().unwrap();
        store.initialize_schema().unwrap();
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn create_assigns_ids_and_timestamps() {
        let store = SqliteAdapter::in_memory().unwrap();
        let input = sample_trades().remove(0);

        let trade = store.create(&input).unwrap();
        assert_eq!(trade.id, TradeId(1));
        assert_eq!(trade.to_input(), input);
        assert_eq!(trade.created_at, trade.updated_at);

        let second = store.create(&input).unwrap();
        assert_eq!(second.id, TradeId(2));
    }

    #[test]
    fn create_rejects_invalid_input() {
        let store = SqliteAdapter::in_memory().unwrap();
        let mut input = sample_trades().remove(0);
        input.pair = String::new();

        assert!(matches!(
            store.create(&input),
            Err(JournalError::Validation { .. })
        ));
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn list_orders_by_close_time() {
        let store = SqliteAdapter::in_memory().unwrap();
        let mut inputs = sample_trades();
        inputs.reverse();
        store.create_many(&inputs).unwrap();

        let pairs: Vec<String> = store.list().unwrap().into_iter().map(|t| t.pair).collect();
        assert_eq!(pairs, vec!["EUR/USD", "GBP/JPY", "AUD/USD", "USD/CAD"]);
    }

    #[test]
    fn sub_second_close_times_keep_their_order() {
        let store = SqliteAdapter::in_memory().unwrap();
        let mut late = sample_trades().remove(0);
        late.open_time = parse_timestamp("2024-03-01T12:00:00").unwrap();
        late.close_time = parse_timestamp("2024-03-01T12:00:00.900").unwrap();
        let mut early = late.clone();
        early.close_time = parse_timestamp("2024-03-01T12:00:00.100").unwrap();

        let late_trade = store.create(&late).unwrap();
        let early_trade = store.create(&early).unwrap();
        assert_eq!(late_trade.close_time, late.close_time);

        let listed: Vec<TradeId> = store.list().unwrap().into_iter().map(|t| t.id).collect();
        assert_eq!(listed, vec![early_trade.id, late_trade.id]);
    }

    #[test]
    fn get_returns_none_for_unknown_id() {
        let (store, _) = store_with_samples();
        assert!(store.get(TradeId(99)).unwrap().is_none());
    }

    #[test]
    fn update_replaces_fields_and_keeps_created_at() {
        let (store, trades) = store_with_samples();
        let original = &trades[1];

        let mut input = original.to_input();
        input.result_amount = -75.0;
        input.notes = None;

        let updated = store.update(original.id, &input).unwrap();
        assert_eq!(updated.id, original.id);
        assert_eq!(updated.result_amount, -75.0);
        assert_eq!(updated.notes, None);
        assert_eq!(updated.created_at, original.created_at);
        assert_eq!(store.get(original.id).unwrap(), Some(updated));
    }

    #[test]
    fn update_unknown_id_is_not_found() {
        let store = SqliteAdapter::in_memory().unwrap();
        let result = store.update(TradeId(5), &sample_trades()[0]);
        assert!(matches!(result, Err(JournalError::NotFound { id }) if id == TradeId(5)));
    }

    #[test]
    fn delete_removes_row_and_returns_id() {
        let (store, trades) = store_with_samples();
        let id = trades[0].id;

        assert_eq!(store.delete(id).unwrap(), id);
        assert!(store.get(id).unwrap().is_none());
        assert_eq!(store.list().unwrap().len(), 3);
        assert!(matches!(store.delete(id), Err(JournalError::NotFound { .. })));
    }

    #[test]
    fn create_many_is_all_or_nothing() {
        let store = SqliteAdapter::in_memory().unwrap();
        let mut inputs = sample_trades();
        inputs[2].entry_price = -1.0;

        assert!(store.create_many(&inputs).is_err());
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn optional_fields_round_trip_as_null() {
        let store = SqliteAdapter::in_memory().unwrap();
        let mut input = sample_trades().remove(3);
        input.stop_loss = None;
        input.take_profit = None;
        input.risk_amount = None;
        input.notes = None;

        let trade = store.create(&input).unwrap();
        let fetched = store.get(trade.id).unwrap().unwrap();
        assert_eq!(fetched.stop_loss, None);
        assert_eq!(fetched.take_profit, None);
        assert_eq!(fetched.risk_amount, None);
        assert_eq!(fetched.notes, None);
    }
}
