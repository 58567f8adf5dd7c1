//! PostgreSQL trade store.

use crate::domain::error::JournalError;
use crate::domain::trade::{Direction, Trade, TradeId, TradeInput};
use crate::domain::validation::{validate_trade_input, validate_trade_inputs};
use crate::ports::config_port::ConfigPort;
use crate::ports::trade_store::TradeStore;
use chrono::{NaiveDateTime, Utc};
use postgres::types::ToSql;
use postgres::{GenericClient, NoTls, Row};
use r2d2::{Pool, PooledConnection};
use r2d2_postgres::PostgresConnectionManager;

const TRADE_COLUMNS: &str = "id, open_time, close_time, pair, direction, \
     entry_price, exit_price, stop_loss, take_profit, risk_amount, result_amount, \
     notes, created_at, updated_at";

pub struct PostgresAdapter {
    pool: Pool<PostgresConnectionManager<NoTls>>,
}

impl PostgresAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, JournalError> {
        // Try [postgres] connection_string first, fall back to [database] conninfo
        let connection_string = config
            .get_string("postgres", "connection_string")
            .or_else(|| config.get_string("database", "conninfo"))
            .ok_or_else(|| JournalError::ConfigMissing {
                section: "database".into(),
                key: "conninfo".into(),
            })?;

        let pg_config: postgres::Config =
            connection_string
                .parse()
                .map_err(|e: postgres::Error| JournalError::ConfigInvalid {
                    section: "postgres".into(),
                    key: "connection_string".into(),
                    reason: e.to_string(),
                })?;

        let pool_size = config.get_int("postgres", "pool_size", 4).max(1) as u32;
        let manager = PostgresConnectionManager::new(pg_config, NoTls);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(|e: r2d2::Error| JournalError::Database {
                reason: e.to_string(),
            })?;

        let adapter = Self { pool };
        adapter.initialize_schema()?;
        tracing::debug!(pool_size, "opened postgres trade store");
        Ok(adapter)
    }

    pub fn initialize_schema(&self) -> Result<(), JournalError> {
        self.connection()?
            .batch_execute(
                "CREATE TABLE IF NOT EXISTS public.trades (
                    id BIGSERIAL PRIMARY KEY,
                    open_time TIMESTAMP NOT NULL,
                    close_time TIMESTAMP NOT NULL,
                    pair TEXT NOT NULL,
                    direction TEXT NOT NULL,
                    entry_price DOUBLE PRECISION NOT NULL,
                    exit_price DOUBLE PRECISION NOT NULL,
                    stop_loss DOUBLE PRECISION,
                    take_profit DOUBLE PRECISION,
                    risk_amount DOUBLE PRECISION,
                    result_amount DOUBLE PRECISION NOT NULL,
                    notes TEXT,
                    created_at TIMESTAMP NOT NULL,
                    updated_at TIMESTAMP NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_trades_close_time ON public.trades(close_time);",
            )
            .map_err(query_error)
    }

    fn connection(
        &self,
    ) -> Result<PooledConnection<PostgresConnectionManager<NoTls>>, JournalError> {
        self.pool
            .get()
            .map_err(|e: r2d2::Error| JournalError::Database {
                reason: e.to_string(),
            })
    }
}

impl TradeStore for PostgresAdapter {
    fn list(&self) -> Result<Vec<Trade>, JournalError> {
        let query =
            format!("SELECT {TRADE_COLUMNS} FROM public.trades ORDER BY close_time ASC, id ASC");
        let rows = self.connection()?.query(&query, &[]).map_err(query_error)?;
        rows.iter().map(row_to_trade).collect()
    }

    fn get(&self, id: TradeId) -> Result<Option<Trade>, JournalError> {
        let query = format!("SELECT {TRADE_COLUMNS} FROM public.trades WHERE id = $1");
        let row = self
            .connection()?
            .query_opt(&query, &[&id.0])
            .map_err(query_error)?;
        row.as_ref().map(row_to_trade).transpose()
    }

    fn create(&self, input: &TradeInput) -> Result<Trade, JournalError> {
        validate_trade_input(input)?;

        let trade = insert_trade(&mut *self.connection()?, input, &now())?;
        tracing::debug!(id = %trade.id, pair = %trade.pair, "trade created");
        Ok(trade)
    }

    fn update(&self, id: TradeId, input: &TradeInput) -> Result<Trade, JournalError> {
        validate_trade_input(input)?;

        let now = now();
        let query = format!(
            "UPDATE public.trades SET open_time = $1, close_time = $2, pair = $3, direction = $4,
                    entry_price = $5, exit_price = $6, stop_loss = $7, take_profit = $8,
                    risk_amount = $9, result_amount = $10, notes = $11, updated_at = $12
             WHERE id = $13
             RETURNING {TRADE_COLUMNS}"
        );
        let pair = input.pair.trim();
        let direction = input.direction.as_str();
        let params: &[&(dyn ToSql + Sync)] = &[
            &input.open_time,
            &input.close_time,
            &pair,
            &direction,
            &input.entry_price,
            &input.exit_price,
            &input.stop_loss,
            &input.take_profit,
            &input.risk_amount,
            &input.result_amount,
            &input.notes,
            &now,
            &id.0,
        ];

        let row = self
            .connection()?
            .query_opt(&query, params)
            .map_err(query_error)?
            .ok_or(JournalError::NotFound { id })?;
        tracing::debug!(%id, "trade updated");
        row_to_trade(&row)
    }

    fn delete(&self, id: TradeId) -> Result<TradeId, JournalError> {
        let changed = self
            .connection()?
            .execute("DELETE FROM public.trades WHERE id = $1", &[&id.0])
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
        let mut tx = conn.transaction().map_err(query_error)?;

        let now = now();
        let mut trades = Vec::with_capacity(inputs.len());
        for input in inputs {
            trades.push(insert_trade(&mut tx, input, &now)?);
        }

        tx.commit().map_err(query_error)?;
        tracing::debug!(count = trades.len(), "trades imported");
        Ok(trades)
    }
}

fn insert_trade<C: GenericClient>(
    client: &mut C,
    input: &TradeInput,
    now: &NaiveDateTime,
) -> Result<Trade, JournalError> {
    let query = format!(
        "INSERT INTO public.trades (open_time, close_time, pair, direction, entry_price,
                                    exit_price, stop_loss, take_profit, risk_amount,
                                    result_amount, notes, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $12)
         RETURNING {TRADE_COLUMNS}"
    );
    let pair = input.pair.trim();
    let direction = input.direction.as_str();
    let params: &[&(dyn ToSql + Sync)] = &[
        &input.open_time,
        &input.close_time,
        &pair,
        &direction,
        &input.entry_price,
        &input.exit_price,
        &input.stop_loss,
        &input.take_profit,
        &input.risk_amount,
        &input.result_amount,
        &input.notes,
        now,
    ];

    let row = client.query_one(&query, params).map_err(query_error)?;
    row_to_trade(&row)
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

fn query_error(e: postgres::Error) -> JournalError {
    JournalError::DatabaseQuery {
        reason: e.to_string(),
    }
}

fn row_to_trade(row: &Row) -> Result<Trade, JournalError> {
    let direction_str: String = row.get(4);
    let direction: Direction = direction_str
        .parse()
        .map_err(|e: crate::domain::trade::ParseDirectionError| JournalError::DatabaseQuery {
            reason: e.to_string(),
        })?;

    Ok(Trade {
        id: TradeId(row.get(0)),
        open_time: row.get(1),
        close_time: row.get(2),
        pair: row.get(3),
        direction,
        entry_price: row.get(5),
        exit_price: row.get(6),
        stop_loss: row.get(7),
        take_profit: row.get(8),
        risk_amount: row.get(9),
        result_amount: row.get(10),
        notes: row.get(11),
        created_at: row.get(12),
        updated_at: row.get(13),
    })
}
