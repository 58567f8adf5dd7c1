//! HTTP request handlers for the JSON API.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::cmp::Reverse;
use std::sync::Arc;

use crate::adapters::csv_adapter;
use crate::domain::analytics::{Analytics, SummaryStats};
use crate::domain::error::JournalError;
use crate::domain::filter::TradeFilter;
use crate::domain::trade::{parse_timestamp, Direction, Trade, TradeId, TradeInput};
use crate::ports::trade_store::TradeStore;

use super::{AppState, WebError};

pub const DEFAULT_LIMIT: usize = 1000;

/// Query string shared by the list, stats and analytics endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub pair: Option<String>,
    pub direction: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub search: Option<String>,
    pub skip: Option<usize>,
    pub limit: Option<usize>,
}

impl ListQuery {
    pub fn to_filter(&self) -> Result<TradeFilter, WebError> {
        let direction = match non_blank(&self.direction) {
            Some(value) => Some(
                value
                    .parse::<Direction>()
                    .map_err(|e| WebError::bad_request(e.to_string()))?,
            ),
            None => None,
        };

        Ok(TradeFilter {
            pair: non_blank(&self.pair).map(str::to_string),
            direction,
            from: query_date("from", &self.from)?,
            to: query_date("to", &self.to)?,
            search: non_blank(&self.search).map(str::to_string),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct CsvExport {
    pub data: String,
    pub filename: String,
}

pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Trade Journal API is running" }))
}

pub async fn health() -> &'static str {
    "OK"
}

pub async fn list_trades(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Vec<Trade>>, WebError> {
    let Query(query) = query?;
    let filter = query.to_filter()?;
    let mut trades = filtered_trades(&state, filter).await?;

    trades.sort_by_key(|t| Reverse((t.close_time, t.id)));
    let page = trades
        .into_iter()
        .skip(query.skip.unwrap_or(0))
        .take(query.limit.unwrap_or(DEFAULT_LIMIT))
        .collect();
    Ok(Json(page))
}

pub async fn create_trade(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<TradeInput>, JsonRejection>,
) -> Result<Json<Trade>, WebError> {
    let Json(input) = payload?;
    let trade = with_store(&state, move |store| store.create(&input)).await?;
    tracing::info!(id = %trade.id, pair = %trade.pair, "trade created");
    Ok(Json(trade))
}

pub async fn get_trade(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Trade>, WebError> {
    let id = TradeId(id?.0);
    with_store(&state, move |store| {
        store.get(id)?.ok_or(JournalError::NotFound { id })
    })
    .await
    .map(Json)
}

pub async fn update_trade(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<TradeInput>, JsonRejection>,
) -> Result<Json<Trade>, WebError> {
    let id = TradeId(id?.0);
    let Json(input) = payload?;
    let trade = with_store(&state, move |store| store.update(id, &input)).await?;
    tracing::info!(%id, "trade updated");
    Ok(Json(trade))
}

pub async fn delete_trade(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Value>, WebError> {
    let id = TradeId(id?.0);
    let deleted = with_store(&state, move |store| store.delete(id)).await?;
    tracing::info!(id = %deleted, "trade deleted");
    Ok(Json(json!({
        "id": deleted,
        "message": "Trade deleted successfully",
    })))
}

pub async fn summary_stats(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<SummaryStats>, WebError> {
    let Query(query) = query?;
    let trades = filtered_trades(&state, query.to_filter()?).await?;
    Ok(Json(SummaryStats::compute(&trades).rounded(2)))
}

pub async fn export_csv(State(state): State<Arc<AppState>>) -> Result<Json<CsvExport>, WebError> {
    let trades = with_store(&state, |store| store.list()).await?;
    let data = csv_adapter::export_to_string(&trades)?;
    Ok(Json(CsvExport {
        data,
        filename: csv_adapter::export_filename(Utc::now().naive_utc()),
    }))
}

pub async fn analytics(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Analytics>, WebError> {
    let Query(query) = query?;
    let trades = filtered_trades(&state, query.to_filter()?).await?;
    Ok(Json(Analytics::compute(&trades)))
}

pub async fn not_found() -> WebError {
    WebError::not_found("Not found")
}

async fn filtered_trades(state: &AppState, filter: TradeFilter) -> Result<Vec<Trade>, WebError> {
    with_store(state, move |store| {
        let trades = store.list()?;
        Ok(if filter.is_empty() {
            trades
        } else {
            filter.apply(&trades)
        })
    })
    .await
}

/// Runs a store call on the blocking pool; the stores hold synchronous connections.
async fn with_store<T, F>(state: &AppState, f: F) -> Result<T, WebError>
where
    T: Send + 'static,
    F: FnOnce(&(dyn TradeStore + Send + Sync)) -> Result<T, JournalError> + Send + 'static,
{
    let store = Arc::clone(&state.store);
    tokio::task::spawn_blocking(move || f(store.as_ref()))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "store task failed");
            WebError::internal("An internal error occurred")
        })?
        .map_err(WebError::from)
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn query_date(name: &str, value: &Option<String>) -> Result<Option<NaiveDate>, WebError> {
    match non_blank(value) {
        Some(raw) => parse_timestamp(raw)
            .map(|ts| Some(ts.date()))
            .ok_or_else(|| WebError::bad_request(format!("invalid {name} date: '{raw}'"))),
        None => Ok(None),
    }
}
