//! CSV export and import of journal trades.
//!
//! One header row, one line per trade. Optional fields are written as empty
//! cells; quoting of commas, quotes and newlines is left to the `csv` crate.

use crate::domain::error::JournalError;
use crate::domain::trade::{
    format_timestamp, parse_timestamp, Direction, ParseDirectionError, Trade, TradeInput,
};
use chrono::NaiveDateTime;
use std::io::{Read, Write};

pub const HEADERS: [&str; 11] = [
    "Open Time",
    "Close Time",
    "Pair",
    "Direction",
    "Entry Price",
    "Exit Price",
    "Stop Loss",
    "Take Profit",
    "Risk Amount",
    "Result Amount",
    "Notes",
];

/// Default download name, e.g. `trades_export_20240305_120000.csv`.
pub fn export_filename(now: NaiveDateTime) -> String {
    format!("trades_export_{}.csv", now.format("%Y%m%d_%H%M%S"))
}

/// Writes trades ordered by close time ascending.
pub fn write_trades<W: Write>(trades: &[Trade], writer: W) -> Result<(), JournalError> {
    let mut ordered: Vec<&Trade> = trades.iter().collect();
    ordered.sort_by_key(|t| t.close_time);

    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(HEADERS).map_err(csv_error)?;

    for trade in ordered {
        wtr.write_record([
            format_timestamp(&trade.open_time),
            format_timestamp(&trade.close_time),
            trade.pair.clone(),
            trade.direction.to_string(),
            trade.entry_price.to_string(),
            trade.exit_price.to_string(),
            optional_number(trade.stop_loss),
            optional_number(trade.take_profit),
            optional_number(trade.risk_amount),
            trade.result_amount.to_string(),
            trade.notes.clone().unwrap_or_default(),
        ])
        .map_err(csv_error)?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn export_to_string(trades: &[Trade]) -> Result<String, JournalError> {
    let mut buf = Vec::new();
    write_trades(trades, &mut buf)?;
    String::from_utf8(buf).map_err(|e| JournalError::Csv {
        line: 0,
        reason: e.to_string(),
    })
}

/// Reads trade inputs laid out as [`HEADERS`]. Rows are not validated here;
/// the store validates on insert. Notes are taken verbatim; every other cell
/// is trimmed.
pub fn read_trades<R: Read>(reader: R) -> Result<Vec<TradeInput>, JournalError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::Headers).from_reader(reader);
    let mut inputs = Vec::new();

    for result in rdr.records() {
        let record = result.map_err(csv_error)?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let field = |idx: usize| record.get(idx).unwrap_or("").trim();

        let required = |idx: usize| -> Result<String, JournalError> {
            let value = field(idx);
            if value.is_empty() {
                return Err(JournalError::Csv {
                    line,
                    reason: format!("missing {}", HEADERS[idx]),
                });
            }
            Ok(value.to_string())
        };

        let timestamp = |idx: usize| -> Result<NaiveDateTime, JournalError> {
            let value = required(idx)?;
            parse_timestamp(&value).ok_or_else(|| JournalError::Csv {
                line,
                reason: format!("invalid {}: '{}'", HEADERS[idx], value),
            })
        };

        let number = |idx: usize| -> Result<f64, JournalError> {
            let value = required(idx)?;
            value.parse().map_err(|_| JournalError::Csv {
                line,
                reason: format!("invalid {}: '{}'", HEADERS[idx], value),
            })
        };

        let optional = |idx: usize| -> Result<Option<f64>, JournalError> {
            let value = field(idx);
            if value.is_empty() {
                return Ok(None);
            }
            value.parse().map(Some).map_err(|_| JournalError::Csv {
                line,
                reason: format!("invalid {}: '{}'", HEADERS[idx], value),
            })
        };

        let direction: Direction =
            required(3)?
                .parse()
                .map_err(|e: ParseDirectionError| JournalError::Csv {
                    line,
                    reason: e.to_string(),
                })?;

        let notes = record.get(10).unwrap_or("");
        inputs.push(TradeInput {
            open_time: timestamp(0)?,
            close_time: timestamp(1)?,
            pair: required(2)?,
            direction,
            entry_price: number(4)?,
            exit_price: number(5)?,
            stop_loss: optional(6)?,
            take_profit: optional(7)?,
            risk_amount: optional(8)?,
            result_amount: number(9)?,
            notes: if notes.is_empty() {
                None
            } else {
                Some(notes.to_string())
            },
        });
    }

    Ok(inputs)
}

fn optional_number(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn csv_error(e: csv::Error) -> JournalError {
    let line = e.position().map(|p| p.line()).unwrap_or(0);
    JournalError::Csv {
        line,
        reason: e.to_string(),
    }
}
