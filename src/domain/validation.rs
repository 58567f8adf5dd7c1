//! Trade-entry validation.
//!
//! Every store runs these checks before a create or update so that the
//! analytics engine only ever sees finite, well-formed numbers.

use crate::domain::error::JournalError;
use crate::domain::trade::TradeInput;

pub fn validate_trade_input(input: &TradeInput) -> Result<(), JournalError> {
    validate_pair(input)?;
    validate_price("entry_price", input.entry_price)?;
    validate_price("exit_price", input.exit_price)?;
    validate_optional_price("stop_loss", input.stop_loss)?;
    validate_optional_price("take_profit", input.take_profit)?;
    validate_risk(input)?;
    validate_result(input)?;
    validate_times(input)?;
    Ok(())
}

/// Checks a whole batch before any of it is written; the first bad row wins.
pub fn validate_trade_inputs(inputs: &[TradeInput]) -> Result<(), JournalError> {
    inputs.iter().try_for_each(validate_trade_input)
}

fn validate_pair(input: &TradeInput) -> Result<(), JournalError> {
    if input.pair.trim().is_empty() {
        return Err(JournalError::validation("pair", "pair is required"));
    }
    Ok(())
}

fn validate_price(field: &str, value: f64) -> Result<(), JournalError> {
    if !value.is_finite() {
        return Err(JournalError::validation(field, format!("{field} must be a number")));
    }
    if value <= 0.0 {
        return Err(JournalError::validation(field, format!("{field} must be positive")));
    }
    Ok(())
}

fn validate_optional_price(field: &str, value: Option<f64>) -> Result<(), JournalError> {
    match value {
        Some(v) => validate_price(field, v),
        None => Ok(()),
    }
}

fn validate_risk(input: &TradeInput) -> Result<(), JournalError> {
    if let Some(risk) = input.risk_amount {
        if !risk.is_finite() {
            return Err(JournalError::validation("risk_amount", "risk_amount must be a number"));
        }
        if risk < 0.0 {
            return Err(JournalError::validation(
                "risk_amount",
                "risk_amount must be non-negative",
            ));
        }
    }
    Ok(())
}

fn validate_result(input: &TradeInput) -> Result<(), JournalError> {
    if !input.result_amount.is_finite() {
        return Err(JournalError::validation(
            "result_amount",
            "result_amount must be a number",
        ));
    }
    Ok(())
}

fn validate_times(input: &TradeInput) -> Result<(), JournalError> {
    if input.close_time < input.open_time {
        return Err(JournalError::validation(
            "close_time",
            "close_time must not be before open_time",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::trade::sample_trades;

    fn valid() -> TradeInput {
        sample_trades().remove(0)
    }

    fn assert_invalid(input: &TradeInput, expected_field: &str) {
        match validate_trade_input(input) {
            Err(JournalError::Validation { field, .. }) => assert_eq!(field, expected_field),
            other => panic!("expected validation error on {expected_field}, got {other:?}"),
        }
    }

    #[test]
    fn accepts_sample_trades() {
        for trade in sample_trades() {
            validate_trade_input(&trade).unwrap();
        }
    }

    #[test]
    fn rejects_blank_pair() {
        let mut input = valid();
        input.pair = "   ".into();
        assert_invalid(&input, "pair");
    }

    #[test]
    fn rejects_non_positive_prices() {
        let mut input = valid();
        input.entry_price = 0.0;
        assert_invalid(&input, "entry_price");

        let mut input = valid();
        input.exit_price = -1.0;
        assert_invalid(&input, "exit_price");
    }

    #[test]
    fn rejects_non_finite_numbers() {
        let mut input = valid();
        input.entry_price = f64::NAN;
        assert_invalid(&input, "entry_price");

        let mut input = valid();
        input.result_amount = f64::INFINITY;
        assert_invalid(&input, "result_amount");

        let mut input = valid();
        input.risk_amount = Some(f64::NAN);
        assert_invalid(&input, "risk_amount");
    }

    #[test]
    fn rejects_bad_optional_levels() {
        let mut input = valid();
        input.stop_loss = Some(0.0);
        assert_invalid(&input, "stop_loss");

        let mut input = valid();
        input.take_profit = Some(f64::NEG_INFINITY);
        assert_invalid(&input, "take_profit");
    }

    #[test]
    fn allows_absent_or_zero_risk() {
        let mut input = valid();
        input.risk_amount = None;
        validate_trade_input(&input).unwrap();

        input.risk_amount = Some(0.0);
        validate_trade_input(&input).unwrap();
    }

    #[test]
    fn rejects_negative_risk() {
        let mut input = valid();
        input.risk_amount = Some(-5.0);
        assert_invalid(&input, "risk_amount");
    }

    #[test]
    fn allows_zero_and_negative_results() {
        let mut input = valid();
        input.result_amount = 0.0;
        validate_trade_input(&input).unwrap();

        input.result_amount = -250.0;
        validate_trade_input(&input).unwrap();
    }

    #[test]
    fn rejects_close_before_open() {
        let mut input = valid();
        std::mem::swap(&mut input.open_time, &mut input.close_time);
        assert_invalid(&input, "close_time");
    }

    #[test]
    fn allows_close_equal_to_open() {
        let mut input = valid();
        input.close_time = input.open_time;
        validate_trade_input(&input).unwrap();
    }

    #[test]
    fn batch_reports_first_bad_row() {
        let mut inputs = sample_trades();
        validate_trade_inputs(&inputs).unwrap();
        validate_trade_inputs(&[]).unwrap();

        inputs[1].exit_price = 0.0;
        inputs[3].pair = " ".into();
        match validate_trade_inputs(&inputs) {
            Err(JournalError::Validation { field, .. }) => assert_eq!(field, "exit_price"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
