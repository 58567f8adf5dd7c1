//! Trade persistence port trait.

use crate::domain::error::JournalError;
use crate::domain::trade::{Trade, TradeId, TradeInput};

/// Persists trades keyed by a store-assigned [`TradeId`].
///
/// Implementations validate every input before writing and report a missing
/// id as [`JournalError::NotFound`].
pub trait TradeStore {
    /// All trades, ordered by close time ascending (ties by id).
    fn list(&self) -> Result<Vec<Trade>, JournalError>;

    fn get(&self, id: TradeId) -> Result<Option<Trade>, JournalError>;

    fn create(&self, input: &TradeInput) -> Result<Trade, JournalError>;

    fn update(&self, id: TradeId, input: &TradeInput) -> Result<Trade, JournalError>;

    fn delete(&self, id: TradeId) -> Result<TradeId, JournalError>;

    /// Default implementation: one `create` per input, stopping at the first error.
    fn create_many(&self, inputs: &[TradeInput]) -> Result<Vec<Trade>, JournalError> {
        inputs.iter().map(|input| self.create(input)).collect()
    }
}
