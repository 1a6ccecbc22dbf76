pub mod demo;
pub mod http;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::models::Slot;

#[derive(Debug, thiserror::Error)]
pub enum AgendaError {
    /// The slot was taken between listing and booking.
    #[error("slot is no longer available")]
    SlotTaken,

    #[error("agenda provider error: {0}")]
    Unavailable(String),
}

/// External agenda system: slot availability plus the booking sink.
/// `list_available` may return an empty list, never an error for "nothing
/// free"; `book` returns the external booking id.
#[async_trait]
pub trait AgendaProvider: Send + Sync {
    async fn list_available(
        &self,
        specialty_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Slot>, AgendaError>;

    async fn book(
        &self,
        patient_id: &str,
        slot_id: &str,
        specialty_id: &str,
    ) -> Result<String, AgendaError>;
}
