use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;

use super::{AgendaError, AgendaProvider};
use crate::models::Slot;

/// Agenda client against the clinic's scheduling API.
pub struct HttpAgendaProvider {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl HttpAgendaProvider {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Deserialize)]
struct BookingResponse {
    id: String,
}

#[async_trait]
impl AgendaProvider for HttpAgendaProvider {
    async fn list_available(
        &self,
        specialty_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Slot>, AgendaError> {
        let url = format!("{}/api/slots", self.base_url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .query(&[
                ("specialty", specialty_id),
                ("from", &from.to_string()),
                ("to", &to.to_string()),
            ])
            .send()
            .await
            .map_err(|e| AgendaError::Unavailable(e.to_string()))?
            .error_for_status()
            .map_err(|e| AgendaError::Unavailable(e.to_string()))?;

        response
            .json::<Vec<Slot>>()
            .await
            .map_err(|e| AgendaError::Unavailable(e.to_string()))
    }

    async fn book(
        &self,
        patient_id: &str,
        slot_id: &str,
        specialty_id: &str,
    ) -> Result<String, AgendaError> {
        let url = format!("{}/api/appointments", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({
                "patient_id": patient_id,
                "slot_id": slot_id,
                "specialty_id": specialty_id,
            }))
            .send()
            .await
            .map_err(|e| AgendaError::Unavailable(e.to_string()))?;

        if response.status() == reqwest::StatusCode::CONFLICT {
            return Err(AgendaError::SlotTaken);
        }

        let response = response
            .error_for_status()
            .map_err(|e| AgendaError::Unavailable(e.to_string()))?;

        let booking: BookingResponse = response
            .json()
            .await
            .map_err(|e| AgendaError::Unavailable(e.to_string()))?;
        Ok(booking.id)
    }
}
