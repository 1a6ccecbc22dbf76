use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::db::queries;
use crate::errors::TurnError;
use crate::models::{Appointment, AppointmentStatus, Slot};
use crate::services::dialog::Effect;
use crate::state::AppState;

/// How far ahead the agenda is searched, starting tomorrow.
const SEARCH_WINDOW_DAYS: i64 = 30;

fn effect_timeout(state: &AppState) -> StdDuration {
    StdDuration::from_secs(state.config.effect_timeout_secs)
}

/// Slot lookup effect. Timeouts and provider failures collapse into a single
/// `EffectFailed`; transport detail stays in the logs.
pub async fn fetch_slots(state: &Arc<AppState>, specialty: &str) -> Result<Vec<Slot>, TurnError> {
    let from = Utc::now().date_naive() + Duration::days(1);
    let to = from + Duration::days(SEARCH_WINDOW_DAYS - 1);

    match tokio::time::timeout(
        effect_timeout(state),
        state.agenda.list_available(specialty, from, to),
    )
    .await
    {
        Ok(Ok(slots)) => Ok(slots),
        Ok(Err(e)) => {
            tracing::error!(error = %e, specialty, "slot lookup failed");
            Err(TurnError::EffectFailed("slot lookup".to_string()))
        }
        Err(_) => {
            tracing::error!(specialty, "slot lookup timed out");
            Err(TurnError::EffectFailed("slot lookup timeout".to_string()))
        }
    }
}

/// Booking effect: book against the agenda, then persist the appointment.
/// Runs synchronously inside the turn; any failure leaves the dialog in its
/// pre-transition state.
pub async fn book_slot(
    state: &Arc<AppState>,
    patient_id: &str,
    slot: &Slot,
    specialty: &str,
) -> Result<Appointment, TurnError> {
    let external_id = match tokio::time::timeout(
        effect_timeout(state),
        state.agenda.book(patient_id, &slot.id, specialty),
    )
    .await
    {
        Ok(Ok(id)) => id,
        Ok(Err(e)) => {
            tracing::warn!(error = %e, slot = %slot.id, "booking rejected by agenda");
            return Err(TurnError::EffectFailed("booking".to_string()));
        }
        Err(_) => {
            tracing::error!(slot = %slot.id, "booking timed out");
            return Err(TurnError::EffectFailed("booking timeout".to_string()));
        }
    };

    let now = Utc::now().naive_utc();
    let appointment = Appointment {
        id: Uuid::new_v4().to_string(),
        external_id,
        patient_id: patient_id.to_string(),
        slot_id: slot.id.clone(),
        specialty_id: specialty.to_string(),
        doctor_id: slot.doctor_id.clone(),
        doctor_name: slot.doctor_name.clone(),
        date: slot.date,
        time: slot.time,
        status: AppointmentStatus::Assigned,
        created_at: now,
        updated_at: now,
    };

    {
        let db = state.db.lock().unwrap();
        queries::create_appointment(&db, &appointment).map_err(|e| {
            tracing::error!(error = %e, "failed to persist appointment");
            TurnError::EffectFailed("appointment persistence".to_string())
        })?;
    }

    tracing::info!(
        appointment = %appointment.id,
        patient = patient_id,
        slot = %slot.id,
        "appointment booked"
    );
    Ok(appointment)
}

/// Post-transition follow-ups, executed in emitted order. The first failure
/// stops the rest, but never unwinds the transition that was already
/// persisted; delivery of what was dropped is logged instead.
pub async fn run_follow_ups(state: &Arc<AppState>, effects: &[Effect]) {
    for effect in effects {
        match effect {
            Effect::ScheduleReminder {
                appointment_id,
                kind,
                when,
            } => {
                if let Err(e) = state.scheduler.schedule(appointment_id, *when, *kind).await {
                    tracing::error!(
                        error = %e,
                        appointment = %appointment_id,
                        kind = kind.as_str(),
                        "failed to schedule reminder, skipping remaining follow-ups"
                    );
                    break;
                }
            }
        }
    }
}
