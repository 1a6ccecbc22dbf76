use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use uuid::Uuid;

use super::{AgendaError, AgendaProvider};
use crate::models::Slot;

const DOCTORS: &[(&str, &str)] = &[
    ("doc-1", "Dra. María González"),
    ("doc-2", "Dr. Carlos Rodríguez"),
    ("doc-3", "Dra. Ana Martínez"),
    ("doc-4", "Dr. José Fernández"),
    ("doc-5", "Dra. Carmen López"),
];

/// In-process agenda for development and demos. Slot generation is a pure
/// function of the specialty and the window, so repeated lookups within a
/// turn present a stable menu.
pub struct DemoAgendaProvider;

impl DemoAgendaProvider {
    fn seed(specialty_id: &str) -> u32 {
        specialty_id.bytes().map(u32::from).sum()
    }
}

#[async_trait]
impl AgendaProvider for DemoAgendaProvider {
    async fn list_available(
        &self,
        specialty_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Slot>, AgendaError> {
        let span = (to - from).num_days().max(1) as u32;
        let seed = Self::seed(specialty_id);

        let mut slots = Vec::with_capacity(5);
        for i in 0..5u32 {
            let day_offset = seed.wrapping_mul(31).wrapping_add(i * 5) % span;
            let hour = 8 + (seed + i * 3) % 9; // consulting hours, 08:00-16:00
            let (doctor_id, doctor_name) = DOCTORS[((seed + i) as usize) % DOCTORS.len()];

            slots.push(Slot {
                id: format!("slot_{}_{}", specialty_id, i + 1),
                date: from + chrono::Duration::days(day_offset as i64),
                time: NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or_default(),
                doctor_id: doctor_id.to_string(),
                doctor_name: doctor_name.to_string(),
                specialty_id: specialty_id.to_string(),
            });
        }
        slots.sort_by_key(|s| (s.date, s.time));

        Ok(slots)
    }

    async fn book(
        &self,
        patient_id: &str,
        slot_id: &str,
        _specialty_id: &str,
    ) -> Result<String, AgendaError> {
        let external_id = Uuid::new_v4().to_string();
        tracing::info!(patient = patient_id, slot = slot_id, external = %external_id, "demo agenda booked slot");
        Ok(external_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window() -> (NaiveDate, NaiveDate) {
        (
            NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 10, 1).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_generation_is_deterministic() {
        let (from, to) = window();
        let provider = DemoAgendaProvider;
        let first = provider.list_available("cardiology", from, to).await.unwrap();
        let second = provider.list_available("cardiology", from, to).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 5);
    }

    #[tokio::test]
    async fn test_slots_fall_inside_the_window() {
        let (from, to) = window();
        let provider = DemoAgendaProvider;
        for specialty in ["general", "cardiology", "pediatrics", "other"] {
            let slots = provider.list_available(specialty, from, to).await.unwrap();
            for slot in &slots {
                assert!(slot.date >= from && slot.date < to, "slot outside window");
                assert_eq!(slot.specialty_id, specialty);
            }
        }
    }

    #[tokio::test]
    async fn test_different_specialties_differ() {
        let (from, to) = window();
        let provider = DemoAgendaProvider;
        let cardio = provider.list_available("cardiology", from, to).await.unwrap();
        let derma = provider.list_available("dermatology", from, to).await.unwrap();
        assert_ne!(cardio, derma);
    }
}
