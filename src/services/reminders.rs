use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use rusqlite::Connection;
use uuid::Uuid;

use crate::db::queries::{self, DueReminder};
use crate::models::{Reminder, ReminderKind};
use crate::state::AppState;

/// Appointment reminder jobs. Scheduling happens inside the booking turn;
/// delivery is driven by the background loop and is not part of a turn's
/// correctness.
#[async_trait]
pub trait ReminderScheduler: Send + Sync {
    async fn schedule(
        &self,
        appointment_id: &str,
        when_utc: NaiveDateTime,
        kind: ReminderKind,
    ) -> anyhow::Result<String>;
}

pub struct DbReminderScheduler {
    db: Arc<Mutex<Connection>>,
}

impl DbReminderScheduler {
    pub fn new(db: Arc<Mutex<Connection>>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ReminderScheduler for DbReminderScheduler {
    async fn schedule(
        &self,
        appointment_id: &str,
        when_utc: NaiveDateTime,
        kind: ReminderKind,
    ) -> anyhow::Result<String> {
        let reminder = Reminder {
            id: Uuid::new_v4().to_string(),
            appointment_id: appointment_id.to_string(),
            kind,
            scheduled_for: when_utc,
            sent: false,
            sent_at: None,
            created_at: Utc::now().naive_utc(),
        };

        {
            let db = self.db.lock().unwrap();
            queries::create_reminder(&db, &reminder)?;
        }

        tracing::info!(
            appointment = appointment_id,
            kind = kind.as_str(),
            scheduled_for = %when_utc,
            "reminder scheduled"
        );
        Ok(reminder.id)
    }
}

/// Polls due reminders once a minute and delivers them over the
/// notification channel. Spawned once at startup.
pub async fn run_reminder_loop(state: Arc<AppState>) {
    let mut ticker = tokio::time::interval(Duration::from_secs(60));
    loop {
        ticker.tick().await;
        if let Err(e) = deliver_due_reminders(&state).await {
            tracing::error!(error = %e, "reminder delivery pass failed");
        }
    }
}

pub async fn deliver_due_reminders(state: &Arc<AppState>) -> anyhow::Result<()> {
    let now = Utc::now().naive_utc();
    let due = {
        let db = state.db.lock().unwrap();
        queries::get_due_reminders(&db, &now)?
    };

    for reminder in due {
        let text = reminder_text(&reminder);
        match state.notifier.send(&reminder.phone, &text).await {
            Ok(()) => {
                let db = state.db.lock().unwrap();
                queries::mark_reminder_sent(&db, &reminder.id)?;
            }
            Err(e) => {
                // Left unsent; the next pass retries
                tracing::error!(error = %e, reminder = %reminder.id, "failed to deliver reminder");
            }
        }
    }

    Ok(())
}

fn reminder_text(reminder: &DueReminder) -> String {
    let date = reminder.date.format("%d/%m/%Y");
    let time = reminder.time.format("%H:%M");
    match reminder.kind {
        ReminderKind::OneDayBefore => format!(
            "Recordatorio: tienes una cita médica mañana {} a las {} con {}. \
             Si no puedes asistir, escríbenos para reprogramarla.",
            date, time, reminder.doctor_name
        ),
        ReminderKind::OneHourBefore => format!(
            "Recordatorio: tu cita médica con {} es hoy a las {}. ¡Te esperamos!",
            reminder.doctor_name, time
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    fn due(kind: ReminderKind) -> DueReminder {
        DueReminder {
            id: "rem-1".to_string(),
            kind,
            phone: "+573001112233".to_string(),
            doctor_name: "Dra. María González".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 9, 15).unwrap(),
            time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_one_day_reminder_text() {
        let text = reminder_text(&due(ReminderKind::OneDayBefore));
        assert!(text.contains("mañana 15/09/2025"));
        assert!(text.contains("10:00"));
        assert!(text.contains("Dra. María González"));
    }

    #[test]
    fn test_one_hour_reminder_text() {
        let text = reminder_text(&due(ReminderKind::OneHourBefore));
        assert!(text.contains("hoy a las 10:00"));
    }
}
