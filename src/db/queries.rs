use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::models::{
    Appointment, AppointmentStatus, Conversation, ConversationState, ConversationStatus,
    MessageDirection, Patient, Reminder, ReminderKind,
};

const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FMT: &str = "%Y-%m-%d";
const TIME_FMT: &str = "%H:%M:%S";

fn fmt_datetime(dt: &NaiveDateTime) -> String {
    dt.format(DATETIME_FMT).to_string()
}

fn parse_datetime(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, DATETIME_FMT).unwrap_or_else(|_| Utc::now().naive_utc())
}

fn parse_date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, DATE_FMT).unwrap_or_else(|_| Utc::now().date_naive())
}

fn parse_time(s: &str) -> NaiveTime {
    NaiveTime::parse_from_str(s, TIME_FMT)
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .unwrap_or_default()
}

// ── Patients ──

pub fn get_patient_by_phone(conn: &Connection, phone: &str) -> anyhow::Result<Option<Patient>> {
    let result = conn.query_row(
        "SELECT id, phone, name, created_at, updated_at FROM patients WHERE phone = ?1",
        params![phone],
        |row| {
            Ok(Patient {
                id: row.get(0)?,
                phone: row.get(1)?,
                name: row.get(2)?,
                created_at: parse_datetime(&row.get::<_, String>(3)?),
                updated_at: parse_datetime(&row.get::<_, String>(4)?),
            })
        },
    );

    match result {
        Ok(patient) => Ok(Some(patient)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_or_create_patient(conn: &Connection, phone: &str) -> anyhow::Result<Patient> {
    if let Some(patient) = get_patient_by_phone(conn, phone)? {
        return Ok(patient);
    }

    let now = Utc::now().naive_utc();
    let patient = Patient {
        id: Uuid::new_v4().to_string(),
        phone: phone.to_string(),
        name: None,
        created_at: now,
        updated_at: now,
    };
    conn.execute(
        "INSERT INTO patients (id, phone, name, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            patient.id,
            patient.phone,
            patient.name,
            fmt_datetime(&patient.created_at),
            fmt_datetime(&patient.updated_at),
        ],
    )?;
    Ok(patient)
}

// ── Conversations ──

fn parse_conversation_row(row: &rusqlite::Row) -> rusqlite::Result<Conversation> {
    Ok(Conversation {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        status: ConversationStatus::parse(&row.get::<_, String>(2)?),
        current_state: ConversationState::parse(&row.get::<_, String>(3)?),
        context: row.get(4)?,
        revision: row.get(5)?,
        started_at: parse_datetime(&row.get::<_, String>(6)?),
        last_activity: parse_datetime(&row.get::<_, String>(7)?),
        ended_at: row.get::<_, Option<String>>(8)?.map(|s| parse_datetime(&s)),
    })
}

pub fn get_active_conversation(
    conn: &Connection,
    patient_id: &str,
) -> anyhow::Result<Option<Conversation>> {
    let result = conn.query_row(
        "SELECT id, patient_id, status, current_state, context, revision, started_at, last_activity, ended_at
         FROM conversations WHERE patient_id = ?1 AND status = 'active'",
        params![patient_id],
        parse_conversation_row,
    );

    match result {
        Ok(conv) => Ok(Some(conv)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn create_conversation(conn: &Connection, patient_id: &str) -> anyhow::Result<Conversation> {
    let now = Utc::now().naive_utc();
    let conversation = Conversation {
        id: Uuid::new_v4().to_string(),
        patient_id: patient_id.to_string(),
        status: ConversationStatus::Active,
        current_state: ConversationState::Initial,
        context: "{}".to_string(),
        revision: 0,
        started_at: now,
        last_activity: now,
        ended_at: None,
    };
    conn.execute(
        "INSERT INTO conversations (id, patient_id, status, current_state, context, revision, started_at, last_activity, ended_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, NULL)",
        params![
            conversation.id,
            conversation.patient_id,
            conversation.status.as_str(),
            conversation.current_state.as_str(),
            conversation.context,
            conversation.revision,
            fmt_datetime(&conversation.started_at),
            fmt_datetime(&conversation.last_activity),
        ],
    )?;
    Ok(conversation)
}

/// Whole-record replace guarded by the revision the caller read. Returns
/// false when another turn won the race; the caller must re-read and retry.
#[allow(clippy::too_many_arguments)]
pub fn update_conversation(
    conn: &Connection,
    id: &str,
    expected_revision: i64,
    state: ConversationState,
    status: ConversationStatus,
    context_json: &str,
    last_activity: &NaiveDateTime,
    ended_at: Option<&NaiveDateTime>,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE conversations
         SET current_state = ?1, status = ?2, context = ?3, last_activity = ?4,
             ended_at = COALESCE(?5, ended_at), revision = revision + 1
         WHERE id = ?6 AND revision = ?7",
        params![
            state.as_str(),
            status.as_str(),
            context_json,
            fmt_datetime(last_activity),
            ended_at.map(fmt_datetime),
            id,
            expected_revision,
        ],
    )?;
    Ok(count > 0)
}

// ── Message log ──

pub fn append_message(
    conn: &Connection,
    conversation_id: &str,
    direction: MessageDirection,
    content: &str,
    external_id: Option<&str>,
) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO messages (id, conversation_id, direction, content, external_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            Uuid::new_v4().to_string(),
            conversation_id,
            direction.as_str(),
            content,
            external_id,
            fmt_datetime(&Utc::now().naive_utc()),
        ],
    )?;
    Ok(())
}

pub fn count_messages(
    conn: &Connection,
    conversation_id: &str,
    direction: MessageDirection,
) -> anyhow::Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM messages WHERE conversation_id = ?1 AND direction = ?2",
        params![conversation_id, direction.as_str()],
        |row| row.get(0),
    )?;
    Ok(count)
}

// ── Appointments ──

pub fn create_appointment(conn: &Connection, appointment: &Appointment) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO appointments (id, external_id, patient_id, slot_id, specialty_id, doctor_id, doctor_name, date, time, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            appointment.id,
            appointment.external_id,
            appointment.patient_id,
            appointment.slot_id,
            appointment.specialty_id,
            appointment.doctor_id,
            appointment.doctor_name,
            appointment.date.format(DATE_FMT).to_string(),
            appointment.time.format(TIME_FMT).to_string(),
            appointment.status.as_str(),
            fmt_datetime(&appointment.created_at),
            fmt_datetime(&appointment.updated_at),
        ],
    )?;
    Ok(())
}

fn parse_appointment_row(row: &rusqlite::Row) -> rusqlite::Result<Appointment> {
    Ok(Appointment {
        id: row.get(0)?,
        external_id: row.get(1)?,
        patient_id: row.get(2)?,
        slot_id: row.get(3)?,
        specialty_id: row.get(4)?,
        doctor_id: row.get(5)?,
        doctor_name: row.get(6)?,
        date: parse_date(&row.get::<_, String>(7)?),
        time: parse_time(&row.get::<_, String>(8)?),
        status: AppointmentStatus::parse(&row.get::<_, String>(9)?),
        created_at: parse_datetime(&row.get::<_, String>(10)?),
        updated_at: parse_datetime(&row.get::<_, String>(11)?),
    })
}

pub fn get_appointments_for_patient(
    conn: &Connection,
    patient_id: &str,
) -> anyhow::Result<Vec<Appointment>> {
    let mut stmt = conn.prepare(
        "SELECT id, external_id, patient_id, slot_id, specialty_id, doctor_id, doctor_name, date, time, status, created_at, updated_at
         FROM appointments WHERE patient_id = ?1 ORDER BY date ASC, time ASC",
    )?;

    let rows = stmt.query_map(params![patient_id], parse_appointment_row)?;

    let mut appointments = vec![];
    for row in rows {
        appointments.push(row?);
    }
    Ok(appointments)
}

// ── Reminders ──

pub fn create_reminder(conn: &Connection, reminder: &Reminder) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO reminders (id, appointment_id, kind, scheduled_for, sent, sent_at, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            reminder.id,
            reminder.appointment_id,
            reminder.kind.as_str(),
            fmt_datetime(&reminder.scheduled_for),
            reminder.sent as i32,
            reminder.sent_at.as_ref().map(fmt_datetime),
            fmt_datetime(&reminder.created_at),
        ],
    )?;
    Ok(())
}

/// A reminder that is due, joined with enough detail to compose the message.
pub struct DueReminder {
    pub id: String,
    pub kind: ReminderKind,
    pub phone: String,
    pub doctor_name: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
}

pub fn get_due_reminders(
    conn: &Connection,
    now: &NaiveDateTime,
) -> anyhow::Result<Vec<DueReminder>> {
    let mut stmt = conn.prepare(
        "SELECT r.id, r.kind, p.phone, a.doctor_name, a.date, a.time
         FROM reminders r
         JOIN appointments a ON a.id = r.appointment_id
         JOIN patients p ON p.id = a.patient_id
         WHERE r.sent = 0 AND r.scheduled_for <= ?1
         ORDER BY r.scheduled_for ASC",
    )?;

    let rows = stmt.query_map(params![fmt_datetime(now)], |row| {
        Ok(DueReminder {
            id: row.get(0)?,
            kind: ReminderKind::parse(&row.get::<_, String>(1)?),
            phone: row.get(2)?,
            doctor_name: row.get(3)?,
            date: parse_date(&row.get::<_, String>(4)?),
            time: parse_time(&row.get::<_, String>(5)?),
        })
    })?;

    let mut due = vec![];
    for row in rows {
        due.push(row?);
    }
    Ok(due)
}

pub fn mark_reminder_sent(conn: &Connection, id: &str) -> anyhow::Result<()> {
    conn.execute(
        "UPDATE reminders SET sent = 1, sent_at = ?1 WHERE id = ?2",
        params![fmt_datetime(&Utc::now().naive_utc()), id],
    )?;
    Ok(())
}
