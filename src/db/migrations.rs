use anyhow::Context;
use rusqlite::Connection;

// Migrations are embedded so that in-memory databases (tests, ephemeral
// deploys) always start from a complete schema.
const MIGRATIONS: &[(&str, &str)] = &[
    (
        "0001_patients_conversations",
        "CREATE TABLE patients (
            id TEXT PRIMARY KEY,
            phone TEXT NOT NULL UNIQUE,
            name TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        CREATE TABLE conversations (
            id TEXT PRIMARY KEY,
            patient_id TEXT NOT NULL REFERENCES patients(id),
            status TEXT NOT NULL,
            current_state TEXT NOT NULL,
            context TEXT NOT NULL DEFAULT '{}',
            revision INTEGER NOT NULL DEFAULT 0,
            started_at TEXT NOT NULL,
            last_activity TEXT NOT NULL,
            ended_at TEXT
        );
        CREATE UNIQUE INDEX idx_conversations_one_active
            ON conversations(patient_id) WHERE status = 'active';
        CREATE TABLE messages (
            id TEXT PRIMARY KEY,
            conversation_id TEXT NOT NULL REFERENCES conversations(id),
            direction TEXT NOT NULL,
            content TEXT NOT NULL,
            external_id TEXT,
            created_at TEXT NOT NULL
        );
        CREATE INDEX idx_messages_conversation ON messages(conversation_id);",
    ),
    (
        "0002_appointments_reminders",
        "CREATE TABLE appointments (
            id TEXT PRIMARY KEY,
            external_id TEXT NOT NULL,
            patient_id TEXT NOT NULL REFERENCES patients(id),
            slot_id TEXT NOT NULL,
            specialty_id TEXT NOT NULL,
            doctor_id TEXT NOT NULL,
            doctor_name TEXT NOT NULL,
            date TEXT NOT NULL,
            time TEXT NOT NULL,
            status TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        CREATE INDEX idx_appointments_patient ON appointments(patient_id);
        CREATE TABLE reminders (
            id TEXT PRIMARY KEY,
            appointment_id TEXT NOT NULL REFERENCES appointments(id),
            kind TEXT NOT NULL,
            scheduled_for TEXT NOT NULL,
            sent INTEGER NOT NULL DEFAULT 0,
            sent_at TEXT,
            created_at TEXT NOT NULL
        );
        CREATE INDEX idx_reminders_pending ON reminders(sent, scheduled_for);",
    ),
];

pub fn run_migrations(conn: &Connection) -> anyhow::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            name TEXT PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )
    .context("failed to create migrations table")?;

    for (name, sql) in MIGRATIONS {
        let already_applied: bool = conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM _migrations WHERE name = ?1",
                [name],
                |row| row.get(0),
            )
            .context("failed to check migration status")?;

        if already_applied {
            continue;
        }

        conn.execute_batch(sql)
            .with_context(|| format!("failed to apply migration: {name}"))?;

        conn.execute("INSERT INTO _migrations (name) VALUES (?1)", [name])
            .with_context(|| format!("failed to record migration: {name}"))?;

        tracing::info!("applied migration: {name}");
    }

    Ok(())
}
