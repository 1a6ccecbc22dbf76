use std::sync::Arc;

use chrono::Utc;

use crate::db::queries;
use crate::errors::TurnError;
use crate::models::{Analysis, ConversationContext, ConversationStatus, MessageDirection};
use crate::services::{dialog, effects};
use crate::state::AppState;

/// One retry after losing a persistence race; the second loss gives up and
/// surfaces as a processing failure.
const MAX_TURN_ATTEMPTS: usize = 2;

/// Processes one inbound message end to end and returns the reply text
/// (empty means "send nothing"). Turns for the same patient are serialized
/// on a per-patient lock; the revision-guarded conversation replace is the
/// backstop against races from other processes sharing the database.
pub async fn process_message(
    state: &Arc<AppState>,
    phone: &str,
    text: &str,
    external_id: Option<&str>,
) -> anyhow::Result<String> {
    let lock = patient_lock(state, phone);
    let _guard = lock.lock().await;

    let mut inbound_logged = false;
    for attempt in 0..MAX_TURN_ATTEMPTS {
        match run_turn(state, phone, text, external_id, &mut inbound_logged).await {
            Ok(reply) => return Ok(reply),
            Err(e) => {
                let conflict = e
                    .downcast_ref::<TurnError>()
                    .is_some_and(|t| matches!(t, TurnError::PersistenceConflict));
                if conflict && attempt + 1 < MAX_TURN_ATTEMPTS {
                    tracing::warn!(phone, "conversation changed concurrently, retrying turn");
                    continue;
                }
                return Err(e);
            }
        }
    }
    unreachable!("turn loop either returns a reply or an error")
}

async fn run_turn(
    state: &Arc<AppState>,
    phone: &str,
    text: &str,
    external_id: Option<&str>,
    inbound_logged: &mut bool,
) -> anyhow::Result<String> {
    // Load-or-create patient and their active conversation
    let (patient, conversation) = {
        let db = state.db.lock().unwrap();
        let patient = queries::get_or_create_patient(&db, phone)?;
        let conversation = match queries::get_active_conversation(&db, &patient.id)? {
            Some(conversation) => conversation,
            None => queries::create_conversation(&db, &patient.id)?,
        };
        (patient, conversation)
    };

    // Log the inbound message once, even if the turn is retried
    if !*inbound_logged {
        let db = state.db.lock().unwrap();
        queries::append_message(
            &db,
            &conversation.id,
            MessageDirection::Inbound,
            text,
            external_id,
        )?;
        *inbound_logged = true;
    }

    let analysis = Analysis {
        intent: state.classifier.classify(text),
        entities: state.extractor.extract(text),
    };

    tracing::info!(
        phone,
        intent = analysis.intent.as_str(),
        state = conversation.current_state.as_str(),
        "processing message"
    );

    // A context blob we cannot read is reported and never overwritten
    let context = match ConversationContext::from_json(&conversation.context) {
        Ok(context) => context,
        Err(e) => {
            let violation = TurnError::InvariantViolation(e.to_string());
            tracing::warn!(phone, error = %violation, "unreadable conversation context, keeping state");
            let reply = dialog::fallback_reply().to_string();
            let db = state.db.lock().unwrap();
            queries::append_message(
                &db,
                &conversation.id,
                MessageDirection::Outbound,
                &reply,
                None,
            )?;
            return Ok(reply);
        }
    };

    // Pure decision, then at most one I/O effect resolved back into a turn
    let turn = match dialog::advance(conversation.current_state, &context, text, &analysis) {
        dialog::Action::Reply(turn) => turn,
        dialog::Action::LookupSlots { specialty } => {
            match effects::fetch_slots(state, &specialty).await {
                Ok(slots) => dialog::slots_fetched(&context, &specialty, slots),
                Err(_) => dialog::effect_failed(conversation.current_state, &context),
            }
        }
        dialog::Action::Book { slot, specialty } => {
            match effects::book_slot(state, &patient.id, &slot, &specialty).await {
                Ok(appointment) => dialog::booking_confirmed(&context, &appointment.id, &slot),
                Err(_) => dialog::effect_failed(conversation.current_state, &context),
            }
        }
    };

    // Replace the conversation record; a stale revision re-runs the turn
    let now = Utc::now().naive_utc();
    let (status, ended_at) = if turn.close_conversation {
        (ConversationStatus::Completed, Some(now))
    } else {
        (conversation.status, None)
    };
    {
        let db = state.db.lock().unwrap();
        let won = queries::update_conversation(
            &db,
            &conversation.id,
            conversation.revision,
            turn.next_state,
            status,
            &turn.context.to_json(),
            &now,
            ended_at.as_ref(),
        )?;
        if !won {
            return Err(TurnError::PersistenceConflict.into());
        }
    }

    effects::run_follow_ups(state, &turn.effects).await;

    {
        let db = state.db.lock().unwrap();
        queries::append_message(
            &db,
            &conversation.id,
            MessageDirection::Outbound,
            &turn.reply,
            None,
        )?;
    }

    Ok(turn.reply)
}

fn patient_lock(state: &Arc<AppState>, phone: &str) -> Arc<tokio::sync::Mutex<()>> {
    let mut locks = state.turn_locks.lock().unwrap();
    locks
        .entry(phone.to_string())
        .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
        .clone()
}
