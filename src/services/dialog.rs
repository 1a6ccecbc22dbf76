use chrono::{Duration, NaiveDateTime};

use crate::models::{
    Analysis, ConversationContext, ConversationState, ReminderKind, Slot, CONTEXT_VERSION,
    MAX_SLOTS,
};
use crate::services::nlp::{specialty_display_name, DEFAULT_SPECIALTIES};

/// One resolved dialog turn: the state/context snapshot to persist, the
/// reply for the patient, and any follow-up effects. Produced by pure
/// functions only; nothing here has touched I/O yet.
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    pub next_state: ConversationState,
    pub context: ConversationContext,
    pub reply: String,
    pub close_conversation: bool,
    pub effects: Vec<Effect>,
}

impl Turn {
    fn new(state: ConversationState, context: ConversationContext, reply: String) -> Self {
        Self {
            next_state: state,
            context,
            reply,
            close_conversation: false,
            effects: Vec::new(),
        }
    }
}

/// Follow-up side effects requested by a completed transition. Executed by
/// the dispatcher after the transition is persisted, best-effort.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    ScheduleReminder {
        appointment_id: String,
        kind: ReminderKind,
        when: NaiveDateTime,
    },
}

/// What a turn needs next: either it is fully decided, or it blocks on one
/// I/O effect whose result feeds back in through [`slots_fetched`] or
/// [`booking_confirmed`] / [`effect_failed`].
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Reply(Turn),
    LookupSlots { specialty: String },
    Book { slot: Slot, specialty: String },
}

pub fn advance(
    state: ConversationState,
    context: &ConversationContext,
    text: &str,
    analysis: &Analysis,
) -> Action {
    match state {
        ConversationState::Initial => Action::Reply(Turn::new(
            ConversationState::CollectingSpecialty,
            ConversationContext::default(),
            greeting_menu(),
        )),

        ConversationState::CollectingSpecialty => match &analysis.entities.specialty {
            Some(code) => Action::LookupSlots {
                specialty: code.clone(),
            },
            None => Action::Reply(Turn::new(state, context.clone(), clarify_specialty())),
        },

        ConversationState::ShowingAvailableSlots => {
            let selected = analysis
                .entities
                .numeric_selection()
                .and_then(|n| context.slot_by_index(n));
            match selected {
                Some(slot) => {
                    let mut next = context.clone();
                    next.selected_slot_id = Some(slot.id.clone());
                    Action::Reply(Turn::new(
                        ConversationState::ConfirmingAppointment,
                        next,
                        confirmation_summary(slot),
                    ))
                }
                None => Action::Reply(Turn::new(state, context.clone(), reprompt_selection())),
            }
        }

        ConversationState::ConfirmingAppointment => {
            let normalized = text.trim().to_uppercase();
            // Affirmative is checked first: a message containing both wins as a yes
            if is_affirmative(&normalized) {
                if let (Some(slot), Some(specialty)) =
                    (context.selected_slot(), context.selected_specialty.as_deref())
                {
                    return Action::Book {
                        slot: slot.clone(),
                        specialty: specialty.to_string(),
                    };
                }
                Action::Reply(Turn::new(state, context.clone(), reprompt_confirmation()))
            } else if is_negative(&normalized) {
                let mut next = context.clone();
                next.selected_slot_id = None;
                Action::Reply(Turn::new(
                    ConversationState::CollectingSpecialty,
                    next,
                    declined_reply(),
                ))
            } else {
                Action::Reply(Turn::new(state, context.clone(), reprompt_confirmation()))
            }
        }

        // Terminal or unmapped states never request effects
        ConversationState::AppointmentBooked
        | ConversationState::RequestingChange
        | ConversationState::Completed => {
            Action::Reply(Turn::new(state, context.clone(), fallback_reply().to_string()))
        }
    }
}

/// Resolution of a successful slot lookup. A non-empty result replaces the
/// context wholesale with the capped slot list; an empty result keeps the
/// caller in specialty selection.
pub fn slots_fetched(
    context: &ConversationContext,
    specialty: &str,
    slots: Vec<Slot>,
) -> Turn {
    if slots.is_empty() {
        return Turn::new(
            ConversationState::CollectingSpecialty,
            context.clone(),
            no_availability_reply(specialty),
        );
    }

    let shown: Vec<Slot> = slots.into_iter().take(MAX_SLOTS).collect();
    let reply = slot_list_reply(specialty, &shown);
    let next = ConversationContext {
        version: CONTEXT_VERSION,
        selected_specialty: Some(specialty.to_string()),
        available_slots: shown,
        selected_slot_id: None,
        pending_appointment_id: None,
    };
    Turn::new(ConversationState::ShowingAvailableSlots, next, reply)
}

/// Resolution of a successful booking: the conversation is closed and both
/// reminders are requested relative to the appointment start.
pub fn booking_confirmed(
    context: &ConversationContext,
    appointment_id: &str,
    slot: &Slot,
) -> Turn {
    let mut next = context.clone();
    next.pending_appointment_id = Some(appointment_id.to_string());

    let starts_at = NaiveDateTime::new(slot.date, slot.time);
    let effects = vec![
        Effect::ScheduleReminder {
            appointment_id: appointment_id.to_string(),
            kind: ReminderKind::OneDayBefore,
            when: starts_at - Duration::days(1),
        },
        Effect::ScheduleReminder {
            appointment_id: appointment_id.to_string(),
            kind: ReminderKind::OneHourBefore,
            when: starts_at - Duration::hours(1),
        },
    ];

    Turn {
        next_state: ConversationState::AppointmentBooked,
        context: next,
        reply: booked_reply().to_string(),
        close_conversation: true,
        effects,
    }
}

/// A failed or timed-out effect never advances the dialog: same state, same
/// context, generic apology.
pub fn effect_failed(state: ConversationState, context: &ConversationContext) -> Turn {
    Turn::new(state, context.clone(), apology_reply().to_string())
}

fn is_affirmative(normalized: &str) -> bool {
    normalized.contains("SÍ")
        || normalized.contains("SI")
        || normalized.contains("YES")
        || normalized == "1"
}

fn is_negative(normalized: &str) -> bool {
    normalized.contains("NO") || normalized == "0"
}

// ── Reply texts ──

fn greeting_menu() -> String {
    let mut menu = String::from(
        "¡Hola! Bienvenido al asistente de citas médicas.\n\n\
         Por favor, dime qué especialidad médica necesitas:\n",
    );
    for specialty in DEFAULT_SPECIALTIES {
        menu.push_str("- ");
        menu.push_str(specialty.display_name);
        menu.push('\n');
    }
    menu.push_str("\nSolo escribe el nombre de la especialidad.");
    menu
}

fn clarify_specialty() -> String {
    let names: Vec<&str> = DEFAULT_SPECIALTIES.iter().map(|s| s.display_name).collect();
    format!(
        "No pude identificar la especialidad. Por favor, especifica una de las siguientes: {}.",
        names.join(", ")
    )
}

fn slot_list_reply(specialty: &str, slots: &[Slot]) -> String {
    let mut reply = format!(
        "Perfecto! Encontré las siguientes citas disponibles para {}:\n\n",
        specialty_display_name(specialty)
    );
    for (index, slot) in slots.iter().enumerate() {
        reply.push_str(&format!(
            "{}. {} a las {} - {}\n",
            index + 1,
            slot.date.format("%d/%m/%Y"),
            slot.time.format("%H:%M"),
            slot.doctor_name,
        ));
    }
    reply.push_str("\nPor favor, responde con el número de la cita que prefieres (1, 2, 3, etc.)");
    reply
}

fn no_availability_reply(specialty: &str) -> String {
    format!(
        "Lo siento, no encontré citas disponibles para {} en los próximos 30 días. \
         ¿Te gustaría consultar otra especialidad?",
        specialty_display_name(specialty)
    )
}

fn reprompt_selection() -> String {
    "Por favor, responde con el número de la cita que prefieres (ejemplo: 1, 2, 3...)".to_string()
}

fn confirmation_summary(slot: &Slot) -> String {
    format!(
        "Perfecto! Has seleccionado:\n\n\
         📅 Fecha: {}\n\
         🕐 Hora: {}\n\
         👨‍⚕️ Doctor: {}\n\n\
         ¿Confirmas esta cita? Responde 'SÍ' para confirmar o 'NO' para cancelar.",
        slot.date.format("%d/%m/%Y"),
        slot.time.format("%H:%M"),
        slot.doctor_name,
    )
}

fn reprompt_confirmation() -> String {
    "Por favor, responde 'SÍ' para confirmar la cita o 'NO' para cancelar.".to_string()
}

fn declined_reply() -> String {
    "Entendido. ¿Te gustaría seleccionar otra cita o consultar una especialidad diferente?"
        .to_string()
}

fn booked_reply() -> &'static str {
    "✅ ¡Cita confirmada exitosamente!\n\n\
     Te enviaremos recordatorios:\n\
     • 1 día antes de tu cita\n\
     • 1 hora antes de tu cita\n\n\
     Si necesitas cambiar o cancelar tu cita, solo escríbenos.\n\n\
     ¡Gracias por usar nuestro servicio! 😊"
}

pub fn fallback_reply() -> &'static str {
    "Lo siento, no pude procesar tu mensaje. ¿Podrías repetirlo?"
}

pub fn apology_reply() -> &'static str {
    "Lo siento, ha ocurrido un error. Por favor intenta nuevamente o contacta con nosotros."
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::nlp::{EntityExtractor, IntentClassifier};
    use chrono::{NaiveDate, NaiveTime};

    fn analyze(text: &str) -> Analysis {
        Analysis {
            intent: IntentClassifier::default().classify(text),
            entities: EntityExtractor::default().extract(text),
        }
    }

    fn slot(n: usize) -> Slot {
        Slot {
            id: format!("slot_cardiology_{n}"),
            date: NaiveDate::from_ymd_opt(2025, 9, 10 + n as u32).unwrap(),
            time: NaiveTime::from_hms_opt(8 + n as u32, 0, 0).unwrap(),
            doctor_id: format!("doc-{n}"),
            doctor_name: format!("Dra. González {n}"),
            specialty_id: "cardiology".to_string(),
        }
    }

    fn context_with_slots(n: usize) -> ConversationContext {
        ConversationContext {
            selected_specialty: Some("cardiology".to_string()),
            available_slots: (1..=n).map(slot).collect(),
            ..Default::default()
        }
    }

    fn confirming_context() -> ConversationContext {
        let mut ctx = context_with_slots(3);
        ctx.selected_slot_id = Some("slot_cardiology_2".to_string());
        ctx
    }

    fn expect_reply(action: Action) -> Turn {
        match action {
            Action::Reply(turn) => turn,
            other => panic!("expected a completed turn, got {other:?}"),
        }
    }

    #[test]
    fn test_initial_state_greets_and_collects_specialty() {
        let text = "lo que sea";
        let turn = expect_reply(advance(
            ConversationState::Initial,
            &ConversationContext::default(),
            text,
            &analyze(text),
        ));
        assert_eq!(turn.next_state, ConversationState::CollectingSpecialty);
        assert!(turn.reply.contains("especialidad"));
        assert!(turn.reply.contains("Cardiología"));
        assert!(!turn.close_conversation);
    }

    #[test]
    fn test_specialty_entity_requests_slot_lookup() {
        let text = "necesito cardiología";
        let action = advance(
            ConversationState::CollectingSpecialty,
            &ConversationContext::default(),
            text,
            &analyze(text),
        );
        assert_eq!(
            action,
            Action::LookupSlots {
                specialty: "cardiology".to_string()
            }
        );
    }

    #[test]
    fn test_missing_specialty_asks_to_clarify() {
        let text = "no sé qué me pasa";
        let turn = expect_reply(advance(
            ConversationState::CollectingSpecialty,
            &ConversationContext::default(),
            text,
            &analyze(text),
        ));
        assert_eq!(turn.next_state, ConversationState::CollectingSpecialty);
        assert!(turn.reply.contains("No pude identificar"));
    }

    #[test]
    fn test_slots_fetched_caches_and_numbers_the_list() {
        let slots: Vec<Slot> = (1..=3).map(slot).collect();
        let turn = slots_fetched(&ConversationContext::default(), "cardiology", slots);
        assert_eq!(turn.next_state, ConversationState::ShowingAvailableSlots);
        assert_eq!(turn.context.available_slots.len(), 3);
        assert_eq!(turn.context.selected_specialty.as_deref(), Some("cardiology"));
        assert!(turn.reply.contains("1. "));
        assert!(turn.reply.contains("2. "));
        assert!(turn.reply.contains("3. "));
        assert!(turn.reply.contains("Cardiología"));
    }

    #[test]
    fn test_slots_fetched_caps_at_five() {
        let slots: Vec<Slot> = (1..=8).map(slot).collect();
        let turn = slots_fetched(&ConversationContext::default(), "cardiology", slots);
        assert_eq!(turn.context.available_slots.len(), MAX_SLOTS);
    }

    #[test]
    fn test_no_availability_keeps_collecting() {
        let ctx = ConversationContext::default();
        let turn = slots_fetched(&ctx, "dermatology", vec![]);
        assert_eq!(turn.next_state, ConversationState::CollectingSpecialty);
        assert_eq!(turn.context, ctx);
        assert!(turn.reply.contains("no encontré citas disponibles"));
    }

    #[test]
    fn test_valid_selection_moves_to_confirmation() {
        let ctx = context_with_slots(3);
        let text = "2";
        let turn = expect_reply(advance(
            ConversationState::ShowingAvailableSlots,
            &ctx,
            text,
            &analyze(text),
        ));
        assert_eq!(turn.next_state, ConversationState::ConfirmingAppointment);
        assert_eq!(
            turn.context.selected_slot_id.as_deref(),
            Some("slot_cardiology_2")
        );
        assert!(turn.reply.contains("¿Confirmas esta cita?"));
    }

    #[test]
    fn test_selection_bounds_reprompt_without_panicking() {
        let ctx = context_with_slots(3);
        for text in ["0", "4", "99", "ninguna"] {
            let turn = expect_reply(advance(
                ConversationState::ShowingAvailableSlots,
                &ctx,
                text,
                &analyze(text),
            ));
            assert_eq!(turn.next_state, ConversationState::ShowingAvailableSlots);
            assert!(turn.context.selected_slot_id.is_none());
            assert!(turn.reply.contains("número de la cita"));
        }
    }

    #[test]
    fn test_affirmative_requests_booking() {
        let ctx = confirming_context();
        let text = "SI";
        let action = advance(ConversationState::ConfirmingAppointment, &ctx, text, &analyze(text));
        match action {
            Action::Book { slot, specialty } => {
                assert_eq!(slot.id, "slot_cardiology_2");
                assert_eq!(specialty, "cardiology");
            }
            other => panic!("expected booking request, got {other:?}"),
        }
    }

    #[test]
    fn test_affirmative_variants() {
        let ctx = confirming_context();
        for text in ["sí", "Sí, claro", "1", "yes"] {
            let action =
                advance(ConversationState::ConfirmingAppointment, &ctx, text, &analyze(text));
            assert!(
                matches!(action, Action::Book { .. }),
                "{text:?} should read as a yes"
            );
        }
    }

    #[test]
    fn test_affirmative_wins_over_negative() {
        let ctx = confirming_context();
        let text = "sí pero no estoy seguro";
        let action = advance(ConversationState::ConfirmingAppointment, &ctx, text, &analyze(text));
        assert!(matches!(action, Action::Book { .. }));
    }

    #[test]
    fn test_negative_returns_to_specialty_and_clears_selection() {
        let ctx = confirming_context();
        let text = "no";
        let turn = expect_reply(advance(
            ConversationState::ConfirmingAppointment,
            &ctx,
            text,
            &analyze(text),
        ));
        assert_eq!(turn.next_state, ConversationState::CollectingSpecialty);
        assert!(turn.context.selected_slot_id.is_none());
        assert!(turn.reply.contains("Entendido"));
    }

    #[test]
    fn test_zero_is_a_no_only_when_exact() {
        let ctx = confirming_context();
        let turn = expect_reply(advance(
            ConversationState::ConfirmingAppointment,
            &ctx,
            "0",
            &analyze("0"),
        ));
        assert_eq!(turn.next_state, ConversationState::CollectingSpecialty);

        // "10" is neither an exact yes nor an exact no
        let turn = expect_reply(advance(
            ConversationState::ConfirmingAppointment,
            &ctx,
            "10",
            &analyze("10"),
        ));
        assert_eq!(turn.next_state, ConversationState::ConfirmingAppointment);
        assert!(turn.reply.contains("'SÍ'"));
    }

    #[test]
    fn test_ambiguous_confirmation_reprompts() {
        let ctx = confirming_context();
        let text = "tal vez mañana";
        let turn = expect_reply(advance(
            ConversationState::ConfirmingAppointment,
            &ctx,
            text,
            &analyze(text),
        ));
        assert_eq!(turn.next_state, ConversationState::ConfirmingAppointment);
        assert_eq!(turn.context, ctx);
    }

    #[test]
    fn test_affirmative_without_selection_reprompts() {
        let ctx = context_with_slots(3); // nothing selected yet
        let turn = expect_reply(advance(
            ConversationState::ConfirmingAppointment,
            &ctx,
            "sí",
            &analyze("sí"),
        ));
        assert_eq!(turn.next_state, ConversationState::ConfirmingAppointment);
        assert!(turn.reply.contains("'SÍ'"));
    }

    #[test]
    fn test_booking_confirmed_closes_and_schedules_reminders() {
        let ctx = confirming_context();
        let booked_slot = slot(2);
        let turn = booking_confirmed(&ctx, "appt-1", &booked_slot);

        assert_eq!(turn.next_state, ConversationState::AppointmentBooked);
        assert!(turn.close_conversation);
        assert_eq!(turn.context.pending_appointment_id.as_deref(), Some("appt-1"));
        assert!(turn.reply.contains("Cita confirmada"));

        let starts_at = NaiveDateTime::new(booked_slot.date, booked_slot.time);
        assert_eq!(
            turn.effects,
            vec![
                Effect::ScheduleReminder {
                    appointment_id: "appt-1".to_string(),
                    kind: ReminderKind::OneDayBefore,
                    when: starts_at - Duration::days(1),
                },
                Effect::ScheduleReminder {
                    appointment_id: "appt-1".to_string(),
                    kind: ReminderKind::OneHourBefore,
                    when: starts_at - Duration::hours(1),
                },
            ]
        );
    }

    #[test]
    fn test_effect_failure_preserves_state_and_context() {
        let ctx = confirming_context();
        let turn = effect_failed(ConversationState::ConfirmingAppointment, &ctx);
        assert_eq!(turn.next_state, ConversationState::ConfirmingAppointment);
        assert_eq!(turn.context, ctx);
        assert!(!turn.close_conversation);
        assert!(turn.effects.is_empty());
        assert_eq!(turn.reply, apology_reply());
    }

    #[test]
    fn test_booked_state_never_books_again() {
        // A duplicate "SI" against an already-booked conversation must not
        // produce another booking request
        let ctx = confirming_context();
        let turn = expect_reply(advance(
            ConversationState::AppointmentBooked,
            &ctx,
            "SI",
            &analyze("SI"),
        ));
        assert_eq!(turn.next_state, ConversationState::AppointmentBooked);
        assert_eq!(turn.reply, fallback_reply());
    }

    #[test]
    fn test_unmapped_states_fall_back_unchanged() {
        let ctx = ConversationContext::default();
        for state in [ConversationState::RequestingChange, ConversationState::Completed] {
            let turn = expect_reply(advance(state, &ctx, "hola", &analyze("hola")));
            assert_eq!(turn.next_state, state);
            assert_eq!(turn.context, ctx);
            assert_eq!(turn.reply, fallback_reply());
        }
    }
}
