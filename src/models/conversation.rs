use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Dialog progression for one booking conversation. Cycles are allowed:
/// a declined confirmation drops back to specialty selection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConversationState {
    Initial,
    CollectingSpecialty,
    ShowingAvailableSlots,
    ConfirmingAppointment,
    AppointmentBooked,
    RequestingChange,
    Completed,
}

impl ConversationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationState::Initial => "initial",
            ConversationState::CollectingSpecialty => "collecting_specialty",
            ConversationState::ShowingAvailableSlots => "showing_available_slots",
            ConversationState::ConfirmingAppointment => "confirming_appointment",
            ConversationState::AppointmentBooked => "appointment_booked",
            ConversationState::RequestingChange => "requesting_change",
            ConversationState::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "collecting_specialty" => ConversationState::CollectingSpecialty,
            "showing_available_slots" => ConversationState::ShowingAvailableSlots,
            "confirming_appointment" => ConversationState::ConfirmingAppointment,
            "appointment_booked" => ConversationState::AppointmentBooked,
            "requesting_change" => ConversationState::RequestingChange,
            "completed" => ConversationState::Completed,
            _ => ConversationState::Initial,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStatus {
    Active,
    Completed,
    Paused,
    Canceled,
}

impl ConversationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationStatus::Active => "active",
            ConversationStatus::Completed => "completed",
            ConversationStatus::Paused => "paused",
            ConversationStatus::Canceled => "canceled",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "completed" => ConversationStatus::Completed,
            "paused" => ConversationStatus::Paused,
            "canceled" => ConversationStatus::Canceled,
            _ => ConversationStatus::Active,
        }
    }
}

/// One dialog session for a patient. The context column holds the serialized
/// working memory; `revision` guards whole-record replaces against lost races.
#[derive(Debug, Clone)]
pub struct Conversation {
    pub id: String,
    pub patient_id: String,
    pub status: ConversationStatus,
    pub current_state: ConversationState,
    pub context: String,
    pub revision: i64,
    pub started_at: NaiveDateTime,
    pub last_activity: NaiveDateTime,
    pub ended_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageDirection {
    Inbound,
    Outbound,
}

impl MessageDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageDirection::Inbound => "inbound",
            MessageDirection::Outbound => "outbound",
        }
    }
}
