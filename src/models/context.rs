use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Bump when the serialized shape changes; older blobs are rejected as
/// [`ContextError::Version`] instead of being misread.
pub const CONTEXT_VERSION: u32 = 1;

/// Upper bound on slots cached and offered per conversation turn.
pub const MAX_SLOTS: usize = 5;

/// One bookable appointment opportunity as surfaced to the patient.
/// The list order is frozen once cached, so "respond with number N"
/// stays stable for the lifetime of the context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    pub id: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub doctor_id: String,
    pub doctor_name: String,
    pub specialty_id: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error("malformed context: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("unsupported context version {0}")]
    Version(u32),
}

/// Per-conversation working memory. Serialized wholesale into the
/// conversation record on every turn; there is no other session store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationContext {
    pub version: u32,
    pub selected_specialty: Option<String>,
    pub available_slots: Vec<Slot>,
    pub selected_slot_id: Option<String>,
    pub pending_appointment_id: Option<String>,
}

impl Default for ConversationContext {
    fn default() -> Self {
        Self {
            version: CONTEXT_VERSION,
            selected_specialty: None,
            available_slots: Vec::new(),
            selected_slot_id: None,
            pending_appointment_id: None,
        }
    }
}

impl ConversationContext {
    pub fn from_json(raw: &str) -> Result<Self, ContextError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == "{}" {
            return Ok(Self::default());
        }
        let context: Self = serde_json::from_str(trimmed)?;
        if context.version != CONTEXT_VERSION {
            return Err(ContextError::Version(context.version));
        }
        Ok(context)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Resolve a 1-based menu selection against the cached slot list.
    pub fn slot_by_index(&self, selection: usize) -> Option<&Slot> {
        if selection == 0 {
            return None;
        }
        self.available_slots.get(selection - 1)
    }

    pub fn selected_slot(&self) -> Option<&Slot> {
        let id = self.selected_slot_id.as_deref()?;
        self.available_slots.iter().find(|s| s.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(n: usize) -> Slot {
        Slot {
            id: format!("slot_{n}"),
            date: NaiveDate::from_ymd_opt(2025, 9, 15).unwrap(),
            time: NaiveTime::from_hms_opt(9 + n as u32, 0, 0).unwrap(),
            doctor_id: format!("doc_{n}"),
            doctor_name: format!("Dra. Pérez {n}"),
            specialty_id: "cardiology".to_string(),
        }
    }

    #[test]
    fn test_empty_blob_is_default() {
        let ctx = ConversationContext::from_json("{}").unwrap();
        assert_eq!(ctx, ConversationContext::default());
        let ctx = ConversationContext::from_json("  ").unwrap();
        assert_eq!(ctx, ConversationContext::default());
    }

    #[test]
    fn test_round_trip_preserves_selection_resolution() {
        for n in 0..=MAX_SLOTS {
            let ctx = ConversationContext {
                available_slots: (1..=n).map(slot).collect(),
                selected_specialty: Some("cardiology".to_string()),
                ..Default::default()
            };
            let restored = ConversationContext::from_json(&ctx.to_json()).unwrap();
            for selection in 0..=n + 1 {
                assert_eq!(
                    ctx.slot_by_index(selection).map(|s| &s.id),
                    restored.slot_by_index(selection).map(|s| &s.id),
                );
            }
        }
    }

    #[test]
    fn test_malformed_blob_is_rejected() {
        assert!(matches!(
            ConversationContext::from_json("not json"),
            Err(ContextError::Malformed(_))
        ));
        // Shape mismatch (missing version field) is malformed, not silently defaulted
        assert!(matches!(
            ConversationContext::from_json(r#"{"selected_specialty":"cardiology"}"#),
            Err(ContextError::Malformed(_))
        ));
    }

    #[test]
    fn test_stale_version_is_rejected() {
        let blob = r#"{"version":99,"selected_specialty":null,"available_slots":[],"selected_slot_id":null,"pending_appointment_id":null}"#;
        assert!(matches!(
            ConversationContext::from_json(blob),
            Err(ContextError::Version(99))
        ));
    }

    #[test]
    fn test_selection_bounds() {
        let ctx = ConversationContext {
            available_slots: (1..=3).map(slot).collect(),
            ..Default::default()
        };
        assert!(ctx.slot_by_index(0).is_none());
        assert_eq!(ctx.slot_by_index(1).unwrap().id, "slot_1");
        assert_eq!(ctx.slot_by_index(3).unwrap().id, "slot_3");
        assert!(ctx.slot_by_index(4).is_none());
    }

    #[test]
    fn test_selected_slot_must_reference_cached_entry() {
        let mut ctx = ConversationContext {
            available_slots: (1..=2).map(slot).collect(),
            ..Default::default()
        };
        ctx.selected_slot_id = Some("slot_2".to_string());
        assert_eq!(ctx.selected_slot().unwrap().id, "slot_2");

        ctx.selected_slot_id = Some("slot_99".to_string());
        assert!(ctx.selected_slot().is_none());
    }
}
