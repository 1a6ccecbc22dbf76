use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Created on first contact; the phone number is the external identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: String,
    pub phone: String,
    pub name: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
