use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Greeting,
    BookAppointment,
    Cancel,
    Confirm,
    Change,
    Help,
    Unknown,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Greeting => "greeting",
            Intent::BookAppointment => "book_appointment",
            Intent::Cancel => "cancel",
            Intent::Confirm => "confirm",
            Intent::Change => "change",
            Intent::Help => "help",
            Intent::Unknown => "unknown",
        }
    }
}

/// Structured facts pulled out of a single message. A `None` means the
/// extraction pass found nothing, which is a normal outcome.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedEntities {
    pub specialty: Option<String>,
    pub number: Option<String>,
    pub time: Option<String>,
    pub date: Option<String>,
}

impl ExtractedEntities {
    /// The first digit run as a menu selection, when it parses.
    pub fn numeric_selection(&self) -> Option<usize> {
        self.number.as_deref().and_then(|n| n.parse().ok())
    }
}

/// Classifier + extractor output for one inbound message.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub intent: Intent,
    pub entities: ExtractedEntities,
}
