pub mod appointment;
pub mod context;
pub mod conversation;
pub mod intent;
pub mod patient;

pub use appointment::{Appointment, AppointmentStatus, Reminder, ReminderKind};
pub use context::{ConversationContext, ContextError, Slot, CONTEXT_VERSION, MAX_SLOTS};
pub use conversation::{Conversation, ConversationState, ConversationStatus, MessageDirection};
pub use intent::{Analysis, ExtractedEntities, Intent};
pub use patient::Patient;
