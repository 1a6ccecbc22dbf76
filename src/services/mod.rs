pub mod agenda;
pub mod conversation;
pub mod dialog;
pub mod effects;
pub mod messaging;
pub mod nlp;
pub mod reminders;
