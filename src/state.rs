use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::config::AppConfig;
use crate::services::agenda::AgendaProvider;
use crate::services::messaging::NotificationChannel;
use crate::services::nlp::{EntityExtractor, IntentClassifier};
use crate::services::reminders::ReminderScheduler;

pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: AppConfig,
    pub agenda: Box<dyn AgendaProvider>,
    pub notifier: Box<dyn NotificationChannel>,
    pub scheduler: Box<dyn ReminderScheduler>,
    pub classifier: IntentClassifier,
    pub extractor: EntityExtractor,
    /// Per-patient turn locks: concurrent messages for the same patient are
    /// serialized here so two turns never read the same pre-transition state.
    pub turn_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}
