use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use citabot::config::AppConfig;
use citabot::db;
use citabot::handlers;
use citabot::services::agenda::demo::DemoAgendaProvider;
use citabot::services::agenda::http::HttpAgendaProvider;
use citabot::services::agenda::AgendaProvider;
use citabot::services::messaging::whatsapp::WhatsAppChannel;
use citabot::services::nlp::{EntityExtractor, IntentClassifier};
use citabot::services::reminders::{self, DbReminderScheduler};
use citabot::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;
    let db = Arc::new(Mutex::new(conn));

    let agenda: Box<dyn AgendaProvider> = match config.agenda_provider.as_str() {
        "http" => {
            anyhow::ensure!(
                !config.agenda_base_url.is_empty(),
                "AGENDA_BASE_URL must be set when AGENDA_PROVIDER=http"
            );
            tracing::info!("using HTTP agenda provider (url: {})", config.agenda_base_url);
            Box::new(HttpAgendaProvider::new(
                config.agenda_base_url.clone(),
                config.agenda_api_key.clone(),
            ))
        }
        _ => {
            tracing::info!("using demo agenda provider");
            Box::new(DemoAgendaProvider)
        }
    };

    let notifier = WhatsAppChannel::new(
        config.whatsapp_token.clone(),
        config.whatsapp_phone_id.clone(),
    );

    let state = Arc::new(AppState {
        db: db.clone(),
        config: config.clone(),
        agenda,
        notifier: Box::new(notifier),
        scheduler: Box::new(DbReminderScheduler::new(db)),
        classifier: IntentClassifier::default(),
        extractor: EntityExtractor::default(),
        turn_locks: Mutex::new(HashMap::new()),
    });

    tokio::spawn(reminders::run_reminder_loop(state.clone()));

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route(
            "/webhook/whatsapp",
            get(handlers::webhook::verify_webhook).post(handlers::webhook::receive_message),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
