use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub agenda_provider: String,
    pub agenda_base_url: String,
    pub agenda_api_key: String,
    pub whatsapp_token: String,
    pub whatsapp_phone_id: String,
    pub whatsapp_app_secret: String,
    pub webhook_verify_token: String,
    pub effect_timeout_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "citabot.db".to_string()),
            agenda_provider: env::var("AGENDA_PROVIDER").unwrap_or_else(|_| "demo".to_string()),
            agenda_base_url: env::var("AGENDA_BASE_URL").unwrap_or_default(),
            agenda_api_key: env::var("AGENDA_API_KEY").unwrap_or_default(),
            whatsapp_token: env::var("WHATSAPP_TOKEN").unwrap_or_default(),
            whatsapp_phone_id: env::var("WHATSAPP_PHONE_ID").unwrap_or_default(),
            whatsapp_app_secret: env::var("WHATSAPP_APP_SECRET").unwrap_or_default(),
            webhook_verify_token: env::var("WEBHOOK_VERIFY_TOKEN")
                .unwrap_or_else(|_| "changeme".to_string()),
            effect_timeout_secs: env::var("EFFECT_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
        }
    }
}
