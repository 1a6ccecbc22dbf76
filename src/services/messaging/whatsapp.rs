use anyhow::Context;
use async_trait::async_trait;

use super::NotificationChannel;

pub struct WhatsAppChannel {
    token: String,
    phone_number_id: String,
    client: reqwest::Client,
}

impl WhatsAppChannel {
    pub fn new(token: String, phone_number_id: String) -> Self {
        Self {
            token,
            phone_number_id,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl NotificationChannel for WhatsAppChannel {
    async fn send(&self, to: &str, body: &str) -> anyhow::Result<()> {
        let url = format!(
            "https://graph.facebook.com/v18.0/{}/messages",
            self.phone_number_id
        );

        self.client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&serde_json::json!({
                "messaging_product": "whatsapp",
                "recipient_type": "individual",
                "to": to,
                "type": "text",
                "text": { "body": body },
            }))
            .send()
            .await
            .context("failed to send WhatsApp message")?
            .error_for_status()
            .context("WhatsApp API returned error")?;

        Ok(())
    }
}
