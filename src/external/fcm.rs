use crate::error::{AppError, AppResult};
use crate::models::PushOutcome;
use reqwest::Client;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct PushNotification {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PushData {
    pub subscription_id: Uuid,
}

/// One push message addressed to a single device token.
#[derive(Debug, Clone, Serialize)]
pub struct PushMessage {
    pub token: String,
    pub notification: PushNotification,
    pub data: PushData,
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    message: &'a PushMessage,
}

/// FCM HTTP v1 client. A non-2xx gateway response is a per-message outcome,
/// not an error; transport failures bubble up and abort the run.
#[derive(Clone)]
pub struct FcmClient {
    client: Client,
    endpoint: String,
}

impl FcmClient {
    pub fn new(project_id: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: format!("https://fcm.googleapis.com/v1/projects/{project_id}/messages:send"),
        }
    }

    pub async fn send(&self, access_token: &str, message: &PushMessage) -> AppResult<PushOutcome> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(access_token)
            .json(&SendRequest { message })
            .send()
            .await
            .map_err(|e| AppError::DispatchError(format!("Push gateway request failed: {e}")))?;

        if response.status().is_success() {
            Ok(PushOutcome::Delivered)
        } else {
            let error = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            log::error!("Push send rejected: {error}");
            Ok(PushOutcome::Rejected { error })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_send_request_wire_shape() {
        let subscription_id =
            Uuid::parse_str("4f5b8a36-9a49-4f4c-8b2f-0d9d4a1a2b3c").unwrap();
        let message = PushMessage {
            token: "device-token".to_string(),
            notification: PushNotification {
                title: "Subscription Reminder".to_string(),
                body: "Netflix is due in 3 days".to_string(),
            },
            data: PushData { subscription_id },
        };

        let value = serde_json::to_value(SendRequest { message: &message }).unwrap();
        assert_eq!(
            value,
            json!({
                "message": {
                    "token": "device-token",
                    "notification": {
                        "title": "Subscription Reminder",
                        "body": "Netflix is due in 3 days"
                    },
                    "data": {
                        "subscription_id": "4f5b8a36-9a49-4f4c-8b2f-0d9d4a1a2b3c"
                    }
                }
            })
        );
    }
}
