//! 46elks number provisioning and call callback payloads.

use serde::{Deserialize, Serialize};

use super::{ProviderError, send_json, trim_base};

const PROVIDER: &str = "46elks";

/// Number allocated at 46elks.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ElksNumber {
    pub id: String,
    pub number: String,
    #[serde(default)]
    pub active: Option<String>,
}

pub struct ElksClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Option<(String, String)>,
}

impl ElksClient {
    pub fn new(
        http: reqwest::Client,
        base_url: &str,
        user: Option<String>,
        password: Option<String>,
    ) -> Self {
        Self {
            http,
            base_url: trim_base(base_url),
            credentials: user.zip(password),
        }
    }

    fn credentials(&self) -> Result<(&str, &str), ProviderError> {
        self.credentials
            .as_ref()
            .map(|(user, password)| (user.as_str(), password.as_str()))
            .ok_or(ProviderError::NotConfigured(PROVIDER))
    }

    /// Allocates a new voice-capable number in `country` (ISO alpha-2).
    pub async fn allocate_number(&self, country: &str) -> Result<ElksNumber, ProviderError> {
        let (user, password) = self.credentials()?;

        let request = self
            .http
            .post(format!("{}/numbers", self.base_url))
            .basic_auth(user, Some(password))
            .form(&[
                ("country", country.to_lowercase().as_str()),
                ("capabilities", "voice"),
            ]);

        send_json(PROVIDER, request).await
    }

    /// Points the number's incoming calls at `voice_start`.
    pub async fn configure_number(
        &self,
        number_id: &str,
        voice_start: &str,
    ) -> Result<ElksNumber, ProviderError> {
        let (user, password) = self.credentials()?;

        let request = self
            .http
            .post(format!("{}/numbers/{}", self.base_url, number_id))
            .basic_auth(user, Some(password))
            .form(&[("voice_start", voice_start)]);

        send_json(PROVIDER, request).await
    }
}

/// Form posted to `voice_start` when a call comes in.
#[derive(Debug, Clone, Deserialize)]
pub struct ElksVoiceStart {
    pub callid: String,
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub direction: Option<String>,
}

/// Form posted to `whenhangup` after the call.
#[derive(Debug, Clone, Deserialize)]
pub struct ElksHangup {
    pub callid: String,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    /// Seconds
    #[serde(default)]
    pub duration: Option<i64>,
    /// In 1/10000 of the account currency
    #[serde(default)]
    pub cost: Option<i64>,
    #[serde(default)]
    pub state: Option<String>,
}

/// Call action answered to `voice_start`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ElksCallAction {
    Connect {
        connect: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        callerid: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        whenhangup: Option<String>,
    },
    Hangup {
        hangup: &'static str,
    },
}

impl ElksCallAction {
    pub fn reject() -> Self {
        Self::Hangup { hangup: "reject" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn call_actions_serialize_to_46elks_shape() {
        let connect = ElksCallAction::Connect {
            connect: "sip:+46101234567@sip.vapi.ai".into(),
            callerid: None,
            whenhangup: Some("https://api.example.se/api/webhooks/elks/hangup".into()),
        };
        assert_eq!(
            serde_json::to_value(&connect).unwrap(),
            json!({
                "connect": "sip:+46101234567@sip.vapi.ai",
                "whenhangup": "https://api.example.se/api/webhooks/elks/hangup"
            })
        );
        assert_eq!(
            serde_json::to_value(ElksCallAction::reject()).unwrap(),
            json!({ "hangup": "reject" })
        );
    }

    #[test]
    fn client_without_credentials_is_not_configured() {
        let client = ElksClient::new(reqwest::Client::new(), "http://localhost", Some("u".into()), None);
        assert!(matches!(
            client.credentials(),
            Err(ProviderError::NotConfigured("46elks"))
        ));
    }
}
