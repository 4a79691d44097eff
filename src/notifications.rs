//! Customer notifications for completed calls.
//!
//! Delivery is best effort: every channel is gated by the customer's own
//! settings, failures are logged and counted, and nothing is propagated to
//! the webhook that triggered the fan-out.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::integrations::MessageChannel;
use crate::models::business::Model as Business;
use crate::models::customer::Model as Customer;
use crate::models::customer_call::Model as CustomerCall;
use crate::phone::format_swedish_number;

/// Channels available for fan-out.
#[derive(Clone)]
pub struct NotificationChannels {
    pub whatsapp: Arc<dyn MessageChannel>,
    pub telegram: Arc<dyn MessageChannel>,
}

/// Which channels delivered the notification for a call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotificationReport {
    pub whatsapp_sent: bool,
    pub telegram_sent: bool,
}

impl NotificationReport {
    pub fn any(&self) -> bool {
        self.whatsapp_sent || self.telegram_sent
    }
}

/// Swedish summary of a call, sent to the business owner.
pub fn call_notification_text(business: &Business, call: &CustomerCall) -> String {
    let caller = call
        .caller_number
        .as_deref()
        .map(format_swedish_number)
        .unwrap_or_else(|| "okänt nummer".to_string());
    let caller = match call.caller_name.as_deref() {
        Some(name) if !name.is_empty() => format!("{} ({})", name, caller),
        _ => caller,
    };

    let mut text = format!(
        "Nytt samtal till {}\nFrån: {}\nLängd: {}\n",
        business.display_name(),
        caller,
        format_duration(call.duration_seconds)
    );

    if let Some(summary) = call.summary.as_deref().filter(|s| !s.trim().is_empty()) {
        text.push_str(&format!("\nSammanfattning:\n{}\n", summary.trim()));
    }

    let action_items: Vec<String> =
        serde_json::from_value(call.action_items.clone()).unwrap_or_default();
    if !action_items.is_empty() {
        text.push_str("\nAtt göra:\n");
        for item in action_items {
            text.push_str(&format!("- {}\n", item));
        }
    }

    text.trim_end().to_string()
}

fn format_duration(seconds: i32) -> String {
    let seconds = seconds.max(0);
    match (seconds / 60, seconds % 60) {
        (0, s) => format!("{} s", s),
        (m, 0) => format!("{} min", m),
        (m, s) => format!("{} min {} s", m, s),
    }
}

/// Sends `text` to every enabled channel that has a destination and has not
/// already been used for this call.
pub async fn fan_out(
    customer: &Customer,
    call: &CustomerCall,
    text: &str,
    channels: &NotificationChannels,
) -> NotificationReport {
    let whatsapp = async {
        match customer.whatsapp_number.as_deref() {
            Some(number) if customer.whatsapp_enabled && !call.whatsapp_sent => {
                deliver(channels.whatsapp.as_ref(), number, text, call).await
            }
            _ => false,
        }
    };
    let telegram = async {
        match customer.telegram_chat_id.as_deref() {
            Some(chat_id) if customer.telegram_enabled && !call.telegram_sent => {
                deliver(channels.telegram.as_ref(), chat_id, text, call).await
            }
            _ => false,
        }
    };

    let (whatsapp_sent, telegram_sent) = futures::join!(whatsapp, telegram);
    NotificationReport {
        whatsapp_sent,
        telegram_sent,
    }
}

async fn deliver(
    channel: &dyn MessageChannel,
    recipient: &str,
    text: &str,
    call: &CustomerCall,
) -> bool {
    if recipient.trim().is_empty() {
        return false;
    }

    match channel.send_text(recipient, text).await {
        Ok(()) => {
            debug!(channel = channel.name(), call_id = %call.id, "Call notification sent");
            metrics::counter!("notifications_total", "channel" => channel.name(), "outcome" => "sent")
                .increment(1);
            true
        }
        Err(err) => {
            warn!(channel = channel.name(), call_id = %call.id, error = %err, "Call notification failed");
            metrics::counter!("notifications_total", "channel" => channel.name(), "outcome" => "failed")
                .increment(1);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrations::ProviderError;
    use crate::models::business::BusinessStatus;
    use async_trait::async_trait;
    use chrono::Utc;
    use serde_json::json;
    use std::sync::Mutex;
    use uuid::Uuid;

    #[derive(Default)]
    struct RecordingChannel {
        fail: bool,
        sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl MessageChannel for RecordingChannel {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn send_text(&self, recipient: &str, text: &str) -> Result<(), ProviderError> {
            if self.fail {
                return Err(ProviderError::NotConfigured("recording"));
            }
            self.sent
                .lock()
                .unwrap()
                .push((recipient.to_string(), text.to_string()));
            Ok(())
        }
    }

    fn business() -> Business {
        let now = Utc::now().into();
        Business {
            id: Uuid::new_v4(),
            name: Some("Salong Lisa".into()),
            slug: Some("salong-lisa".into()),
            website_url: "https://salonglisa.se".into(),
            industry: None,
            description: None,
            address: None,
            phone: None,
            email: None,
            services: None,
            opening_hours: None,
            scraped_markdown: None,
            status: BusinessStatus::Customer,
            vapi_assistant_id: Some("asst_1".into()),
            voice_id: None,
            customer_id: Some(Uuid::new_v4()),
            error_message: None,
            email_sent_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn customer(whatsapp: bool, telegram: bool) -> Customer {
        let now = Utc::now().into();
        Customer {
            id: Uuid::new_v4(),
            auth_user_id: None,
            email: "lisa@salonglisa.se".into(),
            name: None,
            phone: None,
            whatsapp_enabled: whatsapp,
            whatsapp_number: Some("+46701234567".into()),
            telegram_enabled: telegram,
            telegram_chat_id: Some("123456".into()),
            created_at: now,
            updated_at: now,
        }
    }

    fn call() -> CustomerCall {
        let now = Utc::now().into();
        CustomerCall {
            id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            business_id: Uuid::new_v4(),
            vapi_call_id: "call_1".into(),
            caller_number: Some("+46701234567".into()),
            caller_name: None,
            started_at: None,
            ended_at: None,
            duration_seconds: 125,
            transcript: json!([]),
            summary: Some("Vill boka klippning på fredag.".into()),
            sentiment: None,
            action_items: json!(["Ring tillbaka"]),
            recording_url: None,
            ended_reason: None,
            cost: 0.0,
            whatsapp_sent: false,
            telegram_sent: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn notification_text_is_swedish_summary() {
        let text = call_notification_text(&business(), &call());
        assert!(text.starts_with("Nytt samtal till Salong Lisa"));
        assert!(text.contains("Från: 070-123 45 67"));
        assert!(text.contains("Längd: 2 min 5 s"));
        assert!(text.contains("Vill boka klippning på fredag."));
        assert!(text.contains("- Ring tillbaka"));
    }

    #[test]
    fn durations_are_human_readable() {
        assert_eq!(format_duration(42), "42 s");
        assert_eq!(format_duration(120), "2 min");
        assert_eq!(format_duration(-3), "0 s");
    }

    #[tokio::test]
    async fn fan_out_respects_customer_flags() {
        let whatsapp = Arc::new(RecordingChannel::default());
        let telegram = Arc::new(RecordingChannel::default());
        let channels = NotificationChannels {
            whatsapp: whatsapp.clone(),
            telegram: telegram.clone(),
        };

        let report = fan_out(&customer(true, false), &call(), "hej", &channels).await;

        assert_eq!(
            report,
            NotificationReport {
                whatsapp_sent: true,
                telegram_sent: false
            }
        );
        assert_eq!(whatsapp.sent.lock().unwrap()[0].0, "+46701234567");
        assert!(telegram.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn fan_out_skips_channels_already_sent_and_swallows_failures() {
        let channels = NotificationChannels {
            whatsapp: Arc::new(RecordingChannel::default()),
            telegram: Arc::new(RecordingChannel {
                fail: true,
                ..Default::default()
            }),
        };
        let mut already_sent = call();
        already_sent.whatsapp_sent = true;

        let report = fan_out(&customer(true, true), &already_sent, "hej", &channels).await;

        assert!(!report.any());
    }
}
