//! Trigger adapters: turning inbound events into seed contexts.
//!
//! Each webhook provider delivers its own body shape; the adapter extracts a
//! normalized payload and keys it by provider name in the seed context, so
//! downstream templates read `{{stripe.eventType}}` or
//! `{{googleForm.respondentEmail}}` regardless of the raw wire format.

use crate::context::ExecutionContext;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue, json};

/// A normalized Stripe webhook event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StripeEvent {
    /// The Stripe event ID (`id`).
    pub event_id: Option<String>,
    /// The event type (`type`), e.g. `invoice.paid`.
    pub event_type: Option<String>,
    /// Unix timestamp of the event (`created`).
    pub timestamp: Option<i64>,
    /// Whether the event came from live mode.
    pub livemode: Option<bool>,
    /// The event's primary object (`data.object`).
    pub raw: Option<JsonValue>,
}

impl StripeEvent {
    /// Extracts the normalized fields from a raw webhook body.
    #[must_use]
    pub fn from_webhook(body: &JsonValue) -> Self {
        Self {
            event_id: body.get("id").and_then(JsonValue::as_str).map(str::to_string),
            event_type: body
                .get("type")
                .and_then(JsonValue::as_str)
                .map(str::to_string),
            timestamp: body.get("created").and_then(JsonValue::as_i64),
            livemode: body.get("livemode").and_then(JsonValue::as_bool),
            raw: body.pointer("/data/object").cloned(),
        }
    }
}

/// A normalized Google Form response event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleFormEvent {
    /// The form's identifier.
    pub form_id: Option<String>,
    /// The form's title.
    pub form_title: Option<String>,
    /// The identifier of this response.
    pub response_id: Option<String>,
    /// Submission timestamp, as delivered by the form hook.
    pub timestamp: Option<JsonValue>,
    /// The respondent's email, when collected.
    pub respondent_email: Option<String>,
    /// Question/answer pairs.
    pub responses: Option<JsonValue>,
    /// The full webhook body.
    pub raw: JsonValue,
}

impl GoogleFormEvent {
    /// Extracts the normalized fields from a raw webhook body.
    #[must_use]
    pub fn from_webhook(body: &JsonValue) -> Self {
        let string_field = |name: &str| {
            body.get(name)
                .and_then(JsonValue::as_str)
                .map(str::to_string)
        };
        Self {
            form_id: string_field("formId"),
            form_title: string_field("formTitle"),
            response_id: string_field("responseId"),
            timestamp: body.get("timestamp").cloned(),
            respondent_email: string_field("respondentEmail"),
            responses: body.get("responses").cloned(),
            raw: body.clone(),
        }
    }
}

/// An inbound event that starts a workflow run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TriggerEvent {
    /// A user clicked "execute" in the editor.
    Manual {
        /// Optional initial data supplied with the invocation.
        data: Option<JsonValue>,
    },
    /// A Stripe webhook fired.
    Stripe(StripeEvent),
    /// A Google Form response arrived.
    GoogleForm(GoogleFormEvent),
}

impl TriggerEvent {
    /// The provider name, also the seed-context key for webhook events.
    #[must_use]
    pub fn provider(&self) -> &'static str {
        match self {
            Self::Manual { .. } => "manual",
            Self::Stripe(_) => "stripe",
            Self::GoogleForm(_) => "googleForm",
        }
    }

    /// Builds the initial execution context for a run.
    #[must_use]
    pub fn seed_context(&self) -> ExecutionContext {
        match self {
            Self::Manual { data } => match data {
                Some(JsonValue::Object(fields)) => ExecutionContext::from_object(fields.clone()),
                Some(other) => {
                    let mut fields = Map::new();
                    fields.insert("payload".to_string(), other.clone());
                    ExecutionContext::from_object(fields)
                }
                None => ExecutionContext::new(),
            },
            Self::Stripe(event) => {
                ExecutionContext::new().with_value("stripe", json!(event))
            }
            Self::GoogleForm(event) => {
                ExecutionContext::new().with_value("googleForm", json!(event))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stripe_webhook_normalization() {
        let body = json!({
            "id": "evt_123",
            "type": "invoice.paid",
            "created": 1_700_000_000,
            "livemode": false,
            "data": {"object": {"id": "in_456", "amount_due": 4200}}
        });

        let event = StripeEvent::from_webhook(&body);
        assert_eq!(event.event_id.as_deref(), Some("evt_123"));
        assert_eq!(event.event_type.as_deref(), Some("invoice.paid"));
        assert_eq!(event.timestamp, Some(1_700_000_000));
        assert_eq!(event.livemode, Some(false));
        assert_eq!(event.raw, Some(json!({"id": "in_456", "amount_due": 4200})));
    }

    #[test]
    fn stripe_seed_context_is_keyed_by_provider() {
        let body = json!({"id": "evt_1", "type": "charge.succeeded"});
        let trigger = TriggerEvent::Stripe(StripeEvent::from_webhook(&body));

        let seed = trigger.seed_context();
        assert_eq!(seed.lookup("stripe.eventId"), Some(&json!("evt_1")));
        assert_eq!(
            seed.lookup("stripe.eventType"),
            Some(&json!("charge.succeeded"))
        );
    }

    #[test]
    fn google_form_webhook_normalization() {
        let body = json!({
            "formId": "form_1",
            "formTitle": "Signup",
            "responseId": "resp_9",
            "timestamp": "2026-08-06T12:00:00Z",
            "respondentEmail": "person@example.com",
            "responses": {"How did you hear about us?": "A friend"}
        });

        let event = GoogleFormEvent::from_webhook(&body);
        assert_eq!(event.form_id.as_deref(), Some("form_1"));
        assert_eq!(event.respondent_email.as_deref(), Some("person@example.com"));
        assert_eq!(event.raw, body);

        let seed = TriggerEvent::GoogleForm(event).seed_context();
        assert_eq!(seed.lookup("googleForm.formTitle"), Some(&json!("Signup")));
        assert_eq!(
            seed.lookup("googleForm.respondentEmail"),
            Some(&json!("person@example.com"))
        );
    }

    #[test]
    fn manual_trigger_seeds_from_object_data() {
        let trigger = TriggerEvent::Manual {
            data: Some(json!({"customer": "cus_1"})),
        };
        let seed = trigger.seed_context();
        assert_eq!(seed.get("customer"), Some(&json!("cus_1")));

        let empty = TriggerEvent::Manual { data: None }.seed_context();
        assert!(empty.is_empty());
    }

    #[test]
    fn manual_trigger_wraps_non_object_data() {
        let trigger = TriggerEvent::Manual {
            data: Some(json!([1, 2, 3])),
        };
        let seed = trigger.seed_context();
        assert_eq!(seed.get("payload"), Some(&json!([1, 2, 3])));
    }

    #[test]
    fn provider_names() {
        assert_eq!(TriggerEvent::Manual { data: None }.provider(), "manual");
        let stripe = TriggerEvent::Stripe(StripeEvent::from_webhook(&json!({})));
        assert_eq!(stripe.provider(), "stripe");
        let form = TriggerEvent::GoogleForm(GoogleFormEvent::from_webhook(&json!({})));
        assert_eq!(form.provider(), "googleForm");
    }
}
