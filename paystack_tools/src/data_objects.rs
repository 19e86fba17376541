use chrono::{DateTime, Utc};
use oja_common::Kobo;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const CHARGE_SUCCESS: &str = "charge.success";
pub const CHARGE_FAILED: &str = "charge.failed";

/// Request body for `POST /transaction/initialize`.
///
/// Paystack takes the amount in kobo. The reference is ours, not theirs; it is what the webhook
/// echoes back and what the reconciler matches orders on, so it must be unique per attempt.
#[derive(Debug, Clone, Serialize)]
pub struct NewTransaction {
    pub amount: Kobo,
    pub email: String,
    pub reference: String,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl NewTransaction {
    pub fn new(amount: Kobo, email: String, reference: String) -> Self {
        Self {
            amount,
            email,
            reference,
            currency: oja_common::NAIRA_CURRENCY_CODE.to_string(),
            callback_url: None,
            metadata: None,
        }
    }
}

/// The `data` object returned by a successful `transaction/initialize` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionAuthorization {
    pub authorization_url: String,
    pub access_code: String,
    pub reference: String,
}

/// The transaction object Paystack attaches to charge webhooks and `transaction/verify`
/// responses. Only the fields the reconciler cares about are kept; everything else is ignored
/// on deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeData {
    #[serde(default)]
    pub id: Option<i64>,
    pub status: String,
    pub reference: String,
    pub amount: Kobo,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub gateway_response: Option<String>,
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub channel: Option<String>,
    // Paystack sends "" when no metadata was attached, so this stays a raw Value.
    #[serde(default)]
    pub metadata: Option<Value>,
    #[serde(default)]
    pub customer: Option<ChargeCustomer>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeCustomer {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

/// Envelope of every webhook delivery: an event discriminator plus the charge payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
    pub event: String,
    pub data: ChargeData,
}

impl WebhookEvent {
    pub fn is_charge_success(&self) -> bool {
        self.event == CHARGE_SUCCESS
    }

    pub fn is_charge_failure(&self) -> bool {
        self.event == CHARGE_FAILED
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn deserialize_charge_success_event() {
        let json = include_str!("./test_assets/charge_success.json");
        let event: WebhookEvent = serde_json::from_str(json).unwrap();
        assert!(event.is_charge_success());
        assert_eq!(event.data.reference, "OJA-20240614-7G2K4A-9f3ab2c1");
        assert_eq!(event.data.amount, Kobo::from(914_000));
        assert_eq!(event.data.status, "success");
        let customer = event.data.customer.unwrap();
        assert_eq!(customer.phone.as_deref(), Some("+2348012345678"));
    }

    #[test]
    fn empty_metadata_string_is_tolerated() {
        let json = r#"{
            "event": "charge.failed",
            "data": { "status": "failed", "reference": "OJA-X-00", "amount": 5000, "metadata": "" }
        }"#;
        let event: WebhookEvent = serde_json::from_str(json).unwrap();
        assert!(event.is_charge_failure());
        assert_eq!(event.data.amount, Kobo::from(5_000));
    }
}
