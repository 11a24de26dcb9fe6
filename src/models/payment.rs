use serde::{Deserialize, Serialize};

/// Raw card details collected by the UI and handed to the payment gateway.
/// Never sent to the contest API; only the resulting payment method id is.
#[derive(Debug, Clone, Serialize)]
pub struct CardDetails {
    pub number: String,
    pub exp_month: u32,
    pub exp_year: u32,
    pub cvc: String,
}

/// Outcome of charging the entry fee for a persisted entry.
#[derive(Debug, Clone, Deserialize)]
pub struct ChargeOutcome {
    pub success: bool,
    #[serde(default)]
    pub requires_action: bool,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChargeRequest {
    pub entry_id: i64,
    pub payment_method_id: String,
    pub amount_cents: i64,
    /// Client-generated key so a retried request cannot double-charge.
    pub idempotency_key: String,
}

/// Result of the 3-D-Secure confirmation round-trip.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfirmation {
    pub status: PaymentIntentStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentIntentStatus {
    Succeeded,
    Processing,
    RequiresPaymentMethod,
    RequiresAction,
    Canceled,
}

impl PaymentConfirmation {
    pub fn succeeded(&self) -> bool {
        self.status == PaymentIntentStatus::Succeeded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn charge_outcome_defaults_optional_fields() {
        let outcome: ChargeOutcome = serde_json::from_str(r#"{"success":true}"#).unwrap();
        assert!(outcome.success);
        assert!(!outcome.requires_action);
        assert!(outcome.client_secret.is_none());
    }

    #[test]
    fn confirmation_status_parses_stripe_names() {
        let c: PaymentConfirmation =
            serde_json::from_str(r#"{"status":"requires_payment_method"}"#).unwrap();
        assert!(!c.succeeded());
    }
}
