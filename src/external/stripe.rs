use reqwest::Client;
use serde::Deserialize;

use crate::config::StripeConfig;
use crate::error::{AppError, AppResult};
use crate::models::{CardDetails, PaymentConfirmation, PaymentIntentStatus};

const STRIPE_API_BASE: &str = "https://api.stripe.com";

/// Card-collection side of the payment SDK: turns raw card details into a
/// payment method id and performs the 3-D-Secure confirmation round-trip.
pub trait PaymentGateway {
    fn create_payment_method(
        &self,
        card: &CardDetails,
    ) -> impl Future<Output = AppResult<String>> + Send;
    fn confirm_card_payment(
        &self,
        client_secret: &str,
    ) -> impl Future<Output = AppResult<PaymentConfirmation>> + Send;
}

#[derive(Debug, Deserialize)]
struct PaymentMethod {
    id: String,
}

#[derive(Debug, Deserialize)]
struct PaymentIntent {
    status: PaymentIntentStatus,
}

#[derive(Clone)]
pub struct StripeGateway {
    client: Client,
    config: StripeConfig,
}

impl StripeGateway {
    pub fn new(config: StripeConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn base_url(&self) -> &str {
        self.config.api_base_url.as_deref().unwrap_or(STRIPE_API_BASE)
    }

    /// The intent id is the prefix of the client secret
    /// (`pi_xxx_secret_yyy`), which is all the confirm endpoint needs.
    fn intent_id_from_secret(client_secret: &str) -> AppResult<&str> {
        client_secret
            .split_once("_secret_")
            .map(|(id, _)| id)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AppError::PaymentError("malformed client secret".to_string()))
    }
}

impl PaymentGateway for StripeGateway {
    async fn create_payment_method(&self, card: &CardDetails) -> AppResult<String> {
        let url = format!("{}/v1/payment_methods", self.base_url());

        let params = [
            ("type", "card".to_string()),
            ("card[number]", card.number.clone()),
            ("card[exp_month]", card.exp_month.to_string()),
            ("card[exp_year]", card.exp_year.to_string()),
            ("card[cvc]", card.cvc.clone()),
        ];

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.publishable_key)
            .form(&params)
            .send()
            .await?;

        if response.status().is_success() {
            let method: PaymentMethod = response.json().await?;
            Ok(method.id)
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            Err(AppError::PaymentError(format!(
                "payment method creation failed: {error_text}"
            )))
        }
    }

    async fn confirm_card_payment(&self, client_secret: &str) -> AppResult<PaymentConfirmation> {
        let intent_id = Self::intent_id_from_secret(client_secret)?;
        let url = format!("{}/v1/payment_intents/{intent_id}/confirm", self.base_url());

        let params = [("client_secret", client_secret.to_string())];

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.publishable_key)
            .form(&params)
            .send()
            .await?;

        if response.status().is_success() {
            let intent: PaymentIntent = response.json().await?;
            Ok(PaymentConfirmation {
                status: intent.status,
            })
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            Err(AppError::PaymentError(format!(
                "card payment confirmation failed: {error_text}"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_creation() {
        let config = StripeConfig {
            publishable_key: "pk_test_123".to_string(),
            api_base_url: None,
        };
        let gateway = StripeGateway::new(config);
        assert_eq!(gateway.base_url(), STRIPE_API_BASE);
    }

    #[test]
    fn extracts_intent_id_from_client_secret() {
        let id = StripeGateway::intent_id_from_secret("pi_abc123_secret_xyz").unwrap();
        assert_eq!(id, "pi_abc123");

        assert!(StripeGateway::intent_id_from_secret("garbage").is_err());
        assert!(StripeGateway::intent_id_from_secret("_secret_xyz").is_err());
    }
}
