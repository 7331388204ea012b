//! The payment result screen.
//!
//! The widget redirects to `/payment/success?paymentKey=..&orderId=..&amount=..`
//! or `/payment/fail?code=..&message=..&orderId=..`. A success redirect is
//! not trusted on its own: it must match the hand-off written at checkout
//! and is confirmed with the backend before the cart is cleared.

use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::Decimal;
use tableside_client::{ApiClient, KeyValueStore};
use tableside_core::{OrderId, Payment, PaymentConfirmRequest};
use tracing::{error, info, instrument, warn};
use url::Url;

use super::checkout::{FAIL_PATH, SUCCESS_PATH};
use crate::error::PaymentError;
use crate::transient::{self, PaymentHandoff};

/// A parsed widget redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentCallback {
    Success {
        payment_key: String,
        payment_order_key: String,
        amount: Decimal,
    },
    Failure {
        code: String,
        message: String,
        payment_order_key: Option<String>,
    },
}

impl PaymentCallback {
    /// Parse a redirect URL by its path and query.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is not a payment callback or a required
    /// parameter is missing or malformed.
    pub fn parse(url: &Url) -> Result<Self, PaymentError> {
        let param = |name: &str| {
            url.query_pairs()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        match url.path().trim_end_matches('/') {
            SUCCESS_PATH => {
                let payment_key = param("paymentKey").ok_or(PaymentError::MissingParam("paymentKey"))?;
                let payment_order_key = param("orderId").ok_or(PaymentError::MissingParam("orderId"))?;
                let raw_amount = param("amount").ok_or(PaymentError::MissingParam("amount"))?;
                let amount = Decimal::from_str(&raw_amount)
                    .map_err(|_| PaymentError::InvalidAmount(raw_amount.clone()))?;
                if amount.is_sign_negative() || amount.is_zero() {
                    return Err(PaymentError::InvalidAmount(raw_amount));
                }
                Ok(Self::Success {
                    payment_key,
                    payment_order_key,
                    amount,
                })
            }
            FAIL_PATH => Ok(Self::Failure {
                code: param("code").unwrap_or_else(|| "UNKNOWN_ERROR".to_string()),
                message: param("message").unwrap_or_else(|| "The payment was not completed.".to_string()),
                payment_order_key: param("orderId"),
            }),
            other => Err(PaymentError::UnknownCallback(other.to_string())),
        }
    }
}

/// A payment the backend has confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmedPayment {
    pub order_id: OrderId,
    pub order_number: String,
    pub payment: Payment,
}

/// Controller for the payment result screen.
#[derive(Debug)]
pub struct PaymentResultPage {
    api: ApiClient,
    transient: Arc<dyn KeyValueStore>,
    pub confirmed: Option<ConfirmedPayment>,
    pub processing: bool,
    pub error: Option<String>,
}

impl PaymentResultPage {
    #[must_use]
    pub fn new(api: ApiClient, transient: Arc<dyn KeyValueStore>) -> Self {
        Self {
            api,
            transient,
            confirmed: None,
            processing: false,
            error: None,
        }
    }

    /// Handle the redirect URL the widget sent the customer to.
    pub async fn handle_redirect(&mut self, url: &Url) -> Option<ConfirmedPayment> {
        match PaymentCallback::parse(url) {
            Ok(callback) => self.reconcile(callback).await,
            Err(e) => {
                warn!(error = %e, "Unreadable payment callback");
                self.error = Some(e.user_message());
                None
            }
        }
    }

    /// Reconcile a callback with the pending hand-off and the backend.
    ///
    /// On success the cart and hand-off are cleared. On a declined payment
    /// the hand-off is dropped but the cart is kept for another attempt.
    #[instrument(skip(self, callback))]
    pub async fn reconcile(&mut self, callback: PaymentCallback) -> Option<ConfirmedPayment> {
        if self.processing || self.confirmed.is_some() {
            return self.confirmed.clone();
        }
        self.processing = true;
        self.error = None;
        let result = self.try_reconcile(callback).await;
        self.processing = false;
        match result {
            Ok(confirmed) => {
                self.confirmed = Some(confirmed.clone());
                Some(confirmed)
            }
            Err(e) => {
                self.error = Some(e.user_message());
                None
            }
        }
    }

    async fn try_reconcile(&self, callback: PaymentCallback) -> Result<ConfirmedPayment, PaymentError> {
        let store = self.transient.as_ref();
        let (payment_key, payment_order_key, amount) = match callback {
            PaymentCallback::Success {
                payment_key,
                payment_order_key,
                amount,
            } => (payment_key, payment_order_key, amount),
            PaymentCallback::Failure {
                code,
                message,
                payment_order_key,
            } => {
                warn!(%code, %message, ?payment_order_key, "Payment declined");
                if let Err(e) = transient::clear_handoff(store) {
                    warn!(error = %e, "Failed to clear payment hand-off");
                }
                return Err(PaymentError::Declined { code, message });
            }
        };

        let handoff = transient::load_handoff(store)?.ok_or(PaymentError::NoHandoff)?;
        check_against_handoff(&handoff, &payment_order_key, amount)?;

        let request = PaymentConfirmRequest {
            payment_key,
            payment_order_key,
            order_id: handoff.order_id,
            amount,
        };
        let payment = self.api.confirm_payment(&request).await.inspect_err(|e| {
            error!(order_id = %handoff.order_id, error = %e, "Payment confirmation failed");
        })?;
        info!(order_id = %handoff.order_id, status = ?payment.status, "Payment confirmed");

        for cleared in [transient::clear_cart(store), transient::clear_handoff(store)] {
            if let Err(e) = cleared {
                warn!(error = %e, "Failed to clear checkout state");
            }
        }

        Ok(ConfirmedPayment {
            order_id: handoff.order_id,
            order_number: handoff.order_number,
            payment,
        })
    }
}

fn check_against_handoff(
    handoff: &PaymentHandoff,
    payment_order_key: &str,
    amount: Decimal,
) -> Result<(), PaymentError> {
    if handoff.payment_order_key != payment_order_key {
        error!(
            expected = %handoff.payment_order_key,
            got = %payment_order_key,
            "Payment callback names another order"
        );
        return Err(PaymentError::Mismatch { field: "orderId" });
    }
    if handoff.amount != amount {
        error!(
            expected = %handoff.amount,
            got = %amount,
            "Payment callback amount differs from the order"
        );
        return Err(PaymentError::Mismatch { field: "amount" });
    }
    Ok(())
}
