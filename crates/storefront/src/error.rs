//! Storefront error types.
//!
//! Controllers convert these to inline text with `user_message()`; the
//! `Display` output is for logs.

use tableside_client::{GatewayError, StorageError};
use thiserror::Error;

/// Failures while placing an order.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("cart is empty")]
    EmptyCart,

    #[error("note is {len} characters, at most {max} allowed")]
    NoteTooLong { len: usize, max: usize },

    #[error("payment widget is not configured")]
    PaymentUnavailable,

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("transient storage failed: {0}")]
    Storage(#[from] StorageError),
}

impl CheckoutError {
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::EmptyCart => "Your cart is empty.".to_string(),
            Self::NoteTooLong { max, .. } => format!("Requests can be at most {max} characters."),
            Self::PaymentUnavailable => "Online payment is not available right now.".to_string(),
            Self::Gateway(e) => e.user_message(),
            Self::Storage(_) => "Could not prepare the payment. Please try again.".to_string(),
        }
    }
}

/// Failures while reconciling a payment redirect.
#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("callback is missing `{0}`")]
    MissingParam(&'static str),

    #[error("callback has an invalid amount: {0}")]
    InvalidAmount(String),

    #[error("callback path is neither success nor fail: {0}")]
    UnknownCallback(String),

    #[error("no payment is in progress")]
    NoHandoff,

    /// The redirect does not describe the payment this client started.
    #[error("callback {field} does not match the pending payment")]
    Mismatch { field: &'static str },

    #[error("payment failed: {message} ({code})")]
    Declined { code: String, message: String },

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("transient storage failed: {0}")]
    Storage(#[from] StorageError),
}

impl PaymentError {
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingParam(_) | Self::InvalidAmount(_) | Self::UnknownCallback(_) => {
                "The payment result could not be read.".to_string()
            }
            Self::NoHandoff => "No payment is in progress on this device.".to_string(),
            Self::Mismatch { .. } => {
                "The payment does not match your order. Please ask staff for help.".to_string()
            }
            Self::Declined { message, .. } => format!("Payment failed: {message}"),
            Self::Gateway(e) => e.user_message(),
            Self::Storage(_) => "Could not read the pending payment.".to_string(),
        }
    }
}
