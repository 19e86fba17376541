//! A thin client for the parts of the Paystack API that the payment flow touches, plus the
//! webhook payload types. Paystack denominates every amount in kobo, so values map onto
//! [`oja_common::Kobo`] without any string parsing.

mod api;
mod config;
mod error;

mod data_objects;

pub use api::PaystackApi;
pub use config::PaystackConfig;
pub use data_objects::{
    ChargeCustomer,
    ChargeData,
    NewTransaction,
    TransactionAuthorization,
    WebhookEvent,
    CHARGE_FAILED,
    CHARGE_SUCCESS,
};
pub use error::PaystackApiError;
