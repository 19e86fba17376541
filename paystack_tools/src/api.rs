use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    Method,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{
    config::PaystackConfig,
    data_objects::{ChargeData, NewTransaction, TransactionAuthorization},
    PaystackApiError,
};

/// Every Paystack response wraps its payload in this envelope. `status: false` with a 2xx code
/// still means the request was declined.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    status: bool,
    message: String,
    data: Option<T>,
}

#[derive(Clone)]
pub struct PaystackApi {
    config: PaystackConfig,
    client: Arc<Client>,
}

impl PaystackApi {
    pub fn new(config: PaystackConfig) -> Result<Self, PaystackApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        let bearer = format!("Bearer {}", config.secret_key.reveal());
        let val = HeaderValue::from_str(&bearer).map_err(|e| PaystackApiError::Initialization(e.to_string()))?;
        headers.insert("Authorization", val);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| PaystackApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<B>,
    ) -> Result<T, PaystackApiError> {
        let url = self.url(path);
        trace!("Sending REST query: {url}");
        let mut req = self.client.request(method, url);
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await.map_err(|e| PaystackApiError::RestResponseError(e.to_string()))?;
        if response.status().is_success() {
            trace!("REST query successful. {}", response.status());
            let envelope =
                response.json::<Envelope<T>>().await.map_err(|e| PaystackApiError::JsonError(e.to_string()))?;
            if !envelope.status {
                return Err(PaystackApiError::DeclinedRequest(envelope.message));
            }
            envelope.data.ok_or_else(|| PaystackApiError::JsonError("Envelope carried no data".to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| PaystackApiError::RestResponseError(e.to_string()))?;
            Err(PaystackApiError::QueryError { status, message })
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_url)
    }

    /// Registers a pending transaction with Paystack and returns the checkout authorization.
    /// The caller keeps `tx.reference`; the webhook echoes it back verbatim.
    pub async fn initialize_transaction(
        &self,
        tx: &NewTransaction,
    ) -> Result<TransactionAuthorization, PaystackApiError> {
        debug!("Initializing transaction {} for {}", tx.reference, tx.amount);
        let auth = self
            .rest_query::<TransactionAuthorization, &NewTransaction>(
                Method::POST,
                "/transaction/initialize",
                Some(tx),
            )
            .await?;
        info!("Initialized transaction {}", auth.reference);
        Ok(auth)
    }

    /// Server-side confirmation of a charge, used to double-check a webhook or poll a pending
    /// checkout. Note that a "success" here has the same standing as a verified webhook.
    pub async fn verify_transaction(&self, reference: &str) -> Result<ChargeData, PaystackApiError> {
        let path = format!("/transaction/verify/{reference}");
        debug!("Verifying transaction {reference}");
        let data = self.rest_query::<ChargeData, ()>(Method::GET, &path, None).await?;
        info!("Verified transaction {reference}: {}", data.status);
        Ok(data)
    }
}
