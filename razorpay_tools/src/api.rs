use std::{collections::HashMap, sync::Arc};

use log::*;
use reqwest::{Client, Method};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    config::RazorpayConfig,
    data_objects::{
        Collection,
        ErrorResponse,
        NewRazorpayOrder,
        NewRazorpayRefund,
        RazorpayOrder,
        RazorpayPayment,
        RazorpayRefund,
    },
    RazorpayApiError,
};

#[derive(Clone)]
pub struct RazorpayApi {
    config: RazorpayConfig,
    client: Arc<Client>,
}

impl std::fmt::Debug for RazorpayApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RazorpayApi({}, key id: {})", self.config.api_url, self.config.key_id)
    }
}

impl RazorpayApi {
    pub fn new(config: RazorpayConfig) -> Result<Self, RazorpayApiError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RazorpayApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn key_id(&self) -> &str {
        self.config.key_id.as_str()
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_url)
    }

    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<B>,
    ) -> Result<T, RazorpayApiError> {
        let url = self.url(path);
        trace!("💳️ Sending {method} {url}");
        let mut req = self
            .client
            .request(method, url)
            .basic_auth(&self.config.key_id, Some(self.config.key_secret.reveal()));
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await.map_err(|e| {
            if e.is_timeout() {
                RazorpayApiError::Timeout(self.config.timeout.as_secs())
            } else {
                RazorpayApiError::RequestError(e.to_string())
            }
        })?;
        let status = response.status();
        if status.is_success() {
            trace!("💳️ Request successful. {status}");
            response.json::<T>().await.map_err(|e| RazorpayApiError::JsonError(e.to_string()))
        } else {
            let text = response.text().await.map_err(|e| RazorpayApiError::RequestError(e.to_string()))?;
            let message = serde_json::from_str::<ErrorResponse>(&text).map(|e| e.message()).unwrap_or(text);
            debug!("💳️ Razorpay returned {status}: {message}");
            Err(RazorpayApiError::QueryError { status: status.as_u16(), message })
        }
    }

    pub async fn create_order(&self, order: NewRazorpayOrder) -> Result<RazorpayOrder, RazorpayApiError> {
        debug!("💳️ Creating order for {} {} ({})", order.amount, order.currency, order.receipt);
        let result = self.rest_query::<RazorpayOrder, _>(Method::POST, "/orders", Some(order)).await?;
        info!("💳️ Created order {}", result.id);
        Ok(result)
    }

    pub async fn fetch_order(&self, order_id: &str) -> Result<RazorpayOrder, RazorpayApiError> {
        let path = format!("/orders/{order_id}");
        self.rest_query::<RazorpayOrder, ()>(Method::GET, &path, None).await
    }

    pub async fn fetch_order_payments(&self, order_id: &str) -> Result<Vec<RazorpayPayment>, RazorpayApiError> {
        let path = format!("/orders/{order_id}/payments");
        let result = self.rest_query::<Collection<RazorpayPayment>, ()>(Method::GET, &path, None).await?;
        debug!("💳️ Order {order_id} has {} payments", result.items.len());
        Ok(result.items)
    }

    pub async fn fetch_payment(&self, payment_id: &str) -> Result<RazorpayPayment, RazorpayApiError> {
        let path = format!("/payments/{payment_id}");
        self.rest_query::<RazorpayPayment, ()>(Method::GET, &path, None).await
    }

    pub async fn refund_payment(
        &self,
        payment_id: &str,
        amount: Option<i64>,
        reason: &str,
    ) -> Result<RazorpayRefund, RazorpayApiError> {
        let notes = HashMap::from([("reason".to_string(), reason.to_string())]);
        let body = NewRazorpayRefund { amount, notes };
        let path = format!("/payments/{payment_id}/refund");
        debug!("💳️ Requesting refund for payment {payment_id} ({amount:?})");
        let result = self.rest_query::<RazorpayRefund, _>(Method::POST, &path, Some(body)).await?;
        info!("💳️ Refund {} created for payment {payment_id}", result.id);
        Ok(result)
    }
}
