//! The [`PaymentGateway`] implementation backed by the Razorpay REST API.
//!
//! This is mostly conversion: Razorpay speaks in integer paise and unix timestamps, the engine in [`Paise`] and
//! `DateTime<Utc>`. Transport failures and timeouts become [`GatewayError::Unavailable`], so that callers fail fast
//! instead of hanging on the gateway.
use hood_engine::{
    db_types::{GatewayOrderId, Paise},
    traits::{GatewayError, GatewayOrder, GatewayPayment, GatewayRefund, NewGatewayOrder, PaymentGateway, RefundRequest},
};
use log::*;
use razorpay_tools::{
    helpers::timestamp_to_datetime,
    NewRazorpayOrder,
    RazorpayApi,
    RazorpayApiError,
    RazorpayOrder,
    RazorpayPayment,
    RazorpayRefund,
};

#[derive(Debug, Clone)]
pub struct RazorpayGateway {
    api: RazorpayApi,
}

impl RazorpayGateway {
    pub fn new(api: RazorpayApi) -> Self {
        Self { api }
    }

    /// The public key id, which clients need to open the checkout form.
    pub fn key_id(&self) -> &str {
        self.api.key_id()
    }
}

impl PaymentGateway for RazorpayGateway {
    async fn create_order(&self, order: NewGatewayOrder) -> Result<GatewayOrder, GatewayError> {
        let NewGatewayOrder { amount, currency, receipt, notes } = order;
        let request = NewRazorpayOrder { amount: amount.value(), currency, receipt, notes };
        let order = self.api.create_order(request).await.map_err(gateway_error)?;
        Ok(to_gateway_order(order))
    }

    async fn fetch_payment(&self, payment_id: &str) -> Result<GatewayPayment, GatewayError> {
        let payment = self.api.fetch_payment(payment_id).await.map_err(gateway_error)?;
        Ok(to_gateway_payment(payment))
    }

    async fn fetch_order(&self, order_id: &GatewayOrderId) -> Result<GatewayOrder, GatewayError> {
        let order = self.api.fetch_order(order_id.as_str()).await.map_err(gateway_error)?;
        Ok(to_gateway_order(order))
    }

    async fn fetch_order_payments(&self, order_id: &GatewayOrderId) -> Result<Vec<GatewayPayment>, GatewayError> {
        let payments = self.api.fetch_order_payments(order_id.as_str()).await.map_err(gateway_error)?;
        Ok(payments.into_iter().map(to_gateway_payment).collect())
    }

    async fn refund(&self, payment_id: &str, request: RefundRequest) -> Result<GatewayRefund, GatewayError> {
        let amount = request.amount.map(|a| a.value());
        let refund = self.api.refund_payment(payment_id, amount, &request.reason).await.map_err(gateway_error)?;
        Ok(to_gateway_refund(refund))
    }
}

pub fn gateway_error(e: RazorpayApiError) -> GatewayError {
    match e {
        RazorpayApiError::Timeout(_) | RazorpayApiError::RequestError(_) | RazorpayApiError::Initialization(_) => {
            warn!("💳️ Razorpay is unavailable. {e}");
            GatewayError::Unavailable(e.to_string())
        },
        RazorpayApiError::QueryError { status: 404, message } => GatewayError::NotFound(message),
        // Razorpay answers lookups of unknown ids with a 400 rather than a 404
        RazorpayApiError::QueryError { status: 400, message } if message.contains("does not exist") => {
            GatewayError::NotFound(message)
        },
        RazorpayApiError::QueryError { status, message } => {
            warn!("💳️ Razorpay rejected the request ({status}). {message}");
            GatewayError::Rejected { status, message }
        },
        RazorpayApiError::JsonError(s) => GatewayError::InvalidResponse(s),
    }
}

pub fn to_gateway_order(order: RazorpayOrder) -> GatewayOrder {
    GatewayOrder {
        id: GatewayOrderId::from(order.id),
        amount: Paise::from(order.amount),
        amount_paid: Paise::from(order.amount_paid),
        currency: order.currency,
        receipt: order.receipt,
        status: order.status,
        attempts: order.attempts,
        created_at: timestamp_to_datetime(order.created_at),
    }
}

pub fn to_gateway_payment(payment: RazorpayPayment) -> GatewayPayment {
    GatewayPayment {
        id: payment.id,
        order_id: payment.order_id.map(GatewayOrderId::from),
        amount: Paise::from(payment.amount),
        currency: payment.currency,
        status: payment.status,
        method: payment.method,
        email: payment.email,
        contact: payment.contact,
        captured: payment.captured,
        error_description: payment.error_description,
        created_at: timestamp_to_datetime(payment.created_at),
    }
}

pub fn to_gateway_refund(refund: RazorpayRefund) -> GatewayRefund {
    GatewayRefund {
        id: refund.id,
        payment_id: refund.payment_id,
        amount: Paise::from(refund.amount),
        currency: refund.currency,
        status: refund.status,
        created_at: timestamp_to_datetime(refund.created_at),
    }
}
