use serde::{Deserialize, Serialize};

use crate::db_types::{Order, Paise, PaymentIntent, PaymentStatus};

/// The result of attempting a payment intent state transition.
#[derive(Debug, Clone)]
pub struct IntentTransition {
    /// The intent as it is stored after the attempt.
    pub intent: PaymentIntent,
    /// The ledger order for the intent, if there is one.
    pub order: Option<Order>,
    /// `false` if the intent was already terminal and nothing was written.
    pub changed: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentQuery {
    pub status: Option<PaymentStatus>,
    pub user_id: Option<i64>,
}

impl PaymentIntentQuery {
    pub fn with_status(mut self, status: PaymentStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_user_id(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStats {
    pub total_payments: i64,
    pub successful_payments: i64,
    pub failed_payments: i64,
    pub total_revenue: Paise,
    /// Percentage of intents that succeeded, to two decimal places.
    pub success_rate: f64,
}

impl PaymentStats {
    pub fn new(total: i64, successful: i64, failed: i64, revenue: Paise) -> Self {
        let success_rate = if total > 0 {
            let rate = successful as f64 / total as f64 * 100.0;
            (rate * 100.0).round() / 100.0
        } else {
            0.0
        };
        Self { total_payments: total, successful_payments: successful, failed_payments: failed, total_revenue: revenue, success_rate }
    }
}
