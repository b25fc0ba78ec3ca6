//! Checkout state machine.
//!
//! ```text
//! Idle ──process_payment──▶ Processing ──▶ Success
//!   ▲                           │
//!   │                           └────────▶ Failed
//!   └──────────── reset() from any state ───┘
//! ```
//!
//! Preconditions (payment method chosen, buyer details valid, amount equal
//! to the line total) are checked before entering `Processing`; a failed
//! precondition moves straight to `Failed`. Once processing, the gateway
//! settles the payment and the order is written. The outcome is `Success`
//! only if the write returned the stored order.

use async_trait::async_trait;
use kaay_core::phone;
use kaay_core::validation::{FieldErrors, validate_checkout};
use kaay_core::{BuyerInfo, NewOrder, Order, OrderId, OrderItem, PaymentMethod, Phone, Price};
use kaay_data::{DataError, OrderService};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument, warn};

const INTERRUPTED: &str = "the previous payment attempt was interrupted";

/// Checkout progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Idle,
    Processing,
    Success,
    Failed,
}

/// Why a checkout did not succeed.
#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("a payment is already being processed")]
    Busy,

    #[error("no payment method selected")]
    NoMethod,

    #[error("invalid checkout details")]
    Invalid(#[from] FieldErrors),

    #[error("amount {actual} does not match the cart total {expected}")]
    AmountMismatch { expected: Price, actual: Price },

    #[error("payment declined: {0}")]
    Declined(String),

    #[error("the order could not be recorded")]
    NotRecorded,

    #[error("order service error: {0}")]
    Data(#[from] DataError),
}

/// Everything the checkout form submits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRequest {
    /// Amount the shopper was shown.
    pub amount: Price,
    pub buyer: BuyerInfo,
    pub items: Vec<OrderItem>,
    pub city: String,
}

/// Gateway verdict for one payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    Approved,
    Declined(String),
}

/// Settles a payment before the order is written.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn settle(
        &self,
        order_id: &OrderId,
        method: PaymentMethod,
        amount: Price,
        phone: &Phone,
    ) -> Settlement;
}

/// Stand-in gateway: approves any phone with at least 8 digits.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedGateway;

impl SimulatedGateway {
    pub const MIN_DIGITS: usize = 8;
}

#[async_trait]
impl PaymentGateway for SimulatedGateway {
    async fn settle(
        &self,
        _order_id: &OrderId,
        _method: PaymentMethod,
        _amount: Price,
        phone: &Phone,
    ) -> Settlement {
        if phone::digit_count(phone.as_str()) >= Self::MIN_DIGITS {
            Settlement::Approved
        } else {
            Settlement::Declined("phone number is too short".to_string())
        }
    }
}

/// Checkout state for one attempt sequence.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PaymentStore {
    status: PaymentStatus,
    method: Option<PaymentMethod>,
    error: Option<String>,
    order_id: Option<OrderId>,
    last_order: Option<Order>,
}

impl PaymentStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn status(&self) -> PaymentStatus {
        self.status
    }

    #[must_use]
    pub const fn method(&self) -> Option<PaymentMethod> {
        self.method
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Id of the last successful order.
    #[must_use]
    pub const fn order_id(&self) -> Option<&OrderId> {
        self.order_id.as_ref()
    }

    #[must_use]
    pub const fn last_order(&self) -> Option<&Order> {
        self.last_order.as_ref()
    }

    /// Choose how to pay. Clears any previous error.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Busy` while a payment is processing.
    pub fn select_payment_method(&mut self, method: PaymentMethod) -> Result<(), PaymentError> {
        if self.status == PaymentStatus::Processing {
            return Err(PaymentError::Busy);
        }
        self.method = Some(method);
        self.error = None;
        Ok(())
    }

    /// Close out an attempt whose future was dropped mid-flight.
    ///
    /// Call only with exclusive access to the store: `Processing` then means
    /// nobody is driving the attempt any more. Moves to `Failed` so the
    /// shopper can choose a method and pay again. Whether the abandoned order
    /// was written is unknown; it can be looked up by phone.
    ///
    /// Returns whether an attempt was recovered.
    pub fn recover_interrupted(&mut self) -> bool {
        if self.status != PaymentStatus::Processing {
            return false;
        }
        warn!("Previous checkout attempt was interrupted");
        self.status = PaymentStatus::Failed;
        self.error = Some(INTERRUPTED.to_string());
        true
    }

    /// Back to `Idle`, forgetting the error and last outcome.
    pub fn reset(&mut self) {
        self.status = PaymentStatus::Idle;
        self.error = None;
        self.order_id = None;
        self.last_order = None;
    }

    /// Run a checkout attempt.
    ///
    /// # Errors
    ///
    /// Returns the `PaymentError` that moved the store to `Failed`, or
    /// `PaymentError::Busy` (state unchanged) if already processing.
    #[instrument(skip_all, fields(amount = %request.amount, items = request.items.len()))]
    pub async fn process_payment(
        &mut self,
        orders: &OrderService,
        gateway: &dyn PaymentGateway,
        mut request: CheckoutRequest,
    ) -> Result<Order, PaymentError> {
        if self.status == PaymentStatus::Processing {
            return Err(PaymentError::Busy);
        }

        let (method, phone) = match self.check_preconditions(&request) {
            Ok(checked) => checked,
            Err(e) => return Err(self.fail(e)),
        };
        request.buyer.phone = phone.digits().to_string();

        self.status = PaymentStatus::Processing;
        self.error = None;
        let order_id = OrderId::generate();

        if let Settlement::Declined(reason) = gateway
            .settle(&order_id, method, request.amount, &phone)
            .await
        {
            return Err(self.fail(PaymentError::Declined(reason)));
        }

        let order = NewOrder::new(
            order_id,
            request.buyer,
            request.items,
            method,
            request.city.trim().to_string(),
        );
        match orders.create(&order).await {
            Ok(Some(created)) => {
                info!(order_id = %created.id, "Checkout succeeded");
                self.status = PaymentStatus::Success;
                self.order_id = Some(created.id.clone());
                self.last_order = Some(created.clone());
                Ok(created)
            }
            Ok(None) => Err(self.fail(PaymentError::NotRecorded)),
            Err(e) => Err(self.fail(e.into())),
        }
    }

    fn check_preconditions(
        &self,
        request: &CheckoutRequest,
    ) -> Result<(PaymentMethod, Phone), PaymentError> {
        let method = self.method.ok_or(PaymentError::NoMethod)?;
        validate_checkout(&request.buyer, &request.city, &request.items)?;
        let expected: Price = request.items.iter().map(OrderItem::line_total).sum();
        if request.amount != expected {
            return Err(PaymentError::AmountMismatch {
                expected,
                actual: request.amount,
            });
        }
        // Already validated above; re-parse to get the normalised form.
        let phone = Phone::parse(&request.buyer.phone).map_err(|e| {
            let mut errors = FieldErrors::default();
            errors.check::<()>("phone", Err(e.into()));
            PaymentError::Invalid(errors)
        })?;
        Ok((method, phone))
    }

    fn fail(&mut self, error: PaymentError) -> PaymentError {
        warn!(error = %error, "Checkout failed");
        self.status = PaymentStatus::Failed;
        self.error = Some(error.to_string());
        error
    }
}
