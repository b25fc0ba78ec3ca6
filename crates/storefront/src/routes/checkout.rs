//! Checkout and order lookup.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use kaay_core::validation::{FieldErrors, validate_phone};
use kaay_core::{BuyerInfo, Order, OrderId, PaymentMethod, Price};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, instrument};

use crate::error::{AppError, Result, add_breadcrumb, payment_status};
use crate::middleware::Shopper;
use crate::session::Profile;
use crate::state::AppState;
use crate::store::{CheckoutRequest, PaymentError, PaymentStore};

/// Checkout form.
#[derive(Debug, Deserialize)]
pub struct CheckoutForm {
    pub payment_method: PaymentMethod,
    pub name: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    /// Amount shown to the shopper; must equal the cart total.
    pub amount: u64,
    /// Save the buyer details as the shopper's profile on success.
    #[serde(default)]
    pub remember: bool,
}

/// Checkout outcome: the payment state, plus field errors when invalid.
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    #[serde(flatten)]
    pub payment: PaymentStore,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<FieldErrors>,
}

/// Order lookup query string.
#[derive(Debug, Deserialize)]
pub struct OrderLookupParams {
    pub phone: Option<String>,
}

/// Pay for the cart and record the order.
///
/// POST /api/checkout
///
/// Responds 201 with the payment state on success. On failure the status
/// reflects the cause (409 busy, 422 invalid fields, 402 declined, 5xx
/// backend) and the body still carries the payment state.
#[instrument(skip(state, form), fields(method = %form.payment_method))]
pub async fn checkout(
    State(state): State<AppState>,
    Shopper(shopper): Shopper,
    Json(form): Json<CheckoutForm>,
) -> Response {
    let payment = state.payment(&shopper).await;
    let Ok(mut payment) = payment.try_lock() else {
        return (
            StatusCode::CONFLICT,
            Json(json!({ "error": PaymentError::Busy.to_string() })),
        )
            .into_response();
    };
    // Holding the lock, a `Processing` store belongs to a dropped request
    payment.recover_interrupted();
    let items = state.open_session(shopper.clone()).cart.to_order_items();

    if let Err(e) = payment.select_payment_method(form.payment_method) {
        return (payment_status(&e), Json(json!({ "error": e.to_string() }))).into_response();
    }

    let request = CheckoutRequest {
        amount: Price::new(form.amount),
        buyer: BuyerInfo {
            name: form.name.clone(),
            phone: form.phone.clone(),
            address: form.address.clone(),
        },
        items,
        city: form.city.clone(),
    };

    match payment
        .process_payment(&state.services().orders, state.gateway(), request)
        .await
    {
        Ok(order) => {
            // Reopened: the cart may have changed while the order was written
            let mut session = state.open_session(shopper);
            session.cart.remove_ordered(&order.items);
            if form.remember {
                let profile = Profile {
                    name: form.name,
                    phone: order.buyer.phone.clone(),
                    address: form.address,
                    city: form.city,
                };
                if let Err(e) = session.save_profile(profile) {
                    debug!(error = %e, "Profile not remembered");
                }
            }
            add_breadcrumb("checkout", "Order placed", Some(&[("order_id", order.id.as_str())]));
            let body = CheckoutResponse {
                payment: PaymentStore::clone(&payment),
                fields: None,
            };
            (StatusCode::CREATED, Json(body)).into_response()
        }
        Err(e) => {
            let status = payment_status(&e);
            if status.is_server_error() {
                let event_id = sentry::capture_error(&e);
                tracing::error!(error = %e, sentry_event_id = %event_id, "Checkout error");
            }
            let fields = match e {
                PaymentError::Invalid(fields) => Some(fields),
                _ => None,
            };
            let body = CheckoutResponse {
                payment: PaymentStore::clone(&payment),
                fields,
            };
            (status, Json(body)).into_response()
        }
    }
}

/// Order confirmation.
///
/// GET /api/orders/{id}
#[instrument(skip(state))]
pub async fn order(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Order>> {
    let id = OrderId::new(id);
    state
        .services()
        .orders
        .by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))
}

/// Orders placed with a phone number, newest first.
///
/// GET /api/orders?phone=
#[instrument(skip(state, params))]
pub async fn orders_by_phone(
    State(state): State<AppState>,
    Query(params): Query<OrderLookupParams>,
) -> Result<Json<Vec<Order>>> {
    let raw = params
        .phone
        .ok_or_else(|| AppError::BadRequest("phone is required".to_string()))?;
    let phone = validate_phone(&raw).map_err(|e| {
        let mut fields = FieldErrors::default();
        fields.check::<()>("phone", Err(e));
        AppError::Validation(fields)
    })?;
    Ok(Json(state.services().orders.by_phone(&phone).await?))
}
