//! Checkout route handlers.
//!
//! Submission runs the simulated payment inline: the response arrives once
//! the payment delay has passed, carrying the refreshed sidebar with the
//! outcome message. Other requests from the same visitor are served while
//! it is pending.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{AppendHeaders, IntoResponse, Response},
};
use ecotrend_core::{
    CheckoutForm, CheckoutOutcome, PaymentMethod, Price, checkout::MSG_PROCESSING,
    installment_options,
};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Deserialize;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::middleware::Visitor;
use crate::routes::cart::{CART_COUNT_CHANGED_EVENT, CartSidebarTemplate, CartView};
use crate::services::{Shopper, checkout};
use crate::state::AppState;

/// Payment method selector entry.
#[derive(Clone)]
pub struct PaymentOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// Installment selector entry.
#[derive(Clone)]
pub struct InstallmentOption {
    pub count: u8,
    pub label: String,
    pub selected: bool,
}

/// Status line kinds, used as CSS modifiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageKind {
    Info,
    Success,
    Error,
}

impl MessageKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

/// Checkout form and status display data.
#[derive(Clone)]
pub struct CheckoutView {
    pub name: String,
    pub address: String,
    pub payment_options: Vec<PaymentOption>,
    pub installments: Vec<InstallmentOption>,
    pub busy: bool,
    /// Shown by the page while a submission is in flight.
    pub processing_message: &'static str,
    pub message: Option<String>,
    pub message_kind: &'static str,
    pub final_total: Option<String>,
}

impl CheckoutView {
    /// Render the shopper's saved form and current checkout status.
    #[must_use]
    pub fn from_shopper(shopper: &Shopper) -> Self {
        let form = &shopper.form;
        let total = shopper.cart.total();

        Self {
            name: form.name.clone(),
            address: form.address.clone(),
            payment_options: payment_options(form.payment_method),
            installments: installment_view(form, total),
            busy: shopper.checkout.is_busy(),
            processing_message: MSG_PROCESSING,
            message: shopper.checkout.status_message().map(String::from),
            message_kind: MessageKind::Info.as_str(),
            final_total: None,
        }
    }

    /// Replace the status line.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>, kind: MessageKind) -> Self {
        self.message = Some(message.into());
        self.message_kind = kind.as_str();
        self
    }
}

fn payment_options(selected: PaymentMethod) -> Vec<PaymentOption> {
    PaymentMethod::ALL
        .into_iter()
        .map(|method| PaymentOption {
            value: method.as_str(),
            label: method.label(),
            selected: method == selected,
        })
        .collect()
}

/// Installment choices for `form` at cart `total`; empty when not offered.
fn installment_view(form: &CheckoutForm, total: Decimal) -> Vec<InstallmentOption> {
    let chosen = form.effective_installments(total);

    installment_options(form.payment_method, total)
        .into_iter()
        .map(|count| {
            let each = (total / Decimal::from(count))
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
            InstallmentOption {
                count,
                label: format!("{count}x of {}", Price::brl(each)),
                selected: count == chosen,
            }
        })
        .collect()
}

/// Checkout form data.
#[derive(Debug, Deserialize)]
pub struct CheckoutFormInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: String,
    pub payment_method: Option<String>,
    pub installments: Option<u8>,
}

impl CheckoutFormInput {
    /// Convert to a [`CheckoutForm`].
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` for an unknown payment method.
    pub fn into_form(self) -> Result<CheckoutForm> {
        let payment_method = match self.payment_method.as_deref() {
            None | Some("") => PaymentMethod::default(),
            Some(raw) => raw
                .parse()
                .map_err(|e: ecotrend_core::checkout::UnknownPaymentMethod| {
                    AppError::BadRequest(e.to_string())
                })?,
        };

        Ok(CheckoutForm {
            name: self.name,
            address: self.address,
            payment_method,
            installments: self.installments.unwrap_or(1),
        })
    }
}

/// Installment selector query parameters.
#[derive(Debug, Deserialize)]
pub struct InstallmentsQuery {
    pub payment_method: Option<String>,
    pub installments: Option<u8>,
}

/// Installment selector fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/installments.html")]
pub struct InstallmentsTemplate {
    pub installments: Vec<InstallmentOption>,
}

/// Installment selector for the chosen payment method (HTMX).
///
/// Renders nothing unless installments are on offer.
#[instrument(skip(shopper))]
pub async fn installments(
    Visitor(shopper): Visitor,
    Query(query): Query<InstallmentsQuery>,
) -> Result<impl IntoResponse> {
    let form = CheckoutFormInput {
        name: String::new(),
        address: String::new(),
        payment_method: query.payment_method,
        installments: query.installments,
    }
    .into_form()?;

    let total = shopper.lock().await.cart.total();

    Ok(InstallmentsTemplate {
        installments: installment_view(&form, total),
    })
}

/// Submit checkout (HTMX).
///
/// Validation failures come back immediately with a message; a valid
/// submission returns after the simulated payment completes.
#[instrument(skip_all)]
pub async fn submit(
    State(state): State<AppState>,
    Visitor(shopper): Visitor,
    Form(input): Form<CheckoutFormInput>,
) -> Result<Response> {
    let form = input.into_form()?;

    let result = checkout::submit(&shopper, form, state.gateway()).await;

    let shopper = shopper.lock().await;
    let view = CheckoutView::from_shopper(&shopper);
    let checkout = match result {
        Ok(outcome @ CheckoutOutcome::Succeeded(_)) => {
            let mut view = view.with_message(outcome.message(), MessageKind::Success);
            if let CheckoutOutcome::Succeeded(receipt) = outcome {
                view.final_total = Some(receipt.display_total().to_string());
            }
            view
        }
        Ok(outcome @ CheckoutOutcome::Failed(_)) => {
            view.with_message(outcome.message(), MessageKind::Error)
        }
        Err(e) => view.with_message(e.to_string(), MessageKind::Error),
    };

    Ok((
        AppendHeaders([("HX-Trigger", CART_COUNT_CHANGED_EVENT)]),
        CartSidebarTemplate {
            cart: CartView::from(&shopper.cart),
            checkout,
        },
    )
        .into_response())
}
