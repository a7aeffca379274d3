//! Checkout form, validation, and state machine.
//!
//! ```text
//! Idle --begin--> (validate) --ok--> Processing --complete(Ok)--> Succeeded --observe--> Idle
//!                     |                    \------complete(Err)--> Failed ----observe--> Idle
//!                     \--rejected--> Idle
//! ```
//!
//! The flow itself never sleeps or performs I/O. A driver calls
//! [`CheckoutFlow::begin`], runs the remote call without holding any lock,
//! then reports back through [`CheckoutFlow::complete`].

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cart::{CartLine, CartStore};
use crate::types::Price;

/// Cart totals above this amount may be split into installments.
pub const INSTALLMENT_MIN_TOTAL: Decimal = Decimal::from_parts(200, 0, 0, false, 0);

/// Installment counts offered when installments apply.
pub const INSTALLMENT_CHOICES: RangeInclusive<u8> = 1..=5;

pub const MSG_PROCESSING: &str = "Processing your order...";
pub const MSG_SUCCESS: &str = "Purchase completed successfully!";
pub const MSG_FAILURE: &str = "Error processing purchase.";

/// Accepted payment methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentMethod {
    #[default]
    InstantTransfer,
    CreditCard,
    BankSlip,
}

impl PaymentMethod {
    pub const ALL: [Self; 3] = [Self::InstantTransfer, Self::CreditCard, Self::BankSlip];

    /// Form value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InstantTransfer => "instant-transfer",
            Self::CreditCard => "credit-card",
            Self::BankSlip => "bank-slip",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::InstantTransfer => "Instant transfer (Pix)",
            Self::CreditCard => "Credit card",
            Self::BankSlip => "Bank slip (Boleto)",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error parsing a [`PaymentMethod`].
#[derive(Debug, Clone, Error)]
#[error("unknown payment method: {0}")]
pub struct UnknownPaymentMethod(pub String);

impl FromStr for PaymentMethod {
    type Err = UnknownPaymentMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| UnknownPaymentMethod(s.to_string()))
    }
}

/// Installment counts on offer for `method` at cart `total`.
///
/// Empty unless paying by credit card with a total above
/// [`INSTALLMENT_MIN_TOTAL`].
#[must_use]
pub fn installment_options(method: PaymentMethod, total: Decimal) -> Vec<u8> {
    if method == PaymentMethod::CreditCard && total > INSTALLMENT_MIN_TOTAL {
        INSTALLMENT_CHOICES.collect()
    } else {
        Vec::new()
    }
}

/// Recipient and payment details entered by the shopper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutForm {
    pub name: String,
    pub address: String,
    pub payment_method: PaymentMethod,
    pub installments: u8,
}

impl Default for CheckoutForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            address: String::new(),
            payment_method: PaymentMethod::default(),
            installments: 1,
        }
    }
}

impl CheckoutForm {
    /// Installment count that applies at cart `total`.
    ///
    /// Falls back to a single payment when installments are not on offer
    /// or the requested count is not one of the offered choices.
    #[must_use]
    pub fn effective_installments(&self, total: Decimal) -> u8 {
        let options = installment_options(self.payment_method, total);
        if options.contains(&self.installments) {
            self.installments
        } else {
            1
        }
    }

    fn missing_fields(&self) -> bool {
        self.name.trim().is_empty() || self.address.trim().is_empty()
    }
}

/// Reasons a submission is turned away before processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CheckoutError {
    #[error("Your cart is empty.")]
    EmptyCart,

    #[error("Please fill in your name and address.")]
    MissingFields,

    #[error("Checkout is already in progress.")]
    AlreadyProcessing,
}

/// Cart contents captured when processing starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSnapshot {
    pub lines: Vec<CartLine>,
    pub total: Decimal,
    pub form: CheckoutForm,
    pub installments: u8,
}

/// Confirmation of a completed purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub final_total: Decimal,
    pub payment_method: PaymentMethod,
    pub installments: u8,
    pub item_count: u32,
}

impl Receipt {
    #[must_use]
    pub const fn display_total(&self) -> Price {
        Price::brl(self.final_total)
    }
}

/// Where a checkout stands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CheckoutState {
    #[default]
    Idle,
    Processing(CheckoutSnapshot),
    Succeeded(Receipt),
    Failed(String),
}

/// A terminal result, handed out once by [`CheckoutFlow::observe`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutOutcome {
    Succeeded(Receipt),
    Failed(String),
}

impl CheckoutOutcome {
    /// Message shown to the shopper.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::Succeeded(_) => MSG_SUCCESS,
            Self::Failed(_) => MSG_FAILURE,
        }
    }
}

/// Checkout state machine for one shopper.
#[derive(Debug, Default)]
pub struct CheckoutFlow {
    state: CheckoutState,
}

impl CheckoutFlow {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn state(&self) -> &CheckoutState {
        &self.state
    }

    /// Whether a submission is currently being processed.
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        matches!(self.state, CheckoutState::Processing(_))
    }

    /// Status line for the current state, if any.
    #[must_use]
    pub const fn status_message(&self) -> Option<&'static str> {
        match self.state {
            CheckoutState::Idle => None,
            CheckoutState::Processing(_) => Some(MSG_PROCESSING),
            CheckoutState::Succeeded(_) => Some(MSG_SUCCESS),
            CheckoutState::Failed(_) => Some(MSG_FAILURE),
        }
    }

    /// Validate a submission and move to `Processing`.
    ///
    /// A prior terminal state that was never observed is discarded. On
    /// rejection the flow is left `Idle` and nothing is captured.
    ///
    /// # Errors
    ///
    /// - `AlreadyProcessing` if a submission is in flight
    /// - `EmptyCart` if the cart has no lines
    /// - `MissingFields` if the name or address is blank
    pub fn begin(
        &mut self,
        cart: &CartStore,
        form: &CheckoutForm,
    ) -> Result<CheckoutSnapshot, CheckoutError> {
        match self.state {
            CheckoutState::Processing(_) => return Err(CheckoutError::AlreadyProcessing),
            CheckoutState::Succeeded(_) | CheckoutState::Failed(_) => {
                self.state = CheckoutState::Idle;
            }
            CheckoutState::Idle => {}
        }

        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        if form.missing_fields() {
            return Err(CheckoutError::MissingFields);
        }

        let total = cart.total();
        let snapshot = CheckoutSnapshot {
            lines: cart.lines().to_vec(),
            total,
            form: form.clone(),
            installments: form.effective_installments(total),
        };
        self.state = CheckoutState::Processing(snapshot.clone());
        Ok(snapshot)
    }

    /// Apply the remote call's result.
    ///
    /// On success the cart is cleared and `form` reset to defaults; the
    /// receipt carries the total captured at submission. On failure the
    /// cart and form are left as they are. Calls outside `Processing` are
    /// ignored and return `None`.
    pub async fn complete<E: fmt::Display>(
        &mut self,
        result: Result<(), E>,
        cart: &mut CartStore,
        form: &mut CheckoutForm,
    ) -> Option<&CheckoutState> {
        let CheckoutState::Processing(snapshot) = std::mem::take(&mut self.state) else {
            tracing::warn!("Checkout completion received while not processing");
            return None;
        };

        self.state = match result {
            Ok(()) => {
                cart.clear().await;
                *form = CheckoutForm::default();
                CheckoutState::Succeeded(Receipt {
                    final_total: snapshot.total,
                    payment_method: snapshot.form.payment_method,
                    installments: snapshot.installments,
                    item_count: snapshot.lines.iter().map(|l| l.qty).sum(),
                })
            }
            Err(e) => CheckoutState::Failed(e.to_string()),
        };
        Some(&self.state)
    }

    /// Take a terminal outcome and return to `Idle`.
    ///
    /// Returns `None` (and changes nothing) while idle or processing.
    pub fn observe(&mut self) -> Option<CheckoutOutcome> {
        match std::mem::take(&mut self.state) {
            CheckoutState::Succeeded(receipt) => Some(CheckoutOutcome::Succeeded(receipt)),
            CheckoutState::Failed(reason) => Some(CheckoutOutcome::Failed(reason)),
            other => {
                self.state = other;
                None
            }
        }
    }
}
