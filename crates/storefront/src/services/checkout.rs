//! Checkout driver and the simulated payment gateway.
//!
//! The shopper lock is held only for validation and for applying the
//! result. While the gateway call is pending the shopper stays unlocked, so
//! filtering, cart edits, and product views keep working; a second
//! submission is turned away by the `Processing` state.

use std::future::Future;
use std::time::Duration;

use ecotrend_core::{CheckoutError, CheckoutForm, CheckoutOutcome, CheckoutSnapshot};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::instrument;

use crate::services::shoppers::Shopper;

/// Errors reported by a payment gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Payment declined: {0}")]
    Declined(String),

    #[error("Payment gateway unavailable")]
    Unavailable,
}

/// The remote call that settles a checkout.
pub trait PaymentGateway: Send + Sync {
    /// Charge for `snapshot`.
    fn charge(
        &self,
        snapshot: &CheckoutSnapshot,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;
}

/// A gateway that waits a fixed delay and always approves.
#[derive(Debug, Clone, Copy)]
pub struct SimulatedGateway {
    delay: Duration,
}

impl SimulatedGateway {
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self { delay }
    }

    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }
}

impl PaymentGateway for SimulatedGateway {
    async fn charge(&self, snapshot: &CheckoutSnapshot) -> Result<(), GatewayError> {
        tracing::debug!(total = %snapshot.total, delay = ?self.delay, "Simulating payment");
        tokio::time::sleep(self.delay).await;
        Ok(())
    }
}

/// Run a checkout for `shopper` with the submitted `form`.
///
/// On validation failure the submitted form is kept so the shopper can fix
/// it; a submission rejected because another one is in flight changes
/// nothing.
///
/// # Errors
///
/// Returns the `CheckoutError` that kept the submission from processing.
#[instrument(skip_all)]
pub async fn submit<G: PaymentGateway>(
    shopper: &Mutex<Shopper>,
    form: CheckoutForm,
    gateway: &G,
) -> Result<CheckoutOutcome, CheckoutError> {
    let snapshot = {
        let mut guard = shopper.lock().await;
        let Shopper {
            cart,
            form: saved_form,
            checkout,
        } = &mut *guard;

        match checkout.begin(cart, &form) {
            Ok(snapshot) => {
                *saved_form = form;
                snapshot
            }
            Err(CheckoutError::AlreadyProcessing) => {
                return Err(CheckoutError::AlreadyProcessing);
            }
            Err(e) => {
                tracing::debug!(error = %e, "Checkout rejected");
                *saved_form = form;
                return Err(e);
            }
        }
    };

    tracing::info!(
        total = %snapshot.total,
        lines = snapshot.lines.len(),
        payment_method = %snapshot.form.payment_method,
        installments = snapshot.installments,
        "Checkout processing"
    );

    let result = gateway.charge(&snapshot).await;
    if let Err(e) = &result {
        tracing::warn!(error = %e, "Payment failed");
    }

    let mut guard = shopper.lock().await;
    let Shopper {
        cart,
        form,
        checkout,
    } = &mut *guard;
    checkout.complete(result, cart, form).await;

    let outcome = checkout
        .observe()
        .unwrap_or_else(|| CheckoutOutcome::Failed("checkout state lost".to_string()));
    if let CheckoutOutcome::Succeeded(receipt) = &outcome {
        tracing::info!(final_total = %receipt.final_total, "Checkout succeeded");
    }
    Ok(outcome)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::time::Instant;

    use ecotrend_core::{
        CART_NAMESPACE, CheckoutState, MemoryStorage, PaymentMethod, Product, ProductId,
        checkout::{MSG_FAILURE, MSG_SUCCESS},
    };
    use rust_decimal::Decimal;

    use super::*;

    struct DecliningGateway;

    impl PaymentGateway for DecliningGateway {
        async fn charge(&self, _snapshot: &CheckoutSnapshot) -> Result<(), GatewayError> {
            Err(GatewayError::Declined("insufficient funds".to_string()))
        }
    }

    fn product(id: i32, price: i64) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            category: "Casa".to_string(),
            price: Decimal::new(price, 0),
            image: String::new(),
        }
    }

    async fn shopper_with(prices: &[i64]) -> Arc<Mutex<Shopper>> {
        let storage = Arc::new(MemoryStorage::new());
        let mut shopper = Shopper::restore(storage, CART_NAMESPACE.to_string()).await;
        for (i, price) in prices.iter().enumerate() {
            shopper
                .cart
                .add(&product(i32::try_from(i).unwrap(), *price))
                .await;
        }
        Arc::new(Mutex::new(shopper))
    }

    fn filled_form() -> CheckoutForm {
        CheckoutForm {
            name: "Ana Souza".to_string(),
            address: "Rua das Flores, 100".to_string(),
            payment_method: PaymentMethod::CreditCard,
            installments: 2,
        }
    }

    #[tokio::test]
    async fn test_successful_checkout_after_delay() {
        let shopper = shopper_with(&[150]).await;
        let gateway = SimulatedGateway::new(Duration::from_millis(50));

        let started = Instant::now();
        let outcome = submit(&shopper, filled_form(), &gateway).await.unwrap();

        assert!(started.elapsed() >= Duration::from_millis(50));
        assert_eq!(outcome.message(), MSG_SUCCESS);
        let CheckoutOutcome::Succeeded(receipt) = outcome else {
            panic!("expected success");
        };
        assert_eq!(receipt.final_total, Decimal::new(150, 0));
        // 150 is below the installment minimum
        assert_eq!(receipt.installments, 1);

        let guard = shopper.lock().await;
        assert!(guard.cart.is_empty());
        assert_eq!(guard.form, CheckoutForm::default());
        assert_eq!(guard.checkout.state(), &CheckoutState::Idle);
    }

    #[tokio::test]
    async fn test_empty_cart_rejected_without_waiting() {
        let shopper = shopper_with(&[]).await;
        let gateway = SimulatedGateway::new(Duration::from_secs(60));

        let err = submit(&shopper, filled_form(), &gateway).await.unwrap_err();

        assert_eq!(err, CheckoutError::EmptyCart);
        assert!(!shopper.lock().await.checkout.is_busy());
    }

    #[tokio::test]
    async fn test_missing_fields_keeps_submitted_form() {
        let shopper = shopper_with(&[10]).await;
        let gateway = SimulatedGateway::new(Duration::ZERO);
        let form = CheckoutForm {
            address: " ".to_string(),
            ..filled_form()
        };

        let err = submit(&shopper, form.clone(), &gateway).await.unwrap_err();

        assert_eq!(err, CheckoutError::MissingFields);
        let guard = shopper.lock().await;
        assert_eq!(guard.form, form);
        assert_eq!(guard.cart.item_count(), 1);
    }

    #[tokio::test]
    async fn test_cart_is_usable_while_processing_and_resubmit_is_rejected() {
        let shopper = shopper_with(&[100]).await;
        let gateway = SimulatedGateway::new(Duration::from_millis(200));

        let in_flight = {
            let shopper = Arc::clone(&shopper);
            tokio::spawn(async move { submit(&shopper, filled_form(), &gateway).await })
        };

        // Wait for the first submission to reach Processing
        loop {
            if shopper.lock().await.checkout.is_busy() {
                break;
            }
            tokio::task::yield_now().await;
        }

        shopper.lock().await.cart.add(&product(9, 5)).await;
        let second = submit(&shopper, filled_form(), &SimulatedGateway::new(Duration::ZERO)).await;
        assert_eq!(second.unwrap_err(), CheckoutError::AlreadyProcessing);

        let outcome = in_flight.await.unwrap().unwrap();
        let CheckoutOutcome::Succeeded(receipt) = outcome else {
            panic!("expected success");
        };
        assert_eq!(receipt.final_total, Decimal::new(100, 0));
        assert!(shopper.lock().await.cart.is_empty());
    }

    #[tokio::test]
    async fn test_declined_payment_keeps_cart() {
        let shopper = shopper_with(&[300]).await;

        let outcome = submit(&shopper, filled_form(), &DecliningGateway).await.unwrap();

        assert_eq!(outcome.message(), MSG_FAILURE);
        let guard = shopper.lock().await;
        assert_eq!(guard.cart.item_count(), 1);
        assert_eq!(guard.form, filled_form());
        assert_eq!(guard.checkout.state(), &CheckoutState::Idle);
    }

    #[test]
    fn test_simulated_gateway_delay() {
        let gateway = SimulatedGateway::new(Duration::from_millis(1500));
        assert_eq!(gateway.delay(), Duration::from_millis(1500));
    }
}
