//! Visitor extractor.
//!
//! Resolves the current visitor's [`Shopper`](crate::services::Shopper) from
//! the cart token stored in their session, issuing a fresh token on the
//! first visit.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::session_keys;
use crate::services::SharedShopper;
use crate::state::AppState;

/// The current visitor's shopper state.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(Visitor(shopper): Visitor) -> impl IntoResponse {
///     let count = shopper.lock().await.cart.item_count();
///     format!("{count} items")
/// }
/// ```
pub struct Visitor(pub SharedShopper);

impl FromRequestParts<AppState> for Visitor {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::Internal("session layer missing".to_string()))?;

        let token = cart_token(&session).await?;
        Ok(Self(state.shoppers().get(token).await))
    }
}

/// Read the session's cart token, creating one if absent.
async fn cart_token(session: &Session) -> Result<Uuid, tower_sessions::session::Error> {
    if let Some(token) = session.get::<Uuid>(session_keys::CART_TOKEN).await? {
        return Ok(token);
    }

    let token = Uuid::new_v4();
    session.insert(session_keys::CART_TOKEN, token).await?;
    tracing::debug!(%token, "Issued cart token");
    Ok(token)
}
