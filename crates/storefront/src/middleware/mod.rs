//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. `TraceLayer` (request tracing)
//! 2. Request ID (add unique ID to each request)
//! 3. Session layer (tower-sessions with in-memory store)
//!
//! The [`Visitor`] extractor sits on top of the session layer and resolves
//! the per-visitor cart.

pub mod request_id;
pub mod session;
pub mod visitor;

pub use request_id::request_id_middleware;
pub use session::create_session_layer;
pub use visitor::Visitor;
