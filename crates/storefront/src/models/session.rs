//! Session-related types.
//!
//! The session carries only the visitor's cart token. Cart contents live in
//! cart storage under a key derived from the token.

/// Session keys.
pub mod keys {
    /// Key for the visitor's cart token (UUID).
    pub const CART_TOKEN: &str = "cart_token";
}
