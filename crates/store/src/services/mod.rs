//! Services that combine repositories.
//!
//! - [`auth`] - Password sign-up/sign-in and admin bootstrap
//! - [`purchases`] - Checkout, completion and cancellation of purchase requests

pub mod auth;
pub mod purchases;

pub use auth::{AuthError, AuthService};
pub use purchases::{PurchaseError, PurchaseService};
