//! Core business logic - framework-agnostic operations over the database.
//!
//! Every function takes the connection explicitly; multi-step mutations open
//! their own transaction.

/// Registration, login and profiles
pub mod auth;
/// Products and variants
pub mod catalog;
/// Sales, stock movements and cancellations
pub mod invoice;
/// Checkout intents and webhook reconciliation
pub mod payment;
/// Role gate
pub mod policy;
/// Sales statistics
pub mod report;
/// Plans and subscriptions
pub mod subscription;
/// Session tokens
pub mod token;
/// Gateway signatures and REST client
pub mod wompi;
