//! Application layer: the payment-gated transaction protocol.
//!
//! [`initiator`] starts a transaction and hands it to the gateway,
//! [`gateway`] wraps the checkout widget, and [`resolver`] reconciles the
//! returning checkout with the pending record.

pub mod gateway;
pub mod initiator;
pub mod resolver;
