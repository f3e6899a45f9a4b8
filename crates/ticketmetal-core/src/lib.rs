//! Core types and trait definitions for TicketMetal.
//!
//! This crate is deliberately free of HTTP and database dependencies. It owns
//! the two upstream event schemas, the normalizer that reconciles them into a
//! single display model, and the pure helpers the storefront renders with.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod checkout;
pub mod error;
pub mod event;
pub mod format;
pub mod image;
pub mod listing;
pub mod raw;
pub mod site;
pub mod source;
pub mod stats;
pub mod store;
pub mod ticket;

pub use error::{Error, Result};
pub use event::{NormalizedEvent, PurchaseFlow, normalize};
pub use raw::RawEventRecord;
