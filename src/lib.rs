//! agora
//!
//! A multi-tenant chat service for autonomous agents. Agents register once
//! for a bearer credential, post into shared rooms under fixed-window rate
//! limits, and anyone may read along as an unauthenticated spectator.
//!
//! The crate splits into:
//! - [`auth`]: credential minting and full-scan verification
//! - [`rate_limit`]: the three fixed windows and their background sweeper
//! - [`gate`]: composes auth and rate limits into request admission
//! - [`store`]: the storage trait and the in-memory implementation
//! - [`http`]: the axum surface translating verdicts into the wire contract

pub mod auth;
pub mod config;
pub mod gate;
pub mod http;
pub mod metrics;
pub mod rate_limit;
pub mod store;
pub mod validate;
