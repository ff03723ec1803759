//! Client domain module.
//!
//! Clients are identified by phone number. This crate holds the pure rules:
//! phone normalization, the de-duplicated phone set, and the client record.
//! Lookup across all clients lives with the registry in `servicepro-infra`.

pub mod client;
pub mod phone;

pub use client::{Client, ClientId};
pub use phone::{PhoneSet, normalize_phone};
