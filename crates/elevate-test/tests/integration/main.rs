#![allow(clippy::expect_used, clippy::unwrap_used, clippy::too_many_lines)]
//! Integration tests for the account lifecycle services.
//!
//! Every test runs against the in-memory profile store and identity
//! provider from `elevate-test`; no database or network is needed.


mod deletion;
mod http;
mod invitation;
mod organization;
mod policy_properties;
