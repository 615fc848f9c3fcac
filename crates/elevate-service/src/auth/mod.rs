//! Actor authentication.
//!
//! ## Module Organization
//!
//! - `actor`: The authenticated caller and its profile
//! - `authenticate`: Bearer token to actor resolution

pub mod actor;
pub mod authenticate;

pub use actor::Actor;
pub use authenticate::authenticate;
