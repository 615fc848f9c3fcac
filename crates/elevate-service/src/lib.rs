//! Account lifecycle services.
//!
//! Each public service function authenticates the actor's bearer token,
//! evaluates the role policy, and only then calls the identity provider or
//! the profile store.
//!
//! ## Module Organization
//!
//! - `activation`: Activation completion (first password)
//! - `auth`: Bearer token to actor resolution
//! - `context`: Shared collaborators and limits
//! - `deletion`: Account deletion
//! - `directory`: Account listings and `whoami`
//! - `error`: Service error taxonomy and codes
//! - `guard`: Timeout and retry wrappers
//! - `identity`: Identity provider gateway
//! - `invitation`: Two-phase account invitation
//! - `organization`: Organization switch and tenant scoping
//! - `policy`: Role policy engine
//! - `reconcile`: Sweep for interrupted invitations

pub mod activation;
pub mod auth;
pub mod context;
pub mod deletion;
pub mod directory;
pub mod error;
pub mod guard;
pub mod identity;
pub mod invitation;
pub mod organization;
pub mod policy;
pub mod reconcile;

pub use context::{Limits, ServiceDeps};
pub use error::{ErrorCode, ServiceError, ServiceResult};
