//! Typed backend REST interface.
//!
//! Every JSON shape consumed from the backend is narrowed into an
//! explicit type at the fetch boundary; no ad hoc field probing happens
//! downstream. The client reports HTTP 401 as a distinct
//! [`AuthError::Unauthenticated`](crate::error::AuthError::Unauthenticated)
//! signal so controllers can redirect to login with a return target
//! instead of failing the flow.
//!
//! ## Submodules
//!
//! - `types` - response/request shapes for consent, charge and topup
//! - `client` - the bearer-authenticated HTTP client

pub mod client;
pub mod types;

pub use client::BackendClient;
pub use types::*;
