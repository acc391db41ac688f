//! certauthz core library
//!
//! Decides whether a TLS client certificate may pass, based on the DNS
//! Subject Alternative Names it asserts and an operator allow-list.
//!
//! # Pipeline
//!
//! ```text
//! AuthzConfig ──▶ mode()            exactly one of regex / domains
//!             ──▶ pattern::compile  validate → escape → wildcard → anchor → join
//!             ──▶ Matcher           one immutable Regex
//!             ──▶ AuthorizationGate first SAN that matches wins
//! ```
//!
//! All failures happen at construction time. At request time the only
//! outcome is a [`Decision`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod gate;
pub mod matcher;
pub mod pattern;

pub use config::{AuthzConfig, MatchMode};
pub use error::{ConfigError, Result};
pub use gate::{AuthorizationGate, CertificateView, Decision};
pub use matcher::Matcher;
