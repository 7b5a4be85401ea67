//! # Scrub Guard
//!
//! Redaction rule engine for extracted document text.
//!
//! Scrub Guard takes plain text produced by `scrub-extract` and removes
//! personal and client-confidential content according to a per-user
//! [`RedactionConfig`]:
//!
//! - **URL stripping**: HTML anchors and Markdown links keep only their visible
//!   text, bare URLs are removed
//! - **Conditional rules**: find/replace groups gated on trigger terms found in
//!   the original text
//! - **Global replacements**: ordered literal find/replace pairs
//! - **PII detectors**: a fixed registry of named patterns (SSN, payment
//!   cards, phone numbers, email, IP addresses, driver's licenses)
//! - **Output normalization**: folds the result to 7-bit ASCII
//!
//! ## Quick Start
//!
//! ```rust
//! use scrub_guard::{normalize, LineEnding, RedactionConfig, Redactor};
//!
//! let config = RedactionConfig::from_json(
//!     r#"{"replacements":[{"find":"ACME Corporation","replace":"[REDACTED]"}]}"#,
//! )?;
//! let redactor = Redactor::new(config)?;
//!
//! let outcome = redactor.redact("This document is from ACME Corporation.");
//! assert!(outcome.redacted);
//!
//! let text = normalize(&outcome.text, LineEnding::Lf);
//! assert_eq!(text, "This document is from [REDACTED].");
//! # Ok::<(), scrub_guard::GuardError>(())
//! ```
//!
//! ## Rule order
//!
//! ```text
//!  original text
//!       │
//!       ▼
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │ URL          │ ► │ Conditional  │ ► │ Global       │ ► │ PII          │
//! │ stripping    │   │ rules        │   │ replacements │   │ detectors    │
//! └──────────────┘   └──────────────┘   └──────────────┘   └──────────────┘
//!                           ▲                                     │
//!             triggers read │ the original text                   ▼
//!                                                          ┌──────────────┐
//!                                                          │ Normalizer   │
//!                                                          └──────────────┘
//! ```

pub mod audit;
pub mod config;
pub mod engine;
pub mod error;
pub mod normalize;
pub mod pii;
pub mod types;
pub mod urls;

pub use audit::{AuditConfig, AuditLogger};
pub use config::{
    ConditionalRule, PatternToggles, RedactionConfig, Replacement, RuleReplacement, Trigger,
    MAX_REPLACEMENTS,
};
pub use engine::Redactor;
pub use error::{GuardError, Result};
pub use normalize::{is_normalized, normalize, LineEnding};
pub use types::*;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::RedactionConfig;
    pub use crate::engine::Redactor;
    pub use crate::error::{GuardError, Result};
    pub use crate::normalize::{normalize, LineEnding};
    pub use crate::types::*;
}
