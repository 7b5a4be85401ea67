//! # Scrub Batch
//!
//! Batch document redaction pipeline.
//!
//! A batch is a list of [`FileReference`]s. Each file is validated, converted
//! to plain text by `scrub-extract`, redacted with its owner's rule set by
//! `scrub-guard`, normalized to ASCII and committed to the output store. Files
//! that cannot be processed safely are copied to a quarantine store instead.
//!
//! ## Components
//!
//! - [`storage`]: the [`ObjectStore`] gateway with in-memory and filesystem
//!   backends
//! - [`retry`]: exponential backoff for transient storage failures
//! - [`config_loader`]: per-user config resolution with a modification-time cache
//! - [`quarantine`]: routing of rejected files
//! - [`pipeline`]: the per-file flow
//! - [`orchestrator`]: sub-batching, bounded concurrency and the time budget
//!
//! ## Example
//!
//! ```rust
//! use scrub_batch::{BatchOrchestrator, BatchSettings, ConfigCache, FileReference, MemoryStore};
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let store = Arc::new(MemoryStore::new());
//! store.insert("uploads", "users/u1/notes.txt", "Meeting with ACME Corporation");
//! store.insert(
//!     "config",
//!     "users/u1/config/redaction.json",
//!     r#"{"replacements":[{"find":"ACME Corporation","replace":"[REDACTED]"}]}"#,
//! );
//!
//! let orchestrator = BatchOrchestrator::new(store.clone(), BatchSettings::default(), Arc::new(ConfigCache::new()));
//! let report = orchestrator
//!     .run(vec![FileReference::new("uploads", "users/u1/notes.txt")])
//!     .await;
//!
//! assert_eq!(report.succeeded(), 1);
//! assert!(report.results[0].redacted);
//! # }
//! ```

pub mod config_loader;
pub mod error;
pub mod keys;
pub mod orchestrator;
pub mod pipeline;
pub mod quarantine;
pub mod retry;
pub mod settings;
pub mod storage;
pub mod types;
pub mod validate;

pub use config_loader::{ConfigCache, ConfigLoader, ResolvedConfig};
pub use error::{ProcessingError, Result, SettingsError, StorageError};
pub use orchestrator::BatchOrchestrator;
pub use pipeline::FilePipeline;
pub use quarantine::QuarantineRouter;
pub use retry::{retry, RetryPolicy, Retryable};
pub use settings::BatchSettings;
pub use storage::{LocalStore, MemoryStore, Metadata, ObjectHead, ObjectStore};
pub use types::*;
