//! Bibliometric Reconciliation Engine
//!
//! Aggregates per-researcher bibliometrics and extracts collaborations between
//! entity sets from the Scopus and SciVal APIs, reconciling the loosely keyed
//! author and affiliation mentions those APIs return.
//!
//! # Features
//!
//! - **Researcher sheets**: document type catalog, batched citation overview,
//!   publications per period, journal percentiles, collaboration types
//! - **Collaboration reports**: boolean entity-pair queries, author and
//!   institution reconciliation, fuzzy roster matching
//! - **Interactive session**: an explicit state table with `back` and `reset`,
//!   committing each step only when it fully succeeds
//! - **Quota pass-through**: every API call reports its rate-limit headers
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use biblio_recon::{client::ElsevierClient, config::Config, report::MemoryRenderer, session::Session};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let tuning = config.tuning.clone();
//!     let client = ElsevierClient::new(config)?;
//!
//!     let mut session = Session::new(Arc::new(client), Arc::new(MemoryRenderer::new()), tuning);
//!     let reply = session.submit("1").await?;
//!     println!("{}", reply.prompt.message);
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod client;
pub mod collaboration;
pub mod config;
pub mod error;
pub mod formatters;
pub mod metrics;
pub mod models;
pub mod report;
pub mod resolver;
pub mod roster;
pub mod session;
pub mod tables;

pub use client::{BibliometricApi, ElsevierClient};
pub use config::{Config, Tuning};
pub use error::{ClientError, EngineError, InputError};
pub use session::{Outcome, Session, Step, StepReply};
