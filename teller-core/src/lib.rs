//! Teller Core
//!
//! Ledger core for a small set of customer accounts: balances, deposits,
//! withdrawals and transfers, with money conservation enforced end to end.
//!
//! # Architecture
//!
//! - **Entity**: [`Account`] enforces the non-negative balance invariant
//! - **Repository**: owner-scoped persistence contract with in-memory and
//!   RocksDB implementations
//! - **Service**: validation and orchestration, two-phase transfers with
//!   in-memory compensation
//! - **Single Writer**: one actor task serializes every mutation
//!
//! # Invariants
//!
//! - Balance never negative, before and after every operation
//! - Transfers conserve funds: the source + destination total is unchanged
//! - Account numbers are unique, immutable, and never reused
//! - Ownership isolation: an owner-scoped lookup never returns another
//!   customer's account

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod account;
pub mod money;
pub mod error;
pub mod repository;
pub mod storage;
pub mod service;
pub mod actor;
pub mod auth;
pub mod config;
pub mod metrics;

// Re-exports
pub use account::{Account, AccountNumber, AccountType, CustomerNumber};
pub use actor::{spawn_teller, TellerHandle};
pub use auth::Authentication;
pub use config::{Config, TransferPolicy};
pub use error::{Error, Result};
pub use metrics::Metrics;
pub use repository::{AccountRepository, MemoryRepository};
pub use service::{AccountService, TransferReceipt};
pub use storage::RocksRepository;
