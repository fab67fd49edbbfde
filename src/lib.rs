// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! # Teller Demo
//!
//! This library is the core of a simulated single-account teller terminal:
//! PIN login with a three-strikes lockout policy, balance inquiry,
//! limit-checked withdrawals and deposits, transaction history, and PIN
//! change. It is a library consumed by a request-handling shell; a thin
//! interactive binary ships alongside it.
//!
//! ## Core Components
//!
//! - [`Engine`]: session and operation engine over the account store
//! - [`AccountStore`]: concurrent PIN-to-account map
//! - [`Account`]: balance, history, and the lockout state machine
//! - [`AuditLog`] / [`Clock`] / [`Notifier`]: seams the shell injects
//!
//! ## Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use teller_demo_rs::{Engine, Pin};
//!
//! let engine = Engine::new();
//! engine.open_account(Pin::parse("1234").unwrap(), "1234", dec!(1000.00));
//!
//! let session = engine.authenticate("1234", "1234").unwrap();
//! let receipt = engine.withdraw(&session, "50").unwrap();
//! assert_eq!(receipt.new_balance, dec!(950.00));
//! assert_eq!(engine.history(&session).unwrap().len(), 1);
//! ```
//!
//! ## Thread Safety
//!
//! Accounts live in a concurrent map and each carries its own mutex, so
//! operations on one account are mutually exclusive (no overdraft under
//! concurrent withdrawals) while different accounts proceed in parallel.
//! Nothing persists beyond the process; the store is in-memory by design.

pub mod account;
pub mod audit;
mod base;
mod engine;
pub mod error;
mod store;
mod transaction;

pub use account::{Account, MAX_FAILED_ATTEMPTS};
pub use audit::{
    AuditEntry, AuditLog, AuditOutcome, Clock, LogAudit, LogNotifier, Notifier, NullAudit,
    NullNotifier, OperationKind, SystemClock,
};
pub use base::Pin;
pub use engine::{Engine, EngineConfig, Session};
pub use error::{AuthError, OperationError, ValidationError};
pub use store::AccountStore;
pub use transaction::{Outcome, Receipt, Transaction, TransactionKind};
