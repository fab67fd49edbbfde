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

//! Injected seams between the engine and its host shell.
//!
//! The engine does not own a logger, a clock, or a notification channel. The
//! shell hands them in: an [`AuditLog`] sink that receives one entry per
//! operation attempt, a [`Clock`] that timestamps transactions, and a
//! [`Notifier`] the engine calls on lockout and low-balance events. Defaults
//! backed by the `log` facade and the system clock are provided.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::base::Pin;

/// Operation tag carried on every audit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Login,
    Withdrawal,
    Deposit,
    PinChange,
    Unlock,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Withdrawal => "withdrawal",
            Self::Deposit => "deposit",
            Self::PinChange => "pin-change",
            Self::Unlock => "unlock",
        }
    }
}

/// Outcome tag carried on every audit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditOutcome {
    Ok,
    Rejected,
}

impl AuditOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Rejected => "REJECTED",
        }
    }
}

/// One audited operation attempt.
///
/// `actor` is the raw PIN text the caller presented (it may not parse as a
/// [`Pin`]), and `amount` is the raw amount input: rejected inputs ("abc",
/// "-50") must appear in the audit trail verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    pub actor: String,
    pub operation: OperationKind,
    pub amount: Option<String>,
    pub outcome: AuditOutcome,
    pub detail: String,
}

/// Sink for audit entries.
///
/// Failures are recorded before the error is returned to the caller;
/// successes are recorded after the mutation commits.
pub trait AuditLog: Send + Sync {
    fn record(&self, entry: AuditEntry);
}

/// Audit sink over the `log` facade.
pub struct LogAudit;

impl AuditLog for LogAudit {
    fn record(&self, entry: AuditEntry) {
        log::info!(
            "pin={} op={} amount={} outcome={} detail={}",
            entry.actor,
            entry.operation.as_str(),
            entry.amount.as_deref().unwrap_or("-"),
            entry.outcome.as_str(),
            entry.detail,
        );
    }
}

/// Audit sink that drops everything. Useful in tests and benches.
pub struct NullAudit;

impl AuditLog for NullAudit {
    fn record(&self, _entry: AuditEntry) {}
}

/// Source of transaction timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Receives engine events that would page a human in a real deployment.
///
/// The original system sprinkled print-style notification stubs through its
/// control flow; here they are a single injected interface with two defined
/// events.
pub trait Notifier: Send + Sync {
    /// Third consecutive failed login locked the card.
    fn card_locked(&self, pin: &Pin);

    /// A withdrawal left the balance under the configured threshold.
    fn low_balance(&self, pin: &Pin, balance: Decimal);
}

/// Notifier over the `log` facade.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn card_locked(&self, pin: &Pin) {
        log::warn!("pin={pin} card locked after repeated failed logins");
    }

    fn low_balance(&self, pin: &Pin, balance: Decimal) {
        log::warn!("pin={pin} balance low: {balance}");
    }
}

/// Notifier that drops everything.
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn card_locked(&self, _pin: &Pin) {}

    fn low_balance(&self, _pin: &Pin, _balance: Decimal) {}
}
