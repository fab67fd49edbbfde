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

//! Session and operation engine.
//!
//! The [`Engine`] is the library's front door: it authenticates PINs against
//! the [`AccountStore`], grants [`Session`] handles, and dispatches the
//! operations a teller terminal offers (withdraw, deposit, balance, history,
//! PIN change). Lockout transitions and per-operation limits are enforced
//! here and in [`Account`].
//!
//! # Audit discipline
//!
//! Every operation attempt produces exactly one [`AuditEntry`]: failures are
//! recorded before the error is returned, successes after the mutation
//! commits.
//!
//! # Thread safety
//!
//! Accounts live in a [`DashMap`]-backed store and each carries its own
//! mutex, so operations on different accounts run in parallel while
//! operations on one account are serialized.
//!
//! [`DashMap`]: dashmap::DashMap

use crate::account::Account;
use crate::audit::{
    AuditEntry, AuditLog, AuditOutcome, Clock, LogAudit, LogNotifier, Notifier, OperationKind,
    SystemClock,
};
use crate::base::Pin;
use crate::error::{AuthError, OperationError, ValidationError};
use crate::store::AccountStore;
use crate::transaction::{Receipt, Transaction};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

/// Operation limits and thresholds.
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// Per-withdrawal ceiling.
    pub withdrawal_limit: Decimal,
    /// Per-deposit ceiling.
    pub deposit_limit: Decimal,
    /// A withdrawal leaving the balance under this fires a notification.
    pub low_balance_threshold: Decimal,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            withdrawal_limit: dec!(500),
            deposit_limit: dec!(5000),
            low_balance_threshold: dec!(100),
        }
    }
}

/// Opaque handle binding operations to one authenticated account.
///
/// Holds only the PIN binding; the engine re-resolves the account and
/// re-checks the lock flag on every operation, since lock state can change
/// between calls. There is no expiry in the core; timeouts belong to the
/// transport shell.
#[derive(Debug)]
pub struct Session {
    pin: Pin,
}

impl Session {
    /// The PIN this session is currently bound to.
    ///
    /// Rebound in place by [`Engine::change_pin`].
    pub fn pin(&self) -> &Pin {
        &self.pin
    }
}

/// Teller operation engine over an explicitly constructed account store.
pub struct Engine {
    store: AccountStore,
    config: EngineConfig,
    audit: Arc<dyn AuditLog>,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn Notifier>,
}

impl Engine {
    /// Creates an engine with an empty store, default limits, and the
    /// `log`-facade audit sink and notifier.
    pub fn new() -> Self {
        Self::with_parts(
            AccountStore::new(),
            EngineConfig::default(),
            Arc::new(LogAudit),
            Arc::new(SystemClock),
            Arc::new(LogNotifier),
        )
    }

    /// Creates an engine from explicitly injected parts.
    pub fn with_parts(
        store: AccountStore,
        config: EngineConfig,
        audit: Arc<dyn AuditLog>,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            config,
            audit,
            clock,
            notifier,
        }
    }

    /// Opens an account under `pin` with its own credential.
    ///
    /// Replaces any account already under that key, like a fresh card issue.
    pub fn open_account(&self, pin: Pin, credential: impl Into<String>, opening_balance: Decimal) {
        self.store
            .put(pin.clone(), Account::new(pin, credential, opening_balance));
    }

    pub fn store(&self) -> &AccountStore {
        &self.store
    }

    /// Authenticates a PIN/credential pair and grants a session.
    ///
    /// State machine per account: three consecutive failures lock the card;
    /// a locked card rejects every attempt, correct credential included,
    /// until [`Engine::unlock`]. A success resets the failure counter.
    ///
    /// # Errors
    ///
    /// - [`AuthError::InvalidCredential`] - unknown PIN (attempts = 0, nothing
    ///   mutated) or wrong credential (attempts = counter after this try).
    /// - [`AuthError::AccountLockedJustNow`] - this failure was the third.
    /// - [`AuthError::AccountLocked`] - card was already locked.
    pub fn authenticate(&self, pin_text: &str, credential: &str) -> Result<Session, AuthError> {
        let Ok(pin) = Pin::parse(pin_text) else {
            self.audit(pin_text, OperationKind::Login, None, AuditOutcome::Rejected, "unknown PIN");
            return Err(AuthError::InvalidCredential { attempts: 0 });
        };
        let Some(account) = self.store.lookup(&pin) else {
            self.audit(pin_text, OperationKind::Login, None, AuditOutcome::Rejected, "unknown PIN");
            return Err(AuthError::InvalidCredential { attempts: 0 });
        };

        match account.authenticate(credential) {
            Ok(()) => {
                drop(account);
                self.audit(
                    pin.as_str(),
                    OperationKind::Login,
                    None,
                    AuditOutcome::Ok,
                    "session granted",
                );
                Ok(Session { pin })
            }
            Err(err) => {
                drop(account);
                if err == AuthError::AccountLockedJustNow {
                    self.notifier.card_locked(&pin);
                }
                self.audit(
                    pin.as_str(),
                    OperationKind::Login,
                    None,
                    AuditOutcome::Rejected,
                    err.to_string(),
                );
                Err(err)
            }
        }
    }

    /// Withdraws a whole-unit amount parsed from raw text.
    ///
    /// Validation order is fixed: format, positivity, multiple-of-10,
    /// sufficient funds, then the per-operation limit
    /// ([`EngineConfig::withdrawal_limit`]). The balance check and the
    /// mutation are atomic under the account mutex, so concurrent
    /// withdrawals cannot overdraw.
    pub fn withdraw(
        &self,
        session: &Session,
        amount_text: &str,
    ) -> Result<Receipt, OperationError> {
        let Some(account) = self.store.lookup(&session.pin) else {
            return Err(self.reject(session, OperationKind::Withdrawal, amount_text, OperationError::UnknownAccount));
        };

        match account.withdraw(amount_text, self.config.withdrawal_limit, self.clock.now()) {
            Ok(receipt) => {
                drop(account);
                self.audit(
                    session.pin.as_str(),
                    OperationKind::Withdrawal,
                    Some(amount_text),
                    AuditOutcome::Ok,
                    format!("withdrew {}, balance {}", receipt.amount, receipt.new_balance),
                );
                if receipt.new_balance < self.config.low_balance_threshold {
                    self.notifier.low_balance(&session.pin, receipt.new_balance);
                }
                Ok(receipt)
            }
            Err(err) => {
                drop(account);
                Err(self.reject(session, OperationKind::Withdrawal, amount_text, err))
            }
        }
    }

    /// Deposits a whole-unit amount parsed from raw text.
    ///
    /// Same validation as [`Engine::withdraw`] minus the denomination and
    /// funds checks; the ceiling is [`EngineConfig::deposit_limit`].
    pub fn deposit(&self, session: &Session, amount_text: &str) -> Result<Receipt, OperationError> {
        let Some(account) = self.store.lookup(&session.pin) else {
            return Err(self.reject(session, OperationKind::Deposit, amount_text, OperationError::UnknownAccount));
        };

        match account.deposit(amount_text, self.config.deposit_limit, self.clock.now()) {
            Ok(receipt) => {
                drop(account);
                self.audit(
                    session.pin.as_str(),
                    OperationKind::Deposit,
                    Some(amount_text),
                    AuditOutcome::Ok,
                    format!("deposited {}, balance {}", receipt.amount, receipt.new_balance),
                );
                Ok(receipt)
            }
            Err(err) => {
                drop(account);
                Err(self.reject(session, OperationKind::Deposit, amount_text, err))
            }
        }
    }

    /// Moves the account to a new PIN and rebinds the session.
    ///
    /// The new PIN must be exactly four digits and becomes the account's
    /// credential as well. If an account already lives under the new PIN,
    /// the destination account wins and the old record is discarded;
    /// subsequent operations act on the pre-existing account's state.
    pub fn change_pin(
        &self,
        session: &mut Session,
        new_pin_text: &str,
    ) -> Result<(), ValidationError> {
        let new_pin = match Pin::parse(new_pin_text) {
            Ok(pin) => pin,
            Err(err) => {
                self.audit(
                    session.pin.as_str(),
                    OperationKind::PinChange,
                    None,
                    AuditOutcome::Rejected,
                    err.to_string(),
                );
                return Err(err);
            }
        };

        {
            let Some(account) = self.store.lookup(&session.pin) else {
                self.audit(
                    session.pin.as_str(),
                    OperationKind::PinChange,
                    None,
                    AuditOutcome::Rejected,
                    ValidationError::UnknownAccount.to_string(),
                );
                return Err(ValidationError::UnknownAccount);
            };
            if account.locked() {
                drop(account);
                self.audit(
                    session.pin.as_str(),
                    OperationKind::PinChange,
                    None,
                    AuditOutcome::Rejected,
                    ValidationError::AccountLocked.to_string(),
                );
                return Err(ValidationError::AccountLocked);
            }
            // The map ref must be released before relocate removes the entry.
        }

        if !self.store.relocate(&session.pin, new_pin.clone()) {
            self.audit(
                session.pin.as_str(),
                OperationKind::PinChange,
                None,
                AuditOutcome::Rejected,
                ValidationError::UnknownAccount.to_string(),
            );
            return Err(ValidationError::UnknownAccount);
        }

        let old_pin = std::mem::replace(&mut session.pin, new_pin);
        self.audit(
            old_pin.as_str(),
            OperationKind::PinChange,
            None,
            AuditOutcome::Ok,
            format!("rebound to {}", session.pin),
        );
        Ok(())
    }

    /// Full transaction log of the session's account, insertion order.
    ///
    /// Read-only; a locked account can still be read.
    pub fn history(&self, session: &Session) -> Result<Vec<Transaction>, OperationError> {
        let account = self
            .store
            .lookup(&session.pin)
            .ok_or(OperationError::UnknownAccount)?;
        Ok(account.history())
    }

    /// Current balance of the session's account.
    pub fn balance(&self, session: &Session) -> Result<Decimal, OperationError> {
        let account = self
            .store
            .lookup(&session.pin)
            .ok_or(OperationError::UnknownAccount)?;
        Ok(account.balance())
    }

    /// Administrative unlock: clears the lock flag and the attempt counter.
    ///
    /// Returns `false` if no account lives under `pin`.
    pub fn unlock(&self, pin: &Pin) -> bool {
        let Some(account) = self.store.lookup(pin) else {
            return false;
        };
        account.unlock();
        drop(account);
        self.audit(
            pin.as_str(),
            OperationKind::Unlock,
            None,
            AuditOutcome::Ok,
            "card unlocked",
        );
        true
    }

    fn reject(
        &self,
        session: &Session,
        operation: OperationKind,
        amount_text: &str,
        err: OperationError,
    ) -> OperationError {
        self.audit(
            session.pin.as_str(),
            operation,
            Some(amount_text),
            AuditOutcome::Rejected,
            err.to_string(),
        );
        err
    }

    fn audit(
        &self,
        actor: &str,
        operation: OperationKind,
        amount: Option<&str>,
        outcome: AuditOutcome,
        detail: impl Into<String>,
    ) {
        self.audit.record(AuditEntry {
            actor: actor.to_owned(),
            operation,
            amount: amount.map(str::to_owned),
            outcome,
            detail: detail.into(),
        });
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
