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

//! Account state and the authentication/transfer state machine.
//!
//! Authentication state machine per account:
//!
//  Active ──success──► Active (failed_attempts = 0, session granted)
//  Active ──failure──► Active (failed_attempts < 3)
//  Active ──failure──► Locked (failed_attempts reaches 3)
//  Locked ──anything──► Locked (until an explicit unlock)
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use teller_demo_rs::{Account, Pin};
//!
//! let account = Account::new(Pin::parse("1234").unwrap(), "1234", dec!(1000.00));
//! assert_eq!(account.balance(), dec!(1000.00));
//! ```

use crate::base::Pin;
use crate::error::{AuthError, OperationError};
use crate::transaction::{Receipt, Transaction, TransactionKind};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::ser::{Serialize, SerializeStruct, Serializer};

/// Consecutive failed logins before the card locks.
pub const MAX_FAILED_ATTEMPTS: u8 = 3;

/// Parses raw amount text into whole currency units.
///
/// Digits-only, no sign, no separators; the terminal accepts whole units.
/// Order matters for user messaging: format is checked before positivity.
fn parse_amount(raw: &str) -> Result<u64, OperationError> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(OperationError::InvalidAmountFormat);
    }
    let units: u64 = raw
        .parse()
        .map_err(|_| OperationError::InvalidAmountFormat)?;
    if units == 0 {
        return Err(OperationError::NonPositiveAmount);
    }
    Ok(units)
}

#[derive(Debug)]
struct AccountData {
    pin: Pin,
    credential: String,
    balance: Decimal,
    history: Vec<Transaction>,
    failed_attempts: u8,
    locked: bool,
}

impl AccountData {
    fn new(pin: Pin, credential: String, opening_balance: Decimal) -> Self {
        Self {
            pin,
            credential,
            balance: opening_balance,
            history: Vec::new(),
            failed_attempts: 0,
            locked: false,
        }
    }

    fn assert_invariants(&self) {
        debug_assert!(
            self.balance >= Decimal::ZERO,
            "Invariant violated: balance went negative: {}",
            self.balance
        );
        debug_assert!(
            self.failed_attempts <= MAX_FAILED_ATTEMPTS,
            "Invariant violated: failed_attempts out of range: {}",
            self.failed_attempts
        );
    }

    /// Runs one authentication attempt against the stored credential.
    fn verify(&mut self, supplied: &str) -> Result<(), AuthError> {
        if self.locked {
            // Locked absorbs everything, correct credential included.
            return Err(AuthError::AccountLocked);
        }
        if supplied == self.credential {
            self.failed_attempts = 0;
            self.assert_invariants();
            return Ok(());
        }
        self.failed_attempts += 1;
        self.assert_invariants();
        if self.failed_attempts >= MAX_FAILED_ATTEMPTS {
            self.locked = true;
            Err(AuthError::AccountLockedJustNow)
        } else {
            Err(AuthError::InvalidCredential {
                attempts: self.failed_attempts,
            })
        }
    }

    /// Validates and applies a withdrawal.
    ///
    /// Validation order is part of the contract: format, positivity,
    /// denomination, funds, then limit.
    fn withdraw(
        &mut self,
        raw_amount: &str,
        limit: Decimal,
        now: DateTime<Utc>,
    ) -> Result<Receipt, OperationError> {
        if self.locked {
            return Err(OperationError::AccountLocked);
        }
        let units = parse_amount(raw_amount)?;
        if units % 10 != 0 {
            return Err(OperationError::InvalidDenomination);
        }
        let amount = Decimal::from(units);
        if amount > self.balance {
            return Err(OperationError::InsufficientFunds);
        }
        if amount > limit {
            return Err(OperationError::LimitExceeded { limit });
        }
        self.balance -= amount;
        self.history
            .push(Transaction::new(TransactionKind::Withdrawal, amount, now));
        self.assert_invariants();
        Ok(Receipt {
            amount,
            new_balance: self.balance,
            timestamp: now,
        })
    }

    /// Validates and applies a deposit. No denomination constraint.
    fn deposit(
        &mut self,
        raw_amount: &str,
        limit: Decimal,
        now: DateTime<Utc>,
    ) -> Result<Receipt, OperationError> {
        if self.locked {
            return Err(OperationError::AccountLocked);
        }
        let units = parse_amount(raw_amount)?;
        let amount = Decimal::from(units);
        if amount > limit {
            return Err(OperationError::LimitExceeded { limit });
        }
        self.balance += amount;
        self.history
            .push(Transaction::new(TransactionKind::Deposit, amount, now));
        self.assert_invariants();
        Ok(Receipt {
            amount,
            new_balance: self.balance,
            timestamp: now,
        })
    }
}

/// A teller account guarded by its own mutex.
///
/// The mutex makes authenticate/withdraw/deposit on the same account
/// mutually exclusive, so the balance check and the mutation that follows it
/// are one atomic step. The history append happens under the same guard as
/// the balance change; no partial mutation is ever observable.
#[derive(Debug)]
pub struct Account {
    inner: Mutex<AccountData>,
}

impl Account {
    const DECIMAL_PRECISION: u32 = 2;

    pub fn new(pin: Pin, credential: impl Into<String>, opening_balance: Decimal) -> Self {
        Self {
            inner: Mutex::new(AccountData::new(pin, credential.into(), opening_balance)),
        }
    }

    pub fn balance(&self) -> Decimal {
        self.inner.lock().balance
    }

    pub fn locked(&self) -> bool {
        self.inner.lock().locked
    }

    pub fn failed_attempts(&self) -> u8 {
        self.inner.lock().failed_attempts
    }

    /// Current key the account lives under.
    pub fn pin(&self) -> Pin {
        self.inner.lock().pin.clone()
    }

    /// Snapshot of the full transaction log, insertion order.
    pub fn history(&self) -> Vec<Transaction> {
        self.inner.lock().history.clone()
    }

    /// One authentication attempt. See the state machine above.
    pub fn authenticate(&self, supplied: &str) -> Result<(), AuthError> {
        self.inner.lock().verify(supplied)
    }

    pub fn withdraw(
        &self,
        raw_amount: &str,
        limit: Decimal,
        now: DateTime<Utc>,
    ) -> Result<Receipt, OperationError> {
        self.inner.lock().withdraw(raw_amount, limit, now)
    }

    pub fn deposit(
        &self,
        raw_amount: &str,
        limit: Decimal,
        now: DateTime<Utc>,
    ) -> Result<Receipt, OperationError> {
        self.inner.lock().deposit(raw_amount, limit, now)
    }

    /// Rebinds the account to a new PIN, which also becomes its credential.
    pub(crate) fn rebind(&self, new_pin: Pin) {
        let mut data = self.inner.lock();
        data.credential = new_pin.as_str().to_owned();
        data.pin = new_pin;
    }

    /// Administrative reset: clears the lock flag and the attempt counter.
    pub fn unlock(&self) {
        let mut data = self.inner.lock();
        data.locked = false;
        data.failed_attempts = 0;
        data.assert_invariants();
    }
}

impl Serialize for Account {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let data = self.inner.lock();
        let mut state = serializer.serialize_struct("Account", 4)?;
        state.serialize_field("pin", &data.pin)?;
        state.serialize_field("balance", &data.balance.round_dp(Account::DECIMAL_PRECISION))?;
        state.serialize_field("failed_attempts", &data.failed_attempts)?;
        state.serialize_field("locked", &data.locked)?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn pin() -> Pin {
        Pin::parse("1234").unwrap()
    }

    fn fresh(balance: Decimal) -> AccountData {
        AccountData::new(pin(), "1234".to_owned(), balance)
    }

    const EPOCH: DateTime<Utc> = DateTime::UNIX_EPOCH;

    // === parse_amount ===

    #[test]
    fn parse_amount_accepts_digits() {
        assert_eq!(parse_amount("50"), Ok(50));
        assert_eq!(parse_amount("0050"), Ok(50));
    }

    #[test]
    fn parse_amount_rejects_format_before_positivity() {
        assert_eq!(parse_amount(""), Err(OperationError::InvalidAmountFormat));
        assert_eq!(parse_amount("-10"), Err(OperationError::InvalidAmountFormat));
        assert_eq!(parse_amount("1.5"), Err(OperationError::InvalidAmountFormat));
        assert_eq!(parse_amount("abc"), Err(OperationError::InvalidAmountFormat));
        assert_eq!(parse_amount("10 "), Err(OperationError::InvalidAmountFormat));
        assert_eq!(parse_amount("0"), Err(OperationError::NonPositiveAmount));
        assert_eq!(parse_amount("000"), Err(OperationError::NonPositiveAmount));
    }

    // === AccountData Internal Tests ===

    #[test]
    fn verify_success_resets_counter() {
        let mut data = fresh(dec!(100.00));
        assert!(data.verify("9999").is_err());
        assert_eq!(data.failed_attempts, 1);
        data.verify("1234").unwrap();
        assert_eq!(data.failed_attempts, 0);
        assert!(!data.locked);
    }

    #[test]
    fn third_failure_locks() {
        let mut data = fresh(dec!(100.00));
        assert_eq!(
            data.verify("0000"),
            Err(AuthError::InvalidCredential { attempts: 1 })
        );
        assert_eq!(
            data.verify("0000"),
            Err(AuthError::InvalidCredential { attempts: 2 })
        );
        assert_eq!(data.verify("0000"), Err(AuthError::AccountLockedJustNow));
        assert!(data.locked);
    }

    #[test]
    fn locked_rejects_correct_credential_without_counting() {
        let mut data = fresh(dec!(100.00));
        for _ in 0..3 {
            let _ = data.verify("0000");
        }
        assert_eq!(data.verify("1234"), Err(AuthError::AccountLocked));
        assert_eq!(data.failed_attempts, MAX_FAILED_ATTEMPTS);
    }

    #[test]
    fn withdraw_decrements_and_records() {
        let mut data = fresh(dec!(100.00));
        let receipt = data.withdraw("30", dec!(500), EPOCH).unwrap();
        assert_eq!(receipt.amount, dec!(30));
        assert_eq!(receipt.new_balance, dec!(70.00));
        assert_eq!(data.history.len(), 1);
        assert_eq!(data.history[0].kind, TransactionKind::Withdrawal);
    }

    #[test]
    fn withdraw_validation_order() {
        let mut data = fresh(dec!(45.00));
        // Format before positivity.
        assert_eq!(
            data.withdraw("x", dec!(500), EPOCH),
            Err(OperationError::InvalidAmountFormat)
        );
        // Positivity before denomination ("0" is a multiple of 10).
        assert_eq!(
            data.withdraw("0", dec!(500), EPOCH),
            Err(OperationError::NonPositiveAmount)
        );
        // Denomination before funds (55 > 45 but not a multiple of 10).
        assert_eq!(
            data.withdraw("55", dec!(500), EPOCH),
            Err(OperationError::InvalidDenomination)
        );
        // Funds before limit (600 exceeds both the balance and the limit).
        assert_eq!(
            data.withdraw("600", dec!(500), EPOCH),
            Err(OperationError::InsufficientFunds)
        );
        // Nothing was recorded along the way.
        assert!(data.history.is_empty());
        assert_eq!(data.balance, dec!(45.00));
    }

    #[test]
    fn withdraw_over_limit_rejected() {
        let mut data = fresh(dec!(1000.00));
        assert_eq!(
            data.withdraw("510", dec!(500), EPOCH),
            Err(OperationError::LimitExceeded { limit: dec!(500) })
        );
        assert_eq!(data.withdraw("500", dec!(500), EPOCH).unwrap().new_balance, dec!(500.00));
    }

    #[test]
    fn deposit_has_no_denomination_rule() {
        let mut data = fresh(dec!(0.00));
        let receipt = data.deposit("55", dec!(5000), EPOCH).unwrap();
        assert_eq!(receipt.new_balance, dec!(55));
        assert_eq!(data.history[0].kind, TransactionKind::Deposit);
    }

    #[test]
    fn deposit_over_limit_rejected() {
        let mut data = fresh(dec!(0.00));
        assert_eq!(
            data.deposit("5001", dec!(5000), EPOCH),
            Err(OperationError::LimitExceeded { limit: dec!(5000) })
        );
        data.deposit("5000", dec!(5000), EPOCH).unwrap();
        assert_eq!(data.balance, dec!(5000.00));
    }

    #[test]
    fn locked_account_rejects_transfers() {
        let mut data = fresh(dec!(100.00));
        data.locked = true;
        assert_eq!(
            data.withdraw("10", dec!(500), EPOCH),
            Err(OperationError::AccountLocked)
        );
        assert_eq!(
            data.deposit("10", dec!(5000), EPOCH),
            Err(OperationError::AccountLocked)
        );
        assert!(data.history.is_empty());
    }

    // === Account (public wrapper) Tests ===

    #[test]
    fn unlock_resets_state() {
        let account = Account::new(pin(), "1234", dec!(100.00));
        for _ in 0..3 {
            let _ = account.authenticate("0000");
        }
        assert!(account.locked());
        account.unlock();
        assert!(!account.locked());
        assert_eq!(account.failed_attempts(), 0);
        account.authenticate("1234").unwrap();
    }

    #[test]
    fn rebind_changes_pin_and_credential() {
        let account = Account::new(pin(), "1234", dec!(100.00));
        account.rebind(Pin::parse("5678").unwrap());
        assert_eq!(account.pin().as_str(), "5678");
        assert!(account.authenticate("1234").is_err());
        account.authenticate("5678").unwrap();
    }

    // === Serialization Tests ===

    #[test]
    fn serializer_rounds_to_two_decimal_places() {
        let account = Account::new(pin(), "1234", dec!(123.456));

        let json = serde_json::to_string(&account).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed["pin"], "1234");
        assert_eq!(parsed["balance"].as_str().unwrap(), "123.46");
        assert_eq!(parsed["failed_attempts"], 0);
        assert_eq!(parsed["locked"], false);
    }

    #[test]
    fn serializer_handles_whole_numbers() {
        let account = Account::new(pin(), "1234", dec!(1000));
        let json = serde_json::to_string(&account).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["balance"].as_str().unwrap(), "1000");
    }
}
