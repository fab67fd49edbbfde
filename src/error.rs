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

//! Error types for the teller engine.
//!
//! All errors are recoverable at the caller boundary; none are fatal to the
//! process. Every failure path is audited before the error is returned.

use rust_decimal::Decimal;
use thiserror::Error;

/// Authentication failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Unknown PIN or wrong credential.
    ///
    /// `attempts` carries the account's failed-attempt counter after this
    /// attempt, for user messaging ("attempt N of 3"). It is zero when the
    /// PIN matched no account at all (nothing was mutated).
    #[error("invalid credential (attempt {attempts} of 3)")]
    InvalidCredential { attempts: u8 },

    /// Account was already locked before this attempt.
    #[error("card locked after too many failed attempts")]
    AccountLocked,

    /// This attempt was the third failure and locked the account.
    #[error("card locked: too many failed attempts")]
    AccountLockedJustNow,
}

/// Withdrawal and deposit failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OperationError {
    /// Amount input was empty or not all digits.
    #[error("invalid amount (whole numbers only)")]
    InvalidAmountFormat,

    /// Amount parsed to zero.
    #[error("amount must be positive")]
    NonPositiveAmount,

    /// Withdrawal amount is not a multiple of 10.
    #[error("amount must be a multiple of 10")]
    InvalidDenomination,

    /// Withdrawal would exceed the available balance.
    #[error("insufficient funds")]
    InsufficientFunds,

    /// Amount exceeds the per-operation ceiling.
    #[error("per-operation limit is {limit}")]
    LimitExceeded { limit: Decimal },

    /// Session resolves to a locked account.
    #[error("account is locked")]
    AccountLocked,

    /// Session no longer resolves to any account.
    #[error("unknown account")]
    UnknownAccount,
}

/// PIN-change failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// New PIN is not exactly four numeric digits.
    #[error("PIN must be exactly 4 digits")]
    InvalidPinFormat,

    /// Session resolves to a locked account.
    #[error("account is locked")]
    AccountLocked,

    /// Session no longer resolves to any account.
    #[error("unknown account")]
    UnknownAccount,
}
