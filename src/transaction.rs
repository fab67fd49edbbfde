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

//! Transaction records and receipts.
//!
//! A [`Transaction`] is only ever created for a transfer that committed.
//! Failed attempts are audited but never enter an account's history, so the
//! `outcome` field of a recorded transaction is always [`Outcome::Success`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Kind of balance-mutating operation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TransactionKind {
    Withdrawal,
    Deposit,
}

/// Outcome tag on a recorded transaction.
///
/// Only `Success` entries are appended to history; the variant exists so the
/// record mirrors the audit tuple shape.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Outcome {
    Success,
}

/// One committed entry in an account's history. Append-only, never modified.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Transaction {
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub timestamp: DateTime<Utc>,
    pub outcome: Outcome,
}

impl Transaction {
    pub fn new(kind: TransactionKind, amount: Decimal, timestamp: DateTime<Utc>) -> Self {
        Self {
            kind,
            amount,
            timestamp,
            outcome: Outcome::Success,
        }
    }
}

/// Return value describing a completed transfer.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Receipt {
    pub amount: Decimal,
    pub new_balance: Decimal,
    pub timestamp: DateTime<Utc>,
}
