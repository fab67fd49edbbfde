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

//! Core identifier type for accounts.

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Account identifier: a four-digit PIN.
///
/// The demo conflates credential and identifier: the PIN is both the key an
/// account lives under in the store and the default secret it is seeded with.
/// The credential itself is stored per account (see `AccountData`), so the
/// two can diverge after an account is opened.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Pin(String);

impl Pin {
    /// Parses a PIN from raw text. Must be exactly four ASCII digits.
    pub fn parse(text: &str) -> Result<Self, ValidationError> {
        if text.len() == 4 && text.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Pin(text.to_owned()))
        } else {
            Err(ValidationError::InvalidPinFormat)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
