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

//! In-memory account store.
//!
//! Maps PINs to accounts. The store is only a concurrent map; per-account
//! serialization lives in [`Account`]'s own mutex, so operations on
//! different accounts never contend here beyond shard locking.

use crate::account::Account;
use crate::base::Pin;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

/// Concurrent PIN-to-account map. Process-lifetime only; nothing persists.
#[derive(Debug, Default)]
pub struct AccountStore {
    accounts: DashMap<Pin, Account>,
}

impl AccountStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
        }
    }

    /// Returns the account under `pin`, or `None`. No side effects.
    pub fn lookup(&self, pin: &Pin) -> Option<dashmap::mapref::one::Ref<'_, Pin, Account>> {
        self.accounts.get(pin)
    }

    /// Inserts or replaces the account under `pin`.
    pub fn put(&self, pin: Pin, account: Account) {
        self.accounts.insert(pin, account);
    }

    /// Removes and returns the account under `pin`.
    pub fn remove(&self, pin: &Pin) -> Option<Account> {
        self.accounts.remove(pin).map(|(_, account)| account)
    }

    pub fn contains(&self, pin: &Pin) -> bool {
        self.accounts.contains_key(pin)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Moves the account under `old` to the key `new`.
    ///
    /// If `new` is already occupied, the existing account at the destination
    /// wins and the relocated record is dropped: subsequent operations under
    /// `new` act on the pre-existing account's state. (Inherited merge
    /// behavior; arguably a latent bug in the original, preserved here.)
    ///
    /// Returns `false` if no account lives under `old`. Never holds two
    /// entries at once, so it cannot deadlock against per-account locks.
    pub fn relocate(&self, old: &Pin, new: Pin) -> bool {
        let Some(account) = self.remove(old) else {
            return false;
        };
        match self.accounts.entry(new.clone()) {
            Entry::Occupied(_) => {}
            Entry::Vacant(entry) => {
                account.rebind(new);
                entry.insert(account);
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn pin(s: &str) -> Pin {
        Pin::parse(s).unwrap()
    }

    #[test]
    fn put_lookup_remove_roundtrip() {
        let store = AccountStore::new();
        store.put(pin("1234"), Account::new(pin("1234"), "1234", dec!(100)));
        assert!(store.contains(&pin("1234")));
        assert_eq!(store.lookup(&pin("1234")).unwrap().balance(), dec!(100));
        assert!(store.remove(&pin("1234")).is_some());
        assert!(store.is_empty());
    }

    #[test]
    fn relocate_moves_account_to_vacant_key() {
        let store = AccountStore::new();
        store.put(pin("1234"), Account::new(pin("1234"), "1234", dec!(250)));

        assert!(store.relocate(&pin("1234"), pin("5678")));
        assert!(!store.contains(&pin("1234")));

        let moved = store.lookup(&pin("5678")).unwrap();
        assert_eq!(moved.balance(), dec!(250));
        assert_eq!(moved.pin().as_str(), "5678");
    }

    #[test]
    fn relocate_into_occupied_key_keeps_destination() {
        let store = AccountStore::new();
        store.put(pin("1111"), Account::new(pin("1111"), "1111", dec!(10)));
        store.put(pin("2222"), Account::new(pin("2222"), "2222", dec!(99)));

        assert!(store.relocate(&pin("1111"), pin("2222")));

        // The pre-existing destination account survives, the moved one is gone.
        assert!(!store.contains(&pin("1111")));
        assert_eq!(store.lookup(&pin("2222")).unwrap().balance(), dec!(99));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn relocate_missing_source_is_noop() {
        let store = AccountStore::new();
        assert!(!store.relocate(&pin("0000"), pin("1111")));
        assert!(store.is_empty());
    }
}
