// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The unit-wide multicast address list (§3 `Interface`: "fixed
//! capacity N=10"), and recomputation of the chip's 64-entry hash table
//! from it (§4.B).
//!
//! `fixedmap::FixedMap` is the natural fit (same fixed-capacity,
//! `Copy`-keyed shape as the track list) but doesn't expose iteration,
//! which hash-table recomputation needs; this list uses the same
//! "scan an array of `Option` slots" idiom directly instead.

use crate::limits::MAX_MCAST;
use ksz8851_core::hash::build_hash_table;

#[derive(Default)]
pub struct McastList {
    addrs: [Option<[u8; 6]>; MAX_MCAST],
    count: usize,
}

impl McastList {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, mac: [u8; 6]) -> Option<usize> {
        self.addrs.iter().position(|slot| *slot == Some(mac))
    }

    /// Adds `mac` to the list, returning `false` if the list is already
    /// at capacity (the caller should report `NoResources`).
    pub fn add(&mut self, mac: [u8; 6]) -> bool {
        if self.position(mac).is_some() {
            return true;
        }
        let Some(slot) = self.addrs.iter().position(|slot| slot.is_none()) else {
            return false;
        };
        self.addrs[slot] = Some(mac);
        self.count += 1;
        true
    }

    pub fn remove(&mut self, mac: [u8; 6]) {
        if let Some(slot) = self.position(mac) {
            self.addrs[slot] = None;
            self.count -= 1;
        }
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Folds the current list into the four 16-bit hash registers
    /// (§4.B). Promiscuous mode is handled by the caller, which skips
    /// straight to an all-ones table rather than consulting this list.
    pub fn hash_table(&self) -> [u16; 4] {
        build_hash_table(self.addrs.iter().filter_map(|slot| slot.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_is_idempotent() {
        let mut l = McastList::new();
        assert!(l.add([1; 6]));
        assert!(l.add([1; 6]));
        assert_eq!(l.len(), 1);
    }

    #[test]
    fn rejects_beyond_capacity() {
        let mut l = McastList::new();
        for i in 0..MAX_MCAST as u8 {
            assert!(l.add([i; 6]));
        }
        assert!(!l.add([0xFF; 6]));
        assert_eq!(l.len(), MAX_MCAST);
    }

    #[test]
    fn hash_table_reflects_current_membership() {
        let mut l = McastList::new();
        l.add([0x01, 0x00, 0x5e, 0x00, 0x00, 0x01]);
        let with_one = l.hash_table();
        l.remove([0x01, 0x00, 0x5e, 0x00, 0x00, 0x01]);
        let empty = l.hash_table();
        assert_ne!(with_one, empty);
        assert_eq!(empty, [0u16; 4]);
    }
}
