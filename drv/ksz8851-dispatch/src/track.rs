// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-ethertype traffic statistics (§4.F "Tracking"). A small
//! `fixedmap::FixedMap` keyed by ethertype, the same fixed-capacity
//! table idiom the data model names for the multicast address list.

use crate::limits::MAX_TRACK;
use fixedmap::FixedMap;
use ksz8851_api::Error;

/// IEEE 802.3 ethertype for IP, kept as a fast-path reference per §4.F
/// ("the 0x0800 entry is kept as a direct pointer for fast reference").
/// `FixedMap` has no notion of a pointer into its storage, so the
/// "direct pointer" is modeled as skipping the scan via a cached flag
/// instead: `note_frame` special-cases this type before falling through
/// to the general lookup.
pub const ETHERTYPE_IP: u16 = 0x0800;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct TrackCounts {
    pub frames: u32,
    pub bytes: u64,
}

#[derive(Default)]
pub struct TrackList {
    entries: FixedMap<u16, TrackCounts, MAX_TRACK>,
    ip_tracked: bool,
    ip_counts: TrackCounts,
}

impl TrackList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&mut self, ethertype: u16) -> Result<(), Error> {
        if self.is_tracked(ethertype) {
            return Err(Error::AlreadyTracked);
        }
        if ethertype == ETHERTYPE_IP {
            self.ip_tracked = true;
            self.ip_counts = TrackCounts::default();
        } else {
            self.entries.insert(ethertype, TrackCounts::default());
        }
        Ok(())
    }

    pub fn untrack(&mut self, ethertype: u16) -> Result<(), Error> {
        if !self.is_tracked(ethertype) {
            return Err(Error::NotTracked);
        }
        if ethertype == ETHERTYPE_IP {
            self.ip_tracked = false;
        } else {
            self.entries.remove(ethertype);
        }
        Ok(())
    }

    pub fn is_tracked(&self, ethertype: u16) -> bool {
        if ethertype == ETHERTYPE_IP {
            self.ip_tracked
        } else {
            self.entries.get(ethertype).is_some()
        }
    }

    /// Accounts a frame of `ethertype`/`len` bytes if that type is
    /// tracked; a no-op otherwise.
    pub fn note_frame(&mut self, ethertype: u16, len: usize) {
        if ethertype == ETHERTYPE_IP {
            if self.ip_tracked {
                self.ip_counts.frames += 1;
                self.ip_counts.bytes += len as u64;
            }
            return;
        }
        if let Some(mut counts) = self.entries.get(ethertype) {
            counts.frames += 1;
            counts.bytes += len as u64;
            self.entries.insert(ethertype, counts);
        }
    }

    pub fn counts(&self, ethertype: u16) -> Option<TrackCounts> {
        if ethertype == ETHERTYPE_IP {
            self.ip_tracked.then_some(self.ip_counts)
        } else {
            self.entries.get(ethertype)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracking_an_already_tracked_type_is_rejected() {
        let mut t = TrackList::new();
        assert!(t.track(0x88A4).is_ok());
        assert_eq!(t.track(0x88A4), Err(Error::AlreadyTracked));
    }

    #[test]
    fn untracking_a_missing_type_is_rejected() {
        let mut t = TrackList::new();
        assert_eq!(t.untrack(0x88A4), Err(Error::NotTracked));
    }

    #[test]
    fn ip_entry_uses_the_fast_path() {
        let mut t = TrackList::new();
        t.track(ETHERTYPE_IP).unwrap();
        t.note_frame(ETHERTYPE_IP, 100);
        t.note_frame(ETHERTYPE_IP, 50);
        assert_eq!(
            t.counts(ETHERTYPE_IP),
            Some(TrackCounts {
                frames: 2,
                bytes: 150
            })
        );
    }

    #[test]
    fn untracked_frames_are_not_counted() {
        let mut t = TrackList::new();
        t.note_frame(0x0806, 64);
        assert_eq!(t.counts(0x0806), None);
    }
}
