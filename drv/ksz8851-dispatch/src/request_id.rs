// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Packs "which queue, and which slot in it" into the single opaque
//! `u32` that `ksz8851_api::RequestId` hands back to callers, so
//! caller-issued abort (§5 "locates the request in whichever queue it
//! occupies") doesn't need to linearly probe every queue with every
//! possible interpretation of the handle.

use crate::queue::Handle;
use ksz8851_api::RequestId;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Locus {
    ClientRead(u8),
    Orphan,
    Write,
    Event,
}

const KIND_CLIENT_READ: u32 = 0;
const KIND_ORPHAN: u32 = 1;
const KIND_WRITE: u32 = 2;
const KIND_EVENT: u32 = 3;

pub fn encode(locus: Locus, handle: Handle) -> RequestId {
    let raw = handle.into_raw() as u32;
    let id = match locus {
        Locus::ClientRead(client) => (KIND_CLIENT_READ << 30) | ((client as u32) << 16) | raw,
        Locus::Orphan => (KIND_ORPHAN << 30) | raw,
        Locus::Write => (KIND_WRITE << 30) | raw,
        Locus::Event => (KIND_EVENT << 30) | raw,
    };
    RequestId(id)
}

pub fn decode(id: RequestId) -> (Locus, Handle) {
    let raw = id.0;
    let handle = Handle::from_raw((raw & 0xFFFF) as u16);
    let locus = match raw >> 30 {
        KIND_ORPHAN => Locus::Orphan,
        KIND_WRITE => Locus::Write,
        KIND_EVENT => Locus::Event,
        _ => Locus::ClientRead(((raw >> 16) & 0xFF) as u8),
    };
    (locus, handle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_locus() {
        let h = Handle::from_raw(0x0203);
        for locus in [
            Locus::ClientRead(2),
            Locus::Orphan,
            Locus::Write,
            Locus::Event,
        ] {
            let id = encode(locus, h);
            assert_eq!(decode(id), (locus, h));
        }
    }
}
