// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Unit state machine (§4.G): the bitfield of {CONFIG, ONLINE,
//! EXCLUSIVE, LOOPBACK, PROMISC} and the transitions between them.

use bitflags::bitflags;

bitflags! {
    #[derive(Copy, Clone, Debug, Eq, PartialEq)]
    pub struct UnitState: u8 {
        const CONFIG = 1 << 0;
        const ONLINE = 1 << 1;
        const EXCLUSIVE = 1 << 2;
        const LOOPBACK = 1 << 3;
        const PROMISC = 1 << 4;
    }
}

impl Default for UnitState {
    fn default() -> Self {
        UnitState::empty()
    }
}

impl UnitState {
    pub fn is_configured(self) -> bool {
        self.contains(UnitState::CONFIG)
    }

    pub fn is_online(self) -> bool {
        self.contains(UnitState::ONLINE)
    }
}
