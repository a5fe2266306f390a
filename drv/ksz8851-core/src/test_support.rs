// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fakes shared by this crate's unit tests: an in-memory register file
//! standing in for the real bus, and a no-op `Platform`.

use crate::bus::RawBus;
use ksz8851_regs::{Register, CIDER_ID_FAMILY};
use platform_api::Platform;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

pub struct FakeRawBus {
    regs: RefCell<HashMap<u16, u16>>,
    selected: Cell<u16>,
}

impl FakeRawBus {
    pub fn new() -> Self {
        let mut regs = HashMap::new();
        regs.insert(Register::Cider.offset(), CIDER_ID_FAMILY);
        Self {
            regs: RefCell::new(regs),
            selected: Cell::new(0),
        }
    }
}

impl RawBus for FakeRawBus {
    fn read16(&self, offset: u16) -> u16 {
        if offset == Register::Command.offset() {
            return self.selected.get();
        }
        if offset == Register::Data.offset() {
            let addr = self.selected.get().swap_bytes() & 0x00FC;
            return *self.regs.borrow().get(&addr).unwrap_or(&0);
        }
        *self.regs.borrow().get(&offset).unwrap_or(&0)
    }

    fn write16(&self, offset: u16, value: u16) {
        if offset == Register::Command.offset() {
            self.selected.set(value);
            return;
        }
        if offset == Register::Data.offset() {
            let addr = self.selected.get().swap_bytes() & 0x00FC;
            self.regs.borrow_mut().insert(addr, value);
            return;
        }
        self.regs.borrow_mut().insert(offset, value);
    }
}

pub struct FakePlatform {
    pending: Cell<u32>,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self {
            pending: Cell::new(0),
        }
    }
}

impl Platform for FakePlatform {
    fn recv_signal(&self, mask: u32) -> u32 {
        let fired = self.pending.get() & mask;
        self.pending.set(self.pending.get() & !fired);
        fired
    }

    fn set_signal(&self, bits: u32) {
        self.pending.set(self.pending.get() | bits);
    }

    fn sleep_ms(&self, _ms: u64) {}

    fn enable_chip_interrupt(&self) {}

    fn disable_chip_interrupt(&self) {}

    fn with_chip_interrupts_disabled<R>(&self, f: impl FnOnce() -> R) -> R {
        f()
    }
}
