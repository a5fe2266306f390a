// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The 16-bit bus I/O primitive (§4.A): composes the command word that
//! selects a register for the following data-register access, tracking
//! the chip's runtime-switchable endianness.

use core::cell::Cell;
use ksz8851_regs::{Register, CMD_BE0, CMD_BE1, CMD_BE2, CMD_BE3};
use platform_api::Platform;

/// The raw memory-mapped transport: a pair of 16-bit ports at the chip's
/// base address. Implementations just do the bus cycle; all protocol
/// (command composition, endianness, interrupt masking) lives in
/// [`ChipBus`].
pub trait RawBus {
    fn read16(&self, offset: u16) -> u16;
    fn write16(&self, offset: u16, value: u16);
}

/// Endianness-aware register accessor built on top of a [`RawBus`].
pub struct ChipBus<B, P> {
    raw: B,
    platform: P,
    big_endian: Cell<bool>,
}

impl<B: RawBus, P: Platform> ChipBus<B, P> {
    pub fn new(raw: B, platform: P) -> Self {
        Self {
            raw,
            platform,
            big_endian: Cell::new(false),
        }
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn is_big_endian(&self) -> bool {
        self.big_endian.get()
    }

    /// Probe/reset are the only callers allowed to change this; everyone
    /// else just reads [`ChipBus::is_big_endian`].
    pub(crate) fn set_big_endian(&self, big_endian: bool) {
        self.big_endian.set(big_endian);
    }

    /// Lane-select for the 16-bit slot at `offset` within the chip's
    /// internal 32-bit-aligned register file. Which lane is "first"
    /// flips with endianness.
    fn byte_enable(offset: u16, big_endian: bool) -> u16 {
        let upper_lane = offset & 2 != 0;
        if upper_lane ^ big_endian {
            CMD_BE3 | CMD_BE2
        } else {
            CMD_BE1 | CMD_BE0
        }
    }

    /// Issues the command-register write that arms the data register for
    /// an access to `offset`. The command register is always
    /// byte-swapped by hardware, independent of chip endianness, so the
    /// composed word is pre-swapped here to compensate.
    fn select(&self, offset: u16) {
        let big_endian = self.big_endian.get();
        let cmd = (offset & 0x00FC) | Self::byte_enable(offset, big_endian);
        self.raw.write16(Register::Command.offset(), cmd.swap_bytes());
    }

    /// Reads the 16-bit register at `offset` (must be even, `0..0xFE`).
    /// Runs with host interrupts disabled so the command/data pair can't
    /// be split by a re-entrant ISR.
    pub fn read(&self, offset: u16) -> u16 {
        self.platform.with_chip_interrupts_disabled(|| {
            self.select(offset);
            self.raw.read16(Register::Data.offset())
        })
    }

    /// Writes `value` to the 16-bit register at `offset`.
    pub fn write(&self, offset: u16, value: u16) {
        self.platform.with_chip_interrupts_disabled(|| {
            self.select(offset);
            self.raw.write16(Register::Data.offset(), value);
        })
    }

    pub fn read_reg(&self, reg: Register) -> u16 {
        self.read(reg.offset())
    }

    pub fn write_reg(&self, reg: Register, value: u16) {
        self.write(reg.offset(), value)
    }

    /// Reads or writes the data register directly, without re-issuing a
    /// command-register select. Used by FIFO transfer, which streams many
    /// words through the same data-register window after a single select.
    pub fn read_data_raw(&self) -> u16 {
        self.raw.read16(Register::Data.offset())
    }

    pub fn write_data_raw(&self, value: u16) {
        self.raw.write16(Register::Data.offset(), value)
    }

    /// Selects the data register for a burst of direct
    /// `read_data_raw`/`write_data_raw` calls.
    pub fn select_data_port(&self) {
        self.select(Register::Data.offset());
    }
}
