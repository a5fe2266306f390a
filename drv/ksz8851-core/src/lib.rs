// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Chip control engine: bus I/O primitive, probe/reset/init, TX/RX
//! FIFO transfer, and the multicast hash filter (§4.A/§4.B/§4.C/§4.D).
//!
//! Written `no_std` but `#[cfg(test)]`-built against `std` so its unit
//! tests can run against a fake bus and platform, the same pattern
//! `circq` uses.

#![cfg_attr(not(test), no_std)]

pub mod bus;
pub mod chip;
pub mod frame;
pub mod hash;
pub mod rx;
pub mod tx;

#[cfg(test)]
mod test_support;

pub use bus::{ChipBus, RawBus};
pub use chip::{ChipContext, ResetKind};
pub use frame::Frame;
pub use ksz8851_regs::Irq;
pub use rx::FrameSink;
pub use tx::TxResult;

/// Chip-level error taxonomy (§7, the subset relevant below the
/// request-queue layer). `ksz8851-dispatch` maps these into its own
/// wire-error reporting.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Error {
    /// Probe failed in both endian modes.
    NoChip,
    /// Frame length outside `46..=1518`.
    InvalidLength,
    /// TXQ doesn't have enough free memory right now.
    NoSpace,
}
