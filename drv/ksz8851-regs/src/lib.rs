// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Register and bit-field map for the KSZ8851-16MLL MAC/PHY.
//!
//! This crate carries no logic: it is the `Register` enum plus the
//! handful of bitflag types the chip control engine needs to compose
//! and decode register values. Splitting this out from
//! `ksz8851-core` mirrors the way the grounding repository keeps
//! `drv/ksz8463::registers` separate from the driver logic that uses it.

#![no_std]

use bitflags::bitflags;

/// The chip's 16-bit register file, addressed by byte offset. Only the
/// registers the core driver actually touches are enumerated; the chip
/// exposes others (VLAN, QoS, port mirroring) that are out of scope.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum Register {
    /// FIFO data register (RX/TX data port).
    Data = 0x00,
    /// Bus command register (selects the next data-register access).
    Command = 0x02,
    /// Chip configuration register.
    Ccr = 0x08,
    /// MAC address high.
    Marh = 0x10,
    /// MAC address middle.
    Marm = 0x12,
    /// MAC address low.
    Marl = 0x14,
    /// On-chip bus control register.
    Obcr = 0x20,
    /// EEPROM control register.
    Eepcr = 0x22,
    /// Memory BIST info register.
    Mbir = 0x24,
    /// Global reset register.
    Grr = 0x26,
    /// Wake-up frame control register.
    Wfcr = 0x2A,
    /// Power management event control register.
    Pmecr = 0x2C,
    /// Goodput status register.
    Gsr = 0x30,
    /// Chip ID and enable register.
    Cider = 0xC0,
    /// Transmit control register.
    Txcr = 0x70,
    /// Transmit memory information register (free TXQ space).
    Txmir = 0x78,
    /// Receive control register 1.
    Rxcr1 = 0x74,
    /// Receive control register 2.
    Rxcr2 = 0x76,
    /// Receive frame header status register.
    Rxfhsr = 0x7C,
    /// Receive frame header byte count register.
    Rxfhbcr = 0x7E,
    /// Transmit queue command register.
    Txqcr = 0x80,
    /// Receive queue command register.
    Rxqcr = 0x82,
    /// Transmit frame data pointer register.
    Txfdpr = 0x84,
    /// Receive frame data pointer register.
    Rxfdpr = 0x86,
    /// Receive frame count and threshold register.
    Rxfctr = 0x9C,
    /// Interrupt enable register.
    Ier = 0x90,
    /// Interrupt status register.
    Isr = 0x92,
    /// Multicast address hash table register 0.
    Mahtr0 = 0xA0,
    /// Multicast address hash table register 1.
    Mahtr1 = 0xA2,
    /// Multicast address hash table register 2.
    Mahtr2 = 0xA4,
    /// Multicast address hash table register 3.
    Mahtr3 = 0xA6,
    /// Port 1 control register (PHY).
    P1cr = 0xF4,
    /// Port 1 status register (PHY link/speed/duplex).
    P1sr = 0xF8,
    /// Indirect access control register (MIB counters).
    Iacr = 0xC8,
    /// Indirect access data register, high word.
    Iadhr = 0xD0,
    /// Indirect access data register, low word.
    Iadlr = 0xD2,
}

impl Register {
    pub const fn offset(self) -> u16 {
        self as u8 as u16
    }
}

/// Expected chip-ID family read from [`Register::Cider`], masked with
/// [`CIDER_ID_MASK`].
pub const CIDER_ID_FAMILY: u16 = 0x8870;
/// Mask applied to a CIDER read before comparing against
/// [`CIDER_ID_FAMILY`]; the low nibble carries a revision number.
pub const CIDER_ID_MASK: u16 = 0xFFF0;

bitflags! {
    /// Bits of the global reset register.
    #[derive(Copy, Clone, Debug, Eq, PartialEq)]
    pub struct Grr: u16 {
        /// Global soft reset: resets the entire chip, including the PHY.
        const GLOBAL_RESET = 0x0001;
        /// QMU soft reset: resets only the TX/RX queue engine.
        const QMU_RESET = 0x0002;
    }
}

bitflags! {
    /// Bits of the transmit control register.
    #[derive(Copy, Clone, Debug, Eq, PartialEq)]
    pub struct Txcr: u16 {
        /// Enable the transmit frame checksum generator (pads + appends FCS).
        const TXCE = 0x0001;
        /// Pad transmit frames shorter than 64 bytes.
        const TXPE = 0x0002;
        /// Enable CRC generation for transmitted frames.
        const TXFCE = 0x0004;
        /// Transmit enable: gates whether the chip actually dispatches
        /// frames out of TXQ onto the wire. Set on `online`, cleared on
        /// `offline` (§3 "ONLINE implies ... TX/RX enable bits are set").
        const TXE = 0x0008;
    }
}

bitflags! {
    /// Bits of receive control register 1.
    #[derive(Copy, Clone, Debug, Eq, PartialEq)]
    pub struct Rxcr1: u16 {
        /// Accept frames whose destination matches the programmed MAC.
        const RXAE = 0x0001;
        /// Accept IEEE 802.3x PAUSE flow-control frames.
        const RXFCE = 0x0002;
        /// Accept broadcast frames.
        const RXBE = 0x0004;
        /// Accept frames matching the multicast hash table.
        const RXME = 0x0008;
        /// Accept unicast frames matching the multicast hash table.
        const RXUE = 0x0010;
        /// Receive enable: gates whether the chip actually accepts
        /// incoming frames into RXQ. Set on `online`, cleared on
        /// `offline`.
        const RXE = 0x0020;
    }
}

bitflags! {
    /// Bits of receive control register 2.
    #[derive(Copy, Clone, Debug, Eq, PartialEq)]
    pub struct Rxcr2: u16 {
        /// Disable UDP checksum offload (checksum not verified by chip).
        const UDPLFE = 0x0010;
        /// Maximum receive burst length: 4 frames per interrupt pass.
        const MAX_BURST_4 = 0x0600;
    }
}

bitflags! {
    /// Bits of the receive queue command register.
    #[derive(Copy, Clone, Debug, Eq, PartialEq)]
    pub struct Rxqcr: u16 {
        /// Start DMA access: arms the FIFO for a burst read or write.
        const SDA = 0x0008;
        /// Auto-dequeue a completed RX frame from RXQ.
        const RRXEF = 0x0001;
        /// Enable 4-byte alignment of RXQ frame data via a two-byte pad.
        const RXFCTE = 0x0040;
        /// Auto-increment the RX data pointer after each access.
        const ADRFE = 0x0080;
        /// RX frame-count threshold interrupt, fired once one frame queued.
        const RXIFE = 0x0200;
        /// IP-header two-byte offset: prepends a two-dummy-byte pad ahead
        /// of each dequeued frame so the header lands 4-byte aligned
        /// (§4.B "RXQ auto-dequeue with 4-byte header alignment").
        const RXIPHTOE = 0x0010;
    }
}

bitflags! {
    /// Bits of the transmit queue command register.
    #[derive(Copy, Clone, Debug, Eq, PartialEq)]
    pub struct Txqcr: u16 {
        /// Manual-enqueue-then-fetch: kicks the chip to transmit the frame
        /// just written to TXQ.
        const METFE = 0x0001;
    }
}

bitflags! {
    /// Bits shared by the interrupt status (ISR) and interrupt enable
    /// (IER) registers; a cause can only fire if the matching bit is set
    /// in both.
    #[derive(Copy, Clone, Debug, Eq, PartialEq)]
    pub struct Irq: u16 {
        /// Link-change detect.
        const LCIS = 0x8000;
        /// Transmit done.
        const TXIS = 0x4000;
        /// Receive frame ready.
        const RXIS = 0x2000;
        /// Receive overrun: a frame was dropped because RXQ was full.
        const RXOIS = 0x0800;
    }
}

/// Byte-enable bits of the command register. A register access selects
/// one 16-bit lane of the chip's internal 32-bit-aligned register file
/// by asserting the pair of byte-enable bits for that lane.
pub const CMD_BE0: u16 = 1 << 8;
pub const CMD_BE1: u16 = 1 << 9;
pub const CMD_BE2: u16 = 1 << 10;
pub const CMD_BE3: u16 = 1 << 11;

/// Bit 11 of [`Register::Rxfdpr`]; when set, the chip's internal word
/// order for all subsequent bus accesses switches to big-endian. The bit
/// itself is write-only and software must track the resulting mode.
pub const RXFDPR_EMS: u16 = 1 << 11;

/// Bit 14 of [`Register::Txfdpr`]; enables auto-increment of the TX
/// frame pointer after each data-register access. Without it, streamed
/// FIFO writes all land on the same word instead of advancing.
pub const TXFDPR_TXFPAI: u16 = 1 << 14;

/// Bit 14 of [`Register::Rxfdpr`]; enables auto-increment of the RX
/// frame pointer after each data-register access. Without it, streamed
/// FIFO reads all return the same word instead of advancing.
pub const RXFDPR_RXFPAI: u16 = 1 << 14;

/// Mask applied to a [`Register::Txmir`] read, isolating the free TXQ
/// memory (in bytes) available for the next frame.
pub const TXMIR_FREE_MASK: u16 = 0x1FFF;

/// Mask applied to a [`Register::Rxfhbcr`] read, isolating the received
/// frame's byte count.
pub const RXFHBCR_MASK: u16 = 0x0FFF;

/// Mask applied to the TX control word's frame-id field.
pub const TX_FID_MASK: u16 = 0x003F;
/// Set on a TX control word to request an interrupt once the frame is
/// transmitted (used so overruns/aborts surface as ISR TXIS events).
pub const TX_IC: u16 = 0x8000;

/// Bits of a receive frame header status word ([`Register::Rxfhsr`]).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct RxFrameStatus(pub u16);

impl RxFrameStatus {
    pub const VALID: u16 = 0x8000;
    pub const MII_ERROR: u16 = 0x2000;
    pub const TOO_LONG: u16 = 0x0800;
    pub const RUNT: u16 = 0x0400;
    pub const CRC_ERROR: u16 = 0x0020;
    pub const UDP_CHECKSUM_ERROR: u16 = 0x0010;
    pub const TCP_CHECKSUM_ERROR: u16 = 0x0008;
    pub const IP_CHECKSUM_ERROR: u16 = 0x0004;

    pub const ERROR_MASK: u16 = Self::MII_ERROR
        | Self::TOO_LONG
        | Self::RUNT
        | Self::CRC_ERROR
        | Self::UDP_CHECKSUM_ERROR
        | Self::TCP_CHECKSUM_ERROR
        | Self::IP_CHECKSUM_ERROR;

    pub fn is_valid(self) -> bool {
        self.0 & Self::VALID != 0
    }

    pub fn is_error(self) -> bool {
        self.0 & Self::ERROR_MASK != 0
    }
}

/// Bits of the port 1 status register relevant to link monitoring.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct P1Status(pub u16);

impl P1Status {
    const LINK_GOOD: u16 = 0x0020;
    const OPERATION_DUPLEX: u16 = 0x0004;
    const OPERATION_SPEED: u16 = 0x0002;

    pub fn link_up(self) -> bool {
        self.0 & Self::LINK_GOOD != 0
    }

    pub fn full_duplex(self) -> bool {
        self.0 & Self::OPERATION_DUPLEX != 0
    }

    /// `true` for 100Mbps, `false` for 10Mbps.
    pub fn is_100mbps(self) -> bool {
        self.0 & Self::OPERATION_SPEED != 0
    }
}
