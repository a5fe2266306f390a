// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Probe, soft reset, and init sequence (§4.B).

use crate::bus::{ChipBus, RawBus};
use crate::Error;
use core::cell::Cell;
use ksz8851_regs::{
    Grr, Irq, Register, Rxcr1, Rxcr2, Rxqcr, Txcr, CIDER_ID_FAMILY, CIDER_ID_MASK, RXFDPR_EMS,
    RXFDPR_RXFPAI, TXFDPR_TXFPAI,
};
use platform_api::Platform;
use ringbuf::*;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Trace {
    None,
    ProbeMismatch { big_endian: bool, id: u16 },
    ProbeOk { big_endian: bool },
    Reset(ResetKind),
}

ringbuf!(Trace, 32, Trace::None);

/// Which part of the chip a soft reset touches.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ResetKind {
    /// Resets the entire chip, PHY included.
    Global,
    /// Resets only the TX/RX queue management unit.
    QmuOnly,
}

/// Owns the bus handle and the chip-level state that must survive across
/// register accesses: endian mode, frame-id counter, and diagnostic
/// counters. One instance per physical unit (§1 Non-goals: exactly one
/// instance is ever constructed).
pub struct ChipContext<B, P> {
    pub(crate) bus: ChipBus<B, P>,
    frame_id: Cell<u8>,
    irqs_observed: Cell<u32>,
    rx_overruns: Cell<u32>,
    rx_discards: Cell<u32>,
}

impl<B: RawBus, P: Platform> ChipContext<B, P> {
    pub fn new(raw: B, platform: P) -> Self {
        Self {
            bus: ChipBus::new(raw, platform),
            frame_id: Cell::new(0),
            irqs_observed: Cell::new(0),
            rx_overruns: Cell::new(0),
            rx_discards: Cell::new(0),
        }
    }

    pub fn bus(&self) -> &ChipBus<B, P> {
        &self.bus
    }

    pub fn is_big_endian(&self) -> bool {
        self.bus.is_big_endian()
    }

    pub fn irqs_observed(&self) -> u32 {
        self.irqs_observed.get()
    }

    pub fn note_irq_observed(&self) {
        self.irqs_observed.set(self.irqs_observed.get().wrapping_add(1));
    }

    pub fn rx_overruns(&self) -> u32 {
        self.rx_overruns.get()
    }

    /// Counts a RXOIS interrupt acknowledgment (FIFO was full and the
    /// chip dropped a frame on its own). Distinct from a per-frame
    /// discard, which the host chose to make after inspecting status.
    pub fn note_rx_overrun(&self) {
        self.rx_overruns.set(self.rx_overruns.get().wrapping_add(1));
    }

    pub fn rx_discards(&self) -> u32 {
        self.rx_discards.get()
    }

    /// Counts a frame discarded by the drain loop itself (invalid
    /// status, or a bogus byte count).
    pub fn note_rx_discard(&self) {
        self.rx_discards.set(self.rx_discards.get().wrapping_add(1));
    }

    /// Allocates the next TX frame id, wrapping at 8 bits. Only the low 6
    /// bits ever reach the wire (masked by `TX_FID_MASK`); the counter
    /// itself wraps at a full byte, matching the `ChipContext` data
    /// model's "8-bit wrap" frame-id counter.
    pub(crate) fn next_frame_id(&self) -> u8 {
        let id = self.frame_id.get();
        self.frame_id.set(id.wrapping_add(1));
        id
    }

    fn cider_matches(&self) -> bool {
        self.bus.read_reg(Register::Cider) & CIDER_ID_MASK == CIDER_ID_FAMILY
    }

    /// Probe and endianness detection (§4.B). The only thing the host
    /// can rely on is the chip-ID register's expected value; the chip
    /// may have been left in either endian mode by a prior run.
    pub fn probe(&self) -> Result<(), Error> {
        if self.cider_matches() {
            ringbuf_entry!(Trace::ProbeOk {
                big_endian: self.bus.is_big_endian()
            });
            return Ok(());
        }

        ringbuf_entry!(Trace::ProbeMismatch {
            big_endian: self.bus.is_big_endian(),
            id: self.bus.read_reg(Register::Cider),
        });
        self.bus.set_big_endian(!self.bus.is_big_endian());
        if self.cider_matches() {
            ringbuf_entry!(Trace::ProbeOk {
                big_endian: self.bus.is_big_endian()
            });
            return Ok(());
        }

        // Still mismatched in either mode: the chip may be wedged.
        // Issue a global soft reset in each endian mode and try once
        // more before giving up.
        for big_endian in [false, true] {
            self.bus.set_big_endian(big_endian);
            self.reset(ResetKind::Global);
            if self.cider_matches() {
                ringbuf_entry!(Trace::ProbeOk { big_endian });
                return Ok(());
            }
        }

        Err(Error::NoChip)
    }

    /// Soft reset (§4.B): save ISR mask, clear ISR, pulse GRR, re-detect
    /// endianness, restore ISR mask.
    pub fn reset(&self, kind: ResetKind) {
        ringbuf_entry!(Trace::Reset(kind));
        let saved_isr = self.bus.read_reg(Register::Isr);
        self.bus.write_reg(Register::Isr, Irq::all().bits());

        let grr = match kind {
            ResetKind::Global => Grr::GLOBAL_RESET,
            ResetKind::QmuOnly => Grr::QMU_RESET,
        };
        self.bus.write_reg(Register::Grr, grr.bits());
        self.bus.platform().sleep_ms(25);
        self.bus.write_reg(Register::Grr, 0);
        self.bus.platform().sleep_ms(10);

        // A reset leaves the chip in little-endian mode regardless of
        // what we asked for before resetting.
        self.bus.set_big_endian(false);
        if !self.cider_matches() {
            self.bus.set_big_endian(true);
        }

        self.bus.write_reg(Register::Isr, saved_isr);
    }

    /// Init (§4.B), run once probe has succeeded. Leaves chip interrupts
    /// globally masked (§4.E owns enabling them) and TX/RX themselves
    /// disabled (§4.G `online` owns enabling those, via
    /// [`ChipContext::enable_tx_rx`]).
    pub fn init(&self) {
        // Force BE mode: preferred on the big-endian hosts this driver
        // targets, and RXFDPR's EMS bit is write-only so we always set
        // it explicitly rather than trust chip-reset state. RXFPAI is
        // likewise write-only and must be set on every write to this
        // register, not just here.
        self.bus.set_big_endian(true);
        self.bus.write_reg(Register::Rxfdpr, RXFDPR_EMS | RXFDPR_RXFPAI);
        // Same auto-increment requirement on the TX side; without it
        // every word `tx::enqueue` streams lands on the same FIFO slot.
        self.bus.write_reg(Register::Txfdpr, TXFDPR_TXFPAI);

        self.bus.write_reg(
            Register::Txcr,
            (Txcr::TXFCE | Txcr::TXPE | Txcr::TXCE).bits(),
        );

        self.bus.write_reg(
            Register::Rxcr1,
            (Rxcr1::RXAE | Rxcr1::RXFCE | Rxcr1::RXBE | Rxcr1::RXME | Rxcr1::RXUE).bits(),
        );
        self.bus.write_reg(
            Register::Rxcr2,
            (Rxcr2::UDPLFE | Rxcr2::MAX_BURST_4).bits(),
        );

        self.bus.write_reg(
            Register::Rxqcr,
            (Rxqcr::RRXEF | Rxqcr::RXFCTE | Rxqcr::ADRFE | Rxqcr::RXIFE | Rxqcr::RXIPHTOE).bits(),
        );

        // Receive-frame-count threshold of 1: interrupt as soon as a
        // single frame is queued, rather than batching.
        self.bus.write_reg(Register::Rxfctr, 0x0001);

        // Force duplex = auto, restart autonegotiation (P1CR bit 13).
        let p1cr = self.bus.read_reg(Register::P1cr);
        self.bus.write_reg(Register::P1cr, p1cr | (1 << 13));
    }

    /// Enables the chip's TX/RX engines (§3 "ONLINE implies the chip's
    /// TX/RX enable bits are set"). Called by `online`, once `init` has
    /// programmed everything else.
    pub fn enable_tx_rx(&self) {
        let txcr = self.bus.read_reg(Register::Txcr);
        self.bus.write_reg(Register::Txcr, txcr | Txcr::TXE.bits());
        let rxcr1 = self.bus.read_reg(Register::Rxcr1);
        self.bus.write_reg(Register::Rxcr1, rxcr1 | Rxcr1::RXE.bits());
    }

    /// Disables the chip's TX/RX engines (§3 "OFFLINE implies no
    /// pending TX will be dispatched"). Called by `offline`.
    pub fn disable_tx_rx(&self) {
        let txcr = self.bus.read_reg(Register::Txcr);
        self.bus.write_reg(Register::Txcr, txcr & !Txcr::TXE.bits());
        let rxcr1 = self.bus.read_reg(Register::Rxcr1);
        self.bus.write_reg(Register::Rxcr1, rxcr1 & !Rxcr1::RXE.bits());
    }

    /// Programs the multicast hash filter. `promiscuous` overrides the
    /// computed table with all-ones, disabling the hash entirely.
    pub fn program_multicast_hash(&self, table: [u16; 4], promiscuous: bool) {
        let table = if promiscuous { [0xFFFF; 4] } else { table };
        self.bus.write_reg(Register::Mahtr0, table[0]);
        self.bus.write_reg(Register::Mahtr1, table[1]);
        self.bus.write_reg(Register::Mahtr2, table[2]);
        self.bus.write_reg(Register::Mahtr3, table[3]);
    }

    /// Reads link state from P1SR (§4.D/§4.E link-change handling).
    pub fn link_status(&self) -> ksz8851_regs::P1Status {
        ksz8851_regs::P1Status(self.bus.read_reg(Register::P1sr))
    }

    /// Programs the station MAC address into MARH/MARM/MARL (§4.G
    /// `config-interface`).
    pub fn set_station_mac(&self, mac: [u8; 6]) {
        self.bus.write_reg(
            Register::Marh,
            u16::from_be_bytes([mac[0], mac[1]]),
        );
        self.bus.write_reg(
            Register::Marm,
            u16::from_be_bytes([mac[2], mac[3]]),
        );
        self.bus.write_reg(
            Register::Marl,
            u16::from_be_bytes([mac[4], mac[5]]),
        );
    }

    /// Unmasks the given interrupt causes in IER (§4.E: "the worker
    /// does, per-cause, after processing").
    pub fn enable_interrupts(&self, mask: u16) {
        self.bus.write_reg(Register::Ier, mask);
    }

    /// Masks all chip interrupt causes (§4.E ISR contract: "disable all
    /// chip interrupts ... to prevent re-entry").
    pub fn disable_interrupts(&self) {
        self.bus.write_reg(Register::Ier, 0);
    }

    pub fn read_isr(&self) -> u16 {
        self.bus.read_reg(Register::Isr)
    }

    pub fn read_ier(&self) -> u16 {
        self.bus.read_reg(Register::Ier)
    }

    /// Acknowledges edge-triggered ISR bits via the chip's
    /// write-1-to-clear protocol.
    pub fn ack_isr(&self, bits: u16) {
        self.bus.write_reg(Register::Isr, bits);
    }

    /// The interrupt causes the driver runs online with (§4.E): link
    /// change, TX done, RX ready, RX overrun.
    pub fn standard_interrupt_mask() -> u16 {
        (Irq::LCIS | Irq::TXIS | Irq::RXIS | Irq::RXOIS).bits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakePlatform, FakeRawBus};

    fn new_ctx() -> ChipContext<FakeRawBus, FakePlatform> {
        ChipContext::new(FakeRawBus::new(), FakePlatform::new())
    }

    #[test]
    fn probe_succeeds_when_already_correct_endian() {
        let ctx = new_ctx();
        assert!(ctx.probe().is_ok());
    }

    #[test]
    fn probe_recovers_from_opposite_endian() {
        let ctx = new_ctx();
        ctx.bus.set_big_endian(true);
        assert!(ctx.probe().is_ok());
        assert!(ctx.cider_matches());
    }

    #[test]
    fn probe_fails_without_a_chip() {
        let ctx = new_ctx();
        // Corrupt the fake chip ID so neither endian mode, nor a reset,
        // will ever make CIDER match.
        ctx.bus.write_reg(Register::Cider, 0x0000);
        assert_eq!(ctx.probe(), Err(Error::NoChip));
    }

    #[test]
    fn frame_id_wraps_at_a_full_byte() {
        let ctx = new_ctx();
        for _ in 0..255 {
            ctx.next_frame_id();
        }
        assert_eq!(ctx.next_frame_id(), 255);
        assert_eq!(ctx.next_frame_id(), 0);
    }
}
