// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The interrupt pump (§4.E): a cheap ISR that disables further chip
//! interrupts and wakes the worker, and a worker-context pass that
//! identifies causes, services each, and re-arms.

use crate::config::ConfigSource;
use crate::interface::Interface;
use crate::limits::RX_BURST;
use ksz8851_api::{ClientHooks, EventFlags};
use ksz8851_core::bus::RawBus;
use ksz8851_core::chip::ChipContext;
use ksz8851_core::frame::Frame;
use ksz8851_core::rx::{self, FrameSink};
use ksz8851_core::Irq;
use platform_api::Platform;

/// Stages frames drained from RXQ so the chip-control borrow can end
/// before dispatch (which needs `&mut Interface`, not just
/// `&mut self.chip`) gets to run on each one.
struct FrameCollector {
    frames: [Option<Frame>; RX_BURST],
    len: usize,
    overflowed: bool,
}

impl FrameCollector {
    fn new() -> Self {
        Self {
            frames: core::array::from_fn(|_| None),
            len: 0,
            overflowed: false,
        }
    }
}

impl FrameSink for FrameCollector {
    fn deliver(&mut self, frame: Frame) {
        if self.len < RX_BURST {
            self.frames[self.len] = Some(frame);
            self.len += 1;
        } else {
            self.overflowed = true;
        }
    }
}

impl<B: RawBus, P: Platform, H: ClientHooks, C: ConfigSource> Interface<B, P, H, C> {
    /// Runs in actual interrupt context (or whatever the host's
    /// analogue of one is): checks whether this unit's chip raised the
    /// shared interrupt line, and if so, masks it at the chip and
    /// wakes the worker. Does not touch any queue or client state, so
    /// it never needs more than `&self`.
    ///
    /// Returns `false` immediately (touching nothing) if the interrupt
    /// wasn't this chip's doing; a borrowed/shared line must not be
    /// masked or claimed on another device's behalf.
    pub fn isr(&self) -> bool {
        let isr = self.chip.read_isr();
        let ier = self.chip.read_ier();
        if isr & ier == 0 {
            return false;
        }
        // Disable the chip's own interrupt source entirely so the
        // line can't refire before the worker has had a chance to
        // look at ISR; the worker re-enables per-cause once done.
        self.chip.disable_interrupts();
        self.chip
            .bus()
            .platform()
            .set_signal(platform_api::signal::CHIP_EVENT);
        true
    }

    /// Worker-context handling of one pump pass, run after waking on
    /// [`platform_api::signal::CHIP_EVENT`]: reads and acknowledges
    /// ISR, services each cause, then re-arms. Returns the raw ISR
    /// bits serviced (0 on a spurious wakeup).
    pub fn process_interrupt(&mut self) -> u16 {
        let isr = self.chip.read_isr();
        if isr == 0 {
            return 0;
        }
        self.chip.ack_isr(isr);

        // Serviced in ISR/IER bit order (§5: "two events in one pass
        // fire in ISR/IER bit order") so a request waiting on more than
        // one event class completes in the right order when several
        // causes land in the same pass.
        if isr & Irq::LCIS.bits() != 0 {
            self.fire_event(EventFlags::LINK_CHANGE);
        }

        if isr & Irq::TXIS.bits() != 0 {
            self.fire_event(EventFlags::TX);
        }

        if isr & Irq::RXIS.bits() != 0 {
            let mut collector = FrameCollector::new();
            rx::drain(&self.chip, &mut collector);
            for frame in collector.frames.into_iter().flatten() {
                self.deliver_frame(frame);
            }
            if collector.overflowed {
                // More frames were ready than this pass can stage;
                // they stay in RXQ, and the chip keeps RXIS asserted
                // as long as frames remain queued, so the next pass
                // picks them up.
                self.fire_event(EventFlags::RX);
            }
        }

        if isr & Irq::RXOIS.bits() != 0 {
            self.chip.note_rx_overrun();
            self.fire_event(EventFlags::BUFF);
        }

        self.chip
            .enable_interrupts(ChipContext::<B, P>::standard_interrupt_mask());
        self.chip.bus().platform().enable_chip_interrupt();

        isr
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakePlatform, FakeRawBus};
    use ksz8851_api::{ClientBuffer, RequestId};

    struct NullHooks;
    impl ClientHooks for NullHooks {
        fn copy_to_client(&self, _dst: ClientBuffer, _src: &[u8]) -> bool {
            true
        }
        fn copy_from_client(&self, _dst: &mut [u8], _src: ClientBuffer) -> bool {
            true
        }
        fn filter(&self, _request: RequestId, _raw_frame: &[u8]) -> bool {
            true
        }
    }

    fn new_iface() -> Interface<FakeRawBus, FakePlatform, NullHooks, ()> {
        let chip = ChipContext::new(FakeRawBus::new(), FakePlatform::new());
        Interface::new(chip, ())
    }

    #[test]
    fn isr_ignores_a_line_this_chip_never_raised() {
        let iface = new_iface();
        assert!(!iface.isr());
    }

    #[test]
    fn process_interrupt_is_a_noop_on_a_clear_isr() {
        let mut iface = new_iface();
        assert_eq!(iface.process_interrupt(), 0);
    }

    #[test]
    fn link_change_cause_fires_the_link_change_event() {
        let mut iface = new_iface();
        iface.config_interface(None).unwrap();
        let id = iface.on_event(EventFlags::LINK_CHANGE).unwrap();

        iface
            .chip()
            .bus()
            .write_reg(ksz8851_regs::Register::Isr, Irq::LCIS.bits());
        iface.process_interrupt();

        let completion = iface.take_completion().expect("event should fire");
        assert_eq!(completion.id, id);
        assert!(completion.result.is_ok());
    }
}
