// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Receive path (§4.D): drains RXQ based on the frame-count register,
//! validates status, stages accepted frames, and hands them to a sink.

use crate::bus::RawBus;
use crate::chip::ChipContext;
use crate::frame::{Frame, MAX_FRAME_LEN, RX_ALIGN_PAD, STAGING_BUFFER_LEN};
use ksz8851_regs::{Register, RxFrameStatus, Rxqcr, RXFDPR_EMS, RXFDPR_RXFPAI, RXFHBCR_MASK};
use platform_api::Platform;
use ringbuf::*;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Trace {
    None,
    Drained(usize),
    DiscardedInvalid,
    DiscardedLength(u16),
}

ringbuf!(Trace, 32, Trace::None);

/// Receives a staged frame and does whatever the dispatcher needs to do
/// with it. Kept as a trait (rather than a direct dependency on
/// `ksz8851-dispatch`) so the receive path has no upward dependency on
/// the request-queue layer.
pub trait FrameSink {
    fn deliver(&mut self, frame: Frame);
}

/// Drains all currently-pending RX frames, delivering each accepted one
/// to `sink`. Returns the number of frames delivered.
pub fn drain<B: RawBus, P: Platform, S: FrameSink>(
    ctx: &ChipContext<B, P>,
    sink: &mut S,
) -> usize {
    let mut delivered = 0;
    let mut pending = (ctx.bus().read_reg(Register::Rxfctr) >> 8) as u8;

    while pending > 0 {
        let status = RxFrameStatus(ctx.bus().read_reg(Register::Rxfhsr));
        let byte_count = ctx.bus().read_reg(Register::Rxfhbcr) & RXFHBCR_MASK;

        if !status.is_valid() || status.is_error() {
            ringbuf_entry!(Trace::DiscardedInvalid);
            discard(ctx);
            pending -= 1;
            continue;
        }

        if byte_count == 0 || byte_count as usize > MAX_FRAME_LEN + 4 {
            ringbuf_entry!(Trace::DiscardedLength(byte_count));
            discard(ctx);
            pending -= 1;
            continue;
        }

        let mut raw = [0u8; STAGING_BUFFER_LEN];
        pull_frame(ctx, byte_count as usize, &mut raw);
        let frame_bytes = &raw[RX_ALIGN_PAD..RX_ALIGN_PAD + byte_count as usize];
        if let Some(frame) = Frame::from_wire(frame_bytes) {
            sink.deliver(frame);
            delivered += 1;
        }

        pending -= 1;
    }

    ringbuf_entry!(Trace::Drained(delivered));
    delivered
}

fn discard<B: RawBus, P: Platform>(ctx: &ChipContext<B, P>) {
    ctx.note_rx_discard();
    let rxqcr = ctx.bus().read_reg(Register::Rxqcr);
    ctx.bus()
        .write_reg(Register::Rxqcr, rxqcr | Rxqcr::RRXEF.bits());
}

/// Pulls exactly `byte_count` bytes out of RXQ into `out[RX_ALIGN_PAD..]`,
/// following the FIFO read protocol: reset the RX pointer, arm SDA,
/// discard the dummy word, discard the redundant status/byte-count
/// header words (already known from the peek above), then stream the
/// `RXIPHTOE` alignment pad followed by the payload, padded to a 4-byte
/// boundary on the bus.
fn pull_frame<B: RawBus, P: Platform>(ctx: &ChipContext<B, P>, byte_count: usize, out: &mut [u8]) {
    let ems = if ctx.is_big_endian() { RXFDPR_EMS } else { 0 };
    ctx.bus().write_reg(Register::Rxfdpr, ems | RXFDPR_RXFPAI);

    let rxqcr = ctx.bus().read_reg(Register::Rxqcr);
    ctx.bus()
        .write_reg(Register::Rxqcr, rxqcr | Rxqcr::SDA.bits());

    ctx.bus().select_data_port();
    let _dummy = ctx.bus().read_data_raw();
    let _status = ctx.bus().read_data_raw();
    let _byte_count_word = ctx.bus().read_data_raw();

    let total = RX_ALIGN_PAD + byte_count;
    let mut consumed = 0;
    while consumed < total {
        let w = ctx.bus().read_data_raw().to_le_bytes();
        out[consumed] = w[0];
        consumed += 1;
        if consumed < total {
            out[consumed] = w[1];
            consumed += 1;
        }
    }

    let padded = (total + 3) & !3;
    let mut dummy_consumed = consumed + (consumed & 1);
    while dummy_consumed < padded {
        let _ = ctx.bus().read_data_raw();
        dummy_consumed += 2;
    }

    ctx.bus().write_reg(Register::Rxqcr, rxqcr);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakePlatform, FakeRawBus};
    use ksz8851_regs::RxFrameStatus as Status;

    fn new_ctx() -> ChipContext<FakeRawBus, FakePlatform> {
        ChipContext::new(FakeRawBus::new(), FakePlatform::new())
    }

    struct CollectingSink {
        frames: Vec<Frame>,
    }

    impl FrameSink for CollectingSink {
        fn deliver(&mut self, frame: Frame) {
            self.frames.push(frame);
        }
    }

    fn push_fake_frame(ctx: &ChipContext<FakeRawBus, FakePlatform>, raw: &[u8]) {
        let current = (ctx.bus().read_reg(Register::Rxfctr) >> 8) as u16;
        ctx.bus()
            .write_reg(Register::Rxfctr, (current + 1) << 8);
        ctx.bus()
            .write_reg(Register::Rxfhsr, Status::VALID);
        ctx.bus()
            .write_reg(Register::Rxfhbcr, raw.len() as u16);
        // The fake bus's data register always yields zero bytes for
        // reads beyond what was explicitly written, which is enough to
        // exercise the drain loop's control flow; byte-exact FIFO
        // content is covered by `Frame::from_wire`.
    }

    #[test]
    fn discards_invalid_frame_and_keeps_draining() {
        let ctx = new_ctx();
        ctx.bus().write_reg(Register::Rxfctr, 1 << 8);
        ctx.bus().write_reg(Register::Rxfhsr, 0); // VALID bit clear
        ctx.bus().write_reg(Register::Rxfhbcr, 64);

        let mut sink = CollectingSink { frames: vec![] };
        let delivered = drain(&ctx, &mut sink);
        assert_eq!(delivered, 0);
        assert_eq!(ctx.rx_discards(), 1);
    }

    #[test]
    fn discards_oversize_frame() {
        let ctx = new_ctx();
        ctx.bus().write_reg(Register::Rxfctr, 1 << 8);
        ctx.bus().write_reg(Register::Rxfhsr, Status::VALID);
        ctx.bus().write_reg(Register::Rxfhbcr, 2000);

        let mut sink = CollectingSink { frames: vec![] };
        let delivered = drain(&ctx, &mut sink);
        assert_eq!(delivered, 0);
    }

    #[test]
    fn delivers_a_well_formed_frame() {
        let ctx = new_ctx();
        push_fake_frame(&ctx, &[0u8; 60]);

        let mut sink = CollectingSink { frames: vec![] };
        let delivered = drain(&ctx, &mut sink);
        assert_eq!(delivered, 1);
        assert_eq!(sink.frames.len(), 1);
    }
}
