// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Transmit path (§4.C): TX header construction, TXQ enqueue, MTU and
//! free-space checks.

use crate::bus::RawBus;
use crate::chip::ChipContext;
use crate::frame::{HEADER_LEN, MAX_FRAME_LEN, MIN_FRAME_LEN, MTU};
use crate::Error;
use ksz8851_regs::{
    Register, Rxqcr, Txqcr, TXFDPR_TXFPAI, TXMIR_FREE_MASK, TX_FID_MASK, TX_IC,
};
use platform_api::Platform;

/// Result of a successful `send`/`send_cooked`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TxResult {
    pub frame_id: u8,
}

/// Transmits a complete raw frame (header already present). `frame.len()`
/// must satisfy `46..=1518`.
pub fn send<B: RawBus, P: Platform>(
    ctx: &ChipContext<B, P>,
    frame: &[u8],
) -> Result<TxResult, Error> {
    if frame.len() < MIN_FRAME_LEN || frame.len() > MAX_FRAME_LEN {
        return Err(Error::InvalidLength);
    }
    enqueue(ctx, frame)
}

/// Builds a frame from its cooked components (destination, source,
/// ethertype, payload) and transmits it, padding payloads shorter than
/// `MIN_FRAME_LEN - HEADER_LEN` with zeros in the driver's own staging
/// buffer. Never reads past the end of `payload`.
pub fn send_cooked<B: RawBus, P: Platform>(
    ctx: &ChipContext<B, P>,
    dst: [u8; 6],
    src: [u8; 6],
    ethertype: u16,
    payload: &[u8],
) -> Result<TxResult, Error> {
    if payload.len() > MTU {
        return Err(Error::InvalidLength);
    }

    let mut staging = [0u8; MAX_FRAME_LEN];
    staging[0..6].copy_from_slice(&dst);
    staging[6..12].copy_from_slice(&src);
    staging[12..14].copy_from_slice(&ethertype.to_be_bytes());
    staging[HEADER_LEN..HEADER_LEN + payload.len()].copy_from_slice(payload);

    let total_len = (HEADER_LEN + payload.len()).max(MIN_FRAME_LEN);
    // Bytes between the copied payload and `total_len` are already zero
    // from the staging buffer's initialization: this is the padding step,
    // performed entirely inside our own buffer after the copy, never by
    // reading past the caller's buffer.

    send(ctx, &staging[..total_len])
}

fn enqueue<B: RawBus, P: Platform>(
    ctx: &ChipContext<B, P>,
    frame: &[u8],
) -> Result<TxResult, Error> {
    let free = ctx.bus().read_reg(Register::Txmir) & TXMIR_FREE_MASK;
    let needed = frame.len() + 8;
    if needed > free as usize {
        return Err(Error::NoSpace);
    }

    let raw_id = ctx.next_frame_id();
    let frame_id = (raw_id as u16 & TX_FID_MASK) as u8;
    let control = TX_IC | frame_id as u16;
    let byte_count = frame.len() as u16;

    let rxqcr = ctx.bus().read_reg(Register::Rxqcr);
    ctx.bus()
        .write_reg(Register::Rxqcr, rxqcr | Rxqcr::SDA.bits());

    ctx.bus().write_reg(Register::Txfdpr, TXFDPR_TXFPAI);

    ctx.bus().select_data_port();
    // Header fields are always little-endian on the wire, independent of
    // chip endian mode.
    ctx.bus().write_data_raw(control.to_le());
    ctx.bus().write_data_raw(byte_count.to_le());

    let mut i = 0;
    while i < frame.len() {
        let lo = frame[i];
        let hi = if i + 1 < frame.len() { frame[i + 1] } else { 0 };
        ctx.bus().write_data_raw(u16::from_le_bytes([lo, hi]));
        i += 2;
    }

    // Pad the frame body (not the header) to a 4-byte multiple.
    let padded_len = (frame.len() + 3) & !3;
    while i < padded_len {
        ctx.bus().write_data_raw(0);
        i += 2;
    }

    ctx.bus().write_reg(Register::Rxqcr, rxqcr);
    ctx.bus()
        .write_reg(Register::Txqcr, Txqcr::METFE.bits());

    Ok(TxResult { frame_id })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakePlatform, FakeRawBus};

    fn new_ctx() -> ChipContext<FakeRawBus, FakePlatform> {
        let ctx = ChipContext::new(FakeRawBus::new(), FakePlatform::new());
        ctx.bus().write_reg(Register::Txmir, TXMIR_FREE_MASK);
        ctx
    }

    #[test]
    fn rejects_short_raw_frame() {
        let ctx = new_ctx();
        let frame = [0u8; 10];
        assert_eq!(send(&ctx, &frame), Err(Error::InvalidLength));
    }

    #[test]
    fn rejects_long_raw_frame() {
        let ctx = new_ctx();
        let frame = [0u8; MAX_FRAME_LEN + 1];
        assert_eq!(send(&ctx, &frame), Err(Error::InvalidLength));
    }

    #[test]
    fn cooked_short_payload_is_padded_not_rejected() {
        let ctx = new_ctx();
        let result = send_cooked(&ctx, [0xAA; 6], [0xBB; 6], 0x0800, b"hi");
        assert!(result.is_ok());
    }

    #[test]
    fn no_space_when_txmir_too_small() {
        let ctx = new_ctx();
        ctx.bus().write_reg(Register::Txmir, 4);
        let frame = [0u8; 100];
        assert_eq!(send(&ctx, &frame), Err(Error::NoSpace));
    }

    #[test]
    fn frame_id_cycles_through_0x3f_without_skipping() {
        let ctx = new_ctx();
        let frame = [0u8; 60];
        let mut last: Option<u8> = None;
        for _ in 0..300 {
            let r = send(&ctx, &frame).unwrap();
            assert!(r.frame_id <= 0x3F);
            if let Some(prev) = last {
                let expected = (prev + 1) & 0x3F;
                assert_eq!(r.frame_id, expected);
            }
            last = Some(r.frame_id);
        }
    }
}
