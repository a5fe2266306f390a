// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory frame staging (§3 `Frame`).

/// Minimum Ethernet payload+header length the chip will transmit without
/// padding (cooked payloads shorter than this are padded by the caller).
pub const MIN_FRAME_LEN: usize = 46;
/// Maximum frame length including the 14-byte header, excluding FCS.
pub const MAX_FRAME_LEN: usize = 1518;
/// Unit MTU.
pub const MTU: usize = 1500;
/// Length of the destination+source+ethertype header.
pub const HEADER_LEN: usize = 14;

/// Leading pad bytes RXQ reads carry with `RXIPHTOE` enabled (§4.B):
/// two dummy bytes ahead of the frame itself so the header lands
/// 4-byte aligned. Present at the front of the RX staging buffer;
/// stripped before `Frame::from_wire` sees the buffer.
pub const RX_ALIGN_PAD: usize = 2;

/// Capacity of the RX staging buffer: two alignment bytes, the maximum
/// frame, and a 4-byte FCS, rounded up to a 4-byte DMA boundary.
pub const STAGING_BUFFER_LEN: usize = (RX_ALIGN_PAD + MAX_FRAME_LEN + 4 + 3) & !3;

/// A frame staged in or out of the chip's FIFO.
///
/// Cooked mode strips the 14-byte header before handing payload to a
/// client and prepends it when building a frame for transmission; raw
/// mode preserves the header in both directions.
#[derive(Clone)]
pub struct Frame {
    pub dst: [u8; 6],
    pub src: [u8; 6],
    pub ethertype: u16,
    /// Payload bytes, header-stripped.
    pub payload: [u8; MTU],
    pub payload_len: usize,
}

impl Frame {
    pub fn empty() -> Self {
        Self {
            dst: [0; 6],
            src: [0; 6],
            ethertype: 0,
            payload: [0; MTU],
            payload_len: 0,
        }
    }

    pub fn is_broadcast(&self) -> bool {
        self.dst == [0xFF; 6]
    }

    /// The chip (and IEEE 802.3) convention: bit 0 of the first
    /// destination byte marks group addresses (broadcast or multicast).
    pub fn is_group_addressed(&self) -> bool {
        self.dst[0] & 0x01 != 0
    }

    pub fn is_multicast(&self) -> bool {
        self.is_group_addressed() && !self.is_broadcast()
    }

    /// Parses a staged frame out of a raw byte buffer (wire order:
    /// dst, src, ethertype, payload). Returns `None` if `raw` is shorter
    /// than a header.
    pub fn from_wire(raw: &[u8]) -> Option<Self> {
        if raw.len() < HEADER_LEN {
            return None;
        }
        let mut f = Self::empty();
        f.dst.copy_from_slice(&raw[0..6]);
        f.src.copy_from_slice(&raw[6..12]);
        f.ethertype = u16::from_be_bytes([raw[12], raw[13]]);
        let payload = &raw[HEADER_LEN..];
        let n = payload.len().min(MTU);
        f.payload[..n].copy_from_slice(&payload[..n]);
        f.payload_len = n;
        Some(f)
    }
}
