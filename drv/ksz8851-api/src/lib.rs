// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wire types shared between the dispatcher and its callers: request
//! tags, client hook traits, device-query results, and the driver's
//! error taxonomy. Kept separate from `ksz8851-dispatch` so that a
//! client-side adapter can depend on just the types it needs to submit
//! requests, the way `drv_spi_api` is split from the SPI server task.

#![no_std]

use bitflags::bitflags;

/// Opaque handle to a request once it has been accepted into a queue.
/// Used by the filter hook (to name which request is being previewed)
/// and by caller-issued abort.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct RequestId(pub u32);

/// An opaque token identifying a client-owned buffer. The driver never
/// interprets this value; it is handed back to the client's copy hooks
/// verbatim. A host adapter is free to make it a raw pointer cast to
/// `usize`, an index into a buffer pool, or anything else appropriate
/// for its register-argument calling convention (see the design notes
/// on assembly calling hooks: the driver core must not encode that
/// discipline).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ClientBuffer(pub usize);

/// The request-tag surface clients submit to the driver.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Command {
    Read,
    Write,
    Flush,
    DeviceQuery,
    GetStationAddress,
    ConfigInterface,
    MulticastWrite,
    Broadcast,
    TrackType,
    UntrackType,
    GetGlobalStats,
    OnEvent,
    ReadOrphan,
    Online,
    Offline,
    NsDeviceQuery,
    GetSpecialStats,
}

/// The full command set, in the order `ns-device-query` reports it.
pub const SUPPORTED_COMMANDS: &[Command] = &[
    Command::Read,
    Command::Write,
    Command::Flush,
    Command::DeviceQuery,
    Command::GetStationAddress,
    Command::ConfigInterface,
    Command::MulticastWrite,
    Command::Broadcast,
    Command::TrackType,
    Command::UntrackType,
    Command::GetGlobalStats,
    Command::OnEvent,
    Command::ReadOrphan,
    Command::Online,
    Command::Offline,
    Command::NsDeviceQuery,
    Command::GetSpecialStats,
];

impl Command {
    /// Commands in this set are serviced inline, in the submitter's own
    /// context, because their work is either queueing a request or an
    /// immediate reply; everything else is handed to the worker so that
    /// chip-affecting side effects serialize on the signal-bit owner.
    /// Grounded directly on the original driver's `PERFORM_NOW` command
    /// classification.
    pub fn perform_now(self) -> bool {
        matches!(
            self,
            Command::Write
                | Command::Read
                | Command::Broadcast
                | Command::MulticastWrite
                | Command::ReadOrphan
        )
    }
}

bitflags! {
    /// SANA-II style secondary ("wire") error code, carried alongside a
    /// request's primary completion status.
    #[derive(Copy, Clone, Debug, Eq, PartialEq)]
    pub struct WireError: u32 {
        const GENERIC_ERROR = 1 << 0;
        const BAD_STATE = 1 << 1;
        const MTU_EXCEEDED = 1 << 2;
        const NO_RESOURCES = 1 << 3;
        const ALREADY_TRACKED = 1 << 4;
        const NOT_TRACKED = 1 << 5;
        const BAD_ADDRESS = 1 << 6;
        const ABORTED = 1 << 7;
    }
}

bitflags! {
    /// Event classes the event queue is notified of, and the mask an
    /// `on-event` request registers interest in. Bit order here is the
    /// order in which two events observed in a single worker pass fire,
    /// per the ordering guarantees in the concurrency model.
    #[derive(Copy, Clone, Debug, Eq, PartialEq)]
    pub struct EventFlags: u32 {
        const LINK_CHANGE = 1 << 0;
        const TX = 1 << 1;
        const RX = 1 << 2;
        const BUFF = 1 << 3;
        const ONLINE = 1 << 4;
        const OFFLINE = 1 << 5;
    }
}

bitflags! {
    /// Per-request flags set on a completed read, mirroring
    /// `SANA2IOF_BCAST`/`SANA2IOF_MCAST`.
    #[derive(Copy, Clone, Debug, Eq, PartialEq)]
    pub struct FrameFlags: u32 {
        const BCAST = 1 << 0;
        const MCAST = 1 << 1;
        const RAW = 1 << 2;
    }
}

/// Driver-internal error taxonomy (§7). Mapped to `WireError` only at
/// this crate's boundary; internal crates never construct a wire-error
/// value directly.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Error {
    /// Probe failed to find the expected chip ID in either endian mode.
    NoChip,
    /// A submitted frame was shorter or longer than the chip/MTU allow.
    InvalidLength,
    /// TXQ does not have enough free memory for this frame right now.
    NoSpace,
    /// RX status register reported a corrupt or oversized frame.
    InvalidPacket,
    /// Request was cancelled by caller-issued abort.
    Aborted,
    /// Request requires a unit state the unit is not currently in.
    BadState,
    /// `track-type` named a type that is already tracked.
    AlreadyTracked,
    /// `untrack-type` named a type that isn't tracked.
    NotTracked,
    /// A device-query (or similar) buffer was malformed.
    BadArgument,
    /// A required pointer/hook was absent.
    NullPointer,
}

impl Error {
    /// Maps a driver-internal error to the wire-error reported to the
    /// caller alongside the primary completion status.
    pub fn wire_error(self) -> WireError {
        match self {
            Error::NoChip => WireError::GENERIC_ERROR,
            Error::InvalidLength => WireError::MTU_EXCEEDED,
            Error::NoSpace => WireError::NO_RESOURCES,
            Error::InvalidPacket => WireError::GENERIC_ERROR,
            Error::Aborted => WireError::ABORTED,
            Error::BadState => WireError::BAD_STATE,
            Error::AlreadyTracked => WireError::ALREADY_TRACKED,
            Error::NotTracked => WireError::NOT_TRACKED,
            Error::BadArgument => WireError::BAD_ADDRESS,
            Error::NullPointer => WireError::BAD_ADDRESS,
        }
    }
}

/// Hardware family reported by `device-query`/`ns-device-query`; this
/// driver only ever reports `Ethernet`, but the type exists so callers
/// don't have to special-case a bare constant.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum HardwareType {
    Ethernet,
}

/// Result of a `device-query` request. Field values are bit-exact with
/// what SANA-II Ethernet stacks expect.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct DeviceQueryResult {
    pub address_size_bits: u32,
    pub mtu: u32,
    pub bps: u32,
    pub hardware_type: HardwareType,
}

impl Default for DeviceQueryResult {
    fn default() -> Self {
        Self {
            address_size_bits: 48,
            mtu: 1500,
            bps: 10_000_000,
            hardware_type: HardwareType::Ethernet,
        }
    }
}

/// Result of an `ns-device-query` request.
#[derive(Copy, Clone, Debug)]
pub struct NsDeviceQueryResult {
    pub kind: u32,
    pub subtype: u32,
    pub supported_commands: &'static [Command],
}

/// `ns-device-query`'s `type` field, SANA2 per spec.
pub const NS_DEVICE_QUERY_TYPE_SANA2: u32 = 1;

impl Default for NsDeviceQueryResult {
    fn default() -> Self {
        Self {
            kind: NS_DEVICE_QUERY_TYPE_SANA2,
            subtype: 0,
            supported_commands: SUPPORTED_COMMANDS,
        }
    }
}

/// Client-supplied callbacks, installed at open via a tagged
/// key-value list. Any hook not provided defaults to the behavior
/// documented on each method: a no-op success for the copy hooks, and
/// accept-all for the filter hook.
pub trait ClientHooks {
    /// Copies `len` bytes from `src` into the client-owned buffer named
    /// by `dst`. Returns `false` on failure (e.g. the client's buffer
    /// was too small), which the driver reports as `NoResources`.
    fn copy_to_client(&self, dst: ClientBuffer, src: &[u8]) -> bool;

    /// Copies `dst.len()` bytes out of the client-owned buffer named by
    /// `src` into `dst`. Returns `false` on failure.
    fn copy_from_client(&self, dst: &mut [u8], src: ClientBuffer) -> bool;

    /// Previews a raw frame before it is delivered to `request`. A
    /// missing hook (the default) accepts unconditionally.
    fn filter(&self, request: RequestId, raw_frame: &[u8]) -> bool {
        let _ = (request, raw_frame);
        true
    }

    /// Optional direct-DMA variant of `copy_from_client`: returns a
    /// pointer/length pair for contiguous payload bytes the transmit
    /// path can stream from directly, bypassing the driver's staging
    /// buffer. Absent by default.
    fn dma_copy_from_client(&self, src: ClientBuffer) -> Option<(*const u8, usize)> {
        let _ = src;
        None
    }

    /// Optional direct-DMA variant of `copy_to_client`.
    fn dma_copy_to_client(&self, dst: ClientBuffer) -> Option<(*mut u8, usize)> {
        let _ = dst;
        None
    }
}
