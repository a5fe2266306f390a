// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Request payloads for the four queues named in §3: a read waiting for
//! a matching packet type, a write that failed to dispatch inline and
//! is tracked only long enough to be aborted or flushed, and an event
//! wait. (`orphan` reuses [`ReadRequest`] with `packet_type` ignored.)

use ksz8851_api::{ClientBuffer, EventFlags};

/// A pending read, either in a client's typed queue or the unit's
/// orphan queue. `packet_type` is compared against an arriving frame's
/// ethertype per the class-match rule in §4.F step 2; orphan reads
/// ignore it entirely (any type is accepted).
#[derive(Copy, Clone, Debug)]
pub struct ReadRequest {
    pub packet_type: u16,
    /// Opaque client buffer the matched frame is copied into.
    pub buffer: ClientBuffer,
    /// `true` if this is a raw-mode read (header preserved, capped at
    /// `MTU + 14`); `false` for cooked (header stripped, capped at MTU).
    pub raw: bool,
}

/// A write that could not be dispatched to the chip synchronously in
/// the submitter's context (not expected to linger — §4.C's TX path
/// never suspends — but tracked here so a concurrent abort or a flush
/// during the call has something to find).
#[derive(Copy, Clone, Debug)]
pub struct WriteRequest {
    pub buffer: ClientBuffer,
    pub len: usize,
    pub raw: bool,
    pub dst: [u8; 6],
    pub src: [u8; 6],
    pub ethertype: u16,
}

/// A pending `on-event` wait, completed when a fired event's flags
/// intersect `mask`.
#[derive(Copy, Clone, Debug)]
pub struct EventRequest {
    pub mask: EventFlags,
}

/// What a completed read delivered to the client, populated per the
/// read fulfillment algorithm (§4.F step 4).
#[derive(Copy, Clone, Debug, Default)]
pub struct ReadOutcome {
    pub src: [u8; 6],
    pub dst: [u8; 6],
    pub ethertype: u16,
    pub data_length: usize,
    pub broadcast: bool,
    pub multicast: bool,
}
