// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fixed capacities for the per-unit queues and tables (§3). Chosen to
//! comfortably cover the protocol stacks a single KSZ8851 unit is
//! expected to serve; raise them if a deployment needs more headroom,
//! they're not load-bearing on wire format.

/// Clients with the device open simultaneously.
pub const MAX_CLIENTS: usize = 4;
/// Pending reads per client.
pub const MAX_CLIENT_READS: usize = 8;
/// Pending orphan reads.
pub const MAX_ORPHAN: usize = 4;
/// Writes tracked between submission and inline dispatch.
pub const MAX_WRITE: usize = 4;
/// Pending `on-event` waits.
pub const MAX_EVENTS: usize = 8;
/// Distinct ethertypes tracked by `track-type` (§4.F "Tracking").
pub const MAX_TRACK: usize = 8;
/// Multicast address list capacity (§3 `Interface`: "fixed capacity
/// N=10").
pub const MAX_MCAST: usize = 10;
/// Completed requests buffered for the host IPC layer to drain before
/// it must call back in.
pub const MAX_COMPLETIONS: usize = 16;
/// Frames drained from RXQ in a single interrupt pump pass before
/// dispatch gets a chance to run again. The chip's own RX FIFO is the
/// real backpressure point; this just bounds the stack buffer the
/// pump stages them in.
pub const RX_BURST: usize = 8;
