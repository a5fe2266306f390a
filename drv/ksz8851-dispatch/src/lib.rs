// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Request/queue layer for a KSZ8851 unit: client lifecycle, the unit
//! state machine (§4.G), per-client and orphan read queues, the
//! §4.F read-fulfillment algorithm, and the §4.E interrupt pump.
//!
//! Written `no_std` but `#[cfg(test)]`-built against `std`, same
//! pattern as `ksz8851-core`.

#![cfg_attr(not(test), no_std)]

pub mod client;
pub mod config;
pub mod interface;
pub mod limits;
pub mod mcast;
pub mod pump;
pub mod queue;
pub mod request;
pub mod request_id;
pub mod state;
pub mod track;

#[cfg(test)]
mod test_support;

pub use client::Client;
pub use config::ConfigSource;
pub use interface::{ClientId, Completion, Interface};
pub use queue::Handle;
pub use request::{EventRequest, ReadOutcome, ReadRequest, WriteRequest};
pub use request_id::Locus;
pub use state::UnitState;
