// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The top-level `Interface` (§3): ties the chip control engine, the
//! per-client/orphan/write/event queues, the unit state machine, and
//! the track/multicast lists together into the one object a host
//! integration drives.

use crate::client::Client;
use crate::config::{ConfigSource, FALLBACK_STATION_MAC};
use crate::limits::{MAX_CLIENTS, MAX_COMPLETIONS, MAX_EVENTS, MAX_ORPHAN, MAX_WRITE};
use crate::mcast::McastList;
use crate::queue::{Handle, Queue};
use crate::request::{EventRequest, ReadOutcome, ReadRequest, WriteRequest};
use crate::request_id::{self, Locus};
use crate::state::UnitState;
use crate::track::TrackList;
use ksz8851_api::{
    ClientHooks, DeviceQueryResult, Error, EventFlags, NsDeviceQueryResult, RequestId, WireError,
};
use ksz8851_core::bus::RawBus;
use ksz8851_core::chip::ChipContext;
use ksz8851_core::frame::{Frame, HEADER_LEN, MTU};
use ksz8851_core::rx::FrameSink;
use ksz8851_core::tx;
use platform_api::Platform;
use ringbuf::*;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Count)]
enum Trace {
    None,
    Online,
    Offline,
    FrameDropped,
    FrameDeliveredToClient(u8),
    FrameDeliveredToOrphan,
}
counted_ringbuf!(Trace, 32, Trace::None);

/// Maps the chip-control error taxonomy onto the wider driver one;
/// kept as a free function rather than a `From` impl since both types
/// are foreign to this crate.
fn map_core_error(e: ksz8851_core::Error) -> Error {
    match e {
        ksz8851_core::Error::NoChip => Error::NoChip,
        ksz8851_core::Error::InvalidLength => Error::InvalidLength,
        ksz8851_core::Error::NoSpace => Error::NoSpace,
    }
}

/// Opaque handle to an open client, returned by [`Interface::open`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ClientId(pub(crate) Handle);

/// Result of a completed request: the id it was submitted as, and
/// either success or the wire-error to report. `submit_*` calls that
/// resolve in the caller's own context return their outcome directly;
/// this is only for completions that happen later (read fulfillment,
/// event fan-out, abort).
#[derive(Copy, Clone, Debug)]
pub struct Completion {
    pub id: RequestId,
    pub result: Result<(), WireError>,
    /// Populated for read completions (§4.F step 4); `None` for
    /// writes, events, and aborts.
    pub outcome: Option<ReadOutcome>,
}

fn packet_type_matches(requested: u16, ethertype: u16) -> bool {
    requested == ethertype || (requested <= 1500 && ethertype <= 1500)
}

pub struct Interface<B, P, H, C> {
    chip: ChipContext<B, P>,
    state: UnitState,
    station_mac: [u8; 6],
    clients: Queue<Client<H>, MAX_CLIENTS>,
    orphan: Queue<(Handle, ReadRequest), MAX_ORPHAN>,
    write: Queue<WriteRequest, MAX_WRITE>,
    events: Queue<EventRequest, MAX_EVENTS>,
    track: TrackList,
    mcast: McastList,
    promiscuous: bool,
    config: C,
    completions: Queue<Completion, MAX_COMPLETIONS>,
}

impl<B: RawBus, P: Platform, H: ClientHooks, C: ConfigSource> Interface<B, P, H, C> {
    pub fn new(chip: ChipContext<B, P>, config: C) -> Self {
        Self {
            chip,
            state: UnitState::empty(),
            station_mac: FALLBACK_STATION_MAC,
            clients: Queue::new(),
            orphan: Queue::new(),
            write: Queue::new(),
            events: Queue::new(),
            track: TrackList::new(),
            mcast: McastList::new(),
            promiscuous: false,
            config,
            completions: Queue::new(),
        }
    }

    pub fn state(&self) -> UnitState {
        self.state
    }

    pub fn station_mac(&self) -> [u8; 6] {
        self.station_mac
    }

    pub fn chip(&self) -> &ChipContext<B, P> {
        &self.chip
    }

    /// Drains one buffered completion for the host IPC layer to reply
    /// with.
    pub fn take_completion(&mut self) -> Option<Completion> {
        self.completions.pop_front()
    }

    fn complete(&mut self, id: RequestId, result: Result<(), Error>) {
        self.complete_with_outcome(id, result, None);
    }

    fn complete_with_outcome(
        &mut self,
        id: RequestId,
        result: Result<(), Error>,
        outcome: Option<ReadOutcome>,
    ) {
        let result = result.map_err(Error::wire_error);
        // A full completion ring means the host isn't draining fast
        // enough; there's no good recovery, so the oldest unclaimed
        // completion is dropped in favor of this one.
        if self.completions.is_full() {
            self.completions.pop_front();
        }
        let _ = self.completions.push_back(Completion { id, result, outcome });
    }

    pub(crate) fn fire_event(&mut self, flag: EventFlags) {
        let mut matches: [Option<Handle>; MAX_EVENTS] = [None; MAX_EVENTS];
        let mut n = 0;
        for (h, req) in self.events.iter() {
            if req.mask.intersects(flag) {
                matches[n] = Some(h);
                n += 1;
            }
        }
        for h in matches[..n].iter().flatten() {
            if self.events.remove(*h).is_some() {
                let id = request_id::encode(Locus::Event, *h);
                self.complete(id, Ok(()));
            }
        }
    }

    // ---- client lifecycle -------------------------------------------

    pub fn open(&mut self, hooks: H) -> Option<ClientId> {
        self.clients.push_back(Client::new(hooks)).ok().map(ClientId)
    }

    /// Closes a client, draining every read it owns. Ownership of the
    /// requests reverts to the caller (§3 `Request` invariant); there
    /// is nowhere left to report completion since the client handle
    /// itself no longer resolves.
    pub fn close(&mut self, id: ClientId) {
        if let Some(mut client) = self.clients.remove(id.0) {
            while client.reads.pop_front().is_some() {}
        }
    }

    fn hooks(&self, id: ClientId) -> Option<&H> {
        self.clients.get(id.0).map(|c| &c.hooks)
    }

    // ---- state machine (§4.G) ---------------------------------------

    pub fn config_interface(&mut self, mac_override: Option<[u8; 6]>) -> Result<(), Error> {
        if self.state.is_configured() {
            return Err(Error::BadState);
        }
        self.station_mac = mac_override
            .or_else(|| self.config.station_mac_override())
            .unwrap_or(FALLBACK_STATION_MAC);
        self.state.insert(UnitState::CONFIG);
        self.online()
    }

    /// Idempotent once already online.
    pub fn online(&mut self) -> Result<(), Error> {
        if !self.state.is_configured() {
            return Err(Error::BadState);
        }
        if self.state.is_online() {
            return Ok(());
        }
        self.chip.probe().map_err(map_core_error)?;
        self.chip.init();
        self.chip.set_station_mac(self.station_mac);
        self.recompute_hash_filter();
        self.chip.enable_tx_rx();
        self.chip.bus().platform().enable_chip_interrupt();
        self.chip
            .enable_interrupts(ChipContext::<B, P>::standard_interrupt_mask());
        self.state.insert(UnitState::ONLINE);
        ringbuf_entry!(Trace::Online);
        self.fire_event(EventFlags::ONLINE);
        Ok(())
    }

    pub fn offline(&mut self) -> Result<(), Error> {
        if !self.state.is_online() {
            return Err(Error::BadState);
        }
        self.state.remove(UnitState::ONLINE);
        ringbuf_entry!(Trace::Offline);
        self.fire_event(EventFlags::OFFLINE);
        self.flush();
        self.chip.disable_tx_rx();
        self.chip.disable_interrupts();
        self.chip.bus().platform().disable_chip_interrupt();
        Ok(())
    }

    /// Requires `¬ONLINE`; callers are responsible for ensuring no
    /// client still has the unit open before calling this (the
    /// open-count bookkeeping lives in the out-of-scope host-OS
    /// device-service layer).
    pub fn expunge(mut self) {
        debug_assert!(!self.state.is_online());
        self.flush();
    }

    pub fn set_promiscuous(&mut self, promiscuous: bool) {
        self.promiscuous = promiscuous;
        self.state.set(UnitState::PROMISC, promiscuous);
        if self.state.is_online() {
            self.recompute_hash_filter();
        }
    }

    pub fn set_loopback(&mut self, loopback: bool) {
        self.state.set(UnitState::LOOPBACK, loopback);
    }

    pub fn set_exclusive(&mut self, exclusive: bool) -> Result<(), Error> {
        if exclusive && self.clients.len() > 1 {
            return Err(Error::BadState);
        }
        self.state.set(UnitState::EXCLUSIVE, exclusive);
        Ok(())
    }

    fn recompute_hash_filter(&self) {
        self.chip
            .program_multicast_hash(self.mcast.hash_table(), self.promiscuous);
    }

    /// Drains every queue, used on `offline`/`expunge`. The unit is
    /// tearing down, so requests are dropped rather than individually
    /// completed; by the time a host replies the IPC channel behind
    /// them may already be gone.
    fn flush(&mut self) {
        while self.orphan.pop_front().is_some() {}
        while self.write.pop_front().is_some() {}
        while self.events.pop_front().is_some() {}

        let mut handles: [Option<Handle>; MAX_CLIENTS] = [None; MAX_CLIENTS];
        let mut n = 0;
        for (h, _) in self.clients.iter() {
            handles[n] = Some(h);
            n += 1;
        }
        for h in handles[..n].iter().flatten() {
            if let Some(client) = self.clients.get_mut(*h) {
                while client.reads.pop_front().is_some() {}
            }
        }
    }

    // ---- tracking (§4.F) ---------------------------------------------

    pub fn track_type(&mut self, ethertype: u16) -> Result<(), Error> {
        self.track.track(ethertype)
    }

    pub fn untrack_type(&mut self, ethertype: u16) -> Result<(), Error> {
        self.track.untrack(ethertype)
    }

    // ---- multicast (§4.B) ---------------------------------------------

    pub fn add_multicast(&mut self, mac: [u8; 6]) -> Result<(), Error> {
        if !self.mcast.add(mac) {
            return Err(Error::NoSpace);
        }
        if self.state.is_online() {
            self.recompute_hash_filter();
        }
        Ok(())
    }

    pub fn remove_multicast(&mut self, mac: [u8; 6]) {
        self.mcast.remove(mac);
        if self.state.is_online() {
            self.recompute_hash_filter();
        }
    }

    // ---- queries --------------------------------------------------------

    pub fn get_station_address(&self) -> [u8; 6] {
        self.station_mac
    }

    pub fn device_query(&self) -> DeviceQueryResult {
        DeviceQueryResult::default()
    }

    pub fn ns_device_query(&self) -> NsDeviceQueryResult {
        NsDeviceQueryResult::default()
    }

    // ---- request submission (§3, §4.C) -----------------------------------

    pub fn submit_read(&mut self, client: ClientId, req: ReadRequest) -> Result<RequestId, Error> {
        if !self.state.is_online() {
            return Err(Error::BadState);
        }
        let slot = client.0.index;
        let Some(c) = self.clients.get_mut(client.0) else {
            return Err(Error::BadArgument);
        };
        let handle = c.reads.push_back(req).map_err(|_| Error::NoSpace)?;
        Ok(request_id::encode(Locus::ClientRead(slot), handle))
    }

    pub fn submit_read_orphan(
        &mut self,
        client: ClientId,
        req: ReadRequest,
    ) -> Result<RequestId, Error> {
        if !self.state.is_online() {
            return Err(Error::BadState);
        }
        if self.hooks(client).is_none() {
            return Err(Error::BadArgument);
        }
        let handle = self
            .orphan
            .push_back((client.0, req))
            .map_err(|_| Error::NoSpace)?;
        Ok(request_id::encode(Locus::Orphan, handle))
    }

    pub fn on_event(&mut self, mask: EventFlags) -> Result<RequestId, Error> {
        let handle = self
            .events
            .push_back(EventRequest { mask })
            .map_err(|_| Error::NoSpace)?;
        Ok(request_id::encode(Locus::Event, handle))
    }

    /// Services `write`/`broadcast`/`multicast-write` (§4.C): copies
    /// the payload out of the client's buffer and hands it to the
    /// chip-control transmit path inline, in the submitter's own
    /// context (`Command::perform_now`).
    pub fn submit_write(&mut self, client: ClientId, req: WriteRequest) -> Result<(), Error> {
        if !self.state.is_online() {
            return Err(Error::BadState);
        }
        if req.len > MTU {
            return Err(Error::InvalidLength);
        }
        let Some(hooks) = self.hooks(client) else {
            return Err(Error::BadArgument);
        };
        let mut staging = [0u8; MTU];
        if !hooks.copy_from_client(&mut staging[..req.len], req.buffer) {
            return Err(Error::NoSpace);
        }

        // Tracked only for the duration of the chip call, so a
        // concurrent abort or flush has something to find; the TX
        // path never actually suspends.
        let handle = self.write.push_back(req).map_err(|_| Error::NoSpace)?;
        let result = if req.raw {
            tx::send(&self.chip, &staging[..req.len]).map(|_| ())
        } else {
            tx::send_cooked(&self.chip, req.dst, req.src, req.ethertype, &staging[..req.len])
                .map(|_| ())
        };
        self.write.remove(handle);
        self.fire_event(EventFlags::TX);
        result.map_err(map_core_error)
    }

    pub fn submit_broadcast(
        &mut self,
        client: ClientId,
        buffer: ksz8851_api::ClientBuffer,
        len: usize,
        ethertype: u16,
    ) -> Result<(), Error> {
        self.submit_write(
            client,
            WriteRequest {
                buffer,
                len,
                raw: false,
                dst: [0xFF; 6],
                src: self.station_mac,
                ethertype,
            },
        )
    }

    pub fn submit_multicast_write(
        &mut self,
        client: ClientId,
        buffer: ksz8851_api::ClientBuffer,
        len: usize,
        ethertype: u16,
        dst: [u8; 6],
    ) -> Result<(), Error> {
        self.submit_write(
            client,
            WriteRequest {
                buffer,
                len,
                raw: false,
                dst,
                src: self.station_mac,
                ethertype,
            },
        )
    }

    // ---- abort (§5) -------------------------------------------------

    /// Locates `id` in whichever queue it occupies and cancels it,
    /// reporting `Error::Aborted` through the completion queue.
    /// Returns `false` if the id no longer names a live request (it
    /// may already have been fulfilled or aborted).
    pub fn abort(&mut self, id: RequestId) -> bool {
        let (locus, handle) = request_id::decode(id);
        let removed = match locus {
            Locus::ClientRead(slot) => {
                let found = self
                    .clients
                    .iter()
                    .find(|(h, _)| h.index == slot)
                    .map(|(h, _)| h);
                match found {
                    Some(ch) => self
                        .clients
                        .get_mut(ch)
                        .map(|c| c.reads.remove(handle).is_some())
                        .unwrap_or(false),
                    None => false,
                }
            }
            Locus::Orphan => self.orphan.remove(handle).is_some(),
            Locus::Write => self.write.remove(handle).is_some(),
            Locus::Event => self.events.remove(handle).is_some(),
        };
        if removed {
            self.complete(id, Err(Error::Aborted));
        }
        removed
    }

    // ---- read fulfillment (§4.F) --------------------------------------

    fn find_client_match(&self, ethertype: u16, raw: &[u8]) -> Option<(Handle, Handle)> {
        for (client_handle, client) in self.clients.iter() {
            for (read_handle, req) in client.reads.iter() {
                if !packet_type_matches(req.packet_type, ethertype) {
                    continue;
                }
                let id = request_id::encode(Locus::ClientRead(client_handle.index), read_handle);
                if client.hooks.filter(id, raw) {
                    return Some((client_handle, read_handle));
                }
            }
        }
        None
    }

    fn find_orphan_match(&self, raw: &[u8]) -> Option<Handle> {
        for (h, (client_handle, req)) in self.orphan.iter() {
            let Some(client) = self.clients.get(*client_handle) else {
                continue;
            };
            let _ = req;
            let id = request_id::encode(Locus::Orphan, h);
            if client.hooks.filter(id, raw) {
                return Some(h);
            }
        }
        None
    }

    fn outcome_for(frame: &Frame, data_length: usize) -> ReadOutcome {
        ReadOutcome {
            src: frame.src,
            dst: frame.dst,
            ethertype: frame.ethertype,
            data_length,
            broadcast: frame.is_broadcast(),
            multicast: frame.is_multicast(),
        }
    }

    /// Dispatches one received frame per §4.F: try every matching,
    /// filter-accepting client read in FIFO order across clients in
    /// slot order; on a miss, fall through to the orphan queue; on a
    /// miss there too, the frame is dropped. At most one request is
    /// fulfilled per frame (exactly-once delivery).
    pub(crate) fn deliver_frame(&mut self, frame: Frame) {
        self.track.note_frame(frame.ethertype, frame.payload_len);

        let mut raw_buf = [0u8; HEADER_LEN + MTU];
        raw_buf[0..6].copy_from_slice(&frame.dst);
        raw_buf[6..12].copy_from_slice(&frame.src);
        raw_buf[12..14].copy_from_slice(&frame.ethertype.to_be_bytes());
        raw_buf[HEADER_LEN..HEADER_LEN + frame.payload_len]
            .copy_from_slice(&frame.payload[..frame.payload_len]);
        let raw_len = HEADER_LEN + frame.payload_len;

        if let Some((client_handle, read_handle)) =
            self.find_client_match(frame.ethertype, &raw_buf[..raw_len])
        {
            if let Some(client) = self.clients.get_mut(client_handle) {
                if let Some(req) = client.reads.remove(read_handle) {
                    let bytes: &[u8] = if req.raw {
                        &raw_buf[..raw_len]
                    } else {
                        &frame.payload[..frame.payload_len]
                    };
                    let id = request_id::encode(Locus::ClientRead(client_handle.index), read_handle);
                    let result = if client.hooks.copy_to_client(req.buffer, bytes) {
                        Ok(())
                    } else {
                        Err(Error::NoSpace)
                    };
                    ringbuf_entry!(Trace::FrameDeliveredToClient(client_handle.index));
                    let outcome = Self::outcome_for(&frame, bytes.len());
                    self.complete_with_outcome(id, result, Some(outcome));
                    return;
                }
            }
        }

        if let Some(h) = self.find_orphan_match(&raw_buf[..raw_len]) {
            if let Some((client_handle, req)) = self.orphan.remove(h) {
                if let Some(client) = self.clients.get(client_handle) {
                    let bytes: &[u8] = if req.raw {
                        &raw_buf[..raw_len]
                    } else {
                        &frame.payload[..frame.payload_len]
                    };
                    let id = request_id::encode(Locus::Orphan, h);
                    let result = if client.hooks.copy_to_client(req.buffer, bytes) {
                        Ok(())
                    } else {
                        Err(Error::NoSpace)
                    };
                    ringbuf_entry!(Trace::FrameDeliveredToOrphan);
                    let outcome = Self::outcome_for(&frame, bytes.len());
                    self.complete_with_outcome(id, result, Some(outcome));
                    return;
                }
            }
        }

        ringbuf_entry!(Trace::FrameDropped);
    }
}

impl<B: RawBus, P: Platform, H: ClientHooks, C: ConfigSource> FrameSink for Interface<B, P, H, C> {
    fn deliver(&mut self, frame: Frame) {
        self.deliver_frame(frame);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakePlatform, FakeRawBus};
    use ksz8851_api::ClientBuffer;
    use std::cell::{Cell, RefCell};

    /// A `ClientHooks` fake that records what it was handed and can be
    /// told to veto (`filter`) or fail (`copy_to_client`) on demand.
    struct RecordingHooks {
        received: RefCell<Vec<u8>>,
        accept: Cell<bool>,
        accept_copy: Cell<bool>,
    }

    impl RecordingHooks {
        fn new() -> Self {
            Self {
                received: RefCell::new(Vec::new()),
                accept: Cell::new(true),
                accept_copy: Cell::new(true),
            }
        }
    }

    impl ClientHooks for RecordingHooks {
        fn copy_to_client(&self, _dst: ClientBuffer, src: &[u8]) -> bool {
            if !self.accept_copy.get() {
                return false;
            }
            self.received.borrow_mut().extend_from_slice(src);
            true
        }
        fn copy_from_client(&self, dst: &mut [u8], _src: ClientBuffer) -> bool {
            dst.fill(0xAB);
            true
        }
        fn filter(&self, _request: RequestId, _raw_frame: &[u8]) -> bool {
            self.accept.get()
        }
    }

    type TestIface = Interface<FakeRawBus, FakePlatform, RecordingHooks, ()>;

    fn new_iface() -> TestIface {
        let chip = ChipContext::new(FakeRawBus::new(), FakePlatform::new());
        let mut iface = Interface::new(chip, ());
        iface.config_interface(None).unwrap();
        iface
    }

    fn frame(ethertype: u16, payload: &[u8]) -> Frame {
        let mut f = Frame::empty();
        f.dst = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06];
        f.src = [0x11, 0x12, 0x13, 0x14, 0x15, 0x16];
        f.ethertype = ethertype;
        f.payload[..payload.len()].copy_from_slice(payload);
        f.payload_len = payload.len();
        f
    }

    #[test]
    fn packet_type_matches_exact_ethertype_or_both_length_fields() {
        assert!(packet_type_matches(0x0800, 0x0800));
        assert!(!packet_type_matches(0x0800, 0x0806));
        assert!(packet_type_matches(100, 200)); // both length fields (<=1500)
        assert!(!packet_type_matches(100, 0x0800)); // one length, one ethertype
    }

    #[test]
    fn state_transitions_are_monotonic_and_guarded() {
        let chip = ChipContext::new(FakeRawBus::new(), FakePlatform::new());
        let mut iface: TestIface = Interface::new(chip, ());

        // Can't go online before configuring.
        assert_eq!(iface.online(), Err(Error::BadState));
        assert!(!iface.state().is_online());

        iface.config_interface(None).unwrap();
        assert!(iface.state().is_configured());
        assert!(iface.state().is_online());

        // Configuring twice is rejected.
        assert_eq!(iface.config_interface(None), Err(Error::BadState));

        // online() is idempotent once already online.
        assert_eq!(iface.online(), Ok(()));

        iface.offline().unwrap();
        assert!(!iface.state().is_online());

        // offline() while already offline is rejected.
        assert_eq!(iface.offline(), Err(Error::BadState));
    }

    #[test]
    fn exactly_once_delivery_to_a_single_matching_client_read() {
        let mut iface = new_iface();
        let client = iface.open(RecordingHooks::new()).unwrap();
        let id = iface
            .submit_read(
                client,
                ReadRequest {
                    packet_type: 0x0800,
                    buffer: ClientBuffer(0),
                    raw: false,
                },
            )
            .unwrap();

        iface.deliver_frame(frame(0x0800, &[1, 2, 3, 4]));

        let completion = iface.take_completion().expect("read should complete");
        assert_eq!(completion.id, id);
        assert!(completion.result.is_ok());
        // No second completion: the request is gone, not re-matched.
        assert!(iface.take_completion().is_none());
    }

    #[test]
    fn client_reads_take_priority_over_orphan_reads() {
        let mut iface = new_iface();
        let client = iface.open(RecordingHooks::new()).unwrap();
        let client_id = iface
            .submit_read(
                client,
                ReadRequest {
                    packet_type: 0x0800,
                    buffer: ClientBuffer(0),
                    raw: false,
                },
            )
            .unwrap();
        let orphan_id = iface
            .submit_read_orphan(
                client,
                ReadRequest {
                    packet_type: 0x0800,
                    buffer: ClientBuffer(1),
                    raw: false,
                },
            )
            .unwrap();

        iface.deliver_frame(frame(0x0800, &[9, 9]));

        let completion = iface.take_completion().expect("one request should complete");
        assert_eq!(completion.id, client_id);
        assert_ne!(completion.id, orphan_id);
        // The orphan read is still pending; abort should still find it.
        assert!(iface.abort(orphan_id));
    }

    #[test]
    fn orphan_read_is_used_when_no_client_read_matches() {
        let mut iface = new_iface();
        let client = iface.open(RecordingHooks::new()).unwrap();
        let orphan_id = iface
            .submit_read_orphan(
                client,
                ReadRequest {
                    packet_type: 0x0800,
                    buffer: ClientBuffer(0),
                    raw: false,
                },
            )
            .unwrap();

        iface.deliver_frame(frame(0x0800, &[5, 6, 7]));

        let completion = iface.take_completion().expect("orphan read should complete");
        assert_eq!(completion.id, orphan_id);
    }

    #[test]
    fn a_vetoing_filter_falls_through_to_the_next_candidate() {
        let mut iface = new_iface();
        let picky = iface.open(RecordingHooks::new()).unwrap();
        let permissive = iface.open(RecordingHooks::new()).unwrap();

        iface.hooks(picky).unwrap().accept.set(false);

        let picky_id = iface
            .submit_read(
                picky,
                ReadRequest {
                    packet_type: 0x0800,
                    buffer: ClientBuffer(0),
                    raw: false,
                },
            )
            .unwrap();
        let permissive_id = iface
            .submit_read(
                permissive,
                ReadRequest {
                    packet_type: 0x0800,
                    buffer: ClientBuffer(0),
                    raw: false,
                },
            )
            .unwrap();

        iface.deliver_frame(frame(0x0800, &[1]));

        let completion = iface.take_completion().expect("the permissive read should complete");
        assert_eq!(completion.id, permissive_id);
        // The vetoing read is untouched and can still be aborted.
        assert!(iface.abort(picky_id));
    }

    #[test]
    fn unmatched_frame_is_dropped_without_a_completion() {
        let mut iface = new_iface();
        let client = iface.open(RecordingHooks::new()).unwrap();
        iface
            .submit_read(
                client,
                ReadRequest {
                    packet_type: 0x0800,
                    buffer: ClientBuffer(0),
                    raw: false,
                },
            )
            .unwrap();

        iface.deliver_frame(frame(0x88CC, &[1, 2]));
        assert!(iface.take_completion().is_none());
    }

    #[test]
    fn abort_removes_a_queued_read_and_reports_aborted() {
        let mut iface = new_iface();
        let client = iface.open(RecordingHooks::new()).unwrap();
        let id = iface
            .submit_read(
                client,
                ReadRequest {
                    packet_type: 0x0800,
                    buffer: ClientBuffer(0),
                    raw: false,
                },
            )
            .unwrap();

        assert!(iface.abort(id));
        // Can't abort the same request twice.
        assert!(!iface.abort(id));

        let completion = iface.take_completion().expect("abort should complete the request");
        assert_eq!(completion.id, id);
        assert_eq!(completion.result, Err(Error::Aborted.wire_error()));

        // The frame that would have matched now has nothing to land on.
        iface.deliver_frame(frame(0x0800, &[1, 2, 3]));
        assert!(iface.take_completion().is_none());
    }

    #[test]
    fn closing_a_client_drains_its_reads_without_completing_them() {
        let mut iface = new_iface();
        let client = iface.open(RecordingHooks::new()).unwrap();
        iface
            .submit_read(
                client,
                ReadRequest {
                    packet_type: 0x0800,
                    buffer: ClientBuffer(0),
                    raw: false,
                },
            )
            .unwrap();

        iface.close(client);

        // Ownership reverted to the caller; nothing shows up as a
        // completion, and the unit no longer knows this client.
        assert!(iface.take_completion().is_none());
        assert!(iface.hooks(client).is_none());
    }

    #[test]
    fn events_fire_exactly_once_and_only_for_matching_flags() {
        let mut iface = new_iface();
        let link_id = iface.on_event(EventFlags::LINK_CHANGE).unwrap();
        let tx_id = iface.on_event(EventFlags::TX).unwrap();

        iface.fire_event(EventFlags::LINK_CHANGE);

        let completion = iface.take_completion().expect("link change should fire");
        assert_eq!(completion.id, link_id);
        assert!(iface.take_completion().is_none());

        // The TX event is untouched; it hasn't fired yet.
        assert!(iface.abort(tx_id));
    }

    #[test]
    fn writes_over_mtu_are_rejected() {
        let mut iface = new_iface();
        let client = iface.open(RecordingHooks::new()).unwrap();
        let result = iface.submit_write(
            client,
            WriteRequest {
                buffer: ClientBuffer(0),
                len: MTU + 1,
                raw: false,
                dst: [0xFF; 6],
                src: [0; 6],
                ethertype: 0x0800,
            },
        );
        assert_eq!(result, Err(Error::InvalidLength));
    }

    #[test]
    fn exclusive_mode_is_rejected_with_more_than_one_open_client() {
        let mut iface = new_iface();
        let _a = iface.open(RecordingHooks::new()).unwrap();
        let _b = iface.open(RecordingHooks::new()).unwrap();
        assert_eq!(iface.set_exclusive(true), Err(Error::BadState));
    }
}
