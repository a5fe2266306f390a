// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! One [`Client`] (§3 `BufferManagement`) per stack that has the device
//! open: its hook table and its owned read queue.

use crate::limits::MAX_CLIENT_READS;
use crate::queue::Queue;
use crate::request::ReadRequest;
use ksz8851_api::ClientHooks;

pub struct Client<H: ClientHooks> {
    pub hooks: H,
    pub reads: Queue<ReadRequest, MAX_CLIENT_READS>,
}

impl<H: ClientHooks> Client<H> {
    pub fn new(hooks: H) -> Self {
        Self {
            hooks,
            reads: Queue::new(),
        }
    }
}
