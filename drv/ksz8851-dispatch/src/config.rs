// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Consumption seam for the configuration-file collaborator (§6
//! ambient, §9 resolved open question). The line-oriented `KEY value`
//! parser itself is an explicit Non-goal; this crate only defines what
//! it needs out of one.

/// The fallback station address used when no configuration override is
/// present, matching the hard-coded constant in the original source
/// (§9: "treat the hard-coded constant as the fallback only").
pub const FALLBACK_STATION_MAC: [u8; 6] = [0x02, 0x34, 0x56, 0x78, 0x9a, 0xbc];

/// What `config-interface` consults before falling back to
/// [`FALLBACK_STATION_MAC`]. A host binds this to its config-file
/// parser; tests bind it to a fixed value or `()`.
pub trait ConfigSource {
    /// Returns the `MACADDR` override, if the configuration file set
    /// one.
    fn station_mac_override(&self) -> Option<[u8; 6]>;
}

impl ConfigSource for () {
    fn station_mac_override(&self) -> Option<[u8; 6]> {
        None
    }
}
