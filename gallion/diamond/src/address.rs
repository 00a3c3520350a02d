// Copyright 2022-2024 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

use crate::{Address, Error};

/// Check that the string is `0x` followed by exactly 40 hex characters.
pub fn is_address(s: &str) -> bool {
    s.len() == 42
        && s.starts_with("0x")
        && s[2..].chars().all(|c| c.is_ascii_hexdigit())
}

/// Parse a `0x` prefixed hex address, rejecting anything of the wrong length or charset.
pub fn parse_address(s: &str) -> Result<Address, Error> {
    if !is_address(s) {
        return Err(Error::InvalidAddress(s.to_owned()));
    }
    let bytes = hex::decode(&s[2..]).map_err(|_| Error::InvalidAddress(s.to_owned()))?;
    Ok(Address::from_slice(&bytes))
}
