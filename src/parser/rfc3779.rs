// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 U.S. Federal Government (in countries where recognized)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Decoding of the RFC 3779 resource extensions.
//!
//! ```text
//! IPAddrBlocks    ::= SEQUENCE OF IPAddressFamily
//! IPAddressFamily ::= SEQUENCE { addressFamily OCTET STRING, ipAddressChoice }
//! ASIdentifiers   ::= SEQUENCE { asnum [0] EXPLICIT ASIdentifierChoice OPTIONAL,
//!                                rdi   [1] EXPLICIT ASIdentifierChoice OPTIONAL }
//! ```

use crate::resources::{AsRange, IpRange, ResourceSet, Resources};
use der::asn1::{Any, BitString, OctetString};
use der::{Decode, Encode, Tag, TagNumber, Tagged};

const AFI_IPV4: [u8; 2] = [0, 1];
const AFI_IPV6: [u8; 2] = [0, 2];

type Result<T> = std::result::Result<T, String>;

/// Elements of a SEQUENCE held in an `Any`.
fn elements(any: &Any) -> Result<Vec<Any>> {
    if any.tag() != Tag::Sequence {
        return Err(format!("expected SEQUENCE, found {}", any.tag()));
    }
    let der = any.to_der().map_err(|e| e.to_string())?;
    Vec::<Any>::from_der(&der).map_err(|e| e.to_string())
}

/// Re-decode an `Any` as a concrete type.
fn decode<T: for<'a> Decode<'a>>(any: &Any) -> Result<T> {
    let der = any.to_der().map_err(|e| e.to_string())?;
    T::from_der(&der).map_err(|e| e.to_string())
}

/// Pack address bytes into a `width`-bit integer. Missing trailing bytes
/// and the `unused` low bits of the last byte are filled with ones when
/// `ones` is set.
fn pack(bytes: &[u8], unused: u8, width: u32, ones: bool) -> Result<u128> {
    let total = (width / 8) as usize;
    if bytes.len() > total {
        return Err("address longer than its family".to_string());
    }
    let fill = if ones { 0xff } else { 0x00 };
    let mut value: u128 = 0;
    for i in 0..total {
        let byte = bytes.get(i).copied().unwrap_or(fill);
        value = (value << 8) | u128::from(byte);
    }
    if ones && !bytes.is_empty() && unused > 0 {
        let shift = ((total - bytes.len()) * 8) as u32;
        value |= ((1u128 << unused) - 1) << shift;
    }
    Ok(value)
}

fn address_range(any: &Any, width: u32) -> Result<IpRange> {
    match any.tag() {
        Tag::BitString => {
            let prefix: BitString = decode(any)?;
            let bytes = prefix.raw_bytes();
            let unused = prefix.unused_bits();
            let min = pack(bytes, 0, width, false)?;
            let len = (bytes.len() * 8).saturating_sub(usize::from(unused));
            let len = u8::try_from(len).map_err(|_| "prefix too long".to_string())?;
            Ok(IpRange::from_prefix(min, len, width as u8))
        }
        Tag::Sequence => {
            let bounds = elements(any)?;
            let [lo, hi] = bounds.as_slice() else {
                return Err("address range must have two bounds".to_string());
            };
            let lo: BitString = decode(lo)?;
            let hi: BitString = decode(hi)?;
            let min = pack(lo.raw_bytes(), 0, width, false)?;
            let max = pack(hi.raw_bytes(), hi.unused_bits(), width, true)?;
            if min > max {
                return Err("inverted address range".to_string());
            }
            Ok(IpRange::new(min, max))
        }
        other => Err(format!("unexpected {other} in address list")),
    }
}

/// Decode the sbgp-ipAddrBlock extension value into `set`.
pub(crate) fn decode_ip_blocks(value: &[u8], set: &mut ResourceSet) -> Result<()> {
    let families = Vec::<Any>::from_der(value).map_err(|e| e.to_string())?;

    for family in &families {
        let parts = elements(family)?;
        let [afi, choice] = parts.as_slice() else {
            return Err("malformed IPAddressFamily".to_string());
        };
        let afi: OctetString = decode(afi)?;
        let afi = afi.as_bytes();
        if afi.len() < 2 || afi.len() > 3 {
            return Err("bad address family length".to_string());
        }

        let (slot, width) = match [afi[0], afi[1]] {
            AFI_IPV4 => (&mut set.ipv4, 32),
            AFI_IPV6 => (&mut set.ipv6, 128),
            _ => return Err("unknown address family".to_string()),
        };
        if !slot.is_absent() {
            return Err("duplicate address family".to_string());
        }

        *slot = match choice.tag() {
            Tag::Null => Resources::Inherit,
            Tag::Sequence => {
                let ranges = elements(choice)?
                    .iter()
                    .map(|entry| address_range(entry, width))
                    .collect::<Result<Vec<_>>>()?;
                Resources::Ranges(ranges)
            }
            other => return Err(format!("unexpected {other} in IPAddressChoice")),
        };
    }
    Ok(())
}

fn as_choice(any: &Any) -> Result<Resources<AsRange>> {
    match any.tag() {
        Tag::Null => Ok(Resources::Inherit),
        Tag::Sequence => {
            let mut ranges = Vec::new();
            for entry in elements(any)? {
                match entry.tag() {
                    Tag::Integer => ranges.push(AsRange::single(decode::<u32>(&entry)?)),
                    Tag::Sequence => {
                        let bounds = elements(&entry)?;
                        let [lo, hi] = bounds.as_slice() else {
                            return Err("AS range must have two bounds".to_string());
                        };
                        let (lo, hi) = (decode::<u32>(lo)?, decode::<u32>(hi)?);
                        if lo > hi {
                            return Err("inverted AS range".to_string());
                        }
                        ranges.push(AsRange::new(lo, hi));
                    }
                    other => return Err(format!("unexpected {other} in AS list")),
                }
            }
            Ok(Resources::Ranges(ranges))
        }
        other => Err(format!("unexpected {other} in ASIdentifierChoice")),
    }
}

/// Decode the sbgp-autonomousSysNum extension value into `set`.
///
/// Routing domain identifiers (`rdi`) are not used in the RPKI and are
/// rejected.
pub(crate) fn decode_as_ids(value: &[u8], set: &mut ResourceSet) -> Result<()> {
    let outer = Any::from_der(value).map_err(|e| e.to_string())?;

    for entry in elements(&outer)? {
        match entry.tag() {
            Tag::ContextSpecific {
                constructed: true,
                number: TagNumber::N0,
            } => {
                let inner = Any::from_der(entry.value()).map_err(|e| e.to_string())?;
                set.asns = as_choice(&inner)?;
            }
            Tag::ContextSpecific {
                constructed: true,
                number: TagNumber::N1,
            } => return Err("RDI resources are not allowed".to_string()),
            other => return Err(format!("unexpected {other} in ASIdentifiers")),
        }
    }
    Ok(())
}
