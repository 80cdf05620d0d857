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

//! IP address and AS number resources (RFC 3779).
//!
//! Every resource certificate carries up to three resource families: AS
//! numbers, IPv4 and IPv6. Each family is either absent, `inherit`, or a
//! list of ranges. A child's resources must be covered by the effective
//! resources of its issuer, where `inherit` has been replaced by whatever
//! the issuer itself holds.
//!
//! # Example
//!
//! ```
//! use rpki_validator::resources::{IpRange, ResourceSet, Resources};
//!
//! let parent = ResourceSet {
//!     ipv4: Resources::Ranges(vec![IpRange::v4_prefix([10, 0, 0, 0], 8)]),
//!     ..Default::default()
//! };
//! let child = ResourceSet {
//!     ipv4: Resources::Ranges(vec![IpRange::v4_prefix([10, 1, 0, 0], 16)]),
//!     ..Default::default()
//! };
//!
//! assert!(child.covered_by(&parent).is_ok());
//! ```

use serde::Serialize;
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

/// A resource family as declared in a certificate.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub enum Resources<T> {
    /// The extension does not mention this family.
    #[default]
    Absent,
    /// The family is inherited from the issuer.
    Inherit,
    /// Explicit ranges.
    Ranges(Vec<T>),
}

impl<T> Resources<T> {
    /// Whether this family uses `inherit`.
    pub fn is_inherit(&self) -> bool {
        matches!(self, Self::Inherit)
    }

    /// Whether this family is absent.
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

impl<T: Clone> Resources<T> {
    /// Replace `inherit` with the issuer's effective value.
    pub fn resolve(&self, parent: &Resources<T>) -> Resources<T> {
        match self {
            Self::Inherit => parent.clone(),
            other => other.clone(),
        }
    }
}

/// An inclusive range of AS numbers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct AsRange {
    /// First AS number.
    pub min: u32,
    /// Last AS number.
    pub max: u32,
}

impl AsRange {
    /// A range covering a single AS number.
    pub fn single(asn: u32) -> Self {
        Self { min: asn, max: asn }
    }

    /// A range from `min` to `max`, inclusive.
    pub fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }
}

impl fmt::Display for AsRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.min == self.max {
            write!(f, "AS{}", self.min)
        } else {
            write!(f, "AS{}-AS{}", self.min, self.max)
        }
    }
}

/// An inclusive range of IP addresses.
///
/// IPv4 addresses are stored in the low 32 bits; the family is tracked by
/// which slot of [`ResourceSet`] the range lives in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct IpRange {
    /// First address.
    pub min: u128,
    /// Last address.
    pub max: u128,
}

impl IpRange {
    /// A range from `min` to `max`, inclusive.
    pub fn new(min: u128, max: u128) -> Self {
        Self { min, max }
    }

    /// The range spanned by an IPv4 prefix.
    pub fn v4_prefix(addr: [u8; 4], len: u8) -> Self {
        let bits = u128::from(u32::from_be_bytes(addr));
        Self::from_prefix(bits, len.min(32), 32)
    }

    /// The range spanned by an IPv6 prefix.
    pub fn v6_prefix(addr: [u8; 16], len: u8) -> Self {
        Self::from_prefix(u128::from_be_bytes(addr), len.min(128), 128)
    }

    /// Build a range from a prefix of `len` significant bits in an address
    /// space of `width` bits.
    pub fn from_prefix(addr: u128, len: u8, width: u8) -> Self {
        let host_bits = u32::from(width.saturating_sub(len));
        let host_mask = if host_bits >= 128 {
            u128::MAX
        } else {
            (1u128 << host_bits) - 1
        };
        let space = if width >= 128 {
            u128::MAX
        } else {
            (1u128 << width) - 1
        };
        let min = addr & !host_mask & space;
        Self {
            min,
            max: min | host_mask,
        }
    }

    fn display_v4(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let min = Ipv4Addr::from(self.min as u32);
        let max = Ipv4Addr::from(self.max as u32);
        write!(f, "{min}-{max}")
    }

    fn display_v6(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", Ipv6Addr::from(self.min), Ipv6Addr::from(self.max))
    }
}

/// Anything with an inclusive numeric extent.
trait Extent: Copy + Ord {
    fn bounds(&self) -> (u128, u128);
}

impl Extent for AsRange {
    fn bounds(&self) -> (u128, u128) {
        (u128::from(self.min), u128::from(self.max))
    }
}

impl Extent for IpRange {
    fn bounds(&self) -> (u128, u128) {
        (self.min, self.max)
    }
}

/// Merge ranges into a sorted list of disjoint, non-adjacent extents.
fn merge<T: Extent>(ranges: &[T]) -> Vec<(u128, u128)> {
    let mut sorted: Vec<(u128, u128)> = ranges.iter().map(Extent::bounds).collect();
    sorted.sort_unstable();

    let mut merged: Vec<(u128, u128)> = Vec::with_capacity(sorted.len());
    for (min, max) in sorted {
        match merged.last_mut() {
            Some(last) if min <= last.1.saturating_add(1) => last.1 = last.1.max(max),
            _ => merged.push((min, max)),
        }
    }
    merged
}

/// Check one resource family of a child against its issuer's effective
/// family. Returns the first uncovered child range, if any.
fn first_uncovered<T: Extent>(child: &Resources<T>, parent: &Resources<T>) -> Option<Coverage<T>> {
    let ranges = match child {
        Resources::Absent => return None,
        Resources::Inherit => {
            return match parent {
                Resources::Absent => Some(Coverage::InheritFromNothing),
                _ => None,
            };
        }
        Resources::Ranges(ranges) => ranges,
    };

    let held = match parent {
        Resources::Ranges(held) => merge(held),
        _ => Vec::new(),
    };

    ranges
        .iter()
        .find(|r| {
            let (min, max) = r.bounds();
            !held.iter().any(|(lo, hi)| *lo <= min && max <= *hi)
        })
        .map(|r| Coverage::Range(*r))
}

enum Coverage<T> {
    InheritFromNothing,
    Range(T),
}

/// The three resource families of a certificate or signed object.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ResourceSet {
    /// AS numbers.
    pub asns: Resources<AsRange>,
    /// IPv4 addresses.
    pub ipv4: Resources<IpRange>,
    /// IPv6 addresses.
    pub ipv6: Resources<IpRange>,
}

impl ResourceSet {
    /// Whether any family uses `inherit`.
    pub fn has_inherit(&self) -> bool {
        self.asns.is_inherit() || self.ipv4.is_inherit() || self.ipv6.is_inherit()
    }

    /// Whether no family carries any resources.
    pub fn is_empty(&self) -> bool {
        self.asns.is_absent() && self.ipv4.is_absent() && self.ipv6.is_absent()
    }

    /// Replace every `inherit` family with the issuer's effective family.
    pub fn resolve(&self, parent: &ResourceSet) -> ResourceSet {
        ResourceSet {
            asns: self.asns.resolve(&parent.asns),
            ipv4: self.ipv4.resolve(&parent.ipv4),
            ipv6: self.ipv6.resolve(&parent.ipv6),
        }
    }

    /// Check that every resource in `self` is held by `parent`.
    ///
    /// `parent` must already be effective (no `inherit`). On failure the
    /// error describes the first resource that is not covered.
    pub fn covered_by(&self, parent: &ResourceSet) -> std::result::Result<(), String> {
        if let Some(c) = first_uncovered(&self.asns, &parent.asns) {
            return Err(match c {
                Coverage::InheritFromNothing => "AS resources inherited from an issuer without AS resources".to_string(),
                Coverage::Range(r) => format!("{r} not covered by issuer"),
            });
        }
        for (name, child, held) in [
            ("IPv4", &self.ipv4, &parent.ipv4),
            ("IPv6", &self.ipv6, &parent.ipv6),
        ] {
            if let Some(c) = first_uncovered(child, held) {
                return Err(match c {
                    Coverage::InheritFromNothing => {
                        format!("{name} resources inherited from an issuer without {name} resources")
                    }
                    Coverage::Range(r) => {
                        let shown = RangeDisplay { range: r, v6: name == "IPv6" };
                        format!("{name} {shown} not covered by issuer")
                    }
                });
            }
        }
        Ok(())
    }
}

struct RangeDisplay {
    range: IpRange,
    v6: bool,
}

impl fmt::Display for RangeDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.v6 {
            self.range.display_v6(f)
        } else {
            self.range.display_v4(f)
        }
    }
}
