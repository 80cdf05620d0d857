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

use super::{KeyId, Serial, SignedData};
use std::time::SystemTime;

/// A parsed certificate revocation list.
#[derive(Clone, Debug)]
pub struct CrlRecord {
    /// Authority key identifier of the issuing CA.
    pub aki: KeyId,
    /// When this CRL was issued.
    pub this_update: SystemTime,
    /// When the next CRL is due.
    pub next_update: SystemTime,
    /// Revoked serial numbers.
    pub revoked: Vec<Serial>,
    /// Signed portion used for signature verification.
    pub signed: SignedData,
}

impl CrlRecord {
    /// Whether the given serial is on the list.
    pub fn is_revoked(&self, serial: &Serial) -> bool {
        self.revoked.iter().any(|s| s == serial)
    }
}
