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

use super::ResourceCert;
use std::time::SystemTime;

/// One manifest entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileAndHash {
    /// File name relative to the manifest's directory.
    pub name: String,
    /// Declared SHA-256 digest.
    pub hash: Vec<u8>,
}

/// A parsed manifest.
#[derive(Clone, Debug)]
pub struct Manifest {
    /// The embedded EE certificate.
    pub ee: ResourceCert,
    /// Manifest issuance time.
    pub this_update: SystemTime,
    /// When the next manifest is due.
    pub next_update: SystemTime,
    /// Listed files and their digests.
    pub files: Vec<FileAndHash>,
}

impl Manifest {
    /// A manifest is stale once its next update time has passed.
    pub fn is_stale(&self, now: SystemTime) -> bool {
        self.next_update < now
    }
}
