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

use super::{ObjectKind, ResourceCert};
use crate::resources::ResourceSet;

/// A signed object other than a manifest (ROA, ASPA, Ghostbusters, ...).
///
/// The engine only needs the EE certificate and the resources the payload
/// asserts; payload decoding stays with the parser.
#[derive(Clone, Debug)]
pub struct SignedObject {
    /// Object kind.
    pub kind: ObjectKind,
    /// The embedded EE certificate.
    pub ee: ResourceCert,
    /// Resources asserted by the payload, checked against the EE.
    pub claimed: ResourceSet,
}
