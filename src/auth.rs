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

//! Validated authority certificates.
//!
//! The store is an append-only arena. Parents are referenced by index and a
//! node can only be inserted once its parent is present, so every parent
//! chain is finite and ends at a trust anchor.

use crate::error::{Result, RpkiError};
use crate::resources::ResourceSet;
use crate::types::{CertPurpose, KeyId, ResourceCert};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::time::SystemTime;
use tracing::debug;

/// Index of a node in the [`AuthStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Identifier of a registered trust anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TalId(pub usize);

impl fmt::Display for TalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tal#{}", self.0)
    }
}

/// A validated CA or trust anchor certificate.
#[derive(Debug, Clone)]
pub struct AuthNode {
    /// The certificate itself.
    pub cert: ResourceCert,
    /// Where it was loaded from.
    pub location: String,
    /// Trust anchor or CA.
    pub purpose: CertPurpose,
    /// Owning trust anchor.
    pub ta: TalId,
    /// Issuer node; `None` for trust anchors.
    pub parent: Option<NodeId>,
    /// Hops from the trust anchor.
    pub depth: usize,
    /// Earliest certificate expiry along the path to the trust anchor.
    pub expires: SystemTime,
    /// Resources with `inherit` resolved.
    pub resources: ResourceSet,
}

impl AuthNode {
    /// Subject key identifier.
    pub fn ski(&self) -> &KeyId {
        &self.cert.ski
    }

    /// Authority key identifier.
    pub fn aki(&self) -> Option<&KeyId> {
        self.cert.aki.as_ref()
    }
}

/// Position in the arena, used to undo a failed chain commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthCheckpoint(usize);

/// Validated authorities keyed by subject key identifier.
#[derive(Debug, Default)]
pub struct AuthStore {
    nodes: Vec<AuthNode>,
    by_ski: HashMap<KeyId, NodeId>,
}

impl AuthStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Find the node for a subject key identifier.
    pub fn find(&self, ski: &KeyId) -> Option<NodeId> {
        self.by_ski.get(ski).copied()
    }

    /// Access a node.
    pub fn get(&self, id: NodeId) -> Option<&AuthNode> {
        self.nodes.get(id.0)
    }

    /// Number of nodes held.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn check_unique(&self, cert: &ResourceCert) -> Result<()> {
        if self.by_ski.contains_key(&cert.ski) {
            return Err(RpkiError::DuplicateSubject(cert.ski.clone()));
        }
        Ok(())
    }

    fn push(&mut self, node: AuthNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        debug!(
            "Inserted {} {} at depth {} ({})",
            node.purpose, node.cert.ski, node.depth, node.location
        );
        self.by_ski.insert(node.cert.ski.clone(), id);
        self.nodes.push(node);
        id
    }

    /// Insert a validated trust anchor as a root node.
    pub fn insert_root(
        &mut self,
        cert: ResourceCert,
        location: impl Into<String>,
        ta: TalId,
    ) -> Result<NodeId> {
        self.check_unique(&cert)?;
        let node = AuthNode {
            location: location.into(),
            purpose: CertPurpose::TrustAnchor,
            ta,
            parent: None,
            depth: 0,
            expires: cert.not_after,
            resources: cert.resources.clone(),
            cert,
        };
        Ok(self.push(node))
    }

    /// Insert a CA certificate that has passed path validation against
    /// `parent`'s chain.
    pub fn insert(
        &mut self,
        cert: ResourceCert,
        location: impl Into<String>,
        parent: NodeId,
    ) -> Result<NodeId> {
        self.check_unique(&cert)?;
        let issuer = self
            .get(parent)
            .ok_or_else(|| RpkiError::broken_chain("issuer node vanished"))?;

        let node = AuthNode {
            location: location.into(),
            purpose: CertPurpose::Ca,
            ta: issuer.ta,
            parent: Some(parent),
            depth: issuer.depth + 1,
            expires: cert.not_after.min(issuer.expires),
            resources: cert.resources.resolve(&issuer.resources),
            cert,
        };
        Ok(self.push(node))
    }

    /// Nodes from `id` up to and including its trust anchor.
    pub fn parent_chain(&self, id: NodeId) -> Vec<&AuthNode> {
        let mut chain = Vec::new();
        let mut current = self.get(id);
        while let Some(node) = current {
            chain.push(node);
            current = node.parent.and_then(|p| self.get(p));
        }
        chain
    }

    /// Certificates from the trust anchor down to `id`, for path validation.
    pub fn trust_stack(&self, id: NodeId) -> Vec<&ResourceCert> {
        let mut stack: Vec<&ResourceCert> =
            self.parent_chain(id).into_iter().map(|n| &n.cert).collect();
        stack.reverse();
        stack
    }

    /// Mark the current state.
    pub fn checkpoint(&self) -> AuthCheckpoint {
        AuthCheckpoint(self.nodes.len())
    }

    /// Drop every node inserted after `checkpoint`.
    pub fn rollback(&mut self, checkpoint: AuthCheckpoint) {
        while self.nodes.len() > checkpoint.0 {
            if let Some(node) = self.nodes.pop() {
                debug!("Rolling back {}", node.cert.ski);
                self.by_ski.remove(&node.cert.ski);
            }
        }
    }
}
