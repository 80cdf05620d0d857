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

//! CRLs held for the current validation run, one per issuer.
//!
//! A CRL can arrive before its issuer has been validated. Such a CRL is
//! held unverified until the issuer is inserted into the Auth Store, at
//! which point it is either confirmed or discarded. Only a verified CRL
//! blocks a second one for the same issuer.

use crate::error::{Result, RpkiError};
use crate::types::{CrlRecord, KeyId};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Position in the change journal, used to undo a failed chain commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrlCheckpoint(usize);

#[derive(Debug, Clone)]
struct Held {
    crl: CrlRecord,
    verified: bool,
}

/// One reversible store mutation.
#[derive(Debug)]
enum Change {
    Inserted(KeyId),
    Verified(KeyId),
    Removed(Held),
}

/// CRLs keyed by the authority key identifier of their issuer.
#[derive(Debug, Default)]
pub struct CrlStore {
    crls: HashMap<KeyId, Held>,
    journal: Vec<Change>,
}

impl CrlStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a CRL. `verified` records whether its signature was checked
    /// under the issuer's validated key.
    ///
    /// Fails with `DuplicateIssuer` if a CRL is already held for the same
    /// issuer, leaving the held CRL untouched. A verified CRL replaces an
    /// unverified one.
    pub fn insert(&mut self, crl: CrlRecord, verified: bool) -> Result<()> {
        if let Some(held) = self.crls.get(&crl.aki) {
            if held.verified || !verified {
                warn!("Rejecting second CRL for issuer {}", crl.aki);
                return Err(RpkiError::DuplicateIssuer(crl.aki));
            }
            warn!("Replacing unverified CRL for issuer {}", crl.aki);
            self.discard(&crl.aki);
        }
        debug!("Storing CRL for issuer {} (verified: {})", crl.aki, verified);
        self.journal.push(Change::Inserted(crl.aki.clone()));
        self.crls.insert(crl.aki.clone(), Held { crl, verified });
        Ok(())
    }

    /// The CRL issued by the CA with key identifier `issuer`, if held.
    pub fn lookup(&self, issuer: &KeyId) -> Option<&CrlRecord> {
        self.crls.get(issuer).map(|h| &h.crl)
    }

    /// Whether a CRL for `issuer` is held.
    pub fn contains(&self, issuer: &KeyId) -> bool {
        self.crls.contains_key(issuer)
    }

    /// Whether the CRL held for `issuer` has been verified.
    pub fn is_verified(&self, issuer: &KeyId) -> bool {
        self.crls.get(issuer).is_some_and(|h| h.verified)
    }

    /// Mark the CRL held for `issuer` as verified.
    pub fn mark_verified(&mut self, issuer: &KeyId) {
        if let Some(held) = self.crls.get_mut(issuer) {
            if !held.verified {
                held.verified = true;
                self.journal.push(Change::Verified(issuer.clone()));
            }
        }
    }

    /// Drop the CRL held for `issuer`.
    pub fn discard(&mut self, issuer: &KeyId) -> Option<CrlRecord> {
        let held = self.crls.remove(issuer)?;
        debug!("Discarding CRL for issuer {}", issuer);
        let crl = held.crl.clone();
        self.journal.push(Change::Removed(held));
        Some(crl)
    }

    /// Number of CRLs held.
    pub fn len(&self) -> usize {
        self.crls.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.crls.is_empty()
    }

    /// Mark the current state.
    pub fn checkpoint(&self) -> CrlCheckpoint {
        CrlCheckpoint(self.journal.len())
    }

    /// Undo every change made after `checkpoint`.
    pub fn rollback(&mut self, checkpoint: CrlCheckpoint) {
        while self.journal.len() > checkpoint.0 {
            match self.journal.pop() {
                Some(Change::Inserted(aki)) => {
                    debug!("Rolling back CRL for issuer {}", aki);
                    self.crls.remove(&aki);
                }
                Some(Change::Verified(aki)) => {
                    if let Some(held) = self.crls.get_mut(&aki) {
                        held.verified = false;
                    }
                }
                Some(Change::Removed(held)) => {
                    self.crls.insert(held.crl.aki.clone(), held);
                }
                None => break,
            }
        }
    }
}
