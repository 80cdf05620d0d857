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

//! The object validation engine.
//!
//! An [`Engine`] owns the Auth Store and CRL Store for one validation run
//! and processes objects one at a time. Each object moves through parsing,
//! issuer resolution, path validation and semantic checks; validated CA
//! certificates are added to the Auth Store so later objects can chain to
//! them.
//!
//! Every object is processed atomically: if it is rejected, any issuer
//! certificates or CRLs loaded on its behalf are removed again.
//!
//! # Example
//!
//! ```no_run
//! use rpki_validator::config::EngineConfig;
//! use rpki_validator::engine::Engine;
//! use rpki_validator::tal::Tal;
//! use rpki_validator::types::Object;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = EngineConfig::builder()
//!     .repository_root("/var/cache/rpki-client")
//!     .build();
//! let mut engine = Engine::from_config(config);
//!
//! engine.load_trust_anchor(&Tal::load("/etc/rpki/arin.tal")?)?;
//!
//! let data = std::fs::read("/var/cache/rpki-client/rpki.example.net/repo/ca.cer")?;
//! let outcome = engine.submit(&Object::new("rpki.example.net/repo/ca.cer", data)?);
//! println!("{}: valid={}", outcome.location, outcome.valid);
//! # Ok(())
//! # }
//! ```

use crate::auth::{AuthStore, NodeId, TalId};
use crate::chain::{ChainBuilder, PendingChain};
use crate::config::EngineConfig;
use crate::crl_store::CrlStore;
use crate::crypto::CryptoProvider;
use crate::error::{Result, RpkiError};
use crate::manifest::{FileCheck, ManifestChecker};
use crate::parser::ObjectParser;
use crate::repository::Repository;
use crate::tal::Tal;
use crate::types::{
    CertPurpose, CrlRecord, Manifest, Object, ObjectKind, Record, ResourceCert,
    SignedObject,
};
use crate::validation::{PathValidator, ValidationConfig};
use serde::{Serialize, Serializer};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

/// The result of submitting one object.
#[derive(Debug, Serialize)]
pub struct ValidationOutcome {
    /// Where the object came from.
    pub location: String,
    /// Object kind.
    pub kind: ObjectKind,
    /// Whether the object validated.
    pub valid: bool,
    /// Rejection reason.
    pub reason: Option<String>,
    /// Typed rejection error.
    #[serde(skip)]
    pub error: Option<RpkiError>,
    /// Earliest time any part of the object's trust path expires.
    #[serde(serialize_with = "unix_seconds")]
    pub expires: Option<SystemTime>,
    /// Trust anchor the object chains to.
    pub ta: Option<TalId>,
    /// Semantic validity of a signed object's content.
    pub content_valid: Option<bool>,
    /// Per-file results of a manifest.
    pub files: Vec<FileCheck>,
    /// Locations from the issuer up to the trust anchor.
    pub signature_path: Vec<String>,
}

fn unix_seconds<S: Serializer>(
    time: &Option<SystemTime>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match time.and_then(|t| t.duration_since(UNIX_EPOCH).ok()) {
        Some(d) => serializer.serialize_some(&d.as_secs()),
        None => serializer.serialize_none(),
    }
}

impl ValidationOutcome {
    fn new(location: &str, kind: ObjectKind) -> Self {
        Self {
            location: location.to_string(),
            kind,
            valid: false,
            reason: None,
            error: None,
            expires: None,
            ta: None,
            content_valid: None,
            files: Vec::new(),
            signature_path: Vec::new(),
        }
    }

    fn reject(&mut self, error: RpkiError) {
        self.valid = false;
        self.reason = Some(error.to_string());
        self.expires = None;
        self.error = Some(error);
    }
}

/// A pinned trust anchor key.
#[derive(Debug, Clone)]
struct Anchor {
    name: String,
    spki: Vec<u8>,
}

/// Validation engine for one run.
pub struct Engine {
    config: EngineConfig,
    parser: Box<dyn ObjectParser>,
    repository: Box<dyn Repository>,
    crypto: Box<dyn CryptoProvider>,
    auths: AuthStore,
    crls: CrlStore,
    anchors: Vec<Anchor>,
    now: SystemTime,
}

impl Engine {
    /// Create an engine with explicit collaborators.
    pub fn new(
        config: EngineConfig,
        parser: Box<dyn ObjectParser>,
        repository: Box<dyn Repository>,
        crypto: Box<dyn CryptoProvider>,
    ) -> Self {
        let now = config.now();
        Self {
            config,
            parser,
            repository,
            crypto,
            auths: AuthStore::new(),
            crls: CrlStore::new(),
            anchors: Vec::new(),
            now,
        }
    }

    /// Create an engine reading DER objects from the configured repository
    /// roots and verifying RSA signatures.
    #[cfg(feature = "rsa-verifier")]
    pub fn from_config(config: EngineConfig) -> Self {
        let repository = crate::repository::FsRepository::new(config.repository_roots.clone());
        Self::new(
            config,
            Box::new(crate::parser::X509Parser::new()),
            Box::new(repository),
            Box::new(crate::crypto::RsaVerifier::new()),
        )
    }

    /// The configuration in use.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Validated authorities.
    pub fn auth_store(&self) -> &AuthStore {
        &self.auths
    }

    /// Loaded CRLs.
    pub fn crl_store(&self) -> &CrlStore {
        &self.crls
    }

    /// The instant all validity checks are evaluated at.
    pub fn evaluation_time(&self) -> SystemTime {
        self.now
    }

    /// Name of a registered trust anchor.
    pub fn trust_anchor_name(&self, ta: TalId) -> Option<&str> {
        self.anchors.get(ta.0).map(|a| a.name.as_str())
    }

    fn register_anchor(&mut self, name: &str, spki: &[u8]) -> TalId {
        if let Some(pos) = self.anchors.iter().position(|a| a.spki == spki) {
            return TalId(pos);
        }
        self.anchors.push(Anchor {
            name: name.to_string(),
            spki: spki.to_vec(),
        });
        TalId(self.anchors.len() - 1)
    }

    /// Bootstrap a trust anchor from its certificate and pinned key.
    ///
    /// The certificate's public key must equal `pinned_key` exactly. The key
    /// stays registered even if the certificate is rejected, so the anchor
    /// can be submitted again later.
    pub fn insert_trust_anchor(&mut self, pinned_key: &[u8], object: &Object) -> Result<NodeId> {
        let ta = self.register_anchor(&object.location, pinned_key);
        let cert = self.parse_certificate(object)?;
        if cert.spki != pinned_key {
            return Err(RpkiError::not_trust_anchor(format!(
                "{}: public key does not match pinned key",
                object.location
            )));
        }
        self.add_root(cert, &object.location, ta)
    }

    /// Load the certificate a TAL points at and bootstrap it.
    ///
    /// URIs are tried in order until one loads.
    pub fn load_trust_anchor(&mut self, tal: &Tal) -> Result<NodeId> {
        let ta = self.register_anchor(&tal.name, &tal.spki);
        let mut last = RpkiError::not_found(format!("{}: no URIs", tal.name));

        for uri in &tal.uris {
            let data = match self.repository.load(uri) {
                Ok(data) => data,
                Err(e) => {
                    debug!("{}: {}", uri, e);
                    last = e;
                    continue;
                }
            };
            let object = Object::with_kind(ObjectKind::Certificate, uri.as_str(), data);
            let cert = self.parse_certificate(&object)?;
            if cert.spki != tal.spki {
                return Err(RpkiError::not_trust_anchor(format!(
                    "{uri}: public key does not match TAL {}",
                    tal.name
                )));
            }
            return self.add_root(cert, uri, ta);
        }
        Err(last)
    }

    fn parse_certificate(&self, object: &Object) -> Result<ResourceCert> {
        match self
            .parser
            .parse(ObjectKind::Certificate, &object.location, &object.data)?
        {
            Record::Certificate(cert) => Ok(cert),
            other => Err(RpkiError::parse(
                object.location.as_str(),
                format!("expected certificate, found {}", other.kind()),
            )),
        }
    }

    fn add_root(&mut self, cert: ResourceCert, location: &str, ta: TalId) -> Result<NodeId> {
        if cert.purpose != CertPurpose::TrustAnchor {
            return Err(RpkiError::not_trust_anchor(format!(
                "{location}: not self-signed (purpose {})",
                cert.purpose
            )));
        }
        if cert.resources.has_inherit() {
            return Err(RpkiError::semantic("trust anchor uses inherit"));
        }
        self.validator(false)
            .validate_trust_anchor(&cert)
            .into_result()?;
        let id = self.auths.insert_root(cert, location, ta)?;
        self.settle_crl(id);
        info!("Trust anchor {} loaded from {}", ta, location);
        Ok(id)
    }

    /// Validate one object and report the outcome.
    ///
    /// Failures are confined to the object: stores are left exactly as they
    /// were before the call.
    pub fn submit(&mut self, object: &Object) -> ValidationOutcome {
        let mut outcome = ValidationOutcome::new(&object.location, object.kind);
        self.atomically(&mut outcome, |engine, outcome| engine.process(object, outcome));
        outcome
    }

    /// Bootstrap the trust anchor of an already parsed TAL and report it
    /// like any other object.
    pub fn submit_tal(&mut self, tal: &Tal) -> ValidationOutcome {
        let mut outcome = ValidationOutcome::new(&format!("{}.tal", tal.name), ObjectKind::Tal);
        self.atomically(&mut outcome, |engine, outcome| {
            let id = engine.load_trust_anchor(tal)?;
            engine.describe(id, outcome);
            Ok(())
        });
        outcome
    }

    fn atomically<F>(&mut self, outcome: &mut ValidationOutcome, f: F)
    where
        F: FnOnce(&mut Self, &mut ValidationOutcome) -> Result<()>,
    {
        let auth_mark = self.auths.checkpoint();
        let crl_mark = self.crls.checkpoint();

        match f(self, outcome) {
            Ok(()) => {
                outcome.valid = true;
                info!("{}: {} OK", outcome.location, outcome.kind);
            }
            Err(e) => {
                warn!("{}: {}", outcome.location, e);
                self.auths.rollback(auth_mark);
                self.crls.rollback(crl_mark);
                outcome.reject(e);
            }
        }
    }

    fn process(&mut self, object: &Object, outcome: &mut ValidationOutcome) -> Result<()> {
        if object.kind == ObjectKind::Tal {
            let text = std::str::from_utf8(&object.data)
                .map_err(|e| RpkiError::parse(object.location.as_str(), e.to_string()))?;
            let tal = Tal::parse(&object.location, text)?;
            let id = self.load_trust_anchor(&tal)?;
            self.describe(id, outcome);
            return Ok(());
        }

        match self
            .parser
            .parse(object.kind, &object.location, &object.data)?
        {
            Record::Certificate(cert) => self.process_certificate(cert, object, outcome),
            Record::Crl(crl) => self.process_crl(crl, outcome),
            Record::Manifest(mft) => self.process_manifest(&mft, object, outcome),
            Record::Signed(obj) => self.process_signed(&obj, outcome),
        }
    }

    fn process_certificate(
        &mut self,
        cert: ResourceCert,
        object: &Object,
        outcome: &mut ValidationOutcome,
    ) -> Result<()> {
        match cert.purpose {
            CertPurpose::TrustAnchor => {
                let ta = self
                    .anchors
                    .iter()
                    .position(|a| a.spki == cert.spki)
                    .map(TalId)
                    .ok_or_else(|| {
                        RpkiError::not_trust_anchor(format!(
                            "{}: no pinned key matches",
                            object.location
                        ))
                    })?;
                let id = self.add_root(cert, &object.location, ta)?;
                self.describe(id, outcome);
            }
            CertPurpose::Ca => {
                if self.auths.find(&cert.ski).is_some() {
                    return Err(RpkiError::DuplicateSubject(cert.ski.clone()));
                }
                self.prefetch_crl(&cert);
                let parent = self.resolve_issuer(&cert)?;
                let id = self.validate_ca(cert, &object.location, parent)?;
                self.describe(id, outcome);
            }
            CertPurpose::Ee | CertPurpose::BgpsecRouter => {
                self.prefetch_crl(&cert);
                let parent = self.resolve_issuer(&cert)?;
                self.validate_leaf(&cert, parent, true)?;
                outcome.expires = Some(self.expiry(cert.not_after, parent));
                self.describe_issuer(parent, outcome);
            }
        }
        Ok(())
    }

    fn process_crl(&mut self, crl: CrlRecord, outcome: &mut ValidationOutcome) -> Result<()> {
        let mut expires = crl.next_update;

        // a CRL for an unvalidated issuer is held until the issuer arrives
        let verified = match self.auths.find(&crl.aki) {
            Some(id) => {
                if self.crl_verifies(&crl) != Some(true) {
                    return Err(RpkiError::path_validation("CRL signature failure"));
                }
                expires = self.expiry(expires, id);
                self.describe_issuer(id, outcome);
                true
            }
            None => {
                debug!("CRL issuer {} not yet validated", crl.aki);
                false
            }
        };

        self.crls.insert(crl, verified)?;
        outcome.expires = Some(expires);
        Ok(())
    }

    fn process_manifest(
        &mut self,
        mft: &Manifest,
        object: &Object,
        outcome: &mut ValidationOutcome,
    ) -> Result<()> {
        // manifest signers are not checked for revocation
        let parent = self.resolve_issuer(&mft.ee)?;
        self.validate_leaf(&mft.ee, parent, false)?;

        let own = mft.ee.not_after.min(mft.next_update);
        outcome.expires = Some(self.expiry(own, parent));
        outcome.files =
            ManifestChecker::new(&*self.repository, &*self.crypto).check(object.directory(), mft, self.now);
        self.describe_issuer(parent, outcome);
        Ok(())
    }

    fn process_signed(&mut self, obj: &SignedObject, outcome: &mut ValidationOutcome) -> Result<()> {
        self.prefetch_crl(&obj.ee);
        let parent = self.resolve_issuer(&obj.ee)?;
        self.validate_leaf(&obj.ee, parent, true)?;

        let node = self
            .auths
            .get(parent)
            .ok_or_else(|| RpkiError::broken_chain("issuer node vanished"))?;
        let effective = obj.ee.resources.resolve(&node.resources);
        let content = obj.claimed.covered_by(&effective);
        if let Err(reason) = &content {
            warn!("{} content not covered by its certificate: {}", obj.kind, reason);
        }
        outcome.content_valid = Some(content.is_ok());
        outcome.expires = Some(self.expiry(obj.ee.not_after, parent));
        self.describe_issuer(parent, outcome);
        Ok(())
    }

    /// Load the CRL covering `cert` when none is held for its issuer yet.
    fn prefetch_crl(&mut self, cert: &ResourceCert) {
        if !self.config.fetch_crls {
            return;
        }
        let (Some(aki), Some(uri)) = (cert.aki.as_ref(), cert.crl_uri.as_deref()) else {
            return;
        };
        if self.crls.contains(aki) {
            return;
        }
        let crl = ChainBuilder::new(&*self.repository, &*self.parser, true).fetch_crl(uri, aki);
        if let Some(crl) = crl {
            self.hold_crl(crl);
        }
    }

    /// Whether `crl` verifies under its issuer's key, or `None` while the
    /// issuer is not validated.
    fn crl_verifies(&self, crl: &CrlRecord) -> Option<bool> {
        let node = self.auths.find(&crl.aki).and_then(|id| self.auths.get(id))?;
        Some(self.crypto.verify(&node.cert.spki, &crl.signed))
    }

    /// Store a CRL loaded alongside another object.
    fn hold_crl(&mut self, crl: CrlRecord) {
        let verified = self.crl_verifies(&crl) == Some(true);
        if let Err(e) = self.crls.insert(crl, verified) {
            debug!("Loaded CRL skipped: {}", e);
        }
    }

    /// Confirm or drop a CRL that arrived before its issuer `id` was
    /// validated.
    fn settle_crl(&mut self, id: NodeId) {
        let Some(node) = self.auths.get(id) else {
            return;
        };
        let ski = node.ski().clone();
        if self.crls.is_verified(&ski) {
            return;
        }
        let Some(crl) = self.crls.lookup(&ski) else {
            return;
        };
        if self.crypto.verify(&node.cert.spki, &crl.signed) {
            self.crls.mark_verified(&ski);
        } else {
            warn!("Discarding CRL for {}: signature does not verify", ski);
            self.crls.discard(&ski);
        }
    }

    /// Find or build the validated issuer of `cert`.
    fn resolve_issuer(&mut self, cert: &ResourceCert) -> Result<NodeId> {
        let aki = cert
            .aki
            .as_ref()
            .ok_or_else(|| RpkiError::broken_chain(format!("{}: no AKI", cert.ski)))?;
        let pending = ChainBuilder::new(&*self.repository, &*self.parser, self.config.fetch_crls)
            .collect(&self.auths, &self.crls, aki, cert.aia.as_deref())?;
        self.commit(pending)
    }

    /// Replay a pending chain root-first. The caller rolls back on failure.
    fn commit(&mut self, pending: PendingChain) -> Result<NodeId> {
        if pending.is_resolved() {
            return Ok(pending.join);
        }
        debug!("Replaying {} pending issuers", pending.entries.len());

        for crl in pending.crls {
            self.hold_crl(crl);
        }

        let mut parent = pending.join;
        for entry in pending.entries.into_iter().rev() {
            parent = self.validate_ca(entry.cert, &entry.location, parent)?;
        }
        Ok(parent)
    }

    fn validator(&self, check_revocation: bool) -> PathValidator<'_> {
        PathValidator::new(
            &*self.crypto,
            ValidationConfig {
                check_revocation,
                missing_crl: self.config.missing_crl,
                time: self.now,
                ..ValidationConfig::default()
            },
        )
    }

    fn issuer_crl(&self, parent: NodeId) -> Option<&CrlRecord> {
        self.auths
            .get(parent)
            .and_then(|node| self.crls.lookup(node.ski()))
    }

    fn check_path(&self, cert: &ResourceCert, parent: NodeId, check_revocation: bool) -> Result<()> {
        let stack = self.auths.trust_stack(parent);
        let crl = if check_revocation {
            self.issuer_crl(parent)
        } else {
            None
        };
        let result = self.validator(check_revocation).validate(cert, &stack, crl);
        for warning in &result.warnings {
            debug!("{}: {}", cert.ski, warning);
        }
        result.into_result()
    }

    fn check_resources(&self, cert: &ResourceCert, parent: NodeId) -> Result<()> {
        let node = self
            .auths
            .get(parent)
            .ok_or_else(|| RpkiError::broken_chain("issuer node vanished"))?;
        cert.resources
            .covered_by(&node.resources)
            .map_err(RpkiError::semantic)
    }

    /// Validate a CA certificate below `parent` and insert it.
    fn validate_ca(&mut self, cert: ResourceCert, location: &str, parent: NodeId) -> Result<NodeId> {
        if cert.purpose != CertPurpose::Ca {
            return Err(RpkiError::not_ca(location, cert.purpose));
        }
        if self.auths.find(&cert.ski).is_some() {
            return Err(RpkiError::DuplicateSubject(cert.ski.clone()));
        }
        self.check_path(&cert, parent, true)?;
        self.check_resources(&cert, parent)?;
        let id = self.auths.insert(cert, location, parent)?;
        self.settle_crl(id);
        Ok(id)
    }

    /// Validate an EE certificate below `parent` without storing it.
    fn validate_leaf(&self, cert: &ResourceCert, parent: NodeId, check_revocation: bool) -> Result<()> {
        self.check_path(cert, parent, check_revocation)?;
        self.check_resources(cert, parent)
    }

    /// Effective expiry of an object declaring `own`, issued by `issuer`:
    /// the minimum over every ancestor certificate and every CRL issued by
    /// an ancestor.
    fn expiry(&self, own: SystemTime, issuer: NodeId) -> SystemTime {
        let Some(node) = self.auths.get(issuer) else {
            return own;
        };
        // certificate expiry along the chain is folded in on insert
        self.auths
            .parent_chain(issuer)
            .into_iter()
            .filter_map(|n| self.crls.lookup(n.ski()))
            .fold(own.min(node.expires), |acc, crl| acc.min(crl.next_update))
    }

    /// Fill outcome details for a stored node.
    fn describe(&self, id: NodeId, outcome: &mut ValidationOutcome) {
        let Some(node) = self.auths.get(id) else {
            return;
        };
        outcome.ta = Some(node.ta);
        outcome.expires = Some(match node.parent {
            Some(parent) => self.expiry(node.cert.not_after, parent),
            None => node.expires,
        });
        if let Some(parent) = node.parent {
            outcome.signature_path = self.path_locations(parent);
        }
    }

    fn describe_issuer(&self, issuer: NodeId, outcome: &mut ValidationOutcome) {
        if let Some(node) = self.auths.get(issuer) {
            outcome.ta = Some(node.ta);
        }
        outcome.signature_path = self.path_locations(issuer);
    }

    fn path_locations(&self, id: NodeId) -> Vec<String> {
        self.auths
            .parent_chain(id)
            .into_iter()
            .map(|n| n.location.clone())
            .collect()
    }
}
