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

//! Certificate path validation.
//!
//! This module implements RFC 5280 path validation over an explicit,
//! root-first trust stack taken from the Auth Store. There is no implicit
//! trust store: the first certificate of the stack is the only acceptable
//! root.
//!
//! Generic path validation rejects unknown critical extensions. The RFC 3779
//! resource extensions are always critical in the RPKI and are interpreted
//! later by resource checks, so they are tolerated here.
//!
//! # Example
//!
//! ```no_run
//! use rpki_validator::crypto::RsaVerifier;
//! use rpki_validator::validation::{PathValidator, ValidationConfig};
//!
//! # fn example(
//! #     cert: &rpki_validator::types::ResourceCert,
//! #     stack: &[&rpki_validator::types::ResourceCert],
//! # ) -> Result<(), Box<dyn std::error::Error>> {
//! let crypto = RsaVerifier::new();
//! let validator = PathValidator::new(&crypto, ValidationConfig::default());
//!
//! let result = validator.validate(cert, stack, None);
//! if result.is_valid {
//!     println!("Certificate chain is valid!");
//! }
//! # Ok(())
//! # }
//! ```

use crate::config::MissingCrlPolicy;
use crate::crypto::CryptoProvider;
use crate::error::{Result, RpkiError};
use crate::revocation::RevocationChecker;
use crate::types::{CrlRecord, ResourceCert};
use const_oid::db::rfc5280::{
    ID_CE_BASIC_CONSTRAINTS, ID_CE_CERTIFICATE_POLICIES, ID_CE_EXT_KEY_USAGE,
    ID_CE_INHIBIT_ANY_POLICY, ID_CE_KEY_USAGE, ID_CE_NAME_CONSTRAINTS, ID_CE_POLICY_CONSTRAINTS,
    ID_CE_POLICY_MAPPINGS, ID_CE_SUBJECT_ALT_NAME,
};
use const_oid::ObjectIdentifier;
use std::time::SystemTime;
use tracing::debug;

/// sbgp-ipAddrBlock (RFC 3779).
pub const ID_PE_IP_ADDR_BLOCKS: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.1.7");

/// sbgp-autonomousSysNum (RFC 3779).
pub const ID_PE_AUTONOMOUS_SYS_IDS: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.1.8");

/// Critical extensions the path validator itself processes.
const HANDLED_CRITICAL: &[ObjectIdentifier] = &[
    ID_CE_BASIC_CONSTRAINTS,
    ID_CE_KEY_USAGE,
    ID_CE_CERTIFICATE_POLICIES,
    ID_CE_EXT_KEY_USAGE,
    ID_CE_SUBJECT_ALT_NAME,
    ID_CE_NAME_CONSTRAINTS,
    ID_CE_POLICY_CONSTRAINTS,
    ID_CE_POLICY_MAPPINGS,
    ID_CE_INHIBIT_ANY_POLICY,
];

/// Critical extensions left to resource checks.
const TOLERATED_CRITICAL: &[ObjectIdentifier] = &[ID_PE_IP_ADDR_BLOCKS, ID_PE_AUTONOMOUS_SYS_IDS];

/// Configuration for path validation.
#[derive(Debug, Clone)]
pub struct ValidationConfig {
    /// Maximum chain length including the certificate under test.
    pub max_chain_length: usize,

    /// Whether to check the certificate against its issuer's CRL.
    pub check_revocation: bool,

    /// What to do when revocation is checked but no CRL is held.
    pub missing_crl: MissingCrlPolicy,

    /// Evaluation time.
    pub time: SystemTime,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_chain_length: 32,
            check_revocation: true,
            missing_crl: MissingCrlPolicy::default(),
            time: SystemTime::now(),
        }
    }
}

/// Result of path validation.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    /// Whether the certificate is valid.
    pub is_valid: bool,

    /// Validation errors encountered.
    pub errors: Vec<String>,

    /// Validation warnings (non-fatal issues).
    pub warnings: Vec<String>,
}

impl ValidationResult {
    fn from_findings(errors: Vec<String>, warnings: Vec<String>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    /// Convert into a `Result`, reporting the first error as the reason.
    pub fn into_result(self) -> Result<()> {
        match self.errors.into_iter().next() {
            None => Ok(()),
            Some(reason) => Err(RpkiError::PathValidationFailed(reason)),
        }
    }
}

/// Certificate path validator.
pub struct PathValidator<'a> {
    crypto: &'a dyn CryptoProvider,
    config: ValidationConfig,
}

impl<'a> PathValidator<'a> {
    /// Create a validator.
    pub fn new(crypto: &'a dyn CryptoProvider, config: ValidationConfig) -> Self {
        Self { crypto, config }
    }

    /// The configuration in use.
    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Validate `cert` against the root-first `trusted` stack.
    ///
    /// `crl` is the CRL of `cert`'s direct issuer, consulted only when
    /// revocation checking is enabled.
    pub fn validate(
        &self,
        cert: &ResourceCert,
        trusted: &[&ResourceCert],
        crl: Option<&CrlRecord>,
    ) -> ValidationResult {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        let Some(issuer) = trusted.last() else {
            errors.push("unable to get local issuer certificate".to_string());
            return ValidationResult::from_findings(errors, warnings);
        };

        let mut chain: Vec<&ResourceCert> = trusted.to_vec();
        chain.push(cert);
        debug!("Validating {} against chain of {}", cert.ski, chain.len());

        if chain.len() > self.config.max_chain_length {
            errors.push(format!(
                "certificate chain too long ({} > {})",
                chain.len(),
                self.config.max_chain_length
            ));
        }

        for (i, current) in chain.iter().enumerate() {
            self.check_validity_period(current, &mut errors);
            self.check_critical_extensions(current, &mut errors, &mut warnings);

            if i == 0 {
                continue;
            }
            let parent = chain[i - 1];

            if current.aki.as_ref() != Some(&parent.ski) {
                errors.push("authority and subject key identifier mismatch".to_string());
            }
            if !parent.ca {
                errors.push("invalid CA certificate".to_string());
            }
            if let Some(max) = parent.path_len {
                // intermediates strictly between parent and the leaf
                let below = chain.len() - 1 - i;
                if below > usize::from(max) {
                    errors.push("path length constraint exceeded".to_string());
                }
            }
            if !self.crypto.verify(&parent.spki, &current.signed) {
                errors.push("certificate signature failure".to_string());
            }
        }

        if self.config.check_revocation {
            let checker =
                RevocationChecker::new(self.crypto, self.config.missing_crl, self.config.time);
            match checker.check(cert, issuer, crl) {
                Ok(status) if status.is_revoked() => errors.push("certificate revoked".to_string()),
                Ok(status) if status.is_unknown() => {
                    warnings.push("no CRL held for issuer".to_string())
                }
                Ok(_) => {}
                Err(RpkiError::PathValidationFailed(reason)) => errors.push(reason),
                Err(e) => errors.push(e.to_string()),
            }
        }

        ValidationResult::from_findings(errors, warnings)
    }

    /// Validate a self-signed trust anchor certificate on its own.
    pub fn validate_trust_anchor(&self, cert: &ResourceCert) -> ValidationResult {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if !cert.is_self_issued() {
            errors.push("trust anchor is not self-issued".to_string());
        }
        if !cert.ca {
            errors.push("invalid CA certificate".to_string());
        }
        self.check_validity_period(cert, &mut errors);
        self.check_critical_extensions(cert, &mut errors, &mut warnings);
        if !self.crypto.verify(&cert.spki, &cert.signed) {
            errors.push("certificate signature failure".to_string());
        }

        ValidationResult::from_findings(errors, warnings)
    }

    fn check_validity_period(&self, cert: &ResourceCert, errors: &mut Vec<String>) {
        if cert.not_before > self.config.time {
            errors.push("certificate is not yet valid".to_string());
        } else if cert.not_after < self.config.time {
            errors.push("certificate has expired".to_string());
        }
    }

    fn check_critical_extensions(
        &self,
        cert: &ResourceCert,
        errors: &mut Vec<String>,
        warnings: &mut Vec<String>,
    ) {
        for ext in cert.critical_extensions() {
            if HANDLED_CRITICAL.contains(&ext.oid) {
                continue;
            }
            if TOLERATED_CRITICAL.contains(&ext.oid) {
                debug!("Tolerating critical resource extension {}", ext.oid);
                continue;
            }
            errors.push(format!("unhandled critical extension {}", ext.oid));
        }
        if !cert.ca && cert.purpose.is_authority() {
            warnings.push("authority certificate without cA flag".to_string());
        }
    }
}
