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

//! CRL-based revocation checking.
//!
//! Revocation is decided against the single CRL held for a certificate's
//! issuer. The checker does not fetch anything: the caller hands it the CRL
//! from the [`CrlStore`](crate::crl_store::CrlStore), or `None`.
//!
//! # Example
//!
//! ```no_run
//! use rpki_validator::config::MissingCrlPolicy;
//! use rpki_validator::crypto::RsaVerifier;
//! use rpki_validator::revocation::RevocationChecker;
//!
//! # fn example(
//! #     cert: &rpki_validator::types::ResourceCert,
//! #     issuer: &rpki_validator::types::ResourceCert,
//! #     crl: Option<&rpki_validator::types::CrlRecord>,
//! # ) -> Result<(), Box<dyn std::error::Error>> {
//! let crypto = RsaVerifier::new();
//! let checker = RevocationChecker::new(&crypto, MissingCrlPolicy::Reject, std::time::SystemTime::now());
//!
//! let status = checker.check(cert, issuer, crl)?;
//! if status.is_revoked() {
//!     println!("Certificate has been revoked!");
//! }
//! # Ok(())
//! # }
//! ```

use crate::config::MissingCrlPolicy;
use crate::crypto::CryptoProvider;
use crate::error::{Result, RpkiError};
use crate::types::{CrlRecord, ResourceCert};
use std::time::SystemTime;
use tracing::{debug, warn};

/// Revocation status of a certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevocationStatus {
    /// The issuer's CRL does not list the certificate.
    Valid,

    /// The issuer's CRL lists the certificate.
    Revoked,

    /// No CRL is held for the issuer.
    Unknown,
}

impl RevocationStatus {
    /// Check if the certificate is revoked.
    pub fn is_revoked(&self) -> bool {
        matches!(self, Self::Revoked)
    }

    /// Check if the certificate is valid.
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// Check if the status is unknown.
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }
}

/// Checks a certificate against its issuer's CRL.
pub struct RevocationChecker<'a> {
    crypto: &'a dyn CryptoProvider,
    policy: MissingCrlPolicy,
    now: SystemTime,
}

impl<'a> RevocationChecker<'a> {
    /// Create a checker evaluating at time `now`.
    pub fn new(crypto: &'a dyn CryptoProvider, policy: MissingCrlPolicy, now: SystemTime) -> Self {
        Self {
            crypto,
            policy,
            now,
        }
    }

    /// Verify that `crl` is a usable CRL from `issuer`.
    pub fn check_crl(&self, crl: &CrlRecord, issuer: &ResourceCert) -> Result<()> {
        if crl.aki != issuer.ski {
            return Err(RpkiError::path_validation(
                "CRL issuer does not match certificate issuer",
            ));
        }
        if !self.crypto.verify(&issuer.spki, &crl.signed) {
            return Err(RpkiError::path_validation("CRL signature failure"));
        }
        if crl.this_update > self.now {
            return Err(RpkiError::path_validation("CRL is not yet valid"));
        }
        if crl.next_update < self.now {
            return Err(RpkiError::path_validation("CRL has expired"));
        }
        Ok(())
    }

    /// Determine the revocation status of `cert`.
    ///
    /// Fails if the CRL itself is unusable, or if it is missing and the
    /// policy requires one. A missing CRL under [`MissingCrlPolicy::Allow`]
    /// yields [`RevocationStatus::Unknown`].
    pub fn check(
        &self,
        cert: &ResourceCert,
        issuer: &ResourceCert,
        crl: Option<&CrlRecord>,
    ) -> Result<RevocationStatus> {
        let crl = match crl {
            Some(crl) => crl,
            None => {
                return match self.policy {
                    MissingCrlPolicy::Allow => {
                        debug!("No CRL held for issuer {}, allowing", issuer.ski);
                        Ok(RevocationStatus::Unknown)
                    }
                    MissingCrlPolicy::Reject => {
                        warn!("No CRL held for issuer {}", issuer.ski);
                        Err(RpkiError::path_validation("unable to get certificate CRL"))
                    }
                };
            }
        };

        self.check_crl(crl, issuer)?;

        if crl.is_revoked(&cert.serial) {
            debug!("Serial {} revoked by {}", cert.serial, issuer.ski);
            return Ok(RevocationStatus::Revoked);
        }
        Ok(RevocationStatus::Valid)
    }
}
