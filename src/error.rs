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

//! Error types for the validation engine.
//!
//! Every error is scoped to a single object: the engine reports it in the
//! object's outcome and moves on to the next object.

use crate::types::{CertPurpose, KeyId};
use thiserror::Error;

/// Result type alias using [`RpkiError`].
pub type Result<T> = std::result::Result<T, RpkiError>;

/// Errors that can occur while validating RPKI objects.
#[derive(Debug, Error)]
pub enum RpkiError {
    /// Malformed input handed over by a parser.
    #[error("{location}: parse error: {message}")]
    Parse {
        /// Where the object came from.
        location: String,
        /// What the parser rejected.
        message: String,
    },

    /// DER encoding/decoding error.
    #[error("DER error: {0}")]
    Der(#[from] der::Error),

    /// The AIA walk did not reach a validated certificate in time.
    #[error("authority chain exceeds max depth of {depth}")]
    ChainTooLong {
        /// The depth bound that was hit.
        depth: usize,
    },

    /// An AIA reference or issuer slot points at a non-CA certificate.
    #[error("{location}: not a CA certificate (purpose {purpose})")]
    NotCa {
        /// Location of the offending certificate.
        location: String,
        /// The purpose it declares instead.
        purpose: CertPurpose,
    },

    /// A certificate did not match any pinned trust-anchor key.
    #[error("not a valid trust anchor: {0}")]
    NotTrustAnchor(String),

    /// A CRL for this issuer is already held.
    #[error("duplicate CRL for issuer {0}")]
    DuplicateIssuer(KeyId),

    /// A validated certificate with this SKI is already held.
    #[error("duplicate subject key identifier {0}")]
    DuplicateSubject(KeyId),

    /// Signature, validity, constraint, extension or revocation failure.
    #[error("path validation failed: {0}")]
    PathValidationFailed(String),

    /// Resource coverage or other type-specific check failed.
    #[error("semantic validation failed: {0}")]
    Semantic(String),

    /// A manifest-listed file does not hash to its declared digest.
    #[error("bad message digest for {0}")]
    DigestMismatch(String),

    /// A manifest-listed file name is outside the allowed grammar.
    #[error("unsupported filename {0}")]
    DisallowedFilename(String),

    /// A referenced object could not be loaded.
    #[error("not found: {0}")]
    NotFound(String),

    /// The AIA walk hit a dangling or inconsistent reference.
    #[error("broken authority chain: {0}")]
    BrokenChain(String),

    /// The object kind is not handled by the configured parser.
    #[error("unsupported object: {0}")]
    UnsupportedObject(String),

    /// Invalid engine configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RpkiError {
    /// Create a parse error for the object at `location`.
    pub fn parse(location: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Parse {
            location: location.into(),
            message: msg.into(),
        }
    }

    /// Create a not-a-CA error.
    pub fn not_ca(location: impl Into<String>, purpose: CertPurpose) -> Self {
        Self::NotCa {
            location: location.into(),
            purpose,
        }
    }

    /// Create a trust anchor rejection.
    pub fn not_trust_anchor(msg: impl Into<String>) -> Self {
        Self::NotTrustAnchor(msg.into())
    }

    /// Create a path validation failure.
    pub fn path_validation(reason: impl Into<String>) -> Self {
        Self::PathValidationFailed(reason.into())
    }

    /// Create a semantic validation failure.
    pub fn semantic(reason: impl Into<String>) -> Self {
        Self::Semantic(reason.into())
    }

    /// Create a not-found error.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Create a broken chain error.
    pub fn broken_chain(msg: impl Into<String>) -> Self {
        Self::BrokenChain(msg.into())
    }

    /// Create an unsupported object error.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::UnsupportedObject(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Returns true for malformed-input errors.
    pub fn is_parse_error(&self) -> bool {
        matches!(self, Self::Parse { .. } | Self::Der(_))
    }

    /// Returns true for structural trust errors.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::ChainTooLong { .. } | Self::NotCa { .. } | Self::NotTrustAnchor(_)
        )
    }

    /// Returns true for identity collisions, which are always rejected.
    pub fn is_integrity_violation(&self) -> bool {
        matches!(self, Self::DuplicateIssuer(_) | Self::DuplicateSubject(_))
    }

    /// Returns true for errors scoped to a single manifest entry.
    pub fn is_manifest_entry_error(&self) -> bool {
        matches!(self, Self::DigestMismatch(_) | Self::DisallowedFilename(_))
    }
}
