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

//! # rpki-validator
//!
//! A relying-party trust-chain validation engine for the Resource Public
//! Key Infrastructure (RPKI).
//!
//! Starting from trust anchors pinned by TAL files, the engine builds a tree
//! of validated CA certificates and checks every submitted object against
//! it: certificate chains are resolved through AIA pointers, verified
//! root-to-leaf, checked for revocation against the issuer's CRL, and
//! checked for resource coverage. Manifests additionally have every listed
//! file hashed against its declared digest.
//!
//! ## Features
//!
//! - **Bounded chain building**: unknown issuers are loaded via AIA, at most
//!   [`chain::MAX_DEPTH`] deep, and committed all-or-nothing
//! - **Revocation** with an explicit policy for missing CRLs
//! - **Expiry propagation**: every outcome carries the earliest expiry of
//!   its trust path, including CRL next-update times
//! - **Pluggable collaborators**: parsing, object loading and cryptography
//!   sit behind traits
//!
//! ## Quick Start
//!
//! ```no_run
//! use rpki_validator::{Engine, EngineConfig, Object, Tal};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = EngineConfig::builder()
//!         .repository_root("/var/cache/rpki-client")
//!         .build();
//!     let mut engine = Engine::from_config(config);
//!
//!     let tal = Tal::load("/etc/rpki/ripe.tal")?;
//!     engine.load_trust_anchor(&tal)?;
//!
//!     let path = "rpki.ripe.net/repository/DEFAULT/ca.cer";
//!     let data = std::fs::read(format!("/var/cache/rpki-client/{path}"))?;
//!     let outcome = engine.submit(&Object::new(path, data)?);
//!     match outcome.reason {
//!         None => println!("{path}: OK"),
//!         Some(reason) => println!("{path}: {reason}"),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Cargo Features
//!
//! - `rsa-verifier` (default): RSA PKCS#1 v1.5 signature verification
//! - `cli` (default): the `rpki-filemode` binary

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod auth;
pub mod chain;
pub mod config;
pub mod crl_store;
pub mod crypto;
pub mod engine;
pub mod error;
pub mod manifest;
pub mod parser;
pub mod repository;
pub mod resources;
pub mod revocation;
pub mod tal;
pub mod types;
pub mod validation;
pub mod worker;

// Re-export main types at crate root for convenience
pub use config::{EngineConfig, EngineConfigBuilder, MissingCrlPolicy};
pub use engine::{Engine, ValidationOutcome};
pub use error::{Result, RpkiError};
pub use tal::Tal;
pub use types::{KeyId, Object, ObjectKind, Record};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
