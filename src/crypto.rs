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

//! Cryptographic primitives used by the engine.
//!
//! The engine never touches key material directly: signature checks and
//! content digests go through a [`CryptoProvider`]. The default provider,
//! [`RsaVerifier`], implements the RPKI algorithm suite (RFC 7935):
//! RSASSA-PKCS1-v1_5 with SHA-256.

use crate::types::SignedData;
use sha2::{Digest, Sha256};

/// Signature verification and hashing.
pub trait CryptoProvider: Send + Sync {
    /// Verify `signed` under the key in the DER SubjectPublicKeyInfo `spki`.
    fn verify(&self, spki: &[u8], signed: &SignedData) -> bool;

    /// Content digest used for manifest entries.
    fn digest(&self, data: &[u8]) -> Vec<u8> {
        sha256(data)
    }
}

/// SHA-256 of `data`.
pub fn sha256(data: &[u8]) -> Vec<u8> {
    Sha256::digest(data).to_vec()
}

#[cfg(feature = "rsa-verifier")]
pub use self::rsa_impl::RsaVerifier;

#[cfg(feature = "rsa-verifier")]
mod rsa_impl {
    use super::CryptoProvider;
    use crate::types::SignedData;
    use const_oid::db::rfc5912::{RSA_ENCRYPTION, SHA_256_WITH_RSA_ENCRYPTION};
    use rsa::pkcs1v15;
    use rsa::pkcs8::DecodePublicKey as _;
    use rsa::signature::Verifier as _;
    use rsa::RsaPublicKey;
    use sha2::Sha256;
    use tracing::debug;

    /// RSASSA-PKCS1-v1_5 / SHA-256 verifier.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct RsaVerifier;

    impl RsaVerifier {
        /// Create a verifier.
        pub fn new() -> Self {
            Self
        }
    }

    impl CryptoProvider for RsaVerifier {
        fn verify(&self, spki: &[u8], signed: &SignedData) -> bool {
            match signed.algorithm {
                Some(oid) if oid == SHA_256_WITH_RSA_ENCRYPTION || oid == RSA_ENCRYPTION => {}
                Some(oid) => {
                    debug!("unsupported signature algorithm {}", oid);
                    return false;
                }
                None => {}
            }

            let key = match RsaPublicKey::from_public_key_der(spki) {
                Ok(key) => key,
                Err(e) => {
                    debug!("bad RSA public key: {}", e);
                    return false;
                }
            };
            let signature = match pkcs1v15::Signature::try_from(signed.signature.as_slice()) {
                Ok(sig) => sig,
                Err(e) => {
                    debug!("bad signature bytes: {}", e);
                    return false;
                }
            };

            pkcs1v15::VerifyingKey::<Sha256>::new(key)
                .verify(&signed.message, &signature)
                .is_ok()
        }
    }
}
