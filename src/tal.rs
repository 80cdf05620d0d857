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

//! Trust anchor locators (RFC 8630).
//!
//! A TAL names where a trust anchor certificate is published and pins its
//! public key:
//!
//! ```text
//! # optional comment lines
//! https://rpki.example.net/ta/ta.cer
//! rsync://rpki.example.net/ta/ta.cer
//!
//! MIIBIjANBgkqhkiG9w0BAQEFAAOCAQ8AMIIBCgKCAQEA...
//! ```

use crate::error::{Result, RpkiError};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use der::Decode;
use std::path::Path;
use tracing::debug;
use x509_cert::spki::SubjectPublicKeyInfoOwned;

/// A parsed trust anchor locator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tal {
    /// Description: the TAL file name without `.tal`.
    pub name: String,
    /// Certificate URIs, sorted so `https://` comes first.
    pub uris: Vec<String>,
    /// DER encoded SubjectPublicKeyInfo of the trust anchor.
    pub spki: Vec<u8>,
}

impl Tal {
    /// Parse TAL text. `name` is the file name or path it came from.
    pub fn parse(name: &str, text: &str) -> Result<Self> {
        let err = |msg: String| RpkiError::parse(name, msg);

        let mut lines = text.split('\n').map(|l| l.strip_suffix('\r').unwrap_or(l));
        let mut uris: Vec<String> = Vec::new();
        let mut file: Option<&str> = None;
        let mut in_comments = true;

        for line in lines.by_ref() {
            if in_comments {
                if line.starts_with('#') {
                    continue;
                }
                in_comments = false;
            }
            if line.is_empty() {
                break;
            }

            if !line.is_ascii() || line.bytes().any(|b| b.is_ascii_control() || b == b' ') {
                return Err(err("invalid URI".to_string()));
            }
            let lower = line.to_ascii_lowercase();
            if !(lower.starts_with("https://") || lower.starts_with("rsync://")) {
                return Err(err(format!("unsupported URL schema: {line}")));
            }
            if !lower.ends_with(".cer") {
                return Err(err(format!("not a certificate URL: {line}")));
            }

            let base = line.rsplit('/').next().unwrap_or(line);
            match file {
                Some(expected) if expected != base => {
                    return Err(err(format!(
                        "URL with different file name {base}, instead of {expected}"
                    )));
                }
                Some(_) => {}
                None => file = Some(base),
            }
            uris.push(line.to_string());
        }

        if uris.is_empty() {
            return Err(err("no URIs in TAL file".to_string()));
        }
        uris.sort();

        let key: String = lines
            .flat_map(|l| l.chars())
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        let spki = STANDARD
            .decode(key.as_bytes())
            .map_err(|e| err(format!("subjectPublicKeyInfo: bad public key: {e}")))?;
        SubjectPublicKeyInfoOwned::from_der(&spki)
            .map_err(|e| err(format!("subjectPublicKeyInfo: failed public key parse: {e}")))?;

        let tal = Self {
            name: description(name),
            uris,
            spki,
        };
        debug!("Parsed TAL {} with {} URIs", tal.name, tal.uris.len());
        Ok(tal)
    }

    /// Read and parse a TAL file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        Self::parse(&path.to_string_lossy(), &text)
    }
}

/// The TAL basename with any `.tal` suffix removed.
fn description(name: &str) -> String {
    let base = name.rsplit('/').next().unwrap_or(name);
    if base.len() > 4 && base[base.len() - 4..].eq_ignore_ascii_case(".tal") {
        base[..base.len() - 4].to_string()
    } else {
        base.to_string()
    }
}
