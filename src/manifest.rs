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

//! Manifest integrity checks.
//!
//! Each manifest entry is checked on its own. A bad entry makes that one
//! file unusable; it does not invalidate the manifest.

use crate::crypto::CryptoProvider;
use crate::error::RpkiError;
use crate::repository::Repository;
use crate::types::Manifest;
use serde::Serialize;
use std::time::SystemTime;
use tracing::{debug, warn};

/// Extensions a manifest may list.
const LISTED_EXTENSIONS: &[&str] = &[
    "cer", "crl", "roa", "gbr", "asa", "sig", "spl", "tak", "csv",
];

/// Whether `name` is an acceptable manifest entry: `[A-Za-z0-9_-]+`, a
/// single dot, and a known extension.
pub fn valid_filename(name: &str) -> bool {
    if !name
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'))
    {
        return false;
    }
    let mut parts = name.split('.');
    let (Some(stem), Some(ext), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    !stem.is_empty() && LISTED_EXTENSIONS.contains(&ext)
}

/// Outcome for one manifest entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    /// Content matches the declared digest.
    Usable,
    /// Content does not match the declared digest.
    DigestMismatch,
    /// The file name is outside the allowed grammar.
    DisallowedFilename,
    /// The file could not be loaded.
    Missing,
    /// The manifest is stale; nothing was checked.
    NotChecked,
}

/// Result for one listed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileCheck {
    /// Listed file name.
    pub name: String,
    /// What the check found.
    pub status: FileStatus,
}

impl FileCheck {
    /// Whether the file may be used.
    pub fn is_usable(&self) -> bool {
        self.status == FileStatus::Usable
    }

    /// The typed error for a failed entry.
    pub fn error(&self) -> Option<RpkiError> {
        match self.status {
            FileStatus::DigestMismatch => Some(RpkiError::DigestMismatch(self.name.clone())),
            FileStatus::DisallowedFilename => {
                Some(RpkiError::DisallowedFilename(self.name.clone()))
            }
            FileStatus::Missing => Some(RpkiError::not_found(self.name.clone())),
            FileStatus::Usable | FileStatus::NotChecked => None,
        }
    }
}

/// Checks manifest entries against repository content.
pub struct ManifestChecker<'a> {
    repository: &'a dyn Repository,
    crypto: &'a dyn CryptoProvider,
}

impl<'a> ManifestChecker<'a> {
    /// Create a checker.
    pub fn new(repository: &'a dyn Repository, crypto: &'a dyn CryptoProvider) -> Self {
        Self { repository, crypto }
    }

    /// Check every entry of `manifest`, resolving names against `dir`.
    ///
    /// A stale manifest reports every entry as [`FileStatus::NotChecked`].
    pub fn check(&self, dir: &str, manifest: &Manifest, now: SystemTime) -> Vec<FileCheck> {
        if manifest.is_stale(now) {
            warn!("Manifest in {} is stale, skipping file checks", dir);
            return manifest
                .files
                .iter()
                .map(|f| FileCheck {
                    name: f.name.clone(),
                    status: FileStatus::NotChecked,
                })
                .collect();
        }

        manifest
            .files
            .iter()
            .map(|entry| {
                let status = self.check_file(dir, &entry.name, &entry.hash);
                FileCheck {
                    name: entry.name.clone(),
                    status,
                }
            })
            .collect()
    }

    fn check_file(&self, dir: &str, name: &str, hash: &[u8]) -> FileStatus {
        if !valid_filename(name) {
            warn!("{}: unsupported filename for {}", dir, hex::encode(hash));
            return FileStatus::DisallowedFilename;
        }

        let uri = if dir.is_empty() {
            name.to_string()
        } else {
            format!("{dir}/{name}")
        };
        let data = match self.repository.load(&uri) {
            Ok(data) => data,
            Err(e) => {
                warn!("{}: {}", uri, e);
                return FileStatus::Missing;
            }
        };

        if self.crypto.digest(&data) != hash {
            warn!("{}: bad message digest for {}", dir, name);
            return FileStatus::DigestMismatch;
        }
        debug!("{}: digest ok", uri);
        FileStatus::Usable
    }
}
