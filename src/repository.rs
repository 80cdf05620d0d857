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

//! Access to referenced repository objects.
//!
//! The engine loads AIA targets, CRLs and manifest entries through a
//! [`Repository`]. Fetching is somebody else's job: a repository only maps
//! an `rsync://` URI or a local path onto bytes that are already present.

use crate::error::{Result, RpkiError};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::debug;

const RSYNC_SCHEME: &str = "rsync://";

/// Source of referenced objects.
pub trait Repository: Send + Sync {
    /// Load the object at `uri`, failing with `NotFound` if it is absent.
    fn load(&self, uri: &str) -> Result<Vec<u8>>;
}

/// Strip the rsync scheme, leaving `host/module/path`.
fn strip_rsync(uri: &str) -> Option<&str> {
    uri.strip_prefix(RSYNC_SCHEME)
}

/// Repository backed by local mirror directories.
///
/// An `rsync://host/module/path` URI resolves to `<root>/host/module/path`
/// for the first root that has it. Any other location is treated as a
/// filesystem path.
#[derive(Debug, Clone, Default)]
pub struct FsRepository {
    roots: Vec<PathBuf>,
}

impl FsRepository {
    /// Create a repository over the given mirror roots.
    pub fn new<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
        }
    }

    /// Mirror roots searched for `rsync://` URIs.
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    fn read(path: &Path) -> Result<Option<Vec<u8>>> {
        match std::fs::read(path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl Repository for FsRepository {
    fn load(&self, uri: &str) -> Result<Vec<u8>> {
        if let Some(rel) = strip_rsync(uri) {
            let rel = Path::new(rel);
            if rel
                .components()
                .any(|c| !matches!(c, Component::Normal(_)))
            {
                return Err(RpkiError::not_found(format!("{uri}: invalid path")));
            }

            for root in &self.roots {
                let path = root.join(rel);
                if let Some(data) = Self::read(&path)? {
                    debug!("Loaded {} from {}", uri, path.display());
                    return Ok(data);
                }
            }
            return Err(RpkiError::not_found(uri));
        }

        if uri.contains("://") {
            return Err(RpkiError::not_found(format!("{uri}: unsupported scheme")));
        }

        let path = Path::new(uri);
        if let Some(data) = Self::read(path)? {
            return Ok(data);
        }
        if path.is_relative() {
            for root in &self.roots {
                if let Some(data) = Self::read(&root.join(path))? {
                    return Ok(data);
                }
            }
        }
        Err(RpkiError::not_found(uri))
    }
}

/// In-memory repository.
///
/// Cloning yields another handle onto the same contents, so a caller can
/// keep publishing objects after handing the repository to an engine.
#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    objects: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl MemoryRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    fn key(uri: &str) -> String {
        strip_rsync(uri).unwrap_or(uri).to_string()
    }

    /// Publish or replace an object.
    pub fn insert(&self, uri: &str, data: impl Into<Vec<u8>>) {
        let mut objects = self.objects.write().unwrap_or_else(|e| e.into_inner());
        objects.insert(Self::key(uri), data.into());
    }

    /// Withdraw an object. Returns whether it was present.
    pub fn remove(&self, uri: &str) -> bool {
        let mut objects = self.objects.write().unwrap_or_else(|e| e.into_inner());
        objects.remove(&Self::key(uri)).is_some()
    }

    /// Number of published objects.
    pub fn len(&self) -> usize {
        self.objects.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Whether nothing is published.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Repository for MemoryRepository {
    fn load(&self, uri: &str) -> Result<Vec<u8>> {
        let objects = self.objects.read().unwrap_or_else(|e| e.into_inner());
        objects
            .get(&Self::key(uri))
            .cloned()
            .ok_or_else(|| RpkiError::not_found(uri))
    }
}
