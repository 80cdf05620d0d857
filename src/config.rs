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

//! Engine configuration.
//!
//! Configuration can be built in code with [`EngineConfig::builder`] or read
//! from a TOML file:
//!
//! ```toml
//! missing_crl = "reject"
//! fetch_crls = true
//! evaluation_time = 1700000000
//! repository_roots = ["/var/cache/rpki-client"]
//! tals = ["/etc/rpki/arin.tal"]
//! ```

use crate::error::{Result, RpkiError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// What to do when revocation must be checked but no CRL is held for the
/// issuer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingCrlPolicy {
    /// Treat the certificate as not revoked.
    #[default]
    Allow,
    /// Fail path validation.
    Reject,
}

/// Configuration for a validation [`Engine`](crate::engine::Engine).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Policy for a missing issuer CRL.
    pub missing_crl: MissingCrlPolicy,

    /// Load CRLs named by CRL distribution points while resolving chains.
    pub fetch_crls: bool,

    /// Fixed evaluation time in seconds since the Unix epoch. The system
    /// clock is used when unset.
    pub evaluation_time: Option<u64>,

    /// Local mirror directories for `rsync://` URIs.
    pub repository_roots: Vec<PathBuf>,

    /// Trust anchor locator files.
    pub tals: Vec<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            missing_crl: MissingCrlPolicy::Allow,
            fetch_crls: true,
            evaluation_time: None,
            repository_roots: Vec::new(),
            tals: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// Create a new configuration builder.
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| RpkiError::config(format!("Invalid TOML: {e}")))
    }

    /// Serialize configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| RpkiError::config(format!("TOML serialize: {e}")))
    }

    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| RpkiError::config(format!("{}: {e}", path.display())))?;
        Self::from_toml(&text)
    }

    /// The evaluation time: the configured instant, or now.
    pub fn now(&self) -> SystemTime {
        match self.evaluation_time {
            Some(secs) => UNIX_EPOCH + Duration::from_secs(secs),
            None => SystemTime::now(),
        }
    }
}

/// Builder for [`EngineConfig`].
#[derive(Default)]
pub struct EngineConfigBuilder {
    missing_crl: Option<MissingCrlPolicy>,
    fetch_crls: Option<bool>,
    evaluation_time: Option<u64>,
    repository_roots: Vec<PathBuf>,
    tals: Vec<PathBuf>,
}

impl EngineConfigBuilder {
    /// Set the missing-CRL policy.
    pub fn missing_crl(mut self, policy: MissingCrlPolicy) -> Self {
        self.missing_crl = Some(policy);
        self
    }

    /// Enable or disable CRL loading during chain walks.
    pub fn fetch_crls(mut self, enable: bool) -> Self {
        self.fetch_crls = Some(enable);
        self
    }

    /// Pin the evaluation time.
    pub fn evaluation_time(mut self, time: SystemTime) -> Self {
        let secs = time
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        self.evaluation_time = Some(secs);
        self
    }

    /// Add a repository mirror root.
    pub fn repository_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.repository_roots.push(root.into());
        self
    }

    /// Add a trust anchor locator file.
    pub fn tal(mut self, path: impl Into<PathBuf>) -> Self {
        self.tals.push(path.into());
        self
    }

    /// Build the configuration.
    pub fn build(self) -> EngineConfig {
        let default = EngineConfig::default();
        EngineConfig {
            missing_crl: self.missing_crl.unwrap_or(default.missing_crl),
            fetch_crls: self.fetch_crls.unwrap_or(default.fetch_crls),
            evaluation_time: self.evaluation_time,
            repository_roots: self.repository_roots,
            tals: self.tals,
        }
    }
}
