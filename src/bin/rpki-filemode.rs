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

//! RPKI file mode validator.
//!
//! Validates individual repository objects against trust anchors and a
//! local repository mirror, and prints what was found.
//!
//! # Usage
//!
//! ```text
//! rpki-filemode [OPTIONS] <FILE>...
//!
//! Options:
//!   -c, --config <PATH>   Path to configuration file
//!   -t, --tal <PATH>      Trust anchor locator (repeatable)
//!   -r, --root <DIR>      Repository mirror directory (repeatable)
//!       --reject-missing-crl  Fail objects whose issuer has no CRL
//!       --json            Print one JSON document per file
//!   -v, --verbose         Enable verbose output
//!   -q, --quiet           Suppress non-error output
//! ```
//!
//! # Examples
//!
//! ```bash
//! # Validate a CA certificate and the CRL it publishes
//! rpki-filemode -t /etc/rpki/ripe.tal -r /var/cache/rpki-client \
//!     /var/cache/rpki-client/rpki.ripe.net/repository/ca.cer \
//!     /var/cache/rpki-client/rpki.ripe.net/repository/ca/ca.crl
//! ```
//!
//! Only certificates and CRLs are decoded here. Manifests, ROAs and other
//! CMS objects need an `ObjectParser` that understands CMS and are
//! reported as unsupported otherwise.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use clap::Parser;
use rpki_validator::crypto::sha256;
use rpki_validator::{
    Engine, EngineConfig, MissingCrlPolicy, Object, RpkiError, Tal, ValidationOutcome,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::SystemTime;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// RPKI file mode validator
#[derive(Parser)]
#[command(name = "rpki-filemode")]
#[command(author = "U.S. Federal Government")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Validate RPKI repository objects", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Trust anchor locator
    #[arg(short, long = "tal", value_name = "PATH")]
    tals: Vec<PathBuf>,

    /// Repository mirror directory
    #[arg(short, long = "root", value_name = "DIR")]
    roots: Vec<PathBuf>,

    /// Fail objects whose issuer has no CRL
    #[arg(long)]
    reject_missing_crl: bool,

    /// Print one JSON document per file
    #[arg(long)]
    json: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Suppress non-error output
    #[arg(short, long)]
    quiet: bool,

    /// Objects to validate
    #[arg(required = true, value_name = "FILE")]
    files: Vec<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.quiet {
        tracing::Level::ERROR
    } else if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_config(cli: &Cli) -> Result<EngineConfig, RpkiError> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    config.tals.extend(cli.tals.iter().cloned());
    config.repository_roots.extend(cli.roots.iter().cloned());
    if cli.reject_missing_crl {
        config.missing_crl = MissingCrlPolicy::Reject;
    }
    Ok(config)
}

/// Returns whether every file validated or was not applicable.
fn run(cli: Cli) -> Result<bool, Box<dyn std::error::Error>> {
    let config = load_config(&cli)?;
    let tals = config.tals.clone();
    let mut engine = Engine::from_config(config);

    for path in &tals {
        let tal = Tal::load(path)?;
        if let Err(e) = engine.load_trust_anchor(&tal) {
            eprintln!("{}: {}", path.display(), e);
        }
    }

    let mut all_ok = true;
    for path in &cli.files {
        let location = path.to_string_lossy().into_owned();
        let data = match std::fs::read(path) {
            Ok(data) => data,
            Err(e) => {
                eprintln!("{}: {}", location, e);
                all_ok = false;
                continue;
            }
        };
        let hash = STANDARD.encode(sha256(&data));

        let outcome = match Object::new(location.as_str(), data) {
            Ok(object) => engine.submit(&object),
            Err(e) => {
                eprintln!("{}: {}", location, e);
                all_ok = false;
                continue;
            }
        };

        let applicable = !matches!(outcome.error, Some(RpkiError::UnsupportedObject(_)));
        if applicable && !outcome.valid {
            all_ok = false;
        }

        if cli.json {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        } else {
            print_outcome(&outcome, &hash, applicable);
        }
    }
    Ok(all_ok)
}

fn format_time(time: SystemTime) -> String {
    OffsetDateTime::from(time)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "-".to_string())
}

fn print_outcome(outcome: &ValidationOutcome, hash: &str, applicable: bool) {
    println!("File:                     {}", outcome.location);
    println!("Hash identifier:          {}", hash);
    println!("Object type:              {}", outcome.kind);

    for file in &outcome.files {
        println!("Manifest entry:           {} {:?}", file.name, file.status);
    }
    if let Some(content) = outcome.content_valid {
        println!(
            "Content:                  {}",
            if content { "OK" } else { "Failed" }
        );
    }

    if !applicable {
        println!("Validation:               N/A");
    } else if outcome.valid {
        println!("Validation:               OK");
    } else {
        println!(
            "Validation:               Failed, {}",
            outcome.reason.as_deref().unwrap_or("unknown error")
        );
    }

    for (i, location) in outcome.signature_path.iter().enumerate() {
        if i == 0 {
            println!("Signature path:           {}", location);
        } else {
            println!("                          {}", location);
        }
    }
    if let Some(expires) = outcome.expires {
        println!("Signature path expires:   {}", format_time(expires));
    }
    println!();
}
