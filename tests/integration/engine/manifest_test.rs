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

//! Integration tests for manifest validation and file integrity

use crate::integration::*;
use rpki_validator::manifest::FileStatus;
use rpki_validator::types::{Manifest, Record, ResourceCert};
use rpki_validator::{Engine, EngineConfig, MissingCrlPolicy, Object, RpkiError};

/// A trust anchor with one validated CA (id 2).
fn setup(pki: &Pki, config: EngineConfig) -> (Engine, ResourceCert) {
    let anchor = ta(1, 100);
    pki.publish_crl(&crl(&anchor, 50, &[]));
    let mut engine = pki.engine_with_ta(&anchor, config);
    let authority = ca(2, &anchor, 90);
    let outcome = engine.submit(&pki.publish_cert(&authority));
    assert!(outcome.valid, "setup failed: {:?}", outcome.reason);
    (engine, authority)
}

fn publish_file(pki: &Pki, name: &str, content: &[u8]) {
    pki.repo.insert(&format!("{}/{name}", ca_dir(2)), content.to_vec());
}

fn publish_manifest(pki: &Pki, mft: Manifest) -> Object {
    pki.publish(&format!("{}/2.mft", ca_dir(2)), Record::Manifest(mft))
}

fn statuses(files: &[rpki_validator::manifest::FileCheck]) -> Vec<FileStatus> {
    files.iter().map(|f| f.status).collect()
}

#[test]
fn test_digest_mismatch_is_per_file() {
    let pki = Pki::new();
    let (mut engine, authority) = setup(&pki, test_config());

    publish_file(&pki, "a.roa", b"route a");
    publish_file(&pki, "b.roa", b"route B");
    publish_file(&pki, "c.cer", b"child");

    let mft = manifest(
        ee(3, &authority, 95),
        95,
        &[("a.roa", b"route a"), ("b.roa", b"route b"), ("c.cer", b"child")],
    );
    let outcome = engine.submit(&publish_manifest(&pki, mft));

    assert!(outcome.valid, "unexpected failure: {:?}", outcome.reason);
    assert_eq!(
        statuses(&outcome.files),
        vec![FileStatus::Usable, FileStatus::DigestMismatch, FileStatus::Usable]
    );
    assert!(matches!(
        outcome.files[1].error(),
        Some(RpkiError::DigestMismatch(ref name)) if name == "b.roa"
    ));
}

#[test]
fn test_disallowed_and_missing_files() {
    let pki = Pki::new();
    let (mut engine, authority) = setup(&pki, test_config());
    publish_file(&pki, "ok.gbr", b"contact");

    let mft = manifest(
        ee(3, &authority, 95),
        95,
        &[("../escape.roa", b"x"), ("gone.roa", b"y"), ("ok.gbr", b"contact")],
    );
    let outcome = engine.submit(&publish_manifest(&pki, mft));

    assert!(outcome.valid);
    assert_eq!(
        statuses(&outcome.files),
        vec![
            FileStatus::DisallowedFilename,
            FileStatus::Missing,
            FileStatus::Usable
        ]
    );
}

#[test]
fn test_stale_manifest_skips_file_checks() {
    let pki = Pki::new();
    let (mut engine, authority) = setup(&pki, test_config());
    publish_file(&pki, "a.roa", b"tampered");

    let mft = manifest(ee(3, &authority, 95), NOW_DAY - 1, &[("a.roa", b"route a")]);
    let outcome = engine.submit(&publish_manifest(&pki, mft));

    assert!(outcome.valid);
    assert_eq!(statuses(&outcome.files), vec![FileStatus::NotChecked]);
    assert_eq!(outcome.expires, Some(day(NOW_DAY - 1)));
}

#[test]
fn test_manifest_signer_not_checked_for_revocation() {
    let pki = Pki::new();
    let config = EngineConfig::builder()
        .evaluation_time(day(NOW_DAY))
        .missing_crl(MissingCrlPolicy::Reject)
        .build();
    let (mut engine, authority) = setup(&pki, config);
    let signer = ee(3, &authority, 95);

    // no CRL for the authority yet
    let mft = manifest(signer.clone(), 95, &[]);
    let outcome = engine.submit(&publish_manifest(&pki, mft));
    assert!(outcome.valid, "unexpected failure: {:?}", outcome.reason);

    // a CRL revoking the signer does not matter either
    assert!(engine
        .submit(&pki.object(&crl_uri(2), Record::Crl(crl(&authority, 50, &[&signer]))))
        .valid);
    let mft = manifest(signer, 95, &[]);
    let outcome = engine.submit(&publish_manifest(&pki, mft));
    assert!(outcome.valid, "unexpected failure: {:?}", outcome.reason);
}

#[test]
fn test_manifest_bad_signature() {
    let pki = Pki::new();
    let (mut engine, authority) = setup(&pki, test_config());

    let mft = manifest(corrupt(ee(3, &authority, 95)), 95, &[]);
    let outcome = engine.submit(&publish_manifest(&pki, mft));

    assert!(matches!(
        outcome.error,
        Some(RpkiError::PathValidationFailed(_))
    ));
    assert!(outcome.files.is_empty());
}
