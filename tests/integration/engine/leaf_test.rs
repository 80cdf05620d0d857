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

//! Integration tests for EE certificates and signed objects

use crate::integration::*;
use rpki_validator::types::{CertPurpose, ObjectKind, Record, ResourceCert};
use rpki_validator::{Engine, EngineConfig, MissingCrlPolicy, Object, RpkiError};

/// A trust anchor and CA 2 holding 10.0.0.0/8.
fn setup(pki: &Pki, config: EngineConfig) -> (Engine, ResourceCert) {
    let anchor = ta(1, 100);
    pki.publish_crl(&crl(&anchor, 50, &[]));
    let mut engine = pki.engine_with_ta(&anchor, config);

    let mut holder = ca(2, &anchor, 90);
    holder.resources = v4([10, 0, 0, 0], 8);
    let outcome = engine.submit(&pki.publish_cert(&holder));
    assert!(outcome.valid, "setup failed: {:?}", outcome.reason);
    (engine, holder)
}

fn signer(id: u8, holder: &ResourceCert) -> ResourceCert {
    let mut cert = ee(id, holder, 80);
    cert.resources = v4([10, 0, 0, 0], 8);
    cert
}

fn publish_roa(pki: &Pki, name: &str, ee: ResourceCert, claimed: [u8; 4], len: u8) -> Object {
    pki.publish(
        &format!("{}/{name}", ca_dir(2)),
        Record::Signed(roa(ee, v4(claimed, len))),
    )
}

#[test]
fn test_roa_within_certificate_resources() {
    let pki = Pki::new();
    let (mut engine, holder) = setup(&pki, test_config());

    let object = publish_roa(&pki, "a.roa", signer(3, &holder), [10, 1, 0, 0], 16);
    assert_eq!(object.kind, ObjectKind::Roa);

    let outcome = engine.submit(&object);
    assert!(outcome.valid, "unexpected failure: {:?}", outcome.reason);
    assert_eq!(outcome.content_valid, Some(true));
    assert_eq!(outcome.expires, Some(day(50)));
    assert_eq!(outcome.signature_path, vec![cert_uri(2), cert_uri(1)]);
    assert_eq!(engine.auth_store().len(), 2);
}

#[test]
fn test_roa_claim_outside_certificate() {
    let pki = Pki::new();
    let (mut engine, holder) = setup(&pki, test_config());

    let mut ee = signer(3, &holder);
    ee.resources = v4([10, 2, 0, 0], 16);
    let outcome = engine.submit(&publish_roa(&pki, "b.roa", ee, [10, 3, 0, 0], 24));

    // the path is fine, the content is not
    assert!(outcome.valid, "unexpected failure: {:?}", outcome.reason);
    assert_eq!(outcome.content_valid, Some(false));
}

#[test]
fn test_ee_resources_exceed_issuer() {
    let pki = Pki::new();
    let (mut engine, holder) = setup(&pki, test_config());

    let mut ee = signer(3, &holder);
    ee.resources = v4([11, 0, 0, 0], 8);
    let outcome = engine.submit(&publish_roa(&pki, "c.roa", ee, [11, 0, 0, 0], 8));

    assert!(matches!(outcome.error, Some(RpkiError::Semantic(_))));
    assert_eq!(outcome.content_valid, None);
}

#[test]
fn test_revoked_signer() {
    let pki = Pki::new();
    let (mut engine, holder) = setup(&pki, test_config());
    let ee = signer(3, &holder);
    pki.publish_crl(&crl(&holder, 50, &[&ee]));

    let outcome = engine.submit(&publish_roa(&pki, "d.roa", ee, [10, 0, 0, 0], 8));

    assert!(matches!(
        outcome.error,
        Some(RpkiError::PathValidationFailed(ref reason)) if reason == "certificate revoked"
    ));
    assert!(engine.crl_store().lookup(&holder.ski).is_none());
}

#[test]
fn test_reject_policy_for_signed_object() {
    let pki = Pki::new();
    let config = EngineConfig::builder()
        .evaluation_time(day(NOW_DAY))
        .missing_crl(MissingCrlPolicy::Reject)
        .build();
    let (mut engine, holder) = setup(&pki, config);
    let object = publish_roa(&pki, "e.roa", signer(3, &holder), [10, 0, 0, 0], 8);

    let outcome = engine.submit(&object);
    assert_eq!(
        outcome.reason.as_deref(),
        Some("path validation failed: unable to get certificate CRL")
    );

    pki.publish_crl(&crl(&holder, 60, &[]));
    let outcome = engine.submit(&object);
    assert!(outcome.valid, "unexpected failure: {:?}", outcome.reason);
    assert_eq!(outcome.expires, Some(day(50)));
}

#[test]
fn test_ee_certificate_submission() {
    let pki = Pki::new();
    let (mut engine, holder) = setup(&pki, test_config());

    let outcome = engine.submit(&pki.publish_cert(&signer(3, &holder)));
    assert!(outcome.valid, "unexpected failure: {:?}", outcome.reason);
    assert_eq!(outcome.content_valid, None);
    assert_eq!(outcome.expires, Some(day(50)));

    let mut router = signer(4, &holder);
    router.purpose = CertPurpose::BgpsecRouter;
    router.resources = Default::default();
    let outcome = engine.submit(&pki.publish_cert(&router));
    assert!(outcome.valid, "unexpected failure: {:?}", outcome.reason);
    assert_eq!(engine.auth_store().len(), 2);
}

#[test]
fn test_unparseable_object() {
    let pki = Pki::new();
    let (mut engine, _) = setup(&pki, test_config());

    let object = Object::new(format!("{}/junk.roa", ca_dir(2)), b"not der".to_vec()).unwrap();
    let outcome = engine.submit(&object);

    assert!(!outcome.valid);
    assert!(matches!(outcome.error, Some(RpkiError::Parse { .. })));
    assert!(outcome.signature_path.is_empty());
}
