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

//! Integration tests for CRL handling and revocation

use crate::integration::*;
use rpki_validator::types::{KeyId, Record};
use rpki_validator::{EngineConfig, MissingCrlPolicy, RpkiError};

fn reject_config() -> EngineConfig {
    EngineConfig::builder()
        .evaluation_time(day(NOW_DAY))
        .missing_crl(MissingCrlPolicy::Reject)
        .build()
}

fn is_failure(outcome: &rpki_validator::ValidationOutcome, reason: &str) -> bool {
    matches!(&outcome.error, Some(RpkiError::PathValidationFailed(r)) if r == reason)
}

#[test]
fn test_revocation_depends_on_loaded_crl() {
    let pki = Pki::new();
    let anchor = ta(1, 100);
    let issuer = ca(2, &anchor, 90);
    let cert = ca(3, &issuer, 90);
    let issuer_object = pki.publish_cert(&issuer);
    let cert_object = pki.publish_cert(&cert);
    let revoking = pki.object(&crl_uri(2), Record::Crl(crl(&issuer, 50, &[&cert])));

    // before the CRL is known
    let mut engine = pki.engine_with_ta(&anchor, test_config());
    assert!(engine.submit(&issuer_object).valid);
    let outcome = engine.submit(&cert_object);
    assert!(outcome.valid, "unexpected failure: {:?}", outcome.reason);

    // after
    let mut engine = pki.engine_with_ta(&anchor, test_config());
    assert!(engine.submit(&issuer_object).valid);
    assert!(engine.submit(&revoking).valid);
    let outcome = engine.submit(&cert_object);
    assert!(is_failure(&outcome, "certificate revoked"), "{:?}", outcome.reason);
    assert_eq!(engine.auth_store().len(), 2);
}

#[test]
fn test_crl_fetched_from_distribution_point() {
    let pki = Pki::new();
    let anchor = ta(1, 100);
    let issuer = ca(2, &anchor, 90);
    let mut engine = pki.engine_with_ta(&anchor, test_config());
    assert!(engine.submit(&pki.publish_cert(&issuer)).valid);

    let revoked = ca(3, &issuer, 90);
    let kept = ca(4, &issuer, 90);
    pki.publish_crl(&crl(&issuer, 50, &[&revoked]));

    let outcome = engine.submit(&pki.publish_cert(&revoked));
    assert!(is_failure(&outcome, "certificate revoked"));
    // the CRL loaded for the rejected object is dropped with it
    assert!(engine.crl_store().is_empty());

    let outcome = engine.submit(&pki.publish_cert(&kept));
    assert!(outcome.valid, "unexpected failure: {:?}", outcome.reason);
    assert!(engine.crl_store().contains(&KeyId::new(vec![2])));
}

#[test]
fn test_missing_crl_policy() {
    let pki = Pki::new();
    let anchor = ta(1, 100);
    let issuer = ca(2, &anchor, 90);
    pki.publish_crl(&crl(&anchor, 50, &[]));

    let mut engine = pki.engine_with_ta(&anchor, reject_config());
    let outcome = engine.submit(&pki.publish_cert(&issuer));
    assert!(outcome.valid, "unexpected failure: {:?}", outcome.reason);

    let cert_object = pki.publish_cert(&ca(3, &issuer, 90));
    let outcome = engine.submit(&cert_object);
    assert!(is_failure(&outcome, "unable to get certificate CRL"));

    pki.publish_crl(&crl(&issuer, 50, &[]));
    let outcome = engine.submit(&cert_object);
    assert!(outcome.valid, "unexpected failure: {:?}", outcome.reason);
}

#[test]
fn test_missing_crl_allowed_by_default() {
    let pki = Pki::new();
    let anchor = ta(1, 100);
    let mut engine = pki.engine_with_ta(&anchor, test_config());

    let outcome = engine.submit(&pki.publish_cert(&ca(2, &anchor, 90)));
    assert!(outcome.valid);
    assert!(engine.crl_store().is_empty());
}

#[test]
fn test_duplicate_crl_rejected() {
    let pki = Pki::new();
    let anchor = ta(1, 100);
    let mut engine = pki.engine_with_ta(&anchor, test_config());

    let first = pki.object(&crl_uri(1), Record::Crl(crl(&anchor, 50, &[])));
    let second = pki.object(&crl_uri(1), Record::Crl(crl(&anchor, 60, &[])));

    assert!(engine.submit(&first).valid);
    let outcome = engine.submit(&second);
    assert!(matches!(outcome.error, Some(RpkiError::DuplicateIssuer(_))));

    let held = engine.crl_store().lookup(&anchor.ski).unwrap();
    assert_eq!(held.next_update, day(50));
}

#[test]
fn test_crl_signature_checked_for_known_issuer() {
    let pki = Pki::new();
    let anchor = ta(1, 100);
    let mut engine = pki.engine_with_ta(&anchor, test_config());

    let mut forged = crl(&anchor, 50, &[]);
    forged.signed.signature = vec![0; 32];
    let outcome = engine.submit(&pki.object(&crl_uri(1), Record::Crl(forged)));

    assert!(is_failure(&outcome, "CRL signature failure"));
    assert!(engine.crl_store().is_empty());
}

#[test]
fn test_crl_for_unknown_issuer() {
    let pki = Pki::new();
    let anchor = ta(1, 100);
    let pending = ca(2, &anchor, 90);
    let mut engine = pki.engine(test_config());

    let outcome = engine.submit(&pki.object(&crl_uri(2), Record::Crl(crl(&pending, 40, &[]))));
    assert!(outcome.valid);
    assert_eq!(outcome.expires, Some(day(40)));
    assert!(outcome.signature_path.is_empty());
    assert_eq!(engine.crl_store().len(), 1);
}

#[test]
fn test_expired_crl() {
    let pki = Pki::new();
    let anchor = ta(1, 100);
    let mut engine = pki.engine_with_ta(&anchor, test_config());
    assert!(engine
        .submit(&pki.object(&crl_uri(1), Record::Crl(crl(&anchor, NOW_DAY - 1, &[]))))
        .valid);

    let outcome = engine.submit(&pki.publish_cert(&ca(2, &anchor, 90)));
    assert!(is_failure(&outcome, "CRL has expired"));
}

#[test]
fn test_forged_crl_before_issuer_is_discarded() {
    let pki = Pki::new();
    let anchor = ta(1, 100);
    let issuer = ca(2, &anchor, 90);
    let mut engine = pki.engine_with_ta(&anchor, test_config());

    let mut forged = crl(&issuer, 50, &[]);
    forged.signed.signature = vec![0; 32];
    assert!(engine.submit(&pki.object(&crl_uri(2), Record::Crl(forged))).valid);
    assert!(!engine.crl_store().is_verified(&issuer.ski));

    // validating the issuer drops the CRL that does not verify under it
    assert!(engine.submit(&pki.publish_cert(&issuer)).valid);
    assert!(engine.crl_store().is_empty());

    let outcome = engine.submit(&pki.object(&crl_uri(2), Record::Crl(crl(&issuer, 50, &[]))));
    assert!(outcome.valid, "unexpected failure: {:?}", outcome.reason);
    assert!(engine.crl_store().is_verified(&issuer.ski));

    let outcome = engine.submit(&pki.publish_cert(&ca(3, &issuer, 90)));
    assert!(outcome.valid, "unexpected failure: {:?}", outcome.reason);
}

#[test]
fn test_crl_before_issuer_confirmed_and_enforced() {
    let pki = Pki::new();
    let anchor = ta(1, 100);
    let issuer = ca(2, &anchor, 90);
    let revoked = ca(3, &issuer, 90);
    let mut engine = pki.engine_with_ta(&anchor, test_config());

    assert!(engine
        .submit(&pki.object(&crl_uri(2), Record::Crl(crl(&issuer, 50, &[&revoked]))))
        .valid);
    assert!(engine.submit(&pki.publish_cert(&issuer)).valid);
    assert!(engine.crl_store().is_verified(&issuer.ski));

    // a second CRL for a confirmed issuer is still a duplicate
    let outcome = engine.submit(&pki.object(&crl_uri(2), Record::Crl(crl(&issuer, 60, &[]))));
    assert!(matches!(outcome.error, Some(RpkiError::DuplicateIssuer(_))));

    let outcome = engine.submit(&pki.publish_cert(&revoked));
    assert!(is_failure(&outcome, "certificate revoked"));
}
