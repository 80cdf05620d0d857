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

//! Integration tests for chain building through AIA references

use crate::integration::*;
use rpki_validator::chain::MAX_DEPTH;
use rpki_validator::types::{KeyId, ResourceCert};
use rpki_validator::RpkiError;

/// Publish CAs `2..=last`, each issued by the previous one.
fn publish_ladder(pki: &Pki, anchor: &ResourceCert, last: u8) -> Vec<ResourceCert> {
    let mut certs = vec![anchor.clone()];
    for id in 2..=last {
        let cert = ca(id, certs.last().unwrap(), 90);
        pki.publish_cert(&cert);
        certs.push(cert);
    }
    certs
}

#[test]
fn test_issuers_loaded_through_aia() {
    let pki = Pki::new();
    let anchor = ta(1, 100);
    let mut engine = pki.engine_with_ta(&anchor, test_config());
    let certs = publish_ladder(&pki, &anchor, 3);

    let outcome = engine.submit(&pki.publish_cert(&ca(4, &certs[2], 90)));

    assert!(outcome.valid, "unexpected failure: {:?}", outcome.reason);
    assert_eq!(engine.auth_store().len(), 4);
    assert_eq!(
        outcome.signature_path,
        vec![cert_uri(3), cert_uri(2), cert_uri(1)]
    );

    let node = engine
        .auth_store()
        .get(engine.auth_store().find(&KeyId::new(vec![4])).unwrap())
        .unwrap();
    assert_eq!(node.depth, 3);
}

#[test]
fn test_chain_too_long_leaves_store_unchanged() {
    let pki = Pki::new();
    let anchor = ta(1, 100);
    let certs = publish_ladder(&pki, &anchor, MAX_DEPTH as u8 + 2);

    // the object's issuer sits MAX_DEPTH + 1 unvalidated CAs below the anchor
    let mut engine = pki.engine_with_ta(&anchor, test_config());
    let last = certs.last().unwrap();
    let outcome = engine.submit(&pki.publish_cert(&ca(MAX_DEPTH as u8 + 3, last, 90)));

    assert!(matches!(
        outcome.error,
        Some(RpkiError::ChainTooLong { depth: MAX_DEPTH })
    ));
    assert_eq!(engine.auth_store().len(), 1);
}

#[test]
fn test_chain_at_max_depth() {
    let pki = Pki::new();
    let anchor = ta(1, 100);
    let certs = publish_ladder(&pki, &anchor, MAX_DEPTH as u8 + 2);
    let mut engine = pki.engine_with_ta(&anchor, test_config());

    // exactly MAX_DEPTH unvalidated issuers
    let outcome = engine.submit(&pki.publish_cert(certs.last().unwrap()));

    assert!(outcome.valid, "unexpected failure: {:?}", outcome.reason);
    assert_eq!(engine.auth_store().len(), MAX_DEPTH + 2);
}

#[test]
fn test_failed_replay_is_atomic() {
    let pki = Pki::new();
    let anchor = ta(1, 100);
    let mut engine = pki.engine_with_ta(&anchor, test_config());

    let good = ca(2, &anchor, 90);
    let bad = corrupt(ca(3, &good, 90));
    let good_object = pki.publish_cert(&good);
    pki.publish_cert(&bad);

    let outcome = engine.submit(&pki.publish_cert(&ca(4, &bad, 90)));
    assert!(matches!(
        outcome.error,
        Some(RpkiError::PathValidationFailed(ref reason)) if reason == "certificate signature failure"
    ));
    assert_eq!(engine.auth_store().len(), 1);

    // the valid intermediate was not kept
    let outcome = engine.submit(&good_object);
    assert!(outcome.valid, "unexpected failure: {:?}", outcome.reason);
}

#[test]
fn test_non_ca_issuer_rejected() {
    let pki = Pki::new();
    let anchor = ta(1, 100);
    let mut engine = pki.engine_with_ta(&anchor, test_config());

    let leaf = ee(2, &anchor, 90);
    pki.publish_cert(&leaf);

    let outcome = engine.submit(&pki.publish_cert(&ca(3, &leaf, 90)));
    assert!(matches!(outcome.error, Some(RpkiError::NotCa { .. })));
    assert_eq!(engine.auth_store().len(), 1);
}

#[test]
fn test_duplicate_subject() {
    let pki = Pki::new();
    let anchor = ta(1, 100);
    let mut engine = pki.engine_with_ta(&anchor, test_config());
    let object = pki.publish_cert(&ca(2, &anchor, 90));

    assert!(engine.submit(&object).valid);

    let mut again = object.clone();
    again.location = format!("{BASE}/copy.cer");
    let outcome = engine.submit(&again);

    assert!(matches!(outcome.error, Some(RpkiError::DuplicateSubject(_))));
    assert_eq!(engine.auth_store().len(), 2);
    let id = engine.auth_store().find(&KeyId::new(vec![2])).unwrap();
    assert_eq!(engine.auth_store().get(id).unwrap().location, cert_uri(2));
}

#[test]
fn test_dangling_aia() {
    let pki = Pki::new();
    let anchor = ta(1, 100);
    let mut engine = pki.engine_with_ta(&anchor, test_config());

    let unpublished = ca(2, &anchor, 90);
    let outcome = engine.submit(&pki.publish_cert(&ca(3, &unpublished, 90)));

    assert!(matches!(outcome.error, Some(RpkiError::NotFound(_))));
    assert_eq!(engine.auth_store().len(), 1);
}

#[test]
fn test_expired_intermediate() {
    let pki = Pki::new();
    let anchor = ta(1, 100);
    let mut engine = pki.engine_with_ta(&anchor, test_config());

    let expired = ca(2, &anchor, NOW_DAY - 1);
    pki.publish_cert(&expired);

    let outcome = engine.submit(&pki.publish_cert(&ca(3, &expired, 90)));
    assert!(outcome.reason.unwrap().contains("certificate has expired"));
    assert_eq!(engine.auth_store().len(), 1);
}

#[test]
fn test_resources_must_be_covered() {
    let pki = Pki::new();
    let anchor = ta(1, 100);
    let mut engine = pki.engine_with_ta(&anchor, test_config());

    let mut holder = ca(2, &anchor, 90);
    holder.resources = v4([10, 0, 0, 0], 8);
    assert!(engine.submit(&pki.publish_cert(&holder)).valid);

    let mut overclaim = ca(3, &holder, 90);
    overclaim.resources = v4([11, 0, 0, 0], 8);
    let outcome = engine.submit(&pki.publish_cert(&overclaim));
    assert!(matches!(outcome.error, Some(RpkiError::Semantic(_))));

    let mut subset = ca(4, &holder, 90);
    subset.resources = v4([10, 1, 0, 0], 16);
    let outcome = engine.submit(&pki.publish_cert(&subset));
    assert!(outcome.valid, "unexpected failure: {:?}", outcome.reason);
}
