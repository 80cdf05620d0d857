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

//! Integration tests for trust anchor bootstrap

use crate::integration::*;
use base64::prelude::*;
use rpki_validator::auth::TalId;
use rpki_validator::types::Record;
use rpki_validator::{Object, RpkiError, Tal};

#[test]
fn test_bootstrap_then_direct_child() {
    let pki = Pki::new();
    let anchor = ta(1, 100);
    let mut engine = pki.engine_with_ta(&anchor, test_config());

    let child = ca(2, &anchor, 90);
    let outcome = engine.submit(&pki.publish_cert(&child));

    assert!(outcome.valid, "unexpected failure: {:?}", outcome.reason);
    assert_eq!(outcome.ta, Some(TalId(0)));
    assert_eq!(outcome.expires, Some(day(90)));
    assert_eq!(outcome.signature_path, vec![cert_uri(1)]);
    assert_eq!(engine.auth_store().len(), 2);
}

#[test]
fn test_pinned_key_mismatch() {
    let pki = Pki::new();
    let mut engine = pki.engine(test_config());
    let object = pki.publish_cert(&ta(1, 100));

    let err = engine.insert_trust_anchor(&spki(9), &object).unwrap_err();
    assert!(matches!(err, RpkiError::NotTrustAnchor(_)));
    assert!(engine.auth_store().is_empty());
}

#[test]
fn test_unpinned_self_signed_certificate() {
    let pki = Pki::new();
    let mut engine = pki.engine(test_config());

    let outcome = engine.submit(&pki.publish_cert(&ta(1, 100)));
    assert!(!outcome.valid);
    assert!(matches!(outcome.error, Some(RpkiError::NotTrustAnchor(_))));
    assert!(outcome.expires.is_none());
}

#[test]
fn test_load_from_tal() {
    let pki = Pki::new();
    let anchor = ta(1, 100);
    let object = pki.publish_cert(&anchor);
    let mut engine = pki.engine(test_config());

    let tal = Tal {
        name: "example".to_string(),
        uris: vec!["https://rpki.example.net/ta.cer".to_string(), cert_uri(1)],
        spki: anchor.spki.clone(),
    };
    engine.load_trust_anchor(&tal).unwrap();
    assert_eq!(engine.trust_anchor_name(TalId(0)), Some("example"));

    // resubmitting the anchor collides with the stored one
    let outcome = engine.submit(&object);
    assert!(matches!(outcome.error, Some(RpkiError::DuplicateSubject(_))));
    assert_eq!(engine.auth_store().len(), 1);
}

#[test]
fn test_tal_unreachable() {
    let pki = Pki::new();
    let mut engine = pki.engine(test_config());
    let tal = Tal {
        name: "missing".to_string(),
        uris: vec![cert_uri(7)],
        spki: spki(7),
    };

    let err = engine.load_trust_anchor(&tal).unwrap_err();
    assert!(matches!(err, RpkiError::NotFound(_)));
}

#[test]
fn test_submit_tal_file() {
    let key = rcgen::KeyPair::generate().unwrap();
    let der = key.public_key_der();

    let pki = Pki::new();
    pki.publish_cert(&ta_with_key(1, der.clone(), 100));
    let mut engine = pki.engine(test_config());

    let text = format!("# test anchor\n{}\n\n{}\n", cert_uri(1), BASE64_STANDARD.encode(&der));
    let outcome = engine.submit(&Object::new("/etc/rpki/test.tal", text).unwrap());

    assert!(outcome.valid, "unexpected failure: {:?}", outcome.reason);
    assert_eq!(outcome.ta, Some(TalId(0)));
    assert_eq!(outcome.expires, Some(day(100)));
    assert_eq!(engine.trust_anchor_name(TalId(0)), Some("test"));
}

#[test]
fn test_trust_anchor_may_not_inherit() {
    let pki = Pki::new();
    let mut anchor = ta(1, 100);
    anchor.resources = inherit_all();
    let object = pki.publish("rsync://rpki.example.net/ta.cer", Record::Certificate(anchor));
    let mut engine = pki.engine(test_config());

    let err = engine.insert_trust_anchor(&spki(1), &object).unwrap_err();
    assert!(matches!(err, RpkiError::Semantic(_)));
}

#[test]
fn test_expired_trust_anchor() {
    let pki = Pki::new();
    let object = pki.publish_cert(&ta(1, NOW_DAY - 1));
    let mut engine = pki.engine(test_config());

    let err = engine.insert_trust_anchor(&spki(1), &object).unwrap_err();
    assert!(err.to_string().contains("certificate has expired"));
    assert!(engine.auth_store().is_empty());
}
