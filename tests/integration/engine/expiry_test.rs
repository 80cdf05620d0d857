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

//! Integration tests for effective expiry propagation

use crate::integration::*;
use rpki_validator::manifest::FileStatus;
use rpki_validator::types::Record;

#[test]
fn test_trust_anchor_ca_crl_manifest_sequence() {
    let pki = Pki::new();
    let anchor = ta(1, 100);
    let authority = ca(2, &anchor, 90);
    pki.repo
        .insert(&format!("{}/a.roa", ca_dir(2)), b"route a".to_vec());

    let ta_object = pki.publish_cert(&anchor);
    let ca_object = pki.publish_cert(&authority);
    // CRL for the authority's AKI
    let crl_object = pki.object(&crl_uri(1), Record::Crl(crl(&anchor, 80, &[])));
    let mft = manifest(ee(3, &authority, 95), 95, &[("a.roa", b"route a")]);
    let mft_object = pki.publish(&format!("{}/2.mft", ca_dir(2)), Record::Manifest(mft));

    let mut engine = pki.engine(test_config());
    engine.insert_trust_anchor(&anchor.spki, &ta_object).unwrap();

    let outcome = engine.submit(&ca_object);
    assert!(outcome.valid, "unexpected failure: {:?}", outcome.reason);
    assert_eq!(outcome.expires, Some(day(90)));

    let outcome = engine.submit(&crl_object);
    assert!(outcome.valid, "unexpected failure: {:?}", outcome.reason);
    assert_eq!(outcome.expires, Some(day(80)));

    let outcome = engine.submit(&mft_object);
    assert!(outcome.valid, "unexpected failure: {:?}", outcome.reason);
    assert_eq!(outcome.expires, Some(day(80)));
    assert_eq!(outcome.files.len(), 1);
    assert_eq!(outcome.files[0].status, FileStatus::Usable);
    assert_eq!(outcome.signature_path, vec![cert_uri(2), cert_uri(1)]);
}

#[test]
fn test_crl_of_issuing_ca_bounds_descendants() {
    let pki = Pki::new();
    let anchor = ta(1, 100);
    let authority = ca(2, &anchor, 90);
    let mut engine = pki.engine_with_ta(&anchor, test_config());

    assert!(engine.submit(&pki.publish_cert(&authority)).valid);
    assert!(engine
        .submit(&pki.object(&crl_uri(2), Record::Crl(crl(&authority, 80, &[]))))
        .valid);

    let outcome = engine.submit(&pki.publish_cert(&ca(3, &authority, 95)));
    assert!(outcome.valid, "unexpected failure: {:?}", outcome.reason);
    assert_eq!(outcome.expires, Some(day(80)));

    let mft = manifest(ee(4, &authority, 95), 95, &[]);
    let outcome = engine.submit(&pki.publish(&format!("{}/2.mft", ca_dir(2)), Record::Manifest(mft)));
    assert_eq!(outcome.expires, Some(day(80)));
}

#[test]
fn test_earliest_ancestor_wins() {
    let pki = Pki::new();
    let root = ta(1, 50);
    let intermediate = ca(2, &root, 60);
    let mut engine = pki.engine_with_ta(&root, test_config());
    assert!(engine.submit(&pki.publish_cert(&intermediate)).valid);

    let outcome = engine.submit(&pki.publish_cert(&ee(3, &intermediate, 70)));

    assert!(outcome.valid, "unexpected failure: {:?}", outcome.reason);
    assert_eq!(outcome.expires, Some(day(50)));
    // EE certificates are not added to the Auth Store
    assert_eq!(engine.auth_store().len(), 2);

    let id = engine.auth_store().find(&intermediate.ski).unwrap();
    assert_eq!(engine.auth_store().get(id).unwrap().expires, day(50));
}
