//! Sign-then-verify behavior of credentials as a verifier sees them.

use std::sync::Arc;

use miw_core::{Did, FixedClock, Timestamp};
use miw_crypto::SigningKey;
use miw_vc::{
    CredentialBuilder, DidDocument, ProofSigner, SequentialIdSource, UnsignedCredential,
    VcError, VerifiableCredential,
};
use proptest::prelude::*;
use serde_json::{json, Map, Value};

const ISSUED: i64 = 1_800_000_000;

fn ts(secs: i64) -> Timestamp {
    Timestamp::from_epoch_secs(secs).unwrap()
}

fn issuer(seed: u8) -> (DidDocument, SigningKey) {
    let key = SigningKey::from_bytes(&[seed; 32]);
    let doc = DidDocument::for_key(
        Did::new("did:web:localhost%3A8080:BPNL000000000000").unwrap(),
        &key.verifying_key(),
    );
    (doc, key)
}

fn assemble(claims: Value) -> UnsignedCredential {
    let (doc, _) = issuer(1);
    CredentialBuilder::new(
        Arc::new(FixedClock::new(ts(ISSUED))),
        Arc::new(SequentialIdSource::default()),
    )
    .build(
        claims.as_object().cloned().unwrap(),
        &["DismantlerCredential"],
        &doc,
        &[],
        ts(ISSUED + 3600),
    )
    .unwrap()
}

fn sign(credential: UnsignedCredential) -> VerifiableCredential {
    let (doc, key) = issuer(1);
    let signer = ProofSigner::new(Arc::new(FixedClock::new(ts(ISSUED))));
    let method = doc.first_verification_method().unwrap();
    let proof = signer.sign(&credential, method, &key).unwrap();
    credential.into_verifiable(proof)
}

#[test]
fn signed_credential_verifies_against_issuer_document() {
    let (doc, _) = issuer(1);
    let vc = sign(assemble(json!({"activityType": "vehicleDismantle"})));
    vc.verify_at(&doc, ts(ISSUED + 10)).unwrap();
    assert_eq!(
        vc.proof().verification_method,
        doc.first_verification_method().unwrap().id
    );
    assert_eq!(vc.proof().created, ts(ISSUED));
}

#[test]
fn wire_shape_survives_json() {
    let (doc, _) = issuer(1);
    let vc = sign(assemble(json!({"activityType": "vehicleDismantle"})));
    let wire = serde_json::to_value(&vc).unwrap();
    for field in ["type", "created", "proofPurpose", "verificationMethod", "jws"] {
        assert!(wire["proof"].get(field).is_some(), "proof missing {field}");
    }
    assert_eq!(wire["proof"]["type"], "JsonWebSignature2020");
    assert_eq!(wire["credentialSubject"]["activityType"], "vehicleDismantle");

    let back: VerifiableCredential = serde_json::from_value(wire).unwrap();
    assert_eq!(back, vc);
    back.verify_at(&doc, ts(ISSUED + 10)).unwrap();
}

#[test]
fn other_issuer_document_is_rejected() {
    let vc = sign(assemble(json!({"a": "b"})));

    let (mut wrong_key_doc, _) = issuer(2);
    assert!(vc.verify_at(&wrong_key_doc, ts(ISSUED)).is_err());

    wrong_key_doc.id = Did::new("did:web:elsewhere").unwrap();
    assert!(matches!(
        vc.verify_at(&wrong_key_doc, ts(ISSUED)),
        Err(VcError::IssuerMismatch { .. })
    ));
}

#[test]
fn expired_credential_fails_verification() {
    let (doc, _) = issuer(1);
    let vc = sign(assemble(json!({"a": "b"})));
    assert!(matches!(
        vc.verify_at(&doc, ts(ISSUED + 3600)),
        Err(VcError::Expired(_))
    ));
    vc.verify_signature(&doc).unwrap();
}

#[test]
fn tampered_expired_credential_reports_the_signature_first() {
    let (doc, _) = issuer(1);
    let vc = sign(assemble(json!({"a": "b"})));
    let tampered = tamper(&vc, |m| {
        m.insert("credentialSubject".into(), json!({"a": "c"}));
    });
    let err = tampered.verify_at(&doc, ts(ISSUED + 7200)).unwrap_err();
    assert!(!matches!(err, VcError::Expired(_)), "got {err:?}");
}

#[test]
fn signer_rejects_key_not_published_in_method() {
    let (doc, _) = issuer(1);
    let (_, other_key) = issuer(9);
    let signer = ProofSigner::new(Arc::new(FixedClock::new(ts(ISSUED))));
    let err = signer
        .sign(
            &assemble(json!({"a": "b"})),
            doc.first_verification_method().unwrap(),
            &other_key,
        )
        .unwrap_err();
    assert!(matches!(err, VcError::KeyMismatch(_)));
}

#[test]
fn float_claims_cannot_be_signed() {
    let (doc, key) = issuer(1);
    let signer = ProofSigner::new(Arc::new(FixedClock::new(ts(ISSUED))));
    let err = signer
        .sign(
            &assemble(json!({"score": 0.5})),
            doc.first_verification_method().unwrap(),
            &key,
        )
        .unwrap_err();
    assert!(matches!(err, VcError::Canonicalization(_)));
}

fn tamper(vc: &VerifiableCredential, edit: impl FnOnce(&mut Map<String, Value>)) -> VerifiableCredential {
    let mut wire = serde_json::to_value(vc).unwrap();
    edit(wire.as_object_mut().unwrap());
    serde_json::from_value(wire).unwrap()
}

#[test]
fn mutating_any_field_breaks_the_proof() {
    let (doc, _) = issuer(1);
    let vc = sign(assemble(json!({"activityType": "vehicleDismantle"})));

    let edits: Vec<(&str, Box<dyn Fn(&mut Map<String, Value>)>)> = vec![
        ("id", Box::new(|m: &mut Map<String, Value>| { m.insert("id".into(), json!("urn:uuid:other")); })),
        ("type", Box::new(|m: &mut Map<String, Value>| { m.insert("type".into(), json!(["VerifiableCredential", "BpnCredential"])); })),
        ("@context", Box::new(|m: &mut Map<String, Value>| { m.insert("@context".into(), json!(["https://www.w3.org/2018/credentials/v1", "https://x"])); })),
        ("issuanceDate", Box::new(|m: &mut Map<String, Value>| { m.insert("issuanceDate".into(), json!("2020-01-01T00:00:00Z")); })),
        ("expirationDate", Box::new(|m: &mut Map<String, Value>| { m.insert("expirationDate".into(), json!("2099-01-01T00:00:00Z")); })),
        ("credentialSubject", Box::new(|m: &mut Map<String, Value>| { m["credentialSubject"]["activityType"] = json!("other"); })),
        ("proof.created", Box::new(|m: &mut Map<String, Value>| { m["proof"]["created"] = json!("2020-01-01T00:00:00Z"); })),
    ];
    for (name, edit) in edits {
        let tampered = tamper(&vc, |m| edit(m));
        assert!(
            tampered.verify_signature(&doc).is_err(),
            "mutation of {name} still verified"
        );
    }
}

proptest! {
    #[test]
    fn any_string_claim_value_round_trips_through_signing(value in "[ -~]{0,40}", key in "[a-z]{1,12}") {
        let (doc, _) = issuer(1);
        let mut claims = Map::new();
        claims.insert(key.clone(), Value::String(value.clone()));
        let vc = sign(assemble(Value::Object(claims)));
        prop_assert!(vc.verify_signature(&doc).is_ok());

        let altered = format!("{value}!");
        let tampered = tamper(&vc, |m| { m["credentialSubject"][key.as_str()] = json!(altered); });
        prop_assert!(tampered.verify_signature(&doc).is_err());
    }
}
