// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use std::time::Duration;

use super::LocalRealm;
use crate::error::AuthError;
use crate::provider::{SecurityContextProvider, Subject};

const CONFIG: &str = "HddsKrb5TokenSecurityConf";
const SERVICE: &str = "hdds/group@TEST.REALM";
const OTHER_SERVICE: &str = "hdds/other-group@TEST.REALM";

/// Realm with a cheap key derivation, two services and two clients
fn create_test_realm() -> LocalRealm {
    realm_with(LocalRealm::builder("TEST.REALM"))
}

fn realm_with(builder: super::LocalRealmBuilder) -> LocalRealm {
    let realm = builder
        .pbkdf2_iterations(10)
        .build()
        .expect("realm build should succeed");

    realm.add_principal(SERVICE, "service-pw").expect("add service");
    realm.add_principal(OTHER_SERVICE, "other-pw").expect("add other service");
    realm.add_principal("alice", "alice-pw").expect("add alice");
    realm.add_principal("bob", "bob-pw").expect("add bob");
    realm
}

fn login_service(realm: &LocalRealm) -> Subject {
    login(realm, SERVICE, "service-pw")
}

fn login(realm: &LocalRealm, principal: &str, password: &str) -> Subject {
    realm
        .establish_subject(principal, password, CONFIG)
        .expect("login should succeed")
}

#[test]
fn test_establish_subject() {
    let realm = create_test_realm();
    let subject = login(&realm, "alice", "alice-pw");

    assert_eq!(subject.principal(), "alice");
    assert!(!subject.is_expired());
    assert_eq!(subject.credential().len(), 32);
}

#[test]
fn test_establish_subject_bad_password() {
    let realm = create_test_realm();
    let result = realm.establish_subject("alice", "wrong", CONFIG);

    assert!(matches!(result, Err(AuthError::LoginFailed(msg)) if msg.contains("pre-authentication")));
}

#[test]
fn test_establish_subject_unknown_principal() {
    let realm = create_test_realm();
    let result = realm.establish_subject("mallory", "alice-pw", CONFIG);

    assert!(matches!(result, Err(AuthError::LoginFailed(msg)) if msg.contains("not found")));
}

#[test]
fn test_login_config_must_match() {
    let realm = realm_with(LocalRealm::builder("TEST.REALM").login_config(CONFIG));

    assert!(realm.establish_subject("alice", "alice-pw", CONFIG).is_ok());
    assert!(matches!(
        realm.establish_subject("alice", "alice-pw", "OtherConf"),
        Err(AuthError::LoginFailed(_))
    ));
}

#[test]
fn test_ticket_roundtrip_asserts_client() {
    let realm = create_test_realm();
    let alice = login(&realm, "alice", "alice-pw");
    let acceptor = login_service(&realm);

    let ticket = realm.generate_ticket(&alice, SERVICE).expect("ticket");
    let asserted = realm.validate_ticket(&acceptor, &ticket).expect("valid ticket");

    assert_eq!(asserted, "alice");
}

#[test]
fn test_ticket_only_accepted_by_target_service() {
    let realm = create_test_realm();
    let alice = login(&realm, "alice", "alice-pw");
    let ticket = realm.generate_ticket(&alice, OTHER_SERVICE).expect("ticket");

    let result = realm.validate_ticket(&login_service(&realm), &ticket);
    assert!(
        matches!(result, Err(AuthError::ValidationFailed(ref msg)) if msg.contains("not addressed")),
        "got {:?}",
        result
    );

    // Neither the client nor another client may accept it either
    assert!(realm.validate_ticket(&alice, &ticket).is_err());
    assert!(realm
        .validate_ticket(&login(&realm, "bob", "bob-pw"), &ticket)
        .is_err());

    let other = login(&realm, OTHER_SERVICE, "other-pw");
    assert_eq!(realm.validate_ticket(&other, &ticket).expect("valid"), "alice");
}

#[test]
fn test_tickets_are_fresh() {
    let realm = create_test_realm();
    let alice = login(&realm, "alice", "alice-pw");

    let first = realm.generate_ticket(&alice, SERVICE).expect("ticket");
    let second = realm.generate_ticket(&alice, SERVICE).expect("ticket");

    assert_ne!(first, second, "every ticket carries a fresh nonce");
}

#[test]
fn test_generate_ticket_unknown_service() {
    let realm = create_test_realm();
    let alice = login(&realm, "alice", "alice-pw");

    let result = realm.generate_ticket(&alice, "hdds/unknown");
    assert!(matches!(result, Err(AuthError::ContextFailed(_))));
}

#[test]
fn test_any_flipped_byte_is_rejected() {
    let realm = create_test_realm();
    let alice = login(&realm, "alice", "alice-pw");
    let acceptor = login_service(&realm);
    let ticket = realm.generate_ticket(&alice, SERVICE).expect("ticket");

    for i in 0..ticket.len() {
        let mut tampered = ticket.clone();
        tampered[i] ^= 0x01;

        let result = realm.validate_ticket(&acceptor, &tampered);
        assert!(
            matches!(result, Err(AuthError::ValidationFailed(_))),
            "flipping byte {} must invalidate the ticket",
            i
        );
    }
}

#[test]
fn test_empty_ticket_rejected() {
    let realm = create_test_realm();
    let alice = login(&realm, "alice", "alice-pw");

    assert!(matches!(
        realm.validate_ticket(&alice, &[]),
        Err(AuthError::ValidationFailed(_))
    ));
}

#[test]
fn test_expired_ticket_rejected() {
    let realm = realm_with(LocalRealm::builder("TEST.REALM").ticket_lifetime(Duration::ZERO));
    let alice = login(&realm, "alice", "alice-pw");
    let ticket = realm.generate_ticket(&alice, SERVICE).expect("ticket");

    let result = realm.validate_ticket(&login_service(&realm), &ticket);
    assert!(matches!(result, Err(AuthError::ValidationFailed(msg)) if msg.contains("expired")));
}

#[test]
fn test_expired_subject_cannot_issue() {
    let realm = realm_with(LocalRealm::builder("TEST.REALM").subject_lifetime(Duration::ZERO));
    let alice = login(&realm, "alice", "alice-pw");

    assert!(alice.is_expired());
    assert!(matches!(
        realm.generate_ticket(&alice, SERVICE),
        Err(AuthError::ContextFailed(_))
    ));
}

#[test]
fn test_forged_subject_rejected() {
    let realm = create_test_realm();
    let forged = Subject::new("alice".to_string(), u64::MAX, vec![0u8; 32]);

    assert!(matches!(
        realm.generate_ticket(&forged, SERVICE),
        Err(AuthError::ContextFailed(_))
    ));
}

#[test]
fn test_subject_from_foreign_realm_rejected() {
    let realm = create_test_realm();
    let other = create_test_realm();

    let alice = login(&realm, "alice", "alice-pw");
    let foreign = login_service(&other);
    let ticket = realm.generate_ticket(&alice, SERVICE).expect("ticket");

    assert!(other.generate_ticket(&alice, SERVICE).is_err());
    assert!(realm.validate_ticket(&foreign, &ticket).is_err());
}

#[test]
fn test_ticket_from_foreign_realm_rejected() {
    let realm = create_test_realm();
    let other = create_test_realm();

    let acceptor = login_service(&realm);
    let alice_there = login(&other, "alice", "alice-pw");
    let ticket = other.generate_ticket(&alice_there, SERVICE).expect("ticket");

    // Same principal names, different long-term keys
    assert!(matches!(
        realm.validate_ticket(&acceptor, &ticket),
        Err(AuthError::ValidationFailed(_))
    ));
}

#[test]
fn test_builder_validation() {
    assert!(LocalRealm::builder("").build().is_err());
    assert!(LocalRealm::builder("TEST.REALM")
        .pbkdf2_iterations(0)
        .build()
        .is_err());

    let realm = LocalRealm::builder("TEST.REALM")
        .pbkdf2_iterations(10)
        .build()
        .expect("build");
    assert_eq!(realm.name(), "TEST.REALM");
    assert!(realm.add_principal("", "pw").is_err());
    assert!(realm.add_principal("alice", "").is_err());
    assert!(!realm.contains_principal("alice"));
}
