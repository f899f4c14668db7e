/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use super::*;

fn params(credentials: &Credentials) -> AuthParams<'_> {
    AuthParams {
        host: "xmpp.example.com",
        service_name: "example.com",
        credentials,
    }
}

fn check_malformed<T: std::fmt::Debug>(result: Result<T, SaslError>) {
    assert!(
        matches!(result, Err(SaslError::MalformedChallenge(_))),
        "{result:?}"
    );
}

const SERVER_FIRST: &[u8] =
    b"r=rOprNGfwEbeRWgbNEkqO%hvYDpWUa2RaTCAfuxFIlj)hNlF$k0,s=W22ZaJ0SNY7soEsUEjb6gQ==,i=4096";

const CLIENT_FINAL: &[u8] = b"c=biws,r=rOprNGfwEbeRWgbNEkqO%hvYDpWUa2RaTCAfuxFIlj)hNlF$k0,\
p=dHzbZapWIk4jUhN+Ute9ytag9zjfMHgsqmmiz7AndVQ=";

const SERVER_FINAL: &[u8] = b"v=6rriTRBi23WpRR/wtup+mMhUZUn/dB5nLTJRsjl95G4=";

fn scram_after_first() -> ScramSha256 {
    let credentials = Credentials::new("user", "pencil");
    let mut scram = ScramSha256::with_nonce("rOprNGfwEbeRWgbNEkqO");
    assert_eq!(
        scram.start(&params(&credentials)).unwrap().unwrap(),
        b"n,,n=user,r=rOprNGfwEbeRWgbNEkqO"
    );
    scram
}

#[test]
fn anonymous() {
    let credentials = Credentials::default();
    let mut anonymous = Anonymous;
    assert_eq!(anonymous.name(), "ANONYMOUS");
    assert_eq!(anonymous.start(&params(&credentials)).unwrap(), None);
    assert_eq!(anonymous.challenge(b"").unwrap(), b"");
    check_malformed(anonymous.challenge(b"hello"));
    assert!(anonymous.verify_success(b"").is_ok());
}

#[test]
fn plain() {
    let credentials = Credentials::new("juliet", "r0m30");
    let mut plain = Plain::default();
    assert_eq!(
        plain.start(&params(&credentials)).unwrap().unwrap(),
        b"\0juliet\0r0m30"
    );
    assert_eq!(plain.challenge(b"").unwrap(), b"\0juliet\0r0m30");
    check_malformed(plain.challenge(b"more"));

    let credentials = Credentials::new("juliet", "r0m30").with_authzid("admin@example.com");
    let mut plain = Plain::default();
    assert_eq!(
        plain.start(&params(&credentials)).unwrap().unwrap(),
        b"admin@example.com\0juliet\0r0m30"
    );
}

#[test]
fn external() {
    let mut external = External::default();
    assert_eq!(
        external
            .start(&params(&Credentials::default()))
            .unwrap()
            .unwrap(),
        b""
    );
    let credentials = Credentials::default().with_authzid("juliet@example.com");
    let mut external = External::default();
    assert_eq!(
        external.start(&params(&credentials)).unwrap().unwrap(),
        b"juliet@example.com"
    );
    check_malformed(external.challenge(b"x"));
}

#[test]
fn scram_exchange() {
    let mut scram = scram_after_first();
    assert_eq!(scram.challenge(SERVER_FIRST).unwrap(), CLIENT_FINAL);
    assert!(scram.verify_success(SERVER_FINAL).is_ok());

    // Server final sent as a challenge instead of success data
    let mut scram = scram_after_first();
    scram.challenge(SERVER_FIRST).unwrap();
    assert_eq!(scram.challenge(SERVER_FINAL).unwrap(), b"");
    assert!(scram.verify_success(b"").is_ok());
}

#[test]
fn scram_bad_server_messages() {
    check_malformed(scram_after_first().challenge(b"r=someoneelse,s=W22ZaJ0SNY7soEsUEjb6gQ==,i=4096"));
    check_malformed(scram_after_first().challenge(b"r=rOprNGfwEbeRWgbNEkqOx,s=W22Z,i=0"));
    check_malformed(scram_after_first().challenge(b"r=rOprNGfwEbeRWgbNEkqOx,i=4096"));
    check_malformed(scram_after_first().challenge(b"m=ext,r=rOprNGfwEbeRWgbNEkqOx,s=W22Z,i=1"));
    check_malformed(scram_after_first().challenge(b"garbage"));
    check_malformed(scram_after_first().challenge(&[0xff, 0xfe]));

    let mut scram = scram_after_first();
    scram.challenge(SERVER_FIRST).unwrap();
    check_malformed(scram.verify_success(b"v=AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA="));

    let mut scram = scram_after_first();
    scram.challenge(SERVER_FIRST).unwrap();
    check_malformed(scram.verify_success(b"e=invalid-proof"));

    let mut scram = scram_after_first();
    scram.challenge(SERVER_FIRST).unwrap();
    check_malformed(scram.verify_success(b""));

    let mut scram = scram_after_first();
    check_malformed(scram.verify_success(SERVER_FINAL));
}

#[test]
fn scram_names() {
    let credentials = Credentials::new("a=b,c", "pencil").with_authzid("x,y");
    let mut scram = ScramSha256::with_nonce("abc");
    assert_eq!(
        scram.start(&params(&credentials)).unwrap().unwrap(),
        b"n,a=x=2Cy,n=a=3Db=2Cc,r=abc"
    );

    let first = ScramSha256::new()
        .start(&params(&Credentials::new("u", "p")))
        .unwrap()
        .unwrap();
    assert_eq!(first.len(), "n,,n=u,r=".len() + 24);
}
