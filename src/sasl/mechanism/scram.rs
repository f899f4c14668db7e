/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use rand::distributions::{Alphanumeric, DistString};
use sha2::{Digest, Sha256};

use super::{AuthParams, Mechanism, description};
use crate::sasl::{MechanismDescriptor, SaslError};

type HmacSha256 = Hmac<Sha256>;

const NONCE_LENGTH: usize = 24;

enum Step {
    Initial,
    ClientFirstSent {
        gs2_header: String,
        client_first_bare: String,
        password: String,
    },
    ClientFinalSent {
        server_signature: Vec<u8>,
    },
    Verified,
}

/// The SCRAM-SHA-256 mechanism of RFC 5802 and RFC 7677, without channel
/// binding.
///
/// The password never leaves the client, and the server proves that it
/// knows the salted password as well. Usernames and passwords are used as
/// given, without SASLprep normalization.
pub struct ScramSha256 {
    nonce: String,
    step: Step,
}

impl ScramSha256 {
    pub const NAME: &str = "SCRAM-SHA-256";

    pub const DESCRIPTOR: MechanismDescriptor = MechanismDescriptor::new(Self::NAME, 100, create);

    pub fn new() -> Self {
        Self::with_nonce(&Alphanumeric.sample_string(&mut rand::thread_rng(), NONCE_LENGTH))
    }

    pub(crate) fn with_nonce(nonce: &str) -> Self {
        ScramSha256 {
            nonce: nonce.to_owned(),
            step: Step::Initial,
        }
    }

    fn client_final(
        &mut self,
        gs2_header: &str,
        client_first_bare: &str,
        password: &str,
        server_first: &[u8],
    ) -> Result<Vec<u8>, SaslError> {
        let server_first = std::str::from_utf8(server_first)
            .map_err(|_| SaslError::MalformedChallenge(description::NOT_UTF8))?;
        let attributes = parse_attributes(server_first)?;
        if attributes.first().is_some_and(|(key, _)| *key == "m") {
            return Err(SaslError::MalformedChallenge(description::SCRAM_EXTENSION));
        }
        let nonce = attribute(&attributes, "r")?;
        if !nonce.starts_with(&self.nonce) {
            return Err(SaslError::MalformedChallenge(description::SCRAM_NONCE_MISMATCH));
        }
        let salt = BASE64
            .decode(attribute(&attributes, "s")?)
            .map_err(|_| SaslError::MalformedChallenge(description::NOT_BASE64))?;
        let iterations = attribute(&attributes, "i")?
            .parse::<u32>()
            .ok()
            .filter(|&iterations| iterations > 0)
            .ok_or(SaslError::MalformedChallenge(description::SCRAM_BAD_FIELD))?;

        let mut salted_password = [0u8; 32];
        pbkdf2::pbkdf2_hmac::<Sha256>(
            password.as_bytes(),
            &salt,
            iterations,
            &mut salted_password,
        );
        let client_key = hmac(&salted_password, b"Client Key")?;
        let stored_key = Sha256::digest(&client_key);
        let without_proof = format!("c={},r={}", BASE64.encode(gs2_header), nonce);
        let auth_message = format!("{client_first_bare},{server_first},{without_proof}");
        let client_signature = hmac(&stored_key, auth_message.as_bytes())?;
        let proof: Vec<u8> = client_key
            .iter()
            .zip(&client_signature)
            .map(|(key, signature)| key ^ signature)
            .collect();
        let server_key = hmac(&salted_password, b"Server Key")?;
        let server_signature = hmac(&server_key, auth_message.as_bytes())?;

        self.step = Step::ClientFinalSent { server_signature };
        Ok(format!("{without_proof},p={}", BASE64.encode(proof)).into_bytes())
    }
}

impl Default for ScramSha256 {
    fn default() -> Self {
        Self::new()
    }
}

fn create() -> Box<dyn Mechanism> {
    Box::new(ScramSha256::new())
}

/// Escapes a name for the `n=` and `a=` attributes.
fn sasl_name(name: &str) -> String {
    name.replace('=', "=3D").replace(',', "=2C")
}

fn hmac(key: &[u8], data: &[u8]) -> Result<Vec<u8>, SaslError> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|_| SaslError::MalformedChallenge(description::HMAC_KEY))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn parse_attributes(message: &str) -> Result<Vec<(&str, &str)>, SaslError> {
    message
        .split(',')
        .map(|part| {
            part.split_once('=')
                .filter(|(key, _)| key.len() == 1)
                .ok_or(SaslError::MalformedChallenge(description::SCRAM_BAD_FIELD))
        })
        .collect()
}

fn attribute<'a>(attributes: &[(&str, &'a str)], key: &str) -> Result<&'a str, SaslError> {
    if attributes.iter().any(|(name, _)| *name == "e") {
        return Err(SaslError::MalformedChallenge(description::SCRAM_SERVER_ERROR));
    }
    attributes
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, value)| *value)
        .ok_or(SaslError::MalformedChallenge(description::SCRAM_BAD_FIELD))
}

fn verify_server_final(expected: &[u8], server_final: &[u8]) -> Result<(), SaslError> {
    let server_final = std::str::from_utf8(server_final)
        .map_err(|_| SaslError::MalformedChallenge(description::NOT_UTF8))?;
    let attributes = parse_attributes(server_final)?;
    let signature = BASE64
        .decode(attribute(&attributes, "v")?)
        .map_err(|_| SaslError::MalformedChallenge(description::NOT_BASE64))?;
    if signature != expected {
        return Err(SaslError::MalformedChallenge(description::SCRAM_BAD_SIGNATURE));
    }
    Ok(())
}

impl Mechanism for ScramSha256 {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn start(&mut self, params: &AuthParams) -> Result<Option<Vec<u8>>, SaslError> {
        let credentials = params.credentials;
        let gs2_header = match credentials.authzid() {
            Some(authzid) => format!("n,a={},", sasl_name(authzid)),
            None => "n,,".to_owned(),
        };
        let client_first_bare = format!("n={},r={}", sasl_name(credentials.username()), self.nonce);
        let message = format!("{gs2_header}{client_first_bare}");
        self.step = Step::ClientFirstSent {
            gs2_header,
            client_first_bare,
            password: credentials.password().to_owned(),
        };
        Ok(Some(message.into_bytes()))
    }

    fn challenge(&mut self, challenge: &[u8]) -> Result<Vec<u8>, SaslError> {
        match std::mem::replace(&mut self.step, Step::Initial) {
            Step::ClientFirstSent {
                gs2_header,
                client_first_bare,
                password,
            } => self.client_final(&gs2_header, &client_first_bare, &password, challenge),
            Step::ClientFinalSent { server_signature } => {
                verify_server_final(&server_signature, challenge)?;
                self.step = Step::Verified;
                Ok(Vec::new())
            }
            Step::Initial | Step::Verified => Err(SaslError::MalformedChallenge(
                description::UNEXPECTED_CHALLENGE,
            )),
        }
    }

    fn verify_success(&mut self, additional: &[u8]) -> Result<(), SaslError> {
        match &self.step {
            Step::Verified => Ok(()),
            Step::ClientFinalSent { server_signature } if !additional.is_empty() => {
                verify_server_final(server_signature, additional)?;
                self.step = Step::Verified;
                Ok(())
            }
            _ => Err(SaslError::MalformedChallenge(description::SCRAM_NO_SIGNATURE)),
        }
    }
}
