/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

mod anonymous;
mod external;
mod plain;
mod scram;

pub use anonymous::Anonymous;
pub use external::External;
pub use plain::Plain;
pub use scram::ScramSha256;

use super::SaslError;
use super::error::description;

/// Identity of the user for password based mechanisms.
#[derive(Clone, Default, Eq, PartialEq)]
pub struct Credentials {
    username: String,
    password: String,
    authzid: Option<String>,
}

impl Credentials {
    pub fn new(username: &str, password: &str) -> Self {
        Credentials {
            username: username.to_owned(),
            password: password.to_owned(),
            authzid: None,
        }
    }

    /// Requests to act as another identity after authentication.
    pub fn with_authzid(mut self, authzid: &str) -> Self {
        self.authzid = Some(authzid.to_owned());
        self
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn authzid(&self) -> Option<&str> {
        self.authzid.as_deref()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<hidden>")
            .field("authzid", &self.authzid)
            .finish()
    }
}

/// Supplies credentials when an authentication attempt starts.
///
/// The callback learns the host and the selected mechanism, so it can ask
/// the user only for what that mechanism needs.
pub trait CredentialsCallback: Send + Sync {
    fn credentials(&self, host: &str, mechanism: &str) -> Credentials;
}

impl<F> CredentialsCallback for F
where
    F: Fn(&str, &str) -> Credentials + Send + Sync,
{
    fn credentials(&self, host: &str, mechanism: &str) -> Credentials {
        self(host, mechanism)
    }
}

/// Identity parameters of an attempt.
#[derive(Clone, Copy, Debug)]
pub struct AuthParams<'a> {
    /// Host name of the server, which may differ from the XMPP domain.
    pub host: &'a str,
    /// The XMPP domain.
    pub service_name: &'a str,
    pub credentials: &'a Credentials,
}

/// State of one negotiation attempt with a single mechanism.
///
/// A fresh instance is created for every attempt, so implementations can
/// keep whatever step state they need without any reset logic.
pub trait Mechanism: Send {
    /// Registered SASL name, like `PLAIN`.
    fn name(&self) -> &'static str;

    /// Computes the initial response.
    ///
    /// `None` sends no initial response, while an empty vector sends an
    /// explicitly empty one.
    fn start(&mut self, params: &AuthParams) -> Result<Option<Vec<u8>>, SaslError>;

    /// Computes the response to a decoded server challenge.
    fn challenge(&mut self, challenge: &[u8]) -> Result<Vec<u8>, SaslError>;

    /// Checks the additional data sent with the server's success.
    fn verify_success(&mut self, _additional: &[u8]) -> Result<(), SaslError> {
        Ok(())
    }
}

/// Response of the single step mechanisms.
///
/// They expect no challenge at all, except the empty one a server sends
/// when it wants the initial response, which is answered with it.
fn repeat_initial(initial: &[u8], challenge: &[u8]) -> Result<Vec<u8>, SaslError> {
    if challenge.is_empty() {
        Ok(initial.to_vec())
    } else {
        Err(SaslError::MalformedChallenge(
            description::UNEXPECTED_CHALLENGE,
        ))
    }
}

#[cfg(test)]
mod tests;
