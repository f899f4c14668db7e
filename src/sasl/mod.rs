/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

//! SASL negotiation of RFC 6120 section 6.
//!
//! [SaslAuthentication] runs one attempt at a time on a connection. The
//! caller blocks in one of the `authenticate` methods, while the receive
//! path of the connection delivers the server's answers from its own thread
//! through [process()](SaslAuthentication::process) or the individual
//! notification methods.

mod connection;
mod error;
mod mechanism;
mod nonza;
mod registry;

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

pub use connection::Connection;
pub use error::SaslError;
pub use error::SaslFailure;
use error::description;
pub use mechanism::Anonymous;
pub use mechanism::AuthParams;
pub use mechanism::Credentials;
pub use mechanism::CredentialsCallback;
pub use mechanism::External;
pub use mechanism::Mechanism;
pub use mechanism::Plain;
pub use mechanism::ScramSha256;
use nonza::decode_data;
pub use nonza::SaslNonza;
pub use nonza::encode_abort;
pub use nonza::encode_auth;
pub use nonza::encode_response;
pub use nonza::parse_sasl_nonza;
pub use registry::MechanismDescriptor;
pub use registry::MechanismRegistry;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SaslState {
    Idle,
    Negotiating,
    Succeeded,
    Failed,
}

type Outcome = Result<(), SaslError>;

struct Session {
    state: SaslState,
    server_mechanisms: Vec<String>,
    mechanism: Option<Box<dyn Mechanism>>,
    pending: Option<SyncSender<Outcome>>,
    failure: Option<SaslFailure>,
    resource: Option<String>,
}

impl Session {
    fn mechanism_name(&self) -> &'static str {
        self.mechanism.as_ref().map_or("", |mechanism| mechanism.name())
    }

    /// Latches the outcome of the open attempt.
    ///
    /// Returns false if there is no open attempt, because it was already
    /// resolved, timed out, or never started.
    fn resolve(&mut self, outcome: Outcome) -> bool {
        let Some(pending) = self.pending.take() else {
            return false;
        };
        self.state = match &outcome {
            Ok(()) => SaslState::Succeeded,
            Err(SaslError::SaslFailure { failure, .. }) => {
                self.failure = Some(failure.clone());
                SaslState::Failed
            }
            Err(_) => SaslState::Failed,
        };
        // Capacity is one, so this never blocks. The waiter might be gone
        // after a reset, which is fine.
        let _ = pending.send(outcome);
        true
    }
}

/// Authentication state of one connection.
pub struct SaslAuthentication {
    registry: Arc<MechanismRegistry>,
    connection: Arc<dyn Connection>,
    session: Mutex<Session>,
}

impl SaslAuthentication {
    pub fn new(registry: Arc<MechanismRegistry>, connection: Arc<dyn Connection>) -> Self {
        SaslAuthentication {
            registry,
            connection,
            session: Mutex::new(Session {
                state: SaslState::Idle,
                server_mechanisms: Vec::new(),
                mechanism: None,
                pending: None,
                failure: None,
                resource: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Names of the registered mechanisms in order of preference.
    pub fn registered_mechanisms(&self) -> Vec<&'static str> {
        self.registry.list()
    }

    /// Stores the mechanisms the server advertised in its stream features.
    pub fn set_available_mechanisms<I, S>(&self, mechanisms: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lock().server_mechanisms = mechanisms.into_iter().map(Into::into).collect();
    }

    pub fn available_mechanisms(&self) -> Vec<String> {
        self.lock().server_mechanisms.clone()
    }

    pub fn has_anonymous_authentication(&self) -> bool {
        self.lock()
            .server_mechanisms
            .iter()
            .any(|name| name == Anonymous::NAME)
    }

    /// True if the server offers any mechanism besides ANONYMOUS.
    pub fn has_non_anonymous_authentication(&self) -> bool {
        self.lock()
            .server_mechanisms
            .iter()
            .any(|name| name != Anonymous::NAME)
    }

    pub fn state(&self) -> SaslState {
        self.lock().state
    }

    /// The failure reported by the server for the last attempt.
    pub fn failure(&self) -> Option<SaslFailure> {
        self.lock().failure.clone()
    }

    /// Resource to bind once the authentication succeeds.
    pub fn requested_resource(&self) -> Option<String> {
        self.lock().resource.clone()
    }

    /// Authenticates with the most preferred mechanism both sides support.
    ///
    /// Blocks until the server answers or the reply timeout of the
    /// connection passes.
    pub fn authenticate(&self, credentials: &Credentials, resource: &str) -> Result<(), SaslError> {
        let descriptor = self.select()?;
        self.negotiate(descriptor.instantiate(), credentials, Some(resource))
    }

    /// Like [authenticate()](Self::authenticate), but asks the callback for
    /// the credentials once the mechanism is known.
    pub fn authenticate_with_callback(
        &self,
        callback: &dyn CredentialsCallback,
        resource: &str,
    ) -> Result<(), SaslError> {
        let descriptor = self.select()?;
        let credentials = callback.credentials(self.connection.host(), descriptor.name());
        self.negotiate(descriptor.instantiate(), &credentials, Some(resource))
    }

    /// Authenticates with ANONYMOUS, whether it is registered or not.
    pub fn authenticate_anonymously(&self) -> Result<(), SaslError> {
        self.negotiate(Box::new(Anonymous), &Credentials::default(), None)
    }

    fn select(&self) -> Result<MechanismDescriptor, SaslError> {
        let session = self.lock();
        match self.registry.select(session.server_mechanisms.as_slice()) {
            Some(descriptor) => {
                info!(mechanism = descriptor.name(), "selected SASL mechanism");
                Ok(*descriptor)
            }
            None => {
                warn!(advertised = ?session.server_mechanisms, "no usable SASL mechanism");
                Err(SaslError::NoMechanismAvailable)
            }
        }
    }

    fn negotiate(
        &self,
        mut mechanism: Box<dyn Mechanism>,
        credentials: &Credentials,
        resource: Option<&str>,
    ) -> Result<(), SaslError> {
        let name = mechanism.name();
        let params = AuthParams {
            host: self.connection.host(),
            service_name: self.connection.service_name(),
            credentials,
        };
        let initial_response = mechanism.start(&params)?;

        let (sender, receiver) = mpsc::sync_channel(1);
        {
            let mut session = self.lock();
            session.state = SaslState::Negotiating;
            session.failure = None;
            session.mechanism = Some(mechanism);
            session.pending = Some(sender);
            session.resource = resource.map(str::to_owned);
        }

        info!(mechanism = name, "starting SASL authentication");
        self.send(encode_auth(name, initial_response.as_deref()))?;
        self.wait(name, receiver)
    }

    fn wait(&self, mechanism: &str, receiver: Receiver<Outcome>) -> Result<(), SaslError> {
        let outcome = match receiver.recv_timeout(self.connection.reply_timeout()) {
            Ok(outcome) => outcome,
            Err(RecvTimeoutError::Timeout) => {
                let mut session = self.lock();
                if session.pending.take().is_some() {
                    session.state = SaslState::Failed;
                    Err(SaslError::NoResponse)
                } else {
                    // Resolved, or reset, between the timeout and the lock
                    drop(session);
                    receiver.try_recv().unwrap_or(Err(SaslError::NotConnected))
                }
            }
            Err(RecvTimeoutError::Disconnected) => Err(SaslError::NotConnected),
        };
        match &outcome {
            Ok(()) => info!(mechanism, "SASL authentication succeeded"),
            Err(err) => warn!(mechanism, %err, "SASL authentication failed"),
        }
        outcome
    }

    fn send(&self, data: String) -> Result<(), SaslError> {
        debug!(bytes = data.len(), "SASL send");
        if let Err(err) = self.connection.send(data.as_bytes()) {
            self.lock().resolve(Err(SaslError::NotConnected));
            return Err(err.into());
        }
        Ok(())
    }

    /// Answers a base64 encoded challenge of the server.
    ///
    /// A challenge the mechanism cannot handle fails the attempt with
    /// [SaslError::MalformedChallenge] and aborts the negotiation.
    pub fn challenge_received(&self, challenge: &str) -> Result<(), SaslError> {
        let reply = {
            let mut session = self.lock();
            if session.pending.is_none() {
                warn!("ignoring SASL challenge without an open attempt");
                return Ok(());
            }
            let response = decode_data(challenge).and_then(|data| match session.mechanism.as_mut() {
                Some(mechanism) => mechanism.challenge(&data),
                None => Err(SaslError::MalformedChallenge(
                    description::UNEXPECTED_CHALLENGE,
                )),
            });
            match response {
                Ok(response) => encode_response(&response),
                Err(err) => {
                    session.resolve(Err(err));
                    encode_abort()
                }
            }
        };
        self.send(reply)
    }

    /// Notification of the server's `<success>`, with its base64 encoded
    /// additional data if any.
    pub fn authenticated(&self, additional: Option<&str>) {
        let mut session = self.lock();
        if session.pending.is_none() {
            warn!("ignoring SASL success without an open attempt");
            return;
        }
        let verified = decode_data(additional.unwrap_or("")).and_then(|data| {
            match session.mechanism.as_mut() {
                Some(mechanism) => mechanism.verify_success(&data),
                None => Ok(()),
            }
        });
        session.resolve(verified);
    }

    /// Notification of the server's `<failure>`.
    pub fn authentication_failed(&self, failure: SaslFailure) {
        let mut session = self.lock();
        let mechanism = session.mechanism_name().to_owned();
        if !session.resolve(Err(SaslError::SaslFailure { mechanism, failure })) {
            warn!("ignoring SASL failure without an open attempt");
        }
    }

    /// Routes a decoded SASL element to the matching notification.
    pub fn process(&self, nonza: SaslNonza) -> Result<(), SaslError> {
        match nonza {
            SaslNonza::Challenge(challenge) => self.challenge_received(&challenge),
            SaslNonza::Success(additional) => {
                self.authenticated(additional.as_deref());
                Ok(())
            }
            SaslNonza::Failure(failure) => {
                self.authentication_failed(failure);
                Ok(())
            }
        }
    }

    /// Notification that the connection is gone. An open attempt fails with
    /// [SaslError::NotConnected] right away.
    pub fn connection_closed(&self) {
        if self.lock().resolve(Err(SaslError::NotConnected)) {
            warn!("connection closed during SASL negotiation");
        }
    }

    /// Forgets the last attempt, so that the authentication can be used again
    /// after a reconnect. The advertised mechanisms are kept.
    pub fn reset(&self) {
        let mut session = self.lock();
        session.state = SaslState::Idle;
        session.mechanism = None;
        session.pending = None;
        session.failure = None;
        session.resource = None;
    }
}
