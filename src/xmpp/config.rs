/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;
use std::time::Duration;

use super::constants::CLIENT_PORT;
use super::{Jid, XmppClient, XmppClientError};
use crate::sasl::MechanismRegistry;

/// Settings of a client connection, built in steps and then connected.
#[derive(Clone, Debug)]
pub struct ConnectionConfig {
    pub(super) jid: Jid,
    pub(super) server: Option<String>,
    pub(super) port: u16,
    pub(super) connection_timeout: Duration,
    pub(super) reply_timeout: Duration,
    pub(super) registry: Arc<MechanismRegistry>,
    pub(super) debug: bool,
}

impl ConnectionConfig {
    pub fn new(jid: Jid) -> Self {
        ConnectionConfig {
            jid,
            server: None,
            port: CLIENT_PORT,
            connection_timeout: Duration::from_secs(30),
            reply_timeout: Duration::from_secs(5),
            registry: Arc::new(MechanismRegistry::with_default_mechanisms()),
            debug: false,
        }
    }

    /// Connects to this host instead of the domain of the JID. A port in
    /// the name overrides the configured one.
    pub fn server(mut self, server: Option<String>) -> Self {
        self.server = server;
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// How long to wait for the server to answer a request.
    pub fn reply_timeout(mut self, timeout: Duration) -> Self {
        self.reply_timeout = timeout;
        self
    }

    /// Mechanisms to authenticate with. Shared registries are fine.
    pub fn registry(mut self, registry: Arc<MechanismRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Logs the raw XML traffic at debug level.
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn jid(&self) -> &Jid {
        &self.jid
    }

    /// Name of the server to connect to.
    pub fn host(&self) -> &str {
        self.server.as_deref().unwrap_or(self.jid.domainpart())
    }

    pub(super) fn socket_addresses(&self) -> std::io::Result<Vec<SocketAddr>> {
        let host = self.host();
        // The resolver needs a port, and has no way to take a default one
        let addresses = if needs_port(host) {
            (host, self.port).to_socket_addrs()?
        } else {
            host.to_socket_addrs()?
        };
        Ok(addresses.collect())
    }

    pub fn connect(self) -> Result<XmppClient, XmppClientError> {
        XmppClient::connect(self)
    }
}

/// True if the host name carries no port. IPv6 addresses with a port are
/// written in brackets, like `[::1]:5222`.
pub(super) fn needs_port(host: &str) -> bool {
    match (host.rfind(':'), host.rfind(']')) {
        (None, _) => true,
        (Some(_), None) => host.matches(':').count() > 1,
        (Some(colon), Some(bracket)) => colon < bracket,
    }
}

/// The host name alone, without a port or the brackets around an IPv6
/// address.
pub(super) fn host_name(host: &str) -> &str {
    let name = if needs_port(host) {
        host
    } else {
        host.rsplit_once(':').map_or(host, |(name, _)| name)
    };
    name.strip_prefix('[')
        .and_then(|name| name.strip_suffix(']'))
        .unwrap_or(name)
}
