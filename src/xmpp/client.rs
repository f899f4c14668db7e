/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use std::collections::VecDeque;
use std::io::{BufReader, Write};
use std::net::{Shutdown, TcpStream};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info, trace, warn};

use super::config::host_name;
use super::constants::{CLIENT_NS, DEFAULT_LANGUAGE, SASL_NS, STREAM_NS};
use super::error::description;
use super::features::{StreamFeatures, parse_stream_features};
use super::{ConnectionConfig, Jid, XmppClientError};
use crate::entities::escape;
use crate::sasl::{
    Connection, Credentials, CredentialsCallback, SaslAuthentication, SaslNonza, SaslState,
    parse_sasl_nonza,
};
use crate::stanza::{DecodeError, Stanza, StanzaDecoder};
use crate::xml::{XmlError, XmlEvent, XmlPullParser, XmlSource, next_start_element};

/// Resource requested when the JID does not name one.
const DEFAULT_RESOURCE: &str = "iks-xmpp";

const STREAM_END: &str = "</stream:stream>";

pub(super) fn stream_header(service_name: &str) -> String {
    format!(
        "<?xml version='1.0'?><stream:stream xmlns='{CLIENT_NS}' xmlns:stream='{STREAM_NS}' \
         version='1.0' xml:lang='{DEFAULT_LANGUAGE}' to='{}'>",
        escape(service_name)
    )
}

/// Write side of the socket, shared by the client and its authentication.
struct Transport {
    writer: Mutex<TcpStream>,
    control: TcpStream,
    host: String,
    service_name: String,
    reply_timeout: Duration,
    debug: bool,
}

impl Transport {
    fn write(&self, bytes: &[u8]) -> std::io::Result<()> {
        if self.debug {
            debug!(data = %String::from_utf8_lossy(bytes), "send");
        } else {
            trace!(bytes = bytes.len(), "send");
        }
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writer.write_all(bytes)?;
        writer.flush()
    }

    fn open_stream(&self) -> std::io::Result<()> {
        self.write(stream_header(&self.service_name).as_bytes())
    }

    fn shutdown(&self) {
        // Fails only if the socket is already gone
        let _ = self.control.shutdown(Shutdown::Both);
    }
}

impl Connection for Transport {
    fn send(&self, data: &[u8]) -> std::io::Result<()> {
        self.write(data)
    }

    fn reply_timeout(&self) -> Duration {
        self.reply_timeout
    }

    fn host(&self) -> &str {
        &self.host
    }

    fn service_name(&self) -> &str {
        &self.service_name
    }
}

enum StreamEvent {
    Features(StreamFeatures),
    Stanza(Stanza),
    Closed(Option<XmppClientError>),
}

/// The receive path, running on its own thread.
struct StreamReader {
    transport: Arc<Transport>,
    auth: Arc<SaslAuthentication>,
    decoder: StanzaDecoder,
    events: Sender<StreamEvent>,
}

impl StreamReader {
    fn run(self, input: BufReader<TcpStream>) {
        let error = self.read_streams(input).err();
        self.auth.connection_closed();
        match &error {
            Some(err) => warn!(%err, "stream failed"),
            None => info!("stream closed by the server"),
        }
        // The client might be gone already
        let _ = self.events.send(StreamEvent::Closed(error));
    }

    fn read_streams(&self, mut input: BufReader<TcpStream>) -> Result<(), XmppClientError> {
        loop {
            let mut parser = XmlPullParser::new(input);
            if !self.read_stream(&mut parser)? {
                return Ok(());
            }
            // Authenticated, both sides start over on the same socket
            input = parser.into_inner();
            debug!("restarting the stream");
            self.transport.open_stream()?;
        }
    }

    /// Reads one stream. Returns true if it has to be restarted.
    fn read_stream(&self, parser: &mut dyn XmlSource) -> Result<bool, XmppClientError> {
        next_start_element(parser)?;
        if parser.name() != "stream" || parser.namespace() != STREAM_NS {
            return Err(XmppClientError::BadStream(description::NOT_A_STREAM));
        }
        debug!(id = ?parser.attribute("id"), from = ?parser.attribute("from"), "stream opened");
        loop {
            match parser.next()? {
                XmlEvent::StartElement => {
                    if self.read_element(parser)? {
                        return Ok(true);
                    }
                }
                XmlEvent::EndElement => return Ok(false),
                XmlEvent::EndDocument => return Err(XmlError::UnexpectedEof.into()),
                _ => (),
            }
        }
    }

    fn read_element(&self, parser: &mut dyn XmlSource) -> Result<bool, XmppClientError> {
        debug!(element = parser.qualified_name(), "receive");
        match (parser.name(), parser.namespace()) {
            ("features", STREAM_NS) => {
                let features = parse_stream_features(parser)?;
                debug!(mechanisms = ?features.mechanisms(), "stream features");
                self.auth
                    .set_available_mechanisms(features.mechanisms().iter().cloned());
                let _ = self.events.send(StreamEvent::Features(features));
                Ok(false)
            }
            (_, SASL_NS) => {
                let nonza = parse_sasl_nonza(parser)?;
                let success = matches!(nonza, SaslNonza::Success(_));
                self.auth.process(nonza)?;
                Ok(success && self.auth.state() == SaslState::Succeeded)
            }
            _ => {
                let depth = parser.depth();
                match self.decoder.parse_stanza(parser) {
                    Ok(stanza) => {
                        let _ = self.events.send(StreamEvent::Stanza(stanza));
                    }
                    Err(DecodeError::Xml(err)) => return Err(err.into()),
                    Err(err) => {
                        warn!(%err, "dropping undecodable stanza");
                        skip_rest(parser, depth)?;
                    }
                }
                Ok(false)
            }
        }
    }
}

/// Moves the source to the end of the element open at the given depth.
fn skip_rest(parser: &mut dyn XmlSource, depth: usize) -> Result<(), XmlError> {
    while parser.event() != XmlEvent::EndElement || parser.depth() != depth {
        if parser.next()? == XmlEvent::EndDocument {
            return Err(XmlError::UnexpectedEof);
        }
    }
    Ok(())
}

/// A client connection over plain TCP.
///
/// The connection opens the stream and waits for the server's features.
/// Authentication restarts the stream, and stanzas can then be received
/// with [wait_for_stanza()](XmppClient::wait_for_stanza).
pub struct XmppClient {
    jid: Jid,
    transport: Arc<Transport>,
    auth: Arc<SaslAuthentication>,
    events: Receiver<StreamEvent>,
    features: StreamFeatures,
    backlog: VecDeque<Stanza>,
    closed: bool,
    reader: Option<JoinHandle<()>>,
}

impl XmppClient {
    pub fn build(jid: Jid) -> ConnectionConfig {
        ConnectionConfig::new(jid)
    }

    pub(super) fn connect(config: ConnectionConfig) -> Result<XmppClient, XmppClientError> {
        let mut last_error = None;
        let mut tcp_stream = None;
        for address in config.socket_addresses()? {
            info!(%address, "connecting");
            match TcpStream::connect_timeout(&address, config.connection_timeout) {
                Ok(stream) => {
                    tcp_stream = Some(stream);
                    break;
                }
                Err(err) => {
                    warn!(%address, %err, "connection failed");
                    last_error = Some(err);
                }
            }
        }
        let tcp_stream = match (tcp_stream, last_error) {
            (Some(stream), _) => stream,
            (None, Some(err)) => return Err(err.into()),
            (None, None) => return Err(XmppClientError::BadStream(description::NO_ADDRESS)),
        };

        let input = BufReader::new(tcp_stream.try_clone()?);
        let transport = Arc::new(Transport {
            control: tcp_stream.try_clone()?,
            writer: Mutex::new(tcp_stream),
            host: host_name(config.host()).to_owned(),
            service_name: config.jid.domainpart().to_owned(),
            reply_timeout: config.reply_timeout,
            debug: config.debug,
        });
        let auth = Arc::new(SaslAuthentication::new(
            config.registry.clone(),
            transport.clone(),
        ));
        let (sender, events) = mpsc::channel();
        let reader = StreamReader {
            transport: transport.clone(),
            auth: auth.clone(),
            decoder: StanzaDecoder::default(),
            events: sender,
        };

        transport.open_stream()?;
        let reader = thread::Builder::new()
            .name("iks-xmpp-reader".to_owned())
            .spawn(move || reader.run(input))?;

        let mut client = XmppClient {
            jid: config.jid,
            transport,
            auth,
            events,
            features: StreamFeatures::default(),
            backlog: VecDeque::new(),
            closed: false,
            reader: Some(reader),
        };
        client.wait_for_features(config.connection_timeout)?;
        Ok(client)
    }

    pub fn jid(&self) -> &Jid {
        &self.jid
    }

    /// Features of the current stream.
    pub fn features(&self) -> &StreamFeatures {
        &self.features
    }

    pub fn authentication(&self) -> &SaslAuthentication {
        &self.auth
    }

    fn closed_error(&mut self, error: Option<XmppClientError>) -> XmppClientError {
        self.closed = true;
        error.unwrap_or(XmppClientError::BadStream(description::STREAM_CLOSED))
    }

    fn wait_for_features(&mut self, timeout: Duration) -> Result<(), XmppClientError> {
        loop {
            match self.events.recv_timeout(timeout) {
                Ok(StreamEvent::Features(features)) => {
                    self.features = features;
                    return Ok(());
                }
                Ok(StreamEvent::Stanza(stanza)) => self.backlog.push_back(stanza),
                Ok(StreamEvent::Closed(error)) => return Err(self.closed_error(error)),
                Err(RecvTimeoutError::Timeout) => {
                    return Err(XmppClientError::BadStream(description::NO_FEATURES));
                }
                Err(RecvTimeoutError::Disconnected) => return Err(self.closed_error(None)),
            }
        }
    }

    fn check_tls(&self) -> Result<(), XmppClientError> {
        if self.features.is_tls_required() {
            return Err(XmppClientError::BadStream(description::TLS_REQUIRED));
        }
        Ok(())
    }

    fn resource(&self) -> String {
        self.jid
            .resourcepart()
            .unwrap_or(DEFAULT_RESOURCE)
            .to_owned()
    }

    /// Authenticates and waits for the features of the restarted stream.
    pub fn authenticate(&mut self, credentials: &Credentials) -> Result<(), XmppClientError> {
        self.check_tls()?;
        self.auth.authenticate(credentials, &self.resource())?;
        self.wait_for_features(self.transport.reply_timeout)
    }

    pub fn authenticate_with_callback(
        &mut self,
        callback: &dyn CredentialsCallback,
    ) -> Result<(), XmppClientError> {
        self.check_tls()?;
        self.auth
            .authenticate_with_callback(callback, &self.resource())?;
        self.wait_for_features(self.transport.reply_timeout)
    }

    pub fn authenticate_anonymously(&mut self) -> Result<(), XmppClientError> {
        self.check_tls()?;
        self.auth.authenticate_anonymously()?;
        self.wait_for_features(self.transport.reply_timeout)
    }

    /// Blocks until the server sends a stanza.
    ///
    /// A stream error is returned as a stanza, and the next call reports
    /// the closed stream.
    pub fn wait_for_stanza(&mut self) -> Result<Stanza, XmppClientError> {
        if let Some(stanza) = self.backlog.pop_front() {
            return Ok(stanza);
        }
        if self.closed {
            return Err(self.closed_error(None));
        }
        loop {
            match self.events.recv() {
                Ok(StreamEvent::Features(features)) => self.features = features,
                Ok(StreamEvent::Stanza(stanza)) => return Ok(stanza),
                Ok(StreamEvent::Closed(error)) => return Err(self.closed_error(error)),
                Err(_) => return Err(self.closed_error(None)),
            }
        }
    }

    pub fn send_stanza(&self, stanza: &Stanza) -> Result<(), XmppClientError> {
        self.transport.write(stanza.to_string().as_bytes())?;
        Ok(())
    }

    /// Closes the stream and the connection.
    pub fn close(self) -> Result<(), XmppClientError> {
        self.transport.write(STREAM_END.as_bytes())?;
        Ok(())
    }
}

impl Drop for XmppClient {
    fn drop(&mut self) {
        self.transport.shutdown();
        if let Some(reader) = self.reader.take() {
            let _ = reader.join();
        }
    }
}
