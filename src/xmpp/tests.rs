/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

use super::client::stream_header;
use super::config::{host_name, needs_port};
use super::*;
use crate::sasl::{Credentials, SaslError, SaslState};
use crate::{Stanza, XmlPullParser, parse_stanza};

fn parse_features(xml: &str) -> StreamFeatures {
    let mut parser = XmlPullParser::from_bytes(xml.as_bytes());
    parse_stream_features(&mut parser).unwrap()
}

#[test]
fn features() {
    let features = parse_features(
        "<stream:features xmlns:stream='http://etherx.jabber.org/streams'>\
         <starttls xmlns='urn:ietf:params:xml:ns:xmpp-tls'><required/></starttls>\
         <mechanisms xmlns='urn:ietf:params:xml:ns:xmpp-sasl'>\
           <mechanism>SCRAM-SHA-256</mechanism>\
           <mechanism> PLAIN </mechanism>\
         </mechanisms>\
         <register xmlns='http://jabber.org/features/iq-register'/>\
         </stream:features>",
    );
    assert_eq!(features.mechanisms(), ["SCRAM-SHA-256", "PLAIN"]);
    assert!(features.has_starttls());
    assert!(features.is_tls_required());
    assert!(!features.has_bind());

    let features = parse_features(
        "<stream:features xmlns:stream='http://etherx.jabber.org/streams'>\
         <starttls xmlns='urn:ietf:params:xml:ns:xmpp-tls'/>\
         <bind xmlns='urn:ietf:params:xml:ns:xmpp-bind'/>\
         </stream:features>",
    );
    assert!(features.mechanisms().is_empty());
    assert!(features.has_starttls());
    assert!(!features.is_tls_required());
    assert!(features.has_bind());

    let mut parser = XmlPullParser::from_bytes(b"<features/>");
    assert!(parse_stream_features(&mut parser).is_err());
}

#[test]
fn ports() {
    assert!(needs_port("example.com"));
    assert!(needs_port("192.168.1.1"));
    assert!(needs_port("::1"));
    assert!(needs_port("[::1]"));
    assert!(!needs_port("example.com:5223"));
    assert!(!needs_port("[::1]:5222"));

    assert_eq!(host_name("example.com"), "example.com");
    assert_eq!(host_name("example.com:5223"), "example.com");
    assert_eq!(host_name("::1"), "::1");
    assert_eq!(host_name("[::1]"), "::1");
    assert_eq!(host_name("[::1]:5222"), "::1");
}

#[test]
fn config() {
    let jid = Jid::new("juliet@example.com/balcony").unwrap();
    let config = XmppClient::build(jid.clone());
    assert_eq!(config.host(), "example.com");
    assert_eq!(config.port, 5222);
    assert_eq!(config.reply_timeout, Duration::from_secs(5));
    assert_eq!(config.connection_timeout, Duration::from_secs(30));

    let config = config
        .server(Some("xmpp.example.com".to_owned()))
        .port(5999)
        .reply_timeout(Duration::from_millis(100))
        .debug(true);
    assert_eq!(config.host(), "xmpp.example.com");
    assert_eq!(config.jid(), &jid);
    assert_eq!(config.port, 5999);
    assert!(config.debug);
}

#[test]
fn header() {
    assert_eq!(
        stream_header("example.com"),
        "<?xml version='1.0'?><stream:stream xmlns='jabber:client' \
         xmlns:stream='http://etherx.jabber.org/streams' version='1.0' xml:lang='en' \
         to='example.com'>"
    );
}

const SERVER_STREAM: &str = "<?xml version='1.0'?><stream:stream xmlns='jabber:client' \
    xmlns:stream='http://etherx.jabber.org/streams' id='s1' from='example.com' version='1.0'>";

const PLAIN_FEATURES: &str = "<stream:features>\
    <mechanisms xmlns='urn:ietf:params:xml:ns:xmpp-sasl'><mechanism>PLAIN</mechanism></mechanisms>\
    </stream:features>";

const BIND_FEATURES: &str =
    "<stream:features><bind xmlns='urn:ietf:params:xml:ns:xmpp-bind'/></stream:features>";

/// Scripted server side of a single connection.
struct FakeServer {
    stream: TcpStream,
    received: String,
}

impl FakeServer {
    fn accept(listener: &TcpListener) -> FakeServer {
        let (stream, _) = listener.accept().unwrap();
        stream
            .set_read_timeout(Some(Duration::from_secs(10)))
            .unwrap();
        FakeServer {
            stream,
            received: String::new(),
        }
    }

    /// Reads until the client has sent the text, and returns all it sent.
    fn expect(&mut self, text: &str) -> String {
        let mut buffer = [0; 1024];
        while !self.received.contains(text) {
            let count = self.stream.read(&mut buffer).unwrap();
            assert!(count > 0, "connection closed while waiting for {text}");
            self.received
                .push_str(&String::from_utf8_lossy(&buffer[..count]));
        }
        let end = self.received.find(text).unwrap() + text.len();
        self.received.drain(..end).collect()
    }

    fn send(&mut self, xml: &str) {
        self.stream.write_all(xml.as_bytes()).unwrap();
    }
}

fn listen() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap().to_string();
    (listener, address)
}

fn connect(address: String) -> XmppClient {
    XmppClient::build(Jid::new("juliet@example.com").unwrap())
        .server(Some(address))
        .reply_timeout(Duration::from_secs(5))
        .connect()
        .unwrap()
}

#[test]
fn session() {
    let (listener, address) = listen();
    let server = thread::spawn(move || {
        let mut server = FakeServer::accept(&listener);
        server.expect("to='example.com'>");
        server.send(SERVER_STREAM);
        server.send(PLAIN_FEATURES);

        let auth = server.expect("</auth>");
        assert!(auth.contains("mechanism=\"PLAIN\""));
        assert!(auth.contains(&BASE64.encode(b"\0juliet\0secret")));
        server.send("<success xmlns='urn:ietf:params:xml:ns:xmpp-sasl'/>");

        server.expect("to='example.com'>");
        server.send(SERVER_STREAM);
        server.send(BIND_FEATURES);
        server.send(
            "<message from='romeo@example.com' to='juliet@example.com' type='chat'>\
             <body>Art thou not Romeo?</body></message>\
             <message type='bogus'><body>dropped</body></message>\
             <presence from='romeo@example.com'><show>away</show></presence>",
        );

        let reply = server.expect("</message>");
        assert!(reply.contains("<body>Neither, fair saint</body>"));
        server.send("</stream:stream>");
        server.expect("</stream:stream>");
    });

    let mut client = connect(address);
    assert_eq!(client.features().mechanisms(), ["PLAIN"]);
    client
        .authenticate(&Credentials::new("juliet", "secret"))
        .unwrap();
    assert!(client.features().has_bind());
    assert_eq!(client.authentication().state(), SaslState::Succeeded);
    assert_eq!(
        client.authentication().requested_resource().as_deref(),
        Some("iks-xmpp")
    );

    let Stanza::Message(message) = client.wait_for_stanza().unwrap() else {
        panic!("not a message");
    };
    assert_eq!(message.body(), Some("Art thou not Romeo?"));
    let Stanza::Presence(presence) = client.wait_for_stanza().unwrap() else {
        panic!("not a presence");
    };
    assert_eq!(presence.header().from(), Some("romeo@example.com"));

    let reply = "<message xmlns='jabber:client' to='romeo@example.com'>\
                 <body>Neither, fair saint</body></message>";
    let reply = parse_stanza(&mut XmlPullParser::from_bytes(reply.as_bytes())).unwrap();
    client.send_stanza(&reply).unwrap();

    let result = client.wait_for_stanza();
    assert!(matches!(result, Err(XmppClientError::BadStream(_))), "{result:?}");
    client.close().unwrap();
    server.join().unwrap();
}

#[test]
fn failed_authentication() {
    let (listener, address) = listen();
    let server = thread::spawn(move || {
        let mut server = FakeServer::accept(&listener);
        server.expect("to='example.com'>");
        server.send(SERVER_STREAM);
        server.send(PLAIN_FEATURES);
        server.expect("</auth>");
        server.send(
            "<failure xmlns='urn:ietf:params:xml:ns:xmpp-sasl'><not-authorized/></failure>",
        );
        server.send("</stream:stream>");
    });

    let mut client = connect(address);
    let result = client.authenticate(&Credentials::new("juliet", "wrong"));
    match result {
        Err(XmppClientError::Sasl(SaslError::SaslFailure { failure, .. })) => {
            assert_eq!(failure.condition(), "not-authorized");
        }
        other => panic!("unexpected result {other:?}"),
    }
    server.join().unwrap();
}

#[test]
fn required_tls() {
    let (listener, address) = listen();
    let server = thread::spawn(move || {
        let mut server = FakeServer::accept(&listener);
        server.expect("to='example.com'>");
        server.send(SERVER_STREAM);
        server.send(
            "<stream:features><starttls xmlns='urn:ietf:params:xml:ns:xmpp-tls'><required/>\
             </starttls></stream:features>",
        );
    });

    let mut client = connect(address);
    server.join().unwrap();
    assert!(client.features().is_tls_required());
    let result = client.authenticate_anonymously();
    assert!(matches!(result, Err(XmppClientError::BadStream(_))), "{result:?}");
}

#[test]
fn not_a_stream() {
    let (listener, address) = listen();
    let server = thread::spawn(move || {
        let mut server = FakeServer::accept(&listener);
        server.expect("to='example.com'>");
        server.send("<html><body/></html>");
    });

    let result = XmppClient::build(Jid::new("juliet@example.com").unwrap())
        .server(Some(address))
        .connect();
    assert!(matches!(result, Err(XmppClientError::BadStream(_))));
    server.join().unwrap();
}
