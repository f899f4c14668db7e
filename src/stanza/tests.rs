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
use crate::XmlPullParser;
use crate::extension::{ExtensionPayload, HttpExchangeKind};
use crate::xml::{XmlEvent, XmlSource, next_start_element};

fn parse(xml: &str) -> Result<Stanza, DecodeError> {
    parse_stanza(&mut XmlPullParser::from_bytes(xml.as_bytes()))
}

fn check_message(xml: &str) -> Message {
    match parse(xml).unwrap() {
        Stanza::Message(message) => message,
        other => panic!("not a message: {other:?}"),
    }
}

fn check_presence(xml: &str) -> Presence {
    match parse(xml).unwrap() {
        Stanza::Presence(presence) => presence,
        other => panic!("not a presence: {other:?}"),
    }
}

fn check_malformed(xml: &str) {
    let result = parse(xml);
    assert!(
        matches!(result, Err(DecodeError::MalformedStanza(_))),
        "{xml} gave {result:?}"
    );
}

fn check_round_trip(xml: &str) {
    let first = parse(xml).unwrap();
    let serialized = first.to_string();
    let second = parse(&serialized).unwrap();
    assert_eq!(first, second, "serialized as {serialized}");
}

#[test]
fn explicit_body_language() {
    let message = check_message("<message xml:lang='en'><body xml:lang='jp'>konnichiwa</body></message>");
    assert_eq!(message.body(), None);
    assert_eq!(message.body_languages(), vec!["jp"]);
    assert_eq!(message.body_lang(Some("jp")), Some("konnichiwa"));
    assert_eq!(message.body_lang(Some("en")), None);

    let message = check_message("<message><body xml:lang='jp'>konnichiwa</body></message>");
    assert_eq!(message.bodies().default_language(), "en");
    assert_eq!(message.body(), None);
    assert_eq!(message.body_languages(), vec!["jp"]);
}

#[test]
fn body_languages() {
    let message = check_message(
        "<message xml:lang='sp'>\
         <body>hola</body>\
         <body xml:lang='en'>hello</body>\
         <body xml:lang='de'>hallo</body>\
         <body xml:lang='sp'>hola otra vez</body>\
         </message>",
    );
    assert_eq!(message.body(), Some("hola otra vez"));
    assert_eq!(message.body_lang(None), Some("hola otra vez"));
    assert_eq!(message.body_lang(Some("de")), Some("hallo"));
    assert_eq!(message.body_languages(), vec!["en", "de"]);
    assert_eq!(message.bodies().len(), 4);
    let entries: Vec<_> = message
        .bodies()
        .iter()
        .map(|entry| (entry.language(), entry.is_explicit(), entry.text()))
        .collect();
    assert_eq!(
        entries,
        vec![
            ("sp", false, "hola"),
            ("en", true, "hello"),
            ("de", true, "hallo"),
            ("sp", true, "hola otra vez"),
        ]
    );
}

#[test]
fn default_language_body() {
    let message = check_message("<message><body>hello</body></message>");
    assert_eq!(message.body(), Some("hello"));
    assert!(message.body_languages().is_empty());

    // Without a message language the default language applies to explicit tags too
    let message = check_message("<message><body xml:lang='en'>hello</body></message>");
    assert_eq!(message.body(), Some("hello"));

    let message = check_message("<message id='1'/>");
    assert_eq!(message.body(), None);
    assert!(message.bodies().is_empty());
    assert!(message.body_languages().is_empty());
    assert!(message.subject_languages().is_empty());
    assert_eq!(message.header().id(), Some("1"));
    assert_eq!(message.message_type(), MessageType::Normal);
}

#[test]
fn configured_default_language() {
    let decoder = StanzaDecoder::new(DecoderConfig::new().default_language("fr"));
    let xml = b"<message><body>salut</body><body xml:lang='en'>hi</body></message>";
    let Stanza::Message(message) = decoder
        .parse_stanza(&mut XmlPullParser::from_bytes(xml))
        .unwrap()
    else {
        panic!("not a message");
    };
    assert_eq!(message.body(), Some("salut"));
    assert_eq!(message.body_languages(), vec!["en"]);
}

#[test]
fn subjects() {
    let message = check_message(
        "<message xml:lang='en'><subject>news</subject><subject xml:lang='de'>Neuigkeiten</subject></message>",
    );
    assert_eq!(message.subject(), Some("news"));
    assert_eq!(message.subject_lang(Some("de")), Some("Neuigkeiten"));
    assert_eq!(message.subject_languages(), vec!["de"]);
    assert_eq!(message.body(), None);
}

#[test]
fn duplicate_languages() {
    let xml = "<message><body>one</body><body xml:lang='en'>two</body></message>";
    let message = check_message(xml);
    assert_eq!(message.body(), Some("two"));
    assert_eq!(message.bodies().len(), 2);
    assert!(message.body_languages().is_empty());

    let decoder = StanzaDecoder::new(DecoderConfig::new().reject_duplicate_languages(true));
    let result = decoder.parse_stanza(&mut XmlPullParser::from_bytes(xml.as_bytes()));
    assert!(matches!(result, Err(DecodeError::MalformedStanza(_))));

    let xml = b"<message><body>one</body><body xml:lang='de'>zwei</body></message>";
    assert!(
        decoder
            .parse_stanza(&mut XmlPullParser::from_bytes(xml))
            .is_ok()
    );
}

#[test]
fn markup_in_text() {
    check_malformed("<message><body>hello <b>world</b></body></message>");
    check_malformed("<message><subject><x/></subject></message>");
    check_malformed("<message><body>a<!-- no -->b</body></message>");
    check_malformed("<presence><status><x/></status></presence>");
    check_malformed("<message><thread>t<x/></thread></message>");
}

#[test]
fn bad_attributes() {
    check_malformed("<message type='shout'/>");
    check_malformed("<presence type='away'/>");
    check_malformed("<iq id='1'/>");
    check_malformed("<iq type='fetch'/>");
    check_malformed("<query/>");
    check_malformed("<presence><priority>200</priority></presence>");
    check_malformed("<presence><priority>high</priority></presence>");
    check_malformed("<presence><show>busy</show></presence>");
    check_malformed("<presence><show>dnd</show><show>xa</show></presence>");
    check_malformed("<message type='error'><error><bad-request xmlns='urn:ietf:params:xml:ns:xmpp-stanzas'/></error></message>");
}

#[test]
fn truncated_stanza() {
    let result = parse("<message><body>hi</body>");
    assert!(matches!(result, Err(DecodeError::Xml(_))));
}

#[test]
fn presence() {
    let presence = check_presence(
        "<presence from='juliet@example.com/balcony' xml:lang='en'>\
         <show>dnd</show><status>busy</status><status xml:lang='cs'>Zaneprázdněn</status>\
         <priority> -5 </priority></presence>",
    );
    assert!(presence.is_available());
    assert_eq!(presence.header().from(), Some("juliet@example.com/balcony"));
    assert_eq!(presence.show(), Some(Show::Dnd));
    assert_eq!(presence.status(), Some("busy"));
    assert_eq!(presence.status_lang(Some("cs")), Some("Zaneprázdněn"));
    assert_eq!(presence.status_languages(), vec!["cs"]);
    assert_eq!(presence.priority(), -5);

    let presence = check_presence("<presence type='unavailable'/>");
    assert_eq!(presence.presence_type(), Some(PresenceType::Unavailable));
    assert_eq!(presence.priority(), 0);
    assert!(presence.statuses().is_empty());
}

#[test]
fn unknown_elements() {
    let message = check_message(
        "<message xmlns='jabber:client'>\
         <x xmlns='jabber:x:oob' a='1'><url>http://example.com/?a=1&amp;b=2</url></x>\
         <body>link</body></message>",
    );
    assert_eq!(message.body(), Some("link"));
    assert_eq!(message.extensions().len(), 1);
    let Extension::Unknown(unknown) = &message.extensions()[0] else {
        panic!("not an unknown element");
    };
    assert_eq!(unknown.name(), "x");
    assert_eq!(unknown.namespace(), "jabber:x:oob");
    assert_eq!(
        unknown.xml(),
        "<x xmlns=\"jabber:x:oob\" a=\"1\"><url>http://example.com/?a=1&amp;b=2</url></x>"
    );

    let message = check_message(
        "<message xmlns='jabber:client' xmlns:ext='urn:example:ext'>\
         <ext:data ext:kind='a'><ext:item/><plain/></ext:data></message>",
    );
    let Extension::Unknown(unknown) = &message.extensions()[0] else {
        panic!("not an unknown element");
    };
    assert_eq!(unknown.name(), "data");
    assert_eq!(unknown.namespace(), "urn:example:ext");
    assert_eq!(
        unknown.xml(),
        "<ext:data ext:kind=\"a\" xmlns:ext=\"urn:example:ext\">\
         <ext:item/><plain xmlns=\"jabber:client\"/></ext:data>"
    );

    // Attribute prefixes bound outside of the element get a declaration too
    let xml = "<message xmlns='jabber:client' xmlns:a='urn:a'>\
               <x xmlns='urn:x' a:kind='1'><y a:kind='2'/><a:z a:kind='3'/></x></message>";
    let message = check_message(xml);
    let Extension::Unknown(unknown) = &message.extensions()[0] else {
        panic!("not an unknown element");
    };
    assert_eq!(
        unknown.xml(),
        "<x xmlns=\"urn:x\" a:kind=\"1\" xmlns:a=\"urn:a\"><y a:kind=\"2\"/><a:z a:kind=\"3\"/></x>"
    );
    let mut parser = XmlPullParser::from_bytes(unknown.xml().as_bytes());
    next_start_element(&mut parser).unwrap();
    next_start_element(&mut parser).unwrap();
    assert_eq!(parser.attribute_namespace(0), "urn:a");
    check_round_trip(xml);

    // Elements named like known children but in other namespaces are kept
    let message = check_message("<message xmlns='jabber:client'><body xmlns='urn:other'>x</body></message>");
    assert_eq!(message.body(), None);
    assert_eq!(message.extensions().len(), 1);
}

#[test]
fn stanza_errors() {
    let stanza = parse(
        "<iq type='error' id='q1' xmlns='jabber:client'>\
         <query xmlns='jabber:iq:roster'/>\
         <error type='cancel' by='example.com'>\
         <gone xmlns='urn:ietf:params:xml:ns:xmpp-stanzas'>xmpp:romeo@example.net</gone>\
         <text xmlns='urn:ietf:params:xml:ns:xmpp-stanzas' xml:lang='en'>moved</text>\
         <app-error xmlns='urn:example:app'/>\
         </error></iq>",
    )
    .unwrap();
    assert_eq!(stanza.id(), Some("q1"));
    let Stanza::Iq(iq) = stanza else {
        panic!("not an iq");
    };
    assert_eq!(iq.iq_type(), IqType::Error);
    assert_eq!(iq.payload().len(), 1);
    let error = iq.error().unwrap();
    assert_eq!(error.error_type(), ErrorType::Cancel);
    assert_eq!(error.by(), Some("example.com"));
    assert_eq!(error.condition(), "gone");
    assert_eq!(error.condition_text(), Some("xmpp:romeo@example.net"));
    assert_eq!(error.text(), Some("moved"));
    assert_eq!(error.extensions().len(), 1);

    let message = check_message("<message type='error'><error type='wait'/></message>");
    assert_eq!(message.message_type(), MessageType::Error);
    assert_eq!(message.error().unwrap().condition(), "undefined-condition");
}

#[test]
fn stream_error() {
    let stanza = parse(
        "<stream:error xmlns:stream='http://etherx.jabber.org/streams'>\
         <host-unknown xmlns='urn:ietf:params:xml:ns:xmpp-streams'/>\
         <text xmlns='urn:ietf:params:xml:ns:xmpp-streams'>no such host</text>\
         </stream:error>",
    )
    .unwrap();
    assert_eq!(stanza.header(), None);
    let Stanza::Error(error) = stanza else {
        panic!("not a stream error");
    };
    assert_eq!(error.condition(), "host-unknown");
    assert_eq!(error.text(), Some("no such host"));
    assert!(error.extensions().is_empty());
}

#[test]
fn http_exchange() {
    let stanza = parse(
        "<iq type='set' id='h1' xmlns='jabber:client'>\
         <req xmlns='urn:xmpp:http' method='GET' resource='/index.html' version='1.1'>\
         <headers xmlns='http://jabber.org/protocol/shim'>\
         <header name='Host'>example.org</header>\
         </headers>\
         <data><chunkedBase64 streamId='Stream0002'/></data>\
         </req></iq>",
    )
    .unwrap();
    let Stanza::Iq(iq) = stanza else {
        panic!("not an iq");
    };
    let Extension::Http(exchange) = &iq.payload()[0] else {
        panic!("not an http exchange");
    };
    assert_eq!(
        exchange.kind(),
        &HttpExchangeKind::Request {
            method: "GET".into(),
            resource: "/index.html".into()
        }
    );
    assert_eq!(exchange.version(), "1.1");
    assert_eq!(exchange.header("host"), Some("example.org"));
    assert_eq!(
        exchange.data(),
        Some(&ExtensionPayload::ChunkedBase64("Stream0002".into()))
    );

    let result = parse(
        "<iq type='result'><resp xmlns='urn:xmpp:http' statusCode='200' version='1.1'>\
         <data><sipub/></data></resp></iq>",
    );
    assert!(matches!(result, Err(DecodeError::UnsupportedOperation(_))));

    let result = parse(
        "<iq type='result'><resp xmlns='urn:xmpp:http' statusCode='200' version='1.1'>\
         <trailer/></resp></iq>",
    );
    assert!(matches!(result, Err(DecodeError::UnsupportedChildElement(name)) if name == "trailer"));
}

#[test]
fn round_trips() {
    check_round_trip(
        "<message xmlns='jabber:client' id='m1' to='romeo@example.net' type='chat' xml:lang='en'>\
         <subject>greeting</subject>\
         <body>hi &amp; bye</body><body xml:lang='de'>hallo</body><body xml:lang='en'>again</body>\
         <thread parent='p1'>t1</thread>\
         <x xmlns='urn:example:x'><y a='&lt;'/>text</x>\
         </message>",
    );
    check_round_trip(
        "<presence xmlns='jabber:client' type='subscribe'>\
         <show>away</show><status>out</status><priority>-1</priority>\
         <c xmlns='http://jabber.org/protocol/caps' hash='sha-1' node='n' ver='v'/>\
         </presence>",
    );
    check_round_trip(
        "<iq xmlns='jabber:client' type='result' id='h2'>\
         <resp xmlns='urn:xmpp:http' statusCode='200' statusMessage='OK' version='1.1'>\
         <headers xmlns='http://jabber.org/protocol/shim'>\
         <header name='Content-Type'>text/html</header><header name='Content-Length'>4</header>\
         </headers>\
         <data><xml><p class='x'>hi</p></xml></data>\
         </resp></iq>",
    );
    check_round_trip(
        "<message xmlns='jabber:client' type='error'>\
         <error type='modify' by='example.com'>\
         <bad-request xmlns='urn:ietf:params:xml:ns:xmpp-stanzas'/>\
         <text xmlns='urn:ietf:params:xml:ns:xmpp-stanzas'>nope</text>\
         </error></message>",
    );
    check_round_trip(
        "<stream:error xmlns:stream='http://etherx.jabber.org/streams'>\
         <conflict xmlns='urn:ietf:params:xml:ns:xmpp-streams'/>\
         <text xmlns='urn:ietf:params:xml:ns:xmpp-streams' xml:lang='en'>replaced</text>\
         </stream:error>",
    );
}

#[test]
fn stanzas_in_stream() {
    let mut parser = XmlPullParser::from_bytes(
        b"<stream:stream xmlns='jabber:client' xmlns:stream='http://etherx.jabber.org/streams' xml:lang='de'>\
          <message><body>hallo</body><body xml:lang='en'>hello</body></message>\
          <presence/>",
    );
    next_start_element(&mut parser).unwrap();
    next_start_element(&mut parser).unwrap();
    let Stanza::Message(message) = parse_stanza(&mut parser).unwrap() else {
        panic!("not a message");
    };
    assert_eq!(parser.event(), XmlEvent::EndElement);
    assert_eq!(parser.name(), "message");
    assert_eq!(message.header().language(), Some("de"));
    assert_eq!(message.header().namespace(), "jabber:client");
    assert_eq!(message.bodies().default_language(), "de");
    assert_eq!(message.body(), Some("hallo"));
    assert_eq!(message.body_languages(), vec!["en"]);

    next_start_element(&mut parser).unwrap();
    assert!(matches!(parse_stanza(&mut parser), Ok(Stanza::Presence(_))));
}

#[test]
fn stream_language_round_trip() {
    let mut parser = XmlPullParser::from_bytes(
        b"<stream:stream xmlns='jabber:client' xmlns:stream='http://etherx.jabber.org/streams' xml:lang='de'>\
          <message><body>Hallo</body></message>",
    );
    next_start_element(&mut parser).unwrap();
    next_start_element(&mut parser).unwrap();
    let first = parse_stanza(&mut parser).unwrap();
    let serialized = first.to_string();
    assert!(serialized.contains("xml:lang=\"de\""), "{serialized}");
    let second = parse(&serialized).unwrap();
    assert_eq!(first, second);
    let Stanza::Message(message) = second else {
        panic!("not a message");
    };
    assert_eq!(message.body_lang(Some("de")), Some("Hallo"));
}

#[test]
fn server_namespace() {
    let xml = "<message xmlns='jabber:server' from='a@example.com' to='b@example.net'>\
               <body>hi</body><x xmlns='urn:example:x'/></message>";
    let message = check_message(xml);
    assert_eq!(message.header().namespace(), "jabber:server");
    assert_eq!(message.body(), Some("hi"));
    assert!(message.to_string().starts_with("<message xmlns=\"jabber:server\""));
    check_round_trip(xml);

    let message = check_message("<message><body>hi</body></message>");
    assert_eq!(message.header().namespace(), "jabber:client");
}

#[test]
fn language_texts() {
    let mut texts = LanguageTexts::new("en");
    assert_eq!(texts.text(), None);
    texts.push(None, "one".into());
    texts.push(Some("fr"), "un".into());
    texts.push(Some("fr"), "une".into());
    assert_eq!(texts.get(None), Some("one"));
    assert_eq!(texts.get(Some("en")), Some("one"));
    assert_eq!(texts.get(Some("fr")), Some("une"));
    assert_eq!(texts.get(Some("de")), None);
    assert_eq!(texts.languages(), vec!["fr"]);
    assert!(texts.contains("fr"));
    assert_eq!(texts.len(), 3);
}
