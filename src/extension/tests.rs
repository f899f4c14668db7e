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

fn parse(xml: &str) -> Result<ExtensionPayload, DecodeError> {
    parse_extension_payload(&mut XmlPullParser::from_bytes(xml.as_bytes()))
}

fn check_payload(xml: &str, expected: ExtensionPayload) {
    assert_eq!(parse(xml).unwrap(), expected, "{xml}");
}

fn check_malformed(xml: &str) {
    let result = parse(xml);
    assert!(
        matches!(result, Err(DecodeError::MalformedStanza(_))),
        "{xml} gave {result:?}"
    );
}

#[test]
fn payloads() {
    check_payload(
        "<data><text>&lt;html&gt;</text></data>",
        ExtensionPayload::Text("<html>".into()),
    );
    check_payload(
        "<data>\n  <base64>aGVsbG8=</base64>\n</data>",
        ExtensionPayload::Base64("aGVsbG8=".into()),
    );
    check_payload(
        "<data><chunkedBase64 streamId='Stream0001'/></data>",
        ExtensionPayload::ChunkedBase64("Stream0001".into()),
    );
    check_payload(
        "<data><chunkedBase64 streamId='Stream0001'>  </chunkedBase64></data>",
        ExtensionPayload::ChunkedBase64("Stream0001".into()),
    );
    check_payload(
        "<data><ibb sid='Session0003'/></data>",
        ExtensionPayload::BytestreamHandle("Session0003".into()),
    );
}

#[test]
fn embedded_xml() {
    check_payload(
        "<data><xml><html xmlns='http://www.w3.org/1999/xhtml' xml:lang='en'>\
         <h:p xmlns:h='urn:h' h:class='a&amp;b'>1 &lt; 2</h:p><br/></html></xml></data>",
        ExtensionPayload::EmbeddedXml(
            "<html lang=\"en\"><p class=\"a&amp;b\">1 &lt; 2</p><br/></html>".into(),
        ),
    );
    check_payload(
        "<data><xml/></data>",
        ExtensionPayload::EmbeddedXml(String::new()),
    );
}

#[test]
fn unknown_payload() {
    let result = parse("<data><video/></data>");
    assert!(matches!(result, Err(DecodeError::UnsupportedChildElement(name)) if name == "video"));
}

#[test]
fn unsupported_payloads() {
    let result = parse("<data><sipub xmlns='http://jabber.org/protocol/sipub' id='1'/></data>");
    assert!(matches!(result, Err(DecodeError::UnsupportedOperation(_))));
    let result = parse("<data><jingle xmlns='urn:xmpp:jingle:1' sid='a'/></data>");
    assert!(matches!(result, Err(DecodeError::UnsupportedOperation(_))));
}

#[test]
fn malformed_payloads() {
    check_malformed("<data/>");
    check_malformed("<data>text</data>");
    check_malformed("<data><text>a</text><text>b</text></data>");
    check_malformed("<data><text>a<b/></text></data>");
    check_malformed("<data><chunkedBase64/></data>");
    check_malformed("<data><chunkedBase64 streamId='s'>text</chunkedBase64></data>");
    check_malformed("<data><ibb/></data>");
    check_malformed("<data><ibb sid='s'><x/></ibb></data>");
    check_malformed("<data><ibb sid='s'><!-- c --></ibb></data>");
    check_malformed("<data><chunkedBase64 streamId='s'><?pi x?></chunkedBase64></data>");
    check_malformed("<data><xml><p>a<!-- c --></p></xml></data>");
    check_malformed("<data><xml><?pi x?><p/></xml></data>");
}

#[test]
fn base64_data() {
    let payload = ExtensionPayload::Base64("aGVs\n bG8=".into());
    assert_eq!(payload.base64_data().unwrap().unwrap(), b"hello");
    assert!(
        ExtensionPayload::Base64("!!".into())
            .base64_data()
            .unwrap()
            .is_err()
    );
    assert!(ExtensionPayload::Text("hello".into()).base64_data().is_none());
}

#[test]
fn serialization() {
    for xml in [
        "<data><text>a &amp; b</text></data>",
        "<data><chunkedBase64 streamId=\"s1\"/></data>",
        "<data><ibb sid=\"i1\"/></data>",
        "<data><xml><p>x</p></xml></data>",
    ] {
        assert_eq!(parse(xml).unwrap().to_string(), xml);
    }
}
