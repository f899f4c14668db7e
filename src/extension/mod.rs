/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

//! Closed grammar decoding of extension payloads.
//!
//! Unlike the stanza decoder, which keeps any element it does not know, the
//! decoders here only accept the children their grammar defines.

mod http;

use std::fmt::Display;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

pub use http::HttpExchange;
pub use http::HttpExchangeKind;
pub(crate) use http::parse_http_exchange;

use crate::stanza::{DecodeError, description, expect_start, read_text_only};
use crate::xml::{XMLNS_NS, XmlEvent, XmlSource};
use crate::{XmlError, XmlWriter};

/// Content of an HTTP over XMPP `<data>` element.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ExtensionPayload {
    /// Plain text content.
    Text(String),
    /// Base64 encoded binary content.
    Base64(String),
    /// Content sent as a chunked stream, identified by its stream id.
    ChunkedBase64(String),
    /// XML content, kept as a serialized fragment.
    EmbeddedXml(String),
    /// Content sent over an in-band bytestream, identified by its session id.
    BytestreamHandle(String),
}

impl ExtensionPayload {
    /// Decodes a [Base64](ExtensionPayload::Base64) payload.
    ///
    /// Whitespace inside the encoded text is ignored. Returns `None` for the
    /// other payload kinds.
    pub fn base64_data(&self) -> Option<Result<Vec<u8>, base64::DecodeError>> {
        match self {
            ExtensionPayload::Base64(text) => {
                let compact: String = text.split_whitespace().collect();
                Some(BASE64.decode(compact))
            }
            _ => None,
        }
    }

    pub(crate) fn write(&self, writer: &mut XmlWriter) {
        match self {
            ExtensionPayload::Text(text) => {
                writer.text_element("text", None, text);
            }
            ExtensionPayload::Base64(text) => {
                writer.text_element("base64", None, text);
            }
            ExtensionPayload::ChunkedBase64(stream_id) => {
                writer.start("chunkedBase64").attribute("streamId", stream_id).end();
            }
            ExtensionPayload::EmbeddedXml(xml) => {
                writer.start("xml").raw(xml).end();
            }
            ExtensionPayload::BytestreamHandle(sid) => {
                writer.start("ibb").attribute("sid", sid).end();
            }
        }
    }
}

impl Display for ExtensionPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut writer = XmlWriter::new();
        writer.start("data");
        self.write(&mut writer);
        f.write_str(&writer.finish())
    }
}

type PayloadDecoder = fn(&mut dyn XmlSource) -> Result<ExtensionPayload, DecodeError>;

const PAYLOAD_DECODERS: &[(&str, PayloadDecoder)] = &[
    ("text", parse_text),
    ("base64", parse_base64),
    ("chunkedBase64", parse_chunked_base64),
    ("xml", parse_xml),
    ("ibb", parse_ibb),
    ("sipub", parse_sipub),
    ("jingle", parse_jingle),
];

/// Decodes the `<data>` element at the current position.
///
/// The element must hold exactly one payload child. A source which has not
/// been advanced yet is moved to its first element. On success the source
/// is left at the end of the `<data>` element.
///
/// # Examples
///
/// ```
/// use iks_xmpp::{ExtensionPayload, XmlPullParser, parse_extension_payload};
///
/// let xml = b"<data><chunkedBase64 streamId='Stream0001'/></data>";
/// let payload = parse_extension_payload(&mut XmlPullParser::from_bytes(xml)).unwrap();
/// assert_eq!(payload, ExtensionPayload::ChunkedBase64("Stream0001".into()));
/// ```
pub fn parse_extension_payload(
    parser: &mut dyn XmlSource,
) -> Result<ExtensionPayload, DecodeError> {
    expect_start(parser)?;
    let depth = parser.depth();
    let mut payload = None;
    loop {
        match parser.next()? {
            XmlEvent::StartElement => {
                let name = parser.name();
                let decoder = PAYLOAD_DECODERS
                    .iter()
                    .find(|(known, _)| *known == name)
                    .map(|(_, decoder)| *decoder)
                    .ok_or_else(|| DecodeError::UnsupportedChildElement(name.to_owned()))?;
                if payload.is_some() {
                    return Err(DecodeError::MalformedStanza(description::DATA_MULTIPLE));
                }
                payload = Some(decoder(parser)?);
            }
            XmlEvent::EndElement if parser.depth() == depth => break,
            XmlEvent::Text if parser.text().trim().is_empty() => (),
            XmlEvent::Text => return Err(DecodeError::MalformedStanza(description::DATA_TEXT)),
            XmlEvent::EndDocument => return Err(XmlError::UnexpectedEof.into()),
            _ => (),
        }
    }
    payload.ok_or(DecodeError::MalformedStanza(description::DATA_EMPTY))
}

fn required_attribute(parser: &dyn XmlSource, name: &str) -> Result<String, DecodeError> {
    parser
        .attribute(name)
        .map(str::to_owned)
        .ok_or(DecodeError::MalformedStanza(description::MISSING_ATTRIBUTE))
}

/// Checks that the current element has no content besides whitespace.
fn expect_empty(parser: &mut dyn XmlSource) -> Result<(), DecodeError> {
    let depth = parser.depth();
    loop {
        match parser.next()? {
            XmlEvent::EndElement if parser.depth() == depth => return Ok(()),
            XmlEvent::Text if parser.text().trim().is_empty() => (),
            XmlEvent::EndDocument => return Err(XmlError::UnexpectedEof.into()),
            _ => return Err(DecodeError::MalformedStanza(description::NOT_EMPTY)),
        }
    }
}

fn parse_text(parser: &mut dyn XmlSource) -> Result<ExtensionPayload, DecodeError> {
    read_text_only(parser).map(ExtensionPayload::Text)
}

fn parse_base64(parser: &mut dyn XmlSource) -> Result<ExtensionPayload, DecodeError> {
    read_text_only(parser).map(ExtensionPayload::Base64)
}

fn parse_chunked_base64(parser: &mut dyn XmlSource) -> Result<ExtensionPayload, DecodeError> {
    let stream_id = required_attribute(parser, "streamId")?;
    expect_empty(parser)?;
    Ok(ExtensionPayload::ChunkedBase64(stream_id))
}

fn parse_ibb(parser: &mut dyn XmlSource) -> Result<ExtensionPayload, DecodeError> {
    let sid = required_attribute(parser, "sid")?;
    expect_empty(parser)?;
    Ok(ExtensionPayload::BytestreamHandle(sid))
}

fn local_name(name: &str) -> &str {
    name.rsplit_once(':').map_or(name, |(_, local)| local)
}

/// Re-serializes the content of `<xml>` with local names only.
///
/// Comments and processing instructions can't be carried over and are
/// rejected.
fn parse_xml(parser: &mut dyn XmlSource) -> Result<ExtensionPayload, DecodeError> {
    let depth = parser.depth();
    let mut writer = XmlWriter::new();
    loop {
        match parser.next()? {
            XmlEvent::EndElement if parser.depth() == depth => break,
            XmlEvent::StartElement => {
                writer.start(parser.name());
                for index in 0..parser.attribute_count() {
                    if parser.attribute_namespace(index) != XMLNS_NS {
                        writer.attribute(
                            local_name(parser.attribute_name(index)),
                            parser.attribute_value(index),
                        );
                    }
                }
            }
            XmlEvent::EndElement => {
                writer.end();
            }
            XmlEvent::Text => {
                writer.text(parser.text());
            }
            XmlEvent::Comment | XmlEvent::ProcessingInstruction => {
                return Err(DecodeError::MalformedStanza(description::MARKUP_IN_XML));
            }
            XmlEvent::EndDocument => return Err(XmlError::UnexpectedEof.into()),
            _ => (),
        }
    }
    Ok(ExtensionPayload::EmbeddedXml(writer.finish()))
}

fn parse_sipub(_parser: &mut dyn XmlSource) -> Result<ExtensionPayload, DecodeError> {
    Err(DecodeError::UnsupportedOperation(description::SIPUB_UNSUPPORTED))
}

fn parse_jingle(_parser: &mut dyn XmlSource) -> Result<ExtensionPayload, DecodeError> {
    Err(DecodeError::UnsupportedOperation(description::JINGLE_UNSUPPORTED))
}

#[cfg(test)]
mod tests;
