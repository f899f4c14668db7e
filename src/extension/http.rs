/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use super::{ExtensionPayload, parse_extension_payload, required_attribute};
use crate::XmlWriter;
use crate::stanza::{DecodeError, description, parse_children, read_text_only};
use crate::xml::XmlSource;
use crate::xmpp::constants::{HTTP_NS, SHIM_NS};

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum HttpExchangeKind {
    Request {
        method: String,
        resource: String,
    },
    Response {
        status_code: u16,
        status_message: Option<String>,
    },
}

/// An HTTP request or response carried in an IQ.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HttpExchange {
    kind: HttpExchangeKind,
    version: String,
    headers: Vec<(String, String)>,
    data: Option<ExtensionPayload>,
}

impl HttpExchange {
    pub fn kind(&self) -> &HttpExchangeKind {
        &self.kind
    }

    /// HTTP version, like `1.1`.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Header names and values in document order.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// First value of the named header. Names are case insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(header, _)| header.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn data(&self) -> Option<&ExtensionPayload> {
        self.data.as_ref()
    }

    pub(crate) fn write(&self, writer: &mut XmlWriter) {
        match &self.kind {
            HttpExchangeKind::Request { method, resource } => {
                writer
                    .start("req")
                    .attribute("xmlns", HTTP_NS)
                    .attribute("method", method)
                    .attribute("resource", resource);
            }
            HttpExchangeKind::Response {
                status_code,
                status_message,
            } => {
                writer
                    .start("resp")
                    .attribute("xmlns", HTTP_NS)
                    .attribute("statusCode", &status_code.to_string())
                    .optional_attribute("statusMessage", status_message.as_deref());
            }
        }
        writer.attribute("version", &self.version);
        if !self.headers.is_empty() {
            writer.start("headers").attribute("xmlns", SHIM_NS);
            for (name, value) in &self.headers {
                writer.start("header").attribute("name", name).text(value).end();
            }
            writer.end();
        }
        if let Some(data) = &self.data {
            writer.start("data");
            data.write(writer);
            writer.end();
        }
        writer.end();
    }
}

fn parse_headers(parser: &mut dyn XmlSource) -> Result<Vec<(String, String)>, DecodeError> {
    let mut headers = Vec::new();
    parse_children(parser, |parser| {
        if parser.name() != "header" || parser.namespace() != SHIM_NS {
            return Err(DecodeError::UnsupportedChildElement(parser.name().to_owned()));
        }
        let name = required_attribute(parser, "name")?;
        let value = read_text_only(parser)?;
        headers.push((name, value));
        Ok(())
    })?;
    Ok(headers)
}

/// Decodes the `<req>` or `<resp>` element at the current position.
pub(crate) fn parse_http_exchange(parser: &mut dyn XmlSource) -> Result<HttpExchange, DecodeError> {
    let kind = match parser.name() {
        "req" => HttpExchangeKind::Request {
            method: required_attribute(parser, "method")?,
            resource: required_attribute(parser, "resource")?,
        },
        "resp" => HttpExchangeKind::Response {
            status_code: required_attribute(parser, "statusCode")?
                .parse()
                .map_err(|_| DecodeError::MalformedStanza(description::BAD_STATUS_CODE))?,
            status_message: parser.attribute("statusMessage").map(str::to_owned),
        },
        other => return Err(DecodeError::UnsupportedChildElement(other.to_owned())),
    };
    let version = required_attribute(parser, "version")?;
    let mut headers = Vec::new();
    let mut data = None;

    parse_children(parser, |parser| {
        match (parser.name(), parser.namespace()) {
            ("headers", SHIM_NS) => headers.extend(parse_headers(parser)?),
            ("data", HTTP_NS) => {
                if data.is_some() {
                    return Err(DecodeError::MalformedStanza(description::DUPLICATE_CHILD));
                }
                data = Some(parse_extension_payload(parser)?);
            }
            (other, _) => return Err(DecodeError::UnsupportedChildElement(other.to_owned())),
        }
        Ok(())
    })?;

    Ok(HttpExchange {
        kind,
        version,
        headers,
        data,
    })
}
