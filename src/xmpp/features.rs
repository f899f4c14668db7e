/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use crate::stanza::{DecodeError, expect_start, parse_children, read_text_only};
use crate::xml::{XmlSource, skip_element};

use super::constants::{BIND_NS, SASL_NS, STREAM_NS, TLS_NS};

/// The `<stream:features>` advertised after a stream opens.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct StreamFeatures {
    mechanisms: Vec<String>,
    starttls: Option<bool>,
    bind: bool,
}

impl StreamFeatures {
    /// SASL mechanisms in the order the server listed them.
    pub fn mechanisms(&self) -> &[String] {
        &self.mechanisms
    }

    pub fn has_starttls(&self) -> bool {
        self.starttls.is_some()
    }

    /// The server refuses to continue without TLS.
    pub fn is_tls_required(&self) -> bool {
        self.starttls == Some(true)
    }

    /// Resource binding is offered, which means the stream is authenticated.
    pub fn has_bind(&self) -> bool {
        self.bind
    }
}

fn parse_mechanisms(parser: &mut dyn XmlSource) -> Result<Vec<String>, DecodeError> {
    let mut mechanisms = Vec::new();
    parse_children(parser, |parser| {
        if parser.name() == "mechanism" && parser.namespace() == SASL_NS {
            let name = read_text_only(parser)?;
            let name = name.trim();
            if !name.is_empty() {
                mechanisms.push(name.to_owned());
            }
            Ok(())
        } else {
            Ok(skip_element(parser)?)
        }
    })?;
    Ok(mechanisms)
}

fn parse_starttls(parser: &mut dyn XmlSource) -> Result<bool, DecodeError> {
    let mut required = false;
    parse_children(parser, |parser| {
        if parser.name() == "required" && parser.namespace() == TLS_NS {
            required = true;
        }
        Ok(skip_element(parser)?)
    })?;
    Ok(required)
}

/// Decodes the `<stream:features>` element at the current position.
///
/// Features this client does not use are skipped.
pub fn parse_stream_features(parser: &mut dyn XmlSource) -> Result<StreamFeatures, DecodeError> {
    expect_start(parser)?;
    if parser.name() != "features" || parser.namespace() != STREAM_NS {
        return Err(DecodeError::UnsupportedChildElement(parser.name().to_owned()));
    }
    let mut features = StreamFeatures::default();
    parse_children(parser, |parser| {
        match (parser.name(), parser.namespace()) {
            ("mechanisms", SASL_NS) => features.mechanisms = parse_mechanisms(parser)?,
            ("starttls", TLS_NS) => features.starttls = Some(parse_starttls(parser)?),
            ("bind", BIND_NS) => {
                features.bind = true;
                skip_element(parser)?;
            }
            _ => skip_element(parser)?,
        }
        Ok(())
    })?;
    Ok(features)
}
