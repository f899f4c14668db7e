/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

use super::error::description;
use super::{SaslError, SaslFailure};
use crate::XmlWriter;
use crate::stanza::{DecodeError, LanguageTexts, expect_start, parse_children, read_text_only};
use crate::xml::{XmlSource, skip_element};
use crate::xmpp::constants::{DEFAULT_LANGUAGE, SASL_NS};

/// A SASL element received from the server.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SaslNonza {
    /// Base64 encoded challenge.
    Challenge(String),
    /// Base64 encoded additional data, if the server sent any.
    Success(Option<String>),
    Failure(SaslFailure),
}

/// Base64 text of SASL data, where an empty value is written as `=`.
fn encode_data(data: &[u8]) -> String {
    if data.is_empty() {
        "=".to_owned()
    } else {
        BASE64.encode(data)
    }
}

/// Decodes the text of a challenge or success element.
pub(crate) fn decode_data(text: &str) -> Result<Vec<u8>, SaslError> {
    let text = text.trim();
    if text.is_empty() || text == "=" {
        return Ok(Vec::new());
    }
    BASE64
        .decode(text)
        .map_err(|_| SaslError::MalformedChallenge(description::NOT_BASE64))
}

pub fn encode_auth(mechanism: &str, initial_response: Option<&[u8]>) -> String {
    let mut writer = XmlWriter::new();
    writer
        .start("auth")
        .attribute("xmlns", SASL_NS)
        .attribute("mechanism", mechanism);
    if let Some(data) = initial_response {
        writer.text(&encode_data(data));
    }
    writer.finish()
}

pub fn encode_response(data: &[u8]) -> String {
    let mut writer = XmlWriter::new();
    writer
        .start("response")
        .attribute("xmlns", SASL_NS)
        .text(&encode_data(data));
    writer.finish()
}

pub fn encode_abort() -> String {
    let mut writer = XmlWriter::new();
    writer.start("abort").attribute("xmlns", SASL_NS);
    writer.finish()
}

fn parse_failure(parser: &mut dyn XmlSource) -> Result<SaslFailure, DecodeError> {
    let mut condition = None;
    let mut texts = LanguageTexts::new(parser.xml_lang().unwrap_or(DEFAULT_LANGUAGE));
    parse_children(parser, |parser| {
        if parser.namespace() != SASL_NS {
            return Ok(skip_element(parser)?);
        }
        if parser.name() == "text" {
            let language = parser.attribute("xml:lang").map(str::to_owned);
            let text = read_text_only(parser)?;
            texts.push(language.as_deref(), text);
        } else {
            if condition.is_none() {
                condition = Some(parser.name().to_owned());
            }
            skip_element(parser)?;
        }
        Ok(())
    })?;
    let condition = condition.unwrap_or_else(|| "not-authorized".to_owned());
    Ok(SaslFailure::with_texts(condition, texts))
}

/// Decodes the SASL element at the current position.
pub fn parse_sasl_nonza(parser: &mut dyn XmlSource) -> Result<SaslNonza, DecodeError> {
    expect_start(parser)?;
    if parser.namespace() != SASL_NS {
        return Err(DecodeError::MalformedStanza(description::UNKNOWN_NONZA));
    }
    match parser.name() {
        "challenge" => Ok(SaslNonza::Challenge(read_text_only(parser)?)),
        "success" => {
            let data = read_text_only(parser)?;
            let data = data.trim();
            Ok(SaslNonza::Success((!data.is_empty()).then(|| data.to_owned())))
        }
        "failure" => Ok(SaslNonza::Failure(parse_failure(parser)?)),
        _ => Err(DecodeError::MalformedStanza(description::UNKNOWN_NONZA)),
    }
}
