/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use std::fmt::Display;

use crate::stanza::LanguageTexts;
use crate::xmpp::constants::DEFAULT_LANGUAGE;

/// The `<failure>` reported by the server.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SaslFailure {
    condition: String,
    texts: LanguageTexts,
}

impl SaslFailure {
    pub fn new(condition: &str) -> Self {
        SaslFailure {
            condition: condition.to_owned(),
            texts: LanguageTexts::new(DEFAULT_LANGUAGE),
        }
    }

    pub(crate) fn with_texts(condition: String, texts: LanguageTexts) -> Self {
        SaslFailure { condition, texts }
    }

    /// Defined condition, like `not-authorized`.
    pub fn condition(&self) -> &str {
        &self.condition
    }

    pub fn text(&self) -> Option<&str> {
        self.texts.text()
    }

    pub fn texts(&self) -> &LanguageTexts {
        &self.texts
    }
}

impl Display for SaslFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.condition)?;
        if let Some(text) = self.text() {
            write!(f, " ({text})")?;
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SaslError {
    #[error("none of the registered SASL mechanisms is offered by the server")]
    NoMechanismAvailable,

    #[error("SASL authentication with {mechanism} failed: {failure}")]
    SaslFailure {
        mechanism: String,
        failure: SaslFailure,
    },

    #[error("no response from the server within the reply timeout")]
    NoResponse,

    #[error("malformed SASL challenge: {0}")]
    MalformedChallenge(&'static str),

    #[error("not connected to the server")]
    NotConnected,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub(super) mod description {
    pub(in super::super) const NOT_BASE64: &str = "data is not valid base64";
    pub(in super::super) const UNEXPECTED_CHALLENGE: &str =
        "mechanism does not expect a challenge at this step";
    pub(in super::super) const NOT_UTF8: &str = "server message is not UTF-8";
    pub(in super::super) const SCRAM_SERVER_ERROR: &str = "server reported a SCRAM error";
    pub(in super::super) const SCRAM_BAD_FIELD: &str = "missing or invalid SCRAM attribute";
    pub(in super::super) const SCRAM_EXTENSION: &str = "mandatory SCRAM extensions are not supported";
    pub(in super::super) const SCRAM_NONCE_MISMATCH: &str =
        "server nonce does not start with the client nonce";
    pub(in super::super) const SCRAM_BAD_SIGNATURE: &str = "server signature does not match";
    pub(in super::super) const SCRAM_NO_SIGNATURE: &str = "server did not send its signature";
    pub(in super::super) const HMAC_KEY: &str = "invalid HMAC key";
    pub(in super::super) const UNKNOWN_NONZA: &str = "element is not a SASL challenge, success, or failure";
}
