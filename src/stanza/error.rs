/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use crate::XmlError;

/// Errors from decoding stanzas and extension payloads.
///
/// Each of these is fatal to the single parse call which returned it. The
/// event source is left wherever the error was detected.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The underlying XML is not well-formed or could not be read.
    #[error(transparent)]
    Xml(#[from] XmlError),

    /// The XML is well-formed but violates the XMPP grammar.
    #[error("malformed stanza: {0}")]
    MalformedStanza(&'static str),

    /// A closed grammar met a child element it does not define.
    #[error("unsupported child element: {0}")]
    UnsupportedChildElement(String),

    /// The element is defined by the protocol but decoding it is not implemented.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(&'static str),
}

pub(crate) mod description {
    pub(crate) const NOT_AT_START: &str = "decoder must start at a start element";
    pub(crate) const UNKNOWN_STANZA: &str = "element is not a message, presence, iq, or stream error";
    pub(crate) const MARKUP_IN_TEXT: &str = "markup is not allowed inside a text-only element";
    pub(crate) const UNEXPECTED_EVENT: &str = "only character data is allowed here";
    pub(crate) const DUPLICATE_LANGUAGE: &str =
        "more than one element resolves to the same language";
    pub(crate) const BAD_MESSAGE_TYPE: &str = "unknown message type";
    pub(crate) const BAD_PRESENCE_TYPE: &str = "unknown presence type";
    pub(crate) const BAD_IQ_TYPE: &str = "missing or unknown iq type";
    pub(crate) const BAD_SHOW: &str = "unknown presence show value";
    pub(crate) const BAD_PRIORITY: &str = "presence priority is not an integer in -128..127";
    pub(crate) const BAD_ERROR_TYPE: &str = "missing or unknown error type";
    pub(crate) const DUPLICATE_CHILD: &str = "element can only appear once";
    pub(crate) const MISSING_ATTRIBUTE: &str = "required attribute is missing";
    pub(crate) const BAD_STATUS_CODE: &str = "HTTP status code is not a number";
    pub(crate) const DATA_EMPTY: &str = "data element has no payload";
    pub(crate) const DATA_MULTIPLE: &str = "data element has more than one payload";
    pub(crate) const DATA_TEXT: &str = "character data is not allowed between payload elements";
    pub(crate) const NOT_EMPTY: &str = "element must not have any content";
    pub(crate) const MARKUP_IN_XML: &str =
        "comments and processing instructions are not allowed in embedded XML";
    pub(crate) const SIPUB_UNSUPPORTED: &str = "sipub is not supported yet";
    pub(crate) const JINGLE_UNSUPPORTED: &str = "jingle is not supported yet";
}
