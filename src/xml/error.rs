/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

/// Errors from the XML event source.
#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    /// The input is not well-formed XML.
    #[error("invalid XML syntax: {0}")]
    BadXml(String),

    /// Reading the underlying input failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The input ended while elements were still open.
    #[error("unexpected end of XML input")]
    UnexpectedEof,
}

impl From<quick_xml::Error> for XmlError {
    fn from(err: quick_xml::Error) -> Self {
        match err {
            quick_xml::Error::Io(err) => {
                XmlError::Io(std::io::Error::new(err.kind(), err.to_string()))
            }
            other => XmlError::BadXml(other.to_string()),
        }
    }
}

impl From<quick_xml::escape::EscapeError> for XmlError {
    fn from(err: quick_xml::escape::EscapeError) -> Self {
        XmlError::BadXml(err.to_string())
    }
}

impl From<std::str::Utf8Error> for XmlError {
    fn from(err: std::str::Utf8Error) -> Self {
        XmlError::BadXml(err.to_string())
    }
}

pub(super) mod description {
    pub(in super::super) const UNBOUND_PREFIX: &str = "namespace prefix is not declared";
    pub(in super::super) const CLOSE_WITHOUT_OPEN: &str = "close tag without open";
    pub(in super::super) const NOT_AT_START_ELEMENT: &str =
        "operation needs the source to be at a start element";
}
