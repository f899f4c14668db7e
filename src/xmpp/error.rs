/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use crate::sasl::SaslError;
use crate::stanza::DecodeError;
use crate::xml::XmlError;

#[derive(Debug, thiserror::Error)]
pub enum XmppClientError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Xml(#[from] XmlError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Sasl(#[from] SaslError),

    #[error("invalid stream protocol: {0}")]
    BadStream(&'static str),
}

pub(super) mod description {
    pub(in super::super) const NOT_A_STREAM: &str = "server did not open an XMPP stream";
    pub(in super::super) const NO_ADDRESS: &str = "server name resolves to no address";
    pub(in super::super) const NO_FEATURES: &str = "server did not send its stream features";
    pub(in super::super) const STREAM_CLOSED: &str = "stream is closed";
    pub(in super::super) const TLS_REQUIRED: &str = "server requires TLS, which is not supported";
}
