/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

pub const CLIENT_PORT: u16 = 5222;

pub const STREAM_NS: &str = "http://etherx.jabber.org/streams";

pub const CLIENT_NS: &str = "jabber:client";

pub const SASL_NS: &str = "urn:ietf:params:xml:ns:xmpp-sasl";

pub const TLS_NS: &str = "urn:ietf:params:xml:ns:xmpp-tls";

pub const BIND_NS: &str = "urn:ietf:params:xml:ns:xmpp-bind";

pub const STANZAS_NS: &str = "urn:ietf:params:xml:ns:xmpp-stanzas";

pub const STREAMS_NS: &str = "urn:ietf:params:xml:ns:xmpp-streams";

/// XEP-0332: HTTP over XMPP transport
pub const HTTP_NS: &str = "urn:xmpp:http";

/// XEP-0131: Stanza Headers and Internet Metadata
pub const SHIM_NS: &str = "http://jabber.org/protocol/shim";

/// Language assumed when neither a stanza nor its children declare one.
pub const DEFAULT_LANGUAGE: &str = "en";
