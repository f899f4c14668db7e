/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

//! Core of an XMPP client: SASL negotiation and streaming stanza decoding.
//!
//! The decoders work on any [XmlSource], like the [XmlPullParser] over a
//! string or a socket. Authentication is driven by [SaslAuthentication],
//! which blocks the caller until the receive path of the connection
//! delivers the outcome. [XmppClient] ties both together over TCP.

mod entities;
mod extension;
mod sasl;
mod stanza;
mod xml;
mod xmpp;

pub use xml::XML_NS;
pub use xml::XMLNS_NS;
pub use xml::XmlError;
pub use xml::XmlEvent;
pub use xml::XmlPullParser;
pub use xml::XmlSource;
pub use xml::XmlWriter;
pub use xml::next_start_element;
pub use xml::skip_element;

pub use stanza::DecodeError;
pub use stanza::DecoderConfig;
pub use stanza::ErrorType;
pub use stanza::Extension;
pub use stanza::Iq;
pub use stanza::IqType;
pub use stanza::LanguageText;
pub use stanza::LanguageTexts;
pub use stanza::Message;
pub use stanza::MessageType;
pub use stanza::Presence;
pub use stanza::PresenceType;
pub use stanza::Show;
pub use stanza::Stanza;
pub use stanza::StanzaDecoder;
pub use stanza::StanzaError;
pub use stanza::StanzaHeader;
pub use stanza::StreamError;
pub use stanza::Thread;
pub use stanza::UnknownElement;
pub use stanza::parse_stanza;
pub use stanza::read_text_only;

pub use extension::ExtensionPayload;
pub use extension::HttpExchange;
pub use extension::HttpExchangeKind;
pub use extension::parse_extension_payload;

pub use sasl::Anonymous;
pub use sasl::AuthParams;
pub use sasl::Connection;
pub use sasl::Credentials;
pub use sasl::CredentialsCallback;
pub use sasl::External;
pub use sasl::Mechanism;
pub use sasl::MechanismDescriptor;
pub use sasl::MechanismRegistry;
pub use sasl::Plain;
pub use sasl::SaslAuthentication;
pub use sasl::SaslError;
pub use sasl::SaslFailure;
pub use sasl::SaslNonza;
pub use sasl::SaslState;
pub use sasl::ScramSha256;
pub use sasl::encode_abort;
pub use sasl::encode_auth;
pub use sasl::encode_response;
pub use sasl::parse_sasl_nonza;

pub use xmpp::BadJid;
pub use xmpp::ConnectionConfig;
pub use xmpp::Jid;
pub use xmpp::StreamFeatures;
pub use xmpp::XmppClient;
pub use xmpp::XmppClientError;
pub use xmpp::parse_stream_features;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
