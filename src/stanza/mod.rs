/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

//! Typed XMPP stanzas and their decoder.

mod decoder;
mod error;
mod language;

use std::fmt::Display;

pub use decoder::DecoderConfig;
pub use decoder::StanzaDecoder;
pub use decoder::parse_stanza;
pub use decoder::read_text_only;
pub(crate) use decoder::expect_start;
pub(crate) use decoder::parse_children;
pub use error::DecodeError;
pub(crate) use error::description;
pub use language::LanguageText;
pub use language::LanguageTexts;

use crate::XmlWriter;
use crate::extension::HttpExchange;
use crate::xmpp::constants::{CLIENT_NS, STANZAS_NS, STREAM_NS, STREAMS_NS};

macro_rules! attribute_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $value:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $value),+
                }
            }

            pub fn from_attribute(value: &str) -> Option<Self> {
                match value {
                    $($value => Some($name::$variant),)+
                    _ => None,
                }
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

attribute_enum!(
    /// Value of the `type` attribute of a message.
    MessageType {
        Normal => "normal",
        Chat => "chat",
        Groupchat => "groupchat",
        Headline => "headline",
        Error => "error",
    }
);

attribute_enum!(
    /// Value of the `type` attribute of a presence. Available presence has none.
    PresenceType {
        Unavailable => "unavailable",
        Subscribe => "subscribe",
        Subscribed => "subscribed",
        Unsubscribe => "unsubscribe",
        Unsubscribed => "unsubscribed",
        Probe => "probe",
        Error => "error",
    }
);

attribute_enum!(
    IqType {
        Get => "get",
        Set => "set",
        Result => "result",
        Error => "error",
    }
);

attribute_enum!(
    /// Availability sub-state of a presence.
    Show {
        Away => "away",
        Chat => "chat",
        Dnd => "dnd",
        Xa => "xa",
    }
);

attribute_enum!(
    ErrorType {
        Auth => "auth",
        Cancel => "cancel",
        Continue => "continue",
        Modify => "modify",
        Wait => "wait",
    }
);

/// Attributes shared by every stanza.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct StanzaHeader {
    pub(crate) id: Option<String>,
    pub(crate) from: Option<String>,
    pub(crate) to: Option<String>,
    pub(crate) language: Option<String>,
    pub(crate) namespace: String,
}

impl StanzaHeader {
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn from(&self) -> Option<&str> {
        self.from.as_deref()
    }

    pub fn to(&self) -> Option<&str> {
        self.to.as_deref()
    }

    /// The stanza's `xml:lang`, either its own attribute or the one it
    /// inherits from the stream.
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    /// Default namespace of the stanza, `jabber:client` unless it was
    /// decoded from another one such as `jabber:server`.
    pub fn namespace(&self) -> &str {
        if self.namespace.is_empty() { CLIENT_NS } else { &self.namespace }
    }

    fn write(&self, writer: &mut XmlWriter, name: &str, stanza_type: Option<&str>) {
        writer
            .start(name)
            .attribute("xmlns", self.namespace())
            .optional_attribute("id", self.id())
            .optional_attribute("from", self.from())
            .optional_attribute("to", self.to())
            .optional_attribute("type", stanza_type)
            .optional_attribute("xml:lang", self.language());
    }
}

/// A child element the decoder has no model for, kept as serialized XML.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UnknownElement {
    pub(crate) name: String,
    pub(crate) namespace: String,
    pub(crate) xml: String,
}

impl UnknownElement {
    /// Local name of the element.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The element and all of its content as XML text.
    pub fn xml(&self) -> &str {
        &self.xml
    }
}

/// Child payload of a stanza.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Extension {
    Http(HttpExchange),
    Unknown(UnknownElement),
}

impl Extension {
    fn write(&self, writer: &mut XmlWriter) {
        match self {
            Extension::Http(exchange) => exchange.write(writer),
            Extension::Unknown(unknown) => {
                writer.raw(&unknown.xml);
            }
        }
    }
}

/// The `<error>` child of a stanza.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StanzaError {
    pub(crate) error_type: ErrorType,
    pub(crate) by: Option<String>,
    pub(crate) condition: String,
    pub(crate) condition_text: Option<String>,
    pub(crate) texts: LanguageTexts,
    pub(crate) extensions: Vec<Extension>,
}

impl StanzaError {
    pub fn error_type(&self) -> ErrorType {
        self.error_type
    }

    pub fn by(&self) -> Option<&str> {
        self.by.as_deref()
    }

    /// Defined condition, like `item-not-found`.
    pub fn condition(&self) -> &str {
        &self.condition
    }

    /// Character data of the condition element (used by `gone` and `redirect`).
    pub fn condition_text(&self) -> Option<&str> {
        self.condition_text.as_deref()
    }

    pub fn text(&self) -> Option<&str> {
        self.texts.text()
    }

    pub fn texts(&self) -> &LanguageTexts {
        &self.texts
    }

    pub fn extensions(&self) -> &[Extension] {
        &self.extensions
    }

    fn write(&self, writer: &mut XmlWriter) {
        writer
            .start("error")
            .attribute("type", self.error_type.as_str())
            .optional_attribute("by", self.by())
            .start(&self.condition)
            .attribute("xmlns", STANZAS_NS)
            .text(self.condition_text.as_deref().unwrap_or(""))
            .end();
        self.texts.write(writer, "text", Some(STANZAS_NS));
        for extension in &self.extensions {
            extension.write(writer);
        }
        writer.end();
    }
}

/// Conversation thread of a message.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Thread {
    pub(crate) id: String,
    pub(crate) parent: Option<String>,
}

impl Thread {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Message {
    pub(crate) header: StanzaHeader,
    pub(crate) message_type: Option<MessageType>,
    pub(crate) subjects: LanguageTexts,
    pub(crate) bodies: LanguageTexts,
    pub(crate) thread: Option<Thread>,
    pub(crate) error: Option<StanzaError>,
    pub(crate) extensions: Vec<Extension>,
}

impl Message {
    pub fn header(&self) -> &StanzaHeader {
        &self.header
    }

    /// Message type, `normal` if the attribute is absent.
    pub fn message_type(&self) -> MessageType {
        self.message_type.unwrap_or(MessageType::Normal)
    }

    /// Body in the message's own language.
    pub fn body(&self) -> Option<&str> {
        self.bodies.text()
    }

    pub fn body_lang(&self, language: Option<&str>) -> Option<&str> {
        self.bodies.get(language)
    }

    /// Languages of the bodies other than the message's own language.
    pub fn body_languages(&self) -> Vec<&str> {
        self.bodies.languages()
    }

    pub fn bodies(&self) -> &LanguageTexts {
        &self.bodies
    }

    pub fn subject(&self) -> Option<&str> {
        self.subjects.text()
    }

    pub fn subject_lang(&self, language: Option<&str>) -> Option<&str> {
        self.subjects.get(language)
    }

    pub fn subject_languages(&self) -> Vec<&str> {
        self.subjects.languages()
    }

    pub fn subjects(&self) -> &LanguageTexts {
        &self.subjects
    }

    pub fn thread(&self) -> Option<&Thread> {
        self.thread.as_ref()
    }

    pub fn error(&self) -> Option<&StanzaError> {
        self.error.as_ref()
    }

    pub fn extensions(&self) -> &[Extension] {
        &self.extensions
    }

    fn write(&self, writer: &mut XmlWriter) {
        self.header.write(
            writer,
            "message",
            self.message_type.as_ref().map(MessageType::as_str),
        );
        self.subjects.write(writer, "subject", None);
        self.bodies.write(writer, "body", None);
        if let Some(thread) = &self.thread {
            writer
                .start("thread")
                .optional_attribute("parent", thread.parent())
                .text(&thread.id)
                .end();
        }
        if let Some(error) = &self.error {
            error.write(writer);
        }
        for extension in &self.extensions {
            extension.write(writer);
        }
        writer.end();
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Presence {
    pub(crate) header: StanzaHeader,
    pub(crate) presence_type: Option<PresenceType>,
    pub(crate) show: Option<Show>,
    pub(crate) statuses: LanguageTexts,
    pub(crate) priority: Option<i8>,
    pub(crate) error: Option<StanzaError>,
    pub(crate) extensions: Vec<Extension>,
}

impl Presence {
    pub fn header(&self) -> &StanzaHeader {
        &self.header
    }

    /// Presence type, `None` for available presence.
    pub fn presence_type(&self) -> Option<PresenceType> {
        self.presence_type
    }

    pub fn is_available(&self) -> bool {
        self.presence_type.is_none()
    }

    pub fn show(&self) -> Option<Show> {
        self.show
    }

    pub fn status(&self) -> Option<&str> {
        self.statuses.text()
    }

    pub fn status_lang(&self, language: Option<&str>) -> Option<&str> {
        self.statuses.get(language)
    }

    pub fn status_languages(&self) -> Vec<&str> {
        self.statuses.languages()
    }

    pub fn statuses(&self) -> &LanguageTexts {
        &self.statuses
    }

    /// Resource priority, zero if not given.
    pub fn priority(&self) -> i8 {
        self.priority.unwrap_or(0)
    }

    pub fn error(&self) -> Option<&StanzaError> {
        self.error.as_ref()
    }

    pub fn extensions(&self) -> &[Extension] {
        &self.extensions
    }

    fn write(&self, writer: &mut XmlWriter) {
        self.header.write(
            writer,
            "presence",
            self.presence_type.as_ref().map(PresenceType::as_str),
        );
        if let Some(show) = self.show {
            writer.text_element("show", None, show.as_str());
        }
        self.statuses.write(writer, "status", None);
        if let Some(priority) = self.priority {
            writer.text_element("priority", None, &priority.to_string());
        }
        if let Some(error) = &self.error {
            error.write(writer);
        }
        for extension in &self.extensions {
            extension.write(writer);
        }
        writer.end();
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Iq {
    pub(crate) header: StanzaHeader,
    pub(crate) iq_type: IqType,
    pub(crate) error: Option<StanzaError>,
    pub(crate) payload: Vec<Extension>,
}

impl Iq {
    pub fn header(&self) -> &StanzaHeader {
        &self.header
    }

    pub fn iq_type(&self) -> IqType {
        self.iq_type
    }

    pub fn error(&self) -> Option<&StanzaError> {
        self.error.as_ref()
    }

    pub fn payload(&self) -> &[Extension] {
        &self.payload
    }

    fn write(&self, writer: &mut XmlWriter) {
        self.header
            .write(writer, "iq", Some(self.iq_type.as_str()));
        for extension in &self.payload {
            extension.write(writer);
        }
        if let Some(error) = &self.error {
            error.write(writer);
        }
        writer.end();
    }
}

/// A `<stream:error>`, after which the server closes the stream.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StreamError {
    pub(crate) condition: String,
    pub(crate) texts: LanguageTexts,
    pub(crate) extensions: Vec<Extension>,
}

impl StreamError {
    /// Defined condition, like `host-unknown`.
    pub fn condition(&self) -> &str {
        &self.condition
    }

    pub fn text(&self) -> Option<&str> {
        self.texts.text()
    }

    pub fn texts(&self) -> &LanguageTexts {
        &self.texts
    }

    /// Application specific conditions.
    pub fn extensions(&self) -> &[Extension] {
        &self.extensions
    }

    fn write(&self, writer: &mut XmlWriter) {
        writer
            .start("stream:error")
            .attribute("xmlns:stream", STREAM_NS)
            .start(&self.condition)
            .attribute("xmlns", STREAMS_NS)
            .end();
        self.texts.write(writer, "text", Some(STREAMS_NS));
        for extension in &self.extensions {
            extension.write(writer);
        }
        writer.end();
    }
}

/// A top level protocol element.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Stanza {
    Message(Message),
    Presence(Presence),
    Iq(Iq),
    Error(StreamError),
}

impl Stanza {
    /// Common attributes, `None` for a stream error.
    pub fn header(&self) -> Option<&StanzaHeader> {
        match self {
            Stanza::Message(message) => Some(&message.header),
            Stanza::Presence(presence) => Some(&presence.header),
            Stanza::Iq(iq) => Some(&iq.header),
            Stanza::Error(_) => None,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.header().and_then(StanzaHeader::id)
    }
}

macro_rules! display_with_writer {
    ($($name:ty),+) => {
        $(
            impl Display for $name {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    let mut writer = XmlWriter::new();
                    self.write(&mut writer);
                    f.write_str(&writer.finish())
                }
            }
        )+
    };
}

display_with_writer!(Message, Presence, Iq, StreamError, StanzaError, Extension);

impl Display for Stanza {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stanza::Message(message) => message.fmt(f),
            Stanza::Presence(presence) => presence.fmt(f),
            Stanza::Iq(iq) => iq.fmt(f),
            Stanza::Error(error) => error.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests;
