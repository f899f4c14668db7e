/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use super::*;
use crate::XmlError;
use crate::extension::parse_http_exchange;
use crate::xml::{XMLNS_NS, XmlEvent, XmlSource, next_start_element, skip_element};
use crate::xmpp::constants::{CLIENT_NS, DEFAULT_LANGUAGE, HTTP_NS};

/// Settings of a [StanzaDecoder].
#[derive(Clone, Debug)]
pub struct DecoderConfig {
    default_language: String,
    reject_duplicate_languages: bool,
}

impl DecoderConfig {
    pub fn new() -> Self {
        DecoderConfig {
            default_language: DEFAULT_LANGUAGE.to_owned(),
            reject_duplicate_languages: false,
        }
    }

    /// Language of texts when neither they nor any ancestor declare one.
    pub fn default_language(mut self, language: &str) -> Self {
        self.default_language = language.to_owned();
        self
    }

    /// Rejects stanzas where two texts of the same kind resolve to the same
    /// language. Such stanzas are accepted by default, and lookups return
    /// the last one of them.
    pub fn reject_duplicate_languages(mut self, reject: bool) -> Self {
        self.reject_duplicate_languages = reject;
        self
    }
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Decodes stanzas from an [XmlSource].
///
/// The decoder keeps no state between calls, a single instance can be used
/// for any number of event sources.
///
/// # Examples
///
/// ```
/// use iks_xmpp::{Stanza, StanzaDecoder, DecoderConfig, XmlPullParser};
///
/// let xml = b"<message xml:lang='en'><body>Hi</body><body xml:lang='de'>Hallo</body></message>";
/// let decoder = StanzaDecoder::new(DecoderConfig::new());
/// let stanza = decoder.parse_stanza(&mut XmlPullParser::from_bytes(xml)).unwrap();
/// let Stanza::Message(message) = stanza else { panic!() };
/// assert_eq!(message.body(), Some("Hi"));
/// assert_eq!(message.body_lang(Some("de")), Some("Hallo"));
/// assert_eq!(message.body_languages(), vec!["de"]);
/// ```
#[derive(Clone, Debug, Default)]
pub struct StanzaDecoder {
    config: DecoderConfig,
}

/// Decodes one stanza with the default [DecoderConfig].
pub fn parse_stanza(parser: &mut dyn XmlSource) -> Result<Stanza, DecodeError> {
    StanzaDecoder::default().parse_stanza(parser)
}

/// Moves a fresh source to its first element, or checks that the source is
/// already at a start element.
pub(crate) fn expect_start(parser: &mut dyn XmlSource) -> Result<(), DecodeError> {
    match parser.event() {
        XmlEvent::StartElement => Ok(()),
        XmlEvent::StartDocument => Ok(next_start_element(parser)?),
        _ => Err(DecodeError::MalformedStanza(description::NOT_AT_START)),
    }
}

/// Reads the character data of a text-only element.
///
/// The source must be at the element's start and is left at its end.
/// Child elements, comments, and processing instructions are errors.
pub fn read_text_only(parser: &mut dyn XmlSource) -> Result<String, DecodeError> {
    let depth = parser.depth();
    let mut text = String::new();
    loop {
        match parser.next()? {
            XmlEvent::Text => text.push_str(parser.text()),
            XmlEvent::EndElement if parser.depth() == depth => return Ok(text),
            XmlEvent::StartElement => {
                return Err(DecodeError::MalformedStanza(description::MARKUP_IN_TEXT));
            }
            XmlEvent::EndDocument => return Err(XmlError::UnexpectedEof.into()),
            _ => return Err(DecodeError::MalformedStanza(description::UNEXPECTED_EVENT)),
        }
    }
}

/// Calls `child` at every child element of the current element.
///
/// `child` must leave the source at the end of the child it was given.
pub(crate) fn parse_children<F>(parser: &mut dyn XmlSource, mut child: F) -> Result<(), DecodeError>
where
    F: FnMut(&mut dyn XmlSource) -> Result<(), DecodeError>,
{
    let depth = parser.depth();
    loop {
        match parser.next()? {
            XmlEvent::StartElement => child(parser)?,
            XmlEvent::EndElement if parser.depth() == depth => return Ok(()),
            XmlEvent::EndDocument => return Err(XmlError::UnexpectedEof.into()),
            _ => (),
        }
    }
}

fn split_prefix(name: &str) -> &str {
    name.split_once(':').map_or("", |(prefix, _)| prefix)
}

fn is_declared(prefix: &str, declared: &[String], scopes: &[Vec<String>]) -> bool {
    declared.iter().chain(scopes.iter().flatten()).any(|known| known == prefix)
}

/// Serializes the current element and its subtree.
///
/// Namespace declarations are kept as written, and one is added wherever an
/// element or attribute prefix was declared outside of the captured subtree,
/// so the result stands on its own. Comments and processing instructions
/// are dropped.
pub(crate) fn capture_element(
    parser: &mut dyn XmlSource,
    parent_namespace: &str,
) -> Result<UnknownElement, DecodeError> {
    let name = parser.name().to_owned();
    let namespace = parser.namespace().to_owned();
    let depth = parser.depth();
    let mut writer = XmlWriter::new();
    let mut namespaces = vec![parent_namespace.to_owned()];
    // Prefixes bound inside the captured subtree, one list per open element
    let mut prefixes: Vec<Vec<String>> = Vec::new();
    loop {
        match parser.event() {
            XmlEvent::StartElement => {
                let qualified_name = parser.qualified_name();
                let prefix = split_prefix(qualified_name);
                writer.start(qualified_name);
                let mut declared = Vec::new();
                let mut declares_default = false;
                for index in 0..parser.attribute_count() {
                    let attribute = parser.attribute_name(index);
                    if parser.attribute_namespace(index) == XMLNS_NS {
                        match attribute.strip_prefix("xmlns:") {
                            Some(declares) => declared.push(declares.to_owned()),
                            None => declares_default = true,
                        }
                    }
                    writer.attribute(attribute, parser.attribute_value(index));
                }
                let current = parser.namespace();
                if prefix.is_empty() {
                    let inherited = namespaces.last().map_or("", String::as_str);
                    if !declares_default && current != inherited {
                        writer.attribute("xmlns", current);
                    }
                } else if !is_declared(prefix, &declared, &prefixes) {
                    writer.attribute(&format!("xmlns:{prefix}"), current);
                    declared.push(prefix.to_owned());
                }
                for index in 0..parser.attribute_count() {
                    let prefix = split_prefix(parser.attribute_name(index));
                    if matches!(prefix, "" | "xml" | "xmlns")
                        || is_declared(prefix, &declared, &prefixes)
                    {
                        continue;
                    }
                    writer.attribute(&format!("xmlns:{prefix}"), parser.attribute_namespace(index));
                    declared.push(prefix.to_owned());
                }
                namespaces.push(current.to_owned());
                prefixes.push(declared);
            }
            XmlEvent::EndElement => {
                writer.end();
                namespaces.pop();
                prefixes.pop();
                if parser.depth() == depth {
                    break;
                }
            }
            XmlEvent::Text => {
                writer.text(parser.text());
            }
            XmlEvent::EndDocument => return Err(XmlError::UnexpectedEof.into()),
            _ => (),
        }
        parser.next()?;
    }
    Ok(UnknownElement {
        name,
        namespace,
        xml: writer.finish(),
    })
}

fn parse_extension(
    parser: &mut dyn XmlSource,
    parent_namespace: &str,
) -> Result<Extension, DecodeError> {
    if parser.namespace() == HTTP_NS && matches!(parser.name(), "req" | "resp") {
        return Ok(Extension::Http(parse_http_exchange(parser)?));
    }
    Ok(Extension::Unknown(capture_element(parser, parent_namespace)?))
}

fn parse_header(parser: &dyn XmlSource) -> StanzaHeader {
    let attribute = |name| parser.attribute(name).map(str::to_owned);
    StanzaHeader {
        id: attribute("id"),
        from: attribute("from"),
        to: attribute("to"),
        language: parser.xml_lang().map(str::to_owned),
        namespace: match parser.namespace() {
            "" => CLIENT_NS.to_owned(),
            namespace => namespace.to_owned(),
        },
    }
}

fn parse_type<T>(
    parser: &dyn XmlSource,
    convert: fn(&str) -> Option<T>,
    error: &'static str,
) -> Result<Option<T>, DecodeError> {
    parser
        .attribute("type")
        .map(|value| convert(value).ok_or(DecodeError::MalformedStanza(error)))
        .transpose()
}

fn set_once<T>(slot: &mut Option<T>, value: T) -> Result<(), DecodeError> {
    if slot.is_some() {
        return Err(DecodeError::MalformedStanza(description::DUPLICATE_CHILD));
    }
    *slot = Some(value);
    Ok(())
}

impl StanzaDecoder {
    pub fn new(config: DecoderConfig) -> Self {
        StanzaDecoder { config }
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Decodes the stanza at the current start element.
    ///
    /// A source which has not been advanced yet is moved to its first
    /// element. On success the source is left at the stanza's end element.
    pub fn parse_stanza(&self, parser: &mut dyn XmlSource) -> Result<Stanza, DecodeError> {
        expect_start(parser)?;
        match (parser.name(), parser.namespace()) {
            ("error", STREAM_NS) => self.parse_stream_error(parser).map(Stanza::Error),
            ("message", _) => self.parse_message(parser).map(Stanza::Message),
            ("presence", _) => self.parse_presence(parser).map(Stanza::Presence),
            ("iq", _) => self.parse_iq(parser).map(Stanza::Iq),
            _ => Err(DecodeError::MalformedStanza(description::UNKNOWN_STANZA)),
        }
    }

    /// An empty collection for the texts of the current element.
    fn texts(&self, parser: &dyn XmlSource) -> LanguageTexts {
        LanguageTexts::new(parser.xml_lang().unwrap_or(&self.config.default_language))
    }

    fn push_text(
        &self,
        parser: &mut dyn XmlSource,
        texts: &mut LanguageTexts,
    ) -> Result<(), DecodeError> {
        let language = parser.attribute("xml:lang").map(str::to_owned);
        if self.config.reject_duplicate_languages {
            let resolved = language.as_deref().unwrap_or(texts.default_language());
            if texts.contains(resolved) {
                return Err(DecodeError::MalformedStanza(description::DUPLICATE_LANGUAGE));
            }
        }
        let text = read_text_only(parser)?;
        texts.push(language.as_deref(), text);
        Ok(())
    }

    fn parse_message(&self, parser: &mut dyn XmlSource) -> Result<Message, DecodeError> {
        let header = parse_header(parser);
        let message_type = parse_type(
            parser,
            MessageType::from_attribute,
            description::BAD_MESSAGE_TYPE,
        )?;
        let namespace = parser.namespace().to_owned();
        let mut subjects = self.texts(parser);
        let mut bodies = self.texts(parser);
        let mut thread = None;
        let mut error = None;
        let mut extensions = Vec::new();

        parse_children(parser, |parser| {
            if parser.namespace() != namespace {
                extensions.push(parse_extension(parser, &namespace)?);
                return Ok(());
            }
            match parser.name() {
                "subject" => self.push_text(parser, &mut subjects),
                "body" => self.push_text(parser, &mut bodies),
                "thread" => {
                    let parent = parser.attribute("parent").map(str::to_owned);
                    let id = read_text_only(parser)?;
                    set_once(&mut thread, Thread { id, parent })
                }
                "error" => set_once(&mut error, self.parse_stanza_error(parser)?),
                _ => {
                    extensions.push(parse_extension(parser, &namespace)?);
                    Ok(())
                }
            }
        })?;

        Ok(Message {
            header,
            message_type,
            subjects,
            bodies,
            thread,
            error,
            extensions,
        })
    }

    fn parse_presence(&self, parser: &mut dyn XmlSource) -> Result<Presence, DecodeError> {
        let header = parse_header(parser);
        let presence_type = parse_type(
            parser,
            PresenceType::from_attribute,
            description::BAD_PRESENCE_TYPE,
        )?;
        let namespace = parser.namespace().to_owned();
        let mut show = None;
        let mut statuses = self.texts(parser);
        let mut priority = None;
        let mut error = None;
        let mut extensions = Vec::new();

        parse_children(parser, |parser| {
            if parser.namespace() != namespace {
                extensions.push(parse_extension(parser, &namespace)?);
                return Ok(());
            }
            match parser.name() {
                "show" => {
                    let value = read_text_only(parser)?;
                    let value = Show::from_attribute(value.trim())
                        .ok_or(DecodeError::MalformedStanza(description::BAD_SHOW))?;
                    set_once(&mut show, value)
                }
                "status" => self.push_text(parser, &mut statuses),
                "priority" => {
                    let value = read_text_only(parser)?;
                    let value = value
                        .trim()
                        .parse::<i8>()
                        .map_err(|_| DecodeError::MalformedStanza(description::BAD_PRIORITY))?;
                    set_once(&mut priority, value)
                }
                "error" => set_once(&mut error, self.parse_stanza_error(parser)?),
                _ => {
                    extensions.push(parse_extension(parser, &namespace)?);
                    Ok(())
                }
            }
        })?;

        Ok(Presence {
            header,
            presence_type,
            show,
            statuses,
            priority,
            error,
            extensions,
        })
    }

    fn parse_iq(&self, parser: &mut dyn XmlSource) -> Result<Iq, DecodeError> {
        let header = parse_header(parser);
        let iq_type = parse_type(parser, IqType::from_attribute, description::BAD_IQ_TYPE)?
            .ok_or(DecodeError::MalformedStanza(description::BAD_IQ_TYPE))?;
        let namespace = parser.namespace().to_owned();
        let mut error = None;
        let mut payload = Vec::new();

        parse_children(parser, |parser| {
            if parser.name() == "error" && parser.namespace() == namespace {
                set_once(&mut error, self.parse_stanza_error(parser)?)
            } else {
                payload.push(parse_extension(parser, &namespace)?);
                Ok(())
            }
        })?;

        Ok(Iq {
            header,
            iq_type,
            error,
            payload,
        })
    }

    fn parse_stanza_error(&self, parser: &mut dyn XmlSource) -> Result<StanzaError, DecodeError> {
        let error_type = parser
            .attribute("type")
            .and_then(ErrorType::from_attribute)
            .ok_or(DecodeError::MalformedStanza(description::BAD_ERROR_TYPE))?;
        let by = parser.attribute("by").map(str::to_owned);
        let namespace = parser.namespace().to_owned();
        let mut condition = None;
        let mut texts = self.texts(parser);
        let mut extensions = Vec::new();

        parse_children(parser, |parser| {
            if parser.namespace() != STANZAS_NS {
                extensions.push(parse_extension(parser, &namespace)?);
                return Ok(());
            }
            if parser.name() == "text" {
                return self.push_text(parser, &mut texts);
            }
            let name = parser.name().to_owned();
            let text = read_text_only(parser)?;
            set_once(&mut condition, (name, (!text.is_empty()).then_some(text)))
        })?;

        let (condition, condition_text) =
            condition.unwrap_or_else(|| ("undefined-condition".to_owned(), None));
        Ok(StanzaError {
            error_type,
            by,
            condition,
            condition_text,
            texts,
            extensions,
        })
    }

    fn parse_stream_error(&self, parser: &mut dyn XmlSource) -> Result<StreamError, DecodeError> {
        let namespace = parser.namespace().to_owned();
        let mut condition = None;
        let mut texts = self.texts(parser);
        let mut extensions = Vec::new();

        parse_children(parser, |parser| {
            if parser.namespace() != STREAMS_NS {
                extensions.push(parse_extension(parser, &namespace)?);
                return Ok(());
            }
            if parser.name() == "text" {
                return self.push_text(parser, &mut texts);
            }
            let name = parser.name().to_owned();
            skip_element(parser)?;
            set_once(&mut condition, name)
        })?;

        Ok(StreamError {
            condition: condition.unwrap_or_else(|| "undefined-condition".to_owned()),
            texts,
            extensions,
        })
    }
}
