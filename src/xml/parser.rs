/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use std::io::BufRead;

use quick_xml::Reader;
use quick_xml::escape::unescape;
use quick_xml::events::BytesStart;
use quick_xml::events::Event;

use super::XML_NS;
use super::XMLNS_NS;
use super::XmlError;
use super::XmlEvent;
use super::XmlSource;
use super::description;

struct Attribute {
    name: String,
    namespace: String,
    value: String,
}

struct Scope {
    name: String,
    local_start: usize,
    namespace: String,
    declarations: Vec<(String, String)>,
    lang: Option<String>,
}

impl Scope {
    fn local_name(&self) -> &str {
        &self.name[self.local_start..]
    }
}

fn split_prefix(name: &str) -> (&str, usize) {
    match name.find(':') {
        Some(pos) => (&name[..pos], pos + 1),
        None => ("", 0),
    }
}

/// Pull parser over any buffered byte input.
///
/// Tokenizing is done by `quick-xml`; this type adds the namespace scope
/// bookkeeping, `xml:lang` inheritance, and the owned event view which the
/// decoders of this crate consume through [XmlSource].
///
/// # Examples
///
/// ```
/// use iks_xmpp::{XmlEvent, XmlPullParser, XmlSource};
///
/// let mut parser = XmlPullParser::from_bytes(b"<a xmlns='x'>hi</a>");
/// assert_eq!(parser.next().unwrap(), XmlEvent::StartElement);
/// assert_eq!(parser.namespace(), "x");
/// assert_eq!(parser.next().unwrap(), XmlEvent::Text);
/// assert_eq!(parser.text(), "hi");
/// ```
pub struct XmlPullParser<R> {
    reader: Reader<R>,
    buffer: Vec<u8>,
    event: XmlEvent,
    scopes: Vec<Scope>,
    attributes: Vec<Attribute>,
    text: String,
    pending_end: bool,
    pop_scope: bool,
}

impl<'a> XmlPullParser<&'a [u8]> {
    /// Creates a parser over an in-memory document.
    pub fn from_bytes(bytes: &'a [u8]) -> Self {
        XmlPullParser::new(bytes)
    }
}

impl<R: BufRead> XmlPullParser<R> {
    pub fn new(input: R) -> Self {
        XmlPullParser {
            reader: Reader::from_reader(input),
            buffer: Vec::with_capacity(256),
            event: XmlEvent::StartDocument,
            scopes: Vec::new(),
            attributes: Vec::new(),
            text: String::new(),
            pending_end: false,
            pop_scope: false,
        }
    }

    /// Gives back the input, with any data read ahead still buffered in it.
    ///
    /// Used when a stream restarts and a fresh parser continues on the same
    /// input.
    pub fn into_inner(self) -> R {
        self.reader.into_inner()
    }

    fn lookup_prefix(&self, prefix: &str) -> Option<&str> {
        match prefix {
            "xml" => Some(XML_NS),
            "xmlns" => Some(XMLNS_NS),
            _ => self.scopes.iter().rev().find_map(|scope| {
                scope
                    .declarations
                    .iter()
                    .rev()
                    .find(|(declared, _)| declared == prefix)
                    .map(|(_, uri)| uri.as_str())
            }),
        }
    }

    fn start_element(&mut self, start: &BytesStart) -> Result<(), XmlError> {
        let name = std::str::from_utf8(start.name().as_ref())?.to_owned();
        let mut declarations = Vec::new();
        let mut lang = None;

        for attr in start.attributes() {
            let attr = attr.map_err(|err| XmlError::BadXml(err.to_string()))?;
            let key = std::str::from_utf8(attr.key.as_ref())?;
            let value = unescape(std::str::from_utf8(&attr.value)?)?.into_owned();
            if key == "xmlns" {
                declarations.push((String::new(), value.clone()));
            } else if let Some(prefix) = key.strip_prefix("xmlns:") {
                declarations.push((prefix.to_owned(), value.clone()));
            } else if key == "xml:lang" {
                lang = Some(value.clone());
            }
            self.attributes.push(Attribute {
                name: key.to_owned(),
                namespace: String::new(),
                value,
            });
        }

        let (prefix, local_start) = split_prefix(&name);
        self.scopes.push(Scope {
            name: String::new(),
            local_start,
            namespace: String::new(),
            declarations,
            lang,
        });
        let namespace = match self.lookup_prefix(prefix) {
            Some(uri) => uri.to_owned(),
            None if prefix.is_empty() => String::new(),
            None => return Err(XmlError::BadXml(description::UNBOUND_PREFIX.to_owned())),
        };

        for index in 0..self.attributes.len() {
            let (prefix, _) = split_prefix(&self.attributes[index].name);
            if prefix.is_empty() {
                if self.attributes[index].name == "xmlns" {
                    self.attributes[index].namespace = XMLNS_NS.to_owned();
                }
                continue;
            }
            let uri = match self.lookup_prefix(prefix) {
                Some(uri) => uri.to_owned(),
                None => return Err(XmlError::BadXml(description::UNBOUND_PREFIX.to_owned())),
            };
            self.attributes[index].namespace = uri;
        }

        if let Some(scope) = self.scopes.last_mut() {
            scope.name = name;
            scope.namespace = namespace;
        }
        Ok(())
    }

    fn read_event(&mut self, buffer: &mut Vec<u8>) -> Result<XmlEvent, XmlError> {
        loop {
            buffer.clear();
            match self.reader.read_event_into(buffer)? {
                Event::Start(start) => {
                    self.start_element(&start)?;
                    return Ok(XmlEvent::StartElement);
                }
                Event::Empty(start) => {
                    self.start_element(&start)?;
                    self.pending_end = true;
                    return Ok(XmlEvent::StartElement);
                }
                Event::End(_) => {
                    if self.scopes.is_empty() {
                        return Err(XmlError::BadXml(description::CLOSE_WITHOUT_OPEN.to_owned()));
                    }
                    self.pop_scope = true;
                    return Ok(XmlEvent::EndElement);
                }
                Event::Text(text) => {
                    let raw = std::str::from_utf8(&text)?;
                    self.text.push_str(&unescape(raw)?);
                    return Ok(XmlEvent::Text);
                }
                Event::CData(cdata) => {
                    self.text.push_str(std::str::from_utf8(&cdata)?);
                    return Ok(XmlEvent::Text);
                }
                Event::Comment(comment) => {
                    self.text.push_str(std::str::from_utf8(&comment)?);
                    return Ok(XmlEvent::Comment);
                }
                Event::PI(pi) => {
                    self.text.push_str(std::str::from_utf8(&pi)?);
                    return Ok(XmlEvent::ProcessingInstruction);
                }
                Event::Eof => {
                    if !self.scopes.is_empty() {
                        return Err(XmlError::UnexpectedEof);
                    }
                    return Ok(XmlEvent::EndDocument);
                }
                // Declarations and doctypes carry nothing for the decoders
                _ => (),
            }
        }
    }

    fn element_scope(&self) -> Option<&Scope> {
        match self.event {
            XmlEvent::StartElement | XmlEvent::EndElement => self.scopes.last(),
            _ => None,
        }
    }
}

impl<R: BufRead> XmlSource for XmlPullParser<R> {
    fn event(&self) -> XmlEvent {
        self.event
    }

    fn next(&mut self) -> Result<XmlEvent, XmlError> {
        if self.pop_scope {
            self.scopes.pop();
            self.pop_scope = false;
        }
        self.attributes.clear();
        self.text.clear();

        if self.pending_end {
            self.pending_end = false;
            self.pop_scope = true;
            self.event = XmlEvent::EndElement;
            return Ok(self.event);
        }
        if self.event == XmlEvent::EndDocument {
            return Ok(self.event);
        }

        let mut buffer = std::mem::take(&mut self.buffer);
        let result = self.read_event(&mut buffer);
        self.buffer = buffer;
        self.event = result?;
        Ok(self.event)
    }

    fn depth(&self) -> usize {
        self.scopes.len()
    }

    fn name(&self) -> &str {
        self.element_scope().map_or("", |scope| scope.local_name())
    }

    fn qualified_name(&self) -> &str {
        self.element_scope().map_or("", |scope| scope.name.as_str())
    }

    fn namespace(&self) -> &str {
        self.element_scope().map_or("", |scope| scope.namespace.as_str())
    }

    fn attribute_count(&self) -> usize {
        self.attributes.len()
    }

    fn attribute_name(&self, index: usize) -> &str {
        &self.attributes[index].name
    }

    fn attribute_namespace(&self, index: usize) -> &str {
        &self.attributes[index].namespace
    }

    fn attribute_value(&self, index: usize) -> &str {
        &self.attributes[index].value
    }

    fn text(&self) -> &str {
        &self.text
    }

    fn xml_lang(&self) -> Option<&str> {
        self.scopes.iter().rev().find_map(|scope| scope.lang.as_deref())
    }
}
