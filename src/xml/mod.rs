/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

mod error;
mod parser;
mod writer;

pub use error::XmlError;
use error::description;
pub use parser::XmlPullParser;
pub use writer::XmlWriter;

/// Namespace bound to the predefined `xml` prefix.
pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// Namespace of the `xmlns` and `xmlns:*` declaration attributes.
pub const XMLNS_NS: &str = "http://www.w3.org/2000/xmlns/";

/// Kind of the event an [XmlSource] is positioned at.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum XmlEvent {
    /// Nothing has been read yet.
    StartDocument,
    /// A start tag. Empty element tags are reported as a start followed by an end.
    StartElement,
    /// An end tag.
    EndElement,
    /// Character data, including CDATA sections.
    Text,
    Comment,
    ProcessingInstruction,
    /// The input is exhausted.
    EndDocument,
}

/// A pull-style XML event source.
///
/// The source is advanced with [next()](XmlSource::next) and the accessors
/// describe the event it is currently positioned at. Element accessors
/// return an empty string when the current event is not an element event.
///
/// Attribute accessors are only meaningful at a [XmlEvent::StartElement].
/// Namespace declarations are reported as attributes in the [XMLNS_NS]
/// namespace, so that an element can be re-serialized faithfully.
pub trait XmlSource {
    fn event(&self) -> XmlEvent;

    fn next(&mut self) -> Result<XmlEvent, XmlError>;

    /// Number of open elements, including the current start or end element.
    fn depth(&self) -> usize;

    /// Local name of the current element.
    fn name(&self) -> &str;

    /// Name of the current element as written, with its prefix.
    fn qualified_name(&self) -> &str;

    /// Namespace URI of the current element, empty if none is in scope.
    fn namespace(&self) -> &str;

    fn attribute_count(&self) -> usize;

    /// Name of the attribute as written, with its prefix.
    fn attribute_name(&self, index: usize) -> &str;

    /// Namespace URI of the attribute. Unprefixed attributes have none.
    fn attribute_namespace(&self, index: usize) -> &str;

    fn attribute_value(&self, index: usize) -> &str;

    /// Text of the current text, comment, or processing instruction event.
    fn text(&self) -> &str;

    /// The nearest `xml:lang` value, looking at the current element first and
    /// then its ancestors.
    fn xml_lang(&self) -> Option<&str>;

    /// Value of an attribute by its name as written (e.g. `id` or `xml:lang`).
    fn attribute(&self, name: &str) -> Option<&str> {
        (0..self.attribute_count())
            .find(|&index| self.attribute_name(index) == name)
            .map(|index| self.attribute_value(index))
    }
}

/// Advances the source until it is positioned at a start element.
pub fn next_start_element(parser: &mut dyn XmlSource) -> Result<(), XmlError> {
    loop {
        match parser.next()? {
            XmlEvent::StartElement => return Ok(()),
            XmlEvent::EndDocument => return Err(XmlError::UnexpectedEof),
            _ => (),
        }
    }
}

/// Skips the whole subtree of the current start element.
///
/// On return the source is positioned at the matching end element.
pub fn skip_element(parser: &mut dyn XmlSource) -> Result<(), XmlError> {
    if parser.event() != XmlEvent::StartElement {
        return Err(XmlError::BadXml(description::NOT_AT_START_ELEMENT.to_owned()));
    }
    let depth = parser.depth();
    loop {
        match parser.next()? {
            XmlEvent::EndElement if parser.depth() == depth => return Ok(()),
            XmlEvent::EndDocument => return Err(XmlError::UnexpectedEof),
            _ => (),
        }
    }
}
