/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use std::collections::HashMap;

use crate::XmlWriter;

/// One language-tagged text element, like a message body.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LanguageText {
    language: String,
    explicit: bool,
    text: String,
}

impl LanguageText {
    /// The resolved language of the text.
    pub fn language(&self) -> &str {
        &self.language
    }

    /// True if the element carried its own `xml:lang` attribute.
    pub fn is_explicit(&self) -> bool {
        self.explicit
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Ordered multi-language texts of a stanza.
///
/// Entries are kept in document order with their resolved languages. An
/// element without its own `xml:lang` gets the default language of the
/// collection, which is the language of the enclosing stanza. Lookups go
/// through a language index, where a later entry replaces an earlier one
/// with the same language.
#[derive(Clone, Debug)]
pub struct LanguageTexts {
    default_language: String,
    entries: Vec<LanguageText>,
    index: HashMap<String, usize>,
}

impl LanguageTexts {
    pub fn new(default_language: &str) -> Self {
        LanguageTexts {
            default_language: default_language.to_owned(),
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Appends a text, with the element's own `xml:lang` value if it had one.
    pub fn push(&mut self, language: Option<&str>, text: String) {
        let (language, explicit) = match language {
            Some(language) => (language.to_owned(), true),
            None => (self.default_language.clone(), false),
        };
        self.index.insert(language.clone(), self.entries.len());
        self.entries.push(LanguageText {
            language,
            explicit,
            text,
        });
    }

    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    /// Text for the given language, or for the default language if `None`.
    pub fn get(&self, language: Option<&str>) -> Option<&str> {
        let language = language.unwrap_or(&self.default_language);
        self.index
            .get(language)
            .map(|&index| self.entries[index].text.as_str())
    }

    /// Text in the default language.
    pub fn text(&self) -> Option<&str> {
        self.get(None)
    }

    /// True if a text resolves to the given language.
    pub fn contains(&self, language: &str) -> bool {
        self.index.contains_key(language)
    }

    /// Languages which have a text, except the default language.
    ///
    /// Languages are listed once each, in the order they first appear.
    pub fn languages(&self) -> Vec<&str> {
        let mut languages: Vec<&str> = Vec::new();
        for entry in &self.entries {
            let language = entry.language.as_str();
            if language != self.default_language && !languages.contains(&language) {
                languages.push(language);
            }
        }
        languages
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LanguageText> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serializes every entry as a `name` element in document order.
    pub(crate) fn write(&self, writer: &mut XmlWriter, name: &str, namespace: Option<&str>) {
        for entry in &self.entries {
            let language = entry.explicit.then_some(entry.language.as_str());
            writer
                .start(name)
                .optional_attribute("xmlns", namespace)
                .optional_attribute("xml:lang", language)
                .text(&entry.text)
                .end();
        }
    }
}

// The index is derived from the entries
impl PartialEq for LanguageTexts {
    fn eq(&self, other: &Self) -> bool {
        self.default_language == other.default_language && self.entries == other.entries
    }
}

impl Eq for LanguageTexts {}

impl<'a> IntoIterator for &'a LanguageTexts {
    type Item = &'a LanguageText;
    type IntoIter = std::slice::Iter<'a, LanguageText>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
