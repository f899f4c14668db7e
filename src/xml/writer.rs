/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use crate::entities::escape_fmt;

/// Builds XML text one tag at a time.
///
/// Start tags are left open until the first content or the end of the
/// element, so that childless elements are written as empty element tags.
pub struct XmlWriter {
    out: String,
    open_tags: Vec<String>,
    start_open: bool,
}

impl XmlWriter {
    pub fn new() -> Self {
        XmlWriter {
            out: String::with_capacity(128),
            open_tags: Vec::new(),
            start_open: false,
        }
    }

    fn close_start(&mut self) {
        if self.start_open {
            self.out.push('>');
            self.start_open = false;
        }
    }

    pub fn start(&mut self, name: &str) -> &mut Self {
        self.close_start();
        self.out.push('<');
        self.out.push_str(name);
        self.open_tags.push(name.to_owned());
        self.start_open = true;
        self
    }

    pub fn attribute(&mut self, name: &str, value: &str) -> &mut Self {
        if self.start_open {
            self.out.push(' ');
            self.out.push_str(name);
            self.out.push_str("=\"");
            // Writing into a String cannot fail
            let _ = escape_fmt(value, &mut self.out);
            self.out.push('"');
        }
        self
    }

    pub fn optional_attribute(&mut self, name: &str, value: Option<&str>) -> &mut Self {
        if let Some(value) = value {
            self.attribute(name, value);
        }
        self
    }

    pub fn text(&mut self, text: &str) -> &mut Self {
        if !text.is_empty() {
            self.close_start();
            let _ = escape_fmt(text, &mut self.out);
        }
        self
    }

    /// Appends already serialized XML as is.
    pub fn raw(&mut self, xml: &str) -> &mut Self {
        if !xml.is_empty() {
            self.close_start();
            self.out.push_str(xml);
        }
        self
    }

    pub fn end(&mut self) -> &mut Self {
        if let Some(name) = self.open_tags.pop() {
            if self.start_open {
                self.out.push_str("/>");
                self.start_open = false;
            } else {
                self.out.push_str("</");
                self.out.push_str(&name);
                self.out.push('>');
            }
        }
        self
    }

    /// Writes `<name xml:lang="..">text</name>` in one go.
    pub fn text_element(&mut self, name: &str, lang: Option<&str>, text: &str) -> &mut Self {
        self.start(name)
            .optional_attribute("xml:lang", lang)
            .text(text)
            .end()
    }

    /// Closes any elements left open and returns the text.
    pub fn finish(mut self) -> String {
        while !self.open_tags.is_empty() {
            self.end();
        }
        self.out
    }
}

impl Default for XmlWriter {
    fn default() -> Self {
        Self::new()
    }
}
