/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use std::fmt::Write;

pub mod predefined {
    pub const LT: &str = "&lt;";
    pub const GT: &str = "&gt;";
    pub const AMP: &str = "&amp;";
    pub const APOS: &str = "&apos;";
    pub const QUOT: &str = "&quot;";
}

fn entity(c: char) -> Option<&'static str> {
    match c {
        '<' => Some(predefined::LT),
        '>' => Some(predefined::GT),
        '&' => Some(predefined::AMP),
        '\'' => Some(predefined::APOS),
        '"' => Some(predefined::QUOT),
        _ => None,
    }
}

/// Size of the string after the escaping of markup characters.
pub fn escaped_size(s: &str) -> usize {
    s.chars()
        .map(|c| match entity(c) {
            Some(entity) => entity.len(),
            None => c.len_utf8(),
        })
        .sum()
}

/// Writes the string with markup characters replaced by predefined entities.
///
/// Unescaped runs are written as whole slices, so a string without any
/// special characters is copied in a single write.
pub fn escape_fmt<W: Write>(s: &str, out: &mut W) -> std::fmt::Result {
    let mut start = 0;
    for (pos, c) in s.char_indices() {
        if let Some(entity) = entity(c) {
            if start < pos {
                out.write_str(&s[start..pos])?;
            }
            out.write_str(entity)?;
            start = pos + c.len_utf8();
        }
    }
    if start < s.len() {
        out.write_str(&s[start..])?;
    }
    Ok(())
}

pub fn escape(s: &str) -> String {
    let mut escaped = String::with_capacity(escaped_size(s));
    // Writing into a String cannot fail
    let _ = escape_fmt(s, &mut escaped);
    escaped
}
