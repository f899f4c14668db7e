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

use std::fmt::Display;
use std::str::FromStr;

pub use error::BadJid;
use error::description;

const MAX_PART_SIZE: usize = 1023;

// RFC 7622 section 3.3.1
const LOCAL_FORBIDDEN: &[char] = &['"', '&', '\'', '/', ':', '<', '>', '@'];

fn check_resource(resource: &str) -> Result<(), BadJid> {
    if resource.is_empty() {
        return Err(BadJid(description::RESOURCE_EMPTY));
    }
    if resource.len() > MAX_PART_SIZE {
        return Err(BadJid(description::RESOURCE_TOO_LONG));
    }
    Ok(())
}

/// The address of an entity in the XMPP protocol.
///
/// Each JID has three parts:
/// - Local part: Optionally identifies a local entity on the domain,
///   such as the account name used while authenticating.
/// - Domain part: Identifies an XMPP service.
/// - Resource part: Optionally identifies a session of the account.
///
/// More details can be found in [RFC7622](https://datatracker.ietf.org/doc/rfc7622/)
#[derive(Debug, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Jid {
    local: Option<String>,
    domain: String,
    resource: Option<String>,
}

impl Jid {
    /// Create a JID from a string.
    pub fn new(jid: &str) -> Result<Self, BadJid> {
        // The resource may contain '@' and '/', so it is split off first
        let (bare, resource) = match jid.split_once('/') {
            Some((bare, resource)) => (bare, Some(resource)),
            None => (jid, None),
        };
        let (local, mut domain) = match bare.rsplit_once('@') {
            Some((local, domain)) => (Some(local), domain),
            None => (None, bare),
        };

        if domain.is_empty() {
            return Err(BadJid(description::DOMAIN_EMPTY));
        }
        if domain.len() > MAX_PART_SIZE {
            return Err(BadJid(description::DOMAIN_TOO_LONG));
        }
        // Remove final dot as per RFC 7622 section 3.2
        if let Some(stripped) = domain.strip_suffix('.') {
            domain = stripped;
        }
        if let Some(local) = local {
            if local.is_empty() {
                return Err(BadJid(description::LOCAL_EMPTY));
            }
            if local.len() > MAX_PART_SIZE {
                return Err(BadJid(description::LOCAL_TOO_LONG));
            }
            if local.contains(LOCAL_FORBIDDEN) {
                return Err(BadJid(description::LOCAL_FORBIDDEN_CHAR));
            }
        }
        if let Some(resource) = resource {
            check_resource(resource)?;
        }

        Ok(Jid {
            local: local.map(str::to_owned),
            domain: domain.to_owned(),
            resource: resource.map(str::to_owned),
        })
    }

    /// Full form of the JID with all the components.
    pub fn full(&self) -> String {
        self.to_string()
    }

    /// Bare form of the JID without the resource part.
    pub fn bare(&self) -> String {
        match &self.local {
            Some(local) => format!("{local}@{}", self.domain),
            None => self.domain.clone(),
        }
    }

    pub fn localpart(&self) -> Option<&str> {
        self.local.as_deref()
    }

    pub fn domainpart(&self) -> &str {
        &self.domain
    }

    pub fn resourcepart(&self) -> Option<&str> {
        self.resource.as_deref()
    }

    /// True if the JID does not contain a resource part.
    pub fn is_bare(&self) -> bool {
        self.resource.is_none()
    }

    /// Creates another JID by overriding the resource part.
    pub fn with_resource(self, resource: &str) -> Result<Jid, BadJid> {
        check_resource(resource)?;
        Ok(Jid {
            resource: Some(resource.to_owned()),
            ..self
        })
    }
}

impl Display for Jid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(local) = &self.local {
            write!(f, "{local}@")?;
        }
        f.write_str(&self.domain)?;
        if let Some(resource) = &self.resource {
            write!(f, "/{resource}")?;
        }
        Ok(())
    }
}

impl FromStr for Jid {
    type Err = BadJid;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Jid::new(s)
    }
}
