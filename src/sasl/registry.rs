/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use super::mechanism::{Anonymous, External, Mechanism, Plain, ScramSha256};

/// A mechanism known to the client and its preference.
#[derive(Clone, Copy, Debug)]
pub struct MechanismDescriptor {
    name: &'static str,
    priority: u32,
    factory: fn() -> Box<dyn Mechanism>,
}

impl MechanismDescriptor {
    /// Lower priority values are tried first.
    pub const fn new(name: &'static str, priority: u32, factory: fn() -> Box<dyn Mechanism>) -> Self {
        MechanismDescriptor {
            name,
            priority,
            factory,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn priority(&self) -> u32 {
        self.priority
    }

    /// Creates the state for a new attempt.
    pub fn instantiate(&self) -> Box<dyn Mechanism> {
        (self.factory)()
    }
}

/// Mechanisms in order of preference.
///
/// A registry is filled once while setting up, and then shared read only
/// by the authentications of every connection.
///
/// # Examples
///
/// ```
/// use iks_xmpp::MechanismRegistry;
///
/// let registry = MechanismRegistry::with_default_mechanisms();
/// assert_eq!(registry.list(), vec!["SCRAM-SHA-256", "PLAIN", "ANONYMOUS", "EXTERNAL"]);
/// let selected = registry.select(&["PLAIN", "ANONYMOUS"]).unwrap();
/// assert_eq!(selected.name(), "PLAIN");
/// ```
#[derive(Clone, Debug, Default)]
pub struct MechanismRegistry {
    descriptors: Vec<MechanismDescriptor>,
}

impl MechanismRegistry {
    pub fn new() -> Self {
        MechanismRegistry::default()
    }

    pub fn with_default_mechanisms() -> Self {
        let mut registry = MechanismRegistry::new();
        registry.register(ScramSha256::DESCRIPTOR);
        registry.register(Plain::DESCRIPTOR);
        registry.register(Anonymous::DESCRIPTOR);
        registry.register(External::DESCRIPTOR);
        registry
    }

    /// Adds a mechanism.
    ///
    /// Mechanisms with equal priorities keep their registration order.
    /// Registering a name again is allowed, the first one in order wins.
    pub fn register(&mut self, descriptor: MechanismDescriptor) {
        let position = self
            .descriptors
            .partition_point(|known| known.priority <= descriptor.priority);
        self.descriptors.insert(position, descriptor);
    }

    pub fn mechanisms(&self) -> &[MechanismDescriptor] {
        &self.descriptors
    }

    /// Mechanism names in order of preference.
    pub fn list(&self) -> Vec<&'static str> {
        self.descriptors.iter().map(|descriptor| descriptor.name).collect()
    }

    /// The most preferred mechanism which is in the advertised set.
    pub fn select<S: AsRef<str>>(&self, advertised: &[S]) -> Option<&MechanismDescriptor> {
        self.descriptors.iter().find(|descriptor| {
            advertised
                .iter()
                .any(|name| name.as_ref() == descriptor.name)
        })
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}
