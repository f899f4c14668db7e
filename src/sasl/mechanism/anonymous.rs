/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use super::{AuthParams, Mechanism, repeat_initial};
use crate::sasl::{MechanismDescriptor, SaslError};

/// The ANONYMOUS mechanism of RFC 4505. The server assigns a temporary identity.
#[derive(Debug, Default)]
pub struct Anonymous;

impl Anonymous {
    pub const NAME: &str = "ANONYMOUS";

    pub const DESCRIPTOR: MechanismDescriptor =
        MechanismDescriptor::new(Self::NAME, 500, create);
}

fn create() -> Box<dyn Mechanism> {
    Box::new(Anonymous)
}

impl Mechanism for Anonymous {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn start(&mut self, _params: &AuthParams) -> Result<Option<Vec<u8>>, SaslError> {
        Ok(None)
    }

    fn challenge(&mut self, challenge: &[u8]) -> Result<Vec<u8>, SaslError> {
        repeat_initial(&[], challenge)
    }
}
