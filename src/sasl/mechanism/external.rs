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

/// The EXTERNAL mechanism of RFC 4422.
///
/// The identity is established outside of the stream, like with a client
/// certificate. Only the authorization identity, if any, is sent.
#[derive(Debug, Default)]
pub struct External {
    authzid: Vec<u8>,
}

impl External {
    pub const NAME: &str = "EXTERNAL";

    pub const DESCRIPTOR: MechanismDescriptor =
        MechanismDescriptor::new(Self::NAME, 510, create);
}

fn create() -> Box<dyn Mechanism> {
    Box::new(External::default())
}

impl Mechanism for External {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn start(&mut self, params: &AuthParams) -> Result<Option<Vec<u8>>, SaslError> {
        self.authzid = params
            .credentials
            .authzid()
            .unwrap_or("")
            .as_bytes()
            .to_vec();
        Ok(Some(self.authzid.clone()))
    }

    fn challenge(&mut self, challenge: &[u8]) -> Result<Vec<u8>, SaslError> {
        repeat_initial(&self.authzid, challenge)
    }
}
