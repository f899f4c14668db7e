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

/// The PLAIN mechanism of RFC 4616.
///
/// The password is sent in the clear, so it should only be used on
/// connections protected by other means.
#[derive(Debug, Default)]
pub struct Plain {
    message: Vec<u8>,
}

impl Plain {
    pub const NAME: &str = "PLAIN";

    pub const DESCRIPTOR: MechanismDescriptor =
        MechanismDescriptor::new(Self::NAME, 410, create);
}

fn create() -> Box<dyn Mechanism> {
    Box::new(Plain::default())
}

impl Mechanism for Plain {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn start(&mut self, params: &AuthParams) -> Result<Option<Vec<u8>>, SaslError> {
        let credentials = params.credentials;
        let mut message = Vec::new();
        message.extend_from_slice(credentials.authzid().unwrap_or("").as_bytes());
        message.push(0);
        message.extend_from_slice(credentials.username().as_bytes());
        message.push(0);
        message.extend_from_slice(credentials.password().as_bytes());
        self.message = message;
        Ok(Some(self.message.clone()))
    }

    fn challenge(&mut self, challenge: &[u8]) -> Result<Vec<u8>, SaslError> {
        repeat_initial(&self.message, challenge)
    }
}
