/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use std::io;
use std::time::Duration;

/// What the authentication needs from the connection it runs on.
///
/// Notifications from the server are not part of this trait. The receive
/// path of the connection delivers them by calling
/// [SaslAuthentication](super::SaslAuthentication) methods directly.
pub trait Connection: Send + Sync {
    /// Writes a complete element to the stream.
    fn send(&self, data: &[u8]) -> io::Result<()>;

    /// How long to wait for the server to answer a request.
    fn reply_timeout(&self) -> Duration;

    /// Host name of the server, which may differ from the XMPP domain.
    fn host(&self) -> &str;

    /// The XMPP domain of the stream.
    fn service_name(&self) -> &str;
}
