/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use std::env;
use std::process::ExitCode;

use iks_xmpp::{Credentials, Jid, XmppClient, XmppClientError};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn print_version() {
    println!("iksjab (iks-xmpp) v{}", iks_xmpp::VERSION);
}

fn print_usage() {
    println!(concat!(
        "Usage: iksjab [OPTIONS]\n",
        "This tool authenticates to an XMPP server.\n",
        "Options:\n",
        "  -j, --jid <JID>        Jabber ID\n",
        "  -s, --server <HOST>    Connect to this host instead of the JID domain\n",
        "  -a, --anonymous        Use anonymous authentication\n",
        "  -d, --debug            Log the XML traffic\n",
        "  -h, --help             Display this help message and exit\n",
        "  -v, --version          Display the version and exit\n",
        "Report issues at https://github.com/meduketto/iksemel-rust/issues"
    ));
}

fn init_logging(debug: bool) {
    let default = if debug { "iks_xmpp=debug" } else { "iks_xmpp=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn run(jid: Jid, server: Option<String>, anonymous: bool, debug: bool) -> Result<(), XmppClientError> {
    let mut client = XmppClient::build(jid).server(server).debug(debug).connect()?;
    info!(mechanisms = ?client.features().mechanisms(), "connected");
    if anonymous {
        client.authenticate_anonymously()?;
    } else {
        let password = rpassword::prompt_password("Password: ")?;
        let username = client.jid().localpart().unwrap_or_default().to_owned();
        client.authenticate(&Credentials::new(&username, &password))?;
    }
    println!("Authenticated to {}", client.jid().domainpart());
    client.close()
}

fn main() -> ExitCode {
    let mut args = env::args();
    let mut jid: Option<Jid> = None;
    let mut server = None;
    let mut anonymous = false;
    let mut debug = false;

    // Skip the first argument (program name)
    args.next();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-j" | "--jid" => {
                if let Some(value) = args.next() {
                    jid = match Jid::new(&value) {
                        Ok(jid) => Some(jid),
                        Err(err) => {
                            eprintln!("Error: {err}");
                            return ExitCode::FAILURE;
                        }
                    };
                } else {
                    eprintln!("Error: Jabber ID expected after {arg}");
                    return ExitCode::FAILURE;
                }
            }
            "-s" | "--server" => {
                if let Some(value) = args.next() {
                    server = Some(value);
                } else {
                    eprintln!("Error: host name expected after {arg}");
                    return ExitCode::FAILURE;
                }
            }
            "-a" | "--anonymous" => anonymous = true,
            "-d" | "--debug" => debug = true,
            "-h" | "--help" => {
                print_usage();
                return ExitCode::SUCCESS;
            }
            "-v" | "--version" => {
                print_version();
                return ExitCode::SUCCESS;
            }
            _ => {
                eprintln!("Error: unknown option {arg}");
                return ExitCode::FAILURE;
            }
        }
    }

    let Some(jid) = jid else {
        eprintln!("Error: a Jabber ID is needed, see --help");
        return ExitCode::FAILURE;
    };
    init_logging(debug);

    match run(jid, server, anonymous, debug) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}
