use std::{
    io,
    net::{Ipv4Addr, SocketAddrV4},
    num::IntErrorKind,
};

use clap::Parser;
use regex::Regex;
use tracing::info;

use libchat::{
    err::ChatResult,
    handshake::prompt_username,
    setup_stop_handler,
    sys::{stdin_is_tty, ClientSocket, RawStdin},
    Session,
};

/// Lowest port a user may point the client at.
const PORT_MIN: i32 = 1024;
const PORT_MAX: i32 = 65535;

/// Connect to a chat server and exchange messages with the other users.
///
/// Type `bye` to leave.
#[derive(Debug, Parser)]
#[command(name = "chat-client")]
pub struct Args {
    /// IPv4 address of the server, e.g. 127.0.0.1
    #[arg(value_name = "server IP", value_parser = parse_ip)]
    pub server_ip: Ipv4Addr,

    /// Port the server listens on
    #[arg(value_name = "port", value_parser = parse_port)]
    pub port: u16,
}

fn parse_ip(input: &str) -> Result<Ipv4Addr, String> {
    input
        .parse()
        .map_err(|_| format!("Invalid IP address '{}'.", input))
}

/// Parse `input` as a 32-bit integer, rejecting anything but an optional
/// minus sign followed by digits.
///
/// `usage` names the value in error messages.
fn parse_int(input: &str, usage: &str) -> Result<i32, String> {
    let re_int = Regex::new(r"^-?[0-9]+$").map_err(|e| e.to_string())?;
    if !re_int.is_match(input) {
        return Err(format!(
            "Invalid input '{}' received for {}.",
            input, usage
        ));
    }

    input.parse::<i32>().map_err(|e| match e.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
            format!("Integer overflow for {}.", usage)
        }
        _ => format!("Invalid input '{}' received for {}.", input, usage),
    })
}

fn parse_port(input: &str) -> Result<u16, String> {
    let port = parse_int(input, "port number")?;
    if port < PORT_MIN || port > PORT_MAX {
        return Err(format!(
            "Port must be in range [{}, {}].",
            PORT_MIN, PORT_MAX
        ));
    }
    Ok(port as u16)
}

/// Drives one run of the client: username entry, connection, handshake and
/// the chat session, all on the process's standard streams.
pub struct ChatClient {
    addr: SocketAddrV4,
    interactive: bool,
}

impl ChatClient {
    pub fn new(args: &Args) -> Self {
        Self {
            addr: SocketAddrV4::new(args.server_ip, args.port),
            interactive: stdin_is_tty(),
        }
    }

    /// Run the client. Returns whether it finished successfully.
    ///
    /// Input ending before a username is chosen is not an error, but it is
    /// not a success either.
    pub fn run(&self) -> ChatResult<bool> {
        let mut stdin = RawStdin;
        let mut stdout = io::stdout();

        let username =
            match prompt_username(&mut stdin, &mut stdout, self.interactive)? {
                Some(name) => name,
                None => return Ok(false),
            };
        println!(
            "Hello, {}. Let's try to connect to the server.",
            String::from_utf8_lossy(&username)
        );

        let sock = ClientSocket::connect_to(self.addr)?;
        let mut session = Session::new(sock, username, stdin, stdout)?
            .interactive(self.interactive);
        session.handshake()?;

        let mut session = session.stop_signal(setup_stop_handler()?);
        let end = session.run()?;
        info!(?end, "session ended");
        session.close();

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_parse_ip_and_port() {
        let args = Args::try_parse_from(&["chat-client", "127.0.0.1", "8080"])
            .unwrap();
        assert_eq!(args.server_ip, Ipv4Addr::LOCALHOST);
        assert_eq!(args.port, 8080);
    }

    #[test]
    fn args_require_both_positionals() {
        assert!(Args::try_parse_from(&["chat-client", "127.0.0.1"]).is_err());
        assert!(
            Args::try_parse_from(&["chat-client", "127.0.0.1", "8080", "x"])
                .is_err()
        );
    }

    #[test]
    fn ip_must_be_ipv4_literal() {
        assert!(parse_ip("10.0.0.1").is_ok());
        assert_eq!(
            parse_ip("localhost").unwrap_err(),
            "Invalid IP address 'localhost'."
        );
        assert!(parse_ip("::1").is_err());
        assert!(parse_ip("256.0.0.1").is_err());
    }

    #[test]
    fn port_bounds_are_inclusive() {
        assert_eq!(parse_port("1024"), Ok(1024));
        assert_eq!(parse_port("65535"), Ok(65535));
        assert_eq!(
            parse_port("1023").unwrap_err(),
            "Port must be in range [1024, 65535]."
        );
        assert!(parse_port("65536").is_err());
        assert!(parse_port("-1").is_err());
    }

    #[test]
    fn port_must_be_a_clean_integer() {
        assert_eq!(
            parse_port("").unwrap_err(),
            "Invalid input '' received for port number."
        );
        assert!(parse_port("80a").is_err());
        assert!(parse_port(" 8080").is_err());
        assert!(parse_port("+8080").is_err());
        assert!(parse_port("-").is_err());
    }

    #[test]
    fn huge_port_is_overflow() {
        assert_eq!(
            parse_port("99999999999").unwrap_err(),
            "Integer overflow for port number."
        );
    }
}
