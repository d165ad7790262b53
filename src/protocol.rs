//! Control plane text protocol.
//!
//! Line framed (LF), ASCII, case-sensitive:
//! - Server greets with: `HELLO\n`
//! - Client sends: `start\n`, `stop\n` or `bye\n`
//! - Server answers each with exactly one line: `OK\n` or
//!   `Unknown command: <cmd>.\n`
//!
//! Whitespace around a command is trimmed before matching.

use crate::error::{Error, Result};
use bytes::BytesMut;

/// Greeting sent by the server on accept, without terminator
pub const HELLO: &str = "HELLO";

/// Positive acknowledgement, without terminator
pub const OK: &str = "OK";

/// Parsed control command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Spawn an emitter
    Start,
    /// Cancel every emitter of the session
    Stop,
    /// Acknowledge and close the session
    Bye,
    /// Anything else, trimmed
    Unknown(String),
}

impl Command {
    /// Parse one line read from the control channel.
    pub fn parse(line: &str) -> Command {
        match line.trim() {
            "start" => Command::Start,
            "stop" => Command::Stop,
            "bye" => Command::Bye,
            other => Command::Unknown(other.to_string()),
        }
    }

    /// Command text without terminator.
    pub fn as_str(&self) -> &str {
        match self {
            Command::Start => "start",
            Command::Stop => "stop",
            Command::Bye => "bye",
            Command::Unknown(cmd) => cmd,
        }
    }

    /// Wire form, including the terminator.
    pub fn request(&self) -> BytesMut {
        let cmd = self.as_str();
        let mut request = BytesMut::with_capacity(cmd.len() + 1);
        request.extend_from_slice(cmd.as_bytes());
        request.extend_from_slice(b"\n");
        request
    }
}

/// Server reply generator
pub struct Response;

impl Response {
    /// Generate greeting
    pub fn hello() -> &'static [u8] {
        b"HELLO\n"
    }

    /// Generate OK response
    pub fn ok() -> &'static [u8] {
        b"OK\n"
    }

    /// Generate the reply to an unrecognised command
    pub fn unknown(cmd: &str) -> BytesMut {
        let mut response = BytesMut::with_capacity(cmd.len() + 19);
        response.extend_from_slice(b"Unknown command: ");
        response.extend_from_slice(cmd.as_bytes());
        response.extend_from_slice(b".\n");
        response
    }
}

/// Check a line received from the server against the expected token.
pub fn expect_line(line: &str, expected: &'static str) -> Result<()> {
    let actual = line.trim();
    if actual == expected {
        Ok(())
    } else {
        Err(Error::Protocol {
            expected,
            actual: actual.to_string(),
        })
    }
}

/// Control plane session state.
///
/// ```text
///            start            start / stop
/// GREETED ---------> STREAMING <-----+
///   |  ^ stop            |     ------+
///   |  +--+              |
///   | bye                | bye
///   +------> CLOSED <----+
/// ```
///
/// Unknown commands never change the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Greeted,
    Streaming,
    Closed,
}

impl SessionState {
    /// State after handling `cmd`.
    pub fn next(self, cmd: &Command) -> SessionState {
        match (self, cmd) {
            (SessionState::Closed, _) => SessionState::Closed,
            (_, Command::Bye) => SessionState::Closed,
            (_, Command::Start) => SessionState::Streaming,
            (state, Command::Stop) | (state, Command::Unknown(_)) => state,
        }
    }

    pub fn is_closed(self) -> bool {
        self == SessionState::Closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("start\n"), Command::Start);
        assert_eq!(Command::parse("stop\n"), Command::Stop);
        assert_eq!(Command::parse("bye\n"), Command::Bye);
    }

    #[test]
    fn test_parse_trims_whitespace() {
        assert_eq!(Command::parse("  start \r\n"), Command::Start);
        assert_eq!(Command::parse("\tbye"), Command::Bye);
    }

    #[test]
    fn test_parse_is_case_sensitive() {
        assert_eq!(
            Command::parse("START\n"),
            Command::Unknown("START".to_string())
        );
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(Command::parse("foo\n"), Command::Unknown("foo".to_string()));
        assert_eq!(Command::parse("\n"), Command::Unknown(String::new()));
    }

    #[test]
    fn test_request_lines() {
        assert_eq!(&Command::Start.request()[..], b"start\n");
        assert_eq!(&Command::Stop.request()[..], b"stop\n");
        assert_eq!(&Command::Bye.request()[..], b"bye\n");
        assert_eq!(&Command::Unknown("foo".into()).request()[..], b"foo\n");
    }

    #[test]
    fn test_response_unknown() {
        assert_eq!(&Response::unknown("foo")[..], b"Unknown command: foo.\n");
    }

    #[test]
    fn test_expect_line() {
        assert!(expect_line("HELLO\n", HELLO).is_ok());
        assert!(expect_line(" OK \r\n", OK).is_ok());

        match expect_line("NOPE\n", OK) {
            Err(Error::Protocol { expected, actual }) => {
                assert_eq!(expected, "OK");
                assert_eq!(actual, "NOPE");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_state_table() {
        use SessionState::*;

        let unknown = Command::Unknown("foo".to_string());
        let cases = [
            (Greeted, Command::Start, Streaming),
            (Greeted, Command::Stop, Greeted),
            (Greeted, Command::Bye, Closed),
            (Greeted, unknown.clone(), Greeted),
            (Streaming, Command::Start, Streaming),
            (Streaming, Command::Stop, Streaming),
            (Streaming, Command::Bye, Closed),
            (Streaming, unknown.clone(), Streaming),
            (Closed, Command::Start, Closed),
        ];

        for (from, cmd, to) in cases {
            assert_eq!(from.next(&cmd), to, "{:?} + {:?}", from, cmd);
        }
    }

    #[test]
    fn test_stop_then_start_streams_again() {
        let state = SessionState::Greeted
            .next(&Command::Start)
            .next(&Command::Stop)
            .next(&Command::Start);
        assert_eq!(state, SessionState::Streaming);
        assert!(state.next(&Command::Bye).is_closed());
    }
}
