//! Command definitions
//!
//! The closed allow-list of commands this client speaks, plus the wire
//! builders that turn a command and its arguments into request bytes.

use std::fmt;
use std::str::FromStr;

use crate::error::MemwireError;

/// Separates tokens on a command line
pub const SEPARATOR: &[u8] = b" ";

/// Terminates every command and data line
pub const TERMINATOR: &[u8] = b"\r\n";

/// Commands accepted by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Set,
    Add,
    Replace,
    Append,
    Prepend,
    Cas,
    Incr,
    Decr,
    Get,
    Gets,
    Delete,
    Touch,
    Version,
    Stats,
    FlushAll,
}

impl Command {
    /// Every allowed command
    pub const ALL: [Command; 15] = [
        Command::Set,
        Command::Add,
        Command::Replace,
        Command::Append,
        Command::Prepend,
        Command::Cas,
        Command::Incr,
        Command::Decr,
        Command::Get,
        Command::Gets,
        Command::Delete,
        Command::Touch,
        Command::Version,
        Command::Stats,
        Command::FlushAll,
    ];

    /// Command name as written on the wire
    pub fn name(self) -> &'static str {
        match self {
            Command::Set => "set",
            Command::Add => "add",
            Command::Replace => "replace",
            Command::Append => "append",
            Command::Prepend => "prepend",
            Command::Cas => "cas",
            Command::Incr => "incr",
            Command::Decr => "decr",
            Command::Get => "get",
            Command::Gets => "gets",
            Command::Delete => "delete",
            Command::Touch => "touch",
            Command::Version => "version",
            Command::Stats => "stats",
            Command::FlushAll => "flush_all",
        }
    }

    /// `get` / `gets`
    pub fn is_retrieval(self) -> bool {
        matches!(self, Command::Get | Command::Gets)
    }

    /// `set add replace append prepend cas`
    pub fn is_storage(self) -> bool {
        matches!(
            self,
            Command::Set
                | Command::Add
                | Command::Replace
                | Command::Append
                | Command::Prepend
                | Command::Cas
        )
    }

    /// `incr` / `decr`
    pub fn is_arithmetic(self) -> bool {
        matches!(self, Command::Incr | Command::Decr)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Command {
    type Err = MemwireError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Command::ALL
            .iter()
            .copied()
            .find(|command| command.name() == name)
            .ok_or_else(|| MemwireError::InvalidCommand(name.to_string()))
    }
}

// =============================================================================
// Wire Builders
// =============================================================================

/// Storage request: `<cmd> <key> <flags> <exptime> <bytes> [<cas>]\r\n<data>\r\n`
pub fn encode_storage(
    command: Command,
    key: &str,
    flags: u32,
    exptime: u32,
    data: &[u8],
    cas: Option<u64>,
) -> Vec<u8> {
    let mut line = format!("{} {} {} {} {}", command, key, flags, exptime, data.len());
    if let Some(token) = cas {
        line.push(' ');
        line.push_str(&token.to_string());
    }

    let mut message = Vec::with_capacity(line.len() + data.len() + 2 * TERMINATOR.len());
    message.extend_from_slice(line.as_bytes());
    message.extend_from_slice(TERMINATOR);
    message.extend_from_slice(data);
    message.extend_from_slice(TERMINATOR);
    message
}

/// Single command line: the command name followed by space separated arguments
pub fn encode_line<S: AsRef<str>>(command: Command, args: &[S]) -> Vec<u8> {
    let mut message = Vec::with_capacity(64);
    message.extend_from_slice(command.name().as_bytes());
    for arg in args {
        let arg = arg.as_ref();
        if arg.is_empty() {
            continue;
        }
        message.extend_from_slice(SEPARATOR);
        message.extend_from_slice(arg.as_bytes());
    }
    message.extend_from_slice(TERMINATOR);
    message
}
