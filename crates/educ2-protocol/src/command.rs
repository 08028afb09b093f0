//! Parsing authenticated input lines into commands.

use std::fmt;

use crate::ProtocolError;

/// Duration shown when `attack` is given no fourth argument.
pub const DEFAULT_DURATION: &str = "30";

/// A validated `attack` request.
///
/// `port` and `duration` are kept as typed: both are only ever displayed.
/// The port is never dialled and the duration has no effect on how long
/// the simulation runs, so neither is checked for being a number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttackRequest {
    pub method: String,
    pub target: String,
    pub port: String,
    pub duration: String,
}

impl AttackRequest {
    /// Builds a request from the arguments following `attack`.
    ///
    /// Expects `method target port [duration]`; anything after the
    /// duration is ignored.
    ///
    /// # Errors
    /// [`ProtocolError::InvalidAttackArguments`] if fewer than three
    /// arguments are given.
    pub fn from_args(args: &[&str]) -> Result<Self, ProtocolError> {
        let [method, target, port, rest @ ..] = args else {
            return Err(ProtocolError::InvalidAttackArguments(format!(
                "expected at least 3 arguments, got {}",
                args.len()
            )));
        };

        Ok(Self {
            method: (*method).to_string(),
            target: (*target).to_string(),
            port: (*port).to_string(),
            duration: rest.first().unwrap_or(&DEFAULT_DURATION).to_string(),
        })
    }
}

impl fmt::Display for AttackRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}:{} ({}s)",
            self.method, self.target, self.port, self.duration
        )
    }
}

/// A command an authenticated client can issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Methods,
    MyInfo,
    Attack(AttackRequest),
    Stats,
    Clear,
    /// `exit` or `quit`.
    Exit,
}

impl Command {
    /// Parses one input line.
    ///
    /// The line is trimmed and split on whitespace. Only the first token
    /// is matched, case-insensitively; arguments are passed through as
    /// typed. Returns `Ok(None)` for a blank line.
    ///
    /// # Errors
    /// - [`ProtocolError::UnknownCommand`] for an unrecognized token
    /// - [`ProtocolError::InvalidAttackArguments`] for a malformed `attack`
    pub fn parse(line: &str) -> Result<Option<Self>, ProtocolError> {
        let mut tokens = line.split_whitespace();
        let Some(name) = tokens.next() else {
            return Ok(None);
        };
        let args: Vec<&str> = tokens.collect();

        let command = match name.to_ascii_lowercase().as_str() {
            "help" => Self::Help,
            "methods" => Self::Methods,
            "myinfo" => Self::MyInfo,
            "attack" => Self::Attack(AttackRequest::from_args(&args)?),
            "stats" => Self::Stats,
            "clear" => Self::Clear,
            "exit" | "quit" => Self::Exit,
            _ => return Err(ProtocolError::UnknownCommand(name.to_string())),
        };
        Ok(Some(command))
    }

    /// The canonical lowercase name, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Help => "help",
            Self::Methods => "methods",
            Self::MyInfo => "myinfo",
            Self::Attack(_) => "attack",
            Self::Stats => "stats",
            Self::Clear => "clear",
            Self::Exit => "exit",
        }
    }

    /// Whether handling this command ends the session.
    pub fn terminates_session(&self) -> bool {
        matches!(self, Self::Exit)
    }
}
