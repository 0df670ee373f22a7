//! Line-oriented operator commands.
//!
//! Stands in for the windowing front-end: each line maps onto one controller
//! entry point.
//!
//! | Command | Effect |
//! |---------|--------|
//! | `down X Y` / `drag X Y` / `up X Y` | pointer events in pixel space |
//! | `key K` | key press (`w`, `d`, `p`, `Return`) |
//! | `open PATH` | load a map descriptor |
//! | `cancel` | cancelled file dialog |
//! | `reset` | publish the unknown pose |
//! | `pose X Y YAW` | inject a live metric pose on the pose topic |
//! | `status` | print controller state as JSON |
//! | `exit` | shut down |

#[cfg(test)]
#[path = "console_test.rs"]
mod console_test;

use std::path::PathBuf;
use std::str::FromStr;

use canvas::convert::Point;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command `{0}`")]
    Unknown(String),
    #[error("`{command}` is missing argument {name}")]
    MissingArgument { command: String, name: &'static str },
    #[error("`{command}`: `{value}` is not a number")]
    InvalidNumber { command: String, value: String },
    #[error("`{command}`: `{value}` is not a finite number")]
    NonFinite { command: String, value: String },
    #[error("`{command}` takes no more arguments, got `{extra}`")]
    TrailingArgument { command: String, extra: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Down(Point),
    Drag(Point),
    Up(Point),
    Key(String),
    Open(PathBuf),
    Cancel,
    Reset,
    Pose { x: f64, y: f64, yaw: f64 },
    Status,
    Exit,
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (name, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();
        let mut args = Args { command: name, words: rest.split_whitespace() };

        let command = match name {
            "" => return Err(CommandError::Empty),
            "down" => Self::Down(args.point()?),
            "drag" => Self::Drag(args.point()?),
            "up" => Self::Up(args.point()?),
            "key" => Self::Key(args.word("KEY")?.to_string()),
            // Paths may contain spaces; take the remainder verbatim.
            "open" if rest.is_empty() => {
                return Err(CommandError::MissingArgument { command: name.into(), name: "PATH" });
            }
            "open" => return Ok(Self::Open(PathBuf::from(rest))),
            "cancel" => Self::Cancel,
            "reset" => Self::Reset,
            "pose" => Self::Pose { x: args.number("X")?, y: args.number("Y")?, yaw: args.number("YAW")? },
            "status" => Self::Status,
            "exit" | "quit" => Self::Exit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        args.finish()?;
        Ok(command)
    }
}

struct Args<'a> {
    command: &'a str,
    words: std::str::SplitWhitespace<'a>,
}

impl<'a> Args<'a> {
    fn word(&mut self, name: &'static str) -> Result<&'a str, CommandError> {
        self.words.next().ok_or_else(|| CommandError::MissingArgument { command: self.command.into(), name })
    }

    fn number(&mut self, name: &'static str) -> Result<f64, CommandError> {
        let word = self.word(name)?;
        let value = word.to_string();
        match word.parse::<f64>() {
            Ok(number) if number.is_finite() => Ok(number),
            Ok(_) => Err(CommandError::NonFinite { command: self.command.into(), value }),
            Err(_) => Err(CommandError::InvalidNumber { command: self.command.into(), value }),
        }
    }

    fn point(&mut self) -> Result<Point, CommandError> {
        Ok(Point::new(self.number("X")?, self.number("Y")?))
    }

    fn finish(&mut self) -> Result<(), CommandError> {
        match self.words.next() {
            Some(extra) => {
                Err(CommandError::TrailingArgument { command: self.command.into(), extra: extra.to_string() })
            }
            None => Ok(()),
        }
    }
}
