//! Command Parser
//!
//! Übersetzt eine Textzeile der Funkverbindung in ein `Command`.
//!
//! | Zeile | Wirkung |
//! |---|---|
//! | `FASE,<phase>` | Phase sofort setzen |
//! | `TRANSICION,<von>,<nach>,<ms>` | Überblendung starten |
//! | `CONFIG_FASE,<phase>,r1,g1,b1,r2,g2,b2,a0..a4,<halten_ms>,<blende_ms>` | Slot ersetzen und speichern |
//! | `PLAY` | Sequenz starten |
//! | `STOP` | Sequenz anhalten |
//!
//! Schlüsselwörter sind case-sensitive, Felder durch Kommas getrennt.

use core::fmt::Write;

use crate::traits::StorageError;
use crate::types::{AUX_CHANNEL_COUNT, Outcome, PhaseSettings, rgb};

/// Maximale Zeilenlänge inklusive Terminator
pub const MAX_COMMAND_LENGTH: usize = 128;

/// Anzahl der Werte nach `CONFIG_FASE`
pub const CONFIG_FIELD_COUNT: usize = 14;

/// Kapazität einer Antwort an den Sender
pub const REPLY_CAPACITY: usize = 48;

/// Antworttext an den Sender
pub type Reply = heapless::String<REPLY_CAPACITY>;

/// Ein geparstes Kommando
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// `FASE`
    ApplyPhase(u8),
    /// `TRANSICION`
    StartTransition { from: u8, to: u8, duration_ms: u32 },
    /// `CONFIG_FASE`
    ConfigurePhase { index: u8, settings: PhaseSettings },
    /// `PLAY`
    StartSequence,
    /// `STOP`
    StopSequence,
}

/// Gründe, aus denen eine Zeile kein Kommando ergibt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandError {
    Empty,
    UnknownKeyword,
    MissingFields,
    WrongFieldCount { expected: usize, found: usize },
    InvalidNumber,
    OutOfRange,
}

impl CommandError {
    /// Hinweis an den Sender, falls dieser Fehler gemeldet wird
    ///
    /// Unbekannte Schlüsselwörter und ungültige Indizes bleiben still.
    pub fn notice(self) -> Option<&'static str> {
        match self {
            CommandError::WrongFieldCount { .. } => Some("Error: wrong number of parameters"),
            CommandError::InvalidNumber => Some("Error: invalid number"),
            CommandError::Empty
            | CommandError::UnknownKeyword
            | CommandError::MissingFields
            | CommandError::OutOfRange => None,
        }
    }
}

impl Command {
    /// Parst eine Zeile (ohne Zeilenende)
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let line = line.trim();
        if line.is_empty() {
            return Err(CommandError::Empty);
        }

        let mut fields = line.split(',').map(str::trim);
        let Some(keyword) = fields.next() else {
            return Err(CommandError::Empty);
        };

        match keyword {
            "FASE" => {
                let phase = parse_index(next_field(&mut fields)?)?;
                Ok(Command::ApplyPhase(phase))
            }
            "TRANSICION" => {
                let from = parse_index(next_field(&mut fields)?)?;
                let to = parse_index(next_field(&mut fields)?)?;
                let duration_ms = parse_duration(next_field(&mut fields)?)?;
                Ok(Command::StartTransition {
                    from,
                    to,
                    duration_ms,
                })
            }
            "CONFIG_FASE" => parse_config(fields),
            "PLAY" => Ok(Command::StartSequence),
            "STOP" => Ok(Command::StopSequence),
            _ => Err(CommandError::UnknownKeyword),
        }
    }

    /// Bestätigung für den Sender nach der Ausführung
    ///
    /// Verworfene Kommandos (`Outcome::Ignored`) bekommen keine Antwort.
    pub fn reply(&self, result: Result<Outcome, StorageError>) -> Option<Reply> {
        let mut reply = Reply::new();

        let written = match (self, result) {
            (_, Ok(Outcome::Ignored)) => return None,
            (Command::ConfigurePhase { .. }, Err(_)) => {
                reply.push_str("Error: configuration not saved")
            }
            (_, Err(_)) => return None,
            (Command::ApplyPhase(phase), Ok(Outcome::Applied)) => {
                return write!(reply, "Phase applied: {}", phase).ok().map(|_| reply);
            }
            (Command::StartTransition { .. }, Ok(Outcome::Applied)) => {
                reply.push_str("Transition started")
            }
            (Command::ConfigurePhase { .. }, Ok(Outcome::Applied)) => {
                reply.push_str("Phase configured and saved")
            }
            (Command::StartSequence, Ok(Outcome::Applied)) => reply.push_str("Sequence started"),
            (Command::StopSequence, Ok(Outcome::Applied)) => reply.push_str("Sequence stopped"),
        };

        written.ok().map(|_| reply)
    }
}

fn next_field<'a>(fields: &mut impl Iterator<Item = &'a str>) -> Result<&'a str, CommandError> {
    fields.next().ok_or(CommandError::MissingFields)
}

fn parse_number(field: &str) -> Result<i64, CommandError> {
    field.parse::<i64>().map_err(|_| CommandError::InvalidNumber)
}

/// Phasen-Index: alles außerhalb von `u8` wird still verworfen
fn parse_index(field: &str) -> Result<u8, CommandError> {
    u8::try_from(parse_number(field)?).map_err(|_| CommandError::OutOfRange)
}

fn parse_channel(field: &str) -> Result<u8, CommandError> {
    u8::try_from(parse_number(field)?).map_err(|_| CommandError::InvalidNumber)
}

fn parse_duration(field: &str) -> Result<u32, CommandError> {
    u32::try_from(parse_number(field)?).map_err(|_| CommandError::InvalidNumber)
}

fn parse_config<'a>(fields: impl Iterator<Item = &'a str>) -> Result<Command, CommandError> {
    let mut values: heapless::Vec<&str, CONFIG_FIELD_COUNT> = heapless::Vec::new();
    let mut found = 0;
    for field in fields {
        found += 1;
        // Überzählige Felder nur zählen
        let _ = values.push(field);
    }

    if found != CONFIG_FIELD_COUNT {
        return Err(CommandError::WrongFieldCount {
            expected: CONFIG_FIELD_COUNT,
            found,
        });
    }

    let index = parse_index(values[0])?;

    let mut bytes = [0u8; 6 + AUX_CHANNEL_COUNT];
    for (byte, field) in bytes.iter_mut().zip(&values[1..12]) {
        *byte = parse_channel(field)?;
    }

    let mut auxiliary = [0u8; AUX_CHANNEL_COUNT];
    auxiliary.copy_from_slice(&bytes[6..]);

    Ok(Command::ConfigurePhase {
        index,
        settings: PhaseSettings {
            rgb: [
                rgb(bytes[0], bytes[1], bytes[2]),
                rgb(bytes[3], bytes[4], bytes[5]),
            ],
            auxiliary,
            hold_ms: parse_duration(values[12])?,
            cross_fade_ms: parse_duration(values[13])?,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(Command::parse("PLAY"), Ok(Command::StartSequence));
        assert_eq!(Command::parse("STOP"), Ok(Command::StopSequence));
        assert_eq!(Command::parse("FASE,3"), Ok(Command::ApplyPhase(3)));
    }

    #[test]
    fn test_keyword_is_case_sensitive() {
        assert_eq!(Command::parse("play"), Err(CommandError::UnknownKeyword));
        assert_eq!(Command::parse("Fase,1"), Err(CommandError::UnknownKeyword));
    }

    #[test]
    fn test_negative_index_is_silent() {
        let error = Command::parse("FASE,-1").unwrap_err();
        assert_eq!(error, CommandError::OutOfRange);
        assert_eq!(error.notice(), None);
    }

    #[test]
    fn test_missing_fields_are_silent() {
        let error = Command::parse("TRANSICION,1,2").unwrap_err();
        assert_eq!(error, CommandError::MissingFields);
        assert_eq!(error.notice(), None);
    }

    #[test]
    fn test_reply_texts() {
        let reply = Command::ApplyPhase(2).reply(Ok(Outcome::Applied)).unwrap();
        assert_eq!(reply.as_str(), "Phase applied: 2");
        assert_eq!(Command::ApplyPhase(7).reply(Ok(Outcome::Ignored)), None);
        let reply = Command::StopSequence.reply(Ok(Outcome::Applied)).unwrap();
        assert_eq!(reply.as_str(), "Sequence stopped");
    }
}
