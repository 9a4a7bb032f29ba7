//! Integration Tests für Command-Parser und Zeilen-Puffer
//!
//! Diese Tests laufen auf dem Host (x86_64)

mod common;

use common::{MemoryStorage, MockPwmWriter};
use esp_core::command::CONFIG_FIELD_COUNT;
use esp_core::{
    Command, CommandError, Controller, LineAssembler, Outcome, PhaseSettings, StorageError,
};
use rgb::RGB8;

// ============================================================================
// Tests: Command::parse
// ============================================================================

#[test]
fn test_parse_fase() {
    assert_eq!(Command::parse("FASE,0"), Ok(Command::ApplyPhase(0)));
    assert_eq!(Command::parse("FASE, 4 "), Ok(Command::ApplyPhase(4)));
}

#[test]
fn test_parse_fase_out_of_range_still_parses() {
    // Der Bereich 0..4 wird erst beim Ausführen geprüft
    assert_eq!(Command::parse("FASE,9"), Ok(Command::ApplyPhase(9)));
    assert_eq!(Command::parse("FASE,300"), Err(CommandError::OutOfRange));
}

#[test]
fn test_parse_transicion() {
    assert_eq!(
        Command::parse("TRANSICION,1,3,4000"),
        Ok(Command::StartTransition {
            from: 1,
            to: 3,
            duration_ms: 4000
        })
    );
}

#[test]
fn test_parse_config_fase() {
    let command = Command::parse("CONFIG_FASE,2,10,20,30,40,50,60,1,2,3,4,5,9000,3000");
    assert_eq!(
        command,
        Ok(Command::ConfigurePhase {
            index: 2,
            settings: PhaseSettings {
                rgb: [RGB8 { r: 10, g: 20, b: 30 }, RGB8 { r: 40, g: 50, b: 60 }],
                auxiliary: [1, 2, 3, 4, 5],
                hold_ms: 9000,
                cross_fade_ms: 3000,
            },
        })
    );
}

#[test]
fn test_parse_config_fase_wrong_field_count() {
    let error = Command::parse("CONFIG_FASE,2,10,20,30,40,50,60,1,2,3").unwrap_err();
    assert_eq!(
        error,
        CommandError::WrongFieldCount {
            expected: CONFIG_FIELD_COUNT,
            found: 10
        }
    );
    assert_eq!(error.notice(), Some("Error: wrong number of parameters"));

    let error = Command::parse("CONFIG_FASE,2,1,1,1,1,1,1,1,1,1,1,1,1,1,1").unwrap_err();
    assert_eq!(
        error,
        CommandError::WrongFieldCount {
            expected: CONFIG_FIELD_COUNT,
            found: 15
        }
    );
}

#[test]
fn test_parse_config_fase_rejects_byte_overflow() {
    let error = Command::parse("CONFIG_FASE,2,256,0,0,0,0,0,0,0,0,0,0,0,0").unwrap_err();
    assert_eq!(error, CommandError::InvalidNumber);
    assert_eq!(error.notice(), Some("Error: invalid number"));
}

#[test]
fn test_parse_play_and_stop_with_trailing_comma() {
    assert_eq!(Command::parse("PLAY,"), Ok(Command::StartSequence));
    assert_eq!(Command::parse("STOP"), Ok(Command::StopSequence));
}

#[test]
fn test_unknown_keyword_is_silent() {
    let error = Command::parse("BRILLO,10").unwrap_err();
    assert_eq!(error, CommandError::UnknownKeyword);
    assert_eq!(error.notice(), None);
    assert_eq!(Command::parse("   "), Err(CommandError::Empty));
}

#[test]
fn test_non_numeric_field() {
    let error = Command::parse("TRANSICION,1,x,100").unwrap_err();
    assert_eq!(error, CommandError::InvalidNumber);
}

// ============================================================================
// Tests: Antworten
// ============================================================================

#[test]
fn test_reply_after_config_fase() {
    let mut controller = Controller::new(MockPwmWriter::new(), MemoryStorage::new());
    let command = Command::parse("CONFIG_FASE,1,1,1,1,1,1,1,1,1,1,1,1,1,1").unwrap();

    let result = controller.handle(command, 0);
    assert_eq!(
        command.reply(result).as_deref(),
        Some("Phase configured and saved")
    );
}

#[test]
fn test_reply_when_save_fails() {
    let command = Command::parse("CONFIG_FASE,1,1,1,1,1,1,1,1,1,1,1,1,1,1").unwrap();
    assert_eq!(
        command.reply(Err(StorageError::WriteFailed)).as_deref(),
        Some("Error: configuration not saved")
    );
}

#[test]
fn test_no_reply_for_ignored_command() {
    let mut controller = Controller::new(MockPwmWriter::new(), MemoryStorage::new());
    let command = Command::parse("TRANSICION,0,5,100").unwrap();

    let result = controller.handle(command, 0);
    assert_eq!(result, Ok(Outcome::Ignored));
    assert_eq!(command.reply(result), None);
}

// ============================================================================
// Tests: LineAssembler → Command
// ============================================================================

#[test]
fn test_stream_of_bytes_yields_commands() {
    let mut assembler = LineAssembler::new();
    let mut commands = Vec::new();

    for byte in b"PLAY\r\n\r\nFASE,2\nSTOP\r" {
        if let Some(line) = assembler.push(*byte) {
            commands.push(Command::parse(&line));
        }
    }

    assert_eq!(
        commands,
        vec![
            Ok(Command::StartSequence),
            Ok(Command::ApplyPhase(2)),
            Ok(Command::StopSequence),
        ]
    );
}

#[test]
fn test_long_config_line_fits_in_buffer() {
    let mut assembler = LineAssembler::new();
    let text = "CONFIG_FASE,2,255,255,255,255,255,255,255,255,255,255,255,3600000,3600000\n";

    let mut parsed = None;
    for byte in text.bytes() {
        if let Some(line) = assembler.push(byte) {
            parsed = Some(Command::parse(&line));
        }
    }

    match parsed {
        Some(Ok(Command::ConfigurePhase { index, settings })) => {
            assert_eq!(index, 2);
            assert_eq!(settings.hold_ms, 3_600_000);
        }
        other => panic!("Expected ConfigurePhase, got {:?}", other),
    }
}
