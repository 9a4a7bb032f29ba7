//! Zeilen-Puffer für die Funkverbindung
//!
//! Sammelt eingehende Bytes bis `\n` oder `\r`. Leere Zeilen werden
//! übersprungen, Zeichen jenseits von `MAX_COMMAND_LENGTH - 1` verworfen.

use crate::command::MAX_COMMAND_LENGTH;

/// Eine vollständige Kommandozeile
pub type CommandLine = heapless::String<MAX_COMMAND_LENGTH>;

#[derive(Debug, Default)]
pub struct LineAssembler {
    buffer: heapless::Vec<u8, MAX_COMMAND_LENGTH>,
}

impl LineAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Nimmt ein Byte an und liefert eine Zeile, sobald sie abgeschlossen ist
    ///
    /// Zeilen mit ungültigem UTF-8 werden verworfen.
    pub fn push(&mut self, byte: u8) -> Option<CommandLine> {
        match byte {
            b'\n' | b'\r' => {
                if self.buffer.is_empty() {
                    return None;
                }
                let line = core::str::from_utf8(&self.buffer)
                    .ok()
                    .and_then(|text| CommandLine::try_from(text).ok());
                self.buffer.clear();
                line
            }
            _ => {
                if self.buffer.len() < MAX_COMMAND_LENGTH - 1 {
                    let _ = self.buffer.push(byte);
                }
                None
            }
        }
    }

    /// Anzahl der gepufferten Bytes der angefangenen Zeile
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(assembler: &mut LineAssembler, bytes: &[u8]) -> Option<CommandLine> {
        let mut last = None;
        for byte in bytes {
            if let Some(line) = assembler.push(*byte) {
                last = Some(line);
            }
        }
        last
    }

    #[test]
    fn test_line_completes_on_newline() {
        let mut assembler = LineAssembler::new();
        assert!(feed(&mut assembler, b"FASE,2").is_none());
        let line = feed(&mut assembler, b"\n").unwrap();
        assert_eq!(line.as_str(), "FASE,2");
        assert_eq!(assembler.pending(), 0);
    }

    #[test]
    fn test_crlf_yields_one_line() {
        let mut assembler = LineAssembler::new();
        let mut lines = 0;
        for byte in b"PLAY\r\nSTOP\r\n" {
            if assembler.push(*byte).is_some() {
                lines += 1;
            }
        }
        assert_eq!(lines, 2);
    }

    #[test]
    fn test_overlong_line_is_truncated() {
        let mut assembler = LineAssembler::new();
        for _ in 0..200 {
            assert!(assembler.push(b'9').is_none());
        }
        let line = assembler.push(b'\n').unwrap();
        assert_eq!(line.len(), MAX_COMMAND_LENGTH - 1);
        assert!(line.bytes().all(|byte| byte == b'9'));

        // Der Rest der zu langen Zeile darf die nächste nicht verfälschen
        assert_eq!(assembler.pending(), 0);
        let next = feed(&mut assembler, b"PLAY\n").unwrap();
        assert_eq!(next.as_str(), "PLAY");
    }
}
