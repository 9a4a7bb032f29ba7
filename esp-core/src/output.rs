//! Output Driver
//!
//! Setzt 8-Bit-Kanalwerte auf einen PWM-Baustein um und hält den
//! `ChannelState` aktuell.

use rgb::RGB8;

use crate::logic::scale_to_duty;
use crate::traits::PwmWriter;
use crate::types::{AUX_CHANNEL_COUNT, ChannelState, Outcome, PhaseConfig, RGB_CHANNEL_COUNT};

/// Physische Kanäle 0, 1, 2 für RGB1
pub const RGB1_BASE_CHANNEL: u8 = 0;

/// Physische Kanäle 3, 4, 5 für RGB2
pub const RGB2_BASE_CHANNEL: u8 = 3;

/// Physische Kanäle 6..10 für die Auxiliary-Ausgänge
pub const AUX_BASE_CHANNEL: u8 = 6;

/// 6 RGB-Kanäle + 5 Auxiliary-Kanäle
pub const OUTPUT_CHANNEL_COUNT: u8 = 11;

/// Treiber für alle RGB- und Auxiliary-Ausgänge
///
/// Ungültige Kanal-Indizes werden still ignoriert. Schreibfehler des
/// Bausteins brechen nichts ab, werden aber in `failed_writes` gezählt.
pub struct OutputDriver<W> {
    writer: W,
    state: ChannelState,
    failed_writes: u32,
}

impl<W: PwmWriter> OutputDriver<W> {
    /// Erstellt den Treiber und setzt alle physischen Kanäle auf 0
    pub fn new(writer: W) -> Self {
        let mut driver = Self {
            writer,
            state: ChannelState::default(),
            failed_writes: 0,
        };

        for channel in 0..OUTPUT_CHANNEL_COUNT {
            driver.commit(channel, 0);
        }

        driver
    }

    /// Setzt ein RGB-Kanalpaar (0 oder 1)
    pub fn set_color(&mut self, pair: usize, color: RGB8) -> Outcome {
        if pair >= RGB_CHANNEL_COUNT {
            return Outcome::Ignored;
        }

        self.state.rgb[pair] = color;

        let base = if pair == 0 {
            RGB1_BASE_CHANNEL
        } else {
            RGB2_BASE_CHANNEL
        };
        self.commit(base, color.r);
        self.commit(base + 1, color.g);
        self.commit(base + 2, color.b);

        Outcome::Applied
    }

    /// Setzt einen Auxiliary-Kanal (0..4)
    pub fn set_auxiliary(&mut self, index: usize, value: u8) -> Outcome {
        if index >= AUX_CHANNEL_COUNT {
            return Outcome::Ignored;
        }

        self.state.auxiliary[index] = value;
        self.commit(AUX_BASE_CHANNEL + index as u8, value);

        Outcome::Applied
    }

    /// Schreibt alle Ausgänge einer Phase ohne Interpolation
    pub fn apply_frame(&mut self, config: &PhaseConfig) {
        for (pair, color) in config.rgb.iter().enumerate() {
            self.set_color(pair, *color);
        }
        for (index, value) in config.auxiliary.iter().enumerate() {
            self.set_auxiliary(index, *value);
        }
    }

    pub fn state(&self) -> &ChannelState {
        &self.state
    }

    pub(crate) fn set_current_phase(&mut self, phase: u8) {
        self.state.current_phase = phase;
    }

    /// Anzahl fehlgeschlagener Schreibzugriffe seit dem Start
    pub fn failed_writes(&self) -> u32 {
        self.failed_writes
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    pub fn writer_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    fn commit(&mut self, channel: u8, value: u8) {
        let duty = scale_to_duty(value, W::MAX_DUTY);
        if self.writer.set_duty(channel, duty).is_err() {
            self.failed_writes = self.failed_writes.wrapping_add(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::PwmError;
    use crate::types::rgb;

    struct RecordingWriter {
        duty: [u16; OUTPUT_CHANNEL_COUNT as usize],
        writes: usize,
        fail: bool,
    }

    impl RecordingWriter {
        fn new() -> Self {
            Self {
                duty: [u16::MAX; OUTPUT_CHANNEL_COUNT as usize],
                writes: 0,
                fail: false,
            }
        }
    }

    impl PwmWriter for RecordingWriter {
        const MAX_DUTY: u16 = 4095;

        fn set_duty(&mut self, channel: u8, duty: u16) -> Result<(), PwmError> {
            if self.fail {
                return Err(PwmError::WriteFailed);
            }
            self.duty[channel as usize] = duty;
            self.writes += 1;
            Ok(())
        }
    }

    #[test]
    fn test_new_zeroes_every_channel() {
        let driver = OutputDriver::new(RecordingWriter::new());
        assert_eq!(driver.writer().duty, [0; OUTPUT_CHANNEL_COUNT as usize]);
        assert_eq!(driver.writer().writes, OUTPUT_CHANNEL_COUNT as usize);
    }

    #[test]
    fn test_set_color_second_pair_uses_channels_3_to_5() {
        let mut driver = OutputDriver::new(RecordingWriter::new());
        assert_eq!(driver.set_color(1, rgb(255, 0, 51)), Outcome::Applied);
        assert_eq!(driver.writer().duty[3..6], [4095, 0, 819]);
        assert_eq!(driver.state().rgb[1], rgb(255, 0, 51));
    }

    #[test]
    fn test_set_auxiliary_out_of_range_is_ignored() {
        let mut driver = OutputDriver::new(RecordingWriter::new());
        let writes = driver.writer().writes;
        assert_eq!(driver.set_auxiliary(5, 200), Outcome::Ignored);
        assert_eq!(driver.set_color(2, rgb(1, 1, 1)), Outcome::Ignored);
        assert_eq!(driver.writer().writes, writes);
        assert_eq!(*driver.state(), ChannelState::default());
    }

    #[test]
    fn test_failed_writes_are_counted() {
        let mut writer = RecordingWriter::new();
        writer.fail = true;
        let mut driver = OutputDriver::new(writer);
        assert_eq!(driver.failed_writes(), OUTPUT_CHANNEL_COUNT as u32);

        driver.set_auxiliary(0, 10);
        assert_eq!(driver.failed_writes(), OUTPUT_CHANNEL_COUNT as u32 + 1);
        assert_eq!(driver.state().auxiliary[0], 10);
    }
}
