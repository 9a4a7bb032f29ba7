// PCA9685 PWM Writer
//
// 16-Kanal, 12-Bit PWM-Controller über I2C.
// Kanäle 0-2: RGB-Paar 0, 3-5: RGB-Paar 1, 6-10: Hilfskanäle.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use esp_core::{PwmError, PwmWriter};

// Register
const MODE1: u8 = 0x00;
const MODE2: u8 = 0x01;
const LED0_ON_L: u8 = 0x06;
const PRE_SCALE: u8 = 0xFE;

// MODE1 Bits
const MODE1_RESTART: u8 = 0x80;
const MODE1_AUTO_INCREMENT: u8 = 0x20;
const MODE1_SLEEP: u8 = 0x10;

// MODE2: Totem-Pole Ausgänge
const MODE2_OUTDRV: u8 = 0x04;

/// Interner Oszillator
const OSCILLATOR_HZ: u32 = 25_000_000;

/// Bit 12 in LEDn_ON_H / LEDn_OFF_H schaltet den Kanal voll an bzw. aus
const FULL_SWITCH: u16 = 0x1000;

/// Berechnet den Prescaler: `round(25 MHz / (4096 * f)) - 1`
///
/// Der Baustein akzeptiert nur Werte von 3 bis 255.
pub const fn prescale_for(frequency_hz: u32) -> u8 {
    let divisor = 4096 * frequency_hz;
    let rounded = (OSCILLATOR_HZ + divisor / 2) / divisor;
    let prescale = rounded.saturating_sub(1);

    if prescale < 3 {
        3
    } else if prescale > 255 {
        255
    } else {
        prescale as u8
    }
}

/// Real Hardware PWM Writer
///
/// Generisch über `embedded_hal::i2c::I2c`, damit der Treiber sowohl
/// mit dem esp-hal I2C-Master als auch mit einem Test-Bus läuft.
pub struct Pca9685Writer<I> {
    i2c: I,
    address: u8,
}

impl<I: I2c> Pca9685Writer<I> {
    /// Erstellt den Writer ohne den Baustein anzufassen
    pub fn new(i2c: I, address: u8) -> Self {
        Self { i2c, address }
    }

    /// Initialisiert den Baustein
    ///
    /// Restart, Prescaler setzen (nur im Sleep-Modus möglich),
    /// danach Oszillator wieder starten und Auto-Increment aktivieren.
    pub fn init<D: DelayNs>(&mut self, delay: &mut D, frequency_hz: u32) -> Result<(), PwmError> {
        self.write_register(MODE1, MODE1_RESTART)?;
        delay.delay_ms(10);

        let old_mode = self.read_register(MODE1)?;
        let sleep_mode = (old_mode & !MODE1_RESTART) | MODE1_SLEEP;

        self.write_register(MODE1, sleep_mode)?;
        self.write_register(PRE_SCALE, prescale_for(frequency_hz))?;
        self.write_register(MODE1, old_mode)?;
        delay.delay_ms(5);

        self.write_register(MODE1, old_mode | MODE1_RESTART | MODE1_AUTO_INCREMENT)?;
        self.write_register(MODE2, MODE2_OUTDRV)
    }

    fn write_register(&mut self, register: u8, value: u8) -> Result<(), PwmError> {
        self.i2c
            .write(self.address, &[register, value])
            .map_err(|_| PwmError::WriteFailed)
    }

    fn read_register(&mut self, register: u8) -> Result<u8, PwmError> {
        let mut value = [0u8; 1];
        self.i2c
            .write_read(self.address, &[register], &mut value)
            .map_err(|_| PwmError::WriteFailed)?;
        Ok(value[0])
    }
}

impl<I: I2c> PwmWriter for Pca9685Writer<I> {
    const MAX_DUTY: u16 = 4095;

    fn set_duty(&mut self, channel: u8, duty: u16) -> Result<(), PwmError> {
        if channel > 15 {
            return Err(PwmError::WriteFailed);
        }

        // 0 und 4095 über die Full-Bits, damit die Endpunkte exakt sind
        let (on, off) = match duty {
            0 => (0, FULL_SWITCH),
            d if d >= Self::MAX_DUTY => (FULL_SWITCH, 0),
            d => (0, d),
        };

        let [on_l, on_h] = on.to_le_bytes();
        let [off_l, off_h] = off.to_le_bytes();
        let frame = [LED0_ON_L + 4 * channel, on_l, on_h, off_l, off_h];

        self.i2c
            .write(self.address, &frame)
            .map_err(|_| PwmError::WriteFailed)
    }
}

// ============================================================================
// Tests
// ============================================================================
