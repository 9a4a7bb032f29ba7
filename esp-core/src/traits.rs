//! Hardware Abstraction Traits
//!
//! Diese Traits definieren Schnittstellen für Hardware-Zugriff
//! ohne konkrete Implementierung.

/// Fehler-Typ für PWM-Operationen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PwmError {
    WriteFailed,
}

/// Trait für einen mehrkanaligen PWM-Baustein
///
/// # Implementierungen
/// - **Production:** Pca9685Writer (PCA9685 über I2C, 12 Bit)
/// - **Testing:** MockPwmWriter (in-memory Mock)
pub trait PwmWriter {
    /// Maximaler Duty-Wert in der nativen Auflösung des Bausteins
    const MAX_DUTY: u16;

    /// Setzt den Duty-Cycle eines physischen Kanals
    ///
    /// # Fehlerbehandlung
    /// Gibt `PwmError::WriteFailed` zurück wenn Hardware-Zugriff fehlschlägt
    fn set_duty(&mut self, channel: u8, duty: u16) -> Result<(), PwmError>;
}

/// Fehler-Typ für den nichtflüchtigen Speicher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StorageError {
    ReadFailed,
    WriteFailed,
}

/// Trait für den Speicherort der Phasen-Tabelle
///
/// Speichert genau einen Binär-Block fester Größe, ohne Header.
///
/// # Implementierungen
/// - **Production:** FlashPhaseStorage (esp-storage, fester Flash-Offset)
/// - **Testing:** MemoryStorage
pub trait PhaseStorage {
    /// Liest den gespeicherten Block in `buf`
    ///
    /// Gibt `Ok(false)` zurück wenn kein Block vorhanden ist.
    fn read(&mut self, buf: &mut [u8]) -> Result<bool, StorageError>;

    /// Überschreibt den gespeicherten Block vollständig
    fn write(&mut self, data: &[u8]) -> Result<(), StorageError>;
}
