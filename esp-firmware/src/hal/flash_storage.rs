// Flash-Speicher für die Phasen-Tabelle
//
// Legt den Block an einem festen Offset ab. Ein gelöschter Bereich
// (alle Bytes 0xFF) gilt als "nichts gespeichert".

use embedded_storage::{ReadStorage, Storage};
use esp_core::{PhaseStorage, StorageError};

/// Phasen-Speicher über `embedded-storage`
///
/// In der Firmware mit `esp_storage::FlashStorage`. `Storage::write`
/// übernimmt dort das Löschen des betroffenen Sektors.
pub struct FlashPhaseStorage<F> {
    flash: F,
    offset: u32,
}

impl<F> FlashPhaseStorage<F> {
    pub fn new(flash: F, offset: u32) -> Self {
        Self { flash, offset }
    }
}

impl<F: ReadStorage + Storage> PhaseStorage for FlashPhaseStorage<F> {
    fn read(&mut self, buf: &mut [u8]) -> Result<bool, StorageError> {
        self.flash
            .read(self.offset, buf)
            .map_err(|_| StorageError::ReadFailed)?;

        Ok(!is_erased(buf))
    }

    fn write(&mut self, data: &[u8]) -> Result<(), StorageError> {
        self.flash
            .write(self.offset, data)
            .map_err(|_| StorageError::WriteFailed)
    }
}

fn is_erased(bytes: &[u8]) -> bool {
    bytes.iter().all(|&b| b == 0xFF)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_erased_region() {
        assert!(is_erased(&[0xFF; 8]));
        assert!(!is_erased(&[0xFF, 0xFF, 0x00]));
    }
}
