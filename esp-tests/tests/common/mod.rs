//! Gemeinsame Mocks für die Integration Tests
#![allow(dead_code)]

use esp_core::output::OUTPUT_CHANNEL_COUNT;
use esp_core::{PhaseStorage, PwmError, PwmWriter, StorageError};

// ============================================================================
// Mock PWM Writer
// ============================================================================

/// Zeichnet den letzten Duty-Wert jedes physischen Kanals auf
pub struct MockPwmWriter {
    pub duty: [u16; OUTPUT_CHANNEL_COUNT as usize],
    pub write_count: usize,
    pub fail_next_write: bool,
}

impl MockPwmWriter {
    pub fn new() -> Self {
        Self {
            duty: [u16::MAX; OUTPUT_CHANNEL_COUNT as usize],
            write_count: 0,
            fail_next_write: false,
        }
    }
}

impl PwmWriter for MockPwmWriter {
    const MAX_DUTY: u16 = 4095;

    fn set_duty(&mut self, channel: u8, duty: u16) -> Result<(), PwmError> {
        if self.fail_next_write {
            self.fail_next_write = false;
            return Err(PwmError::WriteFailed);
        }

        match self.duty.get_mut(channel as usize) {
            Some(slot) => {
                *slot = duty;
                self.write_count += 1;
                Ok(())
            }
            None => Err(PwmError::WriteFailed),
        }
    }
}

// ============================================================================
// Mock Storage
// ============================================================================

/// In-Memory Speicher für die Phasen-Tabelle
#[derive(Default)]
pub struct MemoryStorage {
    pub data: Option<Vec<u8>>,
    pub write_count: usize,
    pub fail_read: bool,
    pub fail_write: bool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(data: &[u8]) -> Self {
        Self {
            data: Some(data.to_vec()),
            ..Self::default()
        }
    }
}

impl PhaseStorage for MemoryStorage {
    fn read(&mut self, buf: &mut [u8]) -> Result<bool, StorageError> {
        if self.fail_read {
            return Err(StorageError::ReadFailed);
        }

        match &self.data {
            Some(data) => {
                let len = buf.len().min(data.len());
                buf[..len].copy_from_slice(&data[..len]);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn write(&mut self, data: &[u8]) -> Result<(), StorageError> {
        if self.fail_write {
            return Err(StorageError::WriteFailed);
        }

        self.data = Some(data.to_vec());
        self.write_count += 1;
        Ok(())
    }
}
