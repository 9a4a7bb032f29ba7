//! Phase Store
//!
//! Hält die fünf Phasen-Slots und (de)serialisiert sie als Binär-Block
//! fester Größe für den nichtflüchtigen Speicher.
//!
//! # Layout eines Slots (24 Bytes, Little Endian)
//!
//! ```text
//! 0..6    rgb[0].r rgb[0].g rgb[0].b rgb[1].r rgb[1].g rgb[1].b
//! 6..11   auxiliary[0..5]
//! 11..13  relay[0..2] (0 / 1)
//! 13..16  Padding (0)
//! 16..20  hold_ms (u32)
//! 20..24  cross_fade_ms (u32)
//! ```
//!
//! Kein Header, keine Versionsnummer, keine Prüfsumme. Ändert sich das
//! Layout, werden alte Blöcke umgedeutet statt abgelehnt.

use crate::traits::{PhaseStorage, StorageError};
use crate::types::{
    AUX_CHANNEL_COUNT, Outcome, PHASE_COUNT, PhaseConfig, PhaseSettings, RELAY_COUNT, rgb,
};

/// Größe eines serialisierten Slots in Bytes
pub const PHASE_RECORD_SIZE: usize = 24;

/// Größe der gesamten serialisierten Tabelle in Bytes
pub const PHASE_TABLE_SIZE: usize = PHASE_COUNT * PHASE_RECORD_SIZE;

const AUX_OFFSET: usize = 6;
const RELAY_OFFSET: usize = AUX_OFFSET + AUX_CHANNEL_COUNT;
const HOLD_OFFSET: usize = 16;
const CROSS_FADE_OFFSET: usize = 20;

/// Werkseinstellungen: Aus, Morgendämmerung, Tag, Abend, Nacht
pub const DEFAULT_PHASES: [PhaseConfig; PHASE_COUNT] = [
    PhaseConfig::OFF,
    PhaseConfig {
        rgb: [rgb(255, 150, 50), rgb(200, 100, 50)],
        auxiliary: [50, 0, 0, 0, 0],
        ..PhaseConfig::OFF
    },
    PhaseConfig {
        rgb: [rgb(255, 255, 255), rgb(255, 255, 255)],
        auxiliary: [255, 255, 0, 0, 0],
        ..PhaseConfig::OFF
    },
    PhaseConfig {
        rgb: [rgb(255, 200, 150), rgb(255, 180, 120)],
        auxiliary: [150, 0, 0, 0, 0],
        ..PhaseConfig::OFF
    },
    PhaseConfig {
        rgb: [rgb(50, 50, 150), rgb(30, 30, 100)],
        auxiliary: [20, 0, 0, 0, 0],
        ..PhaseConfig::OFF
    },
];

/// Herkunft der Tabelle nach `PhaseStore::load`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LoadSource {
    Stored,
    Defaults,
}

/// Die fünf Phasen-Slots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseStore {
    phases: [PhaseConfig; PHASE_COUNT],
}

impl PhaseStore {
    /// Erstellt den Store mit den Werkseinstellungen
    pub fn new() -> Self {
        Self {
            phases: DEFAULT_PHASES,
        }
    }

    pub fn get(&self, index: u8) -> Option<&PhaseConfig> {
        self.phases.get(usize::from(index))
    }

    pub fn phases(&self) -> &[PhaseConfig; PHASE_COUNT] {
        &self.phases
    }

    /// Ersetzt einen Slot vollständig (Relais ausgenommen)
    pub fn configure(&mut self, index: u8, settings: &PhaseSettings) -> Outcome {
        match self.phases.get_mut(usize::from(index)) {
            Some(phase) => {
                phase.apply_settings(settings);
                Outcome::Applied
            }
            None => Outcome::Ignored,
        }
    }

    pub fn reset_to_defaults(&mut self) {
        self.phases = DEFAULT_PHASES;
    }

    /// Serialisiert alle Slots
    pub fn encode(&self) -> [u8; PHASE_TABLE_SIZE] {
        let mut bytes = [0u8; PHASE_TABLE_SIZE];
        for (phase, record) in self
            .phases
            .iter()
            .zip(bytes.chunks_exact_mut(PHASE_RECORD_SIZE))
        {
            encode_record(phase, record);
        }
        bytes
    }

    /// Deserialisiert einen Block; jeder Block gültiger Länge wird akzeptiert
    pub fn decode(bytes: &[u8; PHASE_TABLE_SIZE]) -> Self {
        let mut phases = [PhaseConfig::OFF; PHASE_COUNT];
        for (phase, record) in phases
            .iter_mut()
            .zip(bytes.chunks_exact(PHASE_RECORD_SIZE))
        {
            *phase = decode_record(record);
        }
        Self { phases }
    }

    /// Schreibt alle Slots in den Speicher (blockierend)
    pub fn save<S: PhaseStorage>(&self, storage: &mut S) -> Result<(), StorageError> {
        storage.write(&self.encode())
    }

    /// Lädt die Slots aus dem Speicher
    ///
    /// Ohne gespeicherten Block gelten die Werkseinstellungen. Bei einem
    /// Lesefehler bleibt der aktuelle Inhalt unverändert.
    pub fn load<S: PhaseStorage>(&mut self, storage: &mut S) -> Result<LoadSource, StorageError> {
        let mut bytes = [0u8; PHASE_TABLE_SIZE];
        if storage.read(&mut bytes)? {
            *self = Self::decode(&bytes);
            Ok(LoadSource::Stored)
        } else {
            self.reset_to_defaults();
            Ok(LoadSource::Defaults)
        }
    }
}

impl Default for PhaseStore {
    fn default() -> Self {
        Self::new()
    }
}

fn encode_record(phase: &PhaseConfig, record: &mut [u8]) {
    for (pair, color) in phase.rgb.iter().enumerate() {
        record[pair * 3] = color.r;
        record[pair * 3 + 1] = color.g;
        record[pair * 3 + 2] = color.b;
    }
    record[AUX_OFFSET..RELAY_OFFSET].copy_from_slice(&phase.auxiliary);
    for (slot, relay) in phase.relay.iter().enumerate() {
        record[RELAY_OFFSET + slot] = u8::from(*relay);
    }
    record[HOLD_OFFSET..CROSS_FADE_OFFSET].copy_from_slice(&phase.hold_ms.to_le_bytes());
    record[CROSS_FADE_OFFSET..PHASE_RECORD_SIZE]
        .copy_from_slice(&phase.cross_fade_ms.to_le_bytes());
}

fn decode_record(record: &[u8]) -> PhaseConfig {
    let mut phase = PhaseConfig::OFF;
    for (pair, color) in phase.rgb.iter_mut().enumerate() {
        *color = rgb(record[pair * 3], record[pair * 3 + 1], record[pair * 3 + 2]);
    }
    phase
        .auxiliary
        .copy_from_slice(&record[AUX_OFFSET..RELAY_OFFSET]);
    for slot in 0..RELAY_COUNT {
        phase.relay[slot] = record[RELAY_OFFSET + slot] != 0;
    }
    phase.hold_ms = read_u32(&record[HOLD_OFFSET..CROSS_FADE_OFFSET]);
    phase.cross_fade_ms = read_u32(&record[CROSS_FADE_OFFSET..PHASE_RECORD_SIZE]);
    phase
}

fn read_u32(bytes: &[u8]) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(bytes);
    u32::from_le_bytes(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_presets() {
        let store = PhaseStore::new();
        assert_eq!(store.get(0), Some(&PhaseConfig::OFF));
        assert_eq!(store.get(1).unwrap().rgb[0], rgb(255, 150, 50));
        assert_eq!(store.get(2).unwrap().auxiliary, [255, 255, 0, 0, 0]);
        assert_eq!(store.get(4).unwrap().rgb[1], rgb(30, 30, 100));
        assert_eq!(store.get(3).unwrap().cross_fade_ms, 5000);
        assert!(store.get(5).is_none());
    }

    #[test]
    fn test_configure_out_of_range_is_ignored() {
        let mut store = PhaseStore::new();
        let settings = PhaseSettings {
            rgb: [rgb(1, 1, 1); 2],
            auxiliary: [1; 5],
            hold_ms: 1,
            cross_fade_ms: 1,
        };
        assert_eq!(store.configure(5, &settings), Outcome::Ignored);
        assert_eq!(store, PhaseStore::new());
    }

    #[test]
    fn test_record_layout() {
        let mut store = PhaseStore::new();
        store.phases[0] = PhaseConfig {
            rgb: [rgb(1, 2, 3), rgb(4, 5, 6)],
            auxiliary: [7, 8, 9, 10, 11],
            relay: [true, false],
            hold_ms: 0x0102_0304,
            cross_fade_ms: 3000,
        };

        let bytes = store.encode();
        assert_eq!(
            bytes[..PHASE_RECORD_SIZE],
            [
                1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 1, 0, 0, 0, 0, 0x04, 0x03, 0x02, 0x01, 0xB8,
                0x0B, 0, 0
            ]
        );
    }

    #[test]
    fn test_decode_treats_nonzero_relay_byte_as_on() {
        let mut bytes = PhaseStore::new().encode();
        bytes[PHASE_RECORD_SIZE + RELAY_OFFSET + 1] = 0x7F;
        let store = PhaseStore::decode(&bytes);
        assert_eq!(store.get(1).unwrap().relay, [false, true]);
    }
}
