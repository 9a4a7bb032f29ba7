//! Controller
//!
//! Besitzt Store, Sequencer, Output Driver und Speicher und führt
//! Kommandos sowie Ticks darauf aus. Ersetzt einen globalen Zustand:
//! jede Komponente bekommt ihren Teil explizit übergeben.

use crate::command::Command;
use crate::output::OutputDriver;
use crate::sequencer::{PhaseSequencer, TickEvents};
use crate::store::{LoadSource, PhaseStore};
use crate::traits::{PhaseStorage, PwmWriter, StorageError};
use crate::types::{ChannelState, Outcome, PhaseName};

/// Lesesicht für Status-Renderer (Web-UI, MQTT)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct StatusSnapshot {
    pub phase: u8,
    pub phase_name: &'static str,
    pub sequence_running: bool,
    pub sequence_phase: u8,
    pub transitioning: bool,
    pub channels: ChannelState,
    /// Haltezeit der angezeigten Phase
    pub hold_ms: u32,
    /// Überblendzeit der angezeigten Phase
    pub cross_fade_ms: u32,
}

pub struct Controller<W, S> {
    store: PhaseStore,
    sequencer: PhaseSequencer,
    output: OutputDriver<W>,
    storage: S,
}

impl<W: PwmWriter, S: PhaseStorage> Controller<W, S> {
    /// Erstellt den Controller mit Werkseinstellungen, alle Ausgänge auf 0
    pub fn new(writer: W, storage: S) -> Self {
        Self {
            store: PhaseStore::new(),
            sequencer: PhaseSequencer::new(),
            output: OutputDriver::new(writer),
            storage,
        }
    }

    /// Lädt die Phasen-Tabelle aus dem Speicher
    pub fn load(&mut self) -> Result<LoadSource, StorageError> {
        self.store.load(&mut self.storage)
    }

    /// Führt ein Kommando aus
    ///
    /// `Err` nur wenn `CONFIG_FASE` den Slot geändert, aber nicht
    /// gespeichert hat.
    pub fn handle(&mut self, command: Command, now: u32) -> Result<Outcome, StorageError> {
        let outcome = match command {
            Command::ApplyPhase(phase) => {
                self.sequencer
                    .apply_phase(phase, &self.store, &mut self.output)
            }
            Command::StartTransition {
                from,
                to,
                duration_ms,
            } => self.sequencer.start_transition(from, to, duration_ms, now),
            Command::ConfigurePhase { index, settings } => {
                let outcome = self.store.configure(index, &settings);
                if outcome.is_applied() {
                    self.store.save(&mut self.storage)?;
                }
                outcome
            }
            Command::StartSequence => {
                self.sequencer
                    .start_sequence(now, &self.store, &mut self.output);
                Outcome::Applied
            }
            Command::StopSequence => {
                self.sequencer.stop_sequence();
                Outcome::Applied
            }
        };

        Ok(outcome)
    }

    /// Ein Durchlauf der Steuerschleife
    pub fn tick(&mut self, now: u32) -> TickEvents {
        self.sequencer.tick(now, &self.store, &mut self.output)
    }

    pub fn status(&self) -> StatusSnapshot {
        let channels = *self.output.state();
        let phase = channels.current_phase;
        let (hold_ms, cross_fade_ms) = self
            .store
            .get(phase)
            .map_or((0, 0), |config| (config.hold_ms, config.cross_fade_ms));

        StatusSnapshot {
            phase,
            phase_name: PhaseName::from_index(phase).map_or("?", PhaseName::as_str),
            sequence_running: self.sequencer.is_sequence_running(),
            sequence_phase: self.sequencer.sequence_phase(),
            transitioning: self.sequencer.is_transitioning(),
            channels,
            hold_ms,
            cross_fade_ms,
        }
    }

    pub fn store(&self) -> &PhaseStore {
        &self.store
    }

    pub fn sequencer(&self) -> &PhaseSequencer {
        &self.sequencer
    }

    pub fn output(&self) -> &OutputDriver<W> {
        &self.output
    }

    /// Zugriff auf den PWM-Baustein, z.B. für Diagnose oder Mocks
    pub fn writer_mut(&mut self) -> &mut W {
        self.output.writer_mut()
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }
}

// ============================================================================
// defmt::Format Implementations (optional feature)
// ============================================================================

#[cfg(feature = "defmt")]
impl defmt::Format for StatusSnapshot {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(
            fmt,
            "Status {{ phase: {} ({}), sequence: {}, transition: {}, {} }}",
            self.phase,
            self.phase_name,
            self.sequence_running,
            self.transitioning,
            self.channels
        )
    }
}
