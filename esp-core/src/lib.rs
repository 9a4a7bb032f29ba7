//! ESP Core - Platform-agnostic Logic and Traits
//!
//! Diese Crate enthält KEINE Hardware-Dependencies.
//! Sie definiert das Phasen-Datenmodell, den Sequencer mit Überblendung,
//! den Command-Parser und die Traits für PWM und Speicher.

#![no_std]

pub mod command;
pub mod controller;
pub mod line;
pub mod logic;
pub mod output;
pub mod sequencer;
pub mod store;
pub mod traits;
pub mod types;

// Re-exports für einfachen Zugriff
pub use command::{Command, CommandError, MAX_COMMAND_LENGTH, Reply};
pub use controller::{Controller, StatusSnapshot};
pub use line::{CommandLine, LineAssembler};
pub use logic::{elapsed_ms, interpolate, interpolate_rgb, next_sequence_phase, scale_to_duty};
pub use output::OutputDriver;
pub use sequencer::{PhaseSequencer, SEQUENCE_TRANSITION_MS, TickEvents, Transition};
pub use store::{DEFAULT_PHASES, LoadSource, PHASE_TABLE_SIZE, PhaseStore};
pub use traits::{PhaseStorage, PwmError, PwmWriter, StorageError};
pub use types::{ChannelState, Outcome, PHASE_COUNT, PhaseConfig, PhaseName, PhaseSettings};
