//! Phase Sequencer
//!
//! Zwei voneinander unabhängige Zustände:
//!
//! - **Sequenz:** `Idle` oder `Holding(phase)`. Läuft die Haltezeit der
//!   aktuellen Phase ab, geht es zur nächsten Phase (4 → 1) und eine
//!   Überblendung mit fest 5000 ms startet.
//! - **Überblendung:** höchstens eine gleichzeitig. Eine neue überschreibt
//!   die laufende. Jeder Tick interpoliert alle Kanäle zwischen zwei Phasen.
//!
//! Der Sequencer hält nur Laufzeit-Zustand. Phasen liest er aus dem
//! `PhaseStore`, Ausgänge schreibt er über den `OutputDriver`.

use crate::logic::{elapsed_ms, interpolate, interpolate_rgb, next_sequence_phase};
use crate::output::OutputDriver;
use crate::store::PhaseStore;
use crate::traits::PwmWriter;
use crate::types::{Outcome, PHASE_COUNT};

/// Erste Phase der automatischen Sequenz (Morgendämmerung)
pub const FIRST_SEQUENCE_PHASE: u8 = 1;

/// Letzte Phase der automatischen Sequenz (Nacht)
pub const LAST_SEQUENCE_PHASE: u8 = 4;

/// Überblendzeit beim automatischen Weiterschalten
///
/// Fest verdrahtet; `PhaseConfig::cross_fade_ms` wird hier nicht benutzt.
pub const SEQUENCE_TRANSITION_MS: u32 = 5000;

/// Eine laufende Überblendung
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Transition {
    pub from: u8,
    pub to: u8,
    pub started_at: u32,
    pub duration_ms: u32,
}

/// Was ein Tick verändert hat
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TickEvents {
    /// Die Sequenz ist zu dieser Phase weitergeschaltet
    pub advanced_to: Option<u8>,
    /// Eine Überblendung hat diese Phase erreicht
    pub completed: Option<u8>,
}

/// Laufzeit-Zustand der Phasen-Steuerung (wird nie gespeichert)
#[derive(Debug, Clone, Default)]
pub struct PhaseSequencer {
    sequence_running: bool,
    sequence_phase: u8,
    phase_started_at: u32,
    transition: Option<Transition>,
}

impl PhaseSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Startet die Sequenz bei Phase 1 und setzt deren Ausgänge sofort
    pub fn start_sequence<W: PwmWriter>(
        &mut self,
        now: u32,
        store: &PhaseStore,
        output: &mut OutputDriver<W>,
    ) {
        self.sequence_running = true;
        self.sequence_phase = FIRST_SEQUENCE_PHASE;
        self.phase_started_at = now;
        self.apply_phase(FIRST_SEQUENCE_PHASE, store, output);
    }

    /// Hält die Sequenz an; die Ausgänge bleiben wie sie sind
    pub fn stop_sequence(&mut self) {
        self.sequence_running = false;
    }

    /// Setzt alle Ausgänge sofort auf die Werte einer Phase
    pub fn apply_phase<W: PwmWriter>(
        &mut self,
        phase: u8,
        store: &PhaseStore,
        output: &mut OutputDriver<W>,
    ) -> Outcome {
        let Some(config) = store.get(phase) else {
            return Outcome::Ignored;
        };

        output.set_current_phase(phase);
        output.apply_frame(config);
        Outcome::Applied
    }

    /// Startet eine Überblendung; sichtbar wird sie erst beim nächsten Tick
    pub fn start_transition(&mut self, from: u8, to: u8, duration_ms: u32, now: u32) -> Outcome {
        let valid = usize::from(from) < PHASE_COUNT && usize::from(to) < PHASE_COUNT;
        if valid {
            self.transition = Some(Transition {
                from,
                to,
                started_at: now,
                duration_ms,
            });
        }
        Outcome::guard(valid)
    }

    /// Ein Durchlauf der Steuerschleife
    pub fn tick<W: PwmWriter>(
        &mut self,
        now: u32,
        store: &PhaseStore,
        output: &mut OutputDriver<W>,
    ) -> TickEvents {
        let mut events = TickEvents::default();

        if self.sequence_running {
            let hold_ms = store
                .get(self.sequence_phase)
                .map_or(0, |config| config.hold_ms);

            if elapsed_ms(now, self.phase_started_at) >= hold_ms {
                let previous = self.sequence_phase;
                self.sequence_phase = next_sequence_phase(previous);
                self.phase_started_at = now;
                self.start_transition(previous, self.sequence_phase, SEQUENCE_TRANSITION_MS, now);
                events.advanced_to = Some(self.sequence_phase);
            }
        }

        if let Some(transition) = self.transition {
            let elapsed = elapsed_ms(now, transition.started_at);

            if elapsed >= transition.duration_ms {
                // Exakte Zielwerte statt der letzten Zwischenstufe
                self.apply_phase(transition.to, store, output);
                self.transition = None;
                events.completed = Some(transition.to);
            } else if let (Some(from), Some(to)) =
                (store.get(transition.from), store.get(transition.to))
            {
                let duration = transition.duration_ms;
                for (pair, (start, end)) in from.rgb.iter().zip(to.rgb.iter()).enumerate() {
                    output.set_color(pair, interpolate_rgb(*start, *end, elapsed, duration));
                }
                for (index, (start, end)) in
                    from.auxiliary.iter().zip(to.auxiliary.iter()).enumerate()
                {
                    output.set_auxiliary(index, interpolate(*start, *end, elapsed, duration));
                }
            }
        }

        events
    }

    pub fn is_sequence_running(&self) -> bool {
        self.sequence_running
    }

    pub fn is_transitioning(&self) -> bool {
        self.transition.is_some()
    }

    /// Phase, auf der die automatische Sequenz gerade steht
    pub fn sequence_phase(&self) -> u8 {
        self.sequence_phase
    }

    /// Zeit seit Beginn der aktuellen Sequenz-Phase
    pub fn elapsed_in_phase(&self, now: u32) -> u32 {
        elapsed_ms(now, self.phase_started_at)
    }

    pub fn transition(&self) -> Option<&Transition> {
        self.transition.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::PwmError;

    struct NullWriter;

    impl PwmWriter for NullWriter {
        const MAX_DUTY: u16 = 4095;

        fn set_duty(&mut self, _channel: u8, _duty: u16) -> Result<(), PwmError> {
            Ok(())
        }
    }

    fn setup() -> (PhaseSequencer, PhaseStore, OutputDriver<NullWriter>) {
        (PhaseSequencer::new(), PhaseStore::new(), OutputDriver::new(NullWriter))
    }

    #[test]
    fn test_start_transition_rejects_invalid_phase() {
        let (mut sequencer, _, _) = setup();
        assert_eq!(sequencer.start_transition(1, 5, 1000, 0), Outcome::Ignored);
        assert_eq!(sequencer.start_transition(9, 1, 1000, 0), Outcome::Ignored);
        assert!(!sequencer.is_transitioning());
    }

    #[test]
    fn test_start_transition_does_not_touch_outputs() {
        let (mut sequencer, _, output) = setup();
        let before = *output.state();
        assert_eq!(sequencer.start_transition(0, 2, 1000, 0), Outcome::Applied);
        assert_eq!(*output.state(), before);
        assert!(sequencer.is_transitioning());
    }

    #[test]
    fn test_new_transition_overrides_running_one() {
        let (mut sequencer, _, _) = setup();
        sequencer.start_transition(0, 2, 1000, 0);
        sequencer.start_transition(3, 4, 2000, 10);
        assert_eq!(
            sequencer.transition(),
            Some(&Transition {
                from: 3,
                to: 4,
                started_at: 10,
                duration_ms: 2000
            })
        );
    }

    #[test]
    fn test_tick_completes_transition_and_stops() {
        let (mut sequencer, store, mut output) = setup();
        sequencer.start_transition(0, 2, 1000, 0);

        let events = sequencer.tick(1000, &store, &mut output);
        assert_eq!(events.completed, Some(2));
        assert!(!sequencer.is_transitioning());
        assert_eq!(output.state().current_phase, 2);

        let events = sequencer.tick(1500, &store, &mut output);
        assert_eq!(events, TickEvents::default());
    }

    #[test]
    fn test_stop_sequence_keeps_outputs() {
        let (mut sequencer, store, mut output) = setup();
        sequencer.start_sequence(0, &store, &mut output);
        let before = *output.state();
        sequencer.stop_sequence();
        assert!(!sequencer.is_sequence_running());
        assert_eq!(*output.state(), before);
    }
}
