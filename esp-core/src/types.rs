//! Core Types für die Phasen-Steuerung
//!
//! Datenstrukturen ohne Hardware-Dependencies

use rgb::RGB8;

/// Anzahl der Phasen-Slots (0 = Aus, 1..4 = Sequenz)
pub const PHASE_COUNT: usize = 5;

/// Anzahl der RGB-Kanalpaare
pub const RGB_CHANNEL_COUNT: usize = 2;

/// Anzahl der Auxiliary-Kanäle
pub const AUX_CHANNEL_COUNT: usize = 5;

/// Anzahl der Relais (im Datenmodell reserviert, nicht angesteuert)
pub const RELAY_COUNT: usize = 2;

/// Standard-Überblendzeit eines Slots in Millisekunden
pub const DEFAULT_CROSS_FADE_MS: u32 = 5000;

/// Ergebnis einer bereichsgeprüften Operation
///
/// Ungültige Indizes werden still verworfen. `Ignored` macht das im
/// Rückgabewert sichtbar, ohne dass ein Aufrufer darauf reagieren muss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Outcome {
    Applied,
    Ignored,
}

impl Outcome {
    pub fn is_applied(self) -> bool {
        self == Outcome::Applied
    }

    pub(crate) fn guard(valid: bool) -> Self {
        if valid {
            Outcome::Applied
        } else {
            Outcome::Ignored
        }
    }
}

/// Namen der fünf Phasen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PhaseName {
    Off,
    Dawn,
    Day,
    Evening,
    Night,
}

impl PhaseName {
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::Off),
            1 => Some(Self::Dawn),
            2 => Some(Self::Day),
            3 => Some(Self::Evening),
            4 => Some(Self::Night),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "Off",
            Self::Dawn => "Dawn",
            Self::Day => "Day",
            Self::Evening => "Evening",
            Self::Night => "Night",
        }
    }
}

/// Einstellbare Werte eines Phasen-Slots
///
/// Entspricht dem Payload von `CONFIG_FASE`: alles außer den Relais.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseSettings {
    pub rgb: [RGB8; RGB_CHANNEL_COUNT],
    pub auxiliary: [u8; AUX_CHANNEL_COUNT],
    pub hold_ms: u32,
    pub cross_fade_ms: u32,
}

/// Konfiguration einer Phase
///
/// `hold_ms`: Haltezeit während der automatischen Sequenz.
/// `cross_fade_ms`: Überblendzeit *in* diese Phase (wird gespeichert und
/// angezeigt, die automatische Sequenz nutzt aber fest 5000 ms).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PhaseConfig {
    pub rgb: [RGB8; RGB_CHANNEL_COUNT],
    pub auxiliary: [u8; AUX_CHANNEL_COUNT],
    pub relay: [bool; RELAY_COUNT],
    pub hold_ms: u32,
    pub cross_fade_ms: u32,
}

impl PhaseConfig {
    /// Alle Kanäle aus, keine Haltezeit, Standard-Überblendzeit
    pub const OFF: Self = Self {
        rgb: [rgb(0, 0, 0); RGB_CHANNEL_COUNT],
        auxiliary: [0; AUX_CHANNEL_COUNT],
        relay: [false; RELAY_COUNT],
        hold_ms: 0,
        cross_fade_ms: DEFAULT_CROSS_FADE_MS,
    };

    /// Überschreibt alle einstellbaren Werte, Relais bleiben unverändert
    pub fn apply_settings(&mut self, settings: &PhaseSettings) {
        self.rgb = settings.rgb;
        self.auxiliary = settings.auxiliary;
        self.hold_ms = settings.hold_ms;
        self.cross_fade_ms = settings.cross_fade_ms;
    }
}

impl Default for PhaseConfig {
    fn default() -> Self {
        Self::OFF
    }
}

/// Spiegel der zuletzt ausgegebenen Kanalwerte
///
/// Wird nur vom `OutputDriver` geschrieben und von Status-Renderern gelesen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelState {
    pub current_phase: u8,
    pub rgb: [RGB8; RGB_CHANNEL_COUNT],
    pub auxiliary: [u8; AUX_CHANNEL_COUNT],
    pub relay: [bool; RELAY_COUNT],
    pub audio_mode: u8,
    pub current_track: u8,
}

impl Default for ChannelState {
    fn default() -> Self {
        Self {
            current_phase: 0,
            rgb: [rgb(0, 0, 0); RGB_CHANNEL_COUNT],
            auxiliary: [0; AUX_CHANNEL_COUNT],
            relay: [false; RELAY_COUNT],
            audio_mode: 0,
            current_track: 1,
        }
    }
}

/// `const`-fähiger RGB8-Konstruktor
pub const fn rgb(r: u8, g: u8, b: u8) -> RGB8 {
    RGB8 { r, g, b }
}

// ============================================================================
// defmt::Format Implementations (optional feature)
// ============================================================================

#[cfg(feature = "defmt")]
impl defmt::Format for PhaseConfig {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(
            fmt,
            "PhaseConfig {{ rgb1: ({}, {}, {}), rgb2: ({}, {}, {}), aux: {}, hold: {}ms, fade: {}ms }}",
            self.rgb[0].r,
            self.rgb[0].g,
            self.rgb[0].b,
            self.rgb[1].r,
            self.rgb[1].g,
            self.rgb[1].b,
            self.auxiliary,
            self.hold_ms,
            self.cross_fade_ms
        )
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for PhaseSettings {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(
            fmt,
            "rgb1: ({}, {}, {}), rgb2: ({}, {}, {}), aux: {}, hold: {}ms, fade: {}ms",
            self.rgb[0].r,
            self.rgb[0].g,
            self.rgb[0].b,
            self.rgb[1].r,
            self.rgb[1].g,
            self.rgb[1].b,
            self.auxiliary,
            self.hold_ms,
            self.cross_fade_ms
        )
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ChannelState {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(
            fmt,
            "ChannelState {{ phase: {}, rgb1: ({}, {}, {}), rgb2: ({}, {}, {}), aux: {} }}",
            self.current_phase,
            self.rgb[0].r,
            self.rgb[0].g,
            self.rgb[0].b,
            self.rgb[1].r,
            self.rgb[1].g,
            self.rgb[1].b,
            self.auxiliary
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_name_from_index() {
        assert_eq!(PhaseName::from_index(0), Some(PhaseName::Off));
        assert_eq!(PhaseName::from_index(4), Some(PhaseName::Night));
        assert_eq!(PhaseName::from_index(5), None);
    }

    #[test]
    fn test_apply_settings_keeps_relays() {
        let mut config = PhaseConfig::OFF;
        config.relay = [true, false];
        config.apply_settings(&PhaseSettings {
            rgb: [rgb(1, 2, 3), rgb(4, 5, 6)],
            auxiliary: [7, 8, 9, 10, 11],
            hold_ms: 100,
            cross_fade_ms: 200,
        });
        assert_eq!(config.relay, [true, false]);
        assert_eq!(config.rgb[1], rgb(4, 5, 6));
        assert_eq!(config.hold_ms, 100);
        assert_eq!(config.cross_fade_ms, 200);
    }

    #[test]
    fn test_channel_state_default_track_is_one() {
        let state = ChannelState::default();
        assert_eq!(state.current_phase, 0);
        assert_eq!(state.current_track, 1);
        assert_eq!(state.auxiliary, [0; AUX_CHANNEL_COUNT]);
    }
}
