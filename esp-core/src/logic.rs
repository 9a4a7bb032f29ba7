//! Pure Business Logic Functions
//!
//! Funktionen ohne Hardware-Dependencies (testbar!)

use rgb::RGB8;

use crate::sequencer::{FIRST_SEQUENCE_PHASE, LAST_SEQUENCE_PHASE};

/// Vergangene Zeit seit `since` in Millisekunden
///
/// Rechnet per Subtraktion mit Überlauf, damit der Vergleich auch nach
/// dem Überlauf des 32-Bit-Millisekundenzählers stimmt.
pub fn elapsed_ms(now: u32, since: u32) -> u32 {
    now.wrapping_sub(since)
}

/// Lineare Interpolation eines 8-Bit-Kanals
///
/// Liefert `start + (end - start) * elapsed / duration`, abgeschnitten
/// (nicht gerundet). Ab `elapsed >= duration` exakt `end`.
///
/// # Beispiele
///
/// ```
/// # use esp_core::interpolate;
/// assert_eq!(interpolate(0, 100, 0, 1000), 0);
/// assert_eq!(interpolate(0, 100, 500, 1000), 50);
/// assert_eq!(interpolate(255, 50, 500, 1000), 152);
/// assert_eq!(interpolate(0, 100, 1000, 1000), 100);
/// ```
pub fn interpolate(start: u8, end: u8, elapsed: u32, duration: u32) -> u8 {
    if elapsed >= duration {
        return end;
    }

    let duration = u64::from(duration);
    let elapsed = u64::from(elapsed);

    // start * (d - e) + end * e ist nie negativ, Division = Abschneiden
    let value = (u64::from(start) * (duration - elapsed) + u64::from(end) * elapsed) / duration;
    value as u8
}

/// Interpoliert alle drei Farbkanäle
pub fn interpolate_rgb(start: RGB8, end: RGB8, elapsed: u32, duration: u32) -> RGB8 {
    RGB8 {
        r: interpolate(start.r, end.r, elapsed, duration),
        g: interpolate(start.g, end.g, elapsed, duration),
        b: interpolate(start.b, end.b, elapsed, duration),
    }
}

/// Skaliert einen 8-Bit-Wert linear auf die native PWM-Auflösung
///
/// 0 → 0 und 255 → `max_duty`, damit der volle Ausgabebereich genutzt wird
/// (kein Bit-Shift).
pub fn scale_to_duty(value: u8, max_duty: u16) -> u16 {
    (u32::from(value) * u32::from(max_duty) / 255) as u16
}

/// Nächste Phase der automatischen Sequenz: 1 → 2 → 3 → 4 → 1
pub fn next_sequence_phase(phase: u8) -> u8 {
    let next = phase.saturating_add(1);
    if next > LAST_SEQUENCE_PHASE {
        FIRST_SEQUENCE_PHASE
    } else {
        next
    }
}
