// Phasen-Controller Task - Steuerschleife für Ausgänge, Sequenz und Überblendung
use defmt::{Debug2Format, error, info, warn};
use embassy_time::{Duration, Instant, Timer};
use esp_core::{
    Command, Controller, LoadSource, Outcome, PhaseStorage, PwmWriter, StatusSnapshot, elapsed_ms,
};
use esp_hal::delay::Delay;
use esp_hal::i2c::master::{Config as I2cConfig, I2c};
use esp_hal::time::Rate;
use esp_storage::FlashStorage;

use crate::config::{
    DEBUG_INTERVAL_MS, I2C_FREQUENCY_KHZ, PCA9685_ADDRESS, PHASE_STORAGE_OFFSET,
    PWM_FREQUENCY_HZ, STATUS_INTERVAL_MS, TICK_INTERVAL_MS,
};
use crate::hal::{FlashPhaseStorage, Pca9685Writer};
use crate::{CommandReceiver, ReplyMessage, ReplyPublisher, StatusPublisher};

/// Millisekunden-Uhr der Steuerschleife
///
/// Läuft nach ~49 Tagen über, der Sequencer rechnet mit `wrapping_sub`.
fn now_ms() -> u32 {
    Instant::now().as_millis() as u32
}

/// Phasen-Controller Logic - Testbare Steuerung ohne Hardware-Abhängigkeit
///
/// Pro Durchlauf:
/// - Kommandos aus der Queue ausführen und Antworten an den Absender schicken
/// - Sequencer ticken (Sequenz-Fortschritt, Überblendung)
/// - Status-Snapshot bei Änderung publishen (höchstens alle 100 ms)
/// - Einmal pro Sekunde eine Diagnose-Zeile loggen und den Status erneut senden
///
/// # Parameter
/// - `controller`: Controller mit PWM-Writer und Speicher (Hardware oder Mock)
/// - `command_receiver`: Channel Receiver für Kommandos der WebSocket-Clients
/// - `status_publisher`: PubSub Publisher für Status-Broadcasts
/// - `reply_publisher`: PubSub Publisher für Antworten an die Absender
pub async fn phase_controller_logic<W: PwmWriter, S: PhaseStorage>(
    mut controller: Controller<W, S>,
    command_receiver: CommandReceiver,
    status_publisher: StatusPublisher,
    reply_publisher: ReplyPublisher,
) -> ! {
    match controller.load() {
        Ok(LoadSource::Stored) => info!("STORE: Phase table loaded from flash"),
        Ok(LoadSource::Defaults) => warn!("STORE: No stored phase table, using defaults"),
        Err(e) => warn!("STORE: Reading phase table failed ({}), using defaults", e),
    }

    let mut last_status: Option<StatusSnapshot> = None;
    let mut last_status_at = now_ms();
    let mut last_debug_at = now_ms();
    let mut reported_failures = 0;

    loop {
        let now = now_ms();

        // Alle wartenden Kommandos ausführen (non-blocking)
        while let Ok(envelope) = command_receiver.try_receive() {
            info!(
                "PHASE: Command from client {}: {}",
                envelope.origin, envelope.command
            );

            let result = controller.handle(envelope.command, now);
            match result {
                Ok(Outcome::Applied) => {
                    if matches!(envelope.command, Command::ConfigurePhase { .. }) {
                        info!("STORE: Phase table saved");
                    }
                }
                Ok(Outcome::Ignored) => info!("PHASE: Command ignored (out of range)"),
                Err(e) => error!("STORE: Saving phase table failed: {}", e),
            }

            if let Some(text) = envelope.command.reply(result) {
                reply_publisher.publish_immediate(ReplyMessage {
                    origin: envelope.origin,
                    text,
                });
            }
        }

        let events = controller.tick(now);
        if let Some(phase) = events.advanced_to {
            info!("PHASE: Sequence advancing to phase {}", phase);
        }
        if let Some(phase) = events.completed {
            info!("PHASE: Transition to phase {} complete", phase);
        }

        // Nur publishen wenn sich der Status geändert hat
        let status = controller.status();
        if last_status != Some(status)
            && (last_status.is_none() || elapsed_ms(now, last_status_at) >= STATUS_INTERVAL_MS)
        {
            status_publisher.publish_immediate(status);
            last_status = Some(status);
            last_status_at = now;
        }

        if elapsed_ms(now, last_debug_at) >= DEBUG_INTERVAL_MS {
            let sequencer = controller.sequencer();
            info!(
                "PHASE: sequence={} transitioning={} sequence_phase={} elapsed={}ms",
                sequencer.is_sequence_running(),
                sequencer.is_transitioning(),
                sequencer.sequence_phase(),
                sequencer.elapsed_in_phase(now)
            );
            last_debug_at = now;

            // Neue Clients bekommen den Stand spätestens hier
            status_publisher.publish_immediate(status);
        }

        let failures = controller.output().failed_writes();
        if failures != reported_failures {
            error!("PHASE: {} PWM writes failed so far", failures);
            reported_failures = failures;
        }

        // Async Delay: gibt CPU an andere Tasks zurück
        Timer::after(Duration::from_millis(TICK_INTERVAL_MS)).await;
    }
}

/// Phasen-Controller Task - Embassy Task für parallele Ausführung
///
/// Initialisiert I2C, PCA9685 und Flash und ruft dann die testbare
/// `phase_controller_logic()` Funktion auf.
///
/// # Parameter
/// - `i2c0`: I2C0 Peripheral für den PCA9685
/// - `sda`, `scl`: GPIO6 / GPIO7 für den I2C-Bus
/// - `flash`: FLASH Peripheral für die Phasen-Tabelle
#[embassy_executor::task]
pub async fn phase_controller_task(
    i2c0: esp_hal::peripherals::I2C0<'static>,
    sda: esp_hal::peripherals::GPIO6<'static>,
    scl: esp_hal::peripherals::GPIO7<'static>,
    flash: esp_hal::peripherals::FLASH<'static>,
    command_receiver: CommandReceiver,
    status_publisher: StatusPublisher,
    reply_publisher: ReplyPublisher,
) {
    let config = I2cConfig::default().with_frequency(Rate::from_khz(I2C_FREQUENCY_KHZ));
    let i2c = match I2c::new(i2c0, config) {
        Ok(i2c) => i2c.with_sda(sda).with_scl(scl),
        Err(e) => {
            error!("PHASE: I2C configuration rejected: {}", Debug2Format(&e));
            return;
        }
    };

    // Baustein vor dem ersten Schreiben der Ausgänge konfigurieren
    let mut writer = Pca9685Writer::new(i2c, PCA9685_ADDRESS);
    match writer.init(&mut Delay::new(), PWM_FREQUENCY_HZ) {
        Ok(()) => info!("PHASE: PCA9685 ready at {} Hz", PWM_FREQUENCY_HZ),
        Err(e) => error!("PHASE: PCA9685 init failed: {}", e),
    }

    let storage = FlashPhaseStorage::new(FlashStorage::new(flash), PHASE_STORAGE_OFFSET);

    // Alle Ausgänge auf 0, danach Tabelle laden und Schleife starten
    let controller = Controller::new(writer, storage);
    phase_controller_logic(controller, command_receiver, status_publisher, reply_publisher).await
}
