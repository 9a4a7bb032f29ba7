// WiFi Task - Station-Verbindung und Netzwerk-Stack
use defmt::{Debug2Format, error, info, warn};
use embassy_net::{Runner, Stack};
use embassy_time::{Duration, Timer};
use esp_radio::wifi::{ClientConfig, ModeConfig, WifiController, WifiDevice, WifiEvent};

use crate::config::{WIFI_PASSWORD, WIFI_RETRY_DELAY_SECS, WIFI_SSID};

/// Station-Konfiguration aus den Build-Zeit-Credentials
fn station_config() -> ModeConfig {
    ModeConfig::Client(
        ClientConfig::default()
            .with_ssid(WIFI_SSID.into())
            .with_password(WIFI_PASSWORD.into()),
    )
}

async fn retry_later() {
    Timer::after(Duration::from_secs(WIFI_RETRY_DELAY_SECS)).await;
}

/// WiFi Connection Task
///
/// Startet den Controller einmalig und hält die Verbindung zum
/// Access Point. Nach einem Disconnect wird erneut verbunden.
/// Die Steuerung läuft unabhängig davon weiter.
#[embassy_executor::task]
pub async fn connection_task(mut controller: WifiController<'static>) {
    info!("WiFi: Starting connection task");

    loop {
        if !matches!(controller.is_started(), Ok(true)) {
            if let Err(e) = controller.set_config(&station_config()) {
                error!("WiFi: Failed to set configuration: {}", Debug2Format(&e));
                retry_later().await;
                continue;
            }

            if let Err(e) = controller.start_async().await {
                error!("WiFi: Failed to start: {}", Debug2Format(&e));
                retry_later().await;
                continue;
            }

            info!("WiFi: Station started");
        }

        info!("WiFi: Connecting to '{}'...", WIFI_SSID);
        if let Err(e) = controller.connect_async().await {
            warn!("WiFi: Connection failed: {}", Debug2Format(&e));
            retry_later().await;
            continue;
        }
        info!("WiFi: Connected");

        controller.wait_for_event(WifiEvent::StaDisconnected).await;
        warn!("WiFi: Disconnected from AP, reconnecting...");
        retry_later().await;
    }
}

/// Network Task
///
/// Treibt den embassy-net Stack (Pakete, TCP/IP, DHCP).
#[embassy_executor::task]
pub async fn net_task(mut runner: Runner<'static, WifiDevice<'static>>) -> ! {
    runner.run().await
}

/// DHCP Monitor Task
///
/// Wartet auf Link und IPv4-Adresse und loggt, unter welcher
/// Adresse die Status-Seite erreichbar ist.
#[embassy_executor::task]
pub async fn dhcp_task(stack: &'static Stack<'static>) {
    stack.wait_link_up().await;
    info!("WiFi: Link is up, waiting for IP address...");

    stack.wait_config_up().await;
    if let Some(config) = stack.config_v4() {
        info!(
            "WiFi: Got IP {} (gateway {})",
            Debug2Format(&config.address.address()),
            Debug2Format(&config.gateway)
        );
        info!(
            "HTTP: Status page at http://{}/",
            Debug2Format(&config.address.address())
        );
    }
}
