// Projekt-Konfiguration: Konstanten und Hardware-Zuordnungen
#![allow(dead_code)]

// ============================================================================
// PWM-Controller (PCA9685) Konfiguration
// ============================================================================

/// I2C-Adresse des PCA9685 (alle Adress-Pins auf GND)
pub const PCA9685_ADDRESS: u8 = 0x40;

/// PWM-Frequenz der Ausgänge in Hz
pub const PWM_FREQUENCY_HZ: u32 = 1000;

/// I2C-Taktfrequenz in kHz
pub const I2C_FREQUENCY_KHZ: u32 = 400;

/// GPIO-Pin für I2C SDA
pub const I2C_SDA_GPIO_PIN: u8 = 6;

/// GPIO-Pin für I2C SCL
pub const I2C_SCL_GPIO_PIN: u8 = 7;

// ============================================================================
// Steuerschleife
// ============================================================================

/// Intervall der Steuerschleife in Millisekunden
/// Bestimmt die Auflösung der Überblendung (10 ms ≈ 100 Schritte pro Sekunde)
pub const TICK_INTERVAL_MS: u64 = 10;

/// Mindestabstand zwischen zwei Status-Updates an die Clients
pub const STATUS_INTERVAL_MS: u32 = 100;

/// Intervall der Diagnose-Zeile im Log
pub const DEBUG_INTERVAL_MS: u32 = 1000;

// ============================================================================
// Flash-Speicher
// ============================================================================

/// Offset der Phasen-Tabelle im Flash
/// Eigene `phases` Partition aus partitions.csv (4 KB, ein Sektor).
/// Muss mit `espflash flash --partition-table partitions.csv` geflasht werden.
pub const PHASE_STORAGE_OFFSET: u32 = 0x3D_0000;

// ============================================================================
// WiFi Konfiguration
// ============================================================================

/// WiFi SSID (Netzwerk-Name)
/// Wird zur Build-Zeit aus der Environment Variable WIFI_SSID geladen
/// Setze diese in .env file (siehe .env.example)
pub const WIFI_SSID: &str = env!(
    "WIFI_SSID",
    "WiFi SSID nicht gesetzt! Erstelle .env file (siehe .env.example)"
);

/// WiFi Passwort
/// Wird zur Build-Zeit aus der Environment Variable WIFI_PASSWORD geladen
pub const WIFI_PASSWORD: &str = env!(
    "WIFI_PASSWORD",
    "WiFi Password nicht gesetzt! Erstelle .env file (siehe .env.example)"
);

/// Wartezeit nach einem WiFi-Fehler vor erneutem Versuch
pub const WIFI_RETRY_DELAY_SECS: u64 = 5;

/// Heap-Größe für WiFi (Bytes)
/// WiFi benötigt dynamischen Speicher für Pakete
pub const WIFI_HEAP_SIZE: usize = 65536; // 64 KB

/// Zusätzliche Heap-Größe (Bytes)
pub const EXTRA_HEAP_SIZE: usize = 36864; // 36 KB

// ============================================================================
// MQTT Konfiguration
// ============================================================================

/// MQTT Broker Hostname oder IP-Adresse
pub const MQTT_BROKER: &str = env!(
    "MQTT_BROKER",
    "MQTT Broker nicht gesetzt! Erstelle .env file (siehe .env.example)"
);

/// MQTT Broker Port
/// Standard: 1883 (unverschlüsselt)
pub const MQTT_PORT: u16 = 1883;

/// MQTT Client ID
pub const MQTT_CLIENT_ID: &str = env!(
    "MQTT_CLIENT_ID",
    "MQTT Client ID nicht gesetzt! Erstelle .env file (siehe .env.example)"
);

/// MQTT Topic für die aktive Phase (z.B. "Dawn", "Night")
pub const MQTT_TOPIC_PHASE: &str = env!(
    "MQTT_TOPIC_PHASE",
    "MQTT Topic Phase nicht gesetzt! Erstelle .env file (siehe .env.example)"
);

/// MQTT Topic für den Sequenz-Zustand ("Running" / "Stopped")
pub const MQTT_TOPIC_SEQUENCE: &str = env!(
    "MQTT_TOPIC_SEQUENCE",
    "MQTT Topic Sequence nicht gesetzt! Erstelle .env file (siehe .env.example)"
);

/// MQTT Reconnect Delay in Sekunden
pub const MQTT_RECONNECT_DELAY_SECS: u64 = 5;

/// MQTT Buffer-Größe in Bytes
pub const MQTT_BUFFER_SIZE: usize = 1024;

/// TCP Buffer-Größe für die MQTT-Verbindung
pub const MQTT_TCP_BUFFER_SIZE: usize = 2048;

/// DNS Query Timeout in Sekunden
pub const DNS_TIMEOUT_SECS: u64 = 10;

// ============================================================================
// HTTP Server Konfiguration
// ============================================================================

/// Anzahl paralleler HTTP-Server-Tasks
pub const HTTP_TASK_COUNT: usize = 4;

/// HTTP Buffer-Größe in Bytes
/// 1024 Bytes reicht dank Chunked Transfer Encoding
pub const HTTP_BUFFER_SIZE: usize = 1024;

/// TCP RX Buffer-Größe in Bytes
pub const TCP_RX_BUFFER_SIZE: usize = 1024;

/// TCP TX Buffer-Größe in Bytes
pub const TCP_TX_BUFFER_SIZE: usize = 1024;

/// WebSocket Message Buffer-Größe in Bytes
/// Eine Nachricht trägt eine oder mehrere Kommandozeilen
pub const WEBSOCKET_BUFFER_SIZE: usize = 512;

/// JSON Serialisierungs-Buffer für WebSocket-Nachrichten
/// Der Status mit allen Kanalwerten braucht knapp 400 Bytes
pub const JSON_BUFFER_SIZE: usize = 512;

#[cfg(test)]
mod tests {
    use super::*;

    const PARTITIONS: &str = include_str!("../partitions.csv");

    fn parse_hex(field: &str) -> u32 {
        u32::from_str_radix(field.trim().trim_start_matches("0x"), 16).unwrap()
    }

    /// (Offset, Größe) einer Partition aus partitions.csv
    fn partition(name: &str) -> (u32, u32) {
        PARTITIONS
            .lines()
            .filter(|line| !line.starts_with('#'))
            .find_map(|line| {
                let mut fields = line.split(',');
                if fields.next()?.trim() != name {
                    return None;
                }
                let mut fields = fields.skip(2);
                Some((parse_hex(fields.next()?), parse_hex(fields.next()?)))
            })
            .unwrap()
    }

    #[test]
    fn test_phase_storage_uses_own_partition() {
        let (offset, size) = partition("phases");
        assert_eq!(offset, PHASE_STORAGE_OFFSET);
        assert_eq!(offset % 0x1000, 0);
        assert!(size >= 120);

        let (nvs_offset, nvs_size) = partition("nvs");
        assert!(PHASE_STORAGE_OFFSET >= nvs_offset + nvs_size);

        let (app_offset, app_size) = partition("factory");
        assert!(PHASE_STORAGE_OFFSET >= app_offset + app_size);
    }
}
