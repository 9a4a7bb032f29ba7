// Library-Root: Wiederverwendbare Logik und Module
// Keine Standard-Bibliothek (Embedded System)
#![no_std]

// Module
pub mod config;
pub mod hal;
pub mod tasks;
pub mod web;

// Re-exports von esp-core
pub use esp_core::{Command, Controller, Reply, StatusSnapshot};

// Embassy Channel-Typen
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::channel::{Channel, Receiver, Sender};
use embassy_sync::pubsub::{PubSubChannel, Publisher, Subscriber};

// ============================================================================
// Nachrichten zwischen den Tasks
// ============================================================================

/// Ein Kommando mit der Kennung der Verbindung, von der es kam
///
/// Die Kennung wird mit der Antwort zurückgegeben, damit nur der
/// Absender die Bestätigung bekommt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub struct CommandEnvelope {
    pub origin: u8,
    pub command: Command,
}

/// Antwort oder Hinweis an eine bestimmte Verbindung
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyMessage {
    pub origin: u8,
    pub text: Reply,
}

// ============================================================================
// Type-Aliase für Channel-Typen
// ============================================================================
//
// Statt:  Publisher<'static, NoopRawMutex, StatusSnapshot, 2, 6, 1>
// Nutze:  StatusPublisher

/// Queue-Tiefe für Kommandos (WebSocket → Controller Task)
pub const COMMAND_QUEUE_DEPTH: usize = 4;

/// Channel für Kommandos (WebSocket → Controller Task)
pub type CommandChannel = Channel<NoopRawMutex, CommandEnvelope, COMMAND_QUEUE_DEPTH>;

/// Sender für Kommandos
pub type CommandSender = Sender<'static, NoopRawMutex, CommandEnvelope, COMMAND_QUEUE_DEPTH>;

/// Receiver für Kommandos (Controller Task empfängt)
pub type CommandReceiver = Receiver<'static, NoopRawMutex, CommandEnvelope, COMMAND_QUEUE_DEPTH>;

/// PubSubChannel für Status-Broadcasts
/// - 2: Nachrichten-Kapazität im Queue
/// - 6: Maximale Anzahl Subscribers (1 MQTT + bis zu 5 WebSockets)
/// - 1: Publisher (Controller Task)
pub type StatusChannel = PubSubChannel<NoopRawMutex, StatusSnapshot, 2, 6, 1>;

/// Publisher für Status-Broadcasts
pub type StatusPublisher = Publisher<'static, NoopRawMutex, StatusSnapshot, 2, 6, 1>;

/// Subscriber für Status-Broadcasts
pub type StatusSubscriber = Subscriber<'static, NoopRawMutex, StatusSnapshot, 2, 6, 1>;

/// PubSubChannel für Antworten an die Absender
/// - 4: Nachrichten-Kapazität im Queue
/// - 5: Subscribers (nur WebSockets)
/// - 1: Publisher (Controller Task)
pub type ReplyChannel = PubSubChannel<NoopRawMutex, ReplyMessage, 4, 5, 1>;

/// Publisher für Antworten
pub type ReplyPublisher = Publisher<'static, NoopRawMutex, ReplyMessage, 4, 5, 1>;

/// Subscriber für Antworten
pub type ReplySubscriber = Subscriber<'static, NoopRawMutex, ReplyMessage, 4, 5, 1>;
