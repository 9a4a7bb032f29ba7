// Task-Modul: Enthält alle Embassy Tasks
//
// Jeder Task läuft asynchron und unabhängig.
// Tasks kommunizieren über Embassy Channels
// (WebSocket → Controller, Controller → MQTT + WebSocket).

pub mod controller;
pub mod http;
pub mod mqtt;
pub mod wifi;

// Re-export Tasks für einfachen Import
pub use controller::{phase_controller_logic, phase_controller_task};
pub use http::http_server_task;
pub use mqtt::mqtt_task;
pub use wifi::{connection_task, dhcp_task, net_task};
