// Hardware Abstraction Layer (HAL) Module
//
// Implementiert die Traits aus esp-core für die reale Hardware:
// PCA9685 über I2C für die Ausgänge, Flash für die Phasen-Tabelle.

pub mod flash_storage;
pub mod pca9685;

pub use flash_storage::FlashPhaseStorage;
pub use pca9685::{Pca9685Writer, prescale_for};
