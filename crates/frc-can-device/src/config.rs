//! Startup configuration.
//!
//! The host reads the configuration document however it likes and passes the
//! text in; the core never touches the filesystem.
//!
//! ```json
//! {
//!     "frc_device_type": 10,
//!     "frc_manufacturer": 8,
//!     "device_number": 1
//! }
//! ```

use frc_can_protocol::{Address, DeviceType, Manufacturer};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default bus bit rate in bits per second.
pub const DEFAULT_BAUD_RATE: u32 = 1_000_000;

/// Configuration for one physical device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Device type code (5 bits).
    #[serde(rename = "frc_device_type")]
    pub device_type: u8,
    /// Manufacturer code.
    #[serde(rename = "frc_manufacturer")]
    pub manufacturer: u8,
    /// Device number (6 bits).
    pub device_number: u8,
    /// Bus bit rate, handed to [`BusTransport::configure`](crate::BusTransport::configure)
    /// when the device starts.
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
}

fn default_baud_rate() -> u32 {
    DEFAULT_BAUD_RATE
}

impl Default for DeviceConfig {
    fn default() -> Self {
        DeviceConfig {
            device_type: DeviceType::Miscellaneous.as_u8(),
            manufacturer: Manufacturer::TeamUse.as_u8(),
            device_number: 0,
            baud_rate: DEFAULT_BAUD_RATE,
        }
    }
}

impl DeviceConfig {
    /// Create a configuration for an address at the default bit rate.
    pub fn new(device_type: u8, manufacturer: u8, device_number: u8) -> Self {
        DeviceConfig {
            device_type,
            manufacturer,
            device_number,
            ..Default::default()
        }
    }

    /// Parse a JSON configuration document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: DeviceConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the address fits the identifier layout.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.address()?;
        Ok(())
    }

    /// This device's bus address.
    pub fn address(&self) -> Result<Address, ConfigError> {
        Address::new(self.device_type, self.manufacturer, self.device_number)
            .map_err(ConfigError::InvalidAddress)
    }
}
