//! Common types used in the protocol.

use crate::constants::*;
use crate::error::{ProtocolError, ProtocolResult};

/// Address of a physical node on the bus.
///
/// Each field is guaranteed to fit its bit width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Address {
    device_type: u8,
    manufacturer: u8,
    device_number: u8,
}

impl Address {
    /// Create an address, validating each field against its width.
    pub fn new(device_type: u8, manufacturer: u8, device_number: u8) -> ProtocolResult<Self> {
        if device_type > DEVICE_TYPE_MAX {
            return Err(ProtocolError::out_of_range(
                "device_type",
                device_type,
                DEVICE_TYPE_MAX,
            ));
        }
        if device_number > DEVICE_NUMBER_MAX {
            return Err(ProtocolError::out_of_range(
                "device_number",
                device_number,
                DEVICE_NUMBER_MAX,
            ));
        }
        Ok(Address {
            device_type,
            manufacturer,
            device_number,
        })
    }

    /// Build from fields already masked to their widths.
    pub(crate) const fn from_masked(device_type: u8, manufacturer: u8, device_number: u8) -> Self {
        Address {
            device_type: device_type & DEVICE_TYPE_MAX,
            manufacturer,
            device_number: device_number & DEVICE_NUMBER_MAX,
        }
    }

    /// Device type (5 bits).
    pub const fn device_type(&self) -> u8 {
        self.device_type
    }

    /// Manufacturer code (8 bits).
    pub const fn manufacturer(&self) -> u8 {
        self.manufacturer
    }

    /// Device number (6 bits).
    pub const fn device_number(&self) -> u8 {
        self.device_number
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "type={} mfg={} num={}",
            self.device_type, self.manufacturer, self.device_number
        )
    }
}

/// API class and index selecting a message within a device's API.
///
/// Stored as the flat 10-bit API id so the `(class, index)` and `api_id`
/// views cannot disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ApiSelector(u16);

impl ApiSelector {
    /// Create a selector from an API class and index.
    pub fn new(api_class: u8, api_index: u8) -> ProtocolResult<Self> {
        if api_class > API_CLASS_MAX {
            return Err(ProtocolError::out_of_range(
                "api_class",
                api_class,
                API_CLASS_MAX,
            ));
        }
        if api_index > API_INDEX_MAX {
            return Err(ProtocolError::out_of_range(
                "api_index",
                api_index,
                API_INDEX_MAX,
            ));
        }
        Ok(ApiSelector(
            ((api_class as u16) << API_INDEX_BITS) | api_index as u16,
        ))
    }

    /// Create a selector from a flat API id.
    pub fn from_api_id(api_id: u16) -> ProtocolResult<Self> {
        if api_id > API_ID_MAX {
            return Err(ProtocolError::out_of_range("api_id", api_id, API_ID_MAX));
        }
        Ok(ApiSelector(api_id))
    }

    pub(crate) const fn from_masked(api_id: u16) -> Self {
        ApiSelector(api_id & API_ID_MAX)
    }

    /// Flat 10-bit API id: `(api_class << 4) | api_index`.
    pub const fn api_id(&self) -> u16 {
        self.0
    }

    /// API class (upper 6 bits of the API id).
    pub const fn api_class(&self) -> u8 {
        (self.0 >> API_INDEX_BITS) as u8
    }

    /// API index (lower 4 bits of the API id).
    pub const fn api_index(&self) -> u8 {
        (self.0 & API_INDEX_MAX as u16) as u8
    }
}

/// Category a received frame is classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MessageCategory {
    /// Addressed to all devices (manufacturer 0).
    Broadcast,
    /// Robot controller heartbeat (manufacturer 1).
    Heartbeat,
    /// Any other manufacturer.
    Device,
}

impl MessageCategory {
    /// Category implied by a manufacturer code.
    pub const fn from_manufacturer(manufacturer: u8) -> Self {
        match manufacturer {
            BROADCAST_MANUFACTURER => MessageCategory::Broadcast,
            HEARTBEAT_MANUFACTURER => MessageCategory::Heartbeat,
            _ => MessageCategory::Device,
        }
    }

    /// Returns the category as a lowercase string.
    pub const fn as_str(&self) -> &'static str {
        match self {
            MessageCategory::Broadcast => "broadcast",
            MessageCategory::Heartbeat => "heartbeat",
            MessageCategory::Device => "device",
        }
    }
}

impl std::fmt::Display for MessageCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Defines a `u8`-coded protocol enumeration with lossless conversions.
macro_rules! coded_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident = $code:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u8)]
        pub enum $name {
            $($(#[$vmeta])* $variant = $code,)+
        }

        impl $name {
            /// Look up a variant by its wire code.
            pub const fn from_u8(code: u8) -> Option<Self> {
                match code {
                    $($code => Some($name::$variant),)+
                    _ => None,
                }
            }

            /// Wire code of this variant.
            pub const fn as_u8(self) -> u8 {
                self as u8
            }
        }

        impl From<$name> for u8 {
            fn from(value: $name) -> Self {
                value.as_u8()
            }
        }
    };
}

coded_enum! {
    /// Registered device types.
    pub enum DeviceType {
        BroadcastMessages = 0,
        RobotController = 1,
        MotorController = 2,
        RelayController = 3,
        GyroSensor = 4,
        Accelerometer = 5,
        UltrasonicSensor = 6,
        GearToothSensor = 7,
        PowerDistributionModule = 8,
        PneumaticsController = 9,
        Miscellaneous = 10,
        IOBreakout = 11,
        FirmwareUpdate = 31,
    }
}

coded_enum! {
    /// Registered manufacturer codes.
    pub enum Manufacturer {
        Broadcast = 0,
        NationalInstruments = 1,
        LuminaryMicro = 2,
        DEKA = 3,
        CTRElectronics = 4,
        REVRobotics = 5,
        Grapple = 6,
        MindSensors = 7,
        TeamUse = 8,
        KauaiLabs = 9,
        Copperforge = 10,
        PlayingWithFusion = 11,
        Studica = 12,
        TheThriftyBot = 13,
        ReduxRobotics = 14,
        AndyMark = 15,
        VividHosting = 16,
    }
}

coded_enum! {
    /// Commands carried by broadcast frames.
    pub enum BroadcastCommand {
        /// Disable all devices immediately.
        Disable = 0,
        SystemHalt = 1,
        SystemReset = 2,
        DeviceAssign = 3,
        DeviceQuery = 4,
        Heartbeat = 5,
        Sync = 6,
        Update = 7,
        FirmwareVersion = 8,
        Enumerate = 9,
        SystemResume = 10,
    }
}

/// Application API ids understood by this device.
pub mod api_ids {
    /// Request a status reply.
    pub const STATUS_REQUEST: u16 = 0x00;
    /// Status reply sent in response to [`STATUS_REQUEST`].
    pub const STATUS_REPLY: u16 = 0x01;
    /// Change the device number.
    pub const SET_DEVICE_NUMBER: u16 = 0x10;
    /// Configure the pixel array (brightness in byte 6, count in byte 7).
    pub const INIT_PIXEL_ARRAY: u16 = 0x11;
    pub const PATTERN_CHAOS: u16 = 0x20;
    pub const PATTERN_RAINBOW: u16 = 0x21;
    pub const PATTERN_SOLID: u16 = 0x22;
    pub const PATTERN_BLINK: u16 = 0x23;
    pub const PATTERN_INTENSITY: u16 = 0x24;
    pub const PATTERN_SCANNER: u16 = 0x25;
    pub const PATTERN_ALTERNATING: u16 = 0x26;
    pub const PATTERN_CHASE: u16 = 0x27;
    /// Button press notification.
    pub const BUTTON_PRESS: u16 = 0x30;
}
