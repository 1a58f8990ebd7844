//! headers/permissions.rs
//! Capability registry for the 64-bit PERMISSIONS word.
//!
//! The bit positions are shared with the kernel that enforces them. Changing
//! one here grants or denies the wrong peripheral on the device, so the table
//! is a fixed compile-time registry and the tests pin every entry.

use std::fmt;
use std::str::FromStr;
use num_enum::TryFromPrimitive;
use serde::{Deserialize, Serialize};

use crate::headers::flags::Mutation;
use crate::headers::types::{HeaderError, TbfHeader};

/// Hardware capability, valued by its bit position in the permissions word.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, TryFromPrimitive, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Permission {
    Alarm                 = 0,
    Console               = 1,
    Led                   = 2,
    Button                = 3,
    Gpio                  = 4,
    Adc                   = 5,
    Dac                   = 6,
    AnalogComparator      = 7,
    Spi                   = 8,
    UsbUser               = 9,
    I2cMasterSlave        = 10,
    BleAdvertising        = 11,
    Rng                   = 12,
    Crc                   = 13,
    I2cMaster             = 14,
    AppFlash              = 15,
    NvmStorage            = 16,
    SdCard                = 17,
    Temperature           = 18,
    Humidity              = 19,
    AmbientLight          = 20,
    Ninedof               = 21,
    Tsl2561               = 22,
    Tmp006                = 23,
    Lps25hb               = 24,
    Ltc294x               = 25,
    Max17205              = 26,
    Pca9544a              = 27,
    GpioAsync             = 28,
    Nrf51822Serialization = 29,
}

impl Permission {
    /// Every registered capability, in bit order.
    pub const ALL: [Permission; 30] = [
        Permission::Alarm,
        Permission::Console,
        Permission::Led,
        Permission::Button,
        Permission::Gpio,
        Permission::Adc,
        Permission::Dac,
        Permission::AnalogComparator,
        Permission::Spi,
        Permission::UsbUser,
        Permission::I2cMasterSlave,
        Permission::BleAdvertising,
        Permission::Rng,
        Permission::Crc,
        Permission::I2cMaster,
        Permission::AppFlash,
        Permission::NvmStorage,
        Permission::SdCard,
        Permission::Temperature,
        Permission::Humidity,
        Permission::AmbientLight,
        Permission::Ninedof,
        Permission::Tsl2561,
        Permission::Tmp006,
        Permission::Lps25hb,
        Permission::Ltc294x,
        Permission::Max17205,
        Permission::Pca9544a,
        Permission::GpioAsync,
        Permission::Nrf51822Serialization,
    ];

    /// Registry name, as the kernel and the loader spell it.
    pub const fn name(self) -> &'static str {
        match self {
            Permission::Alarm => "ALARM",
            Permission::Console => "CONSOLE",
            Permission::Led => "LED",
            Permission::Button => "BUTTON",
            Permission::Gpio => "GPIO",
            Permission::Adc => "ADC",
            Permission::Dac => "DAC",
            Permission::AnalogComparator => "ANALOG_COMPARATOR",
            Permission::Spi => "SPI",
            Permission::UsbUser => "USB_USER",
            Permission::I2cMasterSlave => "I2C_MASTER_SLAVE",
            Permission::BleAdvertising => "BLE_ADVERTISING",
            Permission::Rng => "RNG",
            Permission::Crc => "CRC",
            Permission::I2cMaster => "I2C_MASTER",
            Permission::AppFlash => "APP_FLASH",
            Permission::NvmStorage => "NVM_STORAGE",
            Permission::SdCard => "SD_CARD",
            Permission::Temperature => "TEMPERATURE",
            Permission::Humidity => "HUMIDITY",
            Permission::AmbientLight => "AMBIENT_LIGHT",
            Permission::Ninedof => "NINEDOF",
            Permission::Tsl2561 => "TSL2561",
            Permission::Tmp006 => "TMP006",
            Permission::Lps25hb => "LPS25HB",
            Permission::Ltc294x => "LTC294X",
            Permission::Max17205 => "MAX17205",
            Permission::Pca9544a => "PCA9544A",
            Permission::GpioAsync => "GPIO_ASYNC",
            Permission::Nrf51822Serialization => "NRF51822_SERIALIZATION",
        }
    }

    #[inline]
    pub const fn bit(self) -> u8 {
        self as u8
    }

    #[inline]
    pub const fn mask(self) -> u64 {
        1u64 << self.bit()
    }

    /// Case-insensitive registry lookup.
    pub fn lookup(name: &str) -> Option<Permission> {
        Permission::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Permission {
    type Err = HeaderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Permission::lookup(s).ok_or_else(|| HeaderError::UnknownPermission { name: s.to_string() })
    }
}

impl TbfHeader {
    /// Whether `permission` is granted. Headers without a permissions word grant nothing.
    pub fn permission(&self, permission: Permission) -> bool {
        match self {
            TbfHeader::V2(h) if h.valid => {
                (h.permissions.unwrap_or(0) & permission.mask()) != 0
            }
            _ => false,
        }
    }

    pub fn permission_by_name(&self, name: &str) -> Result<bool, HeaderError> {
        Ok(self.permission(name.parse()?))
    }

    /// Grant or revoke one capability. A header with no permissions word gets one.
    pub fn set_permission(&mut self, permission: Permission, value: bool) -> Mutation {
        let h = match self.writable_v2() {
            Ok(h) => h,
            Err(skip) => return Mutation::Skipped(skip),
        };

        let word = h.permissions.get_or_insert(0);
        if value {
            *word |= permission.mask();
        } else {
            *word &= !permission.mask();
        }
        Mutation::Applied
    }

    /// Name-based setter for tool input. Unknown names are an error even when the
    /// header itself could not be changed.
    pub fn set_permission_by_name(&mut self, name: &str, value: bool) -> Result<Mutation, HeaderError> {
        let permission: Permission = name.parse()?;
        Ok(self.set_permission(permission, value))
    }

    /// Granted capabilities in bit order.
    pub fn granted_permissions(&self) -> Vec<Permission> {
        Permission::ALL
            .into_iter()
            .filter(|p| self.permission(*p))
            .collect()
    }
}
