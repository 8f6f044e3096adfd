//! The fixed table of known temperature sensors.

use crate::{key, SensorKey};
use std::collections::HashMap;

/// Represents a common group of sensors.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum SensorGroup {
    /// A CPU sensor.
    Cpu,
    /// A GPU sensor.
    Gpu,
    /// A battery sensor.
    Battery,
    /// A storage sensor.
    Drive,
    /// A memory sensor.
    Memory,
    /// Anything else on the logic board.
    System,
}

impl SensorGroup {
    /// The icon tag the display layer uses for this group.
    pub const fn icon(self) -> Option<&'static str> {
        match self {
            Self::Cpu => Some("cpu"),
            Self::Gpu => Some("gpu"),
            Self::Battery => Some("battery"),
            Self::Drive => Some("drive"),
            Self::Memory => Some("memory"),
            Self::System => None,
        }
    }
}

/// Represents a known sensor.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Sensor {
    /// The sensor's key.
    pub key: SensorKey,
    /// The friendly name of the sensor.
    pub name: &'static str,
    /// The sensor's group of hardware.
    pub group: SensorGroup,
    /// Icon tag, if the display layer has one for this sensor.
    pub icon: Option<&'static str>,
}

macro_rules! impl_sensor_group {
    ($name:ident $variant:ident) => {
        pub const fn $name(key: SensorKey, name: &'static str) -> Self {
            Self::new(key, name, SensorGroup::$variant)
        }
    };
}

impl Sensor {
    pub const fn new(key: SensorKey, name: &'static str, group: SensorGroup) -> Self {
        Self {
            key,
            name,
            group,
            icon: group.icon(),
        }
    }

    impl_sensor_group!(cpu Cpu);
    impl_sensor_group!(gpu Gpu);
    impl_sensor_group!(battery Battery);
    impl_sensor_group!(drive Drive);
    impl_sensor_group!(memory Memory);
    impl_sensor_group!(system System);

    /// Overrides the group's icon tag.
    pub const fn icon(mut self, icon: Option<&'static str>) -> Self {
        self.icon = icon;
        self
    }
}

/// Every sensor the application knows how to name.
///
/// Not every machine implements every key; see [`crate::probe`].
pub static SENSORS: [Sensor; 40] = [
    // CPU, Intel
    Sensor::cpu(key!("TC0P"), "CPU Proximity"),
    Sensor::cpu(key!("TC0D"), "CPU Die"),
    Sensor::cpu(key!("TC0E"), "CPU Die (Virtual)"),
    Sensor::cpu(key!("TC0F"), "CPU Die (Filtered)"),
    Sensor::cpu(key!("TC0H"), "CPU Heatsink"),
    Sensor::cpu(key!("TCAD"), "CPU Package"),
    Sensor::cpu(key!("TCXC"), "CPU PECI"),
    Sensor::cpu(key!("TC1C"), "CPU Core 1"),
    Sensor::cpu(key!("TC2C"), "CPU Core 2"),
    Sensor::cpu(key!("TC3C"), "CPU Core 3"),
    Sensor::cpu(key!("TC4C"), "CPU Core 4"),
    // CPU, Apple Silicon
    Sensor::cpu(key!("Tp09"), "CPU Efficiency Core 1"),
    Sensor::cpu(key!("Tp0T"), "CPU Efficiency Core 2"),
    Sensor::cpu(key!("Tp01"), "CPU Performance Core 1"),
    Sensor::cpu(key!("Tp05"), "CPU Performance Core 2"),
    Sensor::cpu(key!("Tp0D"), "CPU Performance Core 3"),
    Sensor::cpu(key!("Tp0H"), "CPU Performance Core 4"),
    // GPU
    Sensor::gpu(key!("TG0P"), "GPU Proximity"),
    Sensor::gpu(key!("TG0D"), "GPU Die"),
    Sensor::gpu(key!("TG0H"), "GPU Heatsink"),
    Sensor::gpu(key!("TCGC"), "GPU Intel Graphics"),
    Sensor::gpu(key!("TGDD"), "GPU AMD Radeon"),
    Sensor::gpu(key!("Tg05"), "GPU Cluster 1"),
    Sensor::gpu(key!("Tg0D"), "GPU Cluster 2"),
    // Memory
    Sensor::memory(key!("TM0P"), "Memory Proximity"),
    Sensor::memory(key!("TM0S"), "Memory Slot 1"),
    Sensor::memory(key!("Tm02"), "Memory Bank 1"),
    // Storage
    Sensor::drive(key!("TH0P"), "Drive Proximity"),
    Sensor::drive(key!("TH0a"), "SSD A"),
    Sensor::drive(key!("TH0b"), "SSD B"),
    // Battery
    Sensor::battery(key!("TB0T"), "Battery"),
    Sensor::battery(key!("TB1T"), "Battery Cell 1"),
    Sensor::battery(key!("TB2T"), "Battery Cell 2"),
    // Logic board
    Sensor::system(key!("TA0P"), "Ambient"),
    Sensor::system(key!("Tm0P"), "Mainboard"),
    Sensor::system(key!("TN0P"), "Northbridge Proximity"),
    Sensor::system(key!("TPCD"), "Platform Controller Hub Die"),
    Sensor::system(key!("Tp0P"), "Power Supply Proximity"),
    Sensor::system(key!("TW0P"), "Airport").icon(Some("wifi")),
    Sensor::system(key!("Ts0P"), "Palm Rest"),
];

lazy_static::lazy_static! {
    static ref BY_KEY: HashMap<SensorKey, &'static Sensor> =
        SENSORS.iter().map(|sensor| (sensor.key, sensor)).collect();
}

/// Finds the catalog entry for `key`.
pub fn lookup(key: SensorKey) -> Option<&'static Sensor> {
    BY_KEY.get(&key).copied()
}
