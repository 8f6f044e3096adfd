//! The entry point used by display code.

use crate::{
    catalog::{Sensor, SENSORS},
    error::{ConnectionError, SensorError},
    probe,
    smc::{Smc, SmcChannel, Transport},
    SensorKey,
};

/// A hardware monitor holding the process-wide SMC connection.
///
/// All methods take `&self`; share it behind an `Arc` between the polling thread and whatever
/// else needs to read.
pub struct Monitor {
    smc: Smc<Box<dyn Transport>>,
    catalog: &'static [Sensor],
}

impl Monitor {
    /// Opens the SMC connection. Failure here is fatal: no sensor can ever be read.
    pub fn initialize() -> Result<Self, ConnectionError> {
        Ok(Self::with_transport(SmcChannel::open()?))
    }

    /// Builds a monitor on top of an already-open transport.
    pub fn with_transport<T: Transport + 'static>(transport: T) -> Self {
        let transport: Box<dyn Transport> = Box::new(transport);
        Self {
            smc: Smc::new(transport),
            catalog: &SENSORS,
        }
    }

    /// Replaces the sensor table consulted by [`Monitor::list_available_sensors`].
    #[must_use]
    pub fn with_catalog(mut self, catalog: &'static [Sensor]) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn catalog(&self) -> &'static [Sensor] {
        self.catalog
    }

    /// Reads one sensor in degrees Celsius.
    pub fn read_temperature(&self, key: &str) -> Result<f64, SensorError> {
        let key = SensorKey::parse(key).ok_or_else(|| SensorError::InvalidKey(key.to_string()))?;
        self.read_key(key)
    }

    /// Same as [`Monitor::read_temperature`] for an already parsed key.
    pub fn read_key(&self, key: SensorKey) -> Result<f64, SensorError> {
        let result = self.smc.temperature(key);
        if let Err(err) = &result {
            match err {
                SensorError::KeyNotFound(_) => log::debug!("{}", err),
                _ => log::warn!("{}", err),
            }
        }
        result
    }

    /// The catalog entries that can currently be read, in catalog order.
    pub fn list_available_sensors(&self) -> Vec<Sensor> {
        probe::available_sensors(self.catalog, |key| self.smc.temperature(key))
    }

    pub fn is_connected(&self) -> bool {
        self.smc.is_open()
    }

    /// Releases the connection. Later reads fail with [`SensorError::NotConnected`].
    pub fn shutdown(&self) {
        self.smc.close();
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        self.shutdown();
    }
}
