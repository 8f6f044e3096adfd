//! Filters the catalog down to the sensors that currently answer.

use crate::{catalog::Sensor, error::SensorError, SensorKey};

/// Returns the sensors for which `read` succeeds, in catalog order.
///
/// Failures of any kind exclude the sensor silently. The result can differ between runs and
/// between machine models.
pub fn available_sensors<'a, I, F>(catalog: I, mut read: F) -> Vec<Sensor>
where
    I: IntoIterator<Item = &'a Sensor>,
    F: FnMut(SensorKey) -> Result<f64, SensorError>,
{
    catalog
        .into_iter()
        .filter(|sensor| match read(sensor.key) {
            Ok(_) => true,
            Err(err) => {
                if !err.is_not_found() {
                    log::debug!("excluding {} ({}): {}", sensor.key, sensor.name, err);
                }
                false
            }
        })
        .copied()
        .collect()
}
