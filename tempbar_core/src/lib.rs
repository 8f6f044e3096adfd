#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::cast_possible_truncation,
    clippy::module_name_repetitions,
    clippy::wildcard_imports
)]

//! Reads temperature sensors from the Apple System Management Controller.
//!
//! A read is two calls through the SMC user client: one to learn the key's type and size, one to
//! fetch the bytes. The bytes are then decoded from `sp78` fixed point or big-endian `flt `.

pub mod catalog;
pub mod error;
mod key;
mod monitor;
pub mod probe;
pub mod smc;

pub use catalog::{Sensor, SensorGroup, SENSORS};
pub use error::{ConnectionError, DecodeError, IoReturn, SensorError};
pub use key::{DataType, SensorKey};
pub use monitor::Monitor;
