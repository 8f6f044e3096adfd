//! Interface around Apple's SMC API.
//!
//! # References
//! * <https://github.com/shurizzle/rust-smc>
//! * <https://github.com/exelban/stats/blob/master/SMC/smc.swift>

mod channel;
pub mod conv;
pub mod frame;
#[cfg(target_os = "macos")]
mod sys;

pub use self::channel::{SmcChannel, SERVICE_NAMES};
use self::frame::{KeyInfo, Selector, SmcFrame, RESULT_KEY_NOT_FOUND, RESULT_SUCCESS};
use crate::{
    error::{IoReturn, SensorError},
    SensorKey,
};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// One request/response round trip through the SMC user client.
///
/// The sub-opcode travels in [`SmcFrame::selector`]. On success the implementation copies the
/// response's result byte, key info and value buffer back into `frame`; on failure the raw kernel
/// code is returned unchanged.
pub trait Transport: Send {
    fn call(&mut self, frame: &mut SmcFrame) -> Result<(), IoReturn>;

    /// Whether the underlying handle is valid.
    fn is_open(&self) -> bool;

    /// Releases the handle. Calling this more than once is a no-op.
    fn close(&mut self);
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn call(&mut self, frame: &mut SmcFrame) -> Result<(), IoReturn> {
        (**self).call(frame)
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    fn close(&mut self) {
        (**self).close();
    }
}

/// A raw value read from the SMC, along with the shape it was read with.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RawValue {
    pub info: KeyInfo,
    pub bytes: [u8; frame::DATA_SIZE],
}

impl RawValue {
    /// The meaningful leading bytes.
    pub fn data(&self) -> &[u8] {
        &self.bytes[..(self.info.data_size as usize).min(frame::DATA_SIZE)]
    }

    pub fn temperature(&self) -> Result<f64, crate::error::DecodeError> {
        conv::decode(self.info.data_type, self.info.data_size, self.data())
    }
}

/// Serializes access to a [`Transport`] and implements the two-phase read.
pub struct Smc<T: Transport> {
    transport: Mutex<T>,
}

impl<T: Transport> Smc<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport: Mutex::new(transport),
        }
    }

    fn lock(&self) -> MutexGuard<'_, T> {
        self.transport.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_open(&self) -> bool {
        self.lock().is_open()
    }

    pub fn close(&self) {
        self.lock().close();
    }

    /// Fetches the type and size of `key`.
    pub fn key_information(&self, key: SensorKey) -> Result<KeyInfo, SensorError> {
        let mut transport = self.lock();
        Self::key_information_locked(&mut *transport, key)
    }

    /// Reads the raw value of `key`. Both phases run under one lock so concurrent reads of other
    /// keys cannot interleave between them.
    pub fn read_key(&self, key: SensorKey) -> Result<RawValue, SensorError> {
        let mut transport = self.lock();
        let info = Self::key_information_locked(&mut *transport, key)?;

        let mut frame = SmcFrame::request(key, Selector::ReadKey);
        frame.key_info = info;
        call_checked(&mut *transport, &mut frame)?;

        // the shape from phase one is authoritative, whatever the read echoes back
        let value = RawValue {
            info,
            bytes: frame.bytes,
        };
        log::debug!("read {}: {:02x?}", key, value.data());
        Ok(value)
    }

    pub fn temperature(&self, key: SensorKey) -> Result<f64, SensorError> {
        self.read_key(key)?
            .temperature()
            .map_err(|source| SensorError::Decode { key, source })
    }

    fn key_information_locked(transport: &mut T, key: SensorKey) -> Result<KeyInfo, SensorError> {
        let mut frame = SmcFrame::request(key, Selector::GetKeyInfo);
        call_checked(transport, &mut frame)?;
        log::debug!(
            "{} is {:?} with {} bytes",
            key,
            frame.key_info.data_type,
            frame.key_info.data_size
        );

        Ok(frame.key_info)
    }
}

/// Runs one call and classifies the outcome.
fn call_checked<T: Transport + ?Sized>(
    transport: &mut T,
    frame: &mut SmcFrame,
) -> Result<(), SensorError> {
    let key = frame.key;
    if !transport.is_open() {
        return Err(SensorError::NotConnected);
    }

    transport
        .call(frame)
        .map_err(|code| SensorError::Transport { key, code })?;

    match frame.result {
        RESULT_SUCCESS => Ok(()),
        RESULT_KEY_NOT_FOUND => Err(SensorError::KeyNotFound(key)),
        code => Err(SensorError::OperationFailed { key, code }),
    }
}
