//! The IOKit connection to the SMC.

use super::{
    frame::{SmcFrame, FRAME_SIZE},
    Transport,
};
use crate::error::{ConnectionError, IoReturn};

/// Service names to match, in order. Apple Silicon machines only expose the keys endpoint.
pub const SERVICE_NAMES: [&str; 2] = ["AppleSMC", "AppleSMCKeysEndpoint"];

/// An open connection to the SMC kernel service.
///
/// The handle is released on [`Transport::close`] or on drop, whichever comes first.
#[derive(Debug)]
pub struct SmcChannel {
    conn: u32,
}

#[cfg(target_os = "macos")]
mod imp {
    use super::super::sys::*;
    use super::*;
    use std::{ffi::CString, os::raw::c_void};

    pub(super) fn find_service() -> Option<(io_service_t, &'static str)> {
        SERVICE_NAMES.iter().find_map(|name| {
            let name_c = CString::new(*name).ok()?;
            // SAFETY: IOServiceGetMatchingService consumes the matching dictionary
            let service = unsafe {
                IOServiceGetMatchingService(
                    kIOMasterPortDefault,
                    IOServiceMatching(name_c.as_ptr()),
                )
            };

            if service == IO_OBJECT_NULL {
                log::debug!("no SMC service named {}", name);
                None
            } else {
                Some((service, *name))
            }
        })
    }

    pub(super) fn open(service: io_service_t) -> Result<io_connect_t, IoReturn> {
        let mut conn: io_connect_t = MACH_PORT_NULL;
        let result = unsafe { IOServiceOpen(service, mach_task_self(), 0, &mut conn) };
        unsafe { IOObjectRelease(service) };

        if result == KERN_SUCCESS {
            Ok(conn)
        } else {
            Err(IoReturn(result))
        }
    }

    pub(super) fn call(
        conn: io_connect_t,
        input: &[u8; FRAME_SIZE],
    ) -> Result<[u8; FRAME_SIZE], IoReturn> {
        let mut output = [0_u8; FRAME_SIZE];
        let mut output_size = FRAME_SIZE;

        let result = unsafe {
            IOConnectCallStructMethod(
                conn,
                KERNEL_INDEX_SMC,
                input.as_ptr() as *const c_void,
                FRAME_SIZE,
                output.as_mut_ptr() as *mut c_void,
                &mut output_size,
            )
        };

        if result == KERN_SUCCESS {
            Ok(output)
        } else {
            Err(IoReturn(result))
        }
    }

    pub(super) fn close(conn: io_connect_t) {
        unsafe { IOServiceClose(conn) };
    }
}

#[cfg(not(target_os = "macos"))]
#[allow(dead_code)]
mod imp {
    use super::*;

    pub(super) fn find_service() -> Option<(u32, &'static str)> {
        None
    }

    pub(super) fn open(_service: u32) -> Result<u32, IoReturn> {
        Err(IoReturn(-1))
    }

    pub(super) fn call(
        _conn: u32,
        _input: &[u8; FRAME_SIZE],
    ) -> Result<[u8; FRAME_SIZE], IoReturn> {
        Err(IoReturn(-1))
    }

    pub(super) fn close(_conn: u32) {}
}

impl SmcChannel {
    /// Locates the SMC service and opens a connection to it.
    pub fn open() -> Result<Self, ConnectionError> {
        let (service, name) = imp::find_service().ok_or(ConnectionError::ServiceNotFound)?;
        let conn = imp::open(service).map_err(ConnectionError::ConnectionFailed)?;

        log::info!("opened SMC connection through {}", name);
        Ok(Self { conn })
    }
}

impl Transport for SmcChannel {
    fn call(&mut self, frame: &mut SmcFrame) -> Result<(), IoReturn> {
        let output = imp::call(self.conn, &frame.encode())?;
        frame.absorb(&SmcFrame::decode(&output));
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.conn != 0
    }

    fn close(&mut self) {
        if self.conn != 0 {
            imp::close(self.conn);
            log::info!("closed SMC connection");
            self.conn = 0;
        }
    }
}

impl Drop for SmcChannel {
    fn drop(&mut self) {
        self.close();
    }
}
