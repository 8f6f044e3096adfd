//! Raw IOKit bindings used to talk to the SMC user client.

#![allow(non_camel_case_types, non_upper_case_globals)]

use libc::{c_char, c_void};

pub type kern_return_t = libc::c_int;
pub type mach_port_t = libc::c_uint;
pub type io_object_t = mach_port_t;
pub type io_service_t = io_object_t;
pub type io_iterator_t = io_object_t;
pub type io_connect_t = mach_port_t;
pub type CFMutableDictionaryRef = *mut c_void;

pub const KERN_SUCCESS: kern_return_t = 0;
pub const MACH_PORT_NULL: mach_port_t = 0;
pub const IO_OBJECT_NULL: io_object_t = 0;
pub const kIOMasterPortDefault: mach_port_t = MACH_PORT_NULL;

/// Structured-method index of the SMC user client's call entry point.
pub const KERNEL_INDEX_SMC: u32 = 2;

#[link(name = "IOKit", kind = "framework")]
extern "C" {
    pub fn IOServiceMatching(name: *const c_char) -> CFMutableDictionaryRef;
    pub fn IOServiceGetMatchingService(
        main_port: mach_port_t,
        matching: CFMutableDictionaryRef,
    ) -> io_service_t;
    pub fn IOServiceOpen(
        service: io_service_t,
        owning_task: mach_port_t,
        conn_type: u32,
        connect: *mut io_connect_t,
    ) -> kern_return_t;
    pub fn IOServiceClose(connect: io_connect_t) -> kern_return_t;
    pub fn IOObjectRelease(object: io_object_t) -> kern_return_t;
    pub fn IOConnectCallStructMethod(
        connection: io_connect_t,
        selector: u32,
        input: *const c_void,
        input_size: usize,
        output: *mut c_void,
        output_size: *mut usize,
    ) -> kern_return_t;
}

extern "C" {
    static mach_task_self_: mach_port_t;
}

#[inline]
pub fn mach_task_self() -> mach_port_t {
    // SAFETY: initialised by the runtime before main and never written afterwards
    unsafe { mach_task_self_ }
}
