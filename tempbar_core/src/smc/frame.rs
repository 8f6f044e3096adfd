//! The parameter block exchanged with the SMC user client.
//!
//! The kernel expects the C layout of `SMCParamStruct`. Rather than transmuting a `#[repr(C)]`
//! struct, the block is serialized field by field at fixed offsets so the layout is explicit:
//!
//! ```text
//! offset  size  field
//!      0     4  key
//!      4     6  version { major, minor, build, reserved, release: u16 }
//!     12    16  p-limit { version: u16, length: u16, cpu: u32, gpu: u32, mem: u32 }
//!     28     4  key_info.data_size
//!     32     4  key_info.data_type
//!     36     1  key_info.attributes
//!     40     1  result
//!     41     1  status
//!     42     1  selector
//!     44     4  data32
//!     48    32  bytes
//! ```
//!
//! Multi-byte fields use the host byte order, as the kernel reads them from memory.

use crate::{DataType, SensorKey};

/// Total size of the parameter block.
pub const FRAME_SIZE: usize = 80;
/// Size of the value buffer.
pub const DATA_SIZE: usize = 32;

const KEY: usize = 0;
const VERSION: usize = 4;
const P_LIMIT: usize = 12;
const INFO_SIZE: usize = 28;
const INFO_TYPE: usize = 32;
const INFO_ATTRIBUTES: usize = 36;
const RESULT: usize = 40;
const STATUS: usize = 41;
const SELECTOR: usize = 42;
const DATA32: usize = 44;
const BYTES: usize = 48;

/// SMC result byte for success.
pub const RESULT_SUCCESS: u8 = 0;
/// SMC result byte for a key this machine does not implement.
pub const RESULT_KEY_NOT_FOUND: u8 = 132;

/// Sub-opcodes understood by the SMC user client.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Selector {
    #[default]
    Unknown = 0,
    ReadKey = 5,
    GetKeyInfo = 9,
}

impl Selector {
    const fn from_u8(value: u8) -> Self {
        match value {
            5 => Self::ReadKey,
            9 => Self::GetKeyInfo,
            _ => Self::Unknown,
        }
    }
}

bitflags::bitflags! {
    /// Access attributes reported alongside a key's type.
    pub struct KeyAttributes: u8 {
        const PRIVATE_WRITE = 0x01;
        const PRIVATE_READ = 0x02;
        const ATOMIC = 0x04;
        const CONST = 0x08;
        const FUNCTION = 0x10;
        const WRITE = 0x40;
        const READ = 0x80;
    }
}

impl Default for KeyAttributes {
    fn default() -> Self {
        Self::empty()
    }
}

/// Shape of a key's value, as reported by the key-info call.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct KeyInfo {
    /// Number of meaningful leading bytes in the value buffer (0-32).
    pub data_size: u32,
    pub data_type: DataType,
    pub attributes: KeyAttributes,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct SmcVersion {
    pub major: u8,
    pub minor: u8,
    pub build: u8,
    pub reserved: u8,
    pub release: u16,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct SmcPLimitData {
    pub version: u16,
    pub length: u16,
    pub cpu_plimit: u32,
    pub gpu_plimit: u32,
    pub mem_plimit: u32,
}

/// One request or response.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct SmcFrame {
    pub key: SensorKey,
    pub vers: SmcVersion,
    pub p_limit_data: SmcPLimitData,
    pub key_info: KeyInfo,
    pub result: u8,
    pub status: u8,
    pub selector: Selector,
    pub data32: u32,
    pub bytes: [u8; DATA_SIZE],
}

macro_rules! put {
    ($buf:ident, $at:expr, $v:expr) => {{
        let bytes = $v.to_ne_bytes();
        $buf[$at..$at + bytes.len()].copy_from_slice(&bytes);
    }};
}

macro_rules! get {
    ($buf:ident, $at:expr, $t:ty) => {{
        let mut bytes = [0_u8; std::mem::size_of::<$t>()];
        bytes.copy_from_slice(&$buf[$at..$at + std::mem::size_of::<$t>()]);
        <$t>::from_ne_bytes(bytes)
    }};
}

impl SmcFrame {
    /// A request frame for `key` with the given sub-opcode.
    pub fn request(key: SensorKey, selector: Selector) -> Self {
        Self {
            key,
            selector,
            ..Default::default()
        }
    }

    /// The leading `data_size` bytes of the value buffer, clamped to its capacity.
    pub fn data(&self) -> &[u8] {
        let len = (self.key_info.data_size as usize).min(DATA_SIZE);
        &self.bytes[..len]
    }

    pub fn encode(&self) -> [u8; FRAME_SIZE] {
        let mut buf = [0_u8; FRAME_SIZE];

        put!(buf, KEY, self.key.to_u32());
        buf[VERSION] = self.vers.major;
        buf[VERSION + 1] = self.vers.minor;
        buf[VERSION + 2] = self.vers.build;
        buf[VERSION + 3] = self.vers.reserved;
        put!(buf, VERSION + 4, self.vers.release);
        put!(buf, P_LIMIT, self.p_limit_data.version);
        put!(buf, P_LIMIT + 2, self.p_limit_data.length);
        put!(buf, P_LIMIT + 4, self.p_limit_data.cpu_plimit);
        put!(buf, P_LIMIT + 8, self.p_limit_data.gpu_plimit);
        put!(buf, P_LIMIT + 12, self.p_limit_data.mem_plimit);
        put!(buf, INFO_SIZE, self.key_info.data_size);
        put!(buf, INFO_TYPE, self.key_info.data_type.to_u32());
        buf[INFO_ATTRIBUTES] = self.key_info.attributes.bits();
        buf[RESULT] = self.result;
        buf[STATUS] = self.status;
        buf[SELECTOR] = self.selector as u8;
        put!(buf, DATA32, self.data32);
        buf[BYTES..].copy_from_slice(&self.bytes);

        buf
    }

    pub fn decode(buf: &[u8; FRAME_SIZE]) -> Self {
        let mut bytes = [0_u8; DATA_SIZE];
        bytes.copy_from_slice(&buf[BYTES..]);

        Self {
            key: SensorKey::from_u32(get!(buf, KEY, u32)),
            vers: SmcVersion {
                major: buf[VERSION],
                minor: buf[VERSION + 1],
                build: buf[VERSION + 2],
                reserved: buf[VERSION + 3],
                release: get!(buf, VERSION + 4, u16),
            },
            p_limit_data: SmcPLimitData {
                version: get!(buf, P_LIMIT, u16),
                length: get!(buf, P_LIMIT + 2, u16),
                cpu_plimit: get!(buf, P_LIMIT + 4, u32),
                gpu_plimit: get!(buf, P_LIMIT + 8, u32),
                mem_plimit: get!(buf, P_LIMIT + 12, u32),
            },
            key_info: KeyInfo {
                data_size: get!(buf, INFO_SIZE, u32),
                data_type: DataType::from_u32(get!(buf, INFO_TYPE, u32)),
                attributes: KeyAttributes::from_bits_truncate(buf[INFO_ATTRIBUTES]),
            },
            result: buf[RESULT],
            status: buf[STATUS],
            selector: Selector::from_u8(buf[SELECTOR]),
            data32: get!(buf, DATA32, u32),
            bytes,
        }
    }

    /// Copies the fields the kernel fills in from a response into this frame.
    pub fn absorb(&mut self, response: &Self) {
        self.result = response.result;
        self.status = response.status;
        self.key_info = response.key_info;
        self.bytes = response.bytes;
    }
}
