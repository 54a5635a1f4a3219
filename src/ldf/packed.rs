use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{LdfError, Result};
use crate::ldf::shift_mode::ShiftMode;

/// Sign-extends the low 24 bits.
#[inline]
fn i24_from_bytes(b: [u8; 3]) -> i32 {
    let raw = ((b[0] as u32) << 16) | ((b[1] as u32) << 8) | b[2] as u32;
    ((raw << 8) as i32) >> 8
}

#[inline]
fn i24_to_bytes(v: i32) -> [u8; 3] {
    let raw = v as u32;
    [(raw >> 16) as u8, (raw >> 8) as u8, raw as u8]
}

fn parse_word(s: &str) -> Result<[u8; 32]> {
    let trimmed = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(trimmed).map_err(|_| LdfError::InvalidParams("not valid hex"))?;
    if bytes.len() > 32 {
        return Err(LdfError::InvalidParams("packed record longer than 32 bytes"));
    }
    // short inputs are left-aligned and zero padded on the right
    let mut word = [0u8; 32];
    word[..bytes.len()].copy_from_slice(&bytes);
    Ok(word)
}

/// Per-pool shape configuration, packed big-endian into one 32-byte word.
///
/// Byte 0 always carries the shift-mode tag; the rest is shape specific.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LdfParams(pub [u8; 32]);

impl LdfParams {
    pub fn from_hex(s: &str) -> Result<Self> {
        parse_word(s).map(LdfParams)
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    pub fn shift_mode(&self) -> Result<ShiftMode> {
        ShiftMode::try_from(self.0[0])
    }

    pub fn u8_at(&self, offset: usize) -> u8 {
        self.0[offset]
    }

    pub fn i16_at(&self, offset: usize) -> i16 {
        i16::from_be_bytes([self.0[offset], self.0[offset + 1]])
    }

    pub fn i24_at(&self, offset: usize) -> i32 {
        i24_from_bytes([self.0[offset], self.0[offset + 1], self.0[offset + 2]])
    }

    pub fn u32_at(&self, offset: usize) -> u32 {
        u32::from_be_bytes([
            self.0[offset],
            self.0[offset + 1],
            self.0[offset + 2],
            self.0[offset + 3],
        ])
    }

    pub fn with_shift_mode(self, mode: ShiftMode) -> Self {
        self.with_u8(0, mode as u8)
    }

    pub fn with_u8(mut self, offset: usize, v: u8) -> Self {
        self.0[offset] = v;
        self
    }

    pub fn with_i16(mut self, offset: usize, v: i16) -> Self {
        self.0[offset..offset + 2].copy_from_slice(&v.to_be_bytes());
        self
    }

    /// Values outside the int24 range are truncated to their low 24 bits.
    pub fn with_i24(mut self, offset: usize, v: i32) -> Self {
        self.0[offset..offset + 3].copy_from_slice(&i24_to_bytes(v));
        self
    }

    pub fn with_u32(mut self, offset: usize, v: u32) -> Self {
        self.0[offset..offset + 4].copy_from_slice(&v.to_be_bytes());
        self
    }
}

/// Persisted per-pool state.
///
/// Byte 0 is the initialized flag, bytes 1..=3 the last anchor as int24.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LdfState(pub [u8; 32]);

impl LdfState {
    pub fn from_hex(s: &str) -> Result<Self> {
        parse_word(s).map(LdfState)
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Fresh initialized state remembering `tick`.
    pub fn with_anchor(tick: i32) -> Self {
        let mut word = [0u8; 32];
        word[0] = 1;
        word[1..4].copy_from_slice(&i24_to_bytes(tick));
        LdfState(word)
    }

    pub fn is_initialized(&self) -> bool {
        self.0[0] == 1
    }

    pub fn last_tick(&self) -> i32 {
        i24_from_bytes([self.0[1], self.0[2], self.0[3]])
    }
}

macro_rules! hex_word_impls {
    ($name:ident) => {
        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.to_hex())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_hex())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                $name::from_hex(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

hex_word_impls!(LdfParams);
hex_word_impls!(LdfState);
