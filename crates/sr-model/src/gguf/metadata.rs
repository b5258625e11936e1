use std::collections::HashMap;
use std::io::Read;

use crate::error::{ModelError, Result};
use super::format::read_gguf_string;

/// A single GGUF metadata value.
#[derive(Debug, Clone)]
pub enum GgufMetadataValue {
    U8(u8),
    I8(i8),
    U16(u16),
    I16(i16),
    U32(u32),
    I32(i32),
    U64(u64),
    I64(i64),
    F32(f32),
    F64(f64),
    Bool(bool),
    String(String),
    Array(Vec<GgufMetadataValue>),
}

impl GgufMetadataValue {
    /// Returns a human-readable name for the variant (used in error messages).
    fn type_name(&self) -> &'static str {
        match self {
            GgufMetadataValue::U8(_) => "U8",
            GgufMetadataValue::I8(_) => "I8",
            GgufMetadataValue::U16(_) => "U16",
            GgufMetadataValue::I16(_) => "I16",
            GgufMetadataValue::U32(_) => "U32",
            GgufMetadataValue::I32(_) => "I32",
            GgufMetadataValue::U64(_) => "U64",
            GgufMetadataValue::I64(_) => "I64",
            GgufMetadataValue::F32(_) => "F32",
            GgufMetadataValue::F64(_) => "F64",
            GgufMetadataValue::Bool(_) => "Bool",
            GgufMetadataValue::String(_) => "String",
            GgufMetadataValue::Array(_) => "Array",
        }
    }
}

/// Collection of GGUF metadata key-value pairs.
#[derive(Debug)]
pub struct GgufMetadata {
    pub entries: HashMap<String, GgufMetadataValue>,
}

impl GgufMetadata {
    /// Retrieve a string value by key.
    pub fn get_string(&self, key: &str) -> Result<&str> {
        match self.entries.get(key) {
            Some(GgufMetadataValue::String(s)) => Ok(s.as_str()),
            Some(other) => Err(self.mismatch(key, "String", other)),
            None => Err(ModelError::MissingKey(key.to_string())),
        }
    }

    /// Retrieve a u32 value by key.
    pub fn get_u32(&self, key: &str) -> Result<u32> {
        match self.entries.get(key) {
            Some(GgufMetadataValue::U32(v)) => Ok(*v),
            Some(other) => Err(self.mismatch(key, "U32", other)),
            None => Err(ModelError::MissingKey(key.to_string())),
        }
    }

    /// Retrieve an f32 value by key.
    pub fn get_f32(&self, key: &str) -> Result<f32> {
        match self.entries.get(key) {
            Some(GgufMetadataValue::F32(v)) => Ok(*v),
            Some(other) => Err(self.mismatch(key, "F32", other)),
            None => Err(ModelError::MissingKey(key.to_string())),
        }
    }

    /// Retrieve a string array value by key.
    pub fn get_string_array(&self, key: &str) -> Result<Vec<String>> {
        match self.entries.get(key) {
            Some(GgufMetadataValue::Array(arr)) => {
                let mut result = Vec::with_capacity(arr.len());
                for (i, v) in arr.iter().enumerate() {
                    match v {
                        GgufMetadataValue::String(s) => result.push(s.clone()),
                        other => {
                            return Err(ModelError::TypeMismatch {
                                key: format!("{}[{}]", key, i),
                                expected: "String".to_string(),
                                got: other.type_name().to_string(),
                            });
                        }
                    }
                }
                Ok(result)
            }
            Some(other) => Err(self.mismatch(key, "Array", other)),
            None => Err(ModelError::MissingKey(key.to_string())),
        }
    }

    /// Retrieve an f32 array value by key.
    pub fn get_f32_array(&self, key: &str) -> Result<Vec<f32>> {
        match self.entries.get(key) {
            Some(GgufMetadataValue::Array(arr)) => {
                let mut result = Vec::with_capacity(arr.len());
                for (i, v) in arr.iter().enumerate() {
                    match v {
                        GgufMetadataValue::F32(f) => result.push(*f),
                        other => {
                            return Err(ModelError::TypeMismatch {
                                key: format!("{}[{}]", key, i),
                                expected: "F32".to_string(),
                                got: other.type_name().to_string(),
                            });
                        }
                    }
                }
                Ok(result)
            }
            Some(other) => Err(self.mismatch(key, "Array", other)),
            None => Err(ModelError::MissingKey(key.to_string())),
        }
    }

    fn mismatch(&self, key: &str, expected: &str, got: &GgufMetadataValue) -> ModelError {
        ModelError::TypeMismatch {
            key: key.to_string(),
            expected: expected.to_string(),
            got: got.type_name().to_string(),
        }
    }

    /// Parse `n_kv` key-value metadata entries from a reader.
    ///
    /// Each entry consists of:
    /// 1. A GGUF string key (u64 length + UTF-8 bytes).
    /// 2. A u32 value type ID.
    /// 3. The value payload, whose format depends on the type ID.
    ///
    /// GGUF value type IDs:
    ///   0=U8, 1=I8, 2=U16, 3=I16, 4=U32, 5=I32, 6=F32, 7=Bool,
    ///   8=String, 9=Array, 10=U64, 11=I64, 12=F64
    pub fn parse_kv(reader: &mut impl Read, n_kv: u64) -> Result<GgufMetadata> {
        let mut entries = HashMap::new();
        for _ in 0..n_kv {
            let key = read_gguf_string(reader)?;
            let mut buf4 = [0u8; 4];
            reader.read_exact(&mut buf4)?;
            let type_id = u32::from_le_bytes(buf4);
            let value = read_value(reader, type_id)?;
            entries.insert(key, value);
        }
        Ok(GgufMetadata { entries })
    }
}

/// Read a single GGUF metadata value given its type ID.
fn read_value(reader: &mut impl Read, type_id: u32) -> Result<GgufMetadataValue> {
    fn le_bytes<const N: usize>(reader: &mut impl Read) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        reader.read_exact(&mut buf)?;
        Ok(buf)
    }

    match type_id {
        0 => Ok(GgufMetadataValue::U8(le_bytes::<1>(reader)?[0])),
        1 => Ok(GgufMetadataValue::I8(le_bytes::<1>(reader)?[0] as i8)),
        2 => Ok(GgufMetadataValue::U16(u16::from_le_bytes(le_bytes(reader)?))),
        3 => Ok(GgufMetadataValue::I16(i16::from_le_bytes(le_bytes(reader)?))),
        4 => Ok(GgufMetadataValue::U32(u32::from_le_bytes(le_bytes(reader)?))),
        5 => Ok(GgufMetadataValue::I32(i32::from_le_bytes(le_bytes(reader)?))),
        6 => Ok(GgufMetadataValue::F32(f32::from_le_bytes(le_bytes(reader)?))),
        7 => Ok(GgufMetadataValue::Bool(le_bytes::<1>(reader)?[0] != 0)),
        8 => Ok(GgufMetadataValue::String(read_gguf_string(reader)?)),
        9 => {
            // Array: u32 element_type, u64 count, then count values of element_type
            let elem_type = u32::from_le_bytes(le_bytes(reader)?);
            let count = u64::from_le_bytes(le_bytes(reader)?) as usize;

            let mut values = Vec::with_capacity(count);
            for _ in 0..count {
                values.push(read_value(reader, elem_type)?);
            }
            Ok(GgufMetadataValue::Array(values))
        }
        10 => Ok(GgufMetadataValue::U64(u64::from_le_bytes(le_bytes(reader)?))),
        11 => Ok(GgufMetadataValue::I64(i64::from_le_bytes(le_bytes(reader)?))),
        12 => Ok(GgufMetadataValue::F64(f64::from_le_bytes(le_bytes(reader)?))),
        other => Err(ModelError::UnsupportedGgufType(other)),
    }
}
