use std::io::Read;

use sr_tensor::DType;

use crate::error::{ModelError, Result};

/// The four-byte magic number identifying a GGUF file: ASCII "GGUF".
pub const GGUF_MAGIC: [u8; 4] = [0x47, 0x47, 0x55, 0x46];

/// Default alignment (in bytes) for tensor data within a GGUF file.
pub const GGUF_DEFAULT_ALIGNMENT: usize = 32;

/// Read a GGUF-encoded string: u64 length followed by that many UTF-8 bytes.
pub(crate) fn read_gguf_string(reader: &mut impl Read) -> Result<String> {
    let mut buf8 = [0u8; 8];
    reader.read_exact(&mut buf8)?;
    let len = u64::from_le_bytes(buf8) as usize;
    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf)?;
    String::from_utf8(buf)
        .map_err(|e| ModelError::Other(format!("invalid UTF-8 in string: {}", e)))
}

/// Parsed GGUF file header.
#[derive(Debug)]
pub struct GgufHeader {
    /// GGUF format version (we support v3).
    pub version: u32,
    /// Number of tensors stored in the file.
    pub n_tensors: u64,
    /// Number of key-value metadata entries.
    pub n_kv: u64,
}

impl GgufHeader {
    /// Parse a GGUF header from the beginning of a reader.
    ///
    /// Reads and validates the 4-byte magic, then reads the version (u32 LE),
    /// tensor count (u64 LE), and KV count (u64 LE). Only version 3 is
    /// currently supported.
    pub fn parse(reader: &mut impl Read) -> Result<GgufHeader> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if magic != GGUF_MAGIC {
            return Err(ModelError::InvalidMagic(magic));
        }

        let mut buf4 = [0u8; 4];
        reader.read_exact(&mut buf4)?;
        let version = u32::from_le_bytes(buf4);
        if version != 3 {
            return Err(ModelError::UnsupportedVersion(version));
        }

        let mut buf8 = [0u8; 8];
        reader.read_exact(&mut buf8)?;
        let n_tensors = u64::from_le_bytes(buf8);

        reader.read_exact(&mut buf8)?;
        let n_kv = u64::from_le_bytes(buf8);

        Ok(GgufHeader {
            version,
            n_tensors,
            n_kv,
        })
    }
}

/// Describes a single tensor stored within a GGUF file.
#[derive(Debug)]
pub struct GgufTensorInfo {
    /// Tensor name (e.g. "enc.blk.0.attn_q.weight").
    pub name: String,
    /// Size of each dimension.
    pub dims: Vec<u64>,
    /// Data type of the stored tensor data.
    pub dtype: DType,
    /// Byte offset of this tensor's data from the start of the tensor data section.
    pub offset: u64,
}

impl GgufTensorInfo {
    /// Total number of elements in this tensor.
    pub fn numel(&self) -> usize {
        self.dims.iter().map(|&d| d as usize).product()
    }

    /// Compute the total byte size of this tensor's raw data in the file.
    pub fn data_size(&self) -> usize {
        let numel = self.numel();
        let block_size = self.dtype.block_size();
        let n_blocks = numel.div_ceil(block_size);
        n_blocks * self.dtype.size_in_bytes()
    }
}

/// Parse `n_tensors` tensor info entries from a reader.
///
/// Each entry:
/// 1. GGUF string name
/// 2. u32 number of dimensions
/// 3. n_dims x u64 dimension sizes
/// 4. u32 GGUF type ID (mapped via `DType::from_gguf_type`)
/// 5. u64 byte offset within the tensor data section
pub fn parse_tensor_infos(reader: &mut impl Read, n_tensors: u64) -> Result<Vec<GgufTensorInfo>> {
    let mut infos = Vec::with_capacity(n_tensors as usize);
    for _ in 0..n_tensors {
        let name = read_gguf_string(reader)?;

        let mut buf4 = [0u8; 4];
        reader.read_exact(&mut buf4)?;
        let n_dims = u32::from_le_bytes(buf4);

        let mut dims = Vec::with_capacity(n_dims as usize);
        for _ in 0..n_dims {
            let mut buf8 = [0u8; 8];
            reader.read_exact(&mut buf8)?;
            dims.push(u64::from_le_bytes(buf8));
        }

        reader.read_exact(&mut buf4)?;
        let type_id = u32::from_le_bytes(buf4);
        let dtype = DType::from_gguf_type(type_id)
            .ok_or(ModelError::UnsupportedGgufType(type_id))?;

        let mut buf8 = [0u8; 8];
        reader.read_exact(&mut buf8)?;
        let offset = u64::from_le_bytes(buf8);

        infos.push(GgufTensorInfo {
            name,
            dims,
            dtype,
            offset,
        });
    }
    Ok(infos)
}
