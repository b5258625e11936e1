use std::io::{BufReader, Seek};
use std::path::Path;

use memmap2::Mmap;

use sr_tensor::{DType, Shape, Tensor};

use crate::error::{ModelError, Result};
use super::dequant;
use super::format::{self, GgufHeader, GgufTensorInfo, GGUF_DEFAULT_ALIGNMENT};
use super::metadata::GgufMetadata;

/// A parsed GGUF file backed by a memory-mapped region.
///
/// After parsing the header, metadata, and tensor info table from the file,
/// the entire file is memory-mapped so that tensor data can be accessed
/// without additional reads.
pub struct GgufFile {
    /// Parsed header (version, tensor/KV counts).
    pub header: GgufHeader,
    /// Parsed metadata key-value entries.
    pub metadata: GgufMetadata,
    /// Parsed tensor info entries (name, shape, dtype, offset).
    pub tensor_infos: Vec<GgufTensorInfo>,
    /// Memory-mapped file contents.
    mmap: Mmap,
    /// Byte offset within the file where tensor data begins (aligned).
    data_offset: usize,
}

impl GgufFile {
    /// Open and parse a GGUF file from disk.
    ///
    /// This reads the header, metadata, and tensor info table sequentially
    /// using buffered I/O, then memory-maps the entire file so tensor data
    /// can be accessed via slices.
    pub fn open(path: &Path) -> Result<GgufFile> {
        let file = std::fs::File::open(path)?;
        let mut reader = BufReader::new(&file);

        let header = GgufHeader::parse(&mut reader)?;
        let metadata = GgufMetadata::parse_kv(&mut reader, header.n_kv)?;
        let tensor_infos = format::parse_tensor_infos(&mut reader, header.n_tensors)?;

        // Determine current position in the file (end of tensor info table).
        let current_pos = reader.stream_position()? as usize;

        // Align to GGUF_DEFAULT_ALIGNMENT to find where tensor data starts.
        let data_offset =
            (current_pos + GGUF_DEFAULT_ALIGNMENT - 1) & !(GGUF_DEFAULT_ALIGNMENT - 1);

        // Memory-map the entire file.
        let mmap = unsafe { Mmap::map(&file)? };

        Ok(GgufFile {
            header,
            metadata,
            tensor_infos,
            mmap,
            data_offset,
        })
    }

    /// Get a raw byte slice for a tensor's data within the memory-mapped file.
    pub fn tensor_data(&self, info: &GgufTensorInfo) -> &[u8] {
        let start = self.data_offset + info.offset as usize;
        let size = info.data_size();
        &self.mmap[start..start + size]
    }

    /// Load a tensor by name, dequantizing to f32 if needed.
    ///
    /// Supports F32, F16, Q4_0, and Q8_0 formats.
    pub fn get_tensor_f32(&self, name: &str) -> Result<Tensor> {
        let info = self
            .tensor_infos
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| ModelError::TensorNotFound(name.to_string()))?;

        let raw = self.tensor_data(info);
        let numel = info.numel();
        let shape_dims: Vec<usize> = info.dims.iter().map(|&d| d as usize).collect();

        let data = match info.dtype {
            DType::F32 => dequant::dequantize_f32(raw, numel),
            DType::F16 => dequant::dequantize_f16(raw, numel),
            DType::Q4_0 => dequant::dequantize_q4_0(raw, numel),
            DType::Q8_0 => dequant::dequantize_q8_0(raw, numel),
        };

        Ok(Tensor::new(data, Shape::new(shape_dims)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    // Build a minimal GGUF v3 file with one string metadata entry and one
    // F32 tensor named "t" holding [1.0, 2.0, 3.0, 4.0].
    fn fixture_bytes() -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&format::GGUF_MAGIC);
        buf.extend_from_slice(&3u32.to_le_bytes());
        buf.extend_from_slice(&1u64.to_le_bytes()); // n_tensors
        buf.extend_from_slice(&1u64.to_le_bytes()); // n_kv

        // kv: general.architecture = "encdec"
        let key = b"general.architecture";
        buf.extend_from_slice(&(key.len() as u64).to_le_bytes());
        buf.extend_from_slice(key);
        buf.extend_from_slice(&8u32.to_le_bytes());
        let value = b"encdec";
        buf.extend_from_slice(&(value.len() as u64).to_le_bytes());
        buf.extend_from_slice(value);

        // tensor info: name "t", dims [2, 2], F32, offset 0
        let name = b"t";
        buf.extend_from_slice(&(name.len() as u64).to_le_bytes());
        buf.extend_from_slice(name);
        buf.extend_from_slice(&2u32.to_le_bytes());
        buf.extend_from_slice(&2u64.to_le_bytes());
        buf.extend_from_slice(&2u64.to_le_bytes());
        buf.extend_from_slice(&DType::F32.to_gguf_type().to_le_bytes());
        buf.extend_from_slice(&0u64.to_le_bytes());

        // Pad to the tensor-data alignment boundary.
        while buf.len() % GGUF_DEFAULT_ALIGNMENT != 0 {
            buf.push(0);
        }
        for v in [1.0f32, 2.0, 3.0, 4.0] {
            buf.extend_from_slice(&v.to_le_bytes());
        }
        buf
    }

    fn write_fixture() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&fixture_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_open_and_read_tensor() {
        let file = write_fixture();
        let gguf = GgufFile::open(file.path()).unwrap();

        assert_eq!(gguf.header.n_tensors, 1);
        assert_eq!(gguf.metadata.get_string("general.architecture").unwrap(), "encdec");

        let t = gguf.get_tensor_f32("t").unwrap();
        assert_eq!(t.shape().dims(), &[2, 2]);
        assert_eq!(t.data_f32(), &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_tensor_not_found() {
        let file = write_fixture();
        let gguf = GgufFile::open(file.path()).unwrap();
        let err = gguf.get_tensor_f32("missing").unwrap_err();
        assert!(matches!(err, ModelError::TensorNotFound(_)));
    }
}
