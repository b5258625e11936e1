use crate::dtype::DType;
use crate::error::{Result, TensorError};

/// CPU-side tensor storage.
///
/// Weights are dequantized to f32 at load time, so F32 is the only variant
/// the runtime ever holds in memory.
#[derive(Debug, Clone)]
pub enum CpuStorage {
    /// 32-bit floating point storage.
    F32(Vec<f32>),
}

impl CpuStorage {
    /// Number of elements in this storage.
    pub fn len(&self) -> usize {
        match self {
            CpuStorage::F32(v) => v.len(),
        }
    }

    /// Returns true if the storage contains no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the data as an f32 slice.
    pub fn as_f32_slice(&self) -> Result<&[f32]> {
        match self {
            CpuStorage::F32(v) => Ok(v.as_slice()),
        }
    }

    /// Create zero-filled storage for the given dtype and element count.
    ///
    /// # Errors
    /// Returns an error for dtypes that are never held in memory.
    pub fn zeros(dtype: DType, n: usize) -> Result<Self> {
        match dtype {
            DType::F32 => Ok(CpuStorage::F32(vec![0.0; n])),
            other => Err(TensorError::UnsupportedDType(format!(
                "{} storage is not materialized in memory",
                other
            ))),
        }
    }

    /// Create storage from an f32 vector.
    pub fn from_f32_vec(data: Vec<f32>) -> Self {
        CpuStorage::F32(data)
    }

    /// Returns the dtype of this storage.
    pub fn dtype(&self) -> DType {
        match self {
            CpuStorage::F32(_) => DType::F32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_f32_vec() {
        let s = CpuStorage::from_f32_vec(vec![1.0, 2.0, 3.0]);
        assert_eq!(s.len(), 3);
        assert!(!s.is_empty());
        assert_eq!(s.as_f32_slice().unwrap(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_zeros_f32() {
        let s = CpuStorage::zeros(DType::F32, 5).unwrap();
        assert_eq!(s.len(), 5);
        assert_eq!(s.as_f32_slice().unwrap(), &[0.0; 5]);
    }

    #[test]
    fn test_zeros_unsupported() {
        assert!(CpuStorage::zeros(DType::F16, 5).is_err());
        assert!(CpuStorage::zeros(DType::Q8_0, 5).is_err());
    }

    #[test]
    fn test_dtype() {
        let s = CpuStorage::from_f32_vec(vec![]);
        assert_eq!(s.dtype(), DType::F32);
    }
}
