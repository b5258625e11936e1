use std::fmt::Debug;

use crate::error::Result;

/// Trait for pluggable compute backends (CPU, Metal, etc.).
///
/// All operations work on f32 slices. Data is passed in as slices and
/// returned as owned vectors. The backend is responsible for performing
/// the computation and returning the result.
pub trait ComputeBackend: Send + Sync + Debug {
    /// Returns the name of this backend (e.g., "cpu", "metal").
    fn name(&self) -> &str;

    /// Matrix multiplication: C = A @ B.
    ///
    /// - `a`: row-major data of shape [m, k]
    /// - `b`: row-major data of shape [k, n]
    /// - Returns: row-major data of shape [m, n]
    fn matmul(&self, a: &[f32], b: &[f32], m: usize, k: usize, n: usize) -> Result<Vec<f32>>;

    /// Element-wise addition: result[i] = a[i] + b[i].
    fn add(&self, a: &[f32], b: &[f32]) -> Result<Vec<f32>>;

    /// Element-wise multiplication: result[i] = a[i] * b[i].
    fn mul(&self, a: &[f32], b: &[f32]) -> Result<Vec<f32>>;

    /// Scalar multiplication: result[i] = a[i] * s.
    fn scale(&self, a: &[f32], s: f32) -> Result<Vec<f32>>;

    /// Layer normalization with learned scale and shift.
    ///
    /// For each row of `hidden_size` elements in `x`:
    ///   mean = mean(x)
    ///   var  = mean((x - mean)^2)
    ///   result[i] = (x[i] - mean) / sqrt(var + eps) * weight[i] + bias[i]
    ///
    /// - `x`: input data, length must be a multiple of `hidden_size`
    /// - `weight`: per-element scale, length == `hidden_size`
    /// - `bias`: per-element shift, length == `hidden_size`
    /// - `eps`: small constant for numerical stability
    fn layer_norm(
        &self,
        x: &[f32],
        weight: &[f32],
        bias: &[f32],
        eps: f32,
        hidden_size: usize,
    ) -> Result<Vec<f32>>;

    /// Softmax over chunks of `chunk_size` elements.
    ///
    /// For each chunk: result[i] = exp(x[i] - max(x)) / sum(exp(x[j] - max(x)))
    fn softmax(&self, x: &[f32], chunk_size: usize) -> Result<Vec<f32>>;

    /// GELU activation (tanh approximation):
    ///   result[i] = 0.5 * x[i] * (1 + tanh(sqrt(2/pi) * (x[i] + 0.044715 * x[i]^3)))
    fn gelu(&self, x: &[f32]) -> Result<Vec<f32>>;
}
