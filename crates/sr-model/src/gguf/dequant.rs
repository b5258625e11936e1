//! Conversion of raw GGUF tensor bytes into f32 values.
//!
//! All weights are materialized as f32 at load time regardless of how they
//! are stored on disk.

/// Reinterpret raw bytes as f32 values (little-endian).
pub fn dequantize_f32(data: &[u8], numel: usize) -> Vec<f32> {
    let mut out = Vec::with_capacity(numel);
    for i in 0..numel {
        let offset = i * 4;
        let bytes: [u8; 4] = [
            data[offset],
            data[offset + 1],
            data[offset + 2],
            data[offset + 3],
        ];
        out.push(f32::from_le_bytes(bytes));
    }
    out
}

/// Convert f16 values to f32.
pub fn dequantize_f16(data: &[u8], numel: usize) -> Vec<f32> {
    let mut out = Vec::with_capacity(numel);
    for i in 0..numel {
        let offset = i * 2;
        let bytes: [u8; 2] = [data[offset], data[offset + 1]];
        let h = half::f16::from_le_bytes(bytes);
        out.push(h.to_f32());
    }
    out
}

/// Dequantize Q4_0 blocks to f32.
///
/// Q4_0 block layout (18 bytes total, 32 elements per block):
///   - 2 bytes: f16 scale factor
///   - 16 bytes: 32 packed 4-bit values (2 per byte, lower nibble first)
///
/// Each 4-bit value is unsigned (0..15); dequantized as: (nibble - 8) * scale.
pub fn dequantize_q4_0(data: &[u8], numel: usize) -> Vec<f32> {
    const BLOCK_SIZE: usize = 32;
    const BLOCK_BYTES: usize = 18; // 2 (scale) + 16 (nibbles)

    let n_blocks = numel.div_ceil(BLOCK_SIZE);
    let mut out = Vec::with_capacity(numel);

    for block_idx in 0..n_blocks {
        let block_start = block_idx * BLOCK_BYTES;

        let scale_bytes: [u8; 2] = [data[block_start], data[block_start + 1]];
        let scale = half::f16::from_le_bytes(scale_bytes).to_f32();

        for byte_idx in 0..16 {
            let byte = data[block_start + 2 + byte_idx];

            // Lower nibble first.
            let lo = (byte & 0x0F) as i32 - 8;
            out.push(lo as f32 * scale);

            let hi = ((byte >> 4) & 0x0F) as i32 - 8;
            out.push(hi as f32 * scale);
        }
    }

    // Trim to exact element count (last block may have padding).
    out.truncate(numel);
    out
}

/// Dequantize Q8_0 blocks to f32.
///
/// Q8_0 block layout (34 bytes total, 32 elements per block):
///   - 2 bytes: f16 scale factor
///   - 32 bytes: 32 signed 8-bit values
///
/// Dequantized as: value * scale.
pub fn dequantize_q8_0(data: &[u8], numel: usize) -> Vec<f32> {
    const BLOCK_SIZE: usize = 32;
    const BLOCK_BYTES: usize = 34; // 2 (scale) + 32 (quants)

    let n_blocks = numel.div_ceil(BLOCK_SIZE);
    let mut out = Vec::with_capacity(numel);

    for block_idx in 0..n_blocks {
        let block_start = block_idx * BLOCK_BYTES;

        let scale_bytes: [u8; 2] = [data[block_start], data[block_start + 1]];
        let scale = half::f16::from_le_bytes(scale_bytes).to_f32();

        for i in 0..BLOCK_SIZE {
            let val = data[block_start + 2 + i] as i8;
            out.push(val as f32 * scale);
        }
    }

    out.truncate(numel);
    out
}
