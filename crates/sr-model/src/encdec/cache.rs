/// Key-value cache for the decoder's causal self-attention.
///
/// Stores previously computed key and value projections so they do not need
/// to be recomputed for each new token during autoregressive generation.
///
/// Layout for each layer:
///   k[layer]: flat array of shape [max_seq_len, n_heads * head_dim]
///   v[layer]: flat array of shape [max_seq_len, n_heads * head_dim]
///
/// The cache is `Clone` so that beam search can fork one cache per
/// hypothesis.
#[derive(Clone)]
pub struct DecoderCache {
    /// Key cache for each layer.
    pub k: Vec<Vec<f32>>,
    /// Value cache for each layer.
    pub v: Vec<Vec<f32>>,
    /// Combined head dimension (n_heads * head_dim).
    pub kv_dim: usize,
    /// Maximum sequence length the cache can hold.
    pub max_seq_len: usize,
    /// Current number of tokens stored in the cache.
    pub len: usize,
}

impl DecoderCache {
    /// Create a new cache with all values initialized to zero.
    pub fn new(n_layers: usize, n_heads: usize, head_dim: usize, max_seq_len: usize) -> Self {
        let kv_dim = n_heads * head_dim;
        let cache_size = max_seq_len * kv_dim;
        let k = (0..n_layers).map(|_| vec![0.0f32; cache_size]).collect();
        let v = (0..n_layers).map(|_| vec![0.0f32; cache_size]).collect();

        DecoderCache {
            k,
            v,
            kv_dim,
            max_seq_len,
            len: 0,
        }
    }

    /// Write key and value vectors for one token at a given position.
    ///
    /// - `layer`: the decoder layer index
    /// - `k_data` / `v_data`: vectors of length kv_dim
    /// - `pos`: the sequence position to write at
    pub fn update(&mut self, layer: usize, k_data: &[f32], v_data: &[f32], pos: usize) {
        let offset = pos * self.kv_dim;

        self.k[layer][offset..offset + self.kv_dim].copy_from_slice(k_data);
        self.v[layer][offset..offset + self.kv_dim].copy_from_slice(v_data);

        // Update the current length if this position extends it.
        if pos + 1 > self.len {
            self.len = pos + 1;
        }
    }

    /// Get a slice of the key cache for positions 0..seq_len.
    pub fn get_k(&self, layer: usize, seq_len: usize) -> &[f32] {
        &self.k[layer][..seq_len * self.kv_dim]
    }

    /// Get a slice of the value cache for positions 0..seq_len.
    pub fn get_v(&self, layer: usize, seq_len: usize) -> &[f32] {
        &self.v[layer][..seq_len * self.kv_dim]
    }

    /// Reset the cache, zeroing all data and setting length to 0.
    pub fn reset(&mut self) {
        for layer_k in &mut self.k {
            layer_k.fill(0.0);
        }
        for layer_v in &mut self.v {
            layer_v.fill(0.0);
        }
        self.len = 0;
    }
}

/// Cross-attention keys and values projected from the encoder states.
///
/// Computed once per source sequence, after encoding; read-only during
/// decoding. Layout per layer: flat [enc_len, n_heads * head_dim].
#[derive(Clone)]
pub struct CrossCache {
    /// Cross-attention keys for each decoder layer.
    pub k: Vec<Vec<f32>>,
    /// Cross-attention values for each decoder layer.
    pub v: Vec<Vec<f32>>,
    /// Number of encoder positions.
    pub enc_len: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_and_get() {
        let mut cache = DecoderCache::new(2, 1, 4, 8);
        assert_eq!(cache.len, 0);

        cache.update(0, &[1.0, 2.0, 3.0, 4.0], &[5.0, 6.0, 7.0, 8.0], 0);
        assert_eq!(cache.len, 1);
        assert_eq!(cache.get_k(0, 1), &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(cache.get_v(0, 1), &[5.0, 6.0, 7.0, 8.0]);

        // Layer 1 is untouched.
        assert_eq!(cache.get_k(1, 1), &[0.0; 4]);
    }

    #[test]
    fn test_len_tracks_highest_position() {
        let mut cache = DecoderCache::new(1, 1, 2, 4);
        cache.update(0, &[1.0, 1.0], &[1.0, 1.0], 2);
        assert_eq!(cache.len, 3);
        cache.update(0, &[1.0, 1.0], &[1.0, 1.0], 0);
        assert_eq!(cache.len, 3);
    }

    #[test]
    fn test_reset() {
        let mut cache = DecoderCache::new(1, 1, 2, 4);
        cache.update(0, &[1.0, 1.0], &[2.0, 2.0], 0);
        cache.reset();
        assert_eq!(cache.len, 0);
        assert_eq!(cache.get_k(0, 1), &[0.0, 0.0]);
    }

    #[test]
    fn test_clone_is_independent() {
        let mut cache = DecoderCache::new(1, 1, 2, 4);
        cache.update(0, &[1.0, 1.0], &[1.0, 1.0], 0);

        let mut fork = cache.clone();
        fork.update(0, &[9.0, 9.0], &[9.0, 9.0], 1);

        assert_eq!(cache.len, 1);
        assert_eq!(fork.len, 2);
    }
}
