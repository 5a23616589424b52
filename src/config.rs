// Generation Configuration
// Size limits and tunables for RSA key generation

use crate::error::{CryptorError, Result};

/// Largest supported modulus, in bits. Every key object's storage is
/// bounded by this.
pub const MAX_KEY_BITS: usize = 4096;

/// Smallest modulus accepted for fresh key generation.
pub const DEFAULT_MIN_KEY_BITS: usize = 1024;

/// Smallest public exponent accepted by key construction (17 bits).
pub const MIN_PUBLIC_EXPONENT: u32 = 65537;

/// Configuration for key generation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerationConfig {
    pub min_key_bits: usize,
    pub max_key_bits: usize,
    /// Miller-Rabin rounds per prime candidate
    pub primality_rounds: u32,
    /// Full regenerations attempted before giving up
    pub max_attempts: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            min_key_bits: DEFAULT_MIN_KEY_BITS,
            max_key_bits: MAX_KEY_BITS,
            primality_rounds: 40,
            max_attempts: 64,
        }
    }
}

impl GenerationConfig {
    pub fn with_min_key_bits(mut self, bits: usize) -> Self {
        self.min_key_bits = bits;
        self
    }

    /// Never raises the ceiling past `MAX_KEY_BITS`.
    pub fn with_max_key_bits(mut self, bits: usize) -> Self {
        self.max_key_bits = bits.min(MAX_KEY_BITS);
        self
    }

    pub fn with_primality_rounds(mut self, rounds: u32) -> Self {
        self.primality_rounds = rounds.max(1);
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Check that `bits` is an even size inside the configured range.
    pub fn validate_size(&self, bits: usize) -> Result<()> {
        if bits < self.min_key_bits || bits > self.max_key_bits.min(MAX_KEY_BITS) {
            return Err(CryptorError::Param);
        }
        if bits % 2 != 0 {
            return Err(CryptorError::Param);
        }
        Ok(())
    }
}
