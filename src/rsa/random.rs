// Entropy for Key Generation
// Combines the thread-local DRBG with the operating system source

use rand::rngs::{OsRng, ThreadRng};
use rand::{thread_rng, CryptoRng, RngCore};
use zeroize::Zeroizing;

/// Entropy source used for key generation.
///
/// Every output byte is the XOR of a byte from the reseeding thread-local
/// generator and a byte read from the OS, so the output stays unpredictable
/// as long as either source is.
pub struct DualEntropy {
    drbg: ThreadRng,
    system: OsRng,
}

impl DualEntropy {
    pub fn new() -> Self {
        Self {
            drbg: thread_rng(),
            system: OsRng,
        }
    }
}

impl Default for DualEntropy {
    fn default() -> Self {
        Self::new()
    }
}

impl RngCore for DualEntropy {
    fn next_u32(&mut self) -> u32 {
        self.drbg.next_u32() ^ self.system.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.drbg.next_u64() ^ self.system.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.drbg.fill_bytes(dest);
        let mut mask = Zeroizing::new(vec![0u8; dest.len()]);
        self.system.fill_bytes(&mut mask);
        for (d, m) in dest.iter_mut().zip(mask.iter()) {
            *d ^= m;
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.drbg.try_fill_bytes(dest)?;
        let mut mask = Zeroizing::new(vec![0u8; dest.len()]);
        self.system.try_fill_bytes(&mut mask)?;
        for (d, m) in dest.iter_mut().zip(mask.iter()) {
            *d ^= m;
        }
        Ok(())
    }
}

impl CryptoRng for DualEntropy {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fills_buffer() {
        let mut rng = DualEntropy::new();
        let mut a = [0u8; 64];
        let mut b = [0u8; 64];
        rng.try_fill_bytes(&mut a).unwrap();
        rng.try_fill_bytes(&mut b).unwrap();
        assert_ne!(a, b);
        assert!(a.iter().any(|&x| x != 0));
    }

    #[test]
    fn test_empty_buffer() {
        let mut rng = DualEntropy::new();
        let mut empty: [u8; 0] = [];
        assert!(rng.try_fill_bytes(&mut empty).is_ok());
    }
}
