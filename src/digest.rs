// Digest Descriptors
// Read-only algorithm -> {output size, block size, OID} lookup table

use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};

/// Digest algorithm selector.
///
/// Numbering follows the platform digest SPI. Only some of these have a
/// descriptor (see [`digest_info`]); the rest are accepted as values and
/// rejected by the operations that consume them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum DigestAlgorithm {
    None = 0,
    Md2 = 1,
    Md4 = 2,
    Md5 = 3,
    Rmd128 = 4,
    Rmd160 = 5,
    Rmd256 = 6,
    Rmd320 = 7,
    Sha1 = 8,
    Sha224 = 9,
    Sha256 = 10,
    Sha384 = 11,
    Sha512 = 12,
    Skein128 = 13,
    Skein160 = 14,
    Skein224 = 16,
    Skein256 = 17,
    Skein384 = 18,
    Skein512 = 19,
}

impl DigestAlgorithm {
    /// Map a raw selector value to an algorithm.
    pub fn from_raw(value: u32) -> Option<Self> {
        use DigestAlgorithm::*;
        let alg = match value {
            0 => None,
            1 => Md2,
            2 => Md4,
            3 => Md5,
            4 => Rmd128,
            5 => Rmd160,
            6 => Rmd256,
            7 => Rmd320,
            8 => Sha1,
            9 => Sha224,
            10 => Sha256,
            11 => Sha384,
            12 => Sha512,
            13 => Skein128,
            14 => Skein160,
            16 => Skein224,
            17 => Skein256,
            18 => Skein384,
            19 => Skein512,
            _ => return Option::None,
        };
        Some(alg)
    }
}

/// Descriptor of a digest algorithm.
#[derive(Debug, PartialEq, Eq)]
pub struct DigestInfo {
    pub algorithm: DigestAlgorithm,
    pub output_size: usize,
    pub block_size: usize,
    /// DER contents octets of the algorithm's OBJECT IDENTIFIER
    pub oid: &'static [u8],
}

static DIGESTS: [DigestInfo; 6] = [
    DigestInfo {
        algorithm: DigestAlgorithm::Md5,
        output_size: 16,
        block_size: 64,
        oid: &[0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x02, 0x05],
    },
    DigestInfo {
        algorithm: DigestAlgorithm::Sha1,
        output_size: 20,
        block_size: 64,
        oid: &[0x2b, 0x0e, 0x03, 0x02, 0x1a],
    },
    DigestInfo {
        algorithm: DigestAlgorithm::Sha224,
        output_size: 28,
        block_size: 64,
        oid: &[0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x04],
    },
    DigestInfo {
        algorithm: DigestAlgorithm::Sha256,
        output_size: 32,
        block_size: 64,
        oid: &[0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x01],
    },
    DigestInfo {
        algorithm: DigestAlgorithm::Sha384,
        output_size: 48,
        block_size: 128,
        oid: &[0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x02],
    },
    DigestInfo {
        algorithm: DigestAlgorithm::Sha512,
        output_size: 64,
        block_size: 128,
        oid: &[0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x03],
    },
];

/// Look up the descriptor for `algorithm`.
pub fn digest_info(algorithm: DigestAlgorithm) -> Option<&'static DigestInfo> {
    DIGESTS.iter().find(|info| info.algorithm == algorithm)
}

impl DigestInfo {
    /// One-shot digest over the concatenation of `parts`. Every algorithm
    /// in the table can be computed; other selectors yield `None`.
    pub fn hash(&self, parts: &[&[u8]]) -> Option<Vec<u8>> {
        fn run<D: Digest>(parts: &[&[u8]]) -> Vec<u8> {
            let mut hasher = D::new();
            for part in parts {
                hasher.update(*part);
            }
            hasher.finalize().to_vec()
        }

        match self.algorithm {
            DigestAlgorithm::Md5 => Some(run::<Md5>(parts)),
            DigestAlgorithm::Sha1 => Some(run::<Sha1>(parts)),
            DigestAlgorithm::Sha224 => Some(run::<Sha224>(parts)),
            DigestAlgorithm::Sha256 => Some(run::<Sha256>(parts)),
            DigestAlgorithm::Sha384 => Some(run::<Sha384>(parts)),
            DigestAlgorithm::Sha512 => Some(run::<Sha512>(parts)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_sizes() {
        let info = digest_info(DigestAlgorithm::Sha256).unwrap();
        assert_eq!(info.output_size, 32);
        assert_eq!(info.block_size, 64);

        let info = digest_info(DigestAlgorithm::Sha512).unwrap();
        assert_eq!(info.output_size, 64);
        assert_eq!(info.block_size, 128);
    }

    #[test]
    fn test_unsupported_not_found() {
        assert!(digest_info(DigestAlgorithm::None).is_none());
        assert!(digest_info(DigestAlgorithm::Md2).is_none());
        assert!(digest_info(DigestAlgorithm::Skein256).is_none());
    }

    #[test]
    fn test_from_raw() {
        assert_eq!(DigestAlgorithm::from_raw(10), Some(DigestAlgorithm::Sha256));
        assert_eq!(DigestAlgorithm::from_raw(16), Some(DigestAlgorithm::Skein224));
        assert_eq!(DigestAlgorithm::from_raw(15), None);
        assert_eq!(DigestAlgorithm::from_raw(99), None);
    }

    #[test]
    fn test_hash_matches_output_size() {
        for info in DIGESTS.iter() {
            let out = info.hash(&[b"abc".as_slice()]).unwrap();
            assert_eq!(out.len(), info.output_size);
        }
    }

    #[test]
    fn test_sha256_known_answer() {
        let info = digest_info(DigestAlgorithm::Sha256).unwrap();
        let out = info.hash(&[b"a".as_slice(), b"bc".as_slice()]).unwrap();
        assert_eq!(
            hex::encode(out),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_sha1_and_md5_known_answers() {
        let sha1 = digest_info(DigestAlgorithm::Sha1).unwrap();
        assert_eq!(
            hex::encode(sha1.hash(&[b"abc".as_slice()]).unwrap()),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );

        let md5 = digest_info(DigestAlgorithm::Md5).unwrap();
        assert_eq!(
            hex::encode(md5.hash(&[b"ab".as_slice(), b"c".as_slice()]).unwrap()),
            "900150983cd24fb0d6963f7d28e17f72"
        );
    }
}
