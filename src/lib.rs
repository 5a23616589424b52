// RSA Cryptor Library
// Key lifecycle management and padded RSA operations over num-bigint

pub mod config;
pub mod digest;
pub mod error;
pub mod rsa;
pub mod util;

pub use config::{GenerationConfig, MAX_KEY_BITS};
pub use digest::{digest_info, DigestAlgorithm, DigestInfo};
pub use error::{status_of, CryptorError, CryptorStatus, Result};
pub use rsa::{
    create_from_components, decrypt, encrypt, export, generate_default_keypair, generate_pair,
    generate_pair_with, import, key_size, key_type, raw_crypt, reconstruct_from_seeds, release,
    sign, verify, write_sized, KeyComponents, KeyType, Padding, PrimeSeeds, ReconstructedPair,
    RsaKey, RsaKeyPair, RsaPrivateKey, RsaPublicKey, SignatureStatus,
};
