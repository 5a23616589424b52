// RSA Module - Main module file
// Exports key objects, key lifecycle, and operation dispatch

pub mod bigint;
pub mod codec;
pub mod components;
pub mod decrypt;
pub mod der;
pub mod encrypt;
pub mod key;
pub mod keygen;
pub mod padding;
pub mod random;
pub mod raw;
pub mod sign;

pub use codec::{export, import};
pub use components::{
    create_from_components, reconstruct_from_seeds, write_sized, KeyComponents, PrimeSeeds,
    ReconstructedPair,
};
pub use decrypt::decrypt;
pub use encrypt::encrypt;
pub use key::{key_size, key_type, release, KeyType, RsaKey, RsaPrivateKey, RsaPublicKey};
pub use keygen::{generate_default_keypair, generate_pair, generate_pair_with, RsaKeyPair};
pub use padding::Padding;
pub use raw::raw_crypt;
pub use sign::{sign, verify, SignatureStatus};
