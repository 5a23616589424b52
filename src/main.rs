// RSA Cryptor Command Line
// Generates keys and runs encrypt/decrypt/sign/verify on files

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use rsa_cryptor::util::file_ops::{format_file_size, read_key, write_file, write_key, FileConfig};
use rsa_cryptor::{
    decrypt, digest_info, encrypt, generate_pair, sign, verify, DigestAlgorithm, Padding,
    SignatureStatus,
};

/// RSA key management and padded RSA operations on files
#[derive(Parser, Debug)]
#[command(name = "rsa-cryptor", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a key pair and store both halves as PKCS#1 DER.
    Genkey {
        #[arg(long, default_value_t = 2048)]
        bits: usize,
        #[arg(long, default_value_t = 65537)]
        exponent: u32,
        #[arg(long)]
        private: PathBuf,
        #[arg(long)]
        public: PathBuf,
    },

    /// Write the public half of a key file.
    Pubkey {
        #[arg(long)]
        key: PathBuf,
        #[arg(long)]
        out: PathBuf,
    },

    /// Show the type and size of a key file.
    Info {
        #[arg(long)]
        key: PathBuf,
    },

    /// Encrypt a file with a public key.
    Encrypt(CryptArgs),

    /// Decrypt a file with a private key.
    Decrypt(CryptArgs),

    /// Sign the digest of a file with a private key.
    Sign {
        #[arg(long)]
        key: PathBuf,
        #[arg(long, value_enum, default_value_t = DigestArg::Sha256)]
        digest: DigestArg,
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        signature: PathBuf,
    },

    /// Verify a signature over the digest of a file.
    Verify {
        #[arg(long)]
        key: PathBuf,
        #[arg(long, value_enum, default_value_t = DigestArg::Sha256)]
        digest: DigestArg,
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        signature: PathBuf,
    },
}

#[derive(clap::Args, Debug)]
struct CryptArgs {
    #[arg(long)]
    key: PathBuf,
    #[arg(long, value_enum, default_value_t = PaddingArg::Oaep)]
    padding: PaddingArg,
    /// Digest for OAEP; ignored by PKCS#1 v1.5.
    #[arg(long, value_enum, default_value_t = DigestArg::Sha256)]
    digest: DigestArg,
    /// OAEP label
    #[arg(long)]
    label: Option<String>,
    #[arg(long)]
    input: PathBuf,
    #[arg(long)]
    output: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PaddingArg {
    Pkcs1,
    Oaep,
}

impl From<PaddingArg> for Padding {
    fn from(arg: PaddingArg) -> Self {
        match arg {
            PaddingArg::Pkcs1 => Padding::Pkcs1,
            PaddingArg::Oaep => Padding::Oaep,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DigestArg {
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

impl From<DigestArg> for DigestAlgorithm {
    fn from(arg: DigestArg) -> Self {
        match arg {
            DigestArg::Sha1 => DigestAlgorithm::Sha1,
            DigestArg::Sha224 => DigestAlgorithm::Sha224,
            DigestArg::Sha256 => DigestAlgorithm::Sha256,
            DigestArg::Sha384 => DigestAlgorithm::Sha384,
            DigestArg::Sha512 => DigestAlgorithm::Sha512,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match run(cli.command) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<ExitCode> {
    match command {
        Commands::Genkey {
            bits,
            exponent,
            private,
            public,
        } => {
            let pair = generate_pair(bits, exponent).context("key generation failed")?;
            write_key(&private, &pair.private)
                .with_context(|| format!("writing {}", private.display()))?;
            write_key(&public, &pair.public)
                .with_context(|| format!("writing {}", public.display()))?;
            println!("generated {}-bit key pair", pair.bits());
        }

        Commands::Pubkey { key, out } => {
            let key = read_key(&key).with_context(|| format!("reading {}", key.display()))?;
            let public = key.public_key()?;
            write_key(&out, &public).with_context(|| format!("writing {}", out.display()))?;
        }

        Commands::Info { key } => {
            let key = read_key(&key).with_context(|| format!("reading {}", key.display()))?;
            let modulus = key.components().modulus;
            println!("type:    {:?}", key.key_type());
            println!("bits:    {}", key.bits());
            println!("modulus: {}", hex::encode(&modulus));
        }

        Commands::Encrypt(args) => {
            let key = read_key(&args.key)
                .with_context(|| format!("reading {}", args.key.display()))?;
            let data = FileConfig::default().read_file(&args.input)?;
            let label = args.label.as_deref().map(str::as_bytes);
            let out = encrypt(&key, args.padding.into(), &data, label, args.digest.into())
                .context("encryption failed")?;
            write_file(&args.output, &out)?;
            println!("wrote {}", format_file_size(out.len() as u64));
        }

        Commands::Decrypt(args) => {
            let key = read_key(&args.key)
                .with_context(|| format!("reading {}", args.key.display()))?;
            let data = FileConfig::default().read_file(&args.input)?;
            let label = args.label.as_deref().map(str::as_bytes);
            let out = decrypt(&key, args.padding.into(), &data, label, args.digest.into())
                .context("decryption failed")?;
            write_file(&args.output, &out)?;
            println!("wrote {}", format_file_size(out.len() as u64));
        }

        Commands::Sign {
            key,
            digest,
            input,
            signature,
        } => {
            let key = read_key(&key).with_context(|| format!("reading {}", key.display()))?;
            let hash = hash_file(&input, digest.into())?;
            let out = sign(&key, Padding::Pkcs1, &hash, digest.into()).context("signing failed")?;
            write_file(&signature, &out)?;
        }

        Commands::Verify {
            key,
            digest,
            input,
            signature,
        } => {
            let key = read_key(&key).with_context(|| format!("reading {}", key.display()))?;
            let hash = hash_file(&input, digest.into())?;
            let sig = FileConfig::default().read_file(&signature)?;
            match verify(&key, Padding::Pkcs1, &hash, digest.into(), &sig)
                .context("verification failed")?
            {
                SignatureStatus::Valid => println!("signature valid"),
                SignatureStatus::Invalid => {
                    println!("signature INVALID");
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn hash_file(path: &Path, digest: DigestAlgorithm) -> Result<Vec<u8>> {
    let data = FileConfig::default().read_file(path)?;
    let Some(hash) = digest_info(digest).and_then(|info| info.hash(&[data.as_slice()])) else {
        bail!("digest {digest:?} is not available");
    };
    Ok(hash)
}
