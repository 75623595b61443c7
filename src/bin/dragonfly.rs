//! Command-line front end for the Dragonfly v1 container.
//!
//! Passwords and optional extra entropy are read from the terminal without
//! echo; the library itself never prompts. Any failure after an output
//! path may exist removes that file before exiting.

use std::error::Error;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use zeroize::Zeroizing;

use dragonfly::crypto::SkeinPrng512;
use dragonfly::formats::dragonfly::{self as container, EncryptParams};
use dragonfly::memlock;

const MAX_PASSWORD_BYTES: usize = 120;

#[derive(Parser)]
#[command(name = "dragonfly", version, about = "Password-based file encryption")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Encrypt a file into a Dragonfly v1 container.
    Encrypt {
        input: PathBuf,
        output: PathBuf,
        /// Log2 of the smallest key-derivation graph, in 64-byte words.
        #[arg(long, default_value_t = 17)]
        g_low: u8,
        /// Log2 of the largest key-derivation graph, in 64-byte words.
        #[arg(long, default_value_t = 17)]
        g_high: u8,
        /// Key-derivation time cost.
        #[arg(long, default_value_t = 1)]
        lambda: u8,
        /// Run the KDF's sequential finale (stronger against massively
        /// parallel attacks, data-dependent memory access pattern).
        #[arg(long)]
        phi: bool,
        /// Random padding bytes inserted before the payload to obscure its
        /// size.
        #[arg(long, default_value_t = 0)]
        padding: u64,
        /// Prompt for extra keyboard entropy and fold it into the RNG.
        #[arg(long)]
        supplement_entropy: bool,
    },
    /// Decrypt a Dragonfly v1 container.
    Decrypt { input: PathBuf, output: PathBuf },
    /// Print the public header fields of a container.
    Inspect { input: PathBuf },
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    match cli.command {
        Command::Encrypt {
            input,
            output,
            g_low,
            g_high,
            lambda,
            phi,
            padding,
            supplement_entropy,
        } => {
            let plaintext = fs::read(&input)?;
            let password = prompt_password_twice()?;
            memlock::lock(password.as_bytes());

            let mut rng = SkeinPrng512::from_os_entropy()?;
            if supplement_entropy {
                let extra = prompt_secret("Enter up to 120 random characters\n> ")?;
                rng.reseed(extra.as_bytes());
            }

            let params = EncryptParams {
                g_low,
                g_high,
                lambda,
                use_phi: phi,
                padding_bytes: padding,
            };
            let file = container::encrypt(&plaintext, password.as_bytes(), &params, &mut rng);
            memlock::unlock(password.as_bytes());
            write_or_remove(&output, &file?)
        }
        Command::Decrypt { input, output } => {
            let data = fs::read(&input)?;
            let password = prompt_secret("Enter password (max length 120 characters)\n> ")?;
            memlock::lock(password.as_bytes());
            let plaintext = container::decrypt(&data, password.as_bytes());
            memlock::unlock(password.as_bytes());
            write_or_remove(&output, &plaintext?)
        }
        Command::Inspect { input } => {
            let data = fs::read(&input)?;
            print!("{}", container::inspect(&data)?);
            Ok(())
        }
    }
}

/// Read one line from the terminal without echo, capped at
/// [`MAX_PASSWORD_BYTES`].
fn prompt_secret(prompt: &str) -> io::Result<Zeroizing<String>> {
    let entry = Zeroizing::new(rpassword::prompt_password(prompt)?);
    if entry.len() > MAX_PASSWORD_BYTES {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "input longer than 120 characters",
        ));
    }
    Ok(entry)
}

/// Prompt for a password twice and require both entries to match.
fn prompt_password_twice() -> io::Result<Zeroizing<String>> {
    let first = prompt_secret("Enter password (max length 120 characters)\n> ")?;
    let second = prompt_secret("Enter the same password again\n> ")?;
    if *first != *second {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "passwords do not match",
        ));
    }
    Ok(first)
}

/// Write the output file, removing any partial file on failure.
fn write_or_remove(path: &Path, bytes: &[u8]) -> Result<(), Box<dyn Error>> {
    if let Err(e) = fs::write(path, bytes) {
        let _ = fs::remove_file(path);
        return Err(e.into());
    }
    Ok(())
}
