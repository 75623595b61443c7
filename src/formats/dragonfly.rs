//! Dragonfly v1 - the authenticated, password-based encrypted container.
//!
//! Everything after the nonce is Threefish-CTR encrypted under a key derived
//! from the password by the memory-hard KDF; the whole file except the
//! trailing MAC is then Skein-MAC'd under an independent key derived from
//! the same password (encrypt-then-MAC). Decryption verifies the MAC in
//! constant time before producing a single plaintext byte.
//!
//! ## Layout
//! ```text
//! [0x00] Identifier        (64 bytes, "DRAGONFLY_V1" zero-padded)
//! [0x40] TotalSize         (u64 LE - whole file, MAC included)
//! [0x48] GarlicLow         (u8)
//! [0x49] GarlicHigh        (u8)
//! [0x4A] Lambda            (u8)
//! [0x4B] UsePhi            (u8, 0 or 1)
//! [0x4C] Tweak             (16 bytes)
//! [0x5C] Salt              (16 bytes)
//! [0x6C] Nonce             (32 bytes)
//! [0x8C] EncryptedReserved (16 bytes: padding size u64 LE ‖ reserved u64)
//! [0x9C] EncryptedPadding  (padding-size bytes)
//!        EncryptedPayload  (remaining bytes)
//!        MAC               (final 64 bytes)
//! ```
//!
//! ## Keystream positioning
//! The CTR counter for each encrypted region equals that region's byte
//! offset from the start of the encrypted reserved header: 0 for the
//! reserved header, 16 for the padding, `16 + padding` for the payload.
//! Counter ranges never overlap because every region consumes fewer
//! counters than bytes.

use std::fmt;

use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::crypto::catena::{self, CatenaParams};
use crate::crypto::ctr::Ctr;
use crate::crypto::prng::SkeinPrng;
use crate::crypto::skein::Skein;
use crate::crypto::threefish::{SchedulePolicy, Threefish};
use crate::error::{Error, Result};
use crate::utils::{load_words_le, read_le_u64};

/// Container identifier; also the version-ID bound into the KDF tweak.
///
/// The trailing bytes are zero so inspection can print it as a C string.
pub const ID: [u8; 64] = {
    let mut id = [0u8; 64];
    let name = *b"DRAGONFLY_V1";
    let mut i = 0;
    while i < name.len() {
        id[i] = name[i];
        i += 1;
    }
    id
};

/// Cipher/state width of the v1 container, in bytes.
pub const BLOCK_BYTES: usize = 64;
/// Trailing Skein-MAC width.
pub const MAC_BYTES: usize = 64;
/// Threefish tweak material in the header.
pub const TWEAK_BYTES: usize = 16;
/// KDF salt in the header.
pub const SALT_BYTES: usize = 16;
/// CTR nonce in the header (half a block).
pub const NONCE_BYTES: usize = 32;
/// Encrypted reserved header: padding size plus one reserved word.
pub const RESERVED_BYTES: usize = 16;

/// Sum of every fixed-size field, MAC included. A container is never
/// smaller than this, and exactly this size when the payload and padding
/// are both empty.
pub const VISIBLE_METADATA_BYTES: usize =
    ID.len() + 8 + 4 + TWEAK_BYTES + SALT_BYTES + NONCE_BYTES + RESERVED_BYTES + MAC_BYTES;

const SIZE_OFFSET: usize = 0x40;
const G_LOW_OFFSET: usize = 0x48;
const G_HIGH_OFFSET: usize = 0x49;
const LAMBDA_OFFSET: usize = 0x4A;
const USE_PHI_OFFSET: usize = 0x4B;
const TWEAK_OFFSET: usize = 0x4C;
const SALT_OFFSET: usize = 0x5C;
const NONCE_OFFSET: usize = 0x6C;
const RESERVED_OFFSET: usize = 0x8C;
const PAYLOAD_OFFSET: usize = RESERVED_OFFSET + RESERVED_BYTES;

/// Caller-facing encryption parameters.
#[derive(Clone, Copy, Debug)]
pub struct EncryptParams {
    /// Log2 of the smallest KDF graph, in hash words.
    pub g_low: u8,
    /// Log2 of the largest KDF graph, in hash words.
    pub g_high: u8,
    /// KDF time cost.
    pub lambda: u8,
    /// Run the KDF's sequential finale (parallelism resistance, at the cost
    /// of a data-dependent memory access pattern).
    pub use_phi: bool,
    /// Random padding inserted before the payload to obscure its size.
    pub padding_bytes: u64,
}

impl Default for EncryptParams {
    fn default() -> Self {
        // 2^17 hash words = 8 MiB of graph.
        Self {
            g_low: 17,
            g_high: 17,
            lambda: 1,
            use_phi: false,
            padding_bytes: 0,
        }
    }
}

/// Parsed fixed-size header fields.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Header {
    pub id: [u8; 64],
    pub total_size: u64,
    pub g_low: u8,
    pub g_high: u8,
    pub lambda: u8,
    pub use_phi: bool,
    pub tweak: [u8; TWEAK_BYTES],
    pub salt: [u8; SALT_BYTES],
    pub nonce: [u8; NONCE_BYTES],
}

impl Header {
    /// Read the fixed header fields.
    ///
    /// Only the length is validated here; identifier and parameter checks
    /// belong to [`decrypt`], so that [`inspect`] can still dump a
    /// questionable file.
    pub fn parse(input: &[u8]) -> Result<Self> {
        if input.len() < VISIBLE_METADATA_BYTES {
            return Err(Error::BadFormat("input shorter than the fixed metadata"));
        }
        let mut id = [0u8; 64];
        id.copy_from_slice(&input[..64]);
        let mut tweak = [0u8; TWEAK_BYTES];
        tweak.copy_from_slice(&input[TWEAK_OFFSET..TWEAK_OFFSET + TWEAK_BYTES]);
        let mut salt = [0u8; SALT_BYTES];
        salt.copy_from_slice(&input[SALT_OFFSET..SALT_OFFSET + SALT_BYTES]);
        let mut nonce = [0u8; NONCE_BYTES];
        nonce.copy_from_slice(&input[NONCE_OFFSET..NONCE_OFFSET + NONCE_BYTES]);
        Ok(Self {
            id,
            total_size: read_le_u64(input, SIZE_OFFSET),
            g_low: input[G_LOW_OFFSET],
            g_high: input[G_HIGH_OFFSET],
            lambda: input[LAMBDA_OFFSET],
            use_phi: input[USE_PHI_OFFSET] != 0,
            tweak,
            salt,
            nonce,
        })
    }
}

/// Run the KDF and split its hash into the encryption and authentication
/// keys. Returns the Skein instance for reuse as the MAC engine.
fn derive_keys(
    password: &[u8],
    salt: &[u8; SALT_BYTES],
    params: &CatenaParams,
) -> Result<(Zeroizing<[u64; 8]>, Zeroizing<[u8; 64]>, Skein<8>)> {
    let mut skein = Skein::new();
    let mut pw = Zeroizing::new(password.to_vec());
    let mut kdf_out = Zeroizing::new([0u8; 64]);
    catena::derive::<8>(&mut kdf_out[..], &mut pw, salt, &ID, params)?;

    let mut split = Zeroizing::new([0u8; 2 * BLOCK_BYTES]);
    skein.hash(&mut split[..], &kdf_out[..]);

    let mut enc_key = Zeroizing::new([0u64; 8]);
    load_words_le(&mut enc_key[..], &split[..BLOCK_BYTES]);
    let mut auth_key = Zeroizing::new([0u8; 64]);
    auth_key.copy_from_slice(&split[BLOCK_BYTES..]);
    Ok((enc_key, auth_key, skein))
}

/// Build a keyed CTR stream from the encryption key and header tweak.
fn keyed_ctr(enc_key: &[u64; 8], tweak: &[u8; TWEAK_BYTES], nonce: &[u8; NONCE_BYTES]) -> Ctr<8> {
    let mut tweak_words = [0u64; 2];
    load_words_le(&mut tweak_words, tweak);
    let mut cipher = Threefish::<8>::new(SchedulePolicy::Precomputed);
    cipher.rekey(enc_key, &tweak_words);
    let mut ctr = Ctr::new(cipher);
    ctr.set_nonce(nonce);
    ctr
}

/// Encrypt `plaintext` into a fresh container.
///
/// `rng` supplies the tweak, nonce, and salt; seed it from the OS (and any
/// extra entropy) before calling. All key material is wiped before
/// returning, on success and on error alike.
pub fn encrypt(
    plaintext: &[u8],
    password: &[u8],
    params: &EncryptParams,
    rng: &mut SkeinPrng<8>,
) -> Result<Vec<u8>> {
    let kdf_params = CatenaParams {
        g_low: params.g_low,
        g_high: params.g_high,
        lambda: params.lambda,
        use_gamma: true,
        use_phi: params.use_phi,
    };
    kdf_params.validate()?;
    let padding = usize::try_from(params.padding_bytes)
        .map_err(|_| Error::BadParams("padding overflows the output size"))?;
    let total = VISIBLE_METADATA_BYTES
        .checked_add(plaintext.len())
        .and_then(|t| t.checked_add(padding))
        .ok_or(Error::BadParams("padding overflows the output size"))?;

    let mut tweak = [0u8; TWEAK_BYTES];
    let mut nonce = [0u8; NONCE_BYTES];
    let mut salt = [0u8; SALT_BYTES];
    rng.fill(&mut tweak);
    rng.fill(&mut nonce);
    rng.fill(&mut salt);

    let (enc_key, auth_key, mut skein) = derive_keys(password, &salt, &kdf_params)?;
    let mut ctr = keyed_ctr(&enc_key, &tweak, &nonce);

    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(&ID);
    out.extend_from_slice(&(total as u64).to_le_bytes());
    out.push(params.g_low);
    out.push(params.g_high);
    out.push(params.lambda);
    out.push(params.use_phi as u8);
    out.extend_from_slice(&tweak);
    out.extend_from_slice(&salt);
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&params.padding_bytes.to_le_bytes());
    out.extend_from_slice(&0u64.to_le_bytes());
    out.resize(out.len() + padding, 0);
    out.extend_from_slice(plaintext);
    debug_assert_eq!(out.len(), total - MAC_BYTES);

    ctr.xorcrypt_in_place(&mut out[RESERVED_OFFSET..PAYLOAD_OFFSET], 0);
    if padding > 0 {
        ctr.xorcrypt_in_place(
            &mut out[PAYLOAD_OFFSET..PAYLOAD_OFFSET + padding],
            RESERVED_BYTES as u64,
        );
    }
    ctr.xorcrypt_in_place(
        &mut out[PAYLOAD_OFFSET + padding..],
        RESERVED_BYTES as u64 + params.padding_bytes,
    );

    let mut mac = [0u8; MAC_BYTES];
    skein.mac(&mut mac, &out, &auth_key[..]);
    out.extend_from_slice(&mac);
    Ok(out)
}

/// Decrypt a container, authenticating it first.
///
/// The MAC over everything before the trailing tag is recomputed and
/// compared in constant time; on any mismatch the result is [`Error::Auth`]
/// and no plaintext leaves this function.
pub fn decrypt(input: &[u8], password: &[u8]) -> Result<Vec<u8>> {
    let header = Header::parse(input)?;
    if header.id != ID {
        return Err(Error::BadFormat("unrecognised identifier"));
    }
    let kdf_params = CatenaParams {
        g_low: header.g_low,
        g_high: header.g_high,
        lambda: header.lambda,
        use_gamma: true,
        use_phi: header.use_phi,
    };
    if kdf_params.validate().is_err() {
        return Err(Error::BadFormat("implausible cost parameters"));
    }

    let (enc_key, auth_key, mut skein) = derive_keys(password, &header.salt, &kdf_params)?;

    let mac_start = input.len() - MAC_BYTES;
    let mut mac = Zeroizing::new([0u8; MAC_BYTES]);
    skein.mac(&mut mac[..], &input[..mac_start], &auth_key[..]);
    if !bool::from(mac[..].ct_eq(&input[mac_start..])) {
        return Err(Error::Auth);
    }

    let mut ctr = keyed_ctr(&enc_key, &header.tweak, &header.nonce);
    let mut reserved = Zeroizing::new([0u8; RESERVED_BYTES]);
    ctr.xorcrypt(&mut reserved[..], &input[RESERVED_OFFSET..PAYLOAD_OFFSET], 0);
    let padding_bytes = read_le_u64(&reserved[..], 0);

    let body_len = (mac_start - PAYLOAD_OFFSET) as u64;
    if padding_bytes > body_len {
        return Err(Error::BadFormat("padding larger than the encrypted body"));
    }
    let padding = padding_bytes as usize;

    let mut plaintext = vec![0u8; mac_start - PAYLOAD_OFFSET - padding];
    ctr.xorcrypt(
        &mut plaintext,
        &input[PAYLOAD_OFFSET + padding..mac_start],
        RESERVED_BYTES as u64 + padding_bytes,
    );
    Ok(plaintext)
}

/// Everything [`inspect`] reads: the fixed header plus the trailing MAC.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Inspection {
    pub header: Header,
    pub mac: [u8; MAC_BYTES],
}

/// Read the public metadata of a container without touching any secret.
pub fn inspect(input: &[u8]) -> Result<Inspection> {
    let header = Header::parse(input)?;
    let mut mac = [0u8; MAC_BYTES];
    mac.copy_from_slice(&input[input.len() - MAC_BYTES..]);
    Ok(Inspection { header, mac })
}

impl fmt::Display for Inspection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The identifier prints as a C string: stop at the first zero byte
        // (the final byte is guaranteed zero in well-formed files).
        let id_len = self
            .header
            .id
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(self.header.id.len() - 1);
        writeln!(
            f,
            "Identifier  : {}",
            String::from_utf8_lossy(&self.header.id[..id_len])
        )?;
        writeln!(f, "File Size   : {}", self.header.total_size)?;
        writeln!(f, "Garlic Low  : {}", self.header.g_low)?;
        writeln!(f, "Garlic High : {}", self.header.g_high)?;
        writeln!(f, "Lambda      : {}", self.header.lambda)?;
        writeln!(
            f,
            "Phi         : {}",
            if self.header.use_phi { "used" } else { "not used" }
        )?;
        write_hex(f, "Tweak       : ", &self.header.tweak)?;
        write_hex(f, "Salt        : ", &self.header.salt)?;
        write_hex(f, "Nonce       : ", &self.header.nonce)?;
        write_hex(f, "MAC         : ", &self.mac)
    }
}

fn write_hex(f: &mut fmt::Formatter<'_>, label: &str, bytes: &[u8]) -> fmt::Result {
    write!(f, "{label}")?;
    for b in bytes {
        write!(f, "{b:02x}")?;
    }
    writeln!(f)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_total_is_consistent() {
        assert_eq!(VISIBLE_METADATA_BYTES, 220);
        assert_eq!(PAYLOAD_OFFSET + MAC_BYTES, VISIBLE_METADATA_BYTES);
    }

    #[test]
    fn header_parse_reads_the_written_fields() {
        let mut rng = SkeinPrng::<8>::new();
        rng.reseed(b"header test");
        let params = EncryptParams {
            g_low: 2,
            g_high: 3,
            lambda: 2,
            use_phi: true,
            padding_bytes: 5,
        };
        let file = encrypt(b"payload", b"pw", &params, &mut rng).unwrap();
        let header = Header::parse(&file).unwrap();
        assert_eq!(header.id, ID);
        assert_eq!(header.total_size, file.len() as u64);
        assert_eq!(
            (header.g_low, header.g_high, header.lambda, header.use_phi),
            (2, 3, 2, true)
        );
    }

    #[test]
    fn truncated_input_is_rejected() {
        let err = Header::parse(&[0u8; VISIBLE_METADATA_BYTES - 1]).unwrap_err();
        assert!(matches!(err, Error::BadFormat(_)));
    }
}
