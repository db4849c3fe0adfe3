//! BIP38 passphrase-protected private keys, Graphene flavor.
//!
//! Standard non-EC-multiplied BIP38 with two quirks inherited from the
//! reference wallet: the flag byte is always `0xc0` (the "uncompressed"
//! flag), yet the address-hash salt is computed from the *compressed* key's
//! bitcoin address. Keys encrypted by other BIP38 tools will therefore fail
//! the salt check here, and vice versa.
//!
//! ```text
//! salt    = dsha256(base58check(0x00 || hash160(compressed_pub)))[0..4]
//! derived = scrypt(passphrase, salt, N, r, p, 64)
//! half_i  = AES-ECB(derived[32..64], key[16i..16i+16] ^ derived[16i..16i+16])
//! out     = base58(0x01 0x42 0xc0 || salt || half_0 || half_1 || checksum)
//! ```

use zeroize::Zeroizing;

use super::KeyStoreError;
use crate::config::{BIP38_SCRYPT_LOG_N, BIP38_SCRYPT_P, BIP38_SCRYPT_R, CHECKSUM_LENGTH};
use crate::crypto::encryption::{ecb_decrypt_block, ecb_encrypt_block, AES_BLOCK_LENGTH};
use crate::crypto::hash::hash160;
use crate::crypto::{double_sha256, PrivateKey};

const PREFIX: [u8; 3] = [0x01, 0x42, 0xc0];
const SALT_LENGTH: usize = 4;
const PAYLOAD_LENGTH: usize = PREFIX.len() + SALT_LENGTH + 32;

/// scrypt cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bip38Params {
    pub log_n: u8,
    pub r: u32,
    pub p: u32,
}

impl Default for Bip38Params {
    fn default() -> Self {
        Self {
            log_n: BIP38_SCRYPT_LOG_N,
            r: BIP38_SCRYPT_R,
            p: BIP38_SCRYPT_P,
        }
    }
}

/// `base58check(0x00 || hash160(compressed))`, the legacy bitcoin address.
fn bitcoin_address(key: &PrivateKey) -> String {
    let mut payload = Vec::with_capacity(1 + 20 + CHECKSUM_LENGTH);
    payload.push(0x00);
    payload.extend_from_slice(&hash160(&key.public_key().to_bytes()));
    let checksum = double_sha256(&payload);
    payload.extend_from_slice(&checksum[..CHECKSUM_LENGTH]);
    bs58::encode(payload).into_string()
}

fn address_salt(key: &PrivateKey) -> [u8; SALT_LENGTH] {
    let hash = double_sha256(bitcoin_address(key).as_bytes());
    let mut salt = [0u8; SALT_LENGTH];
    salt.copy_from_slice(&hash[..SALT_LENGTH]);
    salt
}

fn derive(passphrase: &str, salt: &[u8], params: &Bip38Params) -> Result<Zeroizing<[u8; 64]>, KeyStoreError> {
    let scrypt_params = scrypt::Params::new(params.log_n, params.r, params.p, 64)
        .map_err(|e| KeyStoreError::Bip38(format!("scrypt parameters: {e}")))?;
    let mut derived = Zeroizing::new([0u8; 64]);
    scrypt::scrypt(passphrase.as_bytes(), salt, &scrypt_params, &mut derived[..])
        .map_err(|e| KeyStoreError::Bip38(format!("scrypt: {e}")))?;
    Ok(derived)
}

/// Encrypts `key` under `passphrase`.
pub fn encrypt(key: &PrivateKey, passphrase: &str, params: &Bip38Params) -> Result<String, KeyStoreError> {
    let salt = address_salt(key);
    let derived = derive(passphrase, &salt, params)?;
    let (mask, aes_key) = derived.split_at(32);
    let secret = key.to_bytes();

    let mut payload = Vec::with_capacity(PAYLOAD_LENGTH + CHECKSUM_LENGTH);
    payload.extend_from_slice(&PREFIX);
    payload.extend_from_slice(&salt);
    for half in 0..2 {
        let range = half * AES_BLOCK_LENGTH..(half + 1) * AES_BLOCK_LENGTH;
        let mut block = Zeroizing::new([0u8; AES_BLOCK_LENGTH]);
        for (i, byte) in block.iter_mut().enumerate() {
            *byte = secret[range.start + i] ^ mask[range.start + i];
        }
        payload.extend_from_slice(&ecb_encrypt_block(aes_key, &block)?);
    }
    let checksum = double_sha256(&payload);
    payload.extend_from_slice(&checksum[..CHECKSUM_LENGTH]);
    Ok(bs58::encode(payload).into_string())
}

/// Decrypts a `6P...` string. A wrong passphrase shows up as a salt
/// mismatch and is reported as [`KeyStoreError::WrongPassphrase`].
pub fn decrypt(encrypted: &str, passphrase: &str, params: &Bip38Params) -> Result<PrivateKey, KeyStoreError> {
    let raw = bs58::decode(encrypted)
        .into_vec()
        .map_err(|_| KeyStoreError::Bip38("not base58".into()))?;
    if raw.len() != PAYLOAD_LENGTH + CHECKSUM_LENGTH {
        return Err(KeyStoreError::Bip38(format!("expected {} bytes, got {}", PAYLOAD_LENGTH + CHECKSUM_LENGTH, raw.len())));
    }
    let (payload, checksum) = raw.split_at(PAYLOAD_LENGTH);
    if double_sha256(payload)[..CHECKSUM_LENGTH] != *checksum {
        return Err(KeyStoreError::Bip38("checksum mismatch".into()));
    }
    if payload[..PREFIX.len()] != PREFIX {
        return Err(KeyStoreError::Bip38("unsupported prefix or flag byte".into()));
    }
    let salt = &payload[PREFIX.len()..PREFIX.len() + SALT_LENGTH];
    let encrypted_halves = &payload[PREFIX.len() + SALT_LENGTH..];

    let derived = derive(passphrase, salt, params)?;
    let (mask, aes_key) = derived.split_at(32);
    let mut secret = Zeroizing::new([0u8; 32]);
    for half in 0..2 {
        let offset = half * AES_BLOCK_LENGTH;
        let mut block = [0u8; AES_BLOCK_LENGTH];
        block.copy_from_slice(&encrypted_halves[offset..offset + AES_BLOCK_LENGTH]);
        let plain = Zeroizing::new(ecb_decrypt_block(aes_key, &block)?);
        for i in 0..AES_BLOCK_LENGTH {
            secret[offset + i] = plain[i] ^ mask[offset + i];
        }
    }

    // Out-of-range scalars can only come from a wrong passphrase here.
    let key = PrivateKey::from_bytes(&secret).map_err(|_| KeyStoreError::WrongPassphrase)?;
    if address_salt(&key)[..] != *salt {
        return Err(KeyStoreError::WrongPassphrase);
    }
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHEAP: Bip38Params = Bip38Params { log_n: 10, r: 8, p: 1 };

    fn alice() -> PrivateKey {
        PrivateKey::from_seed("alice").unwrap()
    }

    #[test]
    fn test_bitcoin_address_of_alice() {
        assert_eq!(bitcoin_address(&alice()), "15iVSHUXH52WWbEdoZNpkGXXqZUM91uu6W");
    }

    #[test]
    fn test_known_answer() {
        let encrypted = encrypt(&alice(), "TestingOneTwoThree", &CHEAP).unwrap();
        assert_eq!(encrypted, "6PRRSARTQSxLSYcBrGB4jQ84PnHZAGXd2aXc5ysuwv2v4cdpfo6iFMTZMR");
        let back = decrypt(&encrypted, "TestingOneTwoThree", &CHEAP).unwrap();
        assert_eq!(back, alice());
    }

    #[test]
    fn test_wrong_passphrase() {
        let encrypted = encrypt(&alice(), "right", &CHEAP).unwrap();
        let err = decrypt(&encrypted, "wrong", &CHEAP).unwrap_err();
        assert!(matches!(err, KeyStoreError::WrongPassphrase));
    }

    #[test]
    fn test_corrupted_string() {
        let mut encrypted = encrypt(&alice(), "pw", &CHEAP).unwrap();
        let last = encrypted.pop().unwrap();
        encrypted.push(if last == '2' { '3' } else { '2' });
        assert!(matches!(decrypt(&encrypted, "pw", &CHEAP), Err(KeyStoreError::Bip38(_))));
        assert!(decrypt("0OIl", "pw", &CHEAP).is_err());
    }

    #[test]
    fn test_default_params_are_bip38() {
        assert_eq!(Bip38Params::default(), Bip38Params { log_n: 14, r: 8, p: 8 });
    }
}
