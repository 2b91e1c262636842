use bank_types::CredentialHash;
use rand::RngCore;
use subtle::ConstantTimeEq;

/// Salted, stretched BLAKE3 credential hasher.
///
/// Encoded form: `b3$<rounds>$<salt hex>$<digest hex>`. The first round is a
/// BLAKE3 key derivation over `salt || credential` under a fixed context
/// string; each further round rehashes the previous digest with the salt.
#[derive(Clone, Copy, Debug)]
pub struct CredentialHasher {
    rounds: u32,
}

impl CredentialHasher {
    const SCHEME: &'static str = "b3";
    const CONTEXT: &'static str = "bank-core 2024 credential-v1";
    const SALT_LEN: usize = 16;

    /// Default stretching factor.
    pub const DEFAULT_ROUNDS: u32 = 10_000;

    pub const fn new(rounds: u32) -> Self {
        Self { rounds }
    }

    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    /// Hash a plaintext credential with a fresh random salt.
    pub fn hash(&self, credential: &str) -> CredentialHash {
        let mut salt = [0u8; Self::SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt);
        self.hash_with_salt(credential, &salt)
    }

    fn hash_with_salt(&self, credential: &str, salt: &[u8]) -> CredentialHash {
        let digest = derive(credential, salt, self.rounds.max(1));
        CredentialHash::from_encoded(format!(
            "{}${}${}${}",
            Self::SCHEME,
            self.rounds.max(1),
            hex::encode(salt),
            hex::encode(digest)
        ))
    }

    /// Check a plaintext credential against a stored hash.
    ///
    /// The rounds and salt come from the stored value, not from `self`, so
    /// hashes written under an older configuration keep verifying.
    pub fn verify(&self, credential: &str, stored: &CredentialHash) -> Result<bool, CredentialError> {
        let parsed = Parsed::decode(stored.as_str())?;
        let digest = derive(credential, &parsed.salt, parsed.rounds);
        Ok(digest[..].ct_eq(&parsed.digest[..]).into())
    }
}

impl Default for CredentialHasher {
    fn default() -> Self {
        Self::new(Self::DEFAULT_ROUNDS)
    }
}

fn derive(credential: &str, salt: &[u8], rounds: u32) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new_derive_key(CredentialHasher::CONTEXT);
    hasher.update(salt);
    hasher.update(credential.as_bytes());
    let mut digest = *hasher.finalize().as_bytes();

    for _ in 1..rounds {
        let mut round = blake3::Hasher::new();
        round.update(&digest);
        round.update(salt);
        digest = *round.finalize().as_bytes();
    }
    digest
}

struct Parsed {
    rounds: u32,
    salt: Vec<u8>,
    digest: [u8; 32],
}

impl Parsed {
    fn decode(encoded: &str) -> Result<Self, CredentialError> {
        let mut parts = encoded.split('$');
        let scheme = parts.next().unwrap_or_default();
        if scheme != CredentialHasher::SCHEME {
            return Err(CredentialError::UnknownScheme(scheme.to_string()));
        }

        let rounds = parts
            .next()
            .and_then(|r| r.parse::<u32>().ok())
            .filter(|r| *r > 0)
            .ok_or(CredentialError::Malformed("rounds"))?;
        let salt = parts
            .next()
            .and_then(|s| hex::decode(s).ok())
            .ok_or(CredentialError::Malformed("salt"))?;
        let digest: [u8; 32] = parts
            .next()
            .and_then(|d| hex::decode(d).ok())
            .and_then(|d| d.try_into().ok())
            .ok_or(CredentialError::Malformed("digest"))?;

        if parts.next().is_some() {
            return Err(CredentialError::Malformed("trailing fields"));
        }

        Ok(Self {
            rounds,
            salt,
            digest,
        })
    }
}

/// Errors from credential verification.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("unknown credential hash scheme: {0:?}")]
    UnknownScheme(String),

    #[error("malformed credential hash: bad {0}")]
    Malformed(&'static str),
}
