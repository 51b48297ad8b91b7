use std::fmt;

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;

use crate::endpoints;

pub const SALT_ENCODED_LEN: usize = 22;
pub const SALT_BYTES: usize = 16;
pub const MIN_COST: u32 = 4;
pub const MAX_COST: u32 = 31;

// 22 chars carry 132 bits; the last 4 are padding bcryptjs does not always zero.
const BCRYPT_B64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::BCRYPT,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::RequireNone)
        .with_decode_allow_trailing_bits(true),
);

/// Values read from the login form. Lives for one submit only.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub next: String,
}

impl Credentials {
    pub fn new(username: &str, password: &str, next: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
            next: next.to_string(),
        }
    }

    pub fn salt_url(&self) -> String {
        endpoints::salt_url(&self.username)
    }

    pub fn login_url(&self, password_hash: &str) -> String {
        endpoints::login_url(&self.username, password_hash, &self.next)
    }

    pub fn hash_with(&self, salt: &BcryptSalt) -> Result<String, HashError> {
        hash_password(&self.password, salt)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("next", &self.next)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BcryptVersion {
    TwoA,
    TwoB,
    TwoX,
    TwoY,
}

impl BcryptVersion {
    fn parse(tag: &str) -> Option<Self> {
        match tag {
            "2a" => Some(BcryptVersion::TwoA),
            "2b" => Some(BcryptVersion::TwoB),
            "2x" => Some(BcryptVersion::TwoX),
            "2y" => Some(BcryptVersion::TwoY),
            _ => None,
        }
    }

    fn as_bcrypt(self) -> bcrypt::Version {
        match self {
            BcryptVersion::TwoA => bcrypt::Version::TwoA,
            BcryptVersion::TwoB => bcrypt::Version::TwoB,
            BcryptVersion::TwoX => bcrypt::Version::TwoX,
            BcryptVersion::TwoY => bcrypt::Version::TwoY,
        }
    }
}

/// Salt string as served by `/salt`, e.g. `$2b$12$R9h/cIPz0gi.URNNX3kh2O`.
///
/// A full bcrypt hash is accepted too; only the 22 salt characters after
/// the cost are used, as bcryptjs does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BcryptSalt {
    version: BcryptVersion,
    cost: u32,
    bytes: [u8; SALT_BYTES],
}

impl BcryptSalt {
    pub fn parse(value: &str) -> Result<Self, SaltError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(SaltError::Empty);
        }
        let mut parts = value.splitn(4, '$');
        let (Some(""), Some(tag), Some(cost), Some(encoded)) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(SaltError::MissingPrefix);
        };
        let version =
            BcryptVersion::parse(tag).ok_or_else(|| SaltError::UnknownVersion(tag.to_string()))?;
        if cost.len() != 2 {
            return Err(SaltError::InvalidCost(cost.to_string()));
        }
        let cost = cost
            .parse::<u32>()
            .map_err(|_| SaltError::InvalidCost(cost.to_string()))?;
        if !(MIN_COST..=MAX_COST).contains(&cost) {
            return Err(SaltError::InvalidCost(cost.to_string()));
        }
        if encoded.len() < SALT_ENCODED_LEN || !encoded.is_char_boundary(SALT_ENCODED_LEN) {
            return Err(SaltError::InvalidLength {
                expected: SALT_ENCODED_LEN,
                found: encoded.len(),
            });
        }
        let decoded = BCRYPT_B64
            .decode(&encoded[..SALT_ENCODED_LEN])
            .map_err(|err| SaltError::InvalidEncoding(err.to_string()))?;
        let bytes: [u8; SALT_BYTES] =
            decoded
                .try_into()
                .map_err(|decoded: Vec<u8>| SaltError::InvalidLength {
                    expected: SALT_BYTES,
                    found: decoded.len(),
                })?;
        Ok(Self {
            version,
            cost,
            bytes,
        })
    }

    pub fn version(&self) -> BcryptVersion {
        self.version
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }
}

impl std::str::FromStr for BcryptSalt {
    type Err = SaltError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

pub fn hash_password(password: &str, salt: &BcryptSalt) -> Result<String, HashError> {
    bcrypt::hash_with_salt(password, salt.cost, salt.bytes)
        .map(|parts| parts.format_for_version(salt.version.as_bcrypt()))
        .map_err(|err| HashError(err.to_string()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaltError {
    Empty,
    MissingPrefix,
    UnknownVersion(String),
    InvalidCost(String),
    InvalidLength { expected: usize, found: usize },
    InvalidEncoding(String),
}

impl fmt::Display for SaltError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaltError::Empty => write!(f, "salt is empty"),
            SaltError::MissingPrefix => write!(f, "salt must look like $2b$NN$<22 chars>"),
            SaltError::UnknownVersion(tag) => write!(f, "unknown bcrypt version '{tag}'"),
            SaltError::InvalidCost(cost) => {
                write!(f, "cost '{cost}' must be two digits between {MIN_COST} and {MAX_COST}")
            }
            SaltError::InvalidLength { expected, found } => {
                write!(f, "salt must be {expected} long, got {found}")
            }
            SaltError::InvalidEncoding(reason) => write!(f, "salt is not bcrypt-base64: {reason}"),
        }
    }
}

impl std::error::Error for SaltError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashError(pub String);

impl fmt::Display for HashError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "password hashing failed: {}", self.0)
    }
}

impl std::error::Error for HashError {}
