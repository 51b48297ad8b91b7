use std::fmt;

/// Index of a camera entry in the console sidebar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CameraId(u32);

impl CameraId {
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    pub fn parse(value: &str) -> Result<Self, CameraIdError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(CameraIdError::Empty);
        }
        for (idx, ch) in value.chars().enumerate() {
            if !ch.is_ascii_digit() {
                return Err(CameraIdError::InvalidCharacter { ch, index: idx });
            }
        }
        value
            .parse::<u32>()
            .map(Self)
            .map_err(|_| CameraIdError::OutOfRange(value.to_string()))
    }

    pub const fn index(self) -> u32 {
        self.0
    }

    pub fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl From<u32> for CameraId {
    fn from(index: u32) -> Self {
        Self(index)
    }
}

impl fmt::Display for CameraId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for CameraId {
    type Err = CameraIdError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraIdError {
    Empty,
    InvalidCharacter { ch: char, index: usize },
    OutOfRange(String),
}

impl fmt::Display for CameraIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraIdError::Empty => write!(f, "camera id is empty"),
            CameraIdError::InvalidCharacter { ch, index } => {
                write!(f, "invalid character '{ch}' at position {index}")
            }
            CameraIdError::OutOfRange(value) => write!(f, "camera id {value} is out of range"),
        }
    }
}

impl std::error::Error for CameraIdError {}
