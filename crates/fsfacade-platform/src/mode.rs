use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Permission flag within a single user/group/others triplet
pub const MODIFIER_READ: u32 = 0o4;
pub const MODIFIER_WRITE: u32 = 0o2;
pub const MODIFIER_EXECUTE: u32 = 0o1;

/// Bit offset of each triplet inside a mode value
pub const ADJUSTMENT_USER: u32 = 6;
pub const ADJUSTMENT_GROUP: u32 = 3;
pub const ADJUSTMENT_OTHERS: u32 = 0;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid octal mode: {0:?}")]
pub struct ParseModeError(String);

/// POSIX-style permission bits (user/group/others × read/write/execute).
///
/// Every `u32` is a valid mode; bits outside `0o7777` are passed through to
/// the OS untouched. Serialized as octal text so config files stay readable.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Mode(u32);

impl Mode {
    pub const USER_READ: Mode = Mode(MODIFIER_READ << ADJUSTMENT_USER);
    pub const USER_WRITE: Mode = Mode(MODIFIER_WRITE << ADJUSTMENT_USER);
    pub const USER_EXECUTE: Mode = Mode(MODIFIER_EXECUTE << ADJUSTMENT_USER);
    pub const USER_READ_WRITE: Mode = Mode(Self::USER_READ.0 | Self::USER_WRITE.0);
    pub const USER_READ_WRITE_EXECUTE: Mode = Mode(Self::USER_READ_WRITE.0 | Self::USER_EXECUTE.0);

    pub const GROUP_READ: Mode = Mode(MODIFIER_READ << ADJUSTMENT_GROUP);
    pub const GROUP_WRITE: Mode = Mode(MODIFIER_WRITE << ADJUSTMENT_GROUP);
    pub const GROUP_EXECUTE: Mode = Mode(MODIFIER_EXECUTE << ADJUSTMENT_GROUP);
    pub const GROUP_READ_WRITE: Mode = Mode(Self::GROUP_READ.0 | Self::GROUP_WRITE.0);
    pub const GROUP_READ_WRITE_EXECUTE: Mode =
        Mode(Self::GROUP_READ_WRITE.0 | Self::GROUP_EXECUTE.0);

    pub const OTHERS_READ: Mode = Mode(MODIFIER_READ << ADJUSTMENT_OTHERS);
    pub const OTHERS_WRITE: Mode = Mode(MODIFIER_WRITE << ADJUSTMENT_OTHERS);
    pub const OTHERS_EXECUTE: Mode = Mode(MODIFIER_EXECUTE << ADJUSTMENT_OTHERS);
    pub const OTHERS_READ_WRITE: Mode = Mode(Self::OTHERS_READ.0 | Self::OTHERS_WRITE.0);
    pub const OTHERS_READ_WRITE_EXECUTE: Mode =
        Mode(Self::OTHERS_READ_WRITE.0 | Self::OTHERS_EXECUTE.0);

    pub const ALL_READ: Mode = Mode(Self::USER_READ.0 | Self::GROUP_READ.0 | Self::OTHERS_READ.0);
    pub const ALL_WRITE: Mode =
        Mode(Self::USER_WRITE.0 | Self::GROUP_WRITE.0 | Self::OTHERS_WRITE.0);
    pub const ALL_EXECUTE: Mode =
        Mode(Self::USER_EXECUTE.0 | Self::GROUP_EXECUTE.0 | Self::OTHERS_EXECUTE.0);
    pub const ALL_READ_WRITE: Mode = Mode(Self::ALL_READ.0 | Self::ALL_WRITE.0);
    pub const ALL_READ_WRITE_EXECUTE: Mode = Mode(Self::ALL_READ_WRITE.0 | Self::ALL_EXECUTE.0);

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Build a mode from a modifier combination shifted into one triplet,
    /// e.g. `Mode::compose(MODIFIER_READ | MODIFIER_WRITE, ADJUSTMENT_GROUP)`.
    pub const fn compose(modifiers: u32, adjustment: u32) -> Self {
        Self((modifiers & 0o7) << adjustment)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: Mode) -> bool {
        self.0 & other.0 == other.0
    }

    /// Native permission value for this mode.
    #[cfg(unix)]
    pub fn as_permissions(self) -> std::fs::Permissions {
        use std::os::unix::fs::PermissionsExt;
        std::fs::Permissions::from_mode(self.0)
    }
}

impl BitOr for Mode {
    type Output = Mode;

    fn bitor(self, rhs: Mode) -> Mode {
        Mode(self.0 | rhs.0)
    }
}

impl BitOrAssign for Mode {
    fn bitor_assign(&mut self, rhs: Mode) {
        self.0 |= rhs.0;
    }
}

impl From<u32> for Mode {
    fn from(bits: u32) -> Self {
        Self(bits)
    }
}

impl From<Mode> for u32 {
    fn from(mode: Mode) -> Self {
        mode.0
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04o}", self.0)
    }
}

impl fmt::Debug for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Mode(0o{:o})", self.0)
    }
}

impl FromStr for Mode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0o")
            .or_else(|| trimmed.strip_prefix("0O"))
            .unwrap_or(trimmed);
        if digits.is_empty() {
            return Err(ParseModeError(s.to_string()));
        }
        u32::from_str_radix(digits, 8)
            .map(Mode)
            .map_err(|_| ParseModeError(s.to_string()))
    }
}

impl TryFrom<String> for Mode {
    type Error = ParseModeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Mode> for String {
    fn from(mode: Mode) -> Self {
        mode.to_string()
    }
}
