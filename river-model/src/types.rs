//! Strong types for byte arrays
//!
//! Semantic newtypes for the fixed-size byte arrays that travel in River
//! envelopes, replacing raw `[u8; N]`.

use std::fmt;

/// Macro to define fixed-size byte arrays with strong types.
///
/// Args:
/// - $name: The name of the struct (e.g., Hash)
/// - $len: The size of the array (e.g., 32)
/// - $doc: Documentation string
/// - $derives: List of traits to derive
macro_rules! define_bytes {
    ($name:ident, $len:expr, $doc:expr, [$($derives:ident),*]) => {
        #[doc = $doc]
        #[derive(Clone, Copy, serde::Serialize, serde::Deserialize, $($derives),*)]
        #[repr(transparent)]
        pub struct $name(#[serde(with = "serde_bytes")] pub [u8; $len]);

        impl $name {
            pub const LEN: usize = $len;

            /// Returns the inner bytes as a slice.
            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            /// Parse from a hex string, with or without a `0x` prefix.
            pub fn from_hex(hex_str: &str) -> Result<Self, String> {
                let trimmed = hex_str.strip_prefix("0x").unwrap_or(hex_str);
                let bytes = hex::decode(trimmed)
                    .map_err(|e| format!("invalid hex: {}", e))?;
                Self::try_from(bytes).map_err(|v| {
                    format!("expected {} bytes, got {}", $len, v.len())
                })
            }
        }

        impl From<[u8; $len]> for $name {
            fn from(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }
        }

        impl From<$name> for [u8; $len] {
            fn from(wrapper: $name) -> [u8; $len] {
                wrapper.0
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl std::ops::Deref for $name {
            type Target = [u8; $len];
            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::LowerHex::fmt(self, f)
            }
        }

        impl fmt::LowerHex for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                for byte in &self.0 {
                    write!(f, "{:02x}", byte)?;
                }
                Ok(())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}(", stringify!($name))?;
                fmt::Display::fmt(self, f)?;
                write!(f, ")")
            }
        }

        impl TryFrom<&[u8]> for $name {
            type Error = std::array::TryFromSliceError;
            fn try_from(slice: &[u8]) -> Result<Self, Self::Error> {
                Ok(Self(<[u8; $len]>::try_from(slice)?))
            }
        }

        impl TryFrom<Vec<u8>> for $name {
            type Error = Vec<u8>;
            fn try_from(vec: Vec<u8>) -> Result<Self, Self::Error> {
                if vec.len() != $len {
                    return Err(vec);
                }
                let mut arr = [0u8; $len];
                arr.copy_from_slice(&vec);
                Ok(Self(arr))
            }
        }
    };
}

// --- Type Definitions ---

define_bytes!(
    Hash,
    32,
    "32-byte framed keccak-256 event hash",
    [PartialEq, Eq, Hash, Default, PartialOrd, Ord]
);

impl Hash {
    pub const ZERO: Hash = Hash([0u8; 32]);
}

define_bytes!(
    Address,
    20,
    "20-byte Ethereum-style account address",
    [PartialEq, Eq, Hash, Default, PartialOrd, Ord]
);

define_bytes!(
    RecoverableSignature,
    65,
    "65-byte recoverable secp256k1 signature laid out as r || s || v",
    [PartialEq, Eq]
);

impl RecoverableSignature {
    /// Recovery byte, normalized to 0 or 1 (legacy 27/28 encodings are accepted).
    pub fn recovery_byte(&self) -> u8 {
        let v = self.0[64];
        if v >= 27 {
            v - 27
        } else {
            v
        }
    }
}

// --- Tests ---
