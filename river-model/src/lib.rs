//! River Model
//!
//! Pure data types and cryptography for River stream clients, decoupled
//! from the wire format, the state machine and the network transport.

pub mod clock;
pub mod crypto;
pub mod stream_id;
pub mod types;

// Re-exports
pub use clock::{Clock, ManualClock, SystemClock};
pub use crypto::CryptoError;
pub use stream_id::{StreamId, StreamIdError, StreamKind};
pub use types::{Address, Hash, RecoverableSignature};

/// secp256k1 signing key type used throughout the client.
pub use k256::ecdsa::SigningKey;
