//! River Sync
//!
//! Loads streams from a node into actor-owned views and pages their
//! history backwards:
//! - `reader`: get-stream bootstrap and get-miniblocks pages
//! - `scrollback`: coalesced, race-guarded backward pagination
//! - `boundary`: entitlement and group-decryption collaborators

pub mod boundary;
pub mod error;
pub mod reader;
pub mod scrollback;
pub mod source;

pub use boundary::{
    entitled_key_exchange_users, spawn_decryption_worker, EntitlementChecker, GroupDecryptor, Permission,
};
pub use error::SyncError;
pub use reader::{MiniblocksPage, StreamReader};
pub use scrollback::{ScrollbackCoordinator, ScrollbackResult, SCROLLBACK_MAX_ROUNDS};
pub use source::{MiniblockSource, RpcMiniblockSource};
