//! River Kernel
//!
//! Turns signed envelopes into trusted events and trusted events into
//! per-stream state:
//! - `codec`: hash, sign, verify and unpack envelopes and miniblocks
//! - `view`: the per-stream state machine and its projections
//! - `handle`/`actor`: one task per stream serializing all mutations

pub mod actor;
pub mod codec;
pub mod content;
pub mod error;
pub mod handle;
pub mod members;
pub mod notify;
pub mod timeline;
pub mod view;

pub use codec::{
    make_event, make_signer_delegate, unpack_envelope, unpack_miniblock, unpack_stream,
    unpack_stream_envelopes, ParsedEvent, ParsedMiniblock, ParsedStreamAndCookie,
    ParsedStreamResponse, SignerContext, UnpackOpts,
};
pub use content::{ContentProjection, ContentView};
pub use error::{RiverError, StreamError};
pub use handle::{ActorRunner, StreamHandle};
pub use members::{KeySolicitationContent, Members, StreamMember};
pub use notify::{EncryptionEvent, Notifier, StreamStateEvent, TimelineChange};
pub use timeline::{
    DecryptedContent, DecryptionSessionError, LocalEvent, LocalEventStatus, StreamTimelineEvent,
    Timeline, TimelineEventState,
};
pub use view::{InitOptions, MiniblockInfo, StreamStateView, ViewStatus};
