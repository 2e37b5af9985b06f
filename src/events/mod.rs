//! Block event subscriptions.
//!
//! # Data Flow
//! ```text
//! SubscribeRequest + CancelToken
//!     → listener.rs: signed seek envelope
//!     → transport.rs: DeliverTransport::open (WebSocket by default)
//!     → frames → decode.rs (BlockDecoder, up to N blocks at once)
//!     → in-order, de-duplicated delivery into a bounded channel
//!     → EventStream (futures Stream of Result<BlockEvent>)
//!
//! States:
//!     Disconnected → Connecting → Subscribed → Streaming → Closed | Errored
//! ```
//!
//! # Design Decisions
//! - One background task and one connection per subscription
//! - Block order is restored after concurrent decoding; numbers at or below
//!   the last delivered one are dropped
//! - No reconnect: a failure ends the stream with a single terminal error

pub mod cancel;
pub mod decode;
pub mod listener;
pub mod transport;

pub use cancel::CancelToken;
pub use decode::{BlockDecoder, BlockEvent, DecodedBlock, EnvelopeDecoder, EventMode, RawBlock};
pub use listener::{EventListener, EventStream, ListenerState, SubscribeRequest, SubscriptionId};
pub use transport::{DeliverStream, DeliverTransport, WsDeliver, DELIVER_PATH};
