//! Client-side realtime conversation engine for bidirectional voice/text
//! model services.
//!
//! ## Connecting and having a conversation
//!
//! ```no_run
//! # tokio_test::block_on(async {
//! use realtime_conversation::{DirectConfig, RealtimeClient};
//! use realtime_conversation::types::realtime::ContentPart;
//!
//! let client = RealtimeClient::new(DirectConfig::from_env(), 24_000);
//! client.connect().await.unwrap();
//! client
//!     .send_user_message_content(vec![ContentPart::input_text("hello there")])
//!     .await
//!     .unwrap();
//! let item = client.wait_for_next_completed_item().await;
//! println!("{:?}", item.formatted.text);
//! # });
//! ```
//!
//! ## Layout
//!
//! - [`transport`] owns the single duplex connection and frames wire events.
//! - [`conversation`] is the pure, synchronous store that reduces server
//!   events into ordered items and responses.
//! - [`client`] composes the two above, owns session configuration and the
//!   tool registry, and is the crate's main entry point.

pub mod audio;
pub mod client;
pub mod config;
pub mod conversation;
pub mod error;
pub mod event_emitter;
pub mod traits;
pub mod transport;
pub mod types;

pub use client::{ClientEvent, EventSource, RealtimeClient, ToolResult};
pub use config::{DirectConfig, EnterpriseConfig, RealtimeConfig};
pub use conversation::{ConversationStore, Delta, FormattedContent, FormattedTool, StoreItem};
pub use error::{RealtimeApiError, RealtimeError};
pub use transport::{Transport, TransportEvent};
