//! # Audio Module
//!
//! Per-guild sequential playback for the bot.
//!
//! Every guild owns one FIFO queue and at most one play-loop task draining it.
//! Commands never touch a queue directly; they go through the registry.
//!
//! ## Architecture
//!
//! ### [`registry`] - Queue Registry
//! - Maps each guild to its [`player::GuildQueue`], created atomically on first use
//! - Resolves requests before queueing them, so callers get errors synchronously
//!
//! ### [`player`] - Play Loop
//! - One task per active queue: prepare, stream, finish, repeat
//! - Re-resolves entries whose downloaded file vanished
//! - Polls the stream so skip and stop take effect within one interval
//!
//! ### [`queue`] - Queue State
//! - Entries, phase and skip/stop flags behind a single lock
//! - The head entry stays queued while it plays
//!
//! ### [`sink`] and [`voice`] - Audio Output
//! - [`sink::Sink`] abstracts the output so the loop can be tested without Discord
//! - [`voice::SongbirdSink`] plays local files in a voice channel
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! let registry = QueueRegistry::new(resolver, Arc::new(SongbirdSink::new(manager)), settings);
//!
//! let resource = registry.enqueue(guild_id, "never gonna give you up", target, origin).await?;
//! registry.request_skip(guild_id);
//! registry.request_stop(guild_id).await;
//! ```

pub mod player;
pub mod queue;
pub mod registry;
pub mod sink;
pub mod voice;
