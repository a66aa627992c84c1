//! YouTube Data API v3 client library.
//!
//! # Broadcasts vs Streams
//!
//! The YouTube Live API has two resource types that work together:
//!
//! - [`broadcasts::LiveBroadcast`] is what viewers see: title, schedule, privacy.
//!   Each broadcast is exactly one YouTube video.
//! - [`streams::LiveStream`] is where the encoder sends video: format, ingestion protocol,
//!   ingestion address. One stream can power many broadcasts over time.
//!
//! A broadcast only goes out once a stream has been bound to it:
//!
//! ```rust,no_run
//! use youtube_live_broadcast::youtube_api::{
//!     BroadcastPrivacyStatus, IngestionType, LiveBroadcastInsertRequest,
//!     LiveStreamInsertRequest, YouTubeClient,
//! };
//!
//! # async fn example(yt: YouTubeClient) -> eyre::Result<()> {
//! let broadcast = yt
//!     .insert_live_broadcast(&LiveBroadcastInsertRequest::new(
//!         "My event",
//!         "2030-01-30T00:00:00Z".parse()?,
//!         "2030-01-31T00:00:00Z".parse()?,
//!         BroadcastPrivacyStatus::Unlisted,
//!     ))
//!     .await?;
//! let stream = yt
//!     .insert_live_stream(&LiveStreamInsertRequest::new("My encoder", "1080p", IngestionType::Rtmp))
//!     .await?;
//! yt.bind_live_broadcast(&broadcast.id, &stream.id).await?;
//! # Ok(())
//! # }
//! ```

pub mod broadcasts;
pub mod client;
pub mod error;
pub mod streams;

pub use client::{TimeBoundAccessToken, YouTubeClient};
pub use error::ApiError;

pub use broadcasts::{
    BroadcastLifeCycleStatus, BroadcastPrivacyStatus, LiveBroadcast,
    LiveBroadcastContentDetails, LiveBroadcastInsertRequest, LiveBroadcastSnippet,
    LiveBroadcastStatus,
};

pub use streams::{
    IngestionInfo, IngestionType, LiveStream, LiveStreamCdn, LiveStreamInsertRequest,
    LiveStreamSnippet, LiveStreamStatus, StreamStatus,
};
