//! YouTube Live Streams API types.
//!
//! A [`LiveStream`] is the ingestion side of a live event: the endpoint an encoder pushes
//! video to. One stream can be bound to many broadcasts over time.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A `liveStream` resource represents the technical video pipeline for transmitting content to YouTube.
///
/// See: <https://developers.google.com/youtube/v3/live/docs/liveStreams#resource>
#[derive(Debug, Serialize, Deserialize)]
pub struct LiveStream {
    /// The ID that YouTube assigns to uniquely identify the stream.
    pub id: String,
    /// Contains basic details about the stream.
    pub snippet: LiveStreamSnippet,
    /// Contains ingestion settings for the stream.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cdn: Option<LiveStreamCdn>,
    /// Contains information about the stream's status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<LiveStreamStatus>,
}

/// The snippet object contains basic details about the stream.
///
/// See: <https://developers.google.com/youtube/v3/live/docs/liveStreams#snippet>
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveStreamSnippet {
    /// The stream's title.
    pub title: String,
    /// The stream's description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// The date and time that the stream was created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<Timestamp>,
}

/// The cdn object defines the live stream's content delivery network settings.
///
/// See: <https://developers.google.com/youtube/v3/live/docs/liveStreams#cdn>
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveStreamCdn {
    /// The format of the video stream, e.g. `1080p`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// The method or protocol used to transmit the video stream.
    pub ingestion_type: IngestionType,
    /// Where and how the encoder should send the stream.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingestion_info: Option<IngestionInfo>,
}

/// See: <https://developers.google.com/youtube/v3/live/docs/liveStreams#cdn.ingestionInfo>
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestionInfo {
    /// The stream name (stream key) the encoder must use.
    pub stream_name: String,
    /// The primary ingestion URL.
    pub ingestion_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_ingestion_address: Option<String>,
}

/// The protocol used to transmit the video stream to YouTube.
///
/// See: <https://developers.google.com/youtube/v3/live/docs/liveStreams#cdn.ingestionType>
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IngestionType {
    Dash,
    Hls,
    #[default]
    Rtmp,
    Webrtc,
}


impl FromStr for IngestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dash" => Ok(Self::Dash),
            "hls" => Ok(Self::Hls),
            "rtmp" => Ok(Self::Rtmp),
            "webrtc" => Ok(Self::Webrtc),
            _ => Err(format!(
                "unknown ingestion type '{s}' (expected rtmp, dash, webrtc, or hls)"
            )),
        }
    }
}

/// The status of a live stream.
///
/// See: <https://developers.google.com/youtube/v3/live/docs/liveStreams#status>
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StreamStatus {
    /// The stream is receiving data.
    Active,
    /// The stream exists but lacks valid CDN settings.
    Created,
    /// An error condition exists on the stream.
    Error,
    /// The stream is not receiving data.
    Inactive,
    /// The stream has valid CDN settings.
    Ready,
}


/// See: <https://developers.google.com/youtube/v3/live/docs/liveStreams#status>
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveStreamStatus {
    pub stream_status: StreamStatus,
}

/// Request body for the `liveStreams.insert` API call with `part=snippet,cdn`.
///
/// See: <https://developers.google.com/youtube/v3/live/docs/liveStreams/insert>
#[derive(Debug, Serialize)]
pub struct LiveStreamInsertRequest {
    pub snippet: LiveStreamInsertSnippet,
    pub cdn: LiveStreamInsertCdn,
}

#[derive(Debug, Serialize)]
pub struct LiveStreamInsertSnippet {
    pub title: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveStreamInsertCdn {
    pub format: String,
    pub ingestion_type: IngestionType,
}

impl LiveStreamInsertRequest {
    pub fn new(
        title: impl Into<String>,
        format: impl Into<String>,
        ingestion_type: IngestionType,
    ) -> Self {
        Self {
            snippet: LiveStreamInsertSnippet {
                title: title.into(),
            },
            cdn: LiveStreamInsertCdn {
                format: format.into(),
                ingestion_type,
            },
        }
    }
}
