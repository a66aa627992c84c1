//! YouTube Live Broadcasts API types.
//!
//! A [`LiveBroadcast`] is the viewer-facing side of a live event: title, schedule,
//! privacy. It only transmits video once a [`LiveStream`](super::streams::LiveStream)
//! has been bound to it.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A `liveBroadcast` resource represents a viewer-facing live streaming event on YouTube.
///
/// Each broadcast corresponds to exactly one YouTube video. Which of the parts below are
/// populated depends on the `part` parameter of the request that returned it, so all of
/// them are optional.
///
/// See: <https://developers.google.com/youtube/v3/live/docs/liveBroadcasts#resource>
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveBroadcast {
    /// The ID that YouTube assigns to uniquely identify the broadcast.
    pub id: String,
    /// Contains basic details about the broadcast.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<LiveBroadcastSnippet>,
    /// Contains information about the broadcast's status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<LiveBroadcastStatus>,
    /// Contains information about the video stream bound to the broadcast.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_details: Option<LiveBroadcastContentDetails>,
}

/// The snippet object contains basic details about the broadcast.
///
/// This is a subset of the full snippet data available from the YouTube API.
///
/// See: <https://developers.google.com/youtube/v3/live/docs/liveBroadcasts#snippet>
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveBroadcastSnippet {
    /// The broadcast's title.
    pub title: String,
    /// The date and time that the broadcast was added to YouTube's live broadcast schedule.
    pub published_at: Timestamp,
    /// The date and time that the broadcast is scheduled to start.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_start_time: Option<Timestamp>,
    /// The date and time that the broadcast is scheduled to end.
    ///
    /// Unset means the broadcast is scheduled to continue indefinitely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_end_time: Option<Timestamp>,
}

/// The status object contains information about the live broadcast's status.
///
/// See: <https://developers.google.com/youtube/v3/live/docs/liveBroadcasts#status>
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveBroadcastStatus {
    /// The broadcast's lifecycle status.
    pub life_cycle_status: BroadcastLifeCycleStatus,
    /// The broadcast's privacy status.
    pub privacy_status: BroadcastPrivacyStatus,
    /// Whether the broadcast is made for kids.
    #[serde(default)]
    pub made_for_kids: bool,
}

/// The contentDetails object contains information about the broadcast's video content.
///
/// See: <https://developers.google.com/youtube/v3/live/docs/liveBroadcasts#contentDetails>
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveBroadcastContentDetails {
    /// The ID of the stream that is bound to the broadcast, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bound_stream_id: Option<String>,
}

/// The broadcast's current lifecycle status.
///
/// See: <https://developers.google.com/youtube/v3/live/docs/liveBroadcasts#status.lifeCycleStatus>
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BroadcastLifeCycleStatus {
    /// The broadcast is ready to be activated but has not yet been activated.
    Ready,
    /// The broadcast is transitioning to testing.
    TestStarting,
    /// The broadcast is in testing mode and can be seen by viewers who have access to the URL.
    Testing,
    /// The broadcast is transitioning to live.
    LiveStarting,
    /// The broadcast is active and visible to anyone who has access to the URL.
    Live,
    /// The broadcast has finished and is no longer live.
    Complete,
    /// The broadcast was created but never activated.
    Created,
    /// The broadcast has been revoked and can no longer be activated.
    Revoked,
}


/// The broadcast's privacy status.
///
/// See: <https://developers.google.com/youtube/v3/live/docs/liveBroadcasts#status.privacyStatus>
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BroadcastPrivacyStatus {
    /// The broadcast is public and can be viewed by anyone.
    Public,
    /// The broadcast is unlisted and can only be viewed by people with the link.
    Unlisted,
    /// The broadcast is private and can only be viewed by the owner and authorized viewers.
    #[default]
    Private,
}


impl FromStr for BroadcastPrivacyStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(Self::Public),
            "unlisted" => Ok(Self::Unlisted),
            "private" => Ok(Self::Private),
            _ => Err(format!(
                "unknown privacy status '{s}' (expected public, unlisted, or private)"
            )),
        }
    }
}

/// Request body for the `liveBroadcasts.insert` API call with `part=snippet,status`.
///
/// See: <https://developers.google.com/youtube/v3/live/docs/liveBroadcasts/insert>
#[derive(Debug, Serialize)]
pub struct LiveBroadcastInsertRequest {
    pub snippet: LiveBroadcastInsertSnippet,
    pub status: LiveBroadcastInsertStatus,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveBroadcastInsertSnippet {
    pub title: String,
    pub scheduled_start_time: Timestamp,
    pub scheduled_end_time: Timestamp,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveBroadcastInsertStatus {
    pub privacy_status: BroadcastPrivacyStatus,
}

impl LiveBroadcastInsertRequest {
    /// Describes a new broadcast scheduled between `start` and `end`.
    pub fn new(
        title: impl Into<String>,
        start: Timestamp,
        end: Timestamp,
        privacy_status: BroadcastPrivacyStatus,
    ) -> Self {
        Self {
            snippet: LiveBroadcastInsertSnippet {
                title: title.into(),
                scheduled_start_time: start,
                scheduled_end_time: end,
            },
            status: LiveBroadcastInsertStatus { privacy_status },
        }
    }
}
