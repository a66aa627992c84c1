//! Schedules a live event: create a broadcast, create a stream, bind the two.

use crate::youtube_api::{
    ApiError, BroadcastPrivacyStatus, IngestionType, LiveBroadcastInsertRequest,
    LiveStreamInsertRequest, YouTubeClient,
};
use eyre::Context;
use jiff::Timestamp;
use std::io::Write;

/// What to create.
#[derive(Debug, Clone)]
pub struct BroadcastOptions {
    pub broadcast_title: String,
    pub privacy_status: BroadcastPrivacyStatus,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub stream_title: String,
    pub stream_format: String,
    pub ingestion_type: IngestionType,
}

/// The resources a successful run left on YouTube.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub broadcast_id: String,
    pub stream_id: String,
}

/// Creates the broadcast and stream described by `options` and binds them, writing one
/// status line per step to `out`.
///
/// Steps run strictly in order and stop at the first failure. Nothing is rolled back, so
/// a failure after the first step leaves the broadcast (and possibly the stream) behind.
pub async fn run(
    yt: &YouTubeClient,
    options: &BroadcastOptions,
    out: &mut impl Write,
) -> eyre::Result<Binding> {
    let broadcast = yt
        .insert_live_broadcast(&LiveBroadcastInsertRequest::new(
            options.broadcast_title.clone(),
            options.start_time,
            options.end_time,
            options.privacy_status,
        ))
        .await
        .context("create broadcast")?;
    let Some(snippet) = broadcast.snippet.as_ref() else {
        tracing::warn!(
            broadcast_id = broadcast.id,
            "broadcast response lacks a snippet, broadcast is left unbound"
        );
        eyre::bail!("broadcast {} was returned without a snippet", broadcast.id);
    };
    writeln!(
        out,
        "Broadcast '{}' with title '{}' was published at '{}'.",
        broadcast.id, snippet.title, snippet.published_at
    )?;

    let stream = match yt
        .insert_live_stream(&LiveStreamInsertRequest::new(
            options.stream_title.clone(),
            options.stream_format.clone(),
            options.ingestion_type,
        ))
        .await
    {
        Ok(stream) => stream,
        Err(e) => {
            tracing::warn!(
                broadcast_id = broadcast.id,
                "stream creation failed, broadcast is left unbound"
            );
            return Err(e).context("create stream");
        }
    };
    writeln!(
        out,
        "Stream '{}' with title '{}' was inserted.",
        stream.id, stream.snippet.title
    )?;
    if let Some(info) = stream.cdn.as_ref().and_then(|cdn| cdn.ingestion_info.as_ref()) {
        tracing::info!(
            stream_id = stream.id,
            ingestion_address = info.ingestion_address,
            stream_name = info.stream_name,
            "stream is ready for ingestion"
        );
    }

    let bound = match yt.bind_live_broadcast(&broadcast.id, &stream.id).await {
        Ok(bound) => bound,
        Err(e) => {
            tracing::warn!(
                broadcast_id = broadcast.id,
                stream_id = stream.id,
                "binding failed, broadcast and stream are left unbound"
            );
            return Err(e).context("bind broadcast to stream");
        }
    };
    let bound_stream_id = bound
        .content_details
        .and_then(|cd| cd.bound_stream_id)
        .ok_or_else(|| eyre::eyre!("broadcast {} reports no bound stream", bound.id))?;
    writeln!(
        out,
        "Broadcast '{}' was bound to stream '{}'.",
        bound.id, bound_stream_id
    )?;

    Ok(Binding {
        broadcast_id: bound.id,
        stream_id: bound_stream_id,
    })
}

/// Prints an API-level failure found anywhere in `err`'s chain as the HTTP status and the
/// response body.
///
/// Returns `false`, writing nothing, if `err` did not come from the YouTube API.
pub fn report_api_error(err: &eyre::Report, out: &mut impl Write) -> std::io::Result<bool> {
    let Some(api) = err.chain().find_map(|e| e.downcast_ref::<ApiError>()) else {
        return Ok(false);
    };
    writeln!(
        out,
        "An HTTP error {} occurred:\n{}",
        api.status.as_u16(),
        api.body
    )?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockServer;
    use crate::oauth::OAuthManager;
    use crate::youtube_api::TimeBoundAccessToken;
    use http::{Method, StatusCode};
    use oauth2::basic::{BasicTokenResponse, BasicTokenType};
    use oauth2::{AccessToken, EmptyExtraTokenFields};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn options() -> BroadcastOptions {
        BroadcastOptions {
            broadcast_title: "New Broadcast".to_string(),
            privacy_status: BroadcastPrivacyStatus::Private,
            start_time: "2014-01-30T00:00:00.000Z".parse().unwrap(),
            end_time: "2014-01-31T00:00:00.000Z".parse().unwrap(),
            stream_title: "New Stream".to_string(),
            stream_format: "1080p".to_string(),
            ingestion_type: IngestionType::Rtmp,
        }
    }

    fn client(server: &MockServer) -> YouTubeClient {
        let mut token = BasicTokenResponse::new(
            AccessToken::new("token".to_string()),
            BasicTokenType::Bearer,
            EmptyExtraTokenFields {},
        );
        token.set_expires_in(Some(&Duration::from_secs(3600)));
        YouTubeClient::with_base_url(
            TimeBoundAccessToken::new(token),
            Arc::new(OAuthManager::new(server.client_secrets()).unwrap()),
            server.base_url(),
        )
    }

    fn broadcast_response() -> serde_json::Value {
        json!({
            "kind": "youtube#liveBroadcast",
            "id": "bc-1",
            "snippet": {
                "publishedAt": "2014-01-29T12:00:00Z",
                "title": "New Broadcast",
                "scheduledStartTime": "2014-01-30T00:00:00Z",
                "scheduledEndTime": "2014-01-31T00:00:00Z",
            },
            "status": {
                "lifeCycleStatus": "created",
                "privacyStatus": "private",
            },
        })
    }

    fn stream_response() -> serde_json::Value {
        json!({
            "kind": "youtube#liveStream",
            "id": "st-1",
            "snippet": {
                "publishedAt": "2014-01-29T12:00:01Z",
                "title": "New Stream",
            },
            "cdn": {
                "format": "1080p",
                "ingestionType": "rtmp",
                "ingestionInfo": {
                    "streamName": "abcd-efgh",
                    "ingestionAddress": "rtmp://a.rtmp.youtube.com/live2",
                },
            },
        })
    }

    #[tokio::test]
    async fn three_calls_in_order() {
        let server = MockServer::start()
            .await
            .route(Method::POST, "/liveBroadcasts", StatusCode::OK, broadcast_response())
            .route(Method::POST, "/liveStreams", StatusCode::OK, stream_response())
            .route(
                Method::POST,
                "/liveBroadcasts/bind",
                StatusCode::OK,
                json!({"id": "bc-1", "contentDetails": {"boundStreamId": "st-1"}}),
            );
        let yt = client(&server);

        let mut out = Vec::new();
        let binding = run(&yt, &options(), &mut out).await.unwrap();
        assert_eq!(
            binding,
            Binding {
                broadcast_id: "bc-1".to_string(),
                stream_id: "st-1".to_string(),
            }
        );

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Broadcast 'bc-1' with title 'New Broadcast' was published at '2014-01-29T12:00:00Z'.\n\
             Stream 'st-1' with title 'New Stream' was inserted.\n\
             Broadcast 'bc-1' was bound to stream 'st-1'.\n"
        );

        let requests = server.requests();
        let calls: Vec<_> = requests
            .iter()
            .map(|r| (r.method.clone(), r.path.as_str(), r.query["part"].as_str()))
            .collect();
        assert_eq!(
            calls,
            [
                (Method::POST, "/liveBroadcasts", "snippet,status"),
                (Method::POST, "/liveStreams", "snippet,cdn"),
                (Method::POST, "/liveBroadcasts/bind", "id,contentDetails"),
            ]
        );

        assert_eq!(
            requests[0].json(),
            json!({
                "snippet": {
                    "title": "New Broadcast",
                    "scheduledStartTime": "2014-01-30T00:00:00Z",
                    "scheduledEndTime": "2014-01-31T00:00:00Z",
                },
                "status": { "privacyStatus": "private" },
            })
        );
        assert_eq!(
            requests[1].json(),
            json!({
                "snippet": { "title": "New Stream" },
                "cdn": { "format": "1080p", "ingestionType": "rtmp" },
            })
        );
        assert_eq!(requests[2].query["id"], "bc-1");
        assert_eq!(requests[2].query["streamId"], "st-1");
        assert!(
            requests
                .iter()
                .all(|r| r.authorization.as_deref() == Some("Bearer token"))
        );
    }

    #[tokio::test]
    async fn failed_stream_stops_before_binding() {
        let server = MockServer::start()
            .await
            .route(Method::POST, "/liveBroadcasts", StatusCode::OK, broadcast_response())
            .route(
                Method::POST,
                "/liveStreams",
                StatusCode::FORBIDDEN,
                json!({"error": {"code": 403, "message": "liveStreamingNotEnabled"}}),
            );
        let yt = client(&server);

        let mut out = Vec::new();
        let err = run(&yt, &options(), &mut out).await.unwrap_err();

        let api = err
            .chain()
            .find_map(|e| e.downcast_ref::<ApiError>())
            .unwrap();
        assert_eq!(api.status, StatusCode::FORBIDDEN);
        assert!(api.body.contains("liveStreamingNotEnabled"));

        // the broadcast was still reported, since it now exists
        let out = String::from_utf8(out).unwrap();
        assert_eq!(out.lines().count(), 1);
        assert!(out.starts_with("Broadcast 'bc-1'"));

        let paths: Vec<_> = server.requests().into_iter().map(|r| r.path).collect();
        assert_eq!(paths, ["/liveBroadcasts", "/liveStreams"]);
    }

    #[tokio::test]
    async fn failed_broadcast_issues_nothing_else() {
        let server = MockServer::start().await.route(
            Method::POST,
            "/liveBroadcasts",
            StatusCode::BAD_REQUEST,
            json!({"error": {"code": 400, "message": "invalidScheduledStartTime"}}),
        );
        let yt = client(&server);

        let mut out = Vec::new();
        assert!(run(&yt, &options(), &mut out).await.is_err());
        assert!(out.is_empty());
        assert_eq!(server.requests().len(), 1);
    }

    #[tokio::test]
    async fn broadcast_without_snippet_stops_the_run() {
        let server = MockServer::start().await.route(
            Method::POST,
            "/liveBroadcasts",
            StatusCode::OK,
            json!({"kind": "youtube#liveBroadcast", "id": "bc-1"}),
        );
        let yt = client(&server);

        let mut out = Vec::new();
        let err = run(&yt, &options(), &mut out).await.unwrap_err();
        assert!(err.to_string().contains("bc-1"));
        assert!(out.is_empty());
        assert_eq!(server.requests().len(), 1);
    }

    fn forbidden() -> ApiError {
        ApiError {
            method: Method::POST,
            url: "https://www.googleapis.com/youtube/v3/liveStreams".to_string(),
            status: StatusCode::FORBIDDEN,
            body: r#"{"error": {"code": 403}}"#.to_string(),
        }
    }

    #[test]
    fn api_errors_are_reported_with_status_and_body() {
        let err = eyre::Report::new(forbidden());

        let mut out = Vec::new();
        assert!(report_api_error(&err, &mut out).unwrap());
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "An HTTP error 403 occurred:\n{\"error\": {\"code\": 403}}\n"
        );
    }

    #[test]
    fn api_errors_are_found_under_context() {
        let err = Err::<(), _>(forbidden())
            .context("create stream")
            .unwrap_err();

        let mut out = Vec::new();
        assert!(report_api_error(&err, &mut out).unwrap());
        assert!(
            String::from_utf8(out)
                .unwrap()
                .starts_with("An HTTP error 403 occurred:\n")
        );
    }

    #[test]
    fn other_errors_are_not_reported() {
        let err = eyre::eyre!("client secrets file not found");

        let mut out = Vec::new();
        assert!(!report_api_error(&err, &mut out).unwrap());
        assert!(out.is_empty());
    }
}
