use std::time::Duration;

use async_trait::async_trait;
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::{
    sync::{mpsc, oneshot},
    time::{Instant, interval_at, timeout},
};
use tokio_tungstenite::{
    connect_async,
    tungstenite::{self, protocol::Message as WsMessage},
};
use tracing::{debug, info, warn};

use crate::{
    feed::{ChangeEvent, ChangeFeed, ChangeKind, FeedError, Subscription},
    repository::{
        config::{ConfigError, CoreConfig},
        entities::{Creator, CreatorId},
    },
};

const JOIN_TIMEOUT: Duration = Duration::from_secs(10);
const LEAVE_TIMEOUT: Duration = Duration::from_secs(1);

/// Change feed backed by Supabase Realtime, spoken over a Phoenix channel WebSocket.
#[derive(Debug, Clone)]
pub struct RealtimeFeed {
    endpoint: Url,
    api_key: String,
    schema: String,
    table: String,
    channel: String,
    heartbeat: Duration,
}

/// A Phoenix channel frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Frame {
    topic: String,
    event: String,
    payload: Value,
    #[serde(rename = "ref", default)]
    reference: Option<String>,
}

impl Frame {
    fn new(topic: &str, event: &str, payload: Value, reference: u64) -> Self {
        Self {
            topic: topic.into(),
            event: event.into(),
            payload,
            reference: Some(reference.to_string()),
        }
    }

    fn into_message(self) -> Result<WsMessage, FeedError> {
        let text = serde_json::to_string(&self).map_err(|e| FeedError::Protocol(e.to_string()))?;
        Ok(WsMessage::Text(text.into()))
    }
}

#[derive(Debug, Deserialize)]
struct PostgresChange {
    #[serde(rename = "type")]
    kind: ChangeKind,
    #[serde(default)]
    record: Option<Value>,
    #[serde(default)]
    old_record: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct OldRecord {
    id: CreatorId,
}

impl RealtimeFeed {
    pub fn new(cfg: &CoreConfig) -> Result<Self, ConfigError> {
        let endpoint = websocket_endpoint(cfg.supabase_url()?, cfg.anon_key()?)
            .ok_or(ConfigError::Missing("supabase_url"))?;

        Ok(Self {
            endpoint,
            api_key: cfg.anon_key()?.to_string(),
            schema: cfg.schema.clone(),
            table: cfg.table.clone(),
            channel: cfg.channel.clone(),
            heartbeat: cfg.heartbeat(),
        })
    }

    fn topic(&self) -> String {
        format!("realtime:{}", self.channel)
    }

    fn join_payload(&self) -> Value {
        json!({
            "config": {
                "broadcast": { "self": false },
                "presence": { "key": "" },
                "postgres_changes": [
                    { "event": "*", "schema": self.schema, "table": self.table }
                ]
            },
            "access_token": self.api_key,
        })
    }
}

#[async_trait]
impl ChangeFeed for RealtimeFeed {
    async fn subscribe(&self) -> Result<Subscription, FeedError> {
        let topic = self.topic();

        info!("Connecting to change feed at {}", self.endpoint.host_str().unwrap_or("?"));
        let (socket, _) = connect_async(self.endpoint.as_str()).await?;
        let (mut sink, mut stream) = socket.split();

        let join_ref = 1;
        sink.send(Frame::new(&topic, "phx_join", self.join_payload(), join_ref).into_message()?)
            .await?;

        timeout(JOIN_TIMEOUT, await_join_reply(&mut stream, &topic, join_ref))
            .await
            .map_err(|_| FeedError::Connect("timed out waiting to join channel".into()))??;
        info!("Subscribed to {topic}");

        let (tx, rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(run(
            sink,
            stream,
            topic.clone(),
            tx,
            shutdown_rx,
            self.heartbeat,
            join_ref + 1,
        ));

        Ok(Subscription::new(topic, rx, shutdown_tx))
    }
}

/// Read frames until the server acknowledges our join request.
async fn await_join_reply<S>(stream: &mut S, topic: &str, join_ref: u64) -> Result<(), FeedError>
where
    S: Stream<Item = Result<WsMessage, tungstenite::Error>> + Unpin,
{
    let join_ref = join_ref.to_string();

    while let Some(message) = stream.next().await {
        let WsMessage::Text(text) = message? else {
            continue;
        };
        let frame: Frame =
            serde_json::from_str(text.as_str()).map_err(|e| FeedError::Protocol(e.to_string()))?;

        if frame.topic != topic
            || frame.event != "phx_reply"
            || frame.reference.as_deref() != Some(join_ref.as_str())
        {
            continue;
        }

        return match frame.payload.get("status").and_then(Value::as_str) {
            Some("ok") => Ok(()),
            _ => Err(FeedError::Connect(format!(
                "join rejected: {}",
                frame.payload.get("response").unwrap_or(&Value::Null)
            ))),
        };
    }

    Err(FeedError::Closed)
}

async fn run<W, R>(
    mut sink: W,
    mut stream: R,
    topic: String,
    events: mpsc::UnboundedSender<ChangeEvent>,
    mut shutdown: oneshot::Receiver<()>,
    heartbeat: Duration,
    mut next_ref: u64,
) where
    W: Sink<WsMessage, Error = tungstenite::Error> + Unpin,
    R: Stream<Item = Result<WsMessage, tungstenite::Error>> + Unpin,
{
    let mut ticker = interval_at(Instant::now() + heartbeat, heartbeat);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                leave(&mut sink, &topic, next_ref).await;
                break;
            }
            _ = ticker.tick() => {
                let frame = Frame::new("phoenix", "heartbeat", json!({}), next_ref);
                next_ref += 1;

                let sent = match frame.into_message() {
                    Ok(message) => sink.send(message).await.map_err(FeedError::from),
                    Err(e) => Err(e),
                };
                if let Err(e) = sent {
                    warn!("Failed to send heartbeat on {topic}: {e}");
                    break;
                }
            }
            received = stream.next() => match received {
                Some(Ok(WsMessage::Text(text))) => {
                    match decode_frame(text.as_str(), &topic) {
                        Ok(Some(event)) => {
                            debug!("{} event for creator {}", event.kind(), event.id());
                            if events.send(event).is_err() {
                                // Nobody is listening anymore
                                leave(&mut sink, &topic, next_ref).await;
                                break;
                            }
                        }
                        Ok(None) => {}
                        Err(FeedError::Closed) => {
                            info!("Channel {topic} closed by server");
                            break;
                        }
                        Err(e) => warn!("Ignoring undecodable change feed message: {e}"),
                    }
                }
                Some(Ok(WsMessage::Close(_))) | None => {
                    info!("Change feed connection closed by server");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!("Change feed receive error: {e}");
                    break;
                }
            }
        }
    }

    debug!("Change feed worker for {topic} stopped");
}

async fn leave<W>(sink: &mut W, topic: &str, reference: u64)
where
    W: Sink<WsMessage, Error = tungstenite::Error> + Unpin,
{
    let Ok(message) = Frame::new(topic, "phx_leave", json!({}), reference).into_message() else {
        return;
    };

    let farewell = async {
        sink.send(message).await?;
        sink.close().await
    };

    match timeout(LEAVE_TIMEOUT, farewell).await {
        Ok(Ok(())) => debug!("Left {topic}"),
        Ok(Err(e)) => debug!("Failed to leave {topic} cleanly: {e}"),
        Err(_) => debug!("Timed out leaving {topic}"),
    }
}

/// Decode a raw frame. Returns `Ok(None)` for frames that don't carry a row change, such as
/// replies, presence and system messages, and [`FeedError::Closed`] once the server has closed
/// or crashed the channel.
fn decode_frame(text: &str, topic: &str) -> Result<Option<ChangeEvent>, FeedError> {
    let frame: Frame = serde_json::from_str(text).map_err(|e| FeedError::Protocol(e.to_string()))?;

    if frame.topic != topic {
        return Ok(None);
    }
    match frame.event.as_str() {
        "postgres_changes" => {}
        "phx_close" | "phx_error" => return Err(FeedError::Closed),
        _ => return Ok(None),
    }

    let data = frame
        .payload
        .get("data")
        .ok_or_else(|| FeedError::Protocol("postgres_changes without data".into()))?;

    decode_change(data).map(Some)
}

pub(crate) fn decode_change(data: &Value) -> Result<ChangeEvent, FeedError> {
    let change = PostgresChange::deserialize(data).map_err(|e| FeedError::Protocol(e.to_string()))?;

    let kind = change.kind;
    let row = |value: Option<Value>, field: &str| {
        value.ok_or_else(|| FeedError::Protocol(format!("{kind} change without {field}")))
    };

    Ok(match kind {
        ChangeKind::Insert => ChangeEvent::Insert(parse_creator(row(change.record, "record")?)?),
        ChangeKind::Update => ChangeEvent::Update(parse_creator(row(change.record, "record")?)?),
        ChangeKind::Delete => {
            let old: OldRecord = serde_json::from_value(row(change.old_record, "old_record")?)
                .map_err(|e| FeedError::Protocol(e.to_string()))?;
            ChangeEvent::Delete(old.id)
        }
    })
}

fn parse_creator(value: Value) -> Result<Creator, FeedError> {
    serde_json::from_value(value).map_err(|e| FeedError::Protocol(e.to_string()))
}

/// Build the realtime WebSocket endpoint from the project's base URL.
fn websocket_endpoint(base: &str, api_key: &str) -> Option<Url> {
    let mut url = Url::parse(base).ok()?;

    let scheme = match url.scheme() {
        "https" => "wss",
        "http" => "ws",
        _ => return None,
    };
    url.set_scheme(scheme).ok()?;
    url.set_path("/realtime/v1/websocket");
    url.query_pairs_mut()
        .clear()
        .append_pair("apikey", api_key)
        .append_pair("vsn", "1.0.0");

    Some(url)
}
