use std::sync::Arc;
use std::time::Duration;

use actix_web::{web, HttpRequest, HttpResponse, Result};
use actix_ws::Message;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::time;
use uuid::Uuid;

use crate::services::event_feed::{EventFeed, FeedSender};
use shared::{FeedClientMessage, FeedServerMessage};

/// A broken outgoing stream gets exactly one resend attempt after this
/// delay; a connection still broken then is closed for good.
const RESUBSCRIBE_DELAY: Duration = Duration::from_secs(5);

/// Configure the live event feed route
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/feed", web::get().to(feed_handler));
}

async fn feed_handler(
    req: HttpRequest,
    body: web::Payload,
    feed: web::Data<Arc<EventFeed>>,
) -> Result<HttpResponse> {
    let (response, session, mut msg_stream) = actix_ws::handle(&req, body)?;

    let session_id = Uuid::new_v4();
    let (tx, mut rx) = mpsc::unbounded_channel::<FeedServerMessage>();

    let feed = feed.into_inner();
    let feed_for_session = feed.clone();

    actix_rt::spawn(async move {
        let mut session = session;

        // Forward feed updates out to the socket.
        let mut session_clone = session.clone();
        let send_task = actix_rt::spawn(async move {
            while let Some(msg) = rx.recv().await {
                let json = match serde_json::to_string(&msg) {
                    Ok(json) => json,
                    Err(_) => continue,
                };
                if session_clone.text(json.clone()).await.is_err() {
                    // One recovery attempt after a fixed delay, then give up.
                    time::sleep(RESUBSCRIBE_DELAY).await;
                    if session_clone.text(json).await.is_err() {
                        break;
                    }
                }
            }
        });

        while let Some(Ok(msg)) = msg_stream.next().await {
            match msg {
                Message::Text(text) => {
                    if let Ok(client_msg) = serde_json::from_str::<FeedClientMessage>(&text) {
                        handle_client_message(&session_id, client_msg, &feed_for_session, &tx)
                            .await;
                    } else {
                        let _ = tx.send(FeedServerMessage::Error {
                            code: "invalid_message".to_string(),
                            message: "Failed to parse message".to_string(),
                        });
                    }
                }
                Message::Ping(bytes) => {
                    let _ = session.pong(&bytes).await;
                }
                Message::Close(_) => {
                    break;
                }
                _ => {}
            }
        }

        // Cleanup
        feed_for_session.unsubscribe(&session_id).await;
        send_task.abort();
        let _ = session.close(None).await;
    });

    Ok(response)
}

async fn handle_client_message(
    session_id: &Uuid,
    message: FeedClientMessage,
    feed: &Arc<EventFeed>,
    tx: &FeedSender,
) {
    match message {
        FeedClientMessage::Subscribe {
            family_id,
            filters,
            range_start,
            range_end,
        } => {
            feed.subscribe(
                *session_id,
                family_id,
                filters,
                range_start,
                range_end,
                tx.clone(),
            )
            .await;
            let _ = tx.send(FeedServerMessage::Subscribed { family_id });
        }

        FeedClientMessage::Unsubscribe => {
            feed.unsubscribe(session_id).await;
            let _ = tx.send(FeedServerMessage::Unsubscribed);
        }

        FeedClientMessage::Ping => {
            let _ = tx.send(FeedServerMessage::Pong);
        }
    }
}
