use actix_session::Session;
use actix_web::{HttpRequest, HttpResponse, web};
use actix_ws::Message;
use sqlx::SqlitePool;

use crate::auth::session::require_admin;
use crate::errors::AppError;
use crate::feed::{AttendanceList, FeedEvent, FeedHub, FeedMessage};
use crate::models::{attendance, meeting};

/// GET /meetings/{id}/feed
///
/// WebSocket upgrade for the live attendee list.
///
/// The connection subscribes before loading the initial list, so a
/// check-in landing in between shows up in both and is deduplicated.
/// The meeting is re-read after subscribing: a close that happened before
/// the subscription is reported as `closed` right after the snapshot.
pub async fn ws_feed(
    req: HttpRequest,
    body: web::Payload,
    session: Session,
    pool: web::Data<SqlitePool>,
    hub: web::Data<FeedHub>,
    path: web::Path<i64>,
) -> Result<HttpResponse, actix_web::Error> {
    require_admin(&session)?;
    let meeting_id = path.into_inner();
    if meeting::find_by_id(&pool, meeting_id).await?.is_none() {
        return Err(AppError::NotFound.into());
    }

    let (response, mut ws_session, mut msg_stream) = actix_ws::handle(&req, body)?;

    let mut rx = hub.subscribe(meeting_id);
    log::debug!(
        "Feed for meeting {meeting_id} opened ({} live views)",
        hub.subscriber_count(meeting_id)
    );
    let hub = hub.get_ref().clone();
    let pool = pool.get_ref().clone();

    actix_web::rt::spawn(async move {
        let initial = match attendance::find_by_meeting(&pool, meeting_id).await {
            Ok(records) => records,
            Err(e) => {
                log::error!("Feed for meeting {meeting_id}: initial fetch failed: {e}");
                let _ = ws_session.close(None).await;
                hub.prune(meeting_id);
                return;
            }
        };
        let active = match meeting::find_by_id(&pool, meeting_id).await {
            Ok(found) => found.is_some_and(|m| m.active),
            Err(e) => {
                log::error!("Feed for meeting {meeting_id}: status check failed: {e}");
                let _ = ws_session.close(None).await;
                hub.prune(meeting_id);
                return;
            }
        };
        let mut list = AttendanceList::from_initial(initial);

        let snapshot = FeedMessage::Snapshot { attendees: list.records() };
        if send(&mut ws_session, &snapshot).await.is_err() {
            hub.prune(meeting_id);
            return;
        }
        if !active {
            let _ = send(&mut ws_session, &FeedMessage::Closed).await;
            let _ = ws_session.close(None).await;
            hub.prune(meeting_id);
            return;
        }

        loop {
            tokio::select! {
                Some(event) = rx.recv() => {
                    match event {
                        // Already in the snapshot when the insert raced the initial fetch.
                        FeedEvent::Attendee(record) if list.apply(record.clone()) => {
                            let msg = FeedMessage::Attendee { attendee: &record, count: list.len() };
                            if send(&mut ws_session, &msg).await.is_err() {
                                break;
                            }
                        }
                        FeedEvent::Attendee(_) => {}
                        FeedEvent::Closed => {
                            let _ = send(&mut ws_session, &FeedMessage::Closed).await;
                            break;
                        }
                    }
                }
                Some(Ok(msg)) = msg_stream.recv() => {
                    match msg {
                        Message::Ping(bytes) => {
                            if ws_session.pong(&bytes).await.is_err() {
                                break;
                            }
                        }
                        Message::Close(_) => break,
                        _ => {}
                    }
                }
                else => break,
            }
        }

        drop(rx);
        let _ = ws_session.close(None).await;
        hub.prune(meeting_id);
    });

    Ok(response)
}

async fn send(ws: &mut actix_ws::Session, msg: &FeedMessage<'_>) -> Result<(), actix_ws::Closed> {
    match serde_json::to_string(msg) {
        Ok(text) => ws.text(text).await,
        Err(e) => {
            log::error!("Feed message serialization failed: {e}");
            Ok(())
        }
    }
}
