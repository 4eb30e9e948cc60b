//! Live feed tests: hub fan-out and the reconciled attendee list.

use chrono::{Duration, Utc};
use semillero::feed::{AttendanceList, FeedEvent, FeedHub};
use semillero::models::attendance::AttendanceRecord;

fn record(id: i64, meeting_id: i64, offset_secs: i64) -> AttendanceRecord {
    AttendanceRecord {
        id,
        meeting_id,
        user_id: id,
        full_name: format!("Miembro {id}"),
        username: format!("m{id}"),
        avatar_url: None,
        scanned_at: Utc::now() + Duration::seconds(offset_secs),
    }
}

#[test]
fn test_list_grows_by_distinct_pushes() {
    let initial = vec![record(1, 1, 0), record(2, 1, 1), record(3, 1, 2)];
    let mut list = AttendanceList::from_initial(initial);
    assert_eq!(list.len(), 3);

    for id in 4..=8 {
        assert!(list.apply(record(id, 1, id)));
    }
    assert_eq!(list.len(), 3 + 5);
}

#[test]
fn test_duplicate_id_is_not_appended() {
    let mut list = AttendanceList::from_initial(vec![record(1, 1, 0), record(1, 1, 0)]);
    assert_eq!(list.len(), 1);

    // Insert that landed between subscribe and the initial fetch.
    assert!(!list.apply(record(1, 1, 0)));
    assert!(list.apply(record(2, 1, 5)));
    assert!(!list.apply(record(2, 1, 5)));
    assert_eq!(list.len(), 2);
}

#[test]
fn test_list_keeps_scan_order() {
    let mut list = AttendanceList::from_initial(vec![record(1, 1, 0), record(3, 1, 10)]);
    list.apply(record(2, 1, 5));
    let ids: Vec<i64> = list.records().iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_hub_delivers_only_to_matching_meeting() {
    let hub = FeedHub::new();
    let mut watching_one = hub.subscribe(1);
    let mut watching_two = hub.subscribe(2);

    assert_eq!(hub.publish(&record(10, 1, 0)), 1);

    match watching_one.recv().await {
        Some(FeedEvent::Attendee(r)) => assert_eq!(r.id, 10),
        other => panic!("unexpected event {other:?}"),
    }
    assert!(watching_two.try_recv().is_err());
}

#[tokio::test]
async fn test_close_notifies_and_drops_subscribers() {
    let hub = FeedHub::new();
    let mut a = hub.subscribe(5);
    let mut b = hub.subscribe(5);
    assert_eq!(hub.subscriber_count(5), 2);

    assert_eq!(hub.close_meeting(5), 2);
    assert_eq!(a.recv().await, Some(FeedEvent::Closed));
    assert_eq!(b.recv().await, Some(FeedEvent::Closed));
    // Senders were dropped with the meeting.
    assert_eq!(a.recv().await, None);
    assert_eq!(hub.subscriber_count(5), 0);
}

#[test]
fn test_dropped_receivers_are_pruned() {
    let hub = FeedHub::new();
    let rx = hub.subscribe(9);
    let _kept = hub.subscribe(9);
    drop(rx);

    assert_eq!(hub.publish(&record(1, 9, 0)), 1);
    assert_eq!(hub.subscriber_count(9), 1);
}
