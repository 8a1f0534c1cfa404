mod common;

use boxoffice_api::{
    errors::ErrorKind,
    pagination::Cursor,
    services::tickets::{TicketPageQuery, TicketService},
};
use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use rust_decimal_macros::dec;
use std::time::Duration;
use uuid::Uuid;

use common::TestApp;

/// Timestamps for `n` tickets, newest first when sorted descending, with a
/// run of ties in the middle so the composite key actually matters.
fn timestamps(n: usize) -> Vec<chrono::DateTime<chrono::Utc>> {
    let base = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
    (0..n)
        .map(|i| {
            if (10..20).contains(&i) {
                // Ten tickets created in the same second.
                base + ChronoDuration::seconds(100)
            } else {
                base + ChronoDuration::seconds(i as i64)
            }
        })
        .collect()
}

async fn seed_47(app: &TestApp) {
    let event = app.seed_event().await;
    let tt = app
        .seed_ticket_type(event.id, "General Admission", dec!(25.00), 47, None)
        .await;
    app.seed_claimed_tickets(&event, &tt, &timestamps(47)).await;
}

fn first_page() -> TicketPageQuery {
    TicketPageQuery::default()
}

fn page_after(cursor: String, page: u64) -> TicketPageQuery {
    TicketPageQuery {
        cursor: Some(cursor),
        page: Some(page),
        prev_cursor: None,
        is_jump: false,
    }
}

#[tokio::test]
async fn forty_seven_rows_page_as_20_20_7() {
    let app = TestApp::new().await;
    seed_47(&app).await;
    let tickets = &app.state.services.tickets;

    let page1 = tickets.list_tickets(first_page()).await.expect("page 1");
    assert_eq!(page1.tickets.len(), 20);
    assert!(page1.pagination.has_more);
    assert_eq!(page1.pagination.total, 47);
    assert_eq!(page1.pagination.total_pages, 3);
    let cursor1 = page1.pagination.next_cursor.expect("cursor after page 1");

    let page2 = tickets
        .list_tickets(page_after(cursor1, 2))
        .await
        .expect("page 2");
    assert_eq!(page2.tickets.len(), 20);
    assert!(page2.pagination.has_more);
    let cursor2 = page2.pagination.next_cursor.expect("cursor after page 2");

    let page3 = tickets
        .list_tickets(page_after(cursor2, 3))
        .await
        .expect("page 3");
    assert_eq!(page3.tickets.len(), 7);
    assert!(!page3.pagination.has_more);
    assert_eq!(page3.pagination.next_cursor, None);
}

#[tokio::test]
async fn forward_paging_visits_every_row_exactly_once_in_order() {
    let app = TestApp::new().await;
    seed_47(&app).await;

    // A page size that does not divide 47 and lands a boundary inside the
    // tied-timestamp run.
    let tickets = TicketService::with_config(
        app.state.db.clone(),
        None,
        7,
        Duration::from_secs(300),
    );

    let mut seen: Vec<(chrono::DateTime<chrono::Utc>, Uuid)> = Vec::new();
    let mut cursor: Option<String> = None;
    loop {
        let page = tickets
            .list_tickets(TicketPageQuery {
                cursor: cursor.clone(),
                page: None,
                prev_cursor: None,
                is_jump: false,
            })
            .await
            .expect("page");

        for row in &page.tickets {
            seen.push((row.created_at, row.id));
        }

        match page.pagination.next_cursor {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    assert_eq!(seen.len(), 47, "every row visited exactly once");

    let mut unique = seen.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), 47, "no row repeated across boundaries");

    // Descending (created_at, id) throughout, ties included.
    for window in seen.windows(2) {
        let (prev, next) = (&window[0], &window[1]);
        assert!(
            prev.0 > next.0 || (prev.0 == next.0 && prev.1 > next.1),
            "rows out of composite order: {:?} then {:?}",
            prev,
            next
        );
    }
}

#[tokio::test]
async fn jump_returns_the_same_rows_as_paging_forward() {
    let app = TestApp::new().await;
    seed_47(&app).await;
    let tickets = &app.state.services.tickets;

    let page1 = tickets.list_tickets(first_page()).await.expect("page 1");
    let cursor1 = page1.pagination.next_cursor.expect("cursor");
    let forward_page2 = tickets
        .list_tickets(page_after(cursor1, 2))
        .await
        .expect("forward page 2");

    let jumped_page2 = tickets
        .list_tickets(TicketPageQuery {
            cursor: None,
            page: Some(2),
            prev_cursor: None,
            is_jump: true,
        })
        .await
        .expect("jump to page 2");

    let forward_ids: Vec<Uuid> = forward_page2.tickets.iter().map(|t| t.id).collect();
    let jumped_ids: Vec<Uuid> = jumped_page2.tickets.iter().map(|t| t.id).collect();
    assert_eq!(forward_ids, jumped_ids, "same rows in the same order");
    assert!(jumped_page2.pagination.has_more);
}

#[tokio::test]
async fn jump_to_the_last_page_has_no_next() {
    let app = TestApp::new().await;
    seed_47(&app).await;

    let page3 = app
        .state
        .services
        .tickets
        .list_tickets(TicketPageQuery {
            cursor: None,
            page: Some(3),
            prev_cursor: None,
            is_jump: true,
        })
        .await
        .expect("jump to page 3");

    assert_eq!(page3.tickets.len(), 7);
    assert!(!page3.pagination.has_more);
    assert_eq!(page3.pagination.next_cursor, None);
}

#[tokio::test]
async fn malformed_cursor_is_a_client_error() {
    let app = TestApp::new().await;
    seed_47(&app).await;

    let err = app
        .state
        .services
        .tickets
        .list_tickets(TicketPageQuery {
            cursor: Some("definitely/not/a/cursor".to_string()),
            page: None,
            prev_cursor: None,
            is_jump: false,
        })
        .await
        .expect_err("malformed token");

    assert_eq!(err.kind(), ErrorKind::InvalidCursor);
}

#[tokio::test]
async fn cursor_past_the_end_yields_an_empty_page() {
    let app = TestApp::new().await;
    seed_47(&app).await;

    // Older than every seeded row.
    let ancient = Cursor::new(
        Utc.with_ymd_and_hms(1999, 1, 1, 0, 0, 0).unwrap(),
        Uuid::nil(),
    )
    .encode();

    let page = app
        .state
        .services
        .tickets
        .list_tickets(TicketPageQuery {
            cursor: Some(ancient),
            page: None,
            prev_cursor: None,
            is_jump: false,
        })
        .await
        .expect("empty page, not an error");

    assert!(page.tickets.is_empty());
    assert_eq!(page.pagination.next_cursor, None);
    assert!(!page.pagination.has_more);
}

#[tokio::test]
async fn listing_joins_the_purchaser_email() {
    let app = TestApp::new().await;
    let event = app.seed_event().await;
    let tt = app
        .seed_ticket_type(event.id, "VIP", dec!(100.00), 3, None)
        .await;
    app.seed_claimed_tickets(&event, &tt, &timestamps(3)).await;

    let page = app
        .state
        .services
        .tickets
        .list_tickets(first_page())
        .await
        .expect("page");

    assert_eq!(page.tickets.len(), 3);
    for row in &page.tickets {
        assert!(row.customer_email.is_some(), "join should supply the email");
        assert_eq!(row.event_title, event.title);
    }
}
