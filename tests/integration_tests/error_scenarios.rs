//! Error scenario integration tests
//!
//! Every failure is absorbed at the smallest enclosing scope: a field, a
//! comment, a thread, or the crawl. The output table stays aligned throughout.

use forum_harvest::browser::{Browser, FixtureBrowser};
use forum_harvest::models::{
    ERROR_LOADING_QUERY, ERROR_LOADING_RESPONSE, NOT_AVAILABLE, NO_RESPONSE,
};
use forum_harvest::storage::COLUMNS;

use super::fixtures::{
    detail_page, detail_page_without_responses, list_item, list_item_without_link, list_page,
    thread_url, Comment, LIST_URL,
};
use crate::common::{crawler, fast_config};

fn assert_aligned(table: &forum_harvest::storage::ResultTable, rows: usize) {
    for i in 0..COLUMNS.len() {
        assert_eq!(table.column(i).unwrap().len(), rows, "column {}", COLUMNS[i]);
    }
}

// ============================================================================
// Comment-Level Failures
// ============================================================================

#[tokio::test]
async fn test_failing_comment_does_not_discard_siblings() {
    let mut browser = FixtureBrowser::new();
    browser.add_page(
        LIST_URL,
        list_page(&[list_item("q1", Some("Router reboots"), None)], 10),
    );
    browser.add_page(
        thread_url("q1"),
        detail_page(
            "Router reboots",
            &[
                Comment::new(&["Same here"]).label("Member"),
                Comment::new(&["unreadable"]).label("Cradlepoint Employee").failing(),
                Comment::new(&["Fixed after update"]).label("Member"),
            ],
        ),
    );

    let (table, stats) = crawler(fast_config(LIST_URL)).run(&mut browser).await;

    assert_eq!(
        table.column_by_name("Response").unwrap()[0],
        format!(
            "Customer Response 1: Same here Cradlepoint Response 2: {NO_RESPONSE} Customer Response 3: Fixed after update"
        )
    );
    assert_eq!(stats.with_response, 1);
}

#[tokio::test]
async fn test_unparsable_response_timestamp_keeps_raw_text() {
    let mut browser = FixtureBrowser::new();
    browser.add_page(
        LIST_URL,
        list_page(
            &[list_item("q1", Some("VPN drops"), Some("May 1, 2024 at 8:00 AM"))],
            10,
        ),
    );
    browser.add_page(
        thread_url("q1"),
        detail_page(
            "VPN drops",
            &[Comment::new(&["Try this"]).label("Member").age("sometime last spring")],
        ),
    );

    let (table, _) = crawler(fast_config(LIST_URL)).run(&mut browser).await;
    let row = table.rows().next().unwrap();
    assert_eq!(row[1], "2024-05-01 08:00:00");
    assert_eq!(row[3], "sometime last spring");
    assert_eq!(row[4], NOT_AVAILABLE);
}

#[tokio::test]
async fn test_unparsable_query_timestamp_anchors_on_now() {
    let mut browser = FixtureBrowser::new();
    browser.add_page(
        LIST_URL,
        list_page(&[list_item("q1", Some("Odd date"), Some("a while back"))], 10),
    );
    browser.add_page(
        thread_url("q1"),
        detail_page(
            "Odd date",
            &[Comment::new(&["Reply"]).label("Member").age("3 hours ago")],
        ),
    );

    let (table, _) = crawler(fast_config(LIST_URL)).run(&mut browser).await;
    let row = table.rows().next().unwrap();
    assert_eq!(row[0], "Odd date");
    assert_eq!(row[1], NOT_AVAILABLE);
    assert_eq!(row[3], "3 hours ago");
    assert_eq!(row[4], "3 hours ago");
}

// ============================================================================
// Thread-Level Failures
// ============================================================================

#[tokio::test]
async fn test_missing_link_degrades_row_and_crawl_continues() {
    let mut browser = FixtureBrowser::new();
    browser.add_page(
        LIST_URL,
        list_page(
            &[
                list_item_without_link("Orphaned question"),
                list_item("q2", Some("Healthy question"), None),
            ],
            10,
        ),
    );
    browser.add_page(
        thread_url("q2"),
        detail_page("Healthy question", &[Comment::new(&["Answer"]).label("Member")]),
    );

    let (table, stats) = crawler(fast_config(LIST_URL)).run(&mut browser).await;

    assert_aligned(&table, 2);
    let rows: Vec<_> = table.rows().collect();
    assert_eq!(
        rows[0],
        [
            ERROR_LOADING_QUERY,
            NOT_AVAILABLE,
            ERROR_LOADING_RESPONSE,
            NOT_AVAILABLE,
            NOT_AVAILABLE
        ]
    );
    assert_eq!(rows[1][0], "Healthy question");
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.with_response, 1);
}

#[tokio::test]
async fn test_unloadable_detail_page_degrades_row() {
    let mut browser = FixtureBrowser::new();
    browser.add_page(
        LIST_URL,
        list_page(
            &[
                list_item("missing", Some("Deleted thread"), None),
                list_item("q2", Some("Next thread"), None),
            ],
            10,
        ),
    );
    browser.add_page(
        thread_url("q2"),
        detail_page("Next thread", &[Comment::new(&["Answer"]).label("Member")]),
    );

    let (table, _) = crawler(fast_config(LIST_URL)).run(&mut browser).await;

    let queries = table.column_by_name("Query").unwrap();
    assert_eq!(queries[0], ERROR_LOADING_QUERY);
    assert_eq!(queries[1], "Next thread");
    assert_eq!(browser.views().await.unwrap().len(), 1);
    assert_eq!(browser.current_url().await.unwrap(), LIST_URL);
}

#[tokio::test]
async fn test_missing_response_container_is_no_response() {
    let mut browser = FixtureBrowser::new();
    browser.add_page(
        LIST_URL,
        list_page(
            &[list_item("q1", Some("Unanswered"), Some("May 30, 2024"))],
            10,
        ),
    );
    browser.add_page(thread_url("q1"), detail_page_without_responses("Unanswered"));

    let (table, stats) = crawler(fast_config(LIST_URL)).run(&mut browser).await;

    let row = table.rows().next().unwrap();
    assert_eq!(
        row,
        ["Unanswered", "2024-05-30 00:00:00", NO_RESPONSE, NOT_AVAILABLE, NOT_AVAILABLE]
    );
    assert_eq!(stats.without_response, 1);
    assert_eq!(browser.views().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_empty_response_container_is_no_response() {
    let mut browser = FixtureBrowser::new();
    browser.add_page(LIST_URL, list_page(&[list_item("q1", Some("Quiet"), None)], 10));
    browser.add_page(thread_url("q1"), detail_page("Quiet", &[]));

    let (table, _) = crawler(fast_config(LIST_URL)).run(&mut browser).await;
    assert_eq!(table.column_by_name("Response").unwrap()[0], NO_RESPONSE);
}

// ============================================================================
// Crawl-Level Failures
// ============================================================================

#[tokio::test]
async fn test_missing_thread_list_yields_empty_aligned_table() {
    let mut browser = FixtureBrowser::new();
    browser.add_page(LIST_URL, "<html><body><p>Under maintenance</p></body></html>");

    let (table, stats) = crawler(fast_config(LIST_URL)).run(&mut browser).await;

    assert!(table.is_empty());
    assert_aligned(&table, 0);
    assert_eq!(stats.threads_discovered, 0);
    assert!(stats.aborted);
}

#[tokio::test]
async fn test_unreachable_list_aborts_but_releases_session() {
    let browser = FixtureBrowser::new();
    let quit = browser.quit_signal();

    let (table, stats) = crawler(fast_config(LIST_URL)).run_session(browser).await;

    assert!(table.is_empty());
    assert!(stats.aborted);
    assert!(quit.get());
}

#[tokio::test]
async fn test_stuck_view_more_is_capped() {
    let items = [list_item("q1", Some("Only thread"), None)];
    let list = list_page(&items, 10).replace(
        r#"<div class="cuf-showMore"></div>"#,
        r#"<div class="cuf-showMore"><button data-fixture-reveals="nothing" data-fixture-sticky>View More</button></div>"#,
    );
    let mut browser = FixtureBrowser::new();
    browser.add_page(LIST_URL, list);
    browser.add_page(
        thread_url("q1"),
        detail_page("Only thread", &[Comment::new(&["Answer"]).label("Member")]),
    );

    let mut config = fast_config(LIST_URL);
    config.crawler.max_expansions = 5;
    let (table, stats) = crawler(config).run(&mut browser).await;

    assert_eq!(stats.expansions, 5);
    assert_eq!(table.len(), 1);
}
