//! End-to-end pipeline integration tests
//!
//! Tests the complete workflow:
//! 1. List expansion through "View More"
//! 2. Per-thread detail views
//! 3. Comment extraction and timing
//! 4. Row collection and export

use forum_harvest::browser::{Browser, FixtureBrowser};
use forum_harvest::storage::{ExportFormat, TableExporter, COLUMNS};
use tempfile::TempDir;

use super::fixtures::{detail_page, list_item, list_page, thread_url, Comment, LIST_URL};
use crate::common::{crawler, fast_config};

/// Forum with `threads` questions, `page_size` visible per "View More" page
fn forum(threads: usize, page_size: usize) -> FixtureBrowser {
    let items: Vec<String> = (1..=threads)
        .map(|n| {
            list_item(
                &format!("q{n}"),
                Some(&format!("Question {n}")),
                Some("May 20, 2024 at 9:30 AM"),
            )
        })
        .collect();

    let mut browser = FixtureBrowser::new();
    browser.add_page(LIST_URL, list_page(&items, page_size));
    for n in 1..=threads {
        let comments = [
            Comment::new(&["Seeing this on", "firmware 7.2"])
                .label("Member")
                .age("May 21, 2024 at 10:30 AM"),
            Comment::new(&[&format!("Answer for {n}")])
                .label("Cradlepoint Employee")
                .age("May 22, 2024 at 9:30 AM"),
        ];
        browser.add_page(
            thread_url(&format!("q{n}")),
            detail_page(&format!("Question {n}"), &comments),
        );
    }
    browser
}

// ============================================================================
// Complete Pipeline Tests
// ============================================================================

#[tokio::test]
async fn test_pipeline_single_thread() {
    let mut browser = forum(1, 10);
    let crawler = crawler(fast_config(LIST_URL));

    let (table, stats) = crawler.run(&mut browser).await;

    assert_eq!(table.len(), 1);
    let row = table.rows().next().unwrap();
    assert_eq!(row[0], "Question 1");
    assert_eq!(row[1], "2024-05-20 09:30:00");
    assert_eq!(
        row[2],
        "Customer Response 1: Seeing this on firmware 7.2 Cradlepoint Response 2: Answer for 1"
    );
    assert_eq!(row[3], "May 21, 2024 at 10:30 AM");
    assert_eq!(row[4], "1 days ago");

    assert_eq!(stats.threads_discovered, 1);
    assert_eq!(stats.with_response, 1);
    assert_eq!(stats.failed, 0);
    assert!(!stats.aborted);
}

#[tokio::test]
async fn test_pipeline_expands_pages_and_caps_sample() {
    let mut browser = forum(20, 8);
    let crawler = crawler(fast_config(LIST_URL));

    let (table, stats) = crawler.run(&mut browser).await;

    assert_eq!(stats.threads_discovered, 20);
    assert_eq!(stats.expansions, 2);
    assert_eq!(stats.threads_processed, 15);
    assert_eq!(table.len(), 15);
    for i in 0..COLUMNS.len() {
        assert_eq!(table.column(i).unwrap().len(), 15);
    }

    // Encounter order is preserved across revealed pages
    let queries = table.column_by_name("Query").unwrap();
    assert_eq!(queries[0], "Question 1");
    assert_eq!(queries[8], "Question 9");
    assert_eq!(queries[14], "Question 15");
}

#[tokio::test]
async fn test_pipeline_configurable_sample_size() {
    let mut browser = forum(6, 10);
    let mut config = fast_config(LIST_URL);
    config.crawler.sample_size = 4;

    let (table, stats) = crawler(config).run(&mut browser).await;
    assert_eq!(table.len(), 4);
    assert_eq!(stats.threads_discovered, 6);
}

#[tokio::test]
async fn test_pipeline_returns_to_list_view() {
    let mut browser = forum(3, 10);
    let crawler = crawler(fast_config(LIST_URL));

    crawler.run(&mut browser).await;

    assert_eq!(browser.views().await.unwrap().len(), 1);
    assert_eq!(browser.current_url().await.unwrap(), LIST_URL);
}

#[tokio::test]
async fn test_pipeline_expands_truncated_posts() {
    let mut browser = FixtureBrowser::new();
    browser.add_page(
        LIST_URL,
        list_page(&[list_item("long", Some("Long post"), None)], 10),
    );
    browser.add_page(
        thread_url("long"),
        detail_page(
            "Long post",
            &[Comment::new(&["The beginning"])
                .label("Member")
                .truncated(&["and the rest of the story"])],
        ),
    );

    let (table, _) = crawler(fast_config(LIST_URL)).run(&mut browser).await;
    assert_eq!(
        table.column_by_name("Response").unwrap()[0],
        "Customer Response 1: The beginning and the rest of the story"
    );
}

#[tokio::test]
async fn test_session_is_released() {
    let browser = forum(2, 10);
    let quit = browser.quit_signal();

    let (table, _) = crawler(fast_config(LIST_URL)).run_session(browser).await;
    assert_eq!(table.len(), 2);
    assert!(quit.get());
}

// ============================================================================
// Export Tests
// ============================================================================

#[tokio::test]
async fn test_rerun_produces_identical_output() {
    let temp_dir = TempDir::new().unwrap();
    let first_path = temp_dir.path().join("first.csv");
    let second_path = temp_dir.path().join("second.csv");

    for path in [&first_path, &second_path] {
        let mut browser = forum(5, 2);
        let (table, _) = crawler(fast_config(LIST_URL)).run(&mut browser).await;
        TableExporter::for_path(path).export(&table, path).unwrap();
    }

    let first = std::fs::read(&first_path).unwrap();
    let second = std::fs::read(&second_path).unwrap();
    assert!(!first.is_empty());
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_export_json() {
    let mut browser = forum(2, 10);
    let (table, _) = crawler(fast_config(LIST_URL)).run(&mut browser).await;

    let json = TableExporter::new(ExportFormat::Json).render(&table).unwrap();
    let rows: Vec<serde_json::Value> = serde_json::from_str(&json).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1]["Query"], "Question 2");
    assert_eq!(rows[1]["Timestamp Difference"], "1 days ago");
}

#[tokio::test]
async fn test_replay_saved_pages_from_directory() {
    let temp_dir = TempDir::new().unwrap();
    let items = [
        list_item("thread-1.html", Some("Saved question"), Some("2 days ago")),
    ];
    // Saved pages link relative to the list file
    let list = list_page(&items, 10).replace("/s/question/thread-1.html", "thread-1.html");
    std::fs::write(temp_dir.path().join("index.html"), list).unwrap();
    std::fs::write(
        temp_dir.path().join("thread-1.html"),
        detail_page(
            "Saved question",
            &[Comment::new(&["Reboot fixed it"]).label("Member").age("1 day ago")],
        ),
    )
    .unwrap();

    let dir = temp_dir.path().canonicalize().unwrap();
    let browser = FixtureBrowser::from_dir(&dir).unwrap();
    let entry = url::Url::from_file_path(dir.join("index.html")).unwrap();

    let (table, stats) = crawler(fast_config(entry.as_str()))
        .run_session(browser)
        .await;

    assert_eq!(stats.failed, 0);
    let row = table.rows().next().unwrap();
    assert_eq!(row[0], "Saved question");
    assert_eq!(row[1], "2024-05-30 12:00:00");
    assert_eq!(row[2], "Customer Response 1: Reboot fixed it");
    assert_eq!(row[4], "1 days ago");
}
