//! Test fixtures for integration tests
//!
//! Builds forum pages in the community feed markup. Client-side behavior
//! (hidden pages, "View More", truncated posts, failing elements) is scripted
//! with `data-fixture-*` attributes understood by `FixtureBrowser`.

/// Thread list URL used by the fixture forum
pub const LIST_URL: &str = "https://forum.test/s/topic/0TO000/security";

/// Detail page URL of a thread
pub fn thread_url(slug: &str) -> String {
    format!("https://forum.test/s/question/{slug}")
}

/// One thread-summary item in the list view
pub fn list_item(slug: &str, title: Option<&str>, posted: Option<&str>) -> String {
    let title = title
        .map(|t| {
            format!(r#"<div class="cuf-questionTitle"><a><span class="uiOutputText">{t}</span></a></div>"#)
        })
        .unwrap_or_default();
    let posted = posted
        .map(|p| format!(r#"<a class="cuf-timestamp">{p}</a>"#))
        .unwrap_or_default();
    format!(
        r#"<article class="cuf-feedElementIterationItem">
            {title}
            <div class="cuf-preamble">{posted}</div>
            <a class="cuf-feedElement-wrap" href="/s/question/{slug}">Read thread</a>
        </article>"#
    )
}

/// List item without a detail link
pub fn list_item_without_link(title: &str) -> String {
    format!(
        r#"<article class="cuf-feedElementIterationItem">
            <div class="cuf-questionTitle"><span class="uiOutputText">{title}</span></div>
        </article>"#
    )
}

/// Thread list with `page_size` items visible and the rest behind "View More"
pub fn list_page(items: &[String], page_size: usize) -> String {
    let pages: Vec<&[String]> = items.chunks(page_size.max(1)).collect();

    let mut feed = String::new();
    for (page, chunk) in pages.iter().enumerate() {
        for item in chunk.iter() {
            if page == 0 {
                feed.push_str(item);
            } else {
                feed.push_str(&item.replacen(
                    "<article ",
                    &format!(r#"<article data-fixture-hidden data-fixture-group="page-{page}" "#),
                    1,
                ));
            }
        }
    }

    let mut buttons = String::new();
    for page in 1..pages.len() {
        let hidden = if page == 1 {
            String::new()
        } else {
            format!(r#" data-fixture-hidden data-fixture-group="page-{}""#, page - 1)
        };
        buttons.push_str(&format!(
            r#"<button class="slds-button"{hidden} data-fixture-reveals="page-{page}">View More</button>"#
        ));
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><title>Security | Community</title></head>
<body>
    <header><button class="slds-button">Ask a Question</button></header>
    <div class="cuf-feedList">{feed}</div>
    <div class="cuf-showMore">{buttons}</div>
</body>
</html>"#
    )
}

/// Comment markup builder
#[derive(Default, Clone)]
pub struct Comment {
    label: Option<String>,
    age: Option<String>,
    spans: Vec<String>,
    hidden_spans: Vec<String>,
    failing: bool,
}

impl Comment {
    pub fn new(spans: &[&str]) -> Self {
        Self {
            spans: spans.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn age(mut self, age: &str) -> Self {
        self.age = Some(age.to_string());
        self
    }

    /// Text only shown after clicking "Expand Post"
    pub fn truncated(mut self, spans: &[&str]) -> Self {
        self.hidden_spans = spans.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Body text cannot be read
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub fn render(&self, id: usize) -> String {
        let label = self
            .label
            .as_ref()
            .map(|l| format!(r#"<span class="cuf-entityAdditionalLabel uiOutputText">{l}</span>"#))
            .unwrap_or_default();
        let age = self
            .age
            .as_ref()
            .map(|a| format!(r#"<a class="cuf-commentAge">{a}</a>"#))
            .unwrap_or_default();

        let fail = if self.failing {
            r#" data-fixture-fail="text""#
        } else {
            ""
        };
        let mut spans: String = self
            .spans
            .iter()
            .map(|s| format!(r#"<span class="uiOutputText"{fail}>{s}</span>"#))
            .collect();

        let group = format!("post-{id}");
        let expand = if self.hidden_spans.is_empty() {
            String::new()
        } else {
            for s in &self.hidden_spans {
                spans.push_str(&format!(
                    r#"<span class="uiOutputText" data-fixture-hidden data-fixture-group="{group}">{s}</span>"#
                ));
            }
            format!(r#"<a class="cuf-more" data-fixture-reveals="{group}">Expand Post</a>"#)
        };

        format!(
            r#"<li class="cuf-commentLi">
                <div class="cuf-commentHeader">{label}{age}</div>
                <div class="cuf-feedBodyText">
                    <div class="feedBodyInner">{spans}</div>
                    {expand}
                </div>
            </li>"#
        )
    }
}

/// Thread detail page with a response container
pub fn detail_page(question: &str, comments: &[Comment]) -> String {
    let items: String = comments
        .iter()
        .enumerate()
        .map(|(i, c)| c.render(i + 1))
        .collect();
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<body>
    <h1>{question}</h1>
    <section class="cuf-feedback">
        <ul class="cuf-commentList">{items}</ul>
    </section>
</body>
</html>"#
    )
}

/// Thread detail page whose responses never render
pub fn detail_page_without_responses(question: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en"><body><h1>{question}</h1><div class="spinner">Loading</div></body></html>"#
    )
}
