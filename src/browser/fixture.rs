//! Offline browsing session over static HTML
//!
//! `FixtureBrowser` serves saved pages from memory and emulates the bits of
//! client-side behavior the crawler depends on, driven by `data-fixture-*`
//! attributes in the markup:
//!
//! | Attribute | Effect |
//! |-----------|--------|
//! | `data-fixture-hidden` | Element (and its subtree) is not displayed |
//! | `data-fixture-group="g"` | Hidden element becomes visible once group `g` is revealed |
//! | `data-fixture-reveals="g"` | Clicking reveals group `g` and removes the clicked element |
//! | `data-fixture-sticky` | Clicked element stays displayed after revealing |
//! | `data-fixture-fail="text click find attr"` | Listed operations on the element fail |
//!
//! Pages are looked up by exact URL first, then by the last path segment of
//! the URL, so a directory of saved `*.html` files can be replayed with
//! relative links intact.

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::cell::Cell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::rc::Rc;

use super::{Browser, BrowserResult};
use crate::utils::error::BrowserError;
use crate::utils::normalize_whitespace;

const HIDDEN_ATTR: &str = "data-fixture-hidden";
const GROUP_ATTR: &str = "data-fixture-group";
const REVEALS_ATTR: &str = "data-fixture-reveals";
const STICKY_ATTR: &str = "data-fixture-sticky";
const FAIL_ATTR: &str = "data-fixture-fail";

const BLANK_URL: &str = "about:blank";

/// Element handle: view, document generation and preorder node position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixtureElement {
    view: u64,
    generation: u64,
    index: usize,
}

/// View handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FixtureView(u64);

struct View {
    url: String,
    document: Html,
    generation: u64,
    revealed: HashSet<String>,
    dismissed: HashSet<usize>,
}

impl View {
    fn blank() -> Self {
        Self {
            url: BLANK_URL.to_string(),
            document: Html::parse_document(""),
            generation: 0,
            revealed: HashSet::new(),
            dismissed: HashSet::new(),
        }
    }

    fn load(&mut self, url: &str, source: &str) {
        self.url = url.to_string();
        self.document = Html::parse_document(source);
        self.generation += 1;
        self.revealed.clear();
        self.dismissed.clear();
    }

    fn element_at(&self, index: usize) -> Option<ElementRef<'_>> {
        self.document
            .tree
            .root()
            .descendants()
            .nth(index)
            .and_then(ElementRef::wrap)
    }

    fn index_of(&self, element: &ElementRef<'_>) -> Option<usize> {
        self.document
            .tree
            .root()
            .descendants()
            .position(|node| node.id() == element.id())
    }

    fn is_hidden(&self, element: &ElementRef<'_>) -> bool {
        let value = element.value();
        if value.attr(HIDDEN_ATTR).is_some()
            && !value
                .attr(GROUP_ATTR)
                .is_some_and(|group| self.revealed.contains(group))
        {
            return true;
        }
        self.index_of(element)
            .is_some_and(|index| self.dismissed.contains(&index))
    }

    fn is_displayed(&self, element: &ElementRef<'_>) -> bool {
        !std::iter::once(*element)
            .chain(element.ancestors().filter_map(ElementRef::wrap))
            .any(|e| self.is_hidden(&e))
    }

    fn visible_text(&self, element: &ElementRef<'_>) -> String {
        let mut out = String::new();
        for node in element.descendants() {
            if let Some(text) = node.value().as_text() {
                let shown = node
                    .ancestors()
                    .filter_map(ElementRef::wrap)
                    .all(|e| !self.is_hidden(&e));
                if shown {
                    out.push_str(text);
                }
            }
        }
        normalize_whitespace(&out)
    }
}

fn fails(element: &ElementRef<'_>, operation: &str) -> bool {
    element.value().attr(FAIL_ATTR).is_some_and(|ops| {
        ops.split(|c: char| c.is_whitespace() || c == ',' || c == '|')
            .any(|op| op == operation)
    })
}

fn injected(operation: &str) -> BrowserError {
    BrowserError::Driver(format!("injected {operation} failure"))
}

fn parse_selector(selector: &str) -> BrowserResult<Selector> {
    Selector::parse(selector).map_err(|e| BrowserError::InvalidSelector(format!("{selector}: {e:?}")))
}

/// Last non-empty path segment of a URL or path, without query and fragment
fn page_name(url: &str) -> Option<&str> {
    let path = url.split(['?', '#']).next()?;
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
}

/// In-memory browsing session over saved pages
pub struct FixtureBrowser {
    pages: HashMap<String, String>,
    views: BTreeMap<u64, View>,
    active: Option<u64>,
    next_view: u64,
    quit: Rc<Cell<bool>>,
}

impl Default for FixtureBrowser {
    fn default() -> Self {
        Self::new()
    }
}

impl FixtureBrowser {
    /// Session with a single blank view and no pages
    pub fn new() -> Self {
        let mut views = BTreeMap::new();
        views.insert(0, View::blank());
        Self {
            pages: HashMap::new(),
            views,
            active: Some(0),
            next_view: 1,
            quit: Rc::new(Cell::new(false)),
        }
    }

    /// Session serving the given `(key, html)` pages
    pub fn with_pages<I, K, V>(pages: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut browser = Self::new();
        for (key, html) in pages {
            browser.add_page(key, html);
        }
        browser
    }

    /// Session serving every `*.html` file in `dir`, keyed by file name
    pub fn from_dir(dir: &Path) -> std::io::Result<Self> {
        let mut browser = Self::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            let is_html = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm"));
            if !is_html {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                let html = std::fs::read_to_string(&path)?;
                tracing::debug!(page = name, bytes = html.len(), "Loaded fixture page");
                browser.add_page(name.to_string(), html);
            }
        }
        Ok(browser)
    }

    /// Register a page under a URL or file name
    pub fn add_page(&mut self, key: impl Into<String>, html: impl Into<String>) {
        self.pages.insert(key.into(), html.into());
    }

    /// Number of registered pages
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Flag set once the session has been quit
    pub fn quit_signal(&self) -> Rc<Cell<bool>> {
        Rc::clone(&self.quit)
    }

    fn page_source(&self, url: &str) -> Option<&str> {
        self.pages
            .get(url)
            .or_else(|| page_name(url).and_then(|name| self.pages.get(name)))
            .map(String::as_str)
    }

    fn active_view(&self) -> BrowserResult<&View> {
        self.active
            .and_then(|id| self.views.get(&id))
            .ok_or(BrowserError::NoActiveView)
    }

    fn active_view_mut(&mut self) -> BrowserResult<&mut View> {
        match self.active {
            Some(id) => self.views.get_mut(&id).ok_or(BrowserError::NoActiveView),
            None => Err(BrowserError::NoActiveView),
        }
    }

    /// Resolve a handle against the active view
    fn resolve(&self, element: &FixtureElement) -> BrowserResult<(&View, ElementRef<'_>)> {
        let view = self.active_view()?;
        if self.active != Some(element.view) || view.generation != element.generation {
            return Err(BrowserError::StaleElement);
        }
        let found = view
            .element_at(element.index)
            .ok_or(BrowserError::StaleElement)?;
        Ok((view, found))
    }
}

#[async_trait(?Send)]
impl Browser for FixtureBrowser {
    type Element = FixtureElement;
    type View = FixtureView;

    async fn navigate(&mut self, url: &str) -> BrowserResult<()> {
        let source = self
            .page_source(url)
            .ok_or_else(|| BrowserError::UnknownPage(url.to_string()))?
            .to_string();
        self.active_view_mut()?.load(url, &source);
        tracing::debug!(url, "Loaded fixture page into view");
        Ok(())
    }

    async fn current_url(&mut self) -> BrowserResult<String> {
        Ok(self.active_view()?.url.clone())
    }

    async fn find_all(
        &mut self,
        scope: Option<&FixtureElement>,
        selector: &str,
    ) -> BrowserResult<Vec<FixtureElement>> {
        let parsed = parse_selector(selector)?;
        let view_id = self.active.ok_or(BrowserError::NoActiveView)?;

        let (view, matches): (&View, Vec<ElementRef<'_>>) = match scope {
            Some(handle) => {
                let (view, root) = self.resolve(handle)?;
                if fails(&root, "find") {
                    return Err(injected("find"));
                }
                let matches = root.select(&parsed).filter(|e| e.id() != root.id()).collect();
                (view, matches)
            }
            None => {
                let view = self.active_view()?;
                (view, view.document.select(&parsed).collect())
            }
        };

        Ok(matches
            .iter()
            .filter(|e| view.is_displayed(e))
            .filter_map(|e| view.index_of(e))
            .map(|index| FixtureElement {
                view: view_id,
                generation: view.generation,
                index,
            })
            .collect())
    }

    async fn text(&mut self, element: &FixtureElement) -> BrowserResult<String> {
        let (view, found) = self.resolve(element)?;
        if fails(&found, "text") {
            return Err(injected("text"));
        }
        Ok(view.visible_text(&found))
    }

    async fn attribute(
        &mut self,
        element: &FixtureElement,
        name: &str,
    ) -> BrowserResult<Option<String>> {
        let (_, found) = self.resolve(element)?;
        if fails(&found, "attr") {
            return Err(injected("attr"));
        }
        Ok(found.value().attr(name).map(str::to_string))
    }

    async fn click(&mut self, element: &FixtureElement) -> BrowserResult<()> {
        let (reveals, sticky) = {
            let (view, found) = self.resolve(element)?;
            if !view.is_displayed(&found) {
                return Err(BrowserError::NotInteractable(format!(
                    "<{}> is not displayed",
                    found.value().name()
                )));
            }
            if fails(&found, "click") {
                return Err(injected("click"));
            }
            (
                found.value().attr(REVEALS_ATTR).map(str::to_string),
                found.value().attr(STICKY_ATTR).is_some(),
            )
        };

        if let Some(group) = reveals {
            let view = self.active_view_mut()?;
            tracing::trace!(group = %group, "Revealing fixture group");
            view.revealed.insert(group);
            if !sticky {
                view.dismissed.insert(element.index);
            }
        }
        Ok(())
    }

    async fn current_view(&mut self) -> BrowserResult<FixtureView> {
        self.active.map(FixtureView).ok_or(BrowserError::NoActiveView)
    }

    async fn views(&mut self) -> BrowserResult<Vec<FixtureView>> {
        Ok(self.views.keys().copied().map(FixtureView).collect())
    }

    async fn open_view(&mut self, url: &str) -> BrowserResult<FixtureView> {
        let id = self.next_view;
        self.next_view += 1;
        self.views.insert(id, View::blank());
        self.active = Some(id);
        self.navigate(url).await?;
        Ok(FixtureView(id))
    }

    async fn switch_to(&mut self, view: &FixtureView) -> BrowserResult<()> {
        if !self.views.contains_key(&view.0) {
            return Err(BrowserError::Driver(format!("no such view: {}", view.0)));
        }
        self.active = Some(view.0);
        Ok(())
    }

    async fn close_view(&mut self) -> BrowserResult<()> {
        let id = self.active.take().ok_or(BrowserError::NoActiveView)?;
        self.views.remove(&id);
        Ok(())
    }

    async fn quit(self) -> BrowserResult<()> {
        tracing::debug!(views = self.views.len(), "Fixture session ended");
        self.quit.set(true);
        Ok(())
    }
}
