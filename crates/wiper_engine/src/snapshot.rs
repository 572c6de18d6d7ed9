//! Offline [`Page`] over a saved HTML document.
//!
//! Queries run against the parsed tree with real CSS selectors, so a selector
//! table can be rehearsed against a saved page without a browser. Interactions
//! are recorded as [`SnapshotEvent`]s. A fixture can also declare how the host
//! UI would react, through `data-fixture-*` attributes:
//!
//! - `data-fixture-page="N"`: not rendered until the Nth pagination scroll.
//! - `data-fixture-group="G"`: not rendered until an element carrying
//!   `data-fixture-reveal="G"` is clicked.
//! - `data-fixture-removes`: clicking it removes the last hovered element, and
//!   every element whose `data-fixture-mirror` equals that element's `id`.
//! - `data-fixture-broken`: any interaction with it, or with anything inside
//!   it, fails as if the element had been recycled.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use ego_tree::NodeId;
use scraper::{ElementRef, Html, Selector};

use crate::page::{ElementHandle, Page, PageError, Scope};

const PAGE_ATTR: &str = "data-fixture-page";
const GROUP_ATTR: &str = "data-fixture-group";
const REVEAL_ATTR: &str = "data-fixture-reveal";
const REMOVES_ATTR: &str = "data-fixture-removes";
const MIRROR_ATTR: &str = "data-fixture-mirror";
const BROKEN_ATTR: &str = "data-fixture-broken";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotEvent {
    ScrollIntoView { label: String },
    Hover { label: String },
    Click { label: String },
    ReplaceText { label: String, text: String },
    PressEnter { label: String },
    ScrollToTop { label: String },
    ScrollToEnd { label: String },
    Navigate { url: String },
}

#[derive(Debug, Clone)]
struct Unmounted {
    node: NodeId,
    parent: NodeId,
    prev_sibling: Option<NodeId>,
    page: Option<u32>,
    group: Option<String>,
}

struct Fixture {
    html: Html,
    next_handle: u64,
    nodes: HashMap<ElementHandle, NodeId>,
    handle_of: HashMap<NodeId, ElementHandle>,
    unmounted: Vec<Unmounted>,
    paginations: u32,
    hovered: Option<NodeId>,
    events: Vec<SnapshotEvent>,
}

impl Fixture {
    fn new(html: Html) -> Self {
        let mut fixture = Self {
            html,
            next_handle: 0,
            nodes: HashMap::new(),
            handle_of: HashMap::new(),
            unmounted: Vec::new(),
            paginations: 0,
            hovered: None,
            events: Vec::new(),
        };
        fixture.unmount_deferred();
        fixture
    }

    /// Detach every element that should not be rendered yet, in document order.
    fn unmount_deferred(&mut self) {
        let deferred: Vec<(NodeId, Option<u32>, Option<String>)> = self
            .html
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter_map(|el| {
                let page = el.value().attr(PAGE_ATTR).and_then(|v| v.trim().parse().ok());
                let group = el.value().attr(GROUP_ATTR).map(str::to_string);
                (page.is_some() || group.is_some()).then(|| (el.id(), page, group))
            })
            .collect();

        for (node, page, group) in deferred {
            let Some(node_ref) = self.html.tree.get(node) else {
                continue;
            };
            // Nested deferred elements travel with their deferred ancestor.
            let Some(parent) = node_ref.parent().map(|p| p.id()) else {
                continue;
            };
            let prev_sibling = node_ref.prev_sibling().map(|s| s.id());
            if let Some(mut node_mut) = self.html.tree.get_mut(node) {
                node_mut.detach();
            }
            self.unmounted.push(Unmounted {
                node,
                parent,
                prev_sibling,
                page,
                group,
            });
        }
    }

    /// Reattach the selected entries where they were, preserving their order.
    fn mount_where(&mut self, pick: impl Fn(&Unmounted) -> bool) {
        let (ready, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut self.unmounted)
            .into_iter()
            .partition(|entry| pick(entry));
        self.unmounted = rest;

        for entry in ready.into_iter().rev() {
            let anchor = entry
                .prev_sibling
                .filter(|prev| self.is_attached(*prev));
            match anchor {
                Some(prev) => {
                    if let Some(mut prev_mut) = self.html.tree.get_mut(prev) {
                        prev_mut.insert_id_after(entry.node);
                    }
                }
                None => {
                    if let Some(mut parent_mut) = self.html.tree.get_mut(entry.parent) {
                        parent_mut.prepend_id(entry.node);
                    }
                }
            }
        }
    }

    fn is_attached(&self, node: NodeId) -> bool {
        let root = self.html.tree.root().id();
        match self.html.tree.get(node) {
            Some(node_ref) if node_ref.id() == root => true,
            Some(node_ref) => node_ref.ancestors().any(|a| a.id() == root),
            None => false,
        }
    }

    fn handle(&mut self, node: NodeId) -> ElementHandle {
        if let Some(handle) = self.handle_of.get(&node) {
            return *handle;
        }
        self.next_handle += 1;
        let handle = ElementHandle::new(self.next_handle);
        self.nodes.insert(handle, node);
        self.handle_of.insert(node, handle);
        handle
    }

    fn release_handles(&mut self) {
        self.nodes.clear();
        self.handle_of.clear();
    }

    fn node(&self, handle: ElementHandle) -> Result<NodeId, PageError> {
        let node = *self
            .nodes
            .get(&handle)
            .ok_or(PageError::UnknownHandle(handle))?;
        if !self.is_attached(node) {
            return Err(PageError::Detached(handle));
        }
        Ok(node)
    }

    fn element(&self, handle: ElementHandle) -> Result<ElementRef<'_>, PageError> {
        let node = self.node(handle)?;
        self.html
            .tree
            .get(node)
            .and_then(ElementRef::wrap)
            .ok_or(PageError::UnknownHandle(handle))
    }

    /// Element for an interaction; broken fixtures fail like recycled elements.
    fn interactive(&self, handle: ElementHandle) -> Result<ElementRef<'_>, PageError> {
        let element = self.element(handle)?;
        let broken = std::iter::once(element)
            .chain(element.ancestors().filter_map(ElementRef::wrap))
            .any(|el| el.value().attr(BROKEN_ATTR).is_some());
        if broken {
            return Err(PageError::Detached(handle));
        }
        Ok(element)
    }

    fn label(&self, handle: ElementHandle) -> Result<String, PageError> {
        Ok(describe(self.interactive(handle)?))
    }

    fn query(&mut self, scope: Scope, css: &str) -> Result<Vec<ElementHandle>, PageError> {
        let selector = Selector::parse(css).map_err(|err| PageError::InvalidSelector {
            selector: css.to_string(),
            reason: format!("{err:?}"),
        })?;
        let nodes: Vec<NodeId> = match scope {
            Scope::Document => self
                .html
                .root_element()
                .select(&selector)
                .map(|el| el.id())
                .collect(),
            Scope::Element(handle) => self
                .element(handle)?
                .select(&selector)
                .map(|el| el.id())
                .collect(),
        };
        Ok(nodes.into_iter().map(|node| self.handle(node)).collect())
    }

    fn click(&mut self, handle: ElementHandle) -> Result<(), PageError> {
        let element = self.interactive(handle)?;
        let label = describe(element);
        let reveal = element.value().attr(REVEAL_ATTR).map(str::to_string);
        let removes = element.value().attr(REMOVES_ATTR).is_some();
        self.events.push(SnapshotEvent::Click { label });

        if let Some(group) = reveal {
            self.mount_where(|entry| entry.group.as_deref() == Some(group.as_str()));
        }
        if removes {
            self.remove_hovered();
        }
        Ok(())
    }

    fn remove_hovered(&mut self) {
        let Some(target) = self.hovered.take() else {
            return;
        };
        let target_id = self
            .html
            .tree
            .get(target)
            .and_then(ElementRef::wrap)
            .and_then(|el| el.value().attr("id").map(str::to_string));

        let mut doomed = vec![target];
        if let Some(id) = target_id {
            doomed.extend(
                self.html
                    .root_element()
                    .descendants()
                    .filter_map(ElementRef::wrap)
                    .filter(|el| el.value().attr(MIRROR_ATTR) == Some(id.as_str()))
                    .map(|el| el.id()),
            );
        }
        for node in doomed {
            if let Some(mut node_mut) = self.html.tree.get_mut(node) {
                node_mut.detach();
            }
        }
    }

    fn paginate(&mut self) {
        self.paginations += 1;
        let reached = self.paginations;
        self.mount_where(|entry| entry.page.is_some_and(|page| page <= reached));
    }
}

/// Short human-readable name for an element: id, aria-label, text, or tag.
fn describe(element: ElementRef<'_>) -> String {
    let value = element.value();
    if let Some(id) = value.attr("id").filter(|v| !v.is_empty()) {
        return id.to_string();
    }
    if let Some(label) = value.attr("aria-label").filter(|v| !v.is_empty()) {
        return label.to_string();
    }
    let text = element.text().collect::<String>();
    let text = text.trim();
    if !text.is_empty() {
        return text.chars().take(40).collect();
    }
    value.name().to_string()
}

/// Fixture-backed page. See the module docs for the reaction attributes.
pub struct SnapshotPage {
    fixture: Mutex<Fixture>,
}

impl SnapshotPage {
    pub fn from_html(html: &str) -> Self {
        Self {
            fixture: Mutex::new(Fixture::new(Html::parse_document(html))),
        }
    }

    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let html = std::fs::read_to_string(path)?;
        Ok(Self::from_html(&html))
    }

    fn fixture(&self) -> MutexGuard<'_, Fixture> {
        self.fixture.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Every interaction so far, in order.
    pub fn events(&self) -> Vec<SnapshotEvent> {
        self.fixture().events.clone()
    }

    /// Labels of clicked elements, in order.
    pub fn clicks(&self) -> Vec<String> {
        self.fixture()
            .events
            .iter()
            .filter_map(|event| match event {
                SnapshotEvent::Click { label } => Some(label.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of currently rendered elements matching `css`.
    pub fn count(&self, css: &str) -> Result<usize, PageError> {
        Ok(self.fixture().query(Scope::Document, css)?.len())
    }
}

#[async_trait::async_trait]
impl Page for SnapshotPage {
    async fn query_all(&self, scope: Scope, css: &str) -> Result<Vec<ElementHandle>, PageError> {
        self.fixture().query(scope, css)
    }

    async fn text_content(&self, element: ElementHandle) -> Result<String, PageError> {
        Ok(self.fixture().element(element)?.text().collect())
    }

    async fn attribute(
        &self,
        element: ElementHandle,
        name: &str,
    ) -> Result<Option<String>, PageError> {
        Ok(self
            .fixture()
            .element(element)?
            .value()
            .attr(name)
            .map(str::to_string))
    }

    async fn scroll_into_view(&self, element: ElementHandle) -> Result<(), PageError> {
        let mut fixture = self.fixture();
        let label = fixture.label(element)?;
        fixture.events.push(SnapshotEvent::ScrollIntoView { label });
        Ok(())
    }

    async fn hover(&self, element: ElementHandle) -> Result<(), PageError> {
        let mut fixture = self.fixture();
        let label = fixture.label(element)?;
        let node = fixture.node(element)?;
        fixture.hovered = Some(node);
        fixture.events.push(SnapshotEvent::Hover { label });
        Ok(())
    }

    async fn click(&self, element: ElementHandle) -> Result<(), PageError> {
        self.fixture().click(element)
    }

    async fn replace_text(&self, element: ElementHandle, text: &str) -> Result<(), PageError> {
        let mut fixture = self.fixture();
        let label = fixture.label(element)?;
        fixture.events.push(SnapshotEvent::ReplaceText {
            label,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn press_enter(&self, element: ElementHandle) -> Result<(), PageError> {
        let mut fixture = self.fixture();
        let label = fixture.label(element)?;
        fixture.events.push(SnapshotEvent::PressEnter { label });
        Ok(())
    }

    async fn scroll_to_top(&self, element: ElementHandle) -> Result<(), PageError> {
        let mut fixture = self.fixture();
        let label = fixture.label(element)?;
        fixture.events.push(SnapshotEvent::ScrollToTop { label });
        fixture.paginate();
        Ok(())
    }

    async fn scroll_to_end(&self, element: ElementHandle) -> Result<(), PageError> {
        let mut fixture = self.fixture();
        let label = fixture.label(element)?;
        fixture.events.push(SnapshotEvent::ScrollToEnd { label });
        fixture.paginate();
        Ok(())
    }

    async fn navigate(&self, url: &str) -> Result<(), PageError> {
        self.fixture().events.push(SnapshotEvent::Navigate {
            url: url.to_string(),
        });
        Ok(())
    }

    fn release_handles(&self) {
        self.fixture().release_handles();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn deferred_pages_mount_in_order_on_pagination() {
        let page = SnapshotPage::from_html(
            r#"<div id="pane">
                 <p id="old-1" data-fixture-page="1"></p>
                 <p id="old-2" data-fixture-page="1"></p>
                 <p id="now"></p>
               </div>"#,
        );
        assert_eq!(page.count("p").unwrap(), 1);

        let pane = page.query_all(Scope::Document, "#pane").await.unwrap()[0];
        page.scroll_to_top(pane).await.unwrap();

        let all = page.query_all(Scope::Document, "p").await.unwrap();
        let mut ids = Vec::new();
        for el in all {
            ids.push(page.attribute(el, "id").await.unwrap().unwrap());
        }
        assert_eq!(ids, vec!["old-1", "old-2", "now"]);
    }

    #[tokio::test]
    async fn removed_elements_report_detached() {
        let page = SnapshotPage::from_html(
            r#"<ul><li id="m1">hi</li></ul><button id="go" data-fixture-removes>Go</button>"#,
        );
        let message = page.query_all(Scope::Document, "#m1").await.unwrap()[0];
        let button = page.query_all(Scope::Document, "#go").await.unwrap()[0];

        page.hover(message).await.unwrap();
        page.click(button).await.unwrap();

        assert_eq!(page.count("#m1").unwrap(), 0);
        assert_eq!(
            page.text_content(message).await,
            Err(PageError::Detached(message))
        );
    }

    #[tokio::test]
    async fn released_handles_stop_resolving() {
        let page = SnapshotPage::from_html(r#"<p id="a">x</p>"#);
        let old = page.query_all(Scope::Document, "#a").await.unwrap()[0];
        page.release_handles();

        assert_eq!(page.text_content(old).await, Err(PageError::UnknownHandle(old)));
        let fresh = page.query_all(Scope::Document, "#a").await.unwrap()[0];
        assert_ne!(fresh, old);
        assert_eq!(page.text_content(fresh).await.unwrap(), "x");
    }

    #[tokio::test]
    async fn invalid_selector_is_an_error() {
        let page = SnapshotPage::from_html("<p></p>");
        assert!(matches!(
            page.query_all(Scope::Document, "[[").await,
            Err(PageError::InvalidSelector { .. })
        ));
    }

    #[tokio::test]
    async fn scoped_query_excludes_the_scope_element() {
        let page = SnapshotPage::from_html(r#"<div class="x" id="outer"><div class="x" id="inner"></div></div>"#);
        let outer = page.query_all(Scope::Document, "#outer").await.unwrap()[0];
        let inner = page.query_all(Scope::Element(outer), ".x").await.unwrap();
        assert_eq!(inner.len(), 1);
        assert_eq!(
            page.attribute(inner[0], "id").await.unwrap().as_deref(),
            Some("inner")
        );
    }
}
