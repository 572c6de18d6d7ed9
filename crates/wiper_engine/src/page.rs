use std::fmt;

/// Opaque reference to an element of the live document. Only meaningful to
/// the [`Page`] that produced it, and only while the element stays rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementHandle(u64);

impl ElementHandle {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where a lookup runs: the whole document or one element's subtree
/// (the element itself excluded, like `querySelectorAll`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Document,
    Element(ElementHandle),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PageError {
    #[error("unknown element handle {0}")]
    UnknownHandle(ElementHandle),
    #[error("element {0} is no longer attached to the document")]
    Detached(ElementHandle),
    #[error("invalid selector {selector:?}: {reason}")]
    InvalidSelector { selector: String, reason: String },
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },
    #[error("browser protocol error: {0}")]
    Protocol(String),
}

/// A live, authenticated document the engine drives. Implementations wrap a
/// browser tab or an offline fixture; all methods may fail with
/// [`PageError::Detached`] when the host UI recycles an element.
#[async_trait::async_trait]
pub trait Page: Send + Sync {
    /// All elements in `scope` matching `css`, in document order.
    async fn query_all(&self, scope: Scope, css: &str) -> Result<Vec<ElementHandle>, PageError>;

    async fn text_content(&self, element: ElementHandle) -> Result<String, PageError>;

    async fn attribute(
        &self,
        element: ElementHandle,
        name: &str,
    ) -> Result<Option<String>, PageError>;

    /// Center the element in the viewport.
    async fn scroll_into_view(&self, element: ElementHandle) -> Result<(), PageError>;

    /// Pointer-enter signal, the way a hovering mouse would produce it.
    async fn hover(&self, element: ElementHandle) -> Result<(), PageError>;

    async fn click(&self, element: ElementHandle) -> Result<(), PageError>;

    /// Select all editable content, replace it with `text` and emit the input
    /// signal so the host UI treats the field as dirty.
    async fn replace_text(&self, element: ElementHandle, text: &str) -> Result<(), PageError>;

    /// The platform's commit gesture (Enter) on a focused field.
    async fn press_enter(&self, element: ElementHandle) -> Result<(), PageError>;

    /// Reset the scroll offset of a scrollable pane to its origin.
    async fn scroll_to_top(&self, element: ElementHandle) -> Result<(), PageError>;

    /// Scroll a scrollable pane to its end.
    async fn scroll_to_end(&self, element: ElementHandle) -> Result<(), PageError>;

    async fn navigate(&self, url: &str) -> Result<(), PageError>;

    /// Drop every handle handed out so far. Using one afterwards fails with
    /// [`PageError::UnknownHandle`].
    fn release_handles(&self);
}
