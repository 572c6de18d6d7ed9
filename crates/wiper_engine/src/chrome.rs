//! Chrome DevTools backend for [`Page`], plus browser launch and teardown.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::element::Element;
use chromiumoxide::error::CdpError;
use chromiumoxide::page::Page as CdpPage;
use engine_logging::{engine_debug, engine_info, engine_warn};
use futures_util::StreamExt;
use tokio::task::JoinHandle;

use crate::page::{ElementHandle, Page, PageError, Scope};
use crate::WipeError;

pub const DEFAULT_START_URL: &str = "https://discord.com/channels/@me";

const SCROLL_CENTER_JS: &str =
    "function() { this.scrollIntoView({ block: 'center', inline: 'nearest' }); }";
const POINTER_ENTER_JS: &str = "function() {
    for (const type of ['pointerover', 'pointerenter', 'mouseover', 'mouseenter']) {
        this.dispatchEvent(new MouseEvent(type, { bubbles: true, cancelable: true, view: window }));
    }
}";
const SELECT_ALL_JS: &str = "function() {
    this.focus();
    if (typeof this.select === 'function') { this.select(); return; }
    const range = document.createRange();
    range.selectNodeContents(this);
    const selection = window.getSelection();
    selection.removeAllRanges();
    selection.addRange(range);
}";
const INPUT_EVENT_JS: &str =
    "function() { this.dispatchEvent(new Event('input', { bubbles: true })); }";
const SCROLL_TOP_JS: &str = "function() { this.scrollTop = 0; }";
const SCROLL_END_JS: &str = "function() { this.scrollTop = this.scrollHeight; }";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSettings {
    /// Visible by default so the operator can log in.
    pub headless: bool,
    pub window_width: u32,
    pub window_height: u32,
    pub block_images: bool,
    pub start_url: String,
}

impl Default for LaunchSettings {
    fn default() -> Self {
        Self {
            headless: false,
            window_width: 1280,
            window_height: 800,
            block_images: true,
            start_url: DEFAULT_START_URL.to_string(),
        }
    }
}

/// An owned browser process with one page open on the start url.
pub struct ChromeSession {
    browser: Browser,
    handler: JoinHandle<()>,
    page: ChromePage,
}

impl ChromeSession {
    pub async fn launch(settings: &LaunchSettings) -> Result<Self, WipeError> {
        let mut builder = BrowserConfig::builder()
            .window_size(settings.window_width, settings.window_height)
            .arg("--no-sandbox")
            .arg("--disable-setuid-sandbox")
            .arg("--no-first-run")
            .arg("--no-default-browser-check");
        if !settings.headless {
            builder = builder.with_head();
        }
        if settings.block_images {
            builder = builder.arg("--blink-settings=imagesEnabled=false");
        }
        let config = builder.build().map_err(WipeError::Browser)?;

        engine_info!("Launching browser (headless={})", settings.headless);
        let (browser, mut handler) = Browser::launch(config).await.map_err(|err| {
            WipeError::Browser(format!(
                "failed to launch Chrome/Chromium: {err}. Ensure it is installed and on PATH"
            ))
        })?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    engine_debug!("CDP handler stopped: {}", err);
                    break;
                }
            }
        });

        engine_info!("Opening {}", settings.start_url);
        let page = browser
            .new_page(settings.start_url.as_str())
            .await
            .map_err(|err| WipeError::Navigation(err.to_string()))?;

        Ok(Self {
            browser,
            handler,
            page: ChromePage::new(page),
        })
    }

    pub fn page(&self) -> &ChromePage {
        &self.page
    }

    /// Close the browser and stop the protocol handler.
    pub async fn close(mut self) {
        if let Err(err) = self.browser.close().await {
            engine_warn!("Failed to close browser cleanly: {}", err);
        }
        if let Err(err) = self.browser.wait().await {
            engine_warn!("Failed to reap browser process: {}", err);
        }
        self.handler.abort();
    }
}

/// Handles for the elements of the current batch, keyed by DOM node so the
/// same node keeps its handle within a batch.
struct Registry<T> {
    next: u64,
    by_backend_node: HashMap<i64, ElementHandle>,
    elements: HashMap<ElementHandle, Arc<T>>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self {
            next: 0,
            by_backend_node: HashMap::new(),
            elements: HashMap::new(),
        }
    }
}

impl<T> Registry<T> {
    fn register(&mut self, backend: i64, element: T) -> ElementHandle {
        let handle = match self.by_backend_node.get(&backend) {
            Some(handle) => *handle,
            None => {
                self.next += 1;
                let handle = ElementHandle::new(self.next);
                self.by_backend_node.insert(backend, handle);
                handle
            }
        };
        self.elements.insert(handle, Arc::new(element));
        handle
    }

    fn get(&self, handle: ElementHandle) -> Option<Arc<T>> {
        self.elements.get(&handle).cloned()
    }

    fn len(&self) -> usize {
        self.elements.len()
    }

    /// Releases the remote objects. `next` keeps counting so an old handle
    /// can never alias a new element.
    fn clear(&mut self) {
        self.elements.clear();
        self.by_backend_node.clear();
    }
}

/// A browser tab as seen through the DevTools protocol.
pub struct ChromePage {
    page: CdpPage,
    registry: Mutex<Registry<Element>>,
}

impl ChromePage {
    pub fn new(page: CdpPage) -> Self {
        Self {
            page,
            registry: Mutex::new(Registry::default()),
        }
    }

    fn registry(&self) -> std::sync::MutexGuard<'_, Registry<Element>> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn element(&self, handle: ElementHandle) -> Result<Arc<Element>, PageError> {
        self.registry()
            .get(handle)
            .ok_or(PageError::UnknownHandle(handle))
    }

    fn register_all(&self, elements: Vec<Element>) -> Vec<ElementHandle> {
        let mut registry = self.registry();
        elements
            .into_iter()
            .map(|element| {
                let backend = *element.backend_node_id.inner();
                registry.register(backend, element)
            })
            .collect()
    }

    async fn call(&self, handle: ElementHandle, function: &str) -> Result<(), PageError> {
        let element = self.element(handle)?;
        element
            .call_js_fn(function, false)
            .await
            .map(|_| ())
            .map_err(|err| map_cdp_error(handle, err))
    }
}

fn map_cdp_error(handle: ElementHandle, err: CdpError) -> PageError {
    let message = err.to_string();
    let lowered = message.to_ascii_lowercase();
    if lowered.contains("no node")
        || lowered.contains("could not find node")
        || lowered.contains("detached")
        || lowered.contains("cannot find context")
    {
        PageError::Detached(handle)
    } else {
        PageError::Protocol(message)
    }
}

fn map_query_error(css: &str, scope: Scope, err: CdpError) -> PageError {
    let message = err.to_string();
    if message.contains("is not a valid selector") || message.contains("querying") {
        return PageError::InvalidSelector {
            selector: css.to_string(),
            reason: message,
        };
    }
    match scope {
        Scope::Element(handle) => map_cdp_error(handle, err),
        Scope::Document => PageError::Protocol(message),
    }
}

#[async_trait::async_trait]
impl Page for ChromePage {
    async fn query_all(&self, scope: Scope, css: &str) -> Result<Vec<ElementHandle>, PageError> {
        let found = match scope {
            Scope::Document => self.page.find_elements(css).await,
            Scope::Element(handle) => self.element(handle)?.find_elements(css).await,
        }
        .map_err(|err| map_query_error(css, scope, err))?;
        Ok(self.register_all(found))
    }

    async fn text_content(&self, element: ElementHandle) -> Result<String, PageError> {
        let text = self
            .element(element)?
            .inner_text()
            .await
            .map_err(|err| map_cdp_error(element, err))?;
        Ok(text.unwrap_or_default())
    }

    async fn attribute(
        &self,
        element: ElementHandle,
        name: &str,
    ) -> Result<Option<String>, PageError> {
        self.element(element)?
            .attribute(name)
            .await
            .map_err(|err| map_cdp_error(element, err))
    }

    async fn scroll_into_view(&self, element: ElementHandle) -> Result<(), PageError> {
        self.call(element, SCROLL_CENTER_JS).await
    }

    async fn hover(&self, element: ElementHandle) -> Result<(), PageError> {
        self.element(element)?
            .hover()
            .await
            .map_err(|err| map_cdp_error(element, err))?;
        self.call(element, POINTER_ENTER_JS).await
    }

    async fn click(&self, element: ElementHandle) -> Result<(), PageError> {
        self.element(element)?
            .click()
            .await
            .map(|_| ())
            .map_err(|err| map_cdp_error(element, err))
    }

    async fn replace_text(&self, element: ElementHandle, text: &str) -> Result<(), PageError> {
        self.call(element, SELECT_ALL_JS).await?;
        self.element(element)?
            .type_str(text)
            .await
            .map_err(|err| map_cdp_error(element, err))?;
        self.call(element, INPUT_EVENT_JS).await
    }

    async fn press_enter(&self, element: ElementHandle) -> Result<(), PageError> {
        self.element(element)?
            .press_key("Enter")
            .await
            .map(|_| ())
            .map_err(|err| map_cdp_error(element, err))
    }

    async fn scroll_to_top(&self, element: ElementHandle) -> Result<(), PageError> {
        self.call(element, SCROLL_TOP_JS).await
    }

    async fn scroll_to_end(&self, element: ElementHandle) -> Result<(), PageError> {
        self.call(element, SCROLL_END_JS).await
    }

    async fn navigate(&self, url: &str) -> Result<(), PageError> {
        self.page
            .goto(url)
            .await
            .map_err(|err| PageError::Navigation {
                url: url.to_string(),
                reason: err.to_string(),
            })?;
        // Old handles point into the previous document.
        self.release_handles();
        Ok(())
    }

    fn release_handles(&self) {
        let mut registry = self.registry();
        engine_debug!("Releasing {} element handle(s)", registry.len());
        registry.clear();
    }
}
