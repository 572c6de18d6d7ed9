//! Discovery strategies. Both hand the Run Controller batches of
//! [`MessageHandle`]s through the same trait; search batches are singletons
//! because activating a result invalidates the rest of the result list.

use engine_logging::{engine_debug, engine_info};
use url::Url;
use wiper_core::{ParamsError, RunParams, RunState, SemanticTarget, StrategyKind, ValidatedDiscovery};

use crate::locator::MessageLocator;
use crate::page::{Page, PageError, Scope};
use crate::resolver::SelectorResolver;
use crate::settle::{settle, SettlePolicy};
use crate::MessageHandle;

#[async_trait::async_trait]
pub trait DiscoveryStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Bring the view to where discovery starts.
    async fn prepare(&self, page: &dyn Page) -> Result<(), PageError>;

    /// Eligible candidates in processing order; empty when nothing is visible.
    async fn next_batch(
        &self,
        page: &dyn Page,
        run: &RunState,
    ) -> Result<Vec<MessageHandle>, PageError>;
}

/// Walks whatever the message pane currently renders.
#[derive(Debug, Clone)]
pub struct ScanStrategy {
    locator: MessageLocator,
    channel: Option<Url>,
    settle: SettlePolicy,
}

impl ScanStrategy {
    pub fn new(locator: MessageLocator, channel: Option<Url>, settle: SettlePolicy) -> Self {
        Self {
            locator,
            channel,
            settle,
        }
    }
}

#[async_trait::async_trait]
impl DiscoveryStrategy for ScanStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Scan
    }

    async fn prepare(&self, page: &dyn Page) -> Result<(), PageError> {
        if let Some(channel) = &self.channel {
            engine_info!("Opening channel {}", channel);
            page.navigate(channel.as_str()).await?;
            settle(self.settle.navigation).await;
        }
        Ok(())
    }

    async fn next_batch(
        &self,
        page: &dyn Page,
        run: &RunState,
    ) -> Result<Vec<MessageHandle>, PageError> {
        self.locator
            .find_candidates(page, Scope::Document, run)
            .await
    }
}

/// Server context and author filter of a search-driven run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSession {
    pub server: Url,
    pub author: String,
}

impl SearchSession {
    pub fn query(&self) -> String {
        format!("from: {}", self.author)
    }
}

/// Re-issues the author-scoped query before every batch and follows only the
/// first result.
#[derive(Debug, Clone)]
pub struct SearchStrategy {
    locator: MessageLocator,
    resolver: SelectorResolver,
    session: SearchSession,
    settle: SettlePolicy,
}

impl SearchStrategy {
    pub fn new(
        locator: MessageLocator,
        resolver: SelectorResolver,
        session: SearchSession,
        settle: SettlePolicy,
    ) -> Self {
        Self {
            locator,
            resolver,
            session,
            settle,
        }
    }

    /// Submit the query; false when the search input is not rendered.
    async fn open_query(&self, page: &dyn Page) -> Result<bool, PageError> {
        let Some(input) = self
            .resolver
            .resolve(page, SemanticTarget::SearchInput, Scope::Document)
            .await?
        else {
            engine_debug!("Search input not rendered");
            return Ok(false);
        };
        page.click(input).await?;
        page.replace_text(input, &self.session.query()).await?;
        page.press_enter(input).await?;
        settle(self.settle.search).await;
        Ok(true)
    }
}

#[async_trait::async_trait]
impl DiscoveryStrategy for SearchStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Search
    }

    async fn prepare(&self, page: &dyn Page) -> Result<(), PageError> {
        engine_info!("Opening server {}", self.session.server);
        page.navigate(self.session.server.as_str()).await?;
        settle(self.settle.navigation).await;
        Ok(())
    }

    async fn next_batch(
        &self,
        page: &dyn Page,
        run: &RunState,
    ) -> Result<Vec<MessageHandle>, PageError> {
        if !self.open_query(page).await? {
            return Ok(Vec::new());
        }

        let Some(result) = self
            .resolver
            .resolve(page, SemanticTarget::SearchResult, Scope::Document)
            .await?
        else {
            return Ok(Vec::new());
        };
        page.click(result).await?;
        settle(self.settle.jump).await;

        let Some(jumped) = self
            .resolver
            .resolve(page, SemanticTarget::JumpedMessage, Scope::Document)
            .await?
        else {
            engine_debug!("Search result did not focus a message");
            return Ok(Vec::new());
        };

        Ok(self
            .locator
            .qualify(page, jumped, run)
            .await?
            .into_iter()
            .collect())
    }
}

/// Pick the strategy the bundle asks for.
pub fn select_strategy(
    params: &RunParams,
    resolver: &SelectorResolver,
    settle: SettlePolicy,
) -> Result<Box<dyn DiscoveryStrategy>, ParamsError> {
    let locator = MessageLocator::new(resolver.clone());
    let strategy: Box<dyn DiscoveryStrategy> = match params.validate()? {
        ValidatedDiscovery::Scan { channel } => {
            Box::new(ScanStrategy::new(locator, channel, settle))
        }
        ValidatedDiscovery::Search { server, author } => Box::new(SearchStrategy::new(
            locator,
            resolver.clone(),
            SearchSession { server, author },
            settle,
        )),
    };
    Ok(strategy)
}
