use engine_logging::engine_debug;
use wiper_core::{SemanticTarget, StrategyKind};

use crate::page::{Page, PageError, Scope};
use crate::resolver::SelectorResolver;
use crate::settle::{settle, SettlePolicy};

/// Moves the view so that more candidates can render. Whether it worked is
/// only visible through the next Locator call.
#[derive(Debug, Clone)]
pub struct PaginationDriver {
    resolver: SelectorResolver,
    settle: SettlePolicy,
}

impl PaginationDriver {
    pub fn new(resolver: SelectorResolver, settle: SettlePolicy) -> Self {
        Self { resolver, settle }
    }

    pub async fn advance(&self, page: &dyn Page, strategy: StrategyKind) -> Result<(), PageError> {
        match strategy {
            // Older history mounts above the current content.
            StrategyKind::Scan => {
                match self
                    .resolver
                    .resolve(page, SemanticTarget::MessageScroller, Scope::Document)
                    .await?
                {
                    Some(pane) => page.scroll_to_top(pane).await?,
                    None => engine_debug!("No message pane to scroll"),
                }
            }
            StrategyKind::Search => {
                match self
                    .resolver
                    .resolve(page, SemanticTarget::SearchResultsScroller, Scope::Document)
                    .await?
                {
                    Some(pane) => page.scroll_to_end(pane).await?,
                    None => engine_debug!("No search result pane to scroll"),
                }
            }
        }
        settle(self.settle.pagination).await;
        Ok(())
    }
}
