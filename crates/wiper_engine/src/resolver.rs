use std::sync::Arc;

use engine_logging::engine_trace;
use wiper_core::{Matcher, SelectorTable, SemanticTarget};

use crate::page::{ElementHandle, Page, PageError, Scope};

/// Maps semantic targets to live elements by walking the selector table's
/// chains in order. Absence is `None` (or an empty set), never an error; only
/// a malformed scope or a broken selector is.
#[derive(Debug, Clone)]
pub struct SelectorResolver {
    table: Arc<SelectorTable>,
}

impl SelectorResolver {
    pub fn new(table: SelectorTable) -> Self {
        Self {
            table: Arc::new(table),
        }
    }

    pub fn table(&self) -> &SelectorTable {
        &self.table
    }

    /// First element of the first matcher that yields anything.
    pub async fn resolve(
        &self,
        page: &dyn Page,
        target: SemanticTarget,
        scope: Scope,
    ) -> Result<Option<ElementHandle>, PageError> {
        Ok(self.resolve_all(page, target, scope).await?.into_iter().next())
    }

    /// Every element of the first matcher that yields anything.
    pub async fn resolve_all(
        &self,
        page: &dyn Page,
        target: SemanticTarget,
        scope: Scope,
    ) -> Result<Vec<ElementHandle>, PageError> {
        for (index, matcher) in self.table.chain(target).iter().enumerate() {
            let found = evaluate(page, matcher, scope).await?;
            if !found.is_empty() {
                engine_trace!(
                    "{} resolved by matcher {} ({} element(s))",
                    target,
                    index,
                    found.len()
                );
                return Ok(found);
            }
        }
        Ok(Vec::new())
    }
}

async fn evaluate(
    page: &dyn Page,
    matcher: &Matcher,
    scope: Scope,
) -> Result<Vec<ElementHandle>, PageError> {
    let elements = page.query_all(scope, &matcher.query()).await?;
    if !matcher.needs_text() {
        return Ok(elements);
    }

    let mut accepted = Vec::new();
    for element in elements {
        // A candidate recycled between the query and the text read just drops out.
        match page.text_content(element).await {
            Ok(text) if matcher.accepts_text(&text) => accepted.push(element),
            Ok(_) | Err(PageError::Detached(_)) => {}
            Err(err) => return Err(err),
        }
    }
    Ok(accepted)
}
