use engine_logging::engine_debug;
use wiper_core::{MessageId, RunState, SemanticTarget};

use crate::page::{ElementHandle, Page, PageError, Scope};
use crate::resolver::SelectorResolver;
use crate::MessageHandle;

/// Finds rendered messages owned by the operator that this run has not
/// finished yet. Read-only with respect to both the page and the run state.
#[derive(Debug, Clone)]
pub struct MessageLocator {
    resolver: SelectorResolver,
}

impl MessageLocator {
    pub fn new(resolver: SelectorResolver) -> Self {
        Self { resolver }
    }

    /// Candidates in document order within `scope`.
    pub async fn find_candidates(
        &self,
        page: &dyn Page,
        scope: Scope,
        run: &RunState,
    ) -> Result<Vec<MessageHandle>, PageError> {
        let messages = self
            .resolver
            .resolve_all(page, SemanticTarget::Message, scope)
            .await?;

        let mut candidates = Vec::new();
        for element in messages {
            match self.qualify(page, element, run).await {
                Ok(Some(handle)) => {
                    // Nested matches (row inside row) must not yield the same message twice.
                    if !candidates.iter().any(|c: &MessageHandle| c.id == handle.id) {
                        candidates.push(handle);
                    }
                }
                Ok(None) => {}
                // Recycled while we looked at it; the next scan will see its replacement.
                Err(PageError::Detached(_)) => {}
                Err(err) => return Err(err),
            }
        }
        Ok(candidates)
    }

    /// Checks a single rendered message: it must carry the owner-only action
    /// controls, have an identifier, and still be eligible in this run.
    pub async fn qualify(
        &self,
        page: &dyn Page,
        element: ElementHandle,
        run: &RunState,
    ) -> Result<Option<MessageHandle>, PageError> {
        let owned = self
            .resolver
            .resolve(page, SemanticTarget::ActionContainer, Scope::Element(element))
            .await?
            .is_some();
        if !owned {
            return Ok(None);
        }

        let Some(id) = self.message_id(page, element).await? else {
            engine_debug!("Skipping owned message {} without an identifier", element);
            return Ok(None);
        };
        if !run.is_eligible(&id) {
            return Ok(None);
        }
        Ok(Some(MessageHandle { element, id }))
    }

    /// The first present, non-empty identifier attribute is authoritative.
    async fn message_id(
        &self,
        page: &dyn Page,
        element: ElementHandle,
    ) -> Result<Option<MessageId>, PageError> {
        for attribute in &self.resolver.table().message_id_attributes {
            if let Some(value) = page.attribute(element, attribute).await? {
                let value = value.trim();
                if !value.is_empty() {
                    return Ok(Some(MessageId::new(value)));
                }
            }
        }
        Ok(None)
    }
}
