//! Per-message wipe-and-delete state machine.
//!
//! START -> REVEALED -> MENU_OPEN_1 -> EDIT_OPEN -> TEXT_CLEARED -> EDIT_SAVED
//! -> REVEALED_2 -> MENU_OPEN_2 -> DELETE_CONFIRM_OPEN -> DELETED -> DONE,
//! with FAILED reachable from every step. A failure only ends the current
//! message; errors thrown by the page are caught at [`InteractionSequencer::run`].

use engine_logging::{engine_debug, engine_warn};
use wiper_core::{FailureCause, Outcome, SemanticTarget, SequenceState};

use crate::page::{ElementHandle, Page, PageError, Scope};
use crate::resolver::SelectorResolver;
use crate::settle::{settle, SettlePolicy};
use crate::{MessageHandle, MessageReport};

/// Content written over a message before it is deleted.
pub const WIPE_PLACEHOLDER: &str = " ";

#[derive(Debug, Clone)]
pub struct InteractionSequencer {
    resolver: SelectorResolver,
    settle: SettlePolicy,
}

/// Tracks how far a sequence got, so a failure can report where it stopped.
struct Progress {
    state: SequenceState,
}

impl Progress {
    fn advance(&mut self, next: SequenceState, message: &MessageHandle) {
        engine_debug!("{}: {:?} -> {:?}", message.id, self.state, next);
        self.state = next;
    }
}

enum StepError {
    Missing(SemanticTarget),
    Page(PageError),
}

impl From<PageError> for StepError {
    fn from(err: PageError) -> Self {
        StepError::Page(err)
    }
}

type Step<T> = Result<T, StepError>;

impl InteractionSequencer {
    pub fn new(resolver: SelectorResolver, settle: SettlePolicy) -> Self {
        Self { resolver, settle }
    }

    /// Drive one message to DONE or FAILED. Never returns an error: every
    /// failure, including a page exception, becomes a failed report.
    pub async fn run(&self, page: &dyn Page, message: &MessageHandle) -> MessageReport {
        let mut progress = Progress {
            state: SequenceState::Start,
        };

        let result = self.drive(page, message, &mut progress).await;
        match result {
            Ok(()) => MessageReport {
                id: message.id.clone(),
                outcome: Outcome::Success,
                reached: progress.state,
                failed_at: None,
                cause: None,
            },
            Err(err) => {
                let cause = match err {
                    StepError::Missing(target) => FailureCause::ElementNotFound { target },
                    StepError::Page(err) => FailureCause::Interaction {
                        message: err.to_string(),
                    },
                };
                let failed_at = progress.state;
                if failed_at.delete_attempted() {
                    engine_warn!(
                        "{}: failed after {:?}, the delete may still have gone through: {}",
                        message.id,
                        failed_at,
                        cause
                    );
                } else {
                    engine_warn!("{}: failed after {:?}: {}", message.id, failed_at, cause);
                }
                progress.advance(SequenceState::Failed, message);
                MessageReport {
                    id: message.id.clone(),
                    outcome: Outcome::Failure,
                    reached: progress.state,
                    failed_at: Some(failed_at),
                    cause: Some(cause),
                }
            }
        }
    }

    async fn drive(
        &self,
        page: &dyn Page,
        message: &MessageHandle,
        progress: &mut Progress,
    ) -> Step<()> {
        let element = message.element;

        self.reveal(page, element).await?;
        progress.advance(SequenceState::Revealed, message);

        let edit = self.open_edit_affordance(page, element).await?;
        progress.advance(SequenceState::MenuOpen1, message);

        page.click(edit).await?;
        settle(self.settle.editor_mount).await;
        progress.advance(SequenceState::EditOpen, message);

        // Best effort from here until the second reveal: a wipe that cannot be
        // confirmed does not prevent the delete.
        if self.wipe(page, element, message, progress).await? {
            progress.advance(SequenceState::EditSaved, message);
        }

        self.reveal(page, element).await?;
        progress.advance(SequenceState::Revealed2, message);

        let more = self.require(page, SemanticTarget::MoreActions, Scope::Element(element)).await?;
        page.click(more).await?;
        settle(self.settle.menu).await;
        progress.advance(SequenceState::MenuOpen2, message);

        // The edit stays in place if deletion cannot proceed.
        let delete = self.require(page, SemanticTarget::DeleteMenuItem, Scope::Document).await?;
        page.click(delete).await?;
        settle(self.settle.delete_dialog).await;
        progress.advance(SequenceState::DeleteConfirmOpen, message);

        let confirm = self.require(page, SemanticTarget::ConfirmDelete, Scope::Document).await?;
        page.click(confirm).await?;
        progress.advance(SequenceState::Deleted, message);
        settle(self.settle.after_confirm).await;

        progress.advance(SequenceState::Done, message);
        Ok(())
    }

    async fn reveal(&self, page: &dyn Page, element: ElementHandle) -> Step<()> {
        page.scroll_into_view(element).await?;
        page.hover(element).await?;
        settle(self.settle.reveal).await;
        Ok(())
    }

    /// Returns the edit control to activate. The more-actions control must be
    /// present either way; the inline edit control is preferred, the menu path
    /// is the fallback for the older layout.
    async fn open_edit_affordance(&self, page: &dyn Page, element: ElementHandle) -> Step<ElementHandle> {
        let more = self
            .require(page, SemanticTarget::MoreActions, Scope::Element(element))
            .await?;

        if let Some(direct) = self
            .resolver
            .resolve(page, SemanticTarget::EditDirect, Scope::Element(element))
            .await?
        {
            return Ok(direct);
        }

        page.click(more).await?;
        settle(self.settle.menu).await;
        self.require(page, SemanticTarget::EditMenuItem, Scope::Document)
            .await
    }

    /// Replace the content with the placeholder and commit. Returns whether
    /// the commit gesture was sent; a missing editor is logged and skipped.
    async fn wipe(
        &self,
        page: &dyn Page,
        element: ElementHandle,
        message: &MessageHandle,
        progress: &mut Progress,
    ) -> Step<bool> {
        let editor = match self
            .resolver
            .resolve(page, SemanticTarget::TextEditor, Scope::Element(element))
            .await?
        {
            Some(editor) => Some(editor),
            None => {
                self.resolver
                    .resolve(page, SemanticTarget::TextEditor, Scope::Document)
                    .await?
            }
        };
        let Some(editor) = editor else {
            engine_warn!("{}: editor did not mount; deleting without wipe", message.id);
            return Ok(false);
        };

        page.replace_text(editor, WIPE_PLACEHOLDER).await?;
        settle(self.settle.input).await;
        progress.advance(SequenceState::TextCleared, message);

        page.press_enter(editor).await?;
        settle(self.settle.commit).await;
        Ok(true)
    }

    async fn require(
        &self,
        page: &dyn Page,
        target: SemanticTarget,
        scope: Scope,
    ) -> Step<ElementHandle> {
        self.resolver
            .resolve(page, target, scope)
            .await?
            .ok_or(StepError::Missing(target))
    }
}
