//! Data-driven selector table.
//!
//! Every UI affordance the engine touches is named by a [`SemanticTarget`] and
//! looked up through an ordered chain of [`Matcher`]s. The host UI renames its
//! classes between releases, so drift is handled by adding matchers to the
//! table (or overriding it from a config file) rather than by new code paths.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticTarget {
    /// A rendered message row.
    Message,
    /// Hover toolbar only rendered on messages the operator owns.
    ActionContainer,
    /// The "more actions" (three dots) control on a message.
    MoreActions,
    /// Inline edit control on the hover toolbar (newer layout).
    EditDirect,
    /// "Edit" entry in the opened more-actions menu (older layout).
    EditMenuItem,
    /// "Delete" entry in the opened more-actions menu.
    DeleteMenuItem,
    /// Inline text editor mounted while a message is being edited.
    TextEditor,
    /// Submit control of the delete confirmation dialog.
    ConfirmDelete,
    /// Scrollable message pane.
    MessageScroller,
    /// Search query input.
    SearchInput,
    /// One entry of the search result list.
    SearchResult,
    /// Scrollable search result pane.
    SearchResultsScroller,
    /// The message the view was just navigated to from a search result.
    JumpedMessage,
    /// Any element only present once the operator is logged in.
    LoginMarker,
}

impl SemanticTarget {
    pub const ALL: [SemanticTarget; 14] = [
        SemanticTarget::Message,
        SemanticTarget::ActionContainer,
        SemanticTarget::MoreActions,
        SemanticTarget::EditDirect,
        SemanticTarget::EditMenuItem,
        SemanticTarget::DeleteMenuItem,
        SemanticTarget::TextEditor,
        SemanticTarget::ConfirmDelete,
        SemanticTarget::MessageScroller,
        SemanticTarget::SearchInput,
        SemanticTarget::SearchResult,
        SemanticTarget::SearchResultsScroller,
        SemanticTarget::JumpedMessage,
        SemanticTarget::LoginMarker,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SemanticTarget::Message => "message",
            SemanticTarget::ActionContainer => "action-container",
            SemanticTarget::MoreActions => "more-actions",
            SemanticTarget::EditDirect => "edit-direct",
            SemanticTarget::EditMenuItem => "edit-menu-item",
            SemanticTarget::DeleteMenuItem => "delete-menu-item",
            SemanticTarget::TextEditor => "text-editor",
            SemanticTarget::ConfirmDelete => "confirm-delete",
            SemanticTarget::MessageScroller => "message-scroller",
            SemanticTarget::SearchInput => "search-input",
            SemanticTarget::SearchResult => "search-result",
            SemanticTarget::SearchResultsScroller => "search-results-scroller",
            SemanticTarget::JumpedMessage => "jumped-message",
            SemanticTarget::LoginMarker => "login-marker",
        }
    }
}

impl fmt::Display for SemanticTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One concrete lookup strategy. Matchers are pure: they only describe which
/// elements of a scope qualify.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Matcher {
    /// Any CSS selector, typically an attribute pattern such as `[id^="message-actions-edit"]`.
    Css(String),
    /// Elements whose class attribute contains the fragment.
    ClassFragment(String),
    /// Elements matching `within` whose trimmed text equals one of `any_of`.
    Text { within: String, any_of: Vec<String> },
}

impl Matcher {
    pub fn css(selector: impl Into<String>) -> Self {
        Matcher::Css(selector.into())
    }

    pub fn class_fragment(fragment: impl Into<String>) -> Self {
        Matcher::ClassFragment(fragment.into())
    }

    pub fn text(within: impl Into<String>, any_of: &[&str]) -> Self {
        Matcher::Text {
            within: within.into(),
            any_of: any_of.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    /// CSS query selecting the elements this matcher inspects.
    pub fn query(&self) -> Cow<'_, str> {
        match self {
            Matcher::Css(css) => Cow::Borrowed(css),
            Matcher::ClassFragment(fragment) => {
                Cow::Owned(format!("[class*=\"{}\"]", escape_css_string(fragment)))
            }
            Matcher::Text { within, .. } => Cow::Borrowed(within),
        }
    }

    /// Whether the matcher needs element text to decide.
    pub fn needs_text(&self) -> bool {
        matches!(self, Matcher::Text { .. })
    }

    pub fn accepts_text(&self, text: &str) -> bool {
        match self {
            Matcher::Text { any_of, .. } => {
                let text = text.trim();
                any_of.iter().any(|candidate| candidate == text)
            }
            Matcher::Css(_) | Matcher::ClassFragment(_) => true,
        }
    }
}

fn escape_css_string(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('"', "\\\"")
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SelectorTableError {
    #[error("no matchers configured for {0}")]
    EmptyChain(SemanticTarget),
    #[error("empty selector in the chain for {0}")]
    EmptySelector(SemanticTarget),
    #[error("no message id attributes configured")]
    NoIdAttributes,
    #[error("failed to parse selector table: {0}")]
    Parse(String),
}

/// `SemanticTarget -> ordered matcher chain`, plus the attributes that carry a
/// message's identifier.
///
/// Deserializing merges onto [`SelectorTable::default`], so an override file
/// only has to list the targets it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SelectorOverrides")]
pub struct SelectorTable {
    pub message_id_attributes: Vec<String>,
    pub chains: BTreeMap<SemanticTarget, Vec<Matcher>>,
}

/// Same shape as the serialized table, so a dumped table loads back as-is.
/// An empty attribute list keeps the default attributes.
#[derive(Debug, Default, Deserialize)]
struct SelectorOverrides {
    #[serde(default)]
    message_id_attributes: Vec<String>,
    #[serde(default)]
    chains: BTreeMap<SemanticTarget, Vec<Matcher>>,
}

impl From<SelectorOverrides> for SelectorTable {
    fn from(overrides: SelectorOverrides) -> Self {
        let mut table = SelectorTable::default();
        if !overrides.message_id_attributes.is_empty() {
            table.message_id_attributes = overrides.message_id_attributes;
        }
        table.chains.extend(overrides.chains);
        table
    }
}

impl SelectorTable {
    pub fn chain(&self, target: SemanticTarget) -> &[Matcher] {
        self.chains.get(&target).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Replace the chain for one target.
    pub fn set_chain(&mut self, target: SemanticTarget, matchers: Vec<Matcher>) {
        self.chains.insert(target, matchers);
    }

    pub fn validate(&self) -> Result<(), SelectorTableError> {
        if self
            .message_id_attributes
            .iter()
            .all(|attr| attr.trim().is_empty())
        {
            return Err(SelectorTableError::NoIdAttributes);
        }
        for target in SemanticTarget::ALL {
            let chain = self.chain(target);
            if chain.is_empty() {
                return Err(SelectorTableError::EmptyChain(target));
            }
            if chain.iter().any(|matcher| matcher.query().trim().is_empty()) {
                return Err(SelectorTableError::EmptySelector(target));
            }
        }
        Ok(())
    }

    /// Parse an override table in RON and merge it onto the defaults.
    pub fn from_ron(text: &str) -> Result<Self, SelectorTableError> {
        let table: SelectorTable =
            ron::from_str(text).map_err(|err| SelectorTableError::Parse(err.to_string()))?;
        table.validate()?;
        Ok(table)
    }
}

impl Default for SelectorTable {
    fn default() -> Self {
        use Matcher as M;
        use SemanticTarget as T;

        let confirm_labels = ["Delete", "Confirm"];
        let chains = BTreeMap::from([
            (
                T::Message,
                vec![
                    M::css("[id^=\"chat-messages-\"]"),
                    M::css("[data-list-item-id^=\"chat-messages\"]"),
                    M::css("[class*=\"message-\"][class*=\"cozyMessage-\"]"),
                ],
            ),
            (
                T::ActionContainer,
                vec![
                    M::class_fragment("buttonContainer-"),
                    M::class_fragment("buttonContainer_"),
                ],
            ),
            (T::MoreActions, vec![M::css("[aria-label=\"More\"]")]),
            (T::EditDirect, vec![M::css("[aria-label=\"Edit\"]")]),
            (
                T::EditMenuItem,
                vec![
                    M::css("[id^=\"message-actions-edit\"]"),
                    M::text("[role=\"menuitem\"]", &["Edit Message", "Edit"]),
                ],
            ),
            (
                T::DeleteMenuItem,
                vec![
                    M::css("[id^=\"message-actions-delete\"]"),
                    M::text("[role=\"menuitem\"]", &["Delete Message", "Delete"]),
                ],
            ),
            (
                T::TextEditor,
                vec![
                    M::css("[class*=\"textArea-\"][role=\"textbox\"]"),
                    M::css("[class*=\"textArea_\"][role=\"textbox\"]"),
                    M::css("[role=\"textbox\"][contenteditable=\"true\"]"),
                ],
            ),
            (
                T::ConfirmDelete,
                vec![
                    M::css("[type=\"submit\"]"),
                    M::text("[data-mana-component=\"button\"]", &confirm_labels),
                    M::text("button[class*=\"button\"]", &confirm_labels),
                    M::text("button", &confirm_labels),
                ],
            ),
            (
                T::MessageScroller,
                vec![
                    M::class_fragment("scrollerInner-"),
                    M::class_fragment("scrollerInner_"),
                    M::css("[data-list-id=\"chat-messages\"]"),
                ],
            ),
            (
                T::SearchInput,
                vec![
                    M::css("[role=\"combobox\"][aria-label=\"Search\"]"),
                    M::css("[class*=\"searchBar\"] [role=\"combobox\"]"),
                ],
            ),
            (
                T::SearchResult,
                vec![
                    M::class_fragment("searchResult-"),
                    M::class_fragment("searchResult_"),
                    M::css("[id^=\"search-result-\"]"),
                ],
            ),
            (
                T::SearchResultsScroller,
                vec![
                    M::class_fragment("searchResultsWrap-"),
                    M::class_fragment("searchResultsWrap_"),
                ],
            ),
            (
                T::JumpedMessage,
                vec![
                    M::class_fragment("backgroundFlash-"),
                    M::class_fragment("backgroundFlash_"),
                    M::css("[id^=\"chat-messages-\"][class*=\"selected\"]"),
                ],
            ),
            (
                T::LoginMarker,
                vec![
                    M::class_fragment("sidebar-"),
                    M::class_fragment("guilds"),
                    M::css("[data-list-id=\"guildsnav\"]"),
                    M::class_fragment("privateChannels-"),
                    M::css("[aria-label=\"Servers\"]"),
                    M::class_fragment("chat-"),
                ],
            ),
        ]);

        Self {
            message_id_attributes: vec!["id".to_string(), "data-list-item-id".to_string()],
            chains,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Matcher, SelectorTable, SemanticTarget};

    #[test]
    fn default_table_is_complete() {
        assert_eq!(SelectorTable::default().validate(), Ok(()));
    }

    #[test]
    fn class_fragment_escapes_quotes() {
        let matcher = Matcher::class_fragment("odd\"name");
        assert_eq!(matcher.query(), "[class*=\"odd\\\"name\"]");
    }

    #[test]
    fn text_matcher_trims_and_compares_exactly() {
        let matcher = Matcher::text("button", &["Delete"]);
        assert!(matcher.accepts_text("  Delete \n"));
        assert!(!matcher.accepts_text("Delete all"));
        assert!(!matcher.accepts_text("delete"));
    }

    #[test]
    fn every_target_has_a_distinct_name() {
        let mut names: Vec<_> = SemanticTarget::ALL.iter().map(|t| t.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), SemanticTarget::ALL.len());
    }
}
