#![allow(dead_code)]

use std::sync::Once;

use wiper_core::SelectorTable;
use wiper_engine::{SelectorResolver, SettlePolicy};

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

pub fn resolver() -> SelectorResolver {
    SelectorResolver::new(SelectorTable::default())
}

pub fn settle() -> SettlePolicy {
    SettlePolicy::immediate()
}

/// An own message with inline edit and the more-actions control.
pub fn own_message(n: u32) -> String {
    format!(
        r#"<li id="chat-messages-{n}" class="message-a1 cozyMessage-b2">
             <div class="buttonContainer-c3"><div aria-label="Edit"></div><div aria-label="More"></div></div>
             <div>message {n}</div>
           </li>"#
    )
}

/// An own message whose edit action is only reachable through the menu.
pub fn menu_only_message(n: u32) -> String {
    format!(
        r#"<li id="chat-messages-{n}">
             <div class="buttonContainer-c3"><div aria-label="More"></div></div>
             <div>message {n}</div>
           </li>"#
    )
}

/// Somebody else's message: no owner action controls.
pub fn foreign_message(n: u32) -> String {
    format!(r#"<li id="chat-messages-{n}"><div>someone else {n}</div></li>"#)
}

/// Wraps `attrs` into the opening tag of an own message, e.g. a page number.
pub fn own_message_with(n: u32, attrs: &str) -> String {
    own_message(n).replacen(
        &format!(r#"id="chat-messages-{n}""#),
        &format!(r#"id="chat-messages-{n}" {attrs}"#),
        1,
    )
}

pub const EDITOR: &str = r#"<div id="editor" role="textbox" contenteditable="true"></div>"#;

pub const MENU: &str = r#"<div role="menu">
    <div id="message-actions-edit" role="menuitem">Edit Message</div>
    <div id="message-actions-delete" role="menuitem">Delete Message</div>
  </div>"#;

pub const CONFIRM: &str =
    r#"<button id="confirm" type="submit" data-fixture-removes>Delete</button>"#;

/// A channel view with a full set of working menu, editor and dialog controls.
pub fn channel(messages: &[String]) -> String {
    channel_with(messages, &[EDITOR, MENU, CONFIRM])
}

pub fn channel_with(messages: &[String], chrome: &[&str]) -> String {
    format!(
        r#"<html><body>
             <nav aria-label="Servers"></nav>
             <ol class="scrollerInner-d4" data-list-id="chat-messages">{}</ol>
             {}
           </body></html>"#,
        messages.concat(),
        chrome.concat()
    )
}

/// The clicks one successful inline-edit sequence produces.
pub const INLINE_SEQUENCE: [&str; 4] = ["Edit", "More", "message-actions-delete", "confirm"];
