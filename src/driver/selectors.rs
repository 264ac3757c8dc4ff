//! UI locators used by agents

use serde::{Deserialize, Serialize};

use super::Selector;

/// Every locator an agent needs, overridable from the `[selectors]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatSelectors {
    /// Login form name field
    pub username: Selector,
    /// Login form gender select
    pub gender: Selector,
    /// Login form age field
    pub age: Selector,
    /// Login form submit button
    pub submit: Selector,
    /// Post-login landing marker and chat surface
    pub chat_surface: Selector,
    /// Notification bell button
    pub notification_bell: Selector,
    /// One counterparty entry in the open notification panel
    pub unread_entry: Selector,
    /// Counterparty name inside an unread entry
    pub unread_sender: Selector,
    /// One message in an open conversation
    pub chat_message: Selector,
    /// Message input field
    pub message_input: Selector,
    /// Send button
    pub send_button: Selector,
}

impl Default for ChatSelectors {
    fn default() -> Self {
        Self {
            username: Selector::css("[name='username']"),
            gender: Selector::css("[name='gender']"),
            age: Selector::css("[name='age']"),
            submit: Selector::xpath("//button[@type='submit']"),
            chat_surface: Selector::css(".chat-container"),
            notification_bell: Selector::css("button.p-2.text-gray-600"),
            unread_entry: Selector::css(
                "div.absolute.right-0.mt-2.w-64.bg-white.rounded-lg.shadow-lg.py-1.z-50.border.border-gray-200 div.px-4.py-3",
            ),
            unread_sender: Selector::css("span.font-medium.text-gray-900"),
            chat_message: Selector::css("div.chat-message"),
            message_input: Selector::css("input[placeholder='Type your message']"),
            send_button: Selector::css("button[class*='send']"),
        }
    }
}
