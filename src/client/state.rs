//! In-memory state of the chat client
//!
//! The client starts with no category selected. Picking a category opens the chat
//! workspace; "new chat" and a successful "clear all" return to the picker.

use crate::conversation::{ChatSummary, Message};

/// Writing category chosen before chatting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Email,
    Blog,
    Resume,
    SimpleChat,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Email,
        Category::Blog,
        Category::Resume,
        Category::SimpleChat,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Category::Email => "Email",
            Category::Blog => "Blog",
            Category::Resume => "Resume",
            Category::SimpleChat => "Simple Chat",
        }
    }

    /// Parse a picker choice: a 1-based index or a category name
    pub fn from_choice(choice: &str) -> Option<Self> {
        let choice = choice.trim();
        if let Ok(n) = choice.parse::<usize>() {
            return n.checked_sub(1).and_then(|i| Self::ALL.get(i).copied());
        }
        Self::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(choice))
    }

    /// Tag the prompt with the category, except for plain chat
    pub fn apply(&self, prompt: &str) -> String {
        match self {
            Category::SimpleChat => prompt.to_string(),
            other => format!("[Category: {}] {}", other.name(), prompt),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientState {
    pub category: Option<Category>,
    pub prompt: String,
    pub messages: Vec<Message>,
    pub chats: Vec<ChatSummary>,
    pub current_chat_id: Option<String>,
    pub loading: bool,
}

impl ClientState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select_category(&mut self, category: Category) {
        self.category = Some(category);
    }

    /// Forget the open conversation and go back to the category picker
    pub fn new_chat(&mut self) {
        self.current_chat_id = None;
        self.messages.clear();
        self.prompt.clear();
        self.category = None;
    }

    /// Back to initial values after every conversation was deleted
    pub fn reset(&mut self) {
        self.new_chat();
        self.chats.clear();
    }

    /// The prompt as it should be sent, or `None` if there is nothing to send
    pub fn outgoing_prompt(&self) -> Option<String> {
        let category = self.category?;
        if self.prompt.trim().is_empty() {
            return None;
        }
        Some(category.apply(&self.prompt))
    }

    pub fn show_conversation(&mut self, id: String, messages: Vec<Message>) {
        self.messages = messages;
        self.current_chat_id = Some(id);
        self.prompt.clear();
    }
}
