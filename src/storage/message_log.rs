use crate::common::Message;

/// Which field of a message a search query is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    Content,
    Sender,
}

/// Append-only in-memory chat history
#[derive(Debug, Default)]
pub struct MessageLog {
    messages: Vec<Message>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Linear, case-sensitive substring scan in append order.
    ///
    /// An empty query matches every message.
    pub fn search(&self, query: &str, field: SearchField) -> Vec<String> {
        self.messages
            .iter()
            .filter(|msg| match field {
                SearchField::Content => msg.content.contains(query),
                SearchField::Sender => msg.sender.contains(query),
            })
            .map(Message::format_line)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
