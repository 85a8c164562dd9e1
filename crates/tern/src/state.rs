use crate::models::conversation::Conversation;

/// In-memory working set for one session: every conversation, which one
/// is selected, and the transient request flags a frontend renders from.
#[derive(Debug, Default)]
pub struct ChatState {
    conversations: Vec<Conversation>,
    active_id: Option<String>,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl ChatState {
    pub fn new() -> Self {
        ChatState::default()
    }

    /// Rebuilds session state from persisted conversations. The entry
    /// flagged active wins; otherwise the first one is selected.
    pub fn from_conversations(conversations: Vec<Conversation>) -> Self {
        let active_id = conversations
            .iter()
            .find(|conversation| conversation.is_active)
            .or_else(|| conversations.first())
            .map(|conversation| conversation.id.clone());
        ChatState {
            conversations,
            active_id,
            is_loading: false,
            error: None,
        }
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active_id.as_deref()
    }

    pub fn active(&self) -> Option<&Conversation> {
        let id = self.active_id.as_deref()?;
        self.conversations.iter().find(|c| c.id == id)
    }

    pub fn active_mut(&mut self) -> Option<&mut Conversation> {
        let id = self.active_id.clone()?;
        self.conversations.iter_mut().find(|c| c.id == id)
    }

    /// Starts a fresh conversation, selects it, and returns its id.
    /// Untitled conversations are numbered `New Chat {n}`.
    pub fn create_conversation(&mut self, title: Option<&str>) -> String {
        let title = match title {
            Some(title) => title.to_string(),
            None => format!("New Chat {}", self.conversations.len() + 1),
        };
        let conversation = Conversation::new(title);
        let id = conversation.id.clone();
        self.active_id = Some(id.clone());
        self.conversations.push(conversation);
        id
    }

    pub fn set_active(&mut self, id: &str) -> bool {
        if self.conversations.iter().any(|c| c.id == id) {
            self.active_id = Some(id.to_string());
            true
        } else {
            false
        }
    }

    pub fn rename(&mut self, id: &str, title: impl Into<String>) -> bool {
        match self.conversations.iter_mut().find(|c| c.id == id) {
            Some(conversation) => {
                conversation.title = title.into();
                conversation.touch();
                true
            }
            None => false,
        }
    }

    pub fn clear_messages(&mut self, id: &str) -> bool {
        match self.conversations.iter_mut().find(|c| c.id == id) {
            Some(conversation) => {
                conversation.clear();
                true
            }
            None => false,
        }
    }

    /// Removes a conversation. Deleting the selected one promotes the
    /// first remaining conversation; an emptied list leaves no selection.
    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.conversations.len();
        self.conversations.retain(|c| c.id != id);
        let removed = self.conversations.len() != before;
        if removed && self.active_id.as_deref() == Some(id) {
            self.active_id = self.conversations.first().map(|c| c.id.clone());
        }
        removed
    }

    /// Snapshot for persistence, with the selection folded back into the
    /// per-conversation active flag.
    pub fn to_persisted(&self) -> Vec<Conversation> {
        self.conversations
            .iter()
            .map(|conversation| {
                let mut out = conversation.clone();
                out.is_active = self.active_id.as_deref() == Some(conversation.id.as_str());
                out
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_numbers_titles_and_selects() {
        let mut state = ChatState::new();
        let first = state.create_conversation(None);
        let second = state.create_conversation(None);

        assert_eq!(state.conversations()[0].title, "New Chat 1");
        assert_eq!(state.conversations()[1].title, "New Chat 2");
        assert_ne!(first, second);
        assert_eq!(state.active_id(), Some(second.as_str()));

        state.create_conversation(Some("Trip planning"));
        assert_eq!(state.active().unwrap().title, "Trip planning");
    }

    #[test]
    fn test_set_active_requires_known_id() {
        let mut state = ChatState::new();
        let first = state.create_conversation(None);
        state.create_conversation(None);

        assert!(state.set_active(&first));
        assert_eq!(state.active().unwrap().id, first);
        assert!(!state.set_active("missing"));
        assert_eq!(state.active_id(), Some(first.as_str()));
    }

    #[test]
    fn test_delete_active_promotes_first_remaining() {
        let mut state = ChatState::new();
        let first = state.create_conversation(None);
        let active = state.create_conversation(None);

        assert!(state.delete(&active));
        assert_eq!(state.active_id(), Some(first.as_str()));
        assert_eq!(state.conversations().len(), 1);
    }

    #[test]
    fn test_delete_last_conversation_leaves_no_selection() {
        let mut state = ChatState::new();
        let only = state.create_conversation(None);

        assert!(state.delete(&only));
        assert_eq!(state.active_id(), None);
        assert!(state.conversations().is_empty());
    }

    #[test]
    fn test_delete_other_keeps_selection() {
        let mut state = ChatState::new();
        let first = state.create_conversation(None);
        let second = state.create_conversation(None);

        assert!(state.delete(&first));
        assert_eq!(state.active_id(), Some(second.as_str()));
        assert!(!state.delete(&first));
    }

    #[test]
    fn test_rename_and_clear_unknown_ids() {
        let mut state = ChatState::new();
        let id = state.create_conversation(None);
        state.active_mut().unwrap().push(crate::models::message::Message::user("hi"));

        assert!(state.rename(&id, "Greetings"));
        assert_eq!(state.active().unwrap().title, "Greetings");
        assert!(state.clear_messages(&id));
        assert!(state.active().unwrap().messages.is_empty());

        assert!(!state.rename("missing", "x"));
        assert!(!state.clear_messages("missing"));
    }

    #[test]
    fn test_from_conversations_prefers_flagged_entry() {
        let first = Conversation::new("a");
        let mut second = Conversation::new("b");
        second.is_active = true;

        let state = ChatState::from_conversations(vec![first.clone(), second.clone()]);
        assert_eq!(state.active_id(), Some(second.id.as_str()));

        let state = ChatState::from_conversations(vec![first.clone()]);
        assert_eq!(state.active_id(), Some(first.id.as_str()));

        let state = ChatState::from_conversations(Vec::new());
        assert_eq!(state.active_id(), None);
    }

    #[test]
    fn test_to_persisted_marks_only_active() {
        let mut state = ChatState::new();
        let first = state.create_conversation(None);
        state.create_conversation(None);
        state.set_active(&first);

        let persisted = state.to_persisted();
        assert!(persisted[0].is_active);
        assert!(!persisted[1].is_active);
    }
}
