use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use super::Session;

/// Chat identifier used as the session key.
pub type ChatId = i64;

/// Storage backing for per-chat sessions.
///
/// Implementations must be safe to share between threads; the conversation
/// logic only ever reads, replaces, or clears a whole session.
pub trait SessionStore: Send + Sync {
    fn get(&self, chat_id: ChatId) -> Option<Session>;
    fn put(&self, chat_id: ChatId, session: Session);
    fn clear(&self, chat_id: ChatId);
}

/// Process-local session store.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<ChatId, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ChatId, Session>> {
        // A panic while holding the lock cannot leave a half-written session.
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SessionStore for InMemorySessionStore {
    fn get(&self, chat_id: ChatId) -> Option<Session> {
        self.lock().get(&chat_id).cloned()
    }

    fn put(&self, chat_id: ChatId, session: Session) {
        self.lock().insert(chat_id, session);
    }

    fn clear(&self, chat_id: ChatId) {
        self.lock().remove(&chat_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{ChatState, Photo};

    #[test]
    fn put_get_clear() {
        let store = InMemorySessionStore::new();
        assert!(store.get(1).is_none());

        store.put(1, Session::default());
        assert_eq!(store.get(1).unwrap().state, ChatState::WaitingForPhoto);
        assert_eq!(store.len(), 1);

        store.clear(1);
        assert!(store.get(1).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn sessions_are_independent() {
        let store = InMemorySessionStore::new();
        store.put(
            1,
            Session {
                state: ChatState::WaitingForCoordinates,
                photo: Some(Photo { file_name: "a.jpg".into(), bytes: vec![1, 2, 3] }),
            },
        );
        store.put(2, Session::default());

        assert_eq!(store.get(1).unwrap().photo.unwrap().bytes, vec![1, 2, 3]);
        assert!(store.get(2).unwrap().photo.is_none());
    }
}
