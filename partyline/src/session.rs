//! Client sessions. A session is keyed by a stable identity the client
//! presents at connect time, independent of transport reconnects; the
//! transport side of a session lives behind [SessionLink] so the registry
//! can be exercised with recording fakes.

use std::collections::HashMap;

use crate::wire::{Role, ServerEvent};

/// The transport end of a session, owned by the network collaborator.
pub trait SessionLink {
    /// Queue an event for the client. Fire-and-forget: a full or closed
    /// connection must not stall the event loop.
    fn deliver(&self, event: ServerEvent);
    /// Tear the connection down.
    fn close(&self);
}

#[derive(Debug)]
pub struct Session<L> {
    role: Option<Role>,
    link: L,
}

impl<L> Session<L> {
    /// `None` until the client reports one.
    pub fn role(&self) -> Option<Role> {
        self.role
    }

    pub fn link(&self) -> &L {
        &self.link
    }
}

/// At most one live session per identity.
#[derive(Debug, Default)]
pub struct SessionRegistry<L> {
    sessions: HashMap<String, Session<L>>,
}

impl<L: SessionLink> SessionRegistry<L> {
    pub fn new() -> Self {
        Self {
            sessions: HashMap::new(),
        }
    }

    /// Register a connection. An existing session with the same identity is
    /// force-closed first — the reconnecting client wins, never the stale
    /// connection.
    pub fn connect(&mut self, id: impl Into<String>, link: L) {
        let id = id.into();
        if let Some(previous) = self.sessions.remove(&id) {
            tracing::info!(%id, "already connected, superseding the older session");
            previous.link.close();
        }
        tracing::info!(%id, "connected");
        self.sessions.insert(id, Session { role: None, link });
    }

    pub fn disconnect(&mut self, id: &str) {
        if self.sessions.remove(id).is_some() {
            tracing::info!(%id, "disconnected");
        }
    }

    /// Unknown identities are ignored; a disconnect may have raced this.
    pub fn set_role(&mut self, id: &str, role: Role) {
        match self.sessions.get_mut(id) {
            Some(session) => {
                tracing::info!(%id, ?role, "role set");
                session.role = Some(role);
            }
            None => tracing::debug!(%id, "set_role for unknown identity, ignoring"),
        }
    }

    /// Back to unset, e.g. when a client leaves the pairing flow.
    pub fn clear_role(&mut self, id: &str) {
        match self.sessions.get_mut(id) {
            Some(session) => session.role = None,
            None => tracing::debug!(%id, "clear_role for unknown identity, ignoring"),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.sessions.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Session<L>)> {
        self.sessions.iter().map(|(id, s)| (id.as_str(), s))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Records deliveries and closes, for registry and broadcast tests.
    #[derive(Clone, Default)]
    pub struct RecordingLink {
        inner: Rc<RefCell<Recorded>>,
    }

    #[derive(Default)]
    struct Recorded {
        events: Vec<ServerEvent>,
        closed: bool,
    }

    impl RecordingLink {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn events(&self) -> Vec<ServerEvent> {
            self.inner.borrow().events.clone()
        }

        pub fn closed(&self) -> bool {
            self.inner.borrow().closed
        }
    }

    impl SessionLink for RecordingLink {
        fn deliver(&self, event: ServerEvent) {
            self.inner.borrow_mut().events.push(event);
        }

        fn close(&self) {
            self.inner.borrow_mut().closed = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::RecordingLink;
    use super::*;

    #[test]
    fn reconnect_supersedes_and_closes_the_older_link() {
        let mut registry = SessionRegistry::new();
        let first = RecordingLink::new();
        let second = RecordingLink::new();

        registry.connect("phone-1", first.clone());
        registry.connect("phone-1", second.clone());

        assert_eq!(registry.len(), 1);
        assert!(first.closed());
        assert!(!second.closed());
    }

    #[test]
    fn roles_start_unset_and_are_mutable() {
        let mut registry = SessionRegistry::new();
        registry.connect("phone-1", RecordingLink::new());

        let role_of = |registry: &SessionRegistry<RecordingLink>| {
            registry
                .iter()
                .find(|(id, _)| *id == "phone-1")
                .and_then(|(_, s)| s.role())
        };

        assert_eq!(role_of(&registry), None);
        registry.set_role("phone-1", Role::Local);
        assert_eq!(role_of(&registry), Some(Role::Local));
        registry.clear_role("phone-1");
        assert_eq!(role_of(&registry), None);
    }

    #[test]
    fn unknown_identities_are_ignored() {
        let mut registry: SessionRegistry<RecordingLink> = SessionRegistry::new();
        registry.set_role("ghost", Role::Admin);
        registry.clear_role("ghost");
        registry.disconnect("ghost");
        assert!(registry.is_empty());
    }

    #[test]
    fn disconnect_removes_the_session() {
        let mut registry = SessionRegistry::new();
        registry.connect("phone-1", RecordingLink::new());
        registry.disconnect("phone-1");
        assert!(!registry.contains("phone-1"));
    }
}
