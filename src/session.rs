// Copyright (C) 2023 Tristan Gerritsen <tristan@thewoosh.org>
// All Rights Reserved.

//! Access to the session of the client, which is owned by the application.
//! Flash data and CSRF tokens live here.

use hashbrown::HashMap;
use serde_json::Value;

/// The key under which flash data for the next request is stored.
pub const FLASH_KEY: &str = "_flash";

/// The session storage of the application.
pub trait SessionStore: Send {
    /// Whether a session was started for this client.
    fn is_active(&self) -> bool;

    fn get(&self, key: &str) -> Option<Value>;

    fn set(&mut self, key: &str, value: Value);

    fn remove(&mut self, key: &str) -> Option<Value>;
}

/// A [`SessionStore`] kept in memory.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    active: bool,
    values: HashMap<String, Value>,
}

impl MemorySessionStore {
    /// Creates a store with an active session.
    pub fn new() -> Self {
        Self {
            active: true,
            values: HashMap::new(),
        }
    }

    /// Creates a store without a session, e.g. for clients that refused the
    /// session cookie.
    pub fn inactive() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn is_active(&self) -> bool {
        self.active
    }

    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) {
        self.values.insert(key.to_owned(), value);
    }

    fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }
}

/// A handle to a session that is known to be active. It can only be obtained
/// through [`ActiveSession::new`], so holders never have to check.
pub struct ActiveSession<'s> {
    store: &'s mut dyn SessionStore,
}

impl<'s> ActiveSession<'s> {
    /// Returns `None` if the store has no active session.
    pub fn new(store: &'s mut dyn SessionStore) -> Option<Self> {
        if store.is_active() {
            Some(Self { store })
        } else {
            None
        }
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.store.get(key)
    }

    pub fn set(&mut self, key: &str, value: Value) {
        self.store.set(key, value);
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.store.remove(key)
    }

    /// Stores data to be read by the next request.
    pub fn set_flash(&mut self, data: Value) {
        self.set(FLASH_KEY, data);
    }

    /// Reads the flash data left by the previous request, clearing it.
    pub fn take_flash(&mut self) -> Option<Value> {
        self.remove(FLASH_KEY)
    }
}
