use indexmap::IndexMap;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// A key observed at the document level
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Escape,
    Enter,
    Character(char),
    Named(String),
}

impl Key {
    /// Parse a DOM `KeyboardEvent.key` value
    pub fn from_name(name: &str) -> Self {
        match name {
            "Escape" | "Esc" => Key::Escape,
            "Enter" => Key::Enter,
            _ => {
                let mut chars = name.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Key::Character(c),
                    _ => Key::Named(name.to_string()),
                }
            }
        }
    }
}

/// What a key binding asks the screen to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    GoHome,
}

type Registry = RefCell<IndexMap<u64, (Key, KeyAction)>>;

/// Document-level key listeners owned by one screen.
///
/// Listeners stay registered for as long as their [`ListenerGuard`] lives.
#[derive(Debug, Default)]
pub struct KeyboardHub {
    listeners: Rc<Registry>,
    next_id: u64,
}

impl KeyboardHub {
    /// Create a hub with no listeners
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a binding; dropping the guard removes it
    pub fn listen(&mut self, key: Key, action: KeyAction) -> ListenerGuard {
        let id = self.next_id;
        self.next_id += 1;
        self.listeners.borrow_mut().insert(id, (key, action));

        ListenerGuard {
            id,
            registry: Rc::downgrade(&self.listeners),
        }
    }

    /// Actions bound to `key`, in registration order
    pub fn dispatch(&self, key: &Key) -> Vec<KeyAction> {
        self.listeners
            .borrow()
            .values()
            .filter(|(bound, _)| bound == key)
            .map(|(_, action)| *action)
            .collect()
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }
}

/// Keeps a key binding registered
#[derive(Debug)]
pub struct ListenerGuard {
    id: u64,
    registry: Weak<Registry>,
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.borrow_mut().shift_remove(&self.id);
        }
    }
}
