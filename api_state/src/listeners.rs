use std::{cell::RefCell, rc::Rc};

use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Handle returned by `subscribe`, used to remove the listener again.
    pub struct ListenerKey;
}

type Listener<S> = Rc<dyn Fn(&S)>;

/// State listeners of one controller.
pub(crate) struct Listeners<S> {
    listeners: Rc<RefCell<SlotMap<ListenerKey, Listener<S>>>>,
}

impl<S> Clone for Listeners<S> {
    fn clone(&self) -> Self {
        Self {
            listeners: self.listeners.clone(),
        }
    }
}

impl<S> Default for Listeners<S> {
    fn default() -> Self {
        Self {
            listeners: Rc::new(RefCell::new(SlotMap::with_key())),
        }
    }
}

impl<S> Listeners<S> {
    pub(crate) fn add(&self, listener: impl Fn(&S) + 'static) -> ListenerKey {
        self.listeners.borrow_mut().insert(Rc::new(listener))
    }

    pub(crate) fn remove(&self, key: ListenerKey) -> bool {
        self.listeners.borrow_mut().remove(key).is_some()
    }

    pub(crate) fn len(&self) -> usize {
        self.listeners.borrow().len()
    }

    // Listeners are collected first so they may subscribe or unsubscribe while being notified.
    pub(crate) fn notify(&self, state: &S) {
        let listeners: Vec<Listener<S>> = self.listeners.borrow().values().cloned().collect();
        for listener in listeners {
            listener(state);
        }
    }
}

impl<S> std::fmt::Debug for Listeners<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners")
            .field("len", &self.len())
            .finish()
    }
}
