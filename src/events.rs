//! Lifecycle events raised around save and delete.
//!
//! Each record owns an [`EventHub`]. Listeners are registered per event
//! kind and run synchronously in registration order. Every listener
//! receives the same mutable event, so a change made by one listener is
//! visible to the next and to the dispatcher. Setting `is_valid = false`
//! on a `Before*` event vetoes the operation.
//!
//! A listener error stops dispatch and is returned to the caller of
//! [`EventHub::trigger`].

use crate::error::{ListenerError, RecordError};
use crate::state::RecordState;
use serde::{Deserialize, Serialize};

/// Event kinds, used for logging and error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    BeforeSave,
    AfterSave,
    BeforeDelete,
    AfterDelete,
}

/// Raised before INSERT or UPDATE.
#[derive(Debug)]
pub struct BeforeSave<'a> {
    pub record: &'a mut RecordState,
    /// `true` for INSERT, `false` for UPDATE.
    pub insert: bool,
    pub is_valid: bool,
}

/// Raised after a successful INSERT or UPDATE.
#[derive(Debug)]
pub struct AfterSave<'a> {
    pub record: &'a mut RecordState,
}

/// Raised before DELETE.
#[derive(Debug)]
pub struct BeforeDelete<'a> {
    pub record: &'a mut RecordState,
    pub is_valid: bool,
}

/// Raised after a successful DELETE.
#[derive(Debug)]
pub struct AfterDelete<'a> {
    pub record: &'a mut RecordState,
}

impl<'a> BeforeSave<'a> {
    pub fn new(record: &'a mut RecordState, insert: bool) -> Self {
        Self {
            record,
            insert,
            is_valid: true,
        }
    }
}

impl<'a> BeforeDelete<'a> {
    pub fn new(record: &'a mut RecordState) -> Self {
        Self {
            record,
            is_valid: true,
        }
    }
}

pub type ListenerResult = Result<(), ListenerError>;

type BeforeSaveListener = Box<dyn FnMut(&mut BeforeSave<'_>) -> ListenerResult>;
type AfterSaveListener = Box<dyn FnMut(&mut AfterSave<'_>) -> ListenerResult>;
type BeforeDeleteListener = Box<dyn FnMut(&mut BeforeDelete<'_>) -> ListenerResult>;
type AfterDeleteListener = Box<dyn FnMut(&mut AfterDelete<'_>) -> ListenerResult>;

/// Ordered listener lists, one per event kind.
#[derive(Default)]
pub struct EventHub {
    before_save: Vec<BeforeSaveListener>,
    after_save: Vec<AfterSaveListener>,
    before_delete: Vec<BeforeDeleteListener>,
    after_delete: Vec<AfterDeleteListener>,
}

impl std::fmt::Debug for EventHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventHub")
            .field("before_save", &self.before_save.len())
            .field("after_save", &self.after_save.len())
            .field("before_delete", &self.before_delete.len())
            .field("after_delete", &self.after_delete.len())
            .finish()
    }
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_before_save<F>(&mut self, listener: F)
    where
        F: for<'a> FnMut(&mut BeforeSave<'a>) -> ListenerResult + 'static,
    {
        self.before_save.push(Box::new(listener));
    }

    pub fn on_after_save<F>(&mut self, listener: F)
    where
        F: for<'a> FnMut(&mut AfterSave<'a>) -> ListenerResult + 'static,
    {
        self.after_save.push(Box::new(listener));
    }

    pub fn on_before_delete<F>(&mut self, listener: F)
    where
        F: for<'a> FnMut(&mut BeforeDelete<'a>) -> ListenerResult + 'static,
    {
        self.before_delete.push(Box::new(listener));
    }

    pub fn on_after_delete<F>(&mut self, listener: F)
    where
        F: for<'a> FnMut(&mut AfterDelete<'a>) -> ListenerResult + 'static,
    {
        self.after_delete.push(Box::new(listener));
    }

    /// Number of listeners registered for `kind`.
    pub fn listener_count(&self, kind: EventKind) -> usize {
        match kind {
            EventKind::BeforeSave => self.before_save.len(),
            EventKind::AfterSave => self.after_save.len(),
            EventKind::BeforeDelete => self.before_delete.len(),
            EventKind::AfterDelete => self.after_delete.len(),
        }
    }

    /// Run every listener registered for the event's kind, in order.
    ///
    /// # Errors
    ///
    /// [`RecordError::Listener`] with the first listener failure; later
    /// listeners are not run.
    pub fn trigger<E: Event>(&mut self, event: &mut E) -> Result<(), RecordError> {
        event.dispatch(self).map_err(|source| RecordError::Listener {
            event: E::KIND,
            source,
        })
    }
}

/// An event that can be dispatched through an [`EventHub`].
pub trait Event {
    const KIND: EventKind;

    #[doc(hidden)]
    fn dispatch(&mut self, hub: &mut EventHub) -> ListenerResult;
}

macro_rules! impl_event {
    ($event:ident, $field:ident, $kind:expr) => {
        impl<'a> Event for $event<'a> {
            const KIND: EventKind = $kind;

            fn dispatch(&mut self, hub: &mut EventHub) -> ListenerResult {
                for listener in hub.$field.iter_mut() {
                    listener(&mut *self)?;
                }
                Ok(())
            }
        }
    };
}

impl_event!(BeforeSave, before_save, EventKind::BeforeSave);
impl_event!(AfterSave, after_save, EventKind::AfterSave);
impl_event!(BeforeDelete, before_delete, EventKind::BeforeDelete);
impl_event!(AfterDelete, after_delete, EventKind::AfterDelete);
