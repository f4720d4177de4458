use crate::core::observable::{Observable, Source};
use crate::core::subscription::Subscription;
use crate::domain::ports::Observer;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

struct Entry<T> {
    subscription: Subscription,
    observer: RefCell<Box<dyn Observer<T>>>,
}

struct SubjectState<T> {
    entries: RefCell<Vec<Rc<Entry<T>>>>,
    stopped: Cell<bool>,
}

/// Multicast relay: every value pushed in is delivered to the observers
/// attached at that moment. Nothing is replayed to late observers.
pub struct Subject<T> {
    state: Rc<SubjectState<T>>,
}

impl<T> Clone for Subject<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<T> Default for Subject<T> {
    fn default() -> Self {
        Self {
            state: Rc::new(SubjectState {
                entries: RefCell::new(Vec::new()),
                stopped: Cell::new(false),
            }),
        }
    }
}

impl<T: Clone + 'static> Subject<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self, value: T) {
        if self.state.stopped.get() {
            return;
        }

        // 觀察者在遞送途中可能退訂，先複製一份清單
        let snapshot: Vec<Rc<Entry<T>>> = self.state.entries.borrow().clone();
        for entry in snapshot {
            if entry.subscription.is_closed() {
                continue;
            }
            entry.observer.borrow_mut().next(value.clone());
        }
    }

    pub fn complete(&self) {
        if self.state.stopped.replace(true) {
            return;
        }

        let entries = std::mem::take(&mut *self.state.entries.borrow_mut());
        tracing::debug!(observers = entries.len(), "subject completed");
        for entry in entries {
            if entry.subscription.is_closed() {
                continue;
            }
            entry.observer.borrow_mut().complete();
            entry.subscription.unsubscribe();
        }
    }

    pub fn observer_count(&self) -> usize {
        self.state.entries.borrow().len()
    }

    pub fn is_stopped(&self) -> bool {
        self.state.stopped.get()
    }

    pub(crate) fn same_as(&self, other: &Subject<T>) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }

    pub fn as_observable(&self) -> Observable<T> {
        Observable::from_source(self.clone())
    }
}

impl<T: Clone + 'static> Source<T> for Subject<T> {
    fn attach(&self, mut observer: Box<dyn Observer<T>>, subscription: &Subscription) {
        if self.state.stopped.get() {
            observer.complete();
            subscription.unsubscribe();
            return;
        }

        self.state.entries.borrow_mut().push(Rc::new(Entry {
            subscription: subscription.clone(),
            observer: RefCell::new(observer),
        }));

        let id = subscription.id();
        let weak = Rc::downgrade(&self.state);
        subscription.add_teardown(move || {
            if let Some(state) = weak.upgrade() {
                state
                    .entries
                    .borrow_mut()
                    .retain(|entry| entry.subscription.id() != id);
            }
        });
    }
}

impl<T: Clone + 'static> Observer<T> for Subject<T> {
    fn next(&mut self, value: T) {
        Subject::next(&*self, value)
    }

    fn complete(&mut self) {
        Subject::complete(&*self)
    }
}
