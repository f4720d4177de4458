use crate::domain::ports::Observer;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tokio::sync::Notify;

/// Observer built from closures.
pub struct FnObserver<N, C> {
    on_next: N,
    on_complete: Option<C>,
}

impl<T, N, C> Observer<T> for FnObserver<N, C>
where
    N: FnMut(T),
    C: FnOnce(),
{
    fn next(&mut self, value: T) {
        (self.on_next)(value)
    }

    fn complete(&mut self) {
        if let Some(on_complete) = self.on_complete.take() {
            on_complete();
        }
    }
}

pub fn from_fn<T, N>(on_next: N) -> FnObserver<N, fn()>
where
    N: FnMut(T),
{
    FnObserver {
        on_next,
        on_complete: None,
    }
}

pub fn from_fns<T, N, C>(on_next: N, on_complete: C) -> FnObserver<N, C>
where
    N: FnMut(T),
    C: FnOnce(),
{
    FnObserver {
        on_next,
        on_complete: Some(on_complete),
    }
}

struct CollectorState<T> {
    values: RefCell<Vec<T>>,
    completed: Cell<bool>,
    done: Notify,
}

/// Records everything it receives.
///
/// Clones share the same buffer, so one clone can be handed to `subscribe`
/// while another is kept for inspection.
pub struct Collector<T> {
    state: Rc<CollectorState<T>>,
}

impl<T> Clone for Collector<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<T> Default for Collector<T> {
    fn default() -> Self {
        Self {
            state: Rc::new(CollectorState {
                values: RefCell::new(Vec::new()),
                completed: Cell::new(false),
                done: Notify::new(),
            }),
        }
    }
}

impl<T: Clone> Collector<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn values(&self) -> Vec<T> {
        self.state.values.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.state.values.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.values.borrow().is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.state.completed.get()
    }

    /// Resolves once `complete` has been received.
    pub async fn wait_complete(&self) {
        while !self.is_complete() {
            self.state.done.notified().await;
        }
    }
}

impl<T> Observer<T> for Collector<T> {
    fn next(&mut self, value: T) {
        self.state.values.borrow_mut().push(value);
    }

    fn complete(&mut self) {
        if !self.state.completed.replace(true) {
            // notify_one 會保留 permit，等待者晚到也不會漏掉
            self.state.done.notify_one();
        }
    }
}
