use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

struct SubscriptionState {
    id: u64,
    closed: Cell<bool>,
    teardowns: RefCell<Vec<Box<dyn FnOnce()>>>,
}

/// Handle to one registration of an observer.
///
/// Clones share the same state. Closing is idempotent: teardowns run once,
/// in registration order, the first time the subscription closes.
#[derive(Clone)]
pub struct Subscription {
    inner: Rc<SubscriptionState>,
}

impl Subscription {
    pub(crate) fn new() -> Self {
        Self {
            inner: Rc::new(SubscriptionState {
                id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
                closed: Cell::new(false),
                teardowns: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.get()
    }

    /// Stops delivery to this subscriber and releases whatever feeds it.
    pub fn unsubscribe(&self) {
        if self.inner.closed.replace(true) {
            return;
        }
        tracing::debug!(subscription = self.inner.id, "subscription closed");

        // teardown 可能再註冊 teardown，先取出再執行
        let teardowns = std::mem::take(&mut *self.inner.teardowns.borrow_mut());
        for teardown in teardowns {
            teardown();
        }
    }

    /// Registers cleanup to run on close. Runs immediately if already closed.
    pub(crate) fn add_teardown<F: FnOnce() + 'static>(&self, teardown: F) {
        if self.is_closed() {
            teardown();
        } else {
            self.inner.teardowns.borrow_mut().push(Box::new(teardown));
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.inner.id)
            .field("closed", &self.is_closed())
            .finish()
    }
}
