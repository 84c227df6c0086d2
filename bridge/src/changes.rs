use std::cell::RefCell;
use std::rc::Rc;

/// Change notifications collected while the editor is borrowed. The host
/// callback runs from [`ChangeQueue::drain`] after the borrow ends, so it may
/// read or edit the editor again.
#[derive(Debug, Clone, Default)]
pub struct ChangeQueue {
    pending: Rc<RefCell<Vec<String>>>,
}

impl ChangeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Listener to register on the editor; it only records the html.
    pub fn sink(&self) -> impl FnMut(&str) + 'static {
        let pending = self.pending.clone();
        move |html| pending.borrow_mut().push(html.to_string())
    }

    pub fn is_empty(&self) -> bool {
        self.pending.borrow().is_empty()
    }

    /// Hands queued changes to `deliver` in order, including changes the
    /// callback itself causes.
    pub fn drain(&self, mut deliver: impl FnMut(String)) {
        loop {
            let batch = std::mem::take(&mut *self.pending.borrow_mut());
            if batch.is_empty() {
                return;
            }
            batch.into_iter().for_each(&mut deliver);
        }
    }
}
