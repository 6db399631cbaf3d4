use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// A `fmt::Write` sink whose clones append to one buffer, so a tree can own one
/// handle as its debug writer while the caller reads through another.
#[derive(Clone, Default)]
pub struct SharedStringWriter(Rc<RefCell<String>>);

impl fmt::Write for SharedStringWriter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0.borrow_mut().push_str(s);
        Ok(())
    }
}

impl SharedStringWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        self.0.borrow().clone()
    }

    /// Returns everything written so far and empties the buffer.
    pub fn take(&self) -> String {
        std::mem::take(&mut *self.0.borrow_mut())
    }
}
