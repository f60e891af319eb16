//! Step-scoped content streams.

use super::FileSourceError;
use camino::Utf8PathBuf;
use std::cell::RefCell;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::rc::Rc;

#[derive(Debug)]
enum SlotState {
    Unopened,
    Open(BufReader<File>),
    Released,
}

/// Shared state between an enumeration step and the handles it hands out.
#[derive(Debug)]
pub(super) struct StreamSlot {
    path: String,
    absolute: Utf8PathBuf,
    state: RefCell<SlotState>,
}

impl StreamSlot {
    pub(super) fn new(path: String, absolute: Utf8PathBuf) -> Self {
        Self {
            path,
            absolute,
            state: RefCell::new(SlotState::Unopened),
        }
    }

    pub(super) fn path(&self) -> &str {
        &self.path
    }

    /// Closes the underlying file, if open, and refuses further reads.
    pub(super) fn release(&self) {
        // Dropping the previous state closes the file handle.
        drop(self.state.replace(SlotState::Released));
    }

    fn read(&self, buf: &mut [u8]) -> io::Result<usize> {
        let mut state = self.state.borrow_mut();
        if matches!(*state, SlotState::Unopened) {
            let file = File::open(&self.absolute)?;
            *state = SlotState::Open(BufReader::new(file));
        }
        match &mut *state {
            SlotState::Open(reader) => reader.read(buf),
            SlotState::Unopened | SlotState::Released => {
                Err(io::Error::other(FileSourceError::StreamDisposed {
                    path: self.path.clone(),
                }))
            }
        }
    }
}

/// Sequential reader over one package file's content.
///
/// The handle stays valid only for the enumeration step that produced it.
/// It implements [`Read`] only; there is no random access.
#[derive(Debug)]
pub struct ContentStream {
    slot: Rc<StreamSlot>,
}

impl ContentStream {
    pub(super) fn new(slot: Rc<StreamSlot>) -> Self {
        Self { slot }
    }

    /// Returns the package-relative path this stream reads.
    #[must_use]
    pub fn path(&self) -> &str {
        self.slot.path()
    }

    /// Returns `true` once the owning enumeration step has ended.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        matches!(*self.slot.state.borrow(), SlotState::Released)
    }
}

impl Read for ContentStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.slot.read(buf)
    }
}
