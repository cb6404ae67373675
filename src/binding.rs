use std::os::unix::prelude::{AsRawFd, RawFd};
use std::time::Duration;

use crate::errors::ReadError;
use crate::events::Value;

/// An open handle on a single pin's value file.
///
/// Handles are moved into the watcher loop when a pin is added and dropped
/// there when it is removed, so closing the descriptor is left to `Drop`.
pub trait PinHandle: AsRawFd {
    /// Read the current value from the start of the file.
    fn read_value(&mut self) -> Result<Value, ReadError>;
}

/// Readiness condition a multiplexer waits for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interest {
    /// Exceptional / `POLLPRI` condition, which is how sysfs value files
    /// report an edge.
    #[default]
    Priority,
    /// Plain read readiness (pipes, sockets, character devices).
    Readable,
}

/// Descriptors reported ready by a single [`Multiplexer::wait`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadySet {
    ready: Vec<RawFd>,
}

impl ReadySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, fd: RawFd) {
        if !self.ready.contains(&fd) {
            self.ready.push(fd);
        }
    }

    pub fn contains(&self, fd: RawFd) -> bool {
        self.ready.contains(&fd)
    }

    /// Whether the wait ended because of readiness rather than the timeout.
    pub fn changed(&self) -> bool {
        !self.ready.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ready.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ready.is_empty()
    }
}

impl FromIterator<RawFd> for ReadySet {
    fn from_iter<T: IntoIterator<Item = RawFd>>(iter: T) -> Self {
        let mut set = ReadySet::new();

        for fd in iter {
            set.insert(fd);
        }

        set
    }
}

/// Platform readiness wait.
pub trait Multiplexer {
    /// Block until any of `fds` is ready or `timeout` elapses.
    ///
    /// `max_fd` is the largest descriptor in `fds`. A timeout yields an empty
    /// [`ReadySet`]. An interrupted wait should also be reported as empty
    /// rather than as an error.
    fn wait(
        &mut self,
        max_fd: RawFd,
        fds: &[RawFd],
        timeout: Duration,
    ) -> Result<ReadySet, nix::errno::Errno>;
}

impl<M: Multiplexer + ?Sized> Multiplexer for Box<M> {
    fn wait(
        &mut self,
        max_fd: RawFd,
        fds: &[RawFd],
        timeout: Duration,
    ) -> Result<ReadySet, nix::errno::Errno> {
        (**self).wait(max_fd, fds, timeout)
    }
}
