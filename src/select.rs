use std::os::unix::prelude::RawFd;
use std::time::Duration;

use nix::errno::Errno;
use nix::libc::FD_SETSIZE;
use nix::sys::select::{select, FdSet};
use nix::sys::time::{TimeVal, TimeValLike};

use crate::binding::{Interest, Multiplexer, ReadySet};

/// Platform bindings for [`select(2)`][`nix::sys::select::select`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectMultiplexer {
    interest: Interest,
}

impl SelectMultiplexer {
    pub fn new(interest: Interest) -> Self {
        Self { interest }
    }
}

impl Multiplexer for SelectMultiplexer {
    fn wait(
        &mut self,
        max_fd: RawFd,
        fds: &[RawFd],
        timeout: Duration,
    ) -> Result<ReadySet, Errno> {
        // FdSet panics on descriptors it cannot hold
        if !fds.iter().copied().all(fits_fd_set) || !fits_fd_set(max_fd) {
            return Err(Errno::EINVAL);
        }

        let mut set = FdSet::new();

        for fd in fds.iter().copied() {
            set.insert(fd);
        }

        let mut timeval = TimeVal::microseconds(timeout.as_micros() as i64);

        let res = match self.interest {
            Interest::Readable => select(max_fd + 1, &mut set, None, None, &mut timeval),
            Interest::Priority => select(max_fd + 1, None, None, &mut set, &mut timeval),
        };

        match res {
            Ok(0) | Err(Errno::EINTR) => Ok(ReadySet::new()),
            Ok(_) => Ok(fds.iter().copied().filter(|fd| set.contains(*fd)).collect()),
            Err(e) => Err(e),
        }
    }
}

fn fits_fd_set(fd: RawFd) -> bool {
    usize::try_from(fd).map_or(false, |fd| fd < FD_SETSIZE)
}
