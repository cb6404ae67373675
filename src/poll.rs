use std::os::unix::prelude::RawFd;
use std::time::Duration;

use nix::errno::Errno;
use nix::poll::{poll, PollFd, PollFlags};

use crate::binding::{Interest, Multiplexer, ReadySet};

/// Platform bindings for [`poll(2)`][`nix::poll::poll`]
///
/// Unlike `select`, this does not care about the largest descriptor and has
/// no `FD_SETSIZE` ceiling.
#[derive(Debug, Clone, Copy, Default)]
pub struct PollMultiplexer {
    interest: Interest,
}

impl PollMultiplexer {
    pub fn new(interest: Interest) -> Self {
        Self { interest }
    }

    fn flags(&self) -> PollFlags {
        match self.interest {
            Interest::Readable => PollFlags::POLLIN,
            Interest::Priority => PollFlags::POLLPRI,
        }
    }
}

impl Multiplexer for PollMultiplexer {
    fn wait(
        &mut self,
        _max_fd: RawFd,
        fds: &[RawFd],
        timeout: Duration,
    ) -> Result<ReadySet, Errno> {
        let events = self.flags();
        let mut polled: Vec<PollFd> = fds.iter().map(|fd| PollFd::new(*fd, events)).collect();

        let timeout = timeout.as_millis().min(i32::MAX as u128) as i32;

        match poll(&mut polled, timeout) {
            Ok(0) | Err(Errno::EINTR) => return Ok(ReadySet::new()),
            Ok(_) => {}
            Err(e) => return Err(e),
        }

        // POLLERR accompanies POLLPRI on sysfs value files, and a descriptor
        // closed underneath us shows up as POLLNVAL. Both are surfaced so the
        // following read can sort it out.
        let wanted = events | PollFlags::POLLERR | PollFlags::POLLHUP | PollFlags::POLLNVAL;

        Ok(fds
            .iter()
            .zip(polled.iter())
            .filter(|(_, p)| p.revents().map_or(false, |r| r.intersects(wanted)))
            .map(|(fd, _)| *fd)
            .collect())
    }
}
