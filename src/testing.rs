//! In-memory stand-ins for pin handles and the readiness wait.

use std::{
    collections::VecDeque,
    os::unix::prelude::{AsRawFd, RawFd},
    sync::{Arc, Mutex},
    time::Duration,
};

use nix::errno::Errno;

use crate::{
    binding::{Multiplexer, PinHandle, ReadySet},
    errors::ReadError,
    events::Value,
};

#[derive(Debug)]
struct LineState {
    value: Value,
    failures: VecDeque<ReadError>,
    reads: usize,
    closed: bool,
}

/// Controls a fake value file from the outside.
#[derive(Debug, Clone)]
pub(crate) struct FakeLine {
    fd: RawFd,
    state: Arc<Mutex<LineState>>,
}

impl FakeLine {
    pub fn new(fd: RawFd) -> Self {
        let state = LineState {
            value: Value::Inactive,
            failures: VecDeque::new(),
            reads: 0,
            closed: false,
        };

        Self {
            fd,
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn fd(&self) -> RawFd {
        self.fd
    }

    pub fn handle(&self) -> FakePin {
        FakePin { line: self.clone() }
    }

    pub fn set(&self, value: Value) {
        self.state.lock().unwrap().value = value;
    }

    /// Make the next read fail with `error`.
    pub fn fail_with(&self, error: ReadError) {
        self.state.lock().unwrap().failures.push_back(error);
    }

    pub fn reads(&self) -> usize {
        self.state.lock().unwrap().reads
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().unwrap().closed
    }
}

#[derive(Debug)]
pub(crate) struct FakePin {
    line: FakeLine,
}

impl PinHandle for FakePin {
    fn read_value(&mut self) -> Result<Value, ReadError> {
        let mut state = self.line.state.lock().unwrap();
        state.reads += 1;

        match state.failures.pop_front() {
            Some(e) => Err(e),
            None => Ok(state.value),
        }
    }
}

impl AsRawFd for FakePin {
    fn as_raw_fd(&self) -> RawFd {
        self.line.fd
    }
}

impl Drop for FakePin {
    fn drop(&mut self) {
        self.line.state.lock().unwrap().closed = true;
    }
}

#[derive(Debug, Default)]
struct MuxState {
    bursts: VecDeque<Result<Vec<RawFd>, Errno>>,
    waits: Vec<(RawFd, Vec<RawFd>)>,
}

/// Scripted readiness: each queued burst is returned by one wait. With nothing
/// queued a wait sleeps out its timeout.
#[derive(Debug, Clone, Default)]
pub(crate) struct FakeMux {
    state: Arc<Mutex<MuxState>>,
}

impl FakeMux {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ready(&self, fds: impl IntoIterator<Item = RawFd>) {
        let burst = fds.into_iter().collect();
        self.state.lock().unwrap().bursts.push_back(Ok(burst));
    }

    pub fn fail(&self, errno: Errno) {
        self.state.lock().unwrap().bursts.push_back(Err(errno));
    }

    /// Block until a wait has been issued over `count` descriptors.
    pub fn wait_until_watching(&self, count: usize) {
        let deadline = std::time::Instant::now() + Duration::from_secs(5);

        while std::time::Instant::now() < deadline {
            let watching = self.state.lock().unwrap().waits.last().map(|(_, fds)| fds.len());

            if watching == Some(count) {
                return;
            }

            std::thread::sleep(Duration::from_millis(1));
        }

        panic!("loop never waited on {count} descriptors");
    }

    /// `(max_fd, fds)` of every wait so far.
    pub fn waits(&self) -> Vec<(RawFd, Vec<RawFd>)> {
        self.state.lock().unwrap().waits.clone()
    }
}

impl Multiplexer for FakeMux {
    fn wait(
        &mut self,
        max_fd: RawFd,
        fds: &[RawFd],
        timeout: Duration,
    ) -> Result<ReadySet, Errno> {
        let burst = {
            let mut state = self.state.lock().unwrap();
            state.waits.push((max_fd, fds.to_vec()));
            state.bursts.pop_front()
        };

        match burst {
            Some(Ok(burst)) => Ok(burst.into_iter().filter(|fd| fds.contains(fd)).collect()),
            Some(Err(e)) => Err(e),
            None => {
                std::thread::sleep(timeout);
                Ok(ReadySet::new())
            }
        }
    }
}
