use std::{os::unix::prelude::RawFd, thread::JoinHandle, time::Duration};

use tokio::sync::mpsc::error::{TryRecvError, TrySendError};

use crate::{
    binding::{Multiplexer, PinHandle},
    bridge::{Command, CommandRx, FatalTx, MonitoredPin, NotificationTx},
    errors::{Error, ReadError, Result},
    events::Notification,
    log,
    registry::Registry,
    stats::{Cycle, Stats},
};

/// How long the loop blocks per iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Timing {
    /// Upper bound on a single readiness wait.
    pub wait_timeout: Duration,
    /// Sleep between command drains while no pins are registered.
    pub idle_interval: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            wait_timeout: Duration::from_secs(1),
            idle_interval: Duration::from_secs(1),
        }
    }
}

/// Whether the loop keeps going after an iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flow {
    Continue,
    Stop,
}

pub(crate) struct TaskState<H, M> {
    #[cfg(feature = "tracing")]
    root_span: tracing_impl::Span,
    commands: CommandRx<H>,
    notifications: NotificationTx,
    fatal: Option<FatalTx>,
    registry: Registry<H>,
    stats: Stats,
    cycle: Cycle,
    multiplexer: M,
    timing: Timing,
}

impl<H, M> TaskState<H, M> {
    pub fn new(
        commands: CommandRx<H>,
        notifications: NotificationTx,
        fatal: FatalTx,
        multiplexer: M,
        timing: Timing,
    ) -> Self {
        #[cfg(feature = "tracing")]
        let root_span = tracing_impl::info_span!("gpio_watcher");

        #[cfg(feature = "tracing")]
        root_span.in_scope(|| log::info!("Created"));

        Self {
            #[cfg(feature = "tracing")]
            root_span,
            commands,
            notifications,
            fatal: Some(fatal),
            registry: Registry::new(),
            stats: Stats::new(),
            cycle: Cycle::default(),
            multiplexer,
            timing,
        }
    }
}

impl<H, M> TaskState<H, M>
where
    H: PinHandle + Send + 'static,
    M: Multiplexer + Send + 'static,
{
    /// Run the loop on its own thread.
    pub fn launch(self) -> std::io::Result<JoinHandle<()>> {
        std::thread::Builder::new()
            .name("gpio-watcher".into())
            .spawn(move || self.worker())
    }
}

impl<H, M> TaskState<H, M>
where
    H: PinHandle,
    M: Multiplexer,
{
    fn worker(mut self) {
        #[cfg(feature = "tracing")]
        let _entered = self.root_span.clone().entered();

        log::info!("Starting");

        loop {
            match self.turn() {
                Ok(Flow::Continue) => {}
                Ok(Flow::Stop) => break,
                Err(e) => {
                    log::error!("While waiting for readiness:\n{e}");

                    if let Some(fatal) = self.fatal.take() {
                        let _ = fatal.send(e);
                    }

                    break;
                }
            }
        }

        let released = self.registry.clear();
        log::debug!(released, "Released pins");

        self.stats.record(Cycle::default());

        log::info!("Exiting");
    }

    /// One iteration: wait (or idle), then drain every pending command.
    pub(crate) fn turn(&mut self) -> Result<Flow> {
        self.cycle = Cycle::default();

        if self.registry.is_empty() {
            std::thread::sleep(self.timing.idle_interval);
        } else {
            self.wait_and_notify()?;
        }

        let flow = self.drain();

        self.cycle.watching = self.registry.len();
        self.stats.record(self.cycle);

        Ok(flow)
    }

    fn wait_and_notify(&mut self) -> Result<()> {
        let fds = self.registry.descending();

        let Some(max_fd) = self.registry.max_fd() else {
            return Ok(());
        };

        let ready = self
            .multiplexer
            .wait(max_fd, &fds, self.timing.wait_timeout)
            .map_err(Error::Multiplex)?;

        if !ready.changed() {
            return Ok(());
        }

        self.cycle.ready = ready.len();

        for fd in fds.into_iter().filter(|fd| ready.contains(*fd)) {
            self.service(fd);
        }

        Ok(())
    }

    /// Re-read a ready pin and pass its value on.
    fn service(&mut self, fd: RawFd) {
        let Some(entry) = self.registry.get_mut(fd) else {
            log::info!(fd, "Pin was removed before its readiness could be processed");
            return;
        };

        let pin = entry.pin;

        let res = match entry.handle.read_value() {
            Err(e) if !e.is_end_of_stream() => {
                log::debug!(%pin, "Retrying failed read: {e}");
                entry.handle.read_value()
            }
            res => res,
        };

        match res {
            Ok(value) => self.deliver(Notification { pin, value }),
            Err(ReadError::EndOfStream) => {
                log::info!(%pin, "Value file closed, pin was unexported");
                self.registry.remove_fd(fd);
            }
            Err(source) => {
                let e = Error::Read { pin, source };
                log::warn!("Dropping pin after repeated read failure:\n{e}");
                self.registry.remove_fd(fd);
            }
        }
    }

    /// Hand a notification to consumers without ever waiting on them.
    fn deliver(&mut self, notification: Notification) {
        match self.notifications.try_send(notification) {
            Ok(()) => self.cycle.delivered += 1,
            Err(TrySendError::Full(dropped)) => {
                log::trace!(%dropped, "Notification queue full, dropping");
                self.cycle.dropped += 1;
            }
            Err(TrySendError::Closed(_)) => {
                log::trace!("Notification receiver is gone");
            }
        }
    }

    fn drain(&mut self) -> Flow {
        loop {
            match self.commands.try_recv() {
                Ok(command) => {
                    if self.handle_command(command) == Flow::Stop {
                        log::info!("Close Requested");
                        return Flow::Stop;
                    }
                }
                Err(TryRecvError::Empty) => return Flow::Continue,
                Err(TryRecvError::Disconnected) => {
                    log::info!("Command channel was closed");
                    return Flow::Stop;
                }
            }
        }
    }

    fn handle_command(&mut self, command: Command<H>) -> Flow {
        match command {
            Command::Add(entry) => {
                if let Err(MonitoredPin { pin, fd, .. }) = self.registry.register(entry) {
                    log::warn!(%pin, fd, "Pin is already watched, closing the new handle");
                }
            }

            Command::Remove(pin) => {
                if self.registry.remove_pin(pin).is_none() {
                    log::debug!(%pin, "Remove requested for a pin that is not watched");
                }
            }

            Command::Stop => return Flow::Stop,
        }

        Flow::Continue
    }

    #[cfg(test)]
    pub(crate) fn registry(&self) -> &Registry<H> {
        &self.registry
    }

    #[cfg(test)]
    pub(crate) fn last_cycle(&self) -> Cycle {
        self.cycle
    }
}
