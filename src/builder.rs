use std::time::Duration;

use crate::{
    binding::{Multiplexer, PinHandle},
    errors::Result,
    handle::{Watcher, WatcherHandle},
    shared::SharedState,
    sysfs::Sysfs,
    task::{TaskState, Timing},
    Platform,
};

/// Configuration for a [`Watcher`].
#[derive(Debug, Clone)]
pub struct WatcherBuilder<M> {
    commands: usize,
    notifications: usize,
    timing: Timing,
    sysfs: Sysfs,
    multiplexer: M,
}

impl WatcherBuilder<Platform> {
    pub fn new() -> Self {
        WatcherBuilder {
            commands: SharedState::<()>::DEFAULT_CAPACITY,
            notifications: SharedState::<()>::DEFAULT_CAPACITY,
            timing: Timing::default(),
            sysfs: Sysfs::default(),
            multiplexer: Platform::default(),
        }
    }
}

impl Default for WatcherBuilder<Platform> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> WatcherBuilder<M> {
    /// Pending add/remove/close requests before callers block.
    pub fn with_command_capacity(self, commands: usize) -> Self {
        Self { commands, ..self }
    }

    /// Undelivered notifications kept before new ones are dropped.
    pub fn with_notification_capacity(self, notifications: usize) -> Self {
        Self {
            notifications,
            ..self
        }
    }

    /// Longest single readiness wait, which also bounds how long a queued
    /// command can go unnoticed.
    pub fn with_wait_timeout(mut self, wait_timeout: Duration) -> Self {
        self.timing.wait_timeout = wait_timeout;
        self
    }

    /// How long the loop sleeps between command checks when nothing is watched.
    pub fn with_idle_interval(mut self, idle_interval: Duration) -> Self {
        self.timing.idle_interval = idle_interval;
        self
    }

    pub fn with_sysfs(self, sysfs: Sysfs) -> Self {
        Self { sysfs, ..self }
    }

    pub fn with_multiplexer<N: Multiplexer>(self, multiplexer: N) -> WatcherBuilder<N> {
        WatcherBuilder {
            commands: self.commands,
            notifications: self.notifications,
            timing: self.timing,
            sysfs: self.sysfs,
            multiplexer,
        }
    }

    /// Spawn the loop thread.
    pub fn build<H>(self) -> Result<Watcher<H>>
    where
        H: PinHandle + Send + 'static,
        M: Multiplexer + Send + 'static,
    {
        let (shared, commands) = SharedState::with_capacity(self.commands.max(1), self.sysfs);
        let (notify_tx, notifications) = tokio::sync::mpsc::channel(self.notifications.max(1));
        let (fatal_tx, fatal) = tokio::sync::oneshot::channel();

        let task_state = TaskState::new(
            commands,
            notify_tx,
            fatal_tx,
            self.multiplexer,
            self.timing,
        );

        let jh = task_state.launch()?;

        let inner = WatcherHandle { shared };

        Ok(Watcher {
            close_on_drop: true,
            inner,
            notifications: tokio::sync::Mutex::new(notifications),
            fatal: std::sync::Mutex::new(fatal),
            jh: Some(jh),
        })
    }
}
