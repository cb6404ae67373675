use std::sync::Mutex;
use std::thread::JoinHandle;

use crate::binding::PinHandle;
use crate::bridge::{FatalRx, NotificationRx};
use crate::errors::{Error, Result};
use crate::events::{Edge, LogicLevel, Notification, Pin};
use crate::futures::NotificationStream;
use crate::shared::Shared;
use crate::sysfs::SysfsPin;

/// Watcher Instance
///
/// Owns the loop thread and the receiving end of its notifications. Dropping
/// it asks the loop to stop without waiting for it.
pub struct Watcher<H: PinHandle = SysfsPin> {
    pub(crate) close_on_drop: bool,
    pub(crate) inner: WatcherHandle<H>,
    pub(crate) notifications: tokio::sync::Mutex<NotificationRx>,
    pub(crate) fatal: Mutex<FatalRx>,
    pub(crate) jh: Option<JoinHandle<()>>,
}

/// Non-Owning Handle to a Watcher Instance, used to add and remove pins from
/// any thread.
pub struct WatcherHandle<H> {
    pub(crate) shared: Shared<H>,
}

impl<H> Clone for WatcherHandle<H> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<H> std::fmt::Debug for WatcherHandle<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle")
            .field("sysfs", self.shared.sysfs())
            .finish_non_exhaustive()
    }
}

impl Watcher {
    pub fn builder() -> super::builder::WatcherBuilder<super::Platform> {
        super::builder::WatcherBuilder::new()
    }

    /// Start a watcher on the default sysfs root with the default multiplexer.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }
}

impl<H: PinHandle> Watcher<H> {
    /// Block until the next notification.
    ///
    /// Once the loop has stopped this yields the error that stopped it (once),
    /// then [`Error::Closed`].
    ///
    /// Must not be called from within an async runtime, see [`next`][Self::next].
    pub fn watch(&self) -> Result<Notification> {
        match self.notifications.blocking_lock().blocking_recv() {
            Some(notification) => Ok(notification),
            None => Err(self.take_error().unwrap_or(Error::Closed)),
        }
    }

    /// Wait for the next notification.
    pub async fn next(&self) -> Result<Notification> {
        match self.notifications.lock().await.recv().await {
            Some(notification) => Ok(notification),
            None => Err(self.take_error().unwrap_or(Error::Closed)),
        }
    }

    /// Take the error which stopped the loop, if it stopped because of one.
    pub fn take_error(&self) -> Option<Error> {
        self.fatal.lock().ok()?.try_recv().ok()
    }

    /// Wait for the loop thread to exit on it's own, returning the error
    /// that stopped it, if any.
    pub fn join(mut self) -> Result<()> {
        self.close_on_drop = false;

        if let Some(jh) = self.jh.take() {
            if let Err(panic) = jh.join() {
                std::panic::resume_unwind(panic);
            }
        }

        match self.take_error() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Ask the loop to stop and wait for it to release every pin.
    pub fn shutdown(self) -> Result<()> {
        self.inner.close();
        self.join()
    }

    /// Whether the loop thread has exited.
    pub fn is_finished(&self) -> bool {
        self.jh.as_ref().map_or(true, |jh| jh.is_finished())
    }

    /// Turn this instance into a stream of notifications. Dropping the stream
    /// stops the loop, and the error that stopped it moves to
    /// [`NotificationStream::take_error`].
    pub fn into_stream(mut self) -> NotificationStream<H> {
        let (_, closed) = tokio::sync::mpsc::channel(1);
        let recv = std::mem::replace(self.notifications.get_mut(), closed);

        let (_, closed) = tokio::sync::oneshot::channel();
        let fatal = self
            .fatal
            .get_mut()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let fatal = std::mem::replace(fatal, closed);

        self.close_on_drop = false;

        NotificationStream::new(self.inner.clone(), recv, fatal)
    }

    /// Downgrade this owned handle into an unprivledged handle without
    /// stopping the loop (avoiding the close on drop).
    /// This is a one way operation, notifications are no longer received.
    pub fn downgrade(mut self) -> WatcherHandle<H> {
        self.close_on_drop = false;
        self.handle()
    }

    /// Get an unprivledged handle to the Watcher Instance.
    pub fn handle(&self) -> WatcherHandle<H> {
        self.inner.clone()
    }
}

impl<H: PinHandle> WatcherHandle<H> {
    /// Queue an already opened handle for `pin`.
    ///
    /// A pin number which is already watched is refused by the loop and the
    /// new handle is closed.
    pub fn attach(&self, pin: impl Into<Pin>, handle: H) -> Result<()> {
        self.shared.attach(pin.into(), handle)
    }

    /// Stop watching `pin`. Unknown pins are ignored.
    pub fn remove_pin(&self, pin: impl Into<Pin>) -> Result<()> {
        self.shared.remove(pin.into())
    }

    /// Ask the loop to stop once every command queued before this one has
    /// been applied. Does not wait for it, see [`Watcher::join`].
    ///
    /// Returns whether the request reached a running loop.
    pub fn close(&self) -> bool {
        self.shared.send_stop()
    }

    /// [`attach`][Self::attach] for use inside an async runtime.
    pub async fn attach_async(&self, pin: impl Into<Pin>, handle: H) -> Result<()> {
        self.shared.attach_async(pin.into(), handle).await
    }

    /// [`remove_pin`][Self::remove_pin] for use inside an async runtime.
    pub async fn remove_pin_async(&self, pin: impl Into<Pin>) -> Result<()> {
        self.shared.remove_async(pin.into()).await
    }

    /// [`close`][Self::close] for use inside an async runtime.
    pub async fn close_async(&self) -> bool {
        self.shared.send_stop_async().await
    }

    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }
}

impl WatcherHandle<SysfsPin> {
    /// Export `pin` as an input reporting `edge` transitions with the given
    /// polarity, then start watching it.
    pub fn add_pin(
        &self,
        pin: impl Into<Pin>,
        edge: impl Into<Edge>,
        level: LogicLevel,
    ) -> Result<()> {
        if self.is_closed() {
            return Err(Error::Closed);
        }

        let pin = pin.into();
        let handle = self.shared.sysfs().watchable(pin, edge.into(), level)?;

        self.shared.attach(pin, handle)
    }
}

impl<H: PinHandle> std::ops::Deref for Watcher<H> {
    type Target = WatcherHandle<H>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<H: PinHandle> std::fmt::Debug for Watcher<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Watcher")
            .field("close_on_drop", &self.close_on_drop)
            .field("inner", &self.inner)
            .field("finished", &self.is_finished())
            .finish()
    }
}

impl<H: PinHandle> std::ops::Drop for Watcher<H> {
    fn drop(&mut self) {
        if self.close_on_drop {
            self.inner.shared.try_send_stop();
        }
    }
}
