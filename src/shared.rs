use std::sync::Arc;

use crate::{
    binding::PinHandle,
    bridge::{Command, CommandRx, CommandTx, MonitoredPin},
    errors::Result,
    events::Pin,
    log,
    sysfs::Sysfs,
};

/// State shared between every handle onto a single watcher loop.
#[derive(Debug)]
pub(crate) struct SharedState<H> {
    commands: CommandTx<H>,
    sysfs: Sysfs,
}

impl<H> SharedState<H> {
    pub const DEFAULT_CAPACITY: usize = 32;

    pub fn with_capacity(channel_size: usize, sysfs: Sysfs) -> (Arc<Self>, CommandRx<H>) {
        let (commands, rx) = tokio::sync::mpsc::channel(channel_size);

        (Arc::new(Self { commands, sysfs }), rx)
    }

    pub fn sysfs(&self) -> &Sysfs {
        &self.sysfs
    }

    /// Queue an already opened handle for the loop to watch.
    pub fn attach(&self, pin: Pin, handle: H) -> Result<()>
    where
        H: PinHandle,
    {
        self.commands.blocking_send(Self::add(pin, handle))?;

        Ok(())
    }

    pub async fn attach_async(&self, pin: Pin, handle: H) -> Result<()>
    where
        H: PinHandle,
    {
        self.commands.send(Self::add(pin, handle)).await?;

        Ok(())
    }

    fn add(pin: Pin, handle: H) -> Command<H>
    where
        H: PinHandle,
    {
        let fd = handle.as_raw_fd();

        Command::Add(MonitoredPin { pin, fd, handle })
    }

    pub fn remove(&self, pin: Pin) -> Result<()> {
        self.commands.blocking_send(Command::Remove(pin))?;

        Ok(())
    }

    pub async fn remove_async(&self, pin: Pin) -> Result<()> {
        self.commands.send(Command::Remove(pin)).await?;

        Ok(())
    }

    /// Queue a stop behind any pending commands.
    pub fn send_stop(&self) -> bool {
        self.commands.blocking_send(Command::Stop).is_ok()
    }

    pub async fn send_stop_async(&self) -> bool {
        self.commands.send(Command::Stop).await.is_ok()
    }

    /// Like [`send_stop`][Self::send_stop], but never blocks. Used from `Drop`.
    pub fn try_send_stop(&self) -> bool {
        match self.commands.try_send(Command::Stop) {
            Ok(()) => true,
            Err(e) => {
                log::info!("Could not notify watcher of close: {e}");
                false
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }
}

pub(crate) type Shared<H> = Arc<SharedState<H>>;
