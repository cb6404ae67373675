use std::os::unix::prelude::RawFd;

use crate::events::{Notification, Pin};
use tokio::sync::mpsc::{Receiver, Sender};

pub type NotificationTx = Sender<Notification>;
pub type NotificationRx = Receiver<Notification>;

pub type CommandTx<H> = Sender<Command<H>>;
pub type CommandRx<H> = Receiver<Command<H>>;

pub type FatalTx = tokio::sync::oneshot::Sender<crate::errors::Error>;
pub type FatalRx = tokio::sync::oneshot::Receiver<crate::errors::Error>;

/// An open pin on its way into the loop.
#[derive(Debug)]
pub struct MonitoredPin<H> {
    pub pin: Pin,
    pub fd: RawFd,
    pub handle: H,
}

#[derive(Debug)]
pub enum Command<H> {
    Add(MonitoredPin<H>),
    Remove(Pin),
    Stop,
}
