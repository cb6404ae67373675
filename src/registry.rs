use std::{collections::HashMap, os::unix::prelude::RawFd};

use crate::{bridge::MonitoredPin, events::Pin, heap::FdHeap, log};

/// Pins currently watched by the loop, keyed by descriptor.
///
/// The heap always holds exactly the descriptors present in `pins`.
pub(crate) struct Registry<H> {
    pins: HashMap<RawFd, MonitoredPin<H>>,
    fds: FdHeap<RawFd>,
}

impl<H> Registry<H> {
    pub fn new() -> Self {
        Self {
            pins: HashMap::new(),
            fds: FdHeap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.pins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }

    pub fn max_fd(&self) -> Option<RawFd> {
        self.fds.max()
    }

    /// Registered descriptors, largest first.
    pub fn descending(&self) -> Vec<RawFd> {
        self.fds.descending()
    }

    pub fn find(&self, pin: Pin) -> Option<RawFd> {
        self.pins
            .iter()
            .find(|(_, it)| it.pin == pin)
            .map(|(fd, _)| *fd)
    }

    pub fn get_mut(&mut self, fd: RawFd) -> Option<&mut MonitoredPin<H>> {
        self.pins.get_mut(&fd)
    }

    /// Start watching a pin. A pin number or descriptor that is already
    /// registered is refused and handed back.
    pub fn register(&mut self, entry: MonitoredPin<H>) -> Result<(), MonitoredPin<H>> {
        if self.pins.contains_key(&entry.fd) || self.find(entry.pin).is_some() {
            return Err(entry);
        }

        log::debug!(pin = %entry.pin, fd = entry.fd, "Watching");

        self.fds.push(entry.fd);
        self.pins.insert(entry.fd, entry);

        Ok(())
    }

    pub fn remove_fd(&mut self, fd: RawFd) -> Option<MonitoredPin<H>> {
        let removed = self.pins.remove(&fd)?;

        self.fds.remove(fd);

        log::debug!(pin = %removed.pin, fd, "Stopped watching");

        Some(removed)
    }

    pub fn remove_pin(&mut self, pin: Pin) -> Option<MonitoredPin<H>> {
        let fd = self.find(pin)?;
        self.remove_fd(fd)
    }

    /// Drop every handle, returning how many were released.
    pub fn clear(&mut self) -> usize {
        let count = self.pins.len();

        self.pins.clear();
        self.fds.clear();

        count
    }

    #[cfg(test)]
    pub(crate) fn heap_len(&self) -> usize {
        self.fds.len()
    }
}
