//! The legacy `/sys/class/gpio` interface.
//!
//! Every pin is configured by writing short ASCII strings into per-pin control
//! files after it has been exported, and its instantaneous value is a single
//! `'0'`/`'1'` byte in `gpioN/value`. Edges are signalled on the value file as
//! an exceptional (`POLLPRI`) condition.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::os::unix::prelude::{AsRawFd, RawFd};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::binding::PinHandle;
use crate::errors::{ConfigError, Error, ReadError, Result};
use crate::events::{edge_setting, Direction, Edge, LogicLevel, Pin, Value};
use crate::log;

/// Location of the sysfs gpio class and how to talk to it.
#[derive(Debug, Clone)]
pub struct Sysfs {
    root: PathBuf,
    settle: Duration,
}

impl Default for Sysfs {
    fn default() -> Self {
        Self {
            root: PathBuf::from(Self::ROOT),
            settle: Self::DEFAULT_SETTLE,
        }
    }
}

impl Sysfs {
    pub const ROOT: &'static str = "/sys/class/gpio";

    /// udev needs a moment to fix up permissions on a freshly exported pin.
    pub const DEFAULT_SETTLE: Duration = Duration::from_millis(10);

    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different root directory (containers, tests).
    pub fn with_root(self, root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..self
        }
    }

    pub fn with_settle(self, settle: Duration) -> Self {
        Self { settle, ..self }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn pin_file(&self, pin: Pin, name: &str) -> PathBuf {
        self.root.join(pin.to_string()).join(name)
    }

    pub fn value_path(&self, pin: Pin) -> PathBuf {
        self.pin_file(pin, "value")
    }

    /// Make `pin` visible in sysfs. Exporting an already exported pin is fine.
    pub fn export(&self, pin: Pin) -> Result<()> {
        let path = self.root.join("export");

        match write_setting(&path, &pin.0.to_string()) {
            Err(ConfigError::Write { ref source, .. })
                if source.raw_os_error() == Some(nix::errno::Errno::EBUSY as i32) =>
            {
                log::debug!(%pin, "Already exported");
            }
            res => res.map_err(|source| Error::Configure { pin, source })?,
        }

        if !self.settle.is_zero() {
            std::thread::sleep(self.settle);
        }

        Ok(())
    }

    pub fn unexport(&self, pin: Pin) -> Result<()> {
        let path = self.root.join("unexport");
        write_setting(&path, &pin.0.to_string()).map_err(|source| Error::Configure { pin, source })
    }

    pub fn set_direction(&self, pin: Pin, direction: Direction) -> Result<()> {
        self.set(pin, "direction", direction.setting())
    }

    pub fn set_edge(&self, pin: Pin, edge: Edge) -> Result<()> {
        self.set(pin, "edge", edge_setting(edge))
    }

    pub fn set_logic_level(&self, pin: Pin, level: LogicLevel) -> Result<()> {
        self.set(pin, "active_low", level.setting())
    }

    fn set(&self, pin: Pin, file: &str, value: &str) -> Result<()> {
        write_setting(&self.pin_file(pin, file), value)
            .map_err(|source| Error::Configure { pin, source })
    }

    /// Export and configure `pin` as an edge-reporting input, then open it.
    pub fn watchable(&self, pin: Pin, edge: Edge, level: LogicLevel) -> Result<SysfsPin> {
        self.export(pin)?;
        self.set_direction(pin, Direction::In)?;
        self.set_edge(pin, edge)?;
        self.set_logic_level(pin, level)?;

        log::debug!(%pin, ?edge, ?level, "Configured");

        self.open(pin, false)
    }

    /// Open the value file of an already configured pin.
    pub fn open(&self, pin: Pin, write: bool) -> Result<SysfsPin> {
        let path = self.value_path(pin);

        let file = OpenOptions::new()
            .read(true)
            .write(write)
            .open(&path)
            .map_err(|source| Error::Configure {
                pin,
                source: ConfigError::Open { path, source },
            })?;

        Ok(SysfsPin { pin, file })
    }

    /// Export `pin` as an input.
    pub fn input(&self, pin: Pin, level: LogicLevel) -> Result<InputPin> {
        self.export(pin)?;
        self.set_direction(pin, Direction::In)?;
        self.set_logic_level(pin, level)?;

        Ok(InputPin {
            inner: self.open(pin, false)?,
            sysfs: self.clone(),
        })
    }

    /// Export `pin` as an output starting at `initial`.
    pub fn output(&self, pin: Pin, initial: Value, level: LogicLevel) -> Result<OutputPin> {
        self.export(pin)?;
        // Logic level first, so `initial` is interpreted with the right polarity.
        self.set_logic_level(pin, level)?;
        self.set_direction(pin, Direction::Out(initial))?;

        Ok(OutputPin {
            inner: self.open(pin, true)?,
            sysfs: self.clone(),
        })
    }
}

fn write_setting(path: &Path, value: &str) -> Result<(), ConfigError> {
    let mut file = OpenOptions::new()
        .write(true)
        .open(path)
        .map_err(|source| ConfigError::Open {
            path: path.to_owned(),
            source,
        })?;

    file.write_all(value.as_bytes())
        .map_err(|source| ConfigError::Write {
            path: path.to_owned(),
            value: value.to_owned(),
            source,
        })
}

/// An open value file for a single pin.
#[derive(Debug)]
pub struct SysfsPin {
    pin: Pin,
    file: File,
}

impl SysfsPin {
    pub fn pin(&self) -> Pin {
        self.pin
    }

    fn write_value(&mut self, value: Value) -> Result<()> {
        let pin = self.pin;

        self.file
            .seek(SeekFrom::Start(0))
            .and_then(|_| self.file.write_all(&[value.as_ascii()]))
            .map_err(|source| Error::Configure {
                pin,
                source: ConfigError::Write {
                    path: PathBuf::from(format!("{pin}/value")),
                    value: value.to_string(),
                    source,
                },
            })
    }
}

impl PinHandle for SysfsPin {
    fn read_value(&mut self) -> Result<Value, ReadError> {
        let mut buf = [0u8; 1];

        self.file.seek(SeekFrom::Start(0))?;

        match self.file.read(&mut buf)? {
            0 => Err(ReadError::EndOfStream),
            _ => Value::from_ascii(buf[0]).ok_or(ReadError::Inconsistent(buf[0])),
        }
    }
}

impl AsRawFd for SysfsPin {
    fn as_raw_fd(&self) -> RawFd {
        self.file.as_raw_fd()
    }
}

/// A pin exported for reading, without edge notifications.
#[derive(Debug)]
pub struct InputPin {
    inner: SysfsPin,
    sysfs: Sysfs,
}

impl InputPin {
    pub fn pin(&self) -> Pin {
        self.inner.pin
    }

    pub fn read(&mut self) -> Result<Value> {
        let pin = self.inner.pin;
        self.inner
            .read_value()
            .map_err(|source| Error::Read { pin, source })
    }

    pub fn set_logic_level(&self, level: LogicLevel) -> Result<()> {
        self.sysfs.set_logic_level(self.inner.pin, level)
    }

    /// Release the value file. The pin stays exported.
    pub fn close(self) {
        drop(self)
    }

    /// Release the value file and unexport the pin.
    pub fn cleanup(self) -> Result<()> {
        let Self { inner, sysfs } = self;
        let pin = inner.pin;

        drop(inner);
        sysfs.unexport(pin)
    }
}

/// A pin exported for writing.
#[derive(Debug)]
pub struct OutputPin {
    inner: SysfsPin,
    sysfs: Sysfs,
}

impl OutputPin {
    pub fn pin(&self) -> Pin {
        self.inner.pin
    }

    pub fn set(&mut self, value: Value) -> Result<()> {
        self.inner.write_value(value)
    }

    pub fn high(&mut self) -> Result<()> {
        self.set(Value::Active)
    }

    pub fn low(&mut self) -> Result<()> {
        self.set(Value::Inactive)
    }

    pub fn set_logic_level(&self, level: LogicLevel) -> Result<()> {
        self.sysfs.set_logic_level(self.inner.pin, level)
    }

    /// Release the value file. The pin stays exported.
    pub fn close(self) {
        drop(self)
    }

    /// Release the value file and unexport the pin.
    pub fn cleanup(self) -> Result<()> {
        let Self { inner, sysfs } = self;
        let pin = inner.pin;

        drop(inner);
        sysfs.unexport(pin)
    }
}
