use std::path::PathBuf;

use displaydoc::Display;
use thiserror::Error;

use crate::events::Pin;

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Top level error that can be used to collect more specific errors yielded by library components
#[derive(Debug, Error, Display)]
pub enum Error {
    /// Could not configure {pin}
    Configure { pin: Pin, source: ConfigError },

    /// Could not read the value of {pin}
    Read { pin: Pin, source: ReadError },

    /// Readiness wait failed, got errno {0}
    Multiplex(#[from] nix::errno::Errno),

    /// Failed to spawn the watcher thread
    Spawn(#[source] std::io::Error),

    /// Watcher loop was closed
    Closed,
}

/// Failure to write one of the sysfs control files for a pin
#[derive(Debug, Error, Display)]
pub enum ConfigError {
    /// Failed to open {path:?}
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to write `{value}` to {path:?}
    Write {
        path: PathBuf,
        value: String,
        source: std::io::Error,
    },
}

/// Failure to read a single value out of a pin's value file
#[derive(Debug, Error, Display)]
pub enum ReadError {
    /// Value file reached end of stream, the pin was most likely unexported
    EndOfStream,

    /// Read inconsistent byte {0:#04x} from the value file
    Inconsistent(u8),

    /// Failed to read the value file
    Io(#[from] std::io::Error),
}

impl ReadError {
    /// Whether the pin behind this read is gone for good, rather than having
    /// failed a single attempt.
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, ReadError::EndOfStream)
    }
}

macro_rules! intoerror {
    () => {};

    ($from:ty => $discriminant:ident ($using:ident); $($rest:tt)*) => {
        impl From<$from> for Error {
            fn from($using: $from) -> Self {
                Self::$discriminant($using)
            }
        }

        intoerror!($($rest)*);
    }
}

intoerror! {
    std::io::Error => Spawn(it);
}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for Error {
    fn from(_: tokio::sync::mpsc::error::SendError<T>) -> Self {
        Self::Closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_doc_comments() {
        let err = Error::Read {
            pin: Pin(17),
            source: ReadError::Inconsistent(b'x'),
        };

        assert_eq!(err.to_string(), "Could not read the value of gpio17");
        assert_eq!(
            ReadError::Inconsistent(b'x').to_string(),
            "Read inconsistent byte 0x78 from the value file"
        );
    }

    #[test]
    fn configure_exposes_source() {
        use std::error::Error as _;

        let err = Error::Configure {
            pin: Pin(4),
            source: ConfigError::Write {
                path: PathBuf::from("/sys/class/gpio/export"),
                value: "4".into(),
                source: std::io::ErrorKind::PermissionDenied.into(),
            },
        };

        let source = err.source().expect("configure errors carry a source");
        assert!(source.to_string().contains("export"));
    }

    #[test]
    fn send_errors_mean_closed() {
        let (tx, rx) = tokio::sync::mpsc::channel::<()>(1);
        drop(rx);

        let err: Error = tx
            .try_send(())
            .map_err(|e| tokio::sync::mpsc::error::SendError(e.into_inner()))
            .unwrap_err()
            .into();

        assert!(matches!(err, Error::Closed));
    }
}
