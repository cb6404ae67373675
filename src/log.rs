//! Logging facade. Forwards to `tracing` when the `tracing` feature is on and
//! swallows everything otherwise.

cfg_if::cfg_if! {
    if #[cfg(feature = "tracing")] {
        pub(crate) use tracing_impl::{debug, error, info, trace, warn};
    } else {
        macro_rules! discard {
            ($($tt:tt)*) => {{}};
        }

        pub(crate) use discard as debug;
        pub(crate) use discard as error;
        pub(crate) use discard as info;
        pub(crate) use discard as trace;
        pub(crate) use discard as warn;
    }
}
