//! Logging shims.
//!
//! Each macro forwards to `defmt` when the `defmt` feature is enabled, to the
//! `log` facade when only `log` is enabled, and otherwise type-checks its
//! arguments and does nothing. Arguments are kept to integers and `&str` so
//! that every backend accepts the same format strings.

#![allow(unused_macros)]

macro_rules! trace {
    ($($arg:tt)+) => {{
        #[cfg(feature = "defmt")]
        ::defmt::trace!($($arg)+);
        #[cfg(all(feature = "log", not(feature = "defmt")))]
        ::log::trace!($($arg)+);
        #[cfg(not(any(feature = "log", feature = "defmt")))]
        {
            let _ = ::core::format_args!($($arg)+);
        }
    }};
}

macro_rules! debug {
    ($($arg:tt)+) => {{
        #[cfg(feature = "defmt")]
        ::defmt::debug!($($arg)+);
        #[cfg(all(feature = "log", not(feature = "defmt")))]
        ::log::debug!($($arg)+);
        #[cfg(not(any(feature = "log", feature = "defmt")))]
        {
            let _ = ::core::format_args!($($arg)+);
        }
    }};
}

macro_rules! info {
    ($($arg:tt)+) => {{
        #[cfg(feature = "defmt")]
        ::defmt::info!($($arg)+);
        #[cfg(all(feature = "log", not(feature = "defmt")))]
        ::log::info!($($arg)+);
        #[cfg(not(any(feature = "log", feature = "defmt")))]
        {
            let _ = ::core::format_args!($($arg)+);
        }
    }};
}

macro_rules! warn {
    ($($arg:tt)+) => {{
        #[cfg(feature = "defmt")]
        ::defmt::warn!($($arg)+);
        #[cfg(all(feature = "log", not(feature = "defmt")))]
        ::log::warn!($($arg)+);
        #[cfg(not(any(feature = "log", feature = "defmt")))]
        {
            let _ = ::core::format_args!($($arg)+);
        }
    }};
}

macro_rules! error {
    ($($arg:tt)+) => {{
        #[cfg(feature = "defmt")]
        ::defmt::error!($($arg)+);
        #[cfg(all(feature = "log", not(feature = "defmt")))]
        ::log::error!($($arg)+);
        #[cfg(not(any(feature = "log", feature = "defmt")))]
        {
            let _ = ::core::format_args!($($arg)+);
        }
    }};
}
