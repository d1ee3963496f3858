//! Calendar time values backed by the host C library.
//!
//! This crate wraps the host platform's time primitives -- `clock_gettime`, `mktime`,
//! `localtime_r`, `gmtime_r`, `strftime`, and `strptime` -- behind a small typed API:
//! [`Timestamp`] holds an absolute instant (epoch seconds + microseconds), [`Tm`] holds
//! the broken-down calendar fields, and [`ParsedTm`] carries the result of matching text
//! against a pattern. Conversions, formatting tokens, zone handling, and normalization of
//! out-of-range calendar fields are all whatever the host library defines; this crate adds
//! types and memory safety, not calendar semantics.
//!
//! The deliberate consequence is that nothing here validates field ranges: storing day 40
//! in a [`Tm`] is accepted, and converting it to a [`Timestamp`] rolls the excess into the
//! next month exactly as host `mktime` does.
//!
//! All host calls are confined to a private adapter module; the public types never expose
//! `libc` structures.
//!
//! # Examples
//!
//! Capturing and formatting the current time:
//! ```
//! # use caltime::{Timestamp, Tm};
//! let now = Timestamp::now();
//! let utc = Tm::utc(now).unwrap();
//! let text = utc.strftime("%Y-%m-%d %H:%M:%S").unwrap();
//! assert_eq!(text.len(), 19);
//! ```
//!
//! Parsing text back into calendar fields:
//! ```
//! # use caltime::Tm;
//! let parsed = Tm::strptime("2024-01-15", "%Y-%m-%d");
//! assert_eq!(parsed.nchars, 11); // one past the last matched character
//! assert_eq!((parsed.tm.year, parsed.tm.mon, parsed.tm.day), (2024, 0, 15));
//! ```

pub mod time;
pub mod tm;
mod sys;

pub use time::*;
pub use tm::*;
