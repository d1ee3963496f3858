//! Absolute time: seconds and microseconds since the Unix epoch.
//!
//! [`Timestamp`] wraps an epoch-seconds + microseconds pair. It is created either by
//! capturing the current host time ([`Timestamp::now`]) or by converting broken-down
//! calendar fields through host `mktime` (the `From<&Tm>` impl), which silently
//! normalizes out-of-range fields instead of rejecting them.
//!
//! # Examples
//!
//! ```
//! # use caltime::{Timestamp, Tm};
//! let t = Timestamp::now();
//! assert!(t.sec > 0);
//! assert!(t.usec >= 0 && t.usec < 1000000);
//!
//! // Round trip through local calendar time
//! let t = Timestamp { sec: 1718617807, usec: 500 };
//! let local = Tm::local(t).unwrap();
//! assert_eq!(Timestamp::from(&local), t);
//! ```

use std::sync::OnceLock;
use crate::sys;
use crate::tm::Tm;

/// Unix time with microsecond granularity.
///
/// `usec` is kept in `[0, 1000000)` by [`Timestamp::now`]. Construction from a [`Tm`]
/// copies the source's microseconds verbatim without renormalizing them, matching the host
/// library's behavior of treating the sub-second component as opaque.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Timestamp {
	/// Seconds since the Unix epoch, signed to allow pre-epoch dates
	pub sec: i64,
	/// Microseconds since the beginning of `sec`
	pub usec: i64
}

/// One-time pairing of the monotonic counter with the wall clock.
///
/// Used only when the wall clock cannot be read with sub-second granularity: the counter
/// provides the microseconds and this calibration anchors it to the epoch.
struct Calibration {
	/// Whole-second wall clock reading at calibration
	wall: i64,
	/// Monotonic `(seconds, nanoseconds)` reading taken at the same moment
	mono: (i64, i64)
}

static CALIBRATION: OnceLock<Option<Calibration>> = OnceLock::new();

/// Current time from the monotonic counter and the process-wide calibration.
///
/// The calibration is computed once, on first use, and shared by all threads. Returns
/// `None` if the monotonic counter is unavailable, now or at calibration time.
fn calibrated_now() -> Option<Timestamp> {
	let cal = CALIBRATION
		.get_or_init(|| sys::monotonic().map(|mono| Calibration { wall: sys::walltime(), mono }))
		.as_ref()?;
	let (sec, nsec) = sys::monotonic()?;
	let mut sec = cal.wall + (sec - cal.mono.0);
	let mut usec = (nsec - cal.mono.1) / 1000;
	if usec < 0 {
		sec -= 1;
		usec += 1000000;
	}
	Some(Timestamp { sec, usec })
}

impl Timestamp {
	/// Capture the current time from the highest-resolution clock available.
	///
	/// Tries, in order: the microsecond-resolution wall clock, the monotonic counter
	/// combined with a once-per-process epoch calibration, and finally the whole-second
	/// wall clock with `usec = 0`. Degradation from one rung to the next is silent; this
	/// function never fails.
	///
	/// # Examples
	///
	/// ```
	/// # use caltime::Timestamp;
	/// let t = Timestamp::now();
	/// assert!(t.sec > 0);
	/// ```
	pub fn now() -> Timestamp {
		if let Some((sec, nsec)) = sys::realtime() {
			return Timestamp { sec, usec: nsec / 1000 };
		}
		if let Some(t) = calibrated_now() {
			return t;
		}
		Timestamp { sec: sys::walltime(), usec: 0 }
	}

	/// The default host rendering of this instant's local time, asctime-style.
	///
	/// Equivalent to [`Tm::local`] followed by [`Tm::asctime`][Tm::asctime]. Returns an
	/// empty string in the degenerate case where the host cannot convert the instant.
	pub fn ctime(&self) -> String {
		Tm::local(*self).map(|tm| tm.asctime()).unwrap_or_default()
	}
}

impl From<&Tm> for Timestamp {
	/// Map calendar fields to epoch seconds through host `mktime`.
	///
	/// The fields are interpreted as local time. Out-of-range values are normalized into
	/// the adjacent calendar units rather than rejected: day 40 of October becomes
	/// November 9. The zone name is passed through to the host opaquely where its `tm`
	/// representation supports one, and `usec` is copied verbatim from the source.
	fn from(tm: &Tm) -> Self {
		Timestamp { sec: sys::mktime(tm), usec: tm.usec }
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::tm::Dst;

	#[test]
	fn now_in_range() {
		let t = Timestamp::now();
		assert!(t.sec > 0);
		assert!(t.usec >= 0 && t.usec < 1000000);
	}

	#[test]
	fn calibrated_tracks_wall_clock() {
		let t = calibrated_now().unwrap();
		assert!((t.sec - Timestamp::now().sec).abs() <= 1);
		assert!(t.usec >= 0 && t.usec < 1000000);
	}

	#[test]
	fn local_roundtrip() {
		// Summer and winter instants, away from any DST transition
		for sec in [1718617807, 1704672000, 259200] {
			let t = Timestamp { sec, usec: 123 };
			let local = Tm::local(t).unwrap();
			assert_eq!(Timestamp::from(&local), t, "sec: {}", sec);
		}
	}

	#[test]
	fn mktime_normalizes_overflow() {
		// Day 40 of a 31-day month rolls into the next month: Oct 40 => Nov 9
		let tm = Tm {
			year: 2004,
			mon: 9,
			day: 40,
			hour: 12,
			min: 30,
			isdst: Dst::Unknown,
			..Tm::default()
		};
		let normalized = Tm::local(Timestamp::from(&tm)).unwrap();
		assert_eq!(normalized.year, 2004);
		assert_eq!(normalized.mon, 10);
		assert_eq!(normalized.day, 9);
		assert_eq!(normalized.hour, 12);
		assert_eq!(normalized.min, 30);
	}

	#[test]
	fn usec_copied_verbatim() {
		// From<&Tm> does not renormalize microseconds
		let tm = Tm { year: 2024, day: 1, usec: 2500000, ..Tm::default() };
		assert_eq!(Timestamp::from(&tm).usec, 2500000);
	}

	#[test]
	fn ctime_renders() {
		let s = Timestamp { sec: 1718617807, usec: 0 }.ctime();
		assert!(s.ends_with('\n'));
		assert!(s.contains("2024"));
	}
}
