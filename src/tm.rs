//! Broken-down calendar time: field access, strftime-style formatting, and
//! strptime-style parsing.
//!
//! [`Tm`] holds the ten calendar fields (second through zone name, plus microseconds) with
//! no range validation anywhere: every field is public and every value is accepted as-is,
//! leaving normalization of out-of-range values to the host conversion routines. Converting
//! `Tm { day: 40, mon: 9, .. }` to a [`Timestamp`] lands nine days into November, exactly
//! as host `mktime` normalizes it.
//!
//! A `Tm` is populated in one of three ways: from a [`Timestamp`] via the local-zone rule
//! ([`Tm::local`]) or the UTC rule ([`Tm::utc`]), or by matching text against a pattern
//! ([`Tm::strptime`], which also reports how much input matched). Field-by-field
//! construction is the fourth option, since all fields are public.
//!
//! # Examples
//!
//! ```
//! # use caltime::{Timestamp, Tm};
//! let tm = Tm::utc(Timestamp { sec: 1718617807, usec: 0 }).unwrap();
//! assert_eq!(tm.strftime("%Y-%m-%dT%H:%M:%S").unwrap(), "2024-06-17T09:50:07");
//!
//! let parsed = Tm::strptime("2024-06-17", "%Y-%m-%d");
//! assert_eq!(parsed.nchars, 11);
//! assert_eq!((parsed.tm.year, parsed.tm.mon, parsed.tm.day), (2024, 5, 17));
//! ```

use std::ffi::CString;
use std::{error, fmt};
use crate::sys;
use crate::time::Timestamp;

/// Daylight-saving flag for a calendar time.
///
/// Mirrors the host's tri-state `tm_isdst` convention: in effect, not in effect, or not
/// known (in which case the host conversion routines decide for themselves).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Dst {
	/// Standard time is in effect.
	Standard,
	/// Daylight-saving time is in effect.
	Daylight,
	/// Not known; host conversions determine it from the zone rules.
	#[default]
	Unknown
}

impl Dst {
	/// The host `tm_isdst` encoding: positive for DST, zero for standard, negative for
	/// unknown.
	pub(crate) fn to_c(self) -> i32 {
		match self {
			Dst::Standard => 0,
			Dst::Daylight => 1,
			Dst::Unknown => -1
		}
	}

	pub(crate) fn from_c(v: i32) -> Dst {
		match v {
			0 => Dst::Standard,
			v if v > 0 => Dst::Daylight,
			_ => Dst::Unknown
		}
	}
}

/// The error type for [`Tm::strftime`].
#[derive(Debug, PartialEq)]
pub enum FormatError {
	/// The pattern contains an interior NUL byte and cannot be passed to the host.
	InvalidPattern,
	/// The rendered output did not fit in the maximum output buffer (64 KiB).
	///
	/// The host reports an undersized buffer and a legitimately empty expansion the same
	/// way, so a valid pattern whose whole expansion is empty also lands here once the
	/// buffer stops growing.
	OutputTooLarge
}

impl fmt::Display for FormatError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			FormatError::InvalidPattern => write!(f, "Format pattern contains a NUL byte"),
			FormatError::OutputTooLarge => write!(f, "Formatted output exceeds the maximum buffer size")
		}
	}
}

impl error::Error for FormatError {}

/// Broken-down calendar time.
///
/// All fields are public and unvalidated: storing month 13 or day 40 is accepted, and the
/// host conversion routines normalize such values when the `Tm` is turned back into a
/// [`Timestamp`]. `wday` and `yday` are derived fields; host conversions fill them in, but
/// `mktime` recomputes them from the date fields rather than trusting them.
///
/// # Examples
///
/// ```
/// # use caltime::{Dst, Timestamp, Tm};
/// let tm = Tm::utc(Timestamp { sec: 0, usec: 42 }).unwrap();
/// assert_eq!(tm.year, 1970);
/// assert_eq!(tm.mon, 0);
/// assert_eq!(tm.day, 1);
/// assert_eq!(tm.wday, 4); // Thursday
/// assert_eq!(tm.yday, 0);
/// assert_eq!(tm.isdst, Dst::Standard);
/// assert_eq!(tm.usec, 42);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Tm {
	/// Seconds, nominally [0, 60] (60 for leap seconds)
	pub sec: i32,
	/// Minutes, nominally [0, 59]
	pub min: i32,
	/// Hours, nominally [0, 23]
	pub hour: i32,
	/// Day of the month, nominally [1, 31]
	pub day: i32,
	/// Month of the year, nominally [0, 11] => [January, December]
	pub mon: i32,
	/// Full Gregorian calendar year, signed
	pub year: i32,
	/// Day of the week, [0, 6] => [Sunday, Saturday]
	pub wday: i32,
	/// Day of the year, [0, 365]
	pub yday: i32,
	/// Whether daylight-saving time is in effect
	pub isdst: Dst,
	/// Time zone name, empty when the host does not report one
	pub zone: String,
	/// Microseconds since the beginning of `sec`
	pub usec: i64
}

/// The result of matching text against a strptime-style pattern.
///
/// Parse failure is signaled through [`nchars`][ParsedTm::nchars] alone; the calendar
/// fields then show whatever partial match the host performed over the zero baseline.
///
/// # Examples
///
/// ```
/// # use caltime::Tm;
/// assert_eq!(Tm::strptime("notadate", "%Y-%m-%d").nchars, 0);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct ParsedTm {
	/// The parsed calendar time
	pub tm: Tm,
	/// 1-based position past the last input character the pattern matched, or 0 if the
	/// parse failed entirely
	pub nchars: usize
}

impl Tm {
	/// Convert a [`Timestamp`] to calendar time in the local zone.
	///
	/// Microseconds are copied verbatim from the source. Returns `None` only when the host
	/// cannot represent the conversion (an epoch value outside its supported range).
	///
	/// # Examples
	///
	/// ```
	/// # use caltime::{Timestamp, Tm};
	/// let t = Timestamp { sec: 1718617807, usec: 123 };
	/// let tm = Tm::local(t).unwrap();
	/// assert_eq!(tm.usec, 123);
	/// // The local conversion inverts through mktime
	/// assert_eq!(Timestamp::from(&tm), t);
	/// ```
	pub fn local(t: Timestamp) -> Option<Tm> {
		let host = sys::localtime(t.sec)?;
		let mut tm = sys::from_host(&host);
		tm.usec = t.usec;
		Some(tm)
	}

	/// Convert a [`Timestamp`] to calendar time in UTC.
	///
	/// Microseconds are copied verbatim from the source. Returns `None` only when the host
	/// cannot represent the conversion.
	///
	/// # Examples
	///
	/// ```
	/// # use caltime::{Timestamp, Tm};
	/// let tm = Tm::utc(Timestamp { sec: 1718617807, usec: 0 }).unwrap();
	/// assert_eq!((tm.hour, tm.min, tm.sec), (9, 50, 7));
	/// ```
	pub fn utc(t: Timestamp) -> Option<Tm> {
		let host = sys::gmtime(t.sec)?;
		let mut tm = sys::from_host(&host);
		tm.usec = t.usec;
		Some(tm)
	}

	/// Render the calendar fields through a strftime-style pattern.
	///
	/// The pattern tokens are whatever the host's `strftime` defines. An empty pattern
	/// returns an empty string without calling the host. The output buffer starts at 128
	/// bytes and doubles while the host reports nothing written, up to a 64 KiB bound;
	/// output that does not fit is reported as [`FormatError::OutputTooLarge`] rather than
	/// retried forever.
	///
	/// # Errors
	///
	/// [`FormatError::InvalidPattern`] if the pattern contains an interior NUL byte, and
	/// [`FormatError::OutputTooLarge`] when the bound is reached (including the ambiguous
	/// case of a pattern whose legitimate expansion is empty).
	///
	/// # Examples
	///
	/// ```
	/// # use caltime::{Timestamp, Tm};
	/// let tm = Tm::utc(Timestamp { sec: 0, usec: 0 }).unwrap();
	/// assert_eq!(tm.strftime("%Y-%m-%d").unwrap(), "1970-01-01");
	/// assert_eq!(tm.strftime("").unwrap(), "");
	/// ```
	pub fn strftime(&self, fmt: &str) -> Result<String, FormatError> {
		if fmt.is_empty() {
			return Ok(String::new());
		}
		let fmt = CString::new(fmt).map_err(|_| FormatError::InvalidPattern)?;
		sys::strftime(self, &fmt).ok_or(FormatError::OutputTooLarge)
	}

	/// Render in the fixed asctime-style layout, `"%a %b %d %H:%M:%S %Y\n"`.
	///
	/// # Examples
	///
	/// ```
	/// # use caltime::{Timestamp, Tm};
	/// let tm = Tm::utc(Timestamp { sec: 1718617807, usec: 0 }).unwrap();
	/// assert_eq!(tm.asctime(), "Mon Jun 17 09:50:07 2024\n");
	/// ```
	pub fn asctime(&self) -> String {
		self.strftime("%a %b %d %H:%M:%S %Y\n").unwrap_or_default()
	}

	/// Match `input` against a strptime-style pattern.
	///
	/// All calendar fields start from a zero baseline (the DST flag at standard time), the
	/// host matcher fills in whatever the pattern reaches, and
	/// [`nchars`][ParsedTm::nchars] records the 1-based position past the last matched
	/// input character. A failed parse is reported only through `nchars == 0` with the
	/// fields showing any partial match; no error is raised. Input or patterns containing
	/// interior NUL bytes cannot be passed to the host and count as failed parses.
	///
	/// # Examples
	///
	/// ```
	/// # use caltime::Tm;
	/// let parsed = Tm::strptime("2024-01-15", "%Y-%m-%d");
	/// assert_eq!(parsed.nchars, 11);
	/// assert_eq!(parsed.tm.year, 2024);
	/// assert_eq!(parsed.tm.mon, 0);
	/// assert_eq!(parsed.tm.day, 15);
	/// ```
	pub fn strptime(input: &str, fmt: &str) -> ParsedTm {
		// Blank calendar baseline: all fields zero, DST flag standard
		let baseline = Tm { isdst: Dst::Standard, ..Tm::default() };
		let (Ok(input), Ok(fmt)) = (CString::new(input), CString::new(fmt)) else {
			return ParsedTm { tm: baseline, nchars: 0 };
		};
		let mut host = sys::to_host(&baseline);
		let nchars = sys::strptime(&input, &fmt, &mut host);
		ParsedTm { tm: sys::from_host(&host.tm), nchars }
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn utc_epoch() {
		let tm = Tm::utc(Timestamp { sec: 0, usec: 42 }).unwrap();
		assert_eq!(tm.sec, 0);
		assert_eq!(tm.min, 0);
		assert_eq!(tm.hour, 0);
		assert_eq!(tm.day, 1);
		assert_eq!(tm.mon, 0);
		assert_eq!(tm.year, 1970);
		assert_eq!(tm.wday, 4); // Thursday
		assert_eq!(tm.yday, 0);
		assert_eq!(tm.isdst, Dst::Standard);
		assert_eq!(tm.usec, 42);
	}

	#[test]
	fn utc_fields() {
		let tm = Tm::utc(Timestamp { sec: 1718617807, usec: 0 }).unwrap();
		assert_eq!(tm.sec, 7);
		assert_eq!(tm.min, 50);
		assert_eq!(tm.hour, 9);
		assert_eq!(tm.day, 17);
		assert_eq!(tm.mon, 5);
		assert_eq!(tm.year, 2024);
		assert_eq!(tm.wday, 1); // Monday
		assert_eq!(tm.yday, 168);
	}

	#[test]
	fn usec_verbatim() {
		// Copied as-is, never renormalized by the conversion
		assert_eq!(Tm::local(Timestamp { sec: 1000, usec: 999999 }).unwrap().usec, 999999);
		assert_eq!(Tm::utc(Timestamp { sec: 1000, usec: 999999 }).unwrap().usec, 999999);
	}

	#[test]
	fn strftime_empty() {
		let tm = Tm::utc(Timestamp { sec: 1718617807, usec: 0 }).unwrap();
		assert_eq!(tm.strftime(""), Ok(String::new()));
	}

	#[test]
	fn strftime_basic() {
		let tm = Tm::utc(Timestamp { sec: 1718617807, usec: 0 }).unwrap();
		assert_eq!(tm.strftime("%Y-%m-%dT%H:%M:%S").unwrap(), "2024-06-17T09:50:07");
		// Literal text passes through untouched
		assert_eq!(tm.strftime("day %d!").unwrap(), "day 17!");
	}

	#[test]
	fn strftime_grows_buffer() {
		let tm = Tm::utc(Timestamp { sec: 1718617807, usec: 0 }).unwrap();
		// 200 * 4 output bytes forces several buffer doublings past the initial 128
		let out = tm.strftime(&"%Y".repeat(200)).unwrap();
		assert_eq!(out.len(), 800);
		assert!(out.starts_with("202420242024"));
	}

	#[test]
	fn strftime_output_bounded() {
		let tm = Tm::utc(Timestamp { sec: 1718617807, usec: 0 }).unwrap();
		// 20000 * 4 output bytes cannot fit in the 64 KiB bound
		assert_eq!(tm.strftime(&"%Y".repeat(20000)), Err(FormatError::OutputTooLarge));
	}

	#[test]
	fn strftime_nul_pattern() {
		let tm = Tm::utc(Timestamp { sec: 1718617807, usec: 0 }).unwrap();
		assert_eq!(tm.strftime("%Y\0%m"), Err(FormatError::InvalidPattern));
	}

	#[test]
	fn asctime_layout() {
		let tm = Tm::utc(Timestamp { sec: 1718617807, usec: 0 }).unwrap();
		assert_eq!(tm.asctime(), "Mon Jun 17 09:50:07 2024\n");
	}

	#[test]
	fn strptime_full_match() {
		let parsed = Tm::strptime("2024-01-15", "%Y-%m-%d");
		assert_eq!(parsed.nchars, 11);
		assert_eq!(parsed.tm.year, 2024);
		assert_eq!(parsed.tm.mon, 0);
		assert_eq!(parsed.tm.day, 15);
		assert_eq!(parsed.tm.usec, 0);
	}

	#[test]
	fn strptime_partial_input() {
		// The pattern is satisfied before the input ends; nchars reports how far it got
		let parsed = Tm::strptime("2024-01-15 leftover", "%Y-%m-%d");
		assert_eq!(parsed.nchars, 11);
		assert_eq!(parsed.tm.day, 15);
	}

	#[test]
	fn strptime_failure() {
		let parsed = Tm::strptime("notadate", "%Y-%m-%d");
		assert_eq!(parsed.nchars, 0);
		// Fields stay at the zero baseline when nothing matched
		assert_eq!(parsed.tm.year, 0);
		assert_eq!(parsed.tm.mon, 0);
		assert_eq!(parsed.tm.day, 0);
		assert_eq!(parsed.tm.isdst, Dst::Standard);
	}

	#[test]
	fn strptime_nul_input() {
		assert_eq!(Tm::strptime("2024\0-01", "%Y-%m").nchars, 0);
		assert_eq!(Tm::strptime("2024-01", "%Y\0%m").nchars, 0);
	}

	#[test]
	fn dst_mapping() {
		assert_eq!(Dst::from_c(0), Dst::Standard);
		assert_eq!(Dst::from_c(1), Dst::Daylight);
		assert_eq!(Dst::from_c(7), Dst::Daylight);
		assert_eq!(Dst::from_c(-1), Dst::Unknown);
		assert_eq!(Dst::Standard.to_c(), 0);
		assert_eq!(Dst::Daylight.to_c(), 1);
		assert_eq!(Dst::Unknown.to_c(), -1);
	}
}
