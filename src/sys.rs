//! Host-adapter layer around the C library's calendar routines.
//!
//! This module is the only place that talks to libc directly. It provides a pure mapping
//! between the public calendar model ([`Tm`]) and [`libc::tm`], plus thin wrappers over the
//! host clock reads and the `mktime` / `localtime_r` / `gmtime_r` / `strftime` / `strptime`
//! conversion routines. Everything above this layer is platform-agnostic.
//!
//! The public `year` field holds the full Gregorian year while `libc::tm` counts years from
//! 1900; `to_host` and `from_host` translate between the two. All other integer fields map
//! one to one.

use core::ffi::CStr;
use core::mem::MaybeUninit;
use std::ffi::CString;
use crate::tm::{Dst, Tm};

/// Offset between [`libc::tm::tm_year`] and the full Gregorian year.
pub(crate) const YEAR_BASE: i32 = 1900;

/// Initial `strftime` output buffer size, in bytes.
pub(crate) const STRFTIME_BUF_INITIAL_SIZE: usize = 128;

/// Upper bound on the `strftime` output buffer, in bytes.
///
/// The host reports an undersized buffer by writing zero bytes, which is indistinguishable
/// from a legitimately empty result, so the buffer is doubled and the call retried. The
/// bound keeps that retry loop finite.
pub(crate) const STRFTIME_BUF_MAX_SIZE: usize = 64 * 1024;

unsafe extern "C" {
	/// POSIX time-zone name table, indexed by the DST flag. Maintained by the C runtime,
	/// refreshed by `tzset` and the conversion routines that call it.
	static mut tzname: [*mut libc::c_char; 2];
}

/// A [`libc::tm`] paired with the storage backing its zone-name pointer.
///
/// On hosts where `struct tm` carries a `tm_zone` field, that field points into `_zone`,
/// so the two must stay together for as long as the host may read the struct.
pub(crate) struct HostTm {
	pub tm: libc::tm,
	_zone: Option<CString>
}

// The target list mirrors the hosts whose `struct tm` carries a `tm_zone` field, the
// equivalent of autoconf's HAVE_STRUCT_TM_TM_ZONE.
#[cfg(any(target_os = "linux", target_os = "android", target_os = "macos",
          target_os = "ios", target_os = "freebsd", target_os = "netbsd",
          target_os = "openbsd", target_os = "dragonfly"))]
fn set_zone(t: &mut libc::tm, zone: &CString) {
	t.tm_zone = zone.as_ptr();
}

#[cfg(not(any(target_os = "linux", target_os = "android", target_os = "macos",
              target_os = "ios", target_os = "freebsd", target_os = "netbsd",
              target_os = "openbsd", target_os = "dragonfly")))]
fn set_zone(_t: &mut libc::tm, _zone: &CString) {}

/// Read the zone name directly from the host struct, if it carries one.
#[cfg(any(target_os = "linux", target_os = "android", target_os = "macos",
          target_os = "ios", target_os = "freebsd", target_os = "netbsd",
          target_os = "openbsd", target_os = "dragonfly"))]
fn direct_zone(t: &libc::tm) -> Option<String> {
	if t.tm_zone.is_null() {
		None
	} else {
		// Safety: non-null tm_zone points to a NUL-terminated name, either owned by the C
		// runtime or by the HostTm that produced this struct.
		Some(unsafe { CStr::from_ptr(t.tm_zone) }.to_string_lossy().into_owned())
	}
}

#[cfg(not(any(target_os = "linux", target_os = "android", target_os = "macos",
              target_os = "ios", target_os = "freebsd", target_os = "netbsd",
              target_os = "openbsd", target_os = "dragonfly")))]
fn direct_zone(_t: &libc::tm) -> Option<String> {
	None
}

/// Look up the zone name from the global `tzname` table.
///
/// Only DST flags of 0 and 1 index the table; anything else yields an empty name.
fn tzname_lookup(isdst: i32) -> String {
	if isdst != 0 && isdst != 1 {
		return String::new();
	}
	// Safety: tzname is initialized by the C runtime and holds two NUL-terminated names;
	// the index is 0 or 1, checked above.
	unsafe {
		let table = &raw const tzname;
		let name = (*table)[isdst as usize];
		if name.is_null() {
			String::new()
		} else {
			CStr::from_ptr(name).to_string_lossy().into_owned()
		}
	}
}

/// Zone name for a host struct: the struct's own field when present, the `tzname` table
/// indexed by the DST flag as a fallback, empty otherwise.
fn zone_name(t: &libc::tm) -> String {
	direct_zone(t).unwrap_or_else(|| tzname_lookup(t.tm_isdst))
}

/// Marshal the public calendar model into a host struct.
///
/// Field values are copied as-is with no range checks; out-of-range values are left for the
/// host conversion routines to normalize. A zone name containing an interior NUL cannot be
/// represented and is dropped.
pub(crate) fn to_host(tm: &Tm) -> HostTm {
	// Safety: libc::tm is a plain C struct for which all-zero is a valid value.
	let mut t: libc::tm = unsafe { core::mem::zeroed() };
	t.tm_sec = tm.sec;
	t.tm_min = tm.min;
	t.tm_hour = tm.hour;
	t.tm_mday = tm.day;
	t.tm_mon = tm.mon;
	t.tm_year = tm.year.wrapping_sub(YEAR_BASE);
	t.tm_wday = tm.wday;
	t.tm_yday = tm.yday;
	t.tm_isdst = tm.isdst.to_c();
	let zone = CString::new(tm.zone.as_str()).ok();
	if let Some(z) = &zone {
		set_zone(&mut t, z);
	}
	HostTm { tm: t, _zone: zone }
}

/// Populate the public calendar model from a host struct.
///
/// Microseconds are not part of `struct tm` and start at zero; callers carrying a
/// sub-second component set it afterwards.
pub(crate) fn from_host(t: &libc::tm) -> Tm {
	Tm {
		sec: t.tm_sec,
		min: t.tm_min,
		hour: t.tm_hour,
		day: t.tm_mday,
		mon: t.tm_mon,
		year: t.tm_year.wrapping_add(YEAR_BASE),
		wday: t.tm_wday,
		yday: t.tm_yday,
		isdst: Dst::from_c(t.tm_isdst),
		zone: zone_name(t),
		usec: 0
	}
}

/// Map calendar fields to epoch seconds through host `mktime`.
///
/// The host treats the fields as local time and normalizes out-of-range values in place
/// (day 40 of October becomes November 9). The normalized struct is discarded; only the
/// resulting timestamp is returned.
pub(crate) fn mktime(tm: &Tm) -> i64 {
	let mut host = to_host(tm);
	// Safety: host.tm is fully initialized and mktime only reads the strings it points to
	// for the duration of the call, while host is still alive.
	unsafe { libc::mktime(&mut host.tm) as i64 }
}

/// Convert epoch seconds to broken-down local time.
pub(crate) fn localtime(sec: i64) -> Option<libc::tm> {
	let t = sec as libc::time_t;
	let mut tm = MaybeUninit::<libc::tm>::uninit();
	// Safety:
	// - localtime_r does not read tm, only writes
	// - a non-null return means tm is fully initialized
	unsafe {
		if libc::localtime_r(&t, tm.as_mut_ptr()).is_null() {
			None
		} else {
			Some(tm.assume_init())
		}
	}
}

/// Convert epoch seconds to broken-down UTC time.
pub(crate) fn gmtime(sec: i64) -> Option<libc::tm> {
	let t = sec as libc::time_t;
	let mut tm = MaybeUninit::<libc::tm>::uninit();
	// Safety:
	// - gmtime_r does not read tm, only writes
	// - a non-null return means tm is fully initialized
	unsafe {
		if libc::gmtime_r(&t, tm.as_mut_ptr()).is_null() {
			None
		} else {
			Some(tm.assume_init())
		}
	}
}

/// Render calendar fields through host `strftime`.
///
/// The output buffer starts at [`STRFTIME_BUF_INITIAL_SIZE`] and doubles while the host
/// reports zero bytes written, up to [`STRFTIME_BUF_MAX_SIZE`]. Returns `None` when the
/// bound is reached, which also covers the (rare) pattern whose valid expansion is empty.
pub(crate) fn strftime(tm: &Tm, fmt: &CStr) -> Option<String> {
	let host = to_host(tm);
	let mut size = STRFTIME_BUF_INITIAL_SIZE;
	loop {
		let mut buf = vec![0u8; size];
		// Safety: buf holds `size` writable bytes; strftime writes at most `size` bytes
		// including the terminating NUL and returns how many it wrote, excluding the NUL.
		let written = unsafe {
			libc::strftime(buf.as_mut_ptr() as *mut libc::c_char, size, fmt.as_ptr(), &host.tm)
		};
		if written > 0 {
			buf.truncate(written);
			return Some(String::from_utf8_lossy(&buf).into_owned());
		}
		if size >= STRFTIME_BUF_MAX_SIZE {
			return None;
		}
		size *= 2;
	}
}

/// Match `input` against `fmt` through host `strptime`, filling matched fields of `tm`.
///
/// Returns the 1-based position past the last consumed input byte, or 0 if the host
/// reported no match. Fields the pattern did not reach keep their prior values.
pub(crate) fn strptime(input: &CStr, fmt: &CStr, tm: &mut HostTm) -> usize {
	// Safety: both strings are NUL-terminated, tm.tm is fully initialized, and the
	// returned pointer is either null or points into input.
	unsafe {
		let end = libc::strptime(input.as_ptr(), fmt.as_ptr(), &mut tm.tm);
		if end.is_null() {
			0
		} else {
			end.offset_from(input.as_ptr()) as usize + 1
		}
	}
}

/// Read a clock with nanosecond granularity.
fn clock(id: libc::clockid_t) -> Option<(i64, i64)> {
	let mut time = MaybeUninit::<libc::timespec>::uninit();
	// Safety:
	// - clock_gettime does not read time, only writes
	// - if clock_gettime returns zero, time is successfully initialized
	unsafe {
		match libc::clock_gettime(id, time.as_mut_ptr()) {
			0 => {
				let time = time.assume_init();
				Some((time.tv_sec as i64, time.tv_nsec as i64))
			}
			_ => None
		}
	}
}

/// Read the wall clock as `(seconds, nanoseconds)` since the epoch.
pub(crate) fn realtime() -> Option<(i64, i64)> {
	clock(libc::CLOCK_REALTIME)
}

/// Read the monotonic counter as `(seconds, nanoseconds)` from an arbitrary origin.
pub(crate) fn monotonic() -> Option<(i64, i64)> {
	clock(libc::CLOCK_MONOTONIC)
}

/// Read the wall clock with whole-second granularity.
pub(crate) fn walltime() -> i64 {
	// Safety: a null argument asks time() for the return value only.
	unsafe { libc::time(core::ptr::null_mut()) as i64 }
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn host_roundtrip() {
		let tm = Tm {
			sec: 7,
			min: 50,
			hour: 9,
			day: 17,
			mon: 5,
			year: 2024,
			wday: 1,
			yday: 168,
			isdst: Dst::Daylight,
			zone: String::from("XYZ"),
			usec: 0
		};
		let host = to_host(&tm);
		assert_eq!(host.tm.tm_year, 124);
		assert_eq!(host.tm.tm_isdst, 1);
		let back = from_host(&host.tm);
		assert_eq!(back.year, 2024);
		assert_eq!(back.mon, 5);
		assert_eq!(back.day, 17);
		assert_eq!(back.isdst, Dst::Daylight);
		#[cfg(any(target_os = "linux", target_os = "macos"))]
		assert_eq!(back.zone, "XYZ");
	}

	#[test]
	fn gmtime_epoch() {
		let t = gmtime(0).unwrap();
		let tm = from_host(&t);
		assert_eq!(tm.year, 1970);
		assert_eq!(tm.mon, 0);
		assert_eq!(tm.day, 1);
		assert_eq!(tm.wday, 4);
		assert_eq!(tm.yday, 0);
	}

	#[test]
	fn tzname_bounds() {
		// Flags outside the table never index it
		assert_eq!(tzname_lookup(-1), "");
		assert_eq!(tzname_lookup(2), "");
	}

	#[test]
	fn clocks_agree() {
		let (rt, _) = realtime().unwrap();
		let wt = walltime();
		assert!((rt - wt).abs() <= 1);
	}
}
