// Copyright (c) 2023 Jonathan "Razordor" Alan Thomason

use std::ffi::{c_void, CStr};
use std::path::Path;
use std::ptr;

use crate::sym::Symbol;

#[cfg(unix)]
mod unix;
#[cfg(windows)]
mod windows;

#[cfg(unix)]
use unix as imp;
#[cfg(windows)]
use windows as imp;

/// An opaque handle to a library opened by a [`Loader`].
///
/// A null handle is the sentinel for "not loaded, resolvable by other means", which is what
/// the statically linked platform produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Handle(*mut c_void);

// internal type is opaque and managed by OS, so it's `Send` and `Sync` safe
unsafe impl Send for Handle {}
unsafe impl Sync for Handle {}

impl Handle {
	pub const SENTINEL: Self = Self(ptr::null_mut());

	#[inline]
	pub const fn from_raw(raw: *mut c_void) -> Self {
		Self(raw)
	}

	#[inline]
	pub const fn as_raw(self) -> *mut c_void {
		self.0
	}

	#[inline]
	pub fn is_sentinel(self) -> bool {
		self.0.is_null()
	}
}

/// Used to specify the run-time linker strategy of a [`NativeLibrary`](crate::NativeLibrary).
///
/// `Loader` can also be used to make custom loaders, or to simulate a filesystem in tests.
///
/// # Safety
///
/// Addresses returned by [`symbol`](Loader::symbol) must stay valid for as long as the handle
/// they were resolved through, which is the rest of the process.
pub unsafe trait Loader: Send + Sync {
	/// Checks whether a candidate exists. Only existing candidates are ever opened.
	fn exists(&self, path: &Path) -> bool {
		path.is_file()
	}

	/// Opens the library at `path`, returning the native loader's error text on failure.
	unsafe fn open(&self, path: &Path) -> Result<Handle, String>;

	/// Opens a library by name from the application package.
	///
	/// Only packaged Windows apps use a distinct call for this, so the default forwards to
	/// [`open`](Loader::open).
	unsafe fn open_packaged(&self, name: &str) -> Result<Handle, String> {
		self.open(Path::new(name))
	}

	/// Retrieves a raw symbol from an opened library.
	///
	/// Returns `Ok(None)` if the library has no such export, and `Err` only if the lookup
	/// itself could not be performed.
	unsafe fn symbol(&self, handle: Handle, name: &CStr) -> Result<Option<Symbol>, String>;
}

/// The operating system's own loader: `dlopen`/`dlsym` on unix, `LoadLibraryExW`/`GetProcAddress`
/// on windows.
#[derive(Debug, Clone, Copy, Default)]
pub struct System;

#[cfg(any(unix, windows))]
unsafe impl Loader for System {
	#[inline]
	unsafe fn open(&self, path: &Path) -> Result<Handle, String> {
		imp::dylib_open(path.as_os_str())
	}

	#[cfg(windows)]
	#[inline]
	unsafe fn open_packaged(&self, name: &str) -> Result<Handle, String> {
		imp::dylib_open_packaged(name)
	}

	#[inline]
	unsafe fn symbol(&self, handle: Handle, name: &CStr) -> Result<Option<Symbol>, String> {
		imp::dylib_symbol(handle, name)
	}
}

#[cfg(not(any(unix, windows)))]
unsafe impl Loader for System {
	fn exists(&self, _: &Path) -> bool {
		false
	}

	unsafe fn open(&self, _: &Path) -> Result<Handle, String> {
		Err(String::from("dynamic loading is not supported on this target"))
	}

	unsafe fn symbol(&self, _: Handle, _: &CStr) -> Result<Option<Symbol>, String> {
		Err(String::from("dynamic loading is not supported on this target"))
	}
}
