// Copyright (c) 2023 Jonathan "Razordor" Alan Thomason
use super::Handle;
use crate::sym::Symbol;
use std::ffi::{self, CStr, CString};
use std::os::unix::ffi::OsStrExt;

#[cfg(not(any(target_os = "linux", target_os = "macos", target_env = "gnu")))]
use std::sync;

// `dlerror` is only thread local on some platforms
#[cfg(not(any(target_os = "linux", target_os = "macos", target_env = "gnu")))]
#[inline]
fn dylib_guard<'a>() -> sync::MutexGuard<'a, ()> {
	static LOCK: sync::Mutex<()> = sync::Mutex::new(());
	LOCK.lock().unwrap_or_else(sync::PoisonError::into_inner)
}

#[cfg(any(target_os = "linux", target_os = "macos", target_env = "gnu"))]
struct NoGuard;

#[cfg(any(target_os = "linux", target_os = "macos", target_env = "gnu"))]
#[inline(always)]
fn dylib_guard() -> NoGuard {
	NoGuard
}

unsafe fn dylib_error() -> String {
	let e = libc::dlerror();
	if e.is_null() {
		String::from("unknown dynamic loader error")
	} else {
		CStr::from_ptr(e).to_string_lossy().into_owned()
	}
}

pub(crate) unsafe fn dylib_open(path: &ffi::OsStr) -> Result<Handle, String> {
	let c_str = CString::new(path.as_bytes()).map_err(|e| e.to_string())?;
	let _lock = dylib_guard();
	let _ = libc::dlerror(); // clear existing errors
	let handle = libc::dlopen(c_str.as_ptr(), libc::RTLD_NOW);
	if handle.is_null() {
		Err(dylib_error())
	} else {
		Ok(Handle(handle))
	}
}

pub(crate) unsafe fn dylib_symbol(lib_handle: Handle, name: &CStr) -> Result<Option<Symbol>, String> {
	let _lock = dylib_guard();
	let _ = libc::dlerror(); // clear existing errors
	let addr = libc::dlsym(lib_handle.0, name.as_ptr());
	if addr.is_null() {
		// dlsym reports a missing export through dlerror as well, so it is only traced.
		let reason = dylib_error();
		tracing::trace!(symbol = ?name, %reason, "dlsym returned null");
		Ok(None)
	} else {
		Ok(Symbol::from_ptr(addr))
	}
}
