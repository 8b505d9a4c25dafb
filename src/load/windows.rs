// Copyright (c) 2023 Jonathan "Razordor" Alan Thomason
use std::os::windows::ffi::OsStrExt;
use std::{ffi, io, ptr};

use super::Handle;
use crate::sym::Symbol;

mod c;

fn to_wide(path: &ffi::OsStr) -> Vec<u16> {
	path.encode_wide().chain(std::iter::once(0u16)).collect()
}

#[inline]
pub(crate) unsafe fn dylib_open(path: &ffi::OsStr) -> Result<Handle, String> {
	let wide_str: Vec<u16> = to_wide(path);
	// dependencies are searched for next to the library rather than next to the executable.
	let handle = c::LoadLibraryExW(wide_str.as_ptr(), ptr::null_mut(), c::LOAD_WITH_ALTERED_SEARCH_PATH);
	if handle.is_null() {
		Err(io::Error::last_os_error().to_string())
	} else {
		Ok(Handle(handle.cast()))
	}
}

#[inline]
pub(crate) unsafe fn dylib_open_packaged(name: &str) -> Result<Handle, String> {
	let wide_str: Vec<u16> = to_wide(ffi::OsStr::new(name));
	let handle = c::LoadPackagedLibrary(wide_str.as_ptr(), 0);
	if handle.is_null() {
		Err(io::Error::last_os_error().to_string())
	} else {
		Ok(Handle(handle.cast()))
	}
}

#[inline]
pub(crate) unsafe fn dylib_symbol(lib_handle: Handle, name: &ffi::CStr) -> Result<Option<Symbol>, String> {
	let addr = c::GetProcAddress(lib_handle.0.cast(), name.as_ptr());
	if addr.is_null() {
		tracing::trace!(symbol = ?name, error = %io::Error::last_os_error(), "GetProcAddress returned null");
		Ok(None)
	} else {
		Ok(Symbol::from_ptr(addr.cast_mut()))
	}
}
