// Copyright (c) 2023 Jonathan "Razordor" Alan Thomason
#![allow(clippy::upper_case_acronyms)]
#![allow(non_snake_case)]

// The windows API conventions are kept deliberately, so it's easier to refer to references.

use std::ffi;
pub use std::os::windows::raw::HANDLE;

pub type HMODULE = HANDLE;
pub type PCWSTR = *const u16;
pub type PCSTR = *const ffi::c_char;
pub type DWORD = u32;

pub const LOAD_WITH_ALTERED_SEARCH_PATH: DWORD = 0x00000008u32;

extern "system" {
	pub fn LoadLibraryExW(lplibfilename: PCWSTR, hfile: HANDLE, dwflags: DWORD) -> HMODULE;
	pub fn LoadPackagedLibrary(lpwlibfilename: PCWSTR, reserved: DWORD) -> HMODULE;
	pub fn GetProcAddress(hmodule: HMODULE, lpprocname: PCSTR) -> *const ffi::c_void;
}
