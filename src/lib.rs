// Copyright (c) 2023 Jonathan "Razordor" Alan Thomason

//! Run-time loading of the FreeType native library.
//!
//! On first use the running platform is detected, the library is searched for in the
//! package-relative and system locations that platform uses, and the first file found is
//! opened. Functions are then bound by name as typed function pointers with
//! [`load_function`].
//!
//! ```no_run
//! type FtInitFreeType = unsafe extern "C" fn(*mut *mut std::ffi::c_void) -> i32;
//!
//! let init = unsafe { freetype_loader::load_function::<FtInitFreeType>("FT_Init_FreeType", true) }
//!     .unwrap()
//!     .unwrap();
//! println!("loaded {}", freetype_loader::native_library_path().unwrap().display());
//! ```
#![allow(clippy::missing_safety_doc)]

use std::path::Path;

pub mod error;
pub mod load;
pub mod locate;
pub mod platform;
pub mod registry;
pub mod sym;
pub mod sync;

pub use error::{Error, ErrorKind};
pub use freetype_loader_macro::bind;
pub use inventory;
pub use load::{Handle, Loader};
pub use sym::Symbol;
pub use sync::NativeLibrary;

/// The result of a freetype_loader function
pub type Result<T> = std::result::Result<T, Error>;

/// The process-wide FreeType library.
pub static FREETYPE: NativeLibrary<'static> = NativeLibrary::new("freetype");

/// Binds the FreeType function `name` as the function pointer type `F`.
///
/// The library is loaded on the first call from any thread. If the symbol is missing this
/// returns `Ok(None)`, or [`Error::SymbolNotFound`] when `throw_if_missing` is set. If the
/// library failed to load, every call returns that same error.
///
/// # Safety
///
/// `F` must match the native signature of `name`. This is not verified.
#[inline]
pub unsafe fn load_function<F: Copy>(name: &str, throw_if_missing: bool) -> Result<Option<F>> {
	FREETYPE.function(name, throw_if_missing)
}

/// The path FreeType was loaded from.
///
/// This will lazily load the library.
#[inline]
pub fn native_library_path() -> Result<&'static Path> {
	FREETYPE.path()
}
