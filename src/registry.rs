// Copyright (c) 2023 Jonathan "Razordor" Alan Thomason

//! Compiled-in symbol registry for platforms where the library is linked into the binary.
//!
//! Entries are collected at link time, so no loader call is involved in resolving them.
//!
//! ```rust
//! use freetype_loader::registry::{self, StaticSymbol};
//!
//! extern "C" fn ft_library_version(_major: *mut i32, _minor: *mut i32, _patch: *mut i32) {}
//!
//! freetype_loader::inventory::submit! {
//!     StaticSymbol::new("freetype", "FT_Library_Version", ft_library_version as *const ())
//! }
//!
//! assert!(registry::entries("freetype").any(|entry| entry.name() == "FT_Library_Version"));
//! ```

use std::ffi::c_void;

use crate::sym::Symbol;

/// A function implementation registered under a library stem and a symbol name.
#[derive(Debug)]
pub struct StaticSymbol {
	library: &'static str,
	name: &'static str,
	addr: *const (),
}

// Only ever points at functions linked into the binary.
unsafe impl Sync for StaticSymbol {}

impl StaticSymbol {
	#[inline]
	pub const fn new(library: &'static str, name: &'static str, addr: *const ()) -> Self {
		Self { library, name, addr }
	}

	#[inline]
	pub const fn library(&self) -> &'static str {
		self.library
	}

	#[inline]
	pub const fn name(&self) -> &'static str {
		self.name
	}
}

inventory::collect!(StaticSymbol);

/// Finds the entry registered for `library` under `name`.
pub(crate) fn find(library: &str, name: &str) -> Option<Symbol> {
	inventory::iter::<StaticSymbol>
		.into_iter()
		.find(|entry| entry.library == library && entry.name == name)
		.and_then(|entry| Symbol::from_ptr(entry.addr.cast::<c_void>().cast_mut()))
}

/// Iterates over every entry registered for `library`.
pub fn entries(library: &str) -> impl Iterator<Item = &'static StaticSymbol> + '_ {
	inventory::iter::<StaticSymbol>
		.into_iter()
		.filter(move |entry| entry.library == library)
}
