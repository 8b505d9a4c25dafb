// Copyright (c) 2023 Jonathan "Razordor" Alan Thomason
use std::ffi::{c_void, CString};
use std::marker::PhantomData;
use std::{fmt, mem, ptr};

use crate::error::Error;
use crate::load::{Handle, Loader};
use crate::{registry, Result};

/// The raw address of a resolved function.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Symbol(ptr::NonNull<c_void>);

// Symbols point into code that is never unloaded.
unsafe impl Send for Symbol {}
unsafe impl Sync for Symbol {}

impl fmt::Debug for Symbol {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Symbol({:p})", self.0)
	}
}

struct AssertFnSize<F>(PhantomData<F>);

impl<F> AssertFnSize<F> {
	const OK: () = assert!(
		mem::size_of::<F>() == mem::size_of::<*const ()>(),
		"bound function type must be pointer sized"
	);
}

impl Symbol {
	/// Returns `None` if `addr` is null.
	#[inline]
	pub fn from_ptr(addr: *mut c_void) -> Option<Self> {
		ptr::NonNull::new(addr).map(Self)
	}

	#[inline]
	pub const fn as_ptr(self) -> *mut c_void {
		self.0.as_ptr()
	}

	/// Reinterprets the address as the function pointer type `F`.
	///
	/// `F` must be pointer sized, which is checked at compile time.
	///
	/// # Safety
	///
	/// The signature is trusted, not verified. Calling the result with a signature that does
	/// not match the native function is undefined behavior.
	#[inline]
	pub unsafe fn cast<F: Copy>(self) -> F {
		#[allow(clippy::let_unit_value)]
		let _ = AssertFnSize::<F>::OK;
		mem::transmute_copy(&self.0)
	}
}

/// Resolves names against whatever produced the [`LoaderState`](crate::sync::LoaderState).
///
/// Exactly one strategy is active per state, chosen when the state is initialized.
pub(crate) enum Resolver<'a> {
	/// `dlsym` or `GetProcAddress` against an opened library, depending on the loader.
	Dynamic { loader: &'a dyn Loader, handle: Handle },
	/// Lookup in the compiled-in registry for `library`.
	Static { library: &'a str },
}

impl Resolver<'_> {
	pub(crate) fn handle(&self) -> Handle {
		match self {
			Self::Dynamic { handle, .. } => *handle,
			Self::Static { .. } => Handle::SENTINEL,
		}
	}

	pub(crate) fn resolve(&self, name: &str) -> Result<Option<Symbol>> {
		let symbol = match self {
			Self::Dynamic { loader, handle } => {
				let c_name = CString::new(name).map_err(|e| Error::SymbolLookup {
					name: name.to_owned(),
					reason: e.to_string(),
				})?;
				unsafe { loader.symbol(*handle, &c_name) }.map_err(|reason| Error::SymbolLookup {
					name: name.to_owned(),
					reason,
				})?
			}
			Self::Static { library } => registry::find(library, name),
		};
		tracing::trace!(name, found = symbol.is_some(), "resolved symbol");
		Ok(symbol)
	}
}

impl fmt::Debug for Resolver<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Dynamic { handle, .. } => f.debug_struct("Dynamic").field("handle", handle).finish_non_exhaustive(),
			Self::Static { library } => f.debug_struct("Static").field("library", library).finish(),
		}
	}
}
