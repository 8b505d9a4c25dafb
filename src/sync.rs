// Copyright (c) 2023 Jonathan "Razordor" Alan Thomason

use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::load::{self, Handle, Loader};
use crate::locate::{self, Located};
use crate::platform::{Environment, PlatformKind, PlatformProfile};
use crate::sym::{Resolver, Symbol};
use crate::{Error, Result};

/// The outcome of a successful initialization. Never mutated afterwards.
#[derive(Debug)]
pub struct LoaderState<'a> {
	profile: PlatformProfile,
	resolver: Resolver<'a>,
	located: Located,
}

impl LoaderState<'_> {
	#[inline]
	pub fn profile(&self) -> &PlatformProfile {
		&self.profile
	}

	/// The path the library was loaded from.
	#[inline]
	pub fn path(&self) -> &Path {
		&self.located.path
	}

	/// The handle the library was opened with, [`Handle::SENTINEL`] if it is statically linked.
	#[inline]
	pub fn handle(&self) -> Handle {
		self.resolver.handle()
	}

	#[inline]
	pub fn symbol(&self, name: &str) -> Result<Option<Symbol>> {
		self.resolver.resolve(name)
	}
}

/// An object providing access to a lazily loaded native library.
///
/// The first access from any thread detects the platform and searches for the library,
/// exactly once. Concurrent first accesses block until that finishes and all observe the same
/// outcome. A failure is cached and returned to every later caller without retrying.
///
/// # Examples
///
/// ```no_run
/// use freetype_loader::NativeLibrary;
///
/// static HARFBUZZ: NativeLibrary = NativeLibrary::new("harfbuzz");
///
/// type HbVersionString = unsafe extern "C" fn() -> *const std::ffi::c_char;
/// let version = unsafe { HARFBUZZ.require::<HbVersionString>("hb_version_string") }.unwrap();
/// ```
pub struct NativeLibrary<'a> {
	stem: &'a str,
	loader: &'a dyn Loader,
	environment: Option<Environment>,
	state: OnceLock<Result<LoaderState<'a>>>,
}

impl<'a> NativeLibrary<'a> {
	/// Constructs a new `NativeLibrary` for the library called `stem`, e.g. `"freetype"` for
	/// `libfreetype.so` or `freetype.dll`, using the operating system loader.
	#[inline]
	pub const fn new(stem: &'a str) -> Self {
		Self::with_loader(stem, &load::System)
	}

	/// Constructs a new `NativeLibrary` that opens and resolves through `loader`.
	#[inline]
	pub const fn with_loader(stem: &'a str, loader: &'a dyn Loader) -> Self {
		Self {
			stem,
			loader,
			environment: None,
			state: OnceLock::new(),
		}
	}

	/// Replaces the ambient environment used for platform detection.
	#[must_use]
	pub fn with_environment(mut self, environment: Environment) -> Self {
		self.environment = Some(environment);
		self
	}

	#[inline]
	pub const fn stem(&self) -> &'a str {
		self.stem
	}

	/// May block if another thread is currently initializing the library.
	///
	/// A [`Loader`] that panics during initialization is reported as [`Error::LibraryLoad`],
	/// which is cached like any other failure.
	///
	/// # Errors
	///
	/// Returns the initialization error, identical for every caller.
	pub fn state(&self) -> Result<&LoaderState<'a>> {
		match self.state.get_or_init(|| self.try_initialize()) {
			Ok(state) => Ok(state),
			Err(err) => Err(err.clone()),
		}
	}

	/// Gets the state without initializing it.
	///
	/// Returns `None` if the library is uninitialized, or being initialized. This method never
	/// blocks.
	#[inline]
	pub fn get(&self) -> Option<&Result<LoaderState<'a>>> {
		self.state.get()
	}

	// get_or_try_init is unstable, and an unwinding initializer would leave the cell empty.
	fn try_initialize(&self) -> Result<LoaderState<'a>> {
		panic::catch_unwind(AssertUnwindSafe(|| self.initialize())).unwrap_or_else(|payload| {
			let reason = if let Some(msg) = payload.downcast_ref::<&str>() {
				format!("loader panicked: {msg}")
			} else if let Some(msg) = payload.downcast_ref::<String>() {
				format!("loader panicked: {msg}")
			} else {
				String::from("loader panicked")
			};
			let err = Error::LibraryLoad {
				path: PathBuf::from(self.stem),
				reason,
			};
			tracing::error!(library = self.stem, %err, "native library failed to load");
			Err(err)
		})
	}

	fn initialize(&self) -> Result<LoaderState<'a>> {
		let result = match &self.environment {
			Some(environment) => self.load(environment),
			None => self.load(&Environment::current()),
		};
		match &result {
			Ok(state) => tracing::info!(
				library = self.stem,
				path = %state.path().display(),
				platform = %state.profile.kind(),
				"native library loaded"
			),
			Err(err) => tracing::error!(library = self.stem, %err, "native library failed to load"),
		}
		result
	}

	fn load(&self, environment: &Environment) -> Result<LoaderState<'a>> {
		let profile = PlatformProfile::detect(environment, self.stem)?;
		tracing::debug!(?profile, "detected platform");
		let located = locate::locate_and_load(&profile, self.loader)?;
		let resolver = match profile.kind() {
			PlatformKind::StaticLink => Resolver::Static { library: self.stem },
			_ => Resolver::Dynamic {
				loader: self.loader,
				handle: located.handle,
			},
		};
		Ok(LoaderState {
			profile,
			resolver,
			located,
		})
	}

	/// The path the library was loaded from.
	///
	/// This will lazily initialize the library.
	pub fn path(&self) -> Result<&Path> {
		self.state().map(LoaderState::path)
	}

	/// This will lazily initialize the library.
	pub fn profile(&self) -> Result<&PlatformProfile> {
		self.state().map(LoaderState::profile)
	}

	/// Resolves the raw address of `name`.
	///
	/// This will lazily initialize the library. Returns `Ok(None)` if the library has no such
	/// symbol.
	pub fn symbol(&self, name: &str) -> Result<Option<Symbol>> {
		self.state()?.symbol(name)
	}

	/// Binds `name` as the function pointer type `F`.
	///
	/// If the symbol is missing, returns `Ok(None)` when `required` is `false`, and
	/// [`Error::SymbolNotFound`] otherwise.
	///
	/// # Safety
	///
	/// `F` must match the native signature of `name`. This is not verified.
	///
	/// # Examples
	///
	/// ```no_run
	/// use freetype_loader::FREETYPE;
	///
	/// type FtInitFreeType = unsafe extern "C" fn(*mut *mut std::ffi::c_void) -> i32;
	/// let init = unsafe { FREETYPE.function::<FtInitFreeType>("FT_Init_FreeType", false) };
	/// ```
	pub unsafe fn function<F: Copy>(&self, name: &str, required: bool) -> Result<Option<F>> {
		match self.symbol(name)? {
			Some(symbol) => Ok(Some(symbol.cast::<F>())),
			None if required => Err(Error::SymbolNotFound(name.to_owned())),
			None => Ok(None),
		}
	}

	/// Binds `name` as the function pointer type `F`, failing if it is missing.
	///
	/// # Safety
	///
	/// `F` must match the native signature of `name`. This is not verified.
	#[inline]
	pub unsafe fn require<F: Copy>(&self, name: &str) -> Result<F> {
		match self.function::<F>(name, true)? {
			Some(function) => Ok(function),
			None => Err(Error::SymbolNotFound(name.to_owned())),
		}
	}
}

impl std::fmt::Debug for NativeLibrary<'_> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("NativeLibrary")
			.field("stem", &self.stem)
			.field("environment", &self.environment)
			.field("state", &self.state)
			.finish_non_exhaustive()
	}
}
