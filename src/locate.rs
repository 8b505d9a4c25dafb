// Copyright (c) 2023 Jonathan "Razordor" Alan Thomason

//! Library discovery.
//!
//! The candidate list is tried by priority, where index `0` is highest. Only the first
//! candidate that exists on disk is opened: if opening it fails the error is returned as is,
//! instead of silently falling back to a later candidate.

use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::load::{Handle, Loader};
use crate::platform::{PlatformKind, PlatformProfile};
use crate::Result;

const POSIX_SYSTEM_DIRS: [&str; 2] = ["/usr/local/lib", "/usr/lib"];

/// A successfully located library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Located {
	pub handle: Handle,
	/// The path that was opened, or the name the library was loaded by.
	pub path: PathBuf,
}

/// Builds the ordered list of paths searched for the library.
///
/// Platforms that load by name, or not at all, have no candidates.
pub fn candidates(profile: &PlatformProfile) -> Vec<PathBuf> {
	let base = profile.base_dir();
	let file_name = profile.file_name();
	let mut paths = Vec::new();
	match profile.kind() {
		PlatformKind::DesktopPosix { .. } => {
			if let Some(rid) = profile.arch_tags().first() {
				paths.push(runtime_path(base, rid, file_name));
			}
			paths.push(base.join(file_name));
			paths.extend(POSIX_SYSTEM_DIRS.iter().map(|dir| Path::new(dir).join(file_name)));
		}
		PlatformKind::DesktopWindows => {
			let mut tags = profile.arch_tags().iter();
			if let Some(rid) = tags.next() {
				paths.push(runtime_path(base, rid, file_name));
			}
			paths.extend(tags.map(|bitness| base.join(bitness).join(file_name)));
			paths.push(base.join(file_name));
		}
		PlatformKind::WindowsUniversal | PlatformKind::StaticLink | PlatformKind::Android => {}
	}
	paths
}

fn runtime_path(base: &Path, rid: &str, file_name: &str) -> PathBuf {
	base.join("runtimes").join(rid).join("native").join(file_name)
}

/// Finds and opens the library described by `profile`.
///
/// # Errors
///
/// * [`Error::LibraryLoad`] if the first existing candidate (or the named library) could not
///   be opened.
/// * [`Error::LibraryNotFound`] if no candidate exists, listing every path that was checked.
pub fn locate_and_load(profile: &PlatformProfile, loader: &dyn Loader) -> Result<Located> {
	match profile.kind() {
		PlatformKind::StaticLink => Ok(Located {
			handle: Handle::SENTINEL,
			path: PathBuf::from(profile.file_name()),
		}),
		PlatformKind::Android => {
			let name = profile.file_name();
			tracing::debug!(name, "opening library by name");
			let handle = unsafe { loader.open(Path::new(name)) }.map_err(|reason| Error::LibraryLoad {
				path: PathBuf::from(name),
				reason,
			})?;
			Ok(Located {
				handle,
				path: PathBuf::from(name),
			})
		}
		PlatformKind::WindowsUniversal => {
			let name = profile.file_name();
			tracing::debug!(name, "opening packaged library");
			let handle = unsafe { loader.open_packaged(name) }.map_err(|reason| Error::LibraryLoad {
				path: PathBuf::from(name),
				reason,
			})?;
			Ok(Located {
				handle,
				path: PathBuf::from("."),
			})
		}
		PlatformKind::DesktopPosix { .. } | PlatformKind::DesktopWindows => search(profile, loader),
	}
}

fn search(profile: &PlatformProfile, loader: &dyn Loader) -> Result<Located> {
	let paths = candidates(profile);
	let found = paths.iter().position(|path| {
		let exists = loader.exists(path);
		if !exists {
			tracing::trace!(path = %path.display(), "candidate does not exist");
		}
		exists
	});
	let Some(index) = found else {
		return Err(Error::LibraryNotFound {
			file_name: profile.file_name().to_owned(),
			searched: paths,
		});
	};

	let path = &paths[index];
	tracing::debug!(path = %path.display(), "opening library");
	match unsafe { loader.open(path) } {
		Ok(handle) => Ok(Located {
			handle,
			path: path.clone(),
		}),
		Err(reason) => Err(Error::LibraryLoad {
			path: path.clone(),
			reason,
		}),
	}
}
