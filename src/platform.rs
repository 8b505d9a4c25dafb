// Copyright (c) 2023 Jonathan "Razordor" Alan Thomason

//! Platform detection.
//!
//! A [`PlatformProfile`] is a pure function of an [`Environment`] and a library stem, so the
//! whole search can be reproduced on any host by constructing the environment by hand.

use std::path::{Path, PathBuf};
use std::{env, fmt};

use crate::error::Error;
use crate::Result;

/// The ambient facts platform detection depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
	/// Operating system identity, spelled like [`std::env::consts::OS`].
	pub os: String,
	/// Process bitness.
	pub pointer_width: u32,
	/// Whether the process runs as a packaged (universal) Windows app.
	pub packaged: bool,
	/// Directory the package-relative search starts from.
	pub base_dir: PathBuf,
}

impl Environment {
	/// Captures the environment of the running process.
	///
	/// `base_dir` is the directory of the running executable, or the working directory if
	/// that cannot be determined.
	pub fn current() -> Self {
		let pointer_width = if cfg!(target_pointer_width = "64") {
			64
		} else if cfg!(target_pointer_width = "32") {
			32
		} else {
			16
		};
		Self {
			os: env::consts::OS.to_owned(),
			pointer_width,
			packaged: cfg!(target_vendor = "uwp"),
			base_dir: base_dir(),
		}
	}
}

fn base_dir() -> PathBuf {
	match env::current_exe() {
		Ok(exe) => match exe.parent() {
			Some(dir) => return dir.to_path_buf(),
			None => tracing::warn!(exe = %exe.display(), "executable has no parent directory"),
		},
		Err(err) => tracing::warn!(%err, "unable to resolve the executable path"),
	}
	env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// The loading convention that applies to a platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformKind {
	/// Linux, the BSDs and macOS. Loaded with `dlopen` after a filesystem search.
	DesktopPosix { macos: bool },
	/// Windows desktop. Loaded with `LoadLibraryExW` after a filesystem search.
	DesktopWindows,
	/// Packaged Windows app. Loaded by name from the package.
	WindowsUniversal,
	/// The library is linked into the binary; symbols come from the static registry.
	StaticLink,
	/// Android. Loaded by name with `dlopen`.
	Android,
}

impl PlatformKind {
	#[inline]
	pub const fn is_posix(self) -> bool {
		matches!(self, Self::DesktopPosix { .. } | Self::Android)
	}
}

impl fmt::Display for PlatformKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Self::DesktopPosix { macos: false } => "desktop-posix",
			Self::DesktopPosix { macos: true } => "desktop-posix (macos)",
			Self::DesktopWindows => "desktop-windows",
			Self::WindowsUniversal => "windows-universal",
			Self::StaticLink => "static-link",
			Self::Android => "android",
		})
	}
}

/// Everything the locator needs to know about the running platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformProfile {
	kind: PlatformKind,
	file_name: String,
	// runtime identifier first, then the bitness folder
	arch_tags: Vec<&'static str>,
	base_dir: PathBuf,
}

impl PlatformProfile {
	/// Maps `env` to a profile for the library called `stem`.
	///
	/// # Errors
	///
	/// Returns [`Error::PlatformUnsupported`] if the operating system or bitness is not one
	/// of the known combinations.
	pub fn detect(env: &Environment, stem: &str) -> Result<Self> {
		let unsupported = || Error::PlatformUnsupported {
			os: env.os.clone(),
			pointer_width: env.pointer_width,
		};
		let is_64 = match env.pointer_width {
			64 => true,
			32 => false,
			_ => return Err(unsupported()),
		};

		let (kind, file_name, arch_tags) = match env.os.as_str() {
			"macos" => (
				PlatformKind::DesktopPosix { macos: true },
				format!("lib{stem}.dylib"),
				vec!["osx"],
			),
			"linux" | "freebsd" | "netbsd" | "openbsd" | "dragonfly" | "solaris" | "illumos" => (
				PlatformKind::DesktopPosix { macos: false },
				format!("lib{stem}.so"),
				vec![if is_64 { "linux-x64" } else { "linux-x86" }],
			),
			"windows" if env.packaged => (PlatformKind::WindowsUniversal, format!("{stem}.dll"), vec![]),
			"windows" => (
				PlatformKind::DesktopWindows,
				format!("{stem}.dll"),
				if is_64 {
					vec!["win-x64", "x64"]
				} else {
					vec!["win-x86", "x86"]
				},
			),
			"ios" => (PlatformKind::StaticLink, String::from("__Internal"), vec![]),
			"android" => (PlatformKind::Android, format!("lib{stem}.so"), vec![]),
			_ => return Err(unsupported()),
		};

		Ok(Self {
			kind,
			file_name,
			arch_tags,
			base_dir: env.base_dir.clone(),
		})
	}

	#[inline]
	pub fn kind(&self) -> PlatformKind {
		self.kind
	}

	/// The platform specific library file name, e.g. `libfreetype.so`.
	#[inline]
	pub fn file_name(&self) -> &str {
		&self.file_name
	}

	/// Architecture qualified search subdirectories, in search order.
	#[inline]
	pub fn arch_tags(&self) -> &[&'static str] {
		&self.arch_tags
	}

	#[inline]
	pub fn base_dir(&self) -> &Path {
		&self.base_dir
	}
}
