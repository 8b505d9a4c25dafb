// Copyright (c) 2023 Jonathan "Razordor" Alan Thomason
use std::fmt;
use std::path::PathBuf;

/// A coarse classification of [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
	PlatformUnsupported,
	LibraryLoad,
	LibraryNotFound,
	SymbolNotFound,
	SymbolLookup,
}

/// Errors produced while loading the native library or binding its functions.
///
/// The first three variants are produced by initialization and are cached, so every later
/// caller observes an identical value. Symbol errors are local to a single binding call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
	#[error("platform `{os}` ({pointer_width}-bit) is not supported")]
	PlatformUnsupported { os: String, pointer_width: u32 },
	#[error("failed to load `{}`: {reason}", .path.display())]
	LibraryLoad { path: PathBuf, reason: String },
	#[error("unable to locate library `{file_name}`. Searched: {}", Searched(.searched))]
	LibraryNotFound {
		file_name: String,
		searched: Vec<PathBuf>,
	},
	#[error("function `{0}` not found")]
	SymbolNotFound(String),
	#[error("lookup of `{name}` failed: {reason}")]
	SymbolLookup { name: String, reason: String },
}

impl Error {
	#[inline]
	pub const fn kind(&self) -> ErrorKind {
		match self {
			Self::PlatformUnsupported { .. } => ErrorKind::PlatformUnsupported,
			Self::LibraryLoad { .. } => ErrorKind::LibraryLoad,
			Self::LibraryNotFound { .. } => ErrorKind::LibraryNotFound,
			Self::SymbolNotFound(_) => ErrorKind::SymbolNotFound,
			Self::SymbolLookup { .. } => ErrorKind::SymbolLookup,
		}
	}

	/// Returns `true` if this error came from loader initialization, and is therefore terminal.
	#[inline]
	pub const fn is_fatal(&self) -> bool {
		matches!(
			self.kind(),
			ErrorKind::PlatformUnsupported | ErrorKind::LibraryLoad | ErrorKind::LibraryNotFound
		)
	}
}

struct Searched<'a>(&'a [PathBuf]);

impl fmt::Display for Searched<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for (i, path) in self.0.iter().enumerate() {
			if i != 0 {
				f.write_str("; ")?;
			}
			write!(f, "{}", path.display())?;
		}
		Ok(())
	}
}
