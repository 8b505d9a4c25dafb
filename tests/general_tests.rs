mod common;

use std::path::{Path, PathBuf};

use common::{env, FakeFs};
use freetype_loader::platform::PlatformKind;
use freetype_loader::{Error, ErrorKind, NativeLibrary};

type BinaryFn = unsafe extern "C" fn(i32, i32) -> i32;

#[test]
fn test_bind_and_call() {
	let fs = FakeFs::new(&["/usr/lib/libfreetype.so"]);
	let lib = NativeLibrary::with_loader("freetype", &fs).with_environment(env("linux", "/app"));
	let add = unsafe { lib.function::<BinaryFn>("add", true) }.unwrap().unwrap();
	assert_eq!(unsafe { add(2, 3) }, 5);
	assert_eq!(lib.path().unwrap(), Path::new("/usr/lib/libfreetype.so"));
	assert_eq!(lib.profile().unwrap().kind(), PlatformKind::DesktopPosix { macos: false });
}

#[test]
fn test_missing_symbol() {
	let fs = FakeFs::new(&["/app/libfreetype.so"]);
	let lib = NativeLibrary::with_loader("freetype", &fs).with_environment(env("linux", "/app"));

	let tolerant = unsafe { lib.function::<BinaryFn>("no_such_symbol", false) };
	assert!(matches!(tolerant, Ok(None)));

	let strict = unsafe { lib.function::<BinaryFn>("no_such_symbol", true) };
	assert_eq!(strict.unwrap_err(), Error::SymbolNotFound("no_such_symbol".to_owned()));

	let required = unsafe { lib.require::<BinaryFn>("no_such_symbol") };
	let err = required.unwrap_err();
	assert_eq!(err.kind(), ErrorKind::SymbolNotFound);
	assert!(!err.is_fatal());
	assert_eq!(err.to_string(), "function `no_such_symbol` not found");

	// symbol errors don't poison the library
	assert!(lib.symbol("add").unwrap().is_some());
	assert_eq!(fs.opens(), 1);
}

#[test]
fn test_repeated_bind_is_idempotent() {
	let fs = FakeFs::new(&["/app/libfreetype.so"]);
	let lib = NativeLibrary::with_loader("freetype", &fs).with_environment(env("linux", "/app"));
	let first = lib.symbol("negate").unwrap().unwrap();
	for _ in 0..10 {
		assert_eq!(lib.symbol("negate").unwrap(), Some(first));
	}
	let negate = unsafe { lib.require::<unsafe extern "C" fn(i32) -> i32>("negate") }.unwrap();
	assert_eq!(first.as_ptr() as usize, negate as *const () as usize);
	assert_eq!(fs.opens(), 1);
}

#[test]
fn test_failure_is_cached() {
	let fs = FakeFs::new::<PathBuf>(&[]);
	let lib = NativeLibrary::with_loader("freetype", &fs).with_environment(env("linux", "/app"));
	assert!(lib.get().is_none());

	let first = unsafe { lib.function::<BinaryFn>("add", false) }.unwrap_err();
	assert_eq!(first.kind(), ErrorKind::LibraryNotFound);
	assert!(first.is_fatal());
	let checked = fs.checked().len();

	for _ in 0..5 {
		assert_eq!(unsafe { lib.function::<BinaryFn>("add", false) }.unwrap_err(), first);
		assert_eq!(lib.path().unwrap_err(), first);
	}
	// nothing was searched again
	assert_eq!(fs.checked().len(), checked);
	assert!(matches!(lib.get(), Some(Err(_))));
}

#[test]
fn test_load_failure_is_cached() {
	let fs = FakeFs::new(&["/app/libfreetype.so"]).failing_open("file too short");
	let lib = NativeLibrary::with_loader("freetype", &fs).with_environment(env("linux", "/app"));
	let err = lib.symbol("add").unwrap_err();
	assert_eq!(
		err,
		Error::LibraryLoad {
			path: PathBuf::from("/app/libfreetype.so"),
			reason: "file too short".to_owned(),
		}
	);
	assert_eq!(lib.symbol("add").unwrap_err(), err);
	assert_eq!(fs.opens(), 1);
}

#[test]
fn test_unsupported_platform() {
	let fs = FakeFs::new(&["/app/libfreetype.so"]);
	let lib = NativeLibrary::with_loader("freetype", &fs).with_environment(env("plan9", "/app"));
	for _ in 0..2 {
		let err = unsafe { lib.function::<BinaryFn>("add", true) }.unwrap_err();
		assert_eq!(err.kind(), ErrorKind::PlatformUnsupported);
	}
	assert!(fs.checked().is_empty());
	assert_eq!(fs.opens(), 0);
}

#[test]
fn test_interior_nul_is_a_lookup_error() {
	let fs = FakeFs::new(&["/app/libfreetype.so"]);
	let lib = NativeLibrary::with_loader("freetype", &fs).with_environment(env("linux", "/app"));
	let err = unsafe { lib.function::<BinaryFn>("add\0extra", false) }.unwrap_err();
	assert_eq!(err.kind(), ErrorKind::SymbolLookup);
}

#[test]
fn test_state_accessors() {
	let fs = FakeFs::new(&["/app/runtimes/osx/native/libfreetype.dylib"]);
	let lib = NativeLibrary::with_loader("freetype", &fs).with_environment(env("macos", "/app"));
	let state = lib.state().unwrap();
	assert_eq!(state.path(), Path::new("/app/runtimes/osx/native/libfreetype.dylib"));
	assert_eq!(state.profile().file_name(), "libfreetype.dylib");
	assert!(!state.handle().is_sentinel());
	assert_eq!(lib.stem(), "freetype");
	assert!(matches!(lib.get(), Some(Ok(_))));
}

#[test]
fn test_native_lookup_failure() {
	let fs = FakeFs::new(&["/app/libfreetype.so"]).failing_symbol("FT_Done_Face", "invalid handle");
	let lib = NativeLibrary::with_loader("freetype", &fs).with_environment(env("linux", "/app"));

	// reported even for a tolerant bind, and distinct from a missing symbol
	let err = unsafe { lib.function::<BinaryFn>("FT_Done_Face", false) }.unwrap_err();
	assert_eq!(
		err,
		Error::SymbolLookup {
			name: "FT_Done_Face".to_owned(),
			reason: "invalid handle".to_owned(),
		}
	);
	assert_eq!(err.to_string(), "lookup of `FT_Done_Face` failed: invalid handle");
	assert!(!err.is_fatal());

	// the library stays usable
	let add = unsafe { lib.function::<BinaryFn>("add", false) }.unwrap().unwrap();
	assert_eq!(unsafe { add(1, 1) }, 2);
	assert!(matches!(unsafe { lib.function::<BinaryFn>("no_such_symbol", false) }, Ok(None)));
	assert_eq!(fs.opens(), 1);
}

#[test]
fn test_panicking_loader_is_cached() {
	let fs = FakeFs::new(&["/app/libfreetype.so"]).panicking_open("corrupt loader");
	let lib = NativeLibrary::with_loader("freetype", &fs).with_environment(env("linux", "/app"));
	let err = lib.symbol("add").unwrap_err();
	assert_eq!(
		err,
		Error::LibraryLoad {
			path: PathBuf::from("freetype"),
			reason: "loader panicked: corrupt loader".to_owned(),
		}
	);
	assert!(err.is_fatal());
	assert!(matches!(lib.get(), Some(Err(_))));
	assert_eq!(lib.path().unwrap_err(), err);
	assert_eq!(fs.opens(), 1);
}
