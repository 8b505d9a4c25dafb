// Copyright (c) 2023 Jonathan "Razordor" Alan Thomason
#![allow(dead_code)]

use std::ffi::{c_void, CStr};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use freetype_loader::platform::Environment;
use freetype_loader::{Handle, Loader, Symbol};

pub extern "C" fn add(a: i32, b: i32) -> i32 {
	a + b
}

pub extern "C" fn negate(a: i32) -> i32 {
	-a
}

pub fn env(os: &str, base_dir: &str) -> Environment {
	Environment {
		os: os.to_owned(),
		pointer_width: 64,
		packaged: false,
		base_dir: PathBuf::from(base_dir),
	}
}

/// A loader over a simulated filesystem that records every call made to it.
#[derive(Debug, Default)]
pub struct FakeFs {
	existing: Vec<PathBuf>,
	open_error: Option<String>,
	open_panic: Option<&'static str>,
	symbol_error: Option<(&'static str, String)>,
	symbols: Vec<(&'static str, usize)>,
	pub checked: Mutex<Vec<PathBuf>>,
	pub opened: Mutex<Vec<PathBuf>>,
	pub packaged: Mutex<Vec<String>>,
	pub opens: AtomicUsize,
}

impl FakeFs {
	pub fn new<P: AsRef<Path>>(existing: &[P]) -> Self {
		Self {
			existing: existing.iter().map(|p| p.as_ref().to_path_buf()).collect(),
			symbols: vec![
				("add", add as *const () as usize),
				("negate", negate as *const () as usize),
			],
			..Self::default()
		}
	}

	pub fn failing_open(mut self, reason: &str) -> Self {
		self.open_error = Some(reason.to_owned());
		self
	}

	pub fn panicking_open(mut self, msg: &'static str) -> Self {
		self.open_panic = Some(msg);
		self
	}

	/// Makes looking up `name` fail with `reason`, as a broken native lookup would.
	pub fn failing_symbol(mut self, name: &'static str, reason: &str) -> Self {
		self.symbol_error = Some((name, reason.to_owned()));
		self
	}

	pub fn checked(&self) -> Vec<PathBuf> {
		self.checked.lock().unwrap().clone()
	}

	pub fn opened(&self) -> Vec<PathBuf> {
		self.opened.lock().unwrap().clone()
	}

	pub fn opens(&self) -> usize {
		self.opens.load(Ordering::SeqCst)
	}
}

unsafe impl Loader for FakeFs {
	fn exists(&self, path: &Path) -> bool {
		self.checked.lock().unwrap().push(path.to_path_buf());
		self.existing.iter().any(|p| p == path)
	}

	unsafe fn open(&self, path: &Path) -> Result<Handle, String> {
		self.opens.fetch_add(1, Ordering::SeqCst);
		self.opened.lock().unwrap().push(path.to_path_buf());
		// widens the window for concurrent first accesses
		std::thread::sleep(Duration::from_millis(20));
		if let Some(msg) = self.open_panic {
			panic!("{msg}");
		}
		match &self.open_error {
			Some(reason) => Err(reason.clone()),
			None => Ok(Handle::from_raw(0x1000 as *mut c_void)),
		}
	}

	unsafe fn open_packaged(&self, name: &str) -> Result<Handle, String> {
		self.opens.fetch_add(1, Ordering::SeqCst);
		self.packaged.lock().unwrap().push(name.to_owned());
		match &self.open_error {
			Some(reason) => Err(reason.clone()),
			None => Ok(Handle::from_raw(0x2000 as *mut c_void)),
		}
	}

	unsafe fn symbol(&self, _: Handle, name: &CStr) -> Result<Option<Symbol>, String> {
		let name = name.to_str().map_err(|e| e.to_string())?;
		if let Some((failing, reason)) = &self.symbol_error {
			if *failing == name {
				return Err(reason.clone());
			}
		}
		Ok(self
			.symbols
			.iter()
			.find(|(sym, _)| *sym == name)
			.and_then(|(_, addr)| Symbol::from_ptr(*addr as *mut c_void)))
	}
}
