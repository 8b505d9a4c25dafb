// Copyright (c) 2023 Jonathan "Razordor" Alan Thomason
use syn::punctuated::Punctuated;
use syn::{spanned::Spanned, *};

pub struct AttrData {
	pub library: syn::Path,
}

impl TryFrom<Punctuated<Expr, Token!(,)>> for AttrData {
	type Error = syn::Error;
	fn try_from(value: Punctuated<Expr, Token!(,)>) -> Result<Self> {
		let mut maybe_library: Option<syn::Path> = None;
		let mut errors = vec![];
		const EXPECTED_KW: &str = "Expected `library`.";

		for expr in value.iter() {
			match expr {
				Expr::Assign(assign) => {
					let (assign_left, assign_right) = (assign.left.as_ref(), assign.right.as_ref());

					let Expr::Path(ExprPath { path, .. }) = assign_left else {
						errors.push(Error::new(assign_left.span(), EXPECTED_KW));
						continue;
					};
					if path.is_ident("library") {
						// Branch for syntax: #[bind(library = <path>)]
						match assign_right {
							Expr::Path(ExprPath { path, .. }) => {
								if maybe_library.is_none() {
									maybe_library = Some(path.clone());
								} else {
									errors.push(Error::new(assign.span(), "library is already defined"));
								}
							}
							right => errors.push(Error::new(right.span(), "Expected path.")),
						}
					} else {
						errors.push(Error::new(assign_left.span(), EXPECTED_KW));
					}
				}

				// Branch for everything else.
				expr => errors.push(Error::new(expr.span(), EXPECTED_KW)),
			}
		}

		// if there are any errors this will immediately combine and return early.
		if let Some(mut main_err) = errors.pop() {
			for err in errors {
				main_err.combine(err);
			}
			return Err(main_err);
		}
		match maybe_library {
			Some(library) => Ok(Self { library }),
			None => Err(Error::new(
				value.span(),
				"No library detected. Suggest using: `library = <path>`.",
			)),
		}
	}
}

/// Removes a `#[link_name = "..."]` attribute from `attrs`, returning its value.
pub fn take_link_name(attrs: &mut Vec<Attribute>) -> Result<Option<String>> {
	let Some(index) = attrs.iter().position(|attr| attr.path().is_ident("link_name")) else {
		return Ok(None);
	};
	let attr = attrs.remove(index);
	match &attr.meta {
		Meta::NameValue(MetaNameValue {
			value: Expr::Lit(ExprLit {
				lit: Lit::Str(val), ..
			}),
			..
		}) => Ok(Some(val.value())),
		meta => Err(Error::new(meta.span(), "Expected `link_name = \"<symbol>\"`.")),
	}
}
