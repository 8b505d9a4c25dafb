// Copyright (c) 2023 Jonathan "Razordor" Alan Thomason
use quote::*;

use proc_macro::TokenStream as TokenStream1;
use proc_macro2::TokenStream as TokenStream2;
use syn::{parse::Parser, punctuated::Punctuated, spanned::Spanned, Expr, Token};

mod attr_data;
use attr_data::*;

/// Declares functions that are resolved from a `NativeLibrary` on first call.
///
/// ```ignore
/// #[bind(library = FREETYPE)]
/// extern "C" {
///     fn FT_Init_FreeType(alibrary: *mut FT_Library) -> FT_Error;
///     #[link_name = "FT_Done_FreeType"]
///     fn done_freetype(library: FT_Library) -> FT_Error;
/// }
/// ```
///
/// Each function is bound once and cached. A call panics if the library or the symbol is
/// unavailable.
#[proc_macro_attribute]
pub fn bind(args: TokenStream1, input: TokenStream1) -> TokenStream1 {
	let args = TokenStream2::from(args);
	let input = TokenStream2::from(input);
	let foreign_mod = match syn::parse2::<syn::ItemForeignMod>(input) {
		Ok(foreign_mod) => foreign_mod,
		Err(e) => return e.into_compile_error().into(),
	};

	let punct = match Parser::parse2(Punctuated::<Expr, Token!(,)>::parse_separated_nonempty, args) {
		Ok(punct) => punct,
		Err(e) => return e.into_compile_error().into(),
	};
	let library = match AttrData::try_from(punct) {
		Ok(attr) => attr.library,
		Err(e) => {
			return syn::Error::into_compile_error(e).into();
		}
	};
	let mut ret = TokenStream2::new();
	for item in foreign_mod.items {
		use syn::ForeignItem;
		let abi = &foreign_mod.abi;
		match item {
			ForeignItem::Fn(fn_item) => ret.extend(parse_fn(abi, fn_item, &library)),
			other => ret.extend(quote!(#abi {#other})),
		}
	}
	TokenStream1::from(ret)
}

fn parse_fn(abi: &syn::Abi, mut fn_item: syn::ForeignItemFn, library: &syn::Path) -> TokenStream2 {
	if let Some(variadic) = &fn_item.sig.variadic {
		return syn::Error::new(variadic.span(), "variadic functions are unsupported").into_compile_error();
	}
	let link_name = match take_link_name(&mut fn_item.attrs) {
		Ok(Some(link_name)) => link_name,
		Ok(None) => fn_item.sig.ident.to_string(),
		Err(e) => return e.into_compile_error(),
	};
	let fn_name = fn_item.sig.ident.into_token_stream();
	let vis = fn_item.vis.into_token_stream();
	let output = fn_item.sig.output.into_token_stream();

	let fn_attrs: Vec<TokenStream2> = fn_item.attrs.iter().map(syn::Attribute::to_token_stream).collect();

	let mut param_list = Vec::new();
	let mut param_ty_list = Vec::new();
	let mut ty_list = Vec::new();
	for (i, arg) in fn_item.sig.inputs.iter().enumerate() {
		match arg {
			syn::FnArg::Typed(pat_type) => {
				let ty = pat_type.ty.to_token_stream();
				let param_name = match pat_type.pat.as_ref() {
					syn::Pat::Ident(pat_id) => pat_id.ident.to_token_stream(),
					_ => format_ident!("p{}", i).into_token_stream(),
				};
				param_list.push(param_name.clone());
				param_ty_list.push(quote!(#param_name : #ty));
				ty_list.push(ty);
			}
			syn::FnArg::Receiver(rec) => {
				return syn::Error::new(rec.span(), "`self` arguments are unsupported").into_compile_error();
			}
		}
	}

	// According to "The Rustonomicon" foreign functions are assumed unsafe,
	// so functions are implicitly prepended with `unsafe`.
	// The wrapper itself uses the Rust ABI so a failed bind can unwind.
	quote! {
		#(#fn_attrs)*
		#[allow(non_snake_case)]
		#[inline]
		#vis unsafe fn #fn_name (#(#param_ty_list),*) #output {
			// InstFnPtr: instance function pointer type
			type InstFnPtr = unsafe #abi fn (#(#ty_list),*) #output;
			static DYN_FUNC: ::std::sync::OnceLock<InstFnPtr> = ::std::sync::OnceLock::new();
			let function = *DYN_FUNC.get_or_init(|| match unsafe { #library.require::<InstFnPtr>(#link_name) } {
				Ok(function) => function,
				Err(err) => panic!("{}", err),
			});
			function(#(#param_list),*)
		}
	}
}
