use proc_macro2;
use syn::{parse_macro_input, parse_quote, Data, DeriveInput, GenericParam, Generics};

mod structs;
use structs::derive_struct;

#[proc_macro_derive(Imprint)]
pub fn imprint(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
	let input = parse_macro_input!(input as DeriveInput);
	imprint_impl(input).into()
}

fn imprint_impl(input: DeriveInput) -> proc_macro2::TokenStream {
	let generics = add_trait_bounds(input.generics);

	match input.data {
		Data::Struct(data) => derive_struct(data, input.ident, generics),
		Data::Enum(_) => {
			panic!("`#[derive(Imprint)]` does not support enums: the engine serializes plain aggregates")
		}
		Data::Union(_) => panic!("`#[derive(Imprint)]` does not support unions"),
	}
}

/// Amend generics to bound every type parameter by `Imprint`: each field of
/// a generic aggregate is recursed into, so each parameter must be
/// recursable itself.
fn add_trait_bounds(mut generics: Generics) -> Generics {
	for param in &mut generics.params {
		if let GenericParam::Type(type_param) = param {
			type_param.bounds.push(parse_quote!(::imprint::Imprint));
		}
	}
	generics
}
