use proc_macro2::TokenStream;
use quote::{quote, quote_spanned};
use syn::{spanned::Spanned, DataStruct, Field, Fields, Generics, Ident, Index, Member, Type};

pub fn derive_struct(data: DataStruct, ident: Ident, generics: Generics) -> TokenStream {
	let fields: Vec<(Member, &Field)> = match &data.fields {
		Fields::Named(fields) => fields
			.named
			.iter()
			.map(|field| {
				let name = field.ident.clone().expect("missing field name");
				(Member::Named(name), field)
			})
			.collect(),
		Fields::Unnamed(fields) => fields
			.unnamed
			.iter()
			.enumerate()
			.map(|(index, field)| (Member::Unnamed(Index::from(index)), field))
			.collect(),
		Fields::Unit => Vec::new(),
	};

	let imprint_stmts: Vec<TokenStream> = fields
		.iter()
		.map(|(member, field)| {
			quote_spanned! {field.span()=>
				::imprint::Imprint::imprint(&self.#member, ctx)?;
			}
		})
		.collect();

	let restore_stmts: Vec<TokenStream> = fields
		.iter()
		.map(|(member, field)| {
			quote_spanned! {field.span()=>
				::imprint::Imprint::restore(::core::ptr::addr_of_mut!((*ptr).#member), ctx)?;
			}
		})
		.collect();

	let field_count = fields.len();
	let field_types: Vec<&Type> = fields.iter().map(|(_, field)| &field.ty).collect();

	let (impl_generics, type_generics, where_clause) = generics.split_for_impl();

	quote! {
		#[automatically_derived]
		impl #impl_generics ::imprint::Imprint for #ident #type_generics #where_clause {
			fn imprint<__S: ::imprint::Sink>(
				&self,
				ctx: &mut ::imprint::SerContext<'_, __S>,
			) -> ::imprint::Result<()> {
				#(#imprint_stmts)*
				::core::result::Result::Ok(())
			}

			unsafe fn restore(
				ptr: *mut Self,
				ctx: &mut ::imprint::DeserContext<'_>,
			) -> ::imprint::Result<()> {
				unsafe {
					#(#restore_stmts)*
				}
				::core::result::Result::Ok(())
			}

			fn type_hash(hasher: &mut ::imprint::TypeHasher) {
				hasher.update(b"struct");
				hasher.write_usize(::core::mem::size_of::<Self>());
				hasher.write_usize(::core::mem::align_of::<Self>());
				hasher.write_usize(#field_count);
				#(<#field_types as ::imprint::Imprint>::type_hash(hasher);)*
			}
		}
	}
}
