//! Implementation of #[derive(Identity)]

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    parse_macro_input, parse_quote, Attribute, Data, DeriveInput, Expr, ExprLit, Fields,
    GenericParam, Index, Lit, Meta, Type,
};

/// Marker value that excludes a field; mirrors `destruct::EXCLUDE_SENTINEL`.
const EXCLUDE_SENTINEL: &str = "-";

/// One struct field as seen by the macro.
struct FieldSpec {
    name: String,
    member: TokenStream2,
    ty: Type,
    marker: Option<String>,
}

impl FieldSpec {
    fn is_excluded(&self) -> bool {
        self.marker.as_deref() == Some(EXCLUDE_SENTINEL)
    }

    /// Descriptor of this field with the given child node.
    ///
    /// Excluded fields never reach the dispatcher, so their child is only the
    /// type name and their type needs no `Identity` impl.
    fn descriptor(&self, node: TokenStream2) -> TokenStream2 {
        let FieldSpec { name, ty, marker, .. } = self;
        let marker = marker_tokens(marker);
        let node = if self.is_excluded() {
            quote!(::destruct::Node::value(::destruct::Value::Opaque(
                ::core::any::type_name::<#ty>()
            )))
        } else {
            node
        };
        quote! {
            ::destruct::Field::new(
                #name,
                ::core::any::type_name::<#ty>(),
                #marker,
                #node,
            )
        }
    }
}

pub fn derive_identity_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(mut input: DeriveInput) -> syn::Result<TokenStream2> {
    let fields = match &input.data {
        Data::Struct(data) => collect_fields(&data.fields)?,
        _ => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "Identity can only be derived for structs",
            ))
        }
    };

    // Every type parameter must itself be hashable
    for param in input.generics.params.iter_mut() {
        if let GenericParam::Type(ty) = param {
            ty.bounds.push(parse_quote!(::destruct::Identity));
        }
    }

    let name = &input.ident;
    let name_str = name.to_string();
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let value_fields = fields.iter().map(|field| {
        let member = &field.member;
        field.descriptor(quote!(::destruct::Node::borrowed(&self.#member)))
    });

    // Field zeros are resolved on dispatch, which keeps recursive types finite
    let zero_fields = fields.iter().map(|field| {
        let ty = &field.ty;
        field.descriptor(quote!(::destruct::Node::zero_of::<#ty>()))
    });

    Ok(quote! {
        #[automatically_derived]
        impl #impl_generics ::destruct::Identity for #name #ty_generics #where_clause {
            fn identity_value(&self) -> ::destruct::Value<'_> {
                ::destruct::Value::Struct(::destruct::StructValue::new(
                    #name_str,
                    ::std::vec![#(#value_fields),*],
                ))
            }

            fn zero_value() -> ::core::option::Option<::destruct::Value<'static>> {
                ::core::option::Option::Some(::destruct::Value::Struct(
                    ::destruct::StructValue::new(
                        #name_str,
                        ::std::vec![#(#zero_fields),*],
                    ),
                ))
            }
        }
    })
}

fn collect_fields(fields: &Fields) -> syn::Result<Vec<FieldSpec>> {
    let mut specs = Vec::with_capacity(fields.len());
    for (index, field) in fields.iter().enumerate() {
        let (name, member) = match &field.ident {
            Some(ident) => {
                let name = ident.to_string();
                let name = name.strip_prefix("r#").unwrap_or(&name).to_string();
                (name, quote!(#ident))
            }
            None => {
                let index = Index::from(index);
                (index.index.to_string(), quote!(#index))
            }
        };

        specs.push(FieldSpec {
            name,
            member,
            ty: field.ty.clone(),
            marker: parse_marker(&field.attrs)?,
        });
    }
    Ok(specs)
}

/// Parse `#[identity = "..."]` on a field.
fn parse_marker(attrs: &[Attribute]) -> syn::Result<Option<String>> {
    let mut marker = None;

    for attr in attrs {
        if !attr.path().is_ident("identity") {
            continue;
        }

        let value = match &attr.meta {
            Meta::NameValue(meta) => match &meta.value {
                Expr::Lit(ExprLit {
                    lit: Lit::Str(lit), ..
                }) => lit.value(),
                other => {
                    return Err(syn::Error::new_spanned(
                        other,
                        "expected a string literal: #[identity = \"-\"]",
                    ))
                }
            },
            other => {
                return Err(syn::Error::new_spanned(
                    other,
                    "expected #[identity = \"...\"]",
                ))
            }
        };

        if marker.is_some() {
            return Err(syn::Error::new_spanned(attr, "duplicate #[identity] attribute"));
        }
        marker = Some(value);
    }

    Ok(marker)
}

fn marker_tokens(marker: &Option<String>) -> TokenStream2 {
    match marker {
        Some(value) => quote!(::core::option::Option::Some(#value)),
        None => quote!(::core::option::Option::None),
    }
}
