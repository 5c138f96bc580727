use fxhash::FxHashSet;
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{Attribute, Data, DeriveInput, Fields, Ident, Type, Variant};

const REJECTION_ATTR: &str = "rejection";

struct VariantMeta<'a> {
    ident: &'a Ident,
    source_ty: Option<&'a Type>,
    source_field: Option<&'a Ident>,
    has_context: bool,
    rejection: bool,
    cfg_attrs: Vec<Attribute>,
}

pub fn expand_derive(mut input: DeriveInput) -> TokenStream {
    let Data::Enum(data) = &mut input.data else {
        return quote! { compile_error!("wed_error can only be applied to enums"); };
    };

    // `#[rejection]` is ours, not thiserror's: record it and strip it before re-emitting.
    let rejections: Vec<bool> = data
        .variants
        .iter_mut()
        .map(|variant| {
            let tagged = variant.attrs.iter().any(|attr| attr.path().is_ident(REJECTION_ATTR));
            variant.attrs.retain(|attr| !attr.path().is_ident(REJECTION_ATTR));
            tagged
        })
        .collect();

    let Data::Enum(data) = &input.data else {
        return quote! { compile_error!("wed_error can only be applied to enums"); };
    };

    let mut variants = Vec::with_capacity(data.variants.len());
    for (variant, rejection) in data.variants.iter().zip(rejections) {
        match parse_variant(variant, rejection) {
            Ok(meta) => variants.push(meta),
            Err(err) => return err,
        }
    }
    if let Some(err) = variants_error(&variants) {
        return err;
    }

    let name = &input.ident;
    let trait_name = format_ident!("{}Ext", name);

    let extra_derives = missing_derives(&input);
    let context_impl = generate_context_trait(name, &trait_name, &variants);
    let from_impls = variants.iter().filter_map(|v| generate_from_impl(name, &trait_name, v));
    let rejection_impl = generate_rejection_impl(name, &variants);

    quote! {
        #[allow(non_shorthand_field_patterns)]
        #extra_derives
        #input

        #context_impl
        #(#from_impls)*
        #rejection_impl

        #[allow(dead_code)]
        fn format_context(context: &Option<std::borrow::Cow<'static, str>>) -> std::borrow::Cow<'static, str> {
            context.as_ref().map_or(std::borrow::Cow::Borrowed(""), |c| std::borrow::Cow::Owned(format!(" ({c})")))
        }
    }
}

fn parse_variant(v: &Variant, rejection: bool) -> Result<VariantMeta<'_>, TokenStream> {
    let cfg_attrs = v.attrs.iter().filter(|attr| attr.path().is_ident("cfg")).cloned().collect();

    let (source_field, has_context) = match &v.fields {
        Fields::Unit => (None, false),
        Fields::Named(fields) => (find_source_field(fields), find_context_field(fields)?.is_some()),
        Fields::Unnamed(_) => {
            return Err(syn::Error::new_spanned(
                v,
                "wed_error requires unit variants or named fields; tuple variants are not supported",
            )
            .to_compile_error());
        },
    };

    Ok(VariantMeta {
        ident: &v.ident,
        source_ty: source_field.map(|field| &field.ty),
        source_field: source_field.and_then(|field| field.ident.as_ref()),
        has_context,
        rejection,
        cfg_attrs,
    })
}

fn find_context_field(fields: &syn::FieldsNamed) -> Result<Option<&syn::Field>, TokenStream> {
    let Some(field) =
        fields.named.iter().find(|field| field.ident.as_ref().is_some_and(|i| i == "context"))
    else {
        return Ok(None);
    };

    if is_context_type(&field.ty) {
        Ok(Some(field))
    } else {
        Err(syn::Error::new_spanned(&field.ty, "context field must be Option<Cow<'static, str>>")
            .to_compile_error())
    }
}

fn find_source_field(fields: &syn::FieldsNamed) -> Option<&syn::Field> {
    fields.named.iter().find(|field| {
        field.ident.as_ref().is_some_and(|ident| ident == "source")
            || field_has_attr(field, "source")
            || field_has_attr(field, "from")
    })
}

fn missing_derives(input: &DeriveInput) -> TokenStream {
    let derived = derived_trait_names(&input.attrs);
    let mut tokens = Vec::new();
    if !derived.contains("Debug") {
        tokens.push(quote! { Debug });
    }
    if !derived.contains("Error") {
        tokens.push(quote! { ::thiserror::Error });
    }

    if tokens.is_empty() { quote! {} } else { quote! { #[derive(#(#tokens),*)] } }
}

fn generate_context_trait(
    name: &Ident,
    trait_name: &Ident,
    variants: &[VariantMeta<'_>],
) -> TokenStream {
    let arms = variants.iter().filter(|v| v.has_context).map(|v| {
        let cfg_attrs = &v.cfg_attrs;
        let ident = v.ident;
        quote! { #(#cfg_attrs)* #name::#ident { context: c, .. } => *c = Some(context.into()), }
    });

    quote! {
        pub trait #trait_name<T> {
            /// Attaches a human-readable context to the error.
            fn context(self, context: impl Into<std::borrow::Cow<'static, str>>) -> std::result::Result<T, #name>;
        }

        #[automatically_derived]
        impl<T> #trait_name<T> for std::result::Result<T, #name> {
            #[inline]
            fn context(self, context: impl Into<std::borrow::Cow<'static, str>>) -> Self {
                self.map_err(|mut e| {
                    #[allow(unreachable_patterns)]
                    match &mut e {
                        #( #arms )*
                        _ => {}
                    }
                    e
                })
            }
        }
    }
}

fn generate_from_impl(
    name: &Ident,
    trait_name: &Ident,
    v: &VariantMeta<'_>,
) -> Option<TokenStream> {
    let source_ty = v.source_ty?;
    let source_field = v.source_field?;
    let v_ident = v.ident;
    let cfg_attrs = &v.cfg_attrs;

    Some(quote! {
        #(#cfg_attrs)*
        #[automatically_derived]
        impl From<#source_ty> for #name {
            #[inline]
            fn from(#source_field: #source_ty) -> Self { Self::#v_ident { #source_field, context: None } }
        }

        #(#cfg_attrs)*
        impl<T> #trait_name<T> for std::result::Result<T, #source_ty> {
            #[inline]
            fn context(self, context: impl Into<std::borrow::Cow<'static, str>>) -> std::result::Result<T, #name> {
                self.map_err(|#source_field| #name::#v_ident { #source_field, context: Some(context.into()) })
            }
        }
    })
}

fn generate_rejection_impl(name: &Ident, variants: &[VariantMeta<'_>]) -> TokenStream {
    let arms = variants.iter().filter(|v| v.rejection).map(|v| {
        let cfg_attrs = &v.cfg_attrs;
        let ident = v.ident;
        quote! { #(#cfg_attrs)* Self::#ident { .. } => true, }
    });

    quote! {
        #[automatically_derived]
        impl #name {
            /// `true` for outcomes caused by the caller's input, safe to show verbatim.
            #[must_use]
            #[allow(unreachable_patterns)]
            pub const fn is_rejection(&self) -> bool {
                match self {
                    #( #arms )*
                    _ => false,
                }
            }
        }
    }
}

fn field_has_attr(field: &syn::Field, name: &str) -> bool {
    field.attrs.iter().any(|attr| attr.path().is_ident(name))
}

fn derived_trait_names(attrs: &[Attribute]) -> FxHashSet<String> {
    let mut traits = FxHashSet::default();

    for attr in attrs.iter().filter(|attr| attr.path().is_ident("derive")) {
        let _ = attr.parse_nested_meta(|meta| {
            if let Some(segment) = meta.path.segments.last() {
                traits.insert(segment.ident.to_string());
            }
            Ok(())
        });
    }

    traits
}

fn variants_error(variants: &[VariantMeta<'_>]) -> Option<TokenStream> {
    variants.iter().find(|v| v.source_ty.is_some() && !v.has_context).map(|v| {
        syn::Error::new_spanned(
            v.ident,
            "wed_error requires `context: Option<Cow<'static, str>>` for variants with a source",
        )
        .to_compile_error()
    })
}

/// Matches `Option<Cow<'static, str>>` by the last path segment of each type.
fn is_context_type(ty: &Type) -> bool {
    let Some(option) = last_segment(ty).filter(|seg| seg.ident == "Option") else {
        return false;
    };
    let Some(syn::GenericArgument::Type(cow_ty)) = generic_args(option).next() else {
        return false;
    };
    let Some(cow) = last_segment(cow_ty).filter(|seg| seg.ident == "Cow") else {
        return false;
    };

    let mut args = generic_args(cow);
    let static_lifetime = matches!(
        args.next(),
        Some(syn::GenericArgument::Lifetime(lt)) if lt.ident == "static"
    );
    let str_ty = matches!(
        args.next(),
        Some(syn::GenericArgument::Type(inner)) if last_segment(inner).is_some_and(|s| s.ident == "str")
    );

    static_lifetime && str_ty
}

fn last_segment(ty: &Type) -> Option<&syn::PathSegment> {
    let Type::Path(path) = ty else {
        return None;
    };
    path.path.segments.last()
}

fn generic_args(segment: &syn::PathSegment) -> impl Iterator<Item = &syn::GenericArgument> {
    let args = match &segment.arguments {
        syn::PathArguments::AngleBracketed(args) => Some(args.args.iter()),
        _ => None,
    };
    args.into_iter().flatten()
}
