use fxhash::FxHashSet;
use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::parse::Parser;
use syn::punctuated::Punctuated;
use syn::{Attribute, Expr, ItemFn, ItemStruct, Lit, LitStr, Meta, MetaNameValue, Token};

/// Expands `#[api_model]`: serde derives, optional `ToSchema`, camelCase and strict fields.
pub fn expand_api_model(args: TokenStream, input: ItemStruct) -> TokenStream {
    match model_attrs(args, &input) {
        Ok(attrs) => quote! {
            #attrs
            #input
        },
        Err(err) => err.to_compile_error(),
    }
}

/// Expands `#[api_handler]`: forwards its arguments to `utoipa::path` under the `server` feature.
pub fn expand_api_handler(args: TokenStream, input: ItemFn) -> TokenStream {
    let ItemFn { attrs, vis, sig, block } = input;

    quote! {
        #(#attrs)*
        #[allow(clippy::unused_async)]
        #[cfg_attr(feature = "server", ::utoipa::path(#args))]
        #vis #sig #block
    }
}

#[derive(Default)]
struct ModelArgs {
    rename_all: Option<LitStr>,
    deny_unknown_fields: Option<bool>,
}

#[derive(Default)]
struct ExistingSerde {
    rename_all: Option<LitStr>,
    deny_unknown_fields: bool,
}

fn model_attrs(args: TokenStream, input: &ItemStruct) -> syn::Result<TokenStream> {
    let args = parse_model_args(args)?;
    let derives = derived_trait_names(&input.attrs);
    let existing = existing_serde(&input.attrs)?;

    let mut missing = Vec::new();
    for (name, path) in [
        ("Debug", quote! { Debug }),
        ("Serialize", quote! { ::serde::Serialize }),
        ("Deserialize", quote! { ::serde::Deserialize }),
    ] {
        if !derives.contains(name) {
            missing.push(path);
        }
    }
    let derive = if missing.is_empty() { quote!() } else { quote! { #[derive(#(#missing),*)] } };

    let schema = if derives.contains("ToSchema") {
        quote!()
    } else {
        quote! { #[cfg_attr(feature = "server", derive(::utoipa::ToSchema))] }
    };

    let wanted =
        args.rename_all.unwrap_or_else(|| LitStr::new("camelCase", Span::call_site()));
    let rename = match &existing.rename_all {
        Some(current) if current.value() != wanted.value() => {
            return Err(syn::Error::new_spanned(
                current,
                "conflicting serde rename_all; drop it or pass the same value to api_model",
            ));
        },
        Some(_) => quote!(),
        None => quote! { #[serde(rename_all = #wanted)] },
    };

    let deny = match (existing.deny_unknown_fields, args.deny_unknown_fields.unwrap_or(true)) {
        (true, false) => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "deny_unknown_fields is already set via serde; remove it before disabling",
            ));
        },
        (false, true) => quote! { #[serde(deny_unknown_fields)] },
        _ => quote!(),
    };

    Ok(quote! {
        #derive
        #schema
        #rename
        #deny
    })
}

fn parse_model_args(args: TokenStream) -> syn::Result<ModelArgs> {
    let metas = Punctuated::<Meta, Token![,]>::parse_terminated.parse2(args)?;
    let mut parsed = ModelArgs::default();

    for meta in metas {
        let Meta::NameValue(pair) = meta else {
            return Err(syn::Error::new_spanned(
                meta,
                "expected name-value arguments like `rename_all = \"...\"`",
            ));
        };

        if pair.path.is_ident("rename_all") {
            let Lit::Str(value) = literal(&pair)? else {
                return Err(syn::Error::new_spanned(&pair.value, "rename_all must be a string"));
            };
            reject_duplicate(parsed.rename_all.is_some(), &pair)?;
            parsed.rename_all = Some(value.clone());
        } else if pair.path.is_ident("deny_unknown_fields") {
            let Lit::Bool(value) = literal(&pair)? else {
                return Err(syn::Error::new_spanned(
                    &pair.value,
                    "deny_unknown_fields must be a boolean",
                ));
            };
            reject_duplicate(parsed.deny_unknown_fields.is_some(), &pair)?;
            parsed.deny_unknown_fields = Some(value.value);
        } else {
            return Err(syn::Error::new_spanned(
                pair.path,
                "unsupported argument; expected rename_all or deny_unknown_fields",
            ));
        }
    }

    Ok(parsed)
}

fn literal(pair: &MetaNameValue) -> syn::Result<&Lit> {
    match &pair.value {
        Expr::Lit(expr) => Ok(&expr.lit),
        other => Err(syn::Error::new_spanned(other, "expected a literal")),
    }
}

fn reject_duplicate(seen: bool, pair: &MetaNameValue) -> syn::Result<()> {
    if seen { Err(syn::Error::new_spanned(pair, "duplicate argument")) } else { Ok(()) }
}

fn existing_serde(attrs: &[Attribute]) -> syn::Result<ExistingSerde> {
    let mut found = ExistingSerde::default();

    for attr in attrs.iter().filter(|attr| attr.path().is_ident("serde")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename_all") {
                found.rename_all = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("deny_unknown_fields") {
                found.deny_unknown_fields = true;
            } else if meta.input.peek(Token![=]) {
                // Skip the value of options we don't inspect.
                let _: Expr = meta.value()?.parse()?;
            }
            Ok(())
        })?;
    }

    Ok(found)
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
