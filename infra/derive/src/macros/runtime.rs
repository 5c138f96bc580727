use proc_macro2::TokenStream;
use quote::quote;
use syn::{Error, ItemFn, ReturnType, Type};

const PROFILES: &str = "server, maintenance or default";

/// Expands `#[wed_runtime::main]`.
#[must_use]
pub fn expand_main(args: TokenStream, input: ItemFn) -> TokenStream {
    if input.sig.asyncness.is_none() {
        return Error::new_spanned(
            &input.sig.ident,
            "#[wed_runtime::main] can only be used on async functions",
        )
        .to_compile_error();
    }

    if !returns_result(&input.sig.output) {
        return Error::new_spanned(
            &input.sig.output,
            "#[wed_runtime::main] requires a Result return type",
        )
        .to_compile_error();
    }

    let runtime_config = match profile(args) {
        Ok(tokens) => tokens,
        Err(err) => return err.to_compile_error(),
    };

    let ItemFn { attrs, vis, sig, block } = input;
    let name = &sig.ident;
    let output = &sig.output;

    quote! {
        #(#attrs)*
        #vis fn #name() #output {
            let config = #runtime_config;
            let runtime = ::wed_runtime::build_runtime_with_config(&config)?;
            runtime.block_on(async #block)
        }
    }
}

fn profile(args: TokenStream) -> syn::Result<TokenStream> {
    if args.is_empty() {
        return Ok(quote! { ::wed_runtime::RuntimeConfig::default() });
    }

    let ident: syn::Ident = syn::parse2(args)?;
    match ident.to_string().as_str() {
        "server" => Ok(quote! { ::wed_runtime::RuntimeConfig::server() }),
        "maintenance" => Ok(quote! { ::wed_runtime::RuntimeConfig::maintenance() }),
        "default" => Ok(quote! { ::wed_runtime::RuntimeConfig::default() }),
        _ => Err(Error::new_spanned(ident, format!("unknown runtime profile; use {PROFILES}"))),
    }
}

fn returns_result(output: &ReturnType) -> bool {
    let ReturnType::Type(_, ty) = output else {
        return false;
    };
    let Type::Path(path) = &**ty else {
        return false;
    };
    path.path.segments.last().is_some_and(|seg| seg.ident == "Result")
}
