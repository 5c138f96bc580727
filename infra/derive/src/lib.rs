#![allow(unreachable_pub)]
#![allow(clippy::needless_pass_by_value)]

//! # Macros
//!
//! Procedural macros shared by the RSVP workspace.
//!
//! * [`macro@wed_error`] turns an enum into a `thiserror` error with context helpers and
//!   user-facing rejection classification.
//! * [`macro@api_model`] / [`macro@api_handler`] standardize DTOs and documented Axum handlers.
//! * [`macro@wed_slice`] wraps feature state into a shareable slice handle.
//! * [`macro@main`] boots the tokio runtime from a named profile.
//!
//! Examples are `ignore`d here; the consuming crates exercise them in their own tests.

mod macros;

use proc_macro::TokenStream;
use syn::{DeriveInput, ItemFn, ItemStruct, parse_macro_input};

/// Attribute macro to bootstrap the tokio runtime from `wed_runtime`.
///
/// Turns an `async fn main` returning a `Result` into a plain `fn main` that builds the
/// runtime and blocks on the body.
///
/// # Profiles
///
/// * `server` - multi-threaded runtime for the HTTP server.
/// * `maintenance` - small runtime for one-shot maintenance commands.
/// * no argument / `default` - [`wed_runtime::RuntimeConfig::default`].
///
/// # Examples
///
/// ```rust,ignore
/// #[wed_runtime::main(server)]
/// async fn main() -> anyhow::Result<()> {
///     Ok(())
/// }
/// ```
#[proc_macro_attribute]
pub fn main(args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);
    macros::runtime::expand_main(args.into(), input).into()
}

/// Attribute macro to define an API data model.
///
/// * Adds `Debug`, `Serialize` and `Deserialize` when they are not derived already.
/// * Adds `utoipa::ToSchema` when the consuming crate's `server` feature is enabled.
/// * Applies `rename_all = "camelCase"` and `deny_unknown_fields` unless overridden.
///
/// # Arguments
///
/// * `rename_all = "..."` - serde rename policy (default `camelCase`).
/// * `deny_unknown_fields = false` - accept unknown fields.
///
/// # Example
///
/// ```rust,ignore
/// #[wed_derive::api_model(deny_unknown_fields = false)]
/// pub struct RsvpResponse {
///     pub success: bool,
///     pub message: String,
/// }
/// ```
#[proc_macro_attribute]
pub fn api_model(attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemStruct);
    macros::api::expand_api_model(attr.into(), input).into()
}

/// Attribute macro to document an Axum handler with `utoipa::path`.
///
/// Arguments are forwarded to `utoipa::path` when the `server` feature is on.
///
/// # Example
///
/// ```rust,ignore
/// #[wed_derive::api_handler(post, path = "/rsvp", tag = "rsvp")]
/// pub async fn submit() -> &'static str {
///     "ok"
/// }
/// ```
#[proc_macro_attribute]
pub fn api_handler(args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);
    macros::api::expand_api_handler(args.into(), input).into()
}

/// Attribute macro for crate error enums.
///
/// # Features
///
/// * Injects `#[derive(Debug, thiserror::Error)]` when missing.
/// * Generates a `<Name>Ext` trait with `.context(...)` for `Result<T, Name>` and for every
///   `Result<T, Source>` whose source type is wrapped by a variant.
/// * Generates `From<Source>` for variants with a `source` field and a `context` field.
/// * Variants tagged `#[rejection]` are user-facing outcomes; `is_rejection()` reports them.
///
/// # Requirements
///
/// 1. Only enums are accepted.
/// 2. Variants are unit variants or have named fields; tuple variants are rejected.
/// 3. A variant with a source must also carry `context: Option<Cow<'static, str>>`.
///
/// # Example
///
/// ```rust,ignore
/// use std::borrow::Cow;
///
/// #[wed_derive::wed_error]
/// pub enum SubmitError {
///     #[rejection]
///     #[error("Code has expired.")]
///     ExpiredCode,
///
///     #[error("Store error{}: {source}", format_context(.context))]
///     Store { source: StoreError, context: Option<Cow<'static, str>> },
/// }
/// ```
#[proc_macro_attribute]
pub fn wed_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    macros::error::expand_derive(input).into()
}

/// Attribute macro to define a feature slice handle.
///
/// The annotated struct becomes `<Name>Inner`; `<Name>` is an `Arc` wrapper that derefs to it
/// and implements `wed_kernel::domain::registry::FeatureSlice`.
///
/// # Example
/// ```rust,ignore
/// #[wed_derive::wed_slice]
/// pub struct Rsvp {
///     pub service: RsvpService,
/// }
///
/// let slice = Rsvp::new(RsvpInner { service });
/// ```
#[proc_macro_attribute]
pub fn wed_slice(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(item as ItemStruct);
    macros::slice::expand_slice(input).into()
}
