//! httprpc-macros - Procedural macros for httprpc services
//!
//! This crate provides:
//! - `#[rpc_service]` - Expose the eligible methods of an `impl` block as RPC methods

use darling::ast::NestedMeta;
use darling::{FromAttributes, FromMeta};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::ext::IdentExt;
use syn::{FnArg, ImplItem, ImplItemFn, ItemImpl, ReturnType, Type, Visibility, parse_macro_input};

/// Options of `#[rpc_service(...)]`
#[derive(Debug, Default, FromMeta)]
struct ServiceOpts {
    /// Service name; defaults to the type name
    #[darling(default)]
    name: Option<String>,

    /// Path of the crate exporting `Service` (default `::httprpc`)
    #[darling(default, rename = "crate")]
    krate: Option<syn::Path>,
}

/// Options of `#[rpc(...)]` on a method
#[derive(Debug, Default, FromAttributes)]
#[darling(attributes(rpc))]
struct MethodOpts {
    #[darling(default)]
    name: Option<String>,

    #[darling(default)]
    skip: bool,
}

/// Implement `Service` for the type of an inherent `impl` block
///
/// A method is exposed when it is `pub`, not `async`, not generic over
/// types, and has the shape
///
/// ```text
/// fn name(&self, ctx: &Context, args: &Args, reply: &mut Reply) -> ...Result
/// ```
///
/// Other methods are left alone. The wire name is the method name in
/// PascalCase. Use `#[rpc(name = "...")]` to choose another name and
/// `#[rpc(skip)]` to hide a method.
///
/// # Example
///
/// ```ignore
/// use httprpc::prelude::*;
///
/// #[derive(Default)]
/// struct Arith;
///
/// #[rpc_service(name = "Svc")]
/// impl Arith {
///     pub fn multiply(&self, _ctx: &RequestContext, args: &Args, reply: &mut Reply) -> ServiceResult {
///         reply.result = args.a * args.b;
///         Ok(())
///     }
/// }
/// ```
#[proc_macro_attribute]
pub fn rpc_service(attr: TokenStream, item: TokenStream) -> TokenStream {
    let attr_args = match NestedMeta::parse_meta_list(attr.into()) {
        Ok(args) => args,
        Err(e) => return TokenStream::from(darling::Error::from(e).write_errors()),
    };
    let opts = match ServiceOpts::from_list(&attr_args) {
        Ok(opts) => opts,
        Err(e) => return TokenStream::from(e.write_errors()),
    };
    let input = parse_macro_input!(item as ItemImpl);

    match expand(opts, input) {
        Ok(expanded) => TokenStream::from(expanded),
        Err(e) => TokenStream::from(e.write_errors()),
    }
}

fn expand(opts: ServiceOpts, mut input: ItemImpl) -> darling::Result<TokenStream2> {
    if let Some((_, path, _)) = &input.trait_ {
        return Err(darling::Error::custom(
            "#[rpc_service] must be placed on an inherent impl block",
        )
        .with_span(path));
    }
    if let Some(name) = &opts.name {
        check_name(name).map_err(|msg| darling::Error::custom(msg).with_span(&input.self_ty))?;
    }

    let mut errors = darling::Error::accumulator();
    let mut names: Vec<String> = Vec::new();
    let mut idents: Vec<syn::Ident> = Vec::new();

    for item in &mut input.items {
        let ImplItem::Fn(method) = item else {
            continue;
        };
        let Some(method_opts) = errors.handle(MethodOpts::from_attributes(&method.attrs)) else {
            continue;
        };
        method.attrs.retain(|attr| !attr.path().is_ident("rpc"));
        if method_opts.skip {
            continue;
        }

        let explicit = method_opts.name.is_some();
        if let Err(reason) = check_signature(method) {
            // Named methods must be exposable; anything else is just skipped
            if explicit {
                errors.push(darling::Error::custom(reason).with_span(&method.sig.ident));
            }
            continue;
        }

        let ident = &method.sig.ident;
        let name = method_opts
            .name
            .unwrap_or_else(|| to_pascal_case(&ident.unraw().to_string()));
        if let Err(msg) = check_name(&name) {
            errors.push(darling::Error::custom(msg).with_span(ident));
            continue;
        }
        if names.contains(&name) {
            errors.push(
                darling::Error::custom(format!("duplicate rpc method name `{name}`"))
                    .with_span(ident),
            );
            continue;
        }
        names.push(name);
        idents.push(ident.clone());
    }
    errors.finish()?;

    let krate = opts.krate.unwrap_or_else(|| syn::parse_quote!(::httprpc));
    let service_name = opts.name.map(|name| {
        quote! {
            fn service_name() -> &'static str {
                #name
            }
        }
    });
    let self_ty = &input.self_ty;
    let (impl_generics, _, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        #input

        impl #impl_generics #krate::Service for #self_ty #where_clause {
            #service_name

            fn methods(self: ::std::sync::Arc<Self>) -> ::std::vec::Vec<#krate::MethodSpec> {
                #krate::ServiceBuilder::new(self)
                    #( .method(#names, Self::#idents) )*
                    .build()
            }
        }
    })
}

/// Check a method against the dispatch contract
fn check_signature(method: &ImplItemFn) -> Result<(), &'static str> {
    if !matches!(method.vis, Visibility::Public(_)) {
        return Err("rpc methods must be `pub`");
    }
    let sig = &method.sig;
    if sig.asyncness.is_some() {
        return Err("rpc methods must not be `async`");
    }
    if sig.generics.type_params().next().is_some() || sig.generics.const_params().next().is_some() {
        return Err("rpc methods must not be generic");
    }
    if sig.inputs.len() != 4 {
        return Err("rpc methods take `&self`, `&Context`, `&Args` and `&mut Reply`");
    }

    let mut inputs = sig.inputs.iter();
    match inputs.next() {
        Some(FnArg::Receiver(receiver))
            if receiver.reference.is_some() && receiver.mutability.is_none() => {}
        _ => return Err("rpc methods must take `&self`"),
    }
    for (arg, mutable) in inputs.zip([false, false, true]) {
        let FnArg::Typed(typed) = arg else {
            return Err("rpc methods take `&self`, `&Context`, `&Args` and `&mut Reply`");
        };
        match &*typed.ty {
            Type::Reference(reference) if reference.mutability.is_some() == mutable => {}
            _ => return Err("rpc method parameters must be `&Context`, `&Args` and `&mut Reply`"),
        }
    }

    match &sig.output {
        ReturnType::Type(_, ty) if returns_result(ty) => Ok(()),
        _ => Err("rpc methods must return a `Result`"),
    }
}

fn returns_result(ty: &Type) -> bool {
    match ty {
        Type::Path(path) => path
            .path
            .segments
            .last()
            .is_some_and(|segment| segment.ident.to_string().ends_with("Result")),
        _ => false,
    }
}

fn check_name(name: &str) -> Result<(), String> {
    if name.is_empty() || name.contains('.') {
        Err(format!("invalid rpc name {name:?}: must be non-empty and contain no '.'"))
    } else {
        Ok(())
    }
}

/// Convert a snake_case string to PascalCase
fn to_pascal_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut upper_next = true;
    for c in s.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            result.extend(c.to_uppercase());
            upper_next = false;
        } else {
            result.push(c);
        }
    }
    result
}
