//! Procedural macros for declaring chat tools

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    parse_macro_input, punctuated::Punctuated, token::Comma, Expr, ExprLit, FnArg, ItemFn, Lit,
    Meta, Type,
};

struct ToolAttrs {
    description: Option<String>,
    name: Option<String>,
    terminal: bool,
}

fn parse_attrs(args: Punctuated<Meta, Comma>) -> syn::Result<ToolAttrs> {
    let mut attrs = ToolAttrs {
        description: None,
        name: None,
        terminal: false,
    };

    for arg in args {
        match arg {
            Meta::NameValue(nv) if nv.path.is_ident("description") || nv.path.is_ident("name") => {
                let value = match &nv.value {
                    Expr::Lit(ExprLit { lit: Lit::Str(lit), .. }) => lit.value(),
                    other => return Err(syn::Error::new_spanned(other, "expected a string literal")),
                };
                if nv.path.is_ident("description") {
                    attrs.description = Some(value);
                } else {
                    attrs.name = Some(value);
                }
            }
            Meta::Path(path) if path.is_ident("terminal") => attrs.terminal = true,
            other => {
                return Err(syn::Error::new_spanned(
                    other,
                    "unknown tool attribute; expected `description`, `name` or `terminal`",
                ))
            }
        }
    }
    Ok(attrs)
}

/// Attribute macro generating a tool declaration and registration from a function
///
/// # Example
///
/// ```ignore
/// #[derive(Deserialize, JsonSchema)]
/// struct OrderArgs {
///     /// Order ID of the order, e.g. 100433
///     order_id: String,
/// }
///
/// #[tool(description = "Get status of the order with the given order_id")]
/// fn get_order_status(args: OrderArgs) -> Result<String, String> {
///     // Implementation
/// }
/// ```
///
/// This generates a module `get_order_status_tool` containing:
/// - `NAME`: the tool name
/// - `declaration()`: the `ToolDeclaration` built from the argument type's schema
/// - `execute`: re-export of the original function
/// - `registration()`: a `ToolRegistration` ready for `ToolRegistry::register`
///
/// # Attributes
///
/// - `description`: (required) what the tool does
/// - `name`: (optional) override the tool name (defaults to the function name)
/// - `terminal`: (optional) the function returns `Result<TerminalStatus, String>`
///   and calling it ends the conversation; must be synchronous
#[proc_macro_attribute]
pub fn tool(attr: TokenStream, item: TokenStream) -> TokenStream {
    let attr_args = parse_macro_input!(attr with Punctuated::<Meta, Comma>::parse_terminated);
    let input_fn = parse_macro_input!(item as ItemFn);

    match expand_tool(attr_args, input_fn) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

fn expand_tool(attr_args: Punctuated<Meta, Comma>, input_fn: ItemFn) -> syn::Result<TokenStream2> {
    let attrs = parse_attrs(attr_args)?;

    let description = attrs.description.ok_or_else(|| {
        syn::Error::new_spanned(&input_fn.sig, "tool attribute requires a 'description' parameter")
    })?;

    let fn_name = &input_fn.sig.ident;
    let tool_name = attrs.name.unwrap_or_else(|| fn_name.to_string());

    let arg_type = match input_fn.sig.inputs.first() {
        Some(FnArg::Typed(pat_type)) => strip_type_modifiers(&pat_type.ty),
        _ => {
            return Err(syn::Error::new_spanned(
                &input_fn.sig,
                "tool function must take its arguments struct as the first parameter",
            ))
        }
    };

    let is_async = input_fn.sig.asyncness.is_some();
    if attrs.terminal && is_async {
        return Err(syn::Error::new_spanned(
            &input_fn.sig,
            "terminal tools must be synchronous",
        ));
    }

    // get_order_status -> get_order_status_tool
    let module_name = syn::Ident::new(&format!("{}_tool", fn_name), fn_name.span());

    let mut pub_input_fn = input_fn.clone();
    pub_input_fn.vis = syn::parse_quote!(pub);

    let constructor = if attrs.terminal {
        quote!(terminal)
    } else if is_async {
        quote!(from_async)
    } else {
        quote!(from_sync)
    };

    Ok(quote! {
        #pub_input_fn

        #[allow(dead_code)]
        pub mod #module_name {
            use super::*;

            /// The name of this tool
            pub const NAME: &str = #tool_name;

            /// Declaration advertised to the model
            pub fn declaration() -> ::llm_wrappers::tools::ToolDeclaration {
                ::llm_wrappers::tools::create_tool_declaration::<#arg_type>(
                    #tool_name,
                    #description
                )
            }

            pub use super::#fn_name as execute;

            /// Declaration and handler for one-step registration
            ///
            /// ```ignore
            /// registry.register(get_order_status_tool::registration())?;
            /// ```
            pub fn registration() -> ::llm_wrappers::tools::ToolRegistration {
                ::llm_wrappers::tools::ToolRegistration::#constructor(declaration(), execute)
            }
        }
    })
}

/// Strip reference modifiers from a type to get the base type
fn strip_type_modifiers(ty: &Type) -> &Type {
    match ty {
        Type::Reference(type_ref) => strip_type_modifiers(&type_ref.elem),
        _ => ty,
    }
}
