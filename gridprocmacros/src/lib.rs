//! Procedural macros used in the definition and implementation of getters and setters for ValidationSettings

use quote::quote;
use syn::parse::ParseStream;
use syn::parse::{Parse, Result};
use syn::{Expr, Ident, Token};

type ValueName = Ident;
type ValueType = Ident;
type DefaultValue = Expr;

/// Signature contains the results of parsing a vs_gets_and_sets definition, i.e., the
/// name of a value stored in a ValidationSettings map and the corresponding type.
struct Signature {
    value_name: ValueName,
    value_type: ValueType,
}

impl Parse for Signature {
    fn parse(stream: ParseStream<'_>) -> Result<Self> {
        let value_name: ValueName = stream.parse()?;
        let _comma: Token!(,) = stream.parse()?;
        let value_type: ValueType = stream.parse()?;
        Ok(Signature {
            value_name,
            value_type,
        })
    }
}

/// SignatureWithDefault contains the results of parsing a vs_gets_and_sets_with_default definition,
/// i.e., the name of a value stored in a ValidationSettings map, the corresponding type and the
/// default value. For example:
///     ```ignore
///     vs_gets_and_sets_with_default!(PS_CHECK_REVOCATION_STATUS, bool, true);
///     ```
struct SignatureWithDefault {
    value_name: ValueName,
    value_type: ValueType,
    default_value: DefaultValue,
}

impl Parse for SignatureWithDefault {
    fn parse(stream: ParseStream<'_>) -> Result<Self> {
        let value_name: ValueName = stream.parse()?;
        let _comma: Token!(,) = stream.parse()?;
        let value_type: ValueType = stream.parse()?;
        let _comma2: Token!(,) = stream.parse()?;
        let default_value: DefaultValue = stream.parse()?;
        Ok(SignatureWithDefault {
            value_name,
            value_type,
            default_value,
        })
    }
}

/// is_string_numeric is used to determine if a string value contains only numeric characters.
/// It is used to process a slice that omits the first character, i.e., in order to identify
/// types like u8, u32, etc.
fn is_string_numeric(str: &str) -> bool {
    str.chars().all(|c| c.is_numeric())
}

/// Maps a Rust type name to the name of the ValidationSettingsTypes variant that carries it.
fn variant_name(type_name: &str) -> String {
    if type_name == "bool" {
        "Bool".to_string()
    } else if !type_name.is_empty() && is_string_numeric(&type_name[1..]) {
        type_name.to_uppercase()
    } else {
        type_name.to_string()
    }
}

/// Returns getter and setter names for a PS_ prefixed setting name.
fn accessor_names(flag: &Ident) -> (String, String) {
    let flag_str = format!("{}", flag)[3..].to_lowercase();
    (format!("get_{}", flag_str), format!("set_{}", flag_str))
}

/// `vs_gets_and_sets` generates `get_` and `set_` functions for a setting that has no default value.
/// The getter returns None when the setting is absent.
#[proc_macro]
pub fn vs_gets_and_sets(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let signature = syn::parse_macro_input!(input as Signature);
    let flag = signature.value_name;
    let return_t = signature.value_type;

    let (getter_str, setter_str) = accessor_names(&flag);
    let vs_type_str = variant_name(&format!("{}", return_t));
    let getter = syn::Ident::new(&getter_str, flag.span());
    let setter = syn::Ident::new(&setter_str, flag.span());
    let vs_type = syn::Ident::new(&vs_type_str, return_t.span());

    let getter_comment = format!(
        "`{}` is used to retrieve `{}` items from a [`ValidationSettings`] instance",
        getter_str, flag
    );
    let setter_comment = format!(
        "`{}` is used to set `{}` items in a [`ValidationSettings`] instance",
        setter_str, flag
    );

    let tokens = quote! {
            #[doc = #getter_comment]
            pub fn #getter(vs: &ValidationSettings) -> Option<#return_t> {
                match vs.get(#flag) {
                    Some(ValidationSettingsTypes::#vs_type(v)) => Some(v.clone()),
                    _ => None,
                }
            }
            #[doc = #setter_comment]
            pub fn #setter(vs: &mut ValidationSettings, v: #return_t) {
                vs.insert(#flag.to_string(), ValidationSettingsTypes::#vs_type(v));
            }
    };
    tokens.into()
}

/// `vs_gets_and_sets_with_default` generates `get_` and `set_` functions for a setting. The getter
/// returns the given default value when the setting is absent or carries an unexpected type.
#[proc_macro]
pub fn vs_gets_and_sets_with_default(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let signature = syn::parse_macro_input!(input as SignatureWithDefault);
    let flag = signature.value_name;
    let return_t = signature.value_type;
    let default_value = signature.default_value;

    let (getter_str, setter_str) = accessor_names(&flag);
    let vs_type_str = variant_name(&format!("{}", return_t));
    let getter = syn::Ident::new(&getter_str, flag.span());
    let setter = syn::Ident::new(&setter_str, flag.span());
    let vs_type = syn::Ident::new(&vs_type_str, return_t.span());

    let getter_comment = format!(
        "`{}` is used to retrieve `{}` items from a [`ValidationSettings`] instance",
        getter_str, flag
    );
    let setter_comment = format!(
        "`{}` is used to set `{}` items in a [`ValidationSettings`] instance",
        setter_str, flag
    );

    let tokens = quote! {
            #[doc = #getter_comment]
            pub fn #getter(vs: &ValidationSettings) -> #return_t {
                match vs.get(#flag) {
                    Some(ValidationSettingsTypes::#vs_type(v)) => v.clone(),
                    _ => #default_value,
                }
            }
            #[doc = #setter_comment]
            pub fn #setter(vs: &mut ValidationSettings, v: #return_t) {
                vs.insert(#flag.to_string(), ValidationSettingsTypes::#vs_type(v));
            }
    };
    tokens.into()
}
