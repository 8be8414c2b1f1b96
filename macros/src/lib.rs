use proc_macro::TokenStream;
use quote::quote;
use syn::parse::ParseStream;
use syn::punctuated::Punctuated;
use syn::{
    parenthesized, parse_macro_input, Attribute, Data, DeriveInput, Expr, Fields, Ident, LitStr,
    Token, Type,
};

/// Derive `env_loadr::EnvConfig`, describing each named field for the loader
///
/// Field attribute forms:
/// - `#[env("KEY")]` or `#[env(key = "KEY")]`
/// - `#[env("KEY", readonly)]`
/// - `#[env("KEY", validate(required, min = 1, max = 10, one_of("a", "b")))]`
#[proc_macro_derive(EnvConfig, attributes(env))]
pub fn derive_env_config(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match generate_schema(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn generate_schema(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let struct_name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    // Extract fields from the struct
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    input,
                    "EnvConfig can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "EnvConfig can only be derived for structs",
            ));
        }
    };

    let mut specs = Vec::new();

    for field in fields {
        let Some(field_name) = field.ident.as_ref() else {
            continue;
        };
        let name = field_name.to_string();
        let kind = classify(&field.ty);
        let config = parse_field_config(&field.attrs)?;
        check_rules(&config.rules, kind, field)?;

        let kind_tokens = kind.tokens(&field.ty);

        let key_call = config
            .key
            .as_ref()
            .filter(|key| !key.value().is_empty())
            .map(|key| quote! { .key(#key) });

        let readonly_call = config.readonly.then(|| quote! { .readonly() });

        let setter_call = (kind != Kind::Unsupported && !config.readonly).then(|| {
            quote! {
                .setter(|target: &mut Self, value: ::env_loadr::Value| {
                    target.#field_name = ::core::convert::TryFrom::try_from(value)?;
                    ::core::result::Result::Ok(())
                })
            }
        });

        let getter_call = (kind != Kind::Unsupported).then(|| {
            quote! {
                .getter(|target: &Self| {
                    ::env_loadr::Value::from(::core::clone::Clone::clone(&target.#field_name))
                })
            }
        });

        let rule_calls = config.rules.iter().map(|rule| {
            let rule = rule.tokens();
            quote! { .rule(#rule) }
        });

        specs.push(quote! {
            ::env_loadr::FieldSpec::<Self>::new(#name, #kind_tokens)
                #key_call
                #readonly_call
                #setter_call
                #getter_call
                #(#rule_calls)*
        });
    }

    Ok(quote! {
        impl #impl_generics ::env_loadr::EnvConfig for #struct_name #ty_generics #where_clause {
            fn schema() -> ::env_loadr::Schema<Self> {
                ::env_loadr::Schema::new()
                    #(.field(#specs))*
            }
        }
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Text,
    Integer,
    Float,
    Bool,
    Timestamp,
    Unsupported,
}

impl Kind {
    fn tokens(self, ty: &Type) -> proc_macro2::TokenStream {
        match self {
            Kind::Text => quote! { ::env_loadr::FieldKind::Text },
            Kind::Integer => quote! { ::env_loadr::FieldKind::Integer },
            Kind::Float => quote! { ::env_loadr::FieldKind::Float },
            Kind::Bool => quote! { ::env_loadr::FieldKind::Bool },
            Kind::Timestamp => quote! { ::env_loadr::FieldKind::Timestamp },
            Kind::Unsupported => {
                let type_name = type_name(ty);
                quote! { ::env_loadr::FieldKind::Unsupported { type_name: #type_name } }
            }
        }
    }

    fn label(self) -> &'static str {
        match self {
            Kind::Text => "string",
            Kind::Integer => "integer",
            Kind::Float => "float",
            Kind::Bool => "bool",
            Kind::Timestamp => "timestamp",
            Kind::Unsupported => "unsupported",
        }
    }
}

/// Map a field type onto the supported kinds by its last path segment
fn classify(ty: &Type) -> Kind {
    match ty {
        Type::Group(group) => classify(&group.elem),
        Type::Paren(paren) => classify(&paren.elem),
        Type::Path(type_path) if type_path.qself.is_none() => {
            let Some(segment) = type_path.path.segments.last() else {
                return Kind::Unsupported;
            };
            match segment.ident.to_string().as_str() {
                "String" => Kind::Text,
                "i8" | "i16" | "i32" | "i64" | "isize" => Kind::Integer,
                "f32" | "f64" => Kind::Float,
                "bool" => Kind::Bool,
                "DateTime" if has_known_zone(segment) => Kind::Timestamp,
                _ => Kind::Unsupported,
            }
        }
        _ => Kind::Unsupported,
    }
}

/// `DateTime<Tz>` only converts for the chrono zones `Utc`, `FixedOffset` and `Local`
fn has_known_zone(segment: &syn::PathSegment) -> bool {
    let syn::PathArguments::AngleBracketed(args) = &segment.arguments else {
        return false;
    };
    match args.args.first() {
        Some(syn::GenericArgument::Type(Type::Path(zone))) if args.args.len() == 1 => zone
            .path
            .segments
            .last()
            .map(|last| matches!(last.ident.to_string().as_str(), "Utc" | "FixedOffset" | "Local"))
            .unwrap_or(false),
        _ => false,
    }
}

/// Source spelling of a type without the token spacing `quote` adds
fn type_name(ty: &Type) -> String {
    quote!(#ty)
        .to_string()
        .replace(" < ", "<")
        .replace(" <", "<")
        .replace("< ", "<")
        .replace(" >", ">")
        .replace(" ,", ",")
        .replace(" :: ", "::")
        .replace("& ", "&")
}

#[derive(Debug, Default)]
struct FieldConfig {
    key: Option<LitStr>,
    readonly: bool,
    rules: Vec<RuleAttr>,
}

#[derive(Debug)]
enum RuleAttr {
    Required(Ident),
    Min(Ident, Expr),
    Max(Ident, Expr),
    OneOf(Ident, Vec<LitStr>),
}

impl RuleAttr {
    fn ident(&self) -> &Ident {
        match self {
            RuleAttr::Required(ident)
            | RuleAttr::Min(ident, _)
            | RuleAttr::Max(ident, _)
            | RuleAttr::OneOf(ident, _) => ident,
        }
    }

    fn tokens(&self) -> proc_macro2::TokenStream {
        match self {
            RuleAttr::Required(_) => quote! { ::env_loadr::Rule::Required },
            RuleAttr::Min(_, expr) => quote! { ::env_loadr::Rule::Min((#expr) as f64) },
            RuleAttr::Max(_, expr) => quote! { ::env_loadr::Rule::Max((#expr) as f64) },
            RuleAttr::OneOf(_, values) => quote! { ::env_loadr::Rule::OneOf(&[#(#values),*]) },
        }
    }
}

/// Reject rules that cannot apply to the field's kind
fn check_rules(rules: &[RuleAttr], kind: Kind, field: &syn::Field) -> syn::Result<()> {
    for rule in rules {
        let allowed = match rule {
            RuleAttr::Required(_) => kind != Kind::Unsupported,
            RuleAttr::Min(..) | RuleAttr::Max(..) => {
                matches!(kind, Kind::Text | Kind::Integer | Kind::Float)
            }
            RuleAttr::OneOf(..) => matches!(kind, Kind::Text | Kind::Integer),
        };
        if !allowed {
            let mut err = syn::Error::new(
                rule.ident().span(),
                format!(
                    "validation rule `{}` cannot be used on a {} field",
                    rule.ident(),
                    kind.label()
                ),
            );
            err.combine(syn::Error::new_spanned(&field.ty, "field type declared here"));
            return Err(err);
        }
    }
    Ok(())
}

fn parse_field_config(attrs: &[Attribute]) -> syn::Result<FieldConfig> {
    let mut env_attrs = attrs.iter().filter(|attr| attr.path().is_ident("env"));

    let Some(attr) = env_attrs.next() else {
        return Ok(FieldConfig::default());
    };
    if let Some(duplicate) = env_attrs.next() {
        return Err(syn::Error::new_spanned(
            duplicate,
            "field can only have one #[env(...)] attribute",
        ));
    }

    attr.parse_args_with(parse_env_attr)
}

/// Parse `"KEY", key = "KEY", readonly, validate(...)`
fn parse_env_attr(input: ParseStream) -> syn::Result<FieldConfig> {
    let mut config = FieldConfig::default();

    if input.peek(LitStr) {
        config.key = Some(input.parse()?);
        if !input.is_empty() {
            input.parse::<Token![,]>()?;
        }
    }

    while !input.is_empty() {
        let ident: Ident = input.parse()?;
        match ident.to_string().as_str() {
            "key" => {
                input.parse::<Token![=]>()?;
                if config.key.is_some() {
                    return Err(syn::Error::new(ident.span(), "env key given more than once"));
                }
                config.key = Some(input.parse()?);
            }
            "readonly" => config.readonly = true,
            "validate" => {
                let content;
                parenthesized!(content in input);
                config.rules.extend(parse_rules(&content)?);
            }
            other => {
                return Err(syn::Error::new(
                    ident.span(),
                    format!(
                        "unknown env option `{}`, expected one of: key, readonly, validate",
                        other
                    ),
                ));
            }
        }

        if input.is_empty() {
            break;
        }
        input.parse::<Token![,]>()?;
    }

    Ok(config)
}

/// Parse `required, min = 1, max = 10, one_of("a", "b")`
fn parse_rules(input: ParseStream) -> syn::Result<Vec<RuleAttr>> {
    let mut rules = Vec::new();

    while !input.is_empty() {
        let ident: Ident = input.parse()?;
        let rule = match ident.to_string().as_str() {
            "required" => RuleAttr::Required(ident),
            "min" => {
                input.parse::<Token![=]>()?;
                let expr: Expr = input.parse()?;
                RuleAttr::Min(ident, expr)
            }
            "max" => {
                input.parse::<Token![=]>()?;
                let expr: Expr = input.parse()?;
                RuleAttr::Max(ident, expr)
            }
            "one_of" => {
                let content;
                parenthesized!(content in input);
                let values = Punctuated::<LitStr, Token![,]>::parse_terminated(&content)?;
                RuleAttr::OneOf(ident, values.into_iter().collect())
            }
            other => {
                return Err(syn::Error::new(
                    ident.span(),
                    format!(
                        "unknown validation rule `{}`, expected one of: required, min, max, one_of",
                        other
                    ),
                ));
            }
        };
        rules.push(rule);

        if input.is_empty() {
            break;
        }
        input.parse::<Token![,]>()?;
    }

    Ok(rules)
}
