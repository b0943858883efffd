//! Endpoint template rendering
//!
//! Templates carry `{name}` placeholders. Values are either escaped
//! (RFC 3986 unreserved characters kept, everything else percent-encoded)
//! or substituted raw. Placeholders without a value stay verbatim, so a
//! template can reference extras that only some deployments configure.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::borrow::Cow;
use std::collections::BTreeMap;

/// Everything except ALPHA / DIGIT / "-" / "." / "_" / "~"
const URI_DATA: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Placeholder name for the address being geocoded (escaped)
pub const ADDRESS_PLACEHOLDER: &str = "address";
/// Placeholder name for the provider key (raw)
pub const API_KEY_PLACEHOLDER: &str = "apiKey";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Value {
    Escaped(String),
    Raw(String),
}

/// Named values available to a template
#[derive(Debug, Clone, Default)]
pub struct TemplateVars {
    values: BTreeMap<String, Value>,
}

impl TemplateVars {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value is percent-encoded on substitution
    pub fn escaped(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), Value::Escaped(value.into()));
        self
    }

    /// Value is substituted as given
    pub fn raw(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), Value::Raw(value.into()));
        self
    }

    fn lookup(&self, name: &str) -> Option<Cow<'_, str>> {
        self.values.get(name).map(|v| match v {
            Value::Escaped(s) => Cow::Owned(escape(s)),
            Value::Raw(s) => Cow::Borrowed(s.as_str()),
        })
    }
}

/// An endpoint URL with `{name}` placeholders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointTemplate(String);

impl EndpointTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Substitute known placeholders, leave unknown ones untouched
    pub fn render(&self, vars: &TemplateVars) -> String {
        let mut out = String::with_capacity(self.0.len() + 32);
        let mut rest = self.0.as_str();

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];

            match after.find(|c: char| c == '{' || c == '}') {
                Some(close) if after.as_bytes()[close] == b'}' => {
                    let name = &after[..close];
                    match vars.lookup(name) {
                        Some(value) => out.push_str(&value),
                        None => {
                            out.push('{');
                            out.push_str(name);
                            out.push('}');
                        }
                    }
                    rest = &after[close + 1..];
                }
                // Stray or nested brace: emit it and keep scanning after it
                _ => {
                    out.push('{');
                    rest = after;
                }
            }
        }

        out.push_str(rest);
        out
    }
}

/// RFC 3986 data escaping
pub fn escape(value: &str) -> String {
    utf8_percent_encode(value, URI_DATA).to_string()
}
