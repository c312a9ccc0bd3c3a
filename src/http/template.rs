//! Placeholder templates for challenge responses.
//!
//! A template is compiled once from text containing `${name}` slots. Only the
//! names in [`Placeholder`] are accepted, so rendering can never leave a slot
//! behind: unknown names fail at compile time, missing values at render time.

use std::borrow::Cow;

use thiserror::Error;

/// A substitutable slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placeholder {
    AuthScheme,
    Address,
    MinAmount,
    MinConfirmations,
    MaxConfirmations,
    ErrorDescription,
}

impl Placeholder {
    pub const ALL: [Placeholder; 6] = [
        Placeholder::AuthScheme,
        Placeholder::Address,
        Placeholder::MinAmount,
        Placeholder::MinConfirmations,
        Placeholder::MaxConfirmations,
        Placeholder::ErrorDescription,
    ];

    /// Name between `${` and `}`.
    pub fn name(&self) -> &'static str {
        match self {
            Placeholder::AuthScheme => "auth_scheme",
            Placeholder::Address => "address",
            Placeholder::MinAmount => "min_amount",
            Placeholder::MinConfirmations => "min_confirmations",
            Placeholder::MaxConfirmations => "max_confirmations",
            Placeholder::ErrorDescription => "error_description",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }
}

/// Template compile or render failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("unknown placeholder '${{{0}}}'")]
    UnknownPlaceholder(String),

    #[error("unterminated placeholder at byte {0}")]
    Unterminated(usize),

    #[error("no value bound for '${{{0}}}'")]
    Unbound(&'static str),
}

/// How substituted values are escaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Escape {
    /// Inside an HTTP quoted-string (`WWW-Authenticate` parameters).
    QuotedString,
    /// Inside a JSON string literal.
    Json,
}

impl Escape {
    fn apply<'v>(&self, value: &'v str) -> Cow<'v, str> {
        match self {
            Escape::QuotedString => {
                if !value.contains(|c: char| c == '"' || c == '\\' || c.is_control()) {
                    return Cow::Borrowed(value);
                }
                let mut out = String::with_capacity(value.len() + 8);
                for c in value.chars() {
                    match c {
                        '"' | '\\' => {
                            out.push('\\');
                            out.push(c);
                        }
                        c if c.is_control() => out.push(' '),
                        c => out.push(c),
                    }
                }
                Cow::Owned(out)
            }
            Escape::Json => {
                let quoted = serde_json::Value::from(value).to_string();
                Cow::Owned(quoted[1..quoted.len() - 1].to_string())
            }
        }
    }
}

/// Values for every placeholder.
#[derive(Debug, Clone, Copy)]
pub struct Bindings<'a> {
    pub auth_scheme: &'a str,
    pub address: &'a str,
    pub min_amount: &'a str,
    pub min_confirmations: u64,
    pub max_confirmations: u64,
    pub error_description: Option<&'a str>,
}

impl<'a> Bindings<'a> {
    fn value(&self, placeholder: Placeholder) -> Option<Cow<'a, str>> {
        match placeholder {
            Placeholder::AuthScheme => Some(Cow::Borrowed(self.auth_scheme)),
            Placeholder::Address => Some(Cow::Borrowed(self.address)),
            Placeholder::MinAmount => Some(Cow::Borrowed(self.min_amount)),
            Placeholder::MinConfirmations => Some(Cow::Owned(self.min_confirmations.to_string())),
            Placeholder::MaxConfirmations => Some(Cow::Owned(self.max_confirmations.to_string())),
            Placeholder::ErrorDescription => self.error_description.map(Cow::Borrowed),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Slot(Placeholder),
}

/// A compiled template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    segments: Vec<Segment>,
    escape: Escape,
}

impl Template {
    /// Compile `source`, rejecting unknown or unterminated placeholders.
    pub fn compile(source: &str, escape: Escape) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut rest = source;
        let mut offset = 0;

        while let Some(start) = rest.find("${") {
            if start > 0 {
                segments.push(Segment::Literal(rest[..start].to_string()));
            }
            let after = &rest[start + 2..];
            let end = after.find('}').ok_or(TemplateError::Unterminated(offset + start))?;
            let name = &after[..end];
            let placeholder = Placeholder::from_name(name)
                .ok_or_else(|| TemplateError::UnknownPlaceholder(name.to_string()))?;
            segments.push(Segment::Slot(placeholder));

            let consumed = start + 2 + end + 1;
            offset += consumed;
            rest = &rest[consumed..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        Ok(Self { segments, escape })
    }

    /// Placeholders in order of appearance.
    pub fn placeholders(&self) -> impl Iterator<Item = Placeholder> + '_ {
        self.segments.iter().filter_map(|s| match s {
            Segment::Slot(p) => Some(*p),
            Segment::Literal(_) => None,
        })
    }

    /// Substitute every slot.
    pub fn render(&self, bindings: &Bindings<'_>) -> Result<String, TemplateError> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Slot(placeholder) => {
                    let value = bindings
                        .value(*placeholder)
                        .ok_or(TemplateError::Unbound(placeholder.name()))?;
                    out.push_str(&self.escape.apply(&value));
                }
            }
        }
        Ok(out)
    }
}
