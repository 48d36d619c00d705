pub mod scanner;
pub mod tokens;

use std::fmt;

/// Tag delimiter modes selectable with `{syntax ...}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Syntax {
    /// `{...}`
    #[default]
    Latte,
    /// `{{...}}`
    Double,
    /// `<%...%>`
    Asp,
    /// `{%...%}` or `{{...}}`
    Python,
    /// Only `{/syntax}` is recognized.
    Off,
}

impl Syntax {
    /// Resolve a `{syntax}` argument. The empty name selects the default.
    pub fn from_name(name: &str) -> Option<Syntax> {
        match name {
            "" | "latte" => Some(Syntax::Latte),
            "double" => Some(Syntax::Double),
            "asp" => Some(Syntax::Asp),
            "python" => Some(Syntax::Python),
            "off" => Some(Syntax::Off),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Syntax::Latte => "latte",
            Syntax::Double => "double",
            Syntax::Asp => "asp",
            Syntax::Python => "python",
            Syntax::Off => "off",
        }
    }
}

impl fmt::Display for Syntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
