//! HTML substitution with a per-route escaping policy.
//!
//! Pages are written once in [`crate::views`]; every piece of user-controlled
//! data goes through a [`Renderer`]. Vulnerable routes render with
//! [`Escaping::Raw`], secure routes with [`Escaping::Structural`].

use std::borrow::Cow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Escaping {
    /// Insert values verbatim. Markup in user input becomes live markup.
    Raw,
    /// Escape values for the HTML context they land in.
    Structural,
}

#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    escaping: Escaping,
}

impl Renderer {
    pub const RAW: Renderer = Renderer::new(Escaping::Raw);
    pub const STRUCTURAL: Renderer = Renderer::new(Escaping::Structural);

    pub const fn new(escaping: Escaping) -> Self {
        Self { escaping }
    }

    pub fn escaping(&self) -> Escaping {
        self.escaping
    }

    /// Element content.
    pub fn text<'a>(&self, value: &'a str) -> Cow<'a, str> {
        match self.escaping {
            Escaping::Raw => Cow::Borrowed(value),
            Escaping::Structural => html_escape::encode_text(value),
        }
    }

    /// Value inside a double-quoted attribute.
    pub fn attr<'a>(&self, value: &'a str) -> Cow<'a, str> {
        match self.escaping {
            Escaping::Raw => Cow::Borrowed(value),
            Escaping::Structural => html_escape::encode_double_quoted_attribute(value),
        }
    }
}
