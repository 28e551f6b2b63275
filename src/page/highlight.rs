//! Syntax-highlighting backends.

use serde::{Deserialize, Serialize};

use crate::loader::fetch::Resource;
use crate::page::{PageContext, PageError};

/// A highlighting library with one "highlight the whole page" entry point.
pub trait HighlightBackend: Send + Sync {
    /// Short module name the backend is loaded under.
    fn name(&self) -> &str;

    /// Resource locator relative to the base URL.
    fn locator(&self) -> &str;

    /// Global symbol the library exports.
    fn exports(&self) -> &str;

    /// Apply highlighting to every code region on the page.
    fn highlight_all(&self, page: &mut dyn PageContext, module: &Resource) -> Result<(), PageError>;
}

/// Prism: `Prism.highlightAll()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Prism;

impl HighlightBackend for Prism {
    fn name(&self) -> &str {
        "prism"
    }

    fn locator(&self) -> &str {
        "prism/prism"
    }

    fn exports(&self) -> &str {
        "Prism"
    }

    fn highlight_all(&self, page: &mut dyn PageContext, module: &Resource) -> Result<(), PageError> {
        page.invoke(module, "Prism.highlightAll")
    }
}

/// Google code-prettify: `PR.prettyPrint()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Prettify;

impl HighlightBackend for Prettify {
    fn name(&self) -> &str {
        "prettify"
    }

    fn locator(&self) -> &str {
        "prettify/run_prettify"
    }

    fn exports(&self) -> &str {
        "PR"
    }

    fn highlight_all(&self, page: &mut dyn PageContext, module: &Resource) -> Result<(), PageError> {
        page.invoke(module, "PR.prettyPrint")
    }
}

/// Highlighting backend selected by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HighlighterKind {
    #[default]
    Prism,
    Prettify,
}

impl HighlighterKind {
    pub fn backend(self) -> Box<dyn HighlightBackend> {
        match self {
            Self::Prism => Box::new(Prism),
            Self::Prettify => Box::new(Prettify),
        }
    }
}
