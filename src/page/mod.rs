//! Documentation page bootstrap.
//!
//! Loads the page's modules through a [`Bootstrapper`], then runs page setup,
//! attaches the accordion panels and applies syntax highlighting.

pub mod accordion;
pub mod highlight;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::LoaderConfig;
use crate::error::Result;
use crate::loader::{Bootstrapper, Handles, Resource};

pub use accordion::{Accordion, AccordionOptions, Active};
pub use highlight::{HighlightBackend, HighlighterKind, Prettify, Prism};

/// Errors raised by the page continuation or its configuration.
#[derive(Error, Debug)]
pub enum PageError {
    #[error("Setup routine failed: {0}")]
    Setup(String),

    #[error("No element matches selector '{0}'")]
    MissingElement(String),

    #[error("Entry point '{entry_point}' failed: {reason}")]
    EntryPoint { entry_point: String, reason: String },

    #[error("Module '{0}' is not part of the page's module list")]
    MissingModule(String),
}

/// The host page, as seen by the continuation.
pub trait PageContext {
    /// Run the page-specific setup routine.
    fn run_setup(&mut self, setup: &Resource) -> std::result::Result<(), PageError>;

    /// Attach an accordion to `selector` and return its section count.
    fn attach_accordion(
        &mut self,
        selector: &str,
        options: &AccordionOptions,
    ) -> std::result::Result<usize, PageError>;

    /// Invoke a zero-argument entry point exported by a loaded module.
    fn invoke(&mut self, module: &Resource, entry_point: &str) -> std::result::Result<(), PageError>;
}

/// An accordion region to initialize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelSpec {
    pub selector: String,
    #[serde(default)]
    pub options: AccordionOptions,
}

fn default_setup_module() -> String {
    "setup".to_string()
}

/// Everything a page needs to boot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageConfig {
    pub loader: LoaderConfig,
    /// Modules to load, in the order handles are delivered
    pub modules: Vec<String>,
    #[serde(default)]
    pub highlighter: HighlighterKind,
    #[serde(default)]
    pub panels: Vec<PanelSpec>,
    #[serde(default = "default_setup_module")]
    pub setup_module: String,
}

impl PageConfig {
    /// Configuration of the documentation page, with the chosen highlighter.
    pub fn documentation(highlighter: HighlighterKind) -> Self {
        let backend = highlighter.backend();

        let loader = LoaderConfig::new(crate::defaults::BASE_URL)
            .path("jquery", "jquery-1.8.3")
            .path("jqueryui", "ui/jquery-ui-1.9.2.custom")
            .path(backend.name(), backend.locator())
            .path("bootstrap", "bootstrap/js/bootstrap")
            .path("scrollAdjust", "scroll-adjust")
            .path("tocCreator", "toc-creator")
            .path("setup", "setup")
            .shim("jqueryui", ["jquery"])
            .shim("bootstrap", ["jquery"])
            .shim("tocCreator", ["jquery"])
            .exports(backend.name(), backend.exports());

        let modules = [
            "jquery",
            "jqueryui",
            "scrollAdjust",
            "bootstrap",
            backend.name(),
            "tocCreator",
            "setup",
        ]
        .into_iter()
        .map(String::from)
        .collect();

        let panels = vec![
            PanelSpec {
                selector: "#accordion".to_string(),
                options: AccordionOptions {
                    auto_height: false,
                    header: Some("h3".to_string()),
                    collapsible: true,
                    active: Some(Active::Closed),
                },
            },
            PanelSpec {
                selector: "#whats-new-accordion".to_string(),
                options: AccordionOptions {
                    auto_height: false,
                    ..Default::default()
                },
            },
        ];

        Self {
            loader,
            modules,
            highlighter,
            panels,
            setup_module: default_setup_module(),
        }
    }

    /// Parse a page configuration from JSON.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Result of a successful boot.
#[derive(Debug)]
pub struct ActivatedPage {
    pub panels: Vec<Accordion>,
    /// Name of the highlighting backend that ran
    pub highlighter: String,
}

impl ActivatedPage {
    pub fn panel(&self, selector: &str) -> Option<&Accordion> {
        self.panels.iter().find(|p| p.selector() == selector)
    }

    pub fn panel_mut(&mut self, selector: &str) -> Option<&mut Accordion> {
        self.panels.iter_mut().find(|p| p.selector() == selector)
    }
}

/// Boots a page: loads its modules, then activates it.
pub struct PageScript {
    config: PageConfig,
    highlighter: Box<dyn HighlightBackend>,
}

impl PageScript {
    /// Create a script using the backend named by `config.highlighter`.
    pub fn new(config: PageConfig) -> Result<Self> {
        let highlighter = config.highlighter.backend();
        Self::with_highlighter(config, highlighter)
    }

    /// Create a script with a substituted highlighting backend.
    pub fn with_highlighter(
        config: PageConfig,
        highlighter: Box<dyn HighlightBackend>,
    ) -> Result<Self> {
        for required in [config.setup_module.as_str(), highlighter.name()] {
            if !config.modules.iter().any(|m| m == required) {
                return Err(PageError::MissingModule(required.to_string()).into());
            }
        }
        Ok(Self {
            config,
            highlighter,
        })
    }

    pub fn config(&self) -> &PageConfig {
        &self.config
    }

    /// Bootstrapper over this page's loader configuration.
    pub fn bootstrapper(&self) -> Result<Bootstrapper> {
        Bootstrapper::from_config(&self.config.loader)
    }

    /// Load every module, then activate the page exactly once.
    ///
    /// Load failures leave the page untouched. A failing continuation is
    /// reported as-is; widgets it already attached stay attached.
    pub async fn boot(
        &self,
        bootstrapper: &Bootstrapper,
        page: &mut dyn PageContext,
    ) -> Result<ActivatedPage> {
        let activated = bootstrapper
            .request(self.config.modules.iter().cloned())
            .run(|handles| self.activate(&handles, page))
            .await?;

        match activated {
            Ok(activated) => Ok(activated),
            Err(e) => {
                log::error!("Page continuation failed: {}", e);
                Err(e.into())
            }
        }
    }

    /// The continuation body: setup, then panels, then highlighting.
    pub fn activate(
        &self,
        handles: &Handles,
        page: &mut dyn PageContext,
    ) -> std::result::Result<ActivatedPage, PageError> {
        let setup = handles
            .by_name(&self.config.setup_module)
            .ok_or_else(|| PageError::MissingModule(self.config.setup_module.clone()))?;
        page.run_setup(setup)?;

        let mut panels = Vec::with_capacity(self.config.panels.len());
        for panel in &self.config.panels {
            let sections = page.attach_accordion(&panel.selector, &panel.options)?;
            log::debug!("Attached accordion '{}' ({} sections)", panel.selector, sections);
            panels.push(Accordion::new(panel.selector.clone(), panel.options.clone(), sections));
        }

        let module = handles
            .by_name(self.highlighter.name())
            .ok_or_else(|| PageError::MissingModule(self.highlighter.name().to_string()))?;
        self.highlighter.highlight_all(page, module)?;

        log::info!("Page activated with {} highlighting", self.highlighter.name());
        Ok(ActivatedPage {
            panels,
            highlighter: self.highlighter.name().to_string(),
        })
    }
}
