//! Collapsible-panel (accordion) options and per-instance state.

use serde::{Deserialize, Serialize, Serializer};

/// Which section starts open. Serialized as `false` or a section index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "ActiveRepr")]
pub enum Active {
    /// All sections closed (honored only when collapsible)
    Closed,
    Section(usize),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ActiveRepr {
    Section(usize),
    Flag(bool),
}

impl From<ActiveRepr> for Active {
    fn from(repr: ActiveRepr) -> Self {
        match repr {
            ActiveRepr::Section(index) => Active::Section(index),
            ActiveRepr::Flag(false) => Active::Closed,
            ActiveRepr::Flag(true) => Active::Section(0),
        }
    }
}

impl Serialize for Active {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Active::Closed => serializer.serialize_bool(false),
            Active::Section(index) => serializer.serialize_u64(*index as u64),
        }
    }
}

fn default_auto_height() -> bool {
    true
}

/// Accordion widget configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccordionOptions {
    /// Whether panel height adapts to content
    #[serde(default = "default_auto_height")]
    pub auto_height: bool,
    /// Selector for the clickable section headers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
    /// Whether all sections may be closed at once
    #[serde(default)]
    pub collapsible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<Active>,
}

impl Default for AccordionOptions {
    fn default() -> Self {
        Self {
            auto_height: default_auto_height(),
            header: None,
            collapsible: false,
            active: None,
        }
    }
}

/// State of one accordion instance. Instances own their state outright.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accordion {
    selector: String,
    options: AccordionOptions,
    sections: usize,
    open: Option<usize>,
}

impl Accordion {
    /// Create an instance over `sections` sections.
    ///
    /// Without `collapsible`, a closed or out-of-range `active` falls back to
    /// the first section.
    pub fn new(selector: impl Into<String>, options: AccordionOptions, sections: usize) -> Self {
        let open = match options.active {
            Some(Active::Closed) if options.collapsible => None,
            Some(Active::Section(index)) if index < sections => Some(index),
            _ => (sections > 0).then_some(0),
        };

        Self {
            selector: selector.into(),
            options,
            sections,
            open,
        }
    }

    pub fn selector(&self) -> &str {
        &self.selector
    }

    pub fn options(&self) -> &AccordionOptions {
        &self.options
    }

    pub fn sections(&self) -> usize {
        self.sections
    }

    pub fn open_section(&self) -> Option<usize> {
        self.open
    }

    pub fn is_open(&self, index: usize) -> bool {
        self.open == Some(index)
    }

    /// Activate a section header. Returns whether the state changed.
    ///
    /// Opening a section closes the previously open one; activating the
    /// open section closes it only when collapsible.
    pub fn activate(&mut self, index: usize) -> bool {
        if index >= self.sections {
            return false;
        }

        if self.open == Some(index) {
            if self.options.collapsible {
                self.open = None;
                return true;
            }
            return false;
        }

        self.open = Some(index);
        true
    }

    /// Close every section, if collapsible.
    pub fn collapse_all(&mut self) -> bool {
        if !self.options.collapsible || self.open.is_none() {
            return false;
        }
        self.open = None;
        true
    }
}
