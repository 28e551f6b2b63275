use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pageboot::{
    AccordionOptions, Bootstrapper, Declaration, DeclarationTable, FetchError, FetchFuture,
    LoadEvent, LoaderConfig, PageContext, PageError, Resource, ResourceFetcher,
};

/// Shared, ordered trace of everything that happened during a test.
#[derive(Clone, Default)]
pub(crate) struct Trace(Arc<Mutex<Vec<String>>>);

impl Trace {
    pub(crate) fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub(crate) fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub(crate) fn position(&self, entry: &str) -> usize {
        self.entries()
            .iter()
            .position(|e| e == entry)
            .unwrap_or_else(|| panic!("'{}' not in trace {:?}", entry, self.entries()))
    }

    pub(crate) fn count(&self, entry: &str) -> usize {
        self.entries().iter().filter(|e| *e == entry).count()
    }
}

/// In-memory fetcher with per-resource delays and failures.
#[derive(Default)]
pub(crate) struct ScriptedFetcher {
    delays: HashMap<String, Duration>,
    failures: HashMap<String, FetchError>,
    bodies: HashMap<String, Vec<u8>>,
    trace: Trace,
}

impl ScriptedFetcher {
    pub(crate) fn new(trace: &Trace) -> Self {
        Self {
            trace: trace.clone(),
            ..Default::default()
        }
    }

    pub(crate) fn delay(mut self, name: &str, millis: u64) -> Self {
        self.delays
            .insert(name.to_string(), Duration::from_millis(millis));
        self
    }

    pub(crate) fn fail(mut self, name: &str) -> Self {
        self.failures.insert(
            name.to_string(),
            FetchError::Status {
                url: format!("{}.js", name),
                status: 404,
            },
        );
        self
    }

    pub(crate) fn body(mut self, name: &str, body: &str) -> Self {
        self.bodies.insert(name.to_string(), body.as_bytes().to_vec());
        self
    }
}

impl ResourceFetcher for ScriptedFetcher {
    fn fetch<'a>(&'a self, declaration: &'a Declaration) -> FetchFuture<'a> {
        Box::pin(async move {
            let name = declaration.name.as_str();
            self.trace.push(format!("fetch:{}", name));

            if let Some(delay) = self.delays.get(name) {
                tokio::time::sleep(*delay).await;
            }

            if let Some(err) = self.failures.get(name) {
                return Err(err.clone());
            }

            Ok(self
                .bodies
                .get(name)
                .cloned()
                .unwrap_or_else(|| format!("// {}", name).into_bytes()))
        })
    }
}

/// Bootstrapper whose load events are appended to `trace`.
pub(crate) fn traced_bootstrapper(
    config: &LoaderConfig,
    fetcher: ScriptedFetcher,
    trace: &Trace,
) -> Bootstrapper {
    let table = DeclarationTable::register(config).expect("declarations should register");
    let events = trace.clone();
    Bootstrapper::new(Arc::new(table), Arc::new(fetcher)).with_observer(Arc::new(
        move |event: &LoadEvent| {
            let entry = match event {
                LoadEvent::Requested { name, .. } => format!("requested:{}", name),
                LoadEvent::Available { name } => format!("available:{}", name),
                LoadEvent::Failed { name, .. } => format!("failed:{}", name),
                LoadEvent::Fired { .. } => "fired".to_string(),
            };
            events.push(entry);
        },
    ))
}

/// Page collaborator that records every call.
#[derive(Default)]
pub(crate) struct RecordingPage {
    pub(crate) calls: Vec<String>,
    pub(crate) sections: HashMap<String, usize>,
    pub(crate) failing_entry_point: Option<String>,
}

impl RecordingPage {
    pub(crate) fn with_sections(sections: &[(&str, usize)]) -> Self {
        Self {
            sections: sections
                .iter()
                .map(|(selector, count)| (selector.to_string(), *count))
                .collect(),
            ..Default::default()
        }
    }
}

impl PageContext for RecordingPage {
    fn run_setup(&mut self, setup: &Resource) -> Result<(), PageError> {
        self.calls.push(format!("setup:{}", setup.name));
        Ok(())
    }

    fn attach_accordion(
        &mut self,
        selector: &str,
        options: &AccordionOptions,
    ) -> Result<usize, PageError> {
        let sections = *self
            .sections
            .get(selector)
            .ok_or_else(|| PageError::MissingElement(selector.to_string()))?;
        self.calls.push(format!(
            "accordion:{}:collapsible={}",
            selector, options.collapsible
        ));
        Ok(sections)
    }

    fn invoke(&mut self, module: &Resource, entry_point: &str) -> Result<(), PageError> {
        if self.failing_entry_point.as_deref() == Some(entry_point) {
            return Err(PageError::EntryPoint {
                entry_point: entry_point.to_string(),
                reason: "not a function".to_string(),
            });
        }
        self.calls.push(format!("invoke:{}:{}", module.name, entry_point));
        Ok(())
    }
}
