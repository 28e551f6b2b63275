//! Documentation page boot: setup, accordions, highlighting.

use pageboot::{
    Active, Error, HighlightBackend, HighlighterKind, PageConfig, PageContext, PageError,
    PageScript, Resource,
};

use crate::fixture::{traced_bootstrapper, RecordingPage, ScriptedFetcher, Trace};

const SECTIONS: [(&str, usize); 2] = [("#accordion", 4), ("#whats-new-accordion", 3)];

#[tokio::test]
async fn test_prism_page_boot_order() {
    let trace = Trace::default();
    let config = PageConfig::documentation(HighlighterKind::Prism);
    let boot = traced_bootstrapper(&config.loader, ScriptedFetcher::new(&trace), &trace);
    let script = PageScript::new(config).unwrap();

    let mut page = RecordingPage::with_sections(&SECTIONS);
    let activated = script.boot(&boot, &mut page).await.unwrap();

    assert_eq!(
        page.calls,
        vec![
            "setup:setup",
            "accordion:#accordion:collapsible=true",
            "accordion:#whats-new-accordion:collapsible=false",
            "invoke:prism:Prism.highlightAll",
        ]
    );
    assert_eq!(activated.highlighter, "prism");
    assert_eq!(trace.count("fired"), 1);
    for module in ["jquery", "jqueryui", "scrollAdjust", "bootstrap", "prism", "tocCreator", "setup"] {
        assert_eq!(trace.count(&format!("fetch:{}", module)), 1, "{}", module);
    }
    assert!(trace.position("available:jquery") < trace.position("requested:tocCreator"));
    assert!(trace.position("available:jquery") < trace.position("requested:jqueryui"));
    assert!(trace.position("available:jquery") < trace.position("requested:bootstrap"));
}

#[tokio::test]
async fn test_prettify_page_boot() {
    let trace = Trace::default();
    let config = PageConfig::documentation(HighlighterKind::Prettify);
    let boot = traced_bootstrapper(&config.loader, ScriptedFetcher::new(&trace), &trace);
    let script = PageScript::new(config).unwrap();

    let mut page = RecordingPage::with_sections(&SECTIONS);
    let activated = script.boot(&boot, &mut page).await.unwrap();

    assert_eq!(activated.highlighter, "prettify");
    assert_eq!(page.calls.last().unwrap(), "invoke:prettify:PR.prettyPrint");
    assert_eq!(trace.count("fetch:prism"), 0);
}

#[tokio::test]
async fn test_panels_are_independent_instances() {
    let trace = Trace::default();
    let config = PageConfig::documentation(HighlighterKind::Prism);
    let boot = traced_bootstrapper(&config.loader, ScriptedFetcher::new(&trace), &trace);
    let script = PageScript::new(config).unwrap();

    let mut page = RecordingPage::with_sections(&SECTIONS);
    let mut activated = script.boot(&boot, &mut page).await.unwrap();
    assert_eq!(activated.panels.len(), 2);

    let faq = activated.panel("#accordion").unwrap();
    assert!(!faq.options().auto_height);
    assert!(faq.options().collapsible);
    assert_eq!(faq.options().active, Some(Active::Closed));
    assert_eq!(faq.options().header.as_deref(), Some("h3"));
    assert_eq!(faq.open_section(), None);

    let news = activated.panel("#whats-new-accordion").unwrap();
    assert!(!news.options().auto_height);
    assert!(!news.options().collapsible);
    assert_eq!(news.options().active, None);
    assert_eq!(news.open_section(), Some(0));

    // Mutating one leaves the other untouched
    assert!(activated.panel_mut("#accordion").unwrap().activate(2));
    assert!(activated.panel_mut("#whats-new-accordion").unwrap().activate(1));
    assert_eq!(activated.panel("#accordion").unwrap().open_section(), Some(2));
    assert_eq!(
        activated.panel("#whats-new-accordion").unwrap().open_section(),
        Some(1)
    );
    assert!(activated.panel_mut("#accordion").unwrap().collapse_all());
    assert_eq!(
        activated.panel("#whats-new-accordion").unwrap().open_section(),
        Some(1)
    );
}

#[tokio::test]
async fn test_load_failure_leaves_page_untouched() {
    let trace = Trace::default();
    let config = PageConfig::documentation(HighlighterKind::Prism);
    let fetcher = ScriptedFetcher::new(&trace).fail("bootstrap");
    let boot = traced_bootstrapper(&config.loader, fetcher, &trace);
    let script = PageScript::new(config).unwrap();

    let mut page = RecordingPage::with_sections(&SECTIONS);
    match script.boot(&boot, &mut page).await {
        Err(Error::LoadFailed { resource, .. }) => assert_eq!(resource, "bootstrap"),
        other => panic!("expected load failure, got {:?}", other.map(|p| p.highlighter)),
    }
    assert!(page.calls.is_empty());
}

#[tokio::test]
async fn test_continuation_error_keeps_partial_state() {
    let trace = Trace::default();
    let config = PageConfig::documentation(HighlighterKind::Prism);
    let boot = traced_bootstrapper(&config.loader, ScriptedFetcher::new(&trace), &trace);
    let script = PageScript::new(config).unwrap();

    // Second accordion region is missing from the page
    let mut page = RecordingPage::with_sections(&[("#accordion", 4)]);
    match script.boot(&boot, &mut page).await {
        Err(Error::Page(PageError::MissingElement(selector))) => {
            assert_eq!(selector, "#whats-new-accordion")
        }
        other => panic!("expected page error, got {:?}", other.map(|p| p.highlighter)),
    }
    assert_eq!(
        page.calls,
        vec!["setup:setup", "accordion:#accordion:collapsible=true"]
    );
}

#[tokio::test]
async fn test_highlight_entry_point_failure_surfaces() {
    let trace = Trace::default();
    let config = PageConfig::documentation(HighlighterKind::Prism);
    let boot = traced_bootstrapper(&config.loader, ScriptedFetcher::new(&trace), &trace);
    let script = PageScript::new(config).unwrap();

    let mut page = RecordingPage::with_sections(&SECTIONS);
    page.failing_entry_point = Some("Prism.highlightAll".to_string());

    let err = script.boot(&boot, &mut page).await.unwrap_err();
    assert!(matches!(err, Error::Page(PageError::EntryPoint { .. })));
    assert_eq!(page.calls.len(), 3);
}

/// A substitute backend only needs the "highlight everything" entry point.
struct Highlightjs;

impl HighlightBackend for Highlightjs {
    fn name(&self) -> &str {
        "hljs"
    }

    fn locator(&self) -> &str {
        "highlight/highlight.pack"
    }

    fn exports(&self) -> &str {
        "hljs"
    }

    fn highlight_all(&self, page: &mut dyn PageContext, module: &Resource) -> Result<(), PageError> {
        page.invoke(module, "hljs.initHighlighting")
    }
}

#[tokio::test]
async fn test_substituted_backend() {
    let trace = Trace::default();
    let mut config = PageConfig::documentation(HighlighterKind::Prism);
    config.loader = config
        .loader
        .path(Highlightjs.name(), Highlightjs.locator());
    for module in config.modules.iter_mut() {
        if *module == "prism" {
            *module = Highlightjs.name().to_string();
        }
    }

    let boot = traced_bootstrapper(&config.loader, ScriptedFetcher::new(&trace), &trace);
    let script = PageScript::with_highlighter(config, Box::new(Highlightjs)).unwrap();

    let mut page = RecordingPage::with_sections(&SECTIONS);
    let activated = script.boot(&boot, &mut page).await.unwrap();
    assert_eq!(activated.highlighter, "hljs");
    assert_eq!(page.calls.last().unwrap(), "invoke:hljs:hljs.initHighlighting");
    assert_eq!(trace.count("fetch:prism"), 0);
}
