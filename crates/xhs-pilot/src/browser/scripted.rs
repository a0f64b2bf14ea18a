//! In-memory browser for tests, enabled by the `testing` feature.
//!
//! Pages are served from [`Fixture`]s registered by URL prefix. A fixture holds
//! the hydrated state object and a flat selector-to-elements DOM. Interactions
//! can be wired to effects that mutate the fixture, standing in for the
//! platform's server-side state. Extraction scripts are answered by running
//! the same schema projection the in-page walker performs.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;

use super::{Browser, PageHandle, HYDRATION_PROBE, STABILITY_PROBE};
use crate::extractor;
use crate::types::{PilotError, PilotResult};

/// A fake element: visible text plus attributes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScriptedElement {
    pub text: String,
    pub attrs: HashMap<String, String>,
}

impl ScriptedElement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }
}

/// Content served for one URL prefix.
#[derive(Debug, Clone, Default)]
pub struct Fixture {
    /// Value of the client state global, `None` when never hydrated.
    pub state: Option<Value>,
    pub elements: HashMap<String, Vec<ScriptedElement>>,
    /// Text typed into each selector, accumulated.
    pub inputs: HashMap<String, String>,
    /// Overrides the reported URL, e.g. after a redirect.
    pub url: Option<String>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(mut self, state: Value) -> Self {
        self.state = Some(state);
        self
    }

    pub fn with_element(mut self, selector: &str, element: ScriptedElement) -> Self {
        self.add_element(selector, element);
        self
    }

    pub fn add_element(&mut self, selector: &str, element: ScriptedElement) {
        self.elements
            .entry(selector.to_string())
            .or_default()
            .push(element);
    }

    pub fn remove_elements(&mut self, selector: &str) {
        self.elements.remove(selector);
    }

    pub fn count(&self, selector: &str) -> usize {
        self.elements.get(selector).map(Vec::len).unwrap_or(0)
    }

    /// Mutable access to a value inside the state by dotted path.
    pub fn state_at(&mut self, path: &str) -> Option<&mut Value> {
        path.split('.')
            .try_fold(self.state.as_mut()?, |cur, seg| match cur {
                Value::Object(map) => map.get_mut(seg),
                Value::Array(items) => seg.parse::<usize>().ok().and_then(|i| items.get_mut(i)),
                _ => None,
            })
    }
}

/// Something the page was asked to do.
#[derive(Debug, Clone, PartialEq)]
pub enum PageEvent {
    Navigate(String),
    Click(String),
    ClickText(String, String),
    Type(String, String),
    Upload(String, Vec<PathBuf>),
}

type Effect = Arc<dyn Fn(&mut Fixture) + Send + Sync>;

#[derive(Default)]
struct World {
    routes: Vec<(String, Fixture)>,
    effects: HashMap<String, Effect>,
    events: Vec<PageEvent>,
    cookies: Vec<Value>,
    active: usize,
}

impl World {
    fn route_for(&self, url: &str) -> Option<String> {
        self.routes
            .iter()
            .filter(|(prefix, _)| url.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(prefix, _)| prefix.clone())
    }

    fn fixture(&self, route: Option<&str>) -> Option<&Fixture> {
        let route = route?;
        self.routes.iter().find(|(p, _)| p == route).map(|(_, f)| f)
    }

    fn fixture_mut(&mut self, route: Option<&str>) -> Option<&mut Fixture> {
        let route = route?;
        self.routes.iter_mut().find(|(p, _)| p == route).map(|(_, f)| f)
    }

    /// Run the effect registered for `selector` against the current fixture.
    fn fire(&mut self, route: Option<&str>, selector: &str) {
        if let Some(effect) = self.effects.get(selector).cloned() {
            if let Some(fixture) = self.fixture_mut(route) {
                effect(fixture);
            }
        }
    }
}

#[derive(Default)]
struct Behaviour {
    never_stable: AtomicBool,
    fail_navigation: AtomicBool,
    panic_on_navigation: AtomicBool,
}

/// A browser whose pages are backed by in-memory fixtures.
#[derive(Clone, Default)]
pub struct ScriptedBrowser {
    world: Arc<Mutex<World>>,
    behaviour: Arc<Behaviour>,
}

impl ScriptedBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `fixture` for every URL starting with `prefix`. Longest prefix wins.
    pub fn route(&self, prefix: impl Into<String>, fixture: Fixture) -> &Self {
        let prefix = prefix.into();
        let mut world = self.world();
        world.routes.retain(|(p, _)| *p != prefix);
        world.routes.push((prefix, fixture));
        self
    }

    /// Run `effect` on the current fixture whenever `selector` is clicked,
    /// typed into or given files.
    pub fn on(&self, selector: &str, effect: impl Fn(&mut Fixture) + Send + Sync + 'static) -> &Self {
        self.world()
            .effects
            .insert(selector.to_string(), Arc::new(effect));
        self
    }

    /// Mutate a registered fixture from outside, e.g. to simulate a scan.
    pub fn update(&self, prefix: &str, f: impl FnOnce(&mut Fixture)) {
        if let Some(fixture) = self.world().fixture_mut(Some(prefix)) {
            f(fixture);
        }
    }

    /// Snapshot of a registered fixture.
    pub fn fixture(&self, prefix: &str) -> Option<Fixture> {
        self.world().fixture(Some(prefix)).cloned()
    }

    pub fn set_never_stable(&self, on: bool) {
        self.behaviour.never_stable.store(on, Ordering::SeqCst);
    }

    pub fn set_fail_navigation(&self, on: bool) {
        self.behaviour.fail_navigation.store(on, Ordering::SeqCst);
    }

    pub fn set_panic_on_navigation(&self, on: bool) {
        self.behaviour.panic_on_navigation.store(on, Ordering::SeqCst);
    }

    pub fn set_cookies(&self, cookies: Vec<Value>) {
        self.world().cookies = cookies;
    }

    pub fn events(&self) -> Vec<PageEvent> {
        self.world().events.clone()
    }

    /// Selectors clicked so far, including text-matched clicks.
    pub fn clicks(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                PageEvent::Click(s) | PageEvent::ClickText(s, _) => Some(s),
                _ => None,
            })
            .collect()
    }

    pub fn visited(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                PageEvent::Navigate(url) => Some(url),
                _ => None,
            })
            .collect()
    }

    fn world(&self) -> MutexGuard<'_, World> {
        self.world.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl Browser for ScriptedBrowser {
    async fn new_page(&self) -> PilotResult<Arc<dyn PageHandle>> {
        self.world().active += 1;
        Ok(Arc::new(ScriptedPage {
            browser: self.clone(),
            route: Mutex::new(None),
            url: Mutex::new("about:blank".to_string()),
            ticks: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        }))
    }

    async fn shutdown(&self) -> PilotResult<()> {
        Ok(())
    }

    fn active_pages(&self) -> usize {
        self.world().active
    }
}

/// A page of a [`ScriptedBrowser`].
pub struct ScriptedPage {
    browser: ScriptedBrowser,
    route: Mutex<Option<String>>,
    url: Mutex<String>,
    ticks: AtomicU64,
    closed: AtomicBool,
}

impl ScriptedPage {
    fn route(&self) -> Option<String> {
        self.route.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn with_fixture<T>(&self, f: impl FnOnce(Option<&Fixture>) -> T) -> T {
        let route = self.route();
        let world = self.browser.world();
        f(world.fixture(route.as_deref()))
    }

    fn record(&self, event: PageEvent) {
        self.browser.world().events.push(event);
    }

    /// Record `event` and fire the effect for `selector` if it has elements.
    fn interact(&self, selector: &str, event: PageEvent) -> bool {
        let route = self.route();
        let mut world = self.browser.world();
        let present = world
            .fixture(route.as_deref())
            .map(|f| f.count(selector) > 0)
            .unwrap_or(false);
        if present {
            world.events.push(event);
            world.fire(route.as_deref(), selector);
        }
        present
    }
}

#[async_trait]
impl PageHandle for ScriptedPage {
    async fn goto(&self, url: &str) -> PilotResult<()> {
        if self.browser.behaviour.panic_on_navigation.load(Ordering::SeqCst) {
            panic!("scripted navigation panic for {url}");
        }
        self.record(PageEvent::Navigate(url.to_string()));
        if self.browser.behaviour.fail_navigation.load(Ordering::SeqCst) {
            return Err(PilotError::Browser(format!("net::ERR_CONNECTION_REFUSED at {url}")));
        }
        let route = self.browser.world().route_for(url);
        *self.route.lock().unwrap_or_else(|e| e.into_inner()) = route;
        *self.url.lock().unwrap_or_else(|e| e.into_inner()) = url.to_string();
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> PilotResult<Value> {
        if script == STABILITY_PROBE {
            let tick = if self.browser.behaviour.never_stable.load(Ordering::SeqCst) {
                self.ticks.fetch_add(1, Ordering::SeqCst)
            } else {
                0
            };
            return Ok(Value::String(format!("complete:{tick}")));
        }
        if script == HYDRATION_PROBE {
            return Ok(Value::Bool(self.with_fixture(|f| {
                f.and_then(|f| f.state.as_ref())
                    .map(Value::is_object)
                    .unwrap_or(false)
            })));
        }
        if let Some(recipe) = extractor::recipe_of(script) {
            let out = self.with_fixture(|f| recipe.run(f.and_then(|f| f.state.as_ref())));
            return Ok(Value::String(out));
        }
        Ok(Value::Null)
    }

    async fn click(&self, selector: &str) -> PilotResult<bool> {
        Ok(self.interact(selector, PageEvent::Click(selector.to_string())))
    }

    async fn click_text(&self, selector: &str, text: &str) -> PilotResult<bool> {
        let matched = self.with_fixture(|f| {
            f.and_then(|f| f.elements.get(selector))
                .map(|els| els.iter().any(|e| e.text.contains(text)))
                .unwrap_or(false)
        });
        if !matched {
            return Ok(false);
        }
        Ok(self.interact(
            selector,
            PageEvent::ClickText(selector.to_string(), text.to_string()),
        ))
    }

    async fn type_text(&self, selector: &str, text: &str) -> PilotResult<()> {
        let route = self.route();
        {
            let mut world = self.browser.world();
            match world.fixture_mut(route.as_deref()) {
                Some(f) if f.count(selector) > 0 => {
                    f.inputs
                        .entry(selector.to_string())
                        .or_default()
                        .push_str(text);
                }
                _ => return Err(PilotError::ElementNotFound(selector.to_string())),
            }
        }
        self.interact(
            selector,
            PageEvent::Type(selector.to_string(), text.to_string()),
        );
        Ok(())
    }

    async fn upload_files(&self, selector: &str, paths: &[PathBuf]) -> PilotResult<()> {
        if self.interact(selector, PageEvent::Upload(selector.to_string(), paths.to_vec())) {
            Ok(())
        } else {
            Err(PilotError::ElementNotFound(selector.to_string()))
        }
    }

    async fn element_count(&self, selector: &str) -> PilotResult<usize> {
        Ok(self.with_fixture(|f| f.map(|f| f.count(selector)).unwrap_or(0)))
    }

    async fn attribute(&self, selector: &str, name: &str) -> PilotResult<Option<String>> {
        Ok(self.with_fixture(|f| {
            f.and_then(|f| f.elements.get(selector))
                .and_then(|els| els.first())
                .and_then(|e| e.attrs.get(name).cloned())
        }))
    }

    async fn text_contents(&self, selector: &str) -> PilotResult<Vec<String>> {
        Ok(self.with_fixture(|f| {
            f.and_then(|f| f.elements.get(selector))
                .map(|els| els.iter().map(|e| e.text.trim().to_string()).collect())
                .unwrap_or_default()
        }))
    }

    async fn current_url(&self) -> PilotResult<String> {
        let overridden = self.with_fixture(|f| f.and_then(|f| f.url.clone()));
        Ok(overridden.unwrap_or_else(|| self.url.lock().unwrap_or_else(|e| e.into_inner()).clone()))
    }

    async fn export_cookies(&self) -> PilotResult<Vec<Value>> {
        Ok(self.browser.world().cookies.clone())
    }

    async fn import_cookies(&self, cookies: &[Value]) -> PilotResult<()> {
        self.browser.world().cookies = cookies.to_vec();
        Ok(())
    }

    async fn close(&self) -> PilotResult<()> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            let mut world = self.browser.world();
            world.active = world.active.saturating_sub(1);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_longest_prefix_route_wins() {
        let browser = ScriptedBrowser::new();
        browser
            .route("https://x.test/explore", Fixture::new().with_element(".list", ScriptedElement::new()))
            .route("https://x.test/explore/n1", Fixture::new().with_element(".detail", ScriptedElement::new()));
        let page = browser.new_page().await.unwrap();

        page.goto("https://x.test/explore/n1?token=a").await.unwrap();
        assert!(page.element_exists(".detail").await.unwrap());
        assert!(!page.element_exists(".list").await.unwrap());

        page.goto("https://x.test/explore").await.unwrap();
        assert!(page.element_exists(".list").await.unwrap());
    }

    #[tokio::test]
    async fn test_click_fires_effect() {
        let browser = ScriptedBrowser::new();
        browser.route(
            "https://x.test/",
            Fixture::new()
                .with_state(json!({ "liked": false }))
                .with_element(".like", ScriptedElement::new()),
        );
        browser.on(".like", |f| {
            if let Some(v) = f.state_at("liked") {
                *v = json!(true);
            }
        });
        let page = browser.new_page().await.unwrap();
        page.goto("https://x.test/").await.unwrap();

        assert!(page.click(".like").await.unwrap());
        assert!(!page.click(".missing").await.unwrap());
        assert_eq!(browser.fixture("https://x.test/").unwrap().state, Some(json!({ "liked": true })));
        assert_eq!(browser.clicks(), vec![".like".to_string()]);
    }

    #[tokio::test]
    async fn test_type_requires_element() {
        let browser = ScriptedBrowser::new();
        browser.route("https://x.test/", Fixture::new().with_element("input", ScriptedElement::new()));
        let page = browser.new_page().await.unwrap();
        page.goto("https://x.test/").await.unwrap();

        page.type_text("input", "hello ").await.unwrap();
        page.type_text("input", "world").await.unwrap();
        assert_eq!(browser.fixture("https://x.test/").unwrap().inputs["input"], "hello world");
        assert!(matches!(
            page.type_text("textarea", "x").await,
            Err(PilotError::ElementNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let browser = ScriptedBrowser::new();
        let page = browser.new_page().await.unwrap();
        assert_eq!(browser.active_pages(), 1);
        page.close().await.unwrap();
        page.close().await.unwrap();
        assert_eq!(browser.active_pages(), 0);
    }

    #[tokio::test]
    async fn test_hydration_probe() {
        let browser = ScriptedBrowser::new();
        browser.route("https://x.test/a", Fixture::new());
        browser.route("https://x.test/b", Fixture::new().with_state(json!({})));
        let page = browser.new_page().await.unwrap();

        page.goto("https://x.test/a").await.unwrap();
        assert_eq!(page.evaluate(HYDRATION_PROBE).await.unwrap(), json!(false));
        page.goto("https://x.test/b").await.unwrap();
        assert_eq!(page.evaluate(HYDRATION_PROBE).await.unwrap(), json!(true));
    }
}
