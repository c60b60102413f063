#![forbid(unsafe_code)]

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use blobmark_core::age::{AgeClass, refresh_interval};
use blobmark_core::theme::{THEME_ATTRIBUTE, Theme, ThemeApplication, ThemePreference};
use blobmark_core::{
    BlobmarkConfig, BlobmarkError, HighlightController, PointerButton, Result, fragment,
};
use tracing::{debug, trace, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, Event, EventTarget, MouseEvent, Node, Window};

use crate::dom::{BlobView, DomHost, DomNode, LocalThemeStore, elements, js_error, js_reason};
use crate::page::{
    AGE_TIMESTAMP_ATTRIBUTE, modifiers_from_flags, parse_timestamp, plan_age_update, unix_seconds,
};

type Controller = Rc<RefCell<HighlightController<DomHost>>>;
type SharedTheme = Rc<RefCell<ThemePreference<LocalThemeStore>>>;

fn to_js(error: &BlobmarkError) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn browser() -> Result<(Window, Document)> {
    let window = web_sys::window().ok_or_else(|| BlobmarkError::host("window", "no global window"))?;
    let document = window
        .document()
        .ok_or_else(|| BlobmarkError::host("document", "window has no document"))?;
    Ok((window, document))
}

/// Node an event was dispatched to, if it is a DOM node.
fn event_node(event: &Event) -> Option<DomNode> {
    event
        .target()
        .and_then(|target| target.dyn_into::<Node>().ok())
        .map(DomNode)
}

/// One installed DOM listener; removed again on detach.
struct Listener {
    target: EventTarget,
    kind: &'static str,
    callback: Closure<dyn FnMut(Event)>,
}

/// Apply the stored theme to the root element before first paint.
///
/// Safe to call from an inline script in `<head>`; never throws.
#[wasm_bindgen(js_name = initTheme)]
pub fn init_theme(theme_key: Option<String>) {
    let Ok((window, document)) = browser() else {
        return;
    };
    let key = theme_key.unwrap_or_else(|| BlobmarkConfig::default().theme_key);
    let preference = ThemePreference::new(LocalThemeStore::new(&window, &key));
    if let (Some(theme), Some(root)) = (preference.initial_attribute(), document.document_element())
        && let Err(error) = root.set_attribute(THEME_ATTRIBUTE, theme.as_str())
    {
        warn!(target: "blobmark::theme", reason = %js_reason(&error), "initial theme not applied");
    }
}

/// Install blobmark on the current document.
///
/// `config_json` is an optional JSON object (see `BlobmarkConfig`); `None`
/// uses defaults. Only configuration errors are reported; a page without a
/// blob view still gets theme and age handling.
#[wasm_bindgen(js_name = start)]
pub fn start(config_json: Option<String>) -> std::result::Result<BlobmarkPage, JsValue> {
    let config =
        BlobmarkConfig::from_optional_json(config_json.as_deref()).map_err(|error| to_js(&error))?;
    let (window, document) = browser().map_err(|error| to_js(&error))?;
    let mut page = BlobmarkPage {
        theme: Rc::new(RefCell::new(ThemePreference::new(LocalThemeStore::new(
            &window,
            &config.theme_key,
        )))),
        window,
        document,
        config,
        controller: None,
        listeners: Vec::new(),
        aging: None,
    };
    page.install_theme();
    if page.config.age_refresh {
        page.aging = Some(AgingLoop::start(page.window.clone(), page.document.clone()));
    }
    if let Err(error) = page.install_highlight() {
        warn!(target: "blobmark::web", %error, "line selection not installed");
    }
    debug!(
        target: "blobmark::web",
        highlight = page.controller.is_some(),
        listeners = page.listeners.len(),
        aging = page.aging.is_some(),
        "blobmark started"
    );
    Ok(page)
}

/// Handle for an installed page. Dropping it (or calling `destroy`) removes
/// every listener and stops the age refresh.
#[wasm_bindgen]
pub struct BlobmarkPage {
    window: Window,
    document: Document,
    config: BlobmarkConfig,
    controller: Option<Controller>,
    theme: SharedTheme,
    listeners: Vec<Listener>,
    aging: Option<Rc<AgingLoop>>,
}

#[wasm_bindgen]
impl BlobmarkPage {
    /// Whether a blob view was found and line selection is active.
    #[wasm_bindgen(js_name = hasBlobView)]
    pub fn has_blob_view(&self) -> bool {
        self.controller.is_some()
    }

    /// Fragment body for the highlighted range (`n3-7`), if any.
    #[wasm_bindgen(js_name = selectedFragment)]
    pub fn selected_fragment(&self) -> Option<String> {
        let controller = self.controller.as_ref()?.try_borrow().ok()?;
        controller.state().highlighted().map(fragment::encode)
    }

    /// JSON line describing the most recent selection transition.
    #[wasm_bindgen(js_name = lastTransitionJsonl)]
    pub fn last_transition_jsonl(&self) -> Option<String> {
        self.controller
            .as_ref()?
            .try_borrow()
            .ok()?
            .transition_jsonl()
    }

    /// Advance the theme preference; returns the toggle label.
    #[wasm_bindgen(js_name = cycleTheme)]
    pub fn cycle_theme(&self) -> String {
        let applied = self.theme.borrow_mut().cycle();
        apply_theme(&self.document, &self.config.theme_toggle_id, applied);
        applied.label().to_owned()
    }

    /// Set the theme by name (`auto`, `light`, `dark`).
    #[wasm_bindgen(js_name = setTheme)]
    pub fn set_theme(&self, name: &str) -> std::result::Result<String, JsValue> {
        let theme = Theme::parse(name)
            .ok_or_else(|| JsValue::from_str(&format!("unknown theme: {name}")))?;
        let applied = self.theme.borrow_mut().set(theme);
        apply_theme(&self.document, &self.config.theme_toggle_id, applied);
        Ok(applied.label().to_owned())
    }

    /// Remove listeners and stop the age refresh. Idempotent.
    pub fn destroy(&mut self) {
        self.detach();
    }
}

impl Drop for BlobmarkPage {
    fn drop(&mut self) {
        self.detach();
    }
}

impl BlobmarkPage {
    fn detach(&mut self) {
        for listener in self.listeners.drain(..) {
            if let Err(error) = listener
                .target
                .remove_event_listener_with_callback(listener.kind, listener.callback.as_ref().unchecked_ref())
            {
                warn!(target: "blobmark::web", kind = listener.kind, reason = %js_reason(&error), "listener not removed");
            }
        }
        if let Some(aging) = self.aging.take() {
            aging.stop();
        }
        self.controller = None;
    }

    fn listen<F>(&mut self, target: &EventTarget, kind: &'static str, handler: F) -> Result<()>
    where
        F: FnMut(Event) + 'static,
    {
        let callback = Closure::<dyn FnMut(Event)>::wrap(Box::new(handler));
        target
            .add_event_listener_with_callback(kind, callback.as_ref().unchecked_ref())
            .map_err(|error| js_error("add_event_listener", &error))?;
        self.listeners.push(Listener {
            target: target.clone(),
            kind,
            callback,
        });
        Ok(())
    }

    fn install_theme(&mut self) {
        let current = {
            let preference = self.theme.borrow();
            if let (Some(theme), Some(root)) =
                (preference.initial_attribute(), self.document.document_element())
                && let Err(error) = root.set_attribute(THEME_ATTRIBUTE, theme.as_str())
            {
                warn!(target: "blobmark::theme", reason = %js_reason(&error), "initial theme not applied");
            }
            preference.current()
        };
        set_toggle_label(&self.document, &self.config.theme_toggle_id, current.as_str());

        let Some(toggle) = self.document.get_element_by_id(&self.config.theme_toggle_id) else {
            return;
        };
        let theme = Rc::clone(&self.theme);
        let document = self.document.clone();
        let toggle_id = self.config.theme_toggle_id.clone();
        let installed = self.listen(&toggle, "click", move |_event| {
            let Ok(mut preference) = theme.try_borrow_mut() else {
                return;
            };
            let applied = preference.cycle();
            drop(preference);
            apply_theme(&document, &toggle_id, applied);
        });
        if let Err(error) = installed {
            warn!(target: "blobmark::theme", %error, "theme toggle not wired");
        }
    }

    fn install_highlight(&mut self) -> Result<()> {
        let Some(view) = BlobView::locate(&self.document, &self.config)? else {
            debug!(target: "blobmark::web", selector = %self.config.blob_selector, "no blob view on page");
            return Ok(());
        };
        let last_line = view.disarm_anchors()?;
        let gutter: EventTarget = view.gutter.clone().into();
        let host = DomHost::new(
            self.window.clone(),
            self.document.clone(),
            view,
            &self.config,
            last_line,
        );
        let controller: Controller = Rc::new(RefCell::new(HighlightController::new(host, &self.config)));
        self.controller = Some(Rc::clone(&controller));

        self.listen(&gutter, "selectstart", |event| event.prevent_default())?;

        let pressed = Rc::clone(&controller);
        self.listen(&gutter, "mousedown", move |event| {
            let Some(mouse) = event.dyn_ref::<MouseEvent>() else {
                return;
            };
            let Some(target) = event_node(&event) else {
                return;
            };
            with_controller(&pressed, "mousedown", |controller| {
                let dispatch = controller.press(
                    target,
                    PointerButton::from_dom(mouse.button()),
                    modifiers_from_flags(
                        mouse.shift_key(),
                        mouse.alt_key(),
                        mouse.ctrl_key(),
                        mouse.meta_key(),
                    ),
                );
                if dispatch.transition.noop.is_none() {
                    event.prevent_default();
                }
            });
        })?;

        let hovered = Rc::clone(&controller);
        self.listen(&gutter, "mouseover", move |event| {
            let Some(target) = event_node(&event) else {
                return;
            };
            with_controller(&hovered, "mouseover", |controller| {
                controller.hover(target);
            });
        })?;

        let released = Rc::clone(&controller);
        let document: EventTarget = self.document.clone().into();
        self.listen(&document, "mouseup", move |event| {
            with_controller(&released, "mouseup", |controller| {
                controller.release(event_node(&event));
            });
        })?;

        let window: EventTarget = self.window.clone().into();
        let blurred = Rc::clone(&controller);
        self.listen(&window, "blur", move |_event| {
            with_controller(&blurred, "blur", |controller| {
                controller.focus_lost();
            });
        })?;

        let navigated = Rc::clone(&controller);
        let location = self.window.location();
        self.listen(&window, "hashchange", move |_event| {
            let hash = location.hash().unwrap_or_default();
            with_controller(&navigated, "hashchange", |controller| {
                controller.navigate(&hash);
            });
        })?;

        let hash = self.window.location().hash().unwrap_or_default();
        controller.borrow_mut().restore(&hash);
        debug!(
            target: "blobmark::web",
            last_line = ?last_line,
            hash = %hash,
            "line selection installed"
        );
        Ok(())
    }
}

/// Run `f` unless the controller is already borrowed by an outer handler.
fn with_controller<F>(controller: &Controller, kind: &'static str, f: F)
where
    F: FnOnce(&mut HighlightController<DomHost>),
{
    match controller.try_borrow_mut() {
        Ok(mut controller) => f(&mut controller),
        Err(_) => trace!(target: "blobmark::web", kind, "re-entrant event skipped"),
    }
}

fn set_toggle_label(document: &Document, toggle_id: &str, label: &str) {
    if let Some(toggle) = document.get_element_by_id(toggle_id) {
        toggle.set_text_content(Some(label));
    }
}

fn apply_theme(document: &Document, toggle_id: &str, applied: ThemeApplication) {
    if let Some(root) = document.document_element() {
        let outcome = match applied.attribute {
            Some(theme) => root.set_attribute(THEME_ATTRIBUTE, theme.as_str()),
            None => root.remove_attribute(THEME_ATTRIBUTE),
        };
        if let Err(error) = outcome {
            warn!(target: "blobmark::theme", theme = %applied.theme, reason = %js_reason(&error), "theme attribute not applied");
        }
    }
    set_toggle_label(document, toggle_id, applied.label());
}

/// Self-rescheduling refresh of relative age labels.
struct AgingLoop {
    window: Window,
    document: Document,
    timeout: Cell<Option<i32>>,
    tick: RefCell<Option<Closure<dyn FnMut()>>>,
}

impl AgingLoop {
    fn start(window: Window, document: Document) -> Rc<Self> {
        let aging = Rc::new(Self {
            window,
            document,
            timeout: Cell::new(None),
            tick: RefCell::new(None),
        });
        let weak: Weak<Self> = Rc::downgrade(&aging);
        let tick = Closure::<dyn FnMut()>::wrap(Box::new(move || {
            if let Some(aging) = weak.upgrade() {
                aging.run();
            }
        }));
        *aging.tick.borrow_mut() = Some(tick);
        aging.run();
        aging
    }

    fn run(&self) {
        self.timeout.set(None);
        let present = self.refresh();
        let delay = refresh_interval(present.iter().copied());
        let Ok(tick) = self.tick.try_borrow() else {
            return;
        };
        let Some(tick) = tick.as_ref() else {
            return;
        };
        let millis = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
        match self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(tick.as_ref().unchecked_ref(), millis)
        {
            Ok(handle) => self.timeout.set(Some(handle)),
            Err(error) => {
                warn!(target: "blobmark::age", reason = %js_reason(&error), "age refresh not rescheduled");
            }
        }
    }

    /// Rewrite every age label; returns the buckets that were present.
    fn refresh(&self) -> Vec<AgeClass> {
        let Some(now) = unix_seconds(js_sys::Date::now()) else {
            return Vec::new();
        };
        let mut present = Vec::new();
        let mut updated = 0u32;
        for class in AgeClass::ALL {
            let elements = match self.elements_with_class(class.css_class()) {
                Ok(elements) => elements,
                Err(error) => {
                    warn!(target: "blobmark::age", class = class.css_class(), %error, "age lookup failed");
                    continue;
                }
            };
            if elements.is_empty() {
                continue;
            }
            present.push(class);
            for element in elements {
                let Some(timestamp) = element
                    .get_attribute(AGE_TIMESTAMP_ATTRIBUTE)
                    .as_deref()
                    .and_then(parse_timestamp)
                else {
                    continue;
                };
                let text = element.text_content().unwrap_or_default();
                if let Some(update) = plan_age_update(now, timestamp, &text, &element.class_name()) {
                    element.set_text_content(Some(&update.text));
                    if let Some(class) = update.class {
                        element.set_class_name(class);
                    }
                    updated = updated.saturating_add(1);
                }
            }
        }
        trace!(target: "blobmark::age", now, updated, buckets = present.len(), "age labels refreshed");
        present
    }

    /// Snapshot of the matching elements; updates may change their class.
    fn elements_with_class(&self, class: &str) -> Result<Vec<Element>> {
        self.document
            .query_selector_all(&format!(".{class}"))
            .map(|list| elements(&list))
            .map_err(|error| js_error("query_selector_all", &error))
    }

    fn stop(&self) {
        if let Some(handle) = self.timeout.take() {
            self.window.clear_timeout_with_handle(handle);
        }
        self.tick.borrow_mut().take();
    }
}
