#![forbid(unsafe_code)]

//! `web-sys` implementations of the core host traits.

use blobmark_core::config::ScrollBlock;
use blobmark_core::fragment::{anchor_id, parse_anchor_id};
use blobmark_core::theme::ThemeStore;
use blobmark_core::{
    BlobmarkConfig, BlobmarkError, HighlightHost, LineGeometry, LineNumber, LocatorNode,
    OverlayBounds, Rect, Result,
};
use tracing::debug;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    Document, Element, HtmlElement, Node, NodeList, ScrollIntoViewOptions, ScrollLogicalPosition,
    Storage, Window,
};

use crate::page::LINE_ANCHOR_SELECTOR;

/// Readable message for a thrown JS value.
pub(crate) fn js_reason(value: &JsValue) -> String {
    value
        .dyn_ref::<js_sys::Error>()
        .map(|error| String::from(error.message()))
        .or_else(|| value.as_string())
        .unwrap_or_else(|| format!("{value:?}"))
}

pub(crate) fn js_error(operation: &'static str, value: &JsValue) -> BlobmarkError {
    BlobmarkError::host(operation, js_reason(value))
}

/// Any DOM node an event can target.
#[derive(Debug, Clone)]
pub struct DomNode(pub Node);

impl LocatorNode for DomNode {
    fn tag_name(&self) -> Option<String> {
        self.0.dyn_ref::<Element>().map(Element::tag_name)
    }

    fn id(&self) -> Option<String> {
        self.0
            .dyn_ref::<Element>()
            .map(Element::id)
            .filter(|id| !id.is_empty())
    }

    fn parent(&self) -> Option<Self> {
        self.0.parent_node().map(Self)
    }
}

/// Elements of a static `NodeList`, in document order.
pub(crate) fn elements(list: &NodeList) -> Vec<Element> {
    (0..list.length())
        .filter_map(|index| list.item(index))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect()
}

/// Every element matched by `selector` below `root`.
pub(crate) fn query_all(root: &Element, selector: &str) -> Result<Vec<Element>> {
    root.query_selector_all(selector)
        .map(|list| elements(&list))
        .map_err(|error| js_error("query_selector_all", &error))
}

fn scroll_position(block: ScrollBlock) -> ScrollLogicalPosition {
    match block {
        ScrollBlock::Start => ScrollLogicalPosition::Start,
        ScrollBlock::Center => ScrollLogicalPosition::Center,
        ScrollBlock::End => ScrollLogicalPosition::End,
        ScrollBlock::Nearest => ScrollLogicalPosition::Nearest,
    }
}

fn rect_of(element: &Element) -> Rect {
    let rect = element.get_bounding_client_rect();
    Rect::new(rect.left(), rect.top(), rect.width(), rect.height())
}

/// The located blob view: gutter and content cells plus the overlay.
#[derive(Debug, Clone)]
pub struct BlobView {
    pub gutter: Element,
    pub content: Element,
    pub overlay: HtmlElement,
}

impl BlobView {
    /// Find the blob view described by `config`. `Ok(None)` when the page
    /// has no blob view; that is the normal case on most pages.
    pub fn locate(document: &Document, config: &BlobmarkConfig) -> Result<Option<Self>> {
        let query = |root: &Element, selector: &str| {
            root.query_selector(selector)
                .map_err(|error| js_error("query_selector", &error))
        };
        let Some(blob) = document
            .query_selector(&config.blob_selector)
            .map_err(|error| js_error("query_selector", &error))?
        else {
            return Ok(None);
        };
        let (Some(gutter), Some(content)) = (
            query(&blob, &config.gutter_selector)?,
            query(&blob, &config.content_selector)?,
        ) else {
            debug!(target: "blobmark::web", "blob view without gutter or content cell");
            return Ok(None);
        };
        let overlay = Self::insert_overlay(document, &content, &config.overlay_class)?;
        Ok(Some(Self {
            gutter,
            content,
            overlay,
        }))
    }

    fn insert_overlay(document: &Document, content: &Element, class: &str) -> Result<HtmlElement> {
        let overlay = document
            .create_element("div")
            .map_err(|error| js_error("create_element", &error))?
            .dyn_into::<HtmlElement>()
            .map_err(|_| BlobmarkError::host("create_element", "not an HTMLElement"))?;
        overlay.set_class_name(class);
        overlay
            .style()
            .set_property("display", "none")
            .map_err(|error| js_error("style", &error))?;
        if let Some(content) = content.dyn_ref::<HtmlElement>() {
            content
                .style()
                .set_property("position", "relative")
                .map_err(|error| js_error("style", &error))?;
        }
        let first = content.first_child();
        content
            .insert_before(&overlay, first.as_ref())
            .map_err(|error| js_error("insert_before", &error))?;
        Ok(overlay)
    }

    /// Strip `href` from gutter anchors so a click does not jump the page,
    /// and return the highest line number present.
    pub fn disarm_anchors(&self) -> Result<Option<LineNumber>> {
        let mut last = None;
        for anchor in query_all(&self.gutter, LINE_ANCHOR_SELECTOR)? {
            anchor
                .remove_attribute("href")
                .map_err(|error| js_error("remove_attribute", &error))?;
            if let Some(line) = parse_anchor_id(&anchor.id()) {
                last = last.max(Some(line));
            }
        }
        Ok(last)
    }
}

/// [`HighlightHost`] over the live document.
pub struct DomHost {
    window: Window,
    document: Document,
    view: BlobView,
    origin_selector: String,
    highlight_class: String,
    last_line: Option<LineNumber>,
}

impl DomHost {
    pub fn new(
        window: Window,
        document: Document,
        view: BlobView,
        config: &BlobmarkConfig,
        last_line: Option<LineNumber>,
    ) -> Self {
        Self {
            window,
            document,
            view,
            origin_selector: config.content_origin_selector.clone(),
            highlight_class: config.highlight_class.clone(),
            last_line,
        }
    }

    #[must_use]
    pub fn view(&self) -> &BlobView {
        &self.view
    }

    /// Gutter anchor for `line`. Ids outside the gutter do not count.
    fn anchor(&self, line: LineNumber) -> Option<Element> {
        self.document
            .get_element_by_id(&anchor_id(line))
            .filter(|anchor| {
                let node: &Node = anchor;
                self.view.gutter.contains(Some(node))
            })
    }

    fn overlay_style(&self, property: &str, value: &str) -> Result<()> {
        self.view
            .overlay
            .style()
            .set_property(property, value)
            .map_err(|error| js_error("overlay_style", &error))
    }
}

impl LineGeometry for DomHost {
    fn anchor_rect(&self, line: LineNumber) -> Option<Rect> {
        self.anchor(line).map(|anchor| rect_of(&anchor))
    }

    fn content_origin(&self) -> Option<Rect> {
        self.view
            .content
            .query_selector(&self.origin_selector)
            .ok()
            .flatten()
            .map(|origin| rect_of(&origin))
    }
}

impl HighlightHost for DomHost {
    fn last_line(&self) -> Option<LineNumber> {
        self.last_line
    }

    fn clear_line_marks(&mut self) -> Result<()> {
        for anchor in query_all(&self.view.gutter, LINE_ANCHOR_SELECTOR)? {
            anchor
                .class_list()
                .remove_1(&self.highlight_class)
                .map_err(|error| js_error("class_list_remove", &error))?;
        }
        Ok(())
    }

    fn mark_line(&mut self, line: LineNumber) -> Result<bool> {
        let Some(anchor) = self.anchor(line) else {
            return Ok(false);
        };
        anchor
            .class_list()
            .add_1(&self.highlight_class)
            .map_err(|error| js_error("class_list_add", &error))?;
        Ok(true)
    }

    fn show_overlay(&mut self, bounds: OverlayBounds) -> Result<()> {
        self.overlay_style("top", &bounds.css_top())?;
        self.overlay_style("height", &bounds.css_height())?;
        self.overlay_style("display", "block")
    }

    fn hide_overlay(&mut self) -> Result<()> {
        self.overlay_style("display", "none")
    }

    fn replace_fragment(&mut self, hash: &str) -> Result<()> {
        self.window
            .history()
            .and_then(|history| history.replace_state_with_url(&JsValue::NULL, "", Some(hash)))
            .map_err(|error| js_error("replace_state", &error))
    }

    fn scroll_into_view(&mut self, line: LineNumber, block: ScrollBlock) -> Result<()> {
        let Some(anchor) = self.anchor(line) else {
            return Ok(());
        };
        let options = ScrollIntoViewOptions::new();
        options.set_block(scroll_position(block));
        anchor.scroll_into_view_with_scroll_into_view_options(&options);
        Ok(())
    }

    fn clear_text_selection(&mut self) -> Result<()> {
        if let Some(selection) = self
            .window
            .get_selection()
            .map_err(|error| js_error("get_selection", &error))?
        {
            selection
                .remove_all_ranges()
                .map_err(|error| js_error("remove_all_ranges", &error))?;
        }
        Ok(())
    }
}

/// `localStorage` slot for the theme preference. Storage may be missing
/// entirely (disabled cookies, sandboxed frames).
pub struct LocalThemeStore {
    storage: Option<Storage>,
    key: String,
}

impl LocalThemeStore {
    pub fn new(window: &Window, key: &str) -> Self {
        Self {
            storage: window.local_storage().ok().flatten(),
            key: key.to_owned(),
        }
    }

    fn storage(&self, operation: &'static str) -> Result<&Storage> {
        self.storage
            .as_ref()
            .ok_or_else(|| BlobmarkError::storage(operation, "localStorage unavailable"))
    }
}

fn storage_error(operation: &'static str, value: &JsValue) -> BlobmarkError {
    BlobmarkError::storage(operation, js_reason(value))
}

impl ThemeStore for LocalThemeStore {
    fn load(&self) -> Result<Option<String>> {
        self.storage("load")?
            .get_item(&self.key)
            .map_err(|error| storage_error("load", &error))
    }

    fn store(&mut self, value: &str) -> Result<()> {
        self.storage("store")?
            .set_item(&self.key, value)
            .map_err(|error| storage_error("store", &error))
    }

    fn clear(&mut self) -> Result<()> {
        self.storage("clear")?
            .remove_item(&self.key)
            .map_err(|error| storage_error("clear", &error))
    }
}
