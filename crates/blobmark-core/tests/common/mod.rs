//! In-memory blob view shared by the integration tests.

#![allow(dead_code)]

use std::collections::BTreeSet;

use blobmark_core::config::ScrollBlock;
use blobmark_core::error::{BlobmarkError, Result};
use blobmark_core::{HighlightHost, LineGeometry, LineNumber, LocatorNode, OverlayBounds, Rect};

pub const LINE_HEIGHT: f64 = 18.0;
pub const GUTTER_TOP: f64 = 120.0;

/// Node positions inside the fake page, enough for the locator walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Node {
    /// Text node inside the anchor for a line.
    Text(u32),
    Anchor(u32),
    Gutter,
    Content,
    Body,
}

impl LocatorNode for Node {
    fn tag_name(&self) -> Option<String> {
        match self {
            Self::Text(_) => None,
            Self::Anchor(_) => Some("A".to_owned()),
            Self::Gutter | Self::Content => Some("TD".to_owned()),
            Self::Body => Some("BODY".to_owned()),
        }
    }

    fn id(&self) -> Option<String> {
        match self {
            Self::Anchor(line) => Some(format!("n{line}")),
            _ => None,
        }
    }

    fn parent(&self) -> Option<Self> {
        match self {
            Self::Text(line) => Some(Self::Anchor(*line)),
            Self::Anchor(_) => Some(Self::Gutter),
            Self::Gutter | Self::Content => Some(Self::Body),
            Self::Body => None,
        }
    }
}

/// Page with `lines` gutter anchors stacked `LINE_HEIGHT` apart.
#[derive(Debug, Default)]
pub struct FakePage {
    pub lines: u32,
    /// Lines whose anchors were removed from the DOM.
    pub holes: BTreeSet<u32>,
    pub marked: BTreeSet<u32>,
    pub overlay: Option<OverlayBounds>,
    pub hash: String,
    pub fragment_writes: Vec<String>,
    pub scrolled: Vec<(u32, ScrollBlock)>,
    pub text_selection_clears: u32,
    pub fail_history: bool,
}

impl FakePage {
    pub fn new(lines: u32) -> Self {
        Self {
            lines,
            ..Self::default()
        }
    }

    pub fn with_hash(lines: u32, hash: &str) -> Self {
        Self {
            lines,
            hash: hash.to_owned(),
            ..Self::default()
        }
    }

    pub fn marked_lines(&self) -> Vec<u32> {
        self.marked.iter().copied().collect()
    }

    pub fn anchor_top(line: u32) -> f64 {
        GUTTER_TOP + f64::from(line - 1) * LINE_HEIGHT
    }

    fn has_anchor(&self, line: u32) -> bool {
        line <= self.lines && !self.holes.contains(&line)
    }
}

impl LineGeometry for FakePage {
    fn anchor_rect(&self, line: LineNumber) -> Option<Rect> {
        self.has_anchor(line.get())
            .then(|| Rect::new(8.0, Self::anchor_top(line.get()), 32.0, LINE_HEIGHT))
    }

    fn content_origin(&self) -> Option<Rect> {
        Some(Rect::new(
            48.0,
            GUTTER_TOP,
            720.0,
            f64::from(self.lines) * LINE_HEIGHT,
        ))
    }
}

impl HighlightHost for FakePage {
    fn last_line(&self) -> Option<LineNumber> {
        LineNumber::new(self.lines)
    }

    fn clear_line_marks(&mut self) -> Result<()> {
        self.marked.clear();
        Ok(())
    }

    fn mark_line(&mut self, line: LineNumber) -> Result<bool> {
        if !self.has_anchor(line.get()) {
            return Ok(false);
        }
        self.marked.insert(line.get());
        Ok(true)
    }

    fn show_overlay(&mut self, bounds: OverlayBounds) -> Result<()> {
        self.overlay = Some(bounds);
        Ok(())
    }

    fn hide_overlay(&mut self) -> Result<()> {
        self.overlay = None;
        Ok(())
    }

    fn replace_fragment(&mut self, hash: &str) -> Result<()> {
        if self.fail_history {
            return Err(BlobmarkError::host("replace_state", "SecurityError"));
        }
        self.hash = hash.to_owned();
        self.fragment_writes.push(hash.to_owned());
        Ok(())
    }

    fn scroll_into_view(&mut self, line: LineNumber, block: ScrollBlock) -> Result<()> {
        self.scrolled.push((line.get(), block));
        Ok(())
    }

    fn clear_text_selection(&mut self) -> Result<()> {
        self.text_selection_clears += 1;
        Ok(())
    }
}
