//! Scroll event routing
//!
//! Vertical offsets go to the viewport window, which decides between
//! shifting the window and re-filling it. Horizontal offsets are kept in
//! step across header, body and footer and are never touched by a
//! vertical operation.
use tracing::trace;

use crate::ui::row_factory::{RenderPass, RowFactory};
use crate::ui::viewport::window::{ScrollDirection, ScrollOutcome, ViewportWindow};

/// Horizontal offsets of the three grid sections
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HorizontalSync {
    pub header: u32,
    pub body: u32,
    pub footer: u32,
}

#[derive(Debug, Default)]
pub struct ScrollCoordinator {
    last_top: u32,
    horizontal: HorizontalSync,
    content_width: u32,
    container_width: u32,
    last_direction: Option<ScrollDirection>,
}

impl ScrollCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route a vertical scroll offset; repeated offsets are ignored
    pub fn scroll_vertical<F: RowFactory + ?Sized>(
        &mut self,
        window: &mut ViewportWindow,
        pass: &mut RenderPass<'_, F>,
        scroll_top: u32,
    ) -> Option<ScrollOutcome> {
        if scroll_top == self.last_top && scroll_top == window.scroll_top() {
            return None;
        }

        let outcome = window.scroll_vertical(pass, scroll_top);
        self.last_top = window.scroll_top();
        self.last_direction = Some(outcome.direction);
        trace!(
            target: "scroll",
            "vertical {} -> {} ({:?}, jumped={})",
            scroll_top,
            self.last_top,
            outcome.direction,
            outcome.jumped
        );
        Some(outcome)
    }

    /// Scroll by a signed amount from the current offset
    pub fn scroll_by<F: RowFactory + ?Sized>(
        &mut self,
        window: &mut ViewportWindow,
        pass: &mut RenderPass<'_, F>,
        delta: i64,
    ) -> Option<ScrollOutcome> {
        let target = (window.scroll_top() as i64 + delta).clamp(0, window.max_scroll() as i64);
        self.scroll_vertical(window, pass, target as u32)
    }

    /// Keep the coordinator in step after the window moved on its own (fill, resize)
    pub fn sync_vertical(&mut self, window: &ViewportWindow) {
        self.last_top = window.scroll_top();
    }

    pub fn last_direction(&self) -> Option<ScrollDirection> {
        self.last_direction
    }

    /// Content and container widths bound the horizontal offset
    pub fn set_widths(&mut self, content_width: u32, container_width: u32) {
        self.content_width = content_width;
        self.container_width = container_width;
        let left = self.horizontal.body.min(self.max_left());
        self.apply_left(left);
    }

    pub fn max_left(&self) -> u32 {
        self.content_width.saturating_sub(self.container_width)
    }

    /// Set the horizontal offset on all three sections
    pub fn scroll_horizontal(&mut self, left: u32) -> HorizontalSync {
        let left = left.min(self.max_left());
        if left != self.horizontal.body {
            trace!(target: "scroll", "horizontal {} -> {}", self.horizontal.body, left);
        }
        self.apply_left(left);
        self.horizontal
    }

    pub fn horizontal(&self) -> HorizontalSync {
        self.horizontal
    }

    fn apply_left(&mut self, left: u32) {
        self.horizontal = HorizontalSync {
            header: left,
            body: left,
            footer: left,
        };
    }
}

/// Offset one page up or down, keeping one row of overlap
pub fn page_offset(current: u32, container_height: u32, row_height: u32, up: bool) -> u32 {
    let page = container_height.saturating_sub(row_height).max(1);
    if up {
        current.saturating_sub(page)
    } else {
        current.saturating_add(page)
    }
}
