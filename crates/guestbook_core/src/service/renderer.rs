//! Renderer contract.

use crate::editor::text_editor::EditorView;
use crate::view::display::PageView;

/// Receives view updates after every mutation.
pub trait GuestbookRenderer {
    /// Called after any note or page change.
    fn render_pages(&mut self, view: &PageView);
    /// Called after any composer change.
    fn render_editor(&mut self, view: &EditorView);
}

/// Keeps the latest frames and counts renders; used by hosts that pull
/// state instead of receiving callbacks, and by tests.
#[derive(Debug, Default)]
pub struct LatestFrameRenderer {
    pub pages: Option<PageView>,
    pub editor: Option<EditorView>,
    pub page_renders: usize,
    pub editor_renders: usize,
}

impl GuestbookRenderer for LatestFrameRenderer {
    fn render_pages(&mut self, view: &PageView) {
        self.pages = Some(view.clone());
        self.page_renders += 1;
    }

    fn render_editor(&mut self, view: &EditorView) {
        self.editor = Some(view.clone());
        self.editor_renders += 1;
    }
}
