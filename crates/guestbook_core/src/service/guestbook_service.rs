//! Guestbook session service.
//!
//! # Responsibility
//! - Drain remote feed events into the note store and keep the page cursor
//!   and renderer in step.
//! - Route composer changes through the edit policies.
//! - Gate submissions with the cooldown and hand them to the remote feed.
//!
//! # Invariants
//! - The note store is mutated only from feed events.
//! - The renderer sees pages after every store mutation or page move, and
//!   the composer after every processed edit.
//! - Remote writes are never awaited; failures are only logged.

use crate::config::GuestbookConfig;
use crate::editor::text_editor::{ConstrainedTextEditor, EditOutcome, EditorView};
use crate::glyph_fit::{chars_that_fit, TextMeasurer};
use crate::model::note::ANONYMOUS_AUTHOR;
use crate::service::overlay::{Closable, OverlayState};
use crate::service::renderer::GuestbookRenderer;
use crate::sync::feed::{FeedEvent, FeedQuery, RemoteFeed, SubscribeError, WriteRecord};
use crate::sync::note_store::{NoteStore, StoreChange};
use crate::throttle::{Clock, SubmissionThrottler};
use crate::view::display::{page_view, PageView, SlotFormat};
use crate::view::pagination::PageCursor;
use log::{debug, error, info, warn};
use std::sync::mpsc::{Receiver, TryRecvError};

/// Result of a submit action.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Text handed to the remote feed.
    Sent { text: String },
    /// Cooldown still running.
    Throttled { remaining_secs: f64 },
    /// Composer held only whitespace.
    Empty,
}

/// One guestbook session bound to a feed, a renderer and a clock.
pub struct GuestbookService<F: RemoteFeed, R: GuestbookRenderer> {
    config: GuestbookConfig,
    feed: F,
    events: Option<Receiver<FeedEvent>>,
    store: NoteStore,
    cursor: PageCursor,
    editor: ConstrainedTextEditor,
    throttler: SubmissionThrottler,
    clock: Box<dyn Clock>,
    renderer: R,
    overlay: OverlayState,
    user_id: String,
    slot_format: SlotFormat,
}

impl<F: RemoteFeed, R: GuestbookRenderer> GuestbookService<F, R> {
    /// Creates a session; `config` is normalized first.
    pub fn new(config: &GuestbookConfig, feed: F, renderer: R, clock: Box<dyn Clock>) -> Self {
        let config = config.normalized();
        let columns = if config.display_chars_per_line > 0 {
            config.display_chars_per_line
        } else {
            config.max_chars_per_line
        };
        Self {
            feed,
            events: None,
            store: NoteStore::new(),
            cursor: PageCursor::new(config.items_per_side),
            editor: ConstrainedTextEditor::new(config.edit_limits()),
            throttler: SubmissionThrottler::new(config.submit_cooldown_secs),
            clock,
            renderer,
            overlay: OverlayState::default(),
            user_id: ANONYMOUS_AUTHOR.to_string(),
            slot_format: SlotFormat {
                columns,
                max_lines: config.display_max_lines,
            },
            config,
        }
    }

    /// Sets the author id written with submissions.
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        let user_id = user_id.into();
        if !user_id.trim().is_empty() {
            self.user_id = user_id;
        }
        self
    }

    /// Derives display columns from a measurer when the config leaves them
    /// at `0`. Without a measurer or a usable width, `max_chars_per_line`
    /// is kept.
    pub fn with_measured_columns(
        mut self,
        measurer: Option<&dyn TextMeasurer>,
        target_width: f32,
    ) -> Self {
        if self.config.display_chars_per_line > 0 {
            return self;
        }
        let measurer = measurer.filter(|_| target_width > 0.0);
        self.slot_format.columns = chars_that_fit(
            measurer,
            target_width,
            self.config.glyph_fit_max_test,
            self.config.max_chars_per_line,
        );
        self
    }

    /// Subscribes to the feed and renders the initial frames.
    pub fn start(&mut self) -> Result<(), SubscribeError> {
        let query = FeedQuery::by_timestamp(
            self.config.collection_path.as_str(),
            self.config.feed_limit,
        );
        let events = self.feed.subscribe(&query).map_err(|err| {
            error!(
                "event=feed_subscribe module=service status=error path={} error={}",
                query.path, err
            );
            err
        })?;
        self.events = Some(events);
        info!(
            "event=feed_subscribe module=service status=ok path={} limit={}",
            query.path, query.limit_to_last
        );
        self.render_pages();
        self.render_editor();
        Ok(())
    }

    /// Drops the feed subscription. Queued events are discarded.
    pub fn dispose(&mut self) {
        if self.events.take().is_some() {
            info!("event=feed_unsubscribe module=service status=ok");
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.events.is_some()
    }

    /// Applies every queued feed event. Returns the number of mutations.
    pub fn pump(&mut self) -> usize {
        let Some(events) = self.events.as_ref() else {
            return 0;
        };

        let mut queued = Vec::new();
        let mut disconnected = false;
        loop {
            match events.try_recv() {
                Ok(event) => queued.push(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    disconnected = true;
                    break;
                }
            }
        }
        if disconnected {
            warn!("event=feed_disconnected module=service status=warn");
            self.events = None;
        }

        queued
            .into_iter()
            .map(|event| self.apply_event(event))
            .filter(StoreChange::is_mutation)
            .count()
    }

    /// Reduces one feed event into the store and page cursor.
    pub fn apply_event(&mut self, event: FeedEvent) -> StoreChange {
        let change = self.store.apply(event);
        match &change {
            StoreChange::Inserted { previous_len, .. } => {
                self.cursor.on_grow(*previous_len, self.store.len());
            }
            StoreChange::Updated { .. } | StoreChange::Removed { .. } => {
                self.cursor.clamp(self.store.len());
            }
            StoreChange::Ignored | StoreChange::Rejected(_) | StoreChange::FeedError => {}
        }
        if change.is_mutation() {
            self.render_pages();
        }
        change
    }

    /// Moves one double page back; renders only when the page changed.
    pub fn prev_page(&mut self) -> bool {
        let moved = self.cursor.prev(self.store.len());
        if moved {
            self.render_pages();
        }
        moved
    }

    /// Moves one double page forward; renders only when the page changed.
    pub fn next_page(&mut self) -> bool {
        let moved = self.cursor.next(self.store.len());
        if moved {
            self.render_pages();
        }
        moved
    }

    /// Handles a composer change reported by the host.
    pub fn on_input_changed(&mut self, text: &str, caret: usize) -> EditOutcome {
        let outcome = self.editor.on_value_changed(text, caret);
        if let EditOutcome::Rewritten(edit) = &outcome {
            debug!(
                "event=editor_rewrite module=service status=ok chars={} caret={}",
                edit.char_count(),
                edit.caret
            );
        }
        if outcome != EditOutcome::Echo {
            self.render_editor();
        }
        outcome
    }

    /// Submits the composer text if the cooldown allows it.
    pub fn submit(&mut self) -> SubmitOutcome {
        let now = self.clock.now();
        if !self.throttler.can_submit(now) {
            let remaining_secs = self.throttler.remaining(now);
            info!(
                "event=note_submit module=service status=throttled remaining_secs={:.2}",
                remaining_secs
            );
            return SubmitOutcome::Throttled { remaining_secs };
        }

        let Some(text) = self.editor.submission_text() else {
            debug!("event=note_submit module=service status=empty");
            return SubmitOutcome::Empty;
        };

        let path = self.config.collection_path.clone();
        let chars = text.chars().count();
        self.feed.write(
            self.config.collection_path.as_str(),
            WriteRecord::new(self.user_id.clone(), text.clone()),
            Box::new(move |result| match result {
                Ok(key) => debug!(
                    "event=remote_write module=service status=ok path={} key={}",
                    path, key
                ),
                Err(err) => error!(
                    "event=remote_write module=service status=error path={} error={}",
                    path, err
                ),
            }),
        );

        self.editor.clear();
        self.throttler.record(now);
        info!(
            "event=note_submit module=service status=ok chars={}",
            chars
        );
        self.render_editor();
        SubmitOutcome::Sent { text }
    }

    /// Opens the overlay and shows the current double page.
    pub fn open(&mut self) {
        if self.overlay.open() {
            debug!("event=overlay_open module=service status=ok");
            self.render_pages();
        }
    }

    pub fn toggle(&mut self) {
        if self.overlay.is_open() {
            self.close();
        } else {
            self.open();
        }
    }

    pub fn is_open(&self) -> bool {
        self.overlay.is_open()
    }

    /// Re-renders the current double page.
    pub fn refresh_pages(&mut self) {
        self.render_pages();
    }

    pub fn page_view(&self) -> PageView {
        page_view(self.store.snapshot(), &self.cursor, self.slot_format)
    }

    pub fn editor_view(&self) -> EditorView {
        self.editor.view()
    }

    pub fn store(&self) -> &NoteStore {
        &self.store
    }

    pub fn cursor(&self) -> &PageCursor {
        &self.cursor
    }

    pub fn editor(&self) -> &ConstrainedTextEditor {
        &self.editor
    }

    pub fn config(&self) -> &GuestbookConfig {
        &self.config
    }

    pub fn display_columns(&self) -> usize {
        self.slot_format.columns
    }

    pub fn feed(&self) -> &F {
        &self.feed
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    fn render_pages(&mut self) {
        let view = self.page_view();
        self.renderer.render_pages(&view);
    }

    fn render_editor(&mut self) {
        let view = self.editor.view();
        self.renderer.render_editor(&view);
    }
}

impl<F: RemoteFeed, R: GuestbookRenderer> Closable for GuestbookService<F, R> {
    fn close(&mut self) {
        if self.overlay.close() {
            debug!("event=overlay_close module=service status=ok");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{GuestbookService, SubmitOutcome};
    use crate::config::GuestbookConfig;
    use crate::glyph_fit::TextMeasurer;
    use crate::service::overlay::Closable;
    use crate::service::renderer::LatestFrameRenderer;
    use crate::sync::feed::InMemoryFeed;
    use crate::throttle::ManualClock;

    fn service() -> GuestbookService<InMemoryFeed, LatestFrameRenderer> {
        let (feed, _handle) = InMemoryFeed::with_server_clock(1_000);
        GuestbookService::new(
            &GuestbookConfig::default(),
            feed,
            LatestFrameRenderer::default(),
            Box::new(ManualClock::new(0.0)),
        )
    }

    #[test]
    fn measured_columns_replace_line_length_when_unset() {
        let measurer: &dyn TextMeasurer = &|sample: &str| sample.chars().count() as f32 * 10.0;
        let service = service().with_measured_columns(Some(measurer), 255.0);
        assert_eq!(service.display_columns(), 25);

        let service = self::service().with_measured_columns(None, 255.0);
        assert_eq!(service.display_columns(), 50);

        let service = self::service().with_measured_columns(Some(measurer), 0.0);
        assert_eq!(service.display_columns(), 50);
    }

    #[test]
    fn overlay_open_renders_and_close_is_idempotent() {
        let mut service = service();
        service.open();
        assert!(service.is_open());
        assert_eq!(service.renderer().page_renders, 1);
        service.open();
        assert_eq!(service.renderer().page_renders, 1);

        let closable: &mut dyn Closable = &mut service;
        closable.close();
        closable.close();
        assert!(!service.is_open());
        service.toggle();
        assert!(service.is_open());
    }

    #[test]
    fn submit_without_subscription_still_clears_composer() {
        let mut service = service();
        service.on_input_changed("hello", 5);
        assert_eq!(
            service.submit(),
            SubmitOutcome::Sent {
                text: "hello".to_string()
            }
        );
        assert_eq!(service.editor().text(), "");
    }
}
