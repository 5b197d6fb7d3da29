//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `guestbook_core` linkage.
//! - Optionally replay a JSON-lines feed script through a headless session
//!   and print the resulting double page.
//!
//! Script lines look like `{"op":"added","key":"-N1","value":{"text":"hi","timestamp":1}}`;
//! supported ops are `added|changed|removed|error|input|submit|next|prev`.

use guestbook_core::{
    FeedHandle, GuestbookConfig, GuestbookService, InMemoryFeed, LatestFrameRenderer, PageView,
    SlotView, SystemClock,
};
use serde::Deserialize;
use serde_json::Value;
use std::process::ExitCode;

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum ScriptStep {
    Added { key: String, value: Value },
    Changed { key: String, value: Value },
    Removed { key: String },
    Error { message: String },
    Input { text: String },
    Submit,
    Next,
    Prev,
}

type Session = GuestbookService<InMemoryFeed, LatestFrameRenderer>;

fn main() -> ExitCode {
    println!("guestbook_core ping={}", guestbook_core::ping());
    println!("guestbook_core version={}", guestbook_core::core_version());

    let Some(script) = std::env::args().nth(1) else {
        return ExitCode::SUCCESS;
    };
    match replay(&script) {
        Ok(view) => {
            print_page(&view);
            ExitCode::SUCCESS
        }
        Err(message) => {
            eprintln!("replay failed: {message}");
            ExitCode::FAILURE
        }
    }
}

fn replay(path: &str) -> Result<PageView, String> {
    let script =
        std::fs::read_to_string(path).map_err(|err| format!("cannot read `{path}`: {err}"))?;

    let (feed, handle) = InMemoryFeed::new();
    let mut session: Session = GuestbookService::new(
        &GuestbookConfig::default(),
        feed,
        LatestFrameRenderer::default(),
        Box::new(SystemClock::new()),
    );
    session.start().map_err(|err| err.to_string())?;

    for (number, line) in script.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let step: ScriptStep = serde_json::from_str(line)
            .map_err(|err| format!("line {}: {err}", number + 1))?;
        run_step(&mut session, &handle, step);
        session.pump();
    }

    Ok(session.page_view())
}

fn run_step(session: &mut Session, handle: &FeedHandle, step: ScriptStep) {
    match step {
        ScriptStep::Added { key, value } => {
            handle.added(key, value);
        }
        ScriptStep::Changed { key, value } => {
            handle.changed(key, value);
        }
        ScriptStep::Removed { key } => {
            handle.removed(key);
        }
        ScriptStep::Error { message } => {
            handle.error(message);
        }
        ScriptStep::Input { text } => {
            let caret = text.chars().count();
            session.on_input_changed(&text, caret);
        }
        ScriptStep::Submit => {
            println!("submit={:?}", session.submit());
        }
        ScriptStep::Next => {
            session.next_page();
        }
        ScriptStep::Prev => {
            session.prev_page();
        }
    }
}

fn print_page(view: &PageView) {
    println!("{}", view.label);
    print_side("left", &view.left);
    print_side("right", &view.right);
}

fn print_side(name: &str, slots: &[SlotView]) {
    for (index, slot) in slots.iter().enumerate().filter(|(_, slot)| !slot.is_empty()) {
        println!("[{name} {index}] {}", slot.date_label);
        for line in slot.body.lines() {
            println!("    {line}");
        }
    }
}
