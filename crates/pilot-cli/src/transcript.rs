//! HTML transcript of a chat session

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, Utc};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use pilot_chat::ChatTurn;
use uuid::Uuid;

struct Entry {
    turn_id: Uuid,
    user_text: String,
    started_at: DateTime<Utc>,
    bubble: String,
}

/// Keeps the latest bubble of every turn and rewrites the transcript file
/// whenever a turn finishes (or a finished turn is repainted).
pub struct Transcript {
    path: PathBuf,
    entries: Vec<Entry>,
}

impl Transcript {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Store the bubble for `turn`; the file is written once the turn is finished.
    pub fn update(&mut self, turn: &ChatTurn, bubble: &str) -> io::Result<()> {
        match self.entries.iter_mut().find(|e| e.turn_id == turn.id()) {
            Some(entry) => entry.bubble = bubble.to_string(),
            None => self.entries.push(Entry {
                turn_id: turn.id(),
                user_text: turn.user_text().to_string(),
                started_at: turn.started_at(),
                bubble: bubble.to_string(),
            }),
        }

        if turn.status().is_terminal() {
            self.write()?;
        }
        Ok(())
    }

    /// Drop all turns and truncate the file
    pub fn clear(&mut self) -> io::Result<()> {
        self.entries.clear();
        self.write()
    }

    fn write(&self) -> io::Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        fs::write(&self.path, self.to_html())
    }

    pub fn to_html(&self) -> String {
        html! {
            (DOCTYPE)
            html lang="en" {
                head {
                    meta charset="utf-8";
                    title { "pilot transcript" }
                    style { (PreEscaped(STYLES)) }
                }
                body {
                    div class="chat-messages" {
                        @for entry in &self.entries {
                            (render_entry(entry))
                        }
                    }
                }
            }
        }
        .into_string()
    }
}

fn render_entry(entry: &Entry) -> Markup {
    let time = entry
        .started_at
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string();
    html! {
        div class="message user-message" {
            div class="message-time" { (time) }
            div class="message-bubble" { (entry.user_text) }
        }
        div class="message assistant-message" {
            // already escaped by the chat renderer
            div class="message-bubble" { (PreEscaped(&entry.bubble)) }
        }
    }
}

/// Expand a leading `~/` to the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(path)),
        None => PathBuf::from(path),
    }
}

const STYLES: &str = r#"
body { font-family: system-ui, sans-serif; background: #f5f6f8; margin: 0; padding: 2rem; }
.chat-messages { max-width: 860px; margin: 0 auto; }
.message { margin: 1rem 0; }
.message-time { font-size: 0.75rem; color: #888; }
.message-bubble { background: #fff; border-radius: 8px; padding: 0.75rem 1rem; white-space: pre-wrap; }
.user-message .message-bubble { background: #dbe8ff; }
.react-thought { color: #555; margin: 0.25rem 0; }
.expander { border: 1px solid #ddd; border-radius: 6px; margin: 0.5rem 0; }
.expander-header { display: flex; justify-content: space-between; padding: 0.5rem; background: #fafafa; }
.expander-content { display: none; padding: 0.5rem; }
.expander.expanded .expander-content { display: block; }
.code-block { background: #272822; color: #f8f8f2; padding: 0.5rem; overflow-x: auto; }
.success-message { background: #e6f4ea; padding: 0.5rem; border-radius: 6px; margin-top: 0.5rem; }
.error-message { background: #fdecea; padding: 0.5rem; border-radius: 6px; margin-top: 0.5rem; }
"#;
