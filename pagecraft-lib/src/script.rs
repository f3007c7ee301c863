//! Line-oriented edit scripts.
//!
//! One step per line, `#` starts a comment:
//!
//! ```text
//! select #hero h1
//! style color #112233
//! pseudo :hover background-color #000000
//! drag font-size 18px
//! wait 400
//! move down
//! undo
//! ```
//!
//! Scripts run against an [`Editor`] with a simulated clock, so debounced
//! snapshots and restore delays behave as they would interactively.

use std::time::{Duration, Instant};

use log::{info, warn};

use crate::config::Breakpoint;
use crate::editor::surface::DocumentSurface;
use crate::editor::{Command, Confirm, Direction, Editor, Status};
use crate::error::{EditorError, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Select(String),
    /// Applied as one discrete edit.
    Command(Command),
    /// Applied as a continuous control; recorded after the debounce period.
    Drag(Command),
    Wait(Duration),
    View(Breakpoint),
    Responsive(bool),
    ApplyAll(bool),
    Editing(bool),
    Undo,
    Redo,
    Record,
    Clear,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScriptStep {
    /// 1-based source line.
    pub line: usize,
    pub action: Action,
}

/// Outcome of one executed step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    pub line: usize,
    pub status: Status,
}

fn error(line: usize, message: impl Into<String>) -> EditorError {
    EditorError::Script {
        line,
        message: message.into(),
    }
}

/// Splits off the first whitespace-separated word.
fn split_word(text: &str) -> (&str, &str) {
    let text = text.trim();
    match text.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (text, ""),
    }
}

fn require<'a>(line: usize, keyword: &str, text: &'a str) -> Result<&'a str> {
    if text.is_empty() {
        Err(error(line, format!("`{}` needs an argument", keyword)))
    } else {
        Ok(text)
    }
}

fn toggle(line: usize, keyword: &str, text: &str) -> Result<bool> {
    match text.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" => Ok(true),
        "off" | "false" | "no" => Ok(false),
        other => Err(error(
            line,
            format!("`{}` expects on or off, got `{}`", keyword, other),
        )),
    }
}

fn property_value(line: usize, keyword: &str, text: &str) -> Result<(String, String)> {
    let (property, value) = split_word(text);
    if property.is_empty() || value.is_empty() {
        return Err(error(line, format!("`{}` needs a property and a value", keyword)));
    }
    Ok((property.to_string(), value.to_string()))
}

fn set_style(property: String, value: String, pseudo_class: Option<String>) -> Command {
    Command::SetStyle {
        property,
        value,
        pseudo_class,
    }
}

fn parse_line(line: usize, text: &str) -> Result<Option<Action>> {
    let text = text.trim();
    if text.is_empty() || text.starts_with('#') {
        return Ok(None);
    }
    let (keyword, rest) = split_word(text);
    let action = match keyword.to_ascii_lowercase().as_str() {
        "select" => Action::Select(require(line, keyword, rest)?.to_string()),
        "style" => {
            let (property, value) = property_value(line, keyword, rest)?;
            Action::Command(set_style(property, value, None))
        }
        "pseudo" => {
            let (pseudo, rest) = split_word(rest);
            if !pseudo.starts_with(':') {
                return Err(error(line, "`pseudo` expects a pseudo-class such as :hover"));
            }
            let (property, value) = property_value(line, keyword, rest)?;
            Action::Command(set_style(property, value, Some(pseudo.to_string())))
        }
        "drag" => {
            let (property, value) = property_value(line, keyword, rest)?;
            Action::Drag(set_style(property, value, None))
        }
        "hover" => Action::Command(Command::HoverBackground(
            require(line, keyword, rest)?.to_string(),
        )),
        "hover-border" => Action::Command(Command::HoverBorderColor(
            require(line, keyword, rest)?.to_string(),
        )),
        "shadow" => Action::Command(Command::BoxShadow(toggle(line, keyword, rest)?)),
        "glow" => Action::Command(Command::Glow(toggle(line, keyword, rest)?)),
        "wait" => {
            let ms = rest
                .trim_end_matches("ms")
                .trim()
                .parse::<u64>()
                .map_err(|_| error(line, format!("`wait` expects milliseconds, got `{}`", rest)))?;
            Action::Wait(Duration::from_millis(ms))
        }
        "attr" => {
            let (name, value) = split_word(require(line, keyword, rest)?);
            Action::Command(Command::SetAttribute {
                name: name.to_string(),
                value: value.to_string(),
            })
        }
        "text" => Action::Command(Command::SetText(rest.to_string())),
        "link" => {
            let (url, target) = split_word(require(line, keyword, rest)?);
            let new_window = match target {
                "" => false,
                "_blank" | "new-window" => true,
                other => return Err(error(line, format!("unknown link target `{}`", other))),
            };
            Action::Command(Command::SetLink {
                url: url.to_string(),
                new_window,
            })
        }
        "unlink" => Action::Command(Command::SetLink {
            url: String::new(),
            new_window: false,
        }),
        "tag" => Action::Command(Command::ReplaceTag(require(line, keyword, rest)?.to_string())),
        "move" => {
            let direction = Direction::parse(rest)
                .ok_or_else(|| error(line, format!("unknown direction `{}`", rest)))?;
            Action::Command(Command::MoveElement(direction))
        }
        "delete" => Action::Command(Command::DeleteElement),
        "duplicate" => Action::Command(Command::DuplicateElement),
        "flip" => Action::Command(Command::FlipLayout),
        "insert" => Action::Command(Command::InsertSection(
            require(line, keyword, rest)?.to_string(),
        )),
        "view" => Action::View(
            Breakpoint::parse(rest).ok_or_else(|| error(line, format!("unknown view `{}`", rest)))?,
        ),
        "responsive" => Action::Responsive(toggle(line, keyword, rest)?),
        "apply-all" => Action::ApplyAll(toggle(line, keyword, rest)?),
        "editing" => Action::Editing(toggle(line, keyword, rest)?),
        "undo" => Action::Undo,
        "redo" => Action::Redo,
        "record" => Action::Record,
        "clear" => Action::Clear,
        other => return Err(error(line, format!("unknown step `{}`", other))),
    };
    Ok(Some(action))
}

/// Parses a whole script, stopping at the first malformed line.
pub fn parse_script(text: &str) -> Result<Vec<ScriptStep>> {
    let mut steps = Vec::new();
    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        if let Some(action) = parse_line(line, raw)? {
            steps.push(ScriptStep { line, action });
        }
    }
    Ok(steps)
}

/// Executes script steps against an editor on a simulated clock.
pub struct ScriptRunner {
    clock: Instant,
}

impl Default for ScriptRunner {
    fn default() -> Self {
        Self::new(Instant::now())
    }
}

impl ScriptRunner {
    pub fn new(start: Instant) -> Self {
        ScriptRunner { clock: start }
    }

    pub fn now(&self) -> Instant {
        self.clock
    }

    fn advance<S: DocumentSurface>(&mut self, editor: &mut Editor<S>, by: Duration) {
        self.clock += by;
        editor.tick(self.clock);
    }

    /// Runs every step. Refused edits are reported, not fatal.
    pub fn run<S: DocumentSurface>(
        &mut self,
        editor: &mut Editor<S>,
        steps: &[ScriptStep],
        confirm: &mut dyn Confirm,
    ) -> Vec<StepReport> {
        let mut reports = Vec::with_capacity(steps.len());
        for step in steps {
            let outcome = self.run_step(editor, &step.action, confirm);
            let status = match outcome {
                Ok(status) => status,
                Err(e) => {
                    warn!("line {}: {}", step.line, e);
                    Status::from_error(&e)
                }
            };
            reports.push(StepReport {
                line: step.line,
                status,
            });
        }
        self.finish(editor);
        info!("script finished: {} step(s)", steps.len());
        reports
    }

    /// Lets pending debounce and restore timers run out.
    pub fn finish<S: DocumentSurface>(&mut self, editor: &mut Editor<S>) {
        while let Some(deadline) = editor.next_deadline() {
            self.clock = self.clock.max(deadline);
            editor.tick(self.clock);
        }
    }

    fn run_step<S: DocumentSurface>(
        &mut self,
        editor: &mut Editor<S>,
        action: &Action,
        confirm: &mut dyn Confirm,
    ) -> Result<Status> {
        let status = match action {
            Action::Select(selector) => {
                editor.select(selector)?;
                Status::info(format!("Selected {}.", selector))
            }
            Action::Command(command) => editor.execute(command.clone(), confirm)?,
            Action::Drag(command) => editor.execute_continuous(command.clone(), self.clock)?,
            Action::Wait(duration) => {
                self.advance(editor, *duration);
                Status::info(format!("Waited {}ms.", duration.as_millis()))
            }
            Action::View(view) => {
                editor.set_view(*view);
                Status::info(format!("View: {}.", view))
            }
            Action::Responsive(on) => {
                let on = editor.set_responsive(*on);
                Status::info(format!("Responsive editing {}.", if on { "on" } else { "off" }))
            }
            Action::ApplyAll(on) => {
                editor.set_apply_to_all(*on);
                Status::info(format!("Apply to all {}.", if *on { "on" } else { "off" }))
            }
            Action::Editing(true) => {
                if !editor.enable_editing() {
                    return Err(EditorError::NotReady);
                }
                Status::info("Editing enabled.")
            }
            Action::Editing(false) => {
                editor.disable_editing();
                Status::info("Editing disabled.")
            }
            Action::Undo | Action::Redo => {
                let moved = if matches!(action, Action::Undo) {
                    editor.undo(self.clock)
                } else {
                    editor.redo(self.clock)
                };
                // Settle so later steps see the restored selection.
                let settle = editor.config().settle_delay();
                self.advance(editor, settle);
                match (moved, action) {
                    (false, Action::Undo) => Status::info("Nothing to undo."),
                    (false, _) => Status::info("Nothing to redo."),
                    (true, Action::Undo) => Status::success("Undone."),
                    (true, _) => Status::success("Redone."),
                }
            }
            Action::Record => {
                if editor.record() {
                    Status::success("Snapshot recorded.")
                } else {
                    Status::info("No changes to record.")
                }
            }
            Action::Clear => {
                if editor.clear_all(confirm) {
                    Status::success("Cleared.")
                } else {
                    Status::info("Clear cancelled.")
                }
            }
        };
        editor.tick(self.clock);
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_steps_and_skips_comments() {
        let steps = parse_script(
            "# demo\nselect #hero h1\n\npseudo :hover color #fff\nmove left\nwait 400ms\nlink https://x.dev _blank\n",
        )
        .unwrap();
        assert_eq!(steps.len(), 5);
        assert_eq!(steps[0].line, 2);
        assert_eq!(steps[0].action, Action::Select("#hero h1".into()));
        assert_eq!(
            steps[1].action,
            Action::Command(Command::SetStyle {
                property: "color".into(),
                value: "#fff".into(),
                pseudo_class: Some(":hover".into()),
            })
        );
        assert_eq!(steps[2].action, Action::Command(Command::MoveElement(Direction::Left)));
        assert_eq!(steps[3].action, Action::Wait(Duration::from_millis(400)));
        assert_eq!(
            steps[4].action,
            Action::Command(Command::SetLink {
                url: "https://x.dev".into(),
                new_window: true,
            })
        );
    }

    #[test]
    fn reports_line_of_bad_step() {
        let err = parse_script("select p\nmove sideways\n").unwrap_err();
        assert_eq!(err.to_string(), "script line 2: unknown direction `sideways`");
        let err = parse_script("style color\n").unwrap_err();
        assert!(matches!(err, EditorError::Script { line: 1, .. }));
    }

    #[test]
    fn runs_against_an_editor() {
        use crate::config::EditorConfig;

        let mut editor = Editor::headless(EditorConfig::default());
        editor.load(r#"<h1 id="t">Hi</h1><p>body</p>"#);
        let steps = parse_script(
            "select #t\nstyle color red\ndrag font-size 20px\ndrag font-size 22px\nundo\nselect #missing\n",
        )
        .unwrap();
        let mut runner = ScriptRunner::default();
        let reports = runner.run(&mut editor, &steps, &mut |_: &str| true);
        assert_eq!(reports.len(), 6);
        assert_eq!(
            reports[5].status.message,
            "no element matches selector `#missing`"
        );
        // The undo lands before the drag burst is committed, so the burst is dropped.
        assert!(editor.selected().is_some());
        assert_eq!(editor.history_position(), Some(0));
    }
}
