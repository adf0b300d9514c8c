//! Narrative notes rendered from a JSON template.
//!
//! Notes file schema:
//!
//! ```json
//! { "title": "...", "sections": [ { "title": "...", "content": ["line {cr_date:%b %d, %Y}"] } ] }
//! ```
//!
//! Placeholders are `{key}` or `{key:spec}`; `{{` and `}}` are literal braces.
//! Dates take chrono strftime specs, numbers take `.N` or `.Nf`.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use chrono::NaiveDate;
use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};

use crate::app::pipeline::RunOutput;
use crate::domain::{CrossingDate, ProjectionConfig};
use crate::error::AppError;
use crate::report::format::LONG_DATE;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotesFile {
    pub title: String,
    #[serde(default)]
    pub sections: Vec<NotesSection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotesSection {
    pub title: String,
    #[serde(default)]
    pub content: Vec<String>,
}

/// A value that can be substituted into a template.
#[derive(Debug, Clone, PartialEq)]
pub enum NoteValue {
    Number(f64),
    Date(NaiveDate),
    Text(String),
}

pub type NoteValues = HashMap<String, NoteValue>;

pub fn read_notes_file(path: &Path) -> Result<NotesFile, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to open notes file '{}': {e}", path.display()),
        )
    })?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| AppError::new(2, format!("Invalid JSON in '{}': {e}", path.display())))
}

/// Values exposed to templates for a run.
///
/// - `proj_pre_final`: last projected pre-phase value
/// - `<label>`: each threshold value (lowercased label, e.g. `vgpr`, `cr`)
/// - `<label>_date`: post-phase crossing date, or a "not reached" phrase
pub fn note_values(run: &RunOutput, config: &ProjectionConfig) -> NoteValues {
    let mut values = NoteValues::new();

    if let Some(last) = run.pre.projection().and_then(|p| p.curve.last()) {
        values.insert("proj_pre_final".to_string(), NoteValue::Number(last.value));
    }

    let post_crossings = run
        .post
        .projection()
        .map(|p| p.crossings.as_slice())
        .unwrap_or(&[]);

    for threshold in &config.thresholds {
        let key = threshold.label.to_lowercase();
        values.insert(key.clone(), NoteValue::Number(threshold.value));

        let crossing = post_crossings
            .iter()
            .find(|c| c.label == threshold.label)
            .map(|c| c.crossing)
            .unwrap_or(CrossingDate::NotFound);
        let value = match crossing {
            CrossingDate::At(date) => NoteValue::Date(date),
            CrossingDate::NotFound => NoteValue::Text(format!(
                "not reached by {}",
                config.projection_end.format(LONG_DATE)
            )),
        };
        values.insert(format!("{key}_date"), value);
    }

    values
}

/// Render the notes: title, blank line, then each section with indented lines.
pub fn render_notes(notes: &NotesFile, values: &NoteValues) -> Result<String, AppError> {
    let mut sections = Vec::with_capacity(notes.sections.len());
    for section in &notes.sections {
        let mut text = format!("{}\n", section.title);
        for line in &section.content {
            text.push_str("   ");
            text.push_str(&fill_template(line, values)?);
            text.push('\n');
        }
        sections.push(text);
    }
    Ok(format!("{}\n\n{}", notes.title, sections.join("\n")))
}

/// Substitute placeholders in a single line.
pub fn fill_template(template: &str, values: &NoteValues) -> Result<String, AppError> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '{' => {
                let mut field = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == '}' {
                        closed = true;
                        break;
                    }
                    field.push(c);
                }
                if !closed {
                    return Err(AppError::new(
                        2,
                        format!("Unclosed placeholder in notes line: {template}"),
                    ));
                }
                let (key, spec) = match field.split_once(':') {
                    Some((k, s)) => (k.trim(), Some(s)),
                    None => (field.trim(), None),
                };
                let value = values.get(key).ok_or_else(|| {
                    AppError::new(2, format!("Unknown placeholder '{{{key}}}' in notes."))
                })?;
                format_value(&mut out, key, value, spec)?;
            }
            '}' => {
                return Err(AppError::new(
                    2,
                    format!("Unmatched '}}' in notes line: {template}"),
                ));
            }
            _ => out.push(ch),
        }
    }

    Ok(out)
}

fn format_value(
    out: &mut String,
    key: &str,
    value: &NoteValue,
    spec: Option<&str>,
) -> Result<(), AppError> {
    let bad_spec = |spec: &str| AppError::new(2, format!("Invalid format '{spec}' for '{key}'."));

    match (value, spec) {
        (NoteValue::Number(v), None) => out.push_str(&v.to_string()),
        (NoteValue::Number(v), Some(spec)) => {
            let digits = spec
                .strip_prefix('.')
                .map(|s| s.strip_suffix('f').unwrap_or(s))
                .and_then(|s| s.parse::<usize>().ok())
                .ok_or_else(|| bad_spec(spec))?;
            out.push_str(&format!("{v:.digits$}"));
        }
        (NoteValue::Date(d), None) => out.push_str(&d.to_string()),
        (NoteValue::Date(d), Some(spec)) => {
            if StrftimeItems::new(spec).any(|item| matches!(item, Item::Error)) {
                return Err(bad_spec(spec));
            }
            write!(out, "{}", d.format(spec)).map_err(|_| bad_spec(spec))?;
        }
        // A "not reached" phrase stands in for a date, so a date spec is ignored.
        (NoteValue::Text(t), _) => out.push_str(t),
    }
    Ok(())
}
