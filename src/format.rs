//! Format compilation and rendering
//!
//! A handler compiles one template per registered level at construction time
//! (spec §4.2): markup tags, including the `<level>`/`<lvl>` pseudo-tag,
//! are resolved once, against that level's color, into either ANSI escapes
//! or nothing (stripped). Only placeholder substitution happens per emission.

use crate::error::{Result, ScrivenerError};
use crate::level::Level;
use crate::record::Record;
use chrono::TimeDelta;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Default verbose format (spec §6).
pub const DEFAULT_FORMAT: &str = "<green>{time}</green> | <level>{level: <8}</level> | <cyan>{name}</cyan>:<cyan>{function}</cyan>:<cyan>{line}</cyan> - <level>{message}</level>";

const DEFAULT_TIME_PATTERN: &str = "YYYY-MM-DD HH:mm:ss.SSSSSS ZZ";

/// One compiled template per level.
#[derive(Debug, Clone)]
pub struct CompiledFormat {
    levels: HashMap<Level, String>,
}

impl CompiledFormat {
    /// Compiles `template` once per registered level, resolving markup
    /// against each level's own color (or stripping it, if `colored` is
    /// false).
    pub fn compile(template: &str, colored: bool) -> Self {
        let mut levels = HashMap::new();
        for level in Level::all_levels() {
            levels.insert(level, resolve_markup(template, level, colored));
        }
        Self { levels }
    }

    /// Renders `record` through the template compiled for its level,
    /// substituting placeholders, and appends a trailing newline. Fails with
    /// `ScrivenerError::InvalidFormat` if the template references a
    /// placeholder name this crate doesn't recognize (spec §7).
    pub fn render(&self, record: &Record) -> Result<String> {
        let level = Level::from_priority(record.level.no).unwrap_or(Level::Info);
        let template = self
            .levels
            .get(&level)
            .map(String::as_str)
            .unwrap_or("{message}");
        let mut rendered = substitute_placeholders(template, record)?;
        rendered.push('\n');
        Ok(rendered)
    }
}

fn tag_code(tag: &str) -> Option<&'static str> {
    match tag {
        "black" => Some("30"),
        "red" => Some("31"),
        "green" => Some("32"),
        "yellow" => Some("33"),
        "blue" => Some("34"),
        "magenta" => Some("35"),
        "cyan" => Some("36"),
        "white" => Some("37"),
        "BLACK" => Some("90"),
        "RED" => Some("91"),
        "GREEN" => Some("92"),
        "YELLOW" => Some("93"),
        "BLUE" => Some("94"),
        "MAGENTA" => Some("95"),
        "CYAN" => Some("96"),
        "WHITE" => Some("97"),
        "bold" => Some("1"),
        "dim" => Some("2"),
        "italic" => Some("3"),
        "underline" => Some("4"),
        "strike" => Some("9"),
        _ => None,
    }
}

fn level_tag_names(level: Level) -> Vec<&'static str> {
    level
        .default_markup()
        .split(['<', '>'])
        .filter(|s| !s.is_empty())
        .collect()
}

/// Expands `<level>`/`<lvl>` into that level's concrete tags, so the generic
/// tag renderer below never needs to know about levels.
fn expand_level_tag(template: &str, level: Level) -> String {
    let names = level_tag_names(level);
    let open: String = names.iter().map(|n| format!("<{n}>")).collect();
    let close: String = names.iter().rev().map(|n| format!("</{n}>")).collect();
    template
        .replace("<level>", &open)
        .replace("</level>", &close)
        .replace("<lvl>", &open)
        .replace("</lvl>", &close)
}

fn resolve_markup(template: &str, level: Level, colored: bool) -> String {
    let expanded = expand_level_tag(template, level);
    if colored {
        render_ansi(&expanded)
    } else {
        strip_tags(&expanded)
    }
}

/// Resolves every recognised `<tag>...</tag>` pair into ANSI escapes,
/// reapplying the remaining open codes after each close so nested tags
/// (`<level>` expands to several) stay correctly layered. Unrecognised tags
/// are left as literal text.
fn render_ansi(template: &str) -> String {
    let mut out = String::new();
    let mut stack: Vec<&str> = Vec::new();
    let bytes = template.as_bytes();
    let mut i = 0;
    while i < template.len() {
        if bytes[i] == b'<'
            && let Some(end) = template[i..].find('>')
        {
            let content = &template[i + 1..i + end];
            if let Some(name) = content.strip_prefix('/') {
                if let Some(pos) = stack.iter().rposition(|t| *t == name) {
                    stack.remove(pos);
                }
                out.push_str("\x1b[0m");
                for t in &stack {
                    if let Some(code) = tag_code(t) {
                        out.push_str(&format!("\x1b[{code}m"));
                    }
                }
                i += end + 1;
                continue;
            } else if tag_code(content).is_some() {
                stack.push(content);
                out.push_str(&format!("\x1b[{}m", tag_code(content).unwrap()));
                i += end + 1;
                continue;
            }
        }
        let ch = template[i..].chars().next().unwrap();
        out.push(ch);
        i += ch.len_utf8();
    }
    out
}

/// Removes every recognised tag without emitting any escape, used when a
/// handler has `colored = false`.
fn strip_tags(template: &str) -> String {
    let mut out = String::new();
    let bytes = template.as_bytes();
    let mut i = 0;
    while i < template.len() {
        if bytes[i] == b'<'
            && let Some(end) = template[i..].find('>')
        {
            let content = &template[i + 1..i + end];
            let name = content.strip_prefix('/').unwrap_or(content);
            if tag_code(name).is_some() {
                i += end + 1;
                continue;
            }
        }
        let ch = template[i..].chars().next().unwrap();
        out.push(ch);
        i += ch.len_utf8();
    }
    out
}

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(\w+)(\.\w+)?(:[^}]*)?\}").unwrap());

/// Walks every `{placeholder}` match in order, replacing each with its
/// resolved value. Built as a manual scan (rather than `Regex::replace_all`)
/// because resolving a placeholder can fail and the replacement needs to
/// short-circuit on the first unknown name.
fn substitute_placeholders(template: &str, record: &Record) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut last_end = 0;
    for caps in PLACEHOLDER.captures_iter(template) {
        let whole = caps.get(0).unwrap();
        out.push_str(&template[last_end..whole.start()]);
        let name = &caps[1];
        let subfield = caps.get(2).map(|m| &m.as_str()[1..]);
        let spec = caps.get(3).map(|m| &m.as_str()[1..]);
        let value = if name == "time" {
            format_time(record.time, spec.unwrap_or(DEFAULT_TIME_PATTERN))
        } else {
            let raw = field_value(name, subfield, record)?;
            match spec {
                Some(s) => apply_width_spec(&raw, s),
                None => raw,
            }
        };
        out.push_str(&value);
        last_end = whole.end();
    }
    out.push_str(&template[last_end..]);
    Ok(out)
}

/// Resolves one placeholder name to its value. An unrecognized name is a
/// template error, not a blank substitution (spec §7).
fn field_value(name: &str, subfield: Option<&str>, record: &Record) -> Result<String> {
    Ok(match name {
        "elapsed" => format_elapsed(record.elapsed),
        "level" => match subfield {
            Some("no") => record.level.no.to_string(),
            _ => record.level.name.to_string(),
        },
        "message" => record.message.clone(),
        "name" => record.name.clone(),
        "file" => match subfield {
            Some("path") => record.file.path.clone(),
            _ => record.file.name.clone(),
        },
        "function" => record.function.clone(),
        "line" => record.line.to_string(),
        "module" => record.module.clone(),
        "thread" => match subfield {
            Some("id") => record.thread.id.to_string(),
            _ => record.thread.name.clone(),
        },
        "process" => match subfield {
            Some("id") => record.process.id.to_string(),
            _ => record.process.name.clone(),
        },
        "exception" => record
            .exception
            .as_ref()
            .map(|e| e.render_plain())
            .unwrap_or_default(),
        _ => return Err(ScrivenerError::InvalidFormat(format!("unknown placeholder `{{{name}}}`"))),
    })
}

/// Parses a Python-`format`-style alignment spec (`"<8"`, `">10"`, `"^5"`,
/// or with an explicit fill character such as `" <8"`).
fn apply_width_spec(value: &str, spec: &str) -> String {
    let chars: Vec<char> = spec.chars().collect();
    if chars.is_empty() {
        return value.to_string();
    }
    let (fill, align, width_chars): (char, char, &[char]) =
        if chars.len() >= 2 && matches!(chars[1], '<' | '>' | '^') {
            (chars[0], chars[1], &chars[2..])
        } else if matches!(chars[0], '<' | '>' | '^') {
            (' ', chars[0], &chars[1..])
        } else {
            (' ', '<', &chars[..])
        };
    let width: usize = width_chars
        .iter()
        .collect::<String>()
        .trim()
        .parse()
        .unwrap_or(0);
    let len = value.chars().count();
    if len >= width {
        return value.to_string();
    }
    let pad = width - len;
    match align {
        '>' => format!("{}{}", fill.to_string().repeat(pad), value),
        '^' => {
            let left = pad / 2;
            let right = pad - left;
            format!(
                "{}{}{}",
                fill.to_string().repeat(left),
                value,
                fill.to_string().repeat(right)
            )
        }
        _ => format!("{}{}", value, fill.to_string().repeat(pad)),
    }
}

fn format_elapsed(elapsed: TimeDelta) -> String {
    let micros = elapsed.num_microseconds().unwrap_or(0);
    format!("{:.6}", micros as f64 / 1_000_000.0)
}

/// Renders a timestamp via a token-substitution pattern (grounded in the
/// teacher's own `format_time`), also used by the file sink for path
/// templates (spec §6's filesystem-safe time rendering uses the same
/// tokens).
pub(crate) fn format_time(timestamp: chrono::DateTime<chrono::Utc>, pattern: &str) -> String {
    let mut result = pattern.to_string();
    result = result.replace("YYYY", &timestamp.format("%Y").to_string());
    result = result.replace("YY", &timestamp.format("%y").to_string());
    result = result.replace("MMMM", &timestamp.format("%B").to_string());
    result = result.replace("MMM", &timestamp.format("%b").to_string());
    result = result.replace("MM", &timestamp.format("%m").to_string());
    result = result.replace("dddd", &timestamp.format("%A").to_string());
    result = result.replace("ddd", &timestamp.format("%a").to_string());
    result = result.replace("DD", &timestamp.format("%d").to_string());
    result = result.replace("HH", &timestamp.format("%H").to_string());
    result = result.replace("hh", &timestamp.format("%I").to_string());
    result = result.replace("mm", &timestamp.format("%M").to_string());
    result = result.replace("ss", &timestamp.format("%S").to_string());
    result = result.replace("SSSSSS", &timestamp.format("%6f").to_string());
    result = result.replace("SSS", &timestamp.format("%3f").to_string());
    result = result.replace("A", &timestamp.format("%p").to_string());
    result = result.replace("ZZ", &timestamp.format("%:z").to_string());
    result = result.replace("Z", &timestamp.format("%z").to_string());
    result
}
