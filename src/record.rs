//! Log record structure
//!
//! Defines the immutable [`Record`] built once per emission and handed,
//! unchanged, to every registered handler (spec §3, §4.1).

use crate::exception::CapturedException;
use crate::level::Level;
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::HashMap;

/// `{level}` placeholder: numeric priority plus the level's name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelInfo {
    pub no: u8,
    pub name: &'static str,
}

impl LevelInfo {
    pub fn new(level: Level) -> Self {
        Self {
            no: level.priority(),
            name: level.as_str(),
        }
    }
}

/// `{file}` placeholder: basename plus the full call-site path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub name: String,
    pub path: String,
}

/// `{thread}` placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadInfo {
    pub id: u64,
    pub name: String,
}

/// `{process}` placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInfo {
    pub id: u32,
    pub name: String,
}

/// The call-site location a log macro captures at compile time
/// (`file!()`, `line!()`, `module_path!()`, and a function-name idiom),
/// replacing the runtime stack introspection the original implementation
/// performed (spec §9).
#[derive(Debug, Clone, Copy)]
pub struct CallSite {
    pub file: &'static str,
    pub line: u32,
    pub module: &'static str,
    pub function: &'static str,
}

/// The immutable record built per emission; sole argument passed to handlers.
#[derive(Debug, Clone)]
pub struct Record {
    pub time: DateTime<Utc>,
    pub elapsed: TimeDelta,
    pub level: LevelInfo,
    pub message: String,
    pub name: String,
    pub file: FileInfo,
    pub function: String,
    pub line: u32,
    pub module: String,
    pub thread: ThreadInfo,
    pub process: ProcessInfo,
    pub exception: Option<CapturedException>,
    pub fields: HashMap<String, serde_json::Value>,
}

impl Record {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        level: Level,
        message: String,
        call_site: CallSite,
        start_time: DateTime<Utc>,
        exception: Option<CapturedException>,
        bound_fields: HashMap<String, serde_json::Value>,
    ) -> Self {
        let now = Utc::now();
        let thread = std::thread::current();
        let thread_id = thread_id_as_u64(&thread);
        let process_id = std::process::id();

        Record {
            time: now,
            elapsed: now.signed_duration_since(start_time),
            level: LevelInfo::new(level),
            message,
            name: call_site.module.to_string(),
            file: FileInfo {
                name: basename(call_site.file),
                path: call_site.file.to_string(),
            },
            function: call_site.function.to_string(),
            line: call_site.line,
            module: call_site.module.to_string(),
            thread: ThreadInfo {
                id: thread_id,
                name: thread.name().unwrap_or("unnamed").to_string(),
            },
            process: ProcessInfo {
                id: process_id,
                name: std::env::current_exe()
                    .ok()
                    .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
                    .unwrap_or_else(|| "unknown".to_string()),
            },
            exception,
            fields: bound_fields,
        }
    }
}

fn basename(path: &str) -> String {
    path.rsplit(['/', '\\']).next().unwrap_or(path).to_string()
}

fn thread_id_as_u64(thread: &std::thread::Thread) -> u64 {
    // `ThreadId` doesn't expose a stable numeric representation; derive one
    // from its Debug form ("ThreadId(N)") which is stable within a process.
    let debug = format!("{:?}", thread.id());
    debug
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect::<String>()
        .parse()
        .unwrap_or(0)
}
