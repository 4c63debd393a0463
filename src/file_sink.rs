//! The rotating, retaining, compressing file sink (spec §4.6)
//!
//! This is the hardest-working component in the crate. A [`FileSink`] owns
//! exactly one open file handle at a time; every write first asks whether
//! the pending message should trigger a rotation, and if so closes the old
//! handle, renames/compresses it, and opens a fresh one before writing.
//!
//! Deterministic testing: `should_rotate`/`write` take the record's time as
//! an explicit argument rather than reading the wall clock, so boundary
//! behaviour is testable without sleeping (spec §8).

use crate::compression::CompressionPolicy;
use crate::error::Result;
use crate::retention::RetentionPolicy;
use crate::rotation::RotationTrigger;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use regex::Regex;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

const FS_TIME_PATTERN: &str = "YYYY-MM-DD_HH-MM-SS";
const COMPRESSION_EXTENSIONS: &str = "gz|gzip|bz2|bzip2|xz|lzma|zip";

struct FileSinkState {
    file: Option<BufWriter<File>>,
    current_path: PathBuf,
    created: u64,
    time_limit: Option<DateTime<Utc>>,
    offset: u64,
}

/// A rotating file sink, constructed once per `log_to(path, ...)` call.
pub struct FileSink {
    path_template: String,
    start_time: DateTime<Utc>,
    rotation: RotationTrigger,
    retention: RetentionPolicy,
    compression: CompressionPolicy,
    state: Mutex<FileSinkState>,
}

impl FileSink {
    pub fn new(
        path_template: impl Into<String>,
        rotation: RotationTrigger,
        retention: RetentionPolicy,
        compression: CompressionPolicy,
        start_time: DateTime<Utc>,
    ) -> Result<Self> {
        let path_template = path_template.into();
        let time_limit = rotation.initial_time_limit(start_time);

        let sink = Self {
            path_template,
            start_time,
            rotation,
            retention,
            compression,
            state: Mutex::new(FileSinkState {
                file: None,
                current_path: PathBuf::new(),
                created: 0,
                time_limit,
                offset: 0,
            }),
        };

        let file_path = sink.format_path(start_time, time_limit, 0);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = open_append(&file_path)?;
        let offset = file.metadata().map(|m| m.len()).unwrap_or(0);

        {
            let mut state = sink.state.lock();
            state.file = Some(BufWriter::new(file));
            state.current_path = file_path;
            state.created = 1;
            state.offset = offset;
        }

        Ok(sink)
    }

    fn format_path(
        &self,
        now: DateTime<Utc>,
        rotation_time: Option<DateTime<Utc>>,
        created: u64,
    ) -> PathBuf {
        let mut s = self.path_template.clone();
        s = s.replace(
            "{start_time}",
            &crate::format::format_time(self.start_time, FS_TIME_PATTERN),
        );
        if let Some(rt) = rotation_time {
            s = s.replace(
                "{rotation_time}",
                &crate::format::format_time(rt, FS_TIME_PATTERN),
            );
        }
        s = s.replace("{time}", &crate::format::format_time(now, FS_TIME_PATTERN));
        s = s.replace("{n+1}", &(created + 1).to_string());
        s = s.replace("{n}", &created.to_string());
        PathBuf::from(s)
    }

    /// Checks whether writing `pending_len` more bytes at `record_time`
    /// should trigger a rotation first.
    fn should_rotate(&self, state: &FileSinkState, record_time: DateTime<Utc>, pending_len: u64) -> bool {
        if let RotationTrigger::Size(limit) = &self.rotation {
            return state.offset + pending_len >= *limit;
        }
        if self.rotation.is_none() {
            return false;
        }
        state.time_limit.map(|limit| record_time >= limit).unwrap_or(false)
    }

    /// Writes `formatted` (already newline-terminated), rotating first if needed.
    pub fn write(&self, record_time: DateTime<Utc>, formatted: &str) -> Result<()> {
        let mut state = self.state.lock();
        let pending_len = formatted.len() as u64;
        if self.should_rotate(&state, record_time, pending_len) {
            self.rotate(&mut state, record_time)?;
        }
        if let Some(ref mut file) = state.file {
            file.write_all(formatted.as_bytes())?;
            file.flush()?;
        }
        state.offset += pending_len;
        Ok(())
    }

    /// Performs the seven-step rotation procedure (spec §4.6).
    fn rotate(&self, state: &mut FileSinkState, now: DateTime<Utc>) -> Result<()> {
        let mut old_path = state.current_path.clone();
        state.file = None;

        let file_path = self.format_path(now, state.time_limit, state.created);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        if let Some(dir) = file_path.parent() {
            self.apply_retention(dir, now)?;
        }

        if state.created > 0 && file_path.exists() {
            old_path = self.shift_backups(&file_path, old_path)?;
        }

        if !self.compression.is_none() && old_path.exists() {
            self.compression.compress(&old_path)?;
        }

        let file = open_append(&file_path)?;
        state.file = Some(BufWriter::new(file));
        state.current_path = file_path;
        state.created += 1;
        if let Some(previous_limit) = state.time_limit {
            state.time_limit = Some(self.rotation.next_time_limit(previous_limit, now));
        }
        state.offset = 0;
        Ok(())
    }

    fn apply_retention(&self, dir: &Path, now: DateTime<Utc>) -> Result<()> {
        let regex = retention_regex(&self.path_template)?;
        let mut candidates = Vec::new();
        if dir.exists() {
            for entry in std::fs::read_dir(dir)?.filter_map(|e| e.ok()) {
                if let Some(name) = entry.file_name().to_str()
                    && regex.is_match(name)
                {
                    candidates.push(entry.path());
                }
            }
        }
        for path in self.retention.files_to_delete(&candidates, now) {
            let _ = std::fs::remove_file(path);
        }
        Ok(())
    }

    /// Shifts numbered backups of `file_path` up by one and renames the
    /// just-closed file into slot 1, returning the path compression should
    /// now target.
    fn shift_backups(&self, file_path: &Path, old_path: PathBuf) -> Result<PathBuf> {
        let dir = file_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let base_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let backup_re = backup_regex(&base_name);

        let mut backups: Vec<(u32, PathBuf, Option<String>)> = Vec::new();
        for entry in std::fs::read_dir(&dir)?.filter_map(|e| e.ok()) {
            if let Some(name) = entry.file_name().to_str()
                && let Some(caps) = backup_re.captures(name)
            {
                let n: u32 = caps.get(1).and_then(|m| m.as_str().parse().ok()).unwrap_or(0);
                let ext = caps.get(2).map(|m| m.as_str().to_string());
                backups.push((n, entry.path(), ext));
            }
        }
        backups.sort_by(|a, b| b.0.cmp(&a.0));

        let width = digit_width(backups.len());
        for (n, path, ext) in &backups {
            let mut new_name = format!("{base_name}.{:0width$}", n + 1, width = width);
            if let Some(e) = ext {
                new_name.push('.');
                new_name.push_str(e);
            }
            std::fs::rename(path, dir.join(new_name))?;
        }

        let renamed = dir.join(format!("{base_name}.{:0width$}", 1, width = width));
        std::fs::rename(file_path, &renamed)?;

        if old_path == file_path {
            Ok(renamed)
        } else {
            Ok(old_path)
        }
    }

    /// Idempotent. Closes the handle; if rotation is disabled and
    /// compression is configured, compresses the final file.
    pub fn stop(&self) -> Result<()> {
        let mut state = self.state.lock();
        if state.file.is_none() {
            return Ok(());
        }
        state.file = None;
        if self.rotation.is_none() && !self.compression.is_none() {
            let path = state.current_path.clone();
            if path.exists() {
                self.compression.compress(&path)?;
            }
        }
        Ok(())
    }

    #[cfg(test)]
    fn current_path(&self) -> PathBuf {
        self.state.lock().current_path.clone()
    }

    #[cfg(test)]
    fn created_count(&self) -> u64 {
        self.state.lock().created
    }
}

fn open_append(path: &Path) -> Result<File> {
    Ok(OpenOptions::new().create(true).append(true).open(path)?)
}

fn digit_width(historical_count: usize) -> usize {
    (((historical_count + 2) as f64).log10().ceil() as usize).max(1)
}

fn backup_regex(base_name: &str) -> Regex {
    let escaped = regex::escape(base_name);
    Regex::new(&format!(r"^{escaped}\.(\d+)(?:\.({COMPRESSION_EXTENSIONS}))?$")).unwrap()
}

/// Derives the retention-matching regex from a path template's base name:
/// literal parts are escaped, each substitution slot becomes `.*`, followed
/// by an optional numeric backup suffix and an optional compression
/// extension (spec §4.6).
fn retention_regex(path_template: &str) -> Result<Regex> {
    let name_template = Path::new(path_template)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path_template.to_string());
    let placeholder_re = Regex::new(r"\{[a-zA-Z_+]+\}").unwrap();

    let mut pattern = String::from("^");
    let mut last = 0;
    for m in placeholder_re.find_iter(&name_template) {
        pattern.push_str(&regex::escape(&name_template[last..m.start()]));
        pattern.push_str(".*");
        last = m.end();
    }
    pattern.push_str(&regex::escape(&name_template[last..]));
    pattern.push_str(r"(?:\.\d+)?(?:\.(?:");
    pattern.push_str(COMPRESSION_EXTENSIONS);
    pattern.push_str("))?$");
    Ok(Regex::new(&pattern)?)
}
