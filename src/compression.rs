//! Compression of superseded log files (spec §4.6)
//!
//! Always produces `<original>.<ext>` and removes the original. One real
//! crate per format, matching the original implementation's per-format
//! stdlib-module dispatch: `flate2` for gzip, `bzip2` for bzip2, `xz2` for
//! both the modern `.xz` container and the legacy standalone `.lzma`
//! format, `zip` for a deflate-compressed archive member.

use crate::error::Result;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A compression target format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionFormat {
    Gz,
    Bz2,
    Xz,
    Lzma,
    Zip,
}

impl CompressionFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            CompressionFormat::Gz => "gz",
            CompressionFormat::Bz2 => "bz2",
            CompressionFormat::Xz => "xz",
            CompressionFormat::Lzma => "lzma",
            CompressionFormat::Zip => "zip",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "gz" | "gzip" => Ok(CompressionFormat::Gz),
            "bz2" | "bzip2" => Ok(CompressionFormat::Bz2),
            "xz" => Ok(CompressionFormat::Xz),
            "lzma" => Ok(CompressionFormat::Lzma),
            "zip" => Ok(CompressionFormat::Zip),
            other => Err(crate::error::ScrivenerError::config(format!(
                "unknown compression format: {other}"
            ))),
        }
    }
}

/// Compiled compression policy for a file sink.
#[derive(Clone)]
pub enum CompressionPolicy {
    None,
    Format(CompressionFormat),
    Callable(Arc<dyn Fn(&Path) -> Result<()> + Send + Sync>),
}

impl std::fmt::Debug for CompressionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompressionPolicy::None => write!(f, "CompressionPolicy::None"),
            CompressionPolicy::Format(fmt_) => write!(f, "CompressionPolicy::Format({fmt_:?})"),
            CompressionPolicy::Callable(_) => write!(f, "CompressionPolicy::Callable(<fn>)"),
        }
    }
}

impl CompressionPolicy {
    pub fn is_none(&self) -> bool {
        matches!(self, CompressionPolicy::None)
    }

    /// Compresses `path`, producing `<path>.<ext>` and removing `path`.
    pub fn compress(&self, path: &Path) -> Result<()> {
        match self {
            CompressionPolicy::None => Ok(()),
            CompressionPolicy::Format(format) => compress_with(*format, path),
            CompressionPolicy::Callable(f) => f(path),
        }
    }
}

fn compress_with(format: CompressionFormat, path: &Path) -> Result<()> {
    let target: PathBuf = append_extension(path, format.extension());
    {
        let mut input = File::open(path)?;
        let output = File::create(&target)?;
        match format {
            CompressionFormat::Gz => {
                let mut encoder =
                    flate2::write::GzEncoder::new(output, flate2::Compression::default());
                io::copy(&mut input, &mut encoder)?;
                encoder.finish()?;
            }
            CompressionFormat::Bz2 => {
                let mut encoder = bzip2::write::BzEncoder::new(output, bzip2::Compression::best());
                io::copy(&mut input, &mut encoder)?;
                encoder.finish()?;
            }
            CompressionFormat::Xz => {
                let mut encoder = xz2::write::XzEncoder::new(output, 6);
                io::copy(&mut input, &mut encoder)?;
                encoder.finish()?;
            }
            CompressionFormat::Lzma => {
                let stream = xz2::stream::Stream::new_lzma_encoder(
                    &xz2::stream::LzmaOptions::new_preset(6).map_err(io::Error::other)?,
                )
                .map_err(io::Error::other)?;
                let mut encoder = xz2::write::XzEncoder::new_stream(output, stream);
                io::copy(&mut input, &mut encoder)?;
                encoder.finish()?;
            }
            CompressionFormat::Zip => {
                let mut writer = zip::ZipWriter::new(output);
                let options = zip::write::SimpleFileOptions::default()
                    .compression_method(zip::CompressionMethod::Deflated);
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "log".to_string());
                writer.start_file(name, options)?;
                io::copy(&mut input, &mut writer)?;
                writer.finish()?;
            }
        }
    }
    std::fs::remove_file(path)?;
    Ok(())
}

fn append_extension(path: &Path, ext: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}
