//! Batch drivers for dump and pack.
//!
//! Both take an explicit input list; nothing in here scans a working
//! directory on its own. Every file is processed fully and independently
//! on its own freshly read buffer, and any per-file failure is reported
//! and isolated: the batch always continues with the next file.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, error, info, warn};
use rscript_nls::{Decoder, Encoding};

use crate::extract::scan_string_pool;
use crate::format::{parse_sidecar, write_sidecar, ScriptContainer};
use crate::reflow::{reflow, Strategy};

/// Configuration for a dump batch.
#[derive(Debug, Clone)]
pub struct DumpConfig {
    pub inputs: Vec<PathBuf>,
    /// Encoding of the container's original text.
    pub encoding: Encoding,
}

/// Configuration for a pack batch.
#[derive(Debug, Clone)]
pub struct PackConfig {
    pub inputs: Vec<PathBuf>,
    /// Encoding the translated text is re-encoded into.
    pub encoding: Encoding,
    pub strategy: Strategy,
    /// Patched copies land here under their original file names.
    pub out_dir: PathBuf,
}

/// The sidecar path paired with a container: `<input>.txt`.
pub fn sidecar_path(input: &Path) -> PathBuf {
    let mut os = input.as_os_str().to_os_string();
    os.push(".txt");
    PathBuf::from(os)
}

/// Dump a sidecar for every input container. Returns how many were
/// written. Containers with no translatable text are skipped silently;
/// I/O failures are reported and skipped.
pub fn run_dump(config: &DumpConfig) -> usize {
    let decoder = Decoder::new(config.encoding);
    let mut written = 0;
    for path in &config.inputs {
        match dump_one(path, &decoder) {
            Ok(Some(out)) => {
                info!("dumped {} -> {}", path.display(), out.display());
                written += 1;
            }
            Ok(None) => {}
            Err(err) => error!("failed to dump {}: {:#}", path.display(), err),
        }
    }
    written
}

fn dump_one(path: &Path, decoder: &Decoder) -> Result<Option<PathBuf>> {
    let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    let container = match ScriptContainer::parse(bytes) {
        Ok(container) => container,
        Err(err) => {
            debug!("skipping {}: {}", path.display(), err);
            return Ok(None);
        }
    };
    let entries = scan_string_pool(&container, decoder);
    let out = sidecar_path(path);
    fs::write(&out, write_sidecar(&entries))
        .with_context(|| format!("write {}", out.display()))?;
    Ok(Some(out))
}

/// Pack every input container that has a sidecar next to it; inputs
/// without one are skipped. Returns how many patched copies were written.
pub fn run_pack(config: &PackConfig) -> usize {
    let encoder = Decoder::new(config.encoding);
    let mut written = 0;
    for path in &config.inputs {
        let sidecar = sidecar_path(path);
        if !sidecar.exists() {
            debug!("skipping {}: no sidecar", path.display());
            continue;
        }
        match pack_one(path, &sidecar, &encoder, config.strategy, &config.out_dir) {
            Ok(out) => {
                info!("packed {} -> {}", path.display(), out.display());
                written += 1;
            }
            Err(err) => error!("failed to pack {}: {:#}", path.display(), err),
        }
    }
    if written > 0 {
        warn!("verify that replacements did not reach into the control region after the string pool");
    }
    written
}

fn pack_one(
    path: &Path,
    sidecar: &Path,
    encoder: &Decoder,
    strategy: Strategy,
    out_dir: &Path,
) -> Result<PathBuf> {
    let orig = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    let text =
        fs::read_to_string(sidecar).with_context(|| format!("read {}", sidecar.display()))?;
    let translations = parse_sidecar(&text)?;
    let patched = reflow(&orig, &translations, strategy, encoder)?;
    let file_name = path
        .file_name()
        .with_context(|| format!("input path has no file name: {}", path.display()))?;
    let out = out_dir.join(file_name);
    write_patched(&patched, &out)?;
    Ok(out)
}

/// Materialize a patched buffer at `dest`, creating the destination
/// directory first. One write call; a failure aborts this item only.
pub fn write_patched(buf: &[u8], dest: &Path) -> Result<()> {
    if let Some(parent) = dest.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
        }
    }
    fs::write(dest, buf).with_context(|| format!("write {}", dest.display()))
}
