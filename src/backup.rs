use anyhow::{anyhow, bail, Context};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::model::{leaf_count, mark_in_range, Group, MarksTable};
use crate::store::Store;

const MANIFEST_ENTRY: &str = "manifest.json";
const GROUPS_ENTRY: &str = "data/groups.json";
const MARKS_ENTRY: &str = "data/marks.json";
pub const BUNDLE_FORMAT_V1: &str = "mentormarks-data-v1";

#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub bundle_format: String,
    pub entry_count: usize,
}

#[derive(Debug, Clone)]
pub struct ImportSummary {
    pub bundle_format_detected: String,
    pub groups: usize,
    pub marks: usize,
}

fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

pub fn export_bundle(store: &Store, out_path: &Path) -> anyhow::Result<ExportSummary> {
    let groups = store.load_groups()?.unwrap_or_default();
    let marks = store.load_marks()?;
    let groups_text =
        serde_json::to_string_pretty(&groups).context("failed to serialize groups")?;
    let marks_text = serde_json::to_string_pretty(&marks).context("failed to serialize marks")?;

    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.to_string_lossy()))?;
    }
    let out_file = File::create(out_path).with_context(|| {
        format!(
            "failed to create output file {}",
            out_path.to_string_lossy()
        )
    })?;
    let mut zip = ZipWriter::new(out_file);
    let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut digests = serde_json::Map::new();
    digests.insert(
        GROUPS_ENTRY.to_string(),
        json!(sha256_hex(groups_text.as_bytes())),
    );
    digests.insert(
        MARKS_ENTRY.to_string(),
        json!(sha256_hex(marks_text.as_bytes())),
    );
    let manifest = json!({
        "format": BUNDLE_FORMAT_V1,
        "version": 1,
        "appVersion": env!("CARGO_PKG_VERSION"),
        "exportedAt": chrono::Utc::now().to_rfc3339(),
        "sha256": digests,
    });
    zip.start_file(MANIFEST_ENTRY, opts)
        .context("failed to start manifest entry")?;
    zip.write_all(
        serde_json::to_string_pretty(&manifest)
            .context("failed to serialize manifest")?
            .as_bytes(),
    )
    .context("failed to write manifest entry")?;

    for (name, text) in [(GROUPS_ENTRY, &groups_text), (MARKS_ENTRY, &marks_text)] {
        zip.start_file(name, opts)
            .with_context(|| format!("failed to start {name} entry"))?;
        zip.write_all(text.as_bytes())
            .with_context(|| format!("failed to write {name} entry"))?;
    }

    zip.finish().context("failed to finalize zip bundle")?;

    Ok(ExportSummary {
        bundle_format: BUNDLE_FORMAT_V1.to_string(),
        entry_count: 3,
    })
}

fn read_entry<R: Read + std::io::Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> anyhow::Result<String> {
    let mut text = String::new();
    archive
        .by_name(name)
        .with_context(|| format!("bundle missing {name}"))?
        .read_to_string(&mut text)
        .with_context(|| format!("failed to read {name}"))?;
    Ok(text)
}

/// Restores both documents from a bundle. Everything is verified before either
/// document is replaced.
pub fn import_bundle(store: &Store, in_path: &Path) -> anyhow::Result<ImportSummary> {
    let in_file = File::open(in_path)
        .with_context(|| format!("failed to open bundle {}", in_path.to_string_lossy()))?;
    let mut archive = ZipArchive::new(in_file).context("invalid zip archive")?;

    let manifest: serde_json::Value = serde_json::from_str(&read_entry(&mut archive, MANIFEST_ENTRY)?)
        .context("manifest.json is invalid JSON")?;
    let format = manifest
        .get("format")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    if format != BUNDLE_FORMAT_V1 {
        bail!("unsupported bundle format: {}", format);
    }

    let groups_text = read_entry(&mut archive, GROUPS_ENTRY)?;
    let marks_text = read_entry(&mut archive, MARKS_ENTRY)?;
    for (name, text) in [(GROUPS_ENTRY, &groups_text), (MARKS_ENTRY, &marks_text)] {
        let expected = manifest
            .get("sha256")
            .and_then(|v| v.get(name))
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow!("manifest has no digest for {name}"))?;
        if sha256_hex(text.as_bytes()) != expected {
            bail!("digest mismatch for {name}");
        }
    }

    let groups: Vec<Group> =
        serde_json::from_str(&groups_text).context("bundled groups.json is invalid")?;
    let marks: MarksTable =
        serde_json::from_str(&marks_text).context("bundled marks.json is invalid")?;
    let out_of_range = marks
        .values()
        .flat_map(|g| g.values())
        .flat_map(|s| s.values())
        .any(|m| !mark_in_range(*m));
    if out_of_range {
        bail!("bundled marks.json has marks outside 0..=100");
    }

    store.replace_all(&groups, &marks)?;

    Ok(ImportSummary {
        bundle_format_detected: BUNDLE_FORMAT_V1.to_string(),
        groups: groups.len(),
        marks: leaf_count(&marks),
    })
}
