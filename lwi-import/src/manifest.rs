//! Attachment manifest reconciliation
//!
//! Each `fileset-N.json` descriptor names one sibling file through the first
//! element of its `title` array. Descriptors are walked in index order and
//! anomalies are skipped with a warning:
//! - empty or unreadable name
//! - name already attached
//! - named file not present in the item directory
//!
//! Any other read failure aborts the item. Media types always come from the
//! file content, never from the descriptor.

use crate::error::{ImportError, ImportResult};
use crate::extract::RawItem;
use crate::record::Attachment;
use crate::sidecar::{load_file, numbered_sidecars, FILESET_PREFIX};
use std::io::ErrorKind;
use std::path::{Component, Path};
use tracing::{debug, warn};

/// Media type for unrecognised text content
pub const TEXT_MEDIA_TYPE: &str = "text/plain; charset=utf-8";

/// Media type for unrecognised binary content
pub const BINARY_MEDIA_TYPE: &str = "application/octet-stream";

/// Rebuild the ordered attachment list for an item directory
pub fn reconcile_attachments(dir: &Path) -> ImportResult<Vec<Attachment>> {
    let mut attachments: Vec<Attachment> = Vec::new();

    for descriptor in numbered_sidecars(dir, FILESET_PREFIX) {
        let buf = load_file(&descriptor)?;
        let declared = declared_name(&buf);
        let name = declared.trim();

        if name.is_empty() {
            warn!("bad/empty file name in {}, skipping", descriptor.display());
            continue;
        }

        if !is_plain_file_name(name) {
            warn!(
                "file name [{}] in {} is not a plain file name, skipping",
                name,
                descriptor.display()
            );
            continue;
        }

        if attachments.iter().any(|a| a.key() == name) {
            warn!("duplicate file name [{}] in {}, skipping", name, descriptor.display());
            continue;
        }

        let file_path = dir.join(name);
        match std::fs::read(&file_path) {
            Ok(content) => {
                let media_type = sniff_media_type(&content);
                debug!(
                    file = %file_path.display(),
                    media_type = %media_type,
                    bytes = content.len(),
                    "Loaded attachment"
                );
                attachments.push(Attachment::new(name, media_type, content));
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("file not found ({}), skipping", file_path.display());
            }
            Err(e) => return Err(ImportError::io(file_path, e)),
        }
    }

    Ok(attachments)
}

/// Declared file name of a descriptor; "" when it cannot be determined
pub fn declared_name(descriptor: &[u8]) -> String {
    RawItem::from_slice(descriptor)
        .and_then(|raw| raw.first_string("title"))
        .unwrap_or_default()
}

/// Determine a media type from magic bytes
pub fn sniff_media_type(content: &[u8]) -> String {
    if let Some(kind) = infer::get(content) {
        return kind.mime_type().to_string();
    }

    if std::str::from_utf8(content).is_ok() {
        TEXT_MEDIA_TYPE.to_string()
    } else {
        BINARY_MEDIA_TYPE.to_string()
    }
}

/// A single, normal path component (no separators, no `..`)
fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const PDF_BYTES: &[u8] = b"%PDF-1.4\n%\xe2\xe3\xcf\xd3\n1 0 obj\n<<>>\nendobj\n";
    const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR\x00\x00\x00\x01";

    fn descriptor(dir: &Path, index: usize, title: &str) {
        fs::write(
            dir.join(format!("fileset-{}.json", index)),
            format!(r#"{{"title": ["{}"], "mime_type": "text/plain"}}"#, title),
        )
        .unwrap();
    }

    #[test]
    fn test_attachments_in_descriptor_order() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        descriptor(dir, 1, "paper.pdf");
        descriptor(dir, 2, "figure.png");
        fs::write(dir.join("paper.pdf"), PDF_BYTES).unwrap();
        fs::write(dir.join("figure.png"), PNG_BYTES).unwrap();

        let attachments = reconcile_attachments(dir).unwrap();
        assert_eq!(attachments.len(), 2);
        assert_eq!(attachments[0].name, "paper.pdf");
        assert_eq!(attachments[0].media_type, "application/pdf");
        assert_eq!(attachments[0].content, PDF_BYTES.to_vec());
        assert_eq!(attachments[1].name, "figure.png");
        assert_eq!(attachments[1].media_type, "image/png");
    }

    #[test]
    fn test_duplicate_name_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        descriptor(dir, 1, "x.pdf");
        descriptor(dir, 2, "x.pdf");
        fs::write(dir.join("x.pdf"), PDF_BYTES).unwrap();

        let attachments = reconcile_attachments(dir).unwrap();
        assert_eq!(attachments.len(), 1);
    }

    #[test]
    fn test_duplicate_detection_uses_trimmed_name() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        descriptor(dir, 1, "x.pdf");
        descriptor(dir, 2, " x.pdf ");
        fs::write(dir.join("x.pdf"), PDF_BYTES).unwrap();

        let attachments = reconcile_attachments(dir).unwrap();
        assert_eq!(attachments.len(), 1);
    }

    #[test]
    fn test_missing_file_is_skipped_and_scan_continues() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        descriptor(dir, 1, "never-delivered.pdf");
        descriptor(dir, 2, "present.pdf");
        fs::write(dir.join("present.pdf"), PDF_BYTES).unwrap();

        let attachments = reconcile_attachments(dir).unwrap();
        assert_eq!(attachments.len(), 1);
        assert_eq!(attachments[0].name, "present.pdf");
    }

    #[test]
    fn test_empty_or_malformed_name_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        fs::write(dir.join("fileset-1.json"), r#"{"title": []}"#).unwrap();
        fs::write(dir.join("fileset-2.json"), r#"{"title": "not-an-array.pdf"}"#).unwrap();
        fs::write(dir.join("fileset-3.json"), "garbage").unwrap();
        descriptor(dir, 4, "   ");
        descriptor(dir, 5, "ok.pdf");
        fs::write(dir.join("ok.pdf"), PDF_BYTES).unwrap();

        let attachments = reconcile_attachments(dir).unwrap();
        assert_eq!(attachments.len(), 1);
        assert_eq!(attachments[0].name, "ok.pdf");
    }

    #[test]
    fn test_name_is_trimmed_before_lookup() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        descriptor(dir, 1, "  report.pdf ");
        fs::write(dir.join("report.pdf"), PDF_BYTES).unwrap();

        let attachments = reconcile_attachments(dir).unwrap();
        assert_eq!(attachments.len(), 1);
        assert_eq!(attachments[0].name, "report.pdf");
    }

    #[test]
    fn test_traversal_names_are_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let item = temp_dir.path().join("item");
        fs::create_dir(&item).unwrap();
        fs::write(temp_dir.path().join("outside.pdf"), PDF_BYTES).unwrap();
        descriptor(&item, 1, "../outside.pdf");

        let attachments = reconcile_attachments(&item).unwrap();
        assert!(attachments.is_empty());
    }

    #[test]
    fn test_gap_ends_enumeration() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        descriptor(dir, 1, "a.pdf");
        descriptor(dir, 3, "c.pdf");
        fs::write(dir.join("a.pdf"), PDF_BYTES).unwrap();
        fs::write(dir.join("c.pdf"), PDF_BYTES).unwrap();

        let attachments = reconcile_attachments(dir).unwrap();
        assert_eq!(attachments.len(), 1);
        assert_eq!(attachments[0].name, "a.pdf");
    }

    #[test]
    fn test_unreadable_named_file_aborts() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        descriptor(dir, 1, "folder");
        // A directory where a file is expected is a read failure, not "missing"
        fs::create_dir(dir.join("folder")).unwrap();

        let result = reconcile_attachments(dir);
        assert!(matches!(result, Err(ImportError::Io { .. })));
    }

    #[test]
    fn test_sniff_media_type_ignores_declared_type() {
        assert_eq!(sniff_media_type(PDF_BYTES), "application/pdf");
        assert_eq!(sniff_media_type(b"plain words"), TEXT_MEDIA_TYPE);
        assert_eq!(sniff_media_type(b""), TEXT_MEDIA_TYPE);
        assert_eq!(sniff_media_type(&[0xff, 0xfe, 0x00, 0x81, 0x02]), BINARY_MEDIA_TYPE);
    }
}
