//! Which uploads are accepted and where they are stored.

/// Extensions accepted by the upload endpoints.
pub const ALLOWED_EXTENSIONS: &[&str] = &[
    "txt", "pdf", "csv", "xlsx", "docx", "cdr", "pptx", "sqlite", "db",
];

/// Accepted extensions that no parser handles. Such uploads are stored but
/// leave the document context unchanged.
pub const UNPARSED_EXTENSIONS: &[&str] = &["sqlite", "db"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadKind {
    /// Stored, then loaded as the active document.
    Document,
    /// Stored only.
    Unparsed { extension: String },
}

/// Decide what to do with an uploaded file name. `None` means rejected.
///
/// Call records uploaded as `name.cdr.json` are accepted alongside `.cdr`.
pub fn classify(file_name: &str) -> Option<UploadKind> {
    let lower = file_name.to_ascii_lowercase();
    if lower.ends_with(".cdr.json") {
        return Some(UploadKind::Document);
    }

    let (stem, ext) = lower.rsplit_once('.')?;
    if stem.is_empty() || !ALLOWED_EXTENSIONS.contains(&ext) {
        return None;
    }
    if UNPARSED_EXTENSIONS.contains(&ext) {
        Some(UploadKind::Unparsed {
            extension: ext.to_string(),
        })
    } else {
        Some(UploadKind::Document)
    }
}

/// Reduce a client-supplied file name to a safe single path component.
///
/// Directory parts are dropped, spaces become `_`, and anything outside
/// `[A-Za-z0-9._-]` is removed. Leading dots are stripped so the result is
/// never hidden or a parent reference.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .filter_map(|c| match c {
            ' ' => Some('_'),
            c if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') => Some(c),
            _ => None,
        })
        .collect();
    let cleaned = cleaned.trim_start_matches(['.', '_']);
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_parsed_formats() {
        for name in ["a.txt", "b.PDF", "report.csv", "s.xlsx", "d.docx", "c.cdr", "p.pptx"] {
            assert_eq!(classify(name), Some(UploadKind::Document), "{name}");
        }
        assert_eq!(classify("calls.cdr.json"), Some(UploadKind::Document));
    }

    #[test]
    fn test_classify_unparsed_formats() {
        assert_eq!(
            classify("data.sqlite"),
            Some(UploadKind::Unparsed {
                extension: "sqlite".into()
            })
        );
        assert_eq!(
            classify("app.DB"),
            Some(UploadKind::Unparsed {
                extension: "db".into()
            })
        );
    }

    #[test]
    fn test_classify_rejects() {
        assert_eq!(classify("setup.exe"), None);
        assert_eq!(classify("plain.json"), None);
        assert_eq!(classify("README"), None);
        assert_eq!(classify(".txt"), None);
    }

    #[test]
    fn test_sanitize_strips_directories() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\Users\\me\\report.csv"), "report.csv");
    }

    #[test]
    fn test_sanitize_cleans_characters() {
        assert_eq!(sanitize_filename("my report (v2).pdf"), "my_report_v2.pdf");
        assert_eq!(sanitize_filename("..hidden.txt"), "hidden.txt");
        assert_eq!(sanitize_filename("???"), "upload");
    }
}
