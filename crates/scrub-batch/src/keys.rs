//! Object key conventions.
//!
//! Uploads may live under a `users/{user_id}/` prefix. Derived objects keep
//! that prefix under their own top-level folder:
//!
//! - sanitized output: `processed/users/{user_id}/{dir}/{stem}_{timestamp}.{ext}`
//! - quarantine copy: `quarantine/users/{user_id}/{rest}`
//! - redaction config: `users/{user_id}/config/redaction.json`

use chrono::{DateTime, Utc};

pub const USER_PREFIX: &str = "users/";
pub const OUTPUT_PREFIX: &str = "processed/";
pub const QUARANTINE_PREFIX: &str = "quarantine/";
pub const CONFIG_FILE: &str = "config/redaction.json";

/// Timestamp format appended to output file stems
pub const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Split `users/{id}/rest` into `(Some(id), rest)`; other keys are returned whole
pub fn split_user_prefix(key: &str) -> (Option<&str>, &str) {
    key.strip_prefix(USER_PREFIX)
        .and_then(|tail| tail.split_once('/'))
        .filter(|(id, rest)| !id.is_empty() && !rest.is_empty())
        .map_or((None, key), |(id, rest)| (Some(id), rest))
}

fn user_segment(user_id: Option<&str>) -> String {
    user_id.map_or_else(String::new, |id| format!("{USER_PREFIX}{id}/"))
}

/// Lowercased extension of the key's file name, if it has one
pub fn extension(key: &str) -> Option<String> {
    let name = key.rsplit('/').next().unwrap_or(key);
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Key of the sanitized output for `key`
pub fn output_key(key: &str, output_ext: &str, batch_started: DateTime<Utc>) -> String {
    let (user_id, rest) = split_user_prefix(key);
    let (dir, name) = match rest.rsplit_once('/') {
        Some((dir, name)) => (format!("{dir}/"), name),
        None => (String::new(), rest),
    };
    let stem = match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    };

    format!(
        "{OUTPUT_PREFIX}{}{dir}{stem}_{}.{output_ext}",
        user_segment(user_id),
        batch_started.format(TIMESTAMP_FORMAT)
    )
}

/// Key of the quarantine copy for `key`
pub fn quarantine_key(key: &str) -> String {
    let (user_id, rest) = split_user_prefix(key);
    format!("{QUARANTINE_PREFIX}{}{rest}", user_segment(user_id))
}

/// Key of the redaction config for a user, or the shared one
pub fn config_key(user_id: Option<&str>) -> String {
    format!("{}{CONFIG_FILE}", user_segment(user_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_split_user_prefix() {
        assert_eq!(
            split_user_prefix("users/u42/docs/a.pdf"),
            (Some("u42"), "docs/a.pdf")
        );
        assert_eq!(split_user_prefix("shared/a.pdf"), (None, "shared/a.pdf"));
        assert_eq!(split_user_prefix("users//a.pdf"), (None, "users//a.pdf"));
        assert_eq!(split_user_prefix("users/u42/"), (None, "users/u42/"));
    }

    #[test]
    fn test_extension() {
        assert_eq!(extension("users/u1/Report.PDF").as_deref(), Some("pdf"));
        assert_eq!(extension("archive.tar.gz").as_deref(), Some("gz"));
        assert_eq!(extension("README"), None);
        assert_eq!(extension(".env"), None);
        assert_eq!(extension("dir.d/file"), None);
    }

    #[test]
    fn test_output_key() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).unwrap();
        assert_eq!(
            output_key("users/u1/docs/contract.docx", "txt", ts),
            "processed/users/u1/docs/contract_20240309T140500Z.txt"
        );
        assert_eq!(
            output_key("notes.md", "md", ts),
            "processed/notes_20240309T140500Z.md"
        );
    }

    #[test]
    fn test_quarantine_and_config_keys() {
        assert_eq!(
            quarantine_key("users/u1/bad.exe"),
            "quarantine/users/u1/bad.exe"
        );
        assert_eq!(quarantine_key("bad.exe"), "quarantine/bad.exe");
        assert_eq!(config_key(Some("u1")), "users/u1/config/redaction.json");
        assert_eq!(config_key(None), "config/redaction.json");
    }
}
