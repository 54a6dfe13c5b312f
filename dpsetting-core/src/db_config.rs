//! Database credentials from an installation's embedded PHP config.
//!
//! The config file is PHP, but only one shape of statement matters:
//!
//! ```php
//! $DB_CONFIG['host'] = 'localhost';
//! $DB_CONFIG["password"] = "s3cr\"et";
//! ```
//!
//! Parsing is line oriented and works on text only ([`parse_db_config`]).
//! [`extract`] adds the file read and the mapping to credentials.

use crate::Result;
use crate::error::SettingError;
use crate::security::DatabaseCredentials;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;
use tracing::debug;

/// Keys read from `$DB_CONFIG` and the option each one stands in for.
pub const KEY_MAP: [(&str, &str); 4] = [
    ("host", "login_host"),
    ("user", "login_user"),
    ("password", "login_password"),
    ("dbname", "db"),
];

const COMMENT_MARKERS: [&str; 4] = ["//", "#", "/*", "*"];

fn assignment_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // Each quoted part opens and closes with the same quote character;
        // key and value choose independently.
        Regex::new(
            r#"\$DB_CONFIG\s*\[\s*(?:'(?P<sq_key>[^']*)'|"(?P<dq_key>[^"]*)")\s*\]\s*=\s*(?:'(?P<sq_val>(?:[^'\\]|\\.)*)'|"(?P<dq_val>(?:[^"\\]|\\.)*)")\s*;"#,
        )
        .expect("Invalid DB_CONFIG assignment pattern")
    })
}

/// Collects every `$DB_CONFIG[...] = ...;` assignment in `text`.
///
/// Commented lines are skipped. Escapes in the value are decoded the way
/// PHP would. A key assigned twice keeps its last value.
pub fn parse_db_config(text: &str) -> BTreeMap<String, String> {
    let pattern = assignment_pattern();
    let mut entries = BTreeMap::new();

    for line in text.lines() {
        let trimmed = line.trim_start();
        if COMMENT_MARKERS.iter().any(|m| trimmed.starts_with(m)) {
            continue;
        }

        for captures in pattern.captures_iter(line) {
            let key = captures
                .name("sq_key")
                .or_else(|| captures.name("dq_key"))
                .map(|m| m.as_str().to_string());

            let value = if let Some(raw) = captures.name("sq_val") {
                Some(unescape_single_quoted(raw.as_str()))
            } else {
                captures
                    .name("dq_val")
                    .map(|raw| unescape_double_quoted(raw.as_str()))
            };

            if let (Some(key), Some(value)) = (key, value) {
                entries.insert(key, value);
            }
        }
    }

    entries
}

/// Builds credentials from parsed entries.
///
/// `path` is only used for the error message.
///
/// # Errors
/// Returns `IncompleteConfig` unless all four recognised keys are present.
pub fn credentials_from_entries(
    path: &Path,
    entries: &BTreeMap<String, String>,
) -> Result<DatabaseCredentials> {
    let lookup = |key: &str| entries.get(key).map(String::as_str);

    if let (Some(host), Some(user), Some(password), Some(dbname)) = (
        lookup("host"),
        lookup("user"),
        lookup("password"),
        lookup("dbname"),
    ) {
        return Ok(DatabaseCredentials::new(host, user, password, dbname));
    }

    let (found, missing): (Vec<_>, Vec<_>) = KEY_MAP
        .iter()
        .map(|(key, _)| *key)
        .partition(|key| entries.contains_key(*key));

    Err(SettingError::IncompleteConfig {
        path: path.to_path_buf(),
        found: found.into_iter().map(str::to_string).collect(),
        missing,
    })
}

/// Reads the embedded config at `path` and extracts the credentials.
///
/// # Errors
/// - `Io` when the file cannot be read
/// - `IncompleteConfig` when fewer than four credentials were found
pub fn extract(path: &Path) -> Result<DatabaseCredentials> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        SettingError::io(
            format!("Failed to read database config {}", path.display()),
            e,
        )
    })?;

    let entries = parse_db_config(&text);
    debug!(
        path = %path.display(),
        keys = ?entries.keys().collect::<Vec<_>>(),
        "Parsed embedded database config"
    );

    credentials_from_entries(path, &entries)
}

fn unescape_single_quoted(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some(escaped @ ('\\' | '\'')) => out.push(escaped),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

fn unescape_double_quoted(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some(escaped @ ('\\' | '"' | '$')) => out.push(escaped),
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_CONFIG: &str = r#"<?php
// Deskpro database configuration
$DB_CONFIG['host'] = 'localhost';
$DB_CONFIG["user"] = "deskpro";
$DB_CONFIG['password'] = "p@ss";
$DB_CONFIG[ "dbname" ]='deskpro';
"#;

    #[test]
    fn test_mixed_quotes_yield_all_four() {
        let entries = parse_db_config(FULL_CONFIG);
        assert_eq!(entries.len(), 4);

        let creds = credentials_from_entries(Path::new("config.database.php"), &entries).unwrap();
        assert_eq!(creds.host(), "localhost");
        assert_eq!(creds.user(), "deskpro");
        assert_eq!(creds.password(), "p@ss");
        assert_eq!(creds.dbname(), "deskpro");
    }

    #[test]
    fn test_missing_key_is_incomplete() {
        let text = FULL_CONFIG.replace("$DB_CONFIG['password'] = \"p@ss\";\n", "");
        let entries = parse_db_config(&text);

        match credentials_from_entries(Path::new("config.database.php"), &entries) {
            Err(SettingError::IncompleteConfig { found, missing, .. }) => {
                assert_eq!(found, vec!["host", "user", "dbname"]);
                assert_eq!(missing, vec!["password"]);
            }
            other => panic!("expected IncompleteConfig, got {:?}", other),
        }
    }

    #[test]
    fn test_mismatched_quotes_are_not_assignments() {
        let entries = parse_db_config("$DB_CONFIG['host\"] = 'localhost';\n$DB_CONFIG['user'] = \"deskpro';\n");
        assert!(entries.is_empty());
    }

    #[test]
    fn test_commented_lines_are_skipped() {
        let text = r#"
// $DB_CONFIG['host'] = 'old-host';
# $DB_CONFIG['user'] = 'old-user';
/* $DB_CONFIG['password'] = 'old'; */
 * $DB_CONFIG['dbname'] = 'old-db';
$DB_CONFIG['host'] = 'new-host';
"#;
        let entries = parse_db_config(text);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries.get("host").map(String::as_str), Some("new-host"));
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let text = format!("{}$DB_CONFIG['port'] = '3307';\n", FULL_CONFIG);
        let entries = parse_db_config(&text);
        assert_eq!(entries.get("port").map(String::as_str), Some("3307"));
        assert!(credentials_from_entries(Path::new("c.php"), &entries).is_ok());
    }

    #[test]
    fn test_last_assignment_wins() {
        let text = "$DB_CONFIG['host'] = 'a';\n$DB_CONFIG['host'] = 'b';\n";
        assert_eq!(parse_db_config(text).get("host").map(String::as_str), Some("b"));
    }

    #[test]
    fn test_escaped_quotes_in_values() {
        let text = r#"$DB_CONFIG['password'] = 'it\'s\\here';
$DB_CONFIG['user'] = "say \"hi\" \$now";
$DB_CONFIG['host'] = 'db'; // trailing 'comment';
"#;
        let entries = parse_db_config(text);
        assert_eq!(
            entries.get("password").map(String::as_str),
            Some(r"it's\here")
        );
        assert_eq!(
            entries.get("user").map(String::as_str),
            Some(r#"say "hi" $now"#)
        );
        assert_eq!(entries.get("host").map(String::as_str), Some("db"));
    }

    #[test]
    fn test_assignments_after_open_tag_and_on_one_line() {
        let text = "<?php $DB_CONFIG['host'] = 'h'; $DB_CONFIG[\"user\"] = \"u\";\n\
                    $DB_CONFIG['password'] = 'p'; $DB_CONFIG['dbname'] = 'd';\n";
        let entries = parse_db_config(text);

        let creds = credentials_from_entries(Path::new("config.database.php"), &entries).unwrap();
        assert_eq!(creds.host(), "h");
        assert_eq!(creds.user(), "u");
        assert_eq!(creds.password(), "p");
        assert_eq!(creds.dbname(), "d");
    }

    #[test]
    fn test_whitespace_is_tolerated() {
        let entries = parse_db_config("   $DB_CONFIG  [ 'host' ]   =   'h'   ;\n");
        assert_eq!(entries.get("host").map(String::as_str), Some("h"));
    }

    #[test]
    fn test_extract_unreadable_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = extract(&dir.path().join("config.database.php"));
        assert!(matches!(result, Err(SettingError::Io { .. })));
    }

    #[test]
    fn test_extract_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.database.php");
        std::fs::write(&path, FULL_CONFIG).unwrap();

        let creds = extract(&path).unwrap();
        assert_eq!(creds.dbname(), "deskpro");
    }
}
