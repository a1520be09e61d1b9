//! The config file loader (C11): a line-oriented host list.

use std::net::{Ipv4Addr, SocketAddr, ToSocketAddrs};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

const BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// One parsed config line, before DNS resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigTarget {
    pub host: String,
    pub display_name: String,
    /// Set only on the first target following a `>NAME` header line - the
    /// original parser hands the header to exactly one entry and the UI
    /// collaborator draws the group label once, above that entry.
    pub header: Option<String>,
}

/// Load and parse a config file from disk.
pub fn load(path: &Path) -> Result<Vec<ConfigTarget>, ConfigError> {
    let bytes = std::fs::read(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let body = if bytes.starts_with(&BOM) {
        log::warn!("{}: UTF-8 BOM found, treating file as ASCII", path.display());
        &bytes[BOM.len()..]
    } else {
        &bytes[..]
    };
    if !body.is_ascii() {
        return Err(ConfigError::NotAscii(path.to_path_buf()));
    }
    // Safe: just checked the body is ASCII, a subset of UTF-8.
    let text = std::str::from_utf8(body).expect("ASCII is always valid UTF-8");
    let targets = parse(text);
    if targets.is_empty() {
        return Err(ConfigError::NoTargets);
    }
    Ok(targets)
}

/// Parse already-decoded config text (the BOM/ASCII checks happen in `load`;
/// kept separate so the grammar itself is testable on plain `&str`).
pub fn parse(text: &str) -> Vec<ConfigTarget> {
    let mut targets = Vec::new();
    // `header` is handed to exactly the first entry of its group and then
    // taken; `indent` persists for every entry of the group until a bare
    // `>` closes it - the two must not share one `Option`.
    let mut header: Option<String> = None;
    let mut indent = "";
    for raw_line in text.lines() {
        if raw_line.starts_with('#') {
            continue;
        }
        let line = trim_trailing_ascii_whitespace(raw_line);
        if line.is_empty() {
            continue;
        }
        if let Some(rest) = line.strip_prefix('>') {
            if rest.is_empty() {
                header = None;
                indent = "";
            } else {
                header = Some(rest.to_string());
                indent = "   ";
            }
            continue;
        }
        let (host, name) = split_host_and_name(line);
        let display_name = if name.is_empty() {
            format!("{indent}{host}")
        } else {
            format!("{indent}{name}")
        };
        targets.push(ConfigTarget {
            host: host.to_string(),
            display_name,
            header: header.take(),
        });
    }
    targets
}

fn trim_trailing_ascii_whitespace(s: &str) -> &str {
    s.trim_end_matches(|c: char| c.is_ascii_whitespace())
}

fn split_host_and_name(line: &str) -> (&str, &str) {
    match line.find(char::is_whitespace) {
        Some(i) => (&line[..i], line[i..].trim_start()),
        None => (line, ""),
    }
}

/// Resolve one config target to an `Ipv4Addr`, rejecting IPv6-only results
/// per the stated Non-goal.
pub fn resolve(target: &ConfigTarget) -> Result<Ipv4Addr, ConfigError> {
    (target.host.as_str(), 0u16)
        .to_socket_addrs()
        .ok()
        .and_then(|mut addrs| {
            addrs.find_map(|a| match a {
                SocketAddr::V4(v4) => Some(*v4.ip()),
                SocketAddr::V6(_) => None,
            })
        })
        .ok_or_else(|| ConfigError::UnresolvableHost(target.host.clone()))
}

/// Default config path, matching the CLI's `--config` default.
pub fn default_path() -> PathBuf {
    PathBuf::from("pingmon.conf")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let cfg = parse("# a comment\n\n   \n8.8.8.8\n");
        assert_eq!(cfg.len(), 1);
        assert_eq!(cfg[0].host, "8.8.8.8");
    }

    #[test]
    fn host_without_display_name_uses_host() {
        let cfg = parse("8.8.8.8\n");
        assert_eq!(cfg[0].display_name, "8.8.8.8");
    }

    #[test]
    fn host_with_display_name_trims_trailing_whitespace() {
        let cfg = parse("8.8.8.8   Google DNS   \n");
        assert_eq!(cfg[0].host, "8.8.8.8");
        assert_eq!(cfg[0].display_name, "Google DNS");
    }

    #[test]
    fn header_attaches_only_to_first_entry_and_indents_names() {
        let cfg = parse(">Core routers\ncore1 Core One\ncore2\n>\nedge1\n");
        assert_eq!(cfg.len(), 3);
        assert_eq!(cfg[0].header.as_deref(), Some("Core routers"));
        assert_eq!(cfg[0].display_name, "   Core One");
        assert_eq!(cfg[1].header, None);
        assert_eq!(cfg[1].display_name, "   core2");
        assert_eq!(cfg[2].header, None);
        assert_eq!(cfg[2].display_name, "edge1"); // header closed by bare '>'
    }

    #[test]
    fn bare_header_close_resets_indent_even_with_no_open_header() {
        let cfg = parse(">\nhost1\n");
        assert_eq!(cfg[0].display_name, "host1");
    }

    #[test]
    fn loading_rejects_missing_file() {
        let err = load(Path::new("/nonexistent/pingmon.conf")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn loading_rejects_empty_target_list() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "# nothing but comments").unwrap();
        let err = load(f.path()).unwrap_err();
        assert!(matches!(err, ConfigError::NoTargets));
    }

    #[test]
    fn loading_strips_bom_and_parses_the_rest() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(&BOM).unwrap();
        writeln!(f, "8.8.8.8 Google").unwrap();
        let cfg = load(f.path()).unwrap();
        assert_eq!(cfg.len(), 1);
        assert_eq!(cfg[0].host, "8.8.8.8");
        assert_eq!(cfg[0].display_name, "Google");
    }

    #[test]
    fn loading_rejects_non_ascii_bytes() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all("héllo.example.com\n".as_bytes()).unwrap();
        let err = load(f.path()).unwrap_err();
        assert!(matches!(err, ConfigError::NotAscii(_)));
    }

    #[test]
    fn resolve_picks_the_first_ipv4_address() {
        let target = ConfigTarget {
            host: "127.0.0.1".to_string(),
            display_name: "localhost".to_string(),
            header: None,
        };
        assert_eq!(resolve(&target).unwrap(), Ipv4Addr::new(127, 0, 0, 1));
    }

    #[test]
    fn resolve_rejects_unresolvable_host() {
        let target = ConfigTarget {
            host: "this-host-does-not-resolve.invalid".to_string(),
            display_name: "nope".to_string(),
            header: None,
        };
        assert!(matches!(
            resolve(&target),
            Err(ConfigError::UnresolvableHost(_))
        ));
    }
}
