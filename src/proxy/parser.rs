//! Proxy list framing: one proxy per line, fields separated by `:`

use crate::error::Error;
use crate::proxy::models::Proxy;
use crate::Result;
use std::fs;
use std::path::Path;
use tracing::warn;

/// Proxies read from a list, plus the lines that were rejected
#[derive(Debug, Default)]
pub struct ParsedList {
    pub proxies: Vec<Proxy>,
    pub ignored: Vec<Error>,
}

/// Proxy parser for parsing proxies from strings and files
pub struct ProxyParser;

impl ProxyParser {
    /// Parse a single proxy line
    ///
    /// Supports formats:
    /// - HOST:PORT
    /// - HOST:PORT:USER:PASS
    ///
    /// Blank lines and `#` comments yield `Ok(None)`.
    pub fn parse_line(line: &str, line_number: usize) -> std::result::Result<Option<Proxy>, Error> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let parts: Vec<&str> = line.split(':').collect();
        match parts.as_slice() {
            [host, port] => Ok(Some(Proxy::new(*host, *port))),
            [host, port, username, password] => {
                Ok(Some(Proxy::with_auth(*host, *port, *username, *password)))
            }
            _ => Err(Error::MalformedLine {
                line_number,
                line: line.to_string(),
                fields: parts.len(),
            }),
        }
    }

    /// Parse proxies from a string (multiple lines)
    pub fn parse_string(content: &str) -> ParsedList {
        let mut parsed = ParsedList::default();

        for (i, line) in content.lines().enumerate() {
            match Self::parse_line(line, i + 1) {
                Ok(Some(proxy)) => parsed.proxies.push(proxy),
                Ok(None) => {}
                Err(e) => {
                    warn!("ignoring proxy list entry: {}", e);
                    parsed.ignored.push(e);
                }
            }
        }

        parsed
    }

    /// Parse proxies from a file
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<ParsedList> {
        let content = fs::read_to_string(path)?;
        Ok(Self::parse_string(&content))
    }

    /// Render proxies in list format, one newline-terminated line each
    pub fn to_list_string(proxies: &[Proxy]) -> String {
        proxies
            .iter()
            .map(|p| format!("{}\n", p.to_full_string()))
            .collect()
    }

    /// Save proxies to a file
    pub fn save_to_file<P: AsRef<Path>>(proxies: &[Proxy], path: P) -> Result<()> {
        fs::write(path, Self::to_list_string(proxies))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_format() {
        let proxy = ProxyParser::parse_line("192.168.1.1:8080", 1).unwrap().unwrap();
        assert_eq!(proxy.host, "192.168.1.1");
        assert_eq!(proxy.port, "8080");
        assert!(proxy.auth.is_none());
    }

    #[test]
    fn test_parse_with_auth_colon_format() {
        let proxy = ProxyParser::parse_line("192.168.1.1:8080:user:pass", 1)
            .unwrap()
            .unwrap();
        assert_eq!(proxy.host, "192.168.1.1");
        assert_eq!(proxy.port, "8080");
        let auth = proxy.auth.unwrap();
        assert_eq!(auth.username, "user");
        assert_eq!(auth.password, "pass");
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let proxy = ProxyParser::parse_line("  10.0.0.1:3128 \r", 1).unwrap().unwrap();
        assert_eq!(proxy.to_full_string(), "10.0.0.1:3128");
    }

    #[test]
    fn test_parse_empty_and_comment_lines() {
        assert!(ProxyParser::parse_line("", 1).unwrap().is_none());
        assert!(ProxyParser::parse_line("   ", 1).unwrap().is_none());
        assert!(ProxyParser::parse_line("# 1.2.3.4:80", 1).unwrap().is_none());
    }

    #[test]
    fn test_parse_invalid_field_counts() {
        for (line, expected) in [
            ("invalid", 1),
            ("1.2.3.4:80:user", 3),
            ("bad:line:here:x:y", 5),
        ] {
            match ProxyParser::parse_line(line, 7) {
                Err(Error::MalformedLine {
                    line_number,
                    fields,
                    ..
                }) => {
                    assert_eq!(line_number, 7);
                    assert_eq!(fields, expected);
                }
                other => panic!("expected malformed line for {line}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_parse_string_keeps_going_after_bad_lines() {
        let content = "1.2.3.4:8080\nbad:line:here:x:y\n\n5.6.7.8:3128:user:pass\nnope\n9.9.9.9:80\n";
        let parsed = ProxyParser::parse_string(content);

        assert_eq!(parsed.proxies.len(), 3);
        assert_eq!(parsed.ignored.len(), 2);
        assert!(parsed.proxies[0].auth.is_none());
        assert!(parsed.proxies[1].auth.is_some());
        assert_eq!(parsed.proxies[2].host, "9.9.9.9");
    }

    #[test]
    fn test_credentials_present_iff_four_fields() {
        let content = "a:1\nb:2:u:p\nc:3\nd:4:x:y";
        let parsed = ProxyParser::parse_string(content);
        let with_auth: Vec<bool> = parsed.proxies.iter().map(|p| p.auth.is_some()).collect();
        assert_eq!(with_auth, vec![false, true, false, true]);
    }

    #[test]
    fn test_export_round_trip() {
        let proxies = vec![
            Proxy::new("1.2.3.4", "8080"),
            Proxy::with_auth("5.6.7.8", "3128", "user", "pass"),
        ];
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("working.txt");

        ProxyParser::save_to_file(&proxies, &path).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "1.2.3.4:8080\n5.6.7.8:3128:user:pass\n");

        let parsed = ProxyParser::parse_file(&path).unwrap();
        assert_eq!(parsed.proxies, proxies);
        assert!(parsed.ignored.is_empty());
    }

    #[test]
    fn test_export_empty_list() {
        assert_eq!(ProxyParser::to_list_string(&[]), "");
    }
}
