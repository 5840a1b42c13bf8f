//! Instance identity file handling.
//!
//! The identity file is plain `key=value` text. Only the `name` line is
//! touched; every other byte is preserved.

use crate::config::LayoutConfig;

/// Return `contents` with its name line set to `name`.
///
/// The first `name=` line is replaced in place; if there is none, one is
/// appended on a new line.
pub fn rewrite_name(contents: &str, name: &str) -> String {
    let key = format!("{}=", LayoutConfig::IDENTITY_NAME_KEY);
    let new_line = format!("{}{}", key, name);

    let mut replaced = false;
    let mut out = String::with_capacity(contents.len() + new_line.len() + 1);

    for line in contents.split_inclusive('\n') {
        let (body, ending) = split_line_ending(line);
        if !replaced && body.starts_with(&key) {
            out.push_str(&new_line);
            out.push_str(ending);
            replaced = true;
        } else {
            out.push_str(line);
        }
    }

    if !replaced {
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(&new_line);
        out.push('\n');
    }

    out
}

/// The current instance name, if the file has one.
pub fn read_name(contents: &str) -> Option<&str> {
    let key = format!("{}=", LayoutConfig::IDENTITY_NAME_KEY);
    contents
        .lines()
        .find_map(|line| line.strip_prefix(key.as_str()))
        .map(|value| value.trim_end_matches('\r'))
}

fn split_line_ending(line: &str) -> (&str, &str) {
    if let Some(body) = line.strip_suffix("\r\n") {
        (body, "\r\n")
    } else if let Some(body) = line.strip_suffix('\n') {
        (body, "\n")
    } else {
        (line, "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replaces_in_place() {
        let input = "InstanceType=OneSix\nname=Old\niconKey=default\n";
        assert_eq!(
            rewrite_name(input, "New"),
            "InstanceType=OneSix\nname=New\niconKey=default\n"
        );
    }

    #[test]
    fn test_appends_when_missing() {
        assert_eq!(rewrite_name("iconKey=default\n", "New"), "iconKey=default\nname=New\n");
        assert_eq!(rewrite_name("iconKey=default", "New"), "iconKey=default\nname=New\n");
        assert_eq!(rewrite_name("", "New"), "name=New\n");
    }

    #[test]
    fn test_keeps_crlf_and_missing_trailing_newline() {
        assert_eq!(rewrite_name("a=1\r\nname=Old\r\n", "New"), "a=1\r\nname=New\r\n");
        assert_eq!(rewrite_name("a=1\nname=Old", "New"), "a=1\nname=New");
    }

    #[test]
    fn test_does_not_match_similar_keys() {
        let input = "displayname=Old\nname=Old\n";
        assert_eq!(rewrite_name(input, "New"), "displayname=Old\nname=New\n");
    }

    #[test]
    fn test_read_name() {
        assert_eq!(read_name("a=1\r\nname=Pack 2.7\r\n"), Some("Pack 2.7"));
        assert_eq!(read_name("a=1\n"), None);
    }
}
