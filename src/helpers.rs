//! Helper utility functions for the rebind pass
//!
//! Contains the line-level text utilities shared by the scope tracker, the
//! statement matcher and the lookahead:
//! - Comment stripping
//! - String literal masking
//! - Identifier validation and reference detection

/// Strip a trailing `//` comment from a line, preserving string literals
pub fn strip_inline_comment(line: &str) -> String {
    let mut result = String::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let chars: Vec<char> = line.chars().collect();

    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];

        match quote {
            Some(q) => {
                if escaped {
                    escaped = false;
                } else if c == '\\' && q != '`' {
                    escaped = true;
                } else if c == q {
                    quote = None;
                }
            }
            None => {
                if c == '"' || c == '`' || c == '\'' {
                    quote = Some(c);
                } else if c == '/' && i + 1 < chars.len() && chars[i + 1] == '/' {
                    break;
                }
            }
        }

        result.push(c);
        i += 1;
    }

    result.trim_end().to_string()
}

/// Replace the contents of string, raw string and rune literals with spaces.
///
/// The quotes themselves are kept so column positions stay stable. Used before
/// scanning a line for identifier references so that `"resp"` inside a
/// message never counts as a use of `resp`.
pub fn mask_string_literals(line: &str) -> String {
    let mut result = String::with_capacity(line.len());
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for c in line.chars() {
        match quote {
            Some(q) => {
                if escaped {
                    escaped = false;
                    result.push(' ');
                } else if c == '\\' && q != '`' {
                    escaped = true;
                    result.push(' ');
                } else if c == q {
                    quote = None;
                    result.push(c);
                } else {
                    result.push(' ');
                }
            }
            None => {
                if c == '"' || c == '`' || c == '\'' {
                    quote = Some(c);
                }
                result.push(c);
            }
        }
    }

    result
}

pub fn is_valid_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// Check whether `code` mentions `name` as a standalone identifier.
///
/// Member accesses (`obj.name`) do not count, a selector on the name itself
/// (`name.Field`) does. The caller is expected to pass code that already had
/// comments stripped and string literals masked.
pub fn mentions_identifier(code: &str, name: &str) -> bool {
    if name.is_empty() {
        return false;
    }

    let chars: Vec<char> = code.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();
            if word == name && !preceded_by_dot(&chars, start) {
                return true;
            }
        } else {
            i += 1;
        }
    }
    false
}

fn preceded_by_dot(chars: &[char], start: usize) -> bool {
    chars[..start]
        .iter()
        .rev()
        .find(|c| !c.is_whitespace())
        .map(|&c| c == '.')
        .unwrap_or(false)
}

/// Normalize a line for reference scanning: strip comment, mask literals
pub fn code_portion(line: &str) -> String {
    mask_string_literals(&strip_inline_comment(line))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_inline_comment() {
        assert_eq!(strip_inline_comment("x = 10 // comment"), "x = 10");
        assert_eq!(strip_inline_comment("x = \"a // b\""), "x = \"a // b\"");
        assert_eq!(strip_inline_comment("u := `http://host` // raw"), "u := `http://host`");
    }

    #[test]
    fn test_mask_string_literals() {
        assert_eq!(mask_string_literals(r#"t.Log("resp")"#), r#"t.Log("    ")"#);
        assert_eq!(mask_string_literals(r#"f("a\"b", x)"#), r#"f("    ", x)"#);
    }

    #[test]
    fn test_is_valid_identifier() {
        assert!(is_valid_identifier("resp"));
        assert!(is_valid_identifier("_body"));
        assert!(!is_valid_identifier("123foo"));
        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("a.b"));
    }

    #[test]
    fn test_mentions_identifier() {
        assert!(mentions_identifier("\tif resp.StatusCode != 200 {", "resp"));
        assert!(mentions_identifier("use(x)", "x"));
        assert!(!mentions_identifier("client.resp()", "resp"));
        assert!(!mentions_identifier("response := 1", "resp"));
        assert!(!mentions_identifier("t.Log(\"    \")", "resp"));
    }
}
