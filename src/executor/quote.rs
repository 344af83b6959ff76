//! Shell quoting for interpolated values.

/// Quote a value for safe interpolation into a `/bin/sh -c` command line.
///
/// Wraps the value in single quotes; embedded single quotes are closed,
/// escaped, and reopened (`'\''`).
pub fn shell_quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for c in value.chars() {
        if c == '\'' {
            quoted.push_str("'\\''");
        } else {
            quoted.push(c);
        }
    }
    quoted.push('\'');
    quoted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_value() {
        assert_eq!(shell_quote("alice"), "'alice'");
    }

    #[test]
    fn test_spaces_and_metacharacters() {
        assert_eq!(shell_quote("a b; rm -rf /"), "'a b; rm -rf /'");
        assert_eq!(shell_quote("$(id)"), "'$(id)'");
    }

    #[test]
    fn test_embedded_single_quote() {
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
    }

    #[test]
    fn test_empty_value() {
        assert_eq!(shell_quote(""), "''");
    }
}
