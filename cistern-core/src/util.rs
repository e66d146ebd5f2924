use std::fmt::Write;

/// Writes `value` into `out` replacing every occurrence of `search` with `replace`.
pub fn write_escaped(out: &mut String, value: &str, search: char, replace: &str) {
    let mut position = 0;
    for (i, c) in value.char_indices() {
        if c == search {
            out.push_str(&value[position..i]);
            out.push_str(replace);
            position = i + c.len_utf8();
        }
    }
    out.push_str(&value[position..]);
}

pub fn separated_by<T, F>(
    out: &mut String,
    values: impl IntoIterator<Item = T>,
    mut f: F,
    separator: &str,
) where
    F: FnMut(&mut String, T),
{
    let mut len = out.len();
    for v in values {
        if out.len() > len {
            out.push_str(separator);
        }
        len = out.len();
        f(out, v);
    }
}

/// True when the remaining SQL holds something other than whitespace, `;` or comments.
pub fn has_more_statements(tail: &str) -> bool {
    let mut rest = tail;
    loop {
        rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == ';');
        if let Some(comment) = rest.strip_prefix("--") {
            rest = comment.split_once('\n').map(|(_, v)| v).unwrap_or("");
        } else if let Some(comment) = rest.strip_prefix("/*") {
            rest = comment.split_once("*/").map(|(_, v)| v).unwrap_or("");
        } else {
            return !rest.is_empty();
        }
    }
}

/// Flattens the parameter values into a short human readable list, used in logs.
pub fn printable_values<'a>(values: impl IntoIterator<Item = &'a crate::Value>) -> String {
    let mut out = String::new();
    separated_by(
        &mut out,
        values,
        |out, v| {
            let _ = write!(out, "{}", v);
        },
        ", ",
    );
    out
}

/// Longest prefix of `value` not exceeding `max` bytes that ends on a char boundary.
pub fn truncated(value: &str, max: usize) -> &str {
    if value.len() <= max {
        return value;
    }
    let mut end = max;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    &value[..end]
}

#[macro_export]
macro_rules! truncate_long {
    ($query:expr) => {
        format_args!(
            "{}{}",
            $crate::truncated(&$query, 497).trim_end(),
            if $query.len() > 497 { "..." } else { "" },
        )
    };
}

/// Logs the error at `error` level and evaluates to it.
#[macro_export]
macro_rules! logged {
    ($error:expr) => {{
        let error = $error;
        $crate::log::error!("{:#}", error);
        error
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_quotes() {
        let mut out = String::new();
        write_escaped(&mut out, r#"my "table""#, '"', r#""""#);
        assert_eq!(out, r#"my ""table"""#);
    }

    #[test]
    fn escape_multibyte() {
        let mut out = String::new();
        write_escaped(&mut out, "ä'ö", '\'', "''");
        assert_eq!(out, "ä''ö");
    }

    #[test]
    fn separated() {
        let mut out = String::new();
        separated_by(&mut out, [1, 2, 3], |o, v| o.push_str(&v.to_string()), ", ");
        assert_eq!(out, "1, 2, 3");
    }

    #[test]
    fn more_statements() {
        assert!(!has_more_statements(""));
        assert!(!has_more_statements("  ;\n  "));
        assert!(!has_more_statements(" -- trailing comment"));
        assert!(!has_more_statements(" /* block */ ;"));
        assert!(has_more_statements("; SELECT 1"));
        assert!(has_more_statements("/* c */ INSERT INTO t VALUES (1)"));
    }

    #[test]
    fn truncate() {
        let short = "SELECT 1";
        assert_eq!(format!("{}", truncate_long!(short)), "SELECT 1");
        let long = "x".repeat(600);
        let printed = format!("{}", truncate_long!(long));
        assert!(printed.ends_with("..."));
        assert_eq!(printed.len(), 500);
    }
}
