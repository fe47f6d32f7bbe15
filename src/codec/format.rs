//! Delimited text line format
//!
//! - Fields separated by a single delimiter character
//! - A field is quoted when it contains the delimiter, `"`, CR or LF
//! - Quotes inside a quoted field are doubled
//! - A quoted field may span physical lines
//! - A record ends at an unquoted LF (optionally preceded by CR)

/// Result of parsing buffered text as one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parsed {
    /// Text forms a whole record
    Complete(Vec<String>),
    /// Text ends inside a quoted field; more lines are needed
    Incomplete,
}

fn needs_quotes(value: &str, delimiter: char) -> bool {
    value
        .chars()
        .any(|c| c == delimiter || c == '"' || c == '\n' || c == '\r')
}

/// Encodes one record as a line, including the trailing `\n`.
pub fn encode_fields<'a, I>(values: I, delimiter: char) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let values: Vec<&str> = values.into_iter().collect();
    let mut line = String::with_capacity(values.iter().map(|v| v.len() + 1).sum::<usize>() + 1);

    // A lone empty field would otherwise encode as a blank line
    if let [only] = values.as_slice() {
        if only.is_empty() {
            line.push_str("\"\"\n");
            return line;
        }
    }

    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            line.push(delimiter);
        }
        if needs_quotes(value, delimiter) {
            line.push('"');
            for c in value.chars() {
                if c == '"' {
                    line.push('"');
                }
                line.push(c);
            }
            line.push('"');
        } else {
            line.push_str(value);
        }
    }
    line.push('\n');
    line
}

/// Parses buffered text as one record.
///
/// `text` holds one or more physical lines. Anything after the terminating
/// unquoted line break is ignored.
pub fn parse_fields(text: &str, delimiter: char) -> Parsed {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut at_field_start = true;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(c);
            }
            continue;
        }

        match c {
            '\n' => break,
            '\r' if chars.peek() == Some(&'\n') => {}
            '"' if at_field_start => {
                in_quotes = true;
                at_field_start = false;
            }
            c if c == delimiter => {
                fields.push(std::mem::take(&mut field));
                at_field_start = true;
            }
            c => {
                field.push(c);
                at_field_start = false;
            }
        }
    }

    if in_quotes {
        return Parsed::Incomplete;
    }
    fields.push(field);
    Parsed::Complete(fields)
}

/// Whether a physical line carries no record
pub fn is_blank(line: &str) -> bool {
    line.trim_end_matches(['\r', '\n']).is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete(values: &[&str]) -> Parsed {
        Parsed::Complete(values.iter().map(|v| v.to_string()).collect())
    }

    #[test]
    fn test_plain_fields() {
        assert_eq!(encode_fields(["a", "1"], ';'), "a;1\n");
        assert_eq!(parse_fields("a;1\n", ';'), complete(&["a", "1"]));
    }

    #[test]
    fn test_delimiter_and_quotes_are_escaped() {
        let line = encode_fields(["a;b", "say \"hi\""], ';');
        assert_eq!(line, "\"a;b\";\"say \"\"hi\"\"\"\n");
        assert_eq!(parse_fields(&line, ';'), complete(&["a;b", "say \"hi\""]));
    }

    #[test]
    fn test_embedded_newline_spans_lines() {
        let line = encode_fields(["line1\nline2", "x"], ',');
        assert_eq!(line, "\"line1\nline2\",x\n");
        assert_eq!(parse_fields("\"line1\n", ','), Parsed::Incomplete);
        assert_eq!(parse_fields(&line, ','), complete(&["line1\nline2", "x"]));
    }

    #[test]
    fn test_crlf_terminator() {
        assert_eq!(parse_fields("a,b\r\n", ','), complete(&["a", "b"]));
        let line = encode_fields(["a\r\nb"], ',');
        assert_eq!(parse_fields(&line, ','), complete(&["a\r\nb"]));
    }

    #[test]
    fn test_empty_fields() {
        assert_eq!(parse_fields(";\n", ';'), complete(&["", ""]));
        assert_eq!(encode_fields(["", ""], ';'), ";\n");
    }

    #[test]
    fn test_single_empty_field_is_quoted() {
        let line = encode_fields([""], ';');
        assert_eq!(line, "\"\"\n");
        assert!(!is_blank(&line));
        assert_eq!(parse_fields(&line, ';'), complete(&[""]));
    }

    #[test]
    fn test_quote_inside_unquoted_field_is_literal() {
        assert_eq!(parse_fields("5\"10;x\n", ';'), complete(&["5\"10", "x"]));
    }

    #[test]
    fn test_blank_lines() {
        assert!(is_blank("\n"));
        assert!(is_blank("\r\n"));
        assert!(!is_blank(" \n"));
    }
}
