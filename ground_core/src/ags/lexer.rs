//! Field splitting for AGS lines.
//!
//! AGS fields are comma separated and double-quoted, with `""` standing for a
//! literal quote inside a field. Unquoted fields are tolerated (older AGS3
//! exports write bare numbers) and are trimmed.

/// Split one line into raw field texts.
///
/// Returns a description of the problem when a quote is left open or text
/// follows a closing quote.
pub(crate) fn split_fields(line: &str) -> Result<Vec<String>, String> {
    let mut fields = Vec::new();
    let mut chars = line.chars().peekable();

    loop {
        while matches!(chars.peek(), Some(c) if *c == ' ' || *c == '\t') {
            chars.next();
        }

        let mut field = String::new();
        if chars.peek() == Some(&'"') {
            chars.next();
            let mut closed = false;
            while let Some(c) = chars.next() {
                if c == '"' {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        field.push('"');
                    } else {
                        closed = true;
                        break;
                    }
                } else {
                    field.push(c);
                }
            }
            if !closed {
                return Err(format!("unterminated quote in field {}", fields.len() + 1));
            }
            while matches!(chars.peek(), Some(c) if *c == ' ' || *c == '\t') {
                chars.next();
            }
            match chars.next() {
                None => {
                    fields.push(field);
                    return Ok(fields);
                }
                Some(',') => fields.push(field),
                Some(other) => {
                    return Err(format!(
                        "unexpected '{}' after closing quote in field {}",
                        other,
                        fields.len() + 1
                    ))
                }
            }
        } else {
            let mut ended = true;
            for c in chars.by_ref() {
                if c == ',' {
                    ended = false;
                    break;
                }
                field.push(c);
            }
            fields.push(field.trim().to_string());
            if ended {
                return Ok(fields);
            }
        }
    }
}

/// Quote a field for output, doubling embedded quotes.
pub(crate) fn quote_field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Join quoted fields into an AGS line.
pub(crate) fn join_fields<I, S>(fields: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    fields
        .into_iter()
        .map(|f| quote_field(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_quoted() {
        let fields = split_fields(r#""DATA","BH1","1.50","Firm ""grey"" CLAY""#).unwrap();
        assert_eq!(fields, vec!["DATA", "BH1", "1.50", r#"Firm "grey" CLAY"#]);
    }

    #[test]
    fn test_split_commas_inside_quotes() {
        let fields = split_fields(r#""DATA","Sand, gravelly","""#).unwrap();
        assert_eq!(fields, vec!["DATA", "Sand, gravelly", ""]);
    }

    #[test]
    fn test_split_unquoted_and_trailing_comma() {
        assert_eq!(split_fields(r#""BH1", 1.5 ,2.0"#).unwrap(), vec!["BH1", "1.5", "2.0"]);
        assert_eq!(split_fields(r#""*A","*B","#).unwrap(), vec!["*A", "*B", ""]);
    }

    #[test]
    fn test_split_errors() {
        assert!(split_fields(r#""DATA","open"#).unwrap_err().contains("unterminated"));
        assert!(split_fields(r#""DATA"x,"b""#).unwrap_err().contains("after closing quote"));
    }

    #[test]
    fn test_join_round_trip() {
        let line = join_fields(["GROUP", "say \"hi\""]);
        assert_eq!(line, r#""GROUP","say ""hi""""#);
        assert_eq!(split_fields(&line).unwrap(), vec!["GROUP", "say \"hi\""]);
    }
}
