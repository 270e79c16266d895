//! Default row limits for SELECT text submitted by callers.

use crate::config::QueryConfig;

/// Appends `LIMIT n` when `query` has no `LIMIT` keyword of its own.
///
/// `n` is the requested limit (or the configured default) capped at
/// `max_limit`. Text that already limits itself is returned unchanged and
/// `requested` is ignored.
pub(crate) fn apply_default_limit(
    query: &str,
    requested: Option<usize>,
    config: &QueryConfig,
) -> String {
    if has_limit_keyword(query) {
        if requested.is_some() {
            tracing::debug!("Query carries its own LIMIT; requested limit ignored");
        }
        return query.to_string();
    }

    let limit = config.effective_limit(requested);
    format!("{query}\nLIMIT {limit}")
}

/// Case-insensitive whole-word search over the outer query only.
///
/// Subqueries, string literals, comments and IRIs are skipped, so `?limitDate`,
/// `ex:LIMIT`, `"LIMIT"` or a nested `{ SELECT .. LIMIT 5 }` do not count.
fn has_limit_keyword(query: &str) -> bool {
    let outer = outer_text(query.as_bytes());
    let keyword = b"LIMIT";

    outer
        .windows(keyword.len())
        .enumerate()
        .any(|(start, window)| {
            window.eq_ignore_ascii_case(keyword)
                && (start == 0 || !is_word_byte(outer[start - 1]))
                && outer
                    .get(start + keyword.len())
                    .is_none_or(|next| !is_word_byte(*next))
        })
}

/// Bytes at brace depth zero, with literals, comments and IRIs blanked out.
fn outer_text(bytes: &[u8]) -> Vec<u8> {
    let mut outer = Vec::with_capacity(bytes.len());
    let mut depth = 0usize;
    let mut index = 0;

    while index < bytes.len() {
        let rest = &bytes[index..];
        let skipped = match rest[0] {
            b'"' | b'\'' => string_literal_len(rest),
            b'#' => rest
                .iter()
                .position(|byte| *byte == b'\n')
                .unwrap_or(rest.len()),
            b'<' => iri_len(rest).unwrap_or(0),
            _ => 0,
        };
        if skipped > 0 {
            if depth == 0 {
                outer.push(b' ');
            }
            index += skipped;
            continue;
        }

        match rest[0] {
            b'{' => {
                if depth == 0 {
                    outer.push(b' ');
                }
                depth += 1;
            }
            b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    outer.push(b' ');
                }
            }
            byte if depth == 0 => outer.push(byte),
            _ => {}
        }
        index += 1;
    }

    outer
}

/// Length of the short or long string literal opening `bytes`. Unterminated
/// literals run to the end of the text.
fn string_literal_len(bytes: &[u8]) -> usize {
    let quote = bytes[0];
    let long = bytes.starts_with(&[quote; 3]);

    let mut index = if long { 3 } else { 1 };
    while index < bytes.len() {
        match bytes[index] {
            b'\\' => index += 2,
            byte if byte == quote && !long => return index + 1,
            byte if byte == quote && bytes[index..].starts_with(&[quote; 3]) => {
                return index + 3;
            }
            b'\n' if !long => return index,
            _ => index += 1,
        }
    }
    bytes.len()
}

/// Length of the IRI reference opening `bytes`, or `None` when the `<` is a
/// comparison.
fn iri_len(bytes: &[u8]) -> Option<usize> {
    let end = bytes[1..].iter().position(|byte| {
        byte.is_ascii_whitespace()
            || matches!(byte, b'<' | b'>' | b'"' | b'{' | b'}' | b'|' | b'^' | b'`')
    })? + 1;
    (bytes[end] == b'>').then_some(end + 1)
}

fn is_word_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || !byte.is_ascii() || matches!(byte, b'_' | b'?' | b'$' | b':')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> QueryConfig {
        QueryConfig {
            timeout_secs: 30,
            default_limit: 100,
            max_limit: 1000,
        }
    }

    #[test]
    fn appends_default_limit() {
        let query = "SELECT ?s WHERE { ?s ?p ?o }";
        assert_eq!(
            apply_default_limit(query, None, &config()),
            "SELECT ?s WHERE { ?s ?p ?o }\nLIMIT 100"
        );
    }

    #[test]
    fn requested_limit_is_capped() {
        let query = "SELECT ?s WHERE { ?s ?p ?o }";
        assert!(apply_default_limit(query, Some(20), &config()).ends_with("\nLIMIT 20"));
        assert!(apply_default_limit(query, Some(50_000), &config()).ends_with("\nLIMIT 1000"));
    }

    #[test]
    fn existing_limit_is_kept() {
        let query = "select ?s where { ?s ?p ?o } limit 5";
        assert_eq!(apply_default_limit(query, Some(20), &config()), query);

        let query = "SELECT ?s WHERE{?s ?p ?o}LIMIT 5";
        assert_eq!(apply_default_limit(query, None, &config()), query);

        let query = "SELECT ?s WHERE { ?s ?p ?o }\nLIMIT\t5 OFFSET 10";
        assert_eq!(apply_default_limit(query, None, &config()), query);

        let query = "PREFIX ex: <http://example.org/>\nSELECT ?s WHERE { ?s a ex:Person } LIMIT 5";
        assert_eq!(apply_default_limit(query, None, &config()), query);
    }

    #[test]
    fn limit_inside_identifiers_does_not_count() {
        let query = "SELECT ?limit WHERE { ?s ex:limit ?limit ; ex:speedLIMIT ?o }";
        assert!(apply_default_limit(query, None, &config()).ends_with("\nLIMIT 100"));
    }

    #[test]
    fn limit_in_subquery_does_not_cap_outer_query() {
        let query = "SELECT ?s ?n WHERE { { SELECT ?s WHERE { ?s a ex:Person } LIMIT 5 } \
                     ?s ex:name ?n }";
        assert!(apply_default_limit(query, None, &config()).ends_with("\nLIMIT 100"));
    }

    #[test]
    fn limit_in_literals_comments_and_iris_does_not_count() {
        let query = "# LIMIT 5\n\
                     PREFIX lim: <http://example.org/LIMIT#x>\n\
                     SELECT ?s WHERE { ?s ?p \"} LIMIT 5\" }\n\
                     ORDER BY ?s # no LIMIT here";
        assert!(apply_default_limit(query, None, &config()).ends_with("\nLIMIT 100"));

        let query = "SELECT ?s WHERE { ?s ?p '''}\nLIMIT 5''' }";
        assert!(apply_default_limit(query, None, &config()).ends_with("\nLIMIT 100"));
    }

    #[test]
    fn comparison_is_not_read_as_iri() {
        let query = "SELECT ?s WHERE { ?s ex:age ?a FILTER(?a < 30 && ?a > 10) } LIMIT 7";
        assert_eq!(apply_default_limit(query, None, &config()), query);
    }
}
