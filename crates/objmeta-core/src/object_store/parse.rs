//! Parse HTTP response header lines into object metadata fields.

/// Fields of a `HEAD` response that matter for metadata reporting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct HeadFields {
    pub content_length: Option<u64>,
    pub server_side_encryption: Option<String>,
}

/// Parse collected header lines. When redirects were followed the lines
/// contain several responses; only the last one counts.
pub(crate) fn parse_headers(lines: &[String]) -> HeadFields {
    let mut fields = HeadFields::default();

    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with("HTTP/") {
            fields = HeadFields::default();
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            let name = name.trim();
            let value = value.trim();
            if name.eq_ignore_ascii_case("content-length") {
                if let Ok(n) = value.parse::<u64>() {
                    fields.content_length = Some(n);
                }
            }
            if name.eq_ignore_ascii_case("x-amz-server-side-encryption") && !value.is_empty() {
                fields.server_side_encryption = Some(value.to_string());
            }
        }
    }

    fields
}
