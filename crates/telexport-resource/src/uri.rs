// SPDX-FileCopyrightText: 2026 Telexport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The opaque artifact URI scheme.
//!
//! `telexport://export/<id>.ndjson` where `<id>` is `export-` followed by
//! 16 lowercase hex characters. No filesystem component ever appears in a
//! URI; the store maps ids to paths internally.

const SCHEME_PREFIX: &str = "telexport://export/";
const SUFFIX: &str = ".ndjson";
const ID_PREFIX: &str = "export-";
const ID_HEX_LEN: usize = 16;

/// Forge the URI for an artifact id.
pub fn artifact_uri(id: &str) -> String {
    format!("{SCHEME_PREFIX}{id}{SUFFIX}")
}

/// Parse a URI back into an artifact id, rejecting anything that does not
/// match the scheme exactly.
pub fn parse_artifact_uri(uri: &str) -> Option<&str> {
    let id = uri.strip_prefix(SCHEME_PREFIX)?.strip_suffix(SUFFIX)?;
    let hex = id.strip_prefix(ID_PREFIX)?;
    if hex.len() == ID_HEX_LEN && hex.chars().all(|c| c.is_ascii_hexdigit() && !c.is_uppercase()) {
        Some(id)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forge_and_parse_round_trip() {
        let id = "export-0123456789abcdef";
        let uri = artifact_uri(id);
        assert_eq!(uri, "telexport://export/export-0123456789abcdef.ndjson");
        assert_eq!(parse_artifact_uri(&uri), Some(id));
    }

    #[test]
    fn rejects_foreign_schemes_and_shapes() {
        assert_eq!(parse_artifact_uri("file:///etc/passwd"), None);
        assert_eq!(parse_artifact_uri("telexport://export/../../etc.ndjson"), None);
        assert_eq!(
            parse_artifact_uri("telexport://export/export-XYZ.ndjson"),
            None
        );
        assert_eq!(
            parse_artifact_uri("telexport://export/export-0123456789abcdef"),
            None
        );
        assert_eq!(
            parse_artifact_uri("telexport://export/export-0123456789ABCDEF.ndjson"),
            None
        );
    }
}
