/// Marker preceding the embedded body string in an archived attributedBody
/// blob. Everything about the surrounding layout is opaque; the scan below is
/// a heuristic over the decoded bytes, not a structural parser.
const MARKER: &str = "NSString";

// The printable run starts with the archiver's type tag and length prefix,
// which decode as two garbage characters ahead of the body text.
const LENGTH_PREFIX_CHARS: usize = 2;

/// Best-effort recovery of the message body embedded in an archived
/// rich-text blob. Returns an empty string whenever the marker or a printable
/// run is missing; truncated or corrupted input never errors.
pub fn extract_text(payload: &[u8]) -> String {
    let decoded = String::from_utf8_lossy(payload);
    let Some(idx) = decoded.find(MARKER) else {
        return String::new();
    };
    let tail = &decoded[idx + MARKER.len()..];
    let run = printable_run(tail).trim();
    run.chars().skip(LENGTH_PREFIX_CHARS).collect()
}

fn printable_run(text: &str) -> &str {
    let printable = |ch: char| matches!(ch, ' '..='~' | '\n' | '\r' | '\t');
    let Some(start) = text.find(printable) else {
        return "";
    };
    let rest = &text[start..];
    let end = rest.find(|ch: char| !printable(ch)).unwrap_or(rest.len());
    &rest[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn archived_body(text: &str) -> Vec<u8> {
        let mut payload = b"\x04\x0bstreamtyped\x81\xe8\x03\x84\x01@\x84\x84\x84\x12NSAttributedString\x00\x84\x84\x08NSObject\x00\x85\x92\x84\x84\x84".to_vec();
        payload.extend_from_slice(b"NSString\x01\x94\x84\x01+");
        payload.push(text.len() as u8);
        payload.extend_from_slice(text.as_bytes());
        payload.extend_from_slice(b"\x86\x84\x02iI\x01");
        payload
    }

    #[test]
    fn extracts_body_from_archived_blob() {
        let payload = archived_body("Hello, world!");
        assert_eq!(extract_text(&payload), "Hello, world!");
    }

    #[test]
    fn missing_marker_yields_empty() {
        assert_eq!(extract_text(b"no marker here"), "");
        assert_eq!(extract_text(&[]), "");
        assert_eq!(extract_text(&[0xff, 0xfe, 0x00, 0x01]), "");
    }

    #[test]
    fn marker_at_end_of_blob_yields_empty() {
        assert_eq!(extract_text(b"prefix NSString"), "");
    }

    #[test]
    fn no_printable_run_yields_empty() {
        let mut payload = b"NSString".to_vec();
        payload.extend_from_slice(&[0x01, 0x94, 0x84, 0x86, 0x00]);
        assert_eq!(extract_text(&payload), "");
    }

    #[test]
    fn non_ascii_body_truncates_the_run() {
        let mut payload = b"NSString\x01\x94\x84\x01+*".to_vec();
        payload.extend_from_slice("caf\u{e9} time".as_bytes());
        // the accented character ends the printable run; the ASCII prefix survives
        assert_eq!(extract_text(&payload), "caf");
    }
}
