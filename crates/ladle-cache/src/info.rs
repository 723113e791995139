use std::collections::HashMap;

/// Parse a raw Redis INFO payload into key/value pairs.
///
/// Sections are `# Header` comment lines; entries are `key:value`. Blank
/// lines, comments, and malformed lines are skipped.
pub fn parse_info(raw: &str) -> HashMap<String, String> {
    let mut fields = HashMap::new();
    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once(':') {
            fields.insert(key.to_string(), value.trim().to_string());
        }
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# Memory\r
used_memory:1048576\r
used_memory_human:1.00M\r
\r
# Stats\r
keyspace_hits:910\r
keyspace_misses:90\r
# Clients\r
connected_clients:4\r
";

    #[test]
    fn parses_sections_and_skips_comments() {
        let fields = parse_info(SAMPLE);
        assert_eq!(fields.get("used_memory").unwrap(), "1048576");
        assert_eq!(fields.get("used_memory_human").unwrap(), "1.00M");
        assert_eq!(fields.get("keyspace_hits").unwrap(), "910");
        assert_eq!(fields.get("connected_clients").unwrap(), "4");
        assert!(!fields.contains_key("# Memory"));
    }

    #[test]
    fn tolerates_garbage_lines() {
        let fields = parse_info("no-colon-here\n\n:leading\nok:1");
        assert_eq!(fields.get("ok").unwrap(), "1");
        assert_eq!(fields.get("").unwrap(), "leading");
        assert_eq!(fields.len(), 2);
    }
}
