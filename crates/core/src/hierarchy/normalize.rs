//! Name normalization for hierarchy matching.

/// Normalizes an entity name into a lookup key.
///
/// Lower-cases the input and collapses runs of whitespace, underscores, and
/// hyphens into single spaces, so that `"Offshore_Client_3"` and
/// `"Offshore Client 3"` produce the same key. Case is preserved for storage
/// elsewhere; only matching uses this form.
#[must_use]
pub fn normalize_key(name: &str) -> String {
    let mut key = String::with_capacity(name.len());
    let mut pending_space = false;

    for ch in name.trim().chars() {
        if ch.is_whitespace() || ch == '_' || ch == '-' {
            pending_space = !key.is_empty();
        } else {
            if pending_space {
                key.push(' ');
                pending_space = false;
            }
            key.extend(ch.to_lowercase());
        }
    }

    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_separator_runs() {
        assert_eq!(normalize_key("Offshore_Client_3"), "offshore client 3");
        assert_eq!(normalize_key("Offshore  Client - 3"), "offshore client 3");
        assert_eq!(normalize_key("  Offshore Client 3  "), "offshore client 3");
    }

    #[test]
    fn test_lowercases() {
        assert_eq!(normalize_key("SiteA"), "sitea");
        assert_eq!(normalize_key("QUALITY CONTROL"), "quality control");
    }

    #[test]
    fn test_empty_and_separator_only() {
        assert_eq!(normalize_key(""), "");
        assert_eq!(normalize_key("___"), "");
        assert_eq!(normalize_key(" - "), "");
    }
}
