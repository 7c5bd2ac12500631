//! Locale format predicate for the `language` field.

/// Accepts `all`, `auto`, a 2–3 letter language code, optionally followed by
/// `-` and a 2 letter or 3 digit region (`en`, `fil`, `pt-BR`, `es-419`).
pub fn is_valid_locale(value: &str) -> bool {
    if value == "all" || value == "auto" {
        return true;
    }

    let (language, region) = match value.split_once('-') {
        Some((language, region)) => (language, Some(region)),
        None => (value, None),
    };

    let language_ok = (2..=3).contains(&language.len())
        && language.bytes().all(|b| b.is_ascii_alphabetic());
    let region_ok = match region {
        None => true,
        Some(r) => {
            (r.len() == 2 && r.bytes().all(|b| b.is_ascii_alphabetic()))
                || (r.len() == 3 && r.bytes().all(|b| b.is_ascii_digit()))
        }
    };

    language_ok && region_ok
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_known_shapes() {
        for locale in ["all", "auto", "en", "fil", "en-US", "pt-br", "es-419"] {
            assert!(is_valid_locale(locale), "{locale} should be accepted");
        }
    }

    #[test]
    fn test_rejects_garbage() {
        for locale in ["", "e", "english", "en-", "en-USA", "en_US", "12", "en-US-x"] {
            assert!(!is_valid_locale(locale), "{locale} should be rejected");
        }
    }
}
