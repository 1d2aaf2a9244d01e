//! Land-class colour handling.

/// Normalise a colour to lowercase `#rrggbb`.
///
/// Accepts `#rrggbb`, `rrggbb`, `#rgb` and `rgb` in any case.
pub fn normalize_color(input: &str) -> Result<String, String> {
    let hex = input.trim();
    let hex = hex.strip_prefix('#').unwrap_or(hex);

    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(format!("Invalid color '{input}': expected a hex value like #a51d2d"));
    }

    let hex = hex.to_ascii_lowercase();
    match hex.len() {
        6 => Ok(format!("#{hex}")),
        3 => Ok(hex.chars().fold(String::from("#"), |mut acc, c| {
            acc.push(c);
            acc.push(c);
            acc
        })),
        _ => Err(format!("Invalid color '{input}': expected 3 or 6 hex digits")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalizes_long_form() {
        assert_eq!(normalize_color("#A51D2D").unwrap(), "#a51d2d");
        assert_eq!(normalize_color("a51d2d").unwrap(), "#a51d2d");
        assert_eq!(normalize_color("  #00ff00 ").unwrap(), "#00ff00");
    }

    #[test]
    fn test_expands_short_form() {
        assert_eq!(normalize_color("#F0a").unwrap(), "#ff00aa");
        assert_eq!(normalize_color("abc").unwrap(), "#aabbcc");
    }

    #[test]
    fn test_rejects_invalid() {
        assert!(normalize_color("").is_err());
        assert!(normalize_color("#12345").is_err());
        assert!(normalize_color("#gggggg").is_err());
        assert!(normalize_color("red").is_err());
    }
}
