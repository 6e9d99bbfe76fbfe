// src/utils.rs
use anyhow::Result;
use regex::Regex;
use std::sync::OnceLock;

fn slug_regex() -> &'static Regex {
    static SLUG: OnceLock<Regex> = OnceLock::new();
    SLUG.get_or_init(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("valid slug regex"))
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]{2,}$").expect("valid email regex")
    })
}

/// Turn a title or a person name into a URL slug
pub fn slugify(input: &str) -> String {
    let mapped: String = input
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'å' | 'ä' | 'à' | 'á' | 'â' => 'a',
            'ö' | 'ø' | 'ó' | 'ò' | 'ô' => 'o',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'ü' | 'ú' | 'ù' => 'u',
            'í' | 'ì' | 'ï' => 'i',
            c if c.is_ascii_alphanumeric() => c,
            _ => '-',
        })
        .collect();

    mapped
        .split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Case-insensitive key in Swedish alphabetical order: å, ä and ö come after z
pub fn name_sort_key(name: &str) -> Vec<u32> {
    const AFTER_Z: u32 = 'z' as u32;
    name.trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'å' => AFTER_Z + 1,
            'ä' | 'æ' => AFTER_Z + 2,
            'ö' | 'ø' => AFTER_Z + 3,
            'à' | 'á' | 'â' => 'a' as u32,
            'é' | 'è' | 'ê' | 'ë' => 'e' as u32,
            'ü' => 'y' as u32,
            c => c as u32,
        })
        .collect()
}

pub fn is_valid_slug(slug: &str) -> bool {
    slug_regex().is_match(slug)
}

pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_match(email.trim())
}

/// Cut a string at a char boundary, appending an ellipsis when shortened
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}…", cut.trim_end())
}

/// Get file extension in lowercase
pub fn get_file_extension(filename: &str) -> Option<String> {
    std::path::Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

/// Validate file extension against allowed types
pub fn validate_file_extension(filename: &str, allowed: &[&str]) -> Result<String> {
    let ext = get_file_extension(filename)
        .ok_or_else(|| anyhow::anyhow!("File has no extension: {}", filename))?;

    if !allowed.contains(&ext.as_str()) {
        anyhow::bail!(
            "Unsupported file extension: {}. Allowed: {:?}",
            ext,
            allowed
        );
    }

    Ok(ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Anna Öberg"), "anna-oberg");
        assert_eq!(slugify("  Nytt uppdrag på Länsförsäkringar! "), "nytt-uppdrag-pa-lansforsakringar");
        assert_eq!(slugify("Rust & Go -- 2024"), "rust-go-2024");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_name_sort_key() {
        let mut names = vec!["Örjan", "anna", "Åsa", "Zelda", "Ärla", "Bo", "Éva"];
        names.sort_by_key(|n| name_sort_key(n));
        assert_eq!(names, vec!["anna", "Bo", "Éva", "Zelda", "Åsa", "Ärla", "Örjan"]);
    }

    #[test]
    fn test_is_valid_slug() {
        assert!(is_valid_slug("case-study-2024"));
        assert!(!is_valid_slug("Case"));
        assert!(!is_valid_slug("double--dash"));
        assert!(!is_valid_slug("-leading"));
        assert!(!is_valid_slug(""));
    }

    #[test]
    fn test_is_valid_email() {
        assert!(is_valid_email("anna@example.se"));
        assert!(is_valid_email(" erik.lind@consult.io "));
        assert!(!is_valid_email("anna@"));
        assert!(!is_valid_email("no at sign"));
        assert!(!is_valid_email("a@b.c"));
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("kort", 10), "kort");
        assert_eq!(truncate_chars("åäö åäö åäö", 7), "åäö åäö…");
    }

    #[test]
    fn test_get_file_extension() {
        assert_eq!(get_file_extension("cover.PNG"), Some("png".to_string()));
        assert_eq!(get_file_extension("noext"), None);
    }

    #[test]
    fn test_validate_file_extension() {
        assert_eq!(
            validate_file_extension("photo.jpg", &["jpg", "png"]).unwrap(),
            "jpg"
        );
        assert!(validate_file_extension("script.sh", &["jpg", "png"]).is_err());
        assert!(validate_file_extension("noext", &["jpg"]).is_err());
    }
}
