use anyhow::{Result, anyhow};
use isolang::Language;

/// Language utilities for ISO language code handling
///
/// Codes are accepted as ISO 639-1 (2-letter) or ISO 639-3 (3-letter, which
/// covers ISO 639-2/T). The few ISO 639-2/B bibliographic codes that differ
/// from their terminology form are mapped explicitly.
fn bibliographic_to_terminology(code: &str) -> Option<&'static str> {
    match code {
        "fre" => Some("fra"),
        "ger" => Some("deu"),
        "dut" => Some("nld"),
        "gre" => Some("ell"),
        "chi" => Some("zho"),
        "cze" => Some("ces"),
        "ice" => Some("isl"),
        "alb" => Some("sqi"),
        "arm" => Some("hye"),
        "baq" => Some("eus"),
        "bur" => Some("mya"),
        "per" => Some("fas"),
        "geo" => Some("kat"),
        "may" => Some("msa"),
        "mac" => Some("mkd"),
        "rum" => Some("ron"),
        "slo" => Some("slk"),
        "wel" => Some("cym"),
        _ => None,
    }
}

/// Resolve a language code to an isolang `Language`
pub fn resolve_language(code: &str) -> Result<Language> {
    let normalized_code = code.trim().to_lowercase();

    let language = match normalized_code.len() {
        2 => Language::from_639_1(&normalized_code),
        3 => Language::from_639_3(&normalized_code).or_else(|| {
            bibliographic_to_terminology(&normalized_code).and_then(Language::from_639_3)
        }),
        _ => None,
    };

    language.ok_or_else(|| anyhow!("Invalid language code: {}", code))
}

/// Validate if a language code is a valid ISO 639-1 or ISO 639-2 code
pub fn validate_language_code(code: &str) -> Result<()> {
    resolve_language(code).map(|_| ())
}

/// Check if two language codes match (represent the same language)
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    match (resolve_language(code1), resolve_language(code2)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Get the English language name from a code ("nl" -> "Dutch")
pub fn get_language_name(code: &str) -> Result<String> {
    Ok(resolve_language(code)?.to_name().to_string())
}

/// Directory name used for a language under the data directory ("nl" -> "dutch")
///
/// Only the first word of the English name is kept so that names such as
/// "Modern Greek (1453-)" still produce a clean path segment.
pub fn language_dir_name(code: &str) -> Result<String> {
    let name = get_language_name(code)?;
    let first = name
        .split(|c: char| !c.is_alphanumeric())
        .find(|part| !part.is_empty())
        .unwrap_or(&name);
    Ok(first.to_lowercase())
}
