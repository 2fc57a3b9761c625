/*!
 * Tests for ISO language code utilities
 */

use dataset_translator::language_utils::{
    get_language_name, language_codes_match, language_dir_name, validate_language_code,
};

/// Test validation of two- and three-letter codes
#[test]
fn test_validate_language_code_withVariousCodes_shouldAcceptKnownCodes() {
    assert!(validate_language_code("en").is_ok());
    assert!(validate_language_code("NL").is_ok());
    assert!(validate_language_code("nld").is_ok());
    assert!(validate_language_code("dut").is_ok());
    assert!(validate_language_code("xx").is_err());
    assert!(validate_language_code("").is_err());
}

/// Different spellings of the same language match
#[test]
fn test_language_codes_match_withEquivalentCodes_shouldMatch() {
    assert!(language_codes_match("nl", "nld"));
    assert!(language_codes_match("nl", "dut"));
    assert!(language_codes_match("de", "ger"));
    assert!(!language_codes_match("nl", "de"));
    assert!(!language_codes_match("nl", "invalid"));
}

/// Language names feed the prompts and the data directory layout
#[test]
fn test_language_names_withCommonCodes_shouldResolve() {
    assert_eq!(get_language_name("en").unwrap(), "English");
    assert_eq!(get_language_name("nl").unwrap(), "Dutch");
    assert_eq!(language_dir_name("nl").unwrap(), "dutch");
    assert_eq!(language_dir_name("en").unwrap(), "english");
    assert_eq!(language_dir_name("fr").unwrap(), "french");
}
