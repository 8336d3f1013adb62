/// Guesses the source language of a piece of text.
pub trait LanguageDetector: Send + Sync {
    /// Returns a two-letter language code.
    fn detect(&self, text: &str) -> String;
}

/// Script-range heuristic for the Indic languages the site serves.
///
/// Ranges are tested in a fixed order, so mixed-script text resolves to the
/// first script that appears in this table. Anything else is English.
#[derive(Debug, Clone, Copy, Default)]
pub struct DetectByUnicodeRange;

const SCRIPT_RANGES: &[(char, char, &str)] = &[
    ('\u{0D00}', '\u{0D7F}', "ml"),
    ('\u{0B80}', '\u{0BFF}', "ta"),
    ('\u{0900}', '\u{097F}', "hi"),
    ('\u{0980}', '\u{09FF}', "bn"),
    ('\u{0A80}', '\u{0AFF}', "pa"),
];

const DEFAULT_LANG: &str = "en";

impl LanguageDetector for DetectByUnicodeRange {
    fn detect(&self, text: &str) -> String {
        SCRIPT_RANGES
            .iter()
            .find(|(start, end, _)| text.chars().any(|c| (*start..=*end).contains(&c)))
            .map_or(DEFAULT_LANG, |&(_, _, code)| code)
            .to_string()
    }
}
