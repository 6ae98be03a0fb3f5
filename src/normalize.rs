//! Filename normalization.
//!
//! Transliterates Cyrillic letters to Latin and replaces every character that is
//! not a word character, a dot or an apostrophe with an underscore.
//!
//! # Examples
//!
//! ```
//! use sortdir::normalize::normalize;
//!
//! assert_eq!(normalize("Папка 1"), "Papka_1");
//! assert_eq!(normalize("отчёт (final).docx"), "otchet__final_.docx");
//! ```
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Source letters, parallel-indexed with [`TRANSLATION`].
const CYRILLIC_SYMBOLS: [char; 37] = [
    'а', 'б', 'в', 'г', 'д', 'е', 'ё', 'ж', 'з', 'и', 'й', 'к', 'л', 'м', 'н', 'о', 'п', 'р', 'с',
    'т', 'у', 'ф', 'х', 'ц', 'ч', 'ш', 'щ', 'ъ', 'ы', 'ь', 'э', 'ю', 'я', 'є', 'і', 'ї', 'ґ',
];

const TRANSLATION: [&str; 37] = [
    "a", "b", "v", "g", "d", "e", "e", "j", "z", "i", "j", "k", "l", "m", "n", "o", "p", "r", "s",
    "t", "u", "f", "h", "ts", "ch", "sh", "sch", "", "y", "", "e", "yu", "ja", "je", "i", "ji", "g",
];

static DEFAULT_NORMALIZER: LazyLock<Normalizer> = LazyLock::new(Normalizer::new);

/// Maps arbitrary names to a filesystem-safe, Latin-only form.
///
/// The result only contains word characters, dots and apostrophes, so applying
/// the normalizer twice gives the same result as applying it once.
#[derive(Debug, Clone)]
pub struct Normalizer {
    table: HashMap<char, String>,
    forbidden: Regex,
}

impl Normalizer {
    /// Creates a normalizer with the built-in Cyrillic table.
    pub fn new() -> Self {
        let mut table = HashMap::with_capacity(CYRILLIC_SYMBOLS.len() * 2);
        for (letter, latin) in CYRILLIC_SYMBOLS.iter().zip(TRANSLATION) {
            table.insert(*letter, latin.to_string());
            for upper in letter.to_uppercase() {
                table.insert(upper, latin.to_uppercase());
            }
        }

        Self {
            table,
            forbidden: Regex::new(r"[^\w.']").expect("Invalid forbidden-character pattern"),
        }
    }

    /// Normalizes a single file or directory name.
    pub fn normalize(&self, name: &str) -> String {
        let mut transliterated = String::with_capacity(name.len());
        for c in name.chars() {
            match self.table.get(&c) {
                Some(latin) => transliterated.push_str(latin),
                None => transliterated.push(c),
            }
        }

        self.forbidden
            .replace_all(&transliterated, "_")
            .into_owned()
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalizes `name` with the shared default [`Normalizer`].
pub fn normalize(name: &str) -> String {
    DEFAULT_NORMALIZER.normalize(name)
}
