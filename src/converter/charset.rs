// WHY: single home for the Myanmar codepoint ranges shared by the detector, the rule engine and the scanner prefilter

/// First codepoint of the legacy block Zawgyi fonts assign their private glyph variants to
pub const LEGACY_START: char = '\u{1060}';
/// Last codepoint of the legacy block
pub const LEGACY_END: char = '\u{1097}';

/// Kinzi cluster in canonical storage order (nga, asat, virama)
pub const KINZI: [char; 3] = ['\u{1004}', '\u{103A}', '\u{1039}'];

/// Any codepoint of the Myanmar block
pub fn is_myanmar(c: char) -> bool {
    ('\u{1000}'..='\u{109F}').contains(&c)
}

/// Myanmar block plus Myanmar Extended-A, used to skip obviously irrelevant text cheaply
pub fn is_candidate(c: char) -> bool {
    is_myanmar(c) || ('\u{AA60}'..='\u{AA7F}').contains(&c)
}

pub fn is_legacy(c: char) -> bool {
    (LEGACY_START..=LEGACY_END).contains(&c)
}

pub fn is_consonant(c: char) -> bool {
    ('\u{1000}'..='\u{1021}').contains(&c)
}

/// Ya-pin, ya-yit, wa-hswe, ha-htoe in canonical order
pub fn is_medial(c: char) -> bool {
    ('\u{103B}'..='\u{103E}').contains(&c)
}

/// Dependent vowel signs including the pre-written e-vowel
pub fn is_vowel_sign(c: char) -> bool {
    ('\u{102B}'..='\u{1032}').contains(&c)
}

/// Marks written above the base: i, ii, ai
pub fn is_upper_vowel(c: char) -> bool {
    matches!(c, '\u{102D}' | '\u{102E}' | '\u{1032}')
}

/// Marks written below the base: u, uu
pub fn is_lower_vowel(c: char) -> bool {
    matches!(c, '\u{102F}' | '\u{1030}')
}

/// Anusvara, dot below, visarga, asat
pub fn is_diacritic(c: char) -> bool {
    matches!(c, '\u{1036}' | '\u{1037}' | '\u{1038}' | '\u{103A}')
}

/// Characters a canonical dependent sign may directly follow
pub fn is_base(c: char) -> bool {
    ('\u{1000}'..='\u{102A}').contains(&c)
        || is_medial(c)
        || matches!(c, '\u{103F}' | '\u{104E}' | '\u{25CC}')
        || ('\u{1050}'..='\u{1055}').contains(&c)
}

/// Signs that can trail a consonant inside one syllable before a kinzi mark in Zawgyi order
pub fn is_attached(c: char) -> bool {
    is_medial(c) || is_vowel_sign(c) || matches!(c, '\u{1036}' | '\u{1037}' | '\u{1038}')
}

pub fn contains_myanmar(text: &str) -> bool {
    text.chars().any(is_myanmar)
}

pub fn contains_candidate(text: &str) -> bool {
    text.chars().any(is_candidate)
}

pub fn contains_legacy(text: &str) -> bool {
    text.chars().any(is_legacy)
}
