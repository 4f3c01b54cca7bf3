// WHY: Zawgyi to Unicode rewrite in three ordered passes: exact overrides, legacy block remap, structural rules
// Callers only hand in fragments the detector flagged; the function itself stays pure and never fails.

use std::sync::OnceLock;

use super::charset::{self, KINZI, LEGACY_START};
use super::rules::RuleSet;

/// Whole-fragment sequences whose canonical form the general passes would get wrong
pub const EXACT_OVERRIDES: &[(&str, &str)] = &[
    ("\u{106A}", " \u{1009}"),
    ("\u{1064}", "\u{1004}\u{103A}\u{1039}"),
    ("\u{103D}\u{1087}", "\u{103E}\u{103E}"),
];

/// Canonical expansion for every codepoint in U+1060..=U+1097, indexed from U+1060
const LEGACY_MAP: [&str; 56] = [
    "\u{1039}\u{1000}",                 // 1060
    "\u{1039}\u{1001}",                 // 1061
    "\u{1039}\u{1002}",                 // 1062
    "\u{1039}\u{1003}",                 // 1063
    "\u{1004}\u{103A}\u{1039}",         // 1064 kinzi
    "\u{1039}\u{1005}",                 // 1065
    "\u{1039}\u{1006}",                 // 1066
    "\u{1039}\u{1006}",                 // 1067
    "\u{1039}\u{1007}",                 // 1068
    "\u{1039}\u{1008}",                 // 1069
    "\u{1009}",                         // 106A
    "\u{100A}",                         // 106B
    "\u{1039}\u{100B}",                 // 106C
    "\u{1039}\u{100C}",                 // 106D
    "\u{100D}\u{1039}\u{100D}",         // 106E
    "\u{100D}\u{1039}\u{100E}",         // 106F
    "\u{1039}\u{100F}",                 // 1070
    "\u{1039}\u{1010}",                 // 1071
    "\u{1039}\u{1010}",                 // 1072
    "\u{1039}\u{1011}",                 // 1073
    "\u{1039}\u{1011}",                 // 1074
    "\u{1039}\u{1012}",                 // 1075
    "\u{1039}\u{1013}",                 // 1076
    "\u{1039}\u{1014}",                 // 1077
    "\u{1039}\u{1015}",                 // 1078
    "\u{1039}\u{1016}",                 // 1079
    "\u{1039}\u{1017}",                 // 107A
    "\u{1039}\u{1018}",                 // 107B
    "\u{1039}\u{1019}",                 // 107C
    "\u{103B}",                         // 107D
    "\u{103C}",                         // 107E
    "\u{103C}",                         // 107F
    "\u{103C}",                         // 1080
    "\u{103C}",                         // 1081
    "\u{103C}",                         // 1082
    "\u{103C}",                         // 1083
    "\u{103C}",                         // 1084
    "\u{1039}\u{101C}",                 // 1085
    "\u{103F}",                         // 1086
    "\u{103E}",                         // 1087
    "\u{103E}\u{102F}",                 // 1088
    "\u{103E}\u{1030}",                 // 1089
    "\u{103D}\u{103E}",                 // 108A
    "\u{1004}\u{103A}\u{1039}\u{102D}", // 108B
    "\u{1004}\u{103A}\u{1039}\u{102E}", // 108C
    "\u{1004}\u{103A}\u{1039}\u{1036}", // 108D
    "\u{102D}\u{1036}",                 // 108E
    "\u{1014}",                         // 108F
    "\u{101B}",                         // 1090
    "\u{100F}\u{1039}\u{100D}",         // 1091
    "\u{100B}\u{1039}\u{100C}",         // 1092
    "\u{1039}\u{1018}",                 // 1093
    "\u{1037}",                         // 1094
    "\u{1037}",                         // 1095
    "\u{1039}\u{1010}\u{103D}",         // 1096
    "\u{100B}\u{1039}\u{100B}",         // 1097
];

/// Pass 1: whole-fragment lookup
pub fn exact_override(text: &str) -> Option<&'static str> {
    EXACT_OVERRIDES
        .iter()
        .find(|(legacy, _)| *legacy == text)
        .map(|(_, canonical)| *canonical)
}

/// Canonical expansion of a single legacy codepoint
pub fn legacy_expansion(c: char) -> Option<&'static str> {
    if !charset::is_legacy(c) {
        return None;
    }
    LEGACY_MAP.get(c as usize - LEGACY_START as usize).copied()
}

/// Legacy glyphs that carry a kinzi, with the mark they stack on top of it
fn kinzi_glyph(c: char) -> Option<Option<char>> {
    match c {
        '\u{1064}' => Some(None),
        '\u{108B}' => Some(Some('\u{102D}')),
        '\u{108C}' => Some(Some('\u{102E}')),
        '\u{108D}' => Some(Some('\u{1036}')),
        _ => None,
    }
}

/// Where a kinzi written after its syllable belongs: before the syllable's consonant,
/// including any e-vowel or ya-yit Zawgyi stores ahead of it. End of output when there is no consonant.
fn kinzi_insertion_point(output: &[char]) -> usize {
    let mut i = output.len();
    while i > 0 && charset::is_attached(output[i - 1]) {
        i -= 1;
    }
    while i >= 2 && output[i - 2] == '\u{1039}' && charset::is_consonant(output[i - 1]) {
        i -= 2;
    }
    if i == 0 || !charset::is_consonant(output[i - 1]) {
        return output.len();
    }
    i -= 1;
    while i > 0 && matches!(output[i - 1], '\u{1031}' | '\u{103C}') {
        i -= 1;
    }
    i
}

/// Pass 2: positional remap of the legacy block, everything else passes through.
/// Kinzi glyphs are also moved ahead of the syllable they follow, since after expansion
/// that order can no longer be told apart from canonical kinzi.
pub fn remap_legacy(text: &str) -> Vec<char> {
    let mut output = Vec::with_capacity(text.len());
    for c in text.chars() {
        if let Some(mark) = kinzi_glyph(c) {
            let at = kinzi_insertion_point(&output);
            output.splice(at..at, KINZI);
            output.extend(mark);
            continue;
        }
        match legacy_expansion(c) {
            Some(expansion) => output.extend(expansion.chars()),
            None => output.push(c),
        }
    }
    output
}

#[derive(Debug, Clone, Default)]
pub struct Transliterator {
    rules: RuleSet,
}

impl Transliterator {
    pub fn new(rules: RuleSet) -> Self {
        Self { rules }
    }

    pub fn convert(&self, text: &str) -> String {
        if let Some(canonical) = exact_override(text) {
            return canonical.to_string();
        }
        if !charset::contains_myanmar(text) {
            return text.to_string();
        }
        self.rules.apply(remap_legacy(text)).into_iter().collect()
    }
}

/// Convert with the default rule table
pub fn convert(text: &str) -> String {
    static DEFAULT: OnceLock<Transliterator> = OnceLock::new();
    DEFAULT.get_or_init(Transliterator::default).convert(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_map_covers_block() {
        for code in 0x1060u32..=0x1097 {
            let c = char::from_u32(code).unwrap();
            let expansion = legacy_expansion(c).expect("every legacy codepoint has an expansion");
            assert!(!charset::contains_legacy(expansion), "{code:X} expands into the legacy block");
        }
        assert_eq!(legacy_expansion('\u{1000}'), None);
        assert_eq!(legacy_expansion('\u{1098}'), None);
    }

    #[test]
    fn test_overrides_short_circuit() {
        assert_eq!(convert("\u{106A}"), " \u{1009}");
        assert_eq!(convert("\u{1064}"), "\u{1004}\u{103A}\u{1039}");
        assert_eq!(convert("\u{103D}\u{1087}"), "\u{103E}\u{103E}");
    }

    #[test]
    fn test_override_applies_to_whole_fragment_only() {
        // inside a longer fragment U+106A goes through the plain remap
        assert_eq!(convert("\u{106A}\u{102C}"), "\u{1009}\u{102C}");
    }

    #[test]
    fn test_single_codepoint_remap() {
        assert_eq!(convert("\u{1090}"), "\u{101B}");
        assert_eq!(convert("\u{106B}"), "\u{100A}");
        assert_eq!(convert("\u{108E}"), "\u{102D}\u{1036}");
    }

    #[test]
    fn test_kinzi_repositioning() {
        let expected = "\u{1004}\u{103A}\u{1039}\u{1000}\u{1031}";
        assert_eq!(convert("\u{1031}\u{1000}\u{1064}"), expected);
        assert_eq!(convert("\u{1064}\u{1031}\u{1000}"), expected);
    }

    #[test]
    fn test_kinzi_glyph_moves_before_its_syllable() {
        // mingalaba: the kinzi belongs to the second consonant, not the one after it
        assert_eq!(
            convert("\u{1019}\u{1002}\u{1064}\u{101C}\u{102C}\u{1015}\u{102B}"),
            "\u{1019}\u{1004}\u{103A}\u{1039}\u{1002}\u{101C}\u{102C}\u{1015}\u{102B}"
        );
        assert_eq!(
            convert("\u{1000}\u{108B}"),
            "\u{1004}\u{103A}\u{1039}\u{1000}\u{102D}"
        );
        assert_eq!(
            convert("\u{107E}\u{1000}\u{1064}"),
            "\u{1004}\u{103A}\u{1039}\u{1000}\u{103C}"
        );
    }

    #[test]
    fn test_stacked_consonant_keeps_e_vowel_last() {
        assert_eq!(
            convert("\u{1031}\u{1000}\u{1060}"),
            "\u{1000}\u{1039}\u{1000}\u{1031}"
        );
    }

    #[test]
    fn test_non_myanmar_passthrough() {
        assert_eq!(convert("Hello"), "Hello");
        assert_eq!(convert(""), "");
    }
}
