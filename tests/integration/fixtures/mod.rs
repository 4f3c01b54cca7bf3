// Known Zawgyi and Unicode Myanmar samples with expected conversions
// WHY: deterministic inputs for scenario and property tests

#![allow(dead_code)]

/// Zawgyi samples; each carries at least one unambiguous Zawgyi signal
pub const ZAWGYI_CORPUS: &[&str] = &[
    // legacy consonant modifier alone
    "\u{106A}",
    // kinzi glyph
    "\u{1064}",
    // short ra
    "\u{1090}",
    // mingalaba with kinzi written after its base
    "\u{1019}\u{1002}\u{1064}\u{101C}\u{102C}\u{1015}\u{102B}",
    // myanma with the ya-yit glyph variant written first
    "\u{107E}\u{1019}\u{1014}\u{1039}\u{1019}\u{102C}",
    // e-vowel stored before its consonant
    "\u{1031}\u{1019}\u{1037}\u{1031}\u{101C}\u{102C}",
    "\u{1031}\u{1000}\u{1064}",
    "\u{1064}\u{1031}\u{1000}",
    // dot below before anusvara
    "\u{1037}\u{1036}",
    // wa-hswe with the ha-htoe glyph
    "\u{103D}\u{1087}",
    // stacked consonant glyphs
    "\u{1031}\u{1000}\u{1060}",
    "\u{1000}\u{1079}\u{102C}",
    // medial and vowel ligature glyphs
    "\u{1019}\u{1088}",
    "\u{1014}\u{108A}",
    "\u{1000}\u{108E}",
    // mixed with Latin text
    "Title: \u{1031}\u{1000}\u{102C}\u{1004}\u{1039}\u{1038} 2024",
];

/// Canonically ordered Unicode Myanmar; must be neither flagged nor changed
pub const UNICODE_CORPUS: &[&str] = &[
    "\u{1019}\u{1004}\u{103A}\u{1039}\u{1002}\u{101C}\u{102C}\u{1015}\u{102B}",
    "\u{1019}\u{103C}\u{1014}\u{103A}\u{1019}\u{102C}",
    "\u{1015}\u{103C}\u{100A}\u{103A}\u{1011}\u{1031}\u{102C}\u{1004}\u{103A}\u{1005}\u{102F}",
    "\u{1000}\u{103B}\u{1031}\u{102C}\u{1004}\u{103A}\u{1038}",
    "\u{1021}\u{1019}\u{103E}\u{1010}\u{103A}",
    "\u{101E}\u{102D}\u{102F}\u{1037}",
    "\u{1015}\u{102F}\u{1036}\u{1037}",
    "\u{101E}\u{1004}\u{103A}\u{1039}\u{1018}\u{1031}\u{102C}",
    "\u{1041}\u{1049}\u{1047}\u{1040}",
    "2024 \u{1001}\u{102F}\u{1014}\u{103E}\u{1005}\u{103A}",
];

/// Exact conversions the override, remap and ordering passes must produce
pub const EXPECTED_CONVERSIONS: &[(&str, &str)] = &[
    ("\u{106A}", " \u{1009}"),
    ("\u{1064}", "\u{1004}\u{103A}\u{1039}"),
    ("\u{1090}", "\u{101B}"),
    ("\u{103D}\u{1087}", "\u{103E}\u{103E}"),
    ("\u{1037}\u{1036}", "\u{1036}\u{1037}"),
    ("\u{1031}\u{1000}\u{1064}", "\u{1004}\u{103A}\u{1039}\u{1000}\u{1031}"),
    ("\u{1064}\u{1031}\u{1000}", "\u{1004}\u{103A}\u{1039}\u{1000}\u{1031}"),
    ("\u{1036}\u{102F}", "\u{102F}\u{1036}"),
    ("\u{102D}\u{102D}", "\u{102D}"),
    ("\u{102F}\u{102D}", "\u{102D}\u{102F}"),
    ("\u{102D}\u{102E}", "\u{102E}"),
    ("\u{1036}\u{1036}", "\u{1036}\u{1036}"),
    (
        "\u{1019}\u{1002}\u{1064}\u{101C}\u{102C}\u{1015}\u{102B}",
        "\u{1019}\u{1004}\u{103A}\u{1039}\u{1002}\u{101C}\u{102C}\u{1015}\u{102B}",
    ),
];

/// Sample page: one line per paragraph, Zawgyi and Unicode interleaved
pub const MIXED_PAGE: &str = "\u{1031}\u{1019}\u{1037}\u{1031}\u{101C}\u{102C}
Plain English line
\u{1019}\u{103C}\u{1014}\u{103A}\u{1019}\u{102C}
\u{1064}
";
