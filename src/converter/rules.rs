// WHY: ordered, context-sensitive rewrite rules for the structural normalization pass
// Every rule matches only sequences that never occur in canonically ordered Unicode Myanmar,
// so running the rule set over canonical text is a no-op.

use std::ops::Range;
use tracing::debug;

use super::charset;

const VIRAMA: char = '\u{1039}';

/// Upper bound on fixpoint rounds; each rule moves marks toward canonical order so this is rarely reached
const MAX_ROUNDS: usize = 4;

/// Character classes a rule can match or test its context against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    Is(char),
    Range(char, char),
    Consonant,
    Medial,
    VowelSign,
    UpperVowel,
    LowerVowel,
    Diacritic,
    /// Characters a canonical dependent sign may directly follow
    Base,
    /// Medials, vowel signs and tone marks trailing a consonant
    Attached,
    /// Anything that cannot follow a digit in canonical text
    DependentSign,
}

impl CharClass {
    pub fn contains(self, c: char) -> bool {
        match self {
            CharClass::Is(expected) => c == expected,
            CharClass::Range(lo, hi) => (lo..=hi).contains(&c),
            CharClass::Consonant => charset::is_consonant(c),
            CharClass::Medial => charset::is_medial(c),
            CharClass::VowelSign => charset::is_vowel_sign(c),
            CharClass::UpperVowel => charset::is_upper_vowel(c),
            CharClass::LowerVowel => charset::is_lower_vowel(c),
            CharClass::Diacritic => charset::is_diacritic(c),
            CharClass::Base => charset::is_base(c),
            CharClass::Attached => charset::is_attached(c),
            CharClass::DependentSign => {
                charset::is_vowel_sign(c) || charset::is_medial(c) || c == '\u{1036}'
            }
        }
    }
}

/// One element of a rule pattern; each element captures the span it consumed as a group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Matcher {
    Lit(char),
    One(CharClass),
    /// Zero or more, greedy, no backtracking
    Star(CharClass),
    /// Zero or more virama + consonant pairs
    Stacks,
}

/// Neighbour predicate; `None` stands for the start or end of the fragment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Context {
    Class(CharClass),
    NotClass(CharClass),
}

impl Context {
    fn admits(self, neighbour: Option<char>) -> bool {
        match self {
            Context::Class(class) => neighbour.is_some_and(|c| class.contains(c)),
            Context::NotClass(class) => !neighbour.is_some_and(|c| class.contains(c)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emit {
    Lit(char),
    Group(usize),
}

/// An ordered transliteration step
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    /// Lower runs first
    pub priority: u16,
    pub pattern: &'static [Matcher],
    /// Checked against already rewritten output, so earlier rewrites in the same sweep are visible
    pub preceded_by: Option<Context>,
    pub followed_by: Option<Context>,
    pub replacement: &'static [Emit],
}

impl Rule {
    fn match_at(&self, input: &[char], start: usize, emitted: &[char]) -> Option<(Vec<Range<usize>>, usize)> {
        if let Some(context) = self.preceded_by {
            if !context.admits(emitted.last().copied()) {
                return None;
            }
        }

        let mut pos = start;
        let mut groups = Vec::with_capacity(self.pattern.len());
        for matcher in self.pattern {
            let begin = pos;
            match *matcher {
                Matcher::Lit(expected) => {
                    if input.get(pos) != Some(&expected) {
                        return None;
                    }
                    pos += 1;
                }
                Matcher::One(class) => match input.get(pos) {
                    Some(&c) if class.contains(c) => pos += 1,
                    _ => return None,
                },
                Matcher::Star(class) => {
                    while input.get(pos).is_some_and(|&c| class.contains(c)) {
                        pos += 1;
                    }
                }
                Matcher::Stacks => {
                    while input.get(pos) == Some(&VIRAMA)
                        && input.get(pos + 1).is_some_and(|&c| charset::is_consonant(c))
                    {
                        pos += 2;
                    }
                }
            }
            groups.push(begin..pos);
        }

        if pos == start {
            return None;
        }

        if let Some(context) = self.followed_by {
            if !context.admits(input.get(pos).copied()) {
                return None;
            }
        }

        Some((groups, pos))
    }

    /// Rewrite every non-overlapping match in one left-to-right sweep
    fn apply(&self, input: &[char]) -> Option<Vec<char>> {
        let mut output = Vec::with_capacity(input.len() + 4);
        let mut changed = false;
        let mut pos = 0;

        while pos < input.len() {
            match self.match_at(input, pos, &output) {
                Some((groups, end)) => {
                    let before = output.len();
                    for emit in self.replacement {
                        match *emit {
                            Emit::Lit(c) => output.push(c),
                            Emit::Group(index) => {
                                if let Some(range) = groups.get(index) {
                                    output.extend_from_slice(&input[range.clone()]);
                                }
                            }
                        }
                    }
                    changed |= output[before..] != input[pos..end];
                    pos = end;
                }
                None => {
                    output.push(input[pos]);
                    pos += 1;
                }
            }
        }

        changed.then_some(output)
    }
}

/// Rules sorted by priority, applied in sequence until nothing changes
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(mut rules: Vec<Rule>) -> Self {
        rules.sort_by_key(|rule| rule.priority);
        Self { rules }
    }

    pub fn structural() -> Self {
        Self::new(STRUCTURAL_RULES.to_vec())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn apply(&self, mut text: Vec<char>) -> Vec<char> {
        for round in 0..MAX_ROUNDS {
            let mut changed = false;
            for rule in &self.rules {
                if let Some(rewritten) = rule.apply(&text) {
                    text = rewritten;
                    changed = true;
                }
            }
            if !changed {
                break;
            }
            if round + 1 == MAX_ROUNDS {
                debug!("Structural rules still rewriting after {} rounds", MAX_ROUNDS);
            }
        }
        text
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::structural()
    }
}

const SWAP: &[Emit] = &[Emit::Group(1), Emit::Group(0)];

/// Structural normalization table.
/// Duplicate anusvara (U+1036) and ha-htoe (U+103E) are intentionally kept; other duplicated marks collapse.
pub static STRUCTURAL_RULES: &[Rule] = &[
    Rule {
        name: "zero-as-wa",
        priority: 10,
        pattern: &[Matcher::Lit('\u{1040}')],
        preceded_by: None,
        followed_by: Some(Context::Class(CharClass::DependentSign)),
        replacement: &[Emit::Lit('\u{101D}')],
    },
    Rule {
        name: "seven-as-ra",
        priority: 10,
        pattern: &[Matcher::Lit('\u{1047}')],
        preceded_by: None,
        followed_by: Some(Context::Class(CharClass::DependentSign)),
        replacement: &[Emit::Lit('\u{101B}')],
    },
    Rule {
        name: "ya-yit-after-consonant",
        priority: 20,
        pattern: &[
            Matcher::Lit('\u{103C}'),
            Matcher::One(CharClass::Consonant),
            Matcher::Stacks,
        ],
        preceded_by: Some(Context::NotClass(CharClass::Base)),
        followed_by: None,
        replacement: &[Emit::Group(1), Emit::Group(2), Emit::Group(0)],
    },
    Rule {
        name: "e-vowel-after-cluster",
        priority: 30,
        pattern: &[
            Matcher::Lit('\u{1031}'),
            Matcher::One(CharClass::Consonant),
            Matcher::Stacks,
            Matcher::Star(CharClass::Medial),
        ],
        preceded_by: Some(Context::NotClass(CharClass::Base)),
        followed_by: None,
        replacement: &[Emit::Group(1), Emit::Group(2), Emit::Group(3), Emit::Group(0)],
    },
    Rule {
        name: "kinzi-before-base",
        priority: 40,
        pattern: &[
            Matcher::One(CharClass::Consonant),
            Matcher::Stacks,
            Matcher::Star(CharClass::Attached),
            Matcher::Lit('\u{1004}'),
            Matcher::Lit('\u{103A}'),
            Matcher::Lit('\u{1039}'),
        ],
        preceded_by: None,
        followed_by: Some(Context::NotClass(CharClass::Consonant)),
        replacement: &[
            Emit::Group(3),
            Emit::Group(4),
            Emit::Group(5),
            Emit::Group(0),
            Emit::Group(1),
            Emit::Group(2),
        ],
    },
    Rule {
        name: "medial-before-upper-vowel",
        priority: 50,
        pattern: &[Matcher::One(CharClass::UpperVowel), Matcher::One(CharClass::Medial)],
        preceded_by: None,
        followed_by: None,
        replacement: SWAP,
    },
    Rule {
        name: "medial-before-anusvara",
        priority: 50,
        pattern: &[Matcher::Lit('\u{1036}'), Matcher::One(CharClass::Medial)],
        preceded_by: None,
        followed_by: None,
        replacement: SWAP,
    },
    Rule {
        name: "ha-htoe-last-medial",
        priority: 51,
        pattern: &[
            Matcher::Lit('\u{103E}'),
            Matcher::One(CharClass::Range('\u{103B}', '\u{103D}')),
        ],
        preceded_by: None,
        followed_by: None,
        replacement: SWAP,
    },
    Rule {
        name: "wa-hswe-after-ya",
        priority: 51,
        pattern: &[
            Matcher::Lit('\u{103D}'),
            Matcher::One(CharClass::Range('\u{103B}', '\u{103C}')),
        ],
        preceded_by: None,
        followed_by: None,
        replacement: SWAP,
    },
    Rule {
        name: "upper-vowel-before-lower",
        priority: 52,
        pattern: &[Matcher::One(CharClass::LowerVowel), Matcher::One(CharClass::UpperVowel)],
        preceded_by: None,
        followed_by: None,
        replacement: SWAP,
    },
    Rule {
        name: "anusvara-after-lower-vowel",
        priority: 53,
        pattern: &[Matcher::Lit('\u{1036}'), Matcher::One(CharClass::LowerVowel)],
        preceded_by: None,
        followed_by: None,
        replacement: SWAP,
    },
    Rule {
        name: "dot-below-after-anusvara",
        priority: 54,
        pattern: &[Matcher::Lit('\u{1037}'), Matcher::Lit('\u{1036}')],
        preceded_by: None,
        followed_by: None,
        replacement: SWAP,
    },
    Rule {
        name: "dot-below-after-vowel",
        priority: 54,
        pattern: &[Matcher::Lit('\u{1037}'), Matcher::One(CharClass::VowelSign)],
        preceded_by: None,
        followed_by: None,
        replacement: SWAP,
    },
    Rule {
        name: "asat-after-dot-below",
        priority: 55,
        pattern: &[Matcher::Lit('\u{103A}'), Matcher::Lit('\u{1037}')],
        preceded_by: None,
        followed_by: None,
        replacement: SWAP,
    },
    Rule {
        name: "visarga-last",
        priority: 55,
        pattern: &[Matcher::Lit('\u{1038}'), Matcher::One(CharClass::Diacritic)],
        preceded_by: None,
        followed_by: None,
        replacement: SWAP,
    },
    Rule {
        name: "independent-uu",
        priority: 56,
        pattern: &[Matcher::Lit('\u{1025}'), Matcher::Lit('\u{102E}')],
        preceded_by: None,
        followed_by: None,
        replacement: &[Emit::Lit('\u{1026}')],
    },
    Rule {
        name: "nya-before-asat",
        priority: 56,
        pattern: &[Matcher::Lit('\u{1025}')],
        preceded_by: None,
        followed_by: Some(Context::Class(CharClass::Is('\u{103A}'))),
        replacement: &[Emit::Lit('\u{1009}')],
    },
    Rule {
        name: "collapse-i",
        priority: 60,
        pattern: &[
            Matcher::Lit('\u{102D}'),
            Matcher::Lit('\u{102D}'),
            Matcher::Star(CharClass::Is('\u{102D}')),
        ],
        preceded_by: None,
        followed_by: None,
        replacement: &[Emit::Lit('\u{102D}')],
    },
    Rule {
        name: "collapse-ii",
        priority: 60,
        pattern: &[
            Matcher::Lit('\u{102E}'),
            Matcher::Lit('\u{102E}'),
            Matcher::Star(CharClass::Is('\u{102E}')),
        ],
        preceded_by: None,
        followed_by: None,
        replacement: &[Emit::Lit('\u{102E}')],
    },
    Rule {
        name: "collapse-ai",
        priority: 60,
        pattern: &[
            Matcher::Lit('\u{1032}'),
            Matcher::Lit('\u{1032}'),
            Matcher::Star(CharClass::Is('\u{1032}')),
        ],
        preceded_by: None,
        followed_by: None,
        replacement: &[Emit::Lit('\u{1032}')],
    },
    Rule {
        name: "collapse-dot-below",
        priority: 60,
        pattern: &[
            Matcher::Lit('\u{1037}'),
            Matcher::Lit('\u{1037}'),
            Matcher::Star(CharClass::Is('\u{1037}')),
        ],
        preceded_by: None,
        followed_by: None,
        replacement: &[Emit::Lit('\u{1037}')],
    },
    Rule {
        name: "collapse-asat",
        priority: 60,
        pattern: &[
            Matcher::Lit('\u{103A}'),
            Matcher::Lit('\u{103A}'),
            Matcher::Star(CharClass::Is('\u{103A}')),
        ],
        preceded_by: None,
        followed_by: None,
        replacement: &[Emit::Lit('\u{103A}')],
    },
    Rule {
        name: "collapse-wa-hswe",
        priority: 60,
        pattern: &[
            Matcher::Lit('\u{103D}'),
            Matcher::Lit('\u{103D}'),
            Matcher::Star(CharClass::Is('\u{103D}')),
        ],
        preceded_by: None,
        followed_by: None,
        replacement: &[Emit::Lit('\u{103D}')],
    },
    Rule {
        name: "i-ii-merge",
        priority: 61,
        pattern: &[Matcher::Lit('\u{102D}'), Matcher::Lit('\u{102E}')],
        preceded_by: None,
        followed_by: None,
        replacement: &[Emit::Lit('\u{102E}')],
    },
    Rule {
        name: "ii-i-merge",
        priority: 61,
        pattern: &[Matcher::Lit('\u{102E}'), Matcher::Lit('\u{102D}')],
        preceded_by: None,
        followed_by: None,
        replacement: &[Emit::Lit('\u{102E}')],
    },
];
