/// How a single character of a word slot compares against its target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CharClass {
    Correct,
    /// Typed character differs from the target character at the same index
    Substitution,
    /// Typed past the end of the target word
    Extra,
    /// Target character not reached yet, only used for preview rendering
    Untyped,
}

impl CharClass {
    pub fn is_error(self) -> bool {
        matches!(self, CharClass::Substitution | CharClass::Extra)
    }
}

/// One classified character of a word slot.
///
/// `expected` is the target character for `Substitution` spans so a renderer
/// can show what should have been typed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClassifiedChar {
    pub ch: char,
    pub class: CharClass,
    pub expected: Option<char>,
}

/// Classifies the typed character at `idx` against `target`.
pub fn classify_at(target: &str, idx: usize, typed: char) -> CharClass {
    match target.chars().nth(idx) {
        None => CharClass::Extra,
        Some(expected) if expected != typed => CharClass::Substitution,
        Some(_) => CharClass::Correct,
    }
}

/// Classifies every typed character, followed by the untyped remainder of the
/// target word (if any).
pub fn classify_word(target: &str, typed: &str) -> Vec<ClassifiedChar> {
    let mut target_chars = target.chars();
    let mut out = Vec::with_capacity(target.len().max(typed.len()));

    for ch in typed.chars() {
        let span = match target_chars.next() {
            None => ClassifiedChar {
                ch,
                class: CharClass::Extra,
                expected: None,
            },
            Some(expected) if expected != ch => ClassifiedChar {
                ch,
                class: CharClass::Substitution,
                expected: Some(expected),
            },
            Some(expected) => ClassifiedChar {
                ch,
                class: CharClass::Correct,
                expected: Some(expected),
            },
        };
        out.push(span);
    }

    out.extend(target_chars.map(|ch| ClassifiedChar {
        ch,
        class: CharClass::Untyped,
        expected: Some(ch),
    }));

    out
}

/// A finalized word slot is a mismatch when it differs from the target in any
/// way, including only by length.
pub fn is_word_mismatch(target: &str, typed: &str) -> bool {
    target != typed
}
