//! Character-class checks for Han input and pinyin output.

/// Tone-marked vowels (plus ü) that may appear in pinyin.
const PINYIN_DIACRITICS: &str = "āáǎàēéěèīíǐìōóǒòūúǔùǖǘǚǜüĀÁǍÀĒÉĚÈĪÍǏÌŌÓǑÒŪÚǓÙǕǗǙǛÜ";

/// Returns `true` if `c` is a CJK ideograph.
///
/// Covers the unified block, extension A, the compatibility block and the
/// supplementary ideographic planes (extensions B onwards).
pub fn is_han(c: char) -> bool {
    matches!(
        c as u32,
        0x4E00..=0x9FFF
            | 0x3400..=0x4DBF
            | 0xF900..=0xFAFF
            | 0x20000..=0x2FA1F
            | 0x30000..=0x3134F
    )
}

/// Returns `true` if `text` contains at least one Han character.
pub fn contains_han(text: &str) -> bool {
    text.chars().any(is_han)
}

/// Returns `true` if `text` contains a Latin letter or pinyin diacritic.
///
/// ```
/// use read_for_me::script::contains_romanization;
///
/// assert!(contains_romanization("nǐ hǎo"));
/// assert!(!contains_romanization("你好"));
/// ```
pub fn contains_romanization(text: &str) -> bool {
    text.chars()
        .any(|c| c.is_ascii_alphabetic() || PINYIN_DIACRITICS.contains(c))
}
