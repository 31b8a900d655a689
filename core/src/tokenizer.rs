use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Anything that is not ASCII alphanumeric, whitespace, Hiragana, Katakana or a CJK ideograph.
    static ref NOISE: Regex = Regex::new(
        r"[^a-z0-9\s\x{3040}-\x{309F}\x{30A0}-\x{30FF}\x{4E00}-\x{9FAF}]"
    ).expect("valid regex");
}

/// ASCII words shorter than this are dropped.
const MIN_WORD_LEN: usize = 3;

fn is_ascii_word(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_alphanumeric())
}

fn push_bigrams(segment: &str, tokens: &mut Vec<String>) {
    let chars: Vec<char> = segment.chars().collect();
    for pair in chars.windows(2) {
        tokens.push(pair.iter().collect());
    }
}

/// Tokenize text into index terms.
///
/// Text is lowercased and stripped of punctuation. ASCII words of three or more
/// characters are kept whole; segments in scripts without word boundaries
/// (Japanese, Chinese, or mixed) become overlapping character bigrams.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let cleaned = NOISE.replace_all(&lowered, " ");
    let mut tokens = Vec::new();
    for segment in cleaned.split_whitespace() {
        if is_ascii_word(segment) {
            if segment.len() >= MIN_WORD_LEN {
                tokens.push(segment.to_string());
            }
        } else {
            push_bigrams(segment, &mut tokens);
        }
    }
    tokens
}
