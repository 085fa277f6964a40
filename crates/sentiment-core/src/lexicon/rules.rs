// VADER scoring rules applied on top of a `Lexicon`.

use super::{Lexicon, LexiconOutput};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Valence added by a booster word ("very", "extremely").
const B_INCR: f64 = 0.293;
/// Valence added by a dampener word ("slightly", "kind of").
const B_DECR: f64 = -0.293;
/// Emphasis for an ALL-CAPS word in otherwise mixed-case text.
const C_INCR: f64 = 0.733;
/// Multiplier applied to negated valence.
const N_SCALAR: f64 = -0.74;
/// Normalization constant approximating the max expected raw sum.
const ALPHA: f64 = 15.0;
/// Beyond this, `normalize` is 1.0 to within f64 precision of the clamp.
const SATURATION: f64 = 1e8;

const EXCLAMATION_WEIGHT: f64 = 0.292;
const MAX_EXCLAMATIONS: usize = 4;
const QUESTION_WEIGHT: f64 = 0.18;
const QUESTION_CAP: f64 = 0.96;

const NEGATIONS: &[&str] = &[
    "aint", "arent", "cannot", "cant", "couldnt", "darent", "didnt", "doesnt", "ain't", "aren't",
    "can't", "couldn't", "daren't", "didn't", "doesn't", "dont", "hadnt", "hasnt", "havent",
    "isnt", "mightnt", "mustnt", "neither", "don't", "hadn't", "hasn't", "haven't", "isn't",
    "mightn't", "mustn't", "neednt", "needn't", "never", "none", "nope", "nor", "not", "nothing",
    "nowhere", "oughtnt", "shant", "shouldnt", "uhuh", "wasnt", "werent", "oughtn't", "shan't",
    "shouldn't", "uh-uh", "wasn't", "weren't", "without", "wont", "wouldnt", "won't", "wouldn't",
    "rarely", "seldom", "despite",
];

const BOOSTERS: &[(&str, f64)] = &[
    ("absolutely", B_INCR),
    ("amazingly", B_INCR),
    ("awfully", B_INCR),
    ("completely", B_INCR),
    ("considerably", B_INCR),
    ("decidedly", B_INCR),
    ("deeply", B_INCR),
    ("effing", B_INCR),
    ("enormously", B_INCR),
    ("entirely", B_INCR),
    ("especially", B_INCR),
    ("exceptionally", B_INCR),
    ("extremely", B_INCR),
    ("fabulously", B_INCR),
    ("flipping", B_INCR),
    ("flippin", B_INCR),
    ("fricking", B_INCR),
    ("frickin", B_INCR),
    ("frigging", B_INCR),
    ("friggin", B_INCR),
    ("fully", B_INCR),
    ("fucking", B_INCR),
    ("greatly", B_INCR),
    ("hella", B_INCR),
    ("highly", B_INCR),
    ("hugely", B_INCR),
    ("incredibly", B_INCR),
    ("intensely", B_INCR),
    ("majorly", B_INCR),
    ("more", B_INCR),
    ("most", B_INCR),
    ("particularly", B_INCR),
    ("purely", B_INCR),
    ("quite", B_INCR),
    ("really", B_INCR),
    ("remarkably", B_INCR),
    ("so", B_INCR),
    ("substantially", B_INCR),
    ("thoroughly", B_INCR),
    ("totally", B_INCR),
    ("tremendously", B_INCR),
    ("uber", B_INCR),
    ("unbelievably", B_INCR),
    ("unusually", B_INCR),
    ("utterly", B_INCR),
    ("very", B_INCR),
    ("almost", B_DECR),
    ("barely", B_DECR),
    ("hardly", B_DECR),
    ("just enough", B_DECR),
    ("kind of", B_DECR),
    ("kinda", B_DECR),
    ("kindof", B_DECR),
    ("kind-of", B_DECR),
    ("less", B_DECR),
    ("little", B_DECR),
    ("marginally", B_DECR),
    ("occasionally", B_DECR),
    ("partly", B_DECR),
    ("scarcely", B_DECR),
    ("slightly", B_DECR),
    ("somewhat", B_DECR),
    ("sort of", B_DECR),
    ("sorta", B_DECR),
    ("sortof", B_DECR),
    ("sort-of", B_DECR),
];

const IDIOMS: &[(&str, f64)] = &[
    ("the shit", 3.0),
    ("the bomb", 3.0),
    ("bad ass", 1.5),
    ("yeah right", -2.0),
    ("cut the mustard", 2.0),
    ("kiss of death", -1.5),
    ("hand to mouth", -2.0),
];

fn booster(word: &str) -> Option<f64> {
    BOOSTERS.iter().find(|(w, _)| *w == word).map(|(_, v)| *v)
}

fn idiom(phrase: &str) -> Option<f64> {
    IDIOMS.iter().find(|(p, _)| *p == phrase).map(|(_, v)| *v)
}

fn is_negation(word: &str) -> bool {
    NEGATIONS.contains(&word) || word.contains("n't")
}

/// Python-style `isupper`: at least one cased character and no lowercase ones.
fn is_upper(word: &str) -> bool {
    word.chars().any(char::is_uppercase) && !word.chars().any(char::is_lowercase)
}

// ---------------------------------------------------------------------------
// Tokenization
// ---------------------------------------------------------------------------

/// Split on whitespace, strip surrounding punctuation from words, and drop
/// single characters. A token whose stripped form has two characters or
/// fewer is kept as-is, so emoticons like `:)` and `:-(` survive.
fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|token| {
            let stripped = token.trim_matches(|c: char| c.is_ascii_punctuation());
            if stripped.chars().count() <= 2 {
                token
            } else {
                stripped
            }
        })
        .filter(|token| token.chars().count() > 1)
        .map(str::to_string)
        .collect()
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

struct SentiText<'a> {
    lexicon: &'a Lexicon,
    words: Vec<String>,
    lower: Vec<String>,
    /// True when some, but not all, words are ALL CAPS.
    cap_differential: bool,
}

impl<'a> SentiText<'a> {
    fn new(lexicon: &'a Lexicon, text: &str) -> Self {
        let words = tokenize(text);
        let lower = words.iter().map(|w| w.to_lowercase()).collect();
        let all_caps = words.iter().filter(|w| is_upper(w)).count();
        let cap_differential = all_caps > 0 && all_caps < words.len();
        SentiText {
            lexicon,
            words,
            lower,
            cap_differential,
        }
    }

    fn in_lexicon(&self, i: usize) -> bool {
        self.lexicon.contains(&self.lower[i])
    }

    fn sentiments(&self) -> Vec<f64> {
        let mut sentiments = Vec::with_capacity(self.words.len());
        for i in 0..self.words.len() {
            let item = self.lower[i].as_str();
            let kind_of = item == "kind" && self.lower.get(i + 1).is_some_and(|w| w == "of");
            if kind_of || booster(item).is_some() {
                sentiments.push(0.0);
                continue;
            }
            sentiments.push(self.valence(i));
        }
        self.but_shift(&mut sentiments);
        sentiments
    }

    fn valence(&self, i: usize) -> f64 {
        let lower = &self.lower;
        let Some(base) = self.lexicon.valence(&lower[i]) else {
            return 0.0;
        };
        let mut valence = base;

        // "no" as a determiner in front of another sentiment word
        if lower[i] == "no" && i + 1 < lower.len() && self.in_lexicon(i + 1) {
            valence = 0.0;
        }
        if (i > 0 && lower[i - 1] == "no")
            || (i > 1 && lower[i - 2] == "no")
            || (i > 2 && lower[i - 3] == "no" && matches!(lower[i - 1].as_str(), "or" | "nor"))
        {
            valence = base * N_SCALAR;
        }

        if is_upper(&self.words[i]) && self.cap_differential {
            if valence > 0.0 {
                valence += C_INCR;
            } else {
                valence -= C_INCR;
            }
        }

        for start in 0..3 {
            if i > start && !self.in_lexicon(i - start - 1) {
                let mut scalar = self.scalar_inc_dec(i - start - 1, valence);
                if start == 1 && scalar != 0.0 {
                    scalar *= 0.95;
                }
                if start == 2 && scalar != 0.0 {
                    scalar *= 0.9;
                }
                valence += scalar;
                valence = self.negation_check(valence, start, i);
                if start == 2 {
                    valence = self.idioms_check(valence, i);
                }
            }
        }

        self.least_check(valence, i)
    }

    fn scalar_inc_dec(&self, j: usize, valence: f64) -> f64 {
        let Some(mut scalar) = booster(&self.lower[j]) else {
            return 0.0;
        };
        if valence < 0.0 {
            scalar = -scalar;
        }
        if is_upper(&self.words[j]) && self.cap_differential {
            if valence > 0.0 {
                scalar += C_INCR;
            } else {
                scalar -= C_INCR;
            }
        }
        scalar
    }

    fn negation_check(&self, valence: f64, start: usize, i: usize) -> f64 {
        let w = &self.lower;
        let so_or_this = |word: &str| word == "so" || word == "this";
        match start {
            0 => {
                if is_negation(&w[i - 1]) {
                    return valence * N_SCALAR;
                }
            }
            1 => {
                if w[i - 2] == "never" && so_or_this(&w[i - 1]) {
                    return valence * 1.25;
                }
                if w[i - 2] == "without" && w[i - 1] == "doubt" {
                    return valence;
                }
                if is_negation(&w[i - 2]) {
                    return valence * N_SCALAR;
                }
            }
            _ => {
                if w[i - 3] == "never" && (so_or_this(&w[i - 2]) || so_or_this(&w[i - 1])) {
                    return valence * 1.25;
                }
                if w[i - 3] == "without" && (w[i - 2] == "doubt" || w[i - 1] == "doubt") {
                    return valence;
                }
                if is_negation(&w[i - 3]) {
                    return valence * N_SCALAR;
                }
            }
        }
        valence
    }

    /// Multi-word idioms around position `i`; only reached when `i > 2`.
    fn idioms_check(&self, mut valence: f64, i: usize) -> f64 {
        let w = &self.lower;
        let one_zero = format!("{} {}", w[i - 1], w[i]);
        let two_one_zero = format!("{} {} {}", w[i - 2], w[i - 1], w[i]);
        let two_one = format!("{} {}", w[i - 2], w[i - 1]);
        let three_two_one = format!("{} {} {}", w[i - 3], w[i - 2], w[i - 1]);
        let three_two = format!("{} {}", w[i - 3], w[i - 2]);

        for sequence in [&one_zero, &two_one_zero, &two_one, &three_two_one, &three_two] {
            if let Some(v) = idiom(sequence) {
                valence = v;
                break;
            }
        }
        if w.len() - 1 > i {
            if let Some(v) = idiom(&format!("{} {}", w[i], w[i + 1])) {
                valence = v;
            }
        }
        if w.len() - 1 > i + 1 {
            if let Some(v) = idiom(&format!("{} {} {}", w[i], w[i + 1], w[i + 2])) {
                valence = v;
            }
        }

        if booster(&three_two).is_some() || booster(&two_one).is_some() {
            valence += B_DECR;
        }
        valence
    }

    fn least_check(&self, valence: f64, i: usize) -> f64 {
        let w = &self.lower;
        if i > 1 && !self.in_lexicon(i - 1) && w[i - 1] == "least" {
            if w[i - 2] != "at" && w[i - 2] != "very" {
                return valence * N_SCALAR;
            }
        } else if i > 0 && !self.in_lexicon(i - 1) && w[i - 1] == "least" {
            return valence * N_SCALAR;
        }
        valence
    }

    /// Sentiment before "but" is dampened, sentiment after it is amplified.
    fn but_shift(&self, sentiments: &mut [f64]) {
        let Some(but) = self.lower.iter().position(|w| w == "but") else {
            return;
        };
        for (i, sentiment) in sentiments.iter_mut().enumerate() {
            if i < but {
                *sentiment *= 0.5;
            } else if i > but {
                *sentiment *= 1.5;
            }
        }
    }
}

fn punctuation_emphasis(text: &str) -> f64 {
    let exclamations = text.chars().filter(|&c| c == '!').count().min(MAX_EXCLAMATIONS);
    let questions = text.chars().filter(|&c| c == '?').count();
    let question_amp = match questions {
        0 | 1 => 0.0,
        2 | 3 => questions as f64 * QUESTION_WEIGHT,
        _ => QUESTION_CAP,
    };
    exclamations as f64 * EXCLAMATION_WEIGHT + question_amp
}

/// Map a raw sum into [-1, 1]. Sums large enough to overflow `score * score`
/// saturate to the sign.
fn normalize(score: f64) -> f64 {
    if score.abs() > SATURATION {
        return score.signum();
    }
    (score / (score * score + ALPHA).sqrt()).clamp(-1.0, 1.0)
}

/// Score `text` against `lexicon`.
pub(super) fn polarity_scores(lexicon: &Lexicon, text: &str) -> LexiconOutput {
    let senti = SentiText::new(lexicon, text);
    let sentiments = senti.sentiments();

    if sentiments.is_empty() {
        // Every token was a single character: nothing to score.
        return LexiconOutput {
            pos: 0.0,
            neu: 1.0,
            neg: 0.0,
            compound: 0.0,
        };
    }

    let amplifier = punctuation_emphasis(text);
    let mut sum: f64 = sentiments.iter().sum();
    if sum > 0.0 {
        sum += amplifier;
    } else if sum < 0.0 {
        sum -= amplifier;
    }
    let compound = normalize(sum);

    // Each non-zero sentiment counts one extra point to balance neutral words.
    let mut pos_sum = 0.0;
    let mut neg_sum = 0.0;
    let mut neu_count = 0.0;
    for &s in &sentiments {
        if s > 0.0 {
            pos_sum += s + 1.0;
        } else if s < 0.0 {
            neg_sum += s - 1.0;
        } else {
            neu_count += 1.0;
        }
    }
    if pos_sum > neg_sum.abs() {
        pos_sum += amplifier;
    } else if pos_sum < neg_sum.abs() {
        neg_sum -= amplifier;
    }

    let total = pos_sum + neg_sum.abs() + neu_count;
    LexiconOutput {
        pos: (pos_sum / total).abs(),
        neu: (neu_count / total).abs(),
        neg: (neg_sum / total).abs(),
        compound,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
