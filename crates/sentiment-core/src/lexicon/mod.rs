// Lexicon-based sentiment analyzer.
//
// A word-valence dictionary in the VADER file format plus the VADER rule set
// (boosters, negation, capitalisation, "but" shifts, punctuation emphasis).
// The dictionary is read-only once loaded and shared behind an `Arc`.

mod rules;

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{AnalysisError, LexiconError};
use crate::normalizer::{Analyzer, Normalize};
use crate::sentiment::{validate_text, SentimentResult, Source};

/// The lexicon shipped with the crate, compiled into the binary.
const BUNDLED_LEXICON: &str = include_str!("../../data/lexicon.tsv");

/// Valences are mean ratings on the VADER scale.
const MAX_VALENCE: f64 = 4.0;

static BUNDLED: OnceLock<Arc<Lexicon>> = OnceLock::new();

// ---------------------------------------------------------------------------
// Lexicon
// ---------------------------------------------------------------------------

/// Immutable token -> mean valence dictionary.
#[derive(Debug, Clone, PartialEq)]
pub struct Lexicon {
    valences: HashMap<String, f64>,
}

impl Lexicon {
    /// Parse lexicon text: one `token<TAB>valence[<TAB>...]` entry per line.
    ///
    /// Blank lines and lines starting with `#` are skipped. Columns after the
    /// valence (standard deviation, raw ratings) are ignored.
    pub fn parse(text: &str) -> Result<Lexicon, LexiconError> {
        let mut valences = HashMap::new();

        for (idx, line) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }

            let mut columns = line.split('\t');
            let token = columns.next().unwrap_or_default().trim();
            if token.is_empty() {
                return Err(LexiconError::Parse {
                    line: line_no,
                    message: "missing token".into(),
                });
            }
            let raw_valence = columns.next().ok_or_else(|| LexiconError::Parse {
                line: line_no,
                message: format!("missing valence for `{token}`"),
            })?;
            let valence: f64 = raw_valence.trim().parse().map_err(|_| LexiconError::Parse {
                line: line_no,
                message: format!("invalid valence `{}` for `{token}`", raw_valence.trim()),
            })?;
            if !valence.is_finite() || valence.abs() > MAX_VALENCE {
                return Err(LexiconError::Parse {
                    line: line_no,
                    message: format!(
                        "valence {valence} for `{token}` outside [-{MAX_VALENCE}, {MAX_VALENCE}]"
                    ),
                });
            }

            valences.insert(token.to_lowercase(), valence);
        }

        if valences.is_empty() {
            return Err(LexiconError::Empty);
        }

        Ok(Lexicon { valences })
    }

    /// Read and parse a lexicon file.
    pub fn from_path(path: &Path) -> Result<Lexicon, LexiconError> {
        let text = std::fs::read_to_string(path).map_err(|source| LexiconError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Lexicon::parse(&text)
    }

    /// The bundled lexicon, parsed on first use and shared afterwards.
    pub fn bundled() -> Result<Arc<Lexicon>, LexiconError> {
        if let Some(lexicon) = BUNDLED.get() {
            return Ok(Arc::clone(lexicon));
        }
        let parsed = Arc::new(Lexicon::parse(BUNDLED_LEXICON)?);
        Ok(Arc::clone(BUNDLED.get_or_init(|| parsed)))
    }

    /// Load the lexicon named by the configuration, or the bundled one.
    pub fn load(path: Option<&Path>) -> Result<Arc<Lexicon>, LexiconError> {
        match path {
            Some(path) => {
                let lexicon = Lexicon::from_path(path)?;
                info!(
                    "Loaded lexicon from {} ({} entries)",
                    path.display(),
                    lexicon.len()
                );
                Ok(Arc::new(lexicon))
            }
            None => {
                let lexicon = Lexicon::bundled()?;
                info!("Using bundled lexicon ({} entries)", lexicon.len());
                Ok(lexicon)
            }
        }
    }

    /// Valence for an already lower-cased token.
    pub fn valence(&self, token: &str) -> Option<f64> {
        self.valences.get(token).copied()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.valences.contains_key(token)
    }

    pub fn len(&self) -> usize {
        self.valences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.valences.is_empty()
    }
}

// ---------------------------------------------------------------------------
// LexiconOutput
// ---------------------------------------------------------------------------

/// Native lexicon scores.
///
/// `pos + neu + neg == 1.0` (within float tolerance) for any non-empty text,
/// and `compound` lies in [-1, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LexiconOutput {
    pub pos: f64,
    pub neu: f64,
    pub neg: f64,
    pub compound: f64,
}

impl Normalize for LexiconOutput {
    fn normalize(self) -> SentimentResult {
        let raw = [
            ("pos", self.pos),
            ("neu", self.neu),
            ("neg", self.neg),
            ("compound", self.compound),
        ]
        .into_iter()
        .map(|(key, value)| (key.to_string(), serde_json::Value::from(value)))
        .collect();
        SentimentResult::new(Source::Lexicon, self.compound, raw)
    }
}

// ---------------------------------------------------------------------------
// LexiconAnalyzer
// ---------------------------------------------------------------------------

/// Deterministic rule-based scorer over a shared lexicon.
#[derive(Debug, Clone)]
pub struct LexiconAnalyzer {
    lexicon: Arc<Lexicon>,
}

impl LexiconAnalyzer {
    pub fn new(lexicon: Arc<Lexicon>) -> Self {
        LexiconAnalyzer { lexicon }
    }

    /// Analyzer over the bundled lexicon.
    pub fn bundled() -> Result<Self, LexiconError> {
        Ok(LexiconAnalyzer::new(Lexicon::bundled()?))
    }

    /// Score `text`. Fails only when the text is blank.
    pub fn polarity_scores(&self, text: &str) -> Result<LexiconOutput, AnalysisError> {
        let text = validate_text(text)?;
        let output = rules::polarity_scores(&self.lexicon, text);
        debug!(
            compound = output.compound,
            pos = output.pos,
            neu = output.neu,
            neg = output.neg,
            "lexicon scores"
        );
        Ok(output)
    }
}

#[async_trait]
impl Analyzer for LexiconAnalyzer {
    type Output = LexiconOutput;

    fn source(&self) -> Source {
        Source::Lexicon
    }

    async fn analyze(&self, text: &str) -> Result<LexiconOutput, AnalysisError> {
        self.polarity_scores(text)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
