// Library root: sentiment analysis core shared by every front end.
//
// Two independent analyzers (a lexicon rule scorer and a pretrained
// transformer classifier) are run on the same text and their outputs are
// normalized into one comparable `SentimentResult` shape.

pub mod config;
pub mod error;
pub mod lexicon;
pub mod model;
pub mod normalizer;
pub mod sentiment;

pub use error::{AnalysisError, LexiconError};
pub use lexicon::{Lexicon, LexiconAnalyzer, LexiconOutput};
pub use model::{Classifier, ModelAnalyzer, ModelHandle, ModelLabel, ModelOutput, TextClassifier};
pub use normalizer::{Analyzer, Normalize, ResultNormalizer};
pub use sentiment::{
    validate_text, AgreementKind, AgreementVerdict, Comparison, Label, SentimentResult, Slot,
    Source,
};
