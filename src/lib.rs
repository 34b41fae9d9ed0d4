/// This crate is a set of small, deterministic scorers for a creative
/// portfolio platform: similarity search, category and privacy
/// classification, message quality and engagement rating, plus the tools to
/// train, store and evaluate them.
pub mod vectorizer;
pub mod classifier;
pub mod config;
pub mod dataset;
pub mod discover;
pub mod error;
pub mod evaluation;
pub mod store;
pub mod toolkit;
pub mod utils;

/// Similarity Index
/// The TF-IDF nearest-neighbour engine of this crate.
/// It tokenizes title, description and tags of every document, weights terms
/// with `tf * idf` and ranks documents against a query by cosine similarity.
///
/// `SimilarityIndex<E>` is generic over the weighting engine:
/// - `E`: TF-IDF calculation engine type (default `SmoothedTfIdfEngine`)
///
/// Results come back as `Hits`, best first, ties in corpus order, and only
/// documents with a positive score are returned.
///
/// # Serialization
/// Supported, as a bare array of documents.
/// Term vectors are derived data and are not stored.
///
/// # Deserialization
/// Use `IndexData` and `into_similarity_index`.
pub use vectorizer::{build_corpus_vectors, Document, DocumentId, SimilarityIndex, TermVector};

/// Similarity Index Data Structure for Serialization
/// Holds only the documents of an index. This is what the model store keeps
/// under `knnItems`.
pub use vectorizer::serde::IndexData;

/// Corpus statistics
/// The number of documents and, for every term, the number of documents
/// containing it. Base data for IDF.
pub use vectorizer::corpus::Corpus;

/// Tokenizer and Term Frequency
/// `Tokenizer` lowercases, strips everything outside `[a-z0-9]` and
/// whitespace, splits and drops stopwords. `TermFrequency` counts the tokens
/// of one document and is the base data for TF.
pub use vectorizer::token::{tokenize, TermFrequency, Tokenizer};

/// TF IDF Calculation Engine Trait
/// Implement it to plug another weighting into `SimilarityIndex<E>`.
/// `SmoothedTfIdfEngine` uses `tf = count / total` and
/// `idf = ln((N + 1) / (df + 1)) + 1`.
pub use vectorizer::tfidf::{SmoothedTfIdfEngine, TfIdfEngine};

/// Ranked similarity results
pub use vectorizer::evaluate::scoring::{HitEntry, Hits};

/// Category classification
/// `KeywordClassifier` is the fixed-keyword Naive Bayes over `music`,
/// `photography` and `video`, falling back to `"other"`.
/// `NaiveBayesModel` is the trainable multinomial variant.
pub use classifier::naive_bayes::{naive_bayes_category, KeywordClassifier, LabeledText, NaiveBayesModel};

/// Privacy recommendation
/// `recommend_privacy` applies four fixed rules; `DecisionTreeTrainer` grows an
/// information-gain tree from labelled samples.
pub use classifier::decision_tree::{
    recommend_privacy, train_decision_tree, DecisionTreeTrainer, FeatureValue, Privacy, PrivacyRecommendation,
    PrivacySignals, TreeNode, TreeSample,
};

/// Linear models with a sigmoid output and their trainer
pub use classifier::linear::{train_logistic_regression, LinearModel};

/// Message quality scoring
/// Messages are reduced to eight hand-engineered features and scored by a
/// linear model with a sigmoid output. The fixed coefficients favour
/// messages of about 25 words with varied vocabulary and a greeting or a
/// thank you. Shouting, links and punctuation bursts are penalized.
pub use classifier::quality::{score_quality, QualityBucket, QualityFeatures, QualitySample, QualityScorer};

/// Engagement rating prediction
pub use classifier::engagement::{predict_rating, EngagementFeatures, EngagementSample, RatingPredictor};

pub use config::ScoringConfig;
pub use dataset::{Dataset, TrainedModels};

/// Profile discovery and specialization suggestions
/// `discover` ranks profiles by TF-IDF similarity of bios and skills.
/// `specialization_suggestions` trains the multinomial Naive Bayes model on
/// profiles that already declare a specialization.
pub use discover::{discover, specialization_suggestions, Profile, ProfileMatch};
pub use error::{Result, ScoringError};

/// Offline evaluation
/// Runs the active scorers over hand-labelled fixtures. Category and privacy
/// report accuracy, quality and rating report accuracy / precision / recall /
/// F1 at a fixed threshold, and similarity reports top-1 accuracy and
/// precision / recall / F1 at k. A ratio with an empty denominator is 0.
pub use evaluation::{evaluate, EvaluationReport};

/// Model store
/// Keeps trained models as versioned files, one per key
/// (`nbModel`, `svmModel`, `nnModel`, `dtModel`, `knnItems`).
pub use store::{EngagementModel, Model, ModelStore, QualityModel};

/// The scorers currently in use, fixed or trained
pub use toolkit::{ScoringToolkit, Variant};
