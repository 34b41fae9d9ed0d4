use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::classifier::naive_bayes::{LabeledText, NaiveBayesModel};
use crate::vectorizer::{Document, DocumentId, SimilarityIndex};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(alias = "_id")]
    pub id: DocumentId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub specialization: Option<String>,
}

impl Profile {
    pub fn new<I, S>(id: I, bio: &str, skills: &[S]) -> Self
    where
        I: Into<DocumentId>,
        S: AsRef<str>,
    {
        Self {
            id: id.into(),
            name: String::new(),
            bio: bio.to_string(),
            skills: skills.iter().map(|s| s.as_ref().to_string()).collect(),
            specialization: None,
        }
    }

    pub fn with_specialization(mut self, specialization: &str) -> Self {
        self.specialization = Some(specialization.to_string());
        self
    }

    fn document(&self) -> Document {
        Document::new(self.id.clone(), "", &self.bio, &self.skills)
    }

    fn text(&self) -> String {
        let mut text = self.bio.clone();
        for skill in &self.skills {
            text.push(' ');
            text.push_str(skill);
        }
        text
    }
}

/// A profile with its similarity to the viewer
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileMatch<'a> {
    pub profile: &'a Profile,
    pub score: f64,
}

/// Profiles most similar to the viewer's bio and skills
///
/// # Arguments
/// * `profiles` - every candidate, the viewer included
/// * `viewer` - id of the viewing profile, never part of the result
/// * `k` - maximum number of matches
///
/// # Returns
/// * `Vec<ProfileMatch>` - best first; empty when the viewer is unknown or
///   shares no terms with anyone
pub fn discover<'a>(profiles: &'a [Profile], viewer: &DocumentId, k: usize) -> Vec<ProfileMatch<'a>> {
    let index: SimilarityIndex = SimilarityIndex::build(profiles.iter().map(Profile::document));
    let hits = index.similar_to_document(viewer, k);
    debug!(candidates = profiles.len(), matches = hits.len(), "profile discovery");
    hits.list
        .into_iter()
        .filter_map(|hit| {
            profiles
                .iter()
                .find(|p| p.id == hit.document.id)
                .map(|profile| ProfileMatch { profile, score: hit.score })
        })
        .collect()
}

/// Most likely specializations for a free-text description
///
/// Trains on the profiles that declare a specialization; returns at most `n`
/// labels, best first, and nothing when no profile is labelled.
pub fn specialization_suggestions(profiles: &[Profile], text: &str, n: usize) -> Vec<String> {
    let samples: Vec<LabeledText> = profiles
        .iter()
        .filter_map(|p| {
            p.specialization
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .map(|label| LabeledText::new(&p.text(), label))
        })
        .collect();
    NaiveBayesModel::train(&samples)
        .predict_ranked(text)
        .into_iter()
        .take(n)
        .map(|(label, _)| label)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profiles() -> Vec<Profile> {
        vec![
            Profile::new(1, "Session guitarist and producer", &["guitar", "mixing"]).with_specialization("producer"),
            Profile::new(2, "Indie guitar player writing songs", &["guitar", "songwriting"]).with_specialization("musician"),
            Profile::new(3, "Wedding and portrait photographer", &["portrait", "lighting"]).with_specialization("photographer"),
            Profile::new("u4", "Mixing engineer for podcasts", &["mixing", "mastering"]).with_specialization("producer"),
            Profile::new(5, "Still figuring it out", &[] as &[&str]),
        ]
    }

    #[test]
    fn viewer_is_excluded_and_best_match_first() {
        let profiles = profiles();
        let matches = discover(&profiles, &DocumentId::Num(2), 3);
        assert!(!matches.is_empty());
        assert!(matches.iter().all(|m| m.profile.id != DocumentId::Num(2)));
        assert_eq!(matches[0].profile.id, DocumentId::Num(1));
        assert!(matches.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn unknown_viewer_has_no_matches() {
        assert!(discover(&profiles(), &DocumentId::Num(42), 3).is_empty());
    }

    #[test]
    fn suggestions_follow_labelled_profiles() {
        let profiles = profiles();
        let suggestions = specialization_suggestions(&profiles, "mixing and mastering", 2);
        assert_eq!(suggestions.len(), 2);
        assert_eq!(suggestions[0], "producer");
        assert!(specialization_suggestions(&profiles[4..], "anything", 3).is_empty());
    }
}
