use crate::classifier::decision_tree::{Privacy, PrivacySignals};
use crate::classifier::engagement::EngagementFeatures;
use crate::vectorizer::{Document, DocumentId};

/// An input with the answer a scorer should give
#[derive(Debug, Clone, PartialEq)]
pub struct Fixture<I, E> {
    pub input: I,
    pub expected: E,
}

fn fixture<I, E>(input: I, expected: E) -> Fixture<I, E> {
    Fixture { input, expected }
}

/// Portfolio items used for similarity search until `knnItems` are uploaded
pub fn demo_documents() -> Vec<Document> {
    vec![
        Document::new(1, "Ambient guitar loops", "Layered guitar textures with tape delay", &["guitar", "ambient"]),
        Document::new(2, "Lo-fi beat tape", "Dusty drums and warm keys", &["beats", "lofi"]),
        Document::new(3, "Studio portrait series", "Soft window light portraits", &["portrait", "photography"]),
        Document::new(4, "Mountain landscape prints", "Sunrise landscapes from the alps", &["landscape", "photography"]),
        Document::new(5, "Wedding film highlights", "Cinematic wedding video with drone shots", &["video", "wedding"]),
        Document::new(
            6,
            "Indie band live session",
            "Live recording of a four piece band with guitar solos",
            &["band", "live", "guitar"],
        ),
        Document::new(7, "Street photography zine", "Black and white street photos", &["street", "photography"]),
        Document::new(8, "Music video edit", "Fast cuts for a rap music video", &["video", "music"]),
    ]
}

/// Queries with the ids of the demo documents that answer them
pub fn relevance_judgments() -> Vec<Fixture<&'static str, Vec<DocumentId>>> {
    vec![
        fixture("guitar", vec![DocumentId::Num(1), DocumentId::Num(6)]),
        fixture("portrait photography", vec![DocumentId::Num(3)]),
        fixture("wedding video", vec![DocumentId::Num(5)]),
        fixture("landscape prints", vec![DocumentId::Num(4)]),
        fixture("live band", vec![DocumentId::Num(6)]),
    ]
}

pub fn category_fixtures() -> Vec<Fixture<&'static str, &'static str>> {
    vec![
        fixture("Recording a new song with my band", "music"),
        fixture("Portrait photography session in the studio", "photography"),
        fixture("Drone footage for a travel documentary", "video"),
        fixture("Live concert with drums and guitar", "music"),
        fixture("Landscape shoot at golden hour", "photography"),
        fixture("Looking for collaborators", "other"),
        fixture("Mixing a vocal track with guitars", "music"),
        fixture("Editing a music video", "video"),
    ]
}

pub fn privacy_fixtures() -> Vec<Fixture<PrivacySignals, Privacy>> {
    let signals = |has_thumbnail, has_tags, has_media, has_link| PrivacySignals {
        has_thumbnail,
        has_tags,
        has_media,
        has_link,
    };
    vec![
        fixture(signals(false, false, false, false), Privacy::Private),
        fixture(signals(true, true, true, false), Privacy::Public),
        fixture(signals(false, false, true, true), Privacy::Public),
        fixture(signals(true, false, true, false), Privacy::Private),
        fixture(signals(true, true, false, false), Privacy::Private),
        fixture(signals(false, true, true, true), Privacy::Public),
    ]
}

/// Messages labelled `true` when they read as a good first contact
pub fn quality_fixtures() -> Vec<Fixture<&'static str, bool>> {
    vec![
        fixture(
            "Hello Maya, I really enjoyed your latest portrait series. Would you be open to a short \
             collaboration on my new album cover next month? Thanks",
            true,
        ),
        fixture(
            "Hi Sam, thanks for sharing your mix. The low end feels warm and the vocals sit nicely. \
             Could we try a brighter snare on the chorus?",
            true,
        ),
        fixture(
            "Hello! I would love to book you for a portrait shoot next week. Are you available on Friday afternoon?",
            true,
        ),
        fixture("nice", true),
        fixture("CLICK NOW!!! http://spam.example http://spam.example http://x.example FREE!!!", false),
        fixture("ok", false),
        fixture("BUY FOLLOWERS NOW???? cheap promo at http://promo.example", false),
        fixture("Hey, check out my page", false),
    ]
}

/// Engagement counts labelled `true` for items that did well
pub fn rating_fixtures() -> Vec<Fixture<EngagementFeatures, bool>> {
    let counts = EngagementFeatures::from_counts;
    vec![
        fixture(counts(100.0, 10.0, 10.0), true),
        fixture(counts(80.0, 8.0, 5.0), true),
        fixture(counts(60.0, 6.0, 6.0), true),
        fixture(counts(90.0, 2.0, 1.0), true),
        fixture(counts(0.0, 0.0, 0.0), false),
        fixture(counts(20.0, 1.0, 0.0), false),
        fixture(counts(50.0, 3.0, 2.0), false),
        fixture(counts(10.0, 9.0, 8.0), false),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn judged_ids_exist_in_demo_corpus() {
        let ids: Vec<DocumentId> = demo_documents().into_iter().map(|d| d.id).collect();
        for judgment in relevance_judgments() {
            assert!(judgment.expected.iter().all(|id| ids.contains(id)), "{}", judgment.input);
        }
    }

    #[test]
    fn fixtures_cover_both_labels() {
        assert!(quality_fixtures().iter().any(|f| f.expected));
        assert!(quality_fixtures().iter().any(|f| !f.expected));
        assert!(rating_fixtures().iter().any(|f| f.expected));
        assert!(rating_fixtures().iter().any(|f| !f.expected));
    }
}
