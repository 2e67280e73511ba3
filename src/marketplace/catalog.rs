use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

/// Identifier wrapper for catalog subjects (stable slug, e.g. `math-advanced`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubjectId(pub String);

impl SubjectId {
    pub fn new(slug: &str) -> Self {
        SubjectId(slug.to_string())
    }
}

/// Static catalog entry for an HSC subject. Loaded once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: SubjectId,
    pub name: String,
    pub category: String,
}

fn entry(id: &str, name: &str, category: &str) -> Subject {
    Subject {
        id: SubjectId::new(id),
        name: name.to_string(),
        category: category.to_string(),
    }
}

/// The fixed HSC subject table offered on the marketplace.
pub fn subjects() -> &'static [Subject] {
    static SUBJECTS: OnceLock<Vec<Subject>> = OnceLock::new();
    SUBJECTS.get_or_init(|| {
        vec![
            entry("math-standard", "Mathematics Standard", "Mathematics"),
            entry("math-advanced", "Mathematics Advanced", "Mathematics"),
            entry("math-extension1", "Mathematics Extension 1", "Mathematics"),
            entry("math-extension2", "Mathematics Extension 2", "Mathematics"),
            entry("english-standard", "English Standard", "English"),
            entry("english-advanced", "English Advanced", "English"),
            entry("english-extension1", "English Extension 1", "English"),
            entry("english-extension2", "English Extension 2", "English"),
            entry("biology", "Biology", "Science"),
            entry("chemistry", "Chemistry", "Science"),
            entry("physics", "Physics", "Science"),
            entry("modern-history", "Modern History", "Humanities"),
            entry("ancient-history", "Ancient History", "Humanities"),
            entry("geography", "Geography", "Humanities"),
            entry("economics", "Economics", "Humanities"),
            entry("business-studies", "Business Studies", "Humanities"),
            entry("french", "French", "Languages"),
            entry("german", "German", "Languages"),
            entry("spanish", "Spanish", "Languages"),
            entry("japanese", "Japanese", "Languages"),
            entry("chinese", "Chinese", "Languages"),
        ]
    })
}

pub fn subject(id: &SubjectId) -> Option<&'static Subject> {
    subjects().iter().find(|subject| &subject.id == id)
}

/// Display name for a subject id; falls back to the raw slug for ids outside
/// the catalog so search output never drops a tutor's listing.
pub fn subject_name(id: &SubjectId) -> &str {
    match subject(id) {
        Some(subject) => &subject.name,
        None => &id.0,
    }
}
