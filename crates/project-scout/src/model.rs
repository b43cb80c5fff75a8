use std::fmt;

/// One entry found on the listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    /// Project title as shown on the listing page
    pub title: String,
    /// Absolute URL of the project's detail page
    pub link: String,
}

/// A project as it moves through the pipeline, from listing entry to output row.
#[derive(Debug, Clone)]
pub struct Project {
    pub title: String,
    pub link: String,
    /// Free text extracted from the detail page
    pub description: String,
    /// Relevance score in [0, 100]
    pub score: u8,
    /// Model-extracted keywords that matched the taxonomy; empty when keyword
    /// generation is off or nothing matched
    pub extracted_keywords: Vec<String>,
    /// Abstractive summary, only present when the score cleared the threshold
    pub summary: Option<String>,
}

impl Project {
    pub fn new(entry: ListingEntry, description: String) -> Self {
        Self {
            title: entry.title,
            link: entry.link,
            description,
            score: 0,
            extracted_keywords: Vec::new(),
            summary: None,
        }
    }

    pub fn relevance(&self) -> RelevanceLabel {
        RelevanceLabel::from_score(self.score)
    }
}

/// Coarse reading of a relevance score, used in run logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelevanceLabel {
    Relevant,
    PossiblyRelevant,
    Unrelated,
}

impl RelevanceLabel {
    pub fn from_score(score: u8) -> Self {
        match score {
            50.. => Self::Relevant,
            25..=49 => Self::PossiblyRelevant,
            _ => Self::Unrelated,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Relevant => "Relevant",
            Self::PossiblyRelevant => "Possibly Relevant",
            Self::Unrelated => "Unrelated",
        }
    }
}

impl fmt::Display for RelevanceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
