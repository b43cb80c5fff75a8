/// Relevance scoring against the keyword taxonomy.
///
/// Two sources feed the raw score:
/// - Lexical: every taxonomy keyword found in the description (exact, else fuzzy)
///   adds its category weight once, however often it recurs.
/// - Model keywords: every distinct model-extracted keyword that matches a taxonomy
///   entry adds twice that entry's category weight.
///
/// The raw sum is scaled by `100 / score_ceiling`, rounded and clamped to [0, 100].
/// With the default ceiling of 100 the weights read directly as percentage points.
use tracing::debug;

use crate::matching::{match_keyword, MatchKind, PreparedText};
use crate::taxonomy::KeywordTaxonomy;

/// Multiplier applied to category weights for model-keyword matches.
pub const MODEL_KEYWORD_MULTIPLIER: f64 = 2.0;

#[derive(Debug, Clone, PartialEq)]
pub struct ScorerSettings {
    /// Similarity that a lexical fuzzy match must exceed
    pub fuzzy_threshold: f64,
    /// Similarity that a model-keyword fuzzy match must exceed
    pub keyword_fuzzy_threshold: f64,
    /// Raw score that maps to 100
    pub score_ceiling: f64,
}

impl Default for ScorerSettings {
    fn default() -> Self {
        Self {
            fuzzy_threshold: 0.8,
            keyword_fuzzy_threshold: 0.85,
            score_ceiling: 100.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchSource {
    Lexical,
    ModelKeyword,
}

/// One weighted hit that went into a raw score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreContribution {
    pub category: String,
    /// Taxonomy keyword that matched
    pub keyword: String,
    pub kind: MatchKind,
    pub source: MatchSource,
    pub points: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelevanceReport {
    /// Normalized score in [0, 100]
    pub score: u8,
    /// Sum of all contribution points
    pub raw: f64,
    pub contributions: Vec<ScoreContribution>,
    /// Model-extracted keywords that matched the taxonomy, in extraction order
    pub model_keywords: Vec<String>,
}

impl RelevanceReport {
    fn empty() -> Self {
        Self {
            score: 0,
            raw: 0.0,
            contributions: Vec::new(),
            model_keywords: Vec::new(),
        }
    }
}

struct TaxonomyEntry {
    category: String,
    keyword: String,
    prepared: PreparedText,
    weight: f64,
}

pub struct RelevanceScorer {
    entries: Vec<TaxonomyEntry>,
    settings: ScorerSettings,
}

impl RelevanceScorer {
    pub fn new(taxonomy: &KeywordTaxonomy, settings: ScorerSettings) -> Self {
        let entries = taxonomy
            .categories()
            .iter()
            .flat_map(|category| {
                category.keywords.iter().map(|keyword| TaxonomyEntry {
                    category: category.name.clone(),
                    keyword: keyword.clone(),
                    prepared: PreparedText::new(keyword),
                    weight: category.weight,
                })
            })
            .collect();
        Self { entries, settings }
    }

    /// Score a description. `model_keywords` is `None` when keyword generation is off.
    ///
    /// An empty or whitespace-only description scores 0 and reports no keywords.
    pub fn score(&self, description: &str, model_keywords: Option<&[String]>) -> RelevanceReport {
        let text = PreparedText::new(description);
        if text.is_empty() {
            return RelevanceReport::empty();
        }

        let mut contributions = self.lexical_contributions(&text);
        let mut matched_model_keywords = Vec::new();
        if let Some(extracted) = model_keywords {
            for (keyword, contribution) in self.model_keyword_contributions(extracted) {
                matched_model_keywords.push(keyword);
                contributions.push(contribution);
            }
        }

        let raw: f64 = contributions.iter().map(|c| c.points).sum();
        let score = self.normalize(raw);
        debug!(
            raw,
            score,
            hits = contributions.len(),
            model_hits = matched_model_keywords.len(),
            "description scored"
        );

        RelevanceReport {
            score,
            raw,
            contributions,
            model_keywords: matched_model_keywords,
        }
    }

    fn lexical_contributions(&self, text: &PreparedText) -> Vec<ScoreContribution> {
        self.entries
            .iter()
            .filter_map(|entry| {
                let kind = match_keyword(text, &entry.prepared, self.settings.fuzzy_threshold)?;
                Some(ScoreContribution {
                    category: entry.category.clone(),
                    keyword: entry.keyword.clone(),
                    kind,
                    source: MatchSource::Lexical,
                    points: entry.weight,
                })
            })
            .collect()
    }

    /// Match each distinct extracted keyword to at most one taxonomy entry: the first
    /// exact match in taxonomy order, otherwise the first fuzzy match.
    fn model_keyword_contributions(&self, extracted: &[String]) -> Vec<(String, ScoreContribution)> {
        let mut seen: Vec<String> = Vec::new();
        let mut out = Vec::new();

        for raw in extracted {
            let keyword = raw.trim();
            let folded = keyword.to_lowercase();
            if keyword.is_empty() || seen.contains(&folded) {
                continue;
            }
            seen.push(folded);

            let candidate = PreparedText::new(keyword);
            let mut fuzzy: Option<&TaxonomyEntry> = None;
            let mut exact: Option<&TaxonomyEntry> = None;
            for entry in &self.entries {
                match match_keyword(&candidate, &entry.prepared, self.settings.keyword_fuzzy_threshold) {
                    Some(MatchKind::Exact) => {
                        exact = Some(entry);
                        break;
                    }
                    Some(MatchKind::Fuzzy) if fuzzy.is_none() => fuzzy = Some(entry),
                    _ => {}
                }
            }

            let hit = exact
                .map(|e| (e, MatchKind::Exact))
                .or_else(|| fuzzy.map(|e| (e, MatchKind::Fuzzy)));
            if let Some((entry, kind)) = hit {
                out.push((
                    keyword.to_string(),
                    ScoreContribution {
                        category: entry.category.clone(),
                        keyword: entry.keyword.clone(),
                        kind,
                        source: MatchSource::ModelKeyword,
                        points: entry.weight * MODEL_KEYWORD_MULTIPLIER,
                    },
                ));
            }
        }
        out
    }

    /// Map a raw score onto [0, 100] using the configured ceiling.
    pub fn normalize(&self, raw: f64) -> u8 {
        if !raw.is_finite() || raw <= 0.0 || self.settings.score_ceiling <= 0.0 {
            return 0;
        }
        let scaled = (raw * 100.0 / self.settings.score_ceiling).round();
        scaled.clamp(0.0, 100.0) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO: &str =
        "This project explores electric heating and carbon capture for industrial furnaces.";

    fn scenario_taxonomy() -> KeywordTaxonomy {
        KeywordTaxonomy::from_json(
            r#"{
                "electrification": {"keywords": ["electrify", "electric heating"], "weight": 30},
                "ccs": {"keywords": ["carbon capture"], "weight": 20}
            }"#,
        )
        .unwrap()
    }

    fn scorer() -> RelevanceScorer {
        RelevanceScorer::new(&scenario_taxonomy(), ScorerSettings::default())
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn scenario_counts_each_category_once() {
        let report = scorer().score(SCENARIO, None);
        assert_eq!(report.raw, 50.0);
        assert_eq!(report.score, 50);

        let hits: Vec<(&str, &str, MatchKind)> = report
            .contributions
            .iter()
            .map(|c| (c.category.as_str(), c.keyword.as_str(), c.kind))
            .collect();
        assert_eq!(
            hits,
            [
                ("ccs", "carbon capture", MatchKind::Exact),
                ("electrification", "electric heating", MatchKind::Exact),
            ]
        );
        assert!(report.model_keywords.is_empty());
    }

    #[test]
    fn repeated_keyword_counts_once() {
        let text = "Carbon capture here, carbon capture there, CARBON CAPTURE everywhere.";
        let report = scorer().score(text, None);
        assert_eq!(report.raw, 20.0);
        assert_eq!(report.contributions.len(), 1);
    }

    #[test]
    fn exact_match_suppresses_fuzzy_contribution() {
        // Exact "carbon capture" plus a near miss "carbon captures" in the same text.
        let text = "carbon capture trials and carbon captures at two sites";
        let report = scorer().score(text, None);
        let ccs: Vec<_> = report.contributions.iter().filter(|c| c.category == "ccs").collect();
        assert_eq!(ccs.len(), 1);
        assert_eq!(ccs[0].kind, MatchKind::Exact);
    }

    #[test]
    fn fuzzy_match_contributes_when_no_exact() {
        let taxonomy = KeywordTaxonomy::from_json(
            r#"{"policy": {"keywords": ["decarbonization"], "weight": 40}}"#,
        )
        .unwrap();
        let report = RelevanceScorer::new(&taxonomy, ScorerSettings::default())
            .score("The decarbonisation of process heat.", None);
        assert_eq!(report.score, 40);
        assert_eq!(report.contributions[0].kind, MatchKind::Fuzzy);
    }

    #[test]
    fn empty_description_scores_zero() {
        let s = scorer();
        for text in ["", "   \n\t "] {
            let report = s.score(text, Some(&strings(&["carbon capture"])));
            assert_eq!(report.score, 0);
            assert!(report.contributions.is_empty());
            assert!(report.model_keywords.is_empty());
        }
    }

    #[test]
    fn model_keywords_add_double_weight() {
        let extracted = strings(&["carbon capture and storage", "industrial furnaces"]);
        let report = scorer().score(SCENARIO, Some(&extracted));
        // 50 lexical + 2 * 20 for the ccs model keyword
        assert_eq!(report.raw, 90.0);
        assert_eq!(report.score, 90);
        assert_eq!(report.model_keywords, ["carbon capture and storage"]);

        let model: Vec<_> = report
            .contributions
            .iter()
            .filter(|c| c.source == MatchSource::ModelKeyword)
            .collect();
        assert_eq!(model.len(), 1);
        assert_eq!(model[0].points, 40.0);
    }

    #[test]
    fn duplicate_model_keywords_count_once() {
        let extracted = strings(&["Carbon Capture", "carbon capture ", "carbon capture"]);
        let report = scorer().score("A furnace study.", Some(&extracted));
        assert_eq!(report.raw, 40.0);
        assert_eq!(report.model_keywords, ["Carbon Capture"]);
    }

    #[test]
    fn model_keyword_prefers_exact_over_earlier_fuzzy() {
        let taxonomy = KeywordTaxonomy::from_json(
            r#"{
                "a_storage": {"keywords": ["heat storages"], "weight": 10},
                "b_storage": {"keywords": ["heat storage"], "weight": 25}
            }"#,
        )
        .unwrap();
        let s = RelevanceScorer::new(&taxonomy, ScorerSettings::default());
        // "heat storage" fuzzy-matches "heat storages" (earlier) and exactly matches
        // "heat storage" (later); the exact entry wins.
        let report = s.score("unrelated words", Some(&strings(&["heat storage"])));
        assert_eq!(report.raw, 50.0);
        assert_eq!(report.contributions[0].category, "b_storage");
        assert_eq!(report.contributions[0].kind, MatchKind::Exact);
    }

    #[test]
    fn enabling_model_keywords_never_lowers_score() {
        let s = scorer();
        let cases = [
            (SCENARIO, strings(&["furnaces"])),
            (SCENARIO, strings(&["carbon capture", "electric heating", "electrify"])),
            ("Nothing relevant at all.", strings(&["bananas"])),
            ("Nothing relevant at all.", Vec::new()),
        ];
        for (text, extracted) in cases {
            let without = s.score(text, None).score;
            let with = s.score(text, Some(&extracted)).score;
            assert!(with >= without, "{text}: {with} < {without}");
        }
    }

    #[test]
    fn score_is_clamped_to_100() {
        let extracted = strings(&["carbon capture", "electric heating", "electrification"]);
        let report = scorer().score(SCENARIO, Some(&extracted));
        assert!(report.raw > 100.0);
        assert_eq!(report.score, 100);
    }

    #[test]
    fn ceiling_scales_raw_score() {
        let settings = ScorerSettings {
            score_ceiling: 50.0,
            ..ScorerSettings::default()
        };
        let s = RelevanceScorer::new(&scenario_taxonomy(), settings);
        assert_eq!(s.score("carbon capture", None).score, 40);
        assert_eq!(s.normalize(12.3), 25);
        assert_eq!(s.normalize(0.0), 0);
        assert_eq!(s.normalize(f64::NAN), 0);
        assert_eq!(s.normalize(1e9), 100);
    }
}
