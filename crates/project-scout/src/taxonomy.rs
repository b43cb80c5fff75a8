/// Keyword taxonomy: named categories of keywords, each with one weight.
///
/// File format (JSON):
///
/// ```json
/// {
///   "electrification": { "keywords": ["electrify", "electric heating"], "weight": 30 },
///   "ccs": { "keywords": ["carbon capture"], "weight": 20 }
/// }
/// ```
///
/// `synonyms` and `score` are accepted as aliases for `keywords` and `weight`.
/// Categories are kept sorted by name so scoring order is deterministic.
use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::AppError;

#[derive(Debug, Deserialize)]
struct RawCategory {
    #[serde(default, alias = "synonyms")]
    keywords: Vec<String>,
    #[serde(alias = "score")]
    weight: Option<f64>,
}

/// A named group of keywords sharing one weight.
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub name: String,
    pub keywords: Vec<String>,
    pub weight: f64,
}

#[derive(Debug, Clone)]
pub struct KeywordTaxonomy {
    categories: Vec<Category>,
}

impl KeywordTaxonomy {
    /// Read and validate a taxonomy file. Any problem is a configuration error.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::Taxonomy(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_json(&content)
            .map_err(|e| AppError::Taxonomy(format!("{}: {e}", path.display())))
    }

    pub fn from_json(content: &str) -> Result<Self, AppError> {
        let raw: BTreeMap<String, RawCategory> = serde_json::from_str(content)
            .map_err(|e| AppError::Taxonomy(format!("invalid taxonomy JSON: {e}")))?;

        let mut categories = Vec::with_capacity(raw.len());
        for (name, entry) in raw {
            let weight = entry.weight.ok_or_else(|| {
                AppError::Taxonomy(format!("category '{name}' has no weight"))
            })?;
            categories.push(Category {
                name,
                keywords: entry.keywords,
                weight,
            });
        }
        Self::from_categories(categories)
    }

    /// Validate categories and normalize their keyword lists.
    ///
    /// Keywords are trimmed and de-duplicated case-insensitively within a category,
    /// keeping the first spelling.
    pub fn from_categories(categories: Vec<Category>) -> Result<Self, AppError> {
        if categories.is_empty() {
            return Err(AppError::Taxonomy("taxonomy has no categories".to_string()));
        }

        let mut validated = Vec::with_capacity(categories.len());
        for category in categories {
            let name = category.name.trim().to_string();
            if name.is_empty() {
                return Err(AppError::Taxonomy("category with an empty name".to_string()));
            }
            if !category.weight.is_finite() || category.weight < 0.0 {
                return Err(AppError::Taxonomy(format!(
                    "category '{name}' has invalid weight {}",
                    category.weight
                )));
            }

            let mut keywords: Vec<String> = Vec::with_capacity(category.keywords.len());
            for keyword in &category.keywords {
                let keyword = keyword.trim();
                if keyword.is_empty() {
                    return Err(AppError::Taxonomy(format!(
                        "category '{name}' contains an empty keyword"
                    )));
                }
                if !keywords.iter().any(|k| k.eq_ignore_ascii_case(keyword)) {
                    keywords.push(keyword.to_string());
                }
            }
            if keywords.is_empty() {
                return Err(AppError::Taxonomy(format!("category '{name}' has no keywords")));
            }

            validated.push(Category {
                name,
                keywords,
                weight: category.weight,
            });
        }

        validated.sort_by(|a, b| a.name.cmp(&b.name));
        if let Some(pair) = validated.windows(2).find(|w| w[0].name == w[1].name) {
            return Err(AppError::Taxonomy(format!(
                "category '{}' is defined twice",
                pair[0].name
            )));
        }

        Ok(Self {
            categories: validated,
        })
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn keyword_count(&self) -> usize {
        self.categories.iter().map(|c| c.keywords.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_sorts_categories() {
        let json = r#"{
            "electrification": {"keywords": ["electrify", "electric heating"], "weight": 30},
            "ccs": {"keywords": ["carbon capture"], "weight": 20}
        }"#;
        let taxonomy = KeywordTaxonomy::from_json(json).unwrap();
        let names: Vec<&str> = taxonomy.categories().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["ccs", "electrification"]);
        assert_eq!(taxonomy.categories()[1].keywords, ["electrify", "electric heating"]);
        assert_eq!(taxonomy.categories()[0].weight, 20.0);
        assert_eq!(taxonomy.keyword_count(), 3);
    }

    #[test]
    fn accepts_synonyms_and_score_aliases() {
        let json = r#"{"heat": {"synonyms": ["heat pump", "waste heat"], "score": 15}}"#;
        let taxonomy = KeywordTaxonomy::from_json(json).unwrap();
        let heat = &taxonomy.categories()[0];
        assert_eq!(heat.keywords, ["heat pump", "waste heat"]);
        assert_eq!(heat.weight, 15.0);
    }

    #[test]
    fn trims_and_dedupes_keywords() {
        let json = r#"{"heat": {"keywords": [" Heat Pump ", "heat pump", "boiler"], "weight": 5}}"#;
        let taxonomy = KeywordTaxonomy::from_json(json).unwrap();
        assert_eq!(taxonomy.categories()[0].keywords, ["Heat Pump", "boiler"]);
    }

    #[test]
    fn rejects_missing_weight() {
        let err = KeywordTaxonomy::from_json(r#"{"heat": {"keywords": ["boiler"]}}"#).unwrap_err();
        assert!(err.to_string().contains("no weight"), "{err}");
    }

    #[test]
    fn rejects_negative_weight() {
        let err = KeywordTaxonomy::from_json(r#"{"heat": {"keywords": ["boiler"], "weight": -1}}"#)
            .unwrap_err();
        assert!(err.to_string().contains("invalid weight"), "{err}");
    }

    #[test]
    fn rejects_empty_keyword_lists_and_blank_keywords() {
        assert!(KeywordTaxonomy::from_json(r#"{"heat": {"keywords": [], "weight": 1}}"#).is_err());
        assert!(KeywordTaxonomy::from_json(r#"{"heat": {"weight": 1}}"#).is_err());
        assert!(KeywordTaxonomy::from_json(r#"{"heat": {"keywords": ["  "], "weight": 1}}"#).is_err());
    }

    #[test]
    fn rejects_empty_and_malformed_documents() {
        assert!(KeywordTaxonomy::from_json("{}").is_err());
        assert!(KeywordTaxonomy::from_json("[1, 2]").is_err());
        assert!(KeywordTaxonomy::from_json("not json").is_err());
    }

    #[test]
    fn rejects_duplicate_names_after_trimming() {
        let categories = vec![
            Category {
                name: "heat".to_string(),
                keywords: vec!["boiler".to_string()],
                weight: 1.0,
            },
            Category {
                name: " heat ".to_string(),
                keywords: vec!["furnace".to_string()],
                weight: 2.0,
            },
        ];
        let err = KeywordTaxonomy::from_categories(categories).unwrap_err();
        assert!(err.to_string().contains("defined twice"), "{err}");
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = KeywordTaxonomy::load(&dir.path().join("keywords.json")).unwrap_err();
        assert!(matches!(err, AppError::Taxonomy(_)));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keywords.json");
        std::fs::write(&path, r#"{"ccs": {"keywords": ["carbon capture"], "weight": 20}}"#).unwrap();
        let taxonomy = KeywordTaxonomy::load(&path).unwrap();
        assert_eq!(taxonomy.categories().len(), 1);
    }
}
