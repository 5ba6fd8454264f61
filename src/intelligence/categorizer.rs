// Sorts task text into categories
//
// Plain substring matching against the keyword taxonomy. No tokenizing,
// because most task text is Chinese and has no spaces to split on.

use crate::config::Taxonomy;

/// Tag returned when nothing matches
pub const OTHER_TAG: &str = "other";

pub struct Categorizer {
    taxonomy: Taxonomy,
}

impl Categorizer {
    pub fn new(taxonomy: Taxonomy) -> Self {
        Self { taxonomy }
    }

    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    /// Every category whose keywords appear in the text, in taxonomy order.
    /// Never empty: falls back to `["other"]`.
    pub fn categorize(&self, text: &str) -> Vec<String> {
        let lower = text.to_lowercase();

        let tags: Vec<String> = self
            .taxonomy
            .categories
            .iter()
            .filter(|category| category.keywords.iter().any(|k| lower.contains(k.as_str())))
            .map(|category| category.tag.clone())
            .collect();

        if tags.is_empty() {
            vec![OTHER_TAG.to_string()]
        } else {
            tags
        }
    }

    /// Does the text contain any urgent keyword
    pub fn is_urgent(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.taxonomy
            .urgent_keywords()
            .iter()
            .any(|k| lower.contains(k.as_str()))
    }
}

impl Default for Categorizer {
    fn default() -> Self {
        Self::new(Taxonomy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CategoryRule;

    #[test]
    fn test_single_category() {
        let categorizer = Categorizer::default();
        assert_eq!(categorizer.categorize("准备会议材料"), vec!["work"]);
        assert_eq!(categorizer.categorize("去健身房"), vec!["health"]);
    }

    #[test]
    fn test_multiple_categories_in_taxonomy_order() {
        let categorizer = Categorizer::default();
        // 紧急 (urgent) comes before 报告 (work) in the text
        assert_eq!(categorizer.categorize("紧急：提交报告"), vec!["work", "urgent"]);
    }

    #[test]
    fn test_no_match_is_other() {
        let categorizer = Categorizer::default();
        assert_eq!(categorizer.categorize("walk the dog"), vec![OTHER_TAG]);
        assert_eq!(categorizer.categorize(""), vec![OTHER_TAG]);
    }

    #[test]
    fn test_deterministic() {
        let categorizer = Categorizer::default();
        let text = "周末旅行，订票和酒店";
        assert_eq!(categorizer.categorize(text), categorizer.categorize(text));
    }

    #[test]
    fn test_case_insensitive_with_custom_taxonomy() {
        let taxonomy = Taxonomy {
            categories: vec![
                CategoryRule {
                    tag: "code".to_string(),
                    display_name: "Code".to_string(),
                    keywords: vec!["rust".to_string(), "review".to_string()],
                },
                CategoryRule {
                    tag: "urgent".to_string(),
                    display_name: "Urgent".to_string(),
                    keywords: vec!["asap".to_string()],
                },
            ],
            urgent_tag: "urgent".to_string(),
        };
        let categorizer = Categorizer::new(taxonomy);

        assert_eq!(categorizer.categorize("Review the RUST PR"), vec!["code"]);
        assert!(categorizer.is_urgent("ship it ASAP"));
        assert!(!categorizer.is_urgent("ship it later"));
    }

    #[test]
    fn test_is_urgent_default_keywords() {
        let categorizer = Categorizer::default();
        assert!(categorizer.is_urgent("今天必须交房租"));
        assert!(categorizer.is_urgent("马上回复邮件"));
        assert!(!categorizer.is_urgent("看电影"));
    }
}
