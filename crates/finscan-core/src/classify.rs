//! Keyword-based page classification.

use regex::Regex;
use tracing::{debug, warn};

use crate::error::{FinscanError, Result};
use crate::fuzzy::partial_ratio;
use crate::models::config::{ClassificationConfig, MatchMode};
use crate::models::page::OcrPage;
use crate::models::record::{Category, CategoryTable, ClassificationResult};

#[derive(Debug, Clone)]
struct Keyword {
    phrase: String,
    pattern: Regex,
}

impl Keyword {
    fn compile(phrase: &str) -> Result<Self> {
        let phrase = phrase.trim().to_lowercase();
        let pattern = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(&phrase))).map_err(|e| {
            FinscanError::Keyword {
                keyword: phrase.clone(),
                source: e,
            }
        })?;
        Ok(Self { phrase, pattern })
    }
}

/// Assigns a [`Category`] to page text from keyword evidence.
///
/// Scores are computed for every scored category; the highest wins and equal
/// scores go to the category declared first (bank statement, check, salary
/// slip). Without enough evidence the page is [`Category::Other`].
#[derive(Debug, Clone)]
pub struct Classifier {
    mode: MatchMode,
    threshold: f64,
    keywords: CategoryTable<Vec<Keyword>>,
}

impl Classifier {
    pub fn new(config: &ClassificationConfig) -> Result<Self> {
        let keywords = config.keywords.try_map(|_, phrases| {
            phrases
                .iter()
                .filter(|p| !p.trim().is_empty())
                .map(|p| Keyword::compile(p))
                .collect::<Result<Vec<_>>>()
        })?;

        if config.mode == MatchMode::Fuzzy && config.threshold <= 1.0 {
            warn!(
                "Fuzzy classification threshold {} is compared against 0-100 scores; almost every page will pass it",
                config.threshold
            );
        }

        Ok(Self {
            mode: config.mode,
            threshold: config.threshold,
            keywords,
        })
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    /// Score of every scored category for `text`.
    pub fn scores(&self, text: &str) -> CategoryTable<f64> {
        let text = text.to_lowercase();

        CategoryTable {
            bank_statement: self.score(&text, &self.keywords.bank_statement),
            check: self.score(&text, &self.keywords.check),
            salary_slip: self.score(&text, &self.keywords.salary_slip),
        }
    }

    fn score(&self, text: &str, keywords: &[Keyword]) -> f64 {
        if keywords.is_empty() {
            return 0.0;
        }

        match self.mode {
            MatchMode::Exact => keywords
                .iter()
                .map(|k| k.pattern.find_iter(text).count())
                .sum::<usize>() as f64,
            MatchMode::Fuzzy => {
                let total: f64 = keywords.iter().map(|k| partial_ratio(text, &k.phrase)).sum();
                total / keywords.len() as f64
            }
        }
    }

    /// Classify normalized page text.
    pub fn classify(&self, text: &str) -> ClassificationResult {
        if text.trim().is_empty() {
            return ClassificationResult {
                page: None,
                category: Category::Other,
                score: 0.0,
            };
        }

        let scores = self.scores(text);

        let mut best = (Category::Other, 0.0f64);
        for (category, &score) in scores.entries() {
            // Strictly greater: the earlier category keeps a tie.
            if best.0 == Category::Other || score > best.1 {
                best = (category, score);
            }
        }

        let (category, score) = match self.mode {
            MatchMode::Exact if best.1 <= 0.0 => (Category::Other, 0.0),
            MatchMode::Fuzzy if best.1 < self.threshold => (Category::Other, best.1),
            _ => best,
        };

        debug!(
            "Scores bank_statement={} check={} salary_slip={} -> {}",
            scores.bank_statement, scores.check, scores.salary_slip, category
        );

        ClassificationResult {
            page: None,
            category,
            score,
        }
    }

    /// Classify a page by its normalized text.
    pub fn classify_page(&self, page: &OcrPage) -> ClassificationResult {
        ClassificationResult {
            page: Some(page.id.clone()),
            ..self.classify(&page.text())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn exact() -> Classifier {
        Classifier::new(&ClassificationConfig::default()).unwrap()
    }

    fn fuzzy(threshold: f64) -> Classifier {
        Classifier::new(&ClassificationConfig {
            mode: MatchMode::Fuzzy,
            threshold,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_bank_statement_keywords() {
        let classifier = exact();
        let text = "account number 12345 balance 200.00 transaction";

        let result = classifier.classify(text);
        assert_eq!(result.category, Category::BankStatement);
        assert_eq!(result.score, 3.0);

        let scores = classifier.scores(text);
        assert_eq!(scores.check, 0.0);
        assert_eq!(scores.salary_slip, 0.0);
    }

    #[test]
    fn test_repeated_keywords_count() {
        let result = exact().classify("Balance brought forward, balance carried forward");
        assert_eq!(result.category, Category::BankStatement);
        assert_eq!(result.score, 2.0);
    }

    #[test]
    fn test_tie_goes_to_first_declared_category() {
        // one bank keyword, one check keyword
        let result = exact().classify("memo deposit");
        assert_eq!(result.category, Category::BankStatement);
        assert_eq!(result.score, 1.0);

        // one check keyword, one salary keyword
        let result = exact().classify("memo income");
        assert_eq!(result.category, Category::Check);
    }

    #[test]
    fn test_word_boundaries() {
        let scores = exact().scores("the employees were paid");
        assert_eq!(scores.salary_slip, 0.0);

        let result = exact().classify("the employees were paid");
        assert_eq!(result.category, Category::Other);
        assert_eq!(result.score, 0.0);
    }

    #[test]
    fn test_no_evidence_is_other() {
        assert_eq!(exact().classify("").category, Category::Other);
        assert_eq!(exact().classify("   ").score, 0.0);
        assert_eq!(fuzzy(0.8).classify("").category, Category::Other);
    }

    #[test]
    fn test_fuzzy_mode() {
        let text = "net salary 5000 gross salary 6000 deduction 1000 pay period march \
                    employer acme employee jane income tax";
        let result = fuzzy(0.8).classify(text);
        assert_eq!(result.category, Category::SalarySlip);
        assert_eq!(result.score, 100.0);
    }

    #[test]
    fn test_fuzzy_below_threshold_keeps_score() {
        let result = fuzzy(90.0).classify("hello world");
        assert_eq!(result.category, Category::Other);
        assert!(result.score < 90.0);
    }

    #[test]
    fn test_classify_page_sets_id() {
        let page = OcrPage::from_lines(
            "page_2",
            ["Pay to the order of", "Memo: rent", "Check number 1001"],
        );
        let result = exact().classify_page(&page);
        assert_eq!(result.page.as_deref(), Some("page_2"));
        assert_eq!(result.category, Category::Check);
        assert_eq!(result.score, 3.0);
    }
}
