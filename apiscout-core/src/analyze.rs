use crate::inventory::ApiType;
use apiscout_scanner::links::is_api_like_url;
use std::collections::BTreeMap;

/// A page qualifies as API-related when its relevance score exceeds this.
pub const RELEVANCE_THRESHOLD: f64 = 0.2;

const URL_PATTERN_BONUS: f64 = 0.2;

/// Ordered keyword lists, one per category. Matching is deliberately
/// plain case-insensitive substring search: the heuristic stays auditable
/// and the thresholds were tuned against it.
#[derive(Debug, Clone)]
pub struct KeywordTaxonomy {
    categories: Vec<(String, Vec<String>)>,
}

impl KeywordTaxonomy {
    pub fn new() -> Self {
        let categories = vec![
            (
                "general".to_string(),
                string_vec(&[
                    "psd2",
                    "open banking",
                    "openbanking",
                    "api portal",
                    "developer portal",
                    "api documentation",
                    "api sandbox",
                    "tpp",
                    "third party provider",
                    "berlin group",
                    "nextgenpsd2",
                    "stet",
                    "open bank project",
                    "oauth",
                    "oauth2",
                    "openid connect",
                    "client credentials",
                    "xs2a",
                    "access to account",
                ]),
            ),
            (
                "ais".to_string(),
                string_vec(&[
                    "account information",
                    "ais api",
                    "account access",
                    "balance",
                    "transaction history",
                    "account list",
                    "aisp",
                    "account information service",
                    "read account",
                    "get accounts",
                    "/accounts",
                    "/balances",
                    "/transactions",
                ]),
            ),
            (
                "pis".to_string(),
                string_vec(&[
                    "payment initiation",
                    "pis api",
                    "pisp",
                    "initiate payment",
                    "payment service",
                    "sepa payment",
                    "instant payment",
                    "bulk payment",
                    "payment submission",
                    "/payments",
                    "/payment-initiations",
                    "domestic payment",
                    "international payment",
                ]),
            ),
            (
                "caf".to_string(),
                string_vec(&[
                    "confirmation of funds",
                    "caf api",
                    "funds confirmation",
                    "piis",
                    "card based payment",
                    "fundsconfirmation",
                    "/funds-confirmations",
                    "available funds",
                ]),
            ),
            (
                "technical".to_string(),
                string_vec(&[
                    "swagger",
                    "openapi",
                    "api specification",
                    "rest api",
                    "json api",
                    "postman",
                    "api reference",
                    "api explorer",
                    "try it out",
                    "sandbox environment",
                    "test environment",
                    "production api",
                ]),
            ),
        ];

        Self { categories }
    }

    /// Append user-supplied keywords to their categories. Unknown
    /// category names become new categories with zero score weight.
    pub fn with_extra(mut self, extra: &BTreeMap<String, Vec<String>>) -> Self {
        for (category, keywords) in extra {
            match self
                .categories
                .iter_mut()
                .find(|(name, _)| name == category)
            {
                Some((_, list)) => {
                    for kw in keywords {
                        let kw = kw.to_lowercase();
                        if !list.contains(&kw) {
                            list.push(kw);
                        }
                    }
                }
                None => {
                    self.categories.push((
                        category.clone(),
                        keywords.iter().map(|k| k.to_lowercase()).collect(),
                    ));
                }
            }
        }
        self
    }

    pub fn categories(&self) -> &[(String, Vec<String>)] {
        &self.categories
    }
}

impl Default for KeywordTaxonomy {
    fn default() -> Self {
        Self::new()
    }
}

fn string_vec(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn category_weight(category: &str) -> f64 {
    match category {
        "general" => 0.30,
        "ais" => 0.25,
        "pis" => 0.25,
        "caf" => 0.20,
        "technical" => 0.20,
        _ => 0.0,
    }
}

/// What the scorer and classifier concluded about one page. Transient:
/// produced per page, consumed by record extraction, never persisted.
#[derive(Debug, Clone)]
pub struct PageAnalysis {
    pub url: String,
    pub title: String,
    /// `category:keyword` tags, taxonomy order, each keyword once.
    pub keywords_found: Vec<String>,
    pub relevance_score: f64,
    pub api_types: Vec<ApiType>,
    pub is_api_related: bool,
}

/// Score and classify one page. Deterministic: the same
/// (text, url, title) always yields the same analysis.
pub fn analyze_page(taxonomy: &KeywordTaxonomy, text: &str, url: &str, title: &str) -> PageAnalysis {
    let haystack = text.to_lowercase();

    let mut keywords_found = Vec::new();
    let mut matched_categories = Vec::new();

    for (category, keywords) in taxonomy.categories() {
        let mut any = false;
        for keyword in keywords {
            if haystack.contains(keyword.as_str()) {
                keywords_found.push(format!("{}:{}", category, keyword));
                any = true;
            }
        }
        if any {
            matched_categories.push(category.as_str());
        }
    }

    let mut score: f64 = matched_categories.iter().map(|c| category_weight(c)).sum();
    if is_api_like_url(url) {
        score += URL_PATTERN_BONUS;
    }
    let relevance_score = score.clamp(0.0, 1.0);

    let api_types = classify(&matched_categories);

    PageAnalysis {
        url: url.to_string(),
        title: title.to_string(),
        keywords_found,
        relevance_score,
        api_types,
        is_api_related: relevance_score > RELEVANCE_THRESHOLD,
    }
}

/// One type per specific category with evidence; general-only evidence
/// classifies as plain PSD2; no evidence, no types.
fn classify(matched_categories: &[&str]) -> Vec<ApiType> {
    let mut types = Vec::new();

    if matched_categories.contains(&"ais") {
        types.push(ApiType::Ais);
    }
    if matched_categories.contains(&"pis") {
        types.push(ApiType::Pis);
    }
    if matched_categories.contains(&"caf") {
        types.push(ApiType::Caf);
    }

    if types.is_empty() && matched_categories.contains(&"general") {
        types.push(ApiType::Psd2);
    }

    types
}
