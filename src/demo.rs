//! Bundled demo dataset used when the API is not configured or unavailable.

use crate::tools::{Article, GlossaryEntry};

struct DemoArticle {
    id: &'static str,
    title: &'static str,
    category: &'static str,
    summary: &'static str,
    tags: &'static [&'static str],
}

struct DemoTerm {
    term: &'static str,
    definition: &'static str,
    related: &'static [&'static str],
}

const ARTICLES: &[DemoArticle] = &[
    DemoArticle {
        id: "kb-101",
        title: "Getting started with the Lookup API",
        category: "getting-started",
        summary: "Create a workspace, generate an API key and make your first search request.",
        tags: &["onboarding", "api key", "quickstart"],
    },
    DemoArticle {
        id: "kb-102",
        title: "Choosing a base URL",
        category: "getting-started",
        summary: "Regional endpoints, the /api/v1 prefix and why the base URL must include it.",
        tags: &["configuration", "endpoint", "region"],
    },
    DemoArticle {
        id: "kb-201",
        title: "Authenticating requests",
        category: "authentication",
        summary: "Send your key as a Bearer token; pre-formatted Basic and Token credentials are also accepted.",
        tags: &["bearer", "api key", "authorization header"],
    },
    DemoArticle {
        id: "kb-202",
        title: "Rotating API keys",
        category: "authentication",
        summary: "Issue a second key, roll it out, then revoke the old one without downtime.",
        tags: &["security", "api key", "rotation"],
    },
    DemoArticle {
        id: "kb-301",
        title: "Understanding rate limits",
        category: "limits",
        summary: "Requests are limited per key; a 429 response carries a retry-after header in seconds.",
        tags: &["429", "retry-after", "throttling"],
    },
    DemoArticle {
        id: "kb-302",
        title: "Request timeouts",
        category: "limits",
        summary: "Searches over large collections can take several seconds; tune client timeouts accordingly.",
        tags: &["timeout", "latency", "performance"],
    },
    DemoArticle {
        id: "kb-401",
        title: "Receiving webhooks",
        category: "integrations",
        summary: "Subscribe to article.published and article.updated events and verify their signatures.",
        tags: &["webhook", "events", "signature"],
    },
    DemoArticle {
        id: "kb-501",
        title: "Troubleshooting HTML responses",
        category: "troubleshooting",
        summary: "An HTML page instead of JSON usually means a wrong path, a login redirect or a proxy error page.",
        tags: &["html", "json", "misconfiguration", "proxy"],
    },
];

const GLOSSARY: &[DemoTerm] = &[
    DemoTerm {
        term: "API key",
        definition: "A secret string that identifies your workspace on every request.",
        related: &["Bearer token", "Rate limit"],
    },
    DemoTerm {
        term: "Bearer token",
        definition: "An Authorization header scheme where the credential follows the word 'Bearer'.",
        related: &["API key"],
    },
    DemoTerm {
        term: "Base URL",
        definition: "The scheme, host and shared path prefix every endpoint path is appended to.",
        related: &["Endpoint"],
    },
    DemoTerm {
        term: "Endpoint",
        definition: "A path below the base URL that accepts one kind of request, such as /search.",
        related: &["Base URL"],
    },
    DemoTerm {
        term: "Rate limit",
        definition: "The maximum number of requests a key may make in a time window before receiving 429.",
        related: &["Retry-After", "API key"],
    },
    DemoTerm {
        term: "Retry-After",
        definition: "A response header telling the client how many seconds to wait before retrying.",
        related: &["Rate limit"],
    },
    DemoTerm {
        term: "Webhook",
        definition: "An HTTP callback the service sends to your endpoint when an event happens.",
        related: &["Endpoint"],
    },
];

impl DemoArticle {
    fn to_article(&self) -> Article {
        Article {
            id: self.id.to_string(),
            title: self.title.to_string(),
            category: self.category.to_string(),
            summary: self.summary.to_string(),
            tags: self.tags.iter().map(ToString::to_string).collect(),
            url: Some(format!("https://kb.example.com/articles/{}", self.id)),
        }
    }

    fn matches(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self.summary.to_lowercase().contains(needle)
            || self.tags.iter().any(|t| t.to_lowercase().contains(needle))
    }
}

impl DemoTerm {
    fn to_entry(&self) -> GlossaryEntry {
        GlossaryEntry {
            term: self.term.to_string(),
            definition: self.definition.to_string(),
            related: self.related.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Every demo article.
pub fn articles() -> Vec<Article> {
    ARTICLES.iter().map(DemoArticle::to_article).collect()
}

/// Case-insensitive search over title, summary and tags.
///
/// Every whitespace-separated word of `query` must match somewhere.
pub fn search(query: &str, category: Option<&str>, limit: usize) -> Vec<Article> {
    let words: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
    ARTICLES
        .iter()
        .filter(|a| category.is_none_or(|c| a.category.eq_ignore_ascii_case(c)))
        .filter(|a| words.iter().all(|w| a.matches(w)))
        .take(limit)
        .map(DemoArticle::to_article)
        .collect()
}

pub fn article(id: &str) -> Option<Article> {
    ARTICLES
        .iter()
        .find(|a| a.id.eq_ignore_ascii_case(id.trim()))
        .map(DemoArticle::to_article)
}

/// Articles worth offering when `id` does not exist: same id family first,
/// then the first few articles.
pub fn suggest_articles(id: &str, max: usize) -> Vec<Article> {
    let family: String = id.trim().to_lowercase().chars().take(4).collect();
    let mut picks: Vec<Article> = ARTICLES
        .iter()
        .filter(|a| !family.is_empty() && a.id.starts_with(&family))
        .take(max)
        .map(DemoArticle::to_article)
        .collect();
    if picks.is_empty() {
        picks = ARTICLES.iter().take(max).map(DemoArticle::to_article).collect();
    }
    picks
}

/// `(category, article count)` in first-seen order.
pub fn categories() -> Vec<(String, usize)> {
    let mut out: Vec<(String, usize)> = Vec::new();
    for a in ARTICLES {
        match out.iter_mut().find(|(name, _)| name == a.category) {
            Some((_, count)) => *count += 1,
            None => out.push((a.category.to_string(), 1)),
        }
    }
    out
}

/// Exact (case-insensitive) glossary match.
pub fn define(term: &str) -> Option<GlossaryEntry> {
    let term = term.trim();
    GLOSSARY
        .iter()
        .find(|t| t.term.eq_ignore_ascii_case(term))
        .map(DemoTerm::to_entry)
}

/// Glossary terms that share a word with `term`, or all terms if none do.
pub fn similar_terms(term: &str) -> Vec<String> {
    let words: Vec<String> = term.split_whitespace().map(str::to_lowercase).collect();
    let close: Vec<String> = GLOSSARY
        .iter()
        .filter(|t| {
            let lower = t.term.to_lowercase();
            words.iter().any(|w| lower.contains(w.as_str()))
        })
        .map(|t| t.term.to_string())
        .collect();
    if close.is_empty() {
        GLOSSARY.iter().map(|t| t.term.to_string()).collect()
    } else {
        close
    }
}
