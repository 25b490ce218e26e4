//! Digest entity structures.
//!
//! The digest schema: topic sections, each holding analyzed articles with
//! quality and bias findings attached. These are the payloads the storage
//! layer persists; generation lives in the agent pipeline.

use crate::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// ENUMS
// ============================================================================

/// Article content format as detected at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArticleFormat {
    Html,
    Pdf,
    Plaintext,
    Markdown,
    Unknown,
}

/// Editorial category of an article.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentType {
    News,
    Opinion,
    Analysis,
    Research,
    PressRelease,
    Blog,
    Social,
    Unknown,
}

/// Detected bias direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BiasDirection {
    Left,
    CenterLeft,
    Center,
    CenterRight,
    Right,
    Unknown,
}

/// How one article relates to another in cross-story analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionType {
    Supports,
    Contradicts,
    Extends,
    ProvidesContext,
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            ContentType::News => "news",
            ContentType::Opinion => "opinion",
            ContentType::Analysis => "analysis",
            ContentType::Research => "research",
            ContentType::PressRelease => "press_release",
            ContentType::Blog => "blog",
            ContentType::Social => "social",
            ContentType::Unknown => "unknown",
        };
        write!(f, "{}", value)
    }
}

impl FromStr for ContentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "news" => Ok(ContentType::News),
            "opinion" => Ok(ContentType::Opinion),
            "analysis" => Ok(ContentType::Analysis),
            "research" => Ok(ContentType::Research),
            "press_release" => Ok(ContentType::PressRelease),
            "blog" => Ok(ContentType::Blog),
            "social" => Ok(ContentType::Social),
            "unknown" => Ok(ContentType::Unknown),
            _ => Err(format!("Invalid ContentType: {}", s)),
        }
    }
}

impl fmt::Display for BiasDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            BiasDirection::Left => "left",
            BiasDirection::CenterLeft => "center_left",
            BiasDirection::Center => "center",
            BiasDirection::CenterRight => "center_right",
            BiasDirection::Right => "right",
            BiasDirection::Unknown => "unknown",
        };
        write!(f, "{}", value)
    }
}

impl FromStr for BiasDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(BiasDirection::Left),
            "center_left" => Ok(BiasDirection::CenterLeft),
            "center" => Ok(BiasDirection::Center),
            "center_right" => Ok(BiasDirection::CenterRight),
            "right" => Ok(BiasDirection::Right),
            "unknown" => Ok(BiasDirection::Unknown),
            _ => Err(format!("Invalid BiasDirection: {}", s)),
        }
    }
}

// ============================================================================
// ARTICLES
// ============================================================================

/// Article URL with metadata from search results.
/// Represents a discovered article before fetching and parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleUrl {
    pub url: String,
    pub title: String,
    pub source: String,
    pub snippet: String,
    pub published_date: Option<Timestamp>,
    pub initial_relevance_score: f32,
    pub topic: Option<String>,
    pub search_rank: u32,
}

impl ArticleUrl {
    /// Extract the domain from the URL, falling back to the source name
    /// when the URL has no recognizable authority component.
    pub fn domain(&self) -> &str {
        domain_of(&self.url).unwrap_or(&self.source)
    }
}

/// Parsed article with full content and extraction metadata.
/// Represents an article after a successful fetch and parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedArticle {
    pub article_id: String,
    pub url: String,
    pub title: String,
    pub content: String,
    pub authors: Vec<String>,
    pub published_date: Option<Timestamp>,
    pub source: String,
    pub word_count: usize,
    pub reading_time_minutes: usize,
    pub format: ArticleFormat,
    pub language: String,
    pub topic: Option<String>,
    /// 0-1 score of parse quality.
    pub parse_quality: f32,
}

/// Average reading speed used to derive reading time.
const WORDS_PER_MINUTE: usize = 225;

impl ParsedArticle {
    /// Build a parsed article, deriving word count and reading time from
    /// the content.
    pub fn new(
        article_id: impl Into<String>,
        url: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        let content = content.into();
        let word_count = content.split_whitespace().count();
        let reading_time_minutes = if word_count == 0 {
            0
        } else {
            (word_count / WORDS_PER_MINUTE).max(1)
        };
        Self {
            article_id: article_id.into(),
            url: url.into(),
            title: title.into(),
            content,
            authors: Vec::new(),
            published_date: None,
            source: String::new(),
            word_count,
            reading_time_minutes,
            format: ArticleFormat::Html,
            language: "en".to_string(),
            topic: None,
            parse_quality: 0.0,
        }
    }

    /// First 200 characters of content, with an ellipsis when truncated.
    pub fn content_preview(&self) -> String {
        let mut preview: String = self.content.chars().take(200).collect();
        if self.content.chars().count() > 200 {
            preview.push_str("...");
        }
        preview
    }

    /// Extract the domain from the URL, falling back to the source name.
    pub fn domain(&self) -> &str {
        domain_of(&self.url).unwrap_or(&self.source)
    }
}

/// Authority component of a URL, without any leading `www.`.
fn domain_of(url: &str) -> Option<&str> {
    let rest = url.split_once("://").map(|(_, r)| r)?;
    let host = rest.split(['/', '?', '#']).next()?;
    if host.is_empty() {
        return None;
    }
    Some(host.strip_prefix("www.").unwrap_or(host))
}

// ============================================================================
// ANALYSIS
// ============================================================================

/// Quality analysis findings for one article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityAnalysis {
    /// Scores are 0-1.
    pub relevance_score: f32,
    pub quality_score: f32,
    pub novelty_score: f32,
    pub depth_score: f32,
    pub credibility_score: f32,
    pub content_type: ContentType,
    pub key_points: Vec<String>,
    /// 1-5, where 1 is general audience and 5 is expert.
    pub technical_level: u8,
    pub why_matters: String,
    pub implications: Vec<String>,
    pub skip_reason: Option<String>,
    pub should_include: bool,
}

impl Default for QualityAnalysis {
    fn default() -> Self {
        Self {
            relevance_score: 0.0,
            quality_score: 0.0,
            novelty_score: 0.0,
            depth_score: 0.0,
            credibility_score: 0.0,
            content_type: ContentType::Unknown,
            key_points: Vec::new(),
            technical_level: 1,
            why_matters: String::new(),
            implications: Vec::new(),
            skip_reason: None,
            should_include: true,
        }
    }
}

impl QualityAnalysis {
    /// Weighted combined score: relevance 0.3, quality 0.25, novelty 0.2,
    /// depth 0.15, credibility 0.1.
    pub fn combined_score(&self) -> f32 {
        self.relevance_score * 0.3
            + self.quality_score * 0.25
            + self.novelty_score * 0.2
            + self.depth_score * 0.15
            + self.credibility_score * 0.1
    }
}

/// Bias analysis findings for one article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiasAnalysis {
    /// 0-1, where 0.5 is neutral.
    pub bias_score: f32,
    pub bias_direction: BiasDirection,
    pub bias_confidence: f32,
    pub loaded_language: Vec<String>,
    pub framing_issues: Vec<String>,
    pub missing_perspectives: Vec<String>,
    pub skeptics_corner: String,
    pub red_flags: Vec<String>,
}

impl Default for BiasAnalysis {
    fn default() -> Self {
        Self {
            bias_score: 0.5,
            bias_direction: BiasDirection::Unknown,
            bias_confidence: 0.0,
            loaded_language: Vec::new(),
            framing_issues: Vec::new(),
            missing_perspectives: Vec::new(),
            skeptics_corner: String::new(),
            red_flags: Vec::new(),
        }
    }
}

impl BiasAnalysis {
    /// Whether the article leans hard enough to be filtered.
    pub fn is_highly_biased(&self) -> bool {
        (self.bias_score - 0.5).abs() > 0.3
    }

    /// Human-readable bias label. Low-confidence analyses read as unknown.
    pub fn bias_label(&self) -> &'static str {
        if self.bias_confidence < 0.3 {
            return "Unknown";
        }
        match self.bias_score {
            s if s < 0.2 => "Strong Left",
            s if s < 0.4 => "Left-Leaning",
            s if s < 0.6 => "Neutral/Balanced",
            s if s < 0.8 => "Right-Leaning",
            _ => "Strong Right",
        }
    }
}

/// Connection between two articles for cross-story analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossConnection {
    pub related_article_id: String,
    pub connection_type: ConnectionType,
    /// 0-1 strength of the connection.
    pub strength: f32,
    pub summary: String,
}

/// Article with complete analysis results attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedArticle {
    pub article: ParsedArticle,
    pub quality: QualityAnalysis,
    pub bias: BiasAnalysis,
    pub summary: String,
    pub technical_insights: Vec<String>,
    pub connections: Vec<CrossConnection>,
    pub analyzed_at: Timestamp,
}

impl AnalyzedArticle {
    /// Overall article score: quality weighted 0.7, minus a 0.3-weighted
    /// penalty for distance from neutral bias.
    pub fn combined_score(&self) -> f32 {
        let quality = self.quality.combined_score();
        let bias_penalty = (self.bias.bias_score - 0.5).abs() * 2.0;
        quality * 0.7 - bias_penalty * 0.3
    }

    /// Inclusion gate: the quality agent approved it, the combined score
    /// clears 0.4, and the article is not highly biased.
    pub fn should_include(&self) -> bool {
        self.quality.should_include
            && self.combined_score() >= 0.4
            && !self.bias.is_highly_biased()
    }
}

// ============================================================================
// DIGEST
// ============================================================================

/// A section of the digest covering one topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DigestSection {
    pub topic: String,
    pub articles: Vec<AnalyzedArticle>,
    pub summary: String,
    pub cross_story_insights: Vec<String>,
}

/// Generation metadata for a complete digest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DigestMetadata {
    pub digest_id: String,
    pub generated_at: Timestamp,
    pub topics: Vec<String>,
    pub articles_found: u32,
    pub articles_parsed: u32,
    pub articles_analyzed: u32,
    pub articles_included: u32,
    pub tokens_used: u64,
    pub cost_usd: f64,
    pub user_id: Option<String>,
}

/// Complete digest with all sections and metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Digest {
    pub metadata: DigestMetadata,
    pub sections: Vec<DigestSection>,
    pub cross_story_connections: String,
    pub skeptics_summary: String,
}

impl Digest {
    /// Total number of articles across all sections.
    pub fn article_count(&self) -> usize {
        self.sections.iter().map(|s| s.articles.len()).sum()
    }
}

// =============================================================================
// TESTS
// =============================================================================
