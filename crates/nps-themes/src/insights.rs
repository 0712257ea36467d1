//! Insight Renderer for ad-hoc survey analyses.
//!
//! Turns classified responses into per-theme rows and an ordered list of
//! narrative insights: satisfaction overview, what customers love, the most
//! severe themes, and a team action plan.

use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;

use tracing::debug;

use nps_core::defaults::{
    ACTION_PLAN_QUOTE_CHARS, ACTION_PLAN_THEMES, NEUTRAL_SENTIMENT, QUOTE_MAX_CHARS,
    SAMPLE_RESPONSES_PER_THEME, TOP_THEME_INSIGHTS,
};
use nps_core::{AnalyzedResponse, Insight, InsightType, SentimentLabel, SurveyTheme};

// =============================================================================
// SEVERITY
// =============================================================================

/// Weights and tiers of the theme severity score.
///
/// `severity = volume_weight × (impact_weight × sentiment_impact
///             + distance_weight × (1 + |avg_sentiment − 0.5|))`
///
/// The volume weight is `mentions^exponent`, with the exponent chosen by the
/// size of the whole dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct SeverityPolicy {
    pub impact_weight: f64,
    pub distance_weight: f64,
    /// Datasets up to this many responses use `small_exponent`.
    pub small_dataset_max: usize,
    /// Datasets up to this many responses use `medium_exponent`.
    pub medium_dataset_max: usize,
    pub small_exponent: f64,
    pub medium_exponent: f64,
    pub large_exponent: f64,
    /// Negative share above which a theme counts as predominantly negative.
    pub majority_threshold: f64,
    /// Relative boost of the sentiment impact for predominantly negative themes.
    pub majority_bonus: f64,
}

impl Default for SeverityPolicy {
    fn default() -> Self {
        Self {
            impact_weight: 0.7,
            distance_weight: 0.3,
            small_dataset_max: 30,
            medium_dataset_max: 200,
            small_exponent: 0.5,
            medium_exponent: 0.75,
            large_exponent: 1.0,
            majority_threshold: 0.5,
            majority_bonus: 0.5,
        }
    }
}

impl SeverityPolicy {
    pub fn volume_weight(&self, mentions: usize, dataset_size: usize) -> f64 {
        let exponent = if dataset_size <= self.small_dataset_max {
            self.small_exponent
        } else if dataset_size <= self.medium_dataset_max {
            self.medium_exponent
        } else {
            self.large_exponent
        };
        (mentions as f64).powf(exponent)
    }

    pub fn sentiment_impact(&self, negative_share: f64) -> f64 {
        if negative_share > self.majority_threshold {
            negative_share * (1.0 + self.majority_bonus)
        } else {
            negative_share
        }
    }

    pub fn severity(&self, stats: &ThemeStats, dataset_size: usize) -> f64 {
        let distance = (NEUTRAL_SENTIMENT - stats.avg_sentiment()).abs();
        self.volume_weight(stats.count, dataset_size)
            * (self.impact_weight * self.sentiment_impact(stats.negative_share())
                + self.distance_weight * (1.0 + distance))
    }

    /// Quotes shown per theme insight.
    pub fn evidence_count(&self, dataset_size: usize) -> usize {
        if dataset_size <= self.small_dataset_max {
            1
        } else if dataset_size <= self.medium_dataset_max {
            2
        } else {
            3
        }
    }
}

// =============================================================================
// THEME STATISTICS
// =============================================================================

/// Per-theme counters over the analysed responses.
#[derive(Debug, Clone)]
pub struct ThemeStats {
    pub theme: String,
    pub count: usize,
    pub positive: usize,
    pub negative: usize,
    pub sentiment_sum: f64,
    /// Indices into the response slice, in response order.
    pub responses: Vec<usize>,
}

impl ThemeStats {
    fn new(theme: &str) -> Self {
        Self {
            theme: theme.to_string(),
            count: 0,
            positive: 0,
            negative: 0,
            sentiment_sum: 0.0,
            responses: Vec::new(),
        }
    }

    pub fn avg_sentiment(&self) -> f64 {
        if self.count == 0 {
            return NEUTRAL_SENTIMENT;
        }
        self.sentiment_sum / self.count as f64
    }

    pub fn negative_share(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.negative as f64 / self.count as f64
    }
}

/// Theme counters in first-mention order.
pub fn theme_stats(responses: &[AnalyzedResponse]) -> Vec<ThemeStats> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut stats: Vec<ThemeStats> = Vec::new();
    for (i, response) in responses.iter().enumerate() {
        let analysis = &response.analysis;
        for theme in &analysis.themes {
            let slot = *index.entry(theme.as_str()).or_insert_with(|| {
                stats.push(ThemeStats::new(theme));
                stats.len() - 1
            });
            let s = &mut stats[slot];
            s.count += 1;
            s.sentiment_sum += analysis.sentiment_score;
            s.responses.push(i);
            match analysis.sentiment {
                SentimentLabel::Positive => s.positive += 1,
                SentimentLabel::Negative => s.negative += 1,
                SentimentLabel::Neutral => {}
            }
        }
    }
    stats
}

/// Rows persisted per theme: mentions, average sentiment, first samples.
pub fn survey_themes(responses: &[AnalyzedResponse], stats: &[ThemeStats]) -> Vec<SurveyTheme> {
    stats
        .iter()
        .map(|s| SurveyTheme {
            theme_name: s.theme.clone(),
            mention_count: s.count as i32,
            sentiment_score: s.avg_sentiment(),
            sample_responses: s
                .responses
                .iter()
                .take(SAMPLE_RESPONSES_PER_THEME)
                .map(|&i| responses[i].text.clone())
                .collect(),
        })
        .collect()
}

// =============================================================================
// TEXT HELPERS
// =============================================================================

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Evidence quote: the first 150 characters followed by an ellipsis.
pub fn quote(text: &str) -> String {
    format!("{}...", truncate_chars(text, QUOTE_MAX_CHARS))
}

fn capitalize(theme: &str) -> String {
    let mut chars = theme.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn percent(share: f64) -> i64 {
    (share * 100.0).round() as i64
}

fn numbered(quotes: &[String]) -> String {
    quotes
        .iter()
        .enumerate()
        .map(|(i, q)| format!("{}. \"{}\"", i + 1, q))
        .collect::<Vec<_>>()
        .join("\n")
}

// =============================================================================
// RECOMMENDATION TEMPLATES
// =============================================================================

struct RecommendationTemplate {
    keywords: &'static [&'static str],
    text: &'static str,
}

static TEMPLATES: &[RecommendationTemplate] = &[
    RecommendationTemplate {
        keywords: &["shipping", "delivery", "bezorg", "levering"],
        text: "Review shipping costs and delivery times, and consider a free-shipping threshold or clearer delivery communication",
    },
    RecommendationTemplate {
        keywords: &["price", "pricing", "prijs", "cost", "kosten"],
        text: "Review pricing and make the value customers get for their money more visible",
    },
    RecommendationTemplate {
        keywords: &["service", "support", "klantenservice", "helpdesk"],
        text: "Review support response times and brief the team on the most common complaints",
    },
    RecommendationTemplate {
        keywords: &["app", "ux", "interface", "website", "usability"],
        text: "Run a usability review of the affected screens and fix the most reported friction points",
    },
];

const GENERIC_RECOMMENDATION: &str =
    "Investigate the root cause with the owning team before deciding on changes";

/// Template chosen by keyword: a word of the theme name starting with one of
/// the template keywords.
pub fn recommendation_for(theme: &str) -> &'static str {
    let lower = theme.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    TEMPLATES
        .iter()
        .find(|t| {
            t.keywords
                .iter()
                .any(|k| words.iter().any(|w| w.starts_with(k)))
        })
        .map(|t| t.text)
        .unwrap_or(GENERIC_RECOMMENDATION)
}

// =============================================================================
// RENDERER
// =============================================================================

/// Output of one render pass.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedAnalysis {
    pub themes: Vec<SurveyTheme>,
    pub insights: Vec<Insight>,
}

#[derive(Debug, Clone, Default)]
pub struct InsightRenderer {
    policy: SeverityPolicy,
}

impl InsightRenderer {
    pub fn new(policy: SeverityPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &SeverityPolicy {
        &self.policy
    }

    pub fn render(&self, responses: &[AnalyzedResponse]) -> RenderedAnalysis {
        let stats = theme_stats(responses);
        let themes = survey_themes(responses, &stats);
        let insights = self.insights(responses, &stats);
        debug!(
            subsystem = "themes",
            component = "insights",
            op = "render",
            response_count = responses.len(),
            theme_count = themes.len(),
            insight_count = insights.len(),
            "Survey insights rendered"
        );
        RenderedAnalysis { themes, insights }
    }

    fn insights(&self, responses: &[AnalyzedResponse], stats: &[ThemeStats]) -> Vec<Insight> {
        let total = responses.len();
        let mut insights = Vec::new();
        if total == 0 {
            return insights;
        }

        let label_count =
            |label: SentimentLabel| responses.iter().filter(|r| r.analysis.sentiment == label).count();
        let positive = label_count(SentimentLabel::Positive);
        let negative = label_count(SentimentLabel::Negative);

        insights.push(Insight {
            insight_type: InsightType::Summary,
            title: "Customer Satisfaction Overview".to_string(),
            content: format!(
                "{}% of customers are satisfied ({}/{} positive responses). {} customers reported issues that need attention.",
                percent(positive as f64 / total as f64),
                positive,
                total,
                negative
            ),
            themes: Vec::new(),
            impact: 0.8,
        });

        if positive > 0 {
            if let Some(love) = self.what_customers_love(responses, stats) {
                insights.push(love);
            }
        }

        let mut ranked: Vec<(&ThemeStats, f64)> = stats
            .iter()
            .map(|s| (s, self.policy.severity(s, total)))
            .collect();
        // stable: equal severities keep first-mention order
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

        let evidence = self.policy.evidence_count(total);
        let mut used_quotes: HashSet<String> = HashSet::new();
        for (s, severity) in ranked.iter().take(TOP_THEME_INSIGHTS) {
            insights.push(theme_insight(responses, s, *severity, evidence, &mut used_quotes));
        }

        if !ranked.is_empty() {
            insights.push(action_plan(responses, &ranked[..ranked.len().min(ACTION_PLAN_THEMES)]));
        }
        insights
    }

    fn what_customers_love(&self, responses: &[AnalyzedResponse], stats: &[ThemeStats]) -> Option<Insight> {
        // first maximum in mention order
        let top = stats
            .iter()
            .filter(|s| s.positive > 0)
            .fold(None::<&ThemeStats>, |best, s| match best {
                Some(b) if b.count >= s.count => Some(b),
                _ => Some(s),
            })?;
        let quotes: Vec<String> = top
            .responses
            .iter()
            .map(|&i| &responses[i])
            .filter(|r| r.analysis.sentiment == SentimentLabel::Positive)
            .take(2)
            .map(|r| quote(&r.text))
            .collect();
        Some(Insight {
            insight_type: InsightType::Summary,
            title: "What Customers Love".to_string(),
            content: format!(
                "**Top Positive Theme:** {} ({} mentions)\n\n**Customer Feedback:**\n{}\n\n**Why it matters:** This is what customers appreciate most about your product/service. Consider highlighting these strengths in marketing and ensuring they remain consistent.",
                top.theme,
                top.count,
                numbered(&quotes)
            ),
            themes: vec![top.theme.clone()],
            impact: 0.7,
        })
    }
}

fn theme_insight(
    responses: &[AnalyzedResponse],
    stats: &ThemeStats,
    severity: f64,
    evidence: usize,
    used_quotes: &mut HashSet<String>,
) -> Insight {
    let wanted = evidence.min(stats.responses.len());
    let mut quotes: Vec<String> = Vec::new();
    for &i in &stats.responses {
        if quotes.len() >= wanted {
            break;
        }
        let q = quote(&responses[i].text);
        if used_quotes.insert(q.clone()) {
            quotes.push(q);
        }
    }

    let negative_pct = percent(stats.negative_share());
    let why = if stats.negative_share() > 0.5 {
        format!(
            "High negative share ({}%) despite {} mentions.",
            negative_pct, stats.count
        )
    } else {
        format!(
            "Moderate volume ({} mentions) with {}% negative sentiment.",
            stats.count, negative_pct
        )
    };

    Insight {
        insight_type: InsightType::Theme,
        title: format!("{} Analysis", capitalize(&stats.theme)),
        content: format!(
            "**Metrics:** {} mentions, {}% negative, {}% sentiment\n\n**Evidence:**\n{}\n\n**Why it matters:** {}",
            stats.count,
            negative_pct,
            percent(stats.avg_sentiment()),
            numbered(&quotes),
            why
        ),
        themes: vec![stats.theme.clone()],
        impact: (severity / 10.0).min(1.0),
    }
}

fn first_text_with(
    responses: &[AnalyzedResponse],
    stats: &ThemeStats,
    label: SentimentLabel,
) -> Option<String> {
    stats
        .responses
        .iter()
        .map(|&i| &responses[i])
        .find(|r| r.analysis.sentiment == label)
        .map(|r| truncate_chars(&r.text, ACTION_PLAN_QUOTE_CHARS).to_string())
        .filter(|t| !t.is_empty())
}

fn action_plan(responses: &[AnalyzedResponse], top: &[(&ThemeStats, f64)]) -> Insight {
    let mut plan = format!(
        "**Based on {} customer responses, here are specific actions your team should take:**\n\n",
        responses.len()
    );
    for (index, (s, severity)) in top.iter().enumerate() {
        let _ = writeln!(plan, "**{}. {}**", index + 1, capitalize(&s.theme));
        let _ = writeln!(
            plan,
            "• Mentioned by {} customers ({} positive, {} negative)",
            s.count, s.positive, s.negative
        );
        let _ = writeln!(
            plan,
            "• Severity score: {:.2} ({}% negative)",
            severity,
            percent(s.negative_share())
        );
        if let Some(text) = first_text_with(responses, s, SentimentLabel::Positive) {
            let _ = writeln!(plan, "• Positive feedback: \"{}\"", text);
        }
        if let Some(text) = first_text_with(responses, s, SentimentLabel::Negative) {
            let _ = writeln!(plan, "• Issue reported: \"{}\"", text);
        }
        let action = match (s.negative > 0, s.positive > 0) {
            (true, true) => "Address the issues while maintaining the positive aspects customers love",
            (true, false) => "Address the issues mentioned above",
            (false, true) => {
                "Continue and amplify what customers love - consider featuring this in marketing"
            }
            (false, false) => "Monitor this theme for future feedback",
        };
        let _ = writeln!(plan, "• Action: {}", action);
        let _ = writeln!(plan, "• Recommendation: {}", recommendation_for(&s.theme));
        plan.push('\n');
    }

    Insight {
        insight_type: InsightType::Recommendation,
        title: "Team Action Plan".to_string(),
        content: plan,
        themes: top.iter().map(|(s, _)| s.theme.clone()).collect(),
        impact: 0.9,
    }
}
