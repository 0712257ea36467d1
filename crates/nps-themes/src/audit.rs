//! Survey health audit.
//!
//! A fixed table of rules over programme-level inputs. Each rule grades its
//! input as pass, warn or fail; a rule whose input is unavailable reports
//! skip. [`AuditInputs::from_responses`] derives what the Row Source can
//! supply; the remaining inputs stay empty until a source exists for them.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::Serialize;
use tracing::debug;

use nps_core::defaults::*;
use nps_core::metrics::nps_score;
use nps_core::{NpsCategory, NpsResponse};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditStatus {
    Pass,
    Warn,
    Fail,
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditCategory {
    DataQuality,
    Strategy,
    Signal,
    Technical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditSeverity {
    Critical,
    Warning,
    Info,
}

impl From<AuditStatus> for AuditSeverity {
    fn from(status: AuditStatus) -> Self {
        match status {
            AuditStatus::Fail => Self::Critical,
            AuditStatus::Warn => Self::Warning,
            AuditStatus::Pass | AuditStatus::Skip => Self::Info,
        }
    }
}

/// One graded rule.
#[derive(Debug, Clone, Serialize)]
pub struct AuditResult {
    pub key: &'static str,
    pub title: &'static str,
    pub status: AuditStatus,
    pub category: AuditCategory,
    pub severity: AuditSeverity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric: Option<String>,
    pub why: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub how_to_fix: Option<String>,
}

impl AuditResult {
    fn graded(
        key: &'static str,
        title: &'static str,
        category: AuditCategory,
        status: AuditStatus,
        metric: String,
        why: String,
        how_to_fix: &str,
    ) -> Self {
        Self {
            key,
            title,
            status,
            category,
            severity: status.into(),
            metric: Some(metric),
            why,
            how_to_fix: Some(how_to_fix.to_string()),
        }
    }

    fn skipped(key: &'static str, title: &'static str, category: AuditCategory, why: &str) -> Self {
        Self {
            key,
            title,
            status: AuditStatus::Skip,
            category,
            severity: AuditSeverity::Info,
            metric: None,
            why: why.to_string(),
            how_to_fix: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResponseRate {
    pub rate: f64,
    pub responses: i64,
    pub invites: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VerbatimShare {
    pub share: f64,
    pub responses: i64,
}

/// Surveys received by one respondent in the recent window.
#[derive(Debug, Clone, PartialEq)]
pub struct RespondentFrequency {
    pub respondent: String,
    pub responses: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChannelVolume {
    pub channel: String,
    pub responses: i64,
}

/// Spread of weekly NPS, in points.
#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyStability {
    pub stddev: f64,
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SegmentCoverage {
    pub segment: String,
    pub coverage: f64,
}

/// Everything the rules look at. `None` means "no source for this input".
#[derive(Debug, Clone, Default)]
pub struct AuditInputs {
    pub response_rate: Option<ResponseRate>,
    pub verbatim: Option<VerbatimShare>,
    pub fatigue: Option<Vec<RespondentFrequency>>,
    pub channel_mix: Option<Vec<ChannelVolume>>,
    pub stability: Option<WeeklyStability>,
    pub completion_seconds: Option<f64>,
    pub segment_coverage: Vec<SegmentCoverage>,
    pub have_events: bool,
    pub have_devices: bool,
    pub have_locales: bool,
    pub total_responses: i64,
    pub nps: Option<f64>,
}

impl AuditInputs {
    /// Derive inputs from raw responses as of `now`.
    ///
    /// The response table records no invitations, so the response rate is
    /// approximated as the recent window's share of the full window. There
    /// is no respondent identifier or channel either; those rules skip.
    pub fn from_responses(rows: &[NpsResponse], now: DateTime<Utc>) -> Self {
        let window_start = now - Duration::days(AUDIT_WINDOW_DAYS);
        let window: Vec<&NpsResponse> = rows
            .iter()
            .filter(|r| r.creation_date >= window_start)
            .collect();
        let total = window.len() as i64;
        if total == 0 {
            return Self::default();
        }

        let recent_start = now - Duration::days(AUDIT_RECENT_DAYS);
        let recent = window
            .iter()
            .filter(|r| r.creation_date >= recent_start)
            .count() as i64;
        let verbatim = window
            .iter()
            .filter(|r| has_verbatim(r.nps_explanation.as_deref()))
            .count() as i64;
        let (promoters, detractors) = band_counts(window.iter().copied());

        let stability_start = now - Duration::days(AUDIT_STABILITY_DAYS);
        let stability = weekly_stability(
            window
                .iter()
                .copied()
                .filter(|r| r.creation_date >= stability_start),
        );

        Self {
            response_rate: Some(ResponseRate {
                rate: recent as f64 / total as f64,
                responses: recent,
                invites: total,
            }),
            verbatim: Some(VerbatimShare {
                share: verbatim as f64 / total as f64,
                responses: total,
            }),
            stability,
            total_responses: total,
            nps: Some(nps_score(promoters, detractors, total)),
            ..Self::default()
        }
    }
}

/// A real comment: longer than a couple of characters and not a
/// "no comment" placeholder.
pub fn has_verbatim(comment: Option<&str>) -> bool {
    let Some(text) = comment else {
        return false;
    };
    let normalized = text.trim().to_lowercase();
    normalized.chars().count() > AUDIT_VERBATIM_MIN_CHARS
        && !EMPTY_COMMENT_STOPLIST.contains(&normalized.as_str())
}

fn band_counts<'a>(rows: impl Iterator<Item = &'a NpsResponse>) -> (i64, i64) {
    rows.fold((0, 0), |(p, d), r| match r.category() {
        NpsCategory::Promoter => (p + 1, d),
        NpsCategory::Detractor => (p, d + 1),
        NpsCategory::Passive => (p, d),
    })
}

/// Weeks start on Sunday (UTC).
fn week_start(ts: DateTime<Utc>) -> NaiveDate {
    let day = ts.date_naive();
    day - Duration::days(day.weekday().num_days_from_sunday() as i64)
}

/// Population standard deviation of weekly NPS; needs two weeks of data.
fn weekly_stability<'a>(rows: impl Iterator<Item = &'a NpsResponse>) -> Option<WeeklyStability> {
    let mut weeks: BTreeMap<NaiveDate, Vec<&NpsResponse>> = BTreeMap::new();
    for row in rows {
        weeks.entry(week_start(row.creation_date)).or_default().push(row);
    }
    if weeks.len() < 2 {
        return None;
    }

    let total: i64 = weeks.values().map(|w| w.len() as i64).sum();
    let weekly: Vec<f64> = weeks
        .values()
        .map(|w| {
            let (p, d) = band_counts(w.iter().copied());
            nps_score(p, d, w.len() as i64)
        })
        .collect();
    let mean = weekly.iter().sum::<f64>() / weekly.len() as f64;
    let variance = weekly.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / weekly.len() as f64;
    Some(WeeklyStability {
        stddev: variance.sqrt(),
        total,
    })
}

/// Higher is better.
fn grade_at_least(value: f64, pass: f64, warn: f64) -> AuditStatus {
    if value >= pass {
        AuditStatus::Pass
    } else if value >= warn {
        AuditStatus::Warn
    } else {
        AuditStatus::Fail
    }
}

/// Lower is better.
fn grade_at_most(value: f64, pass: f64, warn: f64) -> AuditStatus {
    if value <= pass {
        AuditStatus::Pass
    } else if value <= warn {
        AuditStatus::Warn
    } else {
        AuditStatus::Fail
    }
}

fn advice<'a>(status: AuditStatus, pass: &'a str, warn: &'a str, fail: &'a str) -> &'a str {
    match status {
        AuditStatus::Pass | AuditStatus::Skip => pass,
        AuditStatus::Warn => warn,
        AuditStatus::Fail => fail,
    }
}

fn pct(share: f64, decimals: usize) -> String {
    format!("{:.*}%", decimals, share * 100.0)
}

/// Run every rule, in table order.
pub fn run_audit(inputs: &AuditInputs) -> Vec<AuditResult> {
    let mut out = vec![
        response_rate_rule(inputs.response_rate.as_ref()),
        verbatim_rule(inputs.verbatim.as_ref()),
        fatigue_rule(inputs.fatigue.as_deref()),
        channel_mix_rule(inputs.channel_mix.as_deref()),
        stability_rule(inputs.stability.as_ref()),
        completion_rule(inputs.completion_seconds),
        segment_rule(&inputs.segment_coverage),
        touchpoint_rule(inputs.have_events),
        device_locale_rule(inputs.have_devices && inputs.have_locales),
    ];
    if inputs.total_responses > 0 {
        out.push(volume_rule(inputs.total_responses));
    }
    if let Some(nps) = inputs.nps {
        out.push(distribution_rule(nps));
    }

    debug!(
        subsystem = "themes",
        component = "audit",
        op = "run_audit",
        rules = out.len(),
        failing = out.iter().filter(|r| r.status == AuditStatus::Fail).count(),
        "Audit evaluated"
    );
    out
}

fn response_rate_rule(input: Option<&ResponseRate>) -> AuditResult {
    const KEY: &str = "response_rate";
    const TITLE: &str = "Response Rate (30 days)";
    let Some(rr) = input else {
        return AuditResult::skipped(KEY, TITLE, AuditCategory::DataQuality, "Missing invites/responses data.");
    };
    let status = grade_at_least(rr.rate, AUDIT_RESPONSE_RATE_PASS, AUDIT_RESPONSE_RATE_WARN);
    AuditResult::graded(
        KEY,
        TITLE,
        AuditCategory::DataQuality,
        status,
        pct(rr.rate, 1),
        format!("You invited {} and received {} responses.", rr.invites, rr.responses),
        advice(
            status,
            "Keep steady volume and sampling. Consider testing invitation timing.",
            "Add in-app triggers at key moments and send one email reminder after 48 hours.",
            "Add in-app triggers, send one reminder after 48 hours and test different invitation timing and messaging.",
        ),
    )
}

fn verbatim_rule(input: Option<&VerbatimShare>) -> AuditResult {
    const KEY: &str = "verbatim_share";
    const TITLE: &str = "Verbatim Comment Rate (90 days)";
    let Some(v) = input else {
        return AuditResult::skipped(KEY, TITLE, AuditCategory::DataQuality, "Missing comments data.");
    };
    let status = grade_at_least(v.share, AUDIT_VERBATIM_PASS, AUDIT_VERBATIM_WARN);
    AuditResult::graded(
        KEY,
        TITLE,
        AuditCategory::DataQuality,
        status,
        pct(v.share, 1),
        format!("{} responses with {} having comments.", v.responses, pct(v.share, 1)),
        advice(
            status,
            "Keep the open-ended prompt concise.",
            "Shorten the prompt and ask one follow-up such as \"What's the main reason?\"",
            "Shorten the prompt significantly and ask for the score first, then an optional comment.",
        ),
    )
}

fn fatigue_rule(input: Option<&[RespondentFrequency]>) -> AuditResult {
    const KEY: &str = "fatigue";
    const TITLE: &str = "Survey Fatigue (30 days)";
    let Some(freq) = input else {
        return AuditResult::skipped(KEY, TITLE, AuditCategory::Strategy, "Missing respondent frequency data.");
    };
    let fatigued = freq
        .iter()
        .filter(|r| r.responses >= AUDIT_FATIGUE_MIN_SURVEYS)
        .count();
    let status = match fatigued {
        0 => AuditStatus::Pass,
        n if n <= AUDIT_FATIGUE_WARN_MAX => AuditStatus::Warn,
        _ => AuditStatus::Fail,
    };
    AuditResult::graded(
        KEY,
        TITLE,
        AuditCategory::Strategy,
        status,
        format!("{} users >={} surveys", fatigued, AUDIT_FATIGUE_MIN_SURVEYS),
        format!("{} users have been surveyed multiple times in the last 30 days.", fatigued),
        advice(
            status,
            "Cadence looks healthy.",
            "Throttle to one survey per user per 30 days.",
            "Enforce one survey per user per 30 days and exclude recently surveyed users.",
        ),
    )
}

fn channel_mix_rule(input: Option<&[ChannelVolume]>) -> AuditResult {
    const KEY: &str = "channel_mix";
    const TITLE: &str = "Channel Mix";
    let Some(mix) = input else {
        return AuditResult::skipped(KEY, TITLE, AuditCategory::Strategy, "Missing channel data.");
    };
    let total = mix.iter().map(|c| c.responses).sum::<i64>().max(1) as f64;
    let share = |name: &str| {
        mix.iter()
            .find(|c| c.channel == name)
            .map_or(0, |c| c.responses) as f64
            / total
    };
    let (in_app, email) = (share("in_app"), share("email"));
    let status = grade_at_least(in_app, AUDIT_IN_APP_PASS, AUDIT_IN_APP_WARN);
    AuditResult::graded(
        KEY,
        TITLE,
        AuditCategory::Strategy,
        status,
        format!("In-app {}, Email {}", pct(in_app, 0), pct(email, 0)),
        format!("Current mix: {} in-app, {} email.", pct(in_app, 0), pct(email, 0)),
        advice(
            status,
            "Balanced mix. Consider testing different in-app trigger points.",
            "Add in-app intercepts on active screens to lift volume.",
            "Add in-app intercepts on active screens to lift volume.",
        ),
    )
}

fn stability_rule(input: Option<&WeeklyStability>) -> AuditResult {
    const KEY: &str = "stability";
    const TITLE: &str = "NPS Stability (Week-over-Week)";
    let Some(s) = input else {
        return AuditResult::skipped(KEY, TITLE, AuditCategory::Signal, "Insufficient history.");
    };
    let status = match (s.stddev > AUDIT_STABILITY_MAX_STDDEV, s.total < AUDIT_STABILITY_MIN_RESPONSES) {
        (false, _) => AuditStatus::Pass,
        (true, true) => AuditStatus::Warn,
        (true, false) => AuditStatus::Fail,
    };
    AuditResult::graded(
        KEY,
        TITLE,
        AuditCategory::Signal,
        status,
        format!("σ={:.1} (n={})", s.stddev, s.total),
        format!(
            "Week-over-week standard deviation is {:.1} points with {} total responses.",
            s.stddev, s.total
        ),
        advice(
            status,
            "Stable trend.",
            "Review trigger timing and avoid survey blasts tied to product changes.",
            "Review trigger timing and avoid survey blasts tied to product changes.",
        ),
    )
}

fn completion_rule(input: Option<f64>) -> AuditResult {
    const KEY: &str = "completion_time";
    const TITLE: &str = "Survey Completion Time";
    let Some(secs) = input.filter(|s| *s > 0.0) else {
        return AuditResult::skipped(KEY, TITLE, AuditCategory::DataQuality, "Missing completion time data.");
    };
    let status = grade_at_most(secs, AUDIT_COMPLETION_PASS_SECS, AUDIT_COMPLETION_WARN_SECS);
    AuditResult::graded(
        KEY,
        TITLE,
        AuditCategory::DataQuality,
        status,
        format!("{:.1}s average", secs),
        format!("Average completion time is {:.1} seconds.", secs),
        advice(
            status,
            "Keep surveys concise.",
            "Consider shortening the survey or simplifying its layout.",
            "Reduce the survey to two or three questions.",
        ),
    )
}

fn segment_rule(input: &[SegmentCoverage]) -> AuditResult {
    const KEY: &str = "segment_coverage";
    const TITLE: &str = "Segment Coverage";
    if input.is_empty() {
        return AuditResult::skipped(KEY, TITLE, AuditCategory::Strategy, "Missing segment coverage data.");
    }
    let low = input
        .iter()
        .filter(|s| s.coverage < AUDIT_SEGMENT_MIN_COVERAGE)
        .count();
    let status = match low {
        0 => AuditStatus::Pass,
        n if n <= AUDIT_SEGMENT_WARN_MAX => AuditStatus::Warn,
        _ => AuditStatus::Fail,
    };
    AuditResult::graded(
        KEY,
        TITLE,
        AuditCategory::Strategy,
        status,
        format!("{} segments <{} coverage", low, pct(AUDIT_SEGMENT_MIN_COVERAGE, 0)),
        format!("{} segments are under-sampled.", low),
        advice(
            status,
            "Segment coverage is healthy.",
            "Increase sampling for under-represented segments.",
            "Increase sampling for under-represented segments.",
        ),
    )
}

fn touchpoint_rule(have_events: bool) -> AuditResult {
    let (status, why, fix) = if have_events {
        (AuditStatus::Pass, "Events available for trigger analysis.", None)
    } else {
        (
            AuditStatus::Warn,
            "Missing event tracking data.",
            Some("Track key events (signup, activation, support) and use them as survey triggers."),
        )
    };
    AuditResult {
        key: "touchpoints",
        title: "Touchpoint Coverage",
        status,
        category: AuditCategory::Technical,
        severity: status.into(),
        metric: None,
        why: why.to_string(),
        how_to_fix: fix.map(str::to_string),
    }
}

fn device_locale_rule(covered: bool) -> AuditResult {
    let (status, why, fix) = if covered {
        (AuditStatus::Pass, "Device and locale are captured.", None)
    } else {
        (
            AuditStatus::Warn,
            "Missing device/locale data.",
            Some("Capture device and locale with each response to detect sampling skew."),
        )
    };
    AuditResult {
        key: "device_locale",
        title: "Device/Locale Coverage",
        status,
        category: AuditCategory::Technical,
        severity: status.into(),
        metric: None,
        why: why.to_string(),
        how_to_fix: fix.map(str::to_string),
    }
}

fn volume_rule(total: i64) -> AuditResult {
    let status = grade_at_least(total as f64, AUDIT_VOLUME_PASS as f64, AUDIT_VOLUME_WARN as f64);
    AuditResult::graded(
        "data_volume",
        "Data Volume",
        AuditCategory::DataQuality,
        status,
        format!("{} responses", total),
        format!("Total responses: {}.", total),
        advice(
            status,
            "Enough data for reliable insights.",
            "Consider increasing survey frequency or widening the audience.",
            "Increase survey frequency and widen the target audience.",
        ),
    )
}

fn distribution_rule(nps: f64) -> AuditResult {
    let status = grade_at_least(nps, AUDIT_NPS_PASS, AUDIT_NPS_WARN);
    AuditResult::graded(
        "nps_distribution",
        "NPS Score Distribution",
        AuditCategory::Signal,
        status,
        format!("NPS: {:.1}", nps),
        format!("NPS over the last {} days is {:.1}.", AUDIT_WINDOW_DAYS, nps),
        advice(
            status,
            "Continue monitoring trends.",
            "Monitor for improvement and compare segments.",
            "Analyse detractor feedback and close the loop with them.",
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap()
    }

    fn row(days_ago: i64, score: i16, comment: Option<&str>) -> NpsResponse {
        NpsResponse {
            id: Uuid::new_v4(),
            nps_score: score,
            nps_explanation: comment.map(str::to_string),
            title_text: Some("Dagblad".to_string()),
            survey_name: "Abonnees".to_string(),
            creation_date: now() - Duration::days(days_ago),
        }
    }

    fn find<'a>(results: &'a [AuditResult], key: &str) -> &'a AuditResult {
        results.iter().find(|r| r.key == key).unwrap()
    }

    fn status_of(results: &[AuditResult], key: &str) -> AuditStatus {
        find(results, key).status
    }

    #[test]
    fn test_empty_inputs_skip_data_rules() {
        let results = run_audit(&AuditInputs::default());
        assert_eq!(results.len(), 9);
        for key in [
            "response_rate",
            "verbatim_share",
            "fatigue",
            "channel_mix",
            "stability",
            "completion_time",
            "segment_coverage",
        ] {
            assert_eq!(status_of(&results, key), AuditStatus::Skip, "{}", key);
            assert_eq!(find(&results, key).severity, AuditSeverity::Info);
        }
        assert_eq!(status_of(&results, "touchpoints"), AuditStatus::Warn);
        assert_eq!(status_of(&results, "device_locale"), AuditStatus::Warn);
    }

    #[test]
    fn test_response_rate_thresholds() {
        let grade = |rate: f64| {
            let inputs = AuditInputs {
                response_rate: Some(ResponseRate { rate, responses: 10, invites: 50 }),
                ..Default::default()
            };
            status_of(&run_audit(&inputs), "response_rate")
        };
        assert_eq!(grade(0.20), AuditStatus::Pass);
        assert_eq!(grade(0.19), AuditStatus::Warn);
        assert_eq!(grade(0.10), AuditStatus::Warn);
        assert_eq!(grade(0.09), AuditStatus::Fail);
    }

    #[test]
    fn test_verbatim_thresholds() {
        let grade = |share: f64| {
            let inputs = AuditInputs {
                verbatim: Some(VerbatimShare { share, responses: 200 }),
                ..Default::default()
            };
            run_audit(&inputs)
        };
        let pass = grade(0.55);
        assert_eq!(status_of(&pass, "verbatim_share"), AuditStatus::Pass);
        assert_eq!(find(&pass, "verbatim_share").metric.as_deref(), Some("55.0%"));
        assert_eq!(status_of(&grade(0.35), "verbatim_share"), AuditStatus::Warn);
        let fail = grade(0.2);
        assert_eq!(status_of(&fail, "verbatim_share"), AuditStatus::Fail);
        assert_eq!(find(&fail, "verbatim_share").severity, AuditSeverity::Critical);
    }

    #[test]
    fn test_fatigue_counts_repeat_respondents() {
        let grade = |counts: &[i64]| {
            let fatigue = counts
                .iter()
                .enumerate()
                .map(|(i, n)| RespondentFrequency {
                    respondent: format!("lezer-{}", i),
                    responses: *n,
                })
                .collect();
            let inputs = AuditInputs {
                fatigue: Some(fatigue),
                ..Default::default()
            };
            status_of(&run_audit(&inputs), "fatigue")
        };
        assert_eq!(grade(&[1, 1, 1]), AuditStatus::Pass);
        assert_eq!(grade(&[2, 3, 1, 1]), AuditStatus::Warn);
        assert_eq!(grade(&[2, 2, 2, 2, 2]), AuditStatus::Warn);
        assert_eq!(grade(&[2, 2, 2, 2, 2, 4]), AuditStatus::Fail);
    }

    #[test]
    fn test_channel_mix_uses_in_app_share() {
        let grade = |in_app: i64, email: i64| {
            let inputs = AuditInputs {
                channel_mix: Some(vec![
                    ChannelVolume { channel: "in_app".to_string(), responses: in_app },
                    ChannelVolume { channel: "email".to_string(), responses: email },
                ]),
                ..Default::default()
            };
            run_audit(&inputs)
        };
        assert_eq!(status_of(&grade(50, 50), "channel_mix"), AuditStatus::Pass);
        assert_eq!(status_of(&grade(30, 70), "channel_mix"), AuditStatus::Warn);
        let fail = grade(10, 90);
        assert_eq!(status_of(&fail, "channel_mix"), AuditStatus::Fail);
        assert_eq!(find(&fail, "channel_mix").metric.as_deref(), Some("In-app 10%, Email 90%"));
    }

    #[test]
    fn test_stability_fails_only_with_enough_volume() {
        let grade = |stddev: f64, total: i64| {
            let inputs = AuditInputs {
                stability: Some(WeeklyStability { stddev, total }),
                ..Default::default()
            };
            status_of(&run_audit(&inputs), "stability")
        };
        assert_eq!(grade(8.0, 500), AuditStatus::Pass);
        assert_eq!(grade(8.5, 99), AuditStatus::Warn);
        assert_eq!(grade(8.5, 100), AuditStatus::Fail);
        assert_eq!(grade(2.0, 10), AuditStatus::Pass);
    }

    #[test]
    fn test_completion_time_lower_is_better() {
        let grade = |secs: f64| {
            let inputs = AuditInputs {
                completion_seconds: Some(secs),
                ..Default::default()
            };
            status_of(&run_audit(&inputs), "completion_time")
        };
        assert_eq!(grade(25.0), AuditStatus::Pass);
        assert_eq!(grade(45.0), AuditStatus::Warn);
        assert_eq!(grade(45.1), AuditStatus::Fail);
        assert_eq!(grade(0.0), AuditStatus::Skip);
    }

    #[test]
    fn test_segment_coverage_counts_low_segments() {
        let grade = |coverages: &[f64]| {
            let inputs = AuditInputs {
                segment_coverage: coverages
                    .iter()
                    .map(|c| SegmentCoverage { segment: format!("{}", c), coverage: *c })
                    .collect(),
                ..Default::default()
            };
            status_of(&run_audit(&inputs), "segment_coverage")
        };
        assert_eq!(grade(&[0.1, 0.5]), AuditStatus::Pass);
        assert_eq!(grade(&[0.05, 0.09, 0.5]), AuditStatus::Warn);
        assert_eq!(grade(&[0.05, 0.05, 0.05]), AuditStatus::Fail);
    }

    #[test]
    fn test_inventory_rules_pass_when_present() {
        let inputs = AuditInputs {
            have_events: true,
            have_devices: true,
            have_locales: false,
            ..Default::default()
        };
        let results = run_audit(&inputs);
        assert_eq!(status_of(&results, "touchpoints"), AuditStatus::Pass);
        assert_eq!(status_of(&results, "device_locale"), AuditStatus::Warn);
    }

    #[test]
    fn test_volume_and_distribution_thresholds() {
        let grade = |total: i64, nps: f64| {
            let inputs = AuditInputs {
                total_responses: total,
                nps: Some(nps),
                ..Default::default()
            };
            let results = run_audit(&inputs);
            (
                status_of(&results, "data_volume"),
                status_of(&results, "nps_distribution"),
            )
        };
        assert_eq!(grade(1000, 0.0), (AuditStatus::Pass, AuditStatus::Pass));
        assert_eq!(grade(500, -10.0), (AuditStatus::Warn, AuditStatus::Warn));
        assert_eq!(grade(499, -10.5), (AuditStatus::Fail, AuditStatus::Fail));
    }

    #[test]
    fn test_verbatim_ignores_placeholders() {
        assert!(has_verbatim(Some("Te duur")));
        assert!(has_verbatim(Some("nvt, maar de app is traag")));
        assert!(!has_verbatim(Some(" N.V.T. ")));
        assert!(!has_verbatim(Some("ok")));
        assert!(!has_verbatim(None));
    }

    #[test]
    fn test_inputs_from_responses() {
        let rows = vec![
            row(120, 0, Some("Buiten het venster")),
            row(60, 10, Some("Prima krant")),
            row(45, 9, Some("n.v.t.")),
            row(10, 3, Some("Bezorging te laat")),
            row(5, 8, None),
        ];
        let inputs = AuditInputs::from_responses(&rows, now());

        assert_eq!(inputs.total_responses, 4);
        let rate = inputs.response_rate.unwrap();
        assert_eq!((rate.responses, rate.invites), (2, 4));
        assert_eq!(rate.rate, 0.5);
        assert_eq!(inputs.verbatim.unwrap().share, 0.5);
        // 2 promoters, 1 detractor out of 4
        assert_eq!(inputs.nps, Some(25.0));
        assert!(inputs.fatigue.is_none());
        assert!(inputs.channel_mix.is_none());
    }

    #[test]
    fn test_no_recent_rows_yield_default_inputs() {
        let inputs = AuditInputs::from_responses(&[row(200, 9, Some("Oud"))], now());
        assert_eq!(inputs.total_responses, 0);
        assert!(inputs.verbatim.is_none());
        assert_eq!(run_audit(&inputs).len(), 9);
    }

    #[test]
    fn test_weekly_stability_spread() {
        // 2024-06-30 is a Sunday: one week all promoters, the previous all detractors.
        let rows = vec![row(0, 10, None), row(0, 9, None), row(7, 2, None), row(6, 1, None)];
        let stability = weekly_stability(rows.iter()).unwrap();
        assert_eq!(stability.total, 4);
        assert_eq!(stability.stddev, 100.0);

        let single_week = vec![row(0, 10, None), row(0, 1, None)];
        assert!(weekly_stability(single_week.iter()).is_none());
    }
}
