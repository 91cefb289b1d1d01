//! Regex heuristics over free-form model output.
//!
//! Nothing here has a grammar to lean on: each parser looks for the common
//! phrasings and reports [`ExtractError`] instead of guessing when none match.

use super::error::ExtractError;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static extraction pattern")
}

static STEP_LABELED: Lazy<Regex> = Lazy::new(|| re(r"(?i)^\s*step\s+(\d+)\s*[:.)\-]\s*(.+?)\s*$"));
static STEP_NUMBERED: Lazy<Regex> = Lazy::new(|| re(r"^\s*(\d+)[.)]\s+(.+?)\s*$"));

static SCORE_KEYWORD: Lazy<Regex> = Lazy::new(|| {
    re(r"(?i)\bscore\b[^0-9\n]{0,20}?(\d+(?:\.\d+)?)\s*(?:/\s*(\d+(?:\.\d+)?)|out\s+of\s+(\d+(?:\.\d+)?)|(%))?")
});
static SCORE_FRACTION: Lazy<Regex> =
    Lazy::new(|| re(r"(?i)(\d+(?:\.\d+)?)\s*(?:/|out\s+of)\s*(\d+(?:\.\d+)?)"));
static SCORE_PERCENT: Lazy<Regex> = Lazy::new(|| re(r"(\d+(?:\.\d+)?)\s*%"));

static RISK_HEADING: Lazy<Regex> = Lazy::new(|| {
    re(r"(?i)^\s*(?:#{1,6}\s*)?\**\s*(?:key\s+|potential\s+|main\s+|identified\s+)?risks?(?:\s+and\s+\w+)?\s*\**\s*:?\s*\**\s*$")
});
static RISK_INLINE: Lazy<Regex> =
    Lazy::new(|| re(r"(?i)^\s*(?:[-*•]\s*)?risk(?:\s*\d+)?\s*:\s*(.+?)\s*$"));
static BULLET: Lazy<Regex> = Lazy::new(|| re(r"^\s*(?:[-*•]|\d+[.)])\s+(.+?)\s*$"));
static SEVERITY_TAG: Lazy<Regex> = Lazy::new(|| {
    re(r"(?i)\s*(?:[\[(]\s*(low|medium|moderate|high|critical)(?:\s+(?:risk|severity))?\s*[\])]|[,;]?\s*severity\s*[:=]\s*(low|medium|moderate|high|critical))")
});
static SEVERITY_PREFIX: Lazy<Regex> = Lazy::new(|| {
    re(r"(?i)^\**(low|medium|moderate|high|critical)(?:\s+(?:risk|severity))?\**\s*[:\-–]\s*")
});

static CONFIDENCE: Lazy<Regex> = Lazy::new(|| {
    re(r"(?i)\bconfidence(?:\s+(?:level|score))?(?:\s+(?:is|of|at))?[^0-9a-z\n]{0,10}(?:(\d+(?:\.\d+)?)\s*(?:(%)|/\s*(\d+(?:\.\d+)?))?|(very\s+high|very\s+low|high|medium|moderate|low)\b)")
});

/// One step of a reasoning chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub number: u32,
    pub text: String,
}

/// Lines labelled `Step N:`; when there are none, numbered list items.
pub fn parse_steps(text: &str) -> Result<Vec<Step>, ExtractError> {
    let labeled = collect_steps(text, &STEP_LABELED)?;
    let steps = if labeled.is_empty() {
        collect_steps(text, &STEP_NUMBERED)?
    } else {
        labeled
    };
    if steps.is_empty() {
        return Err(ExtractError::NotFound { field: "steps" });
    }
    Ok(steps)
}

fn collect_steps(text: &str, pattern: &Regex) -> Result<Vec<Step>, ExtractError> {
    text.lines()
        .filter_map(|line| pattern.captures(line))
        .map(|c| {
            let number = c[1].parse::<u32>().map_err(|_| ExtractError::Malformed {
                field: "steps",
                input: c[0].to_string(),
            })?;
            Ok(Step {
                number,
                text: c[2].to_string(),
            })
        })
        .collect()
}

/// A score and the scale it was given on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub value: f64,
    pub max: f64,
}

impl Score {
    /// Score in `0.0..=1.0`.
    pub fn normalized(&self) -> f64 {
        self.value / self.max
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.value, self.max)
    }
}

/// `score: 8/10`, `8.5 out of 10`, `85%`.
///
/// A bare number after "score" is read on a 10-point scale when it is at
/// most 10 and on a 100-point scale otherwise.
pub fn parse_score(text: &str) -> Result<Score, ExtractError> {
    let score = if let Some(c) = SCORE_KEYWORD.captures(text) {
        let value = number(&c, 1, "score")?;
        let max = if let Some(m) = c.get(2).or_else(|| c.get(3)) {
            parse_f64(m.as_str(), "score")?
        } else if c.get(4).is_some() || value > 10.0 {
            100.0
        } else {
            10.0
        };
        Score { value, max }
    } else if let Some(c) = SCORE_FRACTION.captures(text) {
        Score {
            value: number(&c, 1, "score")?,
            max: number(&c, 2, "score")?,
        }
    } else if let Some(c) = SCORE_PERCENT.captures(text) {
        Score {
            value: number(&c, 1, "score")?,
            max: 100.0,
        }
    } else {
        return Err(ExtractError::NotFound { field: "score" });
    };

    if score.max <= 0.0 {
        return Err(ExtractError::Malformed {
            field: "score",
            input: score.to_string(),
        });
    }
    if score.value > score.max {
        return Err(ExtractError::OutOfRange {
            field: "score",
            value: score.value,
        });
    }
    Ok(score)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Severity::Low),
            "medium" | "moderate" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            _ => Err(ExtractError::Malformed {
                field: "severity",
                input: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Risk {
    pub description: String,
    pub severity: Option<Severity>,
}

/// List items under a "Risks" heading, plus any `Risk: ...` line.
pub fn parse_risks(text: &str) -> Result<Vec<Risk>, ExtractError> {
    let mut risks = Vec::new();
    let mut in_section = false;

    for line in text.lines() {
        if RISK_HEADING.is_match(line) {
            in_section = true;
            continue;
        }
        if let Some(c) = RISK_INLINE.captures(line) {
            risks.push(risk_from(&c[1])?);
            continue;
        }
        if in_section {
            if let Some(c) = BULLET.captures(line) {
                risks.push(risk_from(&c[1])?);
            } else if !line.trim().is_empty() || !risks.is_empty() {
                in_section = false;
            }
        }
    }

    if risks.is_empty() {
        return Err(ExtractError::NotFound { field: "risks" });
    }
    Ok(risks)
}

fn risk_from(item: &str) -> Result<Risk, ExtractError> {
    let item = item.trim();
    let (severity, description) = if let Some(c) = SEVERITY_PREFIX.captures(item) {
        let rest = item[c[0].len()..].to_string();
        (Some(c[1].parse::<Severity>()?), rest)
    } else if let Some(c) = SEVERITY_TAG.captures(item) {
        let label = c.get(1).or_else(|| c.get(2)).map(|m| m.as_str()).unwrap_or_default();
        let range = c.get(0).map(|m| m.range()).unwrap_or_default();
        let mut rest = item.to_string();
        rest.replace_range(range, "");
        (Some(label.parse::<Severity>()?), rest)
    } else {
        (None, item.to_string())
    };

    let description = description.trim().trim_end_matches(&[',', ';'][..]).trim().to_string();
    if description.is_empty() {
        return Err(ExtractError::Malformed {
            field: "risks",
            input: item.to_string(),
        });
    }
    Ok(Risk {
        description,
        severity,
    })
}

/// Confidence in `0.0..=1.0` from `confidence: 0.8`, `85%`, `8/10` or a
/// level word (`very high` 0.95, `high` 0.85, `medium` 0.6, `low` 0.3,
/// `very low` 0.1). Bare numbers above 1 are read as percentages.
pub fn parse_confidence(text: &str) -> Result<f64, ExtractError> {
    let c = CONFIDENCE
        .captures(text)
        .ok_or(ExtractError::NotFound { field: "confidence" })?;

    let value = if let Some(word) = c.get(4) {
        let word = word.as_str().to_ascii_lowercase();
        let word = word.split_whitespace().collect::<Vec<_>>().join(" ");
        match word.as_str() {
            "very high" => 0.95,
            "high" => 0.85,
            "medium" | "moderate" => 0.6,
            "low" => 0.3,
            "very low" => 0.1,
            _ => {
                return Err(ExtractError::Malformed {
                    field: "confidence",
                    input: word,
                })
            }
        }
    } else {
        let raw = number(&c, 1, "confidence")?;
        if c.get(2).is_some() {
            raw / 100.0
        } else if let Some(max) = c.get(3) {
            let max = parse_f64(max.as_str(), "confidence")?;
            if max <= 0.0 {
                return Err(ExtractError::Malformed {
                    field: "confidence",
                    input: c[0].to_string(),
                });
            }
            raw / max
        } else if raw > 1.0 {
            raw / 100.0
        } else {
            raw
        }
    };

    if !(0.0..=1.0).contains(&value) {
        return Err(ExtractError::OutOfRange {
            field: "confidence",
            value,
        });
    }
    Ok(value)
}

fn number(c: &Captures<'_>, group: usize, field: &'static str) -> Result<f64, ExtractError> {
    let m = c.get(group).ok_or(ExtractError::NotFound { field })?;
    parse_f64(m.as_str(), field)
}

fn parse_f64(s: &str, field: &'static str) -> Result<f64, ExtractError> {
    s.parse::<f64>().map_err(|_| ExtractError::Malformed {
        field,
        input: s.to_string(),
    })
}
