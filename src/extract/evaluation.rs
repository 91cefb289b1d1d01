use super::error::ExtractError;
use super::parsers::{parse_confidence, parse_risks, parse_score, parse_steps, Risk, Score, Step};

/// Fields pulled from a reasoning model's answer.
///
/// Each field carries its own outcome; a missing score does not hide the
/// steps that were found.
#[derive(Debug, Clone, PartialEq)]
pub struct ReasoningEvaluation {
    pub steps: Result<Vec<Step>, ExtractError>,
    pub score: Result<Score, ExtractError>,
    pub risks: Result<Vec<Risk>, ExtractError>,
    pub confidence: Result<f64, ExtractError>,
}

impl ReasoningEvaluation {
    pub fn parse(text: &str) -> Self {
        Self {
            steps: parse_steps(text),
            score: parse_score(text),
            risks: parse_risks(text),
            confidence: parse_confidence(text),
        }
    }

    /// True when every field was extracted.
    pub fn is_complete(&self) -> bool {
        self.steps.is_ok() && self.score.is_ok() && self.risks.is_ok() && self.confidence.is_ok()
    }

    pub fn errors(&self) -> Vec<&ExtractError> {
        [
            self.steps.as_ref().err(),
            self.score.as_ref().err(),
            self.risks.as_ref().err(),
            self.confidence.as_ref().err(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_evaluation_keeps_found_fields() {
        let text = "Step 1: Check inputs\nStep 2: Compare\nScore: 7/10";
        let eval = ReasoningEvaluation::parse(text);
        assert_eq!(eval.steps.as_ref().map(Vec::len), Ok(2));
        assert_eq!(eval.score, Ok(Score { value: 7.0, max: 10.0 }));
        assert!(!eval.is_complete());
        let missing: Vec<_> = eval.errors().iter().map(|e| e.field()).collect();
        assert_eq!(missing, vec!["risks", "confidence"]);
    }
}
