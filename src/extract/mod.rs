//! 文本抽取模块：从模型输出中尽力解析步骤、评分、风险与置信度。
//!
//! # Heuristic Extraction
//!
//! Best-effort parsing of free-form model output. Model text has no grammar,
//! so every parser is fallible and reports why it found nothing instead of
//! filling in a default.
//!
//! | Function | Recognizes |
//! |----------|------------|
//! | [`parse_steps`] | `Step N:` lines, else numbered list items |
//! | [`parse_score`] | `score: 8/10`, `8.5 out of 10`, `85%` |
//! | [`parse_risks`] | Items under a risks heading, `Risk:` lines, optional severity |
//! | [`parse_confidence`] | `confidence: 0.8`, `85%`, `7/10`, level words |
//!
//! ```rust
//! use deepseek_kit::extract::{parse_score, ReasoningEvaluation};
//!
//! let score = parse_score("Final score: 8/10").unwrap();
//! assert_eq!(score.normalized(), 0.8);
//!
//! let eval = ReasoningEvaluation::parse("Step 1: Think\nConfidence: high");
//! assert!(eval.steps.is_ok());
//! assert!(eval.score.is_err());
//! ```

mod error;
mod evaluation;
mod parsers;

pub use error::ExtractError;
pub use evaluation::ReasoningEvaluation;
pub use parsers::{
    parse_confidence, parse_risks, parse_score, parse_steps, Risk, Score, Severity, Step,
};
