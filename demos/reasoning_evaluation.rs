//! Ask the reasoning model for an evaluation and pull structured fields
//! out of its answer.
//!
//! Without `DEEPSEEK_API_KEY` a canned answer is parsed instead.
//!
//! Run:
//!   DEEPSEEK_API_KEY=your_key cargo run --example reasoning_evaluation

use deepseek_kit::extract::ReasoningEvaluation;
use deepseek_kit::types::REASONER_MODEL;
use deepseek_kit::{ChatRequest, DeepSeekClient, Message};

const SAMPLE: &str = "Step 1: Estimate demand from last year's sales.
Step 2: Compare supplier lead times.
Step 3: Pick the cheaper supplier that meets the deadline.

Score: 7/10

Risks:
- Supplier capacity is unverified (high)
- Currency fluctuation, severity: medium

Confidence: 70%";

const PROMPT: &str = "Evaluate switching our packaging supplier. Answer with numbered \
'Step N:' lines, a 'Score: X/10' line, a 'Risks:' list with severities, and a \
'Confidence:' percentage.";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let text = if std::env::var("DEEPSEEK_API_KEY").is_ok() {
        let client = DeepSeekClient::builder().model(REASONER_MODEL).build()?;
        let response = client
            .chat(ChatRequest::new(vec![Message::user(PROMPT)]))
            .await?;
        if let Some(reasoning) = &response.reasoning_content {
            println!("--- Reasoning ({} chars) ---", reasoning.len());
        }
        response.content
    } else {
        println!("DEEPSEEK_API_KEY not set; parsing a sample answer.\n");
        SAMPLE.to_string()
    };

    println!("--- Answer ---\n{text}\n");
    let eval = ReasoningEvaluation::parse(&text);

    match &eval.steps {
        Ok(steps) => steps.iter().for_each(|s| println!("step {}: {}", s.number, s.text)),
        Err(e) => println!("steps: {e}"),
    }
    match &eval.score {
        Ok(score) => println!("score: {score} ({:.0}%)", score.normalized() * 100.0),
        Err(e) => println!("score: {e}"),
    }
    match &eval.risks {
        Ok(risks) => {
            for r in risks {
                let sev = r.severity.map(|s| s.to_string()).unwrap_or_else(|| "?".into());
                println!("risk [{sev}]: {}", r.description);
            }
        }
        Err(e) => println!("risks: {e}"),
    }
    match &eval.confidence {
        Ok(c) => println!("confidence: {c:.2}"),
        Err(e) => println!("confidence: {e}"),
    }
    Ok(())
}
