use crate::infra::{build_scoring_service, load_weights, SessionDocument};
use clap::Args;
use mindscore::config::AppConfig;
use mindscore::error::AppError;
use mindscore::scoring::{CompositeResult, PhaseScore, ScoringSession};
use serde_json::json;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// Session document with phase definitions and responses
    #[arg(long)]
    pub(crate) session: PathBuf,
    /// Weight set overriding MINDSCORE_WEIGHTS
    #[arg(long)]
    pub(crate) weights: Option<PathBuf>,
    /// Emit the phase scores, composite, and ledger trail as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let document = SessionDocument::from_path(&args.session)?;
    let weights_path = args.weights.or(config.scoring.weights_path.clone());
    let weights = load_weights(weights_path.as_deref())?;

    let service = build_scoring_service(&config.scoring, weights, document.actor.as_deref());
    let mut session = ScoringSession::new(document.session_id.clone());

    let mut scores = Vec::new();
    for (response, phase) in document.pairs()? {
        scores.push(service.score_into(&mut session, response, phase)?);
    }
    let result = service.complete(&mut session, None)?;

    if args.json {
        let entries = service.ledger_entries(session.session_id())?;
        let payload = json!({
            "session_id": session.session_id(),
            "phases": scores,
            "composite": result,
            "ledger": entries,
        });
        let rendered = serde_json::to_string_pretty(&payload).map_err(std::io::Error::from)?;
        println!("{rendered}");
    } else {
        println!("{}", render_summary(session.session_id(), &scores, &result));
    }

    Ok(())
}

fn render_summary(session_id: &str, scores: &[PhaseScore], result: &CompositeResult) -> String {
    let mut lines = vec![format!("Session {session_id}")];

    lines.push(String::new());
    lines.push("Phases".to_string());
    for score in scores {
        lines.push(format!(
            "  {:<16} {:>6.2}/100  coherence {:.2}  novelty {:.2}",
            score.phase_id, score.sub_score, score.probabilities.coherence, score.probabilities.novelty
        ));
        for explanation in &score.explanations {
            lines.push(format!("    - {}", explanation.rationale));
        }
    }

    lines.push(String::new());
    lines.push("Domains".to_string());
    for (domain, value) in &result.domain_scores {
        lines.push(format!("  {domain:<16} {value:>6.2}"));
    }

    lines.push(String::new());
    lines.push(format!(
        "Composite {:.2}/700 ({}), archetype {} at {:.2}",
        result.composite_score,
        result.tier.label(),
        result.archetype.name,
        result.archetype.confidence
    ));
    lines.push(result.narrative.clone());
    lines.push(format!(
        "Computed at {}",
        result.computed_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use mindscore::scoring::{PhaseDefinition, ResponseText, ScoringEngine, WeightSet};

    #[test]
    fn summary_lists_phases_domains_and_composite() {
        let engine = ScoringEngine::default();
        let phase = PhaseDefinition::from_json(
            r#"{"id": "recall", "metrics": [{"id": "empathy", "name": "Empathy"}], "domains": ["emotion"]}"#,
        )
        .expect("phase parses");
        let score = engine
            .score_response(
                &ResponseText::new("recall", "I was anxious but hopeful."),
                &phase,
            )
            .expect("scores");
        let result = engine.compute_composite(&[score.to_scored_phase()], &WeightSet::default());

        let summary = render_summary("s-1", std::slice::from_ref(&score), &result);

        assert!(summary.starts_with("Session s-1"));
        assert!(summary.contains("recall"));
        assert!(summary.contains("via the empathy heuristic"));
        assert!(summary.contains("emotion"));
        assert!(summary.contains("/700 (Explorer)"));
    }
}
