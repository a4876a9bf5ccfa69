//! Batch runner: react a panel of personas to offers from a JSON file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use adpanel::config::PanelConfig;
use adpanel::evaluator::{EvaluatorKind, KindFactory};
use adpanel::model::{Decision, Offer, PersonaResponse};
use adpanel::orchestrator::{BatchOutcome, Orchestrator};
use adpanel::store::PersonaStore;

/// Evaluate advertising offers against a panel of synthetic personas.
#[derive(Parser, Debug)]
#[command(name = "adpanel", version, about)]
struct Args {
    /// JSON file holding one offer object or an array of offers.
    offers: PathBuf,

    /// Directory of persona JSON files (overrides ADPANEL_PERSONAS_DIR).
    #[arg(long)]
    personas_dir: Option<PathBuf>,

    /// Evaluation backend: api, cli or synthetic.
    #[arg(long, default_value = "synthetic")]
    backend: EvaluatorKind,

    /// Persona id to include (repeatable). Defaults to the whole panel.
    #[arg(long = "persona")]
    personas: Vec<String>,

    /// Evaluate personas one at a time instead of concurrently.
    #[arg(long)]
    sequential: bool,

    /// Write full results as JSON to this path.
    #[arg(long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("adpanel=info".parse()?))
        .init();

    let config = PanelConfig::from_env()?;
    let personas_dir = args
        .personas_dir
        .clone()
        .unwrap_or_else(|| config.personas_dir.clone());
    let parallel = !args.sequential && config.batch_parallel;

    let store = PersonaStore::load_dir(&personas_dir)
        .with_context(|| format!("Loading personas from {}", personas_dir.display()))?;
    let personas = if args.personas.is_empty() {
        store.get_all()
    } else {
        store.get_many(&args.personas)?
    };

    let offers = load_offers(&args.offers)?;

    println!("Ad Panel");
    println!("========\n");
    println!("  Offers:      {}", offers.len());
    println!("  Personas:    {}", personas.len());
    println!("  Backend:     {}", args.backend);
    println!(
        "  Mode:        {}",
        if parallel { "parallel" } else { "sequential" }
    );
    println!();

    let orchestrator = Orchestrator::new(Arc::new(KindFactory::new(args.backend, config)));

    let mut runs: Vec<(Offer, BatchOutcome)> = Vec::with_capacity(offers.len());
    for (i, offer) in offers.into_iter().enumerate() {
        println!("  [{}] {}", i + 1, offer.headline);
        let outcome = orchestrator.run_batch(&offer, &personas, parallel).await;
        println!(
            "      {} responses, {} failures",
            outcome.responses.len(),
            outcome.failures.len()
        );
        runs.push((offer, outcome));
    }

    print_summary(&runs);

    if let Some(path) = &args.output {
        write_results(path, &runs, args.backend, personas.len())?;
        println!("\nResults written to {}", path.display());
    }

    Ok(())
}

/// An offers file holds either a single offer object or an array of them.
fn load_offers(path: &Path) -> anyhow::Result<Vec<Offer>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Reading offers file {}", path.display()))?;

    let offers = match serde_json::from_str::<Vec<Offer>>(&raw) {
        Ok(list) => list,
        Err(_) => vec![serde_json::from_str::<Offer>(&raw)
            .with_context(|| format!("Parsing offers file {}", path.display()))?],
    };

    if offers.is_empty() {
        anyhow::bail!("Offers file {} is empty", path.display());
    }
    for offer in &offers {
        offer
            .validate()
            .with_context(|| format!("Offer '{}'", offer.headline))?;
    }
    Ok(offers)
}

fn mean_value(outcome: &BatchOutcome) -> f64 {
    if outcome.responses.is_empty() {
        return 0.0;
    }
    let total: f64 = outcome.responses.iter().map(|r| r.perceived_value).sum();
    total / outcome.responses.len() as f64
}

fn print_summary(runs: &[(Offer, BatchOutcome)]) {
    let responses: Vec<&PersonaResponse> = runs
        .iter()
        .flat_map(|(_, outcome)| &outcome.responses)
        .collect();
    let failures: usize = runs.iter().map(|(_, outcome)| outcome.failures.len()).sum();

    println!("\nPanel Summary");
    println!("=============\n");
    println!("  Responses:   {}", responses.len());
    println!("  Failures:    {failures}");

    if !responses.is_empty() {
        let positive = responses.iter().filter(|r| r.decision.is_positive()).count();
        println!(
            "  Conversion:  {:.1}% ({} of {})",
            100.0 * positive as f64 / responses.len() as f64,
            positive,
            responses.len()
        );

        let avg: f64 =
            responses.iter().map(|r| r.perceived_value).sum::<f64>() / responses.len() as f64;
        println!("  Avg value:   {avg:.1}/10");

        let mean_intent: f64 = responses
            .iter()
            .map(|r| f64::from(r.decision.score()))
            .sum::<f64>()
            / responses.len() as f64;
        println!("  Mean intent: {mean_intent:.1}/4");

        let mut decisions: BTreeMap<Decision, usize> = BTreeMap::new();
        for response in &responses {
            *decisions.entry(response.decision).or_default() += 1;
        }
        println!("  Decisions:");
        for (decision, count) in &decisions {
            println!("    {:<13} {count}", decision.to_string());
        }

        if runs.len() > 1 {
            let best = runs
                .iter()
                .filter(|(_, outcome)| !outcome.responses.is_empty())
                .max_by(|a, b| mean_value(&a.1).total_cmp(&mean_value(&b.1)));
            if let Some((offer, outcome)) = best {
                println!(
                    "\n  Best offer:  {} ({:.1}/10)",
                    offer.headline,
                    mean_value(outcome)
                );
            }
        }
    }

    for (offer, outcome) in runs {
        for failure in &outcome.failures {
            println!(
                "  Failed:      {} / {}: {}",
                offer.headline, failure.persona_id, failure.error
            );
        }
    }
}

#[derive(Serialize)]
struct ResultRow<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    offer_id: Option<&'a str>,
    #[serde(flatten)]
    response: &'a PersonaResponse,
}

#[derive(Serialize)]
struct FailureRow<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    offer_id: Option<&'a str>,
    persona_id: &'a str,
    error: String,
}

fn write_results(
    path: &Path,
    runs: &[(Offer, BatchOutcome)],
    backend: EvaluatorKind,
    num_personas: usize,
) -> anyhow::Result<()> {
    let mut results = Vec::new();
    let mut failures = Vec::new();
    for (offer, outcome) in runs {
        let offer_id = offer.test_id.as_deref();
        for response in &outcome.responses {
            results.push(ResultRow { offer_id, response });
        }
        for failure in &outcome.failures {
            failures.push(FailureRow {
                offer_id,
                persona_id: &failure.persona_id,
                error: failure.error.to_string(),
            });
        }
    }

    let document = serde_json::json!({
        "metadata": {
            "test_date": chrono::Utc::now(),
            "backend": backend.to_string(),
            "num_offers": runs.len(),
            "num_personas": num_personas,
            "num_results": results.len(),
            "num_failures": failures.len(),
        },
        "results": results,
        "failures": failures,
    });

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Creating {}", parent.display()))?;
        }
    }
    std::fs::write(path, serde_json::to_string_pretty(&document)?)
        .with_context(|| format!("Writing {}", path.display()))?;
    Ok(())
}
