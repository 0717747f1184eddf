//! `mcp-judge evaluate` - run candidates over a questions file and score them

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use crate::cli::EvaluateArgs;
use crate::commands::dispatch::CommandContext;
use crate::commands::render;
use mcp_judge_core::backend::{Backend, ScriptedBackend};
use mcp_judge_core::candidate::{build_candidate, Candidate, RecordedCandidate};
use mcp_judge_core::config::{
    CandidateConfig, CandidateKind, JudgeConfig, JuryConfig, Profiles, DEFAULT_PASS_THRESHOLD,
};
use mcp_judge_core::error::{JudgeError, Result};
use mcp_judge_core::fixture::{load_questions, QuestionSelection};
use mcp_judge_core::jury::Jury;
use mcp_judge_core::report::{export_value, write_export, ResultsDb, RunRecord};
use mcp_judge_core::runner::{Evaluator, RunReport, Runner};

pub fn execute(ctx: &CommandContext, args: &EvaluateArgs) -> Result<()> {
    let start = Instant::now();

    let profiles = Profiles::load_or_default(args.profiles.as_deref())?;
    profiles.validate()?;

    let questions = load_questions(&args.questions_file)?;
    let selection: QuestionSelection = args.questions.parse()?;
    let selected = selection.select(&questions)?;

    let evaluator = build_evaluator(args, &profiles)?;
    let candidates = build_candidates(args, &profiles)?;

    tracing::info!(
        evaluator = %evaluator.describe(),
        questions = selected.len(),
        candidates = candidates.len(),
        dry_run = args.dry_run,
        "evaluation_started"
    );

    let runner = Runner::new(evaluator, candidates).with_cancellation(ctx.cancellation.clone());
    let report = ctx.block_on(runner.run(&selected))?;

    if let Some(path) = &args.output {
        write_export(&report, path)?;
    }

    let run_id = if args.dry_run {
        None
    } else {
        let record = RunRecord::from_report(&report, &args.questions_file);
        ResultsDb::new(&args.results_dir).append(&record)?;
        Some(record.run_id)
    };

    if ctx.json() {
        print_json(&report, run_id.as_deref())?;
    } else if !ctx.cli.quiet {
        print_human(&report, args, selected.len(), questions.len(), run_id.as_deref());
    }

    mcp_judge_core::trace_time!(start, "evaluate_command", dry_run = args.dry_run);

    if report.cancelled {
        return Err(JudgeError::Cancelled);
    }
    Ok(())
}

/// A jury when `--jury` or several `--judge` flags are given, else one judge
fn build_evaluator(args: &EvaluateArgs, profiles: &Profiles) -> Result<Evaluator> {
    if let Some(jury_config) = jury_config(args, profiles)? {
        let pass_threshold = jury_config.pass_threshold;
        let jury = build_jury(&jury_config, profiles, args.dry_run)?;
        return Ok(Evaluator::Jury {
            jury,
            pass_threshold,
        });
    }

    if args.voting.is_some() || args.weights.is_some() {
        return Err(JudgeError::UsageError(
            "--voting and --weights need a jury (--jury or several --judge)".to_string(),
        ));
    }

    let config = match args.judge.first() {
        Some(name) => profiles.judge(name)?,
        None => profiles.default_judge()?,
    };
    let backend = judge_backend(config, profiles, args.dry_run)?;
    Ok(Evaluator::Judge {
        judge: config.build(backend)?,
        pass_threshold: config.pass_threshold,
    })
}

fn jury_config(args: &EvaluateArgs, profiles: &Profiles) -> Result<Option<JuryConfig>> {
    let mut config = if args.judge.len() > 1 {
        JuryConfig {
            judges: args.judge.clone(),
            voting: Default::default(),
            weights: None,
            pass_threshold: profiles
                .jury
                .as_ref()
                .map_or(DEFAULT_PASS_THRESHOLD, |j| j.pass_threshold),
        }
    } else if args.jury {
        profiles.jury.clone().ok_or_else(|| {
            JudgeError::UsageError("--jury given but the profiles define no jury".to_string())
        })?
    } else {
        return Ok(None);
    };

    if let Some(voting) = args.voting {
        config.voting = voting;
    }
    if let Some(weights) = &args.weights {
        config.weights = Some(weights.0.clone());
    }
    Ok(Some(config))
}

fn build_jury(config: &JuryConfig, profiles: &Profiles, dry_run: bool) -> Result<Jury> {
    if !dry_run {
        return profiles.build_jury(config, profiles.backend.build()?);
    }

    profiles.validate_jury(config)?;
    let judges = config
        .judges
        .iter()
        .map(|name| {
            let judge = profiles.judge(name)?;
            judge.build(judge_backend(judge, profiles, true)?)
        })
        .collect::<Result<Vec<_>>>()?;
    Jury::new(judges, config.voting, config.weights.clone())
}

fn judge_backend(config: &JudgeConfig, profiles: &Profiles, dry_run: bool) -> Result<Arc<dyn Backend>> {
    if dry_run {
        Ok(Arc::new(ScriptedBackend::dry_run(&config.score_type()?)))
    } else {
        profiles.backend.build()
    }
}

/// Named candidates, else every profile candidate, else the recorded answers
fn build_candidates(args: &EvaluateArgs, profiles: &Profiles) -> Result<Vec<Arc<dyn Candidate>>> {
    let configs: Vec<CandidateConfig> = if !args.candidate.is_empty() {
        args.candidate
            .iter()
            .map(|name| profiles.candidate(name).cloned())
            .collect::<Result<_>>()?
    } else if !profiles.candidates.is_empty() {
        profiles.candidates.clone()
    } else {
        vec![CandidateConfig::recorded("recorded")]
    };

    let base_dir = args
        .profiles
        .as_deref()
        .and_then(Path::parent)
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));

    configs
        .iter()
        .map(|config| {
            if args.dry_run && config.kind == CandidateKind::Chat {
                Ok(Arc::new(RecordedCandidate::new(&config.name)) as Arc<dyn Candidate>)
            } else {
                build_candidate(config, &profiles.backend, base_dir)
            }
        })
        .collect()
}

fn print_json(report: &RunReport, run_id: Option<&str>) -> Result<()> {
    let summaries: Vec<_> = report.runs.iter().map(|run| run.summary()).collect();
    let output = serde_json::json!({
        "run_id": run_id,
        "evaluator": report.evaluator,
        "cancelled": report.cancelled,
        "summaries": summaries,
        "results": export_value(report)?,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_human(
    report: &RunReport,
    args: &EvaluateArgs,
    selected: usize,
    total: usize,
    run_id: Option<&str>,
) {
    println!("Evaluator: {}", report.evaluator);
    println!(
        "Questions: {} of {} from {}",
        selected,
        total,
        args.questions_file.display()
    );
    if args.dry_run {
        println!("Dry run: no backend calls, history not written");
    }

    for run in &report.runs {
        render::print_run(run);
    }

    if let Some(path) = &args.output {
        println!("\nResults written to {}", path.display());
    }
    if let Some(run_id) = run_id {
        println!("Run recorded as {}", run_id);
    }
    if report.cancelled {
        println!("\nRun cancelled; remaining questions were not evaluated.");
    }
}
