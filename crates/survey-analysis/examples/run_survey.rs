//! Run a study from JSON files, or a built-in demo study
//!
//! ```text
//! cargo run -p survey-analysis --example run_survey -- config.json data.json
//! RUST_LOG=debug cargo run -p survey-analysis --example run_survey
//! ```

use anyhow::{Context, Result};
use survey_analysis::{
    run_analysis, MethodFlags, PriorSpec, QuestionSpec, StatisticSpec, StudyConfig,
    StudySettings, SurveyTable,
};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn demo_study() -> Result<(StudyConfig, SurveyTable)> {
    let n = 400;
    let data = SurveyTable::new()
        .with_column("Q1_aware", (0..n).map(|i| if i % 5 < 2 { "Yes" } else { "No" }))?
        .with_column("Q2_satisfaction", (0..n).map(|i| f64::from(3 + (i * 7) % 8)))?
        .with_column("Q3_recommend", (0..n).map(|i| f64::from((i * 13) % 11)))?
        .with_column("weight", (0..n).map(|i| 0.5 + f64::from(i % 4) * 0.5))?;

    let questions = vec![
        QuestionSpec::new(
            "Q1_aware",
            StatisticSpec::Proportion {
                categories: vec!["Yes".into()],
            },
        )
        .with_methods(MethodFlags::all())
        .with_prior(PriorSpec {
            prior_mean: Some(0.35),
            prior_n: Some(50.0),
            ..Default::default()
        }),
        QuestionSpec::new("Q2_satisfaction", StatisticSpec::Mean).with_methods(MethodFlags {
            run_moe: true,
            run_bootstrap: true,
            run_credible: true,
            ..Default::default()
        }),
        QuestionSpec::new("Q3_recommend", StatisticSpec::standard_nps()).with_methods(MethodFlags {
            run_moe: true,
            run_bootstrap: true,
            run_credible: true,
            ..Default::default()
        }),
        QuestionSpec::new("Q4_not_in_data", StatisticSpec::Mean),
    ];

    let settings = StudySettings {
        weight_variable: Some("weight".to_string()),
        random_seed: Some(12345),
        ..Default::default()
    };
    Ok((StudyConfig::new(settings, questions), data))
}

fn main() -> Result<()> {
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (config, data) = match args.as_slice() {
        [config_path, data_path] => {
            let config_json = std::fs::read_to_string(config_path)
                .with_context(|| format!("reading {config_path}"))?;
            let data_json = std::fs::read_to_string(data_path)
                .with_context(|| format!("reading {data_path}"))?;
            (
                StudyConfig::from_json_str(&config_json)?,
                SurveyTable::from_json_str(&data_json)?,
            )
        }
        [] => demo_study()?,
        _ => anyhow::bail!("usage: run_survey [CONFIG_JSON DATA_JSON]"),
    };

    let report = run_analysis(&config, &data)?;

    println!(
        "n = {}, effective n = {:.1}, DEFF = {:.3}",
        report.study.actual_n, report.study.effective_n, report.study.design_effect
    );
    for result in report.successful() {
        let estimate = result.estimate.map_or(f64::NAN, |e| e.value());
        println!("\n{} ({:?}): estimate {:.4}", result.question_id, result.statistic, estimate);
        for (slot, interval) in result.intervals() {
            println!("  {slot:<10} {:<24} {}", interval.method.name(), interval.interval);
        }
    }
    if !report.warnings.is_empty() {
        println!("\nWarnings:\n{}", report.warnings);
    }

    Ok(())
}
