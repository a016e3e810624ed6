//! End-to-end runs over small in-memory studies

use approx::assert_relative_eq;
use survey_analysis::{
    run_analysis, run_analysis_with, MethodFlags, PointEstimate, PriorSpec, QuestionSpec,
    QuestionStatus, SkipReason, StatisticSpec, StudyConfig, StudySettings, SurveyTable,
};
use survey_confidence::{IntervalMethod, MultipleComparisonMethod};
use survey_core::{sequential, Error};

fn survey() -> SurveyTable {
    let n = 120;
    SurveyTable::new()
        .with_column("likely_recommend", (0..n).map(|i| f64::from(i % 11)))
        .unwrap()
        .with_column(
            "aware",
            (0..n).map(|i| match i % 4 {
                0 | 1 => "Yes",
                2 => "No",
                _ => "",
            }),
        )
        .unwrap()
        .with_column("satisfaction", (0..n).map(|i| f64::from(5 + i % 5)))
        .unwrap()
        .with_column(
            "spend",
            (0..n).map(|i| {
                if i % 10 == 9 {
                    "n/a".to_string()
                } else {
                    (20 + i % 7).to_string()
                }
            }),
        )
        .unwrap()
        .with_column("weight", (0..n).map(|i| if i % 3 == 0 { 2.0 } else { 0.75 }))
        .unwrap()
}

fn questions() -> Vec<QuestionSpec> {
    vec![
        QuestionSpec::new(
            "aware",
            StatisticSpec::Proportion {
                categories: vec!["Yes".into()],
            },
        )
        .with_methods(MethodFlags::all()),
        QuestionSpec::new("does_not_exist", StatisticSpec::Mean).with_methods(MethodFlags::all()),
        QuestionSpec::new("satisfaction", StatisticSpec::Mean).with_methods(MethodFlags {
            run_moe: true,
            run_bootstrap: true,
            run_credible: true,
            ..Default::default()
        }),
        QuestionSpec::new("likely_recommend", StatisticSpec::standard_nps())
            .with_methods(MethodFlags {
                run_moe: true,
                run_bootstrap: true,
                run_credible: true,
                ..Default::default()
            })
            .with_prior(PriorSpec {
                prior_mean: Some(10.0),
                prior_sd: Some(20.0),
                prior_n: None,
            }),
        QuestionSpec::new("spend", StatisticSpec::Mean).with_methods(MethodFlags {
            run_moe: true,
            ..Default::default()
        }),
    ]
}

fn settings() -> StudySettings {
    StudySettings {
        bootstrap_iterations: 1000,
        random_seed: Some(2024),
        ..Default::default()
    }
}

#[test]
fn test_missing_question_does_not_stop_run() {
    let report = run_analysis(&StudyConfig::new(settings(), questions()), &survey()).unwrap();

    assert_eq!(report.results.len(), 5);
    let missing = report.result("does_not_exist").unwrap();
    assert_eq!(missing.status, QuestionStatus::Skipped(SkipReason::NotFound));
    assert!(report
        .warnings
        .iter()
        .any(|w| w.contains("does_not_exist") && w.contains("not found")));

    assert_eq!(report.successful().count(), 4);
    assert_eq!(report.skipped().count(), 1);
}

#[test]
fn test_unweighted_proportion_question() {
    let report = run_analysis(&StudyConfig::new(settings(), questions()), &survey()).unwrap();
    let aware = report.result("aware").unwrap();

    // Blank responses are dropped: 60 yes out of 90 answers
    assert_eq!(aware.n_raw, 90);
    assert_eq!(aware.n_eff, Some(90.0));
    assert_relative_eq!(aware.estimate.unwrap().value(), 60.0 / 90.0, epsilon = 1e-12);

    let moe = aware.moe.as_ref().unwrap();
    let wilson = aware.wilson.as_ref().unwrap();
    assert_eq!(moe.method, IntervalMethod::NormalApproximation);
    assert_eq!(wilson.method, IntervalMethod::Wilson);
    assert!(aware.bootstrap.is_some());
    assert_eq!(aware.credible.as_ref().unwrap().method, IntervalMethod::CredibleBeta);
}

#[test]
fn test_nps_question() {
    let report = run_analysis(&StudyConfig::new(settings(), questions()), &survey()).unwrap();
    let nps = report.result("likely_recommend").unwrap();

    match nps.estimate.unwrap() {
        PointEstimate::Nps(stats) => {
            assert_relative_eq!(
                stats.nps_score,
                stats.pct_promoters - stats.pct_detractors,
                epsilon = 1e-12
            );
            assert_relative_eq!(
                stats.pct_promoters + stats.pct_detractors + stats.pct_passives,
                100.0,
                epsilon = 1e-9
            );
        }
        other => panic!("Unexpected estimate: {other:?}"),
    }
    for (_, interval) in nps.intervals() {
        assert!(interval.lower() >= -100.0 && interval.upper() <= 100.0);
    }
    assert!(nps.wilson.is_none());
}

#[test]
fn test_coerced_mean_question_warns() {
    let report = run_analysis(&StudyConfig::new(settings(), questions()), &survey()).unwrap();
    let spend = report.result("spend").unwrap();

    assert!(spend.is_success());
    assert_eq!(spend.n_raw, 108);
    assert!(spend.warnings.iter().any(|w| w.contains("converted 108 text values")));
}

#[test]
fn test_weighted_run_uses_effective_n() {
    let config = StudyConfig::new(
        StudySettings {
            weight_variable: Some("weight".to_string()),
            ..settings()
        },
        questions(),
    );
    let report = run_analysis(&config, &survey()).unwrap();

    assert!(report.study.weighted);
    assert_eq!(report.study.actual_n, 120);
    assert!(report.study.effective_n < 120.0);
    assert_relative_eq!(
        report.study.design_effect,
        120.0 / report.study.effective_n,
        epsilon = 1e-9
    );

    let satisfaction = report.result("satisfaction").unwrap();
    assert!(satisfaction.n_eff.unwrap() < satisfaction.n_raw as f64);
}

#[test]
fn test_seeded_runs_are_reproducible() {
    let config = StudyConfig::new(settings(), questions());
    let first = run_analysis(&config, &survey()).unwrap();
    let second = run_analysis_with(&config, &survey(), sequential()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_multiple_comparison_adjustment() {
    let config = StudyConfig::new(
        StudySettings {
            multiple_comparison: Some(MultipleComparisonMethod::Bonferroni),
            ..settings()
        },
        questions(),
    );
    let report = run_analysis(&config, &survey()).unwrap();
    assert_relative_eq!(report.applied_confidence_level, 1.0 - 0.05 / 5.0, epsilon = 1e-12);

    let moe = report.result("aware").unwrap().moe.as_ref().unwrap();
    assert_relative_eq!(moe.interval.confidence_level, 0.99, epsilon = 1e-12);
    assert!(!report.warnings.iter().any(|w| w.contains("Bonferroni")));
}

#[test]
fn test_fdr_reports_unchanged_level() {
    let config = StudyConfig::new(
        StudySettings {
            multiple_comparison: Some(MultipleComparisonMethod::Fdr),
            ..settings()
        },
        questions(),
    );
    let report = run_analysis(&config, &survey()).unwrap();

    assert_eq!(report.applied_confidence_level, 0.95);
    let first = report.warnings.iter().next().unwrap();
    assert!(first.starts_with("FDR selected"));
    assert!(first.contains("0.95"));
}

#[test]
fn test_run_level_errors_abort() {
    let empty = StudyConfig::new(settings(), Vec::new());
    assert!(matches!(run_analysis(&empty, &survey()), Err(Error::Configuration(_))));

    let bad_level = StudyConfig::new(
        StudySettings {
            confidence_level: 1.5,
            ..settings()
        },
        questions(),
    );
    assert!(run_analysis(&bad_level, &survey()).is_err());
}

#[test]
fn test_report_serialises() {
    let report = run_analysis(&StudyConfig::new(settings(), questions()), &survey()).unwrap();
    let json = report.to_json_pretty().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["results"].as_array().unwrap().len(), 5);
    assert_eq!(value["results"][1]["status"]["status"], "skipped");
    assert_eq!(value["results"][0]["estimate"]["statistic_type"], "proportion");
    // Bootstrap draws stay out of the report
    assert!(value["results"][0]["bootstrap"]["diagnostics"].get("draws").is_none());
}

#[cfg(feature = "parallel")]
#[test]
fn test_parallel_run_matches_sequential() {
    let config = StudyConfig::new(settings(), questions());
    let sequential_report = run_analysis(&config, &survey()).unwrap();
    let parallel_report = survey_analysis::run_analysis_parallel(&config, &survey()).unwrap();
    assert_eq!(sequential_report, parallel_report);
}
