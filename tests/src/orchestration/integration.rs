#![cfg(test)]
use std::collections::BTreeSet;
use std::net::{IpAddr, Ipv4Addr};
use std::time::{Duration, Instant};

use checkip_common::check::NOT_AVAILABLE;
use checkip_common::check::registry::Registry;
use checkip_common::check::render::render;
use checkip_common::config::{Config, OutputFormat};
use checkip_common::error::{CheckError, SetupError};
use checkip_core::checks::{self, asn};
use checkip_core::{Orchestrator, RunSummary};

use crate::fakes::{FakeCheck, Outcome};

const TARGET: IpAddr = IpAddr::V4(Ipv4Addr::new(203, 0, 113, 9));

const IDS: [&str; 12] = [
    "alpha", "bravo", "charlie", "delta", "echo", "foxtrot", "golf", "hotel", "india", "juliet",
    "kilo", "lima",
];

fn outcome_for(i: usize) -> Outcome {
    match i % 4 {
        0 => Outcome::Answer,
        1 => Outcome::Fail,
        2 => Outcome::Panic,
        _ => Outcome::Nothing,
    }
}

/// Every dispatched check produces exactly one output, whatever it does and
/// however long it takes.
#[tokio::test]
async fn every_check_reports_exactly_once() {
    let checks = IDS
        .iter()
        .copied()
        .enumerate()
        .map(|(i, id)| FakeCheck::jittered(id, outcome_for(i), 50).shared())
        .collect();

    let (results, summary) = Orchestrator::new(checks).unwrap().collect(TARGET).await;

    assert_eq!(results.len(), IDS.len());
    let names: BTreeSet<&str> = results.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, IDS.iter().copied().collect::<BTreeSet<_>>());

    // 3 answer, 3 fail, 3 panic, 3 report nothing.
    assert_eq!(
        summary,
        RunSummary {
            dispatched: 12,
            succeeded: 6,
            failed: 6
        }
    );
}

#[tokio::test]
async fn repeated_runs_always_complete() {
    for _ in 0..10 {
        let checks = IDS
            .iter()
            .copied()
            .take(6)
            .enumerate()
            .map(|(i, id)| FakeCheck::jittered(id, outcome_for(i), 10).shared())
            .collect();

        let (results, summary) = Orchestrator::new(checks).unwrap().collect(TARGET).await;
        assert_eq!(results.len(), 6);
        assert!(summary.is_complete());
    }
}

#[tokio::test]
async fn failing_check_contributes_its_error() {
    let checks = vec![
        FakeCheck::new("ok", Outcome::Answer).shared(),
        FakeCheck::new("broken", Outcome::Fail).shared(),
    ];

    let (results, _) = Orchestrator::new(checks).unwrap().collect(TARGET).await;

    let broken: Vec<_> = results.iter().filter(|r| r.name == "broken").collect();
    assert_eq!(broken.len(), 1);

    let output = render(broken[0], OutputFormat::Text);
    assert!(output.failed);
    assert_eq!(output.body, "lookup failed: broken failed on purpose");

    let ok = results.iter().find(|r| r.name == "ok").unwrap();
    assert_eq!(render(ok, OutputFormat::Text).body, "ok saw 203.0.113.9");
}

#[tokio::test]
async fn panicking_check_does_not_take_others_down() {
    let checks = vec![
        FakeCheck::new("panics", Outcome::Panic).shared(),
        FakeCheck::delayed("slow", Duration::from_millis(100)).shared(),
    ];

    let (results, summary) = Orchestrator::new(checks).unwrap().collect(TARGET).await;
    assert_eq!(results.len(), 2);
    assert_eq!(summary.failed, 1);

    let panicked = results.iter().find(|r| r.name == "panics").unwrap();
    match &panicked.error {
        Some(CheckError::Aborted(reason)) => {
            assert_eq!(reason, "panicked: panics panicked on purpose")
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let slow = results.iter().find(|r| r.name == "slow").unwrap();
    assert!(slow.error.is_none());
}

#[tokio::test]
async fn checks_run_concurrently() {
    let checks = IDS
        .iter()
        .copied()
        .take(5)
        .map(|id| FakeCheck::delayed(id, Duration::from_millis(300)).shared())
        .collect();

    let start = Instant::now();
    let (results, _) = Orchestrator::new(checks).unwrap().collect(TARGET).await;

    assert_eq!(results.len(), 5);
    assert!(
        start.elapsed() < Duration::from_millis(1200),
        "took {:?}",
        start.elapsed()
    );
}

#[tokio::test]
async fn missing_info_renders_marker() {
    let checks = vec![FakeCheck::new("quiet", Outcome::Nothing).shared()];
    let (results, _) = Orchestrator::new(checks).unwrap().collect(TARGET).await;

    let output = render(&results[0], OutputFormat::Text);
    assert!(!output.failed);
    assert_eq!(output.body, NOT_AVAILABLE);
}

#[tokio::test]
async fn json_output_is_one_document_per_check() {
    let checks = vec![
        FakeCheck::new("ok", Outcome::Answer).shared(),
        FakeCheck::new("broken", Outcome::Fail).shared(),
        FakeCheck::new("opaque", Outcome::Unstructured).shared(),
    ];

    let (results, _) = Orchestrator::new(checks).unwrap().collect(TARGET).await;
    assert_eq!(results.len(), 3);

    for result in &results {
        let output = render(result, OutputFormat::Json);
        let doc: serde_json::Value = serde_json::from_str(&output.to_string()).unwrap();
        assert_eq!(doc["name"], result.name.as_str());
        assert_eq!(doc["type"], "info");

        match result.name.as_str() {
            "ok" => {
                assert!(!output.failed);
                assert_eq!(doc["info"]["target"], "203.0.113.9");
                assert!(doc.get("error").is_none());
            }
            "broken" => {
                assert!(output.failed);
                assert!(doc.get("info").is_none());
            }
            "opaque" => {
                assert!(output.failed);
                let error = doc["error"].as_str().unwrap();
                assert!(error.starts_with("rendering structured output"), "{error}");
            }
            other => panic!("unexpected check {other}"),
        }
    }
}

#[test]
fn invalid_selection_is_a_setup_error() {
    let registry = Registry::new(vec![
        FakeCheck::new("a", Outcome::Answer).shared(),
        FakeCheck::new("b", Outcome::Answer).shared(),
    ]);

    match Orchestrator::from_registry(&registry, &["a", "nope"]) {
        Err(SetupError::UnknownCheck { id, .. }) => assert_eq!(id, "nope"),
        Err(e) => panic!("unexpected error: {e}"),
        Ok(_) => panic!("unknown check accepted"),
    }

    let empty = Registry::new(Vec::new());
    let no_ids: [&str; 0] = [];
    assert!(matches!(
        Orchestrator::from_registry(&empty, &no_ids),
        Err(SetupError::NoChecks)
    ));
}

#[tokio::test]
async fn duplicate_selection_runs_once() {
    let registry = Registry::new(vec![
        FakeCheck::new("a", Outcome::Answer).shared(),
        FakeCheck::new("b", Outcome::Answer).shared(),
    ]);

    let orchestrator = Orchestrator::from_registry(&registry, &["b", "b", "a"]).unwrap();
    assert_eq!(orchestrator.len(), 2);

    let (results, _) = orchestrator.collect(TARGET).await;
    assert_eq!(results.len(), 2);
}

/// The built-in ASN check answers from an already cached dataset.
#[tokio::test]
async fn builtin_asn_check_from_cache() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    std::fs::write(
        dir.path().join(asn::DATASET_FILE),
        "1.0.0.0\t1.0.0.255\t13335\tUS\tCLOUDFLARENET\n",
    )?;

    let cfg = Config {
        cache_dir: dir.path().to_path_buf(),
        ..Config::default()
    };
    let registry = checks::builtin(&cfg)?;
    let orchestrator = Orchestrator::from_registry(&registry, &["asn"])?;

    let target: IpAddr = "1.0.0.5".parse()?;
    let (results, summary) = orchestrator.collect(target).await;

    assert_eq!(summary.succeeded, 1);
    let output = render(&results[0], OutputFormat::Text);
    assert_eq!(output.name, "iptoasn.com");
    assert_eq!(output.body, "AS description: CLOUDFLARENET");

    let json = render(&results[0], OutputFormat::Json).to_string();
    let doc: serde_json::Value = serde_json::from_str(&json)?;
    assert_eq!(doc["info"], serde_json::json!({ "description": "CLOUDFLARENET" }));
    Ok(())
}
