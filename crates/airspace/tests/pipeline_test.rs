//! Integration tests for the refresh-and-filter pipeline

use airspace::data::DataError;
use airspace::data::cache::{FetchLog, RefetchReason};
use airspace::data::fetch::Fetcher;
use airspace::{AirspaceConfig, FreshnessSource, Pipeline, PipelineError, RunOutcome};
use chrono::{SubsecRound, TimeDelta, Utc};
use rstest::{fixture, rstest};
use serde_json::{Value, json};
use std::fs::File;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

const EXAMPLE_RAW: &str = r#"{"features":[{"properties":{"HX":true,"Name":"Meiringen TMA"}},{"properties":{"HX":false,"Name":"Meiringen CTR"}},{"properties":{"HX":true,"Name":"Zurich TMA"}}]}"#;

const PREVIOUS_OUTPUT: &str = "[\"previous run\"]";

/// Serves a canned body (or a status error) and counts requests.
struct FakeFetcher {
    response: Result<Vec<u8>, u16>,
    calls: AtomicUsize,
}

impl FakeFetcher {
    fn serving(body: &str) -> Self {
        Self {
            response: Ok(body.as_bytes().to_vec()),
            calls: AtomicUsize::new(0),
        }
    }

    fn failing(status: u16) -> Self {
        Self {
            response: Err(status),
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Fetcher for FakeFetcher {
    fn fetch(&self, url: &str) -> impl Future<Output = airspace::data::Result<Vec<u8>>> + Send {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let result = match &self.response {
            Ok(body) => Ok(body.clone()),
            Err(status) => Err(DataError::Http {
                url: url.to_string(),
                status: *status,
            }),
        };
        async move { result }
    }
}

struct Workspace {
    dir: TempDir,
    config: AirspaceConfig,
}

impl Workspace {
    fn raw_path(&self) -> &Path {
        &self.config.raw_path
    }

    fn processed_path(&self) -> &Path {
        &self.config.processed_path
    }

    fn write_raw(&self, content: &str, age_days: u64) {
        std::fs::write(self.raw_path(), content).unwrap();
        let file = File::options().write(true).open(self.raw_path()).unwrap();
        file.set_modified(SystemTime::now() - Duration::from_secs(age_days * 86_400))
            .unwrap();
    }

    fn write_previous_output(&self) {
        std::fs::write(self.processed_path(), PREVIOUS_OUTPUT).unwrap();
    }

    fn processed(&self) -> Value {
        serde_json::from_str(&std::fs::read_to_string(self.processed_path()).unwrap()).unwrap()
    }

    fn processed_text(&self) -> String {
        std::fs::read_to_string(self.processed_path()).unwrap()
    }
}

#[fixture]
fn workspace() -> Workspace {
    let dir = tempfile::tempdir().unwrap();
    let config = AirspaceConfig {
        url: "https://example.test/api/v1/geojson/airspaces".to_string(),
        raw_path: dir.path().join("public").join("shv_airspaces.json"),
        processed_path: dir.path().join("public").join("shv_airspaces_processed.json"),
        ..AirspaceConfig::default()
    };
    std::fs::create_dir_all(dir.path().join("public")).unwrap();
    Workspace { dir, config }
}

fn expected_example_output() -> Value {
    json!([{"properties": {"HX": true, "Name": "Meiringen TMA"}}])
}

#[rstest]
#[tokio::test]
async fn test_missing_cache_fetches_and_filters(workspace: Workspace) {
    let pipeline =
        Pipeline::new(workspace.config.clone(), FakeFetcher::serving(EXAMPLE_RAW)).unwrap();

    let outcome = pipeline.run(false).await.unwrap();

    assert_eq!(pipeline.fetcher().calls(), 1);
    match outcome {
        RunOutcome::Processed {
            refetch,
            fetched_bytes,
            summary,
        } => {
            assert_eq!(refetch, Some(RefetchReason::Missing));
            assert_eq!(fetched_bytes, Some(EXAMPLE_RAW.len() as u64));
            assert_eq!(summary.total, 3);
            assert_eq!(summary.retained, 1);
        }
        other => panic!("expected processed outcome, got {other:?}"),
    }
    assert_eq!(
        std::fs::read_to_string(workspace.raw_path()).unwrap(),
        EXAMPLE_RAW
    );
    assert_eq!(workspace.processed(), expected_example_output());
}

#[rstest]
#[tokio::test]
async fn test_fresh_cache_skips_fetch_and_filter(workspace: Workspace) {
    workspace.write_raw(EXAMPLE_RAW, 3);
    workspace.write_previous_output();
    let pipeline =
        Pipeline::new(workspace.config.clone(), FakeFetcher::serving("{}")).unwrap();

    let outcome = pipeline.run(false).await.unwrap();

    assert_eq!(pipeline.fetcher().calls(), 0);
    match outcome {
        RunOutcome::StillFresh { remaining } => {
            assert!(remaining > TimeDelta::days(3) && remaining <= TimeDelta::days(4));
        }
        other => panic!("expected fresh outcome, got {other:?}"),
    }
    assert_eq!(workspace.processed_text(), PREVIOUS_OUTPUT);
}

#[rstest]
#[tokio::test]
async fn test_stale_cache_is_refetched(workspace: Workspace) {
    workspace.write_raw(r#"{"features":[]}"#, 8);
    workspace.write_previous_output();
    let pipeline =
        Pipeline::new(workspace.config.clone(), FakeFetcher::serving(EXAMPLE_RAW)).unwrap();

    let outcome = pipeline.run(false).await.unwrap();

    assert_eq!(pipeline.fetcher().calls(), 1);
    assert!(matches!(
        outcome,
        RunOutcome::Processed {
            refetch: Some(RefetchReason::Stale { .. }),
            ..
        }
    ));
    assert_eq!(workspace.processed(), expected_example_output());
}

#[rstest]
#[tokio::test]
async fn test_force_refetches_fresh_cache(workspace: Workspace) {
    workspace.write_raw(r#"{"features":[]}"#, 1);
    let pipeline =
        Pipeline::new(workspace.config.clone(), FakeFetcher::serving(EXAMPLE_RAW)).unwrap();

    let outcome = pipeline.run(true).await.unwrap();

    assert_eq!(pipeline.fetcher().calls(), 1);
    assert!(matches!(
        outcome,
        RunOutcome::Processed {
            refetch: Some(RefetchReason::Forced),
            ..
        }
    ));
    assert_eq!(workspace.processed(), expected_example_output());
}

#[rstest]
#[tokio::test]
async fn test_force_reprocesses_without_refetch_when_configured(mut workspace: Workspace) {
    workspace.config.force_always_refetches = false;
    workspace.write_raw(EXAMPLE_RAW, 1);
    workspace.write_previous_output();
    let pipeline =
        Pipeline::new(workspace.config.clone(), FakeFetcher::serving("{}")).unwrap();

    let outcome = pipeline.run(true).await.unwrap();

    assert_eq!(pipeline.fetcher().calls(), 0);
    assert!(matches!(
        outcome,
        RunOutcome::Processed {
            refetch: None,
            fetched_bytes: None,
            ..
        }
    ));
    assert_eq!(workspace.processed(), expected_example_output());
}

#[rstest]
#[tokio::test]
async fn test_fetch_failure_leaves_files_untouched(workspace: Workspace) {
    workspace.write_raw(EXAMPLE_RAW, 10);
    workspace.write_previous_output();
    let pipeline =
        Pipeline::new(workspace.config.clone(), FakeFetcher::failing(502)).unwrap();

    let err = pipeline.run(false).await.unwrap_err();

    assert!(matches!(
        err,
        PipelineError::Data(DataError::Http { status: 502, .. })
    ));
    assert_eq!(
        std::fs::read_to_string(workspace.raw_path()).unwrap(),
        EXAMPLE_RAW
    );
    assert_eq!(workspace.processed_text(), PREVIOUS_OUTPUT);
}

#[rstest]
#[tokio::test]
async fn test_invalid_payload_keeps_previous_output(workspace: Workspace) {
    workspace.write_previous_output();
    let pipeline = Pipeline::new(
        workspace.config.clone(),
        FakeFetcher::serving(r#"{"type":"FeatureCollection"}"#),
    )
    .unwrap();

    let err = pipeline.run(false).await.unwrap_err();

    assert!(err.to_string().contains("'features'"));
    assert_eq!(workspace.processed_text(), PREVIOUS_OUTPUT);
}

#[rstest]
#[tokio::test]
async fn test_fetch_log_drives_freshness(mut workspace: Workspace) {
    workspace.config.freshness_source = FreshnessSource::FetchLog;
    let pipeline = Pipeline::new(workspace.config.clone(), FakeFetcher::serving(EXAMPLE_RAW))
        .unwrap()
        .with_fetch_log(FetchLog::in_memory().unwrap());
    let start = Utc::now().trunc_subsecs(0);

    let first = pipeline.run_at(false, start).await.unwrap();
    assert!(matches!(
        first,
        RunOutcome::Processed {
            refetch: Some(RefetchReason::Missing),
            ..
        }
    ));
    let recorded = pipeline
        .fetch_log()
        .unwrap()
        .last_fetch(workspace.raw_path())
        .unwrap()
        .unwrap();
    assert_eq!(recorded.bytes, EXAMPLE_RAW.len() as u64);

    let second = pipeline
        .run_at(false, start + TimeDelta::days(3))
        .await
        .unwrap();
    assert_eq!(
        second,
        RunOutcome::StillFresh {
            remaining: TimeDelta::days(4)
        }
    );

    let third = pipeline
        .run_at(false, start + TimeDelta::days(8))
        .await
        .unwrap();
    assert!(matches!(
        third,
        RunOutcome::Processed {
            refetch: Some(RefetchReason::Stale { .. }),
            ..
        }
    ));
    assert_eq!(pipeline.fetcher().calls(), 2);
}

#[rstest]
#[tokio::test]
async fn test_unrecorded_cache_is_refetched_with_fetch_log(mut workspace: Workspace) {
    workspace.config.freshness_source = FreshnessSource::FetchLog;
    workspace.write_raw(EXAMPLE_RAW, 0);
    let pipeline = Pipeline::new(workspace.config.clone(), FakeFetcher::serving(EXAMPLE_RAW))
        .unwrap()
        .with_fetch_log(FetchLog::in_memory().unwrap());

    let outcome = pipeline.run(false).await.unwrap();

    assert!(matches!(
        outcome,
        RunOutcome::Processed {
            refetch: Some(RefetchReason::Unrecorded),
            ..
        }
    ));
}

#[rstest]
#[tokio::test]
async fn test_fetch_log_source_requires_log(mut workspace: Workspace) {
    workspace.config.freshness_source = FreshnessSource::FetchLog;
    workspace.write_raw(EXAMPLE_RAW, 0);
    let pipeline =
        Pipeline::new(workspace.config.clone(), FakeFetcher::serving(EXAMPLE_RAW)).unwrap();

    let err = pipeline.run(false).await.unwrap_err();

    assert!(matches!(err, PipelineError::Config(_)));
    assert_eq!(pipeline.fetcher().calls(), 0);
}

#[test]
fn test_empty_relevant_areas_rejected() {
    let config = AirspaceConfig {
        relevant_areas: vec![" ".to_string()],
        ..AirspaceConfig::default()
    };

    let result = Pipeline::new(config, FakeFetcher::serving("{}"));

    assert!(matches!(result, Err(PipelineError::Config(_))));
}

#[rstest]
fn test_workspace_paths_live_in_tempdir(workspace: Workspace) {
    assert!(workspace.raw_path().starts_with(workspace.dir.path()));
    assert!(workspace.processed_path().starts_with(workspace.dir.path()));
}
