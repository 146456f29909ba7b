//! Store integration tests against a file-backed database:
//! - review import and experiment creation survive a reopen
//! - the QGS is frozen at creation
//! - a second sweep over the same grid creates no rows
//! - concurrent performance writes for one string persist exactly once

use futures::future::join_all;
use pretty_assertions::assert_eq;
use rstest::rstest;
use tempfile::TempDir;

use sesg_core::entities::{ModelParams, PerformanceMetrics};
use sesg_core::enums::{SearchStringStatus, SimilarWordStrategy};
use sesg_db::repos::review::{ReviewImport, StudyImport};
use sesg_db::service::SesgService;

fn review(name: &str, n_studies: usize) -> ReviewImport {
    ReviewImport {
        name: name.to_string(),
        min_publication_year: None,
        max_publication_year: Some(2022),
        studies: (0..n_studies)
            .map(|i| StudyImport {
                key: format!("S{i:02}"),
                title: format!("Study number {i}"),
                abstract_text: String::new(),
                keywords: String::new(),
                references: if i + 1 < n_studies {
                    vec![format!("S{:02}", i + 1)]
                } else {
                    Vec::new()
                },
            })
            .collect(),
    }
}

async fn open(dir: &TempDir) -> SesgService {
    let path = dir.path().join("sesg.db");
    SesgService::new_local(path.to_str().unwrap()).await.unwrap()
}

#[tokio::test]
async fn experiment_and_qgs_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let qgs_before = {
        let svc = open(&dir).await;
        let summary = svc.import_review(&review("slr", 9)).await.unwrap();
        let (exp, created) = svc
            .get_or_create_experiment("exp", &summary.review.id, 3)
            .await
            .unwrap();
        assert!(created);
        svc.list_qgs(&exp.id).await.unwrap()
    };

    let svc = open(&dir).await;
    let review = svc.get_review_by_name("slr").await.unwrap();
    let (exp, created) = svc
        .get_or_create_experiment("exp", &review.id, 3)
        .await
        .unwrap();
    assert!(!created);
    assert_eq!(svc.list_qgs(&exp.id).await.unwrap(), qgs_before);
}

#[rstest]
#[case(1, 1)]
#[case(3, 3)]
#[case(20, 9)]
#[tokio::test]
async fn qgs_size_is_capped_by_gs(#[case] requested: usize, #[case] expected: usize) {
    let svc = SesgService::new_local(":memory:").await.unwrap();
    let summary = svc.import_review(&review("slr", 9)).await.unwrap();
    let (exp, _) = svc
        .get_or_create_experiment("exp", &summary.review.id, requested)
        .await
        .unwrap();
    assert_eq!(svc.list_qgs(&exp.id).await.unwrap().len(), expected);
}

#[tokio::test]
async fn repeated_grid_creates_no_rows() {
    let svc = SesgService::new_local(":memory:").await.unwrap();
    let summary = svc.import_review(&review("slr", 3)).await.unwrap();
    let (exp, _) = svc
        .get_or_create_experiment("exp", &summary.review.id, 1)
        .await
        .unwrap();

    let mut created = Vec::new();
    for _ in 0..2 {
        let mut n_created = 0;
        for (n_similar, n_words) in [(0, 5), (1, 5)] {
            let formulation = svc
                .get_or_create_formulation_params(n_similar, n_words)
                .await
                .unwrap();
            for n_topics in [1, 2] {
                let model = ModelParams::Lda(
                    svc.get_or_create_lda_params(n_topics, 0.1).await.unwrap(),
                );
                let (_, was_created) = svc
                    .get_or_create_parameter_set(
                        &exp.id,
                        &formulation,
                        &model,
                        SimilarWordStrategy::Bert,
                    )
                    .await
                    .unwrap();
                n_created += usize::from(was_created);
            }
        }
        created.push(n_created);
    }

    assert_eq!(created, vec![4, 0]);
    assert_eq!(svc.db().count_rows("parameter_sets").await.unwrap(), 4);
    assert_eq!(svc.db().count_rows("formulation_params").await.unwrap(), 2);
    assert_eq!(svc.db().count_rows("lda_params").await.unwrap(), 2);
}

#[tokio::test]
async fn concurrent_writers_persist_once() {
    let dir = TempDir::new().unwrap();
    let svc = open(&dir).await;
    svc.import_review(&review("slr", 3)).await.unwrap();
    let (ss, _) = svc.get_or_create_search_string("q").await.unwrap();

    let metrics = PerformanceMetrics {
        n_results: 4,
        start_set_precision: 0.25,
        ..PerformanceMetrics::default()
    };
    let outcomes = join_all((0..8).map(|_| svc.record_performance(&ss.id, &metrics))).await;

    let written = outcomes
        .into_iter()
        .map(Result::unwrap)
        .filter(Option::is_some)
        .count();
    assert_eq!(written, 1);
    assert_eq!(svc.db().count_rows("performances").await.unwrap(), 1);
    assert_eq!(
        svc.get_search_string(&ss.id).await.unwrap().status,
        SearchStringStatus::Processed
    );
}
