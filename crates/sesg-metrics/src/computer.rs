//! Reduces one result set into a [`PerformanceMetrics`] value.

use std::collections::HashSet;

use sesg_core::entities::{CitationEdge, PerformanceMetrics, Study};
use sesg_db::service::SesgService;

use crate::error::MetricsError;
use crate::graph::{CitationGraph, Traversal};
use crate::similarity::{SimilarityMatcher, normalize_title};

/// Precomputed QGS/GS titles and citation graph of one experiment.
///
/// Built once per search run and shared read-only by all workers.
pub struct PerformanceComputer {
    qgs: Vec<Study>,
    gs: Vec<Study>,
    normalized_qgs: Vec<String>,
    normalized_gs: Vec<String>,
    graph: CitationGraph,
    matcher: SimilarityMatcher,
}

impl PerformanceComputer {
    /// # Errors
    ///
    /// Returns [`MetricsError`] if the threshold is out of range or an edge
    /// names a study outside the GS.
    pub fn new(
        qgs: Vec<Study>,
        gs: Vec<Study>,
        edges: &[CitationEdge],
        threshold: f64,
    ) -> Result<Self, MetricsError> {
        let matcher = SimilarityMatcher::new(threshold)?;
        let graph = CitationGraph::from_edges(gs.iter().map(|s| s.id.as_str()), edges)?;
        Ok(Self {
            normalized_qgs: qgs.iter().map(|s| normalize_title(&s.title)).collect(),
            normalized_gs: gs.iter().map(|s| normalize_title(&s.title)).collect(),
            qgs,
            gs,
            graph,
            matcher,
        })
    }

    /// Load the QGS of `experiment_id` and the GS and edges of its review.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError`] on store failures or bad inputs.
    pub async fn from_service(
        service: &SesgService,
        experiment_id: &str,
        review_id: &str,
        threshold: f64,
    ) -> Result<Self, MetricsError> {
        let qgs = service.list_qgs(experiment_id).await?;
        let gs = service.list_gs(review_id).await?;
        let edges = service.list_citation_edges(review_id).await?;
        tracing::debug!(
            qgs = qgs.len(),
            gs = gs.len(),
            edges = edges.len(),
            "metrics inputs loaded"
        );
        Self::new(qgs, gs, &edges, threshold)
    }

    #[must_use]
    pub fn gs_size(&self) -> usize {
        self.gs.len()
    }

    /// Metrics of one complete result set, given the result titles.
    #[must_use]
    pub fn compute<T: AsRef<str>>(&self, result_titles: &[T]) -> PerformanceMetrics {
        let results: Vec<String> = result_titles
            .iter()
            .map(|t| normalize_title(t.as_ref()))
            .collect();

        let qgs_matches = self.matcher.match_normalized(&self.normalized_qgs, &results);
        // Near-duplicate QGS titles may claim the same result; precision
        // counts each result once.
        let qgs_hits: HashSet<usize> = qgs_matches.iter().map(|&(_, cand)| cand).collect();
        let qgs_in_results: Vec<String> = qgs_matches
            .into_iter()
            .map(|(i, _)| self.qgs[i].id.clone())
            .collect();
        let gs_in_results: Vec<String> = self
            .matcher
            .match_normalized(&self.normalized_gs, &results)
            .into_iter()
            .map(|(i, _)| self.gs[i].id.clone())
            .collect();

        let gs_in_bsb = self.graph.bfs(Traversal::Directed, &gs_in_results);
        let gs_in_sb = self.graph.bfs(Traversal::Undirected, &gs_in_results);

        let n_results = results.len();
        let gs_size = self.gs.len();
        let precision = fraction(qgs_hits.len(), n_results);
        let recall = fraction(gs_in_results.len(), gs_size);

        PerformanceMetrics {
            n_results: n_results as u64,
            start_set_precision: precision,
            start_set_recall: recall,
            start_set_f1: f1(precision, recall),
            bsb_recall: fraction(gs_in_bsb.len(), gs_size),
            sb_recall: fraction(gs_in_sb.len(), gs_size),
            qgs_in_results,
            gs_in_results,
            gs_in_bsb,
            gs_in_sb,
        }
    }
}

/// `part / whole`, or 0 when `whole` is 0.
#[allow(clippy::cast_precision_loss)]
fn fraction(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

fn f1(precision: f64, recall: f64) -> f64 {
    let sum = precision + recall;
    if sum == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / sum
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn study(id: &str, title: &str) -> Study {
        Study {
            id: id.into(),
            review_id: "rev-1".into(),
            key: id.into(),
            title: title.into(),
            abstract_text: String::new(),
            keywords: String::new(),
        }
    }

    fn edge(from: &str, to: &str) -> CitationEdge {
        CitationEdge {
            from_study_id: from.into(),
            to_study_id: to.into(),
        }
    }

    /// GS A → B → C; QGS is {B}.
    fn computer() -> PerformanceComputer {
        let a = study("A", "Mutation testing at scale");
        let b = study("B", "Flaky test detection with machine learning");
        let c = study("C", "Regression test selection for CI pipelines");
        PerformanceComputer::new(
            vec![b.clone()],
            vec![a, b, c],
            &[edge("A", "B"), edge("B", "C")],
            0.85,
        )
        .unwrap()
    }

    #[test]
    fn snowball_scenario() {
        let metrics = computer().compute(&[
            "Flaky Test Detection with Machine Learning.",
            "An unrelated paper",
            "Another unrelated paper",
            "Yet another one",
        ]);

        assert_eq!(metrics.n_results, 4);
        assert_eq!(metrics.qgs_in_results, vec!["B"]);
        assert_eq!(metrics.gs_in_results, vec!["B"]);
        assert_eq!(metrics.gs_in_bsb, vec!["B", "C"]);
        let mut sb = metrics.gs_in_sb.clone();
        sb.sort();
        assert_eq!(sb, vec!["A", "B", "C"]);

        assert!((metrics.start_set_precision - 0.25).abs() < 1e-9);
        assert!((metrics.start_set_recall - 1.0 / 3.0).abs() < 1e-9);
        assert!((metrics.bsb_recall - 2.0 / 3.0).abs() < 1e-9);
        assert!((metrics.sb_recall - 1.0).abs() < 1e-9);
        let expected_f1 = 2.0 * 0.25 * (1.0 / 3.0) / (0.25 + 1.0 / 3.0);
        assert!((metrics.start_set_f1 - expected_f1).abs() < 1e-9);
    }

    #[test]
    fn empty_results_are_all_zero() {
        let none: [&str; 0] = [];
        let metrics = computer().compute(&none);
        assert_eq!(metrics, PerformanceMetrics::default());
    }

    #[test]
    fn empty_gs_gives_zero_recall() {
        let computer = PerformanceComputer::new(Vec::new(), Vec::new(), &[], 0.85).unwrap();
        let metrics = computer.compute(&["anything"]);
        assert_eq!(metrics.n_results, 1);
        assert_eq!(metrics.start_set_recall, 0.0);
        assert_eq!(metrics.start_set_precision, 0.0);
        assert_eq!(metrics.start_set_f1, 0.0);
    }

    fn assert_in_bounds(metrics: &PerformanceMetrics) {
        for value in [
            metrics.start_set_precision,
            metrics.start_set_recall,
            metrics.start_set_f1,
            metrics.bsb_recall,
            metrics.sb_recall,
        ] {
            assert!((0.0..=1.0).contains(&value), "{value}");
        }
        assert!(metrics.gs_in_results.len() <= metrics.gs_in_bsb.len());
        assert!(metrics.gs_in_bsb.len() <= metrics.gs_in_sb.len());
    }

    #[test]
    fn metrics_stay_in_bounds() {
        let metrics = computer().compute(&[
            "Mutation testing at scale",
            "Flaky test detection with machine learning",
            "Regression test selection for CI pipelines",
        ]);
        assert_in_bounds(&metrics);
    }

    /// A conference and a journal version of one paper both match the same
    /// result title.
    #[test]
    fn duplicate_qgs_titles_share_one_result() {
        let conference = study("A", "Flaky test detection");
        let journal = study("B", "Flaky test detection.");
        let computer = PerformanceComputer::new(
            vec![conference.clone(), journal.clone()],
            vec![conference, journal],
            &[],
            0.85,
        )
        .unwrap();

        let metrics = computer.compute(&["Flaky Test Detection"]);

        assert_eq!(metrics.qgs_in_results, vec!["A", "B"]);
        assert_eq!(metrics.start_set_precision, 1.0);
        assert_eq!(metrics.start_set_recall, 1.0);
        assert_in_bounds(&metrics);

        let metrics = computer.compute(&["Flaky Test Detection", "Something else"]);
        assert!((metrics.start_set_precision - 0.5).abs() < 1e-9);
        assert_in_bounds(&metrics);
    }
}
