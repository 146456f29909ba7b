//! Performance repository.
//!
//! A performance is written in the same transaction that marks its search
//! string processed, at most once per string. The only later change is the
//! `invalid` flag set by the correction path.

use chrono::Utc;

use sesg_core::entities::{Performance, PerformanceMetrics, SearchString};
use sesg_core::enums::StudySet;
use sesg_core::ids::PREFIX_PERFORMANCE;

use crate::error::DatabaseError;
use crate::helpers::{get_u64, parse_datetime, parse_enum, to_sql_int};
use crate::repos::search_string::row_to_search_string_at;
use crate::service::{SesgService, finish_transaction};

const PERFORMANCE_COLS: &str = "id, search_string_id, n_results, start_set_precision, \
     start_set_recall, start_set_f1, bsb_recall, sb_recall, invalid, created_at";

/// Row without its study lists; those are loaded separately.
fn row_to_performance(row: &libsql::Row) -> Result<Performance, DatabaseError> {
    Ok(Performance {
        id: row.get(0)?,
        search_string_id: row.get(1)?,
        metrics: PerformanceMetrics {
            n_results: get_u64(row, 2)?,
            start_set_precision: row.get(3)?,
            start_set_recall: row.get(4)?,
            start_set_f1: row.get(5)?,
            bsb_recall: row.get(6)?,
            sb_recall: row.get(7)?,
            ..PerformanceMetrics::default()
        },
        invalid: row.get::<i64>(8)? != 0,
        created_at: parse_datetime(&row.get::<String>(9)?)?,
    })
}

fn study_list(metrics: &PerformanceMetrics, set: StudySet) -> &[String] {
    match set {
        StudySet::QgsInResults => &metrics.qgs_in_results,
        StudySet::GsInResults => &metrics.gs_in_results,
        StudySet::GsInBsb => &metrics.gs_in_bsb,
        StudySet::GsInSb => &metrics.gs_in_sb,
    }
}

fn study_list_mut(metrics: &mut PerformanceMetrics, set: StudySet) -> &mut Vec<String> {
    match set {
        StudySet::QgsInResults => &mut metrics.qgs_in_results,
        StudySet::GsInResults => &mut metrics.gs_in_results,
        StudySet::GsInBsb => &mut metrics.gs_in_bsb,
        StudySet::GsInSb => &mut metrics.gs_in_sb,
    }
}

impl SesgService {
    /// Persist the performance of a completed string and mark the string
    /// processed, in one transaction.
    ///
    /// Returns `None` without writing if the string already has a
    /// performance.
    pub async fn record_performance(
        &self,
        search_string_id: &str,
        metrics: &PerformanceMetrics,
    ) -> Result<Option<Performance>, DatabaseError> {
        let id = self.db().generate_id(PREFIX_PERFORMANCE).await?;
        let now = Utc::now();

        let _guard = self.write_lock().await;
        let tx = self.begin().await?;
        let result = async {
            let mut existing = tx
                .query(
                    "SELECT 1 FROM performances WHERE search_string_id = ?1",
                    [search_string_id],
                )
                .await?;
            if existing.next().await?.is_some() {
                return Ok(false);
            }

            tx.execute(
                "INSERT INTO performances
                    (id, search_string_id, n_results, n_qgs_in_results, n_gs_in_results,
                     n_gs_in_bsb, n_gs_in_sb, start_set_precision, start_set_recall,
                     start_set_f1, bsb_recall, sb_recall, invalid, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, 0, ?13)",
                libsql::params![
                    id.as_str(),
                    search_string_id,
                    to_sql_int(metrics.n_results)?,
                    to_sql_int(metrics.qgs_in_results.len())?,
                    to_sql_int(metrics.gs_in_results.len())?,
                    to_sql_int(metrics.gs_in_bsb.len())?,
                    to_sql_int(metrics.gs_in_sb.len())?,
                    metrics.start_set_precision,
                    metrics.start_set_recall,
                    metrics.start_set_f1,
                    metrics.bsb_recall,
                    metrics.sb_recall,
                    now.to_rfc3339()
                ],
            )
            .await?;

            for set in StudySet::ALL {
                for (position, study_id) in study_list(metrics, set).iter().enumerate() {
                    tx.execute(
                        "INSERT OR IGNORE INTO performance_studies
                            (performance_id, set_kind, study_id, position)
                         VALUES (?1, ?2, ?3, ?4)",
                        libsql::params![
                            id.as_str(),
                            set.as_str(),
                            study_id.as_str(),
                            to_sql_int(position)?
                        ],
                    )
                    .await?;
                }
            }

            tx.execute(
                "UPDATE search_strings SET status = 'processed', skip_reason = NULL WHERE id = ?1",
                [search_string_id],
            )
            .await?;
            Ok::<_, DatabaseError>(true)
        }
        .await;

        if !finish_transaction(tx, result).await? {
            tracing::debug!(search_string_id, "performance already recorded; skipping write");
            return Ok(None);
        }

        Ok(Some(Performance {
            id,
            search_string_id: search_string_id.to_string(),
            metrics: metrics.clone(),
            invalid: false,
            created_at: now,
        }))
    }

    /// The performance of a string, with its study lists.
    pub async fn find_performance_for_string(
        &self,
        search_string_id: &str,
    ) -> Result<Option<Performance>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {PERFORMANCE_COLS} FROM performances WHERE search_string_id = ?1"
                ),
                [search_string_id],
            )
            .await?;
        let Some(row) = rows.next().await? else {
            return Ok(None);
        };
        let mut performance = row_to_performance(&row)?;
        drop(rows);
        self.load_study_lists(&mut performance).await?;
        Ok(Some(performance))
    }

    async fn load_study_lists(&self, performance: &mut Performance) -> Result<(), DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT set_kind, study_id FROM performance_studies
                  WHERE performance_id = ?1
                  ORDER BY set_kind, position",
                [performance.id.as_str()],
            )
            .await?;
        while let Some(row) = rows.next().await? {
            let set: StudySet = parse_enum(&row.get::<String>(0)?)?;
            study_list_mut(&mut performance.metrics, set).push(row.get::<String>(1)?);
        }
        Ok(())
    }

    /// Valid performances that look wrong: zero results or zero precision.
    /// Candidates for the correction path, paired with their string.
    pub async fn suspicious_performances(
        &self,
        experiment_id: Option<&str>,
    ) -> Result<Vec<(Performance, SearchString)>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT f.id, f.search_string_id, f.n_results, f.start_set_precision,
                        f.start_set_recall, f.start_set_f1, f.bsb_recall, f.sb_recall,
                        f.invalid, f.created_at,
                        s.id, s.string, s.status, s.skip_reason, s.created_at
                   FROM performances f
                   JOIN search_strings s ON s.id = f.search_string_id
                  WHERE f.invalid = 0
                    AND (f.n_results = 0 OR f.start_set_precision = 0)
                    AND (?1 IS NULL OR EXISTS (
                          SELECT 1 FROM parameter_sets p
                           WHERE p.search_string_id = s.id AND p.experiment_id = ?1))
                  ORDER BY f.created_at, f.id",
                libsql::params![experiment_id],
            )
            .await?;
        let mut found = Vec::new();
        while let Some(row) = rows.next().await? {
            let performance = row_to_performance(&row)?;
            let string = row_to_search_string_at(&row, 10)?;
            found.push((performance, string));
        }
        Ok(found)
    }

    /// Flag a performance invalid. The row and its figures are kept.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if no such performance exists.
    pub async fn flag_performance_invalid(&self, performance_id: &str) -> Result<(), DatabaseError> {
        let _guard = self.write_lock().await;
        let changed = self
            .db()
            .conn()
            .execute(
                "UPDATE performances SET invalid = 1 WHERE id = ?1",
                [performance_id],
            )
            .await?;
        if changed == 0 {
            return Err(DatabaseError::NotFound {
                entity: "performance",
                key: performance_id.to_string(),
            });
        }
        tracing::info!(performance_id, "performance flagged invalid");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use sesg_core::enums::SearchStringStatus;

    use crate::repos::review::fixtures::chain_review;
    use crate::service::test_support::test_service;

    fn metrics(gs: &[String], n_results: u64) -> PerformanceMetrics {
        PerformanceMetrics {
            n_results,
            qgs_in_results: gs[..1].to_vec(),
            gs_in_results: gs[..2].to_vec(),
            gs_in_bsb: gs[..2].to_vec(),
            gs_in_sb: gs.to_vec(),
            start_set_precision: if n_results == 0 { 0.0 } else { 0.1 },
            start_set_recall: 2.0 / 3.0,
            start_set_f1: 0.17,
            bsb_recall: 2.0 / 3.0,
            sb_recall: 1.0,
        }
    }

    async fn setup() -> (crate::service::SesgService, Vec<String>, String) {
        let svc = test_service().await;
        let review = svc.import_review(&chain_review("slr")).await.unwrap().review;
        let gs = svc
            .list_gs(&review.id)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        let (ss, _) = svc.get_or_create_search_string("TITLE-ABS-KEY(a)").await.unwrap();
        (svc, gs, ss.id)
    }

    #[tokio::test]
    async fn performance_is_written_at_most_once() {
        let (svc, gs, ss) = setup().await;
        let first = svc.record_performance(&ss, &metrics(&gs, 10)).await.unwrap();
        assert!(first.is_some());

        let second = svc.record_performance(&ss, &metrics(&gs, 99)).await.unwrap();
        assert!(second.is_none());
        assert_eq!(svc.db().count_rows("performances").await.unwrap(), 1);

        let stored = svc.find_performance_for_string(&ss).await.unwrap().unwrap();
        assert_eq!(stored.metrics.n_results, 10);
    }

    #[tokio::test]
    async fn processed_marker_commits_with_the_performance() {
        let (svc, gs, ss) = setup().await;
        svc.record_skip(&ss, sesg_core::enums::SkipReason::UnprocessableQuery)
            .await
            .unwrap();
        svc.record_performance(&ss, &metrics(&gs, 10)).await.unwrap();

        let string = svc.get_search_string(&ss).await.unwrap();
        assert_eq!(string.status, SearchStringStatus::Processed);
        assert_eq!(string.skip_reason, None);

        // a late skip cannot demote a processed string
        assert!(
            !svc.record_skip(&ss, sesg_core::enums::SkipReason::PayloadTooLarge)
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn study_lists_roundtrip_in_order() {
        let (svc, gs, ss) = setup().await;
        let written = metrics(&gs, 10);
        svc.record_performance(&ss, &written).await.unwrap();

        let stored = svc.find_performance_for_string(&ss).await.unwrap().unwrap();
        assert_eq!(stored.metrics, written);
        assert!(!stored.invalid);
    }

    #[tokio::test]
    async fn suspicious_and_flagging() {
        let (svc, gs, ss) = setup().await;
        let performance = svc
            .record_performance(&ss, &metrics(&gs, 0))
            .await
            .unwrap()
            .unwrap();

        let suspicious = svc.suspicious_performances(None).await.unwrap();
        assert_eq!(suspicious.len(), 1);
        assert_eq!(suspicious[0].1.string, "TITLE-ABS-KEY(a)");

        svc.flag_performance_invalid(&performance.id).await.unwrap();
        assert!(svc.suspicious_performances(None).await.unwrap().is_empty());
        let stored = svc.find_performance_for_string(&ss).await.unwrap().unwrap();
        assert!(stored.invalid);
        assert_eq!(stored.metrics.n_results, 0);
    }
}
