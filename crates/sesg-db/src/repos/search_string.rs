//! Search-string repository: content-addressed strings and the durable
//! processing marker.

use chrono::Utc;

use sesg_core::entities::SearchString;
use sesg_core::enums::SkipReason;
use sesg_core::ids::PREFIX_SEARCH_STRING;

use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, parse_datetime, parse_enum};
use crate::service::SesgService;

pub(crate) fn row_to_search_string(row: &libsql::Row) -> Result<SearchString, DatabaseError> {
    row_to_search_string_at(row, 0)
}

/// Parse a search string whose [`SEARCH_STRING_COLS`] start at `offset`,
/// for joined selects.
pub(crate) fn row_to_search_string_at(
    row: &libsql::Row,
    offset: i32,
) -> Result<SearchString, DatabaseError> {
    Ok(SearchString {
        id: row.get(offset)?,
        string: row.get(offset + 1)?,
        status: parse_enum(&row.get::<String>(offset + 2)?)?,
        skip_reason: get_opt_string(row, offset + 3)?
            .map(|s| parse_enum(&s))
            .transpose()?,
        created_at: parse_datetime(&row.get::<String>(offset + 4)?)?,
    })
}

pub(crate) const SEARCH_STRING_COLS: &str = "id, string, status, skip_reason, created_at";

impl SesgService {
    pub async fn find_search_string(
        &self,
        string: &str,
    ) -> Result<Option<SearchString>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SEARCH_STRING_COLS} FROM search_strings WHERE string = ?1"),
                [string],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_search_string(&row)?)),
            None => Ok(None),
        }
    }

    /// Return the search string with exactly this text, creating it when
    /// missing. The flag is `true` on create.
    pub async fn get_or_create_search_string(
        &self,
        string: &str,
    ) -> Result<(SearchString, bool), DatabaseError> {
        if let Some(existing) = self.find_search_string(string).await? {
            return Ok((existing, false));
        }

        let id = self.db().generate_id(PREFIX_SEARCH_STRING).await?;
        let now = Utc::now();
        let inserted = self
            .db()
            .conn()
            .execute(
                "INSERT INTO search_strings (id, string, status, created_at) VALUES (?1, ?2, 'pending', ?3)",
                libsql::params![id.as_str(), string, now.to_rfc3339()],
            )
            .await;

        match inserted {
            Ok(_) => Ok((
                SearchString {
                    id,
                    string: string.to_string(),
                    status: sesg_core::enums::SearchStringStatus::Pending,
                    skip_reason: None,
                    created_at: now,
                },
                true,
            )),
            Err(e) => self
                .find_search_string(string)
                .await?
                .map(|existing| (existing, false))
                .ok_or(DatabaseError::LibSql(e)),
        }
    }

    pub async fn get_search_string(&self, id: &str) -> Result<SearchString, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SEARCH_STRING_COLS} FROM search_strings WHERE id = ?1"),
                [id],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        row_to_search_string(&row)
    }

    /// Strings of an experiment that still need a search: linked to one of
    /// its parameter sets, without a performance, and pending. Skipped
    /// strings are included only when `include_skipped` is set.
    ///
    /// Evaluated once before dispatch; a string shared by several parameter
    /// sets appears once.
    pub async fn pending_search_strings(
        &self,
        experiment_id: &str,
        include_skipped: bool,
    ) -> Result<Vec<SearchString>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT s.id, s.string, s.status, s.skip_reason, s.created_at
                   FROM search_strings s
                  WHERE EXISTS (SELECT 1 FROM parameter_sets p
                                 WHERE p.search_string_id = s.id AND p.experiment_id = ?1)
                    AND NOT EXISTS (SELECT 1 FROM performances f WHERE f.search_string_id = s.id)
                    AND (s.status = 'pending' OR (?2 AND s.status = 'skipped'))
                  ORDER BY s.created_at, s.id",
                libsql::params![experiment_id, i64::from(include_skipped)],
            )
            .await?;
        let mut strings = Vec::new();
        while let Some(row) = rows.next().await? {
            strings.push(row_to_search_string(&row)?);
        }
        Ok(strings)
    }

    /// Mark a string the remote refused. A processed string stays processed.
    ///
    /// Returns whether the marker changed.
    pub async fn record_skip(
        &self,
        search_string_id: &str,
        reason: SkipReason,
    ) -> Result<bool, DatabaseError> {
        let _guard = self.write_lock().await;
        let changed = self
            .db()
            .conn()
            .execute(
                "UPDATE search_strings SET status = 'skipped', skip_reason = ?2
                  WHERE id = ?1 AND status != 'processed'",
                libsql::params![search_string_id, reason.as_str()],
            )
            .await?;
        Ok(changed > 0)
    }
}
