//! Allocation repository: summary persistence and filtered reads.
//!
//! Summaries are regenerated per upload window: the date range covered by an
//! upload is deleted and the freshly aggregated groups are inserted in one
//! transaction, so re-uploading a corrected file is idempotent.

use chrono::{Datelike, NaiveDate, Utc};
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use serde_json::Value as JsonValue;
use uuid::Uuid;
use worktally_core::allocation::AllocationGroup;
use worktally_core::vocab::RequestType;
use worktally_shared::types::PageRequest;

use crate::entities::allocation_summaries;

/// Error types for allocation operations.
#[derive(Debug, thiserror::Error)]
pub enum AllocationError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Filters for summary reads. All fields are optional and combine with AND.
#[derive(Debug, Clone, Copy, Default)]
pub struct SummaryFilter {
    /// Restrict to one geography.
    pub geography_id: Option<Uuid>,
    /// Restrict to one client.
    pub client_id: Option<Uuid>,
    /// Restrict to one project.
    pub project_id: Option<Uuid>,
    /// Restrict to one subproject.
    pub subproject_id: Option<Uuid>,
    /// Restrict to one request type.
    pub request_type: Option<RequestType>,
    /// Restrict to dates on or after this.
    pub from: Option<NaiveDate>,
    /// Restrict to dates on or before this.
    pub to: Option<NaiveDate>,
}

/// A (subproject, request type) count used for grand-total billing.
#[derive(Debug, Clone)]
pub struct GroupCount {
    /// Subproject ID.
    pub subproject_id: Uuid,
    /// Stored request-type label.
    pub request_type: String,
    /// Summed allocation count.
    pub count: i64,
}

/// Allocation repository over the allocation_summaries table.
#[derive(Debug)]
pub struct AllocationRepository {
    db: DatabaseConnection,
}

impl AllocationRepository {
    /// Creates a new allocation repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Replaces the summaries covering `[start, end]` with fresh groups.
    ///
    /// Runs in one transaction: readers see either the old window or the new
    /// one, never a half-written mix. Returns the number of inserted rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction fails; the window is then
    /// untouched.
    pub async fn replace_window(
        &self,
        groups: &[AllocationGroup],
        start: NaiveDate,
        end: NaiveDate,
        batch_size: usize,
    ) -> Result<u64, AllocationError> {
        let txn = self.db.begin().await?;
        let now = Utc::now().into();

        let deleted = allocation_summaries::Entity::delete_many()
            .filter(allocation_summaries::Column::AllocationDate.gte(start))
            .filter(allocation_summaries::Column::AllocationDate.lte(end))
            .exec(&txn)
            .await?;

        let models: Vec<allocation_summaries::ActiveModel> = groups
            .iter()
            .map(|group| allocation_summaries::ActiveModel {
                id: Set(Uuid::new_v4()),
                geography_id: Set(group.geography_id),
                client_id: Set(group.client_id),
                project_id: Set(group.project_id),
                subproject_id: Set(group.subproject_id),
                geography_name: Set(group.geography_name.clone()),
                client_name: Set(group.client_name.clone()),
                project_name: Set(group.project_name.clone()),
                subproject_name: Set(group.subproject_name.clone()),
                request_type: Set(group.request_type.label().to_string()),
                allocation_date: Set(group.date),
                day: Set(group.date.day().cast_signed()),
                month: Set(group.date.month().cast_signed()),
                year: Set(group.date.year()),
                count: Set(i64::try_from(group.count).unwrap_or(i64::MAX)),
                resource_names: Set(JsonValue::from(group.resource_names.clone())),
                created_at: Set(now),
            })
            .collect();

        let inserted = models.len() as u64;
        for chunk in models.chunks(batch_size.max(1)) {
            allocation_summaries::Entity::insert_many(chunk.to_vec())
                .exec(&txn)
                .await?;
        }

        txn.commit().await?;
        tracing::info!(
            start = %start,
            end = %end,
            deleted = deleted.rows_affected,
            inserted,
            "allocation window replaced"
        );
        Ok(inserted)
    }

    /// Lists summaries matching a filter, newest date first, paginated.
    ///
    /// Returns the page of rows and the total match count.
    ///
    /// # Errors
    ///
    /// Returns an error if a database query fails.
    pub async fn list(
        &self,
        filter: SummaryFilter,
        page: &PageRequest,
    ) -> Result<(Vec<allocation_summaries::Model>, u64), AllocationError> {
        let query = Self::filtered(filter);

        let total = query.clone().count(&self.db).await?;
        let rows = query
            .order_by_desc(allocation_summaries::Column::AllocationDate)
            .order_by_asc(allocation_summaries::Column::SubprojectName)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        Ok((rows, total))
    }

    /// Returns per-(subproject, request type) counts across the whole filter
    /// match, for grand-total billing independent of pagination.
    ///
    /// # Errors
    ///
    /// Returns an error if a database query fails.
    pub async fn group_counts(
        &self,
        filter: SummaryFilter,
    ) -> Result<Vec<GroupCount>, AllocationError> {
        let rows: Vec<(Uuid, String, Option<i64>)> = Self::filtered(filter)
            .select_only()
            .column(allocation_summaries::Column::SubprojectId)
            .column(allocation_summaries::Column::RequestType)
            .column_as(allocation_summaries::Column::Count.sum(), "count")
            .group_by(allocation_summaries::Column::SubprojectId)
            .group_by(allocation_summaries::Column::RequestType)
            .into_tuple()
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(subproject_id, request_type, count)| GroupCount {
                subproject_id,
                request_type,
                count: count.unwrap_or(0),
            })
            .collect())
    }

    /// Returns the distinct subproject IDs present in the filter match.
    ///
    /// # Errors
    ///
    /// Returns an error if a database query fails.
    pub async fn subproject_ids(
        &self,
        filter: SummaryFilter,
    ) -> Result<Vec<Uuid>, AllocationError> {
        let ids: Vec<Uuid> = Self::filtered(filter)
            .select_only()
            .column(allocation_summaries::Column::SubprojectId)
            .distinct()
            .into_tuple()
            .all(&self.db)
            .await?;
        Ok(ids)
    }

    fn filtered(filter: SummaryFilter) -> sea_orm::Select<allocation_summaries::Entity> {
        let mut query = allocation_summaries::Entity::find();
        if let Some(id) = filter.geography_id {
            query = query.filter(allocation_summaries::Column::GeographyId.eq(id));
        }
        if let Some(id) = filter.client_id {
            query = query.filter(allocation_summaries::Column::ClientId.eq(id));
        }
        if let Some(id) = filter.project_id {
            query = query.filter(allocation_summaries::Column::ProjectId.eq(id));
        }
        if let Some(id) = filter.subproject_id {
            query = query.filter(allocation_summaries::Column::SubprojectId.eq(id));
        }
        if let Some(request_type) = filter.request_type {
            query = query.filter(allocation_summaries::Column::RequestType.eq(request_type.label()));
        }
        if let Some(from) = filter.from {
            query = query.filter(allocation_summaries::Column::AllocationDate.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(allocation_summaries::Column::AllocationDate.lte(to));
        }
        query
    }
}
