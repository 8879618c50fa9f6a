use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    application::repos::{
        CreateTaxonomyParams, RepoError, TaxonomyRepo, TaxonomyWriteRepo, UpdateTaxonomyParams,
    },
    domain::entities::{TaxonomyRecord, TaxonomyWithUsage},
    domain::types::TaxonomyKind,
};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct TaxonomyRow {
    id: Uuid,
    name: String,
    slug: String,
    sort_order: i32,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl TaxonomyRow {
    fn into_record(self, kind: TaxonomyKind) -> TaxonomyRecord {
        TaxonomyRecord {
            id: self.id,
            kind,
            name: self.name,
            slug: self.slug,
            sort_order: self.sort_order,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct TaxonomyUsageRow {
    #[sqlx(flatten)]
    item: TaxonomyRow,
    usage: i64,
}

/// Join tables referencing a taxonomy, with the referencing column.
fn usage_sources(kind: TaxonomyKind) -> &'static [(&'static str, &'static str)] {
    match kind {
        TaxonomyKind::Category => &[
            ("organization_categories", "category_id"),
            ("grant_categories", "category_id"),
        ],
        TaxonomyKind::Area => &[("organization_areas", "area_id")],
        TaxonomyKind::Tag => &[("organization_tags", "tag_id")],
    }
}

fn organization_join(kind: TaxonomyKind) -> (&'static str, &'static str) {
    match kind {
        TaxonomyKind::Category => ("organization_categories", "category_id"),
        TaxonomyKind::Area => ("organization_areas", "area_id"),
        TaxonomyKind::Tag => ("organization_tags", "tag_id"),
    }
}

/// `(SELECT COUNT(*) FROM a WHERE a.col = t.id) + ...`
fn usage_expression(kind: TaxonomyKind) -> String {
    usage_sources(kind)
        .iter()
        .map(|(table, column)| format!("(SELECT COUNT(*) FROM {table} WHERE {column} = t.id)"))
        .collect::<Vec<_>>()
        .join(" + ")
}

fn rows_into_records(rows: Vec<TaxonomyRow>, kind: TaxonomyKind) -> Vec<TaxonomyRecord> {
    rows.into_iter().map(|row| row.into_record(kind)).collect()
}

#[async_trait]
impl TaxonomyRepo for PostgresRepositories {
    async fn list_taxonomy(&self, kind: TaxonomyKind) -> Result<Vec<TaxonomyRecord>, RepoError> {
        let rows = sqlx::query_as::<_, TaxonomyRow>(&format!(
            "SELECT t.id, t.name, t.slug, t.sort_order, t.created_at, t.updated_at \
             FROM {} t ORDER BY t.sort_order ASC, t.id",
            kind.table().table_name()
        ))
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows_into_records(rows, kind))
    }

    async fn list_taxonomy_with_usage(
        &self,
        kind: TaxonomyKind,
    ) -> Result<Vec<TaxonomyWithUsage>, RepoError> {
        let rows = sqlx::query_as::<_, TaxonomyUsageRow>(&format!(
            "SELECT t.id, t.name, t.slug, t.sort_order, t.created_at, t.updated_at, \
             {} AS usage \
             FROM {} t ORDER BY t.sort_order ASC, t.id",
            usage_expression(kind),
            kind.table().table_name()
        ))
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter()
            .map(|row| {
                Ok(TaxonomyWithUsage {
                    usage: Self::convert_count(row.usage)?,
                    record: row.item.into_record(kind),
                })
            })
            .collect()
    }

    async fn find_taxonomy_by_id(
        &self,
        kind: TaxonomyKind,
        id: Uuid,
    ) -> Result<Option<TaxonomyRecord>, RepoError> {
        let row = sqlx::query_as::<_, TaxonomyRow>(&format!(
            "SELECT id, name, slug, sort_order, created_at, updated_at FROM {} WHERE id = $1",
            kind.table().table_name()
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(|row| row.into_record(kind)))
    }

    async fn find_taxonomy_by_slug(
        &self,
        kind: TaxonomyKind,
        slug: &str,
    ) -> Result<Option<TaxonomyRecord>, RepoError> {
        let row = sqlx::query_as::<_, TaxonomyRow>(&format!(
            "SELECT id, name, slug, sort_order, created_at, updated_at FROM {} WHERE slug = $1",
            kind.table().table_name()
        ))
        .bind(slug)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(|row| row.into_record(kind)))
    }

    async fn count_taxonomy_usage(&self, kind: TaxonomyKind, id: Uuid) -> Result<u64, RepoError> {
        let mut total = 0;
        for (table, column) in usage_sources(kind) {
            let count: i64 =
                sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table} WHERE {column} = $1"))
                    .bind(id)
                    .fetch_one(self.pool())
                    .await
                    .map_err(map_sqlx_error)?;
            total += Self::convert_count(count)?;
        }
        Ok(total)
    }

    async fn list_taxonomy_for_organization(
        &self,
        kind: TaxonomyKind,
        organization_id: Uuid,
    ) -> Result<Vec<TaxonomyRecord>, RepoError> {
        let (join_table, column) = organization_join(kind);
        let rows = sqlx::query_as::<_, TaxonomyRow>(&format!(
            "SELECT t.id, t.name, t.slug, t.sort_order, t.created_at, t.updated_at \
             FROM {} t INNER JOIN {join_table} j ON j.{column} = t.id \
             WHERE j.organization_id = $1 ORDER BY t.sort_order ASC, t.id",
            kind.table().table_name()
        ))
        .bind(organization_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows_into_records(rows, kind))
    }

    async fn list_categories_for_grant(
        &self,
        grant_id: Uuid,
    ) -> Result<Vec<TaxonomyRecord>, RepoError> {
        let rows = sqlx::query_as::<_, TaxonomyRow>(
            "SELECT t.id, t.name, t.slug, t.sort_order, t.created_at, t.updated_at \
             FROM categories t INNER JOIN grant_categories gc ON gc.category_id = t.id \
             WHERE gc.grant_id = $1 ORDER BY t.sort_order ASC, t.id",
        )
        .bind(grant_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows_into_records(rows, TaxonomyKind::Category))
    }
}

#[async_trait]
impl TaxonomyWriteRepo for PostgresRepositories {
    async fn create_taxonomy(
        &self,
        kind: TaxonomyKind,
        params: CreateTaxonomyParams,
    ) -> Result<TaxonomyRecord, RepoError> {
        let row = sqlx::query_as::<_, TaxonomyRow>(&format!(
            "INSERT INTO {} (id, name, slug, sort_order) VALUES ($1, $2, $3, $4) \
             RETURNING id, name, slug, sort_order, created_at, updated_at",
            kind.table().table_name()
        ))
        .bind(Uuid::new_v4())
        .bind(&params.name)
        .bind(&params.slug)
        .bind(params.sort_order)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into_record(kind))
    }

    async fn update_taxonomy(
        &self,
        kind: TaxonomyKind,
        id: Uuid,
        params: UpdateTaxonomyParams,
    ) -> Result<TaxonomyRecord, RepoError> {
        let row = sqlx::query_as::<_, TaxonomyRow>(&format!(
            "UPDATE {} SET name = $2, slug = $3, updated_at = now() WHERE id = $1 \
             RETURNING id, name, slug, sort_order, created_at, updated_at",
            kind.table().table_name()
        ))
        .bind(id)
        .bind(&params.name)
        .bind(&params.slug)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into_record(kind))
    }

    async fn delete_taxonomy(&self, kind: TaxonomyKind, id: Uuid) -> Result<(), RepoError> {
        let result = sqlx::query(&format!(
            "DELETE FROM {} WHERE id = $1",
            kind.table().table_name()
        ))
        .bind(id)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_usage_counts_organizations_and_grants() {
        let expr = usage_expression(TaxonomyKind::Category);
        assert!(expr.contains("organization_categories"));
        assert!(expr.contains("grant_categories"));
        assert_eq!(
            usage_expression(TaxonomyKind::Tag),
            "(SELECT COUNT(*) FROM organization_tags WHERE tag_id = t.id)"
        );
    }
}
