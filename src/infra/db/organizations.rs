use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    application::pagination::{PageRequest, Paged},
    application::repos::{
        OrganizationParams, OrganizationQueryFilter, OrganizationsRepo, OrganizationsWriteRepo,
        PublicationScope, RepoError,
    },
    domain::entities::{OrganizationLinks, OrganizationRecord},
};

use super::{PostgresRepositories, map_sqlx_error, util::contains_pattern};

const ORGANIZATION_COLUMNS: &str = "o.id, o.name, o.slug, o.summary, o.description, \
    o.activity_schedule, o.membership_info, o.contact_name, o.contact_email, o.contact_phone, \
    o.website_url, o.address, o.logo_url, o.is_published, o.is_featured, o.is_recruiting, \
    o.published_at, o.created_at, o.updated_at";

const RETURNING_COLUMNS: &str = "id, name, slug, summary, description, activity_schedule, \
    membership_info, contact_name, contact_email, contact_phone, website_url, address, logo_url, \
    is_published, is_featured, is_recruiting, published_at, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct OrganizationRow {
    id: Uuid,
    name: String,
    slug: String,
    summary: Option<String>,
    description: Option<String>,
    activity_schedule: Option<String>,
    membership_info: Option<String>,
    contact_name: Option<String>,
    contact_email: Option<String>,
    contact_phone: Option<String>,
    website_url: Option<String>,
    address: Option<String>,
    logo_url: Option<String>,
    is_published: bool,
    is_featured: bool,
    is_recruiting: bool,
    published_at: Option<OffsetDateTime>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<OrganizationRow> for OrganizationRecord {
    fn from(row: OrganizationRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            summary: row.summary,
            description: row.description,
            activity_schedule: row.activity_schedule,
            membership_info: row.membership_info,
            contact_name: row.contact_name,
            contact_email: row.contact_email,
            contact_phone: row.contact_phone,
            website_url: row.website_url,
            address: row.address,
            logo_url: row.logo_url,
            is_published: row.is_published,
            is_featured: row.is_featured,
            is_recruiting: row.is_recruiting,
            published_at: row.published_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl PostgresRepositories {
    fn apply_organization_filter<'q>(
        qb: &mut QueryBuilder<'q, Postgres>,
        scope: PublicationScope,
        filter: &'q OrganizationQueryFilter,
    ) {
        qb.push(" WHERE TRUE ");
        if scope == PublicationScope::Public {
            qb.push(" AND o.is_published = TRUE ");
        }

        for (slug, join_table, master_table, column) in [
            (
                filter.category.as_ref(),
                "organization_categories",
                "categories",
                "category_id",
            ),
            (filter.area.as_ref(), "organization_areas", "areas", "area_id"),
            (filter.tag.as_ref(), "organization_tags", "tags", "tag_id"),
        ] {
            let Some(slug) = slug else { continue };
            qb.push(format!(
                " AND EXISTS (SELECT 1 FROM {join_table} j INNER JOIN {master_table} m \
                 ON m.id = j.{column} WHERE j.organization_id = o.id AND m.slug = "
            ));
            qb.push_bind(slug);
            qb.push(")");
        }

        if filter.recruiting_only {
            qb.push(" AND o.is_recruiting = TRUE ");
        }

        if let Some(search) = filter.search.as_ref() {
            let pattern = contains_pattern(search);
            qb.push(" AND (o.name ILIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" ESCAPE '\\' OR o.summary ILIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" ESCAPE '\\' OR o.description ILIKE ");
            qb.push_bind(pattern);
            qb.push(" ESCAPE '\\')");
        }
    }

    async fn replace_organization_links(
        tx: &mut Transaction<'_, Postgres>,
        organization_id: Uuid,
        links: &OrganizationLinks,
    ) -> Result<(), RepoError> {
        for (join_table, column, ids) in [
            ("organization_categories", "category_id", &links.category_ids),
            ("organization_areas", "area_id", &links.area_ids),
            ("organization_tags", "tag_id", &links.tag_ids),
        ] {
            sqlx::query(&format!(
                "DELETE FROM {join_table} WHERE organization_id = $1"
            ))
            .bind(organization_id)
            .execute(tx.as_mut())
            .await
            .map_err(map_sqlx_error)?;

            if ids.is_empty() {
                continue;
            }

            sqlx::query(&format!(
                "INSERT INTO {join_table} (organization_id, {column}) \
                 SELECT $1, linked FROM UNNEST($2::uuid[]) AS linked \
                 ON CONFLICT DO NOTHING"
            ))
            .bind(organization_id)
            .bind(ids.as_slice())
            .execute(tx.as_mut())
            .await
            .map_err(map_sqlx_error)?;
        }
        Ok(())
    }

    async fn linked_ids(
        &self,
        join_table: &str,
        column: &str,
        organization_id: Uuid,
    ) -> Result<Vec<Uuid>, RepoError> {
        sqlx::query_scalar::<_, Uuid>(&format!(
            "SELECT {column} FROM {join_table} WHERE organization_id = $1"
        ))
        .bind(organization_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)
    }
}

#[async_trait]
impl OrganizationsRepo for PostgresRepositories {
    async fn list_organizations(
        &self,
        scope: PublicationScope,
        filter: &OrganizationQueryFilter,
        page: PageRequest,
    ) -> Result<Paged<OrganizationRecord>, RepoError> {
        let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM organizations o");
        Self::apply_organization_filter(&mut count_qb, scope, filter);
        let total: i64 = count_qb
            .build_query_scalar::<i64>()
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        let mut qb = QueryBuilder::new(format!("SELECT {ORGANIZATION_COLUMNS} FROM organizations o"));
        Self::apply_organization_filter(&mut qb, scope, filter);
        match scope {
            PublicationScope::Public => qb.push(
                " ORDER BY o.is_featured DESC, o.published_at DESC NULLS LAST, o.name ASC, o.id ",
            ),
            PublicationScope::Admin => qb.push(" ORDER BY o.updated_at DESC, o.id "),
        };
        qb.push(" LIMIT ");
        qb.push_bind(page.limit());
        qb.push(" OFFSET ");
        qb.push_bind(page.offset());

        let rows: Vec<OrganizationRow> = qb
            .build_query_as::<OrganizationRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(Paged::new(
            rows.into_iter().map(OrganizationRecord::from).collect(),
            Self::convert_count(total)?,
            page,
        ))
    }

    async fn list_all_organizations(&self) -> Result<Vec<OrganizationRecord>, RepoError> {
        let rows = sqlx::query_as::<_, OrganizationRow>(&format!(
            "SELECT {ORGANIZATION_COLUMNS} FROM organizations o ORDER BY o.name ASC, o.id"
        ))
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(OrganizationRecord::from).collect())
    }

    async fn list_featured_organizations(
        &self,
        limit: u32,
    ) -> Result<Vec<OrganizationRecord>, RepoError> {
        let rows = sqlx::query_as::<_, OrganizationRow>(&format!(
            "SELECT {ORGANIZATION_COLUMNS} FROM organizations o \
             WHERE o.is_published = TRUE AND o.is_featured = TRUE \
             ORDER BY o.published_at DESC NULLS LAST, o.name ASC \
             LIMIT $1"
        ))
        .bind(i64::from(limit))
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(OrganizationRecord::from).collect())
    }

    async fn find_organization_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<OrganizationRecord>, RepoError> {
        let row = sqlx::query_as::<_, OrganizationRow>(&format!(
            "SELECT {ORGANIZATION_COLUMNS} FROM organizations o WHERE o.id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(OrganizationRecord::from))
    }

    async fn find_organization_by_slug(
        &self,
        scope: PublicationScope,
        slug: &str,
    ) -> Result<Option<OrganizationRecord>, RepoError> {
        let row = sqlx::query_as::<_, OrganizationRow>(&format!(
            "SELECT {ORGANIZATION_COLUMNS} FROM organizations o \
             WHERE o.slug = $1 AND ($2 OR o.is_published = TRUE)"
        ))
        .bind(slug)
        .bind(scope == PublicationScope::Admin)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(OrganizationRecord::from))
    }

    async fn organization_links(&self, id: Uuid) -> Result<OrganizationLinks, RepoError> {
        Ok(OrganizationLinks {
            category_ids: self
                .linked_ids("organization_categories", "category_id", id)
                .await?,
            area_ids: self.linked_ids("organization_areas", "area_id", id).await?,
            tag_ids: self.linked_ids("organization_tags", "tag_id", id).await?,
        })
    }

    async fn count_featured_organizations(&self) -> Result<u64, RepoError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM organizations WHERE is_featured = TRUE")
                .fetch_one(self.pool())
                .await
                .map_err(map_sqlx_error)?;
        Self::convert_count(count)
    }
}

#[async_trait]
impl OrganizationsWriteRepo for PostgresRepositories {
    async fn create_organization(
        &self,
        params: OrganizationParams,
    ) -> Result<OrganizationRecord, RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        let row = sqlx::query_as::<_, OrganizationRow>(&format!(
            "INSERT INTO organizations (id, name, slug, summary, description, activity_schedule, \
             membership_info, contact_name, contact_email, contact_phone, website_url, address, \
             logo_url, is_recruiting) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
             RETURNING {RETURNING_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&params.name)
        .bind(&params.slug)
        .bind(&params.summary)
        .bind(&params.description)
        .bind(&params.activity_schedule)
        .bind(&params.membership_info)
        .bind(&params.contact_name)
        .bind(&params.contact_email)
        .bind(&params.contact_phone)
        .bind(&params.website_url)
        .bind(&params.address)
        .bind(&params.logo_url)
        .bind(params.is_recruiting)
        .fetch_one(tx.as_mut())
        .await
        .map_err(map_sqlx_error)?;

        Self::replace_organization_links(&mut tx, row.id, &params.links).await?;
        tx.commit().await.map_err(map_sqlx_error)?;

        Ok(OrganizationRecord::from(row))
    }

    async fn update_organization(
        &self,
        id: Uuid,
        params: OrganizationParams,
    ) -> Result<OrganizationRecord, RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        let row = sqlx::query_as::<_, OrganizationRow>(&format!(
            "UPDATE organizations SET name = $2, slug = $3, summary = $4, description = $5, \
             activity_schedule = $6, membership_info = $7, contact_name = $8, \
             contact_email = $9, contact_phone = $10, website_url = $11, address = $12, \
             logo_url = $13, is_recruiting = $14, updated_at = now() \
             WHERE id = $1 RETURNING {RETURNING_COLUMNS}"
        ))
        .bind(id)
        .bind(&params.name)
        .bind(&params.slug)
        .bind(&params.summary)
        .bind(&params.description)
        .bind(&params.activity_schedule)
        .bind(&params.membership_info)
        .bind(&params.contact_name)
        .bind(&params.contact_email)
        .bind(&params.contact_phone)
        .bind(&params.website_url)
        .bind(&params.address)
        .bind(&params.logo_url)
        .bind(params.is_recruiting)
        .fetch_one(tx.as_mut())
        .await
        .map_err(map_sqlx_error)?;

        Self::replace_organization_links(&mut tx, id, &params.links).await?;
        tx.commit().await.map_err(map_sqlx_error)?;

        Ok(OrganizationRecord::from(row))
    }

    async fn delete_organization(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        Self::replace_organization_links(&mut tx, id, &OrganizationLinks::default()).await?;
        let result = sqlx::query("DELETE FROM organizations WHERE id = $1")
            .bind(id)
            .execute(tx.as_mut())
            .await
            .map_err(map_sqlx_error)?;
        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn set_organization_published(
        &self,
        id: Uuid,
        published: bool,
    ) -> Result<OrganizationRecord, RepoError> {
        let row = sqlx::query_as::<_, OrganizationRow>(&format!(
            "UPDATE organizations SET is_published = $2, \
             published_at = CASE WHEN $2 THEN COALESCE(published_at, now()) ELSE NULL END, \
             updated_at = now() \
             WHERE id = $1 RETURNING {RETURNING_COLUMNS}"
        ))
        .bind(id)
        .bind(published)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(OrganizationRecord::from(row))
    }

    async fn set_organization_featured(
        &self,
        id: Uuid,
        featured: bool,
    ) -> Result<OrganizationRecord, RepoError> {
        let row = sqlx::query_as::<_, OrganizationRow>(&format!(
            "UPDATE organizations SET is_featured = $2, updated_at = now() \
             WHERE id = $1 RETURNING {RETURNING_COLUMNS}"
        ))
        .bind(id)
        .bind(featured)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(OrganizationRecord::from(row))
    }
}
