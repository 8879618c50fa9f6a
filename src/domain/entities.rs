//! Domain entities mirrored from persistent storage.

use serde::Serialize;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::domain::types::TaxonomyKind;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrganizationRecord {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub activity_schedule: Option<String>,
    pub membership_info: Option<String>,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub website_url: Option<String>,
    pub address: Option<String>,
    pub logo_url: Option<String>,
    pub is_published: bool,
    pub is_featured: bool,
    pub is_recruiting: bool,
    pub published_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Taxonomy ids linked to one organization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrganizationLinks {
    pub category_ids: Vec<Uuid>,
    pub area_ids: Vec<Uuid>,
    pub tag_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterviewRecord {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub lead: Option<String>,
    pub body: String,
    pub interviewee: Option<String>,
    pub cover_image_url: Option<String>,
    pub gallery_urls: Vec<String>,
    pub organization_id: Option<Uuid>,
    pub organization_name: Option<String>,
    pub organization_slug: Option<String>,
    pub is_published: bool,
    pub is_featured: bool,
    pub published_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrantRecord {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub provider_name: String,
    pub summary: Option<String>,
    pub body: Option<String>,
    pub application_start_date: Option<Date>,
    pub application_end_date: Option<Date>,
    pub amount_min: Option<i64>,
    pub amount_max: Option<i64>,
    pub target_tags: Vec<String>,
    pub source_url: Option<String>,
    pub is_published: bool,
    pub published_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewsPostRecord {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub body: String,
    pub thumbnail_url: Option<String>,
    pub is_published: bool,
    pub published_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FaqRecord {
    pub id: Uuid,
    pub question: String,
    pub answer: String,
    pub sort_order: i32,
    pub is_published: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// A category, area or tag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaxonomyRecord {
    pub id: Uuid,
    pub kind: TaxonomyKind,
    pub name: String,
    pub slug: String,
    pub sort_order: i32,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaxonomyWithUsage {
    pub record: TaxonomyRecord,
    pub usage: u64,
}

/// Position of a row in a manually ordered table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortPosition {
    pub id: Uuid,
    pub sort_order: i32,
}
