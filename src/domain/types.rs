//! Shared domain enumerations.

use serde::{Deserialize, Serialize};

/// The three master taxonomies attached to organizations (and, for
/// categories, to grants).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxonomyKind {
    Category,
    Area,
    Tag,
}

impl TaxonomyKind {
    pub const ALL: [TaxonomyKind; 3] = [TaxonomyKind::Category, TaxonomyKind::Area, TaxonomyKind::Tag];

    pub fn as_str(self) -> &'static str {
        match self {
            TaxonomyKind::Category => "category",
            TaxonomyKind::Area => "area",
            TaxonomyKind::Tag => "tag",
        }
    }

    /// URL segment used by the admin routes (`/admin/taxonomy/{segment}`).
    pub fn segment(self) -> &'static str {
        match self {
            TaxonomyKind::Category => "categories",
            TaxonomyKind::Area => "areas",
            TaxonomyKind::Tag => "tags",
        }
    }

    pub fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "categories" => Some(TaxonomyKind::Category),
            "areas" => Some(TaxonomyKind::Area),
            "tags" => Some(TaxonomyKind::Tag),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TaxonomyKind::Category => "カテゴリ",
            TaxonomyKind::Area => "地域",
            TaxonomyKind::Tag => "タグ",
        }
    }

    pub fn table(self) -> SlugTable {
        match self {
            TaxonomyKind::Category => SlugTable::Categories,
            TaxonomyKind::Area => SlugTable::Areas,
            TaxonomyKind::Tag => SlugTable::Tags,
        }
    }

    pub fn sort_table(self) -> SortTable {
        match self {
            TaxonomyKind::Category => SortTable::Categories,
            TaxonomyKind::Area => SortTable::Areas,
            TaxonomyKind::Tag => SortTable::Tags,
        }
    }
}

/// Tables whose rows carry a unique slug.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlugTable {
    Organizations,
    Interviews,
    Grants,
    News,
    Categories,
    Areas,
    Tags,
}

impl SlugTable {
    pub fn table_name(self) -> &'static str {
        match self {
            SlugTable::Organizations => "organizations",
            SlugTable::Interviews => "interviews",
            SlugTable::Grants => "grants",
            SlugTable::News => "news_posts",
            SlugTable::Categories => "categories",
            SlugTable::Areas => "areas",
            SlugTable::Tags => "tags",
        }
    }
}

/// Tables ordered by a manual `sort_order` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortTable {
    Faqs,
    Categories,
    Areas,
    Tags,
}

impl SortTable {
    pub fn table_name(self) -> &'static str {
        match self {
            SortTable::Faqs => "faqs",
            SortTable::Categories => "categories",
            SortTable::Areas => "areas",
            SortTable::Tags => "tags",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Up,
    Down,
}

impl SortDirection {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "up" => Some(SortDirection::Up),
            "down" => Some(SortDirection::Down),
            _ => None,
        }
    }
}

/// Folder prefixes inside the media bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaFolder {
    Organizations,
    Interviews,
    Grants,
    News,
    Documents,
}

impl MediaFolder {
    pub const ALL: [MediaFolder; 5] = [
        MediaFolder::Organizations,
        MediaFolder::Interviews,
        MediaFolder::Grants,
        MediaFolder::News,
        MediaFolder::Documents,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MediaFolder::Organizations => "organizations",
            MediaFolder::Interviews => "interviews",
            MediaFolder::Grants => "grants",
            MediaFolder::News => "news",
            MediaFolder::Documents => "documents",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|folder| folder.as_str() == value)
    }

    pub fn label(self) -> &'static str {
        match self {
            MediaFolder::Organizations => "団体",
            MediaFolder::Interviews => "インタビュー",
            MediaFolder::Grants => "助成金",
            MediaFolder::News => "お知らせ",
            MediaFolder::Documents => "資料",
        }
    }
}
