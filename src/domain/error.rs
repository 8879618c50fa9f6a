use thiserror::Error;

/// Lookups by public slug that found nothing visible.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("no published {entity} with slug `{slug}`")]
    UnknownSlug { entity: &'static str, slug: String },
}

impl DomainError {
    pub fn unknown_slug(entity: &'static str, slug: &str) -> Self {
        Self::UnknownSlug {
            entity,
            slug: slug.to_string(),
        }
    }
}
