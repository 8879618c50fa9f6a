//! Field-level validation shared by the admin form boundary.

use std::collections::BTreeMap;

use serde::Serialize;
use time::{Date, macros::format_description};
use url::Url;
use uuid::Uuid;

/// Validation messages keyed by form field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldErrors {
    fields: BTreeMap<&'static str, Vec<String>>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.fields.entry(field).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn first(&self, field: &str) -> Option<&str> {
        self.get(field).first().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &[String])> {
        self.fields
            .iter()
            .map(|(field, messages)| (*field, messages.as_slice()))
    }

    /// `Ok(value)` when no errors were recorded.
    pub fn finish<T>(self, value: T) -> Result<T, FieldErrors> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

pub fn blank_to_none(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// Trimmed required text; records `{label}を入力してください` when blank.
pub fn required(
    errors: &mut FieldErrors,
    field: &'static str,
    label: &str,
    value: &str,
) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.add(field, format!("{label}を入力してください"));
    }
    trimmed.to_string()
}

pub fn optional_url(
    errors: &mut FieldErrors,
    field: &'static str,
    value: Option<String>,
) -> Option<String> {
    let value = blank_to_none(value)?;
    // Relative paths point at stored media (`/storage/...`).
    if value.starts_with('/') {
        return Some(value);
    }
    match Url::parse(&value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Some(value),
        _ => {
            errors.add(field, "URLの形式が正しくありません");
            None
        }
    }
}

pub fn optional_email(
    errors: &mut FieldErrors,
    field: &'static str,
    value: Option<String>,
) -> Option<String> {
    let value = blank_to_none(value)?;
    let valid = value
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !valid {
        errors.add(field, "メールアドレスの形式が正しくありません");
        return None;
    }
    Some(value)
}

/// Parse `YYYY-MM-DD`.
pub fn optional_date(
    errors: &mut FieldErrors,
    field: &'static str,
    value: Option<String>,
) -> Option<Date> {
    let value = blank_to_none(value)?;
    match Date::parse(&value, format_description!("[year]-[month]-[day]")) {
        Ok(date) => Some(date),
        Err(_) => {
            errors.add(field, "日付は YYYY-MM-DD 形式で入力してください");
            None
        }
    }
}

/// Parse a non-negative yen amount, tolerating thousands separators.
pub fn optional_amount(
    errors: &mut FieldErrors,
    field: &'static str,
    value: Option<String>,
) -> Option<i64> {
    let value = blank_to_none(value)?;
    let digits: String = value.chars().filter(|ch| !matches!(ch, ',' | '，')).collect();
    match digits.parse::<i64>() {
        Ok(amount) if amount >= 0 => Some(amount),
        _ => {
            errors.add(field, "金額は0以上の整数で入力してください");
            None
        }
    }
}

pub fn optional_uuid(
    errors: &mut FieldErrors,
    field: &'static str,
    value: Option<String>,
) -> Option<Uuid> {
    let value = blank_to_none(value)?;
    match Uuid::parse_str(&value) {
        Ok(id) => Some(id),
        Err(_) => {
            errors.add(field, "選択肢が正しくありません");
            None
        }
    }
}

/// Parse a list of ids, skipping blanks and recording malformed entries.
pub fn uuid_list(errors: &mut FieldErrors, field: &'static str, values: &[String]) -> Vec<Uuid> {
    let mut ids = Vec::with_capacity(values.len());
    for value in values.iter().map(|v| v.trim()).filter(|v| !v.is_empty()) {
        match Uuid::parse_str(value) {
            Ok(id) if !ids.contains(&id) => ids.push(id),
            Ok(_) => {}
            Err(_) => errors.add(field, "選択肢が正しくありません"),
        }
    }
    ids
}

/// Split one entry per line, dropping blanks.
pub fn split_lines(value: Option<&str>) -> Vec<String> {
    value
        .unwrap_or_default()
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Split on commas (ASCII, full-width or ideographic) and newlines, deduplicated.
pub fn split_tags(value: Option<&str>) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in value
        .unwrap_or_default()
        .split(|ch| matches!(ch, ',' | '，' | '、' | '\n'))
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
    {
        if !tags.iter().any(|existing| existing == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn required_records_message_for_blank() {
        let mut errors = FieldErrors::new();
        let value = required(&mut errors, "name", "団体名", "   ");
        assert!(value.is_empty());
        assert_eq!(errors.first("name"), Some("団体名を入力してください"));
    }

    #[test]
    fn optional_parsers_accept_valid_values() {
        let mut errors = FieldErrors::new();
        assert_eq!(
            optional_date(&mut errors, "end", Some("2025-12-01".into())),
            Some(date!(2025 - 12 - 01))
        );
        assert_eq!(
            optional_amount(&mut errors, "amount", Some("1,000,000".into())),
            Some(1_000_000)
        );
        assert_eq!(
            optional_url(&mut errors, "url", Some("https://example.jp".into())),
            Some("https://example.jp".to_string())
        );
        assert_eq!(
            optional_url(&mut errors, "url", Some("/storage/news/a.png".into())),
            Some("/storage/news/a.png".to_string())
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn optional_parsers_reject_malformed_values() {
        let mut errors = FieldErrors::new();
        assert_eq!(optional_date(&mut errors, "end", Some("12/01/2025".into())), None);
        assert_eq!(optional_amount(&mut errors, "amount", Some("-5".into())), None);
        assert_eq!(optional_url(&mut errors, "url", Some("javascript:alert(1)".into())), None);
        assert_eq!(optional_email(&mut errors, "email", Some("nobody".into())), None);
        assert_eq!(errors.iter().count(), 4);
    }

    #[test]
    fn split_helpers_trim_and_deduplicate() {
        assert_eq!(
            split_tags(Some("NPO, 子育て、NPO\nボランティア")),
            vec!["NPO", "子育て", "ボランティア"]
        );
        assert_eq!(
            split_lines(Some(" /a.png \n\n/b.png")),
            vec!["/a.png", "/b.png"]
        );
    }
}
