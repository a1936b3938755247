use super::{RecordMeta, TableRecord};
use crate::store::Table;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use serde_json::Value;
use utoipa::ToSchema;

/// One entry of the DANE occupation catalogue (read-only through the API).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Occupation {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub normalized_name: Option<String>,
    #[serde(default)]
    pub major_group: Option<String>,
    #[serde(default)]
    pub sub_major_group: Option<String>,
    #[serde(default)]
    pub minor_group: Option<String>,
    #[serde(default)]
    pub unit_group: Option<String>,
    #[serde(default = "active_default")]
    pub active: bool,
}

fn active_default() -> bool {
    true
}

impl TableRecord for Occupation {
    const TABLE: Table = Table::Occupations;
    const LABEL: &'static str = "Occupation";

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn unique_key(&self) -> Option<(&'static str, Value)> {
        Some(("code", Value::String(self.code.clone())))
    }
}

/// Size and shape of the catalogue.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CatalogueStats {
    pub total: u64,
    pub active: u64,
    pub major_groups: u64,
    pub sub_major_groups: u64,
    pub last_updated_at: Option<DateTime<Utc>>,
}

impl CatalogueStats {
    pub fn from_occupations(occupations: &[Occupation]) -> Self {
        let distinct = |group: fn(&Occupation) -> Option<&String>| {
            occupations.iter().filter_map(group).collect::<BTreeSet<_>>().len() as u64
        };
        Self {
            total: occupations.len() as u64,
            active: occupations.iter().filter(|o| o.active).count() as u64,
            major_groups: distinct(|o| o.major_group.as_ref()),
            sub_major_groups: distinct(|o| o.sub_major_group.as_ref()),
            last_updated_at: occupations.iter().filter_map(|o| o.meta.updated_at).max(),
        }
    }
}

/// Active occupations of one major group, with the first few by name.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct OccupationCategory {
    pub major_group: String,
    pub total: u64,
    pub occupations: Vec<Occupation>,
}

impl OccupationCategory {
    /// Groups active occupations by major group, keeping at most `per_category` of each.
    /// Occupations without a major group are left out.
    pub fn group(occupations: Vec<Occupation>, per_category: usize) -> Vec<Self> {
        let mut groups = BTreeMap::<String, Vec<Occupation>>::new();
        for occupation in occupations.into_iter().filter(|o| o.active) {
            if let Some(group) = occupation.major_group.clone() {
                groups.entry(group).or_default().push(occupation);
            }
        }
        groups
            .into_iter()
            .map(|(major_group, mut members)| {
                members.sort_by(|a, b| a.name.cmp(&b.name));
                let total = members.len() as u64;
                members.truncate(per_category);
                OccupationCategory {
                    major_group,
                    total,
                    occupations: members,
                }
            })
            .collect()
    }
}

/// Result of checking a DANE code against the catalogue.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CodeValidation {
    pub code: String,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

impl CodeValidation {
    pub fn of(code: &str, found: Option<Occupation>) -> Self {
        match found {
            Some(occupation) => Self {
                code: occupation.code,
                valid: true,
                name: Some(occupation.name),
                active: Some(occupation.active),
            },
            None => Self {
                code: code.to_string(),
                valid: false,
                name: None,
                active: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn occupation(code: &str, name: &str, group: Option<&str>, active: bool) -> Occupation {
        serde_json::from_value(json!({
            "code": code,
            "name": name,
            "major_group": group,
            "sub_major_group": group.map(|g| format!("{g}1")),
            "active": active
        }))
        .expect("deserialize should succeed")
    }

    fn catalogue() -> Vec<Occupation> {
        vec![
            occupation("2212", "Médicos especialistas", Some("2"), true),
            occupation("2211", "Médicos generales", Some("2"), true),
            occupation("2221", "Enfermeros", Some("2"), true),
            occupation("3221", "Técnicos en enfermería", Some("3"), false),
            occupation("9999", "Sin clasificar", None, true),
        ]
    }

    #[test]
    fn test_stats_count_distinct_groups() {
        let stats = CatalogueStats::from_occupations(&catalogue());
        assert_eq!(stats.total, 5);
        assert_eq!(stats.active, 4);
        assert_eq!(stats.major_groups, 2);
        assert_eq!(stats.sub_major_groups, 2);
        assert_eq!(stats.last_updated_at, None);
    }

    #[test]
    fn test_categories_skip_inactive_and_ungrouped() {
        let categories = OccupationCategory::group(catalogue(), 2);
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].major_group, "2");
        assert_eq!(categories[0].total, 3);
        let names: Vec<&str> = categories[0].occupations.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, ["Enfermeros", "Médicos especialistas"]);
    }

    #[test]
    fn test_code_validation() {
        let found = CodeValidation::of("2211", catalogue().into_iter().nth(1));
        assert!(found.valid);
        assert_eq!(found.name.as_deref(), Some("Médicos generales"));
        let missing = CodeValidation::of("0000", None);
        assert!(!missing.valid);
        assert_eq!(missing.active, None);
    }
}
