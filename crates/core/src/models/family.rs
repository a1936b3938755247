//! Family units: the household as a unit of care.

use super::{RecordMeta, TableRecord};
use crate::store::Table;
use crate::validation::{check_non_negative, check_range};
use crate::{CoreError, CoreResult};
use chrono::NaiveDate;
use ips_types::NonEmptyText;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FamilyStructure {
    NuclearTwoParent,
    NuclearSingleMother,
    NuclearSingleFather,
    ExtendedTwoParent,
    ExtendedSingleParent,
    Composite,
    SinglePerson,
    Reconstituted,
    SameSexTwoParent,
    SameSexSingleParent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FamilyLifeCycle {
    CoupleWithoutChildren,
    YoungChildren,
    SchoolChildren,
    AdolescentChildren,
    ChildrenLeaving,
    EmptyNest,
    OlderAdults,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stratum {
    Stratum1,
    Stratum2,
    Stratum3,
    Stratum4,
    Stratum5,
    Stratum6,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FamilyFunction {
    Functional,
    MildDysfunction,
    ModerateDysfunction,
    SevereDysfunction,
}

impl FamilyFunction {
    /// Interpretation of the family APGAR score (0–20).
    pub fn from_apgar(score: i32) -> Self {
        match score {
            17.. => FamilyFunction::Functional,
            13..=16 => FamilyFunction::MildDysfunction,
            10..=12 => FamilyFunction::ModerateDysfunction,
            _ => FamilyFunction::SevereDysfunction,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FamilyUnit {
    #[serde(flatten)]
    pub meta: RecordMeta,
    /// Unique family identification code.
    #[schema(value_type = String)]
    pub family_code: NonEmptyText,
    pub structure: FamilyStructure,
    #[serde(default)]
    pub life_cycle: Option<FamilyLifeCycle>,
    #[serde(default)]
    pub stratum: Option<Stratum>,

    #[serde(default)]
    pub head_of_household: Option<String>,
    pub total_members: i32,
    #[serde(default)]
    pub members_under_18: Option<i32>,
    #[serde(default)]
    pub members_over_60: Option<i32>,
    #[serde(default)]
    pub members_with_disability: Option<i32>,
    #[serde(default)]
    pub women_of_childbearing_age: Option<i32>,

    #[serde(default)]
    pub housing_type: Option<String>,
    #[serde(default)]
    pub housing_tenure: Option<String>,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub public_services: Option<Value>,

    #[serde(default)]
    pub apgar_score: Option<i32>,
    #[serde(default)]
    pub apgar_applied_on: Option<NaiveDate>,

    #[serde(default)]
    #[schema(value_type = Object)]
    pub primary_support_network: Option<Value>,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub institutional_support_network: Option<Value>,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub community_support_network: Option<Value>,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub psychosocial_risk_factors: Option<Value>,

    #[serde(default)]
    pub setting_id: Option<Uuid>,
    #[serde(default)]
    pub family_doctor_id: Option<Uuid>,
    #[serde(default)]
    pub next_review_on: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl FamilyUnit {
    pub fn function(&self) -> Option<FamilyFunction> {
        self.apgar_score.map(FamilyFunction::from_apgar)
    }
}

impl TableRecord for FamilyUnit {
    const TABLE: Table = Table::FamilyUnits;
    const LABEL: &'static str = "Family unit";

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn validate(&self) -> CoreResult<()> {
        check_range("total_members", Some(self.total_members), 1, 50)?;
        check_range("apgar_score", self.apgar_score, 0, 20)?;
        for (field, value) in [
            ("members_under_18", self.members_under_18),
            ("members_over_60", self.members_over_60),
            ("members_with_disability", self.members_with_disability),
            ("women_of_childbearing_age", self.women_of_childbearing_age),
        ] {
            check_non_negative(field, value)?;
            if value.is_some_and(|v| v > self.total_members) {
                return Err(CoreError::InvalidInput(format!(
                    "{field} cannot exceed total_members"
                )));
            }
        }
        Ok(())
    }

    fn unique_key(&self) -> Option<(&'static str, Value)> {
        Some((
            "family_code",
            Value::String(self.family_code.as_str().to_string()),
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct StructureCount {
    pub structure: FamilyStructure,
    pub families: u64,
    pub members: u64,
}

/// Families grouped by structure type.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct FamilyStructureReport {
    pub total_families: u64,
    pub by_structure: Vec<StructureCount>,
}

impl FamilyStructureReport {
    pub fn from_units(units: &[FamilyUnit]) -> Self {
        let mut groups = std::collections::BTreeMap::<FamilyStructure, (u64, u64)>::new();
        for unit in units {
            let entry = groups.entry(unit.structure).or_default();
            entry.0 += 1;
            entry.1 += u64::try_from(unit.total_members).unwrap_or(0);
        }
        Self {
            total_families: units.len() as u64,
            by_structure: groups
                .into_iter()
                .map(|(structure, (families, members))| StructureCount {
                    structure,
                    families,
                    members,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct LifeCycleCount {
    /// Absent for families with no recorded stage.
    pub life_cycle: Option<FamilyLifeCycle>,
    pub families: u64,
    pub members: u64,
}

/// Families grouped by life-cycle stage.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct LifeCycleReport {
    pub total_families: u64,
    pub by_life_cycle: Vec<LifeCycleCount>,
}

impl LifeCycleReport {
    pub fn from_units(units: &[FamilyUnit]) -> Self {
        let mut groups = std::collections::BTreeMap::<Option<FamilyLifeCycle>, (u64, u64)>::new();
        for unit in units {
            let entry = groups.entry(unit.life_cycle).or_default();
            entry.0 += 1;
            entry.1 += u64::try_from(unit.total_members).unwrap_or(0);
        }
        Self {
            total_families: units.len() as u64,
            by_life_cycle: groups
                .into_iter()
                .map(|(life_cycle, (families, members))| LifeCycleCount {
                    life_cycle,
                    families,
                    members,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn unit(code: &str, structure: &str, members: i32) -> FamilyUnit {
        serde_json::from_value(json!({
            "family_code": code,
            "structure": structure,
            "total_members": members,
            "head_of_household": "María Gómez"
        }))
        .expect("deserialize should succeed")
    }

    #[test]
    fn test_member_counts_bounded_by_total() {
        let mut u = unit("FAM-1", "NUCLEAR_TWO_PARENT", 4);
        assert!(u.validate().is_ok());
        u.members_under_18 = Some(5);
        assert!(u.validate().is_err());
        u.members_under_18 = Some(2);
        u.apgar_score = Some(21);
        assert!(u.validate().is_err());
    }

    #[test]
    fn test_apgar_interpretation() {
        assert_eq!(FamilyFunction::from_apgar(18), FamilyFunction::Functional);
        assert_eq!(FamilyFunction::from_apgar(13), FamilyFunction::MildDysfunction);
        assert_eq!(FamilyFunction::from_apgar(10), FamilyFunction::ModerateDysfunction);
        assert_eq!(FamilyFunction::from_apgar(9), FamilyFunction::SevereDysfunction);
    }

    #[test]
    fn test_structure_report_groups_and_sums() {
        let report = FamilyStructureReport::from_units(&[
            unit("A", "NUCLEAR_TWO_PARENT", 4),
            unit("B", "SINGLE_PERSON", 1),
            unit("C", "NUCLEAR_TWO_PARENT", 3),
        ]);
        assert_eq!(report.total_families, 3);
        assert_eq!(report.by_structure.len(), 2);
        assert_eq!(report.by_structure[0].structure, FamilyStructure::NuclearTwoParent);
        assert_eq!(report.by_structure[0].families, 2);
        assert_eq!(report.by_structure[0].members, 7);
    }

    #[test]
    fn test_life_cycle_report_keeps_unrecorded_stage() {
        let mut young = unit("FAM-1", "NUCLEAR_TWO_PARENT", 4);
        young.life_cycle = Some(FamilyLifeCycle::YoungChildren);
        let mut also_young = unit("FAM-2", "EXTENDED_TWO_PARENT", 6);
        also_young.life_cycle = Some(FamilyLifeCycle::YoungChildren);
        let unknown = unit("FAM-3", "SINGLE_PERSON", 1);

        let report = LifeCycleReport::from_units(&[young, also_young, unknown]);
        assert_eq!(report.total_families, 3);
        assert_eq!(
            report.by_life_cycle,
            vec![
                LifeCycleCount { life_cycle: None, families: 1, members: 1 },
                LifeCycleCount {
                    life_cycle: Some(FamilyLifeCycle::YoungChildren),
                    families: 2,
                    members: 10,
                },
            ]
        );
    }
}
