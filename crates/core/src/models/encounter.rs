//! Generic encounter ("atención"): one recorded interaction between a patient and the facility.

use super::{EncounterLink, RecordMeta, TableRecord};
use crate::store::Table;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Discriminator stored in `encounters.kind`, naming the detail table `detail_id` points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EncounterKind {
    General,
    MaternalPerinatal,
    EarlyChildhood,
    Childhood,
    Adolescence,
    Youth,
    Adulthood,
    OldAge,
    ChronicDiseaseControl,
    CancerScreening,
}

impl EncounterKind {
    /// Detail table for this kind, if any.
    pub fn detail_table(self) -> Option<Table> {
        match self {
            EncounterKind::General => None,
            EncounterKind::MaternalPerinatal => Some(Table::MaternalPerinatalCare),
            EncounterKind::EarlyChildhood => Some(Table::EarlyChildhoodCare),
            EncounterKind::Childhood => Some(Table::ChildhoodCare),
            EncounterKind::Adolescence | EncounterKind::Youth => Some(Table::AdolescenceCare),
            EncounterKind::Adulthood => Some(Table::AdulthoodCare),
            EncounterKind::OldAge => Some(Table::OldAgeCare),
            EncounterKind::ChronicDiseaseControl => Some(Table::ChronicDiseaseControls),
            EncounterKind::CancerScreening => Some(Table::CancerScreenings),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Encounter {
    #[serde(flatten)]
    pub meta: RecordMeta,
    #[serde(default)]
    pub patient_id: Option<Uuid>,
    #[serde(default)]
    pub doctor_id: Option<Uuid>,
    pub encounter_date: NaiveDate,
    #[serde(default)]
    pub setting: Option<String>,
    pub kind: EncounterKind,
    /// Id of the row in the kind's detail table; empty until the linked write backfills it.
    #[serde(default)]
    pub detail_id: Option<Uuid>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Encounter {
    /// The generic row opened at the start of a linked write.
    pub fn opening(kind: EncounterKind, link: &EncounterLink) -> Self {
        Self {
            meta: RecordMeta::default(),
            patient_id: Some(link.patient_id),
            doctor_id: link.doctor_id,
            encounter_date: link.encounter_date,
            setting: link.setting.clone(),
            kind,
            detail_id: None,
            notes: None,
        }
    }
}

impl TableRecord for Encounter {
    const TABLE: Table = Table::Encounters;
    const LABEL: &'static str = "Encounter";

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }
}
