//! Adolescence and youth care (12–29 years).

use super::{EncounterDetail, EncounterKind, EncounterLink, RecordMeta, TableRecord};
use crate::store::Table;
use crate::validation::{body_mass_index, check_range, percentage, round_to};
use crate::CoreResult;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Ages below this are recorded as adolescence, the rest as youth.
const ADULT_AGE: i32 = 18;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifeProject {
    Defined,
    InProgress,
    Undefined,
    Absent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SexualHealth {
    NotActive,
    ActiveWithProtection,
    ActiveWithoutProtection,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MentalHealth {
    Good,
    AtRisk,
    Depressive,
    Anxious,
    NeedsEvaluation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubstanceUse {
    Abstinent,
    Experimental,
    Occasional,
    Habitual,
    Problematic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EatingDisorderRisk {
    Low,
    Moderate,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BmiStatus {
    Thinness,
    Normal,
    Overweight,
    ObesityI,
    ObesityII,
    ObesityIII,
}

impl BmiStatus {
    /// Adult cut-offs, also used from 12 years in this service.
    pub fn classify(bmi: f64) -> Self {
        match bmi {
            v if v < 18.5 => BmiStatus::Thinness,
            v if v < 25.0 => BmiStatus::Normal,
            v if v < 30.0 => BmiStatus::Overweight,
            v if v < 35.0 => BmiStatus::ObesityI,
            v if v < 40.0 => BmiStatus::ObesityII,
            _ => BmiStatus::ObesityIII,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    VeryHigh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PsychosocialDevelopment {
    Appropriate,
    MildRisk,
    ModerateRisk,
    HighRisk,
    NeedsIntervention,
}

/// Overall risk combining the cardiovascular, psychosocial, mental-health, substance-use and
/// eating-disorder findings, eased by protective factors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntegralRisk {
    Low,
    Moderate,
    High,
    VeryHigh,
    Critical,
}

impl IntegralRisk {
    pub fn is_high(self) -> bool {
        self >= IntegralRisk::High
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AdolescenceCare {
    #[serde(flatten)]
    pub meta: RecordMeta,
    #[serde(flatten)]
    pub link: EncounterLink,

    pub age_years: i32,
    #[serde(default)]
    pub weight_kg: Option<f64>,
    #[serde(default)]
    pub height_cm: Option<f64>,
    #[serde(default)]
    pub bmi: Option<f64>,
    #[serde(default)]
    pub systolic_bp: Option<i32>,
    #[serde(default)]
    pub diastolic_bp: Option<i32>,
    #[serde(default)]
    pub heart_rate: Option<i32>,

    #[serde(default)]
    pub self_esteem: Option<i32>,
    #[serde(default)]
    pub social_skills: Option<i32>,
    #[serde(default)]
    pub life_project: Option<LifeProject>,
    #[serde(default)]
    pub conduct_problems: bool,
    #[serde(default)]
    pub mental_health: Option<MentalHealth>,
    #[serde(default)]
    pub eating_disorder_risk: Option<EatingDisorderRisk>,

    #[serde(default)]
    pub sexual_health: Option<SexualHealth>,
    #[serde(default)]
    pub contraceptive_method: Option<String>,
    #[serde(default)]
    pub previous_pregnancies: Option<i32>,
    #[serde(default)]
    pub hpv_vaccine: bool,

    #[serde(default)]
    pub substance_use: Option<SubstanceUse>,
    #[serde(default)]
    pub smoker: bool,
    #[serde(default)]
    pub sedentary: bool,
    #[serde(default)]
    pub family_history_cardiovascular: bool,

    #[serde(default)]
    pub family_support: bool,
    #[serde(default)]
    pub studying_or_working: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

impl AdolescenceCare {
    fn current_bmi(&self) -> Option<f64> {
        self.bmi
            .or_else(|| body_mass_index(self.weight_kg, self.height_cm))
    }

    fn cardiovascular_risk(&self, bmi: Option<f64>) -> RiskLevel {
        let mut points = 0;
        let systolic = self.systolic_bp.unwrap_or(0);
        let diastolic = self.diastolic_bp.unwrap_or(0);
        if systolic >= 140 || diastolic >= 90 {
            points += 2;
        } else if systolic >= 130 || diastolic >= 85 {
            points += 1;
        }
        match bmi {
            Some(b) if b >= 30.0 => points += 2,
            Some(b) if b >= 25.0 => points += 1,
            _ => {}
        }
        if self.family_history_cardiovascular {
            points += 1;
        }
        if self.smoker {
            points += 2;
        }
        if self.sedentary {
            points += 1;
        }
        match points {
            p if p >= 6 => RiskLevel::VeryHigh,
            p if p >= 4 => RiskLevel::High,
            p if p >= 2 => RiskLevel::Moderate,
            _ => RiskLevel::Low,
        }
    }

    fn psychosocial_development(&self) -> Option<PsychosocialDevelopment> {
        let (esteem, social) = (self.self_esteem?, self.social_skills?);
        let mut score = f64::from(esteem + social) / 2.0;
        match self.life_project {
            Some(LifeProject::Defined) => score += 1.0,
            Some(LifeProject::Absent) => score -= 2.0,
            _ => {}
        }
        if self.conduct_problems {
            score -= 2.0;
        }
        match self.substance_use {
            Some(SubstanceUse::Habitual | SubstanceUse::Problematic) => score -= 3.0,
            Some(SubstanceUse::Occasional) => score -= 1.0,
            _ => {}
        }
        Some(match score {
            s if s >= 8.0 => PsychosocialDevelopment::Appropriate,
            s if s >= 6.0 => PsychosocialDevelopment::MildRisk,
            s if s >= 4.0 => PsychosocialDevelopment::ModerateRisk,
            s if s >= 2.0 => PsychosocialDevelopment::HighRisk,
            _ => PsychosocialDevelopment::NeedsIntervention,
        })
    }

    fn protective_factors(&self) -> Vec<String> {
        let mut factors: Vec<&str> = Vec::new();
        if self.family_support {
            factors.push("family_support");
        }
        if self.studying_or_working {
            factors.push("studying_or_working");
        }
        if self.life_project == Some(LifeProject::Defined) {
            factors.push("defined_life_project");
        }
        if self.self_esteem.is_some_and(|s| s >= 7) {
            factors.push("good_self_esteem");
        }
        if matches!(self.substance_use, Some(SubstanceUse::Abstinent)) {
            factors.push("no_substance_use");
        }
        factors.into_iter().map(String::from).collect()
    }

    fn integral_risk(
        &self,
        cardiovascular: RiskLevel,
        psychosocial: Option<PsychosocialDevelopment>,
        protective_factors: usize,
    ) -> IntegralRisk {
        let mut score: i32 = match cardiovascular {
            RiskLevel::Low => 0,
            RiskLevel::Moderate => 1,
            RiskLevel::High => 2,
            RiskLevel::VeryHigh => 3,
        };
        score += match psychosocial {
            None | Some(PsychosocialDevelopment::Appropriate) => 0,
            Some(PsychosocialDevelopment::MildRisk) => 1,
            Some(PsychosocialDevelopment::ModerateRisk) => 2,
            Some(PsychosocialDevelopment::HighRisk) => 3,
            Some(PsychosocialDevelopment::NeedsIntervention) => 4,
        };
        score += match self.mental_health {
            None | Some(MentalHealth::Good) => 0,
            Some(MentalHealth::AtRisk) => 1,
            Some(MentalHealth::Anxious) => 2,
            Some(MentalHealth::Depressive) => 3,
            Some(MentalHealth::NeedsEvaluation) => 4,
        };
        score += match self.substance_use {
            None | Some(SubstanceUse::Abstinent | SubstanceUse::Experimental) => 0,
            Some(SubstanceUse::Occasional) => 1,
            Some(SubstanceUse::Habitual) => 3,
            Some(SubstanceUse::Problematic) => 4,
        };
        score += match self.eating_disorder_risk {
            None | Some(EatingDisorderRisk::Low) => 0,
            Some(EatingDisorderRisk::Moderate) => 1,
            Some(EatingDisorderRisk::High) => 2,
        };
        if protective_factors >= 5 {
            score -= 2;
        } else if protective_factors >= 3 {
            score -= 1;
        }
        match score.max(0) {
            s if s >= 12 => IntegralRisk::Critical,
            s if s >= 9 => IntegralRisk::VeryHigh,
            s if s >= 6 => IntegralRisk::High,
            s if s >= 3 => IntegralRisk::Moderate,
            _ => IntegralRisk::Low,
        }
    }

    pub fn assess(&self) -> AdolescenceAssessment {
        let bmi = self.current_bmi();
        let cardiovascular_risk = self.cardiovascular_risk(bmi);
        let psychosocial_development = self.psychosocial_development();
        let protective_factors = self.protective_factors();
        AdolescenceAssessment {
            bmi,
            bmi_status: bmi.map(BmiStatus::classify),
            cardiovascular_risk,
            psychosocial_development,
            integral_risk: self.integral_risk(
                cardiovascular_risk,
                psychosocial_development,
                protective_factors.len(),
            ),
            protective_factors,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AdolescenceAssessment {
    pub bmi: Option<f64>,
    pub bmi_status: Option<BmiStatus>,
    pub cardiovascular_risk: RiskLevel,
    /// Absent unless both self-esteem and social-skills scores were recorded.
    pub psychosocial_development: Option<PsychosocialDevelopment>,
    pub integral_risk: IntegralRisk,
    pub protective_factors: Vec<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AdolescenceView {
    #[serde(flatten)]
    pub record: AdolescenceCare,
    pub assessment: AdolescenceAssessment,
}

impl TableRecord for AdolescenceCare {
    const TABLE: Table = Table::AdolescenceCare;
    const LABEL: &'static str = "Adolescence care";

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn validate(&self) -> CoreResult<()> {
        check_range("age_years", Some(self.age_years), 12, 29)?;
        check_range("weight_kg", self.weight_kg, 20.0, 250.0)?;
        check_range("height_cm", self.height_cm, 100.0, 230.0)?;
        check_range("systolic_bp", self.systolic_bp, 60, 250)?;
        check_range("diastolic_bp", self.diastolic_bp, 30, 150)?;
        check_range("heart_rate", self.heart_rate, 30, 220)?;
        check_range("self_esteem", self.self_esteem, 1, 10)?;
        check_range("social_skills", self.social_skills, 1, 10)?;
        crate::validation::check_non_negative("previous_pregnancies", self.previous_pregnancies)
    }

    fn normalize(&mut self) {
        if let Some(bmi) = body_mass_index(self.weight_kg, self.height_cm) {
            self.bmi = Some(bmi);
        }
    }
}

impl EncounterDetail for AdolescenceCare {
    type View = AdolescenceView;

    fn kind(&self) -> EncounterKind {
        if self.age_years < ADULT_AGE {
            EncounterKind::Adolescence
        } else {
            EncounterKind::Youth
        }
    }

    fn link(&self) -> &EncounterLink {
        &self.link
    }

    fn link_mut(&mut self) -> &mut EncounterLink {
        &mut self.link
    }

    fn into_view(self) -> Self::View {
        let assessment = self.assess();
        AdolescenceView {
            record: self,
            assessment,
        }
    }
}

// ============================================================================
// AGGREGATES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AdolescenceStats {
    pub total: u64,
    /// Visits recorded below 18 years.
    pub adolescents: u64,
    pub youths: u64,
    pub mean_age_years: f64,
    pub mean_bmi: Option<f64>,
    pub mean_protective_factors: f64,
    pub high_risk: u64,
    pub high_risk_pct: f64,
    pub mental_health_concerns: u64,
    pub mental_health_concerns_pct: f64,
    pub obesity: u64,
    pub obesity_pct: f64,
}

impl AdolescenceStats {
    pub fn from_records(records: &[AdolescenceCare]) -> Self {
        let total = records.len() as u64;
        let assessments: Vec<AdolescenceAssessment> =
            records.iter().map(AdolescenceCare::assess).collect();
        let adolescents = records.iter().filter(|r| r.age_years < ADULT_AGE).count() as u64;
        let bmis: Vec<f64> = assessments.iter().filter_map(|a| a.bmi).collect();
        let high_risk = assessments.iter().filter(|a| a.integral_risk.is_high()).count() as u64;
        let mental_health_concerns = records
            .iter()
            .filter(|r| r.mental_health.is_some_and(|m| m != MentalHealth::Good))
            .count() as u64;
        let obesity = assessments
            .iter()
            .filter(|a| {
                matches!(
                    a.bmi_status,
                    Some(BmiStatus::ObesityI | BmiStatus::ObesityII | BmiStatus::ObesityIII)
                )
            })
            .count() as u64;
        let mean = |sum: f64, n: usize| if n == 0 { 0.0 } else { sum / n as f64 };
        Self {
            total,
            adolescents,
            youths: total - adolescents,
            mean_age_years: round_to(
                mean(records.iter().map(|r| f64::from(r.age_years)).sum(), records.len()),
                1,
            ),
            mean_bmi: (!bmis.is_empty()).then(|| round_to(mean(bmis.iter().sum(), bmis.len()), 2)),
            mean_protective_factors: round_to(
                mean(
                    assessments.iter().map(|a| a.protective_factors.len() as f64).sum(),
                    assessments.len(),
                ),
                1,
            ),
            high_risk,
            high_risk_pct: percentage(high_risk, total),
            mental_health_concerns,
            mental_health_concerns_pct: percentage(mental_health_concerns, total),
            obesity,
            obesity_pct: percentage(obesity, total),
        }
    }
}

/// Psychosocial development levels and the risk factors behind them.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PsychosocialReport {
    pub total: u64,
    pub appropriate: u64,
    pub mild_risk: u64,
    pub moderate_risk: u64,
    pub high_risk: u64,
    pub needs_intervention: u64,
    /// Self-esteem or social-skills score missing.
    pub not_assessed: u64,
    pub appropriate_pct: f64,
    pub substance_use: u64,
    pub mental_health_concerns: u64,
    pub sedentary: u64,
    pub conduct_problems: u64,
    pub weak_life_project: u64,
}

impl PsychosocialReport {
    pub fn from_records(records: &[AdolescenceCare]) -> Self {
        let total = records.len() as u64;
        let levels: Vec<Option<PsychosocialDevelopment>> = records
            .iter()
            .map(AdolescenceCare::psychosocial_development)
            .collect();
        let level = |wanted: Option<PsychosocialDevelopment>| {
            levels.iter().filter(|l| **l == wanted).count() as u64
        };
        let count = |pred: &dyn Fn(&AdolescenceCare) -> bool| {
            records.iter().filter(|r| pred(r)).count() as u64
        };
        let appropriate = level(Some(PsychosocialDevelopment::Appropriate));
        Self {
            total,
            appropriate,
            mild_risk: level(Some(PsychosocialDevelopment::MildRisk)),
            moderate_risk: level(Some(PsychosocialDevelopment::ModerateRisk)),
            high_risk: level(Some(PsychosocialDevelopment::HighRisk)),
            needs_intervention: level(Some(PsychosocialDevelopment::NeedsIntervention)),
            not_assessed: level(None),
            appropriate_pct: percentage(appropriate, total),
            substance_use: count(&|r| {
                r.substance_use.is_some_and(|s| s != SubstanceUse::Abstinent)
            }),
            mental_health_concerns: count(&|r| {
                r.mental_health.is_some_and(|m| m != MentalHealth::Good)
            }),
            sedentary: count(&|r| r.sedentary),
            conduct_problems: count(&|r| r.conduct_problems),
            weak_life_project: count(&|r| {
                matches!(r.life_project, Some(LifeProject::Undefined | LifeProject::Absent))
            }),
        }
    }
}
