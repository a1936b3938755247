//! OpenAPI document served at `/api-docs/openapi.json`.

use crate::handlers::{
    catalogue, chronic, early_childhood, encounters, health, life_stages, people, population,
    screening,
};
use api_shared::{ErrorBody, HealthRes};
use ips_core::models::adolescence::{
    AdolescenceAssessment, AdolescenceCare, AdolescenceStats, AdolescenceView, BmiStatus,
    EatingDisorderRisk, IntegralRisk, LifeProject, MentalHealth, PsychosocialDevelopment,
    PsychosocialReport, RiskLevel, SexualHealth, SubstanceUse,
};
use ips_core::models::adulthood::{
    AdulthoodAssessment, AdulthoodCare, AdulthoodStats, AdulthoodView, CardiovascularRisk,
    NcdScreening, PhysicalActivity,
};
use ips_core::models::cancer_screening::{
    CancerScreening, CancerScreeningView, CytologyResult, ExamFinding, ScreeningAdherence,
    ScreeningAdherenceReport, ScreeningAssessment, ScreeningRisk, ScreeningStats, ScreeningType,
    TestResult,
};
use ips_core::models::childhood::{
    ChildDevelopmentReport, ChildNutritionalStatus, ChildhoodAssessment, ChildhoodCare,
    ChildhoodStats, ChildhoodView, SchoolPerformance, ScreeningOutcome,
};
use ips_core::models::chronic::{
    Adherence, AdherenceReport, ChronicAssessment, ChronicCondition, ChronicControl,
    ChronicControlRecord, ChronicControlView, ChronicRiskLevel, ChronicStats, ControlStatus,
    DiabetesDetail, DiabetesType, DyslipidemiaDetail, HypertensionDetail, KidneyDiseaseDetail,
};
use ips_core::models::collective::CollectiveIntervention;
use ips_core::models::doctor::Doctor;
use ips_core::models::early_childhood::{
    Asq3Scores, EarlyChildhoodAssessment, EarlyChildhoodCare, EarlyChildhoodStats,
    EarlyChildhoodView, Ead3Scores, NutritionalStatus, ScreeningResult,
};
use ips_core::models::encounter::{Encounter, EncounterKind};
use ips_core::models::family::{
    FamilyFunction, FamilyLifeCycle, FamilyStructure, FamilyStructureReport, FamilyUnit,
    LifeCycleCount, LifeCycleReport, Stratum, StructureCount,
};
use ips_core::models::integral_care::{
    ApproachCount, ApproachReport, CareApproach, CareComplexity, CareModality, CareSubject,
    ComplexityCount, ComplexityReport, FinalizePlan, IntegralCarePlan, PlanStatus,
};
use ips_core::models::maternal::{
    DeliveryType, FeedingType, LabResult, MaternalAssessment, MaternalPerinatalCare,
    MaternalPerinatalView,
};
use ips_core::models::occupation::{
    CatalogueStats, CodeValidation, Occupation, OccupationCategory,
};
use ips_core::models::old_age::{
    AbuseRisk, CognitiveStatus, FallRisk, Frailty, FunctionalStatus, GeriatricReport,
    OldAgeAssessment, OldAgeCare, OldAgeStats, OldAgeView,
};
use ips_core::models::patient::{DocumentType, Patient, Sex};
use ips_core::models::public_health_setting::{
    ActivationState, InterventionComplexity, PublicHealthSetting, SettingType,
};
use ips_core::models::{EncounterLink, RecordMeta};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "IPS clinical record API",
        description = "Primary-care clinical records: patients, encounters by life stage, chronic-disease control, cancer screening and population health."
    ),
    paths(
        health::health,
        health::ready,
        people::list_patients,
        people::create_patient,
        people::get_patient,
        people::replace_patient,
        people::delete_patient,
        people::list_doctors,
        people::create_doctor,
        people::get_doctor,
        people::replace_doctor,
        people::delete_doctor,
        encounters::list_encounters,
        encounters::create_encounter,
        encounters::get_encounter,
        encounters::delete_encounter,
        encounters::maternal::list,
        encounters::maternal::create,
        encounters::maternal::fetch,
        encounters::maternal::replace,
        encounters::maternal::remove,
        encounters::maternal::history,
        encounters::early_childhood::list,
        encounters::early_childhood::create,
        encounters::early_childhood::fetch,
        encounters::early_childhood::replace,
        encounters::early_childhood::remove,
        encounters::early_childhood::history,
        early_childhood::apply_ead3,
        early_childhood::apply_asq3,
        early_childhood::early_childhood_stats,
        encounters::childhood::list,
        encounters::childhood::create,
        encounters::childhood::fetch,
        encounters::childhood::replace,
        encounters::childhood::remove,
        encounters::childhood::history,
        life_stages::childhood_by_school_performance,
        life_stages::childhood_stats,
        life_stages::childhood_development_report,
        encounters::adolescence::list,
        encounters::adolescence::create,
        encounters::adolescence::fetch,
        encounters::adolescence::replace,
        encounters::adolescence::remove,
        encounters::adolescence::history,
        life_stages::adolescence_by_age_range,
        life_stages::adolescence_by_risk,
        life_stages::adolescence_high_risk_alerts,
        life_stages::adolescence_stats,
        life_stages::adolescence_psychosocial_report,
        encounters::adulthood::list,
        encounters::adulthood::create,
        encounters::adulthood::fetch,
        encounters::adulthood::replace,
        encounters::adulthood::remove,
        encounters::adulthood::history,
        life_stages::adulthood_by_cardiovascular_risk,
        life_stages::adulthood_stats,
        encounters::old_age::list,
        encounters::old_age::create,
        encounters::old_age::fetch,
        encounters::old_age::replace,
        encounters::old_age::remove,
        encounters::old_age::history,
        life_stages::old_age_by_functional_status,
        life_stages::old_age_by_frailty,
        life_stages::old_age_stats,
        life_stages::old_age_geriatric_report,
        encounters::cancer_screening::list,
        encounters::cancer_screening::create,
        encounters::cancer_screening::fetch,
        encounters::cancer_screening::replace,
        encounters::cancer_screening::remove,
        encounters::cancer_screening::history,
        screening::screenings_by_type,
        screening::screening_stats,
        screening::screening_adherence_report,
        chronic::list_controls,
        chronic::create_control,
        chronic::get_control,
        chronic::replace_control,
        chronic::delete_control,
        chronic::control_history,
        chronic::controls_by_condition,
        chronic::chronic_stats,
        chronic::adherence_report,
        population::list_collective_interventions,
        population::collective::create,
        population::collective::fetch,
        population::collective::replace,
        population::collective::remove,
        population::list_settings,
        population::setting_by_code,
        population::settings::create,
        population::settings::fetch,
        population::settings::replace,
        population::settings::remove,
        population::list_families,
        population::family_by_code,
        population::family_structure_report,
        population::family_life_cycle_report,
        population::families_by_setting,
        population::families::create,
        population::families::fetch,
        population::families::replace,
        population::families::remove,
        population::list_care_plans,
        population::care_plan_by_code,
        population::finalize_care_plan,
        population::care_plan_approach_report,
        population::care_plan_complexity_report,
        population::upcoming_care_plan_evaluations,
        population::care_plans::create,
        population::care_plans::fetch,
        population::care_plans::replace,
        population::care_plans::remove,
        catalogue::search_occupations,
        catalogue::occupation_by_code,
        catalogue::catalogue_stats,
        catalogue::occupation_categories,
        catalogue::validate_occupation_code,
    ),
    components(schemas(
        HealthRes,
        ErrorBody,
        RecordMeta,
        EncounterLink,
        DocumentType,
        Sex,
        Patient,
        Doctor,
        EncounterKind,
        Encounter,
        LabResult,
        DeliveryType,
        FeedingType,
        MaternalPerinatalCare,
        MaternalAssessment,
        MaternalPerinatalView,
        NutritionalStatus,
        ScreeningResult,
        EarlyChildhoodCare,
        Ead3Scores,
        Asq3Scores,
        EarlyChildhoodAssessment,
        EarlyChildhoodView,
        EarlyChildhoodStats,
        SchoolPerformance,
        ScreeningOutcome,
        ChildNutritionalStatus,
        ChildhoodCare,
        ChildhoodAssessment,
        ChildhoodView,
        ChildhoodStats,
        ChildDevelopmentReport,
        LifeProject,
        SexualHealth,
        MentalHealth,
        SubstanceUse,
        EatingDisorderRisk,
        BmiStatus,
        RiskLevel,
        PsychosocialDevelopment,
        AdolescenceCare,
        AdolescenceAssessment,
        AdolescenceView,
        IntegralRisk,
        AdolescenceStats,
        PsychosocialReport,
        PhysicalActivity,
        CardiovascularRisk,
        NcdScreening,
        AdulthoodCare,
        AdulthoodAssessment,
        AdulthoodView,
        AdulthoodStats,
        FunctionalStatus,
        Frailty,
        CognitiveStatus,
        FallRisk,
        AbuseRisk,
        OldAgeCare,
        OldAgeAssessment,
        OldAgeView,
        OldAgeStats,
        GeriatricReport,
        ChronicCondition,
        ControlStatus,
        Adherence,
        ChronicRiskLevel,
        ChronicControl,
        HypertensionDetail,
        DiabetesType,
        DiabetesDetail,
        KidneyDiseaseDetail,
        DyslipidemiaDetail,
        ChronicControlRecord,
        ChronicAssessment,
        ChronicControlView,
        ChronicStats,
        AdherenceReport,
        ScreeningType,
        CytologyResult,
        TestResult,
        ExamFinding,
        ScreeningRisk,
        ScreeningAdherence,
        CancerScreening,
        ScreeningAssessment,
        CancerScreeningView,
        ScreeningStats,
        ScreeningAdherenceReport,
        CollectiveIntervention,
        SettingType,
        InterventionComplexity,
        ActivationState,
        PublicHealthSetting,
        FamilyStructure,
        FamilyLifeCycle,
        Stratum,
        FamilyFunction,
        FamilyUnit,
        StructureCount,
        FamilyStructureReport,
        LifeCycleCount,
        LifeCycleReport,
        CareApproach,
        CareComplexity,
        CareModality,
        PlanStatus,
        CareSubject,
        IntegralCarePlan,
        FinalizePlan,
        ApproachCount,
        ApproachReport,
        ComplexityCount,
        ComplexityReport,
        Occupation,
        CatalogueStats,
        OccupationCategory,
        CodeValidation,
    )),
    tags(
        (name = "health", description = "Liveness and readiness"),
        (name = "patients"),
        (name = "doctors"),
        (name = "encounters", description = "Generic encounters shared by every typed record"),
        (name = "maternal-perinatal"),
        (name = "early-childhood", description = "0 to 5 years"),
        (name = "childhood", description = "6 to 11 years"),
        (name = "adolescence", description = "12 to 29 years"),
        (name = "adulthood", description = "30 to 59 years"),
        (name = "old-age", description = "60 years and over"),
        (name = "chronic-control"),
        (name = "cancer-screening"),
        (name = "collective-interventions"),
        (name = "public-health-settings"),
        (name = "family-units"),
        (name = "integral-care-plans"),
        (name = "occupations", description = "DANE occupation catalogue")
    )
)]
pub struct ApiDoc;
