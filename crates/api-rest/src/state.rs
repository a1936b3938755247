use ips_core::models::doctor::Doctor;
use ips_core::models::maternal::MaternalPerinatalCare;
use ips_core::models::patient::Patient;
use ips_core::repositories::catalogue::CatalogueService;
use ips_core::repositories::chronic::ChronicService;
use ips_core::repositories::early_childhood::EarlyChildhoodService;
use ips_core::repositories::encounters::{EncounterService, GenericEncounterService};
use ips_core::repositories::life_stages::{
    AdolescenceService, AdulthoodService, ChildhoodService, OldAgeService,
};
use ips_core::repositories::population::{
    CarePlanService, CollectiveService, FamilyService, SettingService,
};
use ips_core::repositories::records::RecordService;
use ips_core::repositories::screening::ScreeningService;
use ips_core::store::RecordStore;
use ips_core::CoreConfig;
use std::sync::Arc;

/// Application state for the REST API server
///
/// One service per family of tables, all sharing the same record store.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub patients: RecordService<Patient>,
    pub doctors: RecordService<Doctor>,
    pub encounters: GenericEncounterService,
    pub maternal: EncounterService<MaternalPerinatalCare>,
    pub early_childhood: EarlyChildhoodService,
    pub childhood: ChildhoodService,
    pub adolescence: AdolescenceService,
    pub adulthood: AdulthoodService,
    pub old_age: OldAgeService,
    pub chronic: ChronicService,
    pub screening: ScreeningService,
    pub collective: CollectiveService,
    pub settings: SettingService,
    pub families: FamilyService,
    pub care_plans: CarePlanService,
    pub catalogue: CatalogueService,
}

impl AppState {
    pub fn new(store: Arc<dyn RecordStore>, cfg: Arc<CoreConfig>) -> Self {
        Self {
            patients: RecordService::new(store.clone(), cfg.clone()),
            doctors: RecordService::new(store.clone(), cfg.clone()),
            encounters: GenericEncounterService::new(store.clone(), cfg.clone()),
            maternal: EncounterService::new(store.clone(), cfg.clone()),
            early_childhood: EarlyChildhoodService::new(store.clone(), cfg.clone()),
            childhood: ChildhoodService::new(store.clone(), cfg.clone()),
            adolescence: AdolescenceService::new(store.clone(), cfg.clone()),
            adulthood: AdulthoodService::new(store.clone(), cfg.clone()),
            old_age: OldAgeService::new(store.clone(), cfg.clone()),
            chronic: ChronicService::new(store.clone(), cfg.clone()),
            screening: ScreeningService::new(store.clone(), cfg.clone()),
            collective: CollectiveService::new(store.clone(), cfg.clone()),
            settings: SettingService::new(store.clone(), cfg.clone()),
            families: FamilyService::new(store.clone(), cfg.clone()),
            care_plans: CarePlanService::new(store.clone(), cfg.clone()),
            catalogue: CatalogueService::new(store.clone(), cfg),
            store,
        }
    }
}
