//! DANE occupation catalogue lookups. The catalogue is loaded outside the API and is
//! read-only here.

use super::records::RecordService;
use crate::config::CoreConfig;
use crate::constants::DEFAULT_OCCUPATION_SEARCH_LIMIT;
use crate::models::occupation::{CatalogueStats, CodeValidation, Occupation, OccupationCategory};
use crate::store::{Filter, Query, RecordStore};
use crate::{CoreError, CoreResult};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;

const CODE_COLUMN: &str = "code";
const DEFAULT_PER_CATEGORY: u32 = 5;
const MAX_PER_CATEGORY: u32 = 20;

#[derive(Clone, Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OccupationSearch {
    /// Digits match a code prefix; anything else matches the name, case-insensitively.
    pub term: String,
    #[serde(default)]
    pub limit: Option<u32>,
}

#[derive(Clone, Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CategoryListing {
    /// Occupations listed per major group, 1 to 20.
    #[serde(default)]
    pub per_category: Option<u32>,
}

#[derive(Clone)]
pub struct CatalogueService {
    records: RecordService<Occupation>,
    cfg: Arc<CoreConfig>,
}

impl CatalogueService {
    pub fn new(store: Arc<dyn RecordStore>, cfg: Arc<CoreConfig>) -> Self {
        Self {
            records: RecordService::new(store, cfg.clone()),
            cfg,
        }
    }

    /// Active occupations matching `search.term`, ordered by code.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidInput` for a blank term.
    pub async fn search(&self, search: &OccupationSearch) -> CoreResult<Vec<Occupation>> {
        let term = search.term.trim();
        if term.is_empty() {
            return Err(CoreError::InvalidInput("search term is required".into()));
        }
        let limit = self
            .cfg
            .page_size(Some(search.limit.unwrap_or(DEFAULT_OCCUPATION_SEARCH_LIMIT)));

        let matching = if term.chars().all(|c| c.is_ascii_digit()) {
            Filter::starts_with(CODE_COLUMN, term)
        } else {
            Filter::ilike("name", term)
        };
        let query = Query::new()
            .filter(Filter::eq("active", true))
            .filter(matching)
            .order_by(CODE_COLUMN, false)
            .limit(limit);

        self.records.select(&query).await
    }

    /// # Errors
    ///
    /// Returns `CoreError::NotFound` if the code is not in the catalogue.
    pub async fn by_code(&self, code: &str) -> CoreResult<Occupation> {
        self.records.get_by(CODE_COLUMN, code.trim()).await
    }

    pub async fn stats(&self) -> CoreResult<CatalogueStats> {
        let all = self.records.select(&Query::new()).await?;
        Ok(CatalogueStats::from_occupations(&all))
    }

    /// Active occupations grouped by major group.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidInput` when `per_category` is outside 1..=20.
    pub async fn categories(&self, listing: &CategoryListing) -> CoreResult<Vec<OccupationCategory>> {
        let per_category = listing.per_category.unwrap_or(DEFAULT_PER_CATEGORY);
        if !(1..=MAX_PER_CATEGORY).contains(&per_category) {
            return Err(CoreError::InvalidInput(format!(
                "per_category must be between 1 and {MAX_PER_CATEGORY}"
            )));
        }
        let active = self
            .records
            .select(&Query::new().filter(Filter::eq("active", true)))
            .await?;
        Ok(OccupationCategory::group(active, per_category as usize))
    }

    /// Unlike `by_code`, an unknown code is a normal answer here.
    pub async fn validate_code(&self, code: &str) -> CoreResult<CodeValidation> {
        let code = code.trim();
        let found = self.records.find_one(Filter::eq(CODE_COLUMN, code)).await?;
        Ok(CodeValidation::of(code, found))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testing::FaultyStore;
    use crate::store::{MemoryStore, Table};
    use serde_json::{json, Value};

    async fn catalogue() -> CatalogueService {
        catalogue_over(Arc::new(MemoryStore::new())).await
    }

    async fn catalogue_over(store: Arc<dyn RecordStore>) -> CatalogueService {
        for (code, name, active) in [
            ("2211", "Médicos generales", true),
            ("2212", "Médicos especialistas", true),
            ("3221", "Técnicos en enfermería", true),
            ("2219", "Médicos no clasificados", false),
            ("9211", "Obreros agrícolas", true),
        ] {
            let major_group = &code[..1];
            let Value::Object(row) =
                json!({"code": code, "name": name, "active": active, "major_group": major_group})
            else {
                panic!("expected object")
            };
            store
                .insert(Table::Occupations, row)
                .await
                .expect("insert should succeed");
        }
        CatalogueService::new(store, Arc::new(CoreConfig::in_memory()))
    }

    fn search(term: &str) -> OccupationSearch {
        OccupationSearch {
            term: term.into(),
            limit: None,
        }
    }

    #[tokio::test]
    async fn test_search_by_name_skips_inactive() {
        let svc = catalogue().await;
        let found = svc.search(&search("MÉDICOS")).await.expect("search should succeed");
        let codes: Vec<&str> = found.iter().map(|o| o.code.as_str()).collect();
        assert_eq!(codes, vec!["2211", "2212"]);
    }

    #[tokio::test]
    async fn test_search_by_code_prefix() {
        let svc = catalogue().await;
        let found = svc.search(&search("221")).await.expect("search should succeed");
        assert_eq!(found.len(), 2);

        // "21" occurs inside several codes but starts none of them
        let found = svc.search(&search("21")).await.expect("search should succeed");
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_search_limit_is_pushed_to_the_store() {
        let store = Arc::new(FaultyStore::new());
        let svc = catalogue_over(store.clone()).await;

        let found = svc
            .search(&OccupationSearch {
                term: "2".into(),
                limit: Some(1),
            })
            .await
            .expect("search should succeed");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].code.as_str(), "2211");

        let selects = store.selects();
        let (table, query) = selects.last().expect("search should select");
        assert_eq!(*table, Table::Occupations);
        assert_eq!(query.limit, Some(1));
        assert!(query
            .filters
            .contains(&Filter::starts_with(CODE_COLUMN, "2")));
    }

    #[tokio::test]
    async fn test_blank_term_and_unknown_code() {
        let svc = catalogue().await;
        assert!(matches!(
            svc.search(&search("  ")).await,
            Err(CoreError::InvalidInput(_))
        ));
        assert!(matches!(
            svc.by_code("0000").await,
            Err(CoreError::NotFound { .. })
        ));
        assert_eq!(
            svc.by_code("9211").await.expect("by_code should succeed").name,
            "Obreros agrícolas"
        );
    }

    #[tokio::test]
    async fn test_stats_and_categories() {
        let svc = catalogue().await;
        let stats = svc.stats().await.expect("stats should succeed");
        assert_eq!(stats.total, 5);
        assert_eq!(stats.active, 4);
        assert_eq!(stats.major_groups, 3);

        let categories = svc
            .categories(&CategoryListing {
                per_category: Some(1),
            })
            .await
            .expect("categories should succeed");
        let groups: Vec<(&str, u64, usize)> = categories
            .iter()
            .map(|c| (c.major_group.as_str(), c.total, c.occupations.len()))
            .collect();
        assert_eq!(groups, vec![("2", 2, 1), ("3", 1, 1), ("9", 1, 1)]);
        assert_eq!(categories[0].occupations[0].code, "2212");

        assert!(matches!(
            svc.categories(&CategoryListing {
                per_category: Some(21),
            })
            .await,
            Err(CoreError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_validate_code() {
        let svc = catalogue().await;
        let known = svc.validate_code(" 2219 ").await.expect("validate should succeed");
        assert!(known.valid);
        assert_eq!(known.active, Some(false));

        let unknown = svc.validate_code("0000").await.expect("validate should succeed");
        assert!(!unknown.valid);
        assert_eq!(unknown.name, None);
    }
}
