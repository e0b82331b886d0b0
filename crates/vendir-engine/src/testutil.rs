//! In-memory store and scripted suggestion oracle for engine tests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use vendir_core::{
    CanonicalCategory, CanonicalCity, CanonicalSource, CityAliases, CountryHint, ImportFilter,
    ImportRecord, ImportStatus, ImportStore, ImportUpdate, NewVendor, SocialMedia, StoreError,
    SuggestError, SuggestionService, Vendor, VendorPatch,
};
use vendir_match::LookupIndex;

pub fn test_cities() -> Vec<CanonicalCity> {
    [
        (1, "Wien (Vienna)"),
        (2, "Berlin"),
        (3, "München (Munich)"),
    ]
    .into_iter()
    .map(|(id, name)| CanonicalCity {
        id,
        name: name.to_owned(),
        aliases: CityAliases::default(),
    })
    .collect()
}

pub fn test_categories() -> Vec<CanonicalCategory> {
    [
        (7, "Wedding Photography", "cat.wedding_photography"),
        (2, "Catering", "cat.catering"),
        (3, "Other", "cat.other"),
    ]
    .into_iter()
    .map(|(id, name, key)| CanonicalCategory {
        id,
        name: name.to_owned(),
        label_key: key.to_owned(),
    })
    .collect()
}

pub fn test_index() -> LookupIndex {
    LookupIndex::build(&test_cities(), &test_categories())
}

/// Deterministic pending record; `"dom-scraped"` keeps the category cascade
/// quiet unless a test opts in.
pub fn import_record(n: u128) -> ImportRecord {
    ImportRecord {
        id: Uuid::from_u128(n),
        business_name: format!("Test Venue {n}"),
        city_raw: "Wien (Vienna)".to_owned(),
        category_raw: "dom-scraped".to_owned(),
        email: None,
        phone: None,
        website: None,
        description: None,
        price_range: None,
        source_url: None,
        source_name: None,
        social_media: SocialMedia::default(),
        duplicate_score: 0,
        city_id: None,
        category_id: None,
        status: ImportStatus::Pending,
        status_reason: None,
        processed_at: None,
        created_vendor_id: None,
        merged_into: None,
    }
}

pub fn import_with_city(n: u128, city_raw: &str) -> ImportRecord {
    ImportRecord {
        city_raw: city_raw.to_owned(),
        ..import_record(n)
    }
}

pub fn vendor(n: u128) -> Vendor {
    Vendor {
        id: Uuid::from_u128(n),
        business_name: format!("Existing Vendor {n}"),
        category: "Catering".to_owned(),
        city: "Wien (Vienna)".to_owned(),
        zip: None,
        state: None,
        country: None,
        description: None,
        price_range: None,
        email: None,
        phone: None,
        website: None,
        source_url: None,
        source_name: None,
        social_media: SocialMedia::default(),
    }
}

/// Canonical source backed by the fixture tables.
pub struct TestCanonical {
    cities: Vec<CanonicalCity>,
    categories: Vec<CanonicalCategory>,
}

pub fn test_canonical() -> TestCanonical {
    TestCanonical {
        cities: test_cities(),
        categories: test_categories(),
    }
}

#[async_trait]
impl CanonicalSource for TestCanonical {
    async fn list_cities(&self) -> Result<Vec<CanonicalCity>, StoreError> {
        Ok(self.cities.clone())
    }

    async fn list_categories(&self) -> Result<Vec<CanonicalCategory>, StoreError> {
        Ok(self.categories.clone())
    }
}

/// In-memory [`ImportStore`] with write counting and an injectable approval
/// failure for exercising the partial-approval path.
pub struct MemoryStore {
    imports: Mutex<BTreeMap<Uuid, ImportRecord>>,
    vendors: Mutex<BTreeMap<Uuid, Vendor>>,
    update_calls: AtomicU32,
    fail_mark_approved: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            imports: Mutex::new(BTreeMap::new()),
            vendors: Mutex::new(BTreeMap::new()),
            update_calls: AtomicU32::new(0),
            fail_mark_approved: AtomicBool::new(false),
        }
    }

    pub fn insert_import(&self, record: ImportRecord) {
        self.imports.lock().unwrap().insert(record.id, record);
    }

    pub fn insert_vendor(&self, vendor: Vendor) {
        self.vendors.lock().unwrap().insert(vendor.id, vendor);
    }

    pub fn imports(&self) -> Vec<ImportRecord> {
        self.imports.lock().unwrap().values().cloned().collect()
    }

    pub fn vendor_count(&self) -> usize {
        self.vendors.lock().unwrap().len()
    }

    pub fn update_calls(&self) -> u32 {
        self.update_calls.load(Ordering::SeqCst)
    }

    /// Makes the next `approve_import` insert the vendor but fail the status
    /// update, like a connection dropping mid-approval.
    pub fn fail_mark_approved(&self) {
        self.fail_mark_approved.store(true, Ordering::SeqCst);
    }
}

fn matches_filter(record: &ImportRecord, filter: &ImportFilter) -> bool {
    filter.status.is_none_or(|s| record.status == s)
        && filter.city_resolved.is_none_or(|v| record.city_id.is_some() == v)
        && filter
            .category_resolved
            .is_none_or(|v| record.category_id.is_some() == v)
        && filter.has_email.is_none_or(|v| record.email.is_some() == v)
        && filter.has_phone.is_none_or(|v| record.phone.is_some() == v)
        && filter
            .has_website
            .is_none_or(|v| record.website.is_some() == v)
}

fn apply_update(record: &mut ImportRecord, update: &ImportUpdate) {
    if let Some(city_raw) = &update.city_raw {
        record.city_raw = city_raw.clone();
    }
    if let Some(city_id) = update.city_id {
        record.city_id = Some(city_id);
    }
    if let Some(category_id) = update.category_id {
        record.category_id = Some(category_id);
    }
    if let Some(status) = update.status {
        record.status = status;
    }
    if let Some(reason) = &update.status_reason {
        record.status_reason = Some(reason.clone());
    }
    if let Some(processed_at) = update.processed_at {
        record.processed_at = Some(processed_at);
    }
    if let Some(vendor_id) = update.created_vendor_id {
        record.created_vendor_id = Some(vendor_id);
    }
    if let Some(vendor_id) = update.merged_into {
        record.merged_into = Some(vendor_id);
    }
}

#[async_trait]
impl ImportStore for MemoryStore {
    async fn get_import(&self, id: Uuid) -> Result<Option<ImportRecord>, StoreError> {
        Ok(self.imports.lock().unwrap().get(&id).cloned())
    }

    async fn list_imports(&self, filter: &ImportFilter) -> Result<Vec<ImportRecord>, StoreError> {
        let imports = self.imports.lock().unwrap();
        let mut matched: Vec<ImportRecord> = imports
            .values()
            .filter(|r| matches_filter(r, filter))
            .cloned()
            .collect();
        if let Some(limit) = filter.limit {
            matched.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        }
        Ok(matched)
    }

    async fn update_import(&self, id: Uuid, update: &ImportUpdate) -> Result<(), StoreError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        let mut imports = self.imports.lock().unwrap();
        let record = imports.get_mut(&id).ok_or(StoreError::NotFound { id })?;
        apply_update(record, update);
        Ok(())
    }

    async fn delete_imports(&self, ids: &[Uuid]) -> Result<u64, StoreError> {
        let mut imports = self.imports.lock().unwrap();
        let mut deleted = 0;
        for id in ids {
            if imports.remove(id).is_some() {
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    async fn count_by_status(&self, status: ImportStatus) -> Result<u64, StoreError> {
        let imports = self.imports.lock().unwrap();
        Ok(imports.values().filter(|r| r.status == status).count() as u64)
    }

    async fn approve_import(&self, import_id: Uuid, vendor: &NewVendor) -> Result<(), StoreError> {
        if !self.imports.lock().unwrap().contains_key(&import_id) {
            return Err(StoreError::NotFound { id: import_id });
        }

        self.vendors.lock().unwrap().insert(
            vendor.id,
            Vendor {
                id: vendor.id,
                business_name: vendor.business_name.clone(),
                category: vendor.category.clone(),
                city: vendor.city.clone(),
                zip: vendor.zip.clone(),
                state: vendor.state.clone(),
                country: vendor.country.clone(),
                description: vendor.description.clone(),
                price_range: vendor.price_range.clone(),
                email: vendor.email.clone(),
                phone: vendor.phone.clone(),
                website: vendor.website.clone(),
                source_url: vendor.source_url.clone(),
                source_name: vendor.source_name.clone(),
                social_media: vendor.social_media.clone(),
            },
        );

        if self.fail_mark_approved.swap(false, Ordering::SeqCst) {
            return Err(StoreError::PartialApproval {
                import_id,
                vendor_id: vendor.id,
                reason: "injected failure".to_owned(),
            });
        }

        let update = ImportUpdate {
            status: Some(ImportStatus::Approved),
            created_vendor_id: Some(vendor.id),
            processed_at: Some(Utc::now()),
            ..ImportUpdate::default()
        };
        let mut imports = self.imports.lock().unwrap();
        if let Some(record) = imports.get_mut(&import_id) {
            apply_update(record, &update);
        }
        Ok(())
    }

    async fn get_vendor(&self, id: Uuid) -> Result<Option<Vendor>, StoreError> {
        Ok(self.vendors.lock().unwrap().get(&id).cloned())
    }

    async fn patch_vendor(&self, id: Uuid, patch: &VendorPatch) -> Result<(), StoreError> {
        let mut vendors = self.vendors.lock().unwrap();
        let vendor = vendors.get_mut(&id).ok_or(StoreError::NotFound { id })?;
        if let Some(email) = &patch.email {
            vendor.email = Some(email.clone());
        }
        if let Some(phone) = &patch.phone {
            vendor.phone = Some(phone.clone());
        }
        if let Some(website) = &patch.website {
            vendor.website = Some(website.clone());
        }
        if let Some(description) = &patch.description {
            vendor.description = Some(description.clone());
        }
        if let Some(price_range) = &patch.price_range {
            vendor.price_range = Some(price_range.clone());
        }
        if let Some(social) = &patch.social_media {
            vendor.social_media = social.clone();
        }
        Ok(())
    }
}

enum AiScript {
    Answer {
        city: Option<String>,
        category: Option<String>,
    },
    FailOnCall {
        failing_call: u32,
        city: Option<String>,
    },
    RateLimited,
}

/// Scripted [`SuggestionService`] with a call counter.
pub struct ScriptedAi {
    calls: AtomicU32,
    script: AiScript,
}

impl ScriptedAi {
    pub fn answering(city: Option<&str>, category: Option<&str>) -> Self {
        Self {
            calls: AtomicU32::new(0),
            script: AiScript::Answer {
                city: city.map(str::to_owned),
                category: category.map(str::to_owned),
            },
        }
    }

    /// Answers `city` except on the `failing_call`-th call (1-based), which
    /// errors.
    pub fn failing_on_call(failing_call: u32, city: Option<&str>) -> Self {
        Self {
            calls: AtomicU32::new(0),
            script: AiScript::FailOnCall {
                failing_call,
                city: city.map(str::to_owned),
            },
        }
    }

    pub fn always_rate_limited() -> Self {
        Self {
            calls: AtomicU32::new(0),
            script: AiScript::RateLimited,
        }
    }

    pub fn total_calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn next(&self, for_city: bool) -> Result<Option<String>, SuggestError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        match &self.script {
            AiScript::Answer { city, category } => {
                Ok(if for_city { city.clone() } else { category.clone() })
            }
            AiScript::FailOnCall { failing_call, city } => {
                if call == *failing_call {
                    Err(SuggestError::Unavailable("injected outage".to_owned()))
                } else {
                    Ok(if for_city { city.clone() } else { None })
                }
            }
            AiScript::RateLimited => Err(SuggestError::RateLimited { retry_after_secs: 5 }),
        }
    }
}

#[async_trait]
impl SuggestionService for ScriptedAi {
    async fn suggest_city(
        &self,
        _raw: &str,
        _allowed: &[String],
        _country_hint: Option<CountryHint>,
        _zip: Option<&str>,
    ) -> Result<Option<String>, SuggestError> {
        self.next(true)
    }

    async fn suggest_category(
        &self,
        _raw: &str,
        _allowed: &[String],
    ) -> Result<Option<String>, SuggestError> {
        self.next(false)
    }
}
