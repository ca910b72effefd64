//! In-memory doubles for the store, the index and the catalog source.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::consumer::{retry_with_backoff, CatalogPage, CatalogSource};
use crate::errors::FetchError;
use product_indexer_repository::{
    ImportItemResult, ProductStore, SearchIndexError, SearchIndexProvider, StoreError, StoreStats,
};
use product_indexer_shared::{ProductAttribute, ProductDocument, ProductImage, ProductRow};

/// The single-product record used throughout the tests.
pub fn shoe_record() -> Value {
    json!({
        "id": 42,
        "external_id": "X42",
        "title": "Shoe",
        "is_active": true,
        "stock": 3,
        "pricing": { "list_price": 100, "sales_price": 80, "percentage_discount": 20 },
        "rating": { "average_score": 4 },
        "features": { "super_express": true },
        "shipping": { "is_free": true },
        "pictures": [{ "source": "a.jpg", "thumbnail": "at.jpg" }, { "source": "b.jpg" }],
        "attributes": [{ "name": "Color", "value": "Red" }],
        "volumetries": [{ "height": 10, "weight": 2 }],
        "categories": [[
            { "name": "A", "level": 2 },
            { "name": "B", "level": 1 },
            { "name": "C", "level": 0 }
        ]]
    })
}

/// Minimal records with the given ids.
pub fn records(ids: impl IntoIterator<Item = i64>) -> Vec<Value> {
    ids.into_iter()
        .map(|id| json!({ "id": id, "title": format!("Product {}", id), "is_active": true }))
        .collect()
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Failures a [`MemoryStore`] can be told to simulate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailOn {
    Probe(i64),
    Insert(i64),
    /// The connection drops when this product is probed. One-shot.
    ConnectionLostAt(i64),
    /// The server rolls the transaction back when this product is written. One-shot.
    Deadlock(i64),
    Begin,
    Commit,
    ChildInsert,
    Cleanup,
    Facets,
}

#[derive(Debug, Clone, Default)]
struct Tables {
    products: BTreeMap<i64, ProductRow>,
    images: Vec<ProductImage>,
    attributes: Vec<ProductAttribute>,
}

#[derive(Debug, Default)]
struct StoreState {
    committed: Tables,
    staged: Option<Tables>,
    failures: Vec<FailOn>,
    commits: usize,
    facet_refreshes: usize,
    optimized: Vec<String>,
    cleanup_calls: Vec<u32>,
}

impl StoreState {
    fn tables(&mut self) -> &mut Tables {
        match self.staged {
            Some(ref mut staged) => staged,
            None => &mut self.committed,
        }
    }

    fn fails(&self, failure: &FailOn) -> bool {
        self.failures.contains(failure)
    }

    /// Consume a one-shot failure, discarding the open transaction.
    fn abort_on(&mut self, failure: &FailOn) -> bool {
        match self.failures.iter().position(|f| f == failure) {
            Some(pos) => {
                self.failures.remove(pos);
                self.staged = None;
                true
            }
            None => false,
        }
    }
}

fn deadlock() -> StoreError {
    StoreError::transaction_aborted("Deadlock found when trying to get lock")
}

/// In-memory [`ProductStore`] with transaction staging.
///
/// Clones share state, so a test can hand one clone to the code under test
/// and inspect committed rows through another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<StoreState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap()
    }

    pub fn fail_on(&self, failure: FailOn) {
        self.lock().failures.push(failure);
    }

    pub fn product(&self, id: i64) -> Option<ProductRow> {
        self.lock().committed.products.get(&id).cloned()
    }

    pub fn product_count(&self) -> usize {
        self.lock().committed.products.len()
    }

    pub fn images(&self, product_id: i64) -> Vec<ProductImage> {
        self.lock()
            .committed
            .images
            .iter()
            .filter(|i| i.product_id == product_id)
            .cloned()
            .collect()
    }

    pub fn attributes(&self, product_id: i64) -> Vec<ProductAttribute> {
        self.lock()
            .committed
            .attributes
            .iter()
            .filter(|a| a.product_id == product_id)
            .cloned()
            .collect()
    }

    pub fn commits(&self) -> usize {
        self.lock().commits
    }

    pub fn facet_refreshes(&self) -> usize {
        self.lock().facet_refreshes
    }

    pub fn optimized_tables(&self) -> Vec<String> {
        self.lock().optimized.clone()
    }

    pub fn cleanup_calls(&self) -> Vec<u32> {
        self.lock().cleanup_calls.clone()
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn begin(&mut self) -> Result<(), StoreError> {
        let mut state = self.lock();
        if state.fails(&FailOn::Begin) {
            return Err(StoreError::transaction("simulated begin failure"));
        }
        state.staged = Some(state.committed.clone());
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), StoreError> {
        let mut state = self.lock();
        if state.fails(&FailOn::Commit) {
            return Err(StoreError::transaction("simulated commit failure"));
        }
        if let Some(staged) = state.staged.take() {
            state.committed = staged;
        }
        state.commits += 1;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), StoreError> {
        self.lock().staged = None;
        Ok(())
    }

    async fn product_exists(&mut self, id: i64) -> Result<bool, StoreError> {
        let mut state = self.lock();
        if state.abort_on(&FailOn::ConnectionLostAt(id)) {
            return Err(StoreError::connection("connection lost"));
        }
        if state.fails(&FailOn::Probe(id)) {
            return Err(StoreError::query("simulated probe failure"));
        }
        Ok(state.tables().products.contains_key(&id))
    }

    async fn insert_product(&mut self, row: &ProductRow) -> Result<(), StoreError> {
        let mut state = self.lock();
        if state.abort_on(&FailOn::Deadlock(row.id)) {
            return Err(deadlock());
        }
        if state.fails(&FailOn::Insert(row.id)) {
            return Err(StoreError::query("simulated insert failure"));
        }
        state.tables().products.insert(row.id, row.clone());
        Ok(())
    }

    async fn update_product(&mut self, row: &ProductRow) -> Result<(), StoreError> {
        let mut state = self.lock();
        if state.abort_on(&FailOn::Deadlock(row.id)) {
            return Err(deadlock());
        }
        match state.tables().products.get_mut(&row.id) {
            Some(existing) => {
                *existing = row.clone();
                Ok(())
            }
            None => Err(StoreError::query("no such product")),
        }
    }

    async fn delete_images(&mut self, product_id: i64) -> Result<u64, StoreError> {
        let mut state = self.lock();
        let images = &mut state.tables().images;
        let before = images.len();
        images.retain(|i| i.product_id != product_id);
        Ok((before - images.len()) as u64)
    }

    async fn insert_image(&mut self, image: &ProductImage) -> Result<(), StoreError> {
        let mut state = self.lock();
        if state.fails(&FailOn::ChildInsert) {
            return Err(StoreError::query("simulated child insert failure"));
        }
        state.tables().images.push(image.clone());
        Ok(())
    }

    async fn delete_attributes(&mut self, product_id: i64) -> Result<u64, StoreError> {
        let mut state = self.lock();
        let attributes = &mut state.tables().attributes;
        let before = attributes.len();
        attributes.retain(|a| a.product_id != product_id);
        Ok((before - attributes.len()) as u64)
    }

    async fn insert_attribute(&mut self, attribute: &ProductAttribute) -> Result<(), StoreError> {
        let mut state = self.lock();
        if state.fails(&FailOn::ChildInsert) {
            return Err(StoreError::query("simulated child insert failure"));
        }
        state.tables().attributes.push(attribute.clone());
        Ok(())
    }

    async fn cleanup_inactive(&mut self, older_than_days: u32) -> Result<u64, StoreError> {
        let mut state = self.lock();
        state.cleanup_calls.push(older_than_days);
        if state.fails(&FailOn::Cleanup) {
            return Err(StoreError::query("simulated cleanup failure"));
        }

        let tables = &mut state.committed;
        let stale: Vec<i64> = tables
            .products
            .values()
            .filter(|p| p.status == 0)
            .map(|p| p.id)
            .collect();
        for id in &stale {
            tables.products.remove(id);
        }
        tables.images.retain(|i| !stale.contains(&i.product_id));
        tables.attributes.retain(|a| !stale.contains(&a.product_id));
        Ok(stale.len() as u64)
    }

    async fn update_facets(&mut self) -> Result<(), StoreError> {
        let mut state = self.lock();
        if state.fails(&FailOn::Facets) {
            return Err(StoreError::query("PROCEDURE UpdateAllFacets does not exist"));
        }
        state.facet_refreshes += 1;
        Ok(())
    }

    async fn optimize_table(&mut self, table: &str) -> Result<(), StoreError> {
        self.lock().optimized.push(table.to_string());
        Ok(())
    }

    async fn stats(&mut self) -> Result<StoreStats, StoreError> {
        let state = self.lock();
        let tables = &state.committed;
        Ok(StoreStats {
            products: tables.products.len() as i64,
            active_products: tables.products.values().filter(|p| p.status == 1).count() as i64,
            images: tables.images.len() as i64,
            attributes: tables.attributes.len() as i64,
            variations: None,
            facet_counts: None,
        })
    }
}

// ---------------------------------------------------------------------------
// Search index
// ---------------------------------------------------------------------------

/// A canned response for one import call.
#[derive(Debug, Clone)]
pub enum ScriptedImport {
    Results(Vec<ImportItemResult>),
    Error(SearchIndexError),
}

/// [`SearchIndexProvider`] that records every batch.
///
/// Scripted responses are used in order; once they run out every document
/// is accepted.
#[derive(Debug, Default)]
pub struct RecordingIndex {
    script: Mutex<VecDeque<ScriptedImport>>,
    batches: Mutex<Vec<Vec<ProductDocument>>>,
    ensure_calls: Mutex<usize>,
    fail_ensure: bool,
}

impl RecordingIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scripted(responses: Vec<ScriptedImport>) -> Self {
        Self {
            script: Mutex::new(responses.into()),
            ..Self::default()
        }
    }

    pub fn failing_bootstrap() -> Self {
        Self {
            fail_ensure: true,
            ..Self::default()
        }
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batches.lock().unwrap().iter().map(Vec::len).collect()
    }

    pub fn documents(&self) -> Vec<ProductDocument> {
        self.batches.lock().unwrap().iter().flatten().cloned().collect()
    }

    pub fn document_count(&self) -> usize {
        self.batch_sizes().iter().sum()
    }

    pub fn ensure_calls(&self) -> usize {
        *self.ensure_calls.lock().unwrap()
    }
}

#[async_trait]
impl SearchIndexProvider for RecordingIndex {
    async fn import_documents(
        &self,
        documents: &[ProductDocument],
    ) -> Result<Vec<ImportItemResult>, SearchIndexError> {
        self.batches.lock().unwrap().push(documents.to_vec());

        match self.script.lock().unwrap().pop_front() {
            Some(ScriptedImport::Results(results)) => Ok(results),
            Some(ScriptedImport::Error(e)) => Err(e),
            None => Ok(documents
                .iter()
                .map(|d| ImportItemResult::ok(d.object_id.clone()))
                .collect()),
        }
    }

    async fn ensure_index_exists(&self) -> Result<(), SearchIndexError> {
        *self.ensure_calls.lock().unwrap() += 1;
        if self.fail_ensure {
            return Err(SearchIndexError::index_creation("mapper conflict"));
        }
        Ok(())
    }

    async fn health_check(&self) -> Result<bool, SearchIndexError> {
        Ok(true)
    }
}

// ---------------------------------------------------------------------------
// Catalog source
// ---------------------------------------------------------------------------

/// [`CatalogSource`] serving scripted attempts per page.
///
/// Each fetch goes through the real retry helper. A page with no scripted
/// attempts left returns an empty page.
#[derive(Debug)]
pub struct ScriptedSource {
    attempts: Mutex<HashMap<u32, VecDeque<Result<CatalogPage, String>>>>,
    requests: Mutex<Vec<u32>>,
    max_attempts: u32,
    retry_delay: Duration,
}

impl Default for ScriptedSource {
    fn default() -> Self {
        Self {
            attempts: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
            max_attempts: 3,
            retry_delay: Duration::from_secs(1),
        }
    }
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `records` for `page`, reporting `page_count` total pages.
    pub fn page(self, page: u32, records: Vec<Value>, page_count: Option<u32>) -> Self {
        self.attempts(page, vec![Ok(CatalogPage::new(records, page_count))])
    }

    /// Fail every attempt for `page`.
    pub fn failing(self, page: u32) -> Self {
        let errors = (0..self.max_attempts)
            .map(|_| Err("operation timed out".to_string()))
            .collect();
        self.attempts(page, errors)
    }

    /// Serve these attempt outcomes for `page`, in order.
    pub fn attempts(self, page: u32, outcomes: Vec<Result<CatalogPage, String>>) -> Self {
        self.attempts
            .lock()
            .unwrap()
            .entry(page)
            .or_default()
            .extend(outcomes);
        self
    }

    /// Every page requested, once per attempt.
    pub fn requests(&self) -> Vec<u32> {
        self.requests.lock().unwrap().clone()
    }

    fn next_attempt(&self, page: u32) -> Result<CatalogPage, String> {
        self.requests.lock().unwrap().push(page);
        self.attempts
            .lock()
            .unwrap()
            .get_mut(&page)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Ok(CatalogPage::default()))
    }
}

#[async_trait]
impl CatalogSource for ScriptedSource {
    async fn fetch_page(&self, page: u32) -> Result<CatalogPage, FetchError> {
        retry_with_backoff(page, self.max_attempts, self.retry_delay, |_| {
            let outcome = self.next_attempt(page);
            async move { outcome }
        })
        .await
    }
}
