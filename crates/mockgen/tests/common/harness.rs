//! Test harness for isolated pipeline runs.
//!
//! `TestHarness` owns a temporary SQLite file, a scripted vendor and an
//! image server keyed by URL, and builds a `MockupService` on top.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;

use mockgen::config::Config;
use mockgen::db::variant_repo;
use mockgen::detect::{DetectError, ImageFetcher};
use mockgen::vendor::types::{OneOrMany, ResultEntry};
use mockgen::vendor::{
    CreateTaskRequest, TaskKey, TaskResponse, TaskStatus, VendorApi, VendorError,
};
use mockgen::{Database, MockupService};

/// How the fake vendor answers a task for one product.
#[derive(Clone)]
pub enum TaskScript {
    /// Completes on the first poll with the given result entries.
    Complete(Vec<ResultEntry>),
    /// Reports `failed` with a message.
    Fail(String),
    /// Rejects the submission outright.
    Reject(u16),
    /// Never leaves `pending`.
    Stall,
}

/// Vendor fake keyed by product id.
#[derive(Default)]
pub struct FakeVendor {
    catalog: Mutex<HashMap<i64, i64>>,
    scripts: Mutex<HashMap<i64, TaskScript>>,
    tasks: Mutex<HashMap<String, TaskScript>>,
    pub created: Mutex<Vec<CreateTaskRequest>>,
}

impl FakeVendor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a variant in the vendor catalog.
    pub fn catalog(&self, variant_id: i64, product_id: i64) {
        self.catalog.lock().unwrap().insert(variant_id, product_id);
    }

    pub fn script(&self, product_id: i64, script: TaskScript) {
        self.scripts.lock().unwrap().insert(product_id, script);
    }

    pub fn submissions(&self) -> Vec<CreateTaskRequest> {
        self.created.lock().unwrap().clone()
    }

    fn product_of(&self, variant_id: i64) -> Option<i64> {
        self.catalog.lock().unwrap().get(&variant_id).copied()
    }
}

#[async_trait]
impl VendorApi for FakeVendor {
    async fn create_task(&self, request: &CreateTaskRequest) -> Result<TaskKey, VendorError> {
        let key = {
            let mut created = self.created.lock().unwrap();
            created.push(request.clone());
            format!("task-{}", created.len())
        };

        let product = request
            .variant_ids
            .first()
            .and_then(|v| self.product_of(*v))
            .unwrap_or_default();
        let script = self
            .scripts
            .lock()
            .unwrap()
            .get(&product)
            .cloned()
            .unwrap_or(TaskScript::Complete(vec![]));

        if let TaskScript::Reject(status) = script {
            return Err(VendorError::Status {
                status,
                body: "submission rejected".to_string(),
            });
        }

        self.tasks.lock().unwrap().insert(key.clone(), script);
        Ok(TaskKey(key))
    }

    async fn get_task(&self, task_key: &TaskKey) -> Result<TaskResponse, VendorError> {
        let script = self.tasks.lock().unwrap().get(&task_key.0).cloned();
        let response = match script {
            Some(TaskScript::Complete(results)) => TaskResponse {
                status: TaskStatus::Completed,
                results,
                error: None,
            },
            Some(TaskScript::Fail(message)) => TaskResponse {
                status: TaskStatus::Failed,
                results: vec![],
                error: Some(message),
            },
            Some(TaskScript::Stall) => TaskResponse {
                status: TaskStatus::Pending,
                results: vec![],
                error: None,
            },
            Some(TaskScript::Reject(_)) | None => {
                return Err(VendorError::Status {
                    status: 404,
                    body: "unknown task".to_string(),
                })
            }
        };
        Ok(response)
    }

    async fn variant_product(&self, variant_id: i64) -> Result<i64, VendorError> {
        self.product_of(variant_id).ok_or(VendorError::Status {
            status: 404,
            body: format!("variant {} not found", variant_id),
        })
    }
}

/// A result entry covering `variant_ids` with a primary image URL.
pub fn entry(variant_ids: &[i64], url: &str) -> ResultEntry {
    ResultEntry {
        variant_ids: Some(OneOrMany::Many(variant_ids.to_vec())),
        image_url: Some(url.to_string()),
        ..Default::default()
    }
}

/// Serves image bytes by URL; unknown URLs fail like a 404.
#[derive(Default)]
pub struct UrlFetcher {
    images: Mutex<HashMap<String, Vec<u8>>>,
}

impl UrlFetcher {
    pub fn serve(&self, url: &str, bytes: Vec<u8>) {
        self.images.lock().unwrap().insert(url.to_string(), bytes);
    }
}

#[async_trait]
impl ImageFetcher for UrlFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, DetectError> {
        self.images
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| DetectError::Fetch {
                url: url.to_string(),
                reason: "HTTP 404 Not Found".to_string(),
            })
    }
}

pub struct TestHarness {
    _temp_dir: TempDir,
    pub db: Database,
    pub vendor: Arc<FakeVendor>,
    pub images: Arc<UrlFetcher>,
    pub config: Config,
}

impl TestHarness {
    pub fn new(config: Config) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let db = Database::open(&temp_dir.path().join("mockgen.db"))
            .expect("Failed to open test database");

        Self {
            _temp_dir: temp_dir,
            db,
            vendor: Arc::new(FakeVendor::new()),
            images: Arc::new(UrlFetcher::default()),
            config,
        }
    }

    /// Adds a variant to the local store and the vendor catalog.
    pub fn variant(&self, variant_id: i64, product_id: i64, known_locally: bool) -> &Self {
        let local_product = known_locally.then_some(product_id);
        variant_repo::upsert(&self.db, variant_id, local_product)
            .expect("Failed to insert variant");
        self.vendor.catalog(variant_id, product_id);
        self
    }

    pub fn service(&self) -> MockupService {
        MockupService::new(
            &self.config,
            self.db.clone(),
            self.vendor.clone(),
            self.images.clone(),
        )
    }
}
