//! Fixtures shared by the server's unit tests

use std::sync::Arc;
use std::time::Duration;

use image::{DynamicImage, Rgb, RgbImage};
use imgpipe_core::domain::job::SEED_INPUT_KEY;

use crate::auth::{JwtConfig, StaticCredentials};
use crate::executor::{PipelineExecutor, encode_png};
use crate::repository::MemoryJobStore;
use crate::service::JobService;
use crate::state::AppState;
use crate::storage::{MemoryObjectStore, ObjectStore, UrlSigner};

pub const TEST_SECRET: &str = "test-secret-that-is-long-enough-for-hmac";
pub const TEST_PUBLIC_URL: &str = "http://imgpipe.test";

/// Small PNG with a diagonal pattern
pub fn sample_png(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_fn(width, height, |x, y| {
        if (x + y) % 3 == 0 {
            Rgb([240, 30, 30])
        } else {
            Rgb([20, 20, 220])
        }
    });
    encode_png(&DynamicImage::ImageRgb8(image)).unwrap()
}

pub fn signer() -> Arc<UrlSigner> {
    Arc::new(UrlSigner::new(
        TEST_SECRET,
        TEST_PUBLIC_URL,
        Duration::from_secs(300),
    ))
}

/// In-memory service wiring with direct handles on both stores
pub struct Harness {
    pub service: Arc<JobService>,
    pub store: Arc<MemoryJobStore>,
    pub objects: Arc<MemoryObjectStore>,
    pub signer: Arc<UrlSigner>,
}

impl Harness {
    /// Wiring with no objects stored
    pub fn empty() -> Self {
        let signer = signer();
        let store = Arc::new(MemoryJobStore::new());
        let objects = Arc::new(MemoryObjectStore::new(Arc::clone(&signer)));
        let service = Arc::new(JobService::new(
            store.clone(),
            objects.clone(),
            Arc::new(PipelineExecutor::new()),
        ));

        Self {
            service,
            store,
            objects,
            signer,
        }
    }

    /// Wiring with a small seed image in place
    pub async fn new() -> Self {
        let harness = Self::empty();
        harness
            .objects
            .put(SEED_INPUT_KEY, sample_png(32, 32))
            .await
            .unwrap();
        harness
    }

    pub fn jwt(&self) -> JwtConfig {
        JwtConfig {
            secret: TEST_SECRET.to_string(),
            expiry_mins: 120,
        }
    }

    pub fn app_state(&self) -> AppState {
        AppState {
            jobs: Arc::clone(&self.service),
            objects: self.objects.clone(),
            signer: Arc::clone(&self.signer),
            credentials: Arc::new(StaticCredentials::development()),
            jwt: Arc::new(self.jwt()),
            max_upload_bytes: 1024 * 1024,
        }
    }
}
