//! Asynchronous model loading
//!
//! Loads run as a single future that the frame loop polls once per frame
//! (no executor needed, the same way on native and WASM). Every request
//! resolves: a model that fails to fetch or parse is replaced by a
//! procedural placeholder, so completion always yields one model per
//! requested prop kind.

use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use rand::rngs::SmallRng;
use rand::SeedableRng;

use super::model::{ModelAsset, ModelError, ModelSource};
use crate::config::{SkyConfig, Span};

/// Radial jitter of placeholder rock vertices
pub const PLACEHOLDER_LUMPINESS: Span = Span(0.75, 1.15);

pub type FetchFuture = Pin<Box<dyn Future<Output = Result<String, ModelError>>>>;

/// Turns an asset path into its text
pub type Fetcher = Rc<dyn Fn(String) -> FetchFuture>;

/// Fetch through macroquad's file loader (filesystem on native, HTTP on WASM)
pub fn macroquad_fetcher() -> Fetcher {
    Rc::new(|path: String| -> FetchFuture {
        Box::pin(async move {
            macroquad::file::load_string(&path)
                .await
                .map_err(|e| ModelError::Fetch {
                    path: path.clone(),
                    message: e.to_string(),
                })
        })
    })
}

/// One model to load, for one prop kind
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    pub kind: usize,
    pub name: String,
    pub path: String,
}

impl ModelRequest {
    /// One request per configured prop kind
    pub fn from_config(config: &SkyConfig) -> Vec<Self> {
        config
            .props
            .iter()
            .enumerate()
            .map(|(kind, spec)| Self {
                kind,
                name: spec.name.clone(),
                path: spec.model_path.clone(),
            })
            .collect()
    }
}

/// How a request resolved
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Loaded { kind: usize, model: ModelAsset },
    Fallback { kind: usize, model: ModelAsset, error: ModelError },
}

impl LoadOutcome {
    pub fn kind(&self) -> usize {
        match self {
            LoadOutcome::Loaded { kind, .. } | LoadOutcome::Fallback { kind, .. } => *kind,
        }
    }

    pub fn model(&self) -> &ModelAsset {
        match self {
            LoadOutcome::Loaded { model, .. } | LoadOutcome::Fallback { model, .. } => model,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, LoadOutcome::Fallback { .. })
    }
}

/// Load every request in order. Never fails.
pub async fn load_models(requests: Vec<ModelRequest>, fetch: Fetcher, seed: u64) -> Vec<LoadOutcome> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut outcomes = Vec::with_capacity(requests.len());

    for request in requests {
        let parsed = match fetch(request.path.clone()).await {
            Ok(text) => ModelAsset::parse_obj(&request.name, &text),
            Err(e) => Err(e),
        };

        let outcome = match parsed {
            Ok(mut model) => {
                model.source = ModelSource::File(request.path.clone());
                log::info!(
                    "Loaded model {} ({} triangles)",
                    request.path,
                    model.triangle_count()
                );
                LoadOutcome::Loaded { kind: request.kind, model }
            }
            Err(error) => {
                log::warn!("Model {} unavailable ({}), using placeholder", request.path, error);
                LoadOutcome::Fallback {
                    kind: request.kind,
                    model: ModelAsset::placeholder(&request.name, PLACEHOLDER_LUMPINESS, &mut rng),
                    error,
                }
            }
        };
        outcomes.push(outcome);
    }

    outcomes
}

/// A model load in flight, tagged with the mount generation that started it
pub struct PendingModels {
    future: Pin<Box<dyn Future<Output = Vec<LoadOutcome>>>>,
    generation: u64,
    result: Option<Vec<LoadOutcome>>,
}

impl PendingModels {
    pub fn start(requests: Vec<ModelRequest>, fetch: Fetcher, seed: u64, generation: u64) -> Self {
        Self {
            future: Box::pin(load_models(requests, fetch, seed)),
            generation,
            result: None,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Poll the load once; true when finished
    pub fn is_complete(&mut self) -> bool {
        if self.result.is_some() {
            return true;
        }

        let mut cx = Context::from_waker(Waker::noop());
        match self.future.as_mut().poll(&mut cx) {
            Poll::Ready(outcomes) => {
                self.result = Some(outcomes);
                true
            }
            Poll::Pending => false,
        }
    }

    /// Take the outcomes if complete
    pub fn take(mut self) -> Option<Vec<LoadOutcome>> {
        if self.result.is_none() {
            self.is_complete();
        }
        self.result
    }
}
