//! Shared application state

use std::sync::Arc;

use portrait_metrics::ServiceMetrics;

use crate::config::ServiceConfig;
use crate::error::ApiError;
use crate::gpu::GpuInfo;
use crate::renderer::PortraitRenderer;

/// State shared by every handler; cheap to clone
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServiceConfig>,
    pub renderer: Arc<dyn PortraitRenderer>,
    pub metrics: Arc<ServiceMetrics>,
    pub gpu: Option<GpuInfo>,
}

impl AppState {
    pub fn new(
        config: ServiceConfig,
        renderer: Arc<dyn PortraitRenderer>,
        gpu: Option<GpuInfo>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            renderer,
            metrics: Arc::new(ServiceMetrics::new()),
            gpu,
        }
    }

    /// Fail with 503 while the renderer cannot take work
    pub fn ensure_ready(&self) -> Result<(), ApiError> {
        if self.renderer.is_ready() {
            Ok(())
        } else {
            Err(ApiError::service_unavailable("Renderer not ready"))
        }
    }
}
