// THEORY:
// The `pipeline` module is the top-level API of the pixelator. A `Pixelator`
// session holds the current configuration, the last decoded image and the last
// visible surface, and re-runs a render pass on every property change.
//
// Every pass is bracketed by one render-start and one render-end event. For a
// pass that begins with a decode, the bracket opens when the decode is
// requested and closes when it completes, whether it rendered, failed or went
// stale.
//
// Decoding is the one asynchronous step. It runs on a blocking worker and is
// tagged with a generation number when requested. If another image is requested
// before it finishes, the late result is thrown away instead of overwriting the
// newer image. Property changes made while a decode is in flight simply update
// the configuration, and the decode renders with whatever is current when it
// lands.
//
// Failures never escape as panics or corrupt the session: each pass either
// replaces the visible output or reports why it produced none.

use crate::core_modules::frame_buffer::FrameBuffer;
use crate::core_modules::grid::{GridSize, PixelationFactor, Validity, validate_proportions};
use crate::core_modules::pointer::{
    CellCoords, ClickOutcome, Clipboard, PointerProbe, PointerSampler, probe,
};
use crate::core_modules::records::PixelRecord;
use crate::core_modules::renderer::{RenderConfig, RenderOutput, RenderPass, RenderState};
use crate::core_modules::utils::image_helper::image_helper;
use crate::error::{PixelatorError, Result};
use image::RgbaImage;
use log::{debug, error, warn};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Lifecycle callbacks around each render pass. `on_render_start` and
/// `on_render_end` always come in pairs.
pub trait RenderEvents {
    fn on_render_start(&mut self) {}
    fn on_render_end(&mut self) {}
    fn on_pixels(&mut self, _records: &[PixelRecord]) {}
    fn on_error(&mut self, _error: &PixelatorError) {}
}

impl RenderEvents for () {}

/// How a request to render ended.
#[derive(Debug)]
pub enum RenderOutcome {
    Rendered { records: usize },
    /// No image has been loaded yet.
    NoImage,
    /// A newer decode was requested while this one was running.
    Stale { generation: u64 },
    Failed(PixelatorError),
}

impl RenderOutcome {
    pub fn is_rendered(&self) -> bool {
        matches!(self, RenderOutcome::Rendered { .. })
    }
}

/// A decode running on a blocking worker.
pub struct PendingDecode {
    generation: u64,
    task: JoinHandle<Result<RgbaImage>>,
}

impl PendingDecode {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

pub struct Pixelator<E: RenderEvents = ()> {
    config: RenderConfig,
    events: E,
    state: RenderState,
    generation: u64,
    image: Option<Arc<RgbaImage>>,
    validity: Option<Validity>,
    output: Option<RenderOutput>,
    sampler: PointerSampler,
}

impl Pixelator<()> {
    pub fn with_config(config: RenderConfig) -> Self {
        Self::new(config, ())
    }
}

impl<E: RenderEvents> Pixelator<E> {
    pub fn new(config: RenderConfig, events: E) -> Self {
        Self {
            config,
            events,
            state: RenderState::Idle,
            generation: 0,
            image: None,
            validity: None,
            output: None,
            sampler: PointerSampler::new(),
        }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn events(&self) -> &E {
        &self.events
    }

    pub fn state(&self) -> &RenderState {
        &self.state
    }

    pub fn validity(&self) -> Option<Validity> {
        self.validity
    }

    pub fn surface(&self) -> Option<&FrameBuffer> {
        self.output.as_ref().map(|output| &output.surface)
    }

    pub fn records(&self) -> &[PixelRecord] {
        self.output
            .as_ref()
            .map(|output| output.records.as_slice())
            .unwrap_or_default()
    }

    /// Pixelation of the visible surface; factor 0 when nothing is rendered.
    pub fn destination(&self) -> PixelationFactor {
        self.output
            .as_ref()
            .map(|output| output.destination)
            .unwrap_or_default()
    }

    /// Starts decoding `bytes` on a blocking worker. Needs a tokio runtime.
    pub fn begin_decode(&mut self, bytes: Vec<u8>) -> PendingDecode {
        self.generation += 1;
        self.state = RenderState::Loading;
        self.events.on_render_start();
        debug!("Decode {} requested ({} bytes)", self.generation, bytes.len());
        PendingDecode {
            generation: self.generation,
            task: tokio::task::spawn_blocking(move || image_helper::decode(&bytes)),
        }
    }

    /// Waits for a decode and renders it, unless a newer decode superseded it.
    pub async fn complete_decode(&mut self, pending: PendingDecode) -> RenderOutcome {
        let outcome = self.finish_decode(pending).await;
        self.events.on_render_end();
        outcome
    }

    async fn finish_decode(&mut self, pending: PendingDecode) -> RenderOutcome {
        let decoded = match pending.task.await {
            Ok(decoded) => decoded,
            Err(err) => Err(PixelatorError::DecodeFailed(err.to_string())),
        };

        if pending.generation != self.generation {
            warn!(
                "Discarding decode {} in favour of {}",
                pending.generation, self.generation
            );
            return RenderOutcome::Stale {
                generation: pending.generation,
            };
        }

        match decoded {
            Ok(image) => {
                self.install_image(image);
                self.run_pass()
            }
            Err(err) => self.fail(err),
        }
    }

    pub async fn load(&mut self, bytes: Vec<u8>) -> RenderOutcome {
        let pending = self.begin_decode(bytes);
        self.complete_decode(pending).await
    }

    /// Replaces the image with an already decoded one and renders it.
    pub fn set_image(&mut self, image: RgbaImage) -> RenderOutcome {
        self.install_image(image);
        self.render()
    }

    fn install_image(&mut self, image: RgbaImage) {
        self.update_validity(image.width(), image.height());
        self.image = Some(Arc::new(image));
        self.sampler.reset();
    }

    pub fn set_config(&mut self, config: RenderConfig) -> RenderOutcome {
        self.config = config;
        if let Some(image) = &self.image {
            let (width, height) = image.dimensions();
            self.update_validity(width, height);
        }
        self.render()
    }

    pub fn set_grid_size(&mut self, grid_size: Option<GridSize>) -> RenderOutcome {
        let config = self.config.clone().with_grid_size(grid_size);
        self.set_config(config)
    }

    pub fn set_blur(&mut self, blur: u8) -> RenderOutcome {
        let config = self.config.clone().with_blur(blur);
        self.set_config(config)
    }

    pub fn set_pixelate(&mut self, pixelate: bool) -> RenderOutcome {
        let config = self.config.clone().with_pixelate(pixelate);
        self.set_config(config)
    }

    pub fn set_lined(&mut self, lined: bool) -> RenderOutcome {
        let config = self.config.clone().with_lined(lined);
        self.set_config(config)
    }

    pub fn set_display_size(&mut self, width: u32, height: u32) -> RenderOutcome {
        let config = self.config.clone().with_display_size(width, height);
        self.set_config(config)
    }

    /// Back to the default configuration with no image.
    pub fn reset(&mut self) {
        self.config = RenderConfig::default();
        self.state = RenderState::Idle;
        self.generation += 1;
        self.image = None;
        self.validity = None;
        self.output = None;
        self.sampler.reset();
    }

    /// Re-runs a pass over the current image with the current configuration.
    pub fn render(&mut self) -> RenderOutcome {
        if self.image.is_none() {
            return RenderOutcome::NoImage;
        }
        self.events.on_render_start();
        let outcome = self.run_pass();
        self.events.on_render_end();
        outcome
    }

    fn run_pass(&mut self) -> RenderOutcome {
        let Some(image) = self.image.clone() else {
            return RenderOutcome::NoImage;
        };

        let mut pass = RenderPass::new(&image, &self.config);
        let result = pass.run();
        self.state = pass.state().clone();

        match result {
            Ok(output) => {
                self.events.on_pixels(&output.records);
                let records = output.records.len();
                self.output = Some(output);
                RenderOutcome::Rendered { records }
            }
            Err(err) => {
                self.output = None;
                self.events.on_error(&err);
                error!("Render pass failed: {err}");
                RenderOutcome::Failed(err)
            }
        }
    }

    fn fail(&mut self, err: PixelatorError) -> RenderOutcome {
        error!("{err}");
        self.state = RenderState::Error(err.to_string());
        self.output = None;
        self.events.on_error(&err);
        RenderOutcome::Failed(err)
    }

    fn update_validity(&mut self, width: u32, height: u32) {
        let validity = match self.config.grid_size {
            Some(grid_size) => validate_proportions(width, height, grid_size),
            None => Validity::Valid,
        };
        if let Some(warning) = validity.warning() {
            warn!("{warning}");
        }
        self.validity = Some(validity);
    }

    // --- Pointer interaction over the visible surface ---

    pub fn probe(&self, x: f64, y: f64) -> Option<PointerProbe> {
        let output = self.output.as_ref()?;
        probe(&output.surface, x, y, output.destination)
    }

    /// Returns `true` when the hovered cell changed.
    pub fn pointer_move(&mut self, x: f64, y: f64) -> bool {
        let Some(output) = &self.output else {
            return false;
        };
        self.sampler
            .on_move(&output.surface, output.destination, x, y)
    }

    pub fn pointer_click(
        &mut self,
        x: f64,
        y: f64,
        clipboard: &mut impl Clipboard,
    ) -> Option<ClickOutcome> {
        let output = self.output.as_ref()?;
        self.sampler
            .on_click(&output.surface, output.destination, x, y, clipboard)
    }

    pub fn pointer_exit(&mut self) {
        self.sampler.on_exit();
    }

    pub fn hovered_color(&self) -> Option<&str> {
        self.sampler.color()
    }

    pub fn hovered_cell(&self) -> Option<CellCoords> {
        self.sampler.coords()
    }

    pub fn highlighted_cell(&self) -> Option<CellCoords> {
        self.sampler.highlight()
    }
}

/// Decodes and renders in one call, for callers without a session.
pub fn pixelate_bytes(bytes: &[u8], config: &RenderConfig) -> Result<RenderOutput> {
    let image = image_helper::decode(bytes)?;
    RenderPass::new(&image, config).run()
}
