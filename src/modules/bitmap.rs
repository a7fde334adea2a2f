use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, TryRecvError};

use crate::context::UiSender;
use crate::foundation::core::Region;
use crate::foundation::error::{ComposerError, ComposerResult};
use crate::foundation::math::premultiply_in_place;
use crate::layer::module::ModuleBehavior;
use crate::layer::{DrawCx, Inputs, LayerState};
use crate::param::kinds::{ImageData, ImageKind, RegionKind};
use crate::param::parameter::Parameter;
use crate::param::table::ParamTable;
use crate::render::outcome::{RenderAbort, RenderResult};
use crate::render::surface::RetainedVisual;

/// Where the next [`ImageModule::import`] decodes.
///
/// `NextCallOnly` and `SkipNextCallOnly` apply to one call, then flip to `Never` and `Always`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DelegateMode {
    /// Every import decodes on a worker thread.
    Always,
    /// The next import decodes on a worker; later ones run inline.
    NextCallOnly,
    /// The next import runs inline; later ones go to a worker.
    SkipNextCallOnly,
    /// Every import decodes inline.
    #[default]
    Never,
}

impl DelegateMode {
    pub fn delegates(self) -> bool {
        matches!(self, Self::Always | Self::NextCallOnly)
    }

    pub fn after_call(self) -> Self {
        match self {
            Self::NextCallOnly => Self::Never,
            Self::SkipNextCallOnly => Self::Always,
            m => m,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImportStatus {
    /// Decoded and written to the inputs already.
    Applied,
    /// Decoding on a worker; adopted at the start of a later pass.
    Pending,
}

struct ScaledCache {
    source: ImageData,
    location: Region,
    window: Region,
    pixels: Arc<Vec<u8>>,
}

/// A bitmap placed on the canvas, scaled to its "Location".
///
/// Worker decodes hand their result back over a channel; the module only touches its inputs
/// from the owning thread, in [`ModuleBehavior::prepare`].
#[derive(Default)]
pub struct ImageModule {
    delegate: DelegateMode,
    pending: Option<Receiver<ComposerResult<ImageData>>>,
    cache: Option<ScaledCache>,
}

impl ImageModule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delegate_mode(&self) -> DelegateMode {
        self.delegate
    }

    pub fn set_delegate_mode(&mut self, mode: DelegateMode) {
        self.delegate = mode;
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Decode `bytes` and make it this module's image, inline or on a worker per the delegate mode.
    ///
    /// `notify` is poked from the worker once its result is ready.
    pub fn import(
        &mut self,
        layer: &LayerState,
        table: &mut ParamTable,
        bytes: Vec<u8>,
        notify: Option<UiSender>,
    ) -> ComposerResult<ImportStatus> {
        let delegate = self.delegate.delegates();
        self.delegate = self.delegate.after_call();

        if !delegate {
            let image = ImageData::from_encoded(&bytes)?;
            adopt(layer, table, image, true)?;
            return Ok(ImportStatus::Applied);
        }

        if self.pending.is_some() {
            tracing::debug!("replacing an unfinished image import");
        }
        let (tx, rx) = crossbeam_channel::bounded(1);
        std::thread::Builder::new()
            .name("tessera-image-decode".to_owned())
            .spawn(move || {
                let decoded = ImageData::from_encoded(&bytes);
                if tx.send(decoded).is_err() {
                    tracing::warn!("decoded image dropped: import was superseded");
                    return;
                }
                if let Some(notify) = notify {
                    notify.request_render();
                }
            })
            .map_err(|e| anyhow::anyhow!("spawn image decode worker: {e}"))?;
        self.pending = Some(rx);
        Ok(ImportStatus::Pending)
    }

    /// Block until a pending worker import arrives, then adopt it. Returns `false` on timeout or
    /// when nothing is pending.
    pub fn wait_for_import(
        &mut self,
        layer: &LayerState,
        table: &mut ParamTable,
        timeout: Duration,
    ) -> ComposerResult<bool> {
        let Some(rx) = &self.pending else {
            return Ok(false);
        };
        match rx.recv_timeout(timeout) {
            Ok(decoded) => {
                self.pending = None;
                adopt(layer, table, decoded?, false)?;
                Ok(true)
            }
            Err(RecvTimeoutError::Timeout) => Ok(false),
            Err(RecvTimeoutError::Disconnected) => {
                self.pending = None;
                Ok(false)
            }
        }
    }
}

/// Store an imported image and size the location to it. Never part of initialization.
fn adopt(layer: &LayerState, table: &mut ParamTable, image: ImageData, fire: bool) -> ComposerResult<()> {
    let inputs = layer.inputs();
    let (w, h) = (image.width() as i32, image.height() as i32);

    let param = inputs
        .get_mut::<ImageKind>(table, "Image")
        .ok_or_else(|| ComposerError::validation("image module has no \"Image\" input"))?;
    if fire {
        param.commit(image);
    } else {
        param.set_value(image);
    }

    if let Some(location) = inputs.get_mut::<RegionKind>(table, "Location") {
        let at = location.get_value().unwrap_or_default();
        let sized = Region::new(at.x, at.y, w, h);
        if fire {
            location.commit(sized);
        } else {
            location.set_value(sized);
        }
    }
    Ok(())
}

impl ModuleBehavior for ImageModule {
    fn type_name(&self) -> &'static str {
        "Image"
    }

    fn declare_inputs(&mut self, inputs: &mut Inputs<'_>) -> ComposerResult<()> {
        inputs.add("Image", Parameter::new("Image", ImageKind::default()).with_order(0))?;
        inputs.add(
            "Location",
            Parameter::new("Location", RegionKind)
                .with_default(Region::default())
                .with_order(1),
        )?;
        Ok(())
    }

    fn is_node(&self) -> bool {
        true
    }

    fn prepare(&mut self, layer: &LayerState, table: &mut ParamTable) -> ComposerResult<()> {
        let Some(rx) = &self.pending else {
            return Ok(());
        };
        match rx.try_recv() {
            Ok(Ok(image)) => {
                self.pending = None;
                adopt(layer, table, image, false)
            }
            Ok(Err(e)) => {
                self.pending = None;
                tracing::warn!(error = %e, "image import failed");
                Ok(())
            }
            Err(TryRecvError::Empty) => Ok(()),
            Err(TryRecvError::Disconnected) => {
                self.pending = None;
                Ok(())
            }
        }
    }

    fn retained_visual(&mut self, layer: &LayerState, cx: &DrawCx<'_>) -> RenderResult<RetainedVisual> {
        let inputs = layer.inputs();
        let image = inputs.require::<ImageKind>(cx.table, "Image")?;
        let location = inputs.require::<RegionKind>(cx.table, "Location")?;
        if location.is_degenerate() {
            return Err(RenderAbort::skip("location is empty"));
        }
        let Some(window) = cx.viewport.clip(location) else {
            return Err(RenderAbort::skip("location is outside the viewport"));
        };

        let cache = match self.cache.take() {
            Some(c) if c.location == location && c.window == window && c.source == image => c,
            _ => ScaledCache {
                pixels: Arc::new(scaled_window(&image, location, window)),
                source: image,
                location,
                window,
            },
        };
        let visual = RetainedVisual {
            pixels: Arc::clone(&cache.pixels),
            width: window.width as u32,
            height: window.height as u32,
            x: window.x,
            y: window.y,
        };
        self.cache = Some(cache);
        Ok(visual)
    }
}

/// Premultiplied pixels of `image` stretched over `location`, cut down to `window`.
///
/// Only the source span under the window is resampled, so the cost follows the visible size.
fn scaled_window(image: &ImageData, location: Region, window: Region) -> Vec<u8> {
    let (width, height) = (window.width as u32, window.height as u32);
    if image.width() == 0 || image.height() == 0 {
        return vec![0; width as usize * height as usize * 4];
    }
    if window == location && image.width() == width && image.height() == height {
        return image.to_premul_bytes();
    }
    let (x0, x1) = source_span(window.x, window.width, location.x, location.width, image.width());
    let (y0, y1) = source_span(window.y, window.height, location.y, location.height, image.height());
    let crop = image::imageops::crop_imm(image.as_image(), x0, y0, x1 - x0, y1 - y0).to_image();
    let resized = image::imageops::resize(&crop, width, height, image::imageops::FilterType::Triangle);
    let mut px = resized.into_raw();
    premultiply_in_place(&mut px);
    px
}

/// Source pixel range `[start, end)` that `len` destination pixels from `at` cover when `extent`
/// pixels from `origin` map onto `size` source pixels.
fn source_span(at: i32, len: i32, origin: i32, extent: i32, size: u32) -> (u32, u32) {
    let scale = f64::from(size) / f64::from(extent);
    let offset = f64::from(at) - f64::from(origin);
    let start = ((offset * scale).floor() as u32).min(size.saturating_sub(1));
    let end = (((offset + f64::from(len)) * scale).ceil() as u32).clamp(start + 1, size);
    (start, end)
}

impl std::fmt::Debug for ImageModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageModule")
            .field("delegate", &self.delegate)
            .field("pending", &self.pending.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/modules/bitmap.rs"]
mod tests;
