use std::sync::Arc;

use anyhow::Result;

use crate::coords::Size;
use crate::device::{surface, RenderingContext, SurfaceErrorAction};
use crate::input::StreamingTexture;
use crate::render::pass::{self, ConversionTarget, DrawError, StagingTexture};
use crate::render::{PixelEncoding, VertexSolver};
use crate::transform::Transform;

use super::{Drawable, DrawableId, Registry};

/// Requested output of one on-screen sink.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SinkSpec {
    pub encoding: PixelEncoding,
    /// Per-component override of the drawable's size; non-positive
    /// components follow the drawable.
    pub size: Option<Size>,
    pub transform: Option<Transform>,
}

impl Default for SinkSpec {
    fn default() -> Self {
        Self {
            encoding: PixelEncoding::Rgba8888,
            size: None,
            transform: None,
        }
    }
}

struct SinkEntry {
    drawable: Arc<dyn Drawable>,
    surface: wgpu::Surface<'static>,
    config: Option<wgpu::SurfaceConfiguration>,
    spec: SinkSpec,
    solver: VertexSolver,
    staging: Option<StagingTexture>,
}

/// Outcome of drawing one sink.
enum SinkOutcome {
    Presented,
    Skipped,
    Drop,
}

/// On-screen sinks in registration order.
#[derive(Default)]
pub struct SinkTable {
    entries: Registry<DrawableId, SinkEntry>,
}

impl SinkTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> Vec<DrawableId> {
        self.entries.keys().collect()
    }

    /// Adds `drawable` or updates its spec in place.
    ///
    /// An existing entry keeps its surface and its position.
    pub(crate) fn put(
        &mut self,
        ctx: &RenderingContext,
        drawable: Arc<dyn Drawable>,
        spec: SinkSpec,
    ) -> Result<()> {
        let id = DrawableId::of(&drawable);
        let added = upsert(
            &mut self.entries,
            id,
            |entry| entry.spec = spec,
            || {
                let surface = ctx.create_surface(Arc::clone(&drawable))?;
                Ok(SinkEntry {
                    drawable,
                    surface,
                    config: None,
                    spec,
                    solver: VertexSolver::new(),
                    staging: None,
                })
            },
        )?;
        if added {
            log::info!("sink {id:?} added ({} total)", self.entries.len());
        }
        Ok(())
    }

    /// Unknown drawables are ignored.
    pub fn remove(&mut self, id: DrawableId) -> bool {
        let removed = self.entries.remove(&id).is_some();
        if removed {
            log::info!("sink {id:?} removed ({} left)", self.entries.len());
        }
        removed
    }

    pub fn clear(&mut self) {
        let n = self.entries.drain().count();
        if n > 0 {
            log::debug!("dropped {n} sinks");
        }
    }

    /// Draws every sink in registration order.
    pub(crate) fn draw_all(&mut self, ctx: &mut RenderingContext, input: &StreamingTexture) {
        sweep(&mut self.entries, |entry| draw_sink(ctx, input, entry));
    }
}

/// Updates the entry for `id` in place, or appends one built by `create`.
///
/// Returns whether a new entry was added. `create` is not called for a key
/// already present, and a failed `create` leaves the registry untouched.
fn upsert<K, E>(
    entries: &mut Registry<K, E>,
    id: K,
    update: impl FnOnce(&mut E),
    create: impl FnOnce() -> Result<E>,
) -> Result<bool>
where
    K: Eq + Copy + std::fmt::Debug,
{
    if let Some(entry) = entries.get_mut(&id) {
        update(entry);
        return Ok(false);
    }
    if entries.insert(id, create()?).is_err() {
        log::warn!("sink {id:?} registered twice");
    }
    Ok(true)
}

/// Visits every entry in order and drops those whose draw asks for it.
///
/// Draw errors are logged and keep the entry for the next frame.
fn sweep<K, E>(
    entries: &mut Registry<K, E>,
    mut draw: impl FnMut(&mut E) -> Result<SinkOutcome, DrawError>,
) where
    K: Eq + Copy + std::fmt::Debug,
{
    entries.retain(|id, entry| match draw(entry) {
        Ok(SinkOutcome::Presented) | Ok(SinkOutcome::Skipped) => true,
        Ok(SinkOutcome::Drop) => {
            log::warn!("sink {id:?} dropped");
            false
        }
        Err(e) => {
            log::warn!("sink {id:?} skipped: {e}");
            true
        }
    });
}

fn draw_sink(
    ctx: &mut RenderingContext,
    input: &StreamingTexture,
    entry: &mut SinkEntry,
) -> Result<SinkOutcome, DrawError> {
    if !entry.drawable.is_valid() {
        log::warn!("sink drawable is no longer valid");
        return Ok(SinkOutcome::Drop);
    }

    let output = Size::resolve(entry.spec.size, entry.drawable.surface_size());
    if !output.is_positive() {
        log::debug!("sink output {output} is empty; skipped");
        return Ok(SinkOutcome::Skipped);
    }
    let encoding = entry.spec.encoding;
    let viewport = encoding.viewport_size(output);
    if !viewport.is_positive() {
        return Err(DrawError::EmptyOutput(viewport));
    }

    if entry.config.is_none() {
        let config = match ctx.surface_config(&entry.surface, viewport) {
            Ok(c) => c,
            Err(e) => {
                log::error!("sink surface unusable: {e:#}");
                return Ok(SinkOutcome::Drop);
            }
        };
        entry.surface.configure(ctx.device(), &config);
        entry.config = Some(config);
    }
    let Some(config) = entry.config.as_mut() else {
        return Ok(SinkOutcome::Skipped);
    };
    surface::apply_resize(&entry.surface, ctx.device(), config, viewport);
    let format = config.format;

    ctx.ensure_programs(format)?;
    let Some(binding) = input.binding() else {
        return Err(DrawError::NoInput);
    };
    StagingTexture::ensure(&mut entry.staging, ctx, encoding, output);

    let frame = match entry.surface.get_current_texture() {
        Ok(frame) => frame,
        Err(err) => {
            return match surface::map_surface_error(&entry.surface, ctx.device(), config, &err) {
                SurfaceErrorAction::Fatal => Ok(SinkOutcome::Drop),
                SurfaceErrorAction::Reconfigured | SurfaceErrorAction::SkipFrame => {
                    Err(DrawError::Surface(err))
                }
            };
        }
    };
    let view = frame
        .texture
        .create_view(&wgpu::TextureViewDescriptor::default());

    let mut encoder = ctx
        .device()
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("framebridge sink encoder"),
        });

    pass::encode_conversion(
        ctx,
        &mut encoder,
        &binding,
        encoding,
        entry.spec.transform.as_ref(),
        &mut entry.solver,
        &ConversionTarget {
            view: &view,
            format,
            output,
            staging: entry.staging.as_ref(),
        },
    )?;

    ctx.queue().submit(std::iter::once(encoder.finish()));
    drop(view);
    frame.present();
    Ok(SinkOutcome::Presented)
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;

    use super::*;

    struct FakeSink {
        spec: SinkSpec,
        serial: u32,
    }

    fn spec(encoding: PixelEncoding) -> SinkSpec {
        SinkSpec { encoding, ..SinkSpec::default() }
    }

    fn put(entries: &mut Registry<char, FakeSink>, id: char, s: SinkSpec, serial: u32) -> bool {
        upsert(entries, id, |e| e.spec = s, || Ok(FakeSink { spec: s, serial })).unwrap()
    }

    fn order(entries: &Registry<char, FakeSink>) -> String {
        entries.keys().collect()
    }

    #[test]
    fn put_twice_updates_in_place() {
        let mut entries = Registry::new();
        assert!(put(&mut entries, 'A', spec(PixelEncoding::Rgba8888), 1));
        assert!(put(&mut entries, 'B', spec(PixelEncoding::Rgba8888), 2));
        assert!(!put(&mut entries, 'A', spec(PixelEncoding::Nv12), 3));

        assert_eq!(order(&entries), "AB");
        let a = entries.values().next().unwrap();
        assert_eq!(a.serial, 1);
        assert_eq!(a.spec.encoding, PixelEncoding::Nv12);
    }

    #[test]
    fn failed_create_adds_nothing() {
        let mut entries: Registry<char, FakeSink> = Registry::new();
        let err = upsert(&mut entries, 'A', |_| {}, || Err(anyhow!("no surface")));
        assert!(err.is_err());
        assert!(entries.is_empty());
    }

    #[test]
    fn sweep_drops_only_sinks_asking_for_it() {
        let mut entries = Registry::new();
        for (serial, id) in ['A', 'B', 'C', 'D'].into_iter().enumerate() {
            put(&mut entries, id, SinkSpec::default(), serial as u32);
        }

        let mut visited = Vec::new();
        sweep(&mut entries, |e| {
            visited.push(e.serial);
            match e.serial {
                0 => Ok(SinkOutcome::Presented),
                1 => Ok(SinkOutcome::Drop),
                2 => Err(DrawError::NoInput),
                _ => Ok(SinkOutcome::Skipped),
            }
        });

        assert_eq!(visited, vec![0, 1, 2, 3]);
        assert_eq!(order(&entries), "ACD");
    }

    #[test]
    fn readded_sink_draws_last() {
        let mut entries = Registry::new();
        for (serial, id) in ['A', 'B', 'C'].into_iter().enumerate() {
            put(&mut entries, id, SinkSpec::default(), serial as u32);
        }
        sweep(&mut entries, |e| {
            if e.serial == 0 { Ok(SinkOutcome::Drop) } else { Ok(SinkOutcome::Presented) }
        });
        put(&mut entries, 'A', SinkSpec::default(), 9);

        let mut visited = Vec::new();
        sweep(&mut entries, |e| {
            visited.push(e.serial);
            Ok(SinkOutcome::Presented)
        });
        assert_eq!(visited, vec![1, 2, 9]);
    }
}
