//! GPU to CPU copy of a conversion target.
//!
//! Texture-to-buffer copies pad every row to `COPY_BYTES_PER_ROW_ALIGNMENT`;
//! `depad_rows` strips that padding so listeners get tightly packed bytes.

use crossbeam_channel::{Receiver, TryRecvError};

use crate::coords::Size;

const BYTES_PER_TEXEL: u32 = 4;

/// Row pitch of the readback buffer for a target `width_texels` wide.
pub fn padded_bytes_per_row(width_texels: u32) -> u32 {
    let unpadded = width_texels * BYTES_PER_TEXEL;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

/// Copies `rows` rows of `row_bytes` each out of `src` (pitch `padded_row`)
/// into `out`, skipping the padding at the end of each row.
///
/// `out` is resized to exactly `rows * row_bytes`; its capacity never shrinks.
pub fn depad_rows(src: &[u8], padded_row: usize, row_bytes: usize, rows: usize, out: &mut Vec<u8>) {
    out.clear();
    out.reserve(row_bytes * rows);
    if padded_row == row_bytes {
        out.extend_from_slice(&src[..row_bytes * rows]);
        return;
    }
    for row in src.chunks(padded_row).take(rows) {
        out.extend_from_slice(&row[..row_bytes]);
    }
}

type MapResult = Result<(), wgpu::BufferAsyncError>;

/// Outcome of polling an in-flight map.
pub(crate) enum MapPoll {
    Ready,
    Pending,
    Failed,
}

/// Readback buffer sized for one viewport, plus its in-flight map.
pub(crate) struct Readback {
    buffer: wgpu::Buffer,
    viewport: Size,
    padded_row: u32,
    pending: Option<Receiver<MapResult>>,
}

impl Readback {
    pub(crate) fn new(device: &wgpu::Device, viewport: Size) -> Self {
        let padded_row = padded_bytes_per_row(viewport.width);
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("framebridge readback"),
            size: padded_row as u64 * viewport.height as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        Self { buffer, viewport, padded_row, pending: None }
    }

    pub(crate) fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Records the copy from `texture` into the buffer.
    pub(crate) fn encode_copy(&self, encoder: &mut wgpu::CommandEncoder, texture: &wgpu::Texture) {
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &self.buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(self.padded_row),
                    rows_per_image: Some(self.viewport.height),
                },
            },
            self.viewport.to_extent(),
        );
    }

    /// Requests a map. Call after the copy has been submitted.
    pub(crate) fn request_map(&mut self) {
        let (tx, rx) = crossbeam_channel::bounded(1);
        self.buffer
            .slice(..)
            .map_async(wgpu::MapMode::Read, move |result| {
                let _ = tx.send(result);
            });
        self.pending = Some(rx);
    }

    pub(crate) fn poll(&mut self) -> MapPoll {
        let Some(rx) = self.pending.as_ref() else {
            return MapPoll::Pending;
        };
        match rx.try_recv() {
            Ok(Ok(())) => {
                self.pending = None;
                MapPoll::Ready
            }
            Ok(Err(e)) => {
                log::warn!("readback map failed: {e}");
                self.pending = None;
                MapPoll::Failed
            }
            Err(TryRecvError::Empty) => MapPoll::Pending,
            Err(TryRecvError::Disconnected) => {
                self.pending = None;
                MapPoll::Failed
            }
        }
    }

    /// De-pads the mapped buffer into `out` and unmaps it.
    ///
    /// Only valid right after `poll` returned `Ready`.
    pub(crate) fn take_into(&self, out: &mut Vec<u8>) {
        {
            let mapped = self.buffer.slice(..).get_mapped_range();
            depad_rows(
                &mapped,
                self.padded_row as usize,
                (self.viewport.width * BYTES_PER_TEXEL) as usize,
                self.viewport.height as usize,
                out,
            );
        }
        self.buffer.unmap();
    }
}
