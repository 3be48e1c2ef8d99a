//! Packed raw video frames.
//!
//! A rawvideo file is nothing but frames laid end to end: every plane of
//! every frame stored row after row with no padding, at a width, height,
//! and pixel format that never change. Decoders hand out frames whose rows
//! are padded to SIMD-friendly strides, so each frame is repacked into a
//! [`RawFrameBuffer`] (alignment 1) before it is written.

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    os::raw::c_int,
    path::Path,
};

use ffmpeg_next::{Error as FfmpegError, format::Pixel, frame::Video as VideoFrame};

use crate::error::RawDumpError;

/// Width, height, and pixel format shared by every frame of a raw video.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawVideoGeometry {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Pixel format of the stored frames.
    pub pixel_format: Pixel,
}

impl RawVideoGeometry {
    /// Geometry of a decoded frame.
    pub fn of_frame(frame: &VideoFrame) -> Self {
        Self {
            width: frame.width(),
            height: frame.height(),
            pixel_format: frame.format(),
        }
    }

    /// FFmpeg's short name for the pixel format (`yuv420p`, `uyvy422`, ...).
    pub fn pixel_format_name(&self) -> &'static str {
        self.pixel_format
            .descriptor()
            .map(|descriptor| descriptor.name())
            .unwrap_or("none")
    }

    /// Size in bytes of one packed frame.
    ///
    /// # Errors
    ///
    /// Returns [`RawDumpError::BufferAllocation`] when FFmpeg cannot size
    /// the image (unknown pixel format, zero or oversized dimensions).
    pub fn frame_size(&self) -> Result<usize, RawDumpError> {
        let (width, height) = self.dimensions_as_c_int()?;
        let size = unsafe {
            ffmpeg_sys_next::av_image_get_buffer_size(self.pixel_format.into(), width, height, 1)
        };
        if size <= 0 {
            return Err(RawDumpError::BufferAllocation(format!(
                "{self}: {}",
                FfmpegError::from(size)
            )));
        }
        Ok(size as usize)
    }

    /// Command line that plays the raw output back with `ffplay`.
    pub fn playback_command(&self, output: &Path) -> String {
        format!(
            "ffplay -f rawvideo -pix_fmt {} -video_size {}x{} {}",
            self.pixel_format_name(),
            self.width,
            self.height,
            output.display(),
        )
    }

    fn dimensions_as_c_int(&self) -> Result<(c_int, c_int), RawDumpError> {
        let width = c_int::try_from(self.width)
            .map_err(|_| RawDumpError::BufferAllocation(format!("width {} too large", self.width)))?;
        let height = c_int::try_from(self.height).map_err(|_| {
            RawDumpError::BufferAllocation(format!("height {} too large", self.height))
        })?;
        Ok((width, height))
    }
}

impl Display for RawVideoGeometry {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "{}x{} {}",
            self.width,
            self.height,
            self.pixel_format_name()
        )
    }
}

/// Destination buffer holding exactly one packed frame.
#[derive(Debug, Clone)]
pub struct RawFrameBuffer {
    geometry: RawVideoGeometry,
    data: Vec<u8>,
}

impl RawFrameBuffer {
    /// Allocate a zeroed buffer for one frame of `geometry`.
    ///
    /// # Errors
    ///
    /// Returns [`RawDumpError::BufferAllocation`] if the frame size cannot
    /// be computed.
    pub fn allocate(geometry: RawVideoGeometry) -> Result<Self, RawDumpError> {
        let size = geometry.frame_size()?;
        log::debug!("Allocated raw video buffer: {geometry}, {size} bytes per frame");
        Ok(Self {
            geometry,
            data: vec![0; size],
        })
    }

    /// Geometry this buffer was sized for.
    pub fn geometry(&self) -> RawVideoGeometry {
        self.geometry
    }

    /// Repack `frame` into this buffer, dropping row padding.
    ///
    /// # Errors
    ///
    /// - [`RawDumpError::GeometryChanged`] if the frame's width, height, or
    ///   pixel format differ from the buffer's.
    /// - [`RawDumpError::FfmpegError`] if FFmpeg rejects the copy.
    pub fn copy_from(&mut self, frame: &VideoFrame) -> Result<(), RawDumpError> {
        let actual = RawVideoGeometry::of_frame(frame);
        if actual != self.geometry {
            return Err(RawDumpError::GeometryChanged {
                expected: self.geometry,
                actual,
            });
        }

        let (width, height) = self.geometry.dimensions_as_c_int()?;
        let capacity = c_int::try_from(self.data.len())
            .map_err(|_| RawDumpError::BufferAllocation("frame too large".to_string()))?;

        let copied = unsafe {
            let source = frame.as_ptr();
            ffmpeg_sys_next::av_image_copy_to_buffer(
                self.data.as_mut_ptr(),
                capacity,
                (*source).data.as_ptr() as *const *const u8,
                (*source).linesize.as_ptr(),
                self.geometry.pixel_format.into(),
                width,
                height,
                1,
            )
        };
        if copied < 0 {
            return Err(FfmpegError::from(copied).into());
        }
        Ok(())
    }

    /// The packed frame.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Length of one packed frame in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always `false`: allocation rejects empty geometries.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
