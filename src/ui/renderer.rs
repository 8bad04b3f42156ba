use softbuffer::{Context, Surface};
use std::num::NonZeroU32;
use std::rc::Rc;
use winit::window::Window;

use super::drawing::Bitmap;
use crate::error::{PreviewError, Result};

/// Presents [`Bitmap`] frames into a winit window through softbuffer
pub struct Renderer {
    _context: Context<Rc<Window>>,
    surface: Surface<Rc<Window>, Rc<Window>>,
    width: u32,
    height: u32,
}

fn non_zero(value: u32) -> Result<NonZeroU32> {
    NonZeroU32::new(value).ok_or_else(|| PreviewError::Surface("zero-sized surface".to_string()))
}

impl Renderer {
    pub fn new(window: Rc<Window>) -> Result<Self> {
        let size = window.inner_size();
        let context =
            Context::new(window.clone()).map_err(|e| PreviewError::Surface(e.to_string()))?;
        let surface =
            Surface::new(&context, window).map_err(|e| PreviewError::Surface(e.to_string()))?;
        let mut renderer = Self {
            _context: context,
            surface,
            width: 0,
            height: 0,
        };
        renderer.resize(size.width, size.height)?;
        Ok(renderer)
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        if width == 0 || height == 0 || (width, height) == (self.width, self.height) {
            return Ok(());
        }
        self.surface
            .resize(non_zero(width)?, non_zero(height)?)
            .map_err(|e| PreviewError::Surface(e.to_string()))?;
        self.width = width;
        self.height = height;
        Ok(())
    }

    /// Copy an opaque frame to the window; the frame must match the surface size
    pub fn present(&mut self, frame: &Bitmap) -> Result<()> {
        if (frame.width() as u32, frame.height() as u32) != (self.width, self.height) {
            return Err(PreviewError::Surface(format!(
                "frame {}x{} does not match surface {}x{}",
                frame.width(),
                frame.height(),
                self.width,
                self.height
            )));
        }
        let mut buffer = self
            .surface
            .buffer_mut()
            .map_err(|e| PreviewError::Surface(e.to_string()))?;
        // softbuffer wants 0RGB, drop the alpha byte
        for (dst, &src) in buffer.iter_mut().zip(frame.pixels()) {
            *dst = src & 0x00FF_FFFF;
        }
        buffer
            .present()
            .map_err(|e| PreviewError::Surface(e.to_string()))
    }
}
