use std::sync::Arc;

use tessera_core::geometry::Size;
pub use winit::window::Window as WinitWindow;
use winit::{dpi::PhysicalSize, error::OsError, event_loop::ActiveEventLoop};

/// How to create the native window of a view.
#[derive(Debug, Clone)]
pub struct ViewDescriptor {
    pub title: String,
    pub resizable: bool,
    /// Initial size in physical pixels, `None` for `default_size`.
    pub size: Option<Size<u32>>,
    pub visible: bool,
    /// Size used when none is requested.
    pub default_size: Size<u32>,
}

impl Default for ViewDescriptor {
    fn default() -> Self {
        Self {
            title: "Tessera".to_string(),
            resizable: true,
            size: None,
            visible: true,
            default_size: Size::new(640, 480),
        }
    }
}

impl ViewDescriptor {
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = Some(Size::new(width, height));
        self
    }

    pub fn initial_size(&self) -> Size<u32> {
        self.size.unwrap_or(self.default_size)
    }

    pub(crate) fn create_window(&self, event_loop: &ActiveEventLoop) -> Result<Arc<WinitWindow>, OsError> {
        let size = self.initial_size();
        let attributes = WinitWindow::default_attributes()
            .with_title(self.title.clone())
            .with_resizable(self.resizable)
            .with_visible(self.visible)
            .with_inner_size(PhysicalSize::new(size.width, size.height));

        Ok(Arc::new(event_loop.create_window(attributes)?))
    }
}
