// SPDX-License-Identifier: CEPL-1.0
//! Windowing boundary. The renderer never talks to winit directly; it only
//! sees raw window/display handles.

pub use winit;

use winit::dpi::PhysicalSize;
use winit::window::WindowAttributes;

/// Logical size of the single application window.
pub const WINDOW_WIDTH: u32 = 640;
/// Logical size of the single application window.
pub const WINDOW_HEIGHT: u32 = 480;

/// Attributes for the one window this program drives: fixed 640x480,
/// non-resizable. Vulkan owns presentation, so no GL context is attached.
pub fn main_window_attributes(title: &str) -> WindowAttributes {
    WindowAttributes::default()
        .with_title(title)
        .with_inner_size(PhysicalSize::new(WINDOW_WIDTH, WINDOW_HEIGHT))
        .with_resizable(false)
}
