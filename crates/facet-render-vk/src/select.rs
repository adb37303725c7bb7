//! Selection policies for the init chain. Deliberately "first available, no
//! scoring" (first enumerated device, first graphics family, first reported
//! surface format) so behavior is pinned for a given enumeration order.

use std::ffi::CStr;

use ash::vk;

use crate::error::RenderError;

/// Images requested from the swapchain. The driver may return more; callers
/// must size per-image resources from the retrieved array, not this.
pub const FIXED_IMAGE_COUNT: u32 = 2;

/// Low-latency, no tearing, may drop frames.
pub const PRESENT_MODE: vk::PresentModeKHR = vk::PresentModeKHR::MAILBOX;

pub fn pick_physical_device(
    devices: &[vk::PhysicalDevice],
) -> Result<vk::PhysicalDevice, RenderError> {
    devices.first().copied().ok_or(RenderError::NoDevice)
}

/// Lowest-indexed queue family advertising graphics support.
pub fn pick_graphics_family(
    families: &[vk::QueueFamilyProperties],
) -> Result<u32, RenderError> {
    families
        .iter()
        .position(|f| f.queue_flags.contains(vk::QueueFlags::GRAPHICS))
        .map(|i| i as u32)
        .ok_or(RenderError::NoGraphicsQueue)
}

/// Intersect the device's advertised extensions with the ones we require.
/// The result is what gets enabled; a required extension the device lacks is
/// simply absent, and the dependent create call fails with its own error.
pub fn intersect_device_extensions<'r>(
    available: &[vk::ExtensionProperties],
    required: &[&'r CStr],
) -> Vec<&'r CStr> {
    required
        .iter()
        .copied()
        .filter(|req| {
            available
                .iter()
                .any(|ext| ext.extension_name_as_c_str().is_ok_and(|n| n == *req))
        })
        .collect()
}

/// Everything the swapchain create call needs that comes out of a policy
/// decision rather than a query.
#[derive(Debug, Clone, Copy)]
pub struct SwapchainParams {
    pub format: vk::SurfaceFormatKHR,
    pub extent: vk::Extent2D,
    pub image_count: u32,
    pub pre_transform: vk::SurfaceTransformFlagsKHR,
    pub composite_alpha: vk::CompositeAlphaFlagsKHR,
    pub present_mode: vk::PresentModeKHR,
}

pub fn swapchain_params(
    caps: &vk::SurfaceCapabilitiesKHR,
    formats: &[vk::SurfaceFormatKHR],
) -> Result<SwapchainParams, RenderError> {
    // First reported format, no color-space preference ordering.
    let format = formats.first().copied().ok_or(RenderError::Swapchain {
        op: "surface format query",
        source: vk::Result::ERROR_FORMAT_NOT_SUPPORTED,
    })?;

    // Fixed count of two, raised only when the driver minimum demands it.
    // max_image_count == 0 means "no upper limit".
    let mut image_count = FIXED_IMAGE_COUNT.max(caps.min_image_count);
    if caps.max_image_count > 0 {
        image_count = image_count.min(caps.max_image_count);
    }

    Ok(SwapchainParams {
        format,
        extent: caps.current_extent,
        image_count,
        pre_transform: caps.current_transform,
        composite_alpha: choose_composite_alpha(caps.supported_composite_alpha),
        present_mode: PRESENT_MODE,
    })
}

fn choose_composite_alpha(
    supported: vk::CompositeAlphaFlagsKHR,
) -> vk::CompositeAlphaFlagsKHR {
    [
        vk::CompositeAlphaFlagsKHR::OPAQUE,
        vk::CompositeAlphaFlagsKHR::PRE_MULTIPLIED,
        vk::CompositeAlphaFlagsKHR::POST_MULTIPLIED,
    ]
    .into_iter()
    .find(|&mode| supported.contains(mode))
    .unwrap_or(vk::CompositeAlphaFlagsKHR::INHERIT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ash::vk::Handle;
    use std::os::raw::c_char;

    #[test]
    fn empty_device_list_is_an_error() {
        assert!(matches!(
            pick_physical_device(&[]),
            Err(RenderError::NoDevice)
        ));
    }

    #[test]
    fn first_device_wins() {
        let devices = [
            vk::PhysicalDevice::from_raw(11),
            vk::PhysicalDevice::from_raw(22),
        ];
        let picked = pick_physical_device(&devices).unwrap();
        assert_eq!(picked, devices[0]);
    }

    fn family(flags: vk::QueueFlags) -> vk::QueueFamilyProperties {
        vk::QueueFamilyProperties {
            queue_flags: flags,
            queue_count: 1,
            ..Default::default()
        }
    }

    #[test]
    fn lowest_indexed_graphics_family_wins() {
        let families = [
            family(vk::QueueFlags::TRANSFER),
            family(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE),
            family(vk::QueueFlags::GRAPHICS),
        ];
        assert_eq!(pick_graphics_family(&families).unwrap(), 1);
    }

    #[test]
    fn no_graphics_family_is_an_error() {
        let families = [
            family(vk::QueueFlags::TRANSFER),
            family(vk::QueueFlags::COMPUTE),
        ];
        assert!(matches!(
            pick_graphics_family(&families),
            Err(RenderError::NoGraphicsQueue)
        ));
    }

    fn ext(name: &CStr) -> vk::ExtensionProperties {
        let mut props = vk::ExtensionProperties::default();
        for (dst, src) in props
            .extension_name
            .iter_mut()
            .zip(name.to_bytes_with_nul())
        {
            *dst = *src as c_char;
        }
        props
    }

    #[test]
    fn extension_intersection_keeps_only_available_required() {
        let available = [
            ext(ash::khr::swapchain::NAME),
            ext(c"VK_KHR_maintenance1"),
        ];
        let kept =
            intersect_device_extensions(&available, &[ash::khr::swapchain::NAME]);
        assert_eq!(kept, vec![ash::khr::swapchain::NAME]);

        let kept = intersect_device_extensions(
            &[ext(c"VK_KHR_maintenance1")],
            &[ash::khr::swapchain::NAME],
        );
        assert!(kept.is_empty());
    }

    fn caps_640x480(min: u32, max: u32) -> vk::SurfaceCapabilitiesKHR {
        vk::SurfaceCapabilitiesKHR {
            min_image_count: min,
            max_image_count: max,
            current_extent: vk::Extent2D {
                width: 640,
                height: 480,
            },
            current_transform: vk::SurfaceTransformFlagsKHR::IDENTITY,
            supported_composite_alpha: vk::CompositeAlphaFlagsKHR::OPAQUE,
            ..Default::default()
        }
    }

    const BGRA_SRGB: vk::SurfaceFormatKHR = vk::SurfaceFormatKHR {
        format: vk::Format::B8G8R8A8_UNORM,
        color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
    };

    #[test]
    fn params_request_two_images_at_current_extent() {
        let params = swapchain_params(&caps_640x480(1, 8), &[BGRA_SRGB]).unwrap();
        assert_eq!(params.image_count, 2);
        assert_eq!(params.extent.width, 640);
        assert_eq!(params.extent.height, 480);
        assert_eq!(params.format.format, BGRA_SRGB.format);
        assert_eq!(params.format.color_space, BGRA_SRGB.color_space);
        assert_eq!(params.present_mode, vk::PresentModeKHR::MAILBOX);
    }

    #[test]
    fn driver_minimum_above_two_raises_the_count() {
        let params = swapchain_params(&caps_640x480(3, 0), &[BGRA_SRGB]).unwrap();
        assert_eq!(params.image_count, 3);
    }

    #[test]
    fn first_reported_format_wins() {
        let second = vk::SurfaceFormatKHR {
            format: vk::Format::R8G8B8A8_SRGB,
            color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
        };
        let params =
            swapchain_params(&caps_640x480(1, 0), &[BGRA_SRGB, second]).unwrap();
        assert_eq!(params.format.format, BGRA_SRGB.format);
    }

    #[test]
    fn no_formats_is_a_swapchain_error() {
        assert!(matches!(
            swapchain_params(&caps_640x480(1, 0), &[]),
            Err(RenderError::Swapchain { .. })
        ));
    }

    #[test]
    fn composite_alpha_prefers_opaque() {
        assert_eq!(
            choose_composite_alpha(
                vk::CompositeAlphaFlagsKHR::PRE_MULTIPLIED
                    | vk::CompositeAlphaFlagsKHR::OPAQUE
            ),
            vk::CompositeAlphaFlagsKHR::OPAQUE
        );
        assert_eq!(
            choose_composite_alpha(vk::CompositeAlphaFlagsKHR::POST_MULTIPLIED),
            vk::CompositeAlphaFlagsKHR::POST_MULTIPLIED
        );
        assert_eq!(
            choose_composite_alpha(vk::CompositeAlphaFlagsKHR::empty()),
            vk::CompositeAlphaFlagsKHR::INHERIT
        );
    }
}
