//! Vulkan renderer: stands up the instance → device → swapchain → pipeline
//! chain for a single window and drives a one-frame-in-flight render loop
//! that clears the screen and draws one triangle per frame.

mod debug;
mod error;
mod frame;
mod select;
mod shader;

pub use error::{RenderError, ShaderLoadError};
pub use frame::FrameOutcome;

use std::ffi::CStr;
use std::path::PathBuf;

use ash::khr::{surface, swapchain};
use ash::{vk, Entry, Instance};
use raw_window_handle::{RawDisplayHandle, RawWindowHandle};
use tracing::info;

use frame::FrameCmd;
use select::SwapchainParams;

pub const VALIDATION_LAYER: &CStr = c"VK_LAYER_KHRONOS_validation";

/// Startup knobs. Defaults reproduce the stock behavior: validation on,
/// the classic dark-blue clear color, shader blobs in `shaders/`.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub clear_color: [f32; 4],
    pub validation: bool,
    pub vertex_shader: PathBuf,
    pub fragment_shader: PathBuf,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            clear_color: [0.15, 0.15, 0.2, 1.0],
            validation: true,
            vertex_shader: PathBuf::from("shaders/v.spv"),
            fragment_shader: PathBuf::from("shaders/f.spv"),
        }
    }
}

/// The whole resource graph, owned as one object and destroyed in strict
/// reverse-creation order in `Drop`.
pub struct VkRenderer {
    _entry: Entry,
    instance: Instance,
    debug_messenger: Option<vk::DebugUtilsMessengerEXT>,
    surface_loader: surface::Instance,
    surface: vk::SurfaceKHR,

    device: ash::Device,
    queue: vk::Queue,

    swapchain_loader: swapchain::Device,
    swapchain: vk::SwapchainKHR,
    format: vk::Format,
    extent: vk::Extent2D,
    images: Vec<vk::Image>,
    image_views: Vec<vk::ImageView>,

    render_pass: vk::RenderPass,
    framebuffers: Vec<vk::Framebuffer>,
    pipeline_layout: vk::PipelineLayout,
    pipeline: vk::Pipeline,

    cmd_pool: vk::CommandPool,
    cmd_buf: vk::CommandBuffer,

    image_available: vk::Semaphore,
    render_finished: vk::Semaphore,
    in_flight: vk::Fence,

    clear: [f32; 4],
}

unsafe fn create_instance(
    entry: &Entry,
    display_raw: RawDisplayHandle,
    validation: bool,
) -> Result<Instance, RenderError> {
    let app_name = c"facet";

    let app_info = vk::ApplicationInfo {
        s_type: vk::StructureType::APPLICATION_INFO,
        p_application_name: app_name.as_ptr(),
        application_version: 0,
        p_engine_name: app_name.as_ptr(),
        engine_version: 0,
        api_version: vk::API_VERSION_1_0,
        ..Default::default()
    };

    // Platform WSI extensions come from the windowing query; the debug
    // extension is appended on top when validation is on.
    let ext_slice = ash_window::enumerate_required_extensions(display_raw)
        .map_err(RenderError::init("enumerate required extensions"))?;
    let mut ext_vec = ext_slice.to_vec();
    if validation {
        ext_vec.push(ash::ext::debug_utils::NAME.as_ptr());
    }

    let layers = [VALIDATION_LAYER.as_ptr()];
    let (enabled_layer_count, pp_enabled_layer_names) = if validation {
        (layers.len() as u32, layers.as_ptr())
    } else {
        (0, std::ptr::null())
    };

    let create_info = vk::InstanceCreateInfo {
        s_type: vk::StructureType::INSTANCE_CREATE_INFO,
        p_application_info: &app_info,
        enabled_extension_count: ext_vec.len() as u32,
        pp_enabled_extension_names: ext_vec.as_ptr(),
        enabled_layer_count,
        pp_enabled_layer_names,
        ..Default::default()
    };

    // Rejects the whole set if the validation layer is not installed.
    entry
        .create_instance(&create_info, None)
        .map_err(RenderError::init("create instance"))
}

unsafe fn select_device_and_queue_family(
    instance: &Instance,
) -> Result<(vk::PhysicalDevice, u32), RenderError> {
    let devices = instance
        .enumerate_physical_devices()
        .map_err(RenderError::init("enumerate physical devices"))?;

    for &dev in &devices {
        let props = instance.get_physical_device_properties(dev);
        info!(
            "physical device: [{:?}] {}",
            props.device_type,
            props
                .device_name_as_c_str()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        );
    }

    let phys = select::pick_physical_device(&devices)?;
    let families = instance.get_physical_device_queue_family_properties(phys);
    let family = select::pick_graphics_family(&families)?;
    Ok((phys, family))
}

unsafe fn create_device_and_queue(
    instance: &Instance,
    phys: vk::PhysicalDevice,
    queue_family: u32,
) -> Result<(ash::Device, vk::Queue), RenderError> {
    let priorities = [1.0_f32];
    let qinfo = vk::DeviceQueueCreateInfo {
        s_type: vk::StructureType::DEVICE_QUEUE_CREATE_INFO,
        queue_family_index: queue_family,
        queue_count: 1,
        p_queue_priorities: priorities.as_ptr(),
        ..Default::default()
    };

    let available = instance
        .enumerate_device_extension_properties(phys)
        .map_err(RenderError::init("enumerate device extensions"))?;
    let enabled =
        select::intersect_device_extensions(&available, &[swapchain::NAME]);
    let ext_ptrs: Vec<*const std::ffi::c_char> =
        enabled.iter().map(|e| e.as_ptr()).collect();

    let dinfo = vk::DeviceCreateInfo {
        s_type: vk::StructureType::DEVICE_CREATE_INFO,
        queue_create_info_count: 1,
        p_queue_create_infos: &qinfo,
        enabled_extension_count: ext_ptrs.len() as u32,
        pp_enabled_extension_names: ext_ptrs.as_ptr(),
        ..Default::default()
    };

    let device = instance
        .create_device(phys, &dinfo, None)
        .map_err(RenderError::init("create device"))?;
    let queue = device.get_device_queue(queue_family, 0);
    Ok((device, queue))
}

struct SwapchainBundle {
    swapchain: vk::SwapchainKHR,
    format: vk::Format,
    extent: vk::Extent2D,
    images: Vec<vk::Image>,
    image_views: Vec<vk::ImageView>,
}

unsafe fn create_swapchain_bundle(
    device: &ash::Device,
    surf_i: &surface::Instance,
    swap_d: &swapchain::Device,
    phys: vk::PhysicalDevice,
    surface: vk::SurfaceKHR,
    queue_family: u32,
) -> Result<SwapchainBundle, RenderError> {
    let caps = surf_i
        .get_physical_device_surface_capabilities(phys, surface)
        .map_err(RenderError::swapchain("query surface capabilities"))?;
    let formats = surf_i
        .get_physical_device_surface_formats(phys, surface)
        .map_err(RenderError::swapchain("query surface formats"))?;

    let SwapchainParams {
        format,
        extent,
        image_count,
        pre_transform,
        composite_alpha,
        present_mode,
    } = select::swapchain_params(&caps, &formats)?;

    let queue_family_indices = [queue_family];
    let swap_info = vk::SwapchainCreateInfoKHR {
        s_type: vk::StructureType::SWAPCHAIN_CREATE_INFO_KHR,
        surface,
        min_image_count: image_count,
        image_format: format.format,
        image_color_space: format.color_space,
        image_extent: extent,
        image_array_layers: 1,
        image_usage: vk::ImageUsageFlags::COLOR_ATTACHMENT,
        image_sharing_mode: vk::SharingMode::EXCLUSIVE,
        queue_family_index_count: queue_family_indices.len() as u32,
        p_queue_family_indices: queue_family_indices.as_ptr(),
        pre_transform,
        composite_alpha,
        present_mode,
        clipped: vk::TRUE,
        ..Default::default()
    };

    let swapchain = swap_d
        .create_swapchain(&swap_info, None)
        .map_err(RenderError::swapchain("create swapchain"))?;
    // The driver may hand back more images than requested; everything
    // per-image is sized from this array.
    let images = swap_d
        .get_swapchain_images(swapchain)
        .map_err(RenderError::swapchain("get swapchain images"))?;

    let mut views = Vec::with_capacity(images.len());
    for &img in &images {
        let sub = vk::ImageSubresourceRange {
            aspect_mask: vk::ImageAspectFlags::COLOR,
            base_mip_level: 0,
            level_count: 1,
            base_array_layer: 0,
            layer_count: 1,
        };
        let iv_info = vk::ImageViewCreateInfo {
            s_type: vk::StructureType::IMAGE_VIEW_CREATE_INFO,
            image: img,
            view_type: vk::ImageViewType::TYPE_2D,
            format: format.format,
            components: vk::ComponentMapping::default(),
            subresource_range: sub,
            ..Default::default()
        };
        views.push(
            device
                .create_image_view(&iv_info, None)
                .map_err(RenderError::swapchain("create image view"))?,
        );
    }

    info!(
        "swapchain ready ({}x{}, fmt 0x{:x}, {} images)",
        extent.width,
        extent.height,
        format.format.as_raw(),
        images.len()
    );

    Ok(SwapchainBundle {
        swapchain,
        format: format.format,
        extent,
        images,
        image_views: views,
    })
}

unsafe fn create_render_pass(
    device: &ash::Device,
    format: vk::Format,
) -> Result<vk::RenderPass, RenderError> {
    let color_att = vk::AttachmentDescription {
        format,
        samples: vk::SampleCountFlags::TYPE_1,
        load_op: vk::AttachmentLoadOp::CLEAR,
        store_op: vk::AttachmentStoreOp::STORE,
        stencil_load_op: vk::AttachmentLoadOp::DONT_CARE,
        stencil_store_op: vk::AttachmentStoreOp::DONT_CARE,
        initial_layout: vk::ImageLayout::UNDEFINED,
        final_layout: vk::ImageLayout::PRESENT_SRC_KHR,
        ..Default::default()
    };
    let att_ref = vk::AttachmentReference {
        attachment: 0,
        layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
    };
    let subpass = vk::SubpassDescription {
        pipeline_bind_point: vk::PipelineBindPoint::GRAPHICS,
        color_attachment_count: 1,
        p_color_attachments: &att_ref,
        ..Default::default()
    };
    // Self-dependency: orders color writes of successive frames against the
    // same attachment.
    let dependency = vk::SubpassDependency {
        src_subpass: 0,
        dst_subpass: 0,
        src_stage_mask: vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
        dst_stage_mask: vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
        src_access_mask: vk::AccessFlags::COLOR_ATTACHMENT_WRITE,
        dst_access_mask: vk::AccessFlags::empty(),
        dependency_flags: vk::DependencyFlags::BY_REGION,
    };

    let rp_info = vk::RenderPassCreateInfo {
        s_type: vk::StructureType::RENDER_PASS_CREATE_INFO,
        attachment_count: 1,
        p_attachments: &color_att,
        subpass_count: 1,
        p_subpasses: &subpass,
        dependency_count: 1,
        p_dependencies: &dependency,
        ..Default::default()
    };
    device
        .create_render_pass(&rp_info, None)
        .map_err(RenderError::swapchain("create render pass"))
}

unsafe fn create_framebuffers(
    device: &ash::Device,
    render_pass: vk::RenderPass,
    image_views: &[vk::ImageView],
    extent: vk::Extent2D,
) -> Result<Vec<vk::Framebuffer>, RenderError> {
    let mut framebuffers = Vec::with_capacity(image_views.len());
    for &view in image_views {
        let fb_info = vk::FramebufferCreateInfo {
            s_type: vk::StructureType::FRAMEBUFFER_CREATE_INFO,
            render_pass,
            attachment_count: 1,
            p_attachments: &view,
            width: extent.width,
            height: extent.height,
            layers: 1,
            ..Default::default()
        };
        framebuffers.push(
            device
                .create_framebuffer(&fb_info, None)
                .map_err(RenderError::swapchain("create framebuffer"))?,
        );
    }
    Ok(framebuffers)
}

unsafe fn create_shader_module(
    device: &ash::Device,
    path: &std::path::Path,
) -> Result<vk::ShaderModule, RenderError> {
    let code = shader::load_spirv(path)?;
    let ci = vk::ShaderModuleCreateInfo {
        s_type: vk::StructureType::SHADER_MODULE_CREATE_INFO,
        p_code: code.as_ptr(),
        code_size: code.len() * 4,
        ..Default::default()
    };
    device.create_shader_module(&ci, None).map_err(|source| {
        ShaderLoadError::Module {
            path: path.to_owned(),
            source,
        }
        .into()
    })
}

unsafe fn create_pipeline(
    device: &ash::Device,
    render_pass: vk::RenderPass,
    cfg: &RenderConfig,
) -> Result<(vk::PipelineLayout, vk::Pipeline), RenderError> {
    let vs = create_shader_module(device, &cfg.vertex_shader)?;
    let fs = match create_shader_module(device, &cfg.fragment_shader) {
        Ok(fs) => fs,
        Err(e) => {
            device.destroy_shader_module(vs, None);
            return Err(e);
        }
    };

    let entry = c"main";
    let stages = [
        vk::PipelineShaderStageCreateInfo {
            s_type: vk::StructureType::PIPELINE_SHADER_STAGE_CREATE_INFO,
            stage: vk::ShaderStageFlags::VERTEX,
            module: vs,
            p_name: entry.as_ptr(),
            ..Default::default()
        },
        vk::PipelineShaderStageCreateInfo {
            s_type: vk::StructureType::PIPELINE_SHADER_STAGE_CREATE_INFO,
            stage: vk::ShaderStageFlags::FRAGMENT,
            module: fs,
            p_name: entry.as_ptr(),
            ..Default::default()
        },
    ];

    // No vertex buffers: the vertex shader synthesizes the triangle from
    // gl_VertexIndex.
    let vertex_input = vk::PipelineVertexInputStateCreateInfo {
        s_type: vk::StructureType::PIPELINE_VERTEX_INPUT_STATE_CREATE_INFO,
        ..Default::default()
    };
    let input_assembly = vk::PipelineInputAssemblyStateCreateInfo {
        s_type: vk::StructureType::PIPELINE_INPUT_ASSEMBLY_STATE_CREATE_INFO,
        topology: vk::PrimitiveTopology::TRIANGLE_LIST,
        primitive_restart_enable: vk::FALSE,
        ..Default::default()
    };
    // Viewport/scissor are dynamic and set per recorded frame.
    let dyn_states = [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];
    let dynamic_state = vk::PipelineDynamicStateCreateInfo {
        s_type: vk::StructureType::PIPELINE_DYNAMIC_STATE_CREATE_INFO,
        dynamic_state_count: dyn_states.len() as u32,
        p_dynamic_states: dyn_states.as_ptr(),
        ..Default::default()
    };
    let viewport_state = vk::PipelineViewportStateCreateInfo {
        s_type: vk::StructureType::PIPELINE_VIEWPORT_STATE_CREATE_INFO,
        viewport_count: 1,
        scissor_count: 1,
        ..Default::default()
    };
    let raster = vk::PipelineRasterizationStateCreateInfo {
        s_type: vk::StructureType::PIPELINE_RASTERIZATION_STATE_CREATE_INFO,
        polygon_mode: vk::PolygonMode::FILL,
        cull_mode: vk::CullModeFlags::NONE,
        front_face: vk::FrontFace::CLOCKWISE,
        line_width: 1.0,
        ..Default::default()
    };
    let multisample = vk::PipelineMultisampleStateCreateInfo {
        s_type: vk::StructureType::PIPELINE_MULTISAMPLE_STATE_CREATE_INFO,
        rasterization_samples: vk::SampleCountFlags::TYPE_1,
        ..Default::default()
    };
    let color_blend_att = vk::PipelineColorBlendAttachmentState {
        blend_enable: vk::FALSE,
        color_write_mask: vk::ColorComponentFlags::R
            | vk::ColorComponentFlags::G
            | vk::ColorComponentFlags::B
            | vk::ColorComponentFlags::A,
        ..Default::default()
    };
    let color_blend = vk::PipelineColorBlendStateCreateInfo {
        s_type: vk::StructureType::PIPELINE_COLOR_BLEND_STATE_CREATE_INFO,
        logic_op_enable: vk::FALSE,
        attachment_count: 1,
        p_attachments: &color_blend_att,
        ..Default::default()
    };

    // Nothing bound: no descriptor sets, no push constants.
    let layout_info = vk::PipelineLayoutCreateInfo {
        s_type: vk::StructureType::PIPELINE_LAYOUT_CREATE_INFO,
        ..Default::default()
    };
    let layout = match device.create_pipeline_layout(&layout_info, None) {
        Ok(layout) => layout,
        Err(source) => {
            device.destroy_shader_module(fs, None);
            device.destroy_shader_module(vs, None);
            return Err(RenderError::PipelineCreation { source });
        }
    };

    let pipeline_info = vk::GraphicsPipelineCreateInfo {
        s_type: vk::StructureType::GRAPHICS_PIPELINE_CREATE_INFO,
        stage_count: stages.len() as u32,
        p_stages: stages.as_ptr(),
        p_vertex_input_state: &vertex_input,
        p_input_assembly_state: &input_assembly,
        p_viewport_state: &viewport_state,
        p_rasterization_state: &raster,
        p_multisample_state: &multisample,
        p_color_blend_state: &color_blend,
        p_dynamic_state: &dynamic_state,
        layout,
        render_pass,
        subpass: 0,
        ..Default::default()
    };

    let result = device.create_graphics_pipelines(
        vk::PipelineCache::null(),
        std::slice::from_ref(&pipeline_info),
        None,
    );
    // Modules are only needed for pipeline compilation.
    device.destroy_shader_module(fs, None);
    device.destroy_shader_module(vs, None);

    match result {
        Ok(pipelines) => Ok((layout, pipelines[0])),
        Err((_, source)) => {
            device.destroy_pipeline_layout(layout, None);
            Err(RenderError::PipelineCreation { source })
        }
    }
}

unsafe fn create_command_resources(
    device: &ash::Device,
    queue_family: u32,
) -> Result<(vk::CommandPool, vk::CommandBuffer), RenderError> {
    let pool_info = vk::CommandPoolCreateInfo {
        s_type: vk::StructureType::COMMAND_POOL_CREATE_INFO,
        queue_family_index: queue_family,
        flags: vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER,
        ..Default::default()
    };
    let pool = device
        .create_command_pool(&pool_info, None)
        .map_err(RenderError::init("create command pool"))?;

    let alloc_info = vk::CommandBufferAllocateInfo {
        s_type: vk::StructureType::COMMAND_BUFFER_ALLOCATE_INFO,
        command_pool: pool,
        level: vk::CommandBufferLevel::PRIMARY,
        command_buffer_count: 1,
        ..Default::default()
    };
    let bufs = device
        .allocate_command_buffers(&alloc_info)
        .map_err(RenderError::init("allocate command buffer"))?;
    Ok((pool, bufs[0]))
}

unsafe fn create_sync_objects(
    device: &ash::Device,
) -> Result<(vk::Semaphore, vk::Semaphore, vk::Fence), RenderError> {
    let sem_ci = vk::SemaphoreCreateInfo::default();
    let image_available = device
        .create_semaphore(&sem_ci, None)
        .map_err(RenderError::init("create semaphore"))?;
    let render_finished = device
        .create_semaphore(&sem_ci, None)
        .map_err(RenderError::init("create semaphore"))?;

    // Pre-signaled so the first WaitFence falls through immediately.
    let fence_ci = vk::FenceCreateInfo {
        s_type: vk::StructureType::FENCE_CREATE_INFO,
        flags: vk::FenceCreateFlags::SIGNALED,
        ..Default::default()
    };
    let in_flight = device
        .create_fence(&fence_ci, None)
        .map_err(RenderError::init("create fence"))?;

    Ok((image_available, render_finished, in_flight))
}

unsafe fn build_renderer(
    display_raw: RawDisplayHandle,
    window_raw: RawWindowHandle,
    cfg: &RenderConfig,
) -> Result<VkRenderer, RenderError> {
    // STRICT ORDER:
    // 1) Instance (platform WSI exts + validation layer + debug ext)
    // 2) Debug messenger, surface FROM THIS INSTANCE
    // 3) Physical device / queue family AGAINST this surface's platform
    // 4) Device + queue, then everything device-scoped
    let entry = Entry::linked();
    let instance = create_instance(&entry, display_raw, cfg.validation)?;

    let debug_messenger = if cfg.validation {
        Some(
            debug::create_debug_messenger(&entry, &instance)
                .map_err(RenderError::init("create debug messenger"))?,
        )
    } else {
        None
    };

    let surface_loader = surface::Instance::new(&entry, &instance);
    let surface = ash_window::create_surface(&entry, &instance, display_raw, window_raw, None)
        .map_err(RenderError::init("create window surface"))?;

    let (phys, queue_family) = select_device_and_queue_family(&instance)?;
    let (device, queue) = create_device_and_queue(&instance, phys, queue_family)?;

    let swapchain_loader = swapchain::Device::new(&instance, &device);
    let sc = create_swapchain_bundle(
        &device,
        &surface_loader,
        &swapchain_loader,
        phys,
        surface,
        queue_family,
    )?;

    let render_pass = create_render_pass(&device, sc.format)?;
    let framebuffers =
        create_framebuffers(&device, render_pass, &sc.image_views, sc.extent)?;
    let (pipeline_layout, pipeline) = create_pipeline(&device, render_pass, cfg)?;
    let (cmd_pool, cmd_buf) = create_command_resources(&device, queue_family)?;
    let (image_available, render_finished, in_flight) = create_sync_objects(&device)?;

    Ok(VkRenderer {
        _entry: entry,
        instance,
        debug_messenger,
        surface_loader,
        surface,
        device,
        queue,
        swapchain_loader,
        swapchain: sc.swapchain,
        format: sc.format,
        extent: sc.extent,
        images: sc.images,
        image_views: sc.image_views,
        render_pass,
        framebuffers,
        pipeline_layout,
        pipeline,
        cmd_pool,
        cmd_buf,
        image_available,
        render_finished,
        in_flight,
        clear: cfg.clear_color,
    })
}

impl VkRenderer {
    /// Build the full resource chain for the given native window. Any
    /// failure here is fatal to the process; startup does not attempt
    /// partial teardown, the error propagates straight to `main`.
    pub fn new(
        display: RawDisplayHandle,
        window: RawWindowHandle,
        cfg: &RenderConfig,
    ) -> Result<Self, RenderError> {
        unsafe { build_renderer(display, window, cfg) }
    }

    pub fn extent(&self) -> (u32, u32) {
        (self.extent.width, self.extent.height)
    }

    pub fn format(&self) -> vk::Format {
        self.format
    }

    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    /// Run one frame: WaitFence → AcquireImage → RecordCommands → Submit →
    /// Present. Exactly one frame is ever in flight; both waits are
    /// unbounded, so a hung driver hangs us with it.
    pub fn draw_frame(&mut self) -> Result<FrameOutcome, RenderError> {
        unsafe {
            let d = &self.device;

            // Previous submission must fully retire before its command
            // buffer is re-recorded.
            d.wait_for_fences(&[self.in_flight], true, u64::MAX)
                .map_err(RenderError::frame("wait for frame fence"))?;

            let image_index = match self.swapchain_loader.acquire_next_image(
                self.swapchain,
                u64::MAX,
                self.image_available,
                vk::Fence::null(),
            ) {
                Ok((index, _suboptimal)) => index,
                // Same recoverable condition as at present time. The fence
                // has not been reset yet, so the skipped frame leaves it
                // signaled and the next wait falls through.
                Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                    return Ok(FrameOutcome::SurfaceOutOfDate)
                }
                Err(source) => {
                    return Err(RenderError::Frame {
                        op: "acquire swapchain image",
                        source,
                    })
                }
            };

            d.reset_fences(&[self.in_flight])
                .map_err(RenderError::frame("reset frame fence"))?;

            d.reset_command_buffer(self.cmd_buf, vk::CommandBufferResetFlags::empty())
                .map_err(RenderError::frame("reset command buffer"))?;
            self.record_frame(image_index)?;

            let wait_stages = [vk::PipelineStageFlags::ALL_COMMANDS];
            let submit = vk::SubmitInfo {
                s_type: vk::StructureType::SUBMIT_INFO,
                wait_semaphore_count: 1,
                p_wait_semaphores: &self.image_available,
                p_wait_dst_stage_mask: wait_stages.as_ptr(),
                command_buffer_count: 1,
                p_command_buffers: &self.cmd_buf,
                signal_semaphore_count: 1,
                p_signal_semaphores: &self.render_finished,
                ..Default::default()
            };
            d.queue_submit(self.queue, std::slice::from_ref(&submit), self.in_flight)
                .map_err(RenderError::frame("queue submit"))?;

            let present = vk::PresentInfoKHR {
                s_type: vk::StructureType::PRESENT_INFO_KHR,
                wait_semaphore_count: 1,
                p_wait_semaphores: &self.render_finished,
                swapchain_count: 1,
                p_swapchains: &self.swapchain,
                p_image_indices: &image_index,
                ..Default::default()
            };
            frame::classify_present(
                self.swapchain_loader.queue_present(self.queue, &present),
            )
        }
    }

    fn record_frame(&self, image_index: u32) -> Result<(), RenderError> {
        frame::emit_frame_commands(self.extent, image_index, self.clear, &mut |cmd| {
            // SAFETY for the whole sequence: cmd_buf was reset by the caller,
            // every referenced handle lives on self, and all pointers passed
            // to the API only need to outlive the individual call.
            match cmd {
                FrameCmd::Begin => {
                    let begin = vk::CommandBufferBeginInfo {
                        s_type: vk::StructureType::COMMAND_BUFFER_BEGIN_INFO,
                        ..Default::default()
                    };
                    unsafe { self.device.begin_command_buffer(self.cmd_buf, &begin) }
                }
                FrameCmd::BeginRenderPass { image_index, clear } => {
                    let clear_value = vk::ClearValue {
                        color: vk::ClearColorValue { float32: clear },
                    };
                    let rp_begin = vk::RenderPassBeginInfo {
                        s_type: vk::StructureType::RENDER_PASS_BEGIN_INFO,
                        render_pass: self.render_pass,
                        framebuffer: self.framebuffers[image_index as usize],
                        render_area: vk::Rect2D {
                            offset: vk::Offset2D { x: 0, y: 0 },
                            extent: self.extent,
                        },
                        clear_value_count: 1,
                        p_clear_values: &clear_value,
                        ..Default::default()
                    };
                    unsafe {
                        self.device.cmd_begin_render_pass(
                            self.cmd_buf,
                            &rp_begin,
                            vk::SubpassContents::INLINE,
                        );
                    }
                    Ok(())
                }
                FrameCmd::BindPipeline => {
                    unsafe {
                        self.device.cmd_bind_pipeline(
                            self.cmd_buf,
                            vk::PipelineBindPoint::GRAPHICS,
                            self.pipeline,
                        );
                    }
                    Ok(())
                }
                FrameCmd::SetViewport(vp) => {
                    unsafe {
                        self.device
                            .cmd_set_viewport(self.cmd_buf, 0, std::slice::from_ref(&vp));
                    }
                    Ok(())
                }
                FrameCmd::SetScissor(rect) => {
                    unsafe {
                        self.device
                            .cmd_set_scissor(self.cmd_buf, 0, std::slice::from_ref(&rect));
                    }
                    Ok(())
                }
                FrameCmd::Draw {
                    vertex_count,
                    instance_count,
                } => {
                    unsafe {
                        self.device
                            .cmd_draw(self.cmd_buf, vertex_count, instance_count, 0, 0);
                    }
                    Ok(())
                }
                FrameCmd::EndRenderPass => {
                    unsafe { self.device.cmd_end_render_pass(self.cmd_buf) };
                    Ok(())
                }
                FrameCmd::End => unsafe { self.device.end_command_buffer(self.cmd_buf) },
            }
        })
        .map_err(RenderError::frame("record commands"))
    }
}

// STRICT TEARDOWN ORDER:
// - Wait the in-flight fence, then device_wait_idle()
// - Sync objects and command pool before the device
// - Pipeline/layout before the render pass it was built against
// - Framebuffers and image views before the swapchain
// - Swapchain before device; surface and messenger after device;
//   instance last.
impl Drop for VkRenderer {
    fn drop(&mut self) {
        unsafe {
            let d = &self.device;
            let _ = d.wait_for_fences(&[self.in_flight], true, u64::MAX);
            d.device_wait_idle().ok();

            d.destroy_fence(self.in_flight, None);
            d.destroy_semaphore(self.render_finished, None);
            d.destroy_semaphore(self.image_available, None);

            d.free_command_buffers(self.cmd_pool, std::slice::from_ref(&self.cmd_buf));
            d.destroy_command_pool(self.cmd_pool, None);

            d.destroy_pipeline(self.pipeline, None);
            d.destroy_pipeline_layout(self.pipeline_layout, None);

            for &fb in &self.framebuffers {
                d.destroy_framebuffer(fb, None);
            }
            d.destroy_render_pass(self.render_pass, None);
            for &iv in &self.image_views {
                d.destroy_image_view(iv, None);
            }
            self.swapchain_loader.destroy_swapchain(self.swapchain, None);

            d.destroy_device(None);

            if let Some(messenger) = self.debug_messenger {
                debug::destroy_debug_messenger(&self._entry, &self.instance, messenger);
            }
            self.surface_loader.destroy_surface(self.surface, None);
            self.instance.destroy_instance(None);
        }
    }
}
