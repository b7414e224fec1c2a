//! Fake GPU for unit tests
//!
//! [`MockDevice`] hands out sequential fake handles and records every call;
//! [`MockInstance`] describes physical devices without a driver.

use ash::vk::{self, Handle};
use std::cell::{Cell, RefCell};

use super::initialization::context::{VulkanError, VulkanResult};
use super::initialization::instance::{DeviceProperties, Instance};
use super::initialization::selection::{SelectionStrategy, Suitability, SuitableDevice};
use super::rendering::commands::CommandRecorder;
use super::rendering::pipeline::{PipelineDesc, PipelineDevice};
use super::resources::binding::{BindingResource, BufferRegion, BufferResource, ImageResource};
use super::resources::descriptor_set::{DescriptorDevice, DescriptorWrite};

/// Recorded device call
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum GpuCall {
    CreateLayout {
        handle: vk::DescriptorSetLayout,
        slots: Vec<u32>,
    },
    CreatePool {
        handle: vk::DescriptorPool,
        sizes: Vec<(vk::DescriptorType, u32)>,
        max_sets: u32,
    },
    AllocateSets {
        pool: vk::DescriptorPool,
        sets: Vec<vk::DescriptorSet>,
    },
    UpdateSets(Vec<DescriptorWrite>),
    DestroyPool(vk::DescriptorPool),
    DestroyLayout(vk::DescriptorSetLayout),
    CreatePipeline {
        handle: vk::Pipeline,
        set_layout: vk::DescriptorSetLayout,
        polygon_mode: vk::PolygonMode,
        shaders: Vec<String>,
    },
    DestroyPipeline(vk::Pipeline),
    BindPipeline(vk::Pipeline),
    BindDescriptorSet {
        layout: vk::PipelineLayout,
        set: vk::DescriptorSet,
    },
    PushConstants {
        stages: vk::ShaderStageFlags,
        offset: u32,
        bytes: Vec<u8>,
    },
    BindVertexBuffer(vk::Buffer),
    BindIndexBuffer(vk::Buffer),
    DrawIndexed {
        index_count: u32,
    },
}

/// Device call that should fail with `ERROR_OUT_OF_DEVICE_MEMORY`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FailPoint {
    Pool,
    AllocateSets,
    Pipeline,
    /// Only pipelines with `PolygonMode::LINE`
    MeshViewPipeline,
}

pub(crate) struct MockDevice {
    calls: RefCell<Vec<GpuCall>>,
    next_handle: Cell<u64>,
    fail: Cell<Option<FailPoint>>,
    live_layouts: Cell<i64>,
    live_pools: Cell<i64>,
    live_pipelines: Cell<i64>,
}

impl MockDevice {
    pub(crate) fn new() -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            next_handle: Cell::new(0x1000),
            fail: Cell::new(None),
            live_layouts: Cell::new(0),
            live_pools: Cell::new(0),
            live_pipelines: Cell::new(0),
        }
    }

    pub(crate) fn fail_at(&self, point: FailPoint) {
        self.fail.set(Some(point));
    }

    pub(crate) fn clear_failure(&self) {
        self.fail.set(None);
    }

    pub(crate) fn calls(&self) -> Vec<GpuCall> {
        self.calls.borrow().clone()
    }

    pub(crate) fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    /// Every descriptor write issued so far, in order
    pub(crate) fn writes(&self) -> Vec<DescriptorWrite> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                GpuCall::UpdateSets(writes) => Some(writes.clone()),
                _ => None,
            })
            .flatten()
            .collect()
    }

    pub(crate) fn live_layouts(&self) -> i64 {
        self.live_layouts.get()
    }

    pub(crate) fn live_pools(&self) -> i64 {
        self.live_pools.get()
    }

    pub(crate) fn live_pipelines(&self) -> i64 {
        self.live_pipelines.get()
    }

    fn handle<H: Handle>(&self) -> H {
        let raw = self.next_handle.get();
        self.next_handle.set(raw + 1);
        H::from_raw(raw)
    }

    fn check(&self, point: FailPoint) -> VulkanResult<()> {
        if self.fail.get() == Some(point) {
            return Err(VulkanError::Api(vk::Result::ERROR_OUT_OF_DEVICE_MEMORY));
        }
        Ok(())
    }

    fn record(&self, call: GpuCall) {
        self.calls.borrow_mut().push(call);
    }
}

fn bump(counter: &Cell<i64>, delta: i64) {
    counter.set(counter.get() + delta);
}

impl DescriptorDevice for MockDevice {
    fn create_descriptor_set_layout(
        &self,
        bindings: &[vk::DescriptorSetLayoutBinding],
    ) -> VulkanResult<vk::DescriptorSetLayout> {
        let handle = self.handle();
        bump(&self.live_layouts, 1);
        self.record(GpuCall::CreateLayout {
            handle,
            slots: bindings.iter().map(|b| b.binding).collect(),
        });
        Ok(handle)
    }

    fn create_descriptor_pool(
        &self,
        sizes: &[vk::DescriptorPoolSize],
        max_sets: u32,
    ) -> VulkanResult<vk::DescriptorPool> {
        self.check(FailPoint::Pool)?;
        let handle = self.handle();
        bump(&self.live_pools, 1);
        self.record(GpuCall::CreatePool {
            handle,
            sizes: sizes.iter().map(|s| (s.ty, s.descriptor_count)).collect(),
            max_sets,
        });
        Ok(handle)
    }

    fn allocate_descriptor_sets(
        &self,
        pool: vk::DescriptorPool,
        layouts: &[vk::DescriptorSetLayout],
    ) -> VulkanResult<Vec<vk::DescriptorSet>> {
        self.check(FailPoint::AllocateSets)?;
        let sets: Vec<vk::DescriptorSet> = layouts.iter().map(|_| self.handle()).collect();
        self.record(GpuCall::AllocateSets {
            pool,
            sets: sets.clone(),
        });
        Ok(sets)
    }

    fn update_descriptor_sets(&self, writes: &[DescriptorWrite]) {
        self.record(GpuCall::UpdateSets(writes.to_vec()));
    }

    fn destroy_descriptor_pool(&self, pool: vk::DescriptorPool) {
        bump(&self.live_pools, -1);
        self.record(GpuCall::DestroyPool(pool));
    }

    fn destroy_descriptor_set_layout(&self, layout: vk::DescriptorSetLayout) {
        bump(&self.live_layouts, -1);
        self.record(GpuCall::DestroyLayout(layout));
    }
}

impl PipelineDevice for MockDevice {
    fn create_graphics_pipeline(&self, desc: &PipelineDesc<'_>) -> VulkanResult<(vk::Pipeline, vk::PipelineLayout)> {
        self.check(FailPoint::Pipeline)?;
        if desc.polygon_mode == vk::PolygonMode::LINE {
            self.check(FailPoint::MeshViewPipeline)?;
        }
        let handle = self.handle();
        let layout = self.handle();
        bump(&self.live_pipelines, 1);
        self.record(GpuCall::CreatePipeline {
            handle,
            set_layout: desc.set_layout,
            polygon_mode: desc.polygon_mode,
            shaders: desc.shaders.iter().map(|s| s.name.clone()).collect(),
        });
        Ok((handle, layout))
    }

    fn destroy_pipeline(&self, pipeline: vk::Pipeline, _layout: vk::PipelineLayout) {
        bump(&self.live_pipelines, -1);
        self.record(GpuCall::DestroyPipeline(pipeline));
    }
}

impl CommandRecorder for MockDevice {
    fn bind_pipeline(&self, _command_buffer: vk::CommandBuffer, pipeline: vk::Pipeline) {
        self.record(GpuCall::BindPipeline(pipeline));
    }

    fn bind_descriptor_set(
        &self,
        _command_buffer: vk::CommandBuffer,
        layout: vk::PipelineLayout,
        set: vk::DescriptorSet,
    ) {
        self.record(GpuCall::BindDescriptorSet { layout, set });
    }

    fn push_constants(
        &self,
        _command_buffer: vk::CommandBuffer,
        _layout: vk::PipelineLayout,
        stages: vk::ShaderStageFlags,
        offset: u32,
        bytes: &[u8],
    ) {
        self.record(GpuCall::PushConstants {
            stages,
            offset,
            bytes: bytes.to_vec(),
        });
    }

    fn bind_vertex_buffer(&self, _command_buffer: vk::CommandBuffer, buffer: vk::Buffer) {
        self.record(GpuCall::BindVertexBuffer(buffer));
    }

    fn bind_index_buffer(&self, _command_buffer: vk::CommandBuffer, buffer: vk::Buffer) {
        self.record(GpuCall::BindIndexBuffer(buffer));
    }

    fn draw_indexed(&self, _command_buffer: vk::CommandBuffer, index_count: u32, _first_index: u32) {
        self.record(GpuCall::DrawIndexed { index_count });
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MockBuffer {
    handle: vk::Buffer,
    size: vk::DeviceSize,
}

impl MockBuffer {
    pub(crate) fn new(raw: u64, size: vk::DeviceSize) -> Self {
        Self {
            handle: vk::Buffer::from_raw(raw),
            size,
        }
    }

    pub(crate) fn resource(&self) -> BindingResource {
        BindingResource::Buffer(BufferRegion::whole(self.handle, self.size))
    }
}

impl BufferResource for MockBuffer {
    fn handle(&self) -> vk::Buffer {
        self.handle
    }

    fn byte_size(&self) -> vk::DeviceSize {
        self.size
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MockImage {
    view: vk::ImageView,
    sampler: vk::Sampler,
}

impl MockImage {
    pub(crate) fn new(raw: u64) -> Self {
        Self {
            view: vk::ImageView::from_raw(raw),
            sampler: vk::Sampler::from_raw(raw + 0x100),
        }
    }
}

impl ImageResource for MockImage {
    fn view(&self) -> vk::ImageView {
        self.view
    }

    fn sampler(&self) -> vk::Sampler {
        self.sampler
    }
}

/// Canned physical device
///
/// Defaults: discrete, offers only the swapchain extension, families
/// `[graphics|compute|transfer, transfer]` with present support on family 0,
/// one surface format and FIFO presentation.
#[derive(Debug, Clone)]
pub(crate) struct MockGpu {
    name: String,
    device_type: vk::PhysicalDeviceType,
    extensions: Vec<String>,
    families: Vec<vk::QueueFamilyProperties>,
    present_support: Vec<bool>,
    surface_supported: bool,
}

impl MockGpu {
    pub(crate) fn discrete(name: &str) -> Self {
        let family = |flags| vk::QueueFamilyProperties {
            queue_flags: flags,
            queue_count: 1,
            ..Default::default()
        };
        Self {
            name: name.to_string(),
            device_type: vk::PhysicalDeviceType::DISCRETE_GPU,
            extensions: vec!["VK_KHR_swapchain".to_string()],
            families: vec![
                family(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER),
                family(vk::QueueFlags::TRANSFER),
            ],
            present_support: vec![true, false],
            surface_supported: true,
        }
    }

    pub(crate) fn integrated(name: &str) -> Self {
        Self {
            device_type: vk::PhysicalDeviceType::INTEGRATED_GPU,
            ..Self::discrete(name)
        }
    }

    pub(crate) fn with_extensions(mut self, extensions: &[&str]) -> Self {
        self.extensions = extensions.iter().map(ToString::to_string).collect();
        self
    }

    /// Without surface support the device reports no formats, no present
    /// modes and no present-capable family
    pub(crate) fn with_surface_support(mut self, supported: bool) -> Self {
        self.surface_supported = supported;
        if !supported {
            self.present_support = vec![false; self.families.len()];
        }
        self
    }
}

pub(crate) struct MockInstance {
    gpus: Vec<MockGpu>,
}

impl MockInstance {
    pub(crate) fn new(gpus: Vec<MockGpu>) -> Self {
        Self { gpus }
    }

    fn gpu(&self, device: vk::PhysicalDevice) -> VulkanResult<&MockGpu> {
        (device.as_raw() as usize)
            .checked_sub(1)
            .and_then(|index| self.gpus.get(index))
            .ok_or(VulkanError::ResourceNotFound { id: device.as_raw() })
    }
}

impl Instance for MockInstance {
    fn physical_devices(&self) -> VulkanResult<Vec<vk::PhysicalDevice>> {
        Ok((1..=self.gpus.len() as u64).map(vk::PhysicalDevice::from_raw).collect())
    }

    fn surface(&self) -> vk::SurfaceKHR {
        vk::SurfaceKHR::from_raw(0xC0FFEE)
    }

    fn device_properties(&self, device: vk::PhysicalDevice) -> DeviceProperties {
        self.gpu(device)
            .map(|gpu| DeviceProperties {
                name: gpu.name.clone(),
                device_type: gpu.device_type,
            })
            .unwrap_or_else(|_| DeviceProperties {
                name: String::new(),
                device_type: vk::PhysicalDeviceType::OTHER,
            })
    }

    fn device_extension_names(&self, device: vk::PhysicalDevice) -> VulkanResult<Vec<String>> {
        Ok(self.gpu(device)?.extensions.clone())
    }

    fn queue_families(&self, device: vk::PhysicalDevice) -> Vec<vk::QueueFamilyProperties> {
        self.gpu(device).map(|gpu| gpu.families.clone()).unwrap_or_default()
    }

    fn surface_support(
        &self,
        device: vk::PhysicalDevice,
        family_index: u32,
        _surface: vk::SurfaceKHR,
    ) -> VulkanResult<bool> {
        Ok(self
            .gpu(device)?
            .present_support
            .get(family_index as usize)
            .copied()
            .unwrap_or(false))
    }

    fn surface_formats(
        &self,
        device: vk::PhysicalDevice,
        _surface: vk::SurfaceKHR,
    ) -> VulkanResult<Vec<vk::SurfaceFormatKHR>> {
        if !self.gpu(device)?.surface_supported {
            return Ok(Vec::new());
        }
        Ok(vec![vk::SurfaceFormatKHR {
            format: vk::Format::B8G8R8A8_SRGB,
            color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
        }])
    }

    fn present_modes(
        &self,
        device: vk::PhysicalDevice,
        _surface: vk::SurfaceKHR,
    ) -> VulkanResult<Vec<vk::PresentModeKHR>> {
        if !self.gpu(device)?.surface_supported {
            return Ok(Vec::new());
        }
        Ok(vec![vk::PresentModeKHR::FIFO])
    }
}

/// Answers selection requests from a fixed script and records what it saw
pub(crate) struct ScriptedStrategy {
    choices: Vec<usize>,
    pub(crate) select_calls: usize,
    pub(crate) candidates: Vec<usize>,
    pub(crate) reports: Vec<(usize, Suitability)>,
}

impl ScriptedStrategy {
    pub(crate) fn new(choices: &[usize]) -> Self {
        Self {
            choices: choices.to_vec(),
            select_calls: 0,
            candidates: Vec::new(),
            reports: Vec::new(),
        }
    }
}

impl SelectionStrategy for ScriptedStrategy {
    fn report(&mut self, index: usize, _name: &str, suitability: &Suitability) -> VulkanResult<()> {
        self.reports.push((index, suitability.clone()));
        Ok(())
    }

    fn select(&mut self, candidates: &[SuitableDevice]) -> VulkanResult<usize> {
        self.candidates = candidates.iter().map(|c| c.index).collect();
        let choice = self.choices.get(self.select_calls).copied();
        self.select_calls += 1;
        choice.ok_or(VulkanError::NoSuitableDevice)
    }
}
