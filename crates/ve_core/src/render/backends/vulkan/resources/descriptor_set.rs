//! Vulkan descriptor set and resource binding management
//!
//! [`DescriptorBindingLayer`] collects shader-visible bindings, then realizes
//! them once into per-frame descriptor set copies:
//!
//! ```text
//! Building --construct()--> Realized --self_destruct()--> Destroyed
//! ```
//!
//! Slot 0 is always a per-frame uniform buffer, so copy `i` of the set points
//! at uniform buffer `i`. Every other binding is shared: its single resource
//! is written into all copies.

use ash::vk;
use std::fmt;
use std::sync::Arc;

use super::binding::{
    Binding, BindingResource, BindingSharing, BufferRegion, BufferResource, ImageResource, ImageSampler,
};
use crate::render::backends::vulkan::initialization::context::{LogicalDevice, VulkanError, VulkanResult};

/// Slot reserved for the per-frame uniform buffer
pub const UNIFORM_BUFFER_SLOT: u32 = 0;

/// Descriptor object creation and destruction
pub trait DescriptorDevice {
    /// Create a set layout from `bindings`
    fn create_descriptor_set_layout(
        &self,
        bindings: &[vk::DescriptorSetLayoutBinding],
    ) -> VulkanResult<vk::DescriptorSetLayout>;

    /// Create a pool able to hold `max_sets` sets
    fn create_descriptor_pool(
        &self,
        sizes: &[vk::DescriptorPoolSize],
        max_sets: u32,
    ) -> VulkanResult<vk::DescriptorPool>;

    /// Allocate one set per layout from `pool`
    fn allocate_descriptor_sets(
        &self,
        pool: vk::DescriptorPool,
        layouts: &[vk::DescriptorSetLayout],
    ) -> VulkanResult<Vec<vk::DescriptorSet>>;

    /// Point descriptors at their resources
    fn update_descriptor_sets(&self, writes: &[DescriptorWrite]);

    /// Destroy a pool and every set allocated from it
    fn destroy_descriptor_pool(&self, pool: vk::DescriptorPool);

    /// Destroy a set layout
    fn destroy_descriptor_set_layout(&self, layout: vk::DescriptorSetLayout);
}

/// One descriptor update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorWrite {
    /// Destination set
    pub set: vk::DescriptorSet,
    /// Destination binding slot
    pub binding: u32,
    /// Descriptor type of the slot
    pub descriptor_type: vk::DescriptorType,
    /// Resource written into the slot
    pub resource: BindingResource,
}

/// Lifecycle of a [`DescriptorBindingLayer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerState {
    /// Accepting bindings
    Building,
    /// Layouts, pool and sets exist
    Realized,
    /// GPU objects released
    Destroyed,
}

impl fmt::Display for LayerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Building => "building",
            Self::Realized => "realized",
            Self::Destroyed => "destroyed",
        })
    }
}

/// Descriptor bindings realized into one set per frame in flight
pub struct DescriptorBindingLayer<D: DescriptorDevice> {
    device: Arc<D>,
    set_copies: usize,
    bindings: Vec<Binding>,
    state: LayerState,
    layouts: Vec<vk::DescriptorSetLayout>,
    pool: vk::DescriptorPool,
    sets: Vec<vk::DescriptorSet>,
}

impl<D: DescriptorDevice> DescriptorBindingLayer<D> {
    /// Create an empty layer in the building state
    pub fn new(device: Arc<D>) -> Self {
        Self {
            device,
            set_copies: 0,
            bindings: Vec::new(),
            state: LayerState::Building,
            layouts: Vec::new(),
            pool: vk::DescriptorPool::null(),
            sets: Vec::new(),
        }
    }

    /// Declare the per-frame uniform buffer at slot 0
    ///
    /// `copies` becomes the number of descriptor set copies; the first
    /// `copies` entries of `buffers` back them in order.
    pub fn add_uniform_buffer<B: BufferResource>(&mut self, copies: usize, buffers: &[B]) -> VulkanResult<()> {
        self.expect_state("add a uniform buffer", LayerState::Building)?;
        if copies == 0 {
            return Err(VulkanError::invalid("Uniform buffer needs at least one copy"));
        }
        if self.set_copies != 0 {
            return Err(VulkanError::invalid("Uniform buffer already declared"));
        }
        if buffers.len() < copies {
            return Err(VulkanError::invalid(format!(
                "{copies} uniform buffer copies requested but only {} buffers supplied",
                buffers.len()
            )));
        }
        self.check_slot_free(UNIFORM_BUFFER_SLOT)?;

        let resources = buffers[..copies]
            .iter()
            .map(|buffer| BindingResource::Buffer(BufferRegion::whole(buffer.handle(), buffer.byte_size())))
            .collect();
        self.bindings.push(Binding {
            slot: UNIFORM_BUFFER_SLOT,
            descriptor_type: vk::DescriptorType::UNIFORM_BUFFER,
            stages: vk::ShaderStageFlags::ALL,
            sharing: BindingSharing::PerFrame,
            resources,
        });
        self.set_copies = copies;
        Ok(())
    }

    /// Declare a buffer shared by every set copy
    pub fn add_buffer_binding(
        &mut self,
        slot: u32,
        descriptor_type: vk::DescriptorType,
        stages: vk::ShaderStageFlags,
        buffer: vk::Buffer,
        byte_size: vk::DeviceSize,
    ) -> VulkanResult<()> {
        let resource = BindingResource::Buffer(BufferRegion::whole(buffer, byte_size));
        self.add_shared(slot, descriptor_type, stages, resource)
    }

    /// Declare a sampled image shared by every set copy
    pub fn add_image_binding<I: ImageResource + ?Sized>(
        &mut self,
        slot: u32,
        descriptor_type: vk::DescriptorType,
        stages: vk::ShaderStageFlags,
        image: &I,
    ) -> VulkanResult<()> {
        let resource = BindingResource::Image(ImageSampler::from_image(image));
        self.add_shared(slot, descriptor_type, stages, resource)
    }

    fn add_shared(
        &mut self,
        slot: u32,
        descriptor_type: vk::DescriptorType,
        stages: vk::ShaderStageFlags,
        resource: BindingResource,
    ) -> VulkanResult<()> {
        self.expect_state("add a binding", LayerState::Building)?;
        self.check_slot_free(slot)?;
        self.bindings.push(Binding {
            slot,
            descriptor_type,
            stages,
            sharing: BindingSharing::Shared,
            resources: vec![resource],
        });
        Ok(())
    }

    /// Create layouts, pool and sets, and write every binding
    ///
    /// Objects created before a failure are released again and the layer
    /// stays in the building state.
    pub fn construct(&mut self) -> VulkanResult<()> {
        self.expect_state("construct", LayerState::Building)?;
        if self.set_copies == 0 {
            return Err(VulkanError::invalid(
                "Descriptor layer has no per-frame uniform buffer to size its copies",
            ));
        }

        if let Err(e) = self.realize() {
            log::error!("[DESCRIPTOR] Realization failed: {e}");
            self.release();
            return Err(e);
        }

        self.state = LayerState::Realized;
        log::debug!(
            "[DESCRIPTOR] Realized {} bindings into {} set copies",
            self.bindings.len(),
            self.set_copies
        );
        Ok(())
    }

    fn realize(&mut self) -> VulkanResult<()> {
        let layout_bindings = self.layout_bindings();
        for _ in 0..self.set_copies {
            let layout = self.device.create_descriptor_set_layout(&layout_bindings)?;
            self.layouts.push(layout);
        }

        self.pool = self
            .device
            .create_descriptor_pool(&self.pool_sizes(), self.set_copies as u32)?;
        self.sets = self.device.allocate_descriptor_sets(self.pool, &self.layouts)?;

        let mut writes = Vec::with_capacity(self.sets.len() * self.bindings.len());
        for (copy, &set) in self.sets.iter().enumerate() {
            for binding in &self.bindings {
                let resource = binding.resource_for(copy).ok_or_else(|| {
                    VulkanError::invalid(format!("Binding {} has no resource for copy {copy}", binding.slot))
                })?;
                writes.push(DescriptorWrite {
                    set,
                    binding: binding.slot,
                    descriptor_type: binding.descriptor_type,
                    resource: *resource,
                });
            }
        }
        self.device.update_descriptor_sets(&writes);
        Ok(())
    }

    /// Release the pool and every layout copy
    pub fn self_destruct(&mut self) -> VulkanResult<()> {
        self.expect_state("destroy", LayerState::Realized)?;
        self.release();
        self.state = LayerState::Destroyed;
        Ok(())
    }

    /// Return a realized layer to the building state, releasing its objects
    pub(crate) fn unrealize(&mut self) {
        if self.state == LayerState::Realized {
            self.release();
            self.state = LayerState::Building;
        }
    }

    fn release(&mut self) {
        if self.pool != vk::DescriptorPool::null() {
            self.device.destroy_descriptor_pool(self.pool);
            self.pool = vk::DescriptorPool::null();
        }
        for layout in self.layouts.drain(..) {
            self.device.destroy_descriptor_set_layout(layout);
        }
        self.sets.clear();
    }

    fn expect_state(&self, operation: &'static str, expected: LayerState) -> VulkanResult<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(VulkanError::InvalidState {
                operation,
                state: self.state,
            })
        }
    }

    fn check_slot_free(&self, slot: u32) -> VulkanResult<()> {
        if self.bindings.iter().any(|b| b.slot == slot) {
            return Err(VulkanError::invalid(format!("Binding slot {slot} already declared")));
        }
        Ok(())
    }

    /// Pool sizes: descriptor count per type across all bindings, times copies
    pub fn pool_sizes(&self) -> Vec<vk::DescriptorPoolSize> {
        let mut sizes: Vec<vk::DescriptorPoolSize> = Vec::new();
        for binding in &self.bindings {
            match sizes.iter_mut().find(|s| s.ty == binding.descriptor_type) {
                Some(size) => size.descriptor_count += self.set_copies as u32,
                None => sizes.push(
                    vk::DescriptorPoolSize::builder()
                        .ty(binding.descriptor_type)
                        .descriptor_count(self.set_copies as u32)
                        .build(),
                ),
            }
        }
        sizes
    }

    /// Layout copy `copy`, only available while realized
    pub fn layout(&self, copy: usize) -> VulkanResult<vk::DescriptorSetLayout> {
        self.expect_state("use a layout", LayerState::Realized)?;
        self.layouts
            .get(copy)
            .copied()
            .ok_or(VulkanError::ResourceNotFound { id: copy as u64 })
    }

    /// Layout copies, empty unless realized
    pub fn layouts(&self) -> &[vk::DescriptorSetLayout] {
        &self.layouts
    }

    /// Descriptor sets, one per copy, empty unless realized
    pub fn sets(&self) -> &[vk::DescriptorSet] {
        &self.sets
    }

    /// Declared bindings in declaration order
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// Layout entries of the declared bindings
    pub fn layout_bindings(&self) -> Vec<vk::DescriptorSetLayoutBinding> {
        self.bindings.iter().map(Binding::layout_binding).collect()
    }

    /// Number of descriptor set copies, 0 until the uniform buffer is declared
    pub fn set_copies(&self) -> usize {
        self.set_copies
    }

    /// Current lifecycle state
    pub fn state(&self) -> LayerState {
        self.state
    }

    /// Device the layer creates its objects on
    pub fn device(&self) -> &Arc<D> {
        &self.device
    }
}

impl<D: DescriptorDevice> Drop for DescriptorBindingLayer<D> {
    fn drop(&mut self) {
        if self.state == LayerState::Realized {
            self.release();
            self.state = LayerState::Destroyed;
        }
    }
}

impl DescriptorDevice for LogicalDevice {
    fn create_descriptor_set_layout(
        &self,
        bindings: &[vk::DescriptorSetLayoutBinding],
    ) -> VulkanResult<vk::DescriptorSetLayout> {
        let layout_info = vk::DescriptorSetLayoutCreateInfo::builder().bindings(bindings);
        unsafe { self.device.create_descriptor_set_layout(&layout_info, None) }
            .map_err(VulkanError::Api)
    }

    fn create_descriptor_pool(
        &self,
        sizes: &[vk::DescriptorPoolSize],
        max_sets: u32,
    ) -> VulkanResult<vk::DescriptorPool> {
        let pool_info = vk::DescriptorPoolCreateInfo::builder()
            .max_sets(max_sets)
            .pool_sizes(sizes);
        unsafe { self.device.create_descriptor_pool(&pool_info, None) }
            .map_err(VulkanError::Api)
    }

    fn allocate_descriptor_sets(
        &self,
        pool: vk::DescriptorPool,
        layouts: &[vk::DescriptorSetLayout],
    ) -> VulkanResult<Vec<vk::DescriptorSet>> {
        let alloc_info = vk::DescriptorSetAllocateInfo::builder()
            .descriptor_pool(pool)
            .set_layouts(layouts);
        unsafe { self.device.allocate_descriptor_sets(&alloc_info) }
            .map_err(VulkanError::Api)
    }

    fn update_descriptor_sets(&self, writes: &[DescriptorWrite]) {
        // Infos must outlive the raw write structs pointing at them
        let infos: Vec<(Option<vk::DescriptorBufferInfo>, Option<vk::DescriptorImageInfo>)> = writes
            .iter()
            .map(|write| match write.resource {
                BindingResource::Buffer(region) => (Some(region.to_vk()), None),
                BindingResource::Image(image) => (None, Some(image.to_vk())),
            })
            .collect();

        let vk_writes: Vec<vk::WriteDescriptorSet> = writes
            .iter()
            .zip(&infos)
            .map(|(write, (buffer_info, image_info))| {
                let mut builder = vk::WriteDescriptorSet::builder()
                    .dst_set(write.set)
                    .dst_binding(write.binding)
                    .dst_array_element(0)
                    .descriptor_type(write.descriptor_type);
                if let Some(info) = buffer_info {
                    builder = builder.buffer_info(std::slice::from_ref(info));
                }
                if let Some(info) = image_info {
                    builder = builder.image_info(std::slice::from_ref(info));
                }
                builder.build()
            })
            .collect();

        unsafe {
            self.device.update_descriptor_sets(&vk_writes, &[]);
        }
    }

    fn destroy_descriptor_pool(&self, pool: vk::DescriptorPool) {
        unsafe {
            self.device.destroy_descriptor_pool(pool, None);
        }
    }

    fn destroy_descriptor_set_layout(&self, layout: vk::DescriptorSetLayout) {
        unsafe {
            self.device.destroy_descriptor_set_layout(layout, None);
        }
    }
}
