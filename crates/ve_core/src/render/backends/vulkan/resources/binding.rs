//! Shader-visible binding declarations
//!
//! A [`Binding`] records everything needed to both describe a slot in a set
//! layout and write its resource into every descriptor set copy.

use ash::vk;

/// A GPU buffer that can back a descriptor
pub trait BufferResource {
    /// Buffer handle
    fn handle(&self) -> vk::Buffer;
    /// Size in bytes bound to the descriptor
    fn byte_size(&self) -> vk::DeviceSize;
}

/// A sampled image that can back a descriptor
pub trait ImageResource {
    /// View bound to the descriptor
    fn view(&self) -> vk::ImageView;
    /// Sampler bound to the descriptor
    fn sampler(&self) -> vk::Sampler;
}

/// Buffer range written into a descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferRegion {
    /// Buffer handle
    pub buffer: vk::Buffer,
    /// Start of the range
    pub offset: vk::DeviceSize,
    /// Length of the range
    pub range: vk::DeviceSize,
}

impl BufferRegion {
    /// Whole-buffer range starting at offset 0
    pub fn whole(buffer: vk::Buffer, byte_size: vk::DeviceSize) -> Self {
        Self {
            buffer,
            offset: 0,
            range: byte_size,
        }
    }

    pub(crate) fn to_vk(self) -> vk::DescriptorBufferInfo {
        vk::DescriptorBufferInfo::builder()
            .buffer(self.buffer)
            .offset(self.offset)
            .range(self.range)
            .build()
    }
}

/// Image view and sampler written into a descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSampler {
    /// Image view handle
    pub view: vk::ImageView,
    /// Sampler handle
    pub sampler: vk::Sampler,
    /// Layout the image is in when sampled
    pub layout: vk::ImageLayout,
}

impl ImageSampler {
    /// Shader-read-only binding of `image`
    pub fn from_image<I: ImageResource + ?Sized>(image: &I) -> Self {
        Self {
            view: image.view(),
            sampler: image.sampler(),
            layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        }
    }

    pub(crate) fn to_vk(self) -> vk::DescriptorImageInfo {
        vk::DescriptorImageInfo::builder()
            .image_view(self.view)
            .sampler(self.sampler)
            .image_layout(self.layout)
            .build()
    }
}

impl ImageResource for ImageSampler {
    fn view(&self) -> vk::ImageView {
        self.view
    }

    fn sampler(&self) -> vk::Sampler {
        self.sampler
    }
}

/// Resource bound at a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingResource {
    /// Buffer-backed descriptor
    Buffer(BufferRegion),
    /// Image-backed descriptor
    Image(ImageSampler),
}

/// How a binding's resources map onto descriptor set copies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingSharing {
    /// One resource per set copy, copy `i` uses resource `i`
    PerFrame,
    /// A single resource written into every set copy
    Shared,
}

/// One declared slot of the descriptor set layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    /// Binding number in the shader
    pub slot: u32,
    /// Descriptor type of the slot
    pub descriptor_type: vk::DescriptorType,
    /// Stages that read the slot
    pub stages: vk::ShaderStageFlags,
    /// Per-frame or shared
    pub sharing: BindingSharing,
    /// Backing resources; one per copy for per-frame bindings, one otherwise
    pub resources: Vec<BindingResource>,
}

impl Binding {
    /// Resource to write into set copy `copy`
    pub fn resource_for(&self, copy: usize) -> Option<&BindingResource> {
        match self.sharing {
            BindingSharing::PerFrame => self.resources.get(copy),
            BindingSharing::Shared => self.resources.first(),
        }
    }

    /// Layout entry describing this slot
    pub fn layout_binding(&self) -> vk::DescriptorSetLayoutBinding {
        vk::DescriptorSetLayoutBinding::builder()
            .binding(self.slot)
            .descriptor_type(self.descriptor_type)
            .descriptor_count(1)
            .stage_flags(self.stages)
            .build()
    }
}
