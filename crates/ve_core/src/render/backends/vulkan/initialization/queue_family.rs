//! Queue family scoring and role assignment
//!
//! Families are scored per capability by how specialized they are: every
//! tracked capability a family lacks adds one point. Each role goes to the
//! best scoring family, ties resolved in favor of the lowest family index.
//! Reproducibility of that tie-break therefore depends on the driver
//! enumerating queue families in a stable order.

use ash::vk;
use std::fmt;

use super::context::{VulkanError, VulkanResult};

/// Capabilities counted by [`queue_score`]
pub const TRACKED_CAPABILITIES: [vk::QueueFlags; 5] = [
    vk::QueueFlags::GRAPHICS,
    vk::QueueFlags::COMPUTE,
    vk::QueueFlags::PROTECTED,
    vk::QueueFlags::TRANSFER,
    vk::QueueFlags::SPARSE_BINDING,
];

/// Work a queue family can be assigned to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueRole {
    /// Draw commands
    Graphics,
    /// Compute dispatches
    Compute,
    /// Buffer and image copies
    Transfer,
    /// Swapchain presentation
    Present,
}

impl fmt::Display for QueueRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Graphics => "graphics",
            Self::Compute => "compute",
            Self::Transfer => "transfer",
            Self::Present => "present",
        };
        f.write_str(name)
    }
}

/// Queue family chosen for each role
///
/// `present` is `None` when no family can present to the surface, which is
/// the normal case for offscreen rendering. Consumers must check it before
/// creating a present queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueFamilyIndices {
    /// Family used for graphics work
    pub graphics: u32,
    /// Family used for compute work
    pub compute: u32,
    /// Family used for transfers
    pub transfer: u32,
    /// Family used for presentation, if any
    pub present: Option<u32>,
}

impl QueueFamilyIndices {
    /// Family assigned to `role`
    pub fn family(&self, role: QueueRole) -> Option<u32> {
        match role {
            QueueRole::Graphics => Some(self.graphics),
            QueueRole::Compute => Some(self.compute),
            QueueRole::Transfer => Some(self.transfer),
            QueueRole::Present => self.present,
        }
    }

    /// Distinct families across all assigned roles, ascending
    pub fn unique_families(&self) -> Vec<u32> {
        let mut families: Vec<u32> = [self.graphics, self.compute, self.transfer]
            .into_iter()
            .chain(self.present)
            .collect();
        families.sort_unstable();
        families.dedup();
        families
    }
}

impl fmt::Display for QueueFamilyIndices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "graphics: {}, compute: {}, transfer: {}, present: ",
            self.graphics, self.compute, self.transfer
        )?;
        match self.present {
            Some(family) => write!(f, "{family}"),
            None => f.write_str("unassigned"),
        }
    }
}

/// Specialization score of a family for `target`
///
/// `None` when the family lacks `target`; otherwise the number of
/// [`TRACKED_CAPABILITIES`] the family does not have.
pub fn queue_score(flags: vk::QueueFlags, target: vk::QueueFlags) -> Option<u32> {
    if !flags.contains(target) {
        return None;
    }
    let missing = TRACKED_CAPABILITIES
        .iter()
        .filter(|capability| !flags.contains(**capability))
        .count();
    Some(missing as u32)
}

/// Best `(family index, score)` for `target`, lowest index winning ties
pub fn best_family(families: &[vk::QueueFamilyProperties], target: vk::QueueFlags) -> Option<(u32, u32)> {
    families
        .iter()
        .enumerate()
        .filter_map(|(index, family)| {
            queue_score(family.queue_flags, target).map(|score| (index as u32, score))
        })
        .fold(None, |best, candidate| match best {
            Some((_, best_score)) if best_score >= candidate.1 => best,
            _ => Some(candidate),
        })
}

/// How firmly the present role is held during the scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum PresentHold {
    /// First present-capable family seen
    Tentative,
    /// Present-capable family that improved the graphics score
    AlignedWithGraphics,
}

/// Assign a queue family to every role
///
/// `present_support[i]` tells whether family `i` can present; missing entries
/// count as unsupported. Present starts on the first present-capable family
/// and moves once, to the first present-capable family that improves the
/// graphics score while scanning in index order.
pub fn assign_queue_families(
    families: &[vk::QueueFamilyProperties],
    present_support: &[bool],
) -> VulkanResult<QueueFamilyIndices> {
    let mut graphics: Option<(u32, u32)> = None;
    let mut present: Option<(u32, PresentHold)> = None;

    for (index, family) in families.iter().enumerate() {
        let index = index as u32;
        let can_present = present_support.get(index as usize).copied().unwrap_or(false);
        if can_present && present.is_none() {
            present = Some((index, PresentHold::Tentative));
        }

        let Some(score) = queue_score(family.queue_flags, vk::QueueFlags::GRAPHICS) else {
            continue;
        };
        if graphics.map_or(true, |(_, best)| score > best) {
            if can_present && present.map_or(true, |(_, hold)| hold < PresentHold::AlignedWithGraphics) {
                present = Some((index, PresentHold::AlignedWithGraphics));
            }
            graphics = Some((index, score));
        }
    }

    let pick = |role: QueueRole, target: vk::QueueFlags| {
        best_family(families, target)
            .map(|(index, _)| index)
            .ok_or(VulkanError::QueueFamilyUnsatisfied { role })
    };

    let graphics = graphics
        .map(|(index, _)| index)
        .ok_or(VulkanError::QueueFamilyUnsatisfied { role: QueueRole::Graphics })?;
    let compute = pick(QueueRole::Compute, vk::QueueFlags::COMPUTE)?;
    let transfer = pick(QueueRole::Transfer, vk::QueueFlags::TRANSFER)?;

    Ok(QueueFamilyIndices {
        graphics,
        compute,
        transfer,
        present: present.map(|(index, _)| index),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn family(flags: vk::QueueFlags) -> vk::QueueFamilyProperties {
        vk::QueueFamilyProperties {
            queue_flags: flags,
            queue_count: 1,
            ..Default::default()
        }
    }

    const GCT: vk::QueueFlags = vk::QueueFlags::from_raw(
        vk::QueueFlags::GRAPHICS.as_raw()
            | vk::QueueFlags::COMPUTE.as_raw()
            | vk::QueueFlags::TRANSFER.as_raw(),
    );

    #[test]
    fn test_score_is_none_iff_target_absent() {
        for raw in 0..32_u32 {
            let flags = vk::QueueFlags::from_raw(raw);
            for target in TRACKED_CAPABILITIES {
                let score = queue_score(flags, target);
                if flags.contains(target) {
                    let expected = TRACKED_CAPABILITIES
                        .iter()
                        .filter(|c| !flags.contains(**c))
                        .count() as u32;
                    assert_eq!(score, Some(expected));
                    assert!(expected <= 4);
                } else {
                    assert_eq!(score, None);
                }
            }
        }
    }

    #[test]
    fn test_specialized_family_scores_higher() {
        assert_eq!(queue_score(vk::QueueFlags::TRANSFER, vk::QueueFlags::TRANSFER), Some(4));
        assert_eq!(queue_score(GCT, vk::QueueFlags::TRANSFER), Some(2));
        assert_eq!(queue_score(GCT, vk::QueueFlags::SPARSE_BINDING), None);
    }

    #[test]
    fn test_dedicated_transfer_family_wins_transfer() {
        let families = [
            family(GCT),
            family(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE),
            family(vk::QueueFlags::TRANSFER),
        ];
        let indices = assign_queue_families(&families, &[]).unwrap();
        assert_eq!(indices.transfer, 2);
        assert_eq!(indices.graphics, 1);
        assert_eq!(indices.compute, 1);
        assert_eq!(indices.present, None);
    }

    #[test]
    fn test_ties_favor_lowest_index() {
        let families = [family(GCT), family(GCT)];
        assert_eq!(best_family(&families, vk::QueueFlags::GRAPHICS), Some((0, 2)));
    }

    #[test]
    fn test_present_follows_graphics_when_possible() {
        let families = [
            family(vk::QueueFlags::TRANSFER),
            family(GCT),
        ];
        let indices = assign_queue_families(&families, &[true, true]).unwrap();
        assert_eq!(indices.graphics, 1);
        assert_eq!(indices.present, Some(1));
    }

    #[test]
    fn test_present_falls_back_to_first_capable() {
        let families = [
            family(vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER),
            family(GCT),
            family(vk::QueueFlags::TRANSFER),
        ];
        let indices = assign_queue_families(&families, &[false, false, true]).unwrap();
        assert_eq!(indices.graphics, 1);
        assert_eq!(indices.present, Some(2));
    }

    #[test]
    fn test_present_stays_on_graphics_improver_that_can_present() {
        let families = [
            family(vk::QueueFlags::TRANSFER),
            family(GCT),
            family(vk::QueueFlags::GRAPHICS),
        ];
        let indices = assign_queue_families(&families, &[true, true, false]).unwrap();
        assert_eq!(indices.graphics, 2);
        assert_eq!(indices.present, Some(1));
    }

    #[test]
    fn test_present_moves_at_most_once() {
        let families = [family(GCT), family(vk::QueueFlags::GRAPHICS)];
        let indices = assign_queue_families(&families, &[true, true]).unwrap();
        assert_eq!(indices.graphics, 1);
        assert_eq!(indices.present, Some(0));
    }

    #[test]
    fn test_missing_compute_is_fatal() {
        let families = [family(vk::QueueFlags::GRAPHICS | vk::QueueFlags::TRANSFER)];
        let err = assign_queue_families(&families, &[true]).unwrap_err();
        assert!(matches!(
            err,
            VulkanError::QueueFamilyUnsatisfied { role: QueueRole::Compute }
        ));
    }

    #[test]
    fn test_unique_families_skip_unassigned_present() {
        let indices = QueueFamilyIndices {
            graphics: 0,
            compute: 1,
            transfer: 1,
            present: None,
        };
        assert_eq!(indices.unique_families(), vec![0, 1]);
        assert_eq!(indices.family(QueueRole::Present), None);
        assert_eq!(indices.to_string(), "graphics: 0, compute: 1, transfer: 1, present: unassigned");
    }
}
