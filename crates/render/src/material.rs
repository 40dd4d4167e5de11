use std::sync::Arc;

use glam::Vec3;
use minegame_common::BlockCategory;

/// Clear colour behind the terrain, sRGB.
pub const SKY_COLOR: [u8; 3] = [0x87, 0xce, 0xeb];
/// Distance at which fog starts.
pub const FOG_NEAR: f32 = 45.0;
/// Distance at which fog fully hides geometry.
pub const FOG_FAR: f32 = 260.0;

/// Surface description for one block category.
///
/// `base` and `accent` are the two sRGB tones of the pixel pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub category: BlockCategory,
    pub base: [u8; 3],
    pub accent: [u8; 3],
    /// Size of the rendered box in blocks.
    pub extent: Vec3,
}

impl Material {
    pub fn name(&self) -> &'static str {
        self.category.name()
    }

    /// `base` as normalised sRGB.
    pub fn base_rgb(&self) -> [f32; 3] {
        to_unit(self.base)
    }

    pub fn accent_rgb(&self) -> [f32; 3] {
        to_unit(self.accent)
    }
}

/// One shared material per block category.
#[derive(Debug, Clone)]
pub struct MaterialLibrary {
    materials: [Arc<Material>; 5],
}

impl Default for MaterialLibrary {
    fn default() -> Self {
        Self::new()
    }
}

impl MaterialLibrary {
    pub fn new() -> Self {
        let make = |category: BlockCategory, base: [u8; 3], accent: [u8; 3]| {
            Arc::new(Material {
                category,
                base,
                accent,
                extent: category.geometry_extent(),
            })
        };
        Self {
            materials: [
                make(BlockCategory::Ground, [98, 164, 66], [84, 148, 55]),
                make(BlockCategory::Soil, [126, 87, 56], [110, 75, 48]),
                make(BlockCategory::Rock, [133, 133, 133], [117, 117, 117]),
                make(BlockCategory::Trunk, [115, 82, 54], [98, 69, 44]),
                make(BlockCategory::Foliage, [58, 121, 47], [50, 106, 40]),
            ],
        }
    }

    /// The shared material for `category`.
    pub fn get(&self, category: BlockCategory) -> &Arc<Material> {
        &self.materials[category.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Material>> {
        self.materials.iter()
    }
}

fn to_unit(rgb: [u8; 3]) -> [f32; 3] {
    rgb.map(|c| f32::from(c) / 255.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn library_indexes_by_category() {
        let lib = MaterialLibrary::new();
        for category in BlockCategory::ALL {
            assert_eq!(lib.get(category).category, category);
        }
        assert_eq!(lib.iter().count(), 5);
    }

    #[test]
    fn trunk_is_narrower_than_a_block() {
        let lib = MaterialLibrary::new();
        assert_eq!(lib.get(BlockCategory::Trunk).extent, Vec3::new(0.9, 1.0, 0.9));
        assert_eq!(lib.get(BlockCategory::Rock).extent, Vec3::ONE);
    }

    #[test]
    fn colours_normalise() {
        let lib = MaterialLibrary::new();
        let rock = lib.get(BlockCategory::Rock).base_rgb();
        assert!((rock[0] - 133.0 / 255.0).abs() < 1e-6);
        assert_eq!(lib.get(BlockCategory::Ground).name(), BlockCategory::Ground.name());
    }

    #[test]
    fn clones_share_materials() {
        let lib = MaterialLibrary::new();
        let copy = lib.clone();
        assert!(Arc::ptr_eq(
            lib.get(BlockCategory::Foliage),
            copy.get(BlockCategory::Foliage)
        ));
    }
}
