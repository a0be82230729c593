use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use crate::data::model::ElementFamily;

// ---------------------------------------------------------------------------
// Fixed series colours
// ---------------------------------------------------------------------------

/// Horizontal-plane quantity (βx, σx, εx).
pub const PRIMARY_X: Color32 = Color32::from_rgb(31, 119, 180);
/// Vertical-plane quantity, drawn dashed.
pub const PRIMARY_Y: Color32 = Color32::from_rgb(255, 127, 14);
/// Quantity on the secondary (right) axis.
pub const SECONDARY: Color32 = Color32::from_rgb(0, 128, 0);
/// Magnet profile strip.
pub const MAGNET_STRIP: Color32 = Color32::from_rgb(127, 127, 127);

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.45);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Element family → colour
// ---------------------------------------------------------------------------

/// One colour per magnet family for the families view and its legend.
#[derive(Debug, Clone)]
pub struct FamilyColors {
    mapping: BTreeMap<ElementFamily, Color32>,
}

impl Default for FamilyColors {
    fn default() -> Self {
        let mapping = ElementFamily::ALL
            .into_iter()
            .zip(generate_palette(ElementFamily::ALL.len()))
            .collect();
        Self { mapping }
    }
}

impl FamilyColors {
    pub fn color_for(&self, family: ElementFamily) -> Color32 {
        self.mapping
            .get(&family)
            .copied()
            .unwrap_or(MAGNET_STRIP)
    }

    /// Legend entries in family order.
    pub fn legend_entries(&self) -> Vec<(String, Color32)> {
        self.mapping
            .iter()
            .map(|(family, c)| (family.to_string(), *c))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_has_requested_size() {
        assert!(generate_palette(0).is_empty());
        assert_eq!(generate_palette(5).len(), 5);
    }

    #[test]
    fn palette_colours_are_distinct() {
        let colors = generate_palette(5);
        for i in 0..colors.len() {
            for j in i + 1..colors.len() {
                assert_ne!(colors[i], colors[j]);
            }
        }
    }

    #[test]
    fn every_family_has_a_colour() {
        let colors = FamilyColors::default();
        let legend = colors.legend_entries();
        assert_eq!(legend.len(), ElementFamily::ALL.len());
        assert_eq!(legend[0].0, "Quadrupoles");
        for family in ElementFamily::ALL {
            assert_ne!(colors.color_for(family), MAGNET_STRIP);
        }
    }
}
