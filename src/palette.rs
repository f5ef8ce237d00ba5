use std::fmt;
use std::ops::Index;

use image::Rgba;
use itertools::Itertools;

/// Palette of a quantized image, in engine order.
///
/// Position in the palette is the index stored in the quantized pixels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Palette {
    colors: Vec<Rgba<u8>>,
}

impl Palette {
    /// Wraps colors already in index order
    pub fn new(colors: Vec<Rgba<u8>>) -> Self {
        Self { colors }
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Whether the palette has no entries
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Color stored at `index`
    pub fn get(&self, index: u8) -> Option<Rgba<u8>> {
        self.colors.get(usize::from(index)).copied()
    }

    /// Iterates colors in index order
    pub fn iter(&self) -> std::slice::Iter<'_, Rgba<u8>> {
        self.colors.iter()
    }

    /// All colors in index order
    pub fn as_slice(&self) -> &[Rgba<u8>] {
        &self.colors
    }

    /// Takes the colors out
    pub fn into_vec(self) -> Vec<Rgba<u8>> {
        self.colors
    }
}

impl Index<u8> for Palette {
    type Output = Rgba<u8>;

    fn index(&self, index: u8) -> &Rgba<u8> {
        &self.colors[usize::from(index)]
    }
}

impl<'a> IntoIterator for &'a Palette {
    type Item = &'a Rgba<u8>;
    type IntoIter = std::slice::Iter<'a, Rgba<u8>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for Palette {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let color_list = self
            .colors
            .iter()
            .map(|Rgba([r, g, b, a])| format!("#{:02X}{:02X}{:02X}{:02X}", r, g, b, a))
            .join(", ");

        write!(f, "Palette {{ {} }}", color_list)
    }
}
