//! Rectangular index-space regions.

use crate::error::{Result, WarpError};

/// Axis-aligned box of voxels, in index order `(x, y, z)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageRegion {
    index: [usize; 3],
    size: [usize; 3],
}

impl ImageRegion {
    /// Create a region starting at `index` with extent `size`.
    pub fn new(index: [usize; 3], size: [usize; 3]) -> Self {
        Self { index, size }
    }

    /// Region covering a whole image of the given `(x, y, z)` size.
    pub fn largest_possible(size: [usize; 3]) -> Self {
        Self::new([0, 0, 0], size)
    }

    /// Parse `x,y,z,sx,sy,sz`.
    pub fn parse(text: &str) -> Result<Self> {
        let values = text
            .split(',')
            .map(|part| part.trim().parse::<usize>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| WarpError::invalid_region(format!("'{text}': {e}")))?;
        match values.as_slice() {
            [x, y, z, sx, sy, sz] => Ok(Self::new([*x, *y, *z], [*sx, *sy, *sz])),
            _ => Err(WarpError::invalid_region(format!(
                "'{text}': expected 6 comma-separated values, found {}",
                values.len()
            ))),
        }
    }

    pub fn index(&self) -> [usize; 3] {
        self.index
    }

    pub fn size(&self) -> [usize; 3] {
        self.size
    }

    /// Number of voxels in the region.
    pub fn num_voxels(&self) -> usize {
        self.size.iter().product()
    }

    /// Check the region lies inside an image of `(x, y, z)` size `image_size`.
    pub fn validate(&self, image_size: [usize; 3]) -> Result<()> {
        for axis in 0..3 {
            let end = self.index[axis].checked_add(self.size[axis]);
            if end.map_or(true, |end| end > image_size[axis]) {
                return Err(WarpError::invalid_region(format!(
                    "region {:?}+{:?} exceeds image size {:?} along axis {axis}",
                    self.index, self.size, image_size
                )));
            }
        }
        Ok(())
    }
}
