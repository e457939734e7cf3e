use crate::SimError;
use serde::Serialize;

/// One rectangular tile: the intersection of a row band and a column band.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct TileBounds {
    pub row_band: usize,
    pub col_band: usize,
    pub row: usize,
    pub col: usize,
    pub height: usize,
    pub width: usize,
}

impl TileBounds {
    pub fn contains(&self, row: usize, col: usize) -> bool {
        row >= self.row
            && row < self.row + self.height
            && col >= self.col
            && col < self.col + self.width
    }

    pub fn area(&self) -> usize {
        self.height * self.width
    }
}

/// Splits a `height x width` grid into `workers` row bands and `workers` column bands
/// and hands worker `r` the tile `(i, (i + r) % workers)` of every row band `i`.
///
/// Both axes are always cut into exactly `workers` bands, so a grid narrower than the
/// worker count produces empty bands at the end of that axis.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PartitionPlan {
    height: usize,
    width: usize,
    workers: usize,
    row_sizes: Vec<usize>,
    col_sizes: Vec<usize>,
    row_positions: Vec<usize>,
    col_positions: Vec<usize>,
}

impl PartitionPlan {
    pub fn new(height: usize, width: usize, workers: usize) -> Result<Self, SimError> {
        if workers == 0 {
            return Err(SimError::InvalidSetup(
                "worker count must be greater than zero".to_owned(),
            ));
        }
        if height == 0 || width == 0 {
            return Err(SimError::InvalidSetup(format!(
                "grid must have at least one cell, found {height}x{width}"
            )));
        }

        let row_sizes = band_sizes(height, workers);
        let col_sizes = band_sizes(width, workers);
        let row_positions = prefix_positions(&row_sizes);
        let col_positions = prefix_positions(&col_sizes);
        Ok(Self {
            height,
            width,
            workers,
            row_sizes,
            col_sizes,
            row_positions,
            col_positions,
        })
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn row_sizes(&self) -> &[usize] {
        &self.row_sizes
    }

    pub fn col_sizes(&self) -> &[usize] {
        &self.col_sizes
    }

    pub fn row_positions(&self) -> &[usize] {
        &self.row_positions
    }

    pub fn col_positions(&self) -> &[usize] {
        &self.col_positions
    }

    pub fn col_band_for(&self, rank: usize, row_band: usize) -> usize {
        (row_band + rank) % self.workers
    }

    pub fn owner_of(&self, row_band: usize, col_band: usize) -> usize {
        (col_band + self.workers - row_band) % self.workers
    }

    pub fn tile(&self, rank: usize, row_band: usize) -> TileBounds {
        let col_band = self.col_band_for(rank, row_band);
        TileBounds {
            row_band,
            col_band,
            row: self.row_positions[row_band],
            col: self.col_positions[col_band],
            height: self.row_sizes[row_band],
            width: self.col_sizes[col_band],
        }
    }

    /// The tiles owned by `rank`, in row-band order.
    pub fn tiles_for(&self, rank: usize) -> impl Iterator<Item = TileBounds> + '_ {
        (0..self.workers).map(move |row_band| self.tile(rank, row_band))
    }

    pub fn area_for(&self, rank: usize) -> usize {
        self.tiles_for(rank).map(|tile| tile.area()).sum()
    }

    /// `(rank, row_band)` of the tile holding global cell `(row, col)`.
    pub fn locate(&self, row: usize, col: usize) -> Option<(usize, usize)> {
        let row_band = band_containing(&self.row_positions, &self.row_sizes, row)?;
        let col_band = band_containing(&self.col_positions, &self.col_sizes, col)?;
        Some((self.owner_of(row_band, col_band), row_band))
    }

    pub fn empty_row_bands(&self) -> usize {
        self.row_sizes.iter().filter(|size| **size == 0).count()
    }

    pub fn empty_col_bands(&self) -> usize {
        self.col_sizes.iter().filter(|size| **size == 0).count()
    }

    /// Ring rounds needed for a left-halo value to cross every run of empty column bands.
    pub fn vertical_rounds(&self) -> usize {
        1 + self.empty_col_bands()
    }

    /// Ring rounds needed for a top-halo value to cross every run of empty row bands.
    pub fn horizontal_rounds(&self) -> usize {
        1 + self.empty_row_bands()
    }
}

fn band_sizes(total: usize, workers: usize) -> Vec<usize> {
    let base = total / workers;
    let remainder = total % workers;
    (0..workers)
        .map(|band| base + usize::from(band < remainder))
        .collect()
}

fn prefix_positions(sizes: &[usize]) -> Vec<usize> {
    sizes
        .iter()
        .scan(0, |next, size| {
            let position = *next;
            *next += size;
            Some(position)
        })
        .collect()
}

fn band_containing(positions: &[usize], sizes: &[usize], index: usize) -> Option<usize> {
    let band = positions.partition_point(|position| *position <= index).checked_sub(1)?;
    (index < positions[band] + sizes[band]).then_some(band)
}
