//! # Terrain Map

// ------------------------------------------------------------------------------------------------
// INCLUDES
// ------------------------------------------------------------------------------------------------

use std::ops::Range;

use ndarray::Array2;
use ndarray_stats::QuantileExt;
use noise::{NoiseFn, Perlin};

use super::{GridPoint, MapError};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Terrain Map
///
/// Holds the elevation of every cell and the accumulated non-elevation cost of entering it. Both
/// grids always share the same, non-empty, shape.
#[derive(Clone, Debug)]
pub struct TerrainMap {
    elevation: Array2<f32>,

    extra_cost: Array2<f32>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TerrainMap {
    /// Create a new terrain map from an elevation grid and an extra cost grid of the same shape.
    pub fn new(elevation: Array2<f32>, extra_cost: Array2<f32>) -> Result<Self, MapError> {
        if elevation.is_empty() {
            return Err(MapError::Empty);
        }

        if elevation.dim() != extra_cost.dim() {
            return Err(MapError::ShapeMismatch(
                "extra cost grid".into(),
                elevation.dim(),
                extra_cost.dim(),
            ));
        }

        Ok(Self {
            elevation,
            extra_cost,
        })
    }

    /// Create a terrain map with no extra cost on any cell.
    pub fn from_elevation(elevation: Array2<f32>) -> Result<Self, MapError> {
        let extra_cost = Array2::zeros(elevation.dim());
        Self::new(elevation, extra_cost)
    }

    /// Generate a random terrain map using a Perlin noise system.
    ///
    /// `amplitude` scales the noise (which lies roughly in `[-1, 1]`) into elevation units.
    pub fn generate_random(
        num_cells: (usize, usize),
        perlin_scale: (f64, f64),
        perlin_offset: (f64, f64),
        amplitude: f64,
    ) -> Result<Self, MapError> {
        let perlin = Perlin::new();

        let (width, height) = num_cells;
        let elevation = Array2::from_shape_fn((height, width), |(y, x)| {
            let sample = perlin.get([
                x as f64 * perlin_scale.0 + perlin_offset.0,
                y as f64 * perlin_scale.1 + perlin_offset.1,
            ]);

            (sample * amplitude) as f32
        });

        Self::from_elevation(elevation)
    }

    /// Number of columns in the map.
    pub fn width(&self) -> usize {
        self.elevation.ncols()
    }

    /// Number of rows in the map.
    pub fn height(&self) -> usize {
        self.elevation.nrows()
    }

    /// Shape of the map as `(rows, cols)`, matching `ndarray`'s `dim()`.
    pub fn dim(&self) -> (usize, usize) {
        self.elevation.dim()
    }

    /// Returns true if the point lies inside the map.
    pub fn in_bounds(&self, point: GridPoint) -> bool {
        point.x > -1
            && point.y > -1
            && point.x < self.width() as i64
            && point.y < self.height() as i64
    }

    /// Elevation at the given point, or `None` if it is outside the map.
    pub fn elevation(&self, point: GridPoint) -> Option<f32> {
        if self.in_bounds(point) {
            Some(self.elevation[Self::index(point)])
        } else {
            None
        }
    }

    /// Absolute elevation difference between `a` and `b`, expressed in cells.
    ///
    /// Both points must be inside the map, and `units_per_pixel` must be non-zero (see
    /// [`crate::nav::Weights::validate`]).
    pub fn scaled_height(&self, a: GridPoint, b: GridPoint, units_per_pixel: f64) -> f64 {
        debug_assert!(self.in_bounds(a) && self.in_bounds(b));

        let delta = self.elevation[Self::index(b)] as f64 - self.elevation[Self::index(a)] as f64;

        delta.abs() / units_per_pixel
    }

    /// Accumulated extra cost of entering the given point. The point must be inside the map.
    pub fn extra_cost(&self, point: GridPoint) -> f64 {
        debug_assert!(self.in_bounds(point));

        self.extra_cost[Self::index(point)] as f64
    }

    /// The 8-connected neighbours of `point` which lie inside the map.
    ///
    /// Neighbours are produced column by column, i.e. `x` in `-1..=1` outermost and `y` in
    /// `-1..=1` innermost.
    pub fn neighbours(&self, point: GridPoint) -> impl Iterator<Item = GridPoint> + '_ {
        (-1..=1)
            .flat_map(move |dx| (-1..=1).map(move |dy| point.offset(dx, dy)))
            .filter(move |&n| n != point && self.in_bounds(n))
    }

    /// Returns the range of elevation in the terrain.
    pub fn range(&self) -> Result<Range<f32>, MapError> {
        let min = *self.elevation.min()?;
        let max = *self.elevation.max()?;

        Ok(min..max)
    }

    /// Convert a point into an `ndarray` index. Callers must check bounds first.
    fn index(point: GridPoint) -> [usize; 2] {
        [point.y as usize, point.x as usize]
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use ndarray::arr2;

    fn ramp(width: usize, height: usize) -> TerrainMap {
        TerrainMap::from_elevation(Array2::from_shape_fn((height, width), |(y, x)| {
            (x * 2 + y * 3) as f32
        }))
        .unwrap()
    }

    #[test]
    fn test_in_bounds() {
        let map = ramp(7, 4);

        for x in -3..10 {
            for y in -3..8 {
                let expected = 0 <= x && x < 7 && 0 <= y && y < 4;
                assert_eq!(
                    map.in_bounds(GridPoint::new(x, y)),
                    expected,
                    "in_bounds mismatch at ({}, {})",
                    x,
                    y
                );
            }
        }

        // Exact edges
        assert!(map.in_bounds(GridPoint::new(0, 0)));
        assert!(map.in_bounds(GridPoint::new(6, 3)));
        assert!(!map.in_bounds(GridPoint::new(-1, 0)));
        assert!(!map.in_bounds(GridPoint::new(0, -1)));
        assert!(!map.in_bounds(GridPoint::new(7, 0)));
        assert!(!map.in_bounds(GridPoint::new(0, 4)));
    }

    #[test]
    fn test_scaled_height() {
        let map = TerrainMap::from_elevation(arr2(&[[0.0, 4.0, 4.0], [10.0, 2.0, 4.0]])).unwrap();
        let a = GridPoint::new(0, 0);
        let b = GridPoint::new(1, 0);
        let c = GridPoint::new(2, 0);
        let d = GridPoint::new(0, 1);

        assert_eq!(map.scaled_height(a, b, 1.0), 4.0);
        assert_eq!(map.scaled_height(a, b, 2.0), 2.0);
        assert_eq!(map.scaled_height(a, d, 0.5), 20.0);

        // Symmetry
        for &(p, q) in &[(a, b), (b, d), (d, c), (a, c)] {
            assert_eq!(map.scaled_height(p, q, 3.0), map.scaled_height(q, p, 3.0));
        }

        // Equal elevation
        assert_eq!(map.scaled_height(b, c, 1.0), 0.0);
        assert_eq!(map.scaled_height(c, GridPoint::new(2, 1), 7.5), 0.0);
    }

    #[test]
    fn test_new_shape_checks() {
        assert!(matches!(
            TerrainMap::new(Array2::zeros((3, 4)), Array2::zeros((4, 3))),
            Err(MapError::ShapeMismatch(_, (3, 4), (4, 3)))
        ));
        assert!(matches!(
            TerrainMap::from_elevation(Array2::zeros((0, 4))),
            Err(MapError::Empty)
        ));

        let map = TerrainMap::new(Array2::zeros((3, 4)), Array2::from_elem((3, 4), 2.5)).unwrap();
        assert_eq!(map.width(), 4);
        assert_eq!(map.height(), 3);
        assert_eq!(map.extra_cost(GridPoint::new(3, 2)), 2.5);
        assert_eq!(map.elevation(GridPoint::new(4, 2)), None);
    }

    #[test]
    fn test_neighbours() {
        let map = ramp(5, 5);

        let inner: Vec<_> = map.neighbours(GridPoint::new(2, 2)).collect();
        assert_eq!(inner.len(), 8);
        assert_eq!(inner[0], GridPoint::new(1, 1));
        assert_eq!(inner[1], GridPoint::new(1, 2));
        assert_eq!(inner[7], GridPoint::new(3, 3));
        assert!(!inner.contains(&GridPoint::new(2, 2)));

        // Corners and edges never produce points outside the map
        let corner: Vec<_> = map.neighbours(GridPoint::new(0, 0)).collect();
        assert_eq!(
            corner,
            vec![
                GridPoint::new(0, 1),
                GridPoint::new(1, 0),
                GridPoint::new(1, 1)
            ]
        );
        assert_eq!(map.neighbours(GridPoint::new(4, 4)).count(), 3);
        assert_eq!(map.neighbours(GridPoint::new(4, 2)).count(), 5);

        // Single cell map has no neighbours at all
        let single = TerrainMap::from_elevation(Array2::zeros((1, 1))).unwrap();
        assert_eq!(single.neighbours(GridPoint::new(0, 0)).count(), 0);
    }

    #[test]
    fn test_range() -> Result<(), MapError> {
        assert_eq!(ramp(4, 3).range()?, 0.0..12.0);

        let random = TerrainMap::generate_random((20, 10), (0.1, 0.1), (0.0, 0.0), 50.0)?;
        assert_eq!(random.dim(), (10, 20));
        let range = random.range()?;
        assert!(range.start >= -100.0 && range.end <= 100.0);

        Ok(())
    }
}
