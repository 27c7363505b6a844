use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::error::RouteError;
use crate::terrain::{TerrainColor, TerrainPalette};

/// Supertrait that collects all the requirements on the NodeReference values
/// Must be copy, comparable and not references (hence 'static)
pub trait NodeReference: Copy + Eq + 'static {}

pub trait MapTrait {
    /// The type that can be used to reference nodes in the map
    type Reference: NodeReference;

    /// The type that the map uses for storage
    type Storage<T: Default + Copy + Clone + 'static>: MapStorage<T, Reference = Self::Reference>;

    /// Check if the provided node reference is valid
    fn is_valid(&self, node: Self::Reference) -> bool;

    /// Return an iterator over the nodes reachable in one move from the provided node
    fn neighbors_of(&self, node: Self::Reference) -> impl Iterator<Item = Self::Reference>;

    /// Create a storage for values of type T
    fn create_storage<T: Default + Copy + Clone + 'static>(&self) -> Self::Storage<T>;
}

pub trait MapStorage<T> {
    type Reference: NodeReference;

    fn is_valid(&self, node: Self::Reference) -> bool;
    fn get(&self, node: Self::Reference) -> T;
    fn get_mut(&mut self, node: Self::Reference) -> &mut T;

    /// Reset every cell back to its default value
    fn clear(&mut self);
}

/// A cell on the map, `x` is the column and `y` the row.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: usize,
    pub y: usize,
}

impl Point {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

impl NodeReference for Point {}

impl Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A MapStorage backed by one row-major vec covering the whole grid
#[derive(Debug, Clone)]
pub struct CellStorage<T> {
    width: usize,
    height: usize,
    cells: Vec<T>,
}

impl<T: Default + Clone> CellStorage<T> {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![T::default(); width * height],
        }
    }
}

impl<T> CellStorage<T> {
    fn index(&self, node: Point) -> usize {
        node.y * self.width + node.x
    }

    /// Number of cells covered
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl<T: Default + Copy + 'static> MapStorage<T> for CellStorage<T> {
    type Reference = Point;

    fn is_valid(&self, node: Self::Reference) -> bool {
        node.x < self.width && node.y < self.height
    }

    fn get(&self, node: Self::Reference) -> T {
        self.cells[self.index(node)]
    }

    fn get_mut(&mut self, node: Self::Reference) -> &mut T {
        let index = self.index(node);
        &mut self.cells[index]
    }

    fn clear(&mut self) {
        self.cells.fill(T::default());
    }
}

/// Immutable elevation samples, one per cell.
#[derive(Debug, Clone, PartialEq)]
pub struct ElevationGrid {
    width: usize,
    height: usize,
    values: Vec<f64>,
}

impl ElevationGrid {
    /// Build a grid from rows of samples; every row must be `width` long.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Option<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|row| row.len() != width) {
            return None;
        }

        Some(Self {
            width,
            height,
            values: rows.into_iter().flatten().collect(),
        })
    }

    /// A grid where every cell has the same elevation
    pub fn flat(width: usize, height: usize, elevation: f64) -> Self {
        Self {
            width,
            height,
            values: vec![elevation; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, point: Point) -> f64 {
        self.values[point.y * self.width + point.x]
    }

    pub fn set(&mut self, point: Point, elevation: f64) {
        self.values[point.y * self.width + point.x] = elevation;
    }
}

/// Immutable terrain color codes, one per cell, as read from the raster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerrainGrid {
    width: usize,
    height: usize,
    colors: Vec<TerrainColor>,
}

impl TerrainGrid {
    pub fn filled(width: usize, height: usize, color: TerrainColor) -> Self {
        Self {
            width,
            height,
            colors: vec![color; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, point: Point) -> TerrainColor {
        self.colors[point.y * self.width + point.x]
    }

    pub fn set(&mut self, point: Point, color: TerrainColor) {
        self.colors[point.y * self.width + point.x] = color;
    }
}

/// The read-only inputs shared by every segment search of one run.
#[derive(Debug, Clone)]
pub struct TerrainMap {
    pub elevation: ElevationGrid,
    pub terrain: TerrainGrid,
    pub palette: TerrainPalette,
}

impl TerrainMap {
    pub fn new(elevation: ElevationGrid, terrain: TerrainGrid) -> Result<Self, RouteError> {
        let e = (elevation.width(), elevation.height());
        let t = (terrain.width(), terrain.height());
        if e != t {
            return Err(RouteError::DimensionMismatch {
                elevation: e,
                terrain: t,
            });
        }

        Ok(Self {
            elevation,
            terrain,
            palette: TerrainPalette::default(),
        })
    }

    pub fn width(&self) -> usize {
        self.terrain.width()
    }

    pub fn height(&self) -> usize {
        self.terrain.height()
    }

    pub fn elevation_at(&self, point: Point) -> f64 {
        self.elevation.get(point)
    }

    pub fn color_at(&self, point: Point) -> TerrainColor {
        self.terrain.get(point)
    }

    /// Walkability of the cell, failing on colors missing from the palette
    pub fn is_walkable(&self, point: Point) -> Result<bool, RouteError> {
        self.palette
            .is_walkable(self.color_at(point))
            .ok_or(RouteError::UnknownTerrainClass {
                at: point,
                color: self.color_at(point),
            })
    }

    pub fn is_water(&self, point: Point) -> bool {
        self.palette.is_water(self.color_at(point))
    }
}

impl MapTrait for TerrainMap {
    type Reference = Point;
    type Storage<T: Default + Copy + Clone + 'static> = CellStorage<T>;

    fn is_valid(&self, node: Self::Reference) -> bool {
        node.x < self.width() && node.y < self.height()
    }

    /// The in-bounds axis-aligned neighbors, walkable or not
    fn neighbors_of(&self, node: Self::Reference) -> impl Iterator<Item = Self::Reference> {
        let mut points = Vec::with_capacity(4);

        if node.x > 0 {
            points.push(Point {
                x: node.x - 1,
                y: node.y,
            });
        }
        if node.x + 1 < self.width() {
            points.push(Point {
                x: node.x + 1,
                y: node.y,
            });
        }
        if node.y > 0 {
            points.push(Point {
                x: node.x,
                y: node.y - 1,
            });
        }
        if node.y + 1 < self.height() {
            points.push(Point {
                x: node.x,
                y: node.y + 1,
            });
        }

        points.into_iter()
    }

    fn create_storage<T: Default + Copy + Clone + 'static>(&self) -> Self::Storage<T> {
        CellStorage::new(self.width(), self.height())
    }
}
