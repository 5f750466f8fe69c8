use itertools::iproduct;
use static_assertions::const_assert_eq;
use std::fmt;
use std::ops::{Add, Sub};

/// Tiles per side of a [`Region`](crate::Region).
pub const REGION_SIZE: i32 = 50;
pub const REGION_AREA: usize = (REGION_SIZE * REGION_SIZE) as usize;

const_assert_eq!(REGION_AREA, 2500);

/// Cost of one orthogonal step.
pub const STRAIGHT_COST: u32 = 10;
/// Cost of one diagonal step, `10 * sqrt(2)` rounded down.
pub const DIAGONAL_COST: u32 = 14;

/// A tile coordinate.
///
/// Global positions are unbounded and signed. The same type also carries positions local to a region, in
/// `0..REGION_SIZE` on both axes.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct TilePosition {
    pub x: i32,
    pub z: i32,
}

impl TilePosition {
    pub const ZERO: Self = Self { x: 0, z: 0 };

    #[inline]
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// The region that owns this global position.
    ///
    /// Floor division, so `(-1, -1)` lands in region `(-1, -1)`. Defined over the whole `i32` range.
    #[inline]
    pub fn parent_region_position(self) -> RegionPosition {
        RegionPosition::new(self.x.div_euclid(REGION_SIZE), self.z.div_euclid(REGION_SIZE))
    }

    /// Octile distance in [`STRAIGHT_COST`] and [`DIAGONAL_COST`] units, saturating at `u32::MAX`.
    #[inline]
    pub fn distance(self, other: Self) -> u32 {
        let dx = u64::from(self.x.abs_diff(other.x));
        let dz = u64::from(self.z.abs_diff(other.z));
        let (short, long) = if dx < dz { (dx, dz) } else { (dz, dx) };
        let cost = u64::from(DIAGONAL_COST) * short + u64::from(STRAIGHT_COST) * (long - short);
        u32::try_from(cost).unwrap_or(u32::MAX)
    }

    #[inline]
    pub fn min(self, other: Self) -> Self {
        Self::new(self.x.min(other.x), self.z.min(other.z))
    }

    #[inline]
    pub fn max(self, other: Self) -> Self {
        Self::new(self.x.max(other.x), self.z.max(other.z))
    }

    /// The 8-connected neighborhood, row by row.
    ///
    /// Coordinates saturate at the `i32` extremes, so a position on the edge of the range lists itself or a duplicate
    /// in place of the neighbors that don't exist.
    pub fn neighbors(self) -> [Self; 8] {
        let Self { x, z } = self;
        let (left, right) = (x.saturating_sub(1), x.saturating_add(1));
        let (down, up) = (z.saturating_sub(1), z.saturating_add(1));
        [
            Self::new(left, down),
            Self::new(left, z),
            Self::new(left, up),
            Self::new(x, down),
            Self::new(x, up),
            Self::new(right, down),
            Self::new(right, z),
            Self::new(right, up),
        ]
    }

    /// Index into a region's tile array. Only meaningful for local positions.
    #[inline]
    pub(crate) fn local_index(self) -> usize {
        debug_assert!(is_local(self), "{:?} is not a local position", self);
        (self.x * REGION_SIZE + self.z) as usize
    }
}

#[inline]
pub(crate) fn is_local(p: TilePosition) -> bool {
    (0..REGION_SIZE).contains(&p.x) && (0..REGION_SIZE).contains(&p.z)
}

impl Add for TilePosition {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.z + rhs.z)
    }
}

impl Sub for TilePosition {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.z - rhs.z)
    }
}

impl fmt::Display for TilePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

impl From<(i32, i32)> for TilePosition {
    #[inline]
    fn from((x, z): (i32, i32)) -> Self {
        Self::new(x, z)
    }
}

/// Identifies one region. Region `(rx, rz)` covers global tiles `rx * REGION_SIZE ..` on each axis.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct RegionPosition {
    pub x: i32,
    pub z: i32,
}

impl RegionPosition {
    #[inline]
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// The global position of this region's local tile `(0, 0)`.
    ///
    /// The regions at the very ends of the `i32` range reach past it; their conversions wrap, so round trips stay
    /// exact for every position that exists.
    #[inline]
    pub fn min_tile(self) -> TilePosition {
        TilePosition::new(self.x.wrapping_mul(REGION_SIZE), self.z.wrapping_mul(REGION_SIZE))
    }

    #[inline]
    pub fn local_tile_position(self, global: TilePosition) -> TilePosition {
        let min = self.min_tile();
        TilePosition::new(global.x.wrapping_sub(min.x), global.z.wrapping_sub(min.z))
    }

    #[inline]
    pub fn global_tile_position(self, local: TilePosition) -> TilePosition {
        let min = self.min_tile();
        TilePosition::new(local.x.wrapping_add(min.x), local.z.wrapping_add(min.z))
    }

    #[inline]
    pub fn global_tile_position_xz(self, x: i32, z: i32) -> TilePosition {
        self.global_tile_position(TilePosition::new(x, z))
    }

    #[inline]
    pub fn contains(self, global: TilePosition) -> bool {
        global.parent_region_position() == self
    }

    /// Every local position, x outer and z inner. This is also the order of region files.
    pub fn local_tile_positions() -> impl Iterator<Item = TilePosition> {
        iproduct!(0..REGION_SIZE, 0..REGION_SIZE).map(|(x, z)| TilePosition::new(x, z))
    }

    /// Every global position in this region, in [`RegionPosition::local_tile_positions`] order.
    pub fn tile_positions(self) -> impl Iterator<Item = TilePosition> {
        Self::local_tile_positions().map(move |local| self.global_tile_position(local))
    }
}

impl fmt::Display for RegionPosition {
    /// Also the stem of the region's file name.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.z)
    }
}

impl std::str::FromStr for RegionPosition {
    type Err = String;

    /// Parses the `X,Z` form written by [`Display`](fmt::Display).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (x, z) = s.split_once(',').ok_or_else(|| format!("expected X,Z but got {:?}", s))?;
        let parse = |c: &str| c.trim().parse::<i32>().map_err(|e| format!("bad coordinate {:?}: {}", c, e));
        Ok(Self::new(parse(x)?, parse(z)?))
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
