// Core types shared across the navigation engine.
//
// Defines block-grid coordinates (`Vec3i`), continuous positions (`Vec3d`),
// block faces, and the direction vocabulary the movement templates are
// written in: cardinal sky directions, the eight horizontal movement
// directions, parkour directions, height modifiers, diagonal sides and body
// parts. `ActionDirection` tags every graph edge so the searcher can feed it
// back as the incoming direction of the next expansion.
//
// `Vec3i` is the graph node identity and the key of every subscription
// table, so its `Hash` impl writes a single packed `u64` instead of three
// separate integers.
//
// See also: `action.rs` for the templates built from these directions,
// `graph.rs` for the per-query expansion keyed by `Vec3i` offsets,
// `collision.rs` for the tables indexed by `MovementDirection` and
// `BodyPart`.
//
// **Critical constraint: determinism.** Every enum exposes a fixed `ALL`
// ordering; template registration iterates these arrays, and that order
// decides subscription tie-breaking.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

// ---------------------------------------------------------------------------
// Block-grid coordinates
// ---------------------------------------------------------------------------

/// A position in the block grid (or a relative offset between two).
///
/// Minecraft conventions:
/// - X: east  (positive) / west  (negative)
/// - Y: up    (positive) / down  (negative)
/// - Z: south (positive) / north (negative)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Vec3i {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Vec3i {
    pub const ZERO: Vec3i = Vec3i::new(0, 0, 0);

    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub const fn add(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    pub const fn sub(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x - dx, self.y - dy, self.z - dz)
    }

    /// Component-wise sum, used to turn a relative offset into an absolute
    /// block position.
    pub const fn plus(self, other: Vec3i) -> Self {
        self.add(other.x, other.y, other.z)
    }

    pub const fn minus(self, other: Vec3i) -> Self {
        self.sub(other.x, other.y, other.z)
    }

    /// Pack into 64 bits: 26 bits X, 26 bits Z, 12 bits Y (the same layout
    /// the game uses for block positions). Distinct in-world positions never
    /// collide; coordinates outside that range wrap.
    pub const fn packed(self) -> u64 {
        (((self.x as i64) & 0x3FF_FFFF) << 38) as u64
            | (((self.z as i64) & 0x3FF_FFFF) << 12) as u64
            | ((self.y as i64) & 0xFFF) as u64
    }

    /// Euclidean distance between block corners.
    pub fn distance(self, other: Self) -> f64 {
        let dx = f64::from(self.x - other.x);
        let dy = f64::from(self.y - other.y);
        let dz = f64::from(self.z - other.z);
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    pub fn manhattan_distance(self, other: Self) -> u32 {
        (self.x - other.x).unsigned_abs()
            + (self.y - other.y).unsigned_abs()
            + (self.z - other.z).unsigned_abs()
    }

    /// Floor a continuous position to the block containing it.
    pub fn from_position(pos: Vec3d) -> Self {
        Self::new(
            pos.x.floor() as i32,
            pos.y.floor() as i32,
            pos.z.floor() as i32,
        )
    }

    /// The centre of the block's bottom face.
    pub fn bottom_center(self) -> Vec3d {
        Vec3d::new(
            f64::from(self.x) + 0.5,
            f64::from(self.y),
            f64::from(self.z) + 0.5,
        )
    }
}

impl Hash for Vec3i {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.packed());
    }
}

impl fmt::Display for Vec3i {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

// ---------------------------------------------------------------------------
// Continuous positions
// ---------------------------------------------------------------------------

/// A continuous world position (entity feet, eye point, aim target).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3d {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3d {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn offset(self, dx: f64, dy: f64, dz: f64) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    pub fn distance(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    pub fn horizontal_distance(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dz = self.z - other.z;
        (dx * dx + dz * dz).sqrt()
    }

    /// Yaw/pitch (degrees, game convention: yaw 0 faces +Z, pitch positive
    /// looks down) needed to look from `self` at `target`.
    pub fn rotation_towards(self, target: Self) -> (f32, f32) {
        let dx = target.x - self.x;
        let dy = target.y - self.y;
        let dz = target.z - self.z;
        let horizontal = (dx * dx + dz * dz).sqrt();
        let yaw = dz.atan2(dx).to_degrees() - 90.0;
        let pitch = -dy.atan2(horizontal).to_degrees();
        (wrap_degrees(yaw as f32), pitch as f32)
    }
}

/// Wrap an angle into `[-180, 180)`.
pub fn wrap_degrees(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(360.0);
    if wrapped >= 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

// ---------------------------------------------------------------------------
// Faces and directions
// ---------------------------------------------------------------------------

/// One of the six faces of a block. Used as the dig side hint for breaking
/// and as the face to click when placing against a neighbor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockFace {
    Top,
    Bottom,
    North,
    South,
    East,
    West,
}

impl BlockFace {
    /// The middle point of this face on the block at `pos`.
    pub fn middle_of_face(self, pos: Vec3i) -> Vec3d {
        let base = Vec3d::new(f64::from(pos.x), f64::from(pos.y), f64::from(pos.z));
        match self {
            BlockFace::Top => base.offset(0.5, 1.0, 0.5),
            BlockFace::Bottom => base.offset(0.5, 0.0, 0.5),
            BlockFace::North => base.offset(0.5, 0.5, 0.0),
            BlockFace::South => base.offset(0.5, 0.5, 1.0),
            BlockFace::East => base.offset(1.0, 0.5, 0.5),
            BlockFace::West => base.offset(0.0, 0.5, 0.5),
        }
    }

    /// The neighbor of `pos` across this face.
    pub const fn offset(self, pos: Vec3i) -> Vec3i {
        match self {
            BlockFace::Top => pos.add(0, 1, 0),
            BlockFace::Bottom => pos.sub(0, 1, 0),
            BlockFace::North => pos.sub(0, 0, 1),
            BlockFace::South => pos.add(0, 0, 1),
            BlockFace::East => pos.add(1, 0, 0),
            BlockFace::West => pos.sub(1, 0, 0),
        }
    }
}

/// The four cardinal directions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkyDirection {
    North,
    South,
    East,
    West,
}

impl SkyDirection {
    pub const ALL: [SkyDirection; 4] = [
        SkyDirection::North,
        SkyDirection::South,
        SkyDirection::East,
        SkyDirection::West,
    ];

    pub const fn offset(self, pos: Vec3i) -> Vec3i {
        match self {
            SkyDirection::North => pos.add(0, 0, -1),
            SkyDirection::South => pos.add(0, 0, 1),
            SkyDirection::East => pos.add(1, 0, 0),
            SkyDirection::West => pos.add(-1, 0, 0),
        }
    }

    pub const fn opposite(self) -> Self {
        match self {
            SkyDirection::North => SkyDirection::South,
            SkyDirection::South => SkyDirection::North,
            SkyDirection::East => SkyDirection::West,
            SkyDirection::West => SkyDirection::East,
        }
    }

    /// The direction on the left hand when facing `self`.
    pub const fn left_side(self) -> Self {
        match self {
            SkyDirection::North => SkyDirection::West,
            SkyDirection::South => SkyDirection::East,
            SkyDirection::East => SkyDirection::North,
            SkyDirection::West => SkyDirection::South,
        }
    }

    pub const fn right_side(self) -> Self {
        self.left_side().opposite()
    }

    pub const fn to_block_face(self) -> BlockFace {
        match self {
            SkyDirection::North => BlockFace::North,
            SkyDirection::South => BlockFace::South,
            SkyDirection::East => BlockFace::East,
            SkyDirection::West => BlockFace::West,
        }
    }
}

/// The eight horizontal movement directions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementDirection {
    North,
    South,
    East,
    West,
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
}

impl MovementDirection {
    pub const ALL: [MovementDirection; 8] = [
        MovementDirection::North,
        MovementDirection::South,
        MovementDirection::East,
        MovementDirection::West,
        MovementDirection::NorthEast,
        MovementDirection::NorthWest,
        MovementDirection::SouthEast,
        MovementDirection::SouthWest,
    ];

    /// Position in `ALL`; the simple collision table is indexed by it.
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn is_diagonal(self) -> bool {
        matches!(
            self,
            MovementDirection::NorthEast
                | MovementDirection::NorthWest
                | MovementDirection::SouthEast
                | MovementDirection::SouthWest
        )
    }

    /// Index among the four diagonals (0..4), `None` for straight moves.
    pub const fn diagonal_index(self) -> Option<usize> {
        match self {
            MovementDirection::NorthEast => Some(0),
            MovementDirection::NorthWest => Some(1),
            MovementDirection::SouthEast => Some(2),
            MovementDirection::SouthWest => Some(3),
            _ => None,
        }
    }

    pub const fn delta(self) -> (i32, i32) {
        match self {
            MovementDirection::North => (0, -1),
            MovementDirection::South => (0, 1),
            MovementDirection::East => (1, 0),
            MovementDirection::West => (-1, 0),
            MovementDirection::NorthEast => (1, -1),
            MovementDirection::NorthWest => (-1, -1),
            MovementDirection::SouthEast => (1, 1),
            MovementDirection::SouthWest => (-1, 1),
        }
    }

    pub const fn offset(self, pos: Vec3i) -> Vec3i {
        let (dx, dz) = self.delta();
        pos.add(dx, 0, dz)
    }

    pub const fn opposite(self) -> Self {
        match self {
            MovementDirection::North => MovementDirection::South,
            MovementDirection::South => MovementDirection::North,
            MovementDirection::East => MovementDirection::West,
            MovementDirection::West => MovementDirection::East,
            MovementDirection::NorthEast => MovementDirection::SouthWest,
            MovementDirection::NorthWest => MovementDirection::SouthEast,
            MovementDirection::SouthEast => MovementDirection::NorthWest,
            MovementDirection::SouthWest => MovementDirection::NorthEast,
        }
    }

    /// The cardinal direction of a straight move.
    pub const fn to_sky(self) -> Option<SkyDirection> {
        match self {
            MovementDirection::North => Some(SkyDirection::North),
            MovementDirection::South => Some(SkyDirection::South),
            MovementDirection::East => Some(SkyDirection::East),
            MovementDirection::West => Some(SkyDirection::West),
            _ => None,
        }
    }

    /// The cardinal direction of the corner a diagonal move passes on
    /// `side`. `None` for straight moves.
    pub const fn corner(self, side: MovementSide) -> Option<SkyDirection> {
        let (left, right) = match self {
            MovementDirection::NorthEast => (SkyDirection::North, SkyDirection::East),
            MovementDirection::NorthWest => (SkyDirection::North, SkyDirection::West),
            MovementDirection::SouthEast => (SkyDirection::South, SkyDirection::East),
            MovementDirection::SouthWest => (SkyDirection::South, SkyDirection::West),
            _ => return None,
        };
        match side {
            MovementSide::Left => Some(left),
            MovementSide::Right => Some(right),
        }
    }
}

/// Directions a gap jump can take. Diagonal gap jumps are not modelled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParkourDirection {
    North,
    South,
    East,
    West,
}

impl ParkourDirection {
    pub const ALL: [ParkourDirection; 4] = [
        ParkourDirection::North,
        ParkourDirection::South,
        ParkourDirection::East,
        ParkourDirection::West,
    ];

    pub const fn to_sky(self) -> SkyDirection {
        match self {
            ParkourDirection::North => SkyDirection::North,
            ParkourDirection::South => SkyDirection::South,
            ParkourDirection::East => SkyDirection::East,
            ParkourDirection::West => SkyDirection::West,
        }
    }

    pub const fn to_movement(self) -> MovementDirection {
        match self {
            ParkourDirection::North => MovementDirection::North,
            ParkourDirection::South => MovementDirection::South,
            ParkourDirection::East => MovementDirection::East,
            ParkourDirection::West => MovementDirection::West,
        }
    }

    pub const fn offset(self, pos: Vec3i) -> Vec3i {
        self.to_sky().offset(pos)
    }
}

/// Height change applied on top of a horizontal move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementModifier {
    Normal,
    Fall1,
    Fall2,
    Fall3,
    JumpUpBlock,
}

impl MovementModifier {
    pub const ALL: [MovementModifier; 5] = [
        MovementModifier::Normal,
        MovementModifier::Fall1,
        MovementModifier::Fall2,
        MovementModifier::Fall3,
        MovementModifier::JumpUpBlock,
    ];

    /// Shift `pos` by the height change of this modifier.
    pub const fn offset(self, pos: Vec3i) -> Vec3i {
        match self {
            MovementModifier::Normal => pos,
            MovementModifier::Fall1 => pos.sub(0, 1, 0),
            MovementModifier::Fall2 => pos.sub(0, 2, 0),
            MovementModifier::Fall3 => pos.sub(0, 3, 0),
            MovementModifier::JumpUpBlock => pos.add(0, 1, 0),
        }
    }

    /// Shift only for the jump modifier; falls happen after the horizontal
    /// part of the move, so edge blocks stay at the starting height.
    pub const fn offset_if_jump(self, pos: Vec3i) -> Vec3i {
        match self {
            MovementModifier::JumpUpBlock => pos.add(0, 1, 0),
            _ => pos,
        }
    }
}

/// Which corner of a diagonal move the bot squeezes past.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementSide {
    Left,
    Right,
}

impl MovementSide {
    pub const ALL: [MovementSide; 2] = [MovementSide::Left, MovementSide::Right];

    pub const fn opposite(self) -> Self {
        match self {
            MovementSide::Left => MovementSide::Right,
            MovementSide::Right => MovementSide::Left,
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Vertical slice of the bot's bounding box, one per block it can occupy.
/// `Head` is only reached while jumping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BodyPart {
    Feet,
    Body,
    Head,
}

impl BodyPart {
    pub const ALL: [BodyPart; 3] = [BodyPart::Feet, BodyPart::Body, BodyPart::Head];

    /// Standing body parts, top first. Breaking order follows this list so
    /// the upper block is always mined before the one beneath it.
    pub const STANDING_TOP_DOWN: [BodyPart; 2] = [BodyPart::Body, BodyPart::Feet];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn offset(self, pos: Vec3i) -> Vec3i {
        match self {
            BodyPart::Feet => pos,
            BodyPart::Body => pos.add(0, 1, 0),
            BodyPart::Head => pos.add(0, 2, 0),
        }
    }
}

/// The direction tag of a graph edge, fed back as the incoming direction
/// of the next expansion so the graph can prune immediate backtracking.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionDirection {
    Horizontal(MovementDirection),
    Up,
    Down,
}

impl ActionDirection {
    pub const fn opposite(self) -> Self {
        match self {
            ActionDirection::Horizontal(dir) => ActionDirection::Horizontal(dir.opposite()),
            ActionDirection::Up => ActionDirection::Down,
            ActionDirection::Down => ActionDirection::Up,
        }
    }
}

impl fmt::Display for ActionDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionDirection::Horizontal(dir) => write!(f, "{dir:?}"),
            ActionDirection::Up => write!(f, "Up"),
            ActionDirection::Down => write!(f, "Down"),
        }
    }
}
