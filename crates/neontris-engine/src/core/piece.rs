use rand::{Rng, distr::StandardUniform, prelude::Distribution};
use serde::{Deserialize, Serialize};

use super::position::CellPos;

/// Offsets `(d_row, d_col)` of the four blocks of a piece, relative to its pivot.
///
/// The first entry of every table is `(0, 0)`: the first block *is* the pivot.
type Offsets = [(i32, i32); 4];

/// The falling piece: four blocks of one kind plus the rotation state that produced them.
///
/// Movement and rotation come in two halves. The `*_positions` queries compute
/// candidate coordinates without touching the piece; the mutators (`fall`,
/// `move_left`, `move_right`, `apply_rotation`) commit them. The piece never
/// checks legality itself: callers test the candidate positions against the
/// board first.
///
/// # Invariant
///
/// `cells()` always equals the rotation table of `kind()` at `rotation()`,
/// anchored at `pivot()` (the first block).
///
/// # Example
///
/// ```
/// use neontris_engine::{CellPos, Piece, PieceKind};
///
/// let mut piece = Piece::spawn(PieceKind::T, CellPos::new(0, 4));
/// assert_eq!(piece.falling_positions()[0], CellPos::new(1, 4));
///
/// piece.fall();
/// piece.apply_rotation();
/// assert_eq!(piece.rotation().index(), 1);
/// assert_eq!(piece.pivot(), CellPos::new(1, 4));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece {
    kind: PieceKind,
    rotation: PieceRotation,
    cells: [CellPos; 4],
}

impl Serialize for Piece {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        // Format: "kind#rotation@row,col" anchored at the pivot (e.g., "T#1@5,4")
        let pivot = self.pivot();
        let s = format!(
            "{}#{}@{},{}",
            self.kind.as_char(),
            self.rotation.0,
            pivot.row(),
            pivot.col()
        );
        serializer.serialize_str(&s)
    }
}

impl<'de> Deserialize<'de> for Piece {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;

        let (kind_str, rest) = s.split_once('#').ok_or_else(|| {
            serde::de::Error::custom(format!("expected format 'kind#rotation@row,col', got '{s}'"))
        })?;
        let mut kind_chars = kind_str.chars();
        let kind = match (kind_chars.next(), kind_chars.next()) {
            (Some(c), None) => PieceKind::from_char(c)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid piece kind: {c}")))?,
            _ => {
                return Err(serde::de::Error::custom(format!(
                    "piece kind must be single character, got '{kind_str}'"
                )));
            }
        };

        let (rotation_str, position_str) = rest.split_once('@').ok_or_else(|| {
            serde::de::Error::custom(format!("missing '@' in format 'kind#rotation@row,col', got '{s}'"))
        })?;
        let rotation_num = rotation_str.parse::<u8>().map_err(|e| {
            serde::de::Error::custom(format!("invalid rotation: {rotation_str} ({e})"))
        })?;
        if rotation_num >= kind.rotation_period() {
            return Err(serde::de::Error::custom(format!(
                "rotation of {} piece must be below {}, got {rotation_num}",
                kind.as_char(),
                kind.rotation_period()
            )));
        }

        let (row_str, col_str) = position_str.split_once(',').ok_or_else(|| {
            serde::de::Error::custom(format!("missing ',' in format 'kind#rotation@row,col', got '{s}'"))
        })?;
        let row = row_str
            .parse::<i32>()
            .map_err(|e| serde::de::Error::custom(format!("invalid row: {row_str} ({e})")))?;
        let col = col_str
            .parse::<i32>()
            .map_err(|e| serde::de::Error::custom(format!("invalid col: {col_str} ({e})")))?;

        let rotation = PieceRotation(rotation_num);
        Ok(Piece {
            kind,
            rotation,
            cells: kind.cells_at(rotation, CellPos::new(row, col)),
        })
    }
}

impl Piece {
    /// Builds a piece of `kind` in its spawn orientation with the pivot at `origin`.
    #[must_use]
    pub fn spawn(kind: PieceKind, origin: CellPos) -> Self {
        let rotation = PieceRotation::default();
        Self {
            kind,
            rotation,
            cells: kind.cells_at(rotation, origin),
        }
    }

    #[must_use]
    pub fn kind(&self) -> PieceKind {
        self.kind
    }

    #[must_use]
    pub fn rotation(&self) -> PieceRotation {
        self.rotation
    }

    #[must_use]
    pub fn cells(&self) -> [CellPos; 4] {
        self.cells
    }

    /// The reference coordinate the rotation tables are anchored at.
    #[must_use]
    pub fn pivot(&self) -> CellPos {
        self.cells[0]
    }

    #[must_use]
    pub fn falling_positions(&self) -> [CellPos; 4] {
        self.cells.map(CellPos::down)
    }

    #[must_use]
    pub fn left_positions(&self) -> [CellPos; 4] {
        self.cells.map(CellPos::left)
    }

    #[must_use]
    pub fn right_positions(&self) -> [CellPos; 4] {
        self.cells.map(CellPos::right)
    }

    /// Positions for the next rotation state, anchored at the current pivot.
    ///
    /// The O-piece has a single state, so this reproduces its current cells.
    #[must_use]
    pub fn rotate_positions(&self) -> [CellPos; 4] {
        self.kind
            .cells_at(self.rotation.next(self.kind), self.pivot())
    }

    pub fn apply_rotation(&mut self) {
        self.cells = self.rotate_positions();
        self.rotation = self.rotation.next(self.kind);
    }

    pub fn fall(&mut self) {
        self.cells = self.falling_positions();
    }

    pub fn move_left(&mut self) {
        self.cells = self.left_positions();
    }

    pub fn move_right(&mut self) {
        self.cells = self.right_positions();
    }
}

/// Rotation state index of a piece.
///
/// Ranges over `0..period`, where the period depends on the kind:
/// 4 for L, J and T; 2 for I, S and Z; 1 for O (which never rotates).
/// State `0` is the spawn orientation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PieceRotation(u8);

impl PieceRotation {
    #[must_use]
    pub const fn index(self) -> u8 {
        self.0
    }

    #[must_use]
    pub const fn next(self, kind: PieceKind) -> Self {
        PieceRotation((self.0 + 1) % kind.rotation_period())
    }

    const fn as_usize(self) -> usize {
        self.0 as usize
    }
}

/// Enum representing the type of piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[repr(u8)]
pub enum PieceKind {
    /// I-piece (line).
    I = 0,
    /// O-piece (square).
    O = 1,
    /// L-piece.
    L = 2,
    /// J-piece.
    J = 3,
    /// S-piece.
    S = 4,
    /// Z-piece.
    Z = 5,
    /// T-piece.
    T = 6,
}

impl Distribution<PieceKind> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> PieceKind {
        PieceKind::ALL[rng.random_range(0..PieceKind::LEN)]
    }
}

impl PieceKind {
    /// Number of piece types (7).
    pub const LEN: usize = 7;

    pub const ALL: [PieceKind; Self::LEN] = [
        PieceKind::I,
        PieceKind::O,
        PieceKind::L,
        PieceKind::J,
        PieceKind::S,
        PieceKind::Z,
        PieceKind::T,
    ];

    /// Number of distinct rotation states.
    #[must_use]
    pub const fn rotation_period(self) -> u8 {
        #[expect(clippy::cast_possible_truncation)]
        let period = SHAPE_TABLES[self as usize].len() as u8;
        period
    }

    /// Cells of this kind in `rotation`, with the pivot at `pivot`.
    fn cells_at(self, rotation: PieceRotation, pivot: CellPos) -> [CellPos; 4] {
        SHAPE_TABLES[self as usize][rotation.as_usize()]
            .map(|(d_row, d_col)| pivot.offset(d_row, d_col))
    }

    /// Returns the single character representation of this piece kind.
    ///
    /// # Examples
    ///
    /// ```
    /// use neontris_engine::PieceKind;
    ///
    /// assert_eq!(PieceKind::I.as_char(), 'I');
    /// assert_eq!(PieceKind::T.as_char(), 'T');
    /// ```
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            PieceKind::I => 'I',
            PieceKind::O => 'O',
            PieceKind::L => 'L',
            PieceKind::J => 'J',
            PieceKind::S => 'S',
            PieceKind::Z => 'Z',
            PieceKind::T => 'T',
        }
    }

    /// Parses a piece kind from a single character.
    ///
    /// # Examples
    ///
    /// ```
    /// use neontris_engine::PieceKind;
    ///
    /// assert_eq!(PieceKind::from_char('L'), Some(PieceKind::L));
    /// assert_eq!(PieceKind::from_char('X'), None);
    /// ```
    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            'I' => Some(PieceKind::I),
            'O' => Some(PieceKind::O),
            'L' => Some(PieceKind::L),
            'J' => Some(PieceKind::J),
            'S' => Some(PieceKind::S),
            'Z' => Some(PieceKind::Z),
            'T' => Some(PieceKind::T),
            _ => None,
        }
    }
}

// State 0 of each table is the spawn layout.
const I_STATES: [Offsets; 2] = [
    [(0, 0), (-1, 0), (1, 0), (2, 0)],
    [(0, 0), (0, -1), (0, 1), (0, 2)],
];

const O_STATES: [Offsets; 1] = [[(0, 0), (0, 1), (1, 0), (1, 1)]];

const L_STATES: [Offsets; 4] = [
    [(0, 0), (-1, 0), (1, 0), (1, 1)],
    [(0, 0), (0, -1), (0, 1), (1, -1)],
    [(0, 0), (-1, -1), (-1, 0), (1, 0)],
    [(0, 0), (0, -1), (0, 1), (-1, 1)],
];

const J_STATES: [Offsets; 4] = [
    [(0, 0), (-1, 0), (1, 0), (1, -1)],
    [(0, 0), (0, -1), (0, 1), (-1, -1)],
    [(0, 0), (-1, 0), (1, 0), (-1, 1)],
    [(0, 0), (0, -1), (0, 1), (1, 1)],
];

const S_STATES: [Offsets; 2] = [
    [(0, 0), (0, 1), (1, 0), (1, -1)],
    [(0, 0), (-1, 0), (0, 1), (1, 1)],
];

const Z_STATES: [Offsets; 2] = [
    [(0, 0), (0, -1), (1, 0), (1, 1)],
    [(0, 0), (-1, 0), (0, -1), (1, -1)],
];

const T_STATES: [Offsets; 4] = [
    [(0, 0), (0, -1), (1, 0), (0, 1)],
    [(0, 0), (-1, 0), (0, -1), (1, 0)],
    [(0, 0), (0, -1), (-1, 0), (0, 1)],
    [(0, 0), (-1, 0), (0, 1), (1, 0)],
];

/// Rotation tables indexed by `PieceKind as usize`.
const SHAPE_TABLES: [&[Offsets]; PieceKind::LEN] = [
    &I_STATES, &O_STATES, &L_STATES, &J_STATES, &S_STATES, &Z_STATES, &T_STATES,
];
