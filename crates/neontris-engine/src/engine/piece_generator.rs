use std::{fmt, fmt::Write as _, str::FromStr};

use rand::{
    Rng, SeedableRng as _,
    distr::{Distribution, StandardUniform},
};
use rand_pcg::Pcg32;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{ParseSeedError, PieceKind};

/// Rolls the kind of each new piece.
///
/// Every roll is uniform over the seven kinds and independent of earlier
/// rolls. The generator is seeded, so two generators built from the same
/// [`PieceSeed`] produce the same sequence.
///
/// # Example
///
/// ```
/// use neontris_engine::{PieceGenerator, PieceSeed};
///
/// let seed: PieceSeed = "000102030405060708090a0b0c0d0e0f".parse().unwrap();
/// let mut a = PieceGenerator::with_seed(seed);
/// let mut b = PieceGenerator::with_seed(seed);
/// assert_eq!(a.roll(), b.roll());
/// ```
#[derive(Debug, Clone)]
pub struct PieceGenerator {
    rng: Pcg32,
}

impl Default for PieceGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl PieceGenerator {
    /// Creates a generator with a random seed.
    #[must_use]
    pub fn new() -> Self {
        Self::with_seed(rand::rng().random())
    }

    /// Like [`Self::new`], but with a specific seed for deterministic rolls.
    #[must_use]
    pub fn with_seed(seed: PieceSeed) -> Self {
        Self {
            rng: Pcg32::from_seed(seed.0),
        }
    }

    pub fn roll(&mut self) -> PieceKind {
        self.rng.random()
    }
}

/// Seed for deterministic piece generation.
///
/// A 128-bit (16-byte) seed, written as 32 hexadecimal digits in JSON and on
/// the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PieceSeed([u8; 16]);

impl PieceSeed {
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Parses 32 hexadecimal digits (either case).
    pub fn from_hex(hex_str: &str) -> Result<Self, ParseSeedError> {
        if hex_str.len() != 32 || !hex_str.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ParseSeedError::new(hex_str));
        }
        let num = u128::from_str_radix(hex_str, 16).map_err(|_| ParseSeedError::new(hex_str))?;
        Ok(Self(num.to_be_bytes()))
    }
}

impl fmt::Display for PieceSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", u128::from_be_bytes(self.0))
    }
}

impl FromStr for PieceSeed {
    type Err = ParseSeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for PieceSeed {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut hex_str = String::with_capacity(2 * self.0.len());
        write!(&mut hex_str, "{self}").map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&hex_str)
    }
}

impl<'de> Deserialize<'de> for PieceSeed {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let hex_str = String::deserialize(deserializer)?;
        Self::from_hex(&hex_str).map_err(serde::de::Error::custom)
    }
}

/// Allows generating random `PieceSeed` values using the standard random distribution.
impl Distribution<PieceSeed> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> PieceSeed {
        let mut seed = [0; 16];
        rng.fill(&mut seed);
        PieceSeed(seed)
    }
}
