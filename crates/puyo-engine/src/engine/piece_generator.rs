use std::{fmt::Write as _, str::FromStr};

use rand::{
    Rng, SeedableRng as _,
    distr::{Distribution, StandardUniform},
};
use rand_pcg::Pcg32;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::ActivePiece;

/// Supplies the pieces a session spawns.
///
/// [`PieceGenerator`] is the implementation used in play; tests and tools
/// can plug in their own sequence.
pub trait PieceSource {
    /// Returns the next piece at its spawn position.
    fn next_piece(&mut self) -> ActivePiece;
}

/// Seed for deterministic piece generation.
///
/// A 128-bit (16-byte) seed for the piece generator's random number
/// generator. The same seed always produces the same sequence of shapes and
/// colors, which makes sessions reproducible for debugging and testing.
///
/// Seeds serialize as, and parse from, 32-character hex strings.
///
/// # Example
///
/// ```
/// use puyo_engine::{GameSession, PieceSeed};
/// use rand::Rng as _;
///
/// let seed: PieceSeed = rand::rng().random();
///
/// let session1 = GameSession::with_seed(seed);
/// let session2 = GameSession::with_seed(seed);
/// assert_eq!(session1.active_piece(), session2.active_piece());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PieceSeed([u8; 16]);

/// Error returned when parsing a [`PieceSeed`] from hex.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("invalid hex seed {input:?}: {reason}")]
pub struct PieceSeedParseError {
    input: String,
    reason: &'static str,
}

impl PieceSeed {
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Returns the seed as a 32-character lowercase hex string.
    #[must_use]
    pub fn to_hex(&self) -> String {
        let num = u128::from_be_bytes(self.0);
        let mut hex_str = String::with_capacity(2 * self.0.len());
        write!(&mut hex_str, "{num:032x}").expect("writing to a String cannot fail");
        hex_str
    }
}

impl FromStr for PieceSeed {
    type Err = PieceSeedParseError;

    fn from_str(hex_str: &str) -> Result<Self, Self::Err> {
        let error = |reason| PieceSeedParseError {
            input: hex_str.to_owned(),
            reason,
        };
        if hex_str.len() != 32 {
            return Err(error("expected 32 characters"));
        }
        if !hex_str.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(error("not a hex number"));
        }
        let num = u128::from_str_radix(hex_str, 16).map_err(|_| error("not a hex number"))?;
        Ok(Self(num.to_be_bytes()))
    }
}

impl Serialize for PieceSeed {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for PieceSeed {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let hex_str = String::deserialize(deserializer)?;
        hex_str.parse().map_err(serde::de::Error::custom)
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

/// Random piece generator.
///
/// Picks [`crate::ShapeKind::Pair`] or [`crate::ShapeKind::Special`] with 95% / 5%
/// probability and colors every cell independently.
#[derive(Debug, Clone)]
pub struct PieceGenerator {
    seed: PieceSeed,
    rng: Pcg32,
}

impl Default for PieceGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl PieceGenerator {
    /// Creates a generator with a random seed.
    ///
    /// For deterministic piece generation, use [`Self::with_seed`] instead.
    #[must_use]
    pub fn new() -> Self {
        Self::with_seed(rand::rng().random())
    }

    /// Like [`Self::new`], but with a specific seed.
    #[must_use]
    pub fn with_seed(seed: PieceSeed) -> Self {
        Self {
            seed,
            rng: Pcg32::from_seed(seed.0),
        }
    }

    /// Returns the seed this generator was created with.
    #[must_use]
    pub fn seed(&self) -> PieceSeed {
        self.seed
    }
}

impl PieceSource for PieceGenerator {
    fn next_piece(&mut self) -> ActivePiece {
        self.rng.random()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod piece_seed_serialization {
        use super::*;

        #[test]
        fn test_roundtrip_random_seed() {
            let seed: PieceSeed = rand::rng().random();
            let serialized = serde_json::to_string(&seed).unwrap();
            let deserialized: PieceSeed = serde_json::from_str(&serialized).unwrap();
            assert_eq!(seed, deserialized);
        }

        #[test]
        fn test_known_value_sequential_bytes() {
            // Big-endian: bytes appear in order as hex pairs
            let seed = PieceSeed::from_bytes([
                0x01, 0x23, 0x45, 0x67, 0x89, 0xAB, 0xCD, 0xEF, 0xFE, 0xDC, 0xBA, 0x98, 0x76, 0x54,
                0x32, 0x10,
            ]);
            let serialized = serde_json::to_string(&seed).unwrap();
            assert_eq!(serialized, "\"0123456789abcdeffedcba9876543210\"");
        }

        #[test]
        fn test_parse_accepts_uppercase() {
            let seed: PieceSeed = "0123456789ABCDEFFEDCBA9876543210".parse().unwrap();
            assert_eq!(seed.to_hex(), "0123456789abcdeffedcba9876543210");
        }

        #[test]
        fn test_parse_errors() {
            for input in [
                "",
                "0123456789abcdef0123456789abcde",
                "0123456789abcdef0123456789abcdef0",
                "ghijklmnopqrstuvwxyzghijklmnopqr",
                "+123456789abcdef0123456789abcdef",
                "-123456789abcdef0123456789abcdef",
            ] {
                let err = input.parse::<PieceSeed>().unwrap_err();
                assert!(err.to_string().contains("invalid hex"), "{err}");
                assert!(serde_json::from_str::<PieceSeed>(&format!("\"{input}\"")).is_err());
            }
        }
    }

    #[test]
    fn test_deterministic_piece_generation() {
        let seed = PieceSeed::from_bytes([0x5A; 16]);
        let mut gen1 = PieceGenerator::with_seed(seed);
        let mut gen2 = PieceGenerator::with_seed(seed);

        for _ in 0..50 {
            assert_eq!(gen1.next_piece(), gen2.next_piece());
        }
        assert_eq!(gen1.seed(), seed);
    }

    #[test]
    fn test_generated_pieces_spawn_at_pivot_column() {
        let mut generator = PieceGenerator::with_seed(PieceSeed::from_bytes([1; 16]));
        for _ in 0..200 {
            let piece = generator.next_piece();
            assert_eq!(piece.pivot().col, crate::SPAWN_COL);
            assert_eq!(piece.cells().len(), piece.shape().cell_count());
        }
    }
}
