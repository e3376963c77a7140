//! Core library for a three-dimensional Game of Life.
//!
//! A [`Volume`] holds integer cell states: `0` is dead, positive values are
//! live cells tagged with a cluster identity and negative values are static
//! environment cells. An [`Evolver`] applies a [`Rule`] to every cell's
//! neighborhood in lockstep to produce the next volume.

pub mod enc;
pub mod engine;
pub mod error;
pub mod pos;
pub mod rule;
pub mod volume;

pub use enc::{DecodeError, RunLengthEncoded, VolumeCodec};
pub use engine::{Color, ColorTable, Evolution, Evolver, Neighborhoods, evolve};
pub use error::{Error, Result};
pub use pos::Pos3;
pub use rule::{Codebook, CodebookRule, Fallback, GeneralizedLifeRule, Rule};
pub use volume::{Shape, Volume};
