//! Entity types tracked by the engine

pub mod case;

pub use case::{
    Case, CaseId, ConflictType, NewCase, Resolution, ResolutionMethod, ResidentialBlock,
};
