//! Connection configuration: jurisdiction profiles and the per-session spec store.

pub mod domain;
pub mod jurisdiction;
mod store;

pub use domain::{
    AngleRange, ConnectionSpec, ConnectionType, FieldOutcome, FieldUpdate, HangerType,
    HighLowCenter, OffsetDirection, SpecField, SpecFieldError,
};
pub use jurisdiction::{DesignMethod, DurationOption, JurisdictionProfile, UnitSystem};
pub use store::{ConnectionSpecStore, LanguageMode};
