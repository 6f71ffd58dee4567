//! puncta-core: Core types for sub-nuclear structure quantification.
//!
//! This crate provides the foundational types for 3D object populations,
//! physical calibration, nucleus/foci records, and per-nucleus metrics.
//!

pub mod calibration;
pub mod error;
pub mod object;
pub mod population;
pub mod record;
pub mod volume;
pub mod voxel;

pub use calibration::{Calibration, SizeMode};
pub use error::{Error, Result};
pub use object::Object3D;
pub use population::Population;
pub use record::{NucleusMetrics, NucleusRecord, ResultsRow};
pub use volume::{rescale_labels_nearest, IntensityVolume, LabelVolume, MaskVolume};
pub use voxel::{BoundingBox, Voxel};
