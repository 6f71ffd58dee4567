//! puncta-io: File I/O for the puncta pipeline.
//!
//! This crate provides the collaborators around the analysis core:
//! stack reading, segmentation mask oracles, the append-only results
//! report, and the annotated composite visualization.
//!

pub mod error;
pub mod oracle;
pub mod reader;
pub mod report;
pub mod visualize;

pub use error::{Error, Result};
pub use oracle::{MaskFileOracle, MaskFileOracleConfig, SegmentationOracle};
pub use reader::{discover_images, ChannelReader, TiffStackReader};
pub use report::ReportWriter;
pub use visualize::{label_color, VisualizationWriter};
