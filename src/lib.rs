#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod asset_paths;
pub mod block;
pub mod builder;
pub mod compiler;
pub mod config;
pub mod error;
pub mod expand;
pub mod filters;
pub mod iterator;
pub mod models;
pub mod references;
pub mod resolver;
pub mod selection;
pub mod writer;

pub use block::{AssetTag, TagClose};
pub use builder::{AssetBuilder, BuildReport};
pub use config::AssetManifest;
pub use error::{AssetError, Result};
pub use filters::{Filter, FilterContext, FilterManager};
pub use models::{Artifact, AssetId, FilterSpec, OutputMode, WriteOutcome};
pub use resolver::{AssetRegistry, FsSourceReader, SourceReader};
pub use selection::{AssetRequest, AssetSelection, TagParams};
