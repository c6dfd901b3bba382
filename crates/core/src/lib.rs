pub mod coverage;
pub mod dates;
pub mod error;
pub mod exceptions;
pub mod normalize;
pub mod ranges;
pub mod taxonomy;
pub mod types;
pub mod variant;

pub use dates::ReleaseDate;
pub use error::{ConfigError, PipelineError};
pub use exceptions::{ExceptionMapping, ExceptionMatch};
pub use taxonomy::SeasonTaxonomy;
pub use types::*;

/// Show name used in canonical filenames and `showtitle` fields.
pub const SHOW_TITLE: &str = "One Pace";
