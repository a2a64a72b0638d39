#![forbid(unsafe_code)]

pub mod compose;
pub mod distribute;
pub mod error;
pub mod markup;
pub mod model;
pub mod pipeline;
pub mod sequence;
pub mod text;
pub mod worker;
pub mod wp;

pub use distribute::{FragmentRenderer, GalleryRenderer, distribute, plan_slices};
pub use error::{QuotepressError, QuotepressResult};
pub use model::{
    DEFAULT_FONT_SIZE, DEFAULT_LOGO_SIZE, JobSpec, LogoCorner, MediaItem, PixelSize, VarianceMode,
};
pub use pipeline::{RunReport, run_job};
pub use sequence::{apply_variance, interleave};
pub use text::{QuoteOverlay, QuoteTypesetter};
pub use wp::{ContentBackend, SiteCredentials, WpClient};
