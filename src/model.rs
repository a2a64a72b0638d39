use crate::error::{QuotepressError, QuotepressResult};

/// One generated upload: display name plus the link stored on the page.
///
/// Identity is positional. Sequences of items are never mutated in place;
/// reordering produces a new vector.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MediaItem {
    pub name: String,
    pub link: String,
}

impl MediaItem {
    pub fn new(name: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            link: link.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VarianceMode {
    /// Keep generation order: consecutive items vary the image, not the quote.
    DifferentImage,
    /// Interleave before distribution so consecutive items share an image
    /// index and vary the quote.
    DifferentQuote,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogoCorner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    /// Pick a corner per item, deterministically from the job seed.
    Shuffle,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PixelSize {
    pub width: u32,
    pub height: u32,
}

pub const DEFAULT_LOGO_SIZE: PixelSize = PixelSize {
    width: 200,
    height: 100,
};

pub const DEFAULT_FONT_SIZE: f32 = 60.0;

/// Everything one run needs, loaded from a JSON job file.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct JobSpec {
    pub page_id: String,
    pub image_folder: String,
    pub output_folder: String,
    pub logo_file: String,
    pub watermark_file: String,
    pub font_file: String,
    pub quotes: Vec<String>,
    pub keywords: Vec<String>,
    /// Base name for generated uploads; keywords are appended for uniqueness.
    pub image_name: String,
    /// Marker attribute value locating target elements on the page.
    pub insertion_id: String,
    /// Attribute name carrying a per-element requested item count.
    pub count_attribute: String,
    pub variance: VarianceMode,
    pub logo_corner: LogoCorner,
    /// Output dimensions; omit to keep each source image's own size.
    #[serde(default)]
    pub image_size: Option<PixelSize>,
    /// Logo dimensions; omit for 200x100.
    #[serde(default)]
    pub logo_size: Option<PixelSize>,
    /// Quote font size in pixels; omit for 60.
    #[serde(default)]
    pub font_size: Option<f32>,
    #[serde(default)]
    pub seed: u64,
}

impl JobSpec {
    pub fn validate(&self) -> QuotepressResult<()> {
        if self.page_id.trim().is_empty() {
            return Err(QuotepressError::validation("page_id must be non-empty"));
        }
        if self.quotes.is_empty() {
            return Err(QuotepressError::validation("quotes must be non-empty"));
        }
        if self.keywords.is_empty() {
            return Err(QuotepressError::validation("keywords must be non-empty"));
        }
        if self.image_name.trim().is_empty() {
            return Err(QuotepressError::validation("image_name must be non-empty"));
        }
        if self.insertion_id.trim().is_empty() {
            return Err(QuotepressError::validation(
                "insertion_id must be non-empty",
            ));
        }
        if self.count_attribute.trim().is_empty() {
            return Err(QuotepressError::validation(
                "count_attribute must be non-empty",
            ));
        }
        if let Some(size) = &self.image_size
            && (size.width == 0 || size.height == 0)
        {
            return Err(QuotepressError::validation(
                "image_size width/height must be > 0",
            ));
        }
        if let Some(size) = &self.logo_size
            && (size.width == 0 || size.height == 0)
        {
            return Err(QuotepressError::validation(
                "logo_size width/height must be > 0",
            ));
        }
        if let Some(size) = self.font_size
            && (!size.is_finite() || size <= 0.0)
        {
            return Err(QuotepressError::validation(
                "font_size must be finite and > 0",
            ));
        }
        Ok(())
    }
}
