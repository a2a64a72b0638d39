//! Quote typesetting and rasterization.
//!
//! Parley shapes and wraps the quote against 80% of the frame width; the
//! positioned glyph runs are filled through vello_cpu into a transparent
//! pixmap which is then composited over the frame.

use image::RgbaImage;

use crate::error::{QuotepressError, QuotepressResult};

/// Fraction of the frame width the quote block may occupy.
pub const TEXT_AREA_RATIO: f32 = 0.80;

const TEXT_WHITE: TextBrushRgba8 = TextBrushRgba8 {
    r: 255,
    g: 255,
    b: 255,
    a: 255,
};

/// RGBA8 brush color carried through Parley text layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextBrushRgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// Draws a quote onto a frame. Implemented by [`QuoteTypesetter`]; the
/// seam exists so the pipeline can run without font files in tests.
pub trait QuoteOverlay {
    fn overlay_quote(&mut self, frame: &mut RgbaImage, quote: &str) -> QuotepressResult<()>;
}

/// Stateful quote renderer holding the Parley contexts and the font.
pub struct QuoteTypesetter {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    family_name: String,
    font: vello_cpu::peniko::FontData,
    size_px: f32,
}

impl QuoteTypesetter {
    /// Build a typesetter from raw font bytes (TTF/OTF).
    pub fn new(font_bytes: Vec<u8>, size_px: f32) -> QuotepressResult<Self> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(QuotepressError::validation(
                "font size must be finite and > 0",
            ));
        }

        let mut font_ctx = parley::FontContext::default();
        let families = font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes.clone()), None);
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            QuotepressError::validation("no font families registered from font bytes")
        })?;
        let family_name = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| QuotepressError::validation("registered font family has no name"))?
            .to_string();

        let font = vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(font_bytes), 0);

        Ok(Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            family_name,
            font,
            size_px,
        })
    }
}

impl QuoteOverlay for QuoteTypesetter {
    /// Draw `quote` centered on the frame, wrapped to the text area width.
    fn overlay_quote(&mut self, frame: &mut RgbaImage, quote: &str) -> QuotepressResult<()> {
        if quote.is_empty() {
            return Ok(());
        }

        let width_u16 = u16::try_from(frame.width())
            .map_err(|_| QuotepressError::render("frame width exceeds u16"))?;
        let height_u16 = u16::try_from(frame.height())
            .map_err(|_| QuotepressError::render("frame height exceeds u16"))?;

        let max_width = frame.width() as f32 * TEXT_AREA_RATIO;

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, quote, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(self.family_name.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(self.size_px));
        builder.push_default(parley::style::StyleProperty::Brush(TEXT_WHITE));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(quote);
        layout.break_all_lines(Some(max_width));
        layout.align(
            Some(max_width),
            parley::Alignment::Center,
            parley::AlignmentOptions::default(),
        );

        let x0 = f64::from((frame.width() as f32 - max_width) / 2.0);
        let y0 = f64::from((frame.height() as f32 - layout.height()) / 2.0).max(0.0);

        let mut ctx = vello_cpu::RenderContext::new(width_u16, height_u16);
        ctx.set_transform(vello_cpu::kurbo::Affine::translate((x0, y0)));

        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };

                let brush = run.style().brush;
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                    brush.r, brush.g, brush.b, brush.a,
                ));

                let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                ctx.glyph_run(&self.font)
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }

        ctx.flush();
        let mut pixmap = vello_cpu::Pixmap::new(width_u16, height_u16);
        ctx.render_to_pixmap(&mut pixmap);

        composite_premul_over(frame, pixmap.data_as_u8_slice());
        Ok(())
    }
}

/// Composite a premultiplied RGBA8 buffer over a straight-alpha frame of
/// the same dimensions.
fn composite_premul_over(frame: &mut RgbaImage, premul: &[u8]) {
    debug_assert_eq!(premul.len(), frame.as_raw().len());
    for (dst, src) in frame
        .pixels_mut()
        .zip(premul.chunks_exact(4))
    {
        let sa = u16::from(src[3]);
        if sa == 0 {
            continue;
        }
        let inv = 255 - sa;
        for i in 0..3 {
            dst.0[i] = src[i].saturating_add((u16::from(dst.0[i]) * inv / 255) as u8);
        }
        dst.0[3] = (sa as u8).saturating_add((u16::from(dst.0[3]) * inv / 255) as u8);
    }
}
