use kurbo::Shape as _;

use crate::foundation::core::{Point, Rgba8};
use crate::foundation::error::{ScopeError, ScopeResult};
use crate::layout::places::Place;
use crate::render::surface::{DrawSurface, FrameHeader, Marker};

/// Rasterized frame, row-major RGBA8.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Straight-alpha pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y * self.width + x) * 4) as usize;
        let px = self.data.get(i..i + 4)?;
        let [r, g, b, a] = [px[0], px[1], px[2], px[3]];
        if !self.premultiplied || a == 0 || a == 255 {
            return Some([r, g, b, a]);
        }
        let unpremul = |c: u8| -> u8 { ((u16::from(c) * 255 + u16::from(a) / 2) / u16::from(a)) as u8 };
        Some([unpremul(r), unpremul(g), unpremul(b), a])
    }
}

/// Width of the ring drawn around markers.
const STROKE_WIDTH: f64 = 1.0;
const CIRCLE_TOLERANCE: f64 = 0.1;

/// CPU rasterizer for [`DrawSurface`] built on `vello_cpu`.
pub struct CpuSurface {
    width: u16,
    height: u16,
    background: Rgba8,
    ctx: Option<vello_cpu::RenderContext>,
    frame: Option<FrameRGBA>,
    frames_rendered: u64,
}

impl std::fmt::Debug for CpuSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpuSurface")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("background", &self.background)
            .field("frames_rendered", &self.frames_rendered)
            .finish_non_exhaustive()
    }
}

impl CpuSurface {
    pub fn new(width: u32, height: u32, background: Rgba8) -> ScopeResult<Self> {
        if width == 0 || height == 0 {
            return Err(ScopeError::render("surface size must be non-zero"));
        }
        let width: u16 = width
            .try_into()
            .map_err(|_| ScopeError::render("surface width exceeds u16"))?;
        let height: u16 = height
            .try_into()
            .map_err(|_| ScopeError::render("surface height exceeds u16"))?;
        Ok(Self {
            width,
            height,
            background,
            ctx: None,
            frame: None,
            frames_rendered: 0,
        })
    }

    /// Size the canvas to a viewport, rounding up.
    pub fn for_viewport(view_width: f64, view_height: f64, background: Rgba8) -> ScopeResult<Self> {
        if !(view_width.is_finite() && view_height.is_finite()) {
            return Err(ScopeError::render("viewport size must be finite"));
        }
        Self::new(
            view_width.ceil().max(0.0) as u32,
            view_height.ceil().max(0.0) as u32,
            background,
        )
    }

    pub fn width(&self) -> u32 {
        u32::from(self.width)
    }

    pub fn height(&self) -> u32 {
        u32::from(self.height)
    }

    /// The most recently completed frame.
    pub fn last_frame(&self) -> Option<&FrameRGBA> {
        self.frame.as_ref()
    }

    pub fn take_frame(&mut self) -> Option<FrameRGBA> {
        self.frame.take()
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    fn fill_circle(&mut self, center: Point, radius: f64, color: Rgba8) {
        if radius <= 0.0 {
            return;
        }
        let Some(ctx) = self.ctx.as_mut() else {
            return;
        };
        let path = kurbo::Circle::new(center, radius).to_path(CIRCLE_TOLERANCE);
        ctx.set_paint(color_to_cpu(color));
        ctx.fill_path(&bezpath_to_cpu(&path));
    }

    fn fill_square(&mut self, center: Point, half: f64, color: Rgba8, opacity: f32) {
        let Some(ctx) = self.ctx.as_mut() else {
            return;
        };
        ctx.set_paint(color_to_cpu(color));
        if opacity < 1.0 {
            ctx.push_opacity_layer(opacity);
        }
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            center.x - half,
            center.y - half,
            center.x + half,
            center.y + half,
        ));
        if opacity < 1.0 {
            ctx.pop_layer();
        }
    }
}

impl DrawSurface for CpuSurface {
    fn begin_frame(&mut self, _header: &FrameHeader) {
        let mut ctx = vello_cpu::RenderContext::new(self.width, self.height);
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint(color_to_cpu(self.background));
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(self.width),
            f64::from(self.height),
        ));
        self.ctx = Some(ctx);
    }

    fn draw_place(&mut self, place: &Place) {
        self.fill_circle(place.position, place.radius, place.color);
    }

    fn draw_marker(&mut self, marker: &Marker) {
        let e = marker.emphasis;
        if crate::eval::visibility::is_image_shape(marker.shape.as_deref()) {
            // image sources are resolved by the host; draw the footprint
            self.fill_square(marker.center, marker.radius, e.stroke, e.opacity);
            self.fill_square(
                marker.center,
                marker.radius - STROKE_WIDTH,
                e.fill,
                e.opacity,
            );
            return;
        }
        self.fill_circle(marker.center, marker.radius, e.stroke);
        self.fill_circle(marker.center, marker.radius - STROKE_WIDTH, e.fill);
    }

    fn end_frame(&mut self) {
        let Some(mut ctx) = self.ctx.take() else {
            return;
        };
        ctx.flush();
        let mut pixmap = vello_cpu::Pixmap::new(self.width, self.height);
        ctx.render_to_pixmap(&mut pixmap);
        self.frame = Some(FrameRGBA {
            width: self.width(),
            height: self.height(),
            data: pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        });
        self.frames_rendered += 1;
    }
}

fn color_to_cpu(c: Rgba8) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn point_to_cpu(p: Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn bezpath_to_cpu(path: &kurbo::BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3));
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
