use crate::config::LayoutConfig;
use serde::Serialize;

pub type Point = (f32, f32);

/// Corners of a `length` x `width` rectangle rotated by `angle` radians about
/// its own centre, then moved to `center`.
///
/// Corner order is kept from the axis-aligned rectangle so the polygon never
/// self-intersects.
pub fn rotated_rectangle_vertices(length: f32, width: f32, angle: f32, center: Point) -> [Point; 4] {
    let (hl, hw) = (length / 2.0, width / 2.0);
    let (sin, cos) = angle.sin_cos();
    let corners = [(-hl, -hw), (hl, -hw), (hl, hw), (-hl, hw)];
    corners.map(|(x, y)| (x * cos - y * sin + center.0, x * sin + y * cos + center.1))
}

/// Fractions of the canvas size in pixels. Not clamped.
pub fn proportional_point(width: f32, height: f32, frac_x: f32, frac_y: f32) -> Point {
    (width * frac_x, height * frac_y)
}

/// A ringed circular badge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Medallion {
    pub cx: f32,
    pub cy: f32,
    /// Outer radius, ring included.
    pub radius: f32,
    pub ring: f32,
}

impl Medallion {
    pub fn top(&self) -> f32 {
        self.cy - self.radius
    }

    pub fn bottom(&self) -> f32 {
        self.cy + self.radius
    }

    /// Top-left corner of a `w` x `h` box centred on the medallion.
    pub fn centered_origin(&self, w: f32, h: f32) -> Point {
        (self.cx - w / 2.0, self.cy - h / 2.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Segment {
    pub from: Point,
    pub to: Point,
    pub thickness: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Diamond {
    pub center: Point,
    pub side: f32,
    pub stroke: f32,
}

impl Diamond {
    pub fn vertices(&self) -> [Point; 4] {
        rotated_rectangle_vertices(self.side, self.side, std::f32::consts::FRAC_PI_4, self.center)
    }
}

/// Every anchor of one card, derived from the canvas size alone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutGeometry {
    pub canvas_width: f32,
    pub canvas_height: f32,
    pub border: f32,
    pub description_left: f32,
    pub details_top: f32,
    pub artwork_anchor: f32,
    pub accent_line: Segment,
    pub class_medallion: Medallion,
    pub class_icon_scale: f32,
    pub diamond: Diamond,
    pub attribute_top: f32,
    pub attribute_pitch: f32,
    pub attribute_radius: f32,
    pub attribute_ring: f32,
    pub attribute_icon_scale: f32,
}

impl LayoutGeometry {
    pub fn new(canvas_width: f32, canvas_height: f32, config: &LayoutConfig) -> Self {
        let (w, h) = (canvas_width, canvas_height);
        let border = config.border_size as f32;
        let description_left = proportional_point(w, h, config.description_left, 0.0).0;

        let line_y = proportional_point(w, h, 0.0, config.accent_line_y).1;
        let accent_line = Segment {
            from: (border, line_y),
            to: (w - border, line_y),
            thickness: config.accent_line_width,
        };

        let radius = config.class_medallion_radius;
        let class_medallion = Medallion {
            cx: description_left / 2.0,
            cy: proportional_point(w, h, 0.0, config.class_medallion_top).1 + radius,
            radius,
            ring: config.class_medallion_ring,
        };

        let diamond = Diamond {
            center: proportional_point(w, h, config.diamond_x, config.diamond_y),
            side: config.diamond_side,
            stroke: config.diamond_stroke,
        };

        Self {
            canvas_width: w,
            canvas_height: h,
            border,
            description_left,
            details_top: proportional_point(w, h, 0.0, config.details_top).1,
            artwork_anchor: proportional_point(w, h, 0.0, config.artwork_anchor).1,
            accent_line,
            class_medallion,
            class_icon_scale: config.class_icon_scale,
            diamond,
            attribute_top: proportional_point(w, h, 0.0, config.attribute_top).1,
            attribute_pitch: config.attribute_pitch,
            attribute_radius: config.attribute_radius,
            attribute_ring: config.attribute_ring,
            attribute_icon_scale: config.attribute_icon_scale,
        }
    }

    /// Medallions for `count` attributes, top to bottom.
    pub fn attribute_medallions(&self, count: usize) -> Vec<Medallion> {
        (0..count)
            .map(|idx| {
                let top = self.attribute_top + idx as f32 * self.attribute_pitch;
                Medallion {
                    cx: self.description_left / 2.0,
                    cy: top + self.attribute_radius,
                    radius: self.attribute_radius,
                    ring: self.attribute_ring,
                }
            })
            .collect()
    }

    /// Top-left corner for artwork of the given size: centred horizontally,
    /// centred vertically in the band above the artwork anchor.
    pub fn artwork_origin(&self, art_width: f32, art_height: f32) -> Point {
        let x = ((self.canvas_width - art_width) / 2.0).floor();
        let y = ((self.artwork_anchor - art_height) / 2.0).floor();
        (x, y)
    }

    /// Lowest y the details text may reach before touching the border.
    pub fn text_limit(&self) -> f32 {
        self.canvas_height - self.border
    }
}
