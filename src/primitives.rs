//! Composite drawing primitives
//!
//! `embedded-graphics` supplies lines, rectangles, circles and triangles. The
//! shapes here are composed from those:
//!
//! - rounded rectangle fill: two overlapping rectangles plus four corner disks
//! - rounded rectangle outline: four edge lines plus four quarter arcs, each
//!   arc being a circle outline clipped to its corner quadrant
//! - dashed line: alternating drawn and skipped spans along a straight segment
//!
//! All functions are generic over the draw target, so they work on
//! [`crate::canvas::Canvas`] and on any other `embedded-graphics` target.

use embedded_graphics::{
    pixelcolor::Rgb888,
    prelude::*,
    primitives::{Circle, Line, PrimitiveStyle, Rectangle},
};

/// Corner radius limited to half the shorter side of `area`.
pub fn clamp_radius(area: &Rectangle, radius: u32) -> u32 {
    radius.min(area.size.width / 2).min(area.size.height / 2)
}

/// Top-left squares (side `2 * radius`) holding the four corner circles,
/// in the order top-left, top-right, bottom-left, bottom-right.
fn corner_boxes(area: &Rectangle, radius: u32) -> [Rectangle; 4] {
    let d = 2 * radius;
    let x0 = area.top_left.x;
    let y0 = area.top_left.y;
    let x1 = x0 + (area.size.width - d) as i32;
    let y1 = y0 + (area.size.height - d) as i32;
    let size = Size::new(d, d);
    [
        Rectangle::new(Point::new(x0, y0), size),
        Rectangle::new(Point::new(x1, y0), size),
        Rectangle::new(Point::new(x0, y1), size),
        Rectangle::new(Point::new(x1, y1), size),
    ]
}

/// Fill a rectangle with rounded corners.
pub fn fill_rounded_rect<D>(
    target: &mut D,
    area: &Rectangle,
    radius: u32,
    color: Rgb888,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb888>,
{
    if area.size.width == 0 || area.size.height == 0 {
        return Ok(());
    }
    let fill = PrimitiveStyle::with_fill(color);
    let r = clamp_radius(area, radius);
    if r == 0 {
        return area.into_styled(fill).draw(target);
    }

    let d = 2 * r;
    let ri = r as i32;
    Rectangle::new(
        area.top_left + Point::new(ri, 0),
        Size::new(area.size.width - d, area.size.height),
    )
    .into_styled(fill)
    .draw(target)?;
    Rectangle::new(
        area.top_left + Point::new(0, ri),
        Size::new(area.size.width, area.size.height - d),
    )
    .into_styled(fill)
    .draw(target)?;

    for corner in corner_boxes(area, r) {
        Circle::new(corner.top_left, d)
            .into_styled(fill)
            .draw(target)?;
    }
    Ok(())
}

/// Outline a rectangle with rounded corners using a centered stroke.
pub fn stroke_rounded_rect<D>(
    target: &mut D,
    area: &Rectangle,
    radius: u32,
    color: Rgb888,
    width: u32,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb888>,
{
    if area.size.width == 0 || area.size.height == 0 || width == 0 {
        return Ok(());
    }
    let stroke = PrimitiveStyle::with_stroke(color, width);
    let r = clamp_radius(area, radius);
    let ri = r as i32;
    let x0 = area.top_left.x;
    let y0 = area.top_left.y;
    let x1 = x0 + area.size.width as i32 - 1;
    let y1 = y0 + area.size.height as i32 - 1;

    let edges = [
        (Point::new(x0 + ri, y0), Point::new(x1 - ri, y0)),
        (Point::new(x0 + ri, y1), Point::new(x1 - ri, y1)),
        (Point::new(x0, y0 + ri), Point::new(x0, y1 - ri)),
        (Point::new(x1, y0 + ri), Point::new(x1, y1 - ri)),
    ];
    for (start, end) in edges {
        // Fully rounded sides have no straight part left
        if start.x <= end.x && start.y <= end.y {
            Line::new(start, end).into_styled(stroke).draw(target)?;
        }
    }

    if r == 0 {
        return Ok(());
    }

    let w = width as i32;
    let side = r.saturating_add(width);
    let quadrant = Size::new(side, side);
    let boxes = corner_boxes(area, r);
    let quadrants = [
        Point::new(x0 - w, y0 - w),
        Point::new(x1 - ri + 1, y0 - w),
        Point::new(x0 - w, y1 - ri + 1),
        Point::new(x1 - ri + 1, y1 - ri + 1),
    ];
    for (corner, clip_origin) in boxes.iter().zip(quadrants) {
        let clip = Rectangle::new(clip_origin, quadrant);
        Circle::new(corner.top_left, 2 * r)
            .into_styled(stroke)
            .draw(&mut target.clipped(&clip))?;
    }
    Ok(())
}

/// Draw a dashed line from `start` to `end`.
///
/// Dashes of `dash` pixels alternate with gaps of `gap` pixels, starting with
/// a dash at `start`; the last dash is cut at `end`. A zero-length line or a
/// zero dash length draws nothing.
pub fn dashed_line<D>(
    target: &mut D,
    start: Point,
    end: Point,
    dash: u32,
    gap: u32,
    color: Rgb888,
    width: u32,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb888>,
{
    let dx = (end.x - start.x) as f32;
    let dy = (end.y - start.y) as f32;
    let length = (dx * dx + dy * dy).sqrt();
    if length == 0.0 || dash == 0 || width == 0 {
        return Ok(());
    }

    let (ux, uy) = (dx / length, dy / length);
    let at = |pos: f32| {
        Point::new(
            (start.x as f32 + ux * pos).round() as i32,
            (start.y as f32 + uy * pos).round() as i32,
        )
    };
    let stroke = PrimitiveStyle::with_stroke(color, width);
    let step = dash.saturating_add(gap) as f32;

    let mut pos = 0.0;
    while pos < length {
        let dash_end = (pos + dash as f32).min(length);
        Line::new(at(pos), at(dash_end))
            .into_styled(stroke)
            .draw(target)?;
        pos += step;
    }
    Ok(())
}
