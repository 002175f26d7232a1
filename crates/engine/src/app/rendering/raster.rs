use crate::app::Rgba;

pub(crate) fn clear(frame: &mut [u8], color: Rgba) {
    for chunk in frame.chunks_exact_mut(4) {
        chunk.copy_from_slice(&color);
    }
}

pub(crate) fn write_pixel_rgba_clipped(frame: &mut [u8], width: usize, x: i32, y: i32, color: Rgba) {
    if x < 0 || y < 0 || x as usize >= width {
        return;
    }
    let x = x as usize;
    let y = y as usize;
    let Some(pixel_offset) = y.checked_mul(width).and_then(|row| row.checked_add(x)) else {
        return;
    };
    let Some(byte_offset) = pixel_offset.checked_mul(4) else {
        return;
    };
    let Some(end) = byte_offset.checked_add(4) else {
        return;
    };
    if end > frame.len() {
        return;
    }
    frame[byte_offset..end].copy_from_slice(&color);
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn fill_rect(
    frame: &mut [u8],
    width: u32,
    height: u32,
    x: i32,
    y: i32,
    rect_width: i32,
    rect_height: i32,
    color: Rgba,
) {
    let start_x = x.max(0);
    let start_y = y.max(0);
    let end_x = x.saturating_add(rect_width).min(width as i32);
    let end_y = y.saturating_add(rect_height).min(height as i32);
    if end_x <= start_x || end_y <= start_y {
        return;
    }
    for py in start_y..end_y {
        for px in start_x..end_x {
            write_pixel_rgba_clipped(frame, width as usize, px, py, color);
        }
    }
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn stroke_rect(
    frame: &mut [u8],
    width: u32,
    height: u32,
    x: i32,
    y: i32,
    rect_width: i32,
    rect_height: i32,
    thickness: i32,
    color: Rgba,
) {
    let t = thickness.max(1);
    if rect_width <= t || rect_height <= t {
        fill_rect(frame, width, height, x, y, rect_width, rect_height, color);
        return;
    }
    fill_rect(frame, width, height, x, y, rect_width, t, color);
    fill_rect(frame, width, height, x, y + rect_height - t, rect_width, t, color);
    fill_rect(frame, width, height, x, y, t, rect_height, color);
    fill_rect(frame, width, height, x + rect_width - t, y, t, rect_height, color);
}

pub(crate) fn fill_circle(
    frame: &mut [u8],
    width: u32,
    height: u32,
    center: (i32, i32),
    radius: f32,
    color: Rgba,
) {
    if !(radius.is_finite() && radius > 0.0) {
        return;
    }
    let r_sq = radius * radius;
    for_each_in_circle_bounds(width, height, center, radius, |x, y, dist_sq| {
        if dist_sq <= r_sq {
            write_pixel_rgba_clipped(frame, width as usize, x, y, color);
        }
    });
}

/// Band of `thickness` pixels centred on `radius`.
pub(crate) fn stroke_circle(
    frame: &mut [u8],
    width: u32,
    height: u32,
    center: (i32, i32),
    radius: f32,
    thickness: f32,
    color: Rgba,
) {
    if !(radius.is_finite() && radius > 0.0 && thickness.is_finite() && thickness > 0.0) {
        return;
    }
    let inner = (radius - thickness * 0.5).max(0.0);
    let outer = radius + thickness * 0.5;
    let inner_sq = inner * inner;
    let outer_sq = outer * outer;
    for_each_in_circle_bounds(width, height, center, outer, |x, y, dist_sq| {
        if dist_sq >= inner_sq && dist_sq <= outer_sq {
            write_pixel_rgba_clipped(frame, width as usize, x, y, color);
        }
    });
}

fn for_each_in_circle_bounds<F>(width: u32, height: u32, center: (i32, i32), radius: f32, mut f: F)
where
    F: FnMut(i32, i32, f32),
{
    let reach = radius.ceil() as i32;
    let (cx, cy) = center;
    let min_x = cx.saturating_sub(reach).max(0);
    let max_x = cx.saturating_add(reach).min(width as i32 - 1);
    let min_y = cy.saturating_sub(reach).max(0);
    let max_y = cy.saturating_add(reach).min(height as i32 - 1);
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let dx = (x - cx) as f32;
            let dy = (y - cy) as f32;
            f(x, y, dx * dx + dy * dy);
        }
    }
}

pub(crate) fn draw_line(
    frame: &mut [u8],
    width: u32,
    from: (i32, i32),
    to: (i32, i32),
    color: Rgba,
) {
    let (mut x, mut y) = from;
    let (x1, y1) = to;
    let dx = (x1 - x).abs();
    let dy = -(y1 - y).abs();
    let step_x = if x < x1 { 1 } else { -1 };
    let step_y = if y < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    loop {
        write_pixel_rgba_clipped(frame, width as usize, x, y, color);
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += step_x;
        }
        if e2 <= dx {
            err += dx;
            y += step_y;
        }
    }
}
