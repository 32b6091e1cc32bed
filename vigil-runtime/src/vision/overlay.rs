use super::{Frame, Orientation};

/// Setpoint guide color.
pub const GUIDE_COLOR: [u8; 3] = [255, 0, 255];
/// Target marker color.
pub const MARKER_COLOR: [u8; 3] = [0, 255, 0];
/// Connector color.
pub const CONNECTOR_COLOR: [u8; 3] = [255, 255, 0];

const MARKER_RADIUS: i64 = 4;

/// Draw the setpoint guide, the target marker and a connector between them.
pub fn guide(frame: &mut Frame, orientation: Orientation, setpoint: f32, point: (f32, f32)) {
    if frame.pixels.is_none() {
        return;
    }

    let (x, y) = point;

    match orientation {
        Orientation::Horizontal => {
            for row in 0..frame.height as i64 {
                frame.put_pixel(setpoint.round() as i64, row, GUIDE_COLOR);
            }
            line(frame, (x, y), (setpoint, y), CONNECTOR_COLOR);
        }
        Orientation::Vertical => {
            for column in 0..frame.width as i64 {
                frame.put_pixel(column, setpoint.round() as i64, GUIDE_COLOR);
            }
            line(frame, (x, y), (x, setpoint), CONNECTOR_COLOR);
        }
    }

    marker(frame, point, MARKER_COLOR);
}

/// Draw a filled square marker centered on the point.
pub fn marker(frame: &mut Frame, point: (f32, f32), color: [u8; 3]) {
    let (cx, cy) = (point.0.round() as i64, point.1.round() as i64);

    for y in cy - MARKER_RADIUS..=cy + MARKER_RADIUS {
        for x in cx - MARKER_RADIUS..=cx + MARKER_RADIUS {
            frame.put_pixel(x, y, color);
        }
    }
}

/// Draw a straight line between two points.
pub fn line(frame: &mut Frame, from: (f32, f32), to: (f32, f32), color: [u8; 3]) {
    let steps = (to.0 - from.0).abs().max((to.1 - from.1).abs()).ceil() as usize;
    if steps == 0 {
        frame.put_pixel(from.0.round() as i64, from.1.round() as i64, color);
        return;
    }

    for step in 0..=steps {
        let t = step as f32 / steps as f32;
        let x = crate::math::lerp(from.0, to.0, t);
        let y = crate::math::lerp(from.1, to.1, t);
        frame.put_pixel(x.round() as i64, y.round() as i64, color);
    }
}

/// Draw the outline of a bounding box.
pub fn rectangle(frame: &mut Frame, bbox: (f32, f32, f32, f32), color: [u8; 3]) {
    let (x, y, w, h) = bbox;

    line(frame, (x, y), (x + w, y), color);
    line(frame, (x + w, y), (x + w, y + h), color);
    line(frame, (x + w, y + h), (x, y + h), color);
    line(frame, (x, y + h), (x, y), color);
}
