use std::fmt;

/// Bounding box of the touch surface in device coordinates (pixels, or
/// terminal cells), y growing downward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Surface {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Surface {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        self.width > 0.0
            && self.height > 0.0
            && (self.left..=self.left + self.width).contains(&x)
            && (self.top..=self.top + self.height).contains(&y)
    }

    /// Map an event to [0,1]×[0,1] with y measured up from the bottom edge.
    /// Events past an edge clamp onto it. Only a degenerate surface or a
    /// non-finite position maps to `None`.
    pub fn normalize(&self, event: PointerEvent) -> Option<PointerPosition> {
        let degenerate = !(self.width > 0.0 && self.height > 0.0);
        if degenerate || !event.client_x.is_finite() || !event.client_y.is_finite() {
            return None;
        }
        Some(PointerPosition {
            x: ((event.client_x - self.left) / self.width).clamp(0.0, 1.0),
            y: (1.0 - (event.client_y - self.top) / self.height).clamp(0.0, 1.0),
        })
    }
}

/// One finger on a touch screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchPoint {
    pub client_x: f32,
    pub client_y: f32,
}

/// A pointer position in device coordinates, from a mouse or a touch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub client_x: f32,
    pub client_y: f32,
}

impl PointerEvent {
    pub fn mouse(client_x: f32, client_y: f32) -> Self {
        Self { client_x, client_y }
    }

    /// The first touch drives the pad; any further fingers are ignored.
    pub fn from_touches(touches: &[TouchPoint]) -> Option<Self> {
        touches.first().map(|touch| Self {
            client_x: touch.client_x,
            client_y: touch.client_y,
        })
    }
}

/// Normalized pad position, y = 0 at the bottom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerPosition {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hsl {
    pub hue: u16,
    pub saturation: u8,
    pub lightness: u8,
}

impl Hsl {
    pub fn to_rgb(self) -> (u8, u8, u8) {
        let h = (self.hue % 360) as f32 / 60.0;
        let s = self.saturation.min(100) as f32 / 100.0;
        let l = self.lightness.min(100) as f32 / 100.0;

        let chroma = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let x = chroma * (1.0 - (h % 2.0 - 1.0).abs());
        let (r, g, b) = match h as u32 {
            0 => (chroma, x, 0.0),
            1 => (x, chroma, 0.0),
            2 => (0.0, chroma, x),
            3 => (0.0, x, chroma),
            4 => (x, 0.0, chroma),
            _ => (chroma, 0.0, x),
        };
        let m = l - chroma / 2.0;
        let channel = |v: f32| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
        (channel(r), channel(g), channel(b))
    }
}

impl fmt::Display for Hsl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hsl({}, {}%, {}%)", self.hue, self.saturation, self.lightness)
    }
}

/// Where to draw the pointer dot and in which colour. Display only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerIndicator {
    /// Offset from the surface's left edge.
    pub x_px: f32,
    /// Offset from the surface's top edge.
    pub y_px: f32,
    pub color: Hsl,
}

impl PointerIndicator {
    pub fn new(position: PointerPosition, surface: &Surface) -> Self {
        let x_px = position.x * surface.width;
        let y_px = (1.0 - position.y) * surface.height;
        let hue = (x_px / surface.width * 360.0).floor().clamp(0.0, 360.0) as u16;
        let lightness = ((y_px / surface.height * 50.0).floor() + 25.0).clamp(0.0, 100.0) as u8;
        Self {
            x_px,
            y_px,
            color: Hsl {
                hue,
                saturation: 100,
                lightness,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pad() -> Surface {
        Surface::new(10.0, 20.0, 200.0, 100.0)
    }

    #[test]
    fn corners_normalize_with_y_up() {
        let bottom_left = pad().normalize(PointerEvent::mouse(10.0, 120.0)).unwrap();
        assert_eq!(bottom_left, PointerPosition { x: 0.0, y: 0.0 });

        let top_right = pad().normalize(PointerEvent::mouse(210.0, 20.0)).unwrap();
        assert_eq!(top_right, PointerPosition { x: 1.0, y: 1.0 });
    }

    #[test]
    fn outside_events_clamp_to_the_edge() {
        let left = pad().normalize(PointerEvent::mouse(5.0, 70.0)).unwrap();
        assert_eq!(left, PointerPosition { x: 0.0, y: 0.5 });

        let below_right = pad().normalize(PointerEvent::mouse(400.0, 121.0)).unwrap();
        assert_eq!(below_right, PointerPosition { x: 1.0, y: 0.0 });

        assert!(!pad().contains(5.0, 70.0));
    }

    #[test]
    fn degenerate_input_is_rejected() {
        let empty = Surface::new(0.0, 0.0, 0.0, 0.0);
        assert_eq!(empty.normalize(PointerEvent::mouse(0.0, 0.0)), None);
        assert_eq!(pad().normalize(PointerEvent::mouse(f32::NAN, 50.0)), None);
        assert_eq!(pad().normalize(PointerEvent::mouse(50.0, f32::INFINITY)), None);
    }

    #[test]
    fn first_touch_wins() {
        let touches = [
            TouchPoint { client_x: 1.0, client_y: 2.0 },
            TouchPoint { client_x: 3.0, client_y: 4.0 },
        ];
        assert_eq!(PointerEvent::from_touches(&touches), Some(PointerEvent::mouse(1.0, 2.0)));
        assert_eq!(PointerEvent::from_touches(&[]), None);
    }

    #[test]
    fn indicator_colour_tracks_position() {
        let surface = pad();
        let left_top = PointerIndicator::new(PointerPosition { x: 0.0, y: 1.0 }, &surface);
        assert_eq!((left_top.x_px, left_top.y_px), (0.0, 0.0));
        assert_eq!(left_top.color, Hsl { hue: 0, saturation: 100, lightness: 25 });
        assert_eq!(left_top.color.to_string(), "hsl(0, 100%, 25%)");

        let middle = PointerIndicator::new(PointerPosition { x: 0.5, y: 0.0 }, &surface);
        assert_eq!(middle.color.hue, 180);
        assert_eq!(middle.color.lightness, 75);
    }

    #[test]
    fn hsl_primaries() {
        let red = Hsl { hue: 0, saturation: 100, lightness: 50 };
        assert_eq!(red.to_rgb(), (255, 0, 0));
        let cyan = Hsl { hue: 180, saturation: 100, lightness: 50 };
        assert_eq!(cyan.to_rgb(), (0, 255, 255));
    }
}
