//! Corner shapes for rendered thumbnails

/// Width/height pair
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    /// Horizontal extent
    pub width: f64,
    /// Vertical extent
    pub height: f64,
}

/// Edge insets
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Insets {
    /// Top inset
    pub top: f64,
    /// Left inset
    pub left: f64,
    /// Bottom inset
    pub bottom: f64,
    /// Right inset
    pub right: f64,
}

/// Shape of one corner
#[derive(Debug, Clone, Copy)]
pub enum ImageCorner {
    /// Rounded corner with the given radius
    Corner(f64),
    /// Speech-bubble tail with the given radius
    Tail(f64),
}

/// Width a tail adds outside the image bounds
const TAIL_EXTENSION: f64 = 3.0;

impl ImageCorner {
    /// Space the corner needs outside the image bounds
    pub fn extended_insets(&self) -> Size {
        match self {
            ImageCorner::Tail(_) => Size {
                width: TAIL_EXTENSION,
                height: 0.0,
            },
            ImageCorner::Corner(_) => Size::default(),
        }
    }

    /// Corner radius
    pub fn radius(&self) -> f64 {
        match self {
            ImageCorner::Corner(radius) | ImageCorner::Tail(radius) => *radius,
        }
    }
}

// Radii compare with single-precision tolerance
impl PartialEq for ImageCorner {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ImageCorner::Corner(lhs), ImageCorner::Corner(rhs))
            | (ImageCorner::Tail(lhs), ImageCorner::Tail(rhs)) => {
                (lhs - rhs).abs() < f32::EPSILON as f64
            }
            _ => false,
        }
    }
}

/// Shapes of all four corners
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageCorners {
    /// Top left corner
    pub top_left: ImageCorner,
    /// Top right corner
    pub top_right: ImageCorner,
    /// Bottom left corner
    pub bottom_left: ImageCorner,
    /// Bottom right corner
    pub bottom_right: ImageCorner,
}

impl ImageCorners {
    /// Same rounded radius on every corner
    pub fn with_radius(radius: f64) -> Self {
        Self {
            top_left: ImageCorner::Corner(radius),
            top_right: ImageCorner::Corner(radius),
            bottom_left: ImageCorner::Corner(radius),
            bottom_right: ImageCorner::Corner(radius),
        }
    }

    /// Horizontal space bottom tails need outside the image bounds
    pub fn extended_edges(&self) -> Insets {
        Insets {
            top: 0.0,
            left: self.bottom_left.extended_insets().width,
            bottom: 0.0,
            right: self.bottom_right.extended_insets().width,
        }
    }
}

impl Default for ImageCorners {
    fn default() -> Self {
        Self::with_radius(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corner_equality_uses_tolerance() {
        assert_eq!(ImageCorner::Corner(4.0), ImageCorner::Corner(4.0 + 1e-9));
        assert_ne!(ImageCorner::Corner(4.0), ImageCorner::Corner(4.1));
        assert_ne!(ImageCorner::Corner(4.0), ImageCorner::Tail(4.0));
    }

    #[test]
    fn test_tail_extends_edges() {
        let corners = ImageCorners {
            bottom_right: ImageCorner::Tail(8.0),
            ..ImageCorners::with_radius(8.0)
        };
        let edges = corners.extended_edges();
        assert_eq!(edges.left, 0.0);
        assert_eq!(edges.right, 3.0);
        assert_eq!(corners.bottom_right.radius(), 8.0);
    }

    #[test]
    fn test_default_is_square() {
        let corners = ImageCorners::default();
        assert_eq!(corners, ImageCorners::with_radius(0.0));
        assert_eq!(corners.extended_edges(), Insets::default());
    }
}
