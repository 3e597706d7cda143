use serde::{Deserialize, Serialize};

/// Padding in screen pixels around fitted markers.
pub const FIT_PADDING_PX: f64 = 50.0;

/// Zoom ceiling when fitting to markers, so one marker (or a tight cluster)
/// does not zoom to street level.
pub const FIT_MAX_ZOOM: f64 = 15.0;

/// Zoom used when centering on a selected resource.
pub const FOCUS_ZOOM: f64 = 15.0;

/// Initial viewport before any marker exists.
pub const INITIAL_CENTER: LatLng = LatLng { lat: 0.0, lng: 0.0 };
pub const INITIAL_ZOOM: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        LatLng { lat, lng }
    }
}

/// Axis-aligned bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl Bounds {
    /// Smallest box containing every point. `None` for an empty set.
    pub fn from_points<I>(points: I) -> Option<Bounds>
    where
        I: IntoIterator<Item = LatLng>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bounds = Bounds {
            south: first.lat,
            west: first.lng,
            north: first.lat,
            east: first.lng,
        };
        for p in iter {
            bounds.extend(p);
        }
        Some(bounds)
    }

    pub fn extend(&mut self, p: LatLng) {
        self.south = self.south.min(p.lat);
        self.north = self.north.max(p.lat);
        self.west = self.west.min(p.lng);
        self.east = self.east.max(p.lng);
    }

    pub fn contains(&self, p: LatLng) -> bool {
        p.lat >= self.south && p.lat <= self.north && p.lng >= self.west && p.lng <= self.east
    }

    pub fn center(&self) -> LatLng {
        LatLng {
            lat: (self.south + self.north) / 2.0,
            lng: (self.west + self.east) / 2.0,
        }
    }

    /// A single point (or coincident points) gives a zero-area box.
    pub fn is_point(&self) -> bool {
        self.south == self.north && self.west == self.east
    }

    /// `[[south, west], [north, east]]`, the corner-pair form map libraries take.
    pub fn corners(&self) -> [[f64; 2]; 2] {
        [[self.south, self.west], [self.north, self.east]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_empty_is_none() {
        assert!(Bounds::from_points(Vec::<LatLng>::new()).is_none());
    }

    #[test]
    fn test_bounds_single_point() {
        let b = Bounds::from_points([LatLng::new(10.0, 20.0)]).unwrap();
        assert!(b.is_point());
        assert!(b.contains(LatLng::new(10.0, 20.0)));
        assert!(!b.contains(LatLng::new(10.0, 20.5)));
        assert_eq!(b.corners(), [[10.0, 20.0], [10.0, 20.0]]);
    }

    #[test]
    fn test_bounds_spans_all_points() {
        let b = Bounds::from_points([
            LatLng::new(44.9, -93.3),
            LatLng::new(45.1, -93.1),
            LatLng::new(44.8, -92.9),
        ])
        .unwrap();
        assert_eq!(b.south, 44.8);
        assert_eq!(b.north, 45.1);
        assert_eq!(b.west, -93.3);
        assert_eq!(b.east, -92.9);
        let c = b.center();
        assert!((c.lat - 44.95).abs() < 1e-9);
        assert!((c.lng + 93.1).abs() < 1e-9);
    }
}
