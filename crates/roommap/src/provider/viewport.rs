//! Web-Mercator helpers used by both backends for viewport fitting, overlay drawing and hit
//! testing. Coordinates follow the `geo` convention: `x` is the longitude, `y` the latitude.

use std::f64::consts::PI;

use geo::BoundingRect;
use geo_types::{Coord, MultiPoint, Point, Rect};

pub const EARTH_RADIUS: f64 = 6_378_137.0;
pub const TILE_SIZE: f64 = 256.0;
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;
/// Zoom used when fitting a single position or a very small cluster.
pub const MAX_FIT_ZOOM: f64 = 16.0;
pub const FIT_PADDING: f64 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenSize {
    pub width: f64,
    pub height: f64,
}

impl ScreenSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

impl Default for ScreenSize {
    fn default() -> Self {
        Self::new(800.0, 600.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub center: Coord<f64>,
    pub zoom: f64,
}

impl Viewport {
    pub fn new(center: Coord<f64>, zoom: f64) -> Self {
        Self { center, zoom }
    }

    pub fn resolution(&self) -> f64 {
        resolution_for_zoom(self.zoom)
    }

    /// Pixel position of `position` inside a viewport of `size`, origin top left.
    pub fn to_screen(&self, position: Coord<f64>, size: ScreenSize) -> Coord<f64> {
        let resolution = self.resolution();
        let center = project(self.center);
        let point = project(position);

        Coord {
            x: size.width / 2.0 + (point.x - center.x) / resolution,
            y: size.height / 2.0 - (point.y - center.y) / resolution,
        }
    }

    pub fn from_screen(&self, pixel: Coord<f64>, size: ScreenSize) -> Coord<f64> {
        let resolution = self.resolution();
        let center = project(self.center);

        unproject(Coord {
            x: center.x + (pixel.x - size.width / 2.0) * resolution,
            y: center.y - (pixel.y - size.height / 2.0) * resolution,
        })
    }
}

/// Projects WGS84 degrees to Web-Mercator meters.
pub fn project(position: Coord<f64>) -> Coord<f64> {
    let lat = position.y.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();

    Coord {
        x: EARTH_RADIUS * position.x.to_radians(),
        y: EARTH_RADIUS * (PI / 4.0 + lat / 2.0).tan().ln(),
    }
}

pub fn unproject(meters: Coord<f64>) -> Coord<f64> {
    Coord {
        x: (meters.x / EARTH_RADIUS).to_degrees(),
        y: (2.0 * (meters.y / EARTH_RADIUS).exp().atan() - PI / 2.0).to_degrees(),
    }
}

/// Meters per pixel at `zoom` for 256px tiles.
pub fn resolution_for_zoom(zoom: f64) -> f64 {
    2.0 * PI * EARTH_RADIUS / (TILE_SIZE * 2f64.powf(zoom))
}

pub fn zoom_for_resolution(resolution: f64) -> f64 {
    (2.0 * PI * EARTH_RADIUS / (TILE_SIZE * resolution)).log2()
}

/// Geographic bounding box of `positions`.
pub fn bounds(positions: &[Coord<f64>]) -> Option<Rect<f64>> {
    MultiPoint::from(
        positions
            .iter()
            .map(|position| Point::from(*position))
            .collect::<Vec<_>>(),
    )
    .bounding_rect()
}

/// Viewport that shows every position inside `size`, keeping `padding` pixels free on each
/// side. Returns `None` for an empty slice.
pub fn fit(
    positions: &[Coord<f64>],
    size: ScreenSize,
    padding: f64,
    max_zoom: f64,
) -> Option<Viewport> {
    let rect = bounds(positions)?;
    let min = project(rect.min());
    let max = project(rect.max());
    let center = unproject(Coord {
        x: (min.x + max.x) / 2.0,
        y: (min.y + max.y) / 2.0,
    });

    let usable_width = (size.width - 2.0 * padding).max(1.0);
    let usable_height = (size.height - 2.0 * padding).max(1.0);
    let resolution = ((max.x - min.x) / usable_width).max((max.y - min.y) / usable_height);

    let zoom = if resolution > 0.0 {
        zoom_for_resolution(resolution).min(max_zoom)
    } else {
        max_zoom
    };

    Some(Viewport::new(center, zoom))
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    const MUMBAI: Coord<f64> = Coord {
        x: 72.8777,
        y: 19.076,
    };

    #[test]
    fn projection_round_trips() {
        let back = unproject(project(MUMBAI));
        assert_relative_eq!(back.x, MUMBAI.x, epsilon = 1e-9);
        assert_relative_eq!(back.y, MUMBAI.y, epsilon = 1e-9);
    }

    #[test]
    fn zoom_zero_shows_the_world_in_one_tile() {
        assert_relative_eq!(resolution_for_zoom(0.0), 156_543.033_928_041, epsilon = 1e-6);
        assert_relative_eq!(
            zoom_for_resolution(resolution_for_zoom(14.0)),
            14.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn empty_fit_is_none() {
        assert_eq!(fit(&[], ScreenSize::default(), FIT_PADDING, MAX_FIT_ZOOM), None);
    }

    #[test]
    fn single_position_fits_at_max_zoom() {
        let viewport = fit(&[MUMBAI], ScreenSize::default(), FIT_PADDING, MAX_FIT_ZOOM).unwrap();
        assert_relative_eq!(viewport.center.x, MUMBAI.x, epsilon = 1e-9);
        assert_relative_eq!(viewport.center.y, MUMBAI.y, epsilon = 1e-9);
        assert_eq!(viewport.zoom, MAX_FIT_ZOOM);
    }

    #[test]
    fn fitted_positions_are_on_screen() {
        let positions = [
            Coord { x: 72.8777, y: 19.0760 },
            Coord { x: 72.8697, y: 19.1136 },
            Coord { x: 72.8569, y: 19.0330 },
            Coord { x: 72.9080, y: 19.1197 },
        ];
        let size = ScreenSize::new(1024.0, 768.0);
        let viewport = fit(&positions, size, FIT_PADDING, MAX_FIT_ZOOM).unwrap();

        assert!(viewport.zoom < MAX_FIT_ZOOM);
        for position in positions {
            let pixel = viewport.to_screen(position, size);
            assert!(pixel.x >= FIT_PADDING - 1e-6 && pixel.x <= size.width - FIT_PADDING + 1e-6);
            assert!(pixel.y >= FIT_PADDING - 1e-6 && pixel.y <= size.height - FIT_PADDING + 1e-6);
        }
    }

    #[test]
    fn screen_round_trip() {
        let viewport = Viewport::new(MUMBAI, 12.0);
        let size = ScreenSize::default();
        let pixel = viewport.to_screen(Coord { x: 72.85, y: 19.05 }, size);
        let back = viewport.from_screen(pixel, size);

        assert_relative_eq!(back.x, 72.85, epsilon = 1e-9);
        assert_relative_eq!(back.y, 19.05, epsilon = 1e-9);
        assert_eq!(
            viewport.to_screen(MUMBAI, size),
            Coord { x: 400.0, y: 300.0 }
        );
    }
}
