use {
    super::crs::Crs,
    crate::error::{HcsError, Result},
    geo::{Coord, Rect},
    ndarray::Array2,
    serde::{Deserialize, Serialize},
};

/// Boolean cell selection co-registered with a [`Grid`].
pub type Mask = Array2<bool>;

/// Affine georeference in GDAL ordering:
/// `x = origin_x + col*pixel_width + row*rotation_x`,
/// `y = origin_y + col*rotation_y + row*pixel_height`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub pixel_width: f64,
    pub rotation_x: f64,
    pub origin_y: f64,
    pub rotation_y: f64,
    /// Negative for north-up rasters
    pub pixel_height: f64,
}

impl GeoTransform {
    /// North-up transform covering `[west, east] x [south, north]` with `cols x rows` pixels.
    pub fn from_bounds(west: f64, south: f64, east: f64, north: f64, cols: usize, rows: usize) -> Self {
        Self {
            origin_x: west,
            pixel_width: (east - west) / cols.max(1) as f64,
            rotation_x: 0.0,
            origin_y: north,
            rotation_y: 0.0,
            pixel_height: -(north - south) / rows.max(1) as f64,
        }
    }

    /// Fractional pixel position → world coordinate.
    pub fn apply(&self, col: f64, row: f64) -> Coord<f64> {
        Coord {
            x: self.origin_x + col * self.pixel_width + row * self.rotation_x,
            y: self.origin_y + col * self.rotation_y + row * self.pixel_height,
        }
    }

    /// World coordinate → fractional (col, row). `None` for a singular transform.
    pub fn invert(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let det = self.pixel_width * self.pixel_height - self.rotation_x * self.rotation_y;
        if det.abs() < f64::EPSILON * f64::EPSILON {
            return None;
        }
        let dx = x - self.origin_x;
        let dy = y - self.origin_y;
        let col = (dx * self.pixel_height - dy * self.rotation_x) / det;
        let row = (dy * self.pixel_width - dx * self.rotation_y) / det;
        Some((col, row))
    }
}

/// A single-band raster. NaN is the no-data sentinel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    pub data: Array2<f64>,
    pub transform: GeoTransform,
    pub crs: Crs,
}

impl Grid {
    pub fn new(data: Array2<f64>, transform: GeoTransform, crs: Crs) -> Self {
        Self {
            data,
            transform,
            crs,
        }
    }

    pub fn filled(shape: (usize, usize), value: f64, transform: GeoTransform, crs: Crs) -> Self {
        Self::new(Array2::from_elem(shape, value), transform, crs)
    }

    /// (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.data.get((row, col)).copied()
    }

    pub fn cell_center(&self, row: usize, col: usize) -> Coord<f64> {
        self.transform.apply(col as f64 + 0.5, row as f64 + 0.5)
    }

    /// The cell containing a world coordinate, if it falls inside the raster.
    pub fn world_to_pixel(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        let (col, row) = self.transform.invert(x, y)?;
        let (rows, cols) = self.shape();
        if col < 0.0 || row < 0.0 || col >= cols as f64 || row >= rows as f64 {
            return None;
        }
        Some((row.floor() as usize, col.floor() as usize))
    }

    /// Axis-aligned world extent of the four raster corners.
    pub fn extent(&self) -> Rect<f64> {
        let (rows, cols) = self.shape();
        let corners = [
            self.transform.apply(0.0, 0.0),
            self.transform.apply(cols as f64, 0.0),
            self.transform.apply(0.0, rows as f64),
            self.transform.apply(cols as f64, rows as f64),
        ];
        let (min, max) = corners.iter().skip(1).fold((corners[0], corners[0]), |(lo, hi), c| {
            (
                Coord { x: lo.x.min(c.x), y: lo.y.min(c.y) },
                Coord { x: hi.x.max(c.x), y: hi.y.max(c.y) },
            )
        });
        Rect::new(min, max)
    }

    pub fn valid_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.data.iter().copied().filter(|v| !v.is_nan())
    }

    pub fn same_shape(&self, other: &Grid) -> bool {
        self.shape() == other.shape()
    }

    /// New grid sharing this georeference. The data must match the current shape.
    pub fn with_data(&self, data: Array2<f64>) -> Result<Grid> {
        if data.dim() != self.shape() {
            return Err(HcsError::Validation(format!(
                "grid shape {:?} does not match {:?}",
                data.dim(),
                self.shape()
            )));
        }
        Ok(Self::new(data, self.transform, self.crs))
    }

    /// Pixel edge length in linear CRS units (for north-up rasters).
    pub fn pixel_size(&self) -> f64 {
        self.transform.pixel_width.abs()
    }
}
