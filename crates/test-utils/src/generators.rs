//! Synthetic shapefile generators.
//!
//! Builds byte-exact `.shp`/`.shx` pairs so tests never depend on data
//! files on disk.
//!
//! # Example
//!
//! ```
//! use test_utils::{ShapefileBuilder, TestShape};
//!
//! let builder = ShapefileBuilder::points()
//!     .with(TestShape::Point(1.0, 2.0))
//!     .with(TestShape::Point(3.0, 4.0));
//! let shp = builder.build_shp();
//! let shx = builder.build_shx();
//! assert_eq!(shp.len(), 100 + 2 * 28);
//! assert_eq!(shx.len(), 100 + 2 * 8);
//! ```

/// Shape type codes used by the builders.
pub mod shape_type {
    pub const NULL: i32 = 0;
    pub const POINT: i32 = 1;
    pub const POLYLINE: i32 = 3;
    pub const POLYGON: i32 = 5;
    pub const MULTIPOINT: i32 = 8;
}

/// One record to encode.
#[derive(Debug, Clone)]
pub enum TestShape {
    Null,
    Point(f64, f64),
    MultiPoint(Vec<(f64, f64)>),
    PolyLine(Vec<Vec<(f64, f64)>>),
    Polygon(Vec<Vec<(f64, f64)>>),
}

impl TestShape {
    fn type_code(&self) -> i32 {
        match self {
            TestShape::Null => shape_type::NULL,
            TestShape::Point(..) => shape_type::POINT,
            TestShape::MultiPoint(_) => shape_type::MULTIPOINT,
            TestShape::PolyLine(_) => shape_type::POLYLINE,
            TestShape::Polygon(_) => shape_type::POLYGON,
        }
    }

    fn points(&self) -> Vec<(f64, f64)> {
        match self {
            TestShape::Null => vec![],
            TestShape::Point(x, y) => vec![(*x, *y)],
            TestShape::MultiPoint(points) => points.clone(),
            TestShape::PolyLine(parts) | TestShape::Polygon(parts) => {
                parts.iter().flatten().copied().collect()
            }
        }
    }

    /// Little-endian record content, starting with the shape type.
    fn content(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&self.type_code().to_le_bytes());
        match self {
            TestShape::Null => {}
            TestShape::Point(x, y) => {
                out.extend_from_slice(&x.to_le_bytes());
                out.extend_from_slice(&y.to_le_bytes());
            }
            TestShape::MultiPoint(points) => {
                push_bbox(&mut out, &self.points());
                out.extend_from_slice(&(points.len() as i32).to_le_bytes());
                push_points(&mut out, points);
            }
            TestShape::PolyLine(parts) | TestShape::Polygon(parts) => {
                let points = self.points();
                push_bbox(&mut out, &points);
                out.extend_from_slice(&(parts.len() as i32).to_le_bytes());
                out.extend_from_slice(&(points.len() as i32).to_le_bytes());
                let mut start = 0i32;
                for part in parts {
                    out.extend_from_slice(&start.to_le_bytes());
                    start += part.len() as i32;
                }
                push_points(&mut out, &points);
            }
        }
        out
    }
}

/// Builder for a `.shp`/`.shx` pair.
#[derive(Debug, Clone)]
pub struct ShapefileBuilder {
    shape_type: i32,
    shapes: Vec<TestShape>,
}

impl ShapefileBuilder {
    pub fn new(shape_type: i32) -> Self {
        Self {
            shape_type,
            shapes: Vec::new(),
        }
    }

    pub fn points() -> Self {
        Self::new(shape_type::POINT)
    }

    pub fn polylines() -> Self {
        Self::new(shape_type::POLYLINE)
    }

    pub fn polygons() -> Self {
        Self::new(shape_type::POLYGON)
    }

    pub fn with(mut self, shape: TestShape) -> Self {
        self.shapes.push(shape);
        self
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Encode the geometry file.
    pub fn build_shp(&self) -> Vec<u8> {
        let records: Vec<Vec<u8>> = self.shapes.iter().map(TestShape::content).collect();
        let body: usize = records.iter().map(|c| 8 + c.len()).sum();

        let mut out = self.header(100 + body);
        for (i, content) in records.iter().enumerate() {
            out.extend_from_slice(&(i as i32 + 1).to_be_bytes());
            out.extend_from_slice(&((content.len() / 2) as i32).to_be_bytes());
            out.extend_from_slice(content);
        }
        out
    }

    /// Encode the index file matching [`ShapefileBuilder::build_shp`].
    pub fn build_shx(&self) -> Vec<u8> {
        let mut out = self.header(100 + self.shapes.len() * 8);
        let mut offset_words = 50i32;
        for shape in &self.shapes {
            let content_words = (shape.content().len() / 2) as i32;
            out.extend_from_slice(&offset_words.to_be_bytes());
            out.extend_from_slice(&content_words.to_be_bytes());
            offset_words += 4 + content_words;
        }
        out
    }

    fn header(&self, file_length: usize) -> Vec<u8> {
        let points: Vec<(f64, f64)> = self.shapes.iter().flat_map(TestShape::points).collect();
        let mut out = Vec::with_capacity(file_length);
        out.extend_from_slice(&9994i32.to_be_bytes());
        out.extend_from_slice(&[0u8; 20]);
        out.extend_from_slice(&((file_length / 2) as i32).to_be_bytes());
        out.extend_from_slice(&1000i32.to_le_bytes());
        out.extend_from_slice(&self.shape_type.to_le_bytes());
        push_bbox(&mut out, &points);
        out.extend_from_slice(&[0u8; 32]);
        out
    }
}

/// Clockwise (outer) rectangular ring.
pub fn clockwise_square(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Vec<(f64, f64)> {
    vec![
        (min_x, min_y),
        (min_x, max_y),
        (max_x, max_y),
        (max_x, min_y),
        (min_x, min_y),
    ]
}

/// Counter-clockwise (hole) rectangular ring.
pub fn counter_clockwise_square(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Vec<(f64, f64)> {
    let mut ring = clockwise_square(min_x, min_y, max_x, max_y);
    ring.reverse();
    ring
}

/// Polygon shapefile with `count` adjacent unit squares.
pub fn square_polygons(count: usize) -> ShapefileBuilder {
    (0..count).fold(ShapefileBuilder::polygons(), |builder, i| {
        let x = i as f64;
        builder.with(TestShape::Polygon(vec![clockwise_square(x, 0.0, x + 1.0, 1.0)]))
    })
}

fn push_bbox(out: &mut Vec<u8>, points: &[(f64, f64)]) {
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (0.0f64, 0.0f64, 0.0f64, 0.0f64);
    if let Some(&(x, y)) = points.first() {
        (min_x, min_y, max_x, max_y) = (x, y, x, y);
    }
    for &(x, y) in points {
        min_x = min_x.min(x);
        min_y = min_y.min(y);
        max_x = max_x.max(x);
        max_y = max_y.max(y);
    }
    for v in [min_x, min_y, max_x, max_y] {
        out.extend_from_slice(&v.to_le_bytes());
    }
}

fn push_points(out: &mut Vec<u8>, points: &[(f64, f64)]) {
    for (x, y) in points {
        out.extend_from_slice(&x.to_le_bytes());
        out.extend_from_slice(&y.to_le_bytes());
    }
}
