//! Common test fixtures for geo service tests.

/// Query boxes as `(lat, lng)` corners: north-west, north-east,
/// south-west, south-east.
pub mod boxes {
    pub type Corners = [(f64, f64); 4];

    /// Small field near Milagro, Ecuador.
    pub const MILAGRO: Corners = [
        (-2.1660, -79.6320),
        (-2.1660, -79.6280),
        (-2.1690, -79.6320),
        (-2.1690, -79.6280),
    ];

    /// Open Pacific ocean, far from any fixture raster.
    pub const OPEN_OCEAN: Corners = [
        (-10.0, -120.0),
        (-10.0, -119.0),
        (-11.0, -120.0),
        (-11.0, -119.0),
    ];

    /// Footprint overlapping the east half of [`MILAGRO`].
    pub const MILAGRO_EAST_TILE: Corners = [
        (-2.1665, -79.6300),
        (-2.1665, -79.6200),
        (-2.1800, -79.6300),
        (-2.1800, -79.6200),
    ];
}

/// Common time values for testing.
pub mod time {
    /// A fixed reference time for tests.
    pub const REFERENCE_TIME: &str = "2024-06-15T12:00:00Z";

    /// One day before [`REFERENCE_TIME`].
    pub const DAY_BEFORE: &str = "2024-06-14T08:00:00Z";

    /// One day after [`REFERENCE_TIME`].
    pub const DAY_AFTER: &str = "2024-06-16T08:00:00Z";
}

/// Workspace identifiers.
pub mod workspace {
    pub const DEFAULT: &str = "42";
}
