//! Heightmap tessellation.
//!
//! Turns a [`SampleGrid`] into a regular triangulated grid draped over the
//! ellipsoid. Positions are computed in f64 and stored as f32 offsets from a
//! per-tile center, which keeps them small enough for GPU precision; the
//! center itself is kept once per mesh in f64.

use glam::{DVec3, Vec3};

use crate::{
    ellipsoid::Ellipsoid,
    error::TessellationError,
    extent::Extent,
    heightmap::SampleGrid,
};

/// Which attributes to emit and how to lay them out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshOptions {
    /// Emit `(u, v)` texture coordinates spanning the tile.
    pub tex_coords: bool,
    /// Emit geodetic surface normals.
    pub normals: bool,
    /// Pack all attributes of a vertex into a single record.
    pub interleave: bool,
}

impl Default for MeshOptions {
    fn default() -> Self {
        Self {
            tex_coords: true,
            normals: false,
            interleave: false,
        }
    }
}

/// Offsets of each attribute within an interleaved vertex, in floats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexLayout {
    /// Floats per vertex.
    pub stride: usize,
    /// Offset of the `(u, v)` pair, if present.
    pub tex_coord_offset: Option<usize>,
    /// Offset of the normal, if present.
    pub normal_offset: Option<usize>,
}

impl VertexLayout {
    fn for_options(options: &MeshOptions) -> Self {
        let mut stride = 3;
        let tex_coord_offset = options.tex_coords.then(|| {
            let offset = stride;
            stride += 2;
            offset
        });
        let normal_offset = options.normals.then(|| {
            let offset = stride;
            stride += 3;
            offset
        });
        Self {
            stride,
            tex_coord_offset,
            normal_offset,
        }
    }
}

/// Vertex attribute storage.
#[derive(Debug, Clone, PartialEq)]
pub enum VertexData {
    /// One array per attribute.
    Separate {
        positions: Vec<[f32; 3]>,
        tex_coords: Option<Vec<[f32; 2]>>,
        normals: Option<Vec<[f32; 3]>>,
    },
    /// Position first, then the attributes named by `layout`.
    Interleaved { data: Vec<f32>, layout: VertexLayout },
}

/// A tessellated tile, ready for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct TileMesh {
    /// Origin that every stored position is relative to.
    pub center: DVec3,
    /// Vertex attributes.
    pub vertices: VertexData,
    /// Triangle list indices.
    pub indices: Vec<u32>,
    /// Columns of the source grid.
    pub grid_width: u32,
    /// Rows of the source grid.
    pub grid_height: u32,
    /// Lowest elevation in the tile, in meters.
    pub minimum_height: f64,
    /// Highest elevation in the tile, in meters.
    pub maximum_height: f64,
    /// Distance from `center` to the farthest vertex.
    pub bounding_radius: f64,
}

impl TileMesh {
    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        match &self.vertices {
            VertexData::Separate { positions, .. } => positions.len(),
            VertexData::Interleaved { data, layout } => data.len() / layout.stride,
        }
    }

    /// Number of triangles.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Position of vertex `index`, relative to [`TileMesh::center`].
    #[must_use]
    pub fn relative_position(&self, index: usize) -> Option<Vec3> {
        match &self.vertices {
            VertexData::Separate { positions, .. } => positions.get(index).map(|&p| Vec3::from(p)),
            VertexData::Interleaved { data, layout } => {
                let start = index.checked_mul(layout.stride)?;
                data.get(start..start.checked_add(3)?)
                    .map(Vec3::from_slice)
            }
        }
    }

    /// Earth-centered position of vertex `index`.
    #[must_use]
    pub fn absolute_position(&self, index: usize) -> Option<DVec3> {
        self.relative_position(index)
            .map(|p| p.as_dvec3() + self.center)
    }

    /// Texture coordinate of vertex `index`, if emitted.
    #[must_use]
    pub fn tex_coord(&self, index: usize) -> Option<[f32; 2]> {
        match &self.vertices {
            VertexData::Separate { tex_coords, .. } => tex_coords.as_ref()?.get(index).copied(),
            VertexData::Interleaved { data, layout } => {
                let start = index
                    .checked_mul(layout.stride)?
                    .checked_add(layout.tex_coord_offset?)?;
                data.get(start..start.checked_add(2)?)
                    .map(|uv| [uv[0], uv[1]])
            }
        }
    }
}

/// Tessellate a sample grid over `extent` into a relative-to-center mesh.
///
/// Sample `(row, col)` sits at longitude `west + col / (w - 1) * width` and
/// latitude `north - row / (h - 1) * height`, raised by its elevation along
/// the ellipsoid normal. Each quad of four neighbouring samples becomes two
/// counter-clockwise triangles (seen from outside the ellipsoid).
///
/// # Errors
///
/// Returns an error if the grid has fewer than two rows or columns, if its
/// sample count disagrees with its dimensions, or if it has more vertices
/// than `u32` indices can address.
pub fn tessellate(
    grid: &SampleGrid,
    extent: &Extent,
    ellipsoid: &Ellipsoid,
    center: DVec3,
    options: &MeshOptions,
) -> Result<TileMesh, TessellationError> {
    let (width, height) = (grid.width, grid.height);
    if width < 2 || height < 2 {
        return Err(TessellationError::DegenerateGrid { width, height });
    }

    let vertex_count = width as usize * height as usize;
    if grid.heights.len() != vertex_count {
        return Err(TessellationError::SampleCountMismatch {
            expected: vertex_count,
            actual: grid.heights.len(),
        });
    }
    if u32::try_from(vertex_count).is_err() {
        return Err(TessellationError::TooManyVertices {
            count: vertex_count,
        });
    }

    let layout = VertexLayout::for_options(options);
    let mut builder = VertexBuilder::new(vertex_count, &layout, options.interleave);
    let mut bounding_radius_squared: f64 = 0.0;

    let col_step = extent.width() / f64::from(width - 1);
    let row_step = extent.height() / f64::from(height - 1);

    for (row, row_heights) in grid.heights.chunks_exact(width as usize).enumerate() {
        #[allow(clippy::cast_precision_loss)]
        let row = row as f64;
        let latitude = extent.north - row * row_step;
        let v = row / f64::from(height - 1);

        for (col, &elevation) in row_heights.iter().enumerate() {
            #[allow(clippy::cast_precision_loss)]
            let col = col as f64;
            let longitude = extent.west + col * col_step;

            let position = ellipsoid.cartographic_to_cartesian(longitude, latitude, elevation);
            let relative = position - center;
            bounding_radius_squared = bounding_radius_squared.max(relative.length_squared());

            let normal = options
                .normals
                .then(|| ellipsoid.geodetic_surface_normal(longitude, latitude));
            let tex_coord = options.tex_coords.then_some([col / f64::from(width - 1), v]);

            builder.push(relative, tex_coord, normal);
        }
    }

    let (minimum_height, maximum_height) = grid.height_range().unwrap_or((0.0, 0.0));

    Ok(TileMesh {
        center,
        vertices: builder.finish(layout),
        indices: grid_indices(width, height),
        grid_width: width,
        grid_height: height,
        minimum_height,
        maximum_height,
        bounding_radius: bounding_radius_squared.sqrt(),
    })
}

/// Triangle list for a regular `width` x `height` grid.
///
/// Callers guarantee `width * height` fits in a `u32`.
#[must_use]
pub fn grid_indices(width: u32, height: u32) -> Vec<u32> {
    if width < 2 || height < 2 {
        return Vec::new();
    }

    let quads = (width as usize - 1) * (height as usize - 1);
    let mut indices = Vec::with_capacity(quads * 6);

    for row in 0..height - 1 {
        for col in 0..width - 1 {
            let top_left = row * width + col;
            let top_right = top_left + 1;
            let bottom_left = top_left + width;
            let bottom_right = bottom_left + 1;

            indices.extend([top_left, bottom_left, top_right]);
            indices.extend([top_right, bottom_left, bottom_right]);
        }
    }

    indices
}

/// Accumulates vertices in either storage layout.
enum VertexBuilder {
    Separate {
        positions: Vec<[f32; 3]>,
        tex_coords: Option<Vec<[f32; 2]>>,
        normals: Option<Vec<[f32; 3]>>,
    },
    Interleaved(Vec<f32>),
}

impl VertexBuilder {
    fn new(vertex_count: usize, layout: &VertexLayout, interleave: bool) -> Self {
        if interleave {
            return Self::Interleaved(Vec::with_capacity(vertex_count * layout.stride));
        }
        Self::Separate {
            positions: Vec::with_capacity(vertex_count),
            tex_coords: layout
                .tex_coord_offset
                .map(|_| Vec::with_capacity(vertex_count)),
            normals: layout.normal_offset.map(|_| Vec::with_capacity(vertex_count)),
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn push(&mut self, relative: DVec3, tex_coord: Option<[f64; 2]>, normal: Option<DVec3>) {
        let position = relative.as_vec3().to_array();
        let tex_coord = tex_coord.map(|[u, v]| [u as f32, v as f32]);
        let normal = normal.map(|n| n.as_vec3().to_array());

        match self {
            Self::Separate {
                positions,
                tex_coords,
                normals,
            } => {
                positions.push(position);
                if let (Some(out), Some(uv)) = (tex_coords.as_mut(), tex_coord) {
                    out.push(uv);
                }
                if let (Some(out), Some(n)) = (normals.as_mut(), normal) {
                    out.push(n);
                }
            }
            Self::Interleaved(data) => {
                data.extend(position);
                if let Some(uv) = tex_coord {
                    data.extend(uv);
                }
                if let Some(n) = normal {
                    data.extend(n);
                }
            }
        }
    }

    fn finish(self, layout: VertexLayout) -> VertexData {
        match self {
            Self::Separate {
                positions,
                tex_coords,
                normals,
            } => VertexData::Separate {
                positions,
                tex_coords,
                normals,
            },
            Self::Interleaved(data) => VertexData::Interleaved { data, layout },
        }
    }
}
