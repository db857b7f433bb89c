/// Geometry for the scene: the loaded sphere mesh plus the fixed axes and ground
use nalgebra::{Point2, Point3, Vector3, Vector4};

/// A triangle face defined by three corner positions
#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    pub vertices: [Point3<f32>; 3],
}

impl Triangle {
    pub fn new(v0: Point3<f32>, v1: Point3<f32>, v2: Point3<f32>) -> Self {
        Self {
            vertices: [v0, v1, v2],
        }
    }

    /// Face normal from two edges; zero for a degenerate face
    pub fn calculate_normal(&self) -> Vector3<f32> {
        let [v0, v1, v2] = self.vertices;
        let edge1 = v1 - v0;
        let edge2 = v2 - v0;
        edge1
            .cross(&edge2)
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vector3::zeros)
    }
}

/// Triangle soup with parallel smooth and flat normal lists.
///
/// Smooth normals point from the origin through each vertex, which is only
/// meaningful for a tessellated sphere centred at the origin.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub points: Vec<Point3<f32>>,
    pub smooth_normals: Vec<Vector3<f32>>,
    pub flat_normals: Vec<Vector3<f32>>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(triangles: usize) -> Self {
        Self {
            points: Vec::with_capacity(triangles * 3),
            smooth_normals: Vec::with_capacity(triangles * 3),
            flat_normals: Vec::with_capacity(triangles * 3),
        }
    }

    pub fn add_triangle(&mut self, triangle: Triangle) {
        let face = triangle.calculate_normal();
        for vertex in triangle.vertices {
            self.points.push(vertex);
            self.smooth_normals.push(
                vertex
                    .coords
                    .try_normalize(f32::EPSILON)
                    .unwrap_or_else(Vector3::zeros),
            );
            self.flat_normals.push(face);
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.points.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Points as homogeneous coordinates with w = 1
    pub fn homogeneous_points(&self) -> Vec<Vector4<f32>> {
        self.points.iter().map(|p| p.to_homogeneous()).collect()
    }

    /// Largest distance of any vertex from the origin; 0 for an empty mesh
    pub fn sphere_radius(&self) -> f32 {
        self.points
            .iter()
            .map(|p| p.coords.norm())
            .fold(0.0, f32::max)
    }

    /// Unit sphere built by subdividing an octahedron and pushing every new
    /// vertex out to radius 1.
    pub fn octasphere(subdivisions: u32) -> Self {
        let px = Point3::new(1.0, 0.0, 0.0);
        let nx = Point3::new(-1.0, 0.0, 0.0);
        let py = Point3::new(0.0, 1.0, 0.0);
        let ny = Point3::new(0.0, -1.0, 0.0);
        let pz = Point3::new(0.0, 0.0, 1.0);
        let nz = Point3::new(0.0, 0.0, -1.0);

        let mut faces = vec![
            Triangle::new(pz, px, py),
            Triangle::new(px, nz, py),
            Triangle::new(nz, nx, py),
            Triangle::new(nx, pz, py),
            Triangle::new(px, pz, ny),
            Triangle::new(nz, px, ny),
            Triangle::new(nx, nz, ny),
            Triangle::new(pz, nx, ny),
        ];

        for _ in 0..subdivisions {
            faces = faces
                .iter()
                .flat_map(|face| {
                    let [a, b, c] = face.vertices;
                    let ab = on_unit_sphere(&a, &b);
                    let bc = on_unit_sphere(&b, &c);
                    let ca = on_unit_sphere(&c, &a);
                    [
                        Triangle::new(a, ab, ca),
                        Triangle::new(ab, b, bc),
                        Triangle::new(ca, bc, c),
                        Triangle::new(ab, bc, ca),
                    ]
                })
                .collect();
        }

        let mut mesh = Self::with_capacity(faces.len());
        for face in faces {
            mesh.add_triangle(face);
        }
        mesh
    }
}

fn on_unit_sphere(a: &Point3<f32>, b: &Point3<f32>) -> Point3<f32> {
    Point3::from((a.coords + b.coords).normalize())
}

/// Line-segment geometry for the three world axes
pub struct AxesGeometry;

impl AxesGeometry {
    /// Pairs of endpoints: X, Y, Z. X and Z sit slightly above the ground.
    pub const POINTS: [[f32; 3]; 6] = [
        [0.0, 0.02, 0.0],
        [5.0, 0.02, 0.0],
        [0.0, 0.0, 0.0],
        [0.0, 10.0, 0.0],
        [0.0, 0.02, 0.0],
        [0.0, 0.02, 8.0],
    ];
    pub const LINE_WIDTH: f32 = 2.0;

    pub fn points() -> Vec<Point3<f32>> {
        Self::POINTS.iter().map(|&[x, y, z]| Point3::new(x, y, z)).collect()
    }

    /// Lighting is always off for the axes; the normals only fill the slot
    pub fn normals() -> Vec<Vector3<f32>> {
        vec![Vector3::y(); Self::POINTS.len()]
    }
}

/// The ground quad at y = 0, two triangles with tiled texture coordinates
pub struct GroundGeometry;

impl GroundGeometry {
    pub const POINTS: [[f32; 3]; 6] = [
        [105.0, 0.0, 108.0],
        [105.0, 0.0, -104.0],
        [-105.0, 0.0, -104.0],
        [-105.0, 0.0, -104.0],
        [-105.0, 0.0, 108.0],
        [105.0, 0.0, 108.0],
    ];
    /// The checker texture repeats 6 times along x and 5 times along z
    pub const TEX_COORDS: [[f32; 2]; 6] = [
        [6.0, 5.0],
        [6.0, 0.0],
        [0.0, 0.0],
        [0.0, 0.0],
        [0.0, 5.0],
        [6.0, 5.0],
    ];

    pub fn points() -> Vec<Point3<f32>> {
        Self::POINTS.iter().map(|&[x, y, z]| Point3::new(x, y, z)).collect()
    }

    pub fn normals() -> Vec<Vector3<f32>> {
        vec![Vector3::y(); Self::POINTS.len()]
    }

    pub fn tex_coords() -> Vec<Point2<f32>> {
        Self::TEX_COORDS.iter().map(|&[u, v]| Point2::new(u, v)).collect()
    }
}
