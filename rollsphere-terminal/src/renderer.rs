/// ASCII rasterizer executing composed frames in the terminal
use crossterm::{
    cursor,
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use log::debug;
use nalgebra::{Matrix4, Point3, Vector2, Vector3, Vector4};
use rollsphere_core::frame::{DrawCall, Geometry, ParticleDraw, PolygonMode, Primitive};
use rollsphere_core::geometry::{AxesGeometry, GroundGeometry, Mesh};
use rollsphere_core::particles::Particle;
use rollsphere_core::shadow::BlendFunc;
use rollsphere_core::{DrawCommand, Frame, LightingParameters, Renderer, SceneAssets};
use std::io::{self, Write};

use crate::shader::{self, Varying};

/// Character luminosity ramp for shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

fn background() -> Vector4<f32> {
    Vector4::new(0.529, 0.807, 0.92, 1.0)
}

/// One geometry slot: positions with their normals and texture coordinates
#[derive(Debug, Clone, Default)]
struct VertexBuffer {
    points: Vec<Point3<f32>>,
    normals: Vec<Vector3<f32>>,
    tex_coords: Vec<Vector2<f32>>,
}

impl VertexBuffer {
    fn untextured(points: &[Point3<f32>], normals: &[Vector3<f32>]) -> Self {
        Self {
            points: points.to_vec(),
            normals: normals.to_vec(),
            tex_coords: vec![Vector2::zeros(); points.len()],
        }
    }
}

#[derive(Debug, Clone, Default)]
struct GeometryBuffers {
    axes: VertexBuffer,
    ground: VertexBuffer,
    smooth_sphere: VertexBuffer,
    flat_sphere: VertexBuffer,
}

impl GeometryBuffers {
    fn new() -> Self {
        let ground = VertexBuffer {
            points: GroundGeometry::points(),
            normals: GroundGeometry::normals(),
            tex_coords: GroundGeometry::tex_coords().into_iter().map(|p| p.coords).collect(),
        };
        Self {
            axes: VertexBuffer::untextured(&AxesGeometry::points(), &AxesGeometry::normals()),
            ground,
            ..Default::default()
        }
    }

    fn load_sphere(&mut self, mesh: &Mesh) {
        self.smooth_sphere = VertexBuffer::untextured(&mesh.points, &mesh.smooth_normals);
        self.flat_sphere = VertexBuffer::untextured(&mesh.points, &mesh.flat_normals);
    }

    fn get(&self, geometry: Geometry) -> &VertexBuffer {
        match geometry {
            Geometry::Axes => &self.axes,
            Geometry::Ground => &self.ground,
            Geometry::SmoothSphere => &self.smooth_sphere,
            Geometry::FlatSphere => &self.flat_sphere,
        }
    }
}

/// Vertex after the vertex stage, in clip coordinates
#[derive(Debug, Clone, Copy)]
struct ClipVertex {
    clip: Vector4<f32>,
    varying: Varying,
}

impl ClipVertex {
    /// Signed distance to the near plane; inside when non-negative
    fn near_distance(&self) -> f32 {
        self.clip.z + self.clip.w
    }

    fn lerp(&self, other: &Self, t: f32) -> Self {
        Self {
            clip: self.clip.lerp(&other.clip, t),
            varying: self.varying.lerp(&other.varying, t),
        }
    }
}

/// Vertex in cell coordinates; `varying` is premultiplied by `inv_w`
#[derive(Debug, Clone, Copy)]
struct ScreenVertex {
    x: f32,
    y: f32,
    depth: f32,
    inv_w: f32,
    varying: Varying,
}

/// Clip a polygon against the near plane
fn clip_polygon(polygon: &[ClipVertex]) -> Vec<ClipVertex> {
    let mut out = Vec::with_capacity(polygon.len() + 1);
    for (i, a) in polygon.iter().enumerate() {
        let b = &polygon[(i + 1) % polygon.len()];
        let (da, db) = (a.near_distance(), b.near_distance());
        if da >= 0.0 {
            out.push(*a);
        }
        if (da >= 0.0) != (db >= 0.0) {
            out.push(a.lerp(b, da / (da - db)));
        }
    }
    out
}

fn clip_segment(a: &ClipVertex, b: &ClipVertex) -> Option<(ClipVertex, ClipVertex)> {
    let (da, db) = (a.near_distance(), b.near_distance());
    match (da >= 0.0, db >= 0.0) {
        (true, true) => Some((*a, *b)),
        (false, false) => None,
        (true, false) => Some((*a, a.lerp(b, da / (da - db)))),
        (false, true) => Some((a.lerp(b, da / (da - db)), *b)),
    }
}

/// Depth, colour and the fixed-function state the frame commands toggle
#[derive(Debug, Clone)]
struct FrameBuffer {
    width: usize,
    height: usize,
    depth: Vec<f32>,
    color: Vec<Vector4<f32>>,
    written: Vec<bool>,
    depth_write: bool,
    color_write: bool,
    blend: Option<BlendFunc>,
}

impl FrameBuffer {
    fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            depth: vec![f32::INFINITY; size],
            color: vec![background(); size],
            written: vec![false; size],
            depth_write: true,
            color_write: true,
            blend: None,
        }
    }

    fn clear(&mut self) {
        self.depth.fill(f32::INFINITY);
        self.color.fill(background());
        self.written.fill(false);
        self.depth_write = true;
        self.color_write = true;
        self.blend = None;
    }

    fn to_screen(&self, v: &ClipVertex) -> ScreenVertex {
        let inv_w = 1.0 / v.clip.w.max(f32::EPSILON);
        let ndc = v.clip.xyz() * inv_w;
        ScreenVertex {
            x: (ndc.x + 1.0) * 0.5 * self.width as f32,
            y: (1.0 - ndc.y) * 0.5 * self.height as f32,
            depth: ndc.z,
            inv_w,
            varying: v.varying.scaled(inv_w),
        }
    }

    /// Depth-tested write of an already shaded fragment
    fn plot(&mut self, x: i32, y: i32, depth: f32, color: Vector4<f32>) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height || depth > 1.0 {
            return;
        }
        let idx = y as usize * self.width + x as usize;
        if depth >= self.depth[idx] {
            return;
        }
        if self.depth_write {
            self.depth[idx] = depth;
        }
        if self.color_write {
            self.color[idx] = match self.blend {
                Some(BlendFunc::SrcAlphaOneMinusSrcAlpha) => {
                    let a = color.w;
                    let rgb = color.xyz() * a + self.color[idx].xyz() * (1.0 - a);
                    Vector4::new(rgb.x, rgb.y, rgb.z, 1.0)
                }
                None => color,
            };
            self.written[idx] = true;
        }
    }

    fn fragment(
        &mut self,
        x: i32,
        y: i32,
        depth: f32,
        varying: &Varying,
        params: &LightingParameters,
    ) {
        if let Some(color) = shader::shade_fragment(params, varying) {
            self.plot(x, y, depth, color);
        }
    }

    fn triangle(&mut self, vertices: &[ClipVertex], params: &LightingParameters) {
        let clipped = clip_polygon(vertices);
        if clipped.len() < 3 {
            return;
        }
        let screen: Vec<ScreenVertex> = clipped.iter().map(|v| self.to_screen(v)).collect();
        for i in 1..screen.len() - 1 {
            self.rasterize_triangle(&screen[0], &screen[i], &screen[i + 1], params);
        }
    }

    fn rasterize_triangle(
        &mut self,
        v0: &ScreenVertex,
        v1: &ScreenVertex,
        v2: &ScreenVertex,
        params: &LightingParameters,
    ) {
        // Bounding box, clipped to the screen
        let min_x = (v0.x.min(v1.x).min(v2.x).floor() as i32).max(0);
        let max_x = (v0.x.max(v1.x).max(v2.x).ceil() as i32).min(self.width as i32 - 1);
        let min_y = (v0.y.min(v1.y).min(v2.y).floor() as i32).max(0);
        let max_y = (v0.y.max(v1.y).max(v2.y).ceil() as i32).min(self.height as i32 - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let p = (x as f32 + 0.5, y as f32 + 0.5);
                let Some((w0, w1, w2)) =
                    barycentric((v0.x, v0.y), (v1.x, v1.y), (v2.x, v2.y), p)
                else {
                    continue;
                };
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }
                let depth = w0 * v0.depth + w1 * v1.depth + w2 * v2.depth;
                let inv_w = w0 * v0.inv_w + w1 * v1.inv_w + w2 * v2.inv_w;
                let varying = v0
                    .varying
                    .scaled(w0)
                    .add(&v1.varying.scaled(w1))
                    .add(&v2.varying.scaled(w2))
                    .scaled(1.0 / inv_w);
                self.fragment(x, y, depth, &varying, params);
            }
        }
    }

    fn line(&mut self, a: &ClipVertex, b: &ClipVertex, params: &LightingParameters) {
        let Some((a, b)) = clip_segment(a, b) else {
            return;
        };
        let (a, b) = (self.to_screen(&a), self.to_screen(&b));
        let steps = (b.x - a.x).abs().max((b.y - a.y).abs()).ceil().max(1.0) as usize;
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            let depth = a.depth + (b.depth - a.depth) * t;
            let inv_w = a.inv_w + (b.inv_w - a.inv_w) * t;
            let varying = a.varying.lerp(&b.varying, t).scaled(1.0 / inv_w);
            let x = (a.x + (b.x - a.x) * t).floor() as i32;
            let y = (a.y + (b.y - a.y) * t).floor() as i32;
            self.fragment(x, y, depth, &varying, params);
        }
    }
}

/// ASCII renderer that rasterizes frames into terminal cells
pub struct AsciiRenderer {
    target: FrameBuffer,
    buffers: GeometryBuffers,
    particles: Vec<Particle>,
}

impl AsciiRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            target: FrameBuffer::new(width, height),
            buffers: GeometryBuffers::new(),
            particles: Vec::new(),
        }
    }

    pub fn width(&self) -> usize {
        self.target.width
    }

    pub fn height(&self) -> usize {
        self.target.height
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        self.target = FrameBuffer::new(width, height);
    }

    pub fn clear(&mut self) {
        self.target.clear();
    }

    /// Colour of a cell, or `None` where nothing was drawn
    pub fn cell(&self, x: usize, y: usize) -> Option<Vector4<f32>> {
        let idx = y * self.target.width + x;
        self.target.written.get(idx).copied().filter(|&w| w).map(|_| self.target.color[idx])
    }

    fn draw_call(&mut self, call: &DrawCall, projection: &Matrix4<f32>) {
        let buffer = self.buffers.get(call.geometry);
        let mvp = projection * call.model_view;
        let vertices: Vec<ClipVertex> = buffer
            .points
            .iter()
            .zip(&buffer.normals)
            .zip(&buffer.tex_coords)
            .map(|((point, normal), uv)| ClipVertex {
                clip: mvp * point.to_homogeneous(),
                varying: shader::shade_vertex(&call.params, &call.model_view, point, normal, *uv),
            })
            .collect();

        match call.primitive {
            Primitive::Lines { first, count, .. } => {
                let Some(segment) = vertices.get(first..first + count) else {
                    return;
                };
                for pair in segment.chunks_exact(2) {
                    self.target.line(&pair[0], &pair[1], &call.params);
                }
            }
            Primitive::Triangles => {
                for tri in vertices.chunks_exact(3) {
                    match call.polygon_mode {
                        PolygonMode::Fill => self.target.triangle(tri, &call.params),
                        PolygonMode::Line => {
                            for i in 0..3 {
                                self.target.line(&tri[i], &tri[(i + 1) % 3], &call.params);
                            }
                        }
                    }
                }
            }
        }
    }

    /// Points smaller than a cell cover exactly one cell
    fn draw_particles(&mut self, draw: &ParticleDraw) {
        let mvp = draw.projection * draw.model_view;
        for particle in &self.particles {
            let Some(position) =
                shader::particle_position(&draw.start_position, &particle.velocity, draw.time)
            else {
                continue;
            };
            let clip = mvp * position.to_homogeneous();
            if clip.z + clip.w < 0.0 {
                continue;
            }
            let vertex = ClipVertex {
                clip,
                varying: Varying {
                    color: Vector4::new(particle.color.x, particle.color.y, particle.color.z, 1.0),
                    eye: Vector3::zeros(),
                    texture_source: Vector3::zeros(),
                    uv: Vector2::zeros(),
                },
            };
            let screen = self.target.to_screen(&vertex);
            self.target.plot(
                screen.x.floor() as i32,
                screen.y.floor() as i32,
                screen.depth,
                vertex.varying.color,
            );
        }
    }

    pub fn draw<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let mut last_color = None;
        for y in 0..self.target.height {
            writer.queue(cursor::MoveTo(0, y as u16))?;
            for x in 0..self.target.width {
                let idx = y * self.target.width + x;
                if !self.target.written[idx] {
                    writer.queue(Print(' '))?;
                    continue;
                }
                let c = self.target.color[idx];
                let color = Color::Rgb {
                    r: to_channel(c.x),
                    g: to_channel(c.y),
                    b: to_channel(c.z),
                };
                if last_color != Some(color) {
                    writer.queue(SetForegroundColor(color))?;
                    last_color = Some(color);
                }
                writer.queue(Print(ramp_char(c)))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

impl Renderer for AsciiRenderer {
    type Error = io::Error;

    fn upload(&mut self, assets: &SceneAssets<'_>) -> io::Result<()> {
        self.buffers.load_sphere(assets.sphere);
        self.particles = assets.particles.to_vec();
        debug!(
            "Uploaded {} sphere triangles and {} particles",
            assets.sphere.triangle_count(),
            self.particles.len()
        );
        Ok(())
    }

    fn render(&mut self, frame: &Frame) -> io::Result<()> {
        self.target.clear();
        for command in &frame.commands {
            match command {
                DrawCommand::DepthWrite(on) => self.target.depth_write = *on,
                DrawCommand::ColorWrite(on) => self.target.color_write = *on,
                DrawCommand::Blend(func) => self.target.blend = *func,
                DrawCommand::Draw(call) => self.draw_call(call, &frame.projection),
                DrawCommand::Particles(draw) => self.draw_particles(draw),
            }
        }
        Ok(())
    }
}

fn to_channel(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Written cells never map to the blank character
fn ramp_char(color: Vector4<f32>) -> char {
    let luminance = (0.299 * color.x + 0.587 * color.y + 0.114 * color.z).clamp(0.0, 1.0);
    let index = 1 + (luminance * (LUMINOSITY_RAMP.len() - 2) as f32).round() as usize;
    LUMINOSITY_RAMP[index.min(LUMINOSITY_RAMP.len() - 1)]
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(
    v0: (f32, f32),
    v1: (f32, f32),
    v2: (f32, f32),
    p: (f32, f32),
) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::relative_eq;
    use rollsphere_core::{FrameOrchestrator, LightingModel, SceneSettings, SceneState};

    fn varying() -> Varying {
        Varying {
            color: Vector4::new(1.0, 1.0, 1.0, 1.0),
            eye: Vector3::zeros(),
            texture_source: Vector3::zeros(),
            uv: Vector2::zeros(),
        }
    }

    fn render_default_scene(width: usize, height: usize) -> AsciiRenderer {
        let settings = SceneSettings::default();
        let sphere = Mesh::octasphere(3);
        let mut scene = SceneState::new(&settings, sphere, width as u32, height as u32 * 2, 0.0);
        let orchestrator =
            FrameOrchestrator::new(LightingModel::new(Default::default(), settings.fog));
        let mut renderer = AsciiRenderer::new(width, height);
        renderer
            .upload(&SceneAssets {
                sphere: &scene.mesh,
                particles: scene.particles.particles(),
            })
            .unwrap();
        let frame = orchestrator.compose(&mut scene, 0.0);
        renderer.render(&frame).unwrap();
        renderer
    }

    #[test]
    fn test_depth_test_and_depth_write_mask() {
        let mut target = FrameBuffer::new(4, 4);
        target.plot(1, 1, 0.5, Vector4::new(1.0, 0.0, 0.0, 1.0));
        target.plot(1, 1, 0.7, Vector4::new(0.0, 1.0, 0.0, 1.0));
        assert_eq!(target.color[5], Vector4::new(1.0, 0.0, 0.0, 1.0));

        target.depth_write = false;
        target.plot(1, 1, 0.2, Vector4::new(0.0, 0.0, 1.0, 1.0));
        assert_eq!(target.color[5], Vector4::new(0.0, 0.0, 1.0, 1.0));
        assert_eq!(target.depth[5], 0.5);
    }

    #[test]
    fn test_color_write_mask_only_writes_depth() {
        let mut target = FrameBuffer::new(4, 4);
        target.color_write = false;
        target.plot(2, 2, 0.3, Vector4::new(1.0, 0.0, 0.0, 1.0));
        assert!(!target.written[10]);
        assert_eq!(target.depth[10], 0.3);

        target.color_write = true;
        target.plot(2, 2, 0.4, Vector4::new(1.0, 0.0, 0.0, 1.0));
        assert!(!target.written[10]);
    }

    #[test]
    fn test_blending_mixes_with_destination() {
        let mut target = FrameBuffer::new(2, 2);
        target.plot(0, 0, 0.9, Vector4::new(0.0, 1.0, 0.0, 1.0));
        target.blend = Some(BlendFunc::SrcAlphaOneMinusSrcAlpha);
        target.plot(0, 0, 0.5, Vector4::new(0.25, 0.25, 0.25, 0.65));
        let c = target.color[0];
        assert!(relative_eq!(c.x, 0.1625, epsilon = 1e-6));
        assert!(relative_eq!(c.y, 0.1625 + 0.35, epsilon = 1e-6));
    }

    #[test]
    fn test_near_plane_clipping() {
        let inside = ClipVertex {
            clip: Vector4::new(0.0, 0.0, 0.0, 1.0),
            varying: varying(),
        };
        let behind = ClipVertex {
            clip: Vector4::new(0.0, 0.0, -3.0, 1.0),
            varying: varying(),
        };
        let clipped = clip_polygon(&[inside, behind, inside]);
        assert_eq!(clipped.len(), 4);
        assert!(clipped.iter().all(|v| v.near_distance() >= -1e-6));
        assert!(clip_polygon(&[behind, behind, behind]).is_empty());
        assert!(clip_segment(&behind, &behind).is_none());
    }

    #[test]
    fn test_default_scene_draws_ground_and_shadow() {
        let renderer = render_default_scene(120, 60);
        let cells: Vec<Vector4<f32>> = (0..renderer.height())
            .flat_map(|y| (0..renderer.width()).map(move |x| (x, y)))
            .filter_map(|(x, y)| renderer.cell(x, y))
            .collect();
        assert!(!cells.is_empty());
        let is_shadow = |c: &Vector4<f32>| {
            relative_eq!(c.x, 0.25, epsilon = 1e-4)
                && relative_eq!(c.y, 0.25, epsilon = 1e-4)
                && relative_eq!(c.z, 0.25, epsilon = 1e-4)
        };
        assert!(cells.iter().any(is_shadow));
    }

    #[test]
    fn test_clear_resets_state() {
        let mut renderer = render_default_scene(40, 20);
        renderer.clear();
        assert!((0..20).all(|y| (0..40).all(|x| renderer.cell(x, y).is_none())));
        assert!(renderer.target.depth_write && renderer.target.color_write);
    }

    #[test]
    fn test_ramp_never_blank_for_written_cells() {
        assert_eq!(ramp_char(Vector4::new(0.0, 0.0, 0.0, 1.0)), '.');
        assert_eq!(ramp_char(Vector4::new(1.0, 1.0, 1.0, 1.0)), '@');
    }
}
