/// Reader for the ASCII triangle-list sphere format
///
/// ```text
/// T
/// 3  x y z  x y z  x y z
/// ...
/// ```
///
/// A triangle count is followed by `T` records, each a vertex count and that
/// many `x y z` triples, all whitespace separated. Records whose vertex count
/// is not 3 are consumed, reported and skipped.
use log::{info, warn};
use nalgebra::Point3;
use nom::{
    character::complete::{multispace0, u32 as unsigned},
    multi::count,
    number::complete::float,
    sequence::{preceded, tuple},
    IResult,
};
use std::path::Path;

use crate::error::MeshError;
use crate::geometry::{Mesh, Triangle};

/// A record that was skipped because it was not a triangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkippedRecord {
    /// 1-based record index
    pub record: usize,
    pub vertex_count: u32,
}

/// Result of a load: the mesh and the records that were dropped
#[derive(Debug, Clone)]
pub struct MeshLoad {
    pub mesh: Mesh,
    pub skipped: Vec<SkippedRecord>,
}

/// Read and parse a sphere file from disk
pub fn load_mesh_file<P: AsRef<Path>>(path: P) -> Result<MeshLoad, MeshError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let load = parse_mesh(&text)?;
    info!(
        "Loaded {} triangles from {} ({} records skipped), radius {:.4}",
        load.mesh.triangle_count(),
        path.display(),
        load.skipped.len(),
        load.mesh.sphere_radius()
    );
    Ok(load)
}

/// Parse the triangle-list format
pub fn parse_mesh(input: &str) -> Result<MeshLoad, MeshError> {
    let (mut rest, declared) = integer(input).map_err(|e| parse_error(0, e))?;

    // Every record needs at least two characters, so the header alone cannot
    // size the buffers.
    let mut mesh = Mesh::with_capacity((declared as usize).min(input.len() / 2));
    let mut skipped = Vec::new();

    for record in 1..=declared as usize {
        let (after_count, n) = integer(rest).map_err(|e| parse_error(record, e))?;
        let (after_vertices, vertices) =
            count(vertex, n as usize)(after_count).map_err(|e| parse_error(record, e))?;
        rest = after_vertices;

        if n != 3 {
            warn!(
                "Record {record}: expected a triangle, found a shape with {n} vertices; skipping"
            );
            skipped.push(SkippedRecord {
                record,
                vertex_count: n,
            });
            continue;
        }

        mesh.add_triangle(Triangle::new(vertices[0], vertices[1], vertices[2]));
    }

    if !rest.trim().is_empty() {
        warn!("Ignoring data after the {declared} declared records");
    }
    if mesh.is_empty() {
        return Err(MeshError::Empty);
    }

    Ok(MeshLoad { mesh, skipped })
}

fn integer(input: &str) -> IResult<&str, u32> {
    preceded(multispace0, unsigned)(input)
}

fn number(input: &str) -> IResult<&str, f32> {
    preceded(multispace0, float)(input)
}

fn vertex(input: &str) -> IResult<&str, Point3<f32>> {
    let (input, (x, y, z)) = tuple((number, number, number))(input)?;
    Ok((input, Point3::new(x, y, z)))
}

fn parse_error(record: usize, err: nom::Err<nom::error::Error<&str>>) -> MeshError {
    let message = match err {
        nom::Err::Error(e) | nom::Err::Failure(e) => {
            let near = e.input.trim_start();
            if near.is_empty() {
                "unexpected end of input".to_string()
            } else {
                let token: String = near
                    .chars()
                    .take_while(|c| !c.is_whitespace())
                    .take(24)
                    .collect();
                format!("unexpected token {token:?}")
            }
        }
        nom::Err::Incomplete(_) => "incomplete input".to_string(),
    };
    MeshError::Parse { record, message }
}
