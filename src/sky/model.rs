//! Prop geometry
//!
//! Props are drawn from plain triangle meshes. They come either from an OBJ
//! file (positions and faces only; normals are recomputed flat at draw time)
//! or, when that fails, from a procedural lumpy rock so the sky is never
//! empty. Every model is recentred and scaled to a unit bounding sphere so
//! the per-prop `scale` setting means the same thing for any source.

use std::collections::HashMap;

use macroquad::math::Vec3;
use rand::Rng;
use thiserror::Error;

use crate::config::Span;

/// Errors from fetching or parsing a model
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("failed to fetch {path}: {message}")]
    Fetch { path: String, message: String },
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("model has no triangles")]
    Empty,
}

/// One named group of triangles (an OBJ `o`/`g` block)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshPart {
    pub name: String,
    pub positions: Vec<Vec3>,
    pub triangles: Vec<[u32; 3]>,
}

impl MeshPart {
    /// Triangle corner positions
    pub fn triangle(&self, index: usize) -> [Vec3; 3] {
        let [a, b, c] = self.triangles[index];
        [
            self.positions[a as usize],
            self.positions[b as usize],
            self.positions[c as usize],
        ]
    }
}

/// Where a model's geometry came from
#[derive(Debug, Clone, PartialEq)]
pub enum ModelSource {
    File(String),
    Placeholder,
}

/// Geometry shared by every pool member of one prop kind
#[derive(Debug, Clone, PartialEq)]
pub struct ModelAsset {
    pub name: String,
    pub parts: Vec<MeshPart>,
    /// Bounding sphere radius around the local origin (1.0 after normalizing)
    pub radius: f32,
    pub source: ModelSource,
}

impl ModelAsset {
    /// Parse OBJ text. Supports `v`, `f` (any vertex/uv/normal index form,
    /// negative indices, n-gons) and `o`/`g` groups; everything else is ignored.
    pub fn parse_obj(name: &str, contents: &str) -> Result<Self, ModelError> {
        let mut positions: Vec<Vec3> = Vec::new();
        let mut parts: Vec<MeshPart> = Vec::new();
        let mut current = MeshPart {
            name: name.to_string(),
            ..Default::default()
        };
        // Global position index -> index within the current part
        let mut remap: HashMap<usize, u32> = HashMap::new();

        for (line_num, line) in contents.lines().enumerate() {
            let line = line.trim();

            // Skip empty lines and comments
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let parts_of_line: Vec<&str> = line.split_whitespace().collect();
            match parts_of_line[0] {
                "v" => {
                    if parts_of_line.len() < 4 {
                        return Err(ModelError::Parse {
                            line: line_num + 1,
                            message: "vertex needs 3 coordinates".to_string(),
                        });
                    }
                    let x = parse_float(parts_of_line[1], line_num)?;
                    let y = parse_float(parts_of_line[2], line_num)?;
                    let z = parse_float(parts_of_line[3], line_num)?;
                    positions.push(Vec3::new(x, y, z));
                }

                "o" | "g" => {
                    if !current.triangles.is_empty() {
                        parts.push(std::mem::take(&mut current));
                        remap.clear();
                    }
                    current.name = parts_of_line.get(1).copied().unwrap_or(name).to_string();
                }

                "f" => {
                    if parts_of_line.len() < 4 {
                        return Err(ModelError::Parse {
                            line: line_num + 1,
                            message: "face needs at least 3 vertices".to_string(),
                        });
                    }

                    let mut face = Vec::with_capacity(parts_of_line.len() - 1);
                    for token in &parts_of_line[1..] {
                        let global = resolve_index(token, positions.len(), line_num)?;
                        let local = *remap.entry(global).or_insert_with(|| {
                            current.positions.push(positions[global]);
                            (current.positions.len() - 1) as u32
                        });
                        face.push(local);
                    }

                    // Fan triangulation from the first vertex
                    for i in 1..(face.len() - 1) {
                        current.triangles.push([face[0], face[i], face[i + 1]]);
                    }
                }

                _ => {} // vt, vn, s, usemtl, mtllib...
            }
        }

        if !current.triangles.is_empty() {
            parts.push(current);
        }
        if parts.is_empty() {
            return Err(ModelError::Empty);
        }

        Ok(Self {
            name: name.to_string(),
            parts,
            radius: 1.0,
            source: ModelSource::File(name.to_string()),
        }
        .normalized())
    }

    /// Procedural lumpy rock: a once-subdivided icosahedron with every vertex
    /// pushed in or out by a random amount from `lumpiness`.
    pub fn placeholder<R: Rng>(name: &str, lumpiness: Span, rng: &mut R) -> Self {
        let (mut positions, mut triangles) = icosahedron();
        subdivide(&mut positions, &mut triangles);

        for p in positions.iter_mut() {
            *p = p.normalize() * lumpiness.sample(rng);
        }

        // The rock is star-shaped around the origin, so outward is well defined
        for tri in triangles.iter_mut() {
            let [a, b, c] = tri.map(|i| positions[i as usize]);
            let normal = (b - a).cross(c - a);
            if normal.dot(a + b + c) < 0.0 {
                tri.swap(1, 2);
            }
        }

        Self {
            name: name.to_string(),
            parts: vec![MeshPart {
                name: name.to_string(),
                positions,
                triangles,
            }],
            radius: 1.0,
            source: ModelSource::Placeholder,
        }
        .normalized()
    }

    pub fn is_placeholder(&self) -> bool {
        self.source == ModelSource::Placeholder
    }

    pub fn triangle_count(&self) -> usize {
        self.parts.iter().map(|p| p.triangles.len()).sum()
    }

    /// Recentre on the bounding box centre and scale to a unit bounding sphere
    fn normalized(mut self) -> Self {
        let mut min = Vec3::splat(f32::MAX);
        let mut max = Vec3::splat(f32::MIN);
        for p in self.parts.iter().flat_map(|part| part.positions.iter()) {
            min = min.min(*p);
            max = max.max(*p);
        }
        let center = (min + max) * 0.5;

        let radius = self
            .parts
            .iter()
            .flat_map(|part| part.positions.iter())
            .map(|p| (*p - center).length())
            .fold(0.0f32, f32::max);
        let inv = if radius > 0.0 { 1.0 / radius } else { 1.0 };

        for part in self.parts.iter_mut() {
            for p in part.positions.iter_mut() {
                *p = (*p - center) * inv;
            }
        }
        self.radius = 1.0;
        self
    }
}

fn parse_float(s: &str, line_num: usize) -> Result<f32, ModelError> {
    s.parse::<f32>().map_err(|_| ModelError::Parse {
        line: line_num + 1,
        message: format!("invalid number '{}'", s),
    })
}

/// Resolve the position part of a face token (`7`, `7/2`, `7//3`, `-1`)
fn resolve_index(token: &str, position_count: usize, line_num: usize) -> Result<usize, ModelError> {
    let raw = token.split('/').next().unwrap_or(token);
    let index: i64 = raw.parse().map_err(|_| ModelError::Parse {
        line: line_num + 1,
        message: format!("invalid face index '{}'", token),
    })?;

    let resolved = if index < 0 {
        position_count as i64 + index
    } else {
        index - 1
    };
    if resolved < 0 || resolved as usize >= position_count {
        return Err(ModelError::Parse {
            line: line_num + 1,
            message: format!("face index {} out of range", index),
        });
    }
    Ok(resolved as usize)
}

fn icosahedron() -> (Vec<Vec3>, Vec<[u32; 3]>) {
    let t = (1.0 + 5.0f32.sqrt()) / 2.0;
    let positions = vec![
        Vec3::new(-1.0, t, 0.0),
        Vec3::new(1.0, t, 0.0),
        Vec3::new(-1.0, -t, 0.0),
        Vec3::new(1.0, -t, 0.0),
        Vec3::new(0.0, -1.0, t),
        Vec3::new(0.0, 1.0, t),
        Vec3::new(0.0, -1.0, -t),
        Vec3::new(0.0, 1.0, -t),
        Vec3::new(t, 0.0, -1.0),
        Vec3::new(t, 0.0, 1.0),
        Vec3::new(-t, 0.0, -1.0),
        Vec3::new(-t, 0.0, 1.0),
    ];
    let triangles = vec![
        [0, 11, 5], [0, 5, 1], [0, 1, 7], [0, 7, 10], [0, 10, 11],
        [1, 5, 9], [5, 11, 4], [11, 10, 2], [10, 7, 6], [7, 1, 8],
        [3, 9, 4], [3, 4, 2], [3, 2, 6], [3, 6, 8], [3, 8, 9],
        [4, 9, 5], [2, 4, 11], [6, 2, 10], [8, 6, 7], [9, 8, 1],
    ];
    (positions, triangles)
}

/// Split every triangle into four, sharing edge midpoints
fn subdivide(positions: &mut Vec<Vec3>, triangles: &mut Vec<[u32; 3]>) {
    let mut midpoints: HashMap<(u32, u32), u32> = HashMap::new();
    let mut midpoint = |a: u32, b: u32, positions: &mut Vec<Vec3>| -> u32 {
        let key = (a.min(b), a.max(b));
        *midpoints.entry(key).or_insert_with(|| {
            positions.push((positions[a as usize] + positions[b as usize]) * 0.5);
            (positions.len() - 1) as u32
        })
    };

    let mut result = Vec::with_capacity(triangles.len() * 4);
    for &[a, b, c] in triangles.iter() {
        let ab = midpoint(a, b, positions);
        let bc = midpoint(b, c, positions);
        let ca = midpoint(c, a, positions);
        result.push([a, ab, ca]);
        result.push([b, bc, ab]);
        result.push([c, ca, bc]);
        result.push([ab, bc, ca]);
    }
    *triangles = result;
}
