//! Renderer-agnostic geometry.
//!
//! Manipulators and items describe what they look like as flat-coloured
//! line and triangle batches in world space. A renderer (or the pick
//! surface) consumes the batches; nothing here talks to a graphics API.

use glam::Vec3;

pub type Rgba = [u8; 4];

pub const HIGHLIGHT: Rgba = [255, 230, 60, 255];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    /// Vertex pairs.
    Lines,
    /// Vertex triples.
    Triangles,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawBatch {
    pub primitive: Primitive,
    pub vertices: Vec<Vec3>,
    pub color: Rgba,
    /// Pixel width for line batches.
    pub line_width: f32,
    pub depth_test: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawList {
    batches: Vec<DrawBatch>,
    no_depth: bool,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn batches(&self) -> &[DrawBatch] {
        &self.batches
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    pub fn clear(&mut self) {
        self.batches.clear();
    }

    /// Depth testing for batches pushed from now on.
    pub fn set_depth_test(&mut self, enabled: bool) {
        self.no_depth = !enabled;
    }

    pub fn push_lines(&mut self, vertices: Vec<Vec3>, color: Rgba, line_width: f32) {
        if vertices.len() < 2 {
            return;
        }
        self.batches.push(DrawBatch {
            primitive: Primitive::Lines,
            vertices,
            color,
            line_width,
            depth_test: !self.no_depth,
        });
    }

    pub fn push_triangles(&mut self, vertices: Vec<Vec3>, color: Rgba) {
        if vertices.len() < 3 {
            return;
        }
        self.batches.push(DrawBatch {
            primitive: Primitive::Triangles,
            vertices,
            color,
            line_width: 1.0,
            depth_test: !self.no_depth,
        });
    }

    pub fn line(&mut self, a: Vec3, b: Vec3, color: Rgba, line_width: f32) {
        self.push_lines(vec![a, b], color, line_width);
    }

    /// Move `other`'s batches in. Depth testing stays off for them when
    /// it is off here.
    pub fn append(&mut self, other: DrawList) {
        let no_depth = self.no_depth;
        self.batches.extend(other.batches.into_iter().map(|mut b| {
            b.depth_test &= !no_depth;
            b
        }));
    }

    /// Same geometry in a single flat colour (pick-pass rendering).
    pub fn recolored(mut self, color: Rgba, min_line_width: f32) -> Self {
        for batch in &mut self.batches {
            batch.color = color;
            batch.line_width = batch.line_width.max(min_line_width);
        }
        self
    }
}

/// 36 vertices of an axis-aligned box.
pub fn box_triangles(center: Vec3, size: Vec3) -> Vec<Vec3> {
    let h = size * 0.5;
    let p = [
        center + Vec3::new(-h.x, -h.y, -h.z),
        center + Vec3::new(h.x, -h.y, -h.z),
        center + Vec3::new(h.x, h.y, -h.z),
        center + Vec3::new(-h.x, h.y, -h.z),
        center + Vec3::new(-h.x, -h.y, h.z),
        center + Vec3::new(h.x, -h.y, h.z),
        center + Vec3::new(h.x, h.y, h.z),
        center + Vec3::new(-h.x, h.y, h.z),
    ];
    #[rustfmt::skip]
    let idx: [usize; 36] = [
        0, 1, 2, 0, 2, 3,
        4, 6, 5, 4, 7, 6,
        0, 4, 5, 0, 5, 1,
        1, 5, 6, 1, 6, 2,
        2, 6, 7, 2, 7, 3,
        3, 7, 4, 3, 4, 0,
    ];
    idx.iter().map(|&i| p[i]).collect()
}

/// Two unit vectors spanning the plane perpendicular to `axis`.
pub fn perpendicular_basis(axis: Vec3) -> (Vec3, Vec3) {
    let axis = axis.normalize_or_zero();
    let helper = if axis.x.abs() < 0.9 { Vec3::X } else { Vec3::Y };
    let u = axis.cross(helper).normalize_or_zero();
    let v = axis.cross(u);
    (u, v)
}

/// Closed circle as line-segment pairs.
pub fn ring_lines(center: Vec3, axis: Vec3, radius: f32, segments: usize) -> Vec<Vec3> {
    let n = segments.max(16);
    let (u, v) = perpendicular_basis(axis);
    let point = |i: usize| {
        let t = (i as f32 / n as f32) * std::f32::consts::TAU;
        center + (u * t.cos() + v * t.sin()) * radius
    };
    let mut out = Vec::with_capacity(n * 2);
    for i in 0..n {
        out.push(point(i));
        out.push(point((i + 1) % n));
    }
    out
}

/// Cone from a circular base at `base` to `tip`, as triangles.
pub fn cone_triangles(base: Vec3, tip: Vec3, radius: f32, segments: usize) -> Vec<Vec3> {
    let n = segments.max(6);
    let (u, v) = perpendicular_basis(tip - base);
    let rim = |i: usize| {
        let t = (i as f32 / n as f32) * std::f32::consts::TAU;
        base + (u * t.cos() + v * t.sin()) * radius
    };
    let mut out = Vec::with_capacity(n * 6);
    for i in 0..n {
        let a = rim(i);
        let b = rim((i + 1) % n);
        out.extend_from_slice(&[a, b, tip, b, a, base]);
    }
    out
}
