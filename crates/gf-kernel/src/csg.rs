//! Compiled CSG trees and their evaluation along sample lines.
//!
//! A stored solid is an immutable [`Node`] tree; booleans build new roots
//! that share their operands through `Arc`. Evaluation slices the tree at a
//! height into a [`Plane`] and then reads x-intervals off that plane one
//! y-line at a time.

use std::sync::Arc;

use crate::intervals::IntervalSet;
use crate::section::Section;
use crate::shape::{Axis, Prism, Shape};
use crate::types::BoundingBox;

#[derive(Debug)]
pub(crate) struct Node {
    pub bbox: Option<BoundingBox>,
    pub kind: NodeKind,
}

#[derive(Debug)]
pub(crate) enum NodeKind {
    Prism(Prism),
    Union(Vec<Arc<Node>>),
    Difference(Arc<Node>, Vec<Arc<Node>>),
    Intersection(Vec<Arc<Node>>),
}

impl Node {
    pub fn compile(shape: &Shape) -> Arc<Node> {
        match shape {
            Shape::Prism(p) => Arc::new(Node {
                bbox: p.bounds(),
                kind: NodeKind::Prism(p.clone()),
            }),
            Shape::Union(parts) => Self::make_union(parts.iter().map(Self::compile).collect()),
            Shape::Difference(base, tools) => Self::make_difference(
                Self::compile(base),
                tools.iter().map(Self::compile).collect(),
            ),
            Shape::Intersection(parts) => {
                Self::make_intersection(parts.iter().map(Self::compile).collect())
            }
        }
    }

    pub fn make_union(children: Vec<Arc<Node>>) -> Arc<Node> {
        let mut flat = Vec::with_capacity(children.len());
        for child in children {
            match &child.kind {
                NodeKind::Union(grand) => flat.extend(grand.iter().cloned()),
                _ => flat.push(child),
            }
        }
        let bbox = flat
            .iter()
            .filter_map(|c| c.bbox)
            .reduce(|a, b| a.union(&b));
        Arc::new(Node {
            bbox,
            kind: NodeKind::Union(flat),
        })
    }

    pub fn make_difference(base: Arc<Node>, tools: Vec<Arc<Node>>) -> Arc<Node> {
        // Extend an existing difference instead of nesting another level.
        let (base, mut all_tools) = match &base.kind {
            NodeKind::Difference(inner, existing) => (inner.clone(), existing.clone()),
            _ => (base.clone(), Vec::new()),
        };
        let bbox = base.bbox;
        all_tools.extend(tools.into_iter().filter(|t| match (t.bbox, bbox) {
            (Some(tb), Some(bb)) => tb.intersection(&bb).is_some(),
            _ => false,
        }));
        if all_tools.is_empty() {
            return base;
        }
        Arc::new(Node {
            bbox,
            kind: NodeKind::Difference(base, all_tools),
        })
    }

    pub fn make_intersection(children: Vec<Arc<Node>>) -> Arc<Node> {
        let mut bbox: Option<BoundingBox> = None;
        for (i, c) in children.iter().enumerate() {
            bbox = match (i, bbox, c.bbox) {
                (0, _, b) => b,
                (_, Some(a), Some(b)) => a.intersection(&b),
                _ => None,
            };
        }
        Arc::new(Node {
            bbox,
            kind: NodeKind::Intersection(children),
        })
    }

    /// Heights where some prism's cross-section changes character, plus the
    /// ranges where it changes along a curve.
    pub fn z_breakpoints(&self, out: &mut Vec<f64>, curved: &mut Vec<(f64, f64)>) {
        if self.bbox.is_none() {
            return;
        }
        match &self.kind {
            NodeKind::Prism(p) => prism_z_breakpoints(p, out, curved),
            NodeKind::Union(children) | NodeKind::Intersection(children) => {
                for c in children {
                    c.z_breakpoints(out, curved);
                }
            }
            NodeKind::Difference(base, tools) => {
                base.z_breakpoints(out, curved);
                for t in tools {
                    t.z_breakpoints(out, curved);
                }
            }
        }
    }

    /// Cross-section of the solid at height `z`.
    pub fn slice_z(&self, z: f64) -> Plane {
        let Some(bb) = self.bbox else {
            return Plane::empty();
        };
        if z < bb.min[2] || z > bb.max[2] {
            return Plane::empty();
        }
        match &self.kind {
            NodeKind::Prism(p) => slice_prism(p, z),
            NodeKind::Union(children) => {
                let parts: Vec<Plane> = children
                    .iter()
                    .map(|c| c.slice_z(z))
                    .filter(|p| !p.is_empty())
                    .collect();
                Plane::union(parts)
            }
            NodeKind::Difference(base, tools) => {
                let base = base.slice_z(z);
                if base.is_empty() {
                    return base;
                }
                let tools: Vec<Plane> = tools
                    .iter()
                    .map(|t| t.slice_z(z))
                    .filter(|p| !p.is_empty())
                    .collect();
                Plane::difference(base, tools)
            }
            NodeKind::Intersection(children) => {
                let mut parts = Vec::with_capacity(children.len());
                for c in children {
                    let p = c.slice_z(z);
                    if p.is_empty() {
                        return Plane::empty();
                    }
                    parts.push(p);
                }
                Plane::intersection(parts)
            }
        }
    }

    pub fn contains(&self, p: [f64; 3]) -> bool {
        match self.bbox {
            Some(bb) if bb.contains_point(p) => self.slice_z(p[2]).x_intervals(p[1]).contains(p[0]),
            _ => false,
        }
    }

    /// Visit every prism with its polarity (`true` adds material).
    pub fn collect_prisms<'a>(&'a self, positive: bool, out: &mut Vec<(&'a Prism, bool)>) {
        match &self.kind {
            NodeKind::Prism(p) => out.push((p, positive)),
            NodeKind::Union(children) | NodeKind::Intersection(children) => {
                for c in children {
                    c.collect_prisms(positive, out);
                }
            }
            NodeKind::Difference(base, tools) => {
                base.collect_prisms(positive, out);
                for t in tools {
                    t.collect_prisms(!positive, out);
                }
            }
        }
    }

    /// Rebuild the tree with some prisms replaced. `f` returns `Some` for
    /// prisms it changes; untouched subtrees stay shared.
    pub fn map_prisms<F>(self: &Arc<Self>, positive: bool, f: &mut F) -> Option<Arc<Node>>
    where
        F: FnMut(&Prism, bool) -> Option<Prism>,
    {
        match &self.kind {
            NodeKind::Prism(p) => f(p, positive).map(|np| {
                Arc::new(Node {
                    bbox: np.bounds(),
                    kind: NodeKind::Prism(np),
                })
            }),
            NodeKind::Union(children) => {
                map_children(children, positive, f).map(Node::make_union_unflattened)
            }
            NodeKind::Intersection(children) => {
                map_children(children, positive, f).map(Node::make_intersection)
            }
            NodeKind::Difference(base, tools) => {
                let new_base = base.map_prisms(positive, f);
                let new_tools = map_children(tools, !positive, f);
                if new_base.is_none() && new_tools.is_none() {
                    return None;
                }
                let base = new_base.unwrap_or_else(|| base.clone());
                Some(Arc::new(Node {
                    bbox: base.bbox,
                    kind: NodeKind::Difference(base, new_tools.unwrap_or_else(|| tools.clone())),
                }))
            }
        }
    }

    fn make_union_unflattened(children: Vec<Arc<Node>>) -> Arc<Node> {
        let bbox = children
            .iter()
            .filter_map(|c| c.bbox)
            .reduce(|a, b| a.union(&b));
        Arc::new(Node {
            bbox,
            kind: NodeKind::Union(children),
        })
    }
}

fn map_children<F>(children: &[Arc<Node>], positive: bool, f: &mut F) -> Option<Vec<Arc<Node>>>
where
    F: FnMut(&Prism, bool) -> Option<Prism>,
{
    let mapped: Vec<Option<Arc<Node>>> = children.iter().map(|c| c.map_prisms(positive, f)).collect();
    if mapped.iter().all(Option::is_none) {
        return None;
    }
    Some(
        mapped
            .into_iter()
            .zip(children)
            .map(|(m, c)| m.unwrap_or_else(|| c.clone()))
            .collect(),
    )
}

fn prism_z_breakpoints(p: &Prism, out: &mut Vec<f64>, curved: &mut Vec<(f64, f64)>) {
    match p.axis {
        Axis::Z => {
            out.extend_from_slice(&p.span);
            let Some(profile) = &p.inset else {
                return;
            };
            profile.breakpoints(out);
            profile.curved_ranges(curved);
            match &p.section {
                Section::RoundedRect { size, radii, .. } => {
                    for r in radii {
                        profile.crossings(*r, out);
                    }
                    profile.crossings(size[0].min(size[1]) / 2.0, out);
                }
                Section::Circle { radius, .. } => profile.crossings(*radius, out),
                Section::Polygon { .. } => {}
            }
        }
        Axis::X | Axis::Y => {
            p.section.v_breakpoints(out);
            match &p.section {
                Section::Circle { center, radius } => {
                    curved.push((center[1] - radius, center[1] + radius));
                }
                Section::RoundedRect {
                    center,
                    size,
                    radii,
                } => {
                    let lo = center[1] - size[1] / 2.0;
                    let hi = center[1] + size[1] / 2.0;
                    let bottom = radii[0].max(radii[1]);
                    let top = radii[2].max(radii[3]);
                    if bottom > 0.0 {
                        curved.push((lo, lo + bottom));
                    }
                    if top > 0.0 {
                        curved.push((hi - top, hi));
                    }
                }
                Section::Polygon { .. } => {}
            }
        }
    }
}

fn slice_prism(p: &Prism, z: f64) -> Plane {
    match p.axis {
        Axis::Z => match p.section_at(z) {
            Some(section) => Plane::section(section),
            None => Plane::empty(),
        },
        // Section (u, v) = (x, z); swept along y.
        Axis::Y => {
            let rects: Vec<Rect> = p
                .section
                .slice(z)
                .spans()
                .iter()
                .map(|&(x0, x1)| Rect {
                    x: (x0, x1),
                    y: (p.span[0], p.span[1]),
                })
                .collect();
            Plane::rects(rects)
        }
        // Section (u, v) = (y, z); swept along x.
        Axis::X => {
            let rects: Vec<Rect> = p
                .section
                .slice(z)
                .spans()
                .iter()
                .map(|&(y0, y1)| Rect {
                    x: (p.span[0], p.span[1]),
                    y: (y0, y1),
                })
                .collect();
            Plane::rects(rects)
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Rect {
    x: (f64, f64),
    y: (f64, f64),
}

/// A horizontal cross-section of a CSG tree.
#[derive(Debug)]
pub(crate) struct Plane {
    /// y-extent, `None` when empty.
    pub y: Option<(f64, f64)>,
    kind: PlaneKind,
}

#[derive(Debug)]
enum PlaneKind {
    Empty,
    Section(Section),
    Rects(Vec<Rect>),
    Union(Vec<Plane>),
    Difference(Box<Plane>, Vec<Plane>),
    Intersection(Vec<Plane>),
}

impl Plane {
    fn empty() -> Plane {
        Plane {
            y: None,
            kind: PlaneKind::Empty,
        }
    }

    fn section(section: Section) -> Plane {
        match section.bounds() {
            Some((lo, hi)) => Plane {
                y: Some((lo[1], hi[1])),
                kind: PlaneKind::Section(section),
            },
            None => Plane::empty(),
        }
    }

    fn rects(rects: Vec<Rect>) -> Plane {
        let y = rects
            .iter()
            .map(|r| r.y)
            .reduce(|a, b| (a.0.min(b.0), a.1.max(b.1)));
        match y {
            Some(y) => Plane {
                y: Some(y),
                kind: PlaneKind::Rects(rects),
            },
            None => Plane::empty(),
        }
    }

    fn union(mut parts: Vec<Plane>) -> Plane {
        match parts.len() {
            0 => Plane::empty(),
            1 => parts.remove(0),
            _ => {
                let y = parts
                    .iter()
                    .filter_map(|p| p.y)
                    .reduce(|a, b| (a.0.min(b.0), a.1.max(b.1)));
                Plane {
                    y,
                    kind: PlaneKind::Union(parts),
                }
            }
        }
    }

    fn difference(base: Plane, tools: Vec<Plane>) -> Plane {
        if tools.is_empty() {
            return base;
        }
        Plane {
            y: base.y,
            kind: PlaneKind::Difference(Box::new(base), tools),
        }
    }

    fn intersection(mut parts: Vec<Plane>) -> Plane {
        if parts.len() == 1 {
            return parts.remove(0);
        }
        let mut y = parts.first().and_then(|p| p.y);
        for p in parts.iter().skip(1) {
            y = match (y, p.y) {
                (Some(a), Some(b)) if a.0.max(b.0) < a.1.min(b.1) => Some((a.0.max(b.0), a.1.min(b.1))),
                _ => None,
            };
        }
        match y {
            Some(_) => Plane {
                y,
                kind: PlaneKind::Intersection(parts),
            },
            None => Plane::empty(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_none()
    }

    pub fn x_intervals(&self, y: f64) -> IntervalSet {
        match self.y {
            Some((lo, hi)) if y >= lo && y <= hi => {}
            _ => return IntervalSet::new(),
        }
        match &self.kind {
            PlaneKind::Empty => IntervalSet::new(),
            PlaneKind::Section(s) => s.slice(y),
            PlaneKind::Rects(rects) => IntervalSet::from_unsorted(
                rects
                    .iter()
                    .filter(|r| y >= r.y.0 && y <= r.y.1)
                    .map(|r| r.x)
                    .collect(),
            ),
            PlaneKind::Union(parts) => parts
                .iter()
                .fold(IntervalSet::new(), |acc, p| acc.union(&p.x_intervals(y))),
            PlaneKind::Difference(base, tools) => {
                let mut acc = base.x_intervals(y);
                for t in tools {
                    if acc.is_empty() {
                        break;
                    }
                    acc = acc.subtract(&t.x_intervals(y));
                }
                acc
            }
            PlaneKind::Intersection(parts) => {
                let mut iter = parts.iter();
                let mut acc = match iter.next() {
                    Some(p) => p.x_intervals(y),
                    None => return IntervalSet::new(),
                };
                for p in iter {
                    if acc.is_empty() {
                        break;
                    }
                    acc = acc.intersect(&p.x_intervals(y));
                }
                acc
            }
        }
    }

    pub fn y_breakpoints(&self, out: &mut Vec<f64>) {
        match &self.kind {
            PlaneKind::Empty => {}
            PlaneKind::Section(s) => s.v_breakpoints(out),
            PlaneKind::Rects(rects) => {
                for r in rects {
                    out.push(r.y.0);
                    out.push(r.y.1);
                }
            }
            PlaneKind::Union(parts) | PlaneKind::Intersection(parts) => {
                for p in parts {
                    p.y_breakpoints(out);
                }
            }
            PlaneKind::Difference(base, tools) => {
                base.y_breakpoints(out);
                for t in tools {
                    t.y_breakpoints(out);
                }
            }
        }
    }
}
