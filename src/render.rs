//! Vector export of a QR code.
//!
//! All dark modules are merged into one outline: every module contributes its
//! four boundary edges walked clockwise, and an edge cancels against the same
//! edge walked the other way by a neighbour. What is left are closed loops
//! around dark regions (clockwise) and their holes (counter-clockwise), drawn
//! as a single path with the even-odd fill rule.

use std::fmt::Write as _;
use std::path::Path;

use hashbrown::HashSet;

use crate::QrCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum Heading {
    East,
    South,
    West,
    North,
}

impl Heading {
    fn step(self) -> (i32, i32) {
        match self {
            Heading::East => (1, 0),
            Heading::South => (0, 1),
            Heading::West => (-1, 0),
            Heading::North => (0, -1),
        }
    }

    fn clockwise(self) -> Self {
        match self {
            Heading::East => Heading::South,
            Heading::South => Heading::West,
            Heading::West => Heading::North,
            Heading::North => Heading::East,
        }
    }

    fn opposite(self) -> Self {
        self.clockwise().clockwise()
    }

    fn counter_clockwise(self) -> Self {
        self.opposite().clockwise()
    }
}

/// A unit edge starting at the grid point (`x`, `y`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct Edge {
    y: i32,
    x: i32,
    heading: Heading,
}

impl Edge {
    fn new(x: i32, y: i32, heading: Heading) -> Self {
        Self { y, x, heading }
    }

    fn end(self) -> (i32, i32) {
        let (dx, dy) = self.heading.step();
        (self.x + dx, self.y + dy)
    }

    fn reversed(self) -> Self {
        let (x, y) = self.end();
        Self::new(x, y, self.heading.opposite())
    }

    /// The edge continuing from this one's end point in `heading`.
    fn then(self, heading: Heading) -> Self {
        let (x, y) = self.end();
        Self::new(x, y, heading)
    }
}

/// The boundary edges of a set of dark modules.
#[derive(Debug, Clone, Default)]
pub struct Outline {
    edges: HashSet<Edge>,
}

impl Outline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_code(code: &QrCode) -> Self {
        let mut outline = Self::new();
        for y in 0..code.size() {
            for x in 0..code.size() {
                if code.is_dark(x, y) {
                    outline.add_module(x as i32, y as i32);
                }
            }
        }
        outline
    }

    /// Adds the unit square with top-left corner (`x`, `y`).
    pub fn add_module(&mut self, x: i32, y: i32) {
        let top = Edge::new(x, y, Heading::East);
        let right = top.then(Heading::South);
        let bottom = right.then(Heading::West);
        let left = bottom.then(Heading::North);
        for edge in [top, right, bottom, left] {
            if !self.edges.remove(&edge.reversed()) {
                self.edges.insert(edge);
            }
        }
    }

    /// Follows edges from `start` until the loop closes, removing them from
    /// the set. Where two loops touch at a corner, turning clockwise is
    /// preferred so the loops stay separate.
    fn take_loop(&mut self, start: Edge) -> Vec<Edge> {
        self.edges.remove(&start);
        let origin = (start.x, start.y);
        let mut path = vec![start];
        let mut current = start;
        while current.end() != origin {
            let h = current.heading;
            let next = [h.clockwise(), h.counter_clockwise(), h]
                .into_iter()
                .map(|heading| current.then(heading))
                .find(|edge| self.edges.remove(edge));
            match next {
                Some(edge) => {
                    path.push(edge);
                    current = edge;
                }
                None => break,
            }
        }
        path
    }

    /// Converts the outline into SVG path data with one subpath per loop.
    /// Loops are emitted top to bottom, left to right, so equal outlines give
    /// equal strings.
    pub fn into_path(mut self) -> String {
        let mut starts: Vec<Edge> = self.edges.iter().copied().collect();
        starts.sort_unstable();

        let mut d = String::new();
        for start in starts {
            if !self.edges.contains(&start) {
                continue;
            }
            let edges = self.take_loop(start);
            write_subpath(&mut d, &edges);
        }
        d
    }
}

/// Writes `M x y` followed by one `h`/`v` per straight run. The last run is
/// left to `Z`.
fn write_subpath(d: &mut String, edges: &[Edge]) {
    let Some(first) = edges.first() else { return };
    let _ = write!(d, "M{} {}", first.x, first.y);

    let mut runs: Vec<(Heading, i32)> = Vec::new();
    for edge in edges {
        match runs.last_mut() {
            Some((heading, len)) if *heading == edge.heading => *len += 1,
            _ => runs.push((edge.heading, 1)),
        }
    }
    runs.pop();
    for (heading, len) in runs {
        let _ = match heading {
            Heading::East => write!(d, "h{len}"),
            Heading::West => write!(d, "h-{len}"),
            Heading::South => write!(d, "v{len}"),
            Heading::North => write!(d, "v-{len}"),
        };
    }
    d.push('Z');
}

#[derive(Debug, Clone)]
pub struct SvgStyle {
    pub color: String,
    pub background_color: String,
    /// Output pixels per module.
    pub module_size: u32,
    /// Light border around the symbol, in modules.
    pub quiet_zone: u32,
}

impl SvgStyle {
    pub fn new(
        color: impl Into<String>,
        background_color: impl Into<String>,
        module_size: u32,
        quiet_zone: u32,
    ) -> Self {
        Self {
            color: color.into(),
            background_color: background_color.into(),
            module_size,
            quiet_zone,
        }
    }
}

impl Default for SvgStyle {
    fn default() -> Self {
        Self {
            color: String::from("#000000"),
            background_color: String::from("#ffffff"),
            module_size: 8,
            quiet_zone: 4,
        }
    }
}

/// Converts the QR code to an SVG document.
pub fn to_svg(code: &QrCode, style: &SvgStyle) -> String {
    let d = Outline::from_code(code).into_path();
    let quiet = style.quiet_zone;
    let view = code.size() as u32 + quiet * 2;
    let pixels = view * style.module_size;
    let color = &style.color;
    let background_color = &style.background_color;
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" version="1.1" width="{pixels}" height="{pixels}" viewBox="0 0 {view} {view}" shape-rendering="crispEdges">
<rect x="0" y="0" width="{view}" height="{view}" fill="{background_color}"/>
<path fill="{color}" fill-rule="evenodd" transform="translate({quiet},{quiet})" d="{d}"/>
</svg>
"#,
    )
}

/// Saves the QR code as an SVG file.
pub fn save_svg<P: AsRef<Path>>(code: &QrCode, path: P, style: &SvgStyle) -> std::io::Result<()> {
    std::fs::write(path, to_svg(code, style))
}
