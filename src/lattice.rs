//! Table detection from ruled lines.
//!
//! Edges are snapped, joined, intersected and turned into cells; cells that
//! share a corner belong to the same table.

use std::collections::{BTreeMap, BTreeSet};

use crate::layout::{Edge, EdgeKind, LINE_Y_TOLERANCE, Orientation, PageLayout, Word, cluster_rows};
use crate::model::{Row, cell_to_text};

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct LatticeSettings {
    pub snap_tolerance: f64,
    pub join_tolerance: f64,
    pub intersection_tolerance: f64,
    pub min_edge_length: f64,
    pub include_rect_sides: bool,
}

impl LatticeSettings {
    pub(crate) const LINES: Self = Self {
        snap_tolerance: 3.0,
        join_tolerance: 3.0,
        intersection_tolerance: 3.0,
        min_edge_length: 3.0,
        include_rect_sides: true,
    };

    pub(crate) const STRICT: Self = Self {
        snap_tolerance: 1.0,
        join_tolerance: 1.0,
        intersection_tolerance: 1.0,
        min_edge_length: 3.0,
        include_rect_sides: false,
    };
}

/// Quantized `(y, x)`, so points sort top-to-bottom then left-to-right.
type PointKey = (i64, i64);

#[allow(clippy::cast_possible_truncation)]
fn quantize(value: f64) -> i64 {
    (value * 1000.0).round() as i64
}

fn point_key(x: f64, y: f64) -> PointKey {
    (quantize(y), quantize(x))
}

#[allow(clippy::cast_precision_loss)]
fn snap_positions(edges: &mut [Edge], tolerance: f64) {
    edges.sort_by(|left, right| left.position.total_cmp(&right.position));

    let mut start = 0;
    while start < edges.len() {
        let mut end = start + 1;
        while end < edges.len() && edges[end].position - edges[end - 1].position <= tolerance {
            end += 1;
        }

        let cluster = &mut edges[start..end];
        let mean = cluster.iter().map(|edge| edge.position).sum::<f64>() / cluster.len() as f64;
        for edge in cluster {
            edge.position = mean;
        }
        start = end;
    }
}

fn snap_edges(edges: Vec<Edge>, tolerance: f64) -> Vec<Edge> {
    let (mut horizontal, mut vertical): (Vec<_>, Vec<_>) = edges
        .into_iter()
        .partition(|edge| edge.orientation == Orientation::Horizontal);
    snap_positions(&mut horizontal, tolerance);
    snap_positions(&mut vertical, tolerance);
    horizontal.extend(vertical);
    horizontal
}

fn join_edges(mut edges: Vec<Edge>, tolerance: f64) -> Vec<Edge> {
    edges.sort_by(|left, right| {
        (left.orientation == Orientation::Vertical)
            .cmp(&(right.orientation == Orientation::Vertical))
            .then(left.position.total_cmp(&right.position))
            .then(left.start.total_cmp(&right.start))
    });

    let mut joined: Vec<Edge> = Vec::with_capacity(edges.len());
    for edge in edges {
        if let Some(last) = joined.last_mut()
            && last.orientation == edge.orientation
            && (last.position - edge.position).abs() < f64::EPSILON
            && edge.start <= last.end + tolerance
        {
            last.end = last.end.max(edge.end);
            continue;
        }
        joined.push(edge);
    }
    joined
}

#[derive(Debug, Default)]
struct Intersection {
    x: f64,
    y: f64,
    vertical: BTreeSet<usize>,
    horizontal: BTreeSet<usize>,
}

impl Intersection {
    fn shares_vertical(&self, other: &Self) -> bool {
        !self.vertical.is_disjoint(&other.vertical)
    }

    fn shares_horizontal(&self, other: &Self) -> bool {
        !self.horizontal.is_disjoint(&other.horizontal)
    }
}

fn find_intersections(edges: &[Edge], tolerance: f64) -> BTreeMap<PointKey, Intersection> {
    let of_orientation = |orientation: Orientation| {
        edges
            .iter()
            .enumerate()
            .filter(move |(_, edge)| edge.orientation == orientation)
    };

    let mut points = BTreeMap::new();
    for (v_index, vertical) in of_orientation(Orientation::Vertical) {
        for (h_index, horizontal) in of_orientation(Orientation::Horizontal) {
            let crosses = horizontal.position >= vertical.start - tolerance
                && horizontal.position <= vertical.end + tolerance
                && vertical.position >= horizontal.start - tolerance
                && vertical.position <= horizontal.end + tolerance;
            if !crosses {
                continue;
            }

            let point = points
                .entry(point_key(vertical.position, horizontal.position))
                .or_insert_with(|| Intersection {
                    x: vertical.position,
                    y: horizontal.position,
                    ..Intersection::default()
                });
            point.vertical.insert(v_index);
            point.horizontal.insert(h_index);
        }
    }
    points
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Cell {
    x0: f64,
    top: f64,
    x1: f64,
    bottom: f64,
}

impl Cell {
    fn corners(&self) -> [PointKey; 4] {
        [
            point_key(self.x0, self.top),
            point_key(self.x1, self.top),
            point_key(self.x0, self.bottom),
            point_key(self.x1, self.bottom),
        ]
    }

    fn contains(&self, (x, y): (f64, f64)) -> bool {
        x >= self.x0 && x <= self.x1 && y >= self.top && y <= self.bottom
    }
}

/// For every intersection, the smallest cell whose corners are all
/// intersections joined by edges, searching downwards first.
fn find_cells(points: &BTreeMap<PointKey, Intersection>) -> Vec<Cell> {
    let ordered = points.values().collect::<Vec<_>>();

    let mut cells = Vec::new();
    for (index, corner) in ordered.iter().enumerate() {
        let rest = &ordered[index + 1..];
        let below = rest
            .iter()
            .filter(|point| quantize(point.x) == quantize(corner.x))
            .collect::<Vec<_>>();
        let right = rest
            .iter()
            .filter(|point| quantize(point.y) == quantize(corner.y))
            .collect::<Vec<_>>();

        'search: for down in &below {
            if !corner.shares_vertical(down) {
                continue;
            }
            for across in &right {
                if !corner.shares_horizontal(across) {
                    continue;
                }
                let Some(opposite) = points.get(&point_key(across.x, down.y)) else {
                    continue;
                };
                if opposite.shares_vertical(across) && opposite.shares_horizontal(down) {
                    cells.push(Cell {
                        x0: corner.x,
                        top: corner.y,
                        x1: across.x,
                        bottom: down.y,
                    });
                    break 'search;
                }
            }
        }
    }
    cells
}

fn find_root(parent: &mut [usize], mut index: usize) -> usize {
    while parent[index] != index {
        parent[index] = parent[parent[index]];
        index = parent[index];
    }
    index
}

fn group_cells(cells: &[Cell]) -> Vec<Vec<Cell>> {
    let mut parent = (0..cells.len()).collect::<Vec<_>>();
    let mut owner: BTreeMap<PointKey, usize> = BTreeMap::new();

    for (index, cell) in cells.iter().enumerate() {
        for corner in cell.corners() {
            match owner.get(&corner).copied() {
                Some(other) => {
                    let left = find_root(&mut parent, index);
                    let right = find_root(&mut parent, other);
                    if left != right {
                        parent[left.max(right)] = left.min(right);
                    }
                }
                None => {
                    owner.insert(corner, index);
                }
            }
        }
    }

    let mut groups: BTreeMap<usize, Vec<Cell>> = BTreeMap::new();
    for (index, cell) in cells.iter().enumerate() {
        let root = find_root(&mut parent, index);
        groups.entry(root).or_default().push(*cell);
    }

    let origin = |cells: &[Cell]| {
        cells.iter().fold((f64::INFINITY, f64::INFINITY), |(top, left), cell| {
            (top.min(cell.top), left.min(cell.x0))
        })
    };
    let mut tables = groups
        .into_values()
        .filter(|group| group.len() >= 2)
        .collect::<Vec<_>>();
    tables.sort_by(|left, right| {
        let (left_top, left_x) = origin(left);
        let (right_top, right_x) = origin(right);
        left_top.total_cmp(&right_top).then(left_x.total_cmp(&right_x))
    });
    tables
}

fn cell_text(cell: &Cell, words: &[Word]) -> String {
    let inside = words
        .iter()
        .filter(|word| cell.contains(word.center()))
        .cloned()
        .collect::<Vec<_>>();

    cluster_rows(inside, |word| word.top, LINE_Y_TOLERANCE)
        .into_iter()
        .map(|mut line| {
            line.sort_by(|left, right| left.x0.total_cmp(&right.x0));
            line.iter()
                .map(|word| word.text.as_str())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn table_rows(cells: &[Cell], words: &[Word]) -> Vec<Row> {
    let tops = cells
        .iter()
        .map(|cell| quantize(cell.top))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect::<Vec<_>>();
    let lefts = cells
        .iter()
        .map(|cell| quantize(cell.x0))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect::<Vec<_>>();

    let mut grid = vec![vec![None::<String>; lefts.len()]; tops.len()];
    for cell in cells {
        let (Ok(row), Ok(column)) = (
            tops.binary_search(&quantize(cell.top)),
            lefts.binary_search(&quantize(cell.x0)),
        ) else {
            continue;
        };
        grid[row][column] = Some(cell_text(cell, words));
    }

    grid.into_iter()
        .map(|row| row.iter().map(|cell| cell_to_text(cell.as_deref())).collect())
        .collect()
}

/// Every ruled table on the page with at least a header and one data row.
pub(crate) fn find_ruled_tables(
    layout: &PageLayout,
    words: &[Word],
    settings: &LatticeSettings,
) -> Vec<Vec<Row>> {
    let edges = layout
        .edges
        .iter()
        .filter(|edge| settings.include_rect_sides || edge.kind == EdgeKind::Line)
        .cloned()
        .collect::<Vec<_>>();
    let edges = snap_edges(edges, settings.snap_tolerance);
    let edges = join_edges(edges, settings.join_tolerance)
        .into_iter()
        .filter(|edge| edge.length() >= settings.min_edge_length)
        .collect::<Vec<_>>();

    let points = find_intersections(&edges, settings.intersection_tolerance);
    let cells = find_cells(&points);
    group_cells(&cells)
        .iter()
        .map(|cells| table_rows(cells, words))
        .filter(|rows| rows.len() >= 2)
        .collect()
}
