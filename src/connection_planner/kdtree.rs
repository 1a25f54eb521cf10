//! Exact KD-tree over `$xyz` for nearest-neighbor connection formation
//!. Not approximate: `$k`/`$radius` are precise
//! selection parameters the generated `ConnectPopulationNN` depends on
//! for reproducible connection counts, so this
//! does an exact recursive split rather than an approximate index.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    fn coord(self, axis: usize) -> f64 {
        match axis % 3 {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }

    fn distance2(self, other: Point3) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }
}

enum Node {
    Leaf,
    Split { point: (Point3, usize), axis: usize, left: Box<Node>, right: Box<Node> },
}

pub struct KdTree {
    root: Node,
}

impl KdTree {
    pub fn build(points: &[(Point3, usize)]) -> Self {
        let mut owned: Vec<(Point3, usize)> = points.to_vec();
        KdTree { root: Self::build_node(&mut owned, 0) }
    }

    fn build_node(points: &mut [(Point3, usize)], depth: usize) -> Node {
        if points.is_empty() {
            return Node::Leaf;
        }
        let axis = depth % 3;
        points.sort_by(|a, b| a.0.coord(axis).partial_cmp(&b.0.coord(axis)).unwrap());
        let mid = points.len() / 2;
        let point = points[mid];
        let (left_slice, right_slice) = points.split_at_mut(mid);
        let right_slice = &mut right_slice[1..];
        Node::Split {
            point,
            axis,
            left: Box::new(Self::build_node(left_slice, depth + 1)),
            right: Box::new(Self::build_node(right_slice, depth + 1)),
        }
    }

    /// Return up to `k` nearest neighbors to `query`, sorted by ascending
    /// distance. `k = None` with `radius = Some(r)` returns every point
    /// within `r`; both `None` returns everything ("omitting
    /// both selects every instance").
    pub fn query(&self, query: Point3, k: Option<usize>, radius: Option<f64>) -> Vec<(usize, f64)> {
        let mut found: Vec<(usize, f64)> = Vec::new();
        let radius2 = radius.map(|r| r * r);
        Self::visit(&self.root, query, radius2, &mut found);
        found.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap());
        if let Some(k) = k {
            found.truncate(k);
        }
        found
    }

    fn visit(node: &Node, query: Point3, radius2: Option<f64>, found: &mut Vec<(usize, f64)>) {
        let Node::Split { point, axis, left, right } = node else { return };
        let d2 = query.distance2(point.0);
        if radius2.map_or(true, |r2| d2 <= r2) {
            found.push((point.1, d2.sqrt()));
        }
        let diff = query.coord(*axis) - point.0.coord(*axis);
        let (near, far) = if diff < 0.0 { (left, right) } else { (right, left) };
        Self::visit(near, query, radius2, found);
        if radius2.map_or(true, |r2| diff * diff <= r2) {
            Self::visit(far, query, radius2, found);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(x: f64, y: f64, z: f64) -> Point3 {
        Point3 { x, y, z }
    }

    #[test]
    fn finds_exact_nearest_k_neighbors() {
        let points = vec![(pt(0.0, 0.0, 0.0), 0), (pt(1.0, 0.0, 0.0), 1), (pt(5.0, 0.0, 0.0), 2), (pt(2.0, 0.0, 0.0), 3)];
        let tree = KdTree::build(&points);
        let result = tree.query(pt(0.0, 0.0, 0.0), Some(2), None);
        let ids: Vec<usize> = result.iter().map(|(i, _)| *i).collect();
        assert_eq!(ids, vec![0, 1]);
    }

    #[test]
    fn radius_query_excludes_points_outside_range() {
        let points = vec![(pt(0.0, 0.0, 0.0), 0), (pt(10.0, 0.0, 0.0), 1)];
        let tree = KdTree::build(&points);
        let result = tree.query(pt(0.0, 0.0, 0.0), None, Some(1.0));
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].0, 0);
    }
}
