//! Transfer modes, directions and vector layouts
//!
//! A [`TransferMode`] fixes two things at once: the ordered list of primitive
//! [`Step`]s run by a transfer, and the [`BlockLayout`] of the vectors it
//! accepts. The layout is derived from the steps, so each mode is described
//! in exactly one place.

use crate::error::{Result, TransferError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

/// How a vector is laid out and transferred between two levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransferMode {
    /// One scalar per vertex, mapped by the vertex matrix.
    MatrixOnly,
    /// One scalar per vertex, projected onto the constraint subspace on both sides.
    MatrixAndProjector,
    /// One scalar per vertex plus one trailing global scalar copied verbatim.
    Barycenter,
    /// Three values per vertex, three barycenter scalars, one value per edge.
    Matrix3AndEdgeConstraints,
    /// Three values per vertex plus three barycenter scalars.
    Matrix3AndBarycenter,
    /// Three values per vertex, projected onto the constraint subspace on both sides.
    Matrix3AndProjector,
}

/// One primitive of a transfer, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Replace the input by its projection onto the input level's subspace.
    ProjectInput,
    /// Map the per-vertex block, `width` interleaved values per vertex.
    Vertices { width: usize },
    /// Copy the global barycenter block of `width` scalars verbatim.
    Barycenter { width: usize },
    /// Map the per-edge constraint block.
    EdgeConstraints,
    /// Replace the output by its projection onto the output level's subspace.
    ProjectOutput,
}

const MATRIX_ONLY: &[Step] = &[Step::Vertices { width: 1 }];
const MATRIX_AND_PROJECTOR: &[Step] = &[
    Step::ProjectInput,
    Step::Vertices { width: 1 },
    Step::ProjectOutput,
];
const BARYCENTER: &[Step] = &[Step::Vertices { width: 1 }, Step::Barycenter { width: 1 }];
const MATRIX3_AND_EDGE_CONSTRAINTS: &[Step] = &[
    Step::Vertices { width: 3 },
    Step::Barycenter { width: 3 },
    Step::EdgeConstraints,
];
const MATRIX3_AND_BARYCENTER: &[Step] = &[
    Step::Vertices { width: 3 },
    Step::Barycenter { width: 3 },
];
const MATRIX3_AND_PROJECTOR: &[Step] = &[
    Step::ProjectInput,
    Step::Vertices { width: 3 },
    Step::ProjectOutput,
];

impl TransferMode {
    /// All modes, in tag order.
    pub const ALL: [TransferMode; 6] = [
        TransferMode::MatrixOnly,
        TransferMode::MatrixAndProjector,
        TransferMode::Barycenter,
        TransferMode::Matrix3AndEdgeConstraints,
        TransferMode::Matrix3AndBarycenter,
        TransferMode::Matrix3AndProjector,
    ];

    /// Ordered primitive list of this mode.
    pub fn steps(self) -> &'static [Step] {
        match self {
            TransferMode::MatrixOnly => MATRIX_ONLY,
            TransferMode::MatrixAndProjector => MATRIX_AND_PROJECTOR,
            TransferMode::Barycenter => BARYCENTER,
            TransferMode::Matrix3AndEdgeConstraints => MATRIX3_AND_EDGE_CONSTRAINTS,
            TransferMode::Matrix3AndBarycenter => MATRIX3_AND_BARYCENTER,
            TransferMode::Matrix3AndProjector => MATRIX3_AND_PROJECTOR,
        }
    }

    /// Vector layout implied by the steps.
    pub fn layout(self) -> BlockLayout {
        let mut layout = BlockLayout::default();
        for step in self.steps() {
            match *step {
                Step::ProjectInput | Step::ProjectOutput => layout.projected = true,
                Step::Vertices { width } => layout.vertex_width = width,
                Step::Barycenter { width } => layout.barycenter_width = width,
                Step::EdgeConstraints => layout.edge_constraints = true,
            }
        }
        layout
    }

    /// Vector length for a level with `verts` vertices.
    pub fn expected_len(self, verts: usize) -> usize {
        self.layout().len(verts)
    }

    /// Whether the mode brackets the transfer with projector calls.
    pub fn is_projected(self) -> bool {
        self.layout().projected
    }

    /// Numeric tag of the mode.
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Decode a numeric tag.
    pub fn from_tag(tag: u8) -> Result<Self> {
        Self::ALL
            .get(usize::from(tag))
            .copied()
            .ok_or_else(|| TransferError::UnsupportedMode {
                tag: tag.to_string(),
            })
    }

    fn name(self) -> &'static str {
        match self {
            TransferMode::MatrixOnly => "MatrixOnly",
            TransferMode::MatrixAndProjector => "MatrixAndProjector",
            TransferMode::Barycenter => "Barycenter",
            TransferMode::Matrix3AndEdgeConstraints => "Matrix3AndEdgeConstraints",
            TransferMode::Matrix3AndBarycenter => "Matrix3AndBarycenter",
            TransferMode::Matrix3AndProjector => "Matrix3AndProjector",
        }
    }
}

impl fmt::Display for TransferMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TransferMode {
    type Err = TransferError;

    /// Accepts the variant name in any case, with or without underscores
    /// (`Matrix3AndBarycenter`, `matrix3_and_barycenter`).
    fn from_str(s: &str) -> Result<Self> {
        let key: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .map(|c| c.to_ascii_lowercase())
            .collect();

        Self::ALL
            .into_iter()
            .find(|mode| mode.name().to_ascii_lowercase() == key)
            .ok_or_else(|| TransferError::UnsupportedMode { tag: s.to_string() })
    }
}

impl TryFrom<u8> for TransferMode {
    type Error = TransferError;

    fn try_from(tag: u8) -> Result<Self> {
        Self::from_tag(tag)
    }
}

/// Block structure of a transfer vector.
///
/// Layout for a level with `v` vertices:
/// `[ vertex block (width * v) | barycenter block | edge block (v, optional) ]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlockLayout {
    /// Interleaved values per vertex (1 or 3)
    pub vertex_width: usize,
    /// Number of trailing global scalars (0, 1 or 3)
    pub barycenter_width: usize,
    /// One constraint value per edge after the barycenter block
    pub edge_constraints: bool,
    /// Transfer is bracketed by projections
    pub projected: bool,
}

impl BlockLayout {
    /// Total vector length for `verts` vertices.
    pub fn len(&self, verts: usize) -> usize {
        self.vertex_range(verts).len() + self.barycenter_width + self.edge_range(verts).len()
    }

    /// Range of the per-vertex block.
    pub fn vertex_range(&self, verts: usize) -> Range<usize> {
        0..self.vertex_width * verts
    }

    /// Range of the barycenter block.
    pub fn barycenter_range(&self, verts: usize) -> Range<usize> {
        let start = self.vertex_width * verts;
        start..start + self.barycenter_width
    }

    /// Range of the edge-constraint block (empty if the layout has none).
    pub fn edge_range(&self, verts: usize) -> Range<usize> {
        let start = self.vertex_width * verts + self.barycenter_width;
        let edges = if self.edge_constraints { verts } else { 0 };
        start..start + edges
    }
}

/// Level of the hierarchy pair an operator connects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    /// Coarse level
    Lower,
    /// Fine level
    Upper,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Lower => f.write_str("lower"),
            Level::Upper => f.write_str("upper"),
        }
    }
}

/// Which variant of every primitive a transfer applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Coarse to fine with the forward maps
    Prolong,
    /// Fine to coarse with the transposed maps
    RestrictTranspose,
    /// Fine to coarse with the pseudo-inverse maps
    RestrictPseudoInverse,
}

impl Direction {
    /// Level the input vector lives on.
    pub fn input_level(self) -> Level {
        match self {
            Direction::Prolong => Level::Lower,
            Direction::RestrictTranspose | Direction::RestrictPseudoInverse => Level::Upper,
        }
    }

    /// Level the output vector lives on.
    pub fn output_level(self) -> Level {
        match self.input_level() {
            Level::Lower => Level::Upper,
            Level::Upper => Level::Lower,
        }
    }
}

/// Restriction flavour used by [`TransferOperator::restrict`](super::TransferOperator::restrict).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestrictionKind {
    /// Galerkin-consistent adjoint of prolongation
    #[default]
    Transpose,
    /// Least-squares left inverse of prolongation
    PseudoInverse,
}

impl RestrictionKind {
    /// Direction this restriction runs in.
    pub fn direction(self) -> Direction {
        match self {
            RestrictionKind::Transpose => Direction::RestrictTranspose,
            RestrictionKind::PseudoInverse => Direction::RestrictPseudoInverse,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_formulas() {
        let n = 7;
        assert_eq!(TransferMode::MatrixOnly.expected_len(n), n);
        assert_eq!(TransferMode::MatrixAndProjector.expected_len(n), n);
        assert_eq!(TransferMode::Barycenter.expected_len(n), n + 1);
        assert_eq!(TransferMode::Matrix3AndEdgeConstraints.expected_len(n), 4 * n + 3);
        assert_eq!(TransferMode::Matrix3AndBarycenter.expected_len(n), 3 * n + 3);
        assert_eq!(TransferMode::Matrix3AndProjector.expected_len(n), 3 * n);
    }

    #[test]
    fn test_empty_level() {
        assert_eq!(TransferMode::MatrixOnly.expected_len(0), 0);
        assert_eq!(TransferMode::Matrix3AndEdgeConstraints.expected_len(0), 3);
    }

    #[test]
    fn test_block_ranges_tile_the_vector() {
        let layout = TransferMode::Matrix3AndEdgeConstraints.layout();
        assert_eq!(layout.vertex_range(4), 0..12);
        assert_eq!(layout.barycenter_range(4), 12..15);
        assert_eq!(layout.edge_range(4), 15..19);
        assert_eq!(layout.len(4), 19);

        let bary = TransferMode::Barycenter.layout();
        assert_eq!(bary.barycenter_range(3), 3..4);
        assert!(bary.edge_range(3).is_empty());
    }

    #[test]
    fn test_projected_modes() {
        let projected: Vec<_> = TransferMode::ALL
            .into_iter()
            .filter(|m| m.is_projected())
            .collect();
        assert_eq!(
            projected,
            vec![TransferMode::MatrixAndProjector, TransferMode::Matrix3AndProjector]
        );
    }

    #[test]
    fn test_tag_roundtrip() {
        for mode in TransferMode::ALL {
            assert_eq!(TransferMode::from_tag(mode.tag()).unwrap(), mode);
        }
        let err = TransferMode::try_from(6u8).unwrap_err();
        assert!(err.is_mode_error());
    }

    #[test]
    fn test_parse_names() {
        assert_eq!(
            "Matrix3AndBarycenter".parse::<TransferMode>().unwrap(),
            TransferMode::Matrix3AndBarycenter
        );
        assert_eq!(
            "matrix_and_projector".parse::<TransferMode>().unwrap(),
            TransferMode::MatrixAndProjector
        );
        assert!(matches!(
            "Matrix4".parse::<TransferMode>(),
            Err(TransferError::UnsupportedMode { tag }) if tag == "Matrix4"
        ));
    }

    #[test]
    fn test_direction_levels() {
        assert_eq!(Direction::Prolong.input_level(), Level::Lower);
        assert_eq!(Direction::Prolong.output_level(), Level::Upper);
        assert_eq!(Direction::RestrictPseudoInverse.input_level(), Level::Upper);
        assert_eq!(RestrictionKind::default().direction(), Direction::RestrictTranspose);
    }
}
