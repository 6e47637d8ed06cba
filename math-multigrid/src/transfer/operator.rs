//! Transfer operator between two adjacent levels
//!
//! The operator owns the vertex and edge transfer maps of one level pair and
//! borrows the projectors of both levels. Every public transfer goes through
//! a single routine driven by a [`TransferPlan`]:
//!
//! 1. resolve the plan for `(mode, direction)`
//! 2. reject bad input lengths and missing collaborators
//! 3. allocate a zeroed output
//! 4. run the mode's steps in order, each in the direction's variant

use super::mode::{Direction, Level, RestrictionKind, Step, TransferMode};
use super::plan::TransferPlan;
use crate::config::TransferConfig;
use crate::error::{Result, TransferError};
use crate::traits::{Projector, Scalar, TransferMap};
use ndarray::{Array1, ArrayView1, ArrayViewMut1, s};
use std::borrow::Cow;

/// Prolongation and restriction between a lower (coarse) and an upper (fine) level
///
/// Projectors are borrowed for `'p`, so they are guaranteed to outlive every
/// call made through the operator. The operator itself is immutable once built
/// and may be shared across threads.
pub struct TransferOperator<'p, T: Scalar> {
    lower_size: usize,
    upper_size: usize,
    vertices: Box<dyn TransferMap<T> + 'p>,
    edges: Option<Box<dyn TransferMap<T> + 'p>>,
    lower_projector: Option<&'p dyn Projector<T>>,
    upper_projector: Option<&'p dyn Projector<T>>,
    restriction: RestrictionKind,
}

impl<'p, T: Scalar> TransferOperator<'p, T> {
    /// Create an operator from the `upper × lower` vertex map.
    pub fn new<M>(lower_size: usize, upper_size: usize, vertices: M) -> Result<Self>
    where
        M: TransferMap<T> + 'p,
    {
        check_shape("vertex", &vertices, lower_size, upper_size)?;

        log::debug!(
            "transfer operator: {} lower vertices, {} upper vertices",
            lower_size,
            upper_size
        );

        Ok(Self {
            lower_size,
            upper_size,
            vertices: Box::new(vertices),
            edges: None,
            lower_projector: None,
            upper_projector: None,
            restriction: RestrictionKind::default(),
        })
    }

    /// Attach the `upper × lower` edge-constraint map.
    pub fn with_edge_constraints<M>(mut self, edges: M) -> Result<Self>
    where
        M: TransferMap<T> + 'p,
    {
        check_shape("edge", &edges, self.lower_size, self.upper_size)?;
        self.edges = Some(Box::new(edges));
        Ok(self)
    }

    /// Attach the projectors of both levels.
    pub fn with_projectors(
        mut self,
        lower: &'p dyn Projector<T>,
        upper: &'p dyn Projector<T>,
    ) -> Self {
        self.lower_projector = Some(lower);
        self.upper_projector = Some(upper);
        self
    }

    /// Restriction used by [`restrict`](Self::restrict).
    pub fn with_restriction(mut self, kind: RestrictionKind) -> Self {
        self.restriction = kind;
        self
    }

    /// Apply the operator-level settings of `config`.
    pub fn with_config(self, config: &TransferConfig) -> Self {
        self.with_restriction(config.restriction)
    }

    /// Vertex count of the coarse level
    pub fn lower_size(&self) -> usize {
        self.lower_size
    }

    /// Vertex count of the fine level
    pub fn upper_size(&self) -> usize {
        self.upper_size
    }

    /// Vector length on `level` under `mode`.
    pub fn expected_len(&self, mode: TransferMode, level: Level) -> usize {
        match level {
            Level::Lower => mode.expected_len(self.lower_size),
            Level::Upper => mode.expected_len(self.upper_size),
        }
    }

    /// Whether every collaborator `mode` needs is attached.
    pub fn supports(&self, mode: TransferMode) -> bool {
        let plan = TransferPlan::new(mode, Direction::Prolong, self.lower_size, self.upper_size);
        self.check_collaborators(&plan).is_ok()
    }

    /// Map a coarse-level vector to the fine level.
    pub fn prolong(&self, v: &Array1<T>, mode: TransferMode) -> Result<Array1<T>> {
        self.transfer(Direction::Prolong, v, mode)
    }

    /// Map a fine-level vector to the coarse level with the transposed maps.
    pub fn restrict_by_transpose(&self, v: &Array1<T>, mode: TransferMode) -> Result<Array1<T>> {
        self.transfer(Direction::RestrictTranspose, v, mode)
    }

    /// Map a fine-level vector to the coarse level with the pseudo-inverse maps.
    pub fn restrict_by_pseudo_inverse(
        &self,
        v: &Array1<T>,
        mode: TransferMode,
    ) -> Result<Array1<T>> {
        self.transfer(Direction::RestrictPseudoInverse, v, mode)
    }

    /// Restrict with the operator's configured [`RestrictionKind`].
    pub fn restrict(&self, v: &Array1<T>, mode: TransferMode) -> Result<Array1<T>> {
        self.transfer(self.restriction.direction(), v, mode)
    }

    /// Run a transfer in any direction.
    pub fn transfer(
        &self,
        direction: Direction,
        v: &Array1<T>,
        mode: TransferMode,
    ) -> Result<Array1<T>> {
        let plan = TransferPlan::new(mode, direction, self.lower_size, self.upper_size);
        plan.check_input(v.len())?;
        self.check_collaborators(&plan)?;

        log::trace!(
            "{:?} {}: {} -> {} entries",
            direction,
            mode,
            plan.input_len(),
            plan.output_len()
        );

        let mut input = Cow::Borrowed(v);
        let mut output = plan.allocate_output();

        for &step in plan.steps() {
            match step {
                Step::ProjectInput => {
                    let projected = self.project(&plan, step, &input, plan.input_len())?;
                    input = Cow::Owned(projected);
                }
                Step::Vertices { width } => {
                    apply_interleaved(
                        self.vertices.as_ref(),
                        direction,
                        width,
                        input.view(),
                        output.view_mut(),
                        plan.input_verts,
                        plan.output_verts,
                    )?;
                }
                Step::Barycenter { .. } => {
                    let (from, to) = plan.barycenter_ranges();
                    output.slice_mut(s![to]).assign(&input.slice(s![from]));
                }
                Step::EdgeConstraints => {
                    let edges = self
                        .edges
                        .as_deref()
                        .ok_or(TransferError::MissingEdgeTransfer { mode })?;
                    let (from, to) = plan.edge_ranges();
                    edges.apply_into(direction, input.slice(s![from]), output.slice_mut(s![to]))?;
                }
                Step::ProjectOutput => {
                    output = self.project(&plan, step, &output, plan.output_len())?;
                }
            }
        }

        Ok(output)
    }

    /// Run a projection step and reject a result of the wrong length.
    fn project(
        &self,
        plan: &TransferPlan,
        step: Step,
        v: &Array1<T>,
        expected: usize,
    ) -> Result<Array1<T>> {
        let projected = self.projector(plan, step)?.project_to_constraint_subspace(v);
        if projected.len() != expected {
            return Err(TransferError::ProjectorSize {
                level: plan.projector_level(step).unwrap_or(Level::Lower),
                expected,
                actual: projected.len(),
            });
        }
        Ok(projected)
    }

    fn projector(&self, plan: &TransferPlan, step: Step) -> Result<&'p dyn Projector<T>> {
        let level = plan.projector_level(step).unwrap_or(Level::Lower);
        let projector = match level {
            Level::Lower => self.lower_projector,
            Level::Upper => self.upper_projector,
        };
        projector.ok_or(TransferError::MissingProjector {
            mode: plan.mode,
            level,
        })
    }

    /// Everything a plan needs must be present and length-compatible before
    /// the output is allocated.
    fn check_collaborators(&self, plan: &TransferPlan) -> Result<()> {
        for &step in plan.steps() {
            match step {
                Step::ProjectInput | Step::ProjectOutput => {
                    let projector = self.projector(plan, step)?;
                    let expected = if step == Step::ProjectInput {
                        plan.input_len()
                    } else {
                        plan.output_len()
                    };
                    if let Some(actual) = projector.dim().filter(|&d| d != expected) {
                        return Err(TransferError::ProjectorSize {
                            level: plan.projector_level(step).unwrap_or(Level::Lower),
                            expected,
                            actual,
                        });
                    }
                }
                Step::EdgeConstraints if self.edges.is_none() => {
                    return Err(TransferError::MissingEdgeTransfer { mode: plan.mode });
                }
                _ => {}
            }
        }
        Ok(())
    }
}

fn check_shape<T: Scalar>(
    map: &'static str,
    transfer: &dyn TransferMap<T>,
    lower: usize,
    upper: usize,
) -> Result<()> {
    if transfer.shape() != (upper, lower) {
        return Err(TransferError::MapShape {
            map,
            expected: (upper, lower),
            actual: transfer.shape(),
        });
    }
    Ok(())
}

/// Apply a 1-wide vertex map to a block of `width` interleaved values per
/// vertex, one coordinate stripe at a time.
fn apply_interleaved<T: Scalar>(
    map: &dyn TransferMap<T>,
    direction: Direction,
    width: usize,
    input: ArrayView1<T>,
    mut output: ArrayViewMut1<T>,
    input_verts: usize,
    output_verts: usize,
) -> Result<()> {
    // An empty side contributes nothing and leaves the zeroed output as is.
    if input_verts == 0 || output_verts == 0 {
        return Ok(());
    }

    for k in 0..width {
        let stripe_in = input.slice(s![k..width * input_verts; width]);
        let stripe_out = output.slice_mut(s![k..width * output_verts; width]);
        map.apply_into(direction, stripe_in, stripe_out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfer::SparseTransfer;
    use crate::traits::IdentityProjector;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn curve_operator<'p>(lower: usize) -> TransferOperator<'p, f64> {
        let vertices = SparseTransfer::curve_subdivision(lower, true);
        let edges = SparseTransfer::edge_split(lower);
        TransferOperator::new(lower, 2 * lower, vertices)
            .unwrap()
            .with_edge_constraints(edges)
            .unwrap()
    }

    #[test]
    fn test_prolong_matrix_only() {
        let op = curve_operator(3);
        let out = op.prolong(&array![1.0, 3.0, 5.0], TransferMode::MatrixOnly).unwrap();
        assert_eq!(out, array![1.0, 2.0, 3.0, 4.0, 5.0, 3.0]);
    }

    #[test]
    fn test_three_wide_stripes_are_independent() {
        let op = curve_operator(2);
        // vertex 0 = (1, 10, 100), vertex 1 = (3, 30, 300), barycenter = (7, 8, 9)
        let v = array![1.0, 10.0, 100.0, 3.0, 30.0, 300.0, 7.0, 8.0, 9.0];
        let out = op.prolong(&v, TransferMode::Matrix3AndBarycenter).unwrap();

        assert_eq!(out.len(), 15);
        assert_eq!(out.slice(s![0..3]), array![1.0, 10.0, 100.0]);
        assert_eq!(out.slice(s![3..6]), array![2.0, 20.0, 200.0]);
        assert_eq!(out.slice(s![6..9]), array![3.0, 30.0, 300.0]);
        assert_eq!(out.slice(s![12..15]), array![7.0, 8.0, 9.0]);
    }

    #[test]
    fn test_edge_block_uses_edge_map() {
        let op = curve_operator(2);
        let mut v = Array1::zeros(TransferMode::Matrix3AndEdgeConstraints.expected_len(2));
        v[9] = 4.0;
        v[10] = -1.0;

        let out = op.prolong(&v, TransferMode::Matrix3AndEdgeConstraints).unwrap();
        assert_eq!(out.len(), 19);
        assert_eq!(out.slice(s![15..19]), array![4.0, 4.0, -1.0, -1.0]);

        let back = op
            .restrict_by_pseudo_inverse(&out, TransferMode::Matrix3AndEdgeConstraints)
            .unwrap();
        assert_relative_eq!(back[9], 4.0, epsilon = 1e-9);
        assert_relative_eq!(back[10], -1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_missing_edge_map() {
        let vertices = SparseTransfer::<f64>::curve_subdivision(2, true);
        let op = TransferOperator::new(2, 4, vertices).unwrap();
        assert!(!op.supports(TransferMode::Matrix3AndEdgeConstraints));

        let err = op
            .prolong(&Array1::zeros(11), TransferMode::Matrix3AndEdgeConstraints)
            .unwrap_err();
        assert!(matches!(err, TransferError::MissingEdgeTransfer { .. }));
    }

    #[test]
    fn test_missing_projector() {
        let op = curve_operator(2);
        assert!(!op.supports(TransferMode::MatrixAndProjector));

        let err = op
            .restrict_by_transpose(&Array1::zeros(4), TransferMode::MatrixAndProjector)
            .unwrap_err();
        assert!(matches!(
            err,
            TransferError::MissingProjector {
                level: Level::Upper,
                ..
            }
        ));
    }

    #[test]
    fn test_identity_projectors_do_not_change_result() {
        let identity = IdentityProjector;
        let op = curve_operator(3).with_projectors(&identity, &identity);
        let v = array![1.0, 3.0, 5.0];

        let plain = op.prolong(&v, TransferMode::MatrixOnly).unwrap();
        let projected = op.prolong(&v, TransferMode::MatrixAndProjector).unwrap();
        assert_eq!(plain, projected);
    }

    #[test]
    fn test_map_shape_is_checked() {
        let vertices = SparseTransfer::<f64>::curve_subdivision(3, false);
        let err = TransferOperator::new(3, 6, vertices).err().unwrap();
        assert!(matches!(
            err,
            TransferError::MapShape {
                map: "vertex",
                expected: (6, 3),
                actual: (5, 3),
            }
        ));

        let edges = SparseTransfer::<f64>::edge_split(2);
        let err = curve_operator(3).with_edge_constraints(edges).err().unwrap();
        assert!(err.is_construction_error());
    }

    #[test]
    fn test_restrict_follows_configured_kind() {
        let op = curve_operator(3);
        let fine = array![1.0, 2.0, 3.0, 4.0, 5.0, 3.0];

        let transpose = op.restrict(&fine, TransferMode::MatrixOnly).unwrap();
        assert_eq!(transpose, op.restrict_by_transpose(&fine, TransferMode::MatrixOnly).unwrap());

        let op = op.with_restriction(RestrictionKind::PseudoInverse);
        let pinv = op.restrict(&fine, TransferMode::MatrixOnly).unwrap();
        for (a, b) in pinv.iter().zip([1.0, 3.0, 5.0]) {
            assert_relative_eq!(*a, b, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_empty_levels() {
        let vertices = SparseTransfer::<f64>::curve_subdivision(0, true);
        let op = TransferOperator::new(0, 0, vertices).unwrap();

        let out = op.prolong(&array![2.5], TransferMode::Barycenter).unwrap();
        assert_eq!(out, array![2.5]);
        assert_eq!(op.prolong(&Array1::zeros(0), TransferMode::MatrixOnly).unwrap().len(), 0);
    }

    #[test]
    fn test_rank_deficient_map_still_prolongs() {
        // Coarse vertex 1 has no fine counterpart
        let vertices = SparseTransfer::<f64>::from_triplets(
            4,
            3,
            vec![(0, 0, 1.0), (1, 0, 1.0), (2, 2, 1.0), (3, 2, 1.0)],
        );
        let op = TransferOperator::new(3, 4, vertices).unwrap();

        let fine = op.prolong(&array![1.0, 9.0, 2.0], TransferMode::MatrixOnly).unwrap();
        assert_eq!(fine, array![1.0, 1.0, 2.0, 2.0]);
        let coarse = op.restrict_by_transpose(&fine, TransferMode::MatrixOnly).unwrap();
        assert_eq!(coarse, array![2.0, 0.0, 4.0]);

        let err = op
            .restrict_by_pseudo_inverse(&fine, TransferMode::MatrixOnly)
            .unwrap_err();
        assert!(matches!(err, TransferError::SingularNormalMatrix { column: 1 }));
        assert!(err.is_pseudo_inverse_error());
    }
}
