pub mod clavet;
pub mod pbf;
pub mod viscosity;

/// Density-relaxation strategy, selected at simulation construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SolverKind {
    /// Clavet-style explicit double-density relaxation.
    Clavet,
    /// Position-based fluids: fixed-iteration Jacobi constraint solve.
    Pbf,
}
