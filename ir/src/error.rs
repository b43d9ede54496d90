use snafu::Snafu;
use strata_dtype::DType;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Malformed construction of the value graph.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// Operand does not have the type the operation requires.
    #[snafu(display("{op} expects {expected} operand at position {position}, got {actual}"))]
    OperandTypeMismatch { op: &'static str, position: usize, expected: &'static str, actual: DType },

    /// View or slice indexing list does not match the rank of what it indexes.
    #[snafu(display("{op} over rank {rank} needs {rank} indexings, got {actual}"))]
    IndexingCountMismatch { op: &'static str, rank: usize, actual: usize },

    /// Affine map position refers past the declared dimension or symbol count.
    #[snafu(display("affine {kind} position {position} out of range for map with {count} {kind}s"))]
    AffinePositionOutOfRange { kind: &'static str, position: u32, count: usize },

    /// Operand count does not match the map's dimension and symbol count.
    #[snafu(display("affine map with {expected} inputs applied to {actual} operands"))]
    AffineArityMismatch { expected: usize, actual: usize },

    /// Affine computations evaluate exactly one expression.
    #[snafu(display("affine computation needs a single-result map, got {results} results"))]
    MultiResultAffineApply { results: usize },

    /// Composition did not reach a fixpoint; the producer graph is not a DAG.
    #[snafu(display("affine composition did not converge after {limit} rounds"))]
    CompositionDiverged { limit: usize },

    /// Loop bound to something other than a fresh induction variable.
    #[snafu(display("value %{id} is not an induction variable"))]
    NotAnInductionVar { id: u64 },

    /// Induction variable already bound by another loop of the unit.
    #[snafu(display("induction variable %{id} already bound by a loop"))]
    InductionVarInUse { id: u64 },

    /// Loops only walk forward.
    #[snafu(display("loop step must be positive, got {step}"))]
    NonPositiveStep { step: i64 },

    /// `close_loop` without a matching `open_loop`.
    #[snafu(display("no open loop to close"))]
    NoOpenLoop,

    /// Unit finished while loops were still open.
    #[snafu(display("function finished with {count} loops still open"))]
    UnclosedLoops { count: usize },
}
