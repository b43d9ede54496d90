use snafu::Snafu;
use strata_dtype::DType;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Violated representation invariants.
///
/// None of these are recoverable: they report a bug in whatever built the
/// graph, and the construction pass that hits one must be abandoned.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// Rejected by the representation itself.
    #[snafu(context(false), display("{source}"))]
    Ir { source: strata_ir::Error },

    /// Range part requested from a value that is not range-typed.
    #[snafu(display("value %{id} is not a range, got {actual}"))]
    NotARange { id: u64, actual: DType },

    /// Range value is a block argument, nothing constructed it.
    #[snafu(display("range %{id} has no producing operation"))]
    MissingRangeProducer { id: u64 },

    /// Range-typed value built by something other than a range construction.
    #[snafu(display("range %{id} is produced by {op}, not by a range construction"))]
    UnrecognizedRangeProducer { id: u64, op: &'static str },

    /// View-typed operand is a block argument, its ranges cannot be recovered.
    #[snafu(display("view %{id} has no producing operation to collect ranges from"))]
    MissingViewProducer { id: u64 },

    /// Elision asked for on something that is neither a view nor a slice.
    #[snafu(display("value %{id} is produced by {op}, expected a view or slice"))]
    NotAViewOrSlice { id: u64, op: &'static str },

    /// Replacement list does not cover the slice's range positions exactly.
    #[snafu(display("slice %{id} has {expected} range positions but {actual} replacements were given"))]
    SliceRangeCountMismatch { id: u64, expected: usize, actual: usize },

    /// Loop step is neither a constant nor an affine computation over constants.
    #[snafu(display("loop step %{id} does not reduce to a constant"))]
    NonConstantStep { id: u64 },

    /// Loop nest needs one induction variable per range.
    #[snafu(display("{ivs} induction variables given for {ranges} ranges"))]
    LoopArityMismatch { ivs: usize, ranges: usize },

    /// Map over range parts needs one dimension per range.
    #[snafu(display("map with {dims} dimensions applied to {ranges} ranges"))]
    RangeArityMismatch { dims: usize, ranges: usize },

    /// Ranges only supply dimensions.
    #[snafu(display("map over range parts cannot have symbols, got {symbols}"))]
    UnexpectedSymbols { symbols: usize },

    /// Folding resolves one expression at a time.
    #[snafu(display("folding needs a single-result map, got {results} results"))]
    SingleResultExpected { results: usize },

    /// Pool used with a builder of another unit.
    #[snafu(display("constant pool of unit {pool_unit} used while building unit {unit}"))]
    ForeignConstantPool { pool_unit: u64, unit: u64 },
}
