pub mod csr;
pub mod howard;
pub mod scc;
pub mod traits;

pub use csr::GraphCSR;
pub use howard::{CycleCandidate, HowardSolver, HowardSolverBuilder};
pub use scc::TarjanDecomposer;
pub use traits::{ComponentDecomposer, GraphSolver};
