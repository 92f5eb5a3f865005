pub mod chunk;
pub mod claim;
pub mod lenient;
pub mod query;
pub mod transcript;

pub use chunk::*;
pub use claim::*;
pub use query::*;
pub use transcript::*;
