pub mod pipeline;
pub mod stage1_extract;
pub mod stage2_dedupe;
pub mod stage3_queries;
pub mod stage4_diagnose;

#[cfg(test)]
pub mod testing;

pub use pipeline::*;
pub use stage1_extract::*;
pub use stage2_dedupe::*;
pub use stage3_queries::*;
pub use stage4_diagnose::*;
