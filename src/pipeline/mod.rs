pub mod issue;
pub mod pipeline;
pub mod reorder;
