pub mod explanation;
pub mod recommendation;
pub mod serving;
