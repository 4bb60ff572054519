pub mod boolean;
pub mod classify;
pub mod creation;
pub mod cut;
pub mod intersect;
pub mod query;
