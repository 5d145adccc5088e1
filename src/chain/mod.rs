pub mod detect;
pub mod normalize;
pub mod registry;

pub use normalize::normalize;
pub use registry::{Chain, ChainFamily, ChainRef};
