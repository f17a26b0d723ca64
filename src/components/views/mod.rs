mod clips;

pub use clips::*;
