pub mod lifecycle;
pub mod transitions;

pub use lifecycle::LifecycleEngine;
pub use transitions::TransitionPolicy;
