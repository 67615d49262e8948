//! Parameters shared between the control thread and the render thread

mod atomic;
mod store;

pub use atomic::{AtomicF32, AtomicF64};
pub use store::{
    ParameterSnapshot, ParameterStore, DEFAULT_FREQUENCY_HZ, DEFAULT_VOLUME_PERCENT,
    FREQUENCY_FLOOR_HZ, MAX_FREQUENCY_HZ, MIN_FREQUENCY_HZ,
};
