pub mod selectors;

pub use selectors::{DeviceSelectors, OptionProjector, SelectOption, Selector};
