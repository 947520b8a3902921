mod context;
mod scenario;

pub use {
    context::{CityContext, CityContextBuilder},
    scenario::simulate_actions,
};
