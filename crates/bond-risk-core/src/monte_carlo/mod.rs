pub mod params;
pub mod short_rate;

#[cfg(feature = "simulation")]
pub mod copula;
#[cfg(feature = "simulation")]
pub mod simulation;

pub use params::SimulationParams;
pub use short_rate::ShortRateParams;

#[cfg(feature = "simulation")]
pub use simulation::{
    run_simulation, simulate, simulate_cancellable, HistogramBucket, MonteCarloResult,
    SimulationInput, SimulationRun,
};
