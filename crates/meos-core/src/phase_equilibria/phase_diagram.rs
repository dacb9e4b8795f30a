use super::PhaseEquilibrium;
use crate::SolverOptions;
use crate::equation_of_state::HelmholtzEnergy;
use crate::errors::MeosResult;
use crate::state::State;
use quantity::{KELVIN, Temperature};
#[cfg(feature = "rayon")]
use rayon::{ThreadPool, prelude::*};

/// Saturation curve of a pure fluid.
#[derive(Clone, Debug)]
pub struct PhaseDiagram<E, const N: usize> {
    pub states: Vec<PhaseEquilibrium<E, N>>,
}

impl<E, const N: usize> PhaseDiagram<E, N> {
    /// Create a phase diagram from a list of phase equilibria.
    pub fn new(states: Vec<PhaseEquilibrium<E, N>>) -> Self {
        Self { states }
    }
}

/// Temperatures between `min_temperature` and the critical temperature,
/// excluding the latter.
fn temperatures(min_temperature: f64, critical_temperature: f64, npoints: usize) -> Vec<f64> {
    let n = npoints.saturating_sub(1).max(1);
    let max_temperature = min_temperature
        + (critical_temperature - min_temperature) * ((npoints.max(2) - 2) as f64 / n as f64);
    if n == 1 {
        return vec![min_temperature];
    }
    (0..n)
        .map(|i| min_temperature + (max_temperature - min_temperature) * i as f64 / (n - 1) as f64)
        .collect()
}

impl<E: HelmholtzEnergy> PhaseDiagram<E, 2> {
    /// Calculate the saturation curve of a pure fluid from `min_temperature`
    /// up to the critical point.
    ///
    /// Temperatures at which the saturation solver fails are skipped.
    /// The last entry is always the critical point.
    pub fn pure(
        eos: &E,
        min_temperature: Temperature,
        npoints: usize,
        options: SolverOptions,
    ) -> MeosResult<Self> {
        let tc = eos.critical_constants().temperature;
        let temperatures = temperatures(min_temperature.convert_into(KELVIN), tc, npoints);
        let mut states = Self::solve_temperatures(eos, &temperatures, options);
        states.push(PhaseEquilibrium::critical_point(eos));
        Ok(PhaseDiagram::new(states))
    }

    fn solve_temperatures(
        eos: &E,
        temperatures: &[f64],
        options: SolverOptions,
    ) -> Vec<PhaseEquilibrium<E, 2>> {
        let mut states = Vec::with_capacity(temperatures.len());
        let mut vle = None;
        for &ti in temperatures {
            vle = PhaseEquilibrium::pure(eos, ti * KELVIN, vle.as_ref(), options).ok();
            if let Some(vle) = vle.as_ref() {
                states.push(vle.clone());
            }
        }
        states
    }

    /// Return the vapor states of the diagram.
    pub fn vapor(&self) -> Vec<&State<E>> {
        self.states.iter().map(|s| s.vapor()).collect()
    }

    /// Return the liquid states of the diagram.
    pub fn liquid(&self) -> Vec<&State<E>> {
        self.states.iter().map(|s| s.liquid()).collect()
    }
}

#[cfg(feature = "rayon")]
impl<E: HelmholtzEnergy + Send + Sync> PhaseDiagram<E, 2> {
    /// Calculate the saturation curve in parallel.
    ///
    /// The temperatures are split into chunks of size `chunksize`, which
    /// are solved sequentially on the threads of `thread_pool`.
    pub fn par_pure(
        eos: &E,
        min_temperature: Temperature,
        npoints: usize,
        chunksize: usize,
        thread_pool: ThreadPool,
        options: SolverOptions,
    ) -> MeosResult<Self> {
        let tc = eos.critical_constants().temperature;
        let temperatures = temperatures(min_temperature.convert_into(KELVIN), tc, npoints);

        let mut states: Vec<PhaseEquilibrium<E, 2>> = thread_pool.install(|| {
            temperatures
                .par_chunks(chunksize.max(1))
                .map(|t| Self::solve_temperatures(eos, t, options))
                .flatten_iter()
                .collect()
        });

        states.push(PhaseEquilibrium::critical_point(eos));
        Ok(PhaseDiagram::new(states))
    }
}
