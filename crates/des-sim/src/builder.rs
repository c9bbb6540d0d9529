//! Fluent builder for constructing an [`Environment`].

use des_core::SimConfig;

use crate::{Environment, Process, SimResult};

/// Fluent builder for [`Environment<M>`].
///
/// Resources get `ResourceId`s and processes get `ProcessId`s in declaration
/// order, both starting at 0, so models can refer to them before the
/// environment exists.
///
/// | Method          | Default        |
/// |-----------------|----------------|
/// | `.resource(c)`  | no resources   |
/// | `.process(p)`   | no processes   |
///
/// # Example
///
/// ```rust,ignore
/// let mut env = EnvironmentBuilder::new(SimConfig { seed: 7, ..Default::default() })
///     .resource(2)                    // ResourceId(0)
///     .process(Car::new(0))           // ProcessId(0)
///     .process(Car::new(1))           // ProcessId(1)
///     .build()?;
/// env.run(&mut report, &mut NoopObserver)?;
/// ```
pub struct EnvironmentBuilder<M> {
    config:     SimConfig,
    capacities: Vec<usize>,
    processes:  Vec<Box<dyn Process<M>>>,
}

impl<M: 'static> EnvironmentBuilder<M> {
    pub fn new(config: SimConfig) -> Self {
        Self { config, capacities: Vec::new(), processes: Vec::new() }
    }

    /// Declare a resource with `capacity` slots.
    pub fn resource(mut self, capacity: usize) -> Self {
        self.capacities.push(capacity);
        self
    }

    /// Declare a process started at the initial time.
    pub fn process<P: Process<M>>(mut self, process: P) -> Self {
        self.processes.push(Box::new(process));
        self
    }

    /// Validate the configuration and every resource capacity, register the
    /// processes, and return an `Idle` environment.
    pub fn build(self) -> SimResult<Environment<M>> {
        let mut env = Environment::new(self.config)?;
        for capacity in self.capacities {
            env.add_resource(capacity)?;
        }
        for process in self.processes {
            env.spawn_boxed(process)?;
        }
        Ok(env)
    }
}
