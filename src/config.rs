/// Runtime-tunable knobs for `load`. Not a CLI surface — just a plain
/// struct, grouped the way this codebase groups its other run-time args.
#[derive(Clone, Debug)]
pub struct IngestConfig {
    pub threads: usize,
    pub verbose: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        IngestConfig {
            threads: num_cpus::get().max(1),
            verbose: false,
        }
    }
}
