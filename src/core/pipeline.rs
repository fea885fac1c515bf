//! Pipeline assembly: configuration in, ordered step list out.

use crate::config::Config;
use crate::core::steps::Step;

/// Build the ordered step list for one pipeline run.
///
/// Purely mechanical: no validation happens here (the entry-point preflight
/// owns that), and identical configurations always produce structurally
/// identical pipelines. The assembler loop walks `Assembler::ALL` in its
/// fixed order; racon polishing only ever attaches to the graph-based
/// assembler, and every cleanup variant is gated on `keep_intermediate`.
///
/// # Example
///
/// ``` rust, no_run
/// use nanoamp::config::Config;
/// use nanoamp::core::pipeline::assemble;
///
/// let config = Config::read("config.toml".into()).unwrap();
/// let pipeline = assemble(&config);
/// ```
pub fn assemble(config: &Config) -> Vec<Step> {
    let threads = config.run.threads;
    let keep = config.run.keep_intermediate;
    let racon = !config.polishing.racon_skip;

    let mut steps = vec![
        Step::SplitDuplex { threads },
        Step::Filter {
            min_len: config.run.min_read_length,
            max_bases: config.max_bases(),
        },
    ];

    if !keep {
        steps.push(Step::CleanDuplex);
    }

    for assembler in config.selected_assemblers() {
        steps.push(Step::Assembly { threads, assembler });

        if assembler.is_graph_based() && racon {
            steps.push(Step::RaconPolish { threads });
        }

        steps.push(Step::MedakaPolish {
            threads,
            assembler,
            model: config.medaka_model(),
            racon,
        });

        if !keep {
            steps.push(Step::CleanAssembly { assembler, racon });
        }
    }

    if !keep {
        steps.push(Step::CleanFilter);
        steps.push(Step::FinalClean);
    }

    steps
}
