//! Draw transition-matrix samples for a count matrix and write them as CSV.

mod logging;

use std::io;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use csv::{ReaderBuilder, Trim, WriterBuilder};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use revsample::utils::rng::chain_seed;
use revsample::{
    print_matrix, sample_chains, sample_sparse_chains, ChainPlan, ChainRun, CountMatrix,
    NonReversibleSampler, SamplerConfig, SparseTopology, SweepStats,
};

/// Run-time configuration, straight from the command line.
#[derive(Debug, Parser)]
#[command(name = "revsample", version, about = "Posterior samples of transition matrices")]
struct Cli {
    /// Count matrix as CSV, one row per line, no header.
    #[arg(long)]
    counts: PathBuf,

    /// Output CSV with columns chain,sample,i,j,p.
    #[arg(long, short, default_value = "samples.csv")]
    output: PathBuf,

    /// Samples recorded per chain.
    #[arg(long, default_value_t = 100)]
    samples: usize,

    /// Sweeps between recorded samples.
    #[arg(long, default_value_t = 10)]
    n_step: usize,

    /// Log-space random-walk stepsize.
    #[arg(long, default_value_t = 1.0)]
    stepsize: f64,

    /// Skip the Gamma independence proposal.
    #[arg(long)]
    no_gamma: bool,

    /// Rebuild row sums every this many sweeps.
    #[arg(long, default_value_t = 100)]
    renormalize_every: usize,

    /// Independent chains, run in parallel.
    #[arg(long, default_value_t = 1)]
    chains: usize,

    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Restrict sampling to the nonzero pattern of C + Cᵀ.
    #[arg(long)]
    sparse: bool,

    /// Use the flat-pass sparse driver.
    #[arg(long, requires = "sparse")]
    fast: bool,

    /// Drop reversibility and draw rows from Dirichlet(C + prior).
    #[arg(long, conflicts_with = "sparse")]
    nonrev: bool,

    /// Dirichlet pseudocount for --nonrev.
    #[arg(long, default_value_t = 1.0)]
    prior: f64,

    /// Dump the last sample of chain 0 to stderr.
    #[arg(long)]
    print: bool,

    /// -v info, -vv debug, -vvv trace.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(e) = run(&cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let counts = read_counts(&cli.counts)?;
    info!(n = counts.n(), total = counts.total(), "counts loaded");

    let plan = ChainPlan {
        n_chains: cli.chains,
        n_samples: cli.samples,
        n_step: cli.n_step,
        seed: cli.seed,
    };
    let config = SamplerConfig::new()
        .with_stepsize(cli.stepsize)
        .with_gamma_proposal(!cli.no_gamma)
        .with_renormalize_every(cli.renormalize_every);

    let bar = ProgressBar::new((plan.n_chains * plan.n_samples) as u64);
    bar.set_style(ProgressStyle::with_template(
        " {bar:40.cyan/blue} {pos}/{len} [{elapsed_precise}]",
    )?);

    let runs = if cli.nonrev {
        sample_nonreversible(&counts, cli.prior, plan, &bar)?
    } else if cli.sparse {
        let topology = Arc::new(SparseTopology::from_dense_pattern(counts.as_slice(), counts.n())?);
        let sparse_counts = counts.restrict(&topology)?;
        info!(n_idx = topology.n_idx(), "sparse topology built");
        sample_sparse_chains(topology, &sparse_counts, &config, cli.fast, plan, || bar.inc(1))?
    } else {
        sample_chains(&counts, &config, plan, || bar.inc(1))?
    };
    bar.finish();

    // Fast sparse and non-reversible chains record no proposals.
    for run in runs.iter().filter(|r| r.stats.proposed > 0) {
        info!(
            chain = run.chain,
            proposed = run.stats.proposed,
            accepted = run.stats.accepted,
            "chain summary"
        );
    }

    write_samples(&cli.output, &runs)?;
    println!("{} samples → {}", plan.n_chains * plan.n_samples, cli.output.display());

    if cli.print {
        if let Some(last) = runs.first().and_then(|r| r.samples.last()) {
            print_matrix(last.as_slice(), last.n(), &mut io::stderr())?;
        }
    }
    Ok(())
}

fn sample_nonreversible(
    counts: &CountMatrix,
    prior: f64,
    plan: ChainPlan,
    bar: &ProgressBar,
) -> Result<Vec<ChainRun>> {
    (0..plan.n_chains)
        .map(|chain| {
            let mut sampler = NonReversibleSampler::new(counts, prior, chain_seed(plan.seed, chain))?;
            let samples = (0..plan.n_samples)
                .map(|_| {
                    bar.inc(1);
                    sampler.sample()
                })
                .collect();
            Ok(ChainRun {
                chain,
                samples,
                stats: SweepStats::default(),
            })
        })
        .collect()
}

fn read_counts(path: &Path) -> Result<CountMatrix> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .trim(Trim::All)
        .from_path(path)
        .with_context(|| format!("cannot open {}", path.display()))?;

    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("bad CSV record at line {}", line + 1))?;
        let row = record
            .iter()
            .map(|field| {
                field
                    .parse::<f64>()
                    .with_context(|| format!("line {}: cannot parse {field:?}", line + 1))
            })
            .collect::<Result<Vec<f64>>>()?;
        rows.push(row);
    }
    CountMatrix::from_rows(&rows).with_context(|| format!("invalid count matrix in {}", path.display()))
}

fn write_samples(path: &Path, runs: &[ChainRun]) -> Result<()> {
    let mut wtr = WriterBuilder::new()
        .from_path(path)
        .with_context(|| format!("cannot create {}", path.display()))?;
    wtr.write_record(["chain", "sample", "i", "j", "p"])?;
    for run in runs {
        for (s, matrix) in run.samples.iter().enumerate() {
            let n = matrix.n();
            for i in 0..n {
                for j in 0..n {
                    let p = matrix.get(i, j);
                    if p == 0.0 {
                        continue;
                    }
                    wtr.write_record(&[
                        run.chain.to_string(),
                        s.to_string(),
                        i.to_string(),
                        j.to_string(),
                        p.to_string(),
                    ])?;
                }
            }
        }
    }
    wtr.flush()?;
    Ok(())
}
