//! Mean first-passage time of the LiCN -> LiNC isomerization.
//!
//! Starts an ensemble in the metastable LiCN well (theta = 0) with
//! Maxwell-Boltzmann momenta, couples it to a Langevin bath, and runs the
//! absorbing loop until every trajectory has crossed into the LiNC basin.

use anyhow::{bail, Result};
use clap::Parser;
use mfpt_core::{LangevinBath, LfMiddle, StateLayout, System};
use mfpt_sampler::{maxwell_boltzmann_ensemble, propagate_while, Observer};
use mfpt_systems::LithiumCyanide;
use nalgebra::DMatrix;

/// CODATA kelvin-hartree relationship.
const KELVIN_TO_HARTREE: f64 = 3.166_811_563_455_6e-6;

#[derive(Parser)]
#[command(name = "licn-mfpt")]
#[command(about = "Mean first-passage time of the LiCN -> LiNC isomerization")]
struct Cli {
    /// Bath temperature in Kelvin. High by default so runs finish quickly.
    #[arg(long, default_value = "5500.0")]
    temperature: f64,

    /// Bath friction in atomic units
    #[arg(long, default_value = "2e-4")]
    friction: f64,

    /// Step size in atomic time units
    #[arg(long, default_value = "0.1")]
    dt: f64,

    /// Number of trajectories
    #[arg(long, default_value = "2048")]
    trajectories: usize,

    /// Seed of the bath noise stream
    #[arg(long, default_value = "42")]
    bath_seed: u64,

    /// Seed of the initial-momentum sampling
    #[arg(long, default_value = "43")]
    ensemble_seed: u64,
}

/// Radial coordinate of the LiCN well: minimize the potential over R at
/// theta = 0 with a scan plus parabolic refinement.
fn licn_minimum(system: &LithiumCyanide) -> f64 {
    let pot = |r: f64| {
        let phase = DMatrix::from_row_slice(1, 4, &[0.0, r, 0.0, 0.0]);
        system.potential(phase.as_view(), 0.0)[0]
    };

    let (lo, hi, n) = (4.0, 5.5, 3000);
    let h = (hi - lo) / n as f64;
    let mut best = (lo, pot(lo));
    for k in 1..=n {
        let r = lo + h * k as f64;
        let v = pot(r);
        if v < best.1 {
            best = (r, v);
        }
    }

    let (r, v) = best;
    let (vm, vp) = (pot(r - h), pot(r + h));
    r + 0.5 * h * (vm - vp) / (vm - 2.0 * v + vp)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    let cli = Cli::parse();

    let kb_t = KELVIN_TO_HARTREE * cli.temperature;
    let system = LithiumCyanide::new();
    let mut bath = LangevinBath::new(kb_t, cli.friction, cli.bath_seed)?;
    let mut stepper = LfMiddle::new(cli.dt)?;
    let layout = StateLayout::for_run(&system, &bath)?;

    let r_min = licn_minimum(&system);
    tracing::info!(r_min, kb_t, "starting in the LiCN well");
    let positions = DMatrix::from_fn(cli.trajectories, 2, |_, j| if j == 0 { 0.0 } else { r_min });
    let mut states =
        maxwell_boltzmann_ensemble(&system, &layout, kb_t, &positions, cli.ensemble_seed)?;

    // A trajectory counts as reacted once its angle leaves the LiCN basin.
    let boundary = 0.6 * std::f64::consts::PI;
    let total = cli.trajectories;
    let mut remaining = total;
    let mut observer = Observer::new(|active: nalgebra::DMatrixView<f64>, t| {
        if active.nrows() < remaining {
            remaining = active.nrows();
            tracing::info!(remaining, total, t, "progress");
        }
    });

    let passage = propagate_while(
        &mut stepper,
        &mut bath,
        &system,
        &layout,
        &mut states,
        0.0,
        |active, _| active.column(0).iter().map(|&theta| theta.abs() >= boundary).collect(),
        &mut observer,
    )?;

    let times: Vec<f64> = passage.iter().copied().flatten().collect();
    if times.len() != total {
        bail!("{} of {} trajectories did not react", total - times.len(), total);
    }
    let mfpt = times.iter().sum::<f64>() / times.len() as f64;
    println!("MFPT: {mfpt} a.u.");
    println!("Rate: {} a.u.", 1.0 / mfpt);
    Ok(())
}
