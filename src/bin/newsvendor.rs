//! Sample uniform demand draws, collapse them into an empirical scenario set
//! and print the resulting newsvendor extensive form.

use rand::rngs::StdRng;
use rand::SeedableRng;

use scenform::newsvendor::{
    build_newsvendor_model, demand_scenarios, sample_demands, NewsvendorTemplate,
};
use scenform::report::extensive_form_summary;
use scenform::{build_extensive_form, BuildError, ScenarioSet};

const NUM_DRAWS: usize = 30;
const DEMAND_LOW: f64 = 50.0;
const DEMAND_HIGH: f64 = 150.0;

fn run() -> Result<(), BuildError> {
    let template = NewsvendorTemplate::birge_louveaux();

    let mut rng = StdRng::seed_from_u64(2023);
    let draws = sample_demands(&mut rng, NUM_DRAWS, DEMAND_LOW, DEMAND_HIGH);
    let set = ScenarioSet::new(demand_scenarios(&draws)?)?;

    println!(
        "{} draws on [{}, {}] collapsed into {} scenarios",
        NUM_DRAWS,
        DEMAND_LOW,
        DEMAND_HIGH,
        set.len()
    );

    let ef = build_extensive_form(&set, |s| build_newsvendor_model(s, &template))?;
    println!("{}", extensive_form_summary(&ef));

    let sparse = ef.to_model().to_sparse();
    println!(
        "sparse export: {} rows x {} cols, {} non-zeros",
        sparse.constraints.rows(),
        sparse.constraints.cols(),
        sparse.constraints.nnz()
    );
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
