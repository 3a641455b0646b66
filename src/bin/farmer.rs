//! Build and print the extensive form of the three-weather farmer problem.

use scenform::farmer::{build_farm_model, FarmTemplate, Weather};
use scenform::report::extensive_form_summary;
use scenform::{build_extensive_form, BuildError, ScenarioSet};

fn run() -> Result<(), BuildError> {
    let template = FarmTemplate::birge_louveaux();
    let scenarios = Weather::ALL
        .iter()
        .map(|w| template.weather_scenario(*w, 1.0 / 3.0))
        .collect::<Result<Vec<_>, _>>()?;
    let set = ScenarioSet::new(scenarios)?;

    let ef = build_extensive_form(&set, |s| build_farm_model(s, &template))?;

    println!("{}", extensive_form_summary(&ef));
    println!();
    println!("{}", ef.to_model());

    let dense = ef.to_model().to_dense();
    println!(
        "matrix export: {} rows x {} cols",
        dense.constraints.nrows(),
        dense.constraints.ncols()
    );
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
