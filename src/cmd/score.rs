use std::path::Path;

use seatplan::{dto::SolutionDto, plan::SeatingPlan, scorer, solvers::Problem};

/// Validates a saved plan against its problem and prints the score per table.
pub fn score(problem_path: &Path, solution_path: &Path) -> std::io::Result<()> {
    let problem = Problem::load(problem_path)?;
    let data = SolutionDto::load(solution_path)?;
    let plan = SeatingPlan::from_dto(problem.roster.clone(), problem.table_capacity, &data)?;

    for (idx, table) in plan.tables().iter().enumerate() {
        let names: Vec<&str> = table.guests().iter().map(|g| problem.roster.name(*g)).collect();
        println!(
            "Table {idx}: {:>6}  [{}]",
            scorer::table_score(&problem.roster, table.guests()),
            names.join(", ")
        );
    }
    println!("------------------------------------");
    println!("{}: {}", problem.id, plan.score().0);
    Ok(())
}
