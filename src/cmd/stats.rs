use std::{fs, path::Path};

use seatplan::dto::SolutionMetaDto;

pub fn stats(base_solution_dir: &Path, problems: &[String], solvers: &[String]) -> std::io::Result<()> {
    let mut sum_best = 0;

    for id in problems {
        let best_path = base_solution_dir.join("best").join(format!("{id}_meta.json"));

        if !best_path.exists() {
            println!("Problem {id}");
            println!("------------------------------------");
            println!("no solution yet");
            println!("------------------------------------");
            continue;
        }

        let best: SolutionMetaDto = serde_json::from_str(&fs::read_to_string(&best_path)?)?;
        sum_best += best.score;
        let mut current_solved = Vec::with_capacity(solvers.len());

        for solver in solvers {
            let path = base_solution_dir
                .join("current")
                .join(solver)
                .join(format!("{id}_meta.json"));
            if let Ok(true) = path.try_exists() {
                let dto: SolutionMetaDto = serde_json::from_str(&fs::read_to_string(path)?)?;
                current_solved.push(dto);
            };
        }

        current_solved.sort_by_key(|x| std::cmp::Reverse(x.score));

        println!("Problem {id}");
        println!("------------------------------------");
        println!("best: {} score={}", best.solver_name, best.score);
        current_solved.iter().for_each(|x| {
            println!(
                "{} score={} time={}ms",
                x.solver_name, x.score, x.elapsed_ms
            )
        });
        println!("------------------------------------");
    }
    println!("------------------------------------");
    println!("Sum of all best: {sum_best}");

    Ok(())
}
