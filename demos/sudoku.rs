//! Encodes a generated sudoku as CNF and solves it.
//!
//! `RUST_LOG=debug cargo run --example sudoku` shows the search progress.

use dpll_rs::{Cnf, Solver, SolverConfig};
use sudoku::Sudoku;

// 1-base dimacs
// (row-1, col-1)'s value equals to num
fn var_num(row: i32, col: i32, num: i32) -> i32 {
    (row - 1) * 81 + (col - 1) * 9 + num
}

// notice that, since dimacs is 1-base, we need to -1 at the beginning
// of this function
fn unpack_var_num(var: i32) -> (i32, i32, i32) {
    let var = var - 1;
    let num = var % 9;
    let col = (var - num) / 9 % 9;
    let row = (var - num - col * 9) / 81;
    (row, col, num + 1)
}

// at least one cell of `cells` holds the value, and no two of them do
fn exactly_one(clauses: &mut Vec<Vec<i32>>, cells: &[i32]) {
    clauses.push(cells.to_vec());
    for (i, &a) in cells.iter().enumerate() {
        for &b in &cells[i + 1..] {
            clauses.push(vec![-a, -b]);
        }
    }
}

fn sudoku_to_cnf(grid: [u8; 81]) -> Vec<Vec<i32>> {
    let mut clauses = Vec::new();

    // every cell holds some value
    for row in 1..=9 {
        for col in 1..=9 {
            clauses.push((1..=9).map(|num| var_num(row, col, num)).collect());
        }
    }

    for num in 1..=9 {
        for row in 1..=9 {
            let cells: Vec<i32> = (1..=9).map(|col| var_num(row, col, num)).collect();
            exactly_one(&mut clauses, &cells);
        }
        for col in 1..=9 {
            let cells: Vec<i32> = (1..=9).map(|row| var_num(row, col, num)).collect();
            exactly_one(&mut clauses, &cells);
        }
        for block in 0..9 {
            let (block_row, block_col) = (block / 3 * 3, block % 3 * 3);
            let cells: Vec<i32> = (0..9)
                .map(|pos| var_num(block_row + pos / 3 + 1, block_col + pos % 3 + 1, num))
                .collect();
            exactly_one(&mut clauses, &cells);
        }
    }

    // givens
    for (index, &value) in grid.iter().enumerate() {
        if value != 0 {
            let (row, col) = (index as i32 / 9 + 1, index as i32 % 9 + 1);
            clauses.push(vec![var_num(row, col, value as i32)]);
        }
    }

    clauses
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::builder().format_timestamp(None).init();

    let sudoku = Sudoku::generate();
    let rules = sudoku_to_cnf(sudoku.to_bytes());
    let cnf = Cnf::from_dimacs_clauses(&rules)?;
    println!("clauses: {}, vars: {}", cnf.num_clause(), cnf.variables().len());

    let mut solver = Solver::new(SolverConfig::default().seed(0x5eed).log_interval(100));
    let res = solver.run(&cnf)?;
    assert!(res.satisfiable);
    println!("{:?}", res.stats);

    let true_vars = res.assignment.true_vars();
    assert_eq!(true_vars.len(), 81);

    let mut grid = [0; 81];
    for var in true_vars {
        let (row, col, num) = unpack_var_num(var as i32);
        let index = (row * 9 + col) as usize;
        grid[index] = num as u8;
    }

    let solution = Sudoku::from_bytes(grid).map_err(|_| "decoded grid is not a sudoku")?;
    println!("{}", sudoku.display_block());
    println!("{}", solution.display_block());
    Ok(())
}
