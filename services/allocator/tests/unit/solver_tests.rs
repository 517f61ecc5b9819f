//! Numerical back-end tests
//! Branch-and-bound against brute force, relaxation behaviour and limits

use crate::fixtures::{asset_map, oil_gold};
use crate::oracle;
use approx::assert_relative_eq;
use discrete_allocator::{SolverConfig, SolverError};
use discrete_allocator::problem::TrackingProblem;
use discrete_allocator::solver::{
    BranchAndBoundSolver, ProjectionSolver, QuadraticBackend, VariableDomain,
};
use rstest::*;

#[fixture]
fn exact_solver() -> BranchAndBoundSolver {
    BranchAndBoundSolver::new(SolverConfig::default())
}

fn pairs(problem: &TrackingProblem) -> Vec<(f64, f64)> {
    problem
        .targets()
        .iter()
        .zip(problem.prices().iter())
        .map(|(w, p)| (*w, *p))
        .collect()
}

#[rstest]
fn test_oil_gold_matches_enumeration(exact_solver: BranchAndBoundSolver) {
    let (budget, weights, prices) = oil_gold();
    let problem = TrackingProblem::new(budget, &weights, &prices);
    let solution = exact_solver.solve(&problem, VariableDomain::Integer).unwrap();

    let (best_shares, best_objective) = oracle::brute_force(budget, &pairs(&problem));
    assert_relative_eq!(solution.objective, best_objective, epsilon = 1e-12);
    let shares: Vec<u64> = solution.shares.iter().map(|x| *x as u64).collect();
    assert_eq!(shares, best_shares);
    assert!(problem.is_affordable(&solution.shares));
}

#[rstest]
#[case(1_000.0, &[("A", 0.2, 33.0), ("B", 0.3, 47.5), ("C", 0.5, 12.25)])]
#[case(250.0, &[("A", 0.7, 99.0), ("B", 0.3, 101.0)])]
#[case(5_000.0, &[("A", 0.1, 410.0), ("B", 0.45, 77.7), ("C", 0.45, 530.0)])]
#[case(97.0, &[("A", 0.34, 9.7), ("B", 0.33, 19.3), ("C", 0.33, 31.1)])]
fn test_small_instances_match_enumeration(
    exact_solver: BranchAndBoundSolver,
    #[case] budget: f64,
    #[case] assets: &[(&str, f64, f64)],
) {
    let weights = asset_map(&assets.iter().map(|(a, w, _)| (*a, *w)).collect::<Vec<_>>());
    let prices = asset_map(&assets.iter().map(|(a, _, p)| (*a, *p)).collect::<Vec<_>>());
    let problem = TrackingProblem::new(budget, &weights, &prices);

    let solution = exact_solver.solve(&problem, VariableDomain::Integer).unwrap();
    let (_, best_objective) = oracle::brute_force(budget, &pairs(&problem));

    assert!(problem.is_affordable(&solution.shares));
    assert!(solution.objective <= best_objective + 1e-12);
    assert_relative_eq!(solution.objective, best_objective, epsilon = 1e-12);
}

#[rstest]
fn test_continuous_domain_delegates_to_relaxation(exact_solver: BranchAndBoundSolver) {
    let (budget, weights, prices) = oil_gold();
    let problem = TrackingProblem::new(budget, &weights, &prices);

    let relaxed = exact_solver.solve(&problem, VariableDomain::Continuous).unwrap();
    let direct = ProjectionSolver::default()
        .solve(&problem, VariableDomain::Continuous)
        .unwrap();

    assert_eq!(relaxed, direct);
    // GLD then USO in sorted order
    assert_relative_eq!(relaxed.shares[0], 6_000.0 / 185.25, epsilon = 1e-9);
    assert_relative_eq!(relaxed.shares[1], 4_000.0 / 85.5, epsilon = 1e-9);
}

#[rstest]
fn test_relaxation_bounds_integer_optimum(exact_solver: BranchAndBoundSolver) {
    let (budget, weights, prices) = oil_gold();
    let problem = TrackingProblem::new(budget, &weights, &prices);

    let relaxed = exact_solver.solve(&problem, VariableDomain::Continuous).unwrap();
    let exact = exact_solver.solve(&problem, VariableDomain::Integer).unwrap();
    assert!(relaxed.objective <= exact.objective);
}

#[test]
fn test_projection_respects_budget_row_when_weights_overshoot() {
    // Weights within tolerance above 1 still produce an affordable relaxation
    let weights = asset_map(&[("A", 0.5000004), ("B", 0.5000004)]);
    let prices = asset_map(&[("A", 3.0), ("B", 7.0)]);
    let problem = TrackingProblem::new(1_000.0, &weights, &prices);

    let solution = ProjectionSolver::default()
        .solve(&problem, VariableDomain::Continuous)
        .unwrap();
    assert!(problem.cost(&solution.shares) <= 1_000.0 + 1e-9);
}

#[test]
fn test_zero_time_limit_is_reported() {
    let weights = asset_map(&[("A", 0.2), ("B", 0.2), ("C", 0.2), ("D", 0.2), ("E", 0.2)]);
    let prices = asset_map(&[("A", 3.7), ("B", 11.3), ("C", 29.9), ("D", 47.1), ("E", 83.3)]);
    let problem = TrackingProblem::new(1_009.0, &weights, &prices);
    let config = SolverConfig {
        time_limit_ms: Some(0),
        ..SolverConfig::default()
    };

    let result = BranchAndBoundSolver::new(config).solve(&problem, VariableDomain::Integer);
    assert!(
        matches!(result, Err(SolverError::TimeLimit { .. })),
        "expected time limit, got {result:?}"
    );

    // Same problem without a clock limit solves exactly
    let solution = BranchAndBoundSolver::new(SolverConfig::default())
        .solve(&problem, VariableDomain::Integer)
        .unwrap();
    assert!(problem.is_affordable(&solution.shares));
}

#[rstest]
fn test_solver_is_deterministic(exact_solver: BranchAndBoundSolver) {
    let weights = asset_map(&[("A", 0.25), ("B", 0.25), ("C", 0.25), ("D", 0.25)]);
    let prices = asset_map(&[("A", 13.0), ("B", 29.0), ("C", 41.0), ("D", 57.0)]);
    let problem = TrackingProblem::new(3_333.0, &weights, &prices);

    let first = exact_solver.solve(&problem, VariableDomain::Integer).unwrap();
    let second = exact_solver.solve(&problem, VariableDomain::Integer).unwrap();
    assert_eq!(first, second);
}
