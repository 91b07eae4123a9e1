//! Solver construction and execution.
//!
//! [`maximize`] validates the starting point, builds an L-BFGS solver for
//! the requested line search, runs it through argmin's `Executor` and
//! normalizes the final state into a [`FitOutcome`].

#[cfg(feature = "obs_slog")]
use argmin::core::{CostFunction, Gradient};
use argmin::core::{Executor, IterState, Solver, State};
use argmin::solver::quasinewton::LBFGS;
#[cfg(feature = "obs_slog")]
use argmin_math::ArgminL2Norm;

use crate::optimization::{
    errors::OptResult,
    lbfgs::{
        adapter::ArgMinAdapter,
        options::{FitOptions, LineSearcher, LogLikelihood},
        outcome::FitOutcome,
        types::{
            Cost, DEFAULT_LBFGS_MEM, Grad, HagerZhangLS, LbfgsHagerZhang, LbfgsMoreThuente,
            MoreThuenteLS, Theta,
        },
    },
};

/// Maximize `f` starting from `theta0`.
///
/// Parameters
/// ----------
/// - `f`: objective implementing [`LogLikelihood`].
/// - `theta0`: starting point; passed to `f.check` before any iteration.
/// - `data`: payload forwarded to every `value`/`grad` call.
/// - `opts`: tolerances, line search, L-BFGS memory and verbosity.
///
/// Errors
/// ------
/// - Anything `f.check` returns.
/// - Solver configuration errors (`InvalidParameter`, ...).
/// - Errors raised by `f` during iteration, recovered from argmin's boxed
///   error type.
/// - Validation failures of the final state (see [`FitOutcome::new`]).
///
/// Notes
/// -----
/// - Non-convergence is not an error here; inspect `FitOutcome::converged`.
pub fn maximize<F: LogLikelihood>(
    f: &F, theta0: Theta, data: &F::Data, opts: &FitOptions,
) -> OptResult<FitOutcome> {
    f.check(&theta0, data)?;
    let problem = ArgMinAdapter::new(f, data);
    match opts.line_searcher {
        LineSearcher::MoreThuente => run_lbfgs(theta0, opts, problem, more_thuente_solver(opts)?),
        LineSearcher::HagerZhang => run_lbfgs(theta0, opts, problem, hager_zhang_solver(opts)?),
    }
}

pub fn more_thuente_solver(opts: &FitOptions) -> OptResult<LbfgsMoreThuente> {
    let mem = opts.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM);
    with_tolerances(LBFGS::new(MoreThuenteLS::new(), mem), opts)
}

pub fn hager_zhang_solver(opts: &FitOptions) -> OptResult<LbfgsHagerZhang> {
    let mem = opts.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM);
    with_tolerances(LBFGS::new(HagerZhangLS::new(), mem), opts)
}

fn with_tolerances<L>(
    mut solver: LBFGS<L, Theta, Grad, Cost>, opts: &FitOptions,
) -> OptResult<LBFGS<L, Theta, Grad, Cost>> {
    if let Some(g) = opts.tols.tol_grad {
        solver = solver.with_tolerance_grad(g)?;
    }
    if let Some(c) = opts.tols.tol_cost {
        solver = solver.with_tolerance_cost(c)?;
    }
    Ok(solver)
}

fn run_lbfgs<'a, F, S>(
    theta0: Theta, opts: &FitOptions, problem: ArgMinAdapter<'a, F>, solver: S,
) -> OptResult<FitOutcome>
where
    F: LogLikelihood,
    S: Solver<ArgMinAdapter<'a, F>, IterState<Theta, Grad, (), (), (), f64>> + Send + 'static,
{
    #[cfg(feature = "obs_slog")]
    if opts.verbose {
        log_initial_state(&theta0, &problem)?;
    }

    let mut executor = Executor::new(problem, solver).configure(|state| state.param(theta0));
    if let Some(max_iter) = opts.tols.max_iter {
        executor = executor.configure(|state| state.max_iters(max_iter as u64));
    }
    #[cfg(feature = "obs_slog")]
    if opts.verbose {
        let observer = argmin_observer_slog::SlogLogger::term_noblock();
        executor = executor.add_observer(observer, argmin::core::observers::ObserverMode::Always);
    }

    let mut state = executor.run()?.state().clone();
    let termination = state.get_termination_status().clone();
    let iterations = state.get_iter();
    let fn_evals = state.get_func_counts().clone();
    let grad = state.take_gradient();
    let outcome = FitOutcome::new(
        state.take_best_param(),
        -state.get_best_cost(),
        &termination,
        iterations,
        fn_evals,
        grad,
    )?;
    log::debug!(
        "L-BFGS finished after {} iterations: {} (value = {:.6})",
        outcome.iterations,
        outcome.status,
        outcome.value
    );
    Ok(outcome)
}

#[cfg(feature = "obs_slog")]
fn log_initial_state<F: LogLikelihood>(
    theta0: &Theta, problem: &ArgMinAdapter<'_, F>,
) -> OptResult<()> {
    let value0 = -problem.cost(theta0)?;
    let grad_norm0 = problem.gradient(theta0).ok().map(|g| g.l2_norm());
    log::info!(
        "L-BFGS start: value = {:.6}{}",
        value0,
        grad_norm0.map(|n| format!(", ||grad|| = {n:.6}")).unwrap_or_default()
    );
    Ok(())
}
