//! Fixed-step time integrators.

use crate::description::SolverKind;
use crate::error::BackendResult;

/// A system of ODEs `dx/dt = f(t, x)`.
pub trait ContinuousSystem {
    /// Compute state derivative dxdt = f(t, x).
    ///
    /// Takes &mut self because evaluation runs the model backend.
    fn rhs(&mut self, t: f64, x: &[f64]) -> BackendResult<Vec<f64>>;
}

/// Trait for time integrators.
pub trait Integrator {
    /// Advance state by one time step.
    fn step<S: ContinuousSystem>(
        &self,
        sys: &mut S,
        t: f64,
        x: &[f64],
        dt: f64,
    ) -> BackendResult<Vec<f64>>;
}

/// `x + h * k`
fn offset(x: &[f64], k: &[f64], h: f64) -> Vec<f64> {
    x.iter().zip(k).map(|(xi, ki)| xi + h * ki).collect()
}

/// Forward Euler (explicit, 1st order).
/// Calls rhs() once per step instead of 4 times (RK4).
#[derive(Clone, Copy, Debug)]
pub struct ForwardEuler;

impl Integrator for ForwardEuler {
    fn step<S: ContinuousSystem>(
        &self,
        sys: &mut S,
        t: f64,
        x: &[f64],
        dt: f64,
    ) -> BackendResult<Vec<f64>> {
        let xdot = sys.rhs(t, x)?;
        Ok(offset(x, &xdot, dt))
    }
}

/// Classical RK4 (Runge-Kutta 4th order) integrator.
#[derive(Clone, Copy, Debug)]
pub struct Rk4;

impl Integrator for Rk4 {
    fn step<S: ContinuousSystem>(
        &self,
        sys: &mut S,
        t: f64,
        x: &[f64],
        dt: f64,
    ) -> BackendResult<Vec<f64>> {
        let k1 = sys.rhs(t, x)?;
        let k2 = sys.rhs(t + 0.5 * dt, &offset(x, &k1, 0.5 * dt))?;
        let k3 = sys.rhs(t + 0.5 * dt, &offset(x, &k2, 0.5 * dt))?;
        let k4 = sys.rhs(t + dt, &offset(x, &k3, dt))?;

        // x_new = x + (dt/6) * (k1 + 2*k2 + 2*k3 + k4)
        Ok(x
            .iter()
            .enumerate()
            .map(|(i, xi)| xi + dt / 6.0 * (k1[i] + 2.0 * k2[i] + 2.0 * k3[i] + k4[i]))
            .collect())
    }
}

impl SolverKind {
    /// Advance `x` from `t` by `dt` with the selected method.
    pub fn step<S: ContinuousSystem>(
        self,
        sys: &mut S,
        t: f64,
        x: &[f64],
        dt: f64,
    ) -> BackendResult<Vec<f64>> {
        match self {
            SolverKind::ForwardEuler => ForwardEuler.step(sys, t, x, dt),
            SolverKind::Rk4 => Rk4.step(sys, t, x, dt),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// dx/dt = -x
    struct Decay {
        calls: usize,
    }

    impl ContinuousSystem for Decay {
        fn rhs(&mut self, _t: f64, x: &[f64]) -> BackendResult<Vec<f64>> {
            self.calls += 1;
            Ok(x.iter().map(|v| -v).collect())
        }
    }

    #[test]
    fn euler_single_step() {
        let mut sys = Decay { calls: 0 };
        let x = ForwardEuler.step(&mut sys, 0.0, &[1.0], 0.1).unwrap();
        assert!((x[0] - 0.9).abs() < 1e-15);
        assert_eq!(sys.calls, 1);
    }

    #[test]
    fn rk4_matches_exponential() {
        let mut sys = Decay { calls: 0 };
        let mut x = vec![1.0];
        for i in 0..10 {
            x = Rk4.step(&mut sys, i as f64 * 0.1, &x, 0.1).unwrap();
        }
        assert!((x[0] - (-1.0_f64).exp()).abs() < 1e-6);
        assert_eq!(sys.calls, 40);
    }

    #[test]
    fn solver_kind_dispatch() {
        let mut sys = Decay { calls: 0 };
        SolverKind::ForwardEuler.step(&mut sys, 0.0, &[1.0], 0.1).unwrap();
        SolverKind::Rk4.step(&mut sys, 0.0, &[1.0], 0.1).unwrap();
        assert_eq!(sys.calls, 5);
    }
}
